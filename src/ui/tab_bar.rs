use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};

use super::Theme;

/// 開いているファイルのタブ一覧（2行: 名前と罫線）
pub struct TabBar<'a> {
    /// (表示名, 表示幅)
    tabs: Vec<(&'a str, usize)>,
    /// 先頭に表示するタブ
    scroll: usize,
    /// 選択中のタブ
    current: usize,
    theme: &'a Theme,
}

impl<'a> TabBar<'a> {
    pub fn new(tabs: Vec<(&'a str, usize)>, theme: &'a Theme) -> Self {
        Self {
            tabs,
            scroll: 0,
            current: 0,
            theme,
        }
    }

    pub fn scroll(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }

    pub fn current(mut self, current: usize) -> Self {
        self.current = current;
        self
    }
}

impl Widget for TabBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let area = area.intersection(buf.area);
        if area.height == 0 || area.width == 0 {
            return;
        }
        let base = self.theme.base();
        let right = area.right();
        let rule_y = (area.height > 1).then_some(area.y + 1);

        if let Some(y) = rule_y {
            for x in area.x..right {
                if let Some(cell) = buf.cell_mut((x, y)) {
                    cell.set_char('─').set_style(base);
                }
            }
        }

        let mut x = area.x as usize + 1;
        for (i, (name, width)) in self.tabs.iter().enumerate().skip(self.scroll) {
            if x >= right as usize {
                break;
            }
            let style = if i == self.current { self.theme.status } else { base };
            buf.set_stringn(x as u16, area.y, name, right as usize - x, style);
            let sep = x + width + 1;
            if sep < right as usize {
                if let Some(cell) = buf.cell_mut((sep as u16, area.y)) {
                    cell.set_char('│').set_style(base);
                }
                if let Some(cell) = rule_y.and_then(|y| buf.cell_mut((sep as u16, y))) {
                    cell.set_char('┴').set_style(base);
                }
            }
            x += width + 3;
        }

        if x >= (right as usize).saturating_sub(1) {
            if let Some(cell) = buf.cell_mut((right - 1, area.y)) {
                cell.set_char('→').set_style(base);
            }
        }
        if self.scroll > 0 {
            if let Some(cell) = buf.cell_mut((area.x, area.y)) {
                cell.set_char('←').set_style(base);
            }
        }
    }
}

/// タブバー上の列 `x` にあるタブの番号
///
/// `widths` は全タブの表示幅。描画と同じく列1から `幅 + 3` ずつ並ぶ。
pub fn tab_at_column(widths: &[usize], scroll: usize, x: u16) -> Option<usize> {
    let x = x as usize;
    let mut start = 1;
    for (i, width) in widths.iter().enumerate().skip(scroll) {
        if start <= x && x <= start + width {
            return Some(i);
        }
        start += width + 3;
        if start > x {
            break;
        }
    }
    None
}
