use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::Widget,
};

use super::Theme;

/// 1行あたりのバイト数
pub const BYTES_PER_ROW: usize = 16;
/// HEX列の開始位置（`xxxxxxxx: ` の直後）
const HEX_START: u16 = 10;
/// 文字列の開始位置
const CHAR_START: u16 = 51;

/// 行内 `index` 番目のバイトのHEX列の位置（2桁）
///
/// 2バイトずつ `xxxx ` の形でまとめて表示する。
pub const fn hex_column(index: usize) -> u16 {
    HEX_START + 5 * (index / 2) as u16 + 2 * (index % 2) as u16
}

/// 行内 `index` 番目のバイトの文字列の位置
pub const fn char_column(index: usize) -> u16 {
    CHAR_START + index as u16
}

/// 表示列から行内のバイト位置を求める（`hex_column`/`char_column` の逆）
///
/// アドレス部分は先頭バイト、HEX列と文字列の間や行末より右は末尾バイトに寄せる。
/// ペアの後ろの空白はペアの2バイト目として扱う。
pub fn byte_at_column(x: u16) -> usize {
    let hex_end = hex_column(BYTES_PER_ROW - 1) + 2;
    if x < HEX_START {
        0
    } else if x < hex_end {
        let rel = (x - HEX_START) as usize;
        2 * (rel / 5) + usize::from(rel % 5 >= 2)
    } else if x < CHAR_START {
        BYTES_PER_ROW - 1
    } else {
        ((x - CHAR_START) as usize).min(BYTES_PER_ROW - 1)
    }
}

/// HEX/文字表示ウィジェット
pub struct HexView<'a> {
    /// 表示するデータ
    data: &'a [u8],
    /// 表示開始オフセット（16の倍数）
    scroll: usize,
    /// カーソル位置
    cursor: usize,
    /// カーソルが覆うバイト数
    span: usize,
    /// カーソルの背景色。`None` ならハイライトしない
    highlight: Option<Color>,
    theme: &'a Theme,
}

impl<'a> HexView<'a> {
    pub fn new(data: &'a [u8], theme: &'a Theme) -> Self {
        Self {
            data,
            scroll: 0,
            cursor: 0,
            span: 1,
            highlight: None,
            theme,
        }
    }

    pub fn scroll(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }

    pub fn cursor(mut self, cursor: usize, span: usize) -> Self {
        self.cursor = cursor;
        self.span = span.max(1);
        self
    }

    pub fn highlight(mut self, color: Option<Color>) -> Self {
        self.highlight = color;
        self
    }

    /// バイトのスタイル（カーソル範囲なら反転色）
    fn byte_style(&self, offset: usize) -> Style {
        match self.highlight {
            Some(bg) if offset >= self.cursor && offset < self.cursor + self.span => {
                Style::default().fg(self.theme.cursor_fg).bg(bg)
            }
            _ => self.theme.base(),
        }
    }

    /// 文字列のセル（表示文字, スタイル）
    fn char_cell(&self, byte: u8, style: Style) -> (char, Style) {
        match byte {
            0x20..=0x7E => (byte as char, style),
            0x00..=0x1F => ((byte | 0x40) as char, style.add_modifier(Modifier::REVERSED)),
            _ => ('.', style.fg(self.theme.unprintable)),
        }
    }

    /// 1行分のデータを描画
    fn render_row(&self, row_start: usize, area: Rect, y: u16, buf: &mut Buffer) {
        put_str(buf, area, 0, y, &format!("{:08x}:", row_start), self.theme.base());

        let row_end = (row_start + BYTES_PER_ROW).min(self.data.len());
        for (index, offset) in (row_start..row_end).enumerate() {
            let byte = self.data[offset];
            let style = self.byte_style(offset);
            put_str(buf, area, hex_column(index), y, &format!("{:02x}", byte), style);

            let (ch, char_style) = self.char_cell(byte, style);
            let col = char_column(index);
            if col < area.width {
                if let Some(cell) = buf.cell_mut((area.x + col, y)) {
                    cell.set_char(ch).set_style(char_style);
                }
            }
        }
    }
}

/// 領域内に収まる分だけ文字列を書く
fn put_str(buf: &mut Buffer, area: Rect, col: u16, y: u16, text: &str, style: Style) {
    if col >= area.width || y < area.y || y >= area.bottom() {
        return;
    }
    let max_width = (area.width - col) as usize;
    buf.set_stringn(area.x + col, y, text, max_width, style);
}

impl Widget for HexView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let area = area.intersection(buf.area);
        for row in 0..area.height {
            let row_start = self.scroll + row as usize * BYTES_PER_ROW;
            if row_start >= self.data.len() {
                break;
            }
            self.render_row(row_start, area, area.y + row, buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 1行の表示幅
    const ROW_WIDTH: u16 = CHAR_START + BYTES_PER_ROW as u16;

    fn symbol(buf: &Buffer, x: u16, y: u16) -> &str {
        buf.cell((x, y)).map(|c| c.symbol()).unwrap_or("")
    }

    #[test]
    fn columns_match_row_layout() {
        assert_eq!(hex_column(0), 10);
        assert_eq!(hex_column(1), 12);
        assert_eq!(hex_column(2), 15);
        assert_eq!(hex_column(15), 47);
        assert_eq!(char_column(0), 51);
        assert_eq!(char_column(15), 66);
        assert_eq!(ROW_WIDTH, 67);
    }

    #[test]
    fn every_cell_column_maps_back_to_its_byte() {
        for index in 0..BYTES_PER_ROW {
            assert_eq!(byte_at_column(hex_column(index)), index);
            assert_eq!(byte_at_column(hex_column(index) + 1), index);
            assert_eq!(byte_at_column(char_column(index)), index);
        }
    }

    #[test]
    fn gaps_and_margins_map_to_edges() {
        assert_eq!(byte_at_column(0), 0);
        assert_eq!(byte_at_column(9), 0);
        // ペア後の空白
        assert_eq!(byte_at_column(14), 1);
        assert_eq!(byte_at_column(49), 15);
        assert_eq!(byte_at_column(50), 15);
        assert_eq!(byte_at_column(200), 15);
    }

    #[test]
    fn renders_address_hex_and_chars() {
        let theme = Theme::default();
        let data: Vec<u8> = (0x40..0x60).collect();
        let area = Rect::new(0, 0, ROW_WIDTH, 4);
        let mut buf = Buffer::empty(area);
        HexView::new(&data, &theme).scroll(16).render(area, &mut buf);

        assert_eq!(symbol(&buf, 0, 0), "0");
        assert_eq!(symbol(&buf, 7, 0), "0");
        assert_eq!(symbol(&buf, 6, 0), "1");
        assert_eq!(symbol(&buf, 8, 0), ":");
        assert_eq!(symbol(&buf, hex_column(0), 0), "5");
        assert_eq!(symbol(&buf, hex_column(0) + 1, 0), "0");
        assert_eq!(symbol(&buf, char_column(1), 0), "Q");
        // EOFより後の行は描かない
        assert_eq!(symbol(&buf, 0, 1), " ");
    }

    #[test]
    fn control_and_high_bytes_are_escaped() {
        let theme = Theme::default();
        let data = [0x01u8, 0x9F, b'a'];
        let area = Rect::new(0, 0, ROW_WIDTH, 1);
        let mut buf = Buffer::empty(area);
        HexView::new(&data, &theme).render(area, &mut buf);

        let ctrl = buf.cell((char_column(0), 0)).expect("cell");
        assert_eq!(ctrl.symbol(), "A");
        assert!(ctrl.modifier.contains(Modifier::REVERSED));
        let high = buf.cell((char_column(1), 0)).expect("cell");
        assert_eq!(high.symbol(), ".");
        assert_eq!(high.fg, theme.unprintable);
        assert_eq!(symbol(&buf, char_column(2), 0), "a");
    }

    #[test]
    fn highlight_spans_cursor_bytes() {
        let theme = Theme::default();
        let data = [0u8; 8];
        let area = Rect::new(0, 0, ROW_WIDTH, 1);
        let mut buf = Buffer::empty(area);
        HexView::new(&data, &theme)
            .cursor(2, 4)
            .highlight(Some(theme.cursor_signed))
            .render(area, &mut buf);

        let bg_at = |i: usize| buf.cell((hex_column(i), 0)).expect("cell").bg;
        assert_eq!(bg_at(1), theme.bg);
        for i in 2..6 {
            assert_eq!(bg_at(i), theme.cursor_signed);
        }
        assert_eq!(bg_at(6), theme.bg);
    }

    #[test]
    fn no_highlight_without_focus() {
        let theme = Theme::default();
        let data = [0u8; 4];
        let area = Rect::new(0, 0, ROW_WIDTH, 1);
        let mut buf = Buffer::empty(area);
        HexView::new(&data, &theme).cursor(0, 1).render(area, &mut buf);
        assert_eq!(buf.cell((hex_column(0), 0)).expect("cell").bg, theme.bg);
    }

    #[test]
    fn narrow_area_is_clipped() {
        let theme = Theme::default();
        let data = [0xAAu8; 32];
        let area = Rect::new(2, 1, 20, 1);
        let mut buf = Buffer::empty(Rect::new(0, 0, 30, 3));
        HexView::new(&data, &theme).render(area, &mut buf);
        assert_eq!(symbol(&buf, 2 + hex_column(0), 1), "a");
        assert_eq!(symbol(&buf, 22, 1), " ");
        assert_eq!(symbol(&buf, 2, 2), " ");
    }
}
