use std::path::Path;

use anyhow::{Context, Result};
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::Line,
    widgets::{Block, Clear, Paragraph, Widget},
    Frame,
};
use tracing::{debug, error, info, warn};

use super::{Action, KeyMod, LayoutError, LayoutTree, Popup, Prompt, PromptKind, View};
use crate::buffer::{Document, OpenError};
use crate::ui::{tab_at_column, TabBar, Theme};

/// ヘルプ画面の内容
const HELP: &[&str] = &[
    "C-c, q           quit",
    "C-f, Right       forward byte     (M-Right: dword)",
    "C-b, Left        backward byte    (M-Left: dword)",
    "M-f, M-b         forward/backward word",
    "C-n, C-p         next/previous row",
    "C-v, M-v         page down/up",
    "C-a, C-e         start/end of row",
    "M-<, M->         start/end of file",
    "Enter            edit value at cursor",
    "M-g              go to offset",
    "p i u c          pattern/int/uint/char mode",
    "H, L             narrower/wider integer",
    "e                toggle endianness",
    "M-1 .. M-9       switch file",
    "M-|, M--         split left/right, top/bottom",
    "M-u M-d M-l M-r  focus up/down/left/right",
    "M-0              close pane",
    "?, F1            this help",
];

/// ファイルをまとめて開く。開けなかったものはエラーとして返す
pub fn open_files<P: AsRef<Path>>(paths: &[P]) -> (Vec<View>, Vec<OpenError>) {
    let mut views = Vec::new();
    let mut errors = Vec::new();
    for path in paths {
        let path = path.as_ref();
        match Document::open(path) {
            Ok(document) => {
                info!(path = %path.display(), len = document.len(), "opened file");
                views.push(View::new(document));
            }
            Err(source) => {
                warn!(path = %path.display(), %source, "failed to open file");
                errors.push(OpenError {
                    path: path.to_path_buf(),
                    source,
                });
            }
        }
    }
    (views, errors)
}

/// 画面上部のタブバー（名前と罫線）の高さ
const TAB_ROWS: u16 = 2;

/// ペインを並べる領域（タブバーとステータス行を除いた部分）
fn body_area(screen: Rect) -> Rect {
    Rect {
        x: screen.x,
        y: screen.y + TAB_ROWS.min(screen.height),
        width: screen.width,
        height: screen.height.saturating_sub(TAB_ROWS + 1),
    }
}

/// 領域の中央に置いた矩形
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// 開いているファイル全体とペイン配置
pub struct Session {
    views: Vec<View>,
    /// フォーカス中の View（常に `tree.focused_view()` と一致）
    focused: usize,
    tree: LayoutTree,
    theme: Theme,
    /// タブバーの先頭に表示するタブ
    tab_scroll: usize,
    prompt: Option<Prompt>,
    popup: Popup,
    /// 直近に描画した画面の大きさ
    screen: Rect,
    should_quit: bool,
}

impl Session {
    /// 最初のファイルを1枚のペインに表示する。ファイルがなければ `None`
    pub fn new(mut views: Vec<View>, theme: Theme) -> Option<Self> {
        views.first_mut()?.set_focused(true);
        Some(Self {
            views,
            focused: 0,
            tree: LayoutTree::new(0),
            theme,
            tab_scroll: 0,
            prompt: None,
            popup: Popup::None,
            screen: Rect::new(0, 0, 80, 24),
            should_quit: false,
        })
    }

    /// 起動時のエラーをポップアップで表示する
    pub fn with_startup_errors(mut self, errors: Vec<String>) -> Self {
        if !errors.is_empty() {
            self.popup = Popup::Errors(errors);
        }
        self
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn views(&self) -> &[View] {
        &self.views
    }

    pub fn focused(&self) -> usize {
        self.focused
    }

    pub fn focused_view(&self) -> &View {
        &self.views[self.focused]
    }

    #[cfg(test)]
    pub(crate) fn tree(&self) -> &LayoutTree {
        &self.tree
    }

    pub fn prompt(&self) -> Option<&Prompt> {
        self.prompt.as_ref()
    }

    pub fn popup(&self) -> &Popup {
        &self.popup
    }

    /// フォーカス中のペインの行数
    fn pane_rows(&self) -> usize {
        match self.tree.focused_region(body_area(self.screen)) {
            Ok(region) => region.height as usize,
            Err(e) => {
                error!(%e, "cannot measure focused pane");
                1
            }
        }
    }

    /// レイアウト操作の結果を反映する
    fn apply_layout(&mut self, result: Result<Option<usize>, LayoutError>) {
        match result {
            Ok(Some(view)) => self.focused = view,
            Ok(None) => {}
            Err(e) => error!(%e, "layout command skipped"),
        }
    }

    /// アクションを実行
    pub fn execute(&mut self, action: Action) {
        match action {
            Action::None => return,
            Action::Quit => {
                info!("quit");
                self.should_quit = true;
                return;
            }
            Action::Help => {
                self.popup = Popup::Help;
                return;
            }
            Action::Edit => {
                self.prompt = Some(Prompt::new(PromptKind::Edit));
                return;
            }
            Action::Goto => {
                self.prompt = Some(Prompt::new(PromptKind::Goto));
                return;
            }
            Action::Split(axis) => {
                if let Err(e) = self.tree.split(axis) {
                    error!(%e, "split skipped");
                }
            }
            Action::Focus(direction) => {
                let result = self.tree.focus_direction(direction, &mut self.views);
                self.apply_layout(result);
            }
            Action::KillSplit => {
                let result = self.tree.kill_split(&mut self.views);
                self.apply_layout(result);
            }
            Action::SwitchView(view) => {
                if view >= self.views.len() {
                    debug!(view, "no such file");
                    return;
                }
                let result = self.tree.set_focused_view(view, &mut self.views).map(Some);
                self.apply_layout(result);
            }
            _ => self.execute_view(action),
        }
        self.follow();
    }

    /// フォーカス中の View に対するアクション
    fn execute_view(&mut self, action: Action) {
        let rows = self.pane_rows();
        let view = &mut self.views[self.focused];
        match action {
            Action::ForwardByte => view.forward_byte(),
            Action::BackwardByte => view.backward_byte(),
            Action::ForwardWord => view.forward_word(),
            Action::BackwardWord => view.backward_word(),
            Action::ForwardDword => view.forward_dword(),
            Action::BackwardDword => view.backward_dword(),
            Action::ForwardParagraph => view.forward_paragraph(),
            Action::BackwardParagraph => view.backward_paragraph(),
            Action::PageUp => view.page_up(rows),
            Action::PageDown => view.page_down(rows),
            Action::StartOfLine => view.start_of_line(),
            Action::EndOfLine => view.end_of_line(),
            Action::StartOfFile => view.start_of_file(),
            Action::EndOfFile => view.end_of_file(),
            Action::NarrowWidth => view.narrow_width(),
            Action::WidenWidth => view.widen_width(),
            Action::SetMode(mode) => view.set_mode(mode),
            Action::ToggleEndian => view.toggle_endian(),
            _ => {}
        }
    }

    /// フォーカス中の View のカーソル行を表示範囲に入れる
    fn follow(&mut self) {
        let rows = self.pane_rows();
        self.views[self.focused].follow(rows);
    }

    /// イベントを1つ待って処理する
    pub fn handle_event(&mut self) -> Result<()> {
        let event = event::read().context("failed to read terminal event")?;
        self.process_event(event);
        Ok(())
    }

    /// イベントを処理
    pub fn process_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => {
                if key.kind != KeyEventKind::Press {
                    return;
                }
                // ポップアップ・プロンプト中は特別な処理
                if self.popup != Popup::None {
                    self.handle_popup_key(key);
                    return;
                }
                if self.prompt.is_some() {
                    self.handle_prompt_key(key);
                    return;
                }
                let mods = KeyMod {
                    ctrl: key.modifiers.contains(KeyModifiers::CONTROL),
                    shift: key.modifiers.contains(KeyModifiers::SHIFT),
                    alt: key.modifiers.contains(KeyModifiers::ALT),
                };
                self.execute(Action::from_key(key.code, mods));
            }
            Event::Mouse(mouse) => {
                if self.popup == Popup::None && self.prompt.is_none() {
                    self.handle_mouse(mouse);
                }
            }
            Event::Resize(width, height) => {
                self.screen = Rect::new(0, 0, width, height);
                self.follow();
            }
            _ => {}
        }
    }

    /// ポップアップ表示中のキー処理
    fn handle_popup_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let close = match self.popup {
            Popup::None => false,
            Popup::Help => true,
            Popup::Errors(_) => matches!(
                (key.code, ctrl),
                (KeyCode::Enter, _) | (KeyCode::Char('q'), false) | (KeyCode::Char('c' | 'g'), true)
            ),
        };
        if close {
            self.popup = Popup::None;
        }
    }

    /// プロンプト入力中のキー処理
    fn handle_prompt_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);

        match key.code {
            // Escape / C-g / C-c: キャンセル
            KeyCode::Esc => self.prompt = None,
            KeyCode::Char('g' | 'c') if ctrl => self.prompt = None,
            // Enter: 確定
            KeyCode::Enter => self.confirm_prompt(),
            KeyCode::Backspace => {
                if let Some(prompt) = self.prompt.as_mut() {
                    prompt.input.pop();
                }
            }
            KeyCode::Char(ch) if !ctrl && !alt => {
                if let Some(prompt) = self.prompt.as_mut() {
                    prompt.input.push(ch);
                }
            }
            _ => {}
        }
    }

    /// プロンプト入力を実行
    fn confirm_prompt(&mut self) {
        let Some(Prompt { kind, input }) = self.prompt.take() else {
            return;
        };
        let view = &mut self.views[self.focused];
        let result = match kind {
            PromptKind::Edit => view.apply_edit(&input),
            PromptKind::Goto => view.goto(&input),
        };
        if let Err(e) = result {
            debug!(?kind, %input, %e, "input rejected");
        }
        self.follow();
    }

    /// マウス操作
    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let MouseEvent { kind, column, row, .. } = mouse;
        if row == self.screen.y {
            self.handle_tab_mouse(kind, column);
            return;
        }

        let body = body_area(self.screen);
        match kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(view) = self.tree.dispatch_click(body, column, row, &mut self.views) {
                    self.focused = view;
                }
            }
            MouseEventKind::ScrollUp => {
                let rows = self.pane_rows();
                self.views[self.focused].scroll_up(rows);
            }
            MouseEventKind::ScrollDown => self.views[self.focused].scroll_down(),
            _ => return,
        }
        self.follow();
    }

    /// タブバー上のマウス操作
    fn handle_tab_mouse(&mut self, kind: MouseEventKind, column: u16) {
        let last_tab = self.views.len().saturating_sub(1);
        match kind {
            MouseEventKind::ScrollUp => self.tab_scroll = self.tab_scroll.saturating_sub(1),
            MouseEventKind::ScrollDown => self.tab_scroll = (self.tab_scroll + 1).min(last_tab),
            MouseEventKind::Down(MouseButton::Left) => {
                if column == self.screen.x {
                    self.tab_scroll = self.tab_scroll.saturating_sub(1);
                } else if column + 1 == self.screen.right() {
                    self.tab_scroll = (self.tab_scroll + 1).min(last_tab);
                } else {
                    let widths: Vec<usize> = self.views.iter().map(|v| v.document().name_width()).collect();
                    if let Some(view) = tab_at_column(&widths, self.tab_scroll, column - self.screen.x) {
                        self.execute(Action::SwitchView(view));
                    }
                }
            }
            _ => {}
        }
    }

    /// UIを描画
    pub fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        if area != self.screen {
            self.screen = area;
            self.follow();
        }
        self.render(area, frame.buffer_mut());
    }

    /// タブバー・ペイン・ステータス行・ポップアップを描く
    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        let tabs = self
            .views
            .iter()
            .map(|v| (v.document().name(), v.document().name_width()))
            .collect();
        TabBar::new(tabs, &self.theme)
            .scroll(self.tab_scroll)
            .current(self.focused)
            .render(Rect { height: TAB_ROWS.min(area.height), ..area }, buf);

        self.tree.draw(body_area(area), &self.views, &self.theme, buf);

        if area.height > TAB_ROWS {
            let status = Rect {
                y: area.bottom() - 1,
                height: 1,
                ..area
            };
            Paragraph::new(self.status_line()).style(self.theme.status).render(status, buf);
        }

        self.render_popup(area, buf);
    }

    /// ステータス行の内容
    fn status_line(&self) -> String {
        if let Some(prompt) = &self.prompt {
            return format!("{}{}_", prompt.label(), prompt.input);
        }
        let view = self.focused_view();
        format!(
            "{} | {} | Offset: {:016x} | {}",
            view.describe_cursor(),
            view.document().name(),
            view.cursor(),
            view.endian_label(),
        )
    }

    fn render_popup(&self, area: Rect, buf: &mut Buffer) {
        let (title, lines): (&str, Vec<Line>) = match &self.popup {
            Popup::None => return,
            Popup::Help => (" Help ", HELP.iter().map(|l| Line::raw(*l)).collect()),
            Popup::Errors(errors) => (
                " Could not open ",
                errors.iter().map(|e| Line::raw(e.as_str())).collect(),
            ),
        };
        let text_width = lines.iter().map(Line::width).max().unwrap_or(0).max(title.len());
        let width = u16::try_from(text_width + 4).unwrap_or(u16::MAX);
        let height = u16::try_from(lines.len() + 2).unwrap_or(u16::MAX);
        let rect = centered(area, width, height);
        Clear.render(rect, buf);
        Paragraph::new(lines)
            .block(Block::bordered().title(title))
            .style(self.theme.popup)
            .render(rect, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{DisplayMode, SplitAxis};
    use crate::ui::hex_column;
    use ratatui::{backend::TestBackend, Terminal};

    fn session(names: &[&str], len: usize) -> Session {
        let views = names
            .iter()
            .map(|name| View::new(Document::from_bytes(*name, (0..len).map(|i| i as u8).collect())))
            .collect();
        let mut session = Session::new(views, Theme::default()).expect("at least one file");
        session.process_event(Event::Resize(80, 24));
        session
    }

    fn press(session: &mut Session, code: KeyCode, modifiers: KeyModifiers) {
        session.process_event(Event::Key(KeyEvent::new(code, modifiers)));
    }

    fn chars(session: &mut Session, text: &str) {
        for ch in text.chars() {
            press(session, KeyCode::Char(ch), KeyModifiers::NONE);
        }
    }

    fn click(session: &mut Session, kind: MouseEventKind, column: u16, row: u16) {
        session.process_event(Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }));
    }

    fn row_text(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf.cell((x, y)).map(|c| c.symbol()).unwrap_or(" "))
            .collect()
    }

    fn assert_focus_consistent(session: &Session) {
        assert_eq!(session.tree().focused_view(), Ok(session.focused()));
        for (i, view) in session.views().iter().enumerate() {
            assert_eq!(view.is_focused(), i == session.focused());
        }
    }

    #[test]
    fn new_requires_a_file() {
        assert!(Session::new(Vec::new(), Theme::default()).is_none());
    }

    #[test]
    fn status_line_describes_cursor() {
        let mut s = session(&["a.bin"], 64);
        press(&mut s, KeyCode::Char('f'), KeyModifiers::CONTROL);
        let area = Rect::new(0, 0, 80, 24);
        let mut buf = Buffer::empty(area);
        s.render(area, &mut buf);
        assert!(row_text(&buf, 23).starts_with("pattern: 00000001 | a.bin | Offset: 0000000000000001 | lilend"));
        assert!(row_text(&buf, 0).starts_with(" a.bin │"));
        assert!(row_text(&buf, 2).starts_with("00000000:"));
    }

    #[test]
    fn mode_keys_change_description() {
        let mut s = session(&["a"], 64);
        chars(&mut s, "u");
        press(&mut s, KeyCode::Char('L'), KeyModifiers::SHIFT);
        assert_eq!(s.focused_view().mode(), DisplayMode::UnsignedInt);
        assert_eq!(s.focused_view().describe_cursor(), "uint16: 256");
        chars(&mut s, "e");
        assert_eq!(s.focused_view().describe_cursor(), "uint16: 1");
    }

    #[test]
    fn edit_prompt_writes_value() {
        let mut s = session(&["a"], 32);
        press(&mut s, KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(s.prompt().map(|p| p.kind), Some(PromptKind::Edit));
        // プロンプト中の q は入力になる
        chars(&mut s, "fq");
        press(&mut s, KeyCode::Backspace, KeyModifiers::NONE);
        chars(&mut s, "f");
        press(&mut s, KeyCode::Enter, KeyModifiers::NONE);
        assert!(s.prompt().is_none());
        assert!(!s.should_quit());
        assert_eq!(s.focused_view().document().get(0), Some(0xFF));
    }

    #[test]
    fn char_prompt_writes_space() {
        let mut s = session(&["a"], 8);
        chars(&mut s, "c");
        press(&mut s, KeyCode::Enter, KeyModifiers::NONE);
        chars(&mut s, " ");
        press(&mut s, KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(s.focused_view().document().get(0), Some(b' '));
    }

    #[test]
    fn numeric_prompt_ignores_surrounding_spaces() {
        let mut s = session(&["a"], 8);
        chars(&mut s, "u");
        press(&mut s, KeyCode::Enter, KeyModifiers::NONE);
        chars(&mut s, " 0x7f ");
        press(&mut s, KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(s.focused_view().document().get(0), Some(0x7F));
    }

    #[test]
    fn status_line_survives_control_byte() {
        let views = vec![View::new(Document::from_bytes("nl.bin", vec![0x0A; 32]))];
        let mut s = Session::new(views, Theme::default()).expect("one file");
        chars(&mut s, "c");
        let area = Rect::new(0, 0, 80, 24);
        let mut buf = Buffer::empty(area);
        s.render(area, &mut buf);
        assert!(row_text(&buf, 23).starts_with("char: ^J | nl.bin | Offset: 0000000000000000 | lilend"));
    }

    #[test]
    fn cancelled_prompt_changes_nothing() {
        let mut s = session(&["a"], 32);
        press(&mut s, KeyCode::Enter, KeyModifiers::NONE);
        chars(&mut s, "ab");
        press(&mut s, KeyCode::Esc, KeyModifiers::NONE);
        assert!(s.prompt().is_none());
        assert_eq!(s.focused_view().document().get(0), Some(0));

        press(&mut s, KeyCode::Char('g'), KeyModifiers::ALT);
        chars(&mut s, "10");
        press(&mut s, KeyCode::Char('g'), KeyModifiers::CONTROL);
        assert!(s.prompt().is_none());
        assert_eq!(s.focused_view().cursor(), 0);
    }

    #[test]
    fn goto_prompt_moves_and_scrolls() {
        let mut s = session(&["a"], 4096);
        press(&mut s, KeyCode::Char('g'), KeyModifiers::ALT);
        chars(&mut s, "0x800");
        press(&mut s, KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(s.focused_view().cursor(), 0x800);
        assert_eq!(s.focused_view().scroll(), 0x800);

        press(&mut s, KeyCode::Char('g'), KeyModifiers::ALT);
        chars(&mut s, "junk");
        press(&mut s, KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(s.focused_view().cursor(), 0x800);
    }

    #[test]
    fn cursor_stays_visible_after_motion() {
        let mut s = session(&["a"], 4096);
        // 本体は21行
        for _ in 0..30 {
            press(&mut s, KeyCode::Down, KeyModifiers::NONE);
        }
        let view = s.focused_view();
        assert_eq!(view.cursor(), 30 * 16);
        assert_eq!(view.scroll(), (30 - 20) * 16);

        press(&mut s, KeyCode::PageDown, KeyModifiers::NONE);
        assert_eq!(s.focused_view().scroll(), (10 + 21) * 16);
        assert_eq!(s.focused_view().cursor(), s.focused_view().scroll());
    }

    #[test]
    fn split_switch_and_focus_move() {
        let mut s = session(&["a", "b"], 256);
        press(&mut s, KeyCode::Char('|'), KeyModifiers::ALT | KeyModifiers::SHIFT);
        assert_eq!(s.tree().leaves().len(), 2);
        press(&mut s, KeyCode::Char('r'), KeyModifiers::ALT);
        press(&mut s, KeyCode::Char('2'), KeyModifiers::ALT);
        assert_eq!(s.focused(), 1);
        assert_focus_consistent(&s);

        press(&mut s, KeyCode::Char('l'), KeyModifiers::ALT);
        assert_eq!(s.focused(), 0);
        assert_focus_consistent(&s);

        // 存在しないファイルへの切替は無視
        press(&mut s, KeyCode::Char('5'), KeyModifiers::ALT);
        assert_eq!(s.focused(), 0);

        press(&mut s, KeyCode::Char('0'), KeyModifiers::ALT);
        assert_eq!(s.tree().leaves().len(), 1);
        assert_eq!(s.focused(), 1);
        assert_focus_consistent(&s);
    }

    #[test]
    fn pane_rows_follow_the_focused_region() {
        let mut s = session(&["a"], 4096);
        press(&mut s, KeyCode::Char('-'), KeyModifiers::ALT);
        // 本体21行を10行と10行に分ける
        press(&mut s, KeyCode::PageDown, KeyModifiers::NONE);
        assert_eq!(s.focused_view().scroll(), 10 * 16);
    }

    #[test]
    fn click_in_body_moves_cursor() {
        let mut s = session(&["a"], 256);
        click(&mut s, MouseEventKind::Down(MouseButton::Left), hex_column(2), 3);
        assert_eq!(s.focused_view().cursor(), 18);
        // ステータス行は無視
        click(&mut s, MouseEventKind::Down(MouseButton::Left), 20, 23);
        assert_eq!(s.focused_view().cursor(), 18);
    }

    #[test]
    fn click_focuses_other_pane() {
        let mut s = session(&["a", "b"], 256);
        s.execute(Action::Split(SplitAxis::Horizontal));
        s.execute(Action::SwitchView(1));
        // 左ペインが View 1、右ペイン（x=41 から）が View 0
        click(&mut s, MouseEventKind::Down(MouseButton::Left), 41 + hex_column(1), 2);
        assert_eq!(s.focused(), 0);
        assert_eq!(s.focused_view().cursor(), 1);
        assert_focus_consistent(&s);
    }

    #[test]
    fn wheel_scrolls_focused_view() {
        let mut s = session(&["a"], 256);
        click(&mut s, MouseEventKind::ScrollDown, 10, 5);
        assert_eq!(s.focused_view().scroll(), 16);
        assert_eq!(s.focused_view().cursor(), 16);
        click(&mut s, MouseEventKind::ScrollUp, 10, 5);
        assert_eq!(s.focused_view().scroll(), 0);
    }

    #[test]
    fn tab_bar_click_switches_view() {
        let mut s = session(&["a", "b", "c"], 16);
        // " a │ b │ c │"
        click(&mut s, MouseEventKind::Down(MouseButton::Left), 5, 0);
        assert_eq!(s.focused(), 1);
        assert_focus_consistent(&s);

        click(&mut s, MouseEventKind::ScrollDown, 5, 0);
        click(&mut s, MouseEventKind::ScrollDown, 5, 0);
        click(&mut s, MouseEventKind::ScrollDown, 5, 0);
        click(&mut s, MouseEventKind::Down(MouseButton::Left), 1, 0);
        assert_eq!(s.focused(), 2);

        click(&mut s, MouseEventKind::Down(MouseButton::Left), 0, 0);
        click(&mut s, MouseEventKind::Down(MouseButton::Left), 1, 0);
        assert_eq!(s.focused(), 1);
    }

    #[test]
    fn help_popup_swallows_next_key() {
        let mut s = session(&["a"], 16);
        press(&mut s, KeyCode::Char('?'), KeyModifiers::SHIFT);
        assert_eq!(s.popup(), &Popup::Help);
        chars(&mut s, "q");
        assert_eq!(s.popup(), &Popup::None);
        assert!(!s.should_quit());
        chars(&mut s, "q");
        assert!(s.should_quit());
    }

    #[test]
    fn error_popup_needs_dismiss_key() {
        let mut s = session(&["a"], 16).with_startup_errors(vec!["missing.bin: not found".into()]);
        chars(&mut s, "z");
        assert!(matches!(s.popup(), Popup::Errors(_)));

        let area = Rect::new(0, 0, 80, 24);
        let mut buf = Buffer::empty(area);
        s.render(area, &mut buf);
        assert!((0..24).any(|y| row_text(&buf, y).contains("missing.bin: not found")));

        press(&mut s, KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(s.popup(), &Popup::None);
        assert!(s.prompt().is_none());
    }

    #[test]
    fn draw_tracks_terminal_size() {
        let mut s = session(&["a"], 4096);
        for _ in 0..40 {
            press(&mut s, KeyCode::Down, KeyModifiers::NONE);
        }
        let mut terminal = Terminal::new(TestBackend::new(70, 10)).expect("terminal");
        terminal.draw(|f| s.draw(f)).expect("draw");
        // 本体は7行
        assert_eq!(s.focused_view().scroll(), (40 - 6) * 16);
        let buf = terminal.backend().buffer();
        assert!(row_text(buf, 9).starts_with("pattern: "));
    }
}
