use ratatui::{buffer::Buffer, layout::Rect, style::Color, widgets::Widget};
use tracing::{debug, warn};

use crate::buffer::value::{self, IntWidth, ValueError};
use crate::buffer::Document;
use crate::ui::{byte_at_column, HexView, Theme, BYTES_PER_ROW};

const ROW: usize = BYTES_PER_ROW;
const ROW_MASK: usize = !(ROW - 1);

/// カーソル位置の解釈方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    /// ビットパターン
    #[default]
    Pattern,
    SignedInt,
    UnsignedInt,
    Char,
}

/// 開いているファイル1つ分の表示状態
pub struct View {
    document: Document,
    /// カーソル位置
    cursor: usize,
    /// 表示開始オフセット（16の倍数）
    scroll: usize,
    mode: DisplayMode,
    width: IntWidth,
    big_endian: bool,
    focused: bool,
}

impl View {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            cursor: 0,
            scroll: 0,
            mode: DisplayMode::Pattern,
            width: IntWidth::W8,
            big_endian: false,
            focused: false,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn int_width(&self) -> IntWidth {
        self.width
    }

    pub fn is_big_endian(&self) -> bool {
        self.big_endian
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// フォーカス表示の切替（レイアウトツリーからのみ呼ぶ）
    pub(crate) fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    pub fn set_mode(&mut self, mode: DisplayMode) {
        self.mode = mode;
    }

    pub fn set_big_endian(&mut self, big_endian: bool) {
        self.big_endian = big_endian;
    }

    pub fn toggle_endian(&mut self) {
        self.big_endian = !self.big_endian;
    }

    pub fn narrow_width(&mut self) {
        self.width = self.width.narrower();
    }

    pub fn widen_width(&mut self) {
        self.width = self.width.wider();
    }

    /// 最終バイトの位置（空ファイルなら `None`）
    fn last(&self) -> Option<usize> {
        self.document.len().checked_sub(1)
    }

    /// 最終行の先頭オフセット
    fn last_row(&self) -> usize {
        self.last().map_or(0, |last| last & ROW_MASK)
    }

    /// 前方に `step` バイト進む。末尾を越える場合は最終バイトに止まる
    fn step_forward(&mut self, step: usize) {
        if let Some(last) = self.last() {
            self.cursor = self.cursor.saturating_add(step).min(last);
        }
    }

    /// 後方に `step` バイト戻る。先頭を越える場合は0に止まる
    fn step_backward(&mut self, step: usize) {
        self.cursor = self.cursor.saturating_sub(step);
    }

    pub fn forward_byte(&mut self) {
        self.step_forward(1);
    }

    pub fn backward_byte(&mut self) {
        self.step_backward(1);
    }

    pub fn forward_word(&mut self) {
        self.step_forward(2);
    }

    pub fn backward_word(&mut self) {
        self.step_backward(2);
    }

    pub fn forward_dword(&mut self) {
        self.step_forward(4);
    }

    pub fn backward_dword(&mut self) {
        self.step_backward(4);
    }

    /// 1行下へ。1行分進めない場合は動かない
    pub fn forward_paragraph(&mut self) {
        if let Some(last) = self.last() {
            if self.cursor + ROW <= last {
                self.cursor += ROW;
            }
        }
    }

    /// 1行上へ。1行分戻れない場合は動かない
    pub fn backward_paragraph(&mut self) {
        if self.cursor >= ROW {
            self.cursor -= ROW;
        }
    }

    pub fn start_of_file(&mut self) {
        self.cursor = 0;
    }

    pub fn end_of_file(&mut self) {
        self.cursor = self.last().unwrap_or(0);
    }

    pub fn start_of_line(&mut self) {
        self.cursor &= ROW_MASK;
    }

    pub fn end_of_line(&mut self) {
        if let Some(last) = self.last() {
            self.cursor = (self.cursor | (ROW - 1)).min(last);
        }
    }

    /// 1画面分上にスクロールし、カーソルを表示先頭へ
    pub fn page_up(&mut self, rows: usize) {
        self.scroll = self.scroll.saturating_sub(rows.max(1) * ROW);
        self.cursor = self.scroll;
    }

    /// 1画面分下にスクロールし、カーソルを表示先頭へ
    pub fn page_down(&mut self, rows: usize) {
        if self.document.is_empty() {
            return;
        }
        self.scroll = (self.scroll + rows.max(1) * ROW).min(self.last_row());
        self.cursor = self.scroll;
    }

    /// 1行上にスクロール。カーソルは最下行より下に出ないよう寄せる
    pub fn scroll_up(&mut self, rows: usize) {
        if self.scroll == 0 {
            return;
        }
        self.scroll -= ROW;
        let last_visible = self.scroll + rows.max(1) * ROW - 1;
        self.cursor = self.cursor.min(last_visible);
    }

    /// 1行下にスクロール。次の行がEOFより後なら動かない
    pub fn scroll_down(&mut self) {
        if self.scroll + ROW < self.document.len() {
            self.scroll += ROW;
            self.cursor = self.cursor.max(self.scroll);
        }
    }

    /// カーソル行が表示範囲に入るようにスクロールを合わせる
    ///
    /// カーソルを動かすコマンドの後に必ず呼ぶ。
    pub fn follow(&mut self, rows: usize) {
        let span = (rows.max(1) - 1) * ROW;
        let row = self.cursor & ROW_MASK;
        if row < self.scroll {
            self.scroll = row;
        } else if row > self.scroll + span {
            self.scroll = row - span;
        }
    }

    /// 入力されたオフセットへ移動。不正な入力は無視する
    pub fn goto(&mut self, text: &str) -> Result<(), ValueError> {
        let target = value::parse_signed(text, IntWidth::W64)?;
        if target < 0 {
            return Err(ValueError::Parse(text.to_string()));
        }
        let Some(last) = self.last() else {
            return Ok(());
        };
        self.cursor = usize::try_from(target).unwrap_or(usize::MAX).min(last);
        self.scroll = self.cursor & ROW_MASK;
        Ok(())
    }

    /// 領域内の座標 (x, y) のバイトにカーソルを移す
    pub fn click(&mut self, x: u16, y: u16) {
        let Some(last) = self.last() else {
            return;
        };
        let offset = self.scroll + y as usize * ROW + byte_at_column(x);
        self.cursor = offset.min(last);
    }

    /// 現在のモードで一度に扱うバイト数
    fn span(&self) -> usize {
        match self.mode {
            DisplayMode::SignedInt | DisplayMode::UnsignedInt => self.width.bytes(),
            DisplayMode::Pattern | DisplayMode::Char => 1,
        }
    }

    /// カーソルの色
    pub fn cursor_color(&self, theme: &Theme) -> Color {
        match self.mode {
            DisplayMode::Pattern => theme.cursor_pattern,
            DisplayMode::SignedInt => theme.cursor_signed,
            DisplayMode::UnsignedInt => theme.cursor_unsigned,
            DisplayMode::Char => theme.cursor_char,
        }
    }

    /// カーソル位置の値を読む
    fn read_cursor(&self) -> Result<String, ValueError> {
        let data = self.document.data().get(self.cursor..).unwrap_or_default();
        let Some(&byte) = data.first() else {
            return Err(ValueError::Unavailable { needed: 1, available: 0 });
        };
        let bits = self.width.bits();
        Ok(match self.mode {
            DisplayMode::Pattern => format!("pattern: {:08b}", byte),
            DisplayMode::Char => format!("char: {}", char_label(byte)),
            DisplayMode::SignedInt => {
                let v = value::decode_signed(data, self.width, self.big_endian)?;
                format!("int{}: {}", bits, v)
            }
            DisplayMode::UnsignedInt => {
                let v = value::decode(data, self.width, self.big_endian)?;
                format!("uint{}: {}", bits, v)
            }
        })
    }

    /// カーソル位置の値をモードに従って表示用の文字列にする
    ///
    /// 末尾までのバイトが足りない場合は `???`。
    pub fn describe_cursor(&self) -> String {
        self.read_cursor().unwrap_or_else(|_| "???".to_string())
    }

    /// エンディアン表示
    pub fn endian_label(&self) -> &'static str {
        if self.big_endian { "BIGEND" } else { "lilend" }
    }

    /// 入力値をカーソル位置に書き込む
    ///
    /// 解析できない入力は何もしない。整数はEOFを越える分を書かない。
    pub fn apply_edit(&mut self, text: &str) -> Result<(), ValueError> {
        if self.document.is_empty() {
            return Ok(());
        }
        let bytes = match self.mode {
            DisplayMode::Pattern => {
                let byte = value::parse_hex_byte(text)?;
                self.write_byte(byte);
                return Ok(());
            }
            DisplayMode::Char => {
                // 空白も1文字として書く
                if let Some(&byte) = text.as_bytes().first() {
                    self.write_byte(byte);
                }
                return Ok(());
            }
            DisplayMode::UnsignedInt => {
                let v = value::parse_unsigned(text, self.width)?;
                value::encode(v, self.width, self.big_endian)
            }
            DisplayMode::SignedInt => {
                let v = value::parse_signed(text, self.width)?;
                value::encode(v as u64, self.width, self.big_endian)
            }
        };
        let written = self.document.write_truncated(self.cursor, &bytes);
        debug!(offset = self.cursor, written, requested = bytes.len(), "edit applied");
        Ok(())
    }

    fn write_byte(&mut self, byte: u8) {
        match self.document.set(self.cursor, byte) {
            Ok(()) => debug!(offset = self.cursor, byte, "byte written"),
            Err(e) => warn!(%e, "edit skipped"),
        }
    }

    /// 領域にバイト列を描画する。ハイライトはフォーカス中のペインのみ
    pub fn render(&self, area: Rect, buf: &mut Buffer, theme: &Theme, pane_focused: bool) {
        let highlight = (self.focused && pane_focused).then(|| self.cursor_color(theme));
        HexView::new(self.document.data(), theme)
            .scroll(self.scroll)
            .cursor(self.cursor, self.span())
            .highlight(highlight)
            .render(area, buf);
    }
}

/// ステータス行用の1バイトの表記
///
/// 制御文字はキャレット表記（`^J`）、ASCII外は `\xNN`。
fn char_label(byte: u8) -> String {
    match byte {
        0x20..=0x7E => (byte as char).to_string(),
        0x00..=0x1F => format!("^{}", (byte | 0x40) as char),
        0x7F => "^?".to_string(),
        _ => format!("\\x{:02x}", byte),
    }
}
