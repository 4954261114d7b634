mod hex_view;
mod tab_bar;

pub use hex_view::{byte_at_column, char_column, hex_column, HexView, BYTES_PER_ROW};
pub use tab_bar::{tab_at_column, TabBar};

use ratatui::style::{Color, Modifier, Style};

/// 画面全体の配色
///
/// 描画時に参照で渡す。実行中に変更されることはない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub fg: Color,
    pub bg: Color,
    /// 表示できないバイトの `.`
    pub unprintable: Color,
    pub cursor_fg: Color,
    pub cursor_pattern: Color,
    pub cursor_signed: Color,
    pub cursor_unsigned: Color,
    pub cursor_char: Color,
    /// ペイン区切り線
    pub separator: Color,
    /// ステータス行・選択中のタブ
    pub status: Style,
    pub popup: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            fg: Color::Reset,
            bg: Color::Reset,
            unprintable: Color::Red,
            cursor_fg: Color::Black,
            cursor_pattern: Color::Blue,
            cursor_signed: Color::Magenta,
            cursor_unsigned: Color::Yellow,
            cursor_char: Color::Green,
            separator: Color::DarkGray,
            status: Style::default().add_modifier(Modifier::REVERSED),
            popup: Style::default().fg(Color::Black).bg(Color::White),
        }
    }
}

impl Theme {
    /// 色を使わない配色
    pub fn monochrome() -> Self {
        Self {
            unprintable: Color::Reset,
            cursor_fg: Color::Black,
            cursor_pattern: Color::White,
            cursor_signed: Color::White,
            cursor_unsigned: Color::White,
            cursor_char: Color::White,
            separator: Color::Reset,
            popup: Style::default().add_modifier(Modifier::REVERSED),
            ..Self::default()
        }
    }

    pub fn base(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }
}
