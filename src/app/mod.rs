pub mod layout;
mod session;
mod view;

pub use layout::{Direction, LayoutError, LayoutTree, NodeId, NodeKind, SplitAxis};
pub use session::{open_files, Session};
pub use view::{DisplayMode, View};

use crossterm::event::KeyCode;

/// 行入力プロンプトの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// カーソル位置の値を書き換える
    Edit,
    /// オフセットへ移動
    Goto,
}

/// 行入力プロンプト。確定かキャンセルまでキー入力を横取りする
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub kind: PromptKind,
    pub input: String,
}

impl Prompt {
    pub fn new(kind: PromptKind) -> Self {
        Self {
            kind,
            input: String::new(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self.kind {
            PromptKind::Edit => "New value: ",
            PromptKind::Goto => "Go to offset: ",
        }
    }
}

/// 画面中央のポップアップ
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Popup {
    #[default]
    None,
    /// キー一覧。どのキーでも閉じる
    Help,
    /// 起動時に開けなかったファイル
    Errors(Vec<String>),
}

/// アプリケーションアクション
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,

    // カーソル移動
    ForwardByte,
    BackwardByte,
    ForwardWord,
    BackwardWord,
    ForwardDword,
    BackwardDword,
    ForwardParagraph,
    BackwardParagraph,
    PageUp,
    PageDown,
    StartOfLine,
    EndOfLine,
    StartOfFile,
    EndOfFile,

    // プロンプト
    Edit,
    Goto,

    // 表示
    NarrowWidth,
    WidenWidth,
    SetMode(DisplayMode),
    ToggleEndian,
    Help,

    // ペイン
    SwitchView(usize),
    Split(SplitAxis),
    Focus(Direction),
    KillSplit,

    None,
}

/// キー修飾子
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyMod {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Action {
    /// キーコードからアクションに変換（Emacsキーバインド）
    ///
    /// 記号や大文字は端末によってSHIFTが付くので、文字キーではSHIFTを見ない。
    pub fn from_key(key: KeyCode, mods: KeyMod) -> Self {
        let KeyMod { ctrl, alt, .. } = mods;

        match (key, ctrl, alt) {
            // === 終了 ===
            (KeyCode::Char('c'), true, false) => Action::Quit,
            (KeyCode::Char('q'), false, false) => Action::Quit,

            // === Emacsカーソル移動 ===
            (KeyCode::Char('f'), true, false) => Action::ForwardByte,
            (KeyCode::Char('b'), true, false) => Action::BackwardByte,
            (KeyCode::Char('n'), true, false) => Action::ForwardParagraph,
            (KeyCode::Char('p'), true, false) => Action::BackwardParagraph,
            (KeyCode::Char('a'), true, false) => Action::StartOfLine,
            (KeyCode::Char('e'), true, false) => Action::EndOfLine,
            (KeyCode::Char('v'), true, false) => Action::PageDown,
            // M-f / M-b: ワード単位
            (KeyCode::Char('f'), false, true) => Action::ForwardWord,
            (KeyCode::Char('b'), false, true) => Action::BackwardWord,
            (KeyCode::Char('v'), false, true) => Action::PageUp,
            // M-< / M->: ファイル先頭・末尾
            (KeyCode::Char('<'), false, true) => Action::StartOfFile,
            (KeyCode::Char('>'), false, true) => Action::EndOfFile,

            // 矢印キー（Altでダブルワード単位）
            (KeyCode::Right, false, false) => Action::ForwardByte,
            (KeyCode::Left, false, false) => Action::BackwardByte,
            (KeyCode::Right, false, true) => Action::ForwardDword,
            (KeyCode::Left, false, true) => Action::BackwardDword,
            (KeyCode::Down, false, false) => Action::ForwardParagraph,
            (KeyCode::Up, false, false) => Action::BackwardParagraph,
            (KeyCode::Home, _, _) => Action::StartOfLine,
            (KeyCode::End, _, _) => Action::EndOfLine,
            (KeyCode::PageUp, _, _) => Action::PageUp,
            (KeyCode::PageDown, _, _) => Action::PageDown,

            // === プロンプト ===
            (KeyCode::Enter, false, false) => Action::Edit,
            (KeyCode::Char('g'), false, true) => Action::Goto,

            // === 表示 ===
            (KeyCode::Char('H'), false, false) => Action::NarrowWidth,
            (KeyCode::Char('L'), false, false) => Action::WidenWidth,
            (KeyCode::Char('p'), false, false) => Action::SetMode(DisplayMode::Pattern),
            (KeyCode::Char('i'), false, false) => Action::SetMode(DisplayMode::SignedInt),
            (KeyCode::Char('u'), false, false) => Action::SetMode(DisplayMode::UnsignedInt),
            (KeyCode::Char('c'), false, false) => Action::SetMode(DisplayMode::Char),
            (KeyCode::Char('e'), false, false) => Action::ToggleEndian,
            (KeyCode::Char('?'), false, false) => Action::Help,
            (KeyCode::F(1), _, _) => Action::Help,

            // === ペイン ===
            (KeyCode::Char(d @ '1'..='9'), false, true) => Action::SwitchView(d as usize - '1' as usize),
            (KeyCode::Char('|'), false, true) => Action::Split(SplitAxis::Horizontal),
            (KeyCode::Char('-' | '_'), false, true) => Action::Split(SplitAxis::Vertical),
            (KeyCode::Char('u'), false, true) => Action::Focus(Direction::Up),
            (KeyCode::Char('d'), false, true) => Action::Focus(Direction::Down),
            (KeyCode::Char('l'), false, true) => Action::Focus(Direction::Left),
            (KeyCode::Char('r'), false, true) => Action::Focus(Direction::Right),
            (KeyCode::Char('0'), false, true) => Action::KillSplit,

            _ => Action::None,
        }
    }
}
