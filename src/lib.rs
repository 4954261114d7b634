//! shx - 画面分割できるターミナル用HEXエディタ
//!
//! 複数のファイルをメモリマップで開き、ペインに分けて表示・編集する。

pub mod app;
pub mod buffer;
pub mod logging;
pub mod ui;
