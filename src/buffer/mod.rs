mod document;
pub mod value;

pub use document::Document;

use std::path::PathBuf;

use thiserror::Error;

/// バッファ操作のエラー
#[derive(Debug, Error)]
pub enum BufferError {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("offset {0:#x} is out of bounds")]
    OutOfBounds(usize),
}

/// 起動時にファイルを開けなかった場合のエラー
#[derive(Debug, Error)]
#[error("{}: {source}", path.display())]
pub struct OpenError {
    pub path: PathBuf,
    #[source]
    pub source: BufferError,
}
