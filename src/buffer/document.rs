use std::fs::OpenOptions;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use memmap2::MmapMut;
use tracing::{debug, warn};
use unicode_width::UnicodeWidthStr;

use super::BufferError;

/// バイト列の実体
enum Storage {
    /// 読み書き可能なメモリマップ
    Mapped(MmapMut),
    /// メモリ上のバイト列（空ファイル・テスト用）
    Memory(Vec<u8>),
}

impl Deref for Storage {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Storage::Mapped(map) => &map[..],
            Storage::Memory(data) => &data[..],
        }
    }
}

impl DerefMut for Storage {
    fn deref_mut(&mut self) -> &mut [u8] {
        match self {
            Storage::Mapped(map) => &mut map[..],
            Storage::Memory(data) => &mut data[..],
        }
    }
}

/// 固定長のバイナリドキュメント
///
/// サイズは開いた時点で固定され、編集はすべてその場での上書きになる。
pub struct Document {
    /// ファイルパス
    path: Option<PathBuf>,
    /// 表示名
    name: String,
    /// バッファデータ
    storage: Storage,
}

impl Document {
    /// ファイルを読み書きモードでマップして開く
    pub fn open(path: impl AsRef<Path>) -> Result<Self, BufferError> {
        let path = absolute_path(path.as_ref())?;
        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        let len = file.metadata()?.len();

        // 長さ0のファイルはマップできない
        let storage = if len == 0 {
            Storage::Memory(Vec::new())
        } else {
            // SAFETY: the map is only accessed through this Document; concurrent
            // modification of the file by other processes is not guarded against.
            let map = unsafe { MmapMut::map_mut(&file)? };
            Storage::Mapped(map)
        };

        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        debug!(path = %path.display(), len, "mapped document");

        Ok(Self {
            path: Some(path),
            name,
            storage,
        })
    }

    /// バイト列から作成
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            path: None,
            name: name.into(),
            storage: Storage::Memory(data),
        }
    }

    /// データの長さを取得
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// データが空かどうか
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// 指定位置のバイトを取得
    pub fn get(&self, pos: usize) -> Option<u8> {
        self.storage.get(pos).copied()
    }

    /// 指定位置のバイトを設定
    pub fn set(&mut self, pos: usize, value: u8) -> Result<(), BufferError> {
        match self.storage.get_mut(pos) {
            Some(byte) => {
                *byte = value;
                Ok(())
            }
            None => Err(BufferError::OutOfBounds(pos)),
        }
    }

    /// 指定位置からバイト列を書き込む。末尾を超える分は書き込まない
    ///
    /// 戻り値は実際に書き込んだバイト数。
    pub fn write_truncated(&mut self, pos: usize, bytes: &[u8]) -> usize {
        let len = self.len();
        if pos >= len {
            return 0;
        }
        let count = bytes.len().min(len - pos);
        self.storage[pos..pos + count].copy_from_slice(&bytes[..count]);
        count
    }

    /// 表示名を取得
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 表示名の端末上の幅
    pub fn name_width(&self) -> usize {
        self.name.width()
    }

    /// ファイルパスを取得
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// 生データへの参照を取得
    pub fn data(&self) -> &[u8] {
        &self.storage
    }
}

impl Drop for Document {
    fn drop(&mut self) {
        if let Storage::Mapped(map) = &self.storage {
            if let Err(e) = map.flush() {
                warn!(name = %self.name, error = %e, "failed to flush mapped document");
            }
        }
    }
}

/// チルダ展開して絶対パスにする
fn absolute_path(path: &Path) -> Result<PathBuf, BufferError> {
    let expanded = match path.strip_prefix("~") {
        Ok(rest) => match std::env::var_os("HOME") {
            Some(home) => PathBuf::from(home).join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    };
    if expanded.is_absolute() {
        Ok(expanded)
    } else {
        Ok(std::env::current_dir()?.join(expanded))
    }
}
