//! ログ出力の初期化
//!
//! 端末はTUIが占有するので、ログはユーザーの状態ディレクトリのファイルに書く。

use std::path::PathBuf;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// ログレベルを指定する環境変数
pub const LOG_ENV: &str = "SHX_LOG";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("create log directory failed")]
    CreateLogDir {
        #[source]
        source: std::io::Error,
    },
    #[error("initialize tracing subscriber failed")]
    InitSubscriber {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// `SHX_LOG`（既定は `info`）のフィルタで `shx.log` への出力を設定する
pub fn init_logging() -> Result<PathBuf, LoggingError> {
    let log_dir = user_log_dir();
    std::fs::create_dir_all(&log_dir).map_err(|source| LoggingError::CreateLogDir { source })?;

    let file_appender = tracing_appender::rolling::never(&log_dir, "shx.log");
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(file_appender)
        .with_ansi(false)
        .try_init()
        .map_err(|source| LoggingError::InitSubscriber { source })?;

    Ok(log_dir)
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// ログの置き場所
pub fn user_log_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("LOCALAPPDATA")
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir)
            .join("shx")
            .join("logs")
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir)
            .join("Library")
            .join("Logs")
            .join("shx")
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    {
        if let Some(state_home) = std::env::var_os("XDG_STATE_HOME").map(PathBuf::from) {
            return state_home.join("shx").join("logs");
        }
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir)
            .join(".local")
            .join("state")
            .join("shx")
            .join("logs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_dir_ends_with_app_name() {
        let dir = user_log_dir();
        assert!(dir.components().any(|c| c.as_os_str() == "shx"));
    }
}
