// src/error.rs
use std::path::PathBuf;

use thiserror::Error;

/// ルートファイル 1 件の処理で発生するエラー。
///
/// ルートテーブルはこれを握りつぶしてログに出すだけなので、
/// watch セッションが落ちることはない。
#[derive(Debug, Error)]
pub enum RouteError {
    /// ファイルの読み込みに失敗
    #[error("ファイルを読み込めません {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// SWC によるパースに失敗
    #[error("パースエラー {path:?}: {message}")]
    Parse { path: PathBuf, message: String },

    /// blocking タスクがパニックまたはキャンセルされた
    #[error("解析タスクが異常終了しました: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// プラグイン構成時に検出されるエラー。ビルド時まで遅延させない。
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("設定ファイルを読み込めません {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("設定ファイルの形式が不正です: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("拡張子が 1 つも指定されていません")]
    NoExtensions,

    #[error("不正な拡張子です: {0:?} (先頭の '.' や区切り文字は不要)")]
    InvalidExtension(String),

    #[error("パスを絶対パス化できません {path:?}: {source}")]
    Absolutize {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
