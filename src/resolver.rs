// src/resolver.rs
use path_absolutize::Absolutize;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// ファイルパスをルートファイルかどうか判定し、ルート ID に変換する。
///
/// 設定 {ルートディレクトリ, 拡張子} に対する純粋関数のみを持つ。
#[derive(Debug, Clone)]
pub struct RouteMatcher {
    /// `/` 区切りに正規化したルートディレクトリ (末尾の `/` なし)
    dir: String,
    extensions: Vec<String>,
}

impl RouteMatcher {
    /// - `dir`: ルートファイルを探すディレクトリ (相対ならカレントディレクトリ基準)
    /// - `extensions`: 先頭の `.` を含まない拡張子の一覧 (例: `["jsx", "tsx"]`)
    pub fn new(dir: &Path, extensions: Vec<String>) -> Result<Self, ConfigError> {
        if extensions.is_empty() {
            return Err(ConfigError::NoExtensions);
        }
        if let Some(bad) = extensions
            .iter()
            .find(|e| e.is_empty() || e.contains(['.', '/', '\\']))
        {
            return Err(ConfigError::InvalidExtension(bad.clone()));
        }

        let abs = dir.absolutize().map_err(|source| ConfigError::Absolutize {
            path: dir.to_path_buf(),
            source,
        })?;
        let dir = to_slash(&abs).trim_end_matches('/').to_string();

        Ok(RouteMatcher { dir, extensions })
    }

    pub fn dir(&self) -> PathBuf {
        PathBuf::from(&self.dir)
    }

    /// ルートディレクトリ配下にあり、拡張子が一致し、隠しセグメントを含まないか
    pub fn is_route_file(&self, path: &Path) -> bool {
        self.split(path).is_some()
    }

    /// ルート ID を返す。`is_route_file` が偽のときは `None`
    ///
    /// 例: `<dir>/index.tsx` → `/`, `<dir>/blog/index.tsx` → `/blog`,
    ///     `<dir>/blog/(group)/[slug].tsx` → `/blog/(group)/[slug]`
    pub fn to_route_id(&self, path: &Path) -> Option<String> {
        let (stem, _) = self.split(path)?;

        let trimmed = if stem == "index" {
            ""
        } else if let Some(parent) = stem.strip_suffix("/index") {
            parent
        } else {
            stem.as_str()
        };
        Some(format!("/{trimmed}"))
    }

    /// マッチした拡張子を返す
    pub fn extension_of(&self, path: &Path) -> Option<String> {
        self.split(path).map(|(_, ext)| ext)
    }

    /// (ルートディレクトリからの相対パス (拡張子なし), 拡張子) に分解する
    fn split(&self, path: &Path) -> Option<(String, String)> {
        let normalized = normalize_path(path);
        let rel = normalized.strip_prefix(&self.dir)?.strip_prefix('/')?;

        // glob の `**/*` と同じく、ドットで始まるセグメントは対象外
        if rel.split('/').any(|seg| seg.is_empty() || seg.starts_with('.')) {
            return None;
        }

        let (stem, ext) = rel.rsplit_once('.')?;
        if stem.is_empty() || stem.ends_with('/') {
            return None;
        }
        if !self.extensions.iter().any(|e| e == ext) {
            return None;
        }
        Some((stem.to_string(), ext.to_string()))
    }
}

/// 絶対パス化し、区切り文字を `/` に揃える。絶対パス化に失敗した場合は元のパスをそのまま使う
pub fn normalize_path(path: &Path) -> String {
    match path.absolutize() {
        Ok(abs) => to_slash(&abs),
        Err(_) => to_slash(path),
    }
}

fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// `(group)` セグメントを取り除いた表示用パスを返す
pub fn strip_groups(id: &str) -> String {
    id.split('/')
        .filter(|seg| !(seg.len() > 2 && seg.starts_with('(') && seg.ends_with(')')))
        .collect::<Vec<_>>()
        .join("/")
}

/// `path` (絶対パス、クエリ付きも可) を `root` からの相対パスにする。
///
/// `root` 配下になければ共通の祖先まで `..` で遡る (例: `../shared/a.tsx`)
pub fn relative_to(root: &Path, path: &str) -> String {
    let root = normalize_path(root);
    let base: Vec<&str> = root.split('/').filter(|seg| !seg.is_empty()).collect();
    let target: Vec<&str> = path.split('/').filter(|seg| !seg.is_empty()).collect();

    let common = base
        .iter()
        .zip(&target)
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts = vec![".."; base.len() - common];
    parts.extend_from_slice(&target[common..]);
    parts.join("/")
}
