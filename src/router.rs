// src/router.rs
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::ConfigError;
use crate::model::{ImportRef, ModuleExports, RouteDescriptor};
use crate::resolver::{normalize_path, strip_groups, RouteMatcher};

/// ファイルシステムからルートを導出する戦略。
///
/// 独自実装を `RoutesOptions::router` に渡すと、`dir` / `extensions` は無視される。
pub trait FileRouter: Send + Sync {
    /// スキャン対象のディレクトリ
    fn dir(&self) -> PathBuf;

    /// パスがルートファイルかどうか
    fn is_route(&self, path: &Path) -> bool;

    /// ルート ID。ルートファイルでなければ `None`
    fn to_id(&self, path: &Path) -> Option<String>;

    /// export を解析する必要があるか (Markdown などは不要)
    fn needs_analysis(&self, _path: &Path) -> bool {
        true
    }

    /// 解析済みの export からルート記述子を作る。`None` ならルートとして扱わない
    fn to_route(&self, path: &Path, exports: &ModuleExports) -> Option<RouteDescriptor>;

    /// 初回スキャンで列挙するファイル (blocking)
    fn route_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkDir::new(self.dir())
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && self.is_route(e.path()))
            .map(|e| e.into_path())
            .collect();
        files.sort();
        files
    }
}

/// SolidStart 互換のデフォルトルーター
///
/// - すべてのルートは自ファイルの default を遅延読み込みする `$component` を持つ
/// - `route` を export していれば即時読み込みの `$$route` を追加する
/// - `md` / `mdx` は解析せずにページとして扱う
#[derive(Debug, Clone)]
pub struct SolidStartRouter {
    matcher: RouteMatcher,
}

impl SolidStartRouter {
    pub fn new(dir: &Path, extensions: Vec<String>) -> Result<Self, ConfigError> {
        Ok(SolidStartRouter {
            matcher: RouteMatcher::new(dir, extensions)?,
        })
    }

    fn is_markdown(&self, path: &Path) -> bool {
        matches!(self.matcher.extension_of(path).as_deref(), Some("md" | "mdx"))
    }
}

impl FileRouter for SolidStartRouter {
    fn dir(&self) -> PathBuf {
        self.matcher.dir()
    }

    fn is_route(&self, path: &Path) -> bool {
        self.matcher.is_route_file(path)
    }

    fn to_id(&self, path: &Path) -> Option<String> {
        self.matcher.to_route_id(path)
    }

    fn needs_analysis(&self, path: &Path) -> bool {
        !self.is_markdown(path)
    }

    fn to_route(&self, path: &Path, exports: &ModuleExports) -> Option<RouteDescriptor> {
        let id = self.to_id(path)?;
        let src = normalize_path(path);

        let mut imports = vec![("$component".to_string(), ImportRef::lazy(src.clone()))];

        let page = if self.is_markdown(path) {
            true
        } else {
            if !exports.has_default() {
                tracing::warn!(path = ?path, "default export がありません");
            }
            if exports.has("route") {
                imports.push((
                    "$$route".to_string(),
                    ImportRef::eager(src, vec!["route".to_string()]),
                ));
            }
            exports.has_default()
        };

        Some(RouteDescriptor {
            path: strip_groups(&id),
            id,
            file_path: path.to_path_buf(),
            page,
            imports,
        })
    }
}
