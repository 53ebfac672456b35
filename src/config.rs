// src/config.rs
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::codegen::BuildMode;
use crate::error::ConfigError;
use crate::router::{FileRouter, SolidStartRouter};

/// `dir` 未指定時のルートディレクトリ (プロジェクトルートからの相対)
pub const DEFAULT_ROUTES_DIR: &str = "src/routes";

/// `extensions` 未指定時の拡張子
pub const DEFAULT_EXTENSIONS: [&str; 2] = ["jsx", "tsx"];

/// ルート探索の設定。TOML ファイルからも読み込める
///
/// ```toml
/// dir = "src/pages"
/// extensions = ["tsx", "mdx"]
/// ```
#[derive(Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoutesOptions {
    /// ルートファイルを探すディレクトリ
    pub dir: Option<PathBuf>,

    /// ルートとして扱う拡張子 (先頭の `.` なし)
    pub extensions: Option<Vec<String>>,

    /// 独自のルーター。指定すると `dir` / `extensions` は無視される
    #[serde(skip)]
    pub router: Option<Arc<dyn FileRouter>>,
}

impl RoutesOptions {
    pub fn from_toml_str(src: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(src)?)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let src = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&src)
    }

    /// 未指定の項目を `other` の値で埋める (自分の値が優先)
    pub fn or(self, other: RoutesOptions) -> RoutesOptions {
        RoutesOptions {
            dir: self.dir.or(other.dir),
            extensions: self.extensions.or(other.extensions),
            router: self.router.or(other.router),
        }
    }

    /// ルーターを確定する。設定の不備はここでエラーになる
    pub fn into_router(self, root: &Path) -> Result<Arc<dyn FileRouter>, ConfigError> {
        if let Some(router) = self.router {
            return Ok(router);
        }

        let dir = root.join(self.dir.unwrap_or_else(|| PathBuf::from(DEFAULT_ROUTES_DIR)));
        let extensions = self
            .extensions
            .unwrap_or_else(|| DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect());

        Ok(Arc::new(SolidStartRouter::new(&dir, extensions)?))
    }
}

/// ホスト側から与えられるプロジェクト情報
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    /// プロジェクトルート
    pub root: PathBuf,
    pub mode: BuildMode,
}

impl ProjectConfig {
    pub fn new(root: impl Into<PathBuf>, mode: BuildMode) -> Self {
        ProjectConfig {
            root: root.into(),
            mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModuleExports, RouteDescriptor};

    /// `pages/*.page` だけをルートとみなす最小のルーター
    struct PagesRouter;

    impl FileRouter for PagesRouter {
        fn dir(&self) -> PathBuf {
            PathBuf::from("/site/pages")
        }

        fn is_route(&self, path: &Path) -> bool {
            path.starts_with("/site/pages") && path.extension().is_some_and(|e| e == "page")
        }

        fn to_id(&self, path: &Path) -> Option<String> {
            let stem = path.file_stem()?.to_str()?;
            self.is_route(path).then(|| format!("/{stem}"))
        }

        fn to_route(&self, _path: &Path, _exports: &ModuleExports) -> Option<RouteDescriptor> {
            None
        }
    }

    #[test]
    fn parses_toml_options() {
        let opts = RoutesOptions::from_toml_str(
            r#"
            dir = "src/pages"
            extensions = ["tsx", "mdx"]
            "#,
        )
        .unwrap();
        assert_eq!(opts.dir.as_deref(), Some(Path::new("src/pages")));
        assert_eq!(opts.extensions, Some(vec!["tsx".to_string(), "mdx".to_string()]));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            RoutesOptions::from_toml_str("directory = \"x\""),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn defaults_to_src_routes() {
        let router = RoutesOptions::default().into_router(Path::new("/app")).unwrap();
        assert_eq!(router.dir(), PathBuf::from("/app/src/routes"));
        assert!(router.is_route(Path::new("/app/src/routes/a.jsx")));
        assert!(!router.is_route(Path::new("/app/src/routes/a.md")));
    }

    #[test]
    fn explicit_values_win_over_file_values() {
        let cli = RoutesOptions {
            extensions: Some(vec!["tsx".into()]),
            ..Default::default()
        };
        let file = RoutesOptions {
            dir: Some("pages".into()),
            extensions: Some(vec!["jsx".into()]),
            ..Default::default()
        };
        let merged = cli.or(file);
        assert_eq!(merged.dir.as_deref(), Some(Path::new("pages")));
        assert_eq!(merged.extensions, Some(vec!["tsx".to_string()]));
    }

    #[test]
    fn invalid_extensions_fail_at_configuration_time() {
        let opts = RoutesOptions {
            extensions: Some(vec![]),
            ..Default::default()
        };
        assert!(matches!(
            opts.into_router(Path::new("/app")),
            Err(ConfigError::NoExtensions)
        ));
    }

    #[test]
    fn custom_router_ignores_dir_and_extensions() {
        let opts = RoutesOptions {
            dir: Some("nonexistent".into()),
            extensions: Some(vec![]),
            router: Some(Arc::new(PagesRouter)),
        };
        let router = match opts.into_router(Path::new("/app")) {
            Ok(router) => router,
            Err(e) => panic!("custom router must not be validated: {e}"),
        };

        assert_eq!(router.dir(), PathBuf::from("/site/pages"));
        assert!(router.is_route(Path::new("/site/pages/home.page")));
        assert!(!router.is_route(Path::new("/app/nonexistent/home.tsx")));
    }
}
