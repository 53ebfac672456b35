//! Shared fixtures for integration tests.

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub const PAGE: &str = "export default function Page() { return <div>page</div>; }\n";

pub const PAGE_WITH_ROUTE: &str = r#"
export const route = { load: () => fetch("/api") };
export default function Page() { return <main />; }
"#;

/// A throwaway project with an empty `src/routes` directory.
pub struct Project {
    _tmp: TempDir,
    pub root: PathBuf,
    pub routes: PathBuf,
}

impl Project {
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().canonicalize().unwrap();
        let routes = root.join("src").join("routes");
        fs::create_dir_all(&routes).unwrap();
        Project {
            _tmp: tmp,
            root,
            routes,
        }
    }

    /// Write a file relative to the routes directory and return its absolute path.
    pub fn write(&self, rel: &str, src: &str) -> PathBuf {
        let path = self.routes.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, src).unwrap();
        path
    }

    #[allow(dead_code)]
    pub fn delete(&self, rel: &str) -> PathBuf {
        let path = self.routes.join(rel);
        fs::remove_file(&path).unwrap();
        path
    }
}

#[allow(dead_code)]
pub fn ids<'a>(nodes: impl IntoIterator<Item = &'a solid_fs_routes::RouteNode>) -> Vec<String> {
    nodes.into_iter().map(|n| n.id.clone()).collect()
}
