//! Route table lifecycle: initial scan, incremental updates, fail-soft parsing.

mod common;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::{Project, PAGE, PAGE_WITH_ROUTE};
use solid_fs_routes::{FileRouter, ModuleExports, RouteDescriptor, RouteTable, SolidStartRouter};
use tokio::sync::broadcast::error::TryRecvError;

/// Delegates to the default router and counts directory scans.
struct CountingRouter {
    inner: SolidStartRouter,
    scans: AtomicUsize,
}

impl FileRouter for CountingRouter {
    fn dir(&self) -> PathBuf {
        self.inner.dir()
    }

    fn is_route(&self, path: &Path) -> bool {
        self.inner.is_route(path)
    }

    fn to_id(&self, path: &Path) -> Option<String> {
        self.inner.to_id(path)
    }

    fn to_route(&self, path: &Path, exports: &ModuleExports) -> Option<RouteDescriptor> {
        self.inner.to_route(path, exports)
    }

    fn route_files(&self) -> Vec<PathBuf> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        // widen the window in which a second caller can race the first
        std::thread::sleep(Duration::from_millis(50));
        self.inner.route_files()
    }
}

fn default_router(project: &Project) -> SolidStartRouter {
    SolidStartRouter::new(&project.routes, vec!["jsx".into(), "tsx".into()]).unwrap()
}

fn table(project: &Project) -> RouteTable {
    RouteTable::new(Arc::new(default_router(project)))
}

#[tokio::test]
async fn concurrent_ensure_built_scans_once() {
    let project = Project::new();
    project.write("index.tsx", PAGE);
    project.write("about.tsx", PAGE);

    let router = Arc::new(CountingRouter {
        inner: default_router(&project),
        scans: AtomicUsize::new(0),
    });
    let table = RouteTable::new(router.clone());

    let (a, b) = tokio::join!(table.ensure_built(), table.ensure_built());
    assert_eq!(router.scans.load(Ordering::SeqCst), 1);
    assert_eq!(a, b);
    assert_eq!(a.len(), 2);
    assert!(table.is_built());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let table = table.clone();
            tokio::spawn(async move { table.ensure_built().await.len() })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.await.unwrap(), 2);
    }
    assert_eq!(router.scans.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn ensure_built_from_parallel_tasks_scans_once() {
    let project = Project::new();
    project.write("index.tsx", PAGE);

    let router = Arc::new(CountingRouter {
        inner: default_router(&project),
        scans: AtomicUsize::new(0),
    });
    let table = RouteTable::new(router.clone());

    let first = tokio::spawn({
        let table = table.clone();
        async move { table.ensure_built().await }
    });
    let second = tokio::spawn({
        let table = table.clone();
        async move { table.ensure_built().await }
    });

    assert_eq!(first.await.unwrap().len(), 1);
    assert_eq!(second.await.unwrap().len(), 1);
    assert_eq!(router.scans.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn same_id_replaces_previous_entry() {
    let project = Project::new();
    let table = table(&project);

    let flat = project.write("blog.tsx", PAGE);
    table.add_or_update(&flat).await;
    let nested = project.write("blog/index.tsx", PAGE_WITH_ROUTE);
    table.add_or_update(&nested).await;

    let routes = table.snapshot();
    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0].id, "/blog");
    assert_eq!(routes[0].file_path, nested);
    assert_eq!(routes[0].imports.len(), 2);
}

#[tokio::test]
async fn update_reparses_the_file() {
    let project = Project::new();
    let table = table(&project);

    let path = project.write("about.tsx", PAGE);
    table.add_or_update(&path).await;
    assert_eq!(table.snapshot()[0].imports.len(), 1);

    project.write("about.tsx", PAGE_WITH_ROUTE);
    table.add_or_update(&path).await;
    let routes = table.snapshot();
    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0].imports[1].0, "$$route");
}

#[tokio::test]
async fn broken_file_leaves_table_unchanged() {
    let project = Project::new();
    let table = table(&project);
    let mut changes = table.subscribe();

    let path = project.write("about.tsx", PAGE_WITH_ROUTE);
    table.add_or_update(&path).await;
    let first = changes.try_recv().unwrap();
    assert_eq!(first.route.unwrap().id, "/about");

    project.write("about.tsx", "export default function ( {");
    table.add_or_update(&path).await;

    assert!(matches!(changes.try_recv(), Err(TryRecvError::Empty)));
    let routes = table.snapshot();
    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0].imports.len(), 2);
}

#[tokio::test]
async fn broken_file_does_not_abort_the_scan() {
    let project = Project::new();
    project.write("a.tsx", PAGE);
    project.write("b.tsx", "export default <<<");
    project.write("c.tsx", PAGE);

    let ids: Vec<String> = table(&project)
        .ensure_built()
        .await
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec!["/a", "/c"]);
}

#[tokio::test]
async fn missing_default_export_still_registers() {
    let project = Project::new();
    let table = table(&project);

    let path = project.write("api.tsx", "export function GET() {}\n");
    table.add_or_update(&path).await;

    let routes = table.snapshot();
    assert_eq!(routes.len(), 1);
    assert!(!routes[0].page);
}

#[tokio::test]
async fn remove_deletes_and_notifies() {
    let project = Project::new();
    let table = table(&project);
    let path = project.write("about.tsx", PAGE);
    table.add_or_update(&path).await;

    let mut changes = table.subscribe();
    table.remove(&path);

    assert!(table.snapshot().is_empty());
    assert!(changes.try_recv().unwrap().route.is_none());

    // removing an unknown route still notifies
    table.remove(project.routes.join("ghost.tsx"));
    assert!(changes.try_recv().unwrap().route.is_none());
}

#[tokio::test]
async fn non_route_paths_are_ignored() {
    let project = Project::new();
    let table = table(&project);
    let mut changes = table.subscribe();

    let css = project.write("style.css", "body {}");
    let outside = project.root.join("src").join("App.tsx");
    std::fs::write(&outside, PAGE).unwrap();

    table.add_or_update(&css).await;
    table.add_or_update(&outside).await;
    table.remove(&outside);

    assert!(table.snapshot().is_empty());
    assert!(matches!(changes.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn events_after_build_are_incremental() {
    let project = Project::new();
    project.write("index.tsx", PAGE);

    let router = Arc::new(CountingRouter {
        inner: default_router(&project),
        scans: AtomicUsize::new(0),
    });
    let table = RouteTable::new(router.clone());
    table.ensure_built().await;

    let added = project.write("contact.tsx", PAGE);
    table.add_or_update(&added).await;

    let ids: Vec<String> = table.ensure_built().await.into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec!["/", "/contact"]);
    assert_eq!(router.scans.load(Ordering::SeqCst), 1);
}
