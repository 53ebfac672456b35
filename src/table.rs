// src/table.rs
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

use crate::error::RouteError;
use crate::model::{ModuleExports, RouteChange, RouteDescriptor};
use crate::parser::analyze_module;
use crate::router::FileRouter;

/// 変更通知チャネルの容量
const EVENT_CAPACITY: usize = 64;

/// 初回スキャンの状態
enum Lifecycle {
    Unbuilt,
    /// スキャン実行中。後続の呼び出しはこの future の完了を待つ
    Building(Shared<BoxFuture<'static, ()>>),
    Built,
}

struct TableState {
    /// ルート ID → 記述子
    routes: BTreeMap<String, RouteDescriptor>,
    lifecycle: Lifecycle,
}

struct Inner {
    router: Arc<dyn FileRouter>,
    state: Mutex<TableState>,
    events: broadcast::Sender<RouteChange>,
}

/// ルート ID から記述子へのインメモリ表。
///
/// 変更は `add_or_update` / `remove` からのみ行われ、変更のたびに
/// `RouteChange` が購読者へ送られる。クローンは同じ表を共有するハンドル。
#[derive(Clone)]
pub struct RouteTable {
    inner: Arc<Inner>,
}

impl RouteTable {
    pub fn new(router: Arc<dyn FileRouter>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        RouteTable {
            inner: Arc::new(Inner {
                router,
                state: Mutex::new(TableState {
                    routes: BTreeMap::new(),
                    lifecycle: Lifecycle::Unbuilt,
                }),
                events,
            }),
        }
    }

    pub fn router(&self) -> &Arc<dyn FileRouter> {
        &self.inner.router
    }

    /// 変更通知を購読する
    pub fn subscribe(&self) -> broadcast::Receiver<RouteChange> {
        self.inner.events.subscribe()
    }

    /// 現在の内容 (id 順)
    pub fn snapshot(&self) -> Vec<RouteDescriptor> {
        self.state().routes.values().cloned().collect()
    }

    pub fn is_built(&self) -> bool {
        matches!(self.state().lifecycle, Lifecycle::Built)
    }

    /// ルートファイルを解析して追加または置き換える。
    ///
    /// 解析に失敗した場合はログを出すだけで表は変更しない。
    pub async fn add_or_update(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        if !self.inner.router.is_route(path) {
            return;
        }

        match self.load_route(path.to_path_buf()).await {
            Ok(Some(route)) => {
                tracing::debug!(id = %route.id, path = ?path, "ルートを登録");
                self.state().routes.insert(route.id.clone(), route.clone());
                self.notify(Some(route));
            }
            Ok(None) => {
                tracing::debug!(path = ?path, "ルートとして扱わないファイル");
            }
            Err(e) => {
                tracing::error!(error = %e, "ルートファイルの解析に失敗しました");
            }
        }
    }

    /// ルートファイルに対応するエントリを削除する (存在しなくても通知は送る)
    pub fn remove(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        if !self.inner.router.is_route(path) {
            return;
        }
        let Some(id) = self.inner.router.to_id(path) else {
            return;
        };

        let existed = self.state().routes.remove(&id).is_some();
        tracing::debug!(id = %id, existed, "ルートを削除");
        self.notify(None);
    }

    /// 初回のみディレクトリ全体をスキャンし、現在の内容を返す。
    ///
    /// スキャン中に呼ばれた場合は実行中のスキャンの完了を待つだけで、
    /// 二重にスキャンすることはない。
    pub async fn ensure_built(&self) -> Vec<RouteDescriptor> {
        let pending = {
            let mut guard = self.state();
            let state = &mut *guard;
            match &state.lifecycle {
                Lifecycle::Built => return state.routes.values().cloned().collect(),
                Lifecycle::Building(pending) => pending.clone(),
                Lifecycle::Unbuilt => {
                    let pending = self.clone().scan().boxed().shared();
                    state.lifecycle = Lifecycle::Building(pending.clone());
                    pending
                }
            }
        };

        pending.await;
        self.snapshot()
    }

    async fn scan(self) {
        let router = self.inner.router.clone();
        tracing::info!(dir = ?router.dir(), "ルートディレクトリをスキャン中");

        let files: Vec<PathBuf> = match tokio::task::spawn_blocking(move || router.route_files()).await {
            Ok(files) => files,
            Err(e) => {
                tracing::error!(error = %e, "ルートファイルの列挙に失敗しました");
                Vec::new()
            }
        };

        for file in &files {
            self.add_or_update(file).await;
        }

        let count = {
            let mut state = self.state();
            state.lifecycle = Lifecycle::Built;
            state.routes.len()
        };
        tracing::info!(files = files.len(), routes = count, "スキャン完了");
    }

    /// blocking スレッドでファイルを解析し、ルーターに記述子を作らせる
    async fn load_route(&self, path: PathBuf) -> Result<Option<RouteDescriptor>, RouteError> {
        let router = self.inner.router.clone();
        tokio::task::spawn_blocking(move || -> Result<Option<RouteDescriptor>, RouteError> {
            let exports = if router.needs_analysis(&path) {
                analyze_module(&path)?
            } else {
                ModuleExports::default()
            };
            Ok(router.to_route(&path, &exports))
        })
        .await?
    }

    fn notify(&self, route: Option<RouteDescriptor>) {
        // 購読者がいない場合の送信エラーは無視する
        let _ = self.inner.events.send(RouteChange { route });
    }

    fn state(&self) -> MutexGuard<'_, TableState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
