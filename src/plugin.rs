// src/plugin.rs
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::codegen::{generate, CodegenOptions, GeneratedModule};
use crate::config::{ProjectConfig, RoutesOptions};
use crate::error::ConfigError;
use crate::model::RouteNode;
use crate::reload::{HostServer, LiveReloadBridge};
use crate::table::RouteTable;
use crate::tree::build_route_tree;
use crate::watcher::WatchEvent;

/// アプリケーションが import する仮想モジュールの ID
pub const VIRTUAL_ROUTES_ID: &str = "virtual:solid-fs-routes/routes";

/// 解決済みの仮想モジュール ID (他のプラグインに処理させないため `\0` を付ける)
pub const RESOLVED_VIRTUAL_ROUTES_ID: &str = "\0virtual:solid-fs-routes/routes";

/// ホストのビルドツールに組み込むためのファサード
pub struct FsRoutesPlugin {
    table: RouteTable,
    codegen: CodegenOptions,
}

impl FsRoutesPlugin {
    /// 設定を確定させる。設定の不備はここでエラーになる
    pub fn new(project: ProjectConfig, options: RoutesOptions) -> Result<Self, ConfigError> {
        let router = options.into_router(&project.root)?;
        tracing::debug!(dir = ?router.dir(), mode = ?project.mode, "プラグイン構成完了");

        Ok(FsRoutesPlugin {
            table: RouteTable::new(router),
            codegen: CodegenOptions {
                root: project.root,
                mode: project.mode,
            },
        })
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// 仮想モジュールの ID 解決
    pub fn resolve_id(&self, id: &str) -> Option<&'static str> {
        (id == VIRTUAL_ROUTES_ID).then_some(RESOLVED_VIRTUAL_ROUTES_ID)
    }

    /// 解決済み ID に対して生成コードを返す。それ以外の ID は扱わない
    pub async fn load(&self, id: &str) -> Option<String> {
        if id != RESOLVED_VIRTUAL_ROUTES_ID {
            return None;
        }
        Some(self.generate().await.to_string())
    }

    /// 初回スキャンを済ませたうえでのルートツリー
    pub async fn route_tree(&self) -> Vec<RouteNode> {
        let routes = self.table.ensure_built().await;
        build_route_tree(&routes)
    }

    pub async fn generate(&self) -> GeneratedModule {
        let tree = self.route_tree().await;
        generate(&tree, &self.codegen)
    }

    /// ファイル監視イベントをルートテーブルへ流す
    pub async fn handle_watch_event(&self, event: WatchEvent) {
        match event {
            WatchEvent::Added(path) | WatchEvent::Changed(path) => {
                self.table.add_or_update(path).await
            }
            WatchEvent::Removed(path) => self.table.remove(path),
        }
    }

    /// 開発サーバーに接続し、ルート変更のたびに生成モジュールをリロードさせる
    pub fn configure_server(&self, host: Arc<dyn HostServer>) -> JoinHandle<()> {
        let bridge = LiveReloadBridge::new(host, RESOLVED_VIRTUAL_ROUTES_ID);
        tokio::spawn(bridge.run(self.table.subscribe()))
    }
}
