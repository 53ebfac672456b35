// src/reload.rs
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::model::RouteChange;

/// ホスト (開発サーバー) のモジュールグラフとライブリロード経路
pub trait HostServer: Send + Sync {
    /// モジュールグラフに `id` があれば無効化して `true` を返す
    fn invalidate_module(&self, id: &str) -> bool;

    /// 無効化したモジュールを再読み込みさせる
    fn reload_module(&self, id: &str);

    /// ホットリロードの経路が有効か
    fn hmr_enabled(&self) -> bool;

    /// ページ全体のリロードを要求する
    fn send_full_reload(&self);
}

/// ルートテーブルの変更を、生成モジュールのリロード要求に変換する
pub struct LiveReloadBridge {
    host: Arc<dyn HostServer>,
    module_id: String,
}

impl LiveReloadBridge {
    pub fn new(host: Arc<dyn HostServer>, module_id: impl Into<String>) -> Self {
        LiveReloadBridge {
            host,
            module_id: module_id.into(),
        }
    }

    /// 変更 1 件に対するリロード
    pub fn on_change(&self, change: &RouteChange) {
        match &change.route {
            Some(route) => tracing::debug!(id = %route.id, "ルート変更によりリロード"),
            None => tracing::debug!("ルート削除によりリロード"),
        }
        self.reload();
    }

    fn reload(&self) {
        if self.host.invalidate_module(&self.module_id) {
            self.host.reload_module(&self.module_id);
        }
        if !self.host.hmr_enabled() {
            self.host.send_full_reload();
        }
    }

    /// 通知チャネルが閉じるまで変更を処理し続ける
    pub async fn run(self, mut changes: broadcast::Receiver<RouteChange>) {
        loop {
            match changes.recv().await {
                Ok(change) => self.on_change(&change),
                Err(RecvError::Lagged(skipped)) => {
                    // 取りこぼした分はまとめて 1 回のリロードで足りる
                    tracing::warn!(skipped, "変更通知を取りこぼしました");
                    self.reload();
                }
                Err(RecvError::Closed) => break,
            }
        }
        tracing::debug!(module = ?self.module_id, "リロードブリッジ終了");
    }
}
