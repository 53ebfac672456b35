// src/watcher.rs
use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// ファイル監視から届くイベント
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    Added(PathBuf),
    Changed(PathBuf),
    Removed(PathBuf),
}

impl WatchEvent {
    /// notify のイベントを追加 / 変更 / 削除に分解する
    pub fn from_notify(event: Event) -> Vec<WatchEvent> {
        let Event { kind, paths, .. } = event;
        match kind {
            EventKind::Create(_) => paths.into_iter().map(WatchEvent::Added).collect(),
            EventKind::Remove(_) => paths.into_iter().map(WatchEvent::Removed).collect(),
            EventKind::Modify(ModifyKind::Name(mode)) => match mode {
                RenameMode::From => paths.into_iter().map(WatchEvent::Removed).collect(),
                RenameMode::To => paths.into_iter().map(WatchEvent::Added).collect(),
                RenameMode::Both => {
                    let mut paths = paths.into_iter();
                    let mut events = Vec::new();
                    if let Some(from) = paths.next() {
                        events.push(WatchEvent::Removed(from));
                    }
                    events.extend(paths.map(WatchEvent::Added));
                    events
                }
                // どちら側か分からない場合は存在確認で決める
                _ => paths
                    .into_iter()
                    .map(|p| {
                        if p.exists() {
                            WatchEvent::Added(p)
                        } else {
                            WatchEvent::Removed(p)
                        }
                    })
                    .collect(),
            },
            EventKind::Modify(_) => paths.into_iter().map(WatchEvent::Changed).collect(),
            _ => Vec::new(),
        }
    }
}

/// ルートディレクトリを再帰的に監視する
pub struct RouteWatcher {
    dir: PathBuf,
    event_tx: mpsc::UnboundedSender<WatchEvent>,
}

impl RouteWatcher {
    /// 監視器とイベントの受信側を返す
    pub fn new(dir: &Path) -> (Self, mpsc::UnboundedReceiver<WatchEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        (
            RouteWatcher {
                dir: dir.to_path_buf(),
                event_tx,
            },
            event_rx,
        )
    }

    /// 監視を開始する。返された watcher を drop すると監視は止まる
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.event_tx;

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    for e in WatchEvent::from_notify(event) {
                        let _ = tx.send(e);
                    }
                }
                Err(e) => tracing::error!("監視エラー: {:?}", e),
            },
            Config::default(),
        )?;

        watcher.watch(&self.dir, RecursiveMode::Recursive)?;

        tracing::info!(dir = ?self.dir, "ルートディレクトリの監視を開始");
        Ok(watcher)
    }
}
