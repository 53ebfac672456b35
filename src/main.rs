// src/main.rs

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use solid_fs_routes::{
    BuildMode, FsRoutesPlugin, HostServer, ProjectConfig, RouteWatcher, RoutesOptions,
};

/// CLI 引数定義
#[derive(Parser, Debug)]
#[command(
    name = "solid-fs-routes",
    version = "0.1.0",
    about = "ルートディレクトリからネストしたルートツリーの仮想モジュールを生成する CLI ツール"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 一度だけスキャンして生成モジュールを出力する
    Generate {
        #[command(flatten)]
        common: CommonArgs,
        /// 出力先ファイル (省略時は標準出力)
        #[arg(short = 'o', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// 一度だけスキャンしてルートツリーを JSON で出力する
    Tree {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// ファイルの追加・変更・削除を監視し、生成モジュールを書き直し続ける
    Watch {
        #[command(flatten)]
        common: CommonArgs,
        /// 出力先ファイル
        #[arg(short = 'o', long = "out", value_name = "FILE")]
        out: PathBuf,
    },
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// プロジェクトルート
    /// 例: `--project-root C:/path/to/my-solid-app`
    #[arg(short = 'r', long = "project-root", value_name = "DIR", default_value = ".")]
    project_root: PathBuf,

    /// ルートファイルのディレクトリ (プロジェクトルートからの相対, 既定: src/routes)
    #[arg(long = "dir", value_name = "DIR")]
    dir: Option<PathBuf>,

    /// ルートとして扱う拡張子 (複数指定可, 既定: jsx, tsx)
    #[arg(long = "ext", value_name = "EXT")]
    extensions: Vec<String>,

    /// TOML 形式の設定ファイル
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// 本番ビルド用に出力する (パスをプロジェクトルートからの相対にする)
    #[arg(long = "build")]
    build: bool,
}

impl CommonArgs {
    /// CLI 引数と設定ファイルからプラグインを組み立てる (CLI 側が優先)
    fn plugin(&self) -> Result<FsRoutesPlugin, Box<dyn std::error::Error>> {
        let project_dir = self.project_root.canonicalize()?; // 絶対化

        let from_cli = RoutesOptions {
            dir: self.dir.clone(),
            extensions: (!self.extensions.is_empty()).then(|| self.extensions.clone()),
            router: None,
        };
        let options = match &self.config {
            Some(path) => from_cli.or(RoutesOptions::from_toml_file(path)?),
            None => from_cli,
        };

        let mode = if self.build { BuildMode::Build } else { BuildMode::Serve };
        Ok(FsRoutesPlugin::new(ProjectConfig::new(project_dir, mode), options)?)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ログは標準エラーへ (標準出力は生成コード用)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "solid_fs_routes=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Generate { common, out } => {
            let plugin = common.plugin()?;
            let code = plugin.generate().await.to_string();
            match out {
                Some(path) => write_output(&path, &code).await?,
                None => print!("{code}"),
            }
        }
        Command::Tree { common } => {
            let plugin = common.plugin()?;
            let tree = plugin.route_tree().await;
            let json = serde_json::to_string_pretty(&tree)?;
            println!("{json}");
        }
        Command::Watch { common, out } => {
            let plugin = Arc::new(common.plugin()?);
            watch(plugin, &out).await?;
        }
    }

    Ok(())
}

/// 監視ループ
///
/// 1) 初回スキャンして出力ファイルを書く
/// 2) ルートディレクトリの監視を開始し、イベントをルートテーブルへ流す
/// 3) リロード要求が来たら出力ファイルを書き直す
async fn watch(plugin: Arc<FsRoutesPlugin>, out: &Path) -> Result<(), Box<dyn std::error::Error>> {
    write_output(out, &plugin.generate().await.to_string()).await?;

    let (reload_tx, mut reload_rx) = mpsc::unbounded_channel();
    let bridge = plugin.configure_server(Arc::new(OutputFileHost { reload_tx }));

    let dir = plugin.table().router().dir();
    let (watcher, mut events) = RouteWatcher::new(&dir);
    let _watcher = watcher.run()?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            Some(event) = events.recv() => {
                plugin.handle_watch_event(event).await;
            }
            Some(()) = reload_rx.recv() => {
                // 溜まったリロード要求は 1 回の書き出しにまとめる
                while reload_rx.try_recv().is_ok() {}
                write_output(out, &plugin.generate().await.to_string()).await?;
            }
            _ = &mut ctrl_c => {
                tracing::info!("監視を終了します");
                break;
            }
        }
    }

    bridge.abort();
    Ok(())
}

async fn write_output(path: &Path, code: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, code).await?;
    tracing::info!(path = ?path, bytes = code.len(), "生成モジュールを書き出しました");
    Ok(())
}

/// 出力ファイルを「モジュールグラフ」とみなすホスト
struct OutputFileHost {
    reload_tx: mpsc::UnboundedSender<()>,
}

impl HostServer for OutputFileHost {
    fn invalidate_module(&self, _id: &str) -> bool {
        true
    }

    fn reload_module(&self, _id: &str) {
        let _ = self.reload_tx.send(());
    }

    fn hmr_enabled(&self) -> bool {
        true
    }

    fn send_full_reload(&self) {
        tracing::info!("フルリロードを要求");
    }
}
