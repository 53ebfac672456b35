// src/lib.rs
//! ルートディレクトリ内のファイルから、ネストしたルートツリーを export する
//! 仮想モジュールを生成する。
//!
//! ```text
//!   watcher ──▶ table ──(RouteChange)──▶ reload ──▶ host (invalidate / reload)
//!                 │
//!                 ▼ snapshot
//!               tree ──▶ codegen ──▶ "import ...; export default [...]"
//! ```

pub mod codegen;
pub mod config;
pub mod error;
pub mod model;
pub mod parser;
pub mod plugin;
pub mod reload;
pub mod resolver;
pub mod router;
pub mod table;
pub mod tree;
pub mod watcher;

pub use codegen::{BuildMode, CodegenOptions, GeneratedModule};
pub use config::{ProjectConfig, RoutesOptions};
pub use error::{ConfigError, RouteError};
pub use model::{ImportRef, LoadMode, ModuleExports, RouteChange, RouteDescriptor, RouteNode};
pub use plugin::{FsRoutesPlugin, RESOLVED_VIRTUAL_ROUTES_ID, VIRTUAL_ROUTES_ID};
pub use reload::{HostServer, LiveReloadBridge};
pub use router::{FileRouter, SolidStartRouter};
pub use table::RouteTable;
pub use tree::build_route_tree;
pub use watcher::{RouteWatcher, WatchEvent};
