// src/model.rs
use serde::Serialize;
use std::path::PathBuf;

/// import の解決タイミング
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadMode {
    /// import 時に同期的に解決される (メタデータ向け)
    Eager,
    /// 遅延ローダー経由で解決される (コード分割する UI コンポーネント向け)
    Lazy,
}

/// あるモジュールから名前を束縛する要求
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportRef {
    /// 参照先モジュールの絶対パス (区切り文字は `/` に正規化済み)
    pub src: String,
    /// 要求する export 名。Lazy の場合は常に `["default"]`
    pub pick: Vec<String>,
    pub mode: LoadMode,
}

impl ImportRef {
    pub fn eager(src: impl Into<String>, pick: Vec<String>) -> Self {
        ImportRef {
            src: src.into(),
            pick,
            mode: LoadMode::Eager,
        }
    }

    pub fn lazy(src: impl Into<String>) -> Self {
        ImportRef {
            src: src.into(),
            pick: vec!["default".to_string()],
            mode: LoadMode::Lazy,
        }
    }

    /// pick をクエリに付けたモジュール指定子 (例: `/app/src/routes/a.tsx?pick=route`)
    pub fn build_id(&self) -> String {
        let query: Vec<String> = self.pick.iter().map(|p| format!("pick={p}")).collect();
        format!("{}?{}", self.src, query.join("&"))
    }
}

/// フラットなルートテーブルの 1 エントリ
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDescriptor {
    /// 正規化済みのルート ID。`(group)` セグメントを含みうる
    pub id: String,
    /// 表示用パス = id からグループセグメントを除いたもの
    pub path: String,
    /// 元になったファイル
    pub file_path: PathBuf,
    /// default export を持つページかどうか
    pub page: bool,
    /// 出力キー (`$component` など) と import 要求の組
    pub imports: Vec<(String, ImportRef)>,
}

/// ネストしたルートツリーのノード
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteNode {
    /// 完全な ID。親ノードの id は常に子の id の接頭辞 (区切り付き)
    pub id: String,
    /// 親からの相対表示パス (トップレベルでは絶対)
    pub path: String,
    pub route: RouteDescriptor,
    /// 子ルート (children) があれば再帰的に格納
    pub children: Vec<RouteNode>,
}

/// 1 つのモジュールが export している名前の一覧
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleExports {
    pub names: Vec<String>,
}

impl ModuleExports {
    pub fn has(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn has_default(&self) -> bool {
        self.has("default")
    }
}

/// ルートテーブルの変更通知。削除の場合 `route` は `None`
#[derive(Debug, Clone)]
pub struct RouteChange {
    pub route: Option<RouteDescriptor>,
}
