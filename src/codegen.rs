// src/codegen.rs
//! ルートツリーから仮想モジュールのソースコードを生成する。
//!
//! ツリーはまず「穴」(`Literal::Hole`) を含むリテラル木として組み立てられ、
//! 穴には式テーブル (`ExprTable`) の番号だけが入る。出力時にリテラル木を走査し、
//! 穴の位置で式テーブルの内容をそのまま書き出す。文字列置換は一切行わないので、
//! パスや識別子にどんな文字が含まれていても生成コードは壊れない。

use std::fmt;
use std::path::PathBuf;

use crate::model::{ImportRef, LoadMode, RouteNode};
use crate::resolver::{normalize_path, relative_to};

/// 開発サーバー (`Serve`) か本番ビルド (`Build`) か
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildMode {
    #[default]
    Serve,
    Build,
}

#[derive(Debug, Clone)]
pub struct CodegenOptions {
    /// プロジェクトルート。本番ビルドではここからの相対パスを出力する
    pub root: PathBuf,
    pub mode: BuildMode,
}

impl CodegenOptions {
    fn is_build(&self) -> bool {
        self.mode == BuildMode::Build
    }

    /// 本番ビルドならルートからの相対パス、開発時は絶対パスのまま
    fn display_src(&self, abs: &str) -> String {
        if self.is_build() {
            relative_to(&self.root, abs)
        } else {
            abs.to_string()
        }
    }
}

/// 生成されたモジュール
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedModule {
    /// モジュール指定子ごとに 1 行の import 文
    pub imports: Vec<String>,
    /// `export default` される式
    pub routes: String,
}

impl fmt::Display for GeneratedModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.imports {
            writeln!(f, "{line}")?;
        }
        writeln!(f)?;
        writeln!(f, "export default {};", self.routes)
    }
}

/// (モジュール, export 名) ごとに一意な識別子を割り当て、
/// 最後にモジュールごとに 1 つの import 文へまとめる
#[derive(Debug, Default)]
pub struct ImportRegistry {
    modules: Vec<ModuleImports>,
    vars: usize,
}

#[derive(Debug)]
struct ModuleImports {
    specifier: String,
    default: Option<String>,
    named: Vec<(String, String)>,
}

impl ImportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// default export の束縛を要求する
    pub fn add_default(&mut self, specifier: &str) -> String {
        let index = self.module_index(specifier);
        if let Some(existing) = &self.modules[index].default {
            return existing.clone();
        }
        let ident = self.next_ident();
        self.modules[index].default = Some(ident.clone());
        ident
    }

    /// 名前付き export の束縛を要求する。同じ組を二度要求すると同じ識別子を返す
    pub fn add_named(&mut self, name: &str, specifier: &str) -> String {
        if name == "default" {
            return self.add_default(specifier);
        }
        let index = self.module_index(specifier);
        if let Some((_, local)) = self.modules[index].named.iter().find(|(n, _)| n == name) {
            return local.clone();
        }
        let ident = self.next_ident();
        self.modules[index].named.push((name.to_string(), ident.clone()));
        ident
    }

    /// モジュールごとの import 文 (要求された順)
    pub fn statements(&self) -> Vec<String> {
        self.modules
            .iter()
            .map(|m| {
                let mut clauses = Vec::new();
                if let Some(d) = &m.default {
                    clauses.push(d.clone());
                }
                if !m.named.is_empty() {
                    let named: Vec<String> = m
                        .named
                        .iter()
                        .map(|(name, local)| format!("{} as {local}", export_name(name)))
                        .collect();
                    clauses.push(format!("{{ {} }}", named.join(", ")));
                }
                format!("import {} from {};", clauses.join(", "), quote(&m.specifier))
            })
            .collect()
    }

    fn module_index(&mut self, specifier: &str) -> usize {
        match self.modules.iter().position(|m| m.specifier == specifier) {
            Some(index) => index,
            None => {
                self.modules.push(ModuleImports {
                    specifier: specifier.to_string(),
                    default: None,
                    named: Vec::new(),
                });
                self.modules.len() - 1
            }
        }
    }

    fn next_ident(&mut self) -> String {
        let ident = format!("routeData{}", self.vars);
        self.vars += 1;
        ident
    }
}

/// 穴を含むリテラル木
#[derive(Debug, Clone)]
enum Literal {
    Str(String),
    Bool(bool),
    Array(Vec<Literal>),
    Object(Vec<(String, Literal)>),
    Hole(usize),
}

/// 穴に埋め込まれる実行可能な式
#[derive(Debug, Clone)]
enum Expr {
    /// `() => ({ "name": ident, ... })`
    Require(Vec<(String, String)>),
    /// `() => import("specifier")`
    DynamicImport(String),
    /// `() => { const id = "id"; return import("target"); }`
    ///
    /// `id` はプロジェクトルートからの相対ビルド ID
    LazyLoader { id: String, target: String },
}

#[derive(Debug, Default)]
struct ExprTable {
    exprs: Vec<Expr>,
}

impl ExprTable {
    fn hole(&mut self, expr: Expr) -> Literal {
        self.exprs.push(expr);
        Literal::Hole(self.exprs.len() - 1)
    }

    fn print(&self, index: usize, out: &mut String) {
        match &self.exprs[index] {
            Expr::Require(bindings) => {
                let fields: Vec<String> = bindings
                    .iter()
                    .map(|(name, ident)| format!("{}: {ident}", quote(name)))
                    .collect();
                out.push_str(&format!("() => ({{ {} }})", fields.join(", ")));
            }
            Expr::DynamicImport(specifier) => {
                out.push_str(&format!("() => import({})", quote(specifier)));
            }
            Expr::LazyLoader { id, target } => {
                out.push_str(&format!(
                    "() => {{ const id = {}; return import({}); }}",
                    quote(id),
                    quote(target)
                ));
            }
        }
    }
}

/// ルートツリーからモジュールを生成する
pub fn generate(tree: &[RouteNode], options: &CodegenOptions) -> GeneratedModule {
    let mut generator = Generator {
        options,
        registry: ImportRegistry::new(),
        exprs: ExprTable::default(),
    };

    // 1) データとしてのツリーを組み立てる (式は穴として登録)
    let literal = Literal::Array(tree.iter().map(|node| generator.node(node)).collect());

    // 2) ツリーを書き出しつつ穴に式を差し込む
    let mut routes = String::new();
    print_literal(&literal, &generator.exprs, &mut routes);

    GeneratedModule {
        imports: generator.registry.statements(),
        routes,
    }
}

struct Generator<'a> {
    options: &'a CodegenOptions,
    registry: ImportRegistry,
    exprs: ExprTable,
}

impl Generator<'_> {
    fn node(&mut self, node: &RouteNode) -> Literal {
        let file_path = normalize_path(&node.route.file_path);

        let mut fields = vec![
            ("id".to_string(), Literal::Str(node.id.clone())),
            ("path".to_string(), Literal::Str(node.path.clone())),
            ("page".to_string(), Literal::Bool(node.route.page)),
            (
                "filePath".to_string(),
                Literal::Str(self.options.display_src(&file_path)),
            ),
        ];

        for (key, import) in &node.route.imports {
            let value = match import.mode {
                LoadMode::Eager => self.eager(import),
                LoadMode::Lazy => self.lazy(import),
            };
            fields.push((key.clone(), value));
        }

        if !node.children.is_empty() {
            let children = node.children.iter().map(|c| self.node(c)).collect();
            fields.push(("children".to_string(), Literal::Array(children)));
        }

        Literal::Object(fields)
    }

    /// `{ require: () => ({ ... }), src }`
    fn eager(&mut self, import: &ImportRef) -> Literal {
        let build_id = import.build_id();
        let bindings = import
            .pick
            .iter()
            .map(|name| (name.clone(), self.registry.add_named(name, &build_id)))
            .collect();

        Literal::Object(vec![
            ("require".to_string(), self.exprs.hole(Expr::Require(bindings))),
            ("src".to_string(), Literal::Str(self.options.display_src(&build_id))),
        ])
    }

    /// `{ src, build?, import }`。遅延参照は import 文を作らない
    fn lazy(&mut self, import: &ImportRef) -> Literal {
        let build_id = import.build_id();
        let mut fields = vec![("src".to_string(), Literal::Str(self.options.display_src(&build_id)))];

        let loader_target = if self.options.is_build() {
            fields.push((
                "build".to_string(),
                self.exprs.hole(Expr::DynamicImport(build_id.clone())),
            ));
            build_id.clone()
        } else {
            fs_specifier(&build_id)
        };
        let loader = Expr::LazyLoader {
            id: relative_to(&self.options.root, &build_id),
            target: loader_target,
        };
        fields.push(("import".to_string(), self.exprs.hole(loader)));

        Literal::Object(fields)
    }
}

/// 開発サーバーがファイルシステム上のモジュールを配信するための指定子
fn fs_specifier(abs: &str) -> String {
    format!("/@fs/{}", abs.trim_start_matches('/'))
}

fn print_literal(literal: &Literal, exprs: &ExprTable, out: &mut String) {
    match literal {
        Literal::Str(s) => out.push_str(&quote(s)),
        Literal::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Literal::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                print_literal(item, exprs, out);
            }
            out.push(']');
        }
        Literal::Object(fields) => {
            out.push('{');
            for (i, (key, value)) in fields.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&quote(key));
                out.push(':');
                print_literal(value, exprs, out);
            }
            out.push('}');
        }
        Literal::Hole(index) => exprs.print(*index, out),
    }
}

/// JSON の文字列リテラル (JS としても有効) として書き出す
fn quote(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

/// import 句の export 名。識別子として不正なら文字列形式にする
fn export_name(name: &str) -> String {
    if is_identifier(name) {
        name.to_string()
    } else {
        quote(name)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '$' || c == '_' || c.is_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '$' || c == '_' || c.is_alphanumeric())
}
