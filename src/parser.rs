// src/parser.rs
use swc_common::{sync::Lrc, FileName, SourceMap};
use swc_ecma_ast::*;
use swc_ecma_parser::{lexer::Lexer, Parser as SwcParser, StringInput, Syntax, TsConfig};
use swc_ecma_visit::{Visit, VisitWith};

use std::fs;
use std::path::Path;

use crate::error::RouteError;
use crate::model::ModuleExports;

/// AST をトラバースして export されている名前を集める Visitor
#[derive(Default)]
struct ExportVisitor {
    names: Vec<String>,
}

impl ExportVisitor {
    fn push(&mut self, name: String) {
        if !self.names.contains(&name) {
            self.names.push(name);
        }
    }

    /// 分割代入を含む束縛パターンから名前を集める
    fn push_pat(&mut self, pat: &Pat) {
        match pat {
            Pat::Ident(BindingIdent { id, .. }) => self.push(id.sym.to_string()),
            Pat::Array(array) => {
                for elem in array.elems.iter().flatten() {
                    self.push_pat(elem);
                }
            }
            Pat::Object(object) => {
                for prop in &object.props {
                    match prop {
                        ObjectPatProp::KeyValue(kv) => self.push_pat(&kv.value),
                        ObjectPatProp::Assign(assign) => self.push(assign.key.sym.to_string()),
                        ObjectPatProp::Rest(rest) => self.push_pat(&rest.arg),
                    }
                }
            }
            Pat::Rest(rest) => self.push_pat(&rest.arg),
            Pat::Assign(assign) => self.push_pat(&assign.left),
            Pat::Invalid(_) | Pat::Expr(_) => {}
        }
    }

    fn push_export_name(&mut self, name: &ModuleExportName) {
        match name {
            ModuleExportName::Ident(ident) => self.push(ident.sym.to_string()),
            ModuleExportName::Str(s) => self.push(s.value.to_string()),
        }
    }
}

impl Visit for ExportVisitor {
    fn visit_module_decl(&mut self, decl: &ModuleDecl) {
        match decl {
            // export default interface は型だけなので数えない
            ModuleDecl::ExportDefaultDecl(ExportDefaultDecl {
                decl: DefaultDecl::TsInterfaceDecl(_),
                ..
            }) => {}
            // export default function / class / 式
            ModuleDecl::ExportDefaultDecl(_) | ModuleDecl::ExportDefaultExpr(_) => {
                self.push("default".to_string());
            }
            // export const a = ..., export function b() {}
            ModuleDecl::ExportDecl(ExportDecl { decl, .. }) => match decl {
                Decl::Fn(f) => self.push(f.ident.sym.to_string()),
                Decl::Class(c) => self.push(c.ident.sym.to_string()),
                Decl::Var(var) => {
                    for declarator in &var.decls {
                        self.push_pat(&declarator.name);
                    }
                }
                Decl::TsEnum(e) => self.push(e.id.sym.to_string()),
                // 型だけの export は実行時には存在しない
                _ => {}
            },
            // export { a, b as c }, export * as ns from "./x"
            ModuleDecl::ExportNamed(named) if !named.type_only => {
                for spec in &named.specifiers {
                    match spec {
                        ExportSpecifier::Named(ExportNamedSpecifier {
                            orig,
                            exported,
                            is_type_only,
                            ..
                        }) => {
                            if *is_type_only {
                                continue;
                            }
                            self.push_export_name(exported.as_ref().unwrap_or(orig));
                        }
                        ExportSpecifier::Namespace(ns) => self.push_export_name(&ns.name),
                        ExportSpecifier::Default(d) => self.push(d.exported.sym.to_string()),
                    }
                }
            }
            _ => {}
        }
        decl.visit_children_with(self);
    }
}

/// ソース文字列を解析して export 名の一覧を返す
///
/// - `tsx`: JSX を許可するかどうか (`.ts` 以外は許可する)
pub fn parse_exports(file_path: &Path, src: String, tsx: bool) -> Result<ModuleExports, RouteError> {
    let cm: Lrc<SourceMap> = Default::default();
    let fm = cm.new_source_file(FileName::Real(file_path.to_path_buf()), src);

    let syntax = Syntax::Typescript(TsConfig {
        tsx,
        decorators: true,
        dts: false,
        no_early_errors: true,
        disallow_ambiguous_jsx_like: false,
    });

    let lexer = Lexer::new(
        syntax,
        Default::default(), // es version
        StringInput::from(&*fm),
        None,
    );

    let mut parser = SwcParser::new_from(lexer);
    let module = parser.parse_module().map_err(|e| RouteError::Parse {
        path: file_path.to_path_buf(),
        message: format!("{:?}", e.kind()),
    })?;

    let mut visitor = ExportVisitor::default();
    visitor.visit_module(&module);

    tracing::trace!(path = ?file_path, exports = ?visitor.names, "export 解析完了");

    Ok(ModuleExports {
        names: visitor.names,
    })
}

/// ファイルを読み込んで export 名の一覧を返す (blocking)
pub fn analyze_module(file_path: &Path) -> Result<ModuleExports, RouteError> {
    let src = fs::read_to_string(file_path).map_err(|source| RouteError::Io {
        path: file_path.to_path_buf(),
        source,
    })?;
    let tsx = file_path.extension().map_or(true, |ext| ext != "ts");
    parse_exports(file_path, src, tsx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exports(src: &str) -> ModuleExports {
        parse_exports(Path::new("/virtual/route.tsx"), src.to_string(), true).unwrap()
    }

    #[test]
    fn finds_default_and_named_exports() {
        let ex = exports(
            r#"
            import { lazy } from "solid-js";
            export const route = { load: () => {} };
            export function helper() {}
            export default function Page() { return <div>hi</div>; }
            "#,
        );
        assert!(ex.has_default());
        assert!(ex.has("route"));
        assert!(ex.has("helper"));
        assert!(!ex.has("lazy"));
    }

    #[test]
    fn reexports_and_aliases() {
        let ex = exports(
            r#"
            const Page = () => null;
            const data = 1;
            export { Page as default, data as $data };
            export * as utils from "./utils";
            "#,
        );
        assert_eq!(ex.names, vec!["default", "$data", "utils"]);
    }

    #[test]
    fn type_only_exports_are_ignored() {
        let ex = exports(
            r#"
            export type Props = { id: string };
            export interface Other {}
            export const value = 1;
            "#,
        );
        assert_eq!(ex.names, vec!["value"]);
        assert!(!ex.has_default());
    }

    #[test]
    fn destructured_bindings_are_exported() {
        let ex = exports(
            r#"
            const config = { route: {}, meta: {}, rest: [] };
            export const { route, meta: info = {}, ...others } = config;
            export const [first, , [second]] = [1, 2, [3]];
            "#,
        );
        assert_eq!(ex.names, vec!["route", "info", "others", "first", "second"]);
    }

    #[test]
    fn default_interface_is_not_a_runtime_default() {
        let ex = exports(
            r#"
            export default interface Props { id: string }
            export const route = {};
            "#,
        );
        assert!(!ex.has_default());
        assert_eq!(ex.names, vec!["route"]);
    }

    #[test]
    fn syntax_errors_are_reported() {
        let result = parse_exports(Path::new("/virtual/bad.tsx"), "export const = ;".into(), true);
        assert!(matches!(result, Err(RouteError::Parse { .. })));
    }
}
