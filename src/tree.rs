// src/tree.rs
use crate::model::{RouteDescriptor, RouteNode};
use crate::resolver::strip_groups;

/// フラットなルート記述子の一覧から、ネストしたルートツリーを構築する
///
/// 1) id の短い順に並べる (祖先が先に配置されている必要があるため)
/// 2) 各記述子について、すでに配置済みのノードから最も具体的な祖先を再帰的に探す
/// 3) 祖先が見つからなければその階層に新しいノードとして追加する
///
/// 入力が同じなら出力も同じになる純粋関数。ソートは安定なので、同じ長さの id は入力順で処理される。
pub fn build_route_tree(descriptors: &[RouteDescriptor]) -> Vec<RouteNode> {
    let mut sorted: Vec<&RouteDescriptor> = descriptors.iter().collect();
    sorted.sort_by_key(|d| d.id.len());

    let mut roots: Vec<RouteNode> = Vec::new();
    for descriptor in sorted {
        let node = RouteNode {
            id: descriptor.id.clone(),
            path: String::new(),
            route: descriptor.clone(),
            children: Vec::new(),
        };
        insert(&mut roots, "", node);
    }
    roots
}

/// `ancestor` が `id` の祖先 (区切り文字付きの接頭辞) かどうか
pub fn is_ancestor(ancestor: &str, id: &str) -> bool {
    id.len() > ancestor.len() && id.starts_with(ancestor) && id[ancestor.len()..].starts_with('/')
}

/// `nodes` (id が `base` のノードの子一覧) に `node` を配置する
fn insert(nodes: &mut Vec<RouteNode>, base: &str, mut node: RouteNode) {
    // 候補が複数あれば最も長い id (最も具体的な祖先) を選ぶ
    let parent = nodes
        .iter_mut()
        .filter(|candidate| is_ancestor(&candidate.id, &node.id))
        .max_by_key(|candidate| candidate.id.len());

    if let Some(parent) = parent {
        let parent_id = parent.id.clone();
        insert(&mut parent.children, &parent_id, node);
        return;
    }

    node.path = strip_groups(&node.id[base.len()..]);

    // 表示パスが同じ兄弟がいれば後から来たもので置き換える
    match nodes.iter().position(|n| n.path == node.path) {
        Some(index) => {
            let replaced = std::mem::replace(&mut nodes[index], node);
            tracing::debug!(
                replaced = %replaced.id,
                by = %nodes[index].id,
                path = %nodes[index].path,
                "表示パスが重複したためルートを置き換えました"
            );
            // 置き換えられたノードの子は同じ階層に付け直す
            for orphan in replaced.children {
                insert(nodes, base, orphan);
            }
        }
        None => nodes.push(node),
    }
}
