//! 选项树构建：枚举根到叶的全部路径，再逐条物化为分支/叶子节点

use crate::model::node::{NodeId, OptionTree};
use crate::model::value::{OptionMap, OptionValue};

/// 一条根到叶的路径
#[derive(Debug, Clone, PartialEq)]
pub enum OptionPath<'a> {
    /// `keys` 的最后一个元素是叶子的键，`value` 为其标量值
    Leaf { keys: Vec<String>, value: &'a OptionValue },
    /// 空字典：只有分支、没有叶子
    EmptyBranch { keys: Vec<String> },
}

impl OptionPath<'_> {
    pub fn keys(&self) -> &[String] {
        match self {
            OptionPath::Leaf { keys, .. } | OptionPath::EmptyBranch { keys } => keys,
        }
    }
}

/// 深度优先枚举所有路径，顺序即字典的键顺序
pub fn collect_paths(dict: &OptionMap) -> Vec<OptionPath<'_>> {
    fn walk<'a>(out: &mut Vec<OptionPath<'a>>, map: &'a OptionMap, path: &[String]) {
        for (k, v) in map {
            let mut keys = path.to_vec();
            keys.push(k.clone());
            match v {
                OptionValue::Mapping(child) if child.is_empty() => {
                    out.push(OptionPath::EmptyBranch { keys });
                }
                OptionValue::Mapping(child) => walk(out, child, &keys),
                value => out.push(OptionPath::Leaf { keys, value }),
            }
        }
    }

    let mut out = Vec::new();
    walk(&mut out, dict, &[]);
    out
}

/// 从字典构建整棵节点树
pub fn build_option_tree(dict: &OptionMap) -> OptionTree {
    let mut tree = OptionTree::new();
    let root = tree.root();

    for path in collect_paths(dict) {
        match path {
            OptionPath::Leaf { keys, .. } => {
                let Some((label, parents)) = keys.split_last() else {
                    continue;
                };
                // 顶层标量直接挂在根下
                let branch = ensure_branches(&mut tree, root, parents);
                tree.insert_leaf(branch, label, parents.to_vec());
            }
            OptionPath::EmptyBranch { keys } => {
                ensure_branches(&mut tree, root, &keys);
            }
        }
    }

    tracing::debug!(
        "选项树构建完成: {} 个节点，{} 个叶子",
        tree.len(),
        tree.leaf_count()
    );
    tree
}

/// 沿 keys 逐层查找分支，缺失的即时创建；返回最深一层分支
fn ensure_branches(tree: &mut OptionTree, root: NodeId, keys: &[String]) -> NodeId {
    let mut current = root;
    for key in keys {
        current = match tree.child_with_key(current, key) {
            Some(existing) => existing,
            None => match tree.insert_branch(current, key) {
                Some(created) => created,
                None => break,
            },
        };
    }
    current
}
