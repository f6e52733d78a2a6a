//! 节点图：由选项字典派生的分支/叶子树，节点存放在扁平 arena 中
//!
//! 节点只保存结构与路径，不复制字典中的值；叶子值在查询时按路径从根字典解析。
//! 父指针是 arena 下标，整棵树随重建整体替换。

use crate::model::path::{json_path, resolve, PathError};
use crate::model::value::{OptionMap, OptionValue};

/// arena 中节点的句柄（仅在所属树的生命周期内有效）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// 分支：一层嵌套字典
#[derive(Debug, Clone, PartialEq)]
pub struct BranchNode {
    /// 在父级中的键名（合成根节点为空串）
    pub name: String,
    pub parent: Option<NodeId>,
    /// (子节点名, 子节点) 按发现顺序排列，名称在兄弟间唯一
    pub children: Vec<(String, NodeId)>,
}

/// 叶子：一个标量键值对
#[derive(Debug, Clone, PartialEq)]
pub struct LeafNode {
    /// 键名（第 0 列）
    pub label: String,
    pub parent: NodeId,
    /// 从根字典到所在字典的键序列（不含 label 本身）
    pub path: Vec<String>,
}

impl LeafNode {
    /// 完整键路径：path + label
    pub fn key_path(&self) -> Vec<String> {
        let mut keys = self.path.clone();
        keys.push(self.label.clone());
        keys
    }

    /// 从根字典解析当前值；路径过期时返回错误
    pub fn value<'a>(&self, dict: &'a OptionMap) -> Result<&'a OptionValue, PathError> {
        let keys = self.key_path();
        resolve(dict, &keys)?
            .value()
            .ok_or_else(|| PathError::MissingKey {
                key: self.label.clone(),
                path: json_path(&keys),
            })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Branch(BranchNode),
    Leaf(LeafNode),
}

impl Node {
    /// 节点在父级 children 中登记的名称（叶子用 label，不是值）
    pub fn name(&self) -> &str {
        match self {
            Node::Branch(b) => &b.name,
            Node::Leaf(l) => &l.label,
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        match self {
            Node::Branch(b) => b.parent,
            Node::Leaf(l) => Some(l.parent),
        }
    }

    pub fn as_branch(&self) -> Option<&BranchNode> {
        match self {
            Node::Branch(b) => Some(b),
            Node::Leaf(_) => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&LeafNode> {
        match self {
            Node::Leaf(l) => Some(l),
            Node::Branch(_) => None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }
}

/// 整棵节点树；下标 0 恒为无名根分支
#[derive(Debug, Clone, PartialEq)]
pub struct OptionTree {
    nodes: Vec<Node>,
}

impl Default for OptionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl OptionTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::Branch(BranchNode {
                name: String::new(),
                parent: None,
                children: Vec::new(),
            })],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn branch(&self, id: NodeId) -> Option<&BranchNode> {
        self.get(id).and_then(Node::as_branch)
    }

    pub fn leaf(&self, id: NodeId) -> Option<&LeafNode> {
        self.get(id).and_then(Node::as_leaf)
    }

    /// 节点总数（含根）
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.child_count(self.root()) == 0
    }

    /// 子节点数；叶子恒为 0
    pub fn child_count(&self, id: NodeId) -> usize {
        self.branch(id).map_or(0, |b| b.children.len())
    }

    pub fn child_at_row(&self, id: NodeId, row: usize) -> Option<NodeId> {
        self.branch(id)?.children.get(row).map(|(_, child)| *child)
    }

    pub fn row_of_child(&self, id: NodeId, child: NodeId) -> Option<usize> {
        self.branch(id)?.children.iter().position(|(_, c)| *c == child)
    }

    pub fn child_with_key(&self, id: NodeId, key: &str) -> Option<NodeId> {
        self.branch(id)?
            .children
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, child)| *child)
    }

    /// 第一个子节点是否为叶子
    pub fn has_leaves(&self, id: NodeId) -> bool {
        self.child_at_row(id, 0)
            .and_then(|c| self.get(c))
            .is_some_and(Node::is_leaf)
    }

    /// 在 parent 下追加分支；parent 不是分支时返回 None
    pub fn insert_branch(&mut self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.insert(
            parent,
            Node::Branch(BranchNode {
                name: name.to_string(),
                parent: Some(parent),
                children: Vec::new(),
            }),
        )
    }

    pub fn insert_leaf(&mut self, parent: NodeId, label: &str, path: Vec<String>) -> Option<NodeId> {
        self.insert(
            parent,
            Node::Leaf(LeafNode {
                label: label.to_string(),
                parent,
                path,
            }),
        )
    }

    fn insert(&mut self, parent: NodeId, node: Node) -> Option<NodeId> {
        self.branch(parent)?;
        let id = NodeId(self.nodes.len());
        let name = node.name().to_string();
        self.nodes.push(node);
        if let Some(Node::Branch(b)) = self.nodes.get_mut(parent.0) {
            b.children.push((name, id));
        }
        Some(id)
    }

    /// 按 arena 顺序遍历所有叶子
    pub fn leaves(&self) -> impl Iterator<Item = (NodeId, &LeafNode)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.as_leaf().map(|l| (NodeId(i), l)))
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves().count()
    }
}
