//! 通用层级模型契约：视图通过索引按行/列/父级导航并读写单元格

use bitflags::bitflags;
use thiserror::Error;

use crate::model::node::NodeId;
use crate::model::path::PathError;
use crate::vm::bridge::BoxError;

#[derive(Error, Debug)]
pub enum ModelError {
    /// 字典结构变了但树还没重建
    #[error("选项路径已失效: {0}")]
    Path(#[from] PathError),
    #[error("数值解析失败: {0}")]
    ValueParse(#[source] BoxError),
    #[error("组件重建失败: {0}")]
    Rebuild(#[source] BoxError),
}

/// 模型索引：指向某一代节点树中的一个单元格
///
/// 无效索引代表不可见的根。树重建后旧索引的代号不再匹配，不会指向任何节点。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelIndex {
    row: usize,
    column: usize,
    node: Option<NodeId>,
    generation: u64,
}

impl Default for ModelIndex {
    fn default() -> Self {
        Self::invalid()
    }
}

impl ModelIndex {
    pub(crate) fn new(row: usize, column: usize, node: NodeId, generation: u64) -> Self {
        Self {
            row,
            column,
            node: Some(node),
            generation,
        }
    }

    pub fn invalid() -> Self {
        Self {
            row: 0,
            column: 0,
            node: None,
            generation: 0,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.node.is_some()
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn internal_id(&self) -> Option<NodeId> {
        self.node
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// 同一行的另一列
    pub fn sibling_at_column(&self, column: usize) -> Self {
        Self { column, ..*self }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemRole {
    Display,
    Edit,
    Font,
    TextAlignment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    TopLeft,
}

/// 单元格数据
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ItemData {
    #[default]
    None,
    Text(String),
    Font(FontWeight),
    Alignment(Alignment),
}

impl ItemData {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ItemData::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, ItemData::None)
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ItemFlags: u8 {
        const SELECTABLE = 1 << 0;
        const ENABLED = 1 << 1;
        const EDITABLE = 1 << 2;
    }
}

pub trait ItemModel {
    fn row_count(&self, parent: &ModelIndex) -> usize;

    fn column_count(&self, parent: &ModelIndex) -> usize;

    /// parent 下第 row 行第 column 列；越界返回无效索引
    fn index(&self, row: usize, column: usize, parent: &ModelIndex) -> ModelIndex;

    /// 父级索引；根的直接子节点返回无效索引
    fn parent(&self, child: &ModelIndex) -> ModelIndex;

    fn data(&self, index: &ModelIndex, role: ItemRole) -> Result<ItemData, ModelError>;

    /// 写入成功返回 true；不可编辑或值未变返回 false
    fn set_data(&mut self, index: &ModelIndex, value: &str, role: ItemRole) -> Result<bool, ModelError>;

    fn header_data(&self, section: usize, orientation: Orientation, role: ItemRole) -> ItemData;

    fn flags(&self, index: &ModelIndex) -> ItemFlags;

    fn has_children(&self, parent: &ModelIndex) -> bool {
        self.row_count(parent) > 0
    }

    /// 是否为分支节点；没有子节点的分支也算
    fn is_branch(&self, index: &ModelIndex) -> bool {
        self.has_children(index)
    }

    /// 可编辑的列
    fn editable_columns(&self, index: &ModelIndex) -> Vec<usize> {
        (0..self.column_count(index))
            .filter(|&column| {
                self.flags(&index.sibling_at_column(column))
                    .contains(ItemFlags::EDITABLE)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_index() {
        let index = ModelIndex::invalid();
        assert!(!index.is_valid());
        assert_eq!(index.internal_id(), None);
        assert_eq!(ModelIndex::default(), index);
    }

    #[test]
    fn test_sibling_keeps_node() {
        let mut tree = crate::model::node::OptionTree::new();
        let leaf = tree.insert_leaf(tree.root(), "a", vec![]).unwrap();
        let index = ModelIndex::new(3, 0, leaf, 7);
        let sibling = index.sibling_at_column(2);
        assert_eq!(sibling.row(), 3);
        assert_eq!(sibling.column(), 2);
        assert_eq!(sibling.internal_id(), Some(leaf));
        assert_eq!(sibling.generation(), 7);
    }

    #[test]
    fn test_item_data_accessors() {
        assert_eq!(ItemData::Text("x".into()).as_text(), Some("x"));
        assert!(ItemData::default().is_none());
        assert_eq!(ItemData::Font(FontWeight::Bold).as_text(), None);
    }
}
