//! 展开后的可见行：只通过索引接口深度优先遍历任意层级模型

use crate::vm::bridge::{COLUMN_NAME, COLUMN_PARSED, COLUMN_VALUE};
use crate::vm::item_model::{ItemData, ItemModel, ItemRole, ModelError, ModelIndex};

/// 一行展开后的显示数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    pub depth: usize,
    pub name: String,
    pub value: String,
    pub parsed: String,
    pub editable: bool,
    pub is_branch: bool,
    pub index: ModelIndex,
}

fn cell_text(model: &dyn ItemModel, index: &ModelIndex, column: usize) -> Result<String, ModelError> {
    let data = model.data(&index.sibling_at_column(column), ItemRole::Display)?;
    Ok(match data {
        ItemData::Text(s) => s,
        _ => String::new(),
    })
}

/// 全部展开时的行序列
pub fn visible_rows(model: &dyn ItemModel) -> Result<Vec<TreeRow>, ModelError> {
    let mut rows = Vec::new();
    collect_rows(model, &ModelIndex::invalid(), 0, &mut rows)?;
    Ok(rows)
}

fn collect_rows(
    model: &dyn ItemModel,
    parent: &ModelIndex,
    depth: usize,
    rows: &mut Vec<TreeRow>,
) -> Result<(), ModelError> {
    for row in 0..model.row_count(parent) {
        let index = model.index(row, COLUMN_NAME, parent);
        if !index.is_valid() {
            continue;
        }
        let is_branch = model.is_branch(&index);
        rows.push(TreeRow {
            depth,
            name: cell_text(model, &index, COLUMN_NAME)?,
            value: cell_text(model, &index, COLUMN_VALUE)?,
            parsed: cell_text(model, &index, COLUMN_PARSED)?,
            editable: model.editable_columns(&index).contains(&COLUMN_VALUE),
            is_branch,
            index,
        });
        if model.has_children(&index) {
            collect_rows(model, &index, depth + 1, rows)?;
        }
    }
    Ok(())
}

/// 按键路径逐级匹配第 0 列名称，返回目标行第 0 列的索引
pub fn find_index<S: AsRef<str>>(model: &dyn ItemModel, key_path: &[S]) -> Option<ModelIndex> {
    let mut current = ModelIndex::invalid();
    for key in key_path {
        let key = key.as_ref();
        current = (0..model.row_count(&current))
            .map(|row| model.index(row, COLUMN_NAME, &current))
            .find(|index| {
                matches!(
                    model.data(index, ItemRole::Display),
                    Ok(ItemData::Text(ref name)) if name == key
                )
            })?;
    }
    current.is_valid().then_some(current)
}
