//! 组件选项树模型库
//!
//! 把组件的嵌套 options 字典呈现为三列（名称、值、解析值）的可编辑层级模型，
//! 编辑写回字典后触发组件重建，并按行数变化自动刷新视图。

pub mod config;
pub mod model;
pub mod utils;
pub mod vm;

// 重新导出主要类型
pub use config::TreeModelConfig;
pub use model::data_core::{JsonOptionsComponent, OptionsError};
pub use model::literal::{coerce, parse_literal};
pub use model::tree_builder::build_option_tree;
pub use model::value::{OptionMap, OptionValue};
pub use vm::bridge::{ModelEvent, OptionsComponent, ValueParser, ViewHints};
pub use vm::item_model::{ItemModel, ItemRole, ModelError, ModelIndex};
pub use vm::options_model::OptionsTreeModel;
