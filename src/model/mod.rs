//! 数据层：选项值、路径、节点图与文件支撑组件

pub mod data_core;
pub mod literal;
pub mod node;
pub mod path;
pub mod tree_builder;
pub mod value;
