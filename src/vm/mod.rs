//! VM层：层级模型契约、选项树适配器与刷新节拍

pub mod bridge;
pub mod item_model;
pub mod options_model;
pub mod refresh;
pub mod rows;
