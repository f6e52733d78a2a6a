//! VM桥接层：选项树模型依赖的外部协作方与对外事件
//!
//! 模型本身不认识窗口、组件实现或单位解析器，只通过这里的 trait 与它们交互。

use std::cell::RefCell;
use std::error::Error;
use std::rc::Rc;

use crate::model::value::{OptionMap, OptionValue};

// === 常量定义（消除魔法值） ===
pub const COLUMN_NAME: usize = 0;
pub const COLUMN_VALUE: usize = 1;
pub const COLUMN_PARSED: usize = 2;
pub const HEADERS: [&str; 3] = ["Name", "Value", "Parsed value"];

/// 协作方抛出的任意错误
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// 持有 options 字典的组件
pub trait OptionsComponent {
    /// 组件名（日志用）
    fn name(&self) -> &str;

    fn options(&self) -> &OptionMap;

    fn options_mut(&mut self) -> &mut OptionMap;

    /// 选项变更后重新计算组件自身的派生状态；失败不在模型内捕获
    fn rebuild(&mut self) -> Result<(), BoxError>;
}

/// 单线程 UI 内共享的组件句柄
pub type SharedComponent = Rc<RefCell<dyn OptionsComponent>>;

/// 设计对象提供的语义值解析（单位、表达式）
pub trait ValueParser {
    fn parse_value(&self, raw: &OptionValue) -> Result<OptionValue, BoxError>;
}

/// 原样返回，不做任何单位换算
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityParser;

impl ValueParser for IdentityParser {
    fn parse_value(&self, raw: &OptionValue) -> Result<OptionValue, BoxError> {
        Ok(raw.clone())
    }
}

/// 视图侧的展示提示
pub trait ViewHints {
    fn show_placeholder_text(&self) {}

    fn hide_placeholder_text(&self) {}

    fn autoresize_columns(&self) {}
}

/// 模型对外发出的事件
#[derive(Debug, Clone, PartialEq)]
pub enum ModelEvent {
    /// 全量失效：此前的所有索引作废，视图需从根重新查询
    ModelReset,
    /// 某个叶子值被编辑写回
    OptionChanged {
        key_path: Vec<String>,
        old_value: OptionValue,
        new_value: OptionValue,
    },
    /// 请求整个界面刷新（由组合根决定订阅方）
    RefreshRequested,
}

/// 监听器注册句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

pub(crate) type Listener = Box<dyn FnMut(&ModelEvent)>;
