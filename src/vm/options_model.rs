//! 组件选项树模型：把嵌套 options 字典适配为三列（名称、值、解析值）的可编辑层级模型
//!
//! 节点树在每次刷新时整体重建；只有单个叶子值会在原位被编辑写回，
//! 写回后由组件自行 rebuild，并发出界面刷新请求。

use std::rc::Rc;
use std::time::Instant;

use crate::config::TreeModelConfig;
use crate::model::literal::coerce;
use crate::model::node::{Node, NodeId, OptionTree};
use crate::model::path::{json_path, write_value};
use crate::model::tree_builder::build_option_tree;
use crate::model::value::OptionValue;
use crate::vm::bridge::{
    Listener, ModelEvent, SharedComponent, SubscriptionId, ValueParser, ViewHints, COLUMN_NAME,
    COLUMN_PARSED, COLUMN_VALUE, HEADERS,
};
use crate::vm::item_model::{
    Alignment, FontWeight, ItemData, ItemFlags, ItemModel, ItemRole, ModelError, ModelIndex,
    Orientation,
};
use crate::vm::refresh::RefreshTimer;

pub struct OptionsTreeModel {
    component: Option<SharedComponent>,
    parser: Rc<dyn ValueParser>,
    view: Option<Rc<dyn ViewHints>>,
    config: TreeModelConfig,
    tree: OptionTree,
    /// 每次重建递增；旧代号的索引不再指向任何节点
    generation: u64,
    /// 上次自动刷新观察到的根行数
    row_count_cache: Option<usize>,
    timer: RefreshTimer,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl OptionsTreeModel {
    pub fn new(config: TreeModelConfig, parser: Rc<dyn ValueParser>, view: Option<Rc<dyn ViewHints>>) -> Self {
        Self {
            component: None,
            parser,
            view,
            timer: RefreshTimer::new(config.refresh_interval()),
            config,
            tree: OptionTree::new(),
            generation: 1,
            row_count_cache: None,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    /// 绑定组件并立即构建
    pub fn with_component(mut self, component: SharedComponent) -> Self {
        self.component = Some(component);
        self.load();
        self
    }

    pub fn component(&self) -> Option<&SharedComponent> {
        self.component.as_ref()
    }

    /// 切换所选组件（None 表示未选中任何组件）
    pub fn set_component(&mut self, component: Option<SharedComponent>) {
        self.component = component;
        self.refresh();
    }

    pub fn tree(&self) -> &OptionTree {
        &self.tree
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cached_row_count(&self) -> Option<usize> {
        self.row_count_cache
    }

    pub fn config(&self) -> &TreeModelConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: TreeModelConfig) {
        self.timer.set_interval(config.refresh_interval());
        self.config = config;
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&ModelEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    fn emit(&mut self, event: ModelEvent) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(&event);
        }
    }

    /// 从当前字典重建节点树；未绑定组件时保持原样
    pub fn load(&mut self) {
        let Some(component) = &self.component else {
            return;
        };
        let tree = {
            let component = component.borrow();
            tracing::debug!("重建组件 {} 的选项树", component.name());
            build_option_tree(component.options())
        };
        self.tree = tree;
        self.generation += 1;
    }

    /// 强制刷新：重建整棵树并发出全量失效
    pub fn refresh(&mut self) {
        self.load();
        self.emit(ModelEvent::ModelReset);
    }

    /// 组件主动通知选项已变化
    pub fn notify_options_changed(&mut self) {
        tracing::debug!("收到选项变更通知，刷新选项树");
        self.refresh();
    }

    /// 检查根行数是否变化；变化时发出全量失效并请求视图调整列宽
    ///
    /// 只比较根下的行数，数量不变的增删或更深层的结构变化察觉不到。
    pub fn auto_refresh(&mut self) {
        let new_row_count = self.row_count(&ModelIndex::invalid());
        if self.row_count_cache != Some(new_row_count) {
            tracing::debug!(
                "根行数变化: {:?} -> {}，全量刷新视图",
                self.row_count_cache,
                new_row_count
            );
            self.emit(ModelEvent::ModelReset);
            self.row_count_cache = Some(new_row_count);
            if let Some(view) = &self.view {
                view.autoresize_columns();
            }
        }
    }

    /// 宿主事件循环的节拍；到期时执行一次自动刷新
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.config.auto_refresh || !self.timer.poll(now) {
            return false;
        }
        self.auto_refresh();
        true
    }

    /// 索引对应的节点；无效索引指向根，过期索引不指向任何节点
    pub fn node_from_index(&self, index: &ModelIndex) -> Option<NodeId> {
        match index.internal_id() {
            None => Some(self.tree.root()),
            Some(_) if index.generation() != self.generation => None,
            Some(id) => self.tree.get(id).map(|_| id),
        }
    }

    fn display_text(&self, index: &ModelIndex, component: &SharedComponent) -> Result<ItemData, ModelError> {
        let Some(node) = self.node_from_index(index).and_then(|id| self.tree.get(id)) else {
            return Ok(ItemData::None);
        };
        let leaf = match node {
            Node::Branch(branch) => {
                return Ok(match index.column() {
                    COLUMN_NAME => ItemData::Text(branch.name.clone()),
                    _ => ItemData::Text(String::new()),
                });
            }
            Node::Leaf(leaf) => leaf,
        };
        match index.column() {
            COLUMN_NAME => Ok(ItemData::Text(leaf.label.clone())),
            COLUMN_VALUE => {
                let component = component.borrow();
                let value = leaf.value(component.options())?;
                Ok(ItemData::Text(value.to_string()))
            }
            COLUMN_PARSED => {
                let component = component.borrow();
                let value = leaf.value(component.options())?;
                let parsed = self.parser.parse_value(value).map_err(ModelError::ValueParse)?;
                Ok(ItemData::Text(parsed.to_string()))
            }
            _ => Ok(ItemData::None),
        }
    }
}

impl ItemModel for OptionsTreeModel {
    fn row_count(&self, parent: &ModelIndex) -> usize {
        if self.component.is_none() {
            // 未选中组件：提示视图显示占位文字
            if let Some(view) = &self.view {
                view.show_placeholder_text();
            }
            return 0;
        }
        if let Some(view) = &self.view {
            view.hide_placeholder_text();
        }
        self.node_from_index(parent)
            .map_or(0, |id| self.tree.child_count(id))
    }

    fn column_count(&self, _parent: &ModelIndex) -> usize {
        HEADERS.len()
    }

    fn index(&self, row: usize, column: usize, parent: &ModelIndex) -> ModelIndex {
        if self.component.is_none() || column >= HEADERS.len() {
            return ModelIndex::invalid();
        }
        self.node_from_index(parent)
            .and_then(|branch| self.tree.child_at_row(branch, row))
            .map_or_else(ModelIndex::invalid, |child| {
                ModelIndex::new(row, column, child, self.generation)
            })
    }

    fn parent(&self, child: &ModelIndex) -> ModelIndex {
        if !child.is_valid() {
            return ModelIndex::invalid();
        }
        let Some(parent) = self
            .node_from_index(child)
            .and_then(|id| self.tree.get(id))
            .and_then(Node::parent)
        else {
            return ModelIndex::invalid();
        };
        // 根的直接子节点没有可寻址的父级
        let Some(grandparent) = self.tree.get(parent).and_then(Node::parent) else {
            return ModelIndex::invalid();
        };
        match self.tree.row_of_child(grandparent, parent) {
            Some(row) => ModelIndex::new(row, 0, parent, self.generation),
            None => ModelIndex::invalid(),
        }
    }

    fn data(&self, index: &ModelIndex, role: ItemRole) -> Result<ItemData, ModelError> {
        if !index.is_valid() {
            return Ok(ItemData::None);
        }
        let Some(component) = &self.component else {
            return Ok(ItemData::None);
        };
        match role {
            // 编辑器拿到的文本与显示一致
            ItemRole::Display | ItemRole::Edit => self.display_text(index, component),
            ItemRole::Font if index.column() == COLUMN_NAME => Ok(ItemData::Font(FontWeight::Bold)),
            ItemRole::Font => Ok(ItemData::None),
            ItemRole::TextAlignment => Ok(ItemData::Alignment(Alignment::TopLeft)),
        }
    }

    fn set_data(&mut self, index: &ModelIndex, value: &str, role: ItemRole) -> Result<bool, ModelError> {
        if !index.is_valid() || role != ItemRole::Edit || index.column() != COLUMN_VALUE {
            return Ok(false);
        }
        let Some(component) = self.component.clone() else {
            return Ok(false);
        };
        let Some(leaf) = self
            .node_from_index(index)
            .and_then(|id| self.tree.leaf(id))
            .cloned()
        else {
            return Ok(false);
        };

        let new_text = value.to_string();
        let old_value = leaf.value(component.borrow().options())?.clone();
        if old_value.to_string() == new_text {
            return Ok(false);
        }

        // 旧值不是字符串时尝试按字面量还原类型，否则原样存字符串
        let new_value = if old_value.is_string() {
            OptionValue::String(new_text)
        } else {
            let (processed, used_literal) = coerce(&new_text);
            tracing::info!(
                "  字面量解析: 旧值类型={}; 新值类型={}; 新值={}; 使用字面量={}",
                old_value.type_name(),
                processed.type_name(),
                processed,
                used_literal
            );
            processed
        };

        let key_path = leaf.key_path();
        tracing::info!(
            "设置组件选项 {:>10}: 旧值={} ({}); 新值={} ({}); 路径={}",
            leaf.label,
            old_value,
            old_value.type_name(),
            new_value,
            new_value.type_name(),
            json_path(&key_path)
        );

        {
            let mut component = component.borrow_mut();
            write_value(component.options_mut(), &leaf.path, &leaf.label, new_value.clone())?;
            component.rebuild().map_err(ModelError::Rebuild)?;
        }

        self.emit(ModelEvent::OptionChanged {
            key_path,
            old_value,
            new_value,
        });
        self.emit(ModelEvent::RefreshRequested);
        Ok(true)
    }

    fn header_data(&self, section: usize, orientation: Orientation, role: ItemRole) -> ItemData {
        match (orientation, role) {
            (Orientation::Horizontal, ItemRole::Display) => HEADERS
                .get(section)
                .map_or(ItemData::None, |h| ItemData::Text(h.to_string())),
            (Orientation::Horizontal, ItemRole::Font) => ItemData::Font(FontWeight::Bold),
            _ => ItemData::None,
        }
    }

    fn is_branch(&self, index: &ModelIndex) -> bool {
        index.is_valid()
            && self
                .node_from_index(index)
                .and_then(|id| self.tree.get(id))
                .is_some_and(|node| !node.is_leaf())
    }

    fn flags(&self, index: &ModelIndex) -> ItemFlags {
        let flags = ItemFlags::SELECTABLE | ItemFlags::ENABLED;
        if index.column() == COLUMN_VALUE {
            let is_leaf = self
                .node_from_index(index)
                .and_then(|id| self.tree.get(id))
                .is_some_and(Node::is_leaf);
            if is_leaf {
                return flags | ItemFlags::EDITABLE;
            }
        }
        flags
    }
}
