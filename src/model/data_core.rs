//! 文件支撑的选项组件：从 JSON 文档加载 options 字典并负责保存

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::model::value::OptionMap;
use crate::utils::fs::{read_options_file, write_options_file};
use crate::vm::bridge::{BoxError, OptionsComponent};

#[derive(Error, Debug)]
pub enum OptionsError {
    #[error("IO失败: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON解析失败: {0}")]
    Json(#[from] serde_json::Error),
    #[error("状态错误: {0}")]
    State(String),
}

/// 以 JSON 文件为后端的组件
#[derive(Debug, Default)]
pub struct JsonOptionsComponent {
    pub name: String,
    pub source_path: Option<PathBuf>,
    pub options: OptionMap,
    /// 自上次保存以来 rebuild 的次数
    pub rebuild_count: usize,
    pub dirty: bool,
}

impl JsonOptionsComponent {
    pub fn new(name: &str, options: OptionMap) -> Self {
        Self {
            name: name.to_string(),
            options,
            ..Self::default()
        }
    }

    /// 加载选项文件；组件名取文件名主干
    pub fn load_file(p: &Path) -> Result<Self, OptionsError> {
        let options = read_options_file(p)?;
        let name = p
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        tracing::info!("选项文件加载成功: {} ({} 个顶层键)", p.display(), options.len());
        Ok(Self {
            name,
            source_path: Some(p.to_path_buf()),
            options,
            ..Self::default()
        })
    }

    /// 将当前选项保存到指定路径
    pub fn save_to_file(&mut self, path: &Path) -> Result<(), OptionsError> {
        write_options_file(path, &self.options)?;
        self.dirty = false;
        tracing::info!("选项文件保存成功: {}", path.display());
        Ok(())
    }

    /// 保存回加载时的原始文件
    pub fn save_to_original_file(&mut self) -> Result<(), OptionsError> {
        let original_path = self
            .source_path
            .clone()
            .ok_or_else(|| OptionsError::State("原始文件路径未设置".into()))?;
        self.save_to_file(&original_path)
    }
}

impl OptionsComponent for JsonOptionsComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn options(&self) -> &OptionMap {
        &self.options
    }

    fn options_mut(&mut self) -> &mut OptionMap {
        &mut self.options
    }

    fn rebuild(&mut self) -> Result<(), BoxError> {
        self.rebuild_count += 1;
        self.dirty = true;
        tracing::debug!("组件 {} 重建 (第 {} 次)", self.name, self.rebuild_count);
        Ok(())
    }
}
