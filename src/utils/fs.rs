//! IO helper: safe file read/write for option documents

use std::{fs::File, io::BufReader, path::Path};

use crate::model::data_core::OptionsError;
use crate::model::value::OptionMap;

/// 从文件读取选项字典（根必须是 JSON 对象，键顺序保持不变）
pub fn read_options_file(p: &Path) -> Result<OptionMap, OptionsError> {
    let f = File::open(p)?;
    let rdr = BufReader::new(f);
    let v: OptionMap = serde_json::from_reader(rdr)?;
    Ok(v)
}

/// 将选项字典保存到文件（格式化输出）
pub fn write_options_file(p: &Path, options: &OptionMap) -> Result<(), OptionsError> {
    let f = File::create(p)?;
    serde_json::to_writer_pretty(f, options)?;
    Ok(())
}
