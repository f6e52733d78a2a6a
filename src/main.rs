//! 程序入口：初始化日志，加载选项文件，通过选项树模型查看或编辑

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::fmt::SubscriberBuilder;

use options_tree::vm::bridge::{IdentityParser, COLUMN_VALUE};
use options_tree::vm::rows::{find_index, visible_rows, TreeRow};
use options_tree::{
    ItemModel, ItemRole, JsonOptionsComponent, ModelEvent, OptionsTreeModel, TreeModelConfig,
};

#[derive(Parser)]
#[command(name = "options_tree")]
#[command(about = "查看和编辑组件的嵌套选项")]
struct Cli {
    /// 模型配置文件（JSON）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 输出调试日志
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 以三列树形式打印选项
    Show { file: PathBuf },
    /// 编辑一个叶子选项并保存
    Set {
        file: PathBuf,
        /// 点分隔的键路径，如 pads.gap
        key_path: String,
        value: String,
        /// 另存路径（默认写回原文件）
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

fn load_model(file: &Path, config: TreeModelConfig) -> Result<(Rc<RefCell<JsonOptionsComponent>>, OptionsTreeModel)> {
    let component = JsonOptionsComponent::load_file(file)
        .with_context(|| format!("无法加载选项文件 {}", file.display()))?;
    let component = Rc::new(RefCell::new(component));
    let model = OptionsTreeModel::new(config, Rc::new(IdentityParser), None)
        .with_component(component.clone());
    Ok((component, model))
}

fn print_rows(rows: &[TreeRow]) {
    let name_width = rows
        .iter()
        .map(|r| r.depth * 2 + r.name.chars().count())
        .max()
        .unwrap_or(0)
        .max(4);
    let value_width = rows.iter().map(|r| r.value.chars().count()).max().unwrap_or(0).max(5);

    println!("{:<name_width$}  {:<value_width$}  {}", "Name", "Value", "Parsed value");
    for row in rows {
        let name = format!("{}{}", "  ".repeat(row.depth), row.name);
        println!("{:<name_width$}  {:<value_width$}  {}", name, row.value, row.parsed);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => TreeModelConfig::load(path)
            .with_context(|| format!("无法加载配置文件 {}", path.display()))?,
        None => TreeModelConfig::default(),
    };

    match cli.command {
        Commands::Show { file } => {
            let (_component, model) = load_model(&file, config)?;
            let rows = visible_rows(&model)?;
            if rows.is_empty() {
                println!("(无选项)");
            } else {
                print_rows(&rows);
            }
        }
        Commands::Set {
            file,
            key_path,
            value,
            output,
        } => {
            let (component, mut model) = load_model(&file, config)?;
            let keys: Vec<&str> = key_path.split('.').collect();

            let refresh_requested = Rc::new(RefCell::new(false));
            {
                let refresh_requested = refresh_requested.clone();
                model.subscribe(move |event| {
                    if let ModelEvent::OptionChanged { key_path, old_value, new_value } = event {
                        tracing::info!("选项已变更: {} {} -> {}", key_path.join("."), old_value.repr(), new_value.repr());
                    }
                    if *event == ModelEvent::RefreshRequested {
                        *refresh_requested.borrow_mut() = true;
                    }
                });
            }

            let index = find_index(&model, keys.as_slice())
                .with_context(|| format!("找不到选项 {}", key_path))?;
            let value_index = index.sibling_at_column(COLUMN_VALUE);
            if !model.editable_columns(&index).contains(&COLUMN_VALUE) {
                bail!("{} 不是可编辑的叶子选项", key_path);
            }

            if !model.set_data(&value_index, &value, ItemRole::Edit)? {
                tracing::info!("值未变化，不写文件: {}", key_path);
                return Ok(());
            }
            if *refresh_requested.borrow() {
                model.refresh();
            }

            let mut component = component.borrow_mut();
            match output {
                Some(path) => component.save_to_file(&path)?,
                None => component.save_to_original_file()?,
            }
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    // 初始化日志输出
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let _ = SubscriberBuilder::default().with_max_level(level).try_init();

    if let Err(e) = run(cli) {
        tracing::error!("执行失败: {:#}", e);
        eprintln!("错误: {:#}", e);
        std::process::exit(1);
    }
}
