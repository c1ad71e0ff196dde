// ==========================================
// 手术室库存系统 - 命令行入口
// ==========================================
// 用法:
//   theatre-inventory preview <file>
//   theatre-inventory import <file> [--desc-only] [--no-create-storages]
//   theatre-inventory export <file>
// 数据库: THEATRE_INVENTORY_DB_PATH 或用户数据目录
// ==========================================

use anyhow::{anyhow, bail, Context, Result};
use std::path::PathBuf;
use theatre_inventory::app::{get_default_db_path, AppState};
use theatre_inventory::engine::ImportOptions;
use theatre_inventory::logging;

enum Command {
    Preview(PathBuf),
    Import(PathBuf, ImportOptions),
    Export(PathBuf),
}

fn usage() -> String {
    format!(
        "{} v{}\n\n用法:\n  theatre-inventory preview <file>\n  theatre-inventory import <file> [--desc-only] [--no-create-storages]\n  theatre-inventory export <file>",
        theatre_inventory::APP_NAME,
        theatre_inventory::VERSION
    )
}

fn parse_args(args: &[String]) -> Result<Command> {
    let (command, rest) = args.split_first().ok_or_else(|| anyhow!(usage()))?;
    let (file, flags) = rest.split_first().ok_or_else(|| anyhow!("缺少文件参数\n\n{}", usage()))?;
    let file = PathBuf::from(file);

    match command.as_str() {
        "preview" => Ok(Command::Preview(file)),
        "export" => Ok(Command::Export(file)),
        "import" => {
            let mut options = ImportOptions::default();
            for flag in flags {
                match flag.as_str() {
                    "--desc-only" => options.desc_only = true,
                    "--no-create-storages" => options.create_missing_storages = Some(false),
                    other => bail!("未知参数: {}\n\n{}", other, usage()),
                }
            }
            Ok(Command::Import(file, options))
        }
        other => bail!("未知命令: {}\n\n{}", other, usage()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_args(&args)?;

    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);
    let state = AppState::new(db_path).map_err(|e| anyhow!(e)).context("无法初始化AppState")?;

    match command {
        Command::Preview(file) => {
            let preview = state.import_api.preview_file(&file)?;
            println!("{}", serde_json::to_string_pretty(&preview)?);
        }
        Command::Import(file, options) => {
            let summary = state.import_api.import_file(&file, None, options).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Export(file) => {
            let rows = state.export_api.export_csv(&file).await?;
            println!("已导出 {} 条记录到 {}", rows, file.display());
        }
    }

    Ok(())
}
