//! 配置查看命令

use anyhow::Result;
use colored::Colorize;

use crate::config::CliConfig;

pub async fn handle(action: crate::ConfigAction, config: &CliConfig) -> Result<()> {
    match action {
        crate::ConfigAction::Show => show(config),
        crate::ConfigAction::Path => {
            println!("{}", CliConfig::config_path()?.display());
            Ok(())
        }
    }
}

fn show(config: &CliConfig) -> Result<()> {
    println!("{}\n", "当前生效配置 (文件 + 环境变量):".bold());
    println!("{}", config.to_masked_toml()?);

    if let Err(e) = config.credentials() {
        println!("{} {}", "!".yellow().bold(), e.to_string().yellow());
    }
    Ok(())
}
