//! 保存文件管理命令

use anyhow::{Context, Result};
use colored::Colorize;

use super::common::open_session;
use crate::config::CliConfig;

pub async fn handle(action: crate::SavfAction, config: &CliConfig) -> Result<()> {
    match action {
        crate::SavfAction::Remove { library, savf } => remove(config, &library, &savf).await,
    }
}

async fn remove(config: &CliConfig, library: &str, savf: &str) -> Result<()> {
    let mut session = open_session(config).await?;
    let result = session.remove_file(library, savf).await;
    session.close().await?;

    result.with_context(|| {
        format!(
            "删除保存文件 {}/{} 失败",
            library.to_uppercase(),
            savf.to_uppercase()
        )
    })?;

    println!(
        "{} 保存文件 {}/{} 已删除",
        "✓".green().bold(),
        library.to_uppercase().cyan(),
        savf.to_uppercase().cyan().bold()
    );
    Ok(())
}
