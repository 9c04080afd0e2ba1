//! iLibrary CLI 应用

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::save::SaveArgs;
use config::CliConfig;

#[derive(Parser)]
#[command(name = "ilib")]
#[command(about = "iLibrary - IBM i 库管理工具", long_about = None)]
#[command(version)]
struct Cli {
    /// 日志级别
    #[arg(short, long, global = true, default_value = "info")]
    log_level: String,

    /// 配置文件路径（默认 ~/.config/ilib/config.toml）
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 库信息查询
    Library {
        #[command(subcommand)]
        action: LibraryAction,
    },

    /// 把库保存到保存文件
    Save(SaveArgs),

    /// 保存文件管理
    Savf {
        #[command(subcommand)]
        action: SavfAction,
    },

    /// 配置管理
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum LibraryAction {
    /// 显示库信息
    Info {
        /// 库名
        library: String,
        /// 输出格式 (table/json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },
    /// 列出库中对象
    Files {
        /// 库名
        library: String,
        /// 只列出源物理文件
        #[arg(long)]
        source_only: bool,
        /// 输出格式 (table/json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },
    /// 列出源成员
    Members {
        /// 库名
        library: String,
        /// 输出格式 (table/json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },
}

#[derive(Subcommand)]
enum SavfAction {
    /// 删除保存文件
    Remove {
        /// 库名
        library: String,
        /// 保存文件名
        savf: String,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// 显示当前生效的配置
    Show,
    /// 显示默认配置文件路径
    Path,
}

fn init_logging(level: &str) {
    let log_level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // RUST_LOG 优先
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(LevelFilter::from_level(log_level).into()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok(); // 加载当前目录下的 .env（如果存在）
    init_logging(&cli.log_level);

    info!("iLibrary CLI 启动");

    let config = CliConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Library { action } => commands::library::handle(action, &config).await?,
        Commands::Save(args) => commands::save::handle(args, &config).await?,
        Commands::Savf { action } => commands::savf::handle(action, &config).await?,
        Commands::Config { action } => commands::config::handle(action, &config).await?,
    }

    Ok(())
}
