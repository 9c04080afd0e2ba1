//! 保存库命令

use anyhow::{Context, Result};
use chrono::Local;
use clap::Args;
use colored::Colorize;
use ilib_session::{DownloadOptions, SaveLibraryRequest};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

use super::common::open_session;
use crate::config::CliConfig;

/// 保存库参数
#[derive(Args, Debug)]
pub struct SaveArgs {
    /// 要保存的库
    pub library: String,

    /// 保存文件名
    #[arg(long)]
    pub savf: String,

    /// 保存文件所在库（默认与被保存的库相同）
    #[arg(long)]
    pub to_library: Option<String>,

    /// 保存文件描述
    #[arg(long)]
    pub description: Option<String>,

    /// 目标版本 (TGTRLS)
    #[arg(long)]
    pub target_release: Option<String>,

    /// 保存设备 (DEV)
    #[arg(long)]
    pub device: Option<String>,

    /// 卷标 (VOL)
    #[arg(long)]
    pub volume: Option<String>,

    /// 最大记录数 (MAXRCDS)
    #[arg(long)]
    pub max_records: Option<String>,

    /// 辅助存储池 (ASP)
    #[arg(long)]
    pub asp: Option<String>,

    /// 文件等待时间 (WAITFILE)
    #[arg(long)]
    pub wait_file: Option<String>,

    /// 共享 (SHARE)
    #[arg(long)]
    pub share: Option<String>,

    /// 权限 (AUT)
    #[arg(long)]
    pub authority: Option<String>,

    /// 通过 SFTP 下载保存文件
    #[arg(long)]
    pub download: bool,

    /// 本地目录
    #[arg(long, default_value = ".")]
    pub local_path: String,

    /// IFS 临时目录
    #[arg(long)]
    pub remote_path: Option<String>,

    /// SSH 端口
    #[arg(long)]
    pub port: Option<u16>,

    /// 下载后保留保存文件
    #[arg(long)]
    pub keep_savf: bool,
}

impl SaveArgs {
    /// 转换为保存请求
    pub fn to_request(&self) -> Result<SaveLibraryRequest> {
        let mut request = SaveLibraryRequest::new(&self.library, &self.savf);
        request.target_library = self.to_library.clone();
        request.description = self.description.clone();
        request.target_release = self.target_release.clone();
        request.device = self.device.clone();
        request.volume = self.volume.clone();
        request.max_records = self.max_records.clone();
        request.asp = self.asp.clone();
        request.wait_file = self.wait_file.clone();
        request.share = self.share.clone();
        request.authority = self.authority.clone();

        if self.download {
            let remote = self
                .remote_path
                .as_deref()
                .context("--download 需要 --remote-path (IFS 临时目录)")?;
            let local = PathBuf::from(shellexpand::tilde(&self.local_path).into_owned());

            let mut options = DownloadOptions::new(local, remote);
            options.port = self.port;
            if self.keep_savf {
                options = options.keep_save_file();
            }
            request = request.download(options);
        }

        Ok(request)
    }
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

pub async fn handle(args: SaveArgs, config: &CliConfig) -> Result<()> {
    let request = args.to_request()?;
    let mut session = open_session(config).await?;

    let pb = spinner(format!("正在保存库 {}", args.library.to_uppercase()));
    let result = session.save_library(&request).await;
    pb.finish_and_clear();
    session.close().await?;

    let outcome = result.with_context(|| format!("保存库 {} 失败", args.library.to_uppercase()))?;

    println!(
        "{} 库 {} 已保存到 {}",
        "✓".green().bold(),
        args.library.to_uppercase().cyan().bold(),
        outcome.save_file.to_string().yellow()
    );
    if let (Some(path), Some(bytes)) = (&outcome.local_path, outcome.bytes_downloaded) {
        println!("  下载: {} ({} 字节)", path.display().to_string().yellow(), bytes);
    }
    if outcome.save_file_removed {
        println!("  保存文件已从系统删除");
    }
    println!(
        "  完成时间: {}",
        Local::now().format("%Y-%m-%d %H:%M:%S").to_string().bright_black()
    );

    Ok(())
}
