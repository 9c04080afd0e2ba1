//! 公共工具函数

use anyhow::{Context, Result};
use ilib_session::Session;
use std::time::Duration;

use crate::config::CliConfig;

/// 按配置打开会话
pub async fn open_session(config: &CliConfig) -> Result<Session> {
    let credentials = config.credentials()?;
    let host = credentials.host.clone();

    let session = Session::open(credentials)
        .await
        .with_context(|| format!("无法连接 IBM i: {}", host))?;

    let sftp = config.sftp.clone();
    let known_hosts_path = sftp.known_hosts_path();
    Ok(session.configure_sftp(|c| {
        c.port(sftp.port)
            .connect_timeout(Duration::from_secs(sftp.connect_timeout))
            .host_key_policy(sftp.host_key_policy)
            .known_hosts_path(known_hosts_path)
    }))
}
