//! SFTP 客户端实现
//!
//! 基于 russh 建立 SSH 连接，通过 sftp 子系统读取远程文件。

use async_trait::async_trait;
use russh::client::{self, Handle, Handler};
use russh_sftp::client::SftpSession;
use russh_sftp::protocol::OpenFlags;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::{HostKeyPolicy, SftpConfig};
use crate::error::{Result, SftpError};
use crate::transfer::{FileTransfer, TransferConnector};

/// 主机密钥校验
struct ClientHandler {
    host: String,
    port: u16,
    policy: HostKeyPolicy,
    known_hosts_path: Option<PathBuf>,
}

impl Handler for ClientHandler {
    type Error = SftpError;

    async fn check_server_key(
        &mut self,
        server_public_key: &russh::keys::PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        if self.policy == HostKeyPolicy::AcceptAny {
            return Ok(true);
        }
        let checked = match &self.known_hosts_path {
            Some(path) => {
                russh::keys::check_known_hosts_path(&self.host, self.port, server_public_key, path)
            }
            None => russh::keys::check_known_hosts(&self.host, self.port, server_public_key),
        };
        checked.map_err(|e| SftpError::HostKeyError(e.to_string()))
    }
}

/// SFTP 客户端
pub struct SftpClient {
    handle: Option<Handle<ClientHandler>>,
    sftp: Option<SftpSession>,
    config: SftpConfig,
}

impl SftpClient {
    /// 连接、认证并打开 sftp 子系统
    pub async fn connect(config: SftpConfig) -> Result<Self> {
        info!("正在连接 SFTP: {}@{}", config.username, config.address());

        let handle = timeout(config.connect_timeout, Self::open_handle(&config))
            .await
            .map_err(|_| SftpError::TimeoutError(format!("连接 {} 超时", config.address())))??;

        debug!("打开 sftp 子系统...");
        let channel = handle.channel_open_session().await?;
        channel.request_subsystem(true, "sftp").await?;
        let sftp = SftpSession::new(channel.into_stream()).await?;

        info!("SFTP 连接成功: {}@{}", config.username, config.address());
        Ok(Self {
            handle: Some(handle),
            sftp: Some(sftp),
            config,
        })
    }

    async fn open_handle(config: &SftpConfig) -> Result<Handle<ClientHandler>> {
        let ssh_config = Arc::new(client::Config::default());
        let handler = ClientHandler {
            host: config.host.clone(),
            port: config.port,
            policy: config.host_key_policy.clone(),
            known_hosts_path: config.known_hosts_path.clone(),
        };

        let mut handle = client::connect(ssh_config, (config.host.as_str(), config.port), handler)
            .await
            .map_err(|e| match e {
                SftpError::Ssh(inner) => SftpError::ConnectionError(inner.to_string()),
                other => other,
            })?;

        let auth = handle
            .authenticate_password(config.username.as_str(), config.password.as_str())
            .await?;
        if !auth.success() {
            return Err(SftpError::AuthenticationError(format!(
                "用户 {} 密码认证被拒绝",
                config.username
            )));
        }

        Ok(handle)
    }

    fn session(&self) -> Result<&SftpSession> {
        self.sftp
            .as_ref()
            .ok_or_else(|| SftpError::ConnectionError("SFTP 会话已关闭".to_string()))
    }
}

#[async_trait]
impl FileTransfer for SftpClient {
    async fn remote_size(&mut self, remote: &str) -> Result<u64> {
        let attrs = self.session()?.metadata(remote).await?;
        attrs
            .size
            .ok_or_else(|| SftpError::RemoteFileError(format!("服务器未返回 {} 的大小", remote)))
    }

    async fn download(&mut self, remote: &str, local: &Path) -> Result<u64> {
        info!("下载 {}:{} -> {}", self.config.host, remote, local.display());

        let expected = self.remote_size(remote).await?;
        let mut remote_file = self
            .session()?
            .open_with_flags(remote, OpenFlags::READ)
            .await?;

        let actual = write_verified(&mut remote_file, local, expected).await?;
        debug!("下载完成: {} 字节", actual);
        Ok(actual)
    }

    async fn disconnect(&mut self) -> Result<()> {
        // 子系统通道随连接一起关闭
        self.sftp.take();
        if let Some(handle) = self.handle.take() {
            handle
                .disconnect(russh::Disconnect::ByApplication, "", "")
                .await?;
            info!("SFTP 连接已断开: {}", self.config.address());
        }
        Ok(())
    }
}

/// 下载过程中的临时文件：`<local>.part`
fn partial_path(local: &Path) -> PathBuf {
    let mut name = local.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

async fn copy_to_file<R>(reader: &mut R, path: &Path, expected: u64) -> Result<u64>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut file = tokio::fs::File::create(path).await?;
    let actual = tokio::io::copy(reader, &mut file).await?;
    file.flush().await?;

    if actual != expected {
        return Err(SftpError::SizeMismatch { expected, actual });
    }
    Ok(actual)
}

/// 先写入 `<local>.part`，大小校验通过后再改名为 `local`
///
/// 任何失败都会删除临时文件，`local` 上已有的文件保持不变。
pub(crate) async fn write_verified<R>(reader: &mut R, local: &Path, expected: u64) -> Result<u64>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let partial = partial_path(local);
    let result = match copy_to_file(reader, &partial, expected).await {
        Ok(actual) => tokio::fs::rename(&partial, local)
            .await
            .map(|_| actual)
            .map_err(SftpError::from),
        Err(e) => Err(e),
    };

    if result.is_err() {
        match tokio::fs::remove_file(&partial).await {
            Ok(()) => debug!("已删除未完成的下载: {}", partial.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("删除 {} 失败: {}", partial.display(), e),
        }
    }
    result
}

/// 使用 russh 建立真实连接
#[derive(Debug, Clone, Default)]
pub struct SftpConnector;

#[async_trait]
impl TransferConnector for SftpConnector {
    async fn connect(&self, config: &SftpConfig) -> Result<Box<dyn FileTransfer>> {
        let client = SftpClient::connect(config.clone()).await?;
        Ok(Box::new(client))
    }
}
