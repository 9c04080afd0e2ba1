//! 会话：一条 ODBC 连接加上按需建立的 SFTP 连接

use ilib_common::{Credentials, ObjectName};
use ilib_db2::{catalog, CatalogRecord, LibraryInfo, OdbcConnection, SqlExecutor};
use ilib_sftp::{FileTransfer, SftpConfig, SftpConnector, SftpError, TransferConnector};
use serde_json::json;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::commands;
use crate::error::{Result, SessionError};
use crate::request::{SaveFileRef, SaveLibraryRequest, SaveOutcome};

/// [`Session::run`] 接受的闭包返回的 future
pub type SessionFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

struct ActiveTransfer {
    port: u16,
    client: Box<dyn FileTransfer>,
}

/// IBM i 库管理会话
///
/// 查询使用 `&self`，会改变系统状态的操作使用 `&mut self`，同一会话上的操作不会重叠。
/// 调用 [`Session::close`] 或丢弃值时释放数据库连接和 SFTP 连接。
pub struct Session {
    credentials: Credentials,
    executor: Box<dyn SqlExecutor>,
    connector: Arc<dyn TransferConnector>,
    sftp: SftpConfig,
    transfer: Option<ActiveTransfer>,
    closed: bool,
}

impl Session {
    /// 校验凭据并建立 ODBC 连接，SFTP 在第一次下载时才连接
    pub async fn open(credentials: Credentials) -> Result<Self> {
        credentials.validate()?;
        let executor = OdbcConnection::connect(&credentials).await?;
        Ok(Self::from_parts(
            credentials,
            Box::new(executor),
            Arc::new(SftpConnector),
        ))
    }

    /// 使用指定的执行器和传输连接器构造会话
    pub fn from_parts(
        credentials: Credentials,
        executor: Box<dyn SqlExecutor>,
        connector: Arc<dyn TransferConnector>,
    ) -> Self {
        let sftp = SftpConfig::from_credentials(&credentials);
        Self {
            credentials,
            executor,
            connector,
            sftp,
            transfer: None,
            closed: false,
        }
    }

    /// 调整 SFTP 设置（端口、超时、主机密钥策略）
    pub fn configure_sftp(mut self, f: impl FnOnce(SftpConfig) -> SftpConfig) -> Self {
        let mut config = f(self.sftp.clone());
        config.host = self.credentials.host.clone();
        config.username = self.credentials.user.clone();
        config.password = self.credentials.password.clone();
        self.sftp = config;
        self
    }

    /// 打开会话，执行 `f`，无论成功与否都关闭会话
    ///
    /// ```ignore
    /// let info = Session::scoped(creds, |s| Box::pin(async move { s.library_info("QGPL").await })).await?;
    /// ```
    pub async fn scoped<T, F>(credentials: Credentials, f: F) -> Result<T>
    where
        F: for<'a> FnOnce(&'a mut Session) -> SessionFuture<'a, T>,
    {
        Self::open(credentials).await?.run(f).await
    }

    /// 执行 `f` 后关闭会话；`f` 的错误优先于关闭时的错误
    pub async fn run<T, F>(mut self, f: F) -> Result<T>
    where
        F: for<'a> FnOnce(&'a mut Session) -> SessionFuture<'a, T>,
    {
        let result = f(&mut self).await;
        let closed = self.close().await;
        match result {
            Ok(value) => closed.map(|_| value),
            Err(e) => Err(e),
        }
    }

    /// 关闭 ODBC 和 SFTP 连接
    ///
    /// 两者都会尝试关闭，返回遇到的第一个错误。
    pub async fn close(mut self) -> Result<()> {
        self.shutdown().await
    }

    async fn shutdown(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let transfer_result = match self.transfer.take() {
            Some(mut active) => active.client.disconnect().await.map_err(SessionError::from),
            None => Ok(()),
        };
        let db_result = self.executor.close().await.map_err(SessionError::from);

        info!("会话已关闭: {}", self.credentials.host);
        db_result.and(transfer_result)
    }

    /// 查询库信息，库不存在时返回 `None`
    pub async fn library_info(&self, library: &str) -> Result<Option<LibraryInfo>> {
        let library = ObjectName::library(library)?;
        Ok(catalog::library_info(self.executor.as_ref(), &library).await?)
    }

    /// 库信息的 JSON 文本
    ///
    /// 库不存在时返回 `{"error": "No data found for library: X"}`。
    pub async fn library_info_json(&self, library: &str) -> Result<String> {
        let name = ObjectName::library(library)?;
        let json = match self.library_info(name.as_str()).await? {
            Some(info) => serde_json::to_string_pretty(&info)?,
            None => serde_json::to_string_pretty(&json!({
                "error": format!("No data found for library: {}", name)
            }))?,
        };
        Ok(json)
    }

    /// 列出库中对象，`source_only` 时只列源物理文件
    pub async fn file_info(&self, library: &str, source_only: bool) -> Result<Vec<CatalogRecord>> {
        let library = ObjectName::library(library)?;
        Ok(catalog::object_list(self.executor.as_ref(), &library, source_only).await?)
    }

    pub async fn file_info_json(&self, library: &str, source_only: bool) -> Result<String> {
        let records = self.file_info(library, source_only).await?;
        Ok(serde_json::to_string_pretty(&records)?)
    }

    /// 列出库中所有源成员
    pub async fn source_members(&self, library: &str) -> Result<Vec<CatalogRecord>> {
        let library = ObjectName::library(library)?;
        Ok(catalog::source_members(self.executor.as_ref(), &library).await?)
    }

    pub async fn source_members_json(&self, library: &str) -> Result<String> {
        let records = self.source_members(library).await?;
        Ok(serde_json::to_string_pretty(&records)?)
    }

    /// 把整个库保存到保存文件，可选下载到本地
    ///
    /// 步骤依次执行，失败时不回滚已完成的步骤。下载失败时保存文件和 IFS 副本都保留。
    pub async fn save_library(&mut self, request: &SaveLibraryRequest) -> Result<SaveOutcome> {
        let library = request.library_name()?;
        let savf = request.save_file_ref()?;
        let download = match &request.download {
            Some(options) => Some((
                options.local_dir()?.clone(),
                options.remote_dir()?.to_string(),
                options.port,
                options.remove_save_file,
            )),
            None => None,
        };

        info!("保存库 {} 到 {}", library, savf);
        self.run_command(&commands::create_save_file(&savf, request))
            .await?;
        self.run_command(&commands::save_library(library.as_str(), &savf, request))
            .await?;

        let Some((local_dir, remote_dir, port, remove_save_file)) = download else {
            info!("库 {} 已保存到 {}", library, savf);
            return Ok(SaveOutcome {
                save_file: savf,
                local_path: None,
                bytes_downloaded: None,
                save_file_removed: false,
            });
        };

        let stream_file = commands::join_ifs_path(&remote_dir, &savf.stream_file_name());
        self.run_command(&commands::copy_to_stream_file(&savf, &stream_file))
            .await?;

        let local_path = local_dir.join(savf.stream_file_name());
        let bytes = self.download(&stream_file, &local_path, port).await?;
        info!("已下载 {} 字节到 {}", bytes, local_path.display());

        let cleanup = commands::remove_stream_file(&stream_file);
        if let Err(e) = self.executor.run_command(&cleanup).await {
            warn!("删除 IFS 临时文件 {} 失败: {}", stream_file, e);
        }

        if remove_save_file {
            self.delete_save_file(&savf).await?;
        }

        Ok(SaveOutcome {
            save_file: savf,
            local_path: Some(local_path),
            bytes_downloaded: Some(bytes),
            save_file_removed: remove_save_file,
        })
    }

    /// 删除保存文件
    pub async fn remove_file(&mut self, library: &str, save_file: &str) -> Result<()> {
        let savf = SaveFileRef::parse(library, save_file)?;
        self.delete_save_file(&savf).await
    }

    async fn delete_save_file(&mut self, savf: &SaveFileRef) -> Result<()> {
        self.run_command(&commands::delete_file(savf)).await?;
        info!("保存文件 {} 已删除", savf);
        Ok(())
    }

    async fn run_command(&mut self, command: &str) -> Result<()> {
        Ok(self.executor.run_command(command).await?)
    }

    async fn download(&mut self, remote: &str, local: &Path, port: Option<u16>) -> Result<u64> {
        if let Some(dir) = local.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(SftpError::from)?;
        }

        let client = self.transfer_for(port).await?;
        Ok(client.download(remote, local).await?)
    }

    /// 按端口取得 SFTP 连接，端口变化时重新连接
    async fn transfer_for(&mut self, port: Option<u16>) -> Result<&mut Box<dyn FileTransfer>> {
        let mut config = self.sftp.clone();
        if let Some(port) = port {
            config.port = port;
        }

        let reusable = matches!(&self.transfer, Some(active) if active.port == config.port);
        if !reusable {
            if let Some(mut stale) = self.transfer.take() {
                if let Err(e) = stale.client.disconnect().await {
                    warn!("断开旧 SFTP 连接失败: {}", e);
                }
            }
            debug!("建立 SFTP 连接: {}", config.address());
            let client = self.connector.connect(&config).await?;
            self.transfer = Some(ActiveTransfer {
                port: config.port,
                client,
            });
        }

        match self.transfer.as_mut() {
            Some(active) => Ok(&mut active.client),
            None => Err(SftpError::ConnectionError("SFTP 连接不可用".to_string()).into()),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.closed {
            // 执行器和传输连接随字段一起释放
            debug!("会话未显式关闭，随值释放: {}", self.credentials.host);
        }
    }
}
