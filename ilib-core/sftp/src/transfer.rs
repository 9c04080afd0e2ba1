//! 文件传输抽象接口

use async_trait::async_trait;
use std::path::Path;

use crate::config::SftpConfig;
use crate::error::Result;

/// 已建立的文件传输连接
#[async_trait]
pub trait FileTransfer: Send + Sync {
    /// 远程文件大小（字节）
    async fn remote_size(&mut self, remote: &str) -> Result<u64>;

    /// 下载远程文件到本地路径，返回写入的字节数
    ///
    /// 本地文件已存在时会被覆盖。
    async fn download(&mut self, remote: &str, local: &Path) -> Result<u64>;

    /// 断开连接，重复调用无副作用
    async fn disconnect(&mut self) -> Result<()>;
}

/// 按需建立传输连接
///
/// 会话只在第一次需要下载时调用 [`TransferConnector::connect`]。
#[async_trait]
pub trait TransferConnector: Send + Sync {
    async fn connect(&self, config: &SftpConfig) -> Result<Box<dyn FileTransfer>>;
}
