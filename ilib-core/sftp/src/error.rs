//! SFTP 错误定义

use thiserror::Error;

/// SFTP 操作结果类型
pub type Result<T> = std::result::Result<T, SftpError>;

/// SFTP 错误类型
#[derive(Error, Debug)]
pub enum SftpError {
    /// 连接错误
    #[error("SSH 连接失败: {0}")]
    ConnectionError(String),

    /// 认证错误
    #[error("SSH 认证失败: {0}")]
    AuthenticationError(String),

    /// 主机密钥校验失败
    #[error("主机密钥校验失败: {0}")]
    HostKeyError(String),

    /// SSH 协议错误
    #[error("SSH 错误: {0}")]
    Ssh(#[from] russh::Error),

    /// SFTP 子系统错误
    #[error("SFTP 错误: {0}")]
    Sftp(#[from] russh_sftp::client::error::Error),

    /// 远程文件不可用
    #[error("远程文件错误: {0}")]
    RemoteFileError(String),

    /// 超时错误
    #[error("SSH 操作超时: {0}")]
    TimeoutError(String),

    /// 下载的字节数与远程文件大小不一致
    #[error("文件大小不一致: 远程 {expected} 字节, 本地 {actual} 字节")]
    SizeMismatch { expected: u64, actual: u64 },

    /// IO 错误
    #[error("IO 错误: {0}")]
    IoError(#[from] std::io::Error),
}
