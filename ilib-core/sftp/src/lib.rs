//! iLibrary SFTP 传输
//!
//! 通过 SSH 的 sftp 子系统从 IBM i 的 IFS 下载文件，支持：
//! - 密码认证
//! - 主机密钥校验（接受任意 / known_hosts）
//! - 连接超时
//!
//! # 示例
//!
//! ```ignore
//! use ilib_sftp::{SftpClient, SftpConfig, FileTransfer};
//!
//! let config = SftpConfig::with_password("pub400.com", "MYUSER", "secret");
//! let mut client = SftpClient::connect(config).await?;
//! let bytes = client.download("/home/MYUSER/MYSAVF.savf", "./MYSAVF.savf".as_ref()).await?;
//! client.disconnect().await?;
//! ```

mod client;
mod config;
mod error;
mod transfer;

pub use client::{SftpClient, SftpConnector};
pub use config::{HostKeyPolicy, SftpConfig};
pub use error::{Result, SftpError};
pub use transfer::{FileTransfer, TransferConnector};
