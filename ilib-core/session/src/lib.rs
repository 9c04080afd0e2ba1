//! iLibrary 会话
//!
//! 面向 IBM i 的库管理操作：
//! - 查询库信息、库中对象和源成员（返回结构化记录或 JSON）
//! - 把整个库保存到保存文件，并可通过 SFTP 下载到本地
//! - 删除保存文件
//!
//! # 示例
//!
//! ```ignore
//! use ilib_common::Credentials;
//! use ilib_session::{DownloadOptions, SaveLibraryRequest, Session};
//!
//! let creds = Credentials::with_default_driver("MYUSER", "secret", "pub400.com");
//! let mut session = Session::open(creds).await?;
//! println!("{}", session.library_info_json("QGPL").await?);
//!
//! let request = SaveLibraryRequest::new("MYLIB", "MYLIBSAVE")
//!     .download(DownloadOptions::new("./backups", "/home/MYUSER"));
//! let outcome = session.save_library(&request).await?;
//! session.close().await?;
//! ```

pub mod commands;
mod error;
mod request;
mod session;

pub use error::{Result, SessionError};
pub use request::{
    DownloadOptions, SaveFileRef, SaveLibraryRequest, SaveOutcome, DEFAULT_DESCRIPTION,
    DEFAULT_DEVICE, DEFAULT_TARGET_RELEASE,
};
pub use session::{Session, SessionFuture};
