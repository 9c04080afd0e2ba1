//! iLibrary Db2 访问层
//!
//! 通过 IBM i Access ODBC Driver 连接 Db2 for i，提供：
//! - 系统目录查询（`QSYS2.LIBRARY_INFO`、`OBJECT_STATISTICS`、`SYSMEMBERSTAT`）
//! - 通过 `QSYS2.QCMDEXC` 执行 CL 命令
//!
//! # 示例
//!
//! ```ignore
//! use ilib_common::{Credentials, ObjectName};
//! use ilib_db2::{catalog, OdbcConnection, SqlExecutor};
//!
//! let creds = Credentials::with_default_driver("MYUSER", "secret", "pub400.com");
//! let conn = OdbcConnection::connect(&creds).await?;
//! let info = catalog::library_info(&conn, &ObjectName::library("QGPL")?).await?;
//! conn.run_command("CRTSAVF FILE(QGPL/MYSAVF)").await?;
//! conn.close().await?;
//! ```

pub mod catalog;
mod connection;
mod error;
mod executor;
mod record;

pub use connection::{connection_string, OdbcConnection};
pub use error::{DbError, Result};
pub use executor::{SqlExecutor, QCMDEXC_CALL};
pub use record::{CatalogRecord, LibraryInfo};
