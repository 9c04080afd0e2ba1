//! SQL 执行抽象接口

use async_trait::async_trait;

use crate::error::Result;
use crate::record::CatalogRecord;

/// 执行 CL 命令所用的系统存储过程
pub const QCMDEXC_CALL: &str = "CALL QSYS2.QCMDEXC(?)";

/// SQL 执行器 trait
///
/// 会话只通过此 trait 访问数据库，真实实现为 [`crate::OdbcConnection`]。
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// 执行只读查询，`params` 按顺序绑定到 `?` 占位符
    async fn query(&self, sql: &str, params: &[String]) -> Result<Vec<CatalogRecord>>;

    /// 通过 `QSYS2.QCMDEXC` 执行一条 CL 命令
    async fn run_command(&self, command: &str) -> Result<()>;

    /// 关闭连接，重复调用无副作用
    async fn close(&self) -> Result<()>;
}
