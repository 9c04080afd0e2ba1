use thiserror::Error;

/// Db2 访问层错误类型
#[derive(Error, Debug)]
pub enum DbError {
    /// 数据库连接错误（凭据错误、主机不可达、驱动缺失）
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    /// 查询执行错误
    #[error("Query failed: {0}")]
    QueryError(String),

    /// CL 命令执行错误（QCMDEXC 返回非成功）
    #[error("Command '{command}' failed: {message}")]
    CommandError { command: String, message: String },

    /// 连接已关闭
    #[error("Database connection is closed")]
    Closed,

    /// 后台阻塞任务异常
    #[error("Blocking task failed: {0}")]
    TaskError(String),
}

pub type Result<T> = std::result::Result<T, DbError>;
