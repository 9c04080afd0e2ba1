use ilib_common::ValidationError;
use ilib_db2::DbError;
use ilib_sftp::SftpError;
use thiserror::Error;

/// 会话错误类型
#[derive(Error, Debug)]
pub enum SessionError {
    /// 参数校验失败，未发生任何远程调用
    #[error("Invalid argument: {0}")]
    Validation(#[from] ValidationError),

    /// 无法建立数据库连接
    #[error("Connection failed: {0}")]
    Connection(String),

    /// CL 命令执行失败
    #[error("Command '{command}' failed: {message}")]
    RemoteCommand { command: String, message: String },

    /// SFTP 连接或下载失败
    #[error("Transfer failed: {0}")]
    Transfer(#[from] SftpError),

    /// 目录查询失败
    #[error("Query failed: {0}")]
    Query(String),

    /// JSON 序列化失败
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<DbError> for SessionError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::ConnectionError(msg) => SessionError::Connection(msg),
            DbError::CommandError { command, message } => {
                SessionError::RemoteCommand { command, message }
            }
            DbError::Closed => SessionError::Connection(DbError::Closed.to_string()),
            DbError::QueryError(msg) | DbError::TaskError(msg) => SessionError::Query(msg),
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_error_keeps_command() {
        let err: SessionError = DbError::CommandError {
            command: "DLTF FILE(MYLIB/NOPE)".to_string(),
            message: "CPF2105".to_string(),
        }
        .into();

        match err {
            SessionError::RemoteCommand { command, message } => {
                assert_eq!(command, "DLTF FILE(MYLIB/NOPE)");
                assert_eq!(message, "CPF2105");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_connection_error_mapping() {
        let err: SessionError = DbError::ConnectionError("08001".to_string()).into();
        assert!(matches!(err, SessionError::Connection(_)));

        let err: SessionError = DbError::Closed.into();
        assert!(matches!(err, SessionError::Connection(_)));
    }
}
