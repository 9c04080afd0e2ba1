//! iLibrary 通用类型定义
//!
//! 此 crate 包含 ODBC 客户端 (ilib-db2) 与 SFTP 客户端 (ilib-sftp) 之间共享的类型：
//! - [`Credentials`]: 同一套凭据同时用于数据库连接和 SSH 连接
//! - [`ObjectName`]: IBM i 系统对象名（库名、保存文件名）校验

mod name;

pub use name::{ObjectName, ValidationError, MAX_OBJECT_NAME_LEN};

use serde::{Deserialize, Serialize};
use std::fmt;

/// 连接凭据
///
/// 只保存字面值，两个客户端各自根据它构造自己的连接。
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    /// 用户 ID
    pub user: String,

    /// 密码
    pub password: String,

    /// 系统名 / 主机地址
    pub host: String,

    /// ODBC 驱动名称（必须与已安装的驱动完全一致）
    #[serde(default = "default_driver")]
    pub driver: String,
}

fn default_driver() -> String {
    "{IBM i Access ODBC Driver}".to_string()
}

impl Credentials {
    /// 创建凭据
    pub fn new(
        user: impl Into<String>,
        password: impl Into<String>,
        host: impl Into<String>,
        driver: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
            host: host.into(),
            driver: driver.into(),
        }
    }

    /// 使用默认驱动名称创建凭据
    pub fn with_default_driver(
        user: impl Into<String>,
        password: impl Into<String>,
        host: impl Into<String>,
    ) -> Self {
        Self::new(user, password, host, default_driver())
    }

    /// 检查必填字段
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.user.trim().is_empty() {
            return Err(ValidationError::MissingField("user"));
        }
        if self.host.trim().is_empty() {
            return Err(ValidationError::MissingField("host"));
        }
        if self.driver.trim().is_empty() {
            return Err(ValidationError::MissingField("driver"));
        }
        Ok(())
    }
}

// 密码不进日志
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"******")
            .field("host", &self.host)
            .field("driver", &self.driver)
            .finish()
    }
}
