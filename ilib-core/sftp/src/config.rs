//! SFTP 配置

use ilib_common::Credentials;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// 默认 SSH 端口
pub const DEFAULT_PORT: u16 = 22;

/// 主机密钥校验策略
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostKeyPolicy {
    /// 接受任意主机密钥
    #[default]
    AcceptAny,
    /// 按 known_hosts 文件校验，文件见 [`SftpConfig::known_hosts_path`]
    KnownHosts,
}

/// SFTP 配置
#[derive(Clone, Serialize, Deserialize)]
pub struct SftpConfig {
    /// 主机地址
    pub host: String,
    /// 端口（默认 22）
    #[serde(default = "default_port")]
    pub port: u16,
    /// 用户名
    pub username: String,
    /// 密码
    #[serde(skip_serializing)]
    pub password: String,
    /// 连接超时（秒）
    #[serde(with = "duration_secs", default = "default_connect_timeout")]
    pub connect_timeout: Duration,
    /// 主机密钥校验策略
    #[serde(default)]
    pub host_key_policy: HostKeyPolicy,
    /// known_hosts 文件，未设置时使用 ~/.ssh/known_hosts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub known_hosts_path: Option<PathBuf>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(30)
}

impl SftpConfig {
    /// 使用密码认证创建配置
    pub fn with_password(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            username: username.into(),
            password: password.into(),
            connect_timeout: default_connect_timeout(),
            host_key_policy: HostKeyPolicy::default(),
            known_hosts_path: None,
        }
    }

    /// 复用数据库凭据（IBM i 上 SSH 与数据库使用同一用户）
    pub fn from_credentials(credentials: &Credentials) -> Self {
        Self::with_password(
            credentials.host.clone(),
            credentials.user.clone(),
            credentials.password.clone(),
        )
    }

    /// 设置端口
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// 设置连接超时
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// 设置主机密钥校验策略
    pub fn host_key_policy(mut self, policy: HostKeyPolicy) -> Self {
        self.host_key_policy = policy;
        self
    }

    /// 设置 known_hosts 文件
    pub fn known_hosts_path(mut self, path: Option<PathBuf>) -> Self {
        self.known_hosts_path = path;
        self
    }

    /// 获取 SSH 地址字符串（host:port 格式）
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Debug for SftpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SftpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"******")
            .field("connect_timeout", &self.connect_timeout)
            .field("host_key_policy", &self.host_key_policy)
            .field("known_hosts_path", &self.known_hosts_path)
            .finish()
    }
}

/// Duration 按秒序列化
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
