//! CLI 配置管理
//!
//! **数据存储方式**: TOML 文件 (~/.config/ilib/config.toml)
//!
//! 优先级: 环境变量 > 配置文件 > 默认值。启动时先加载当前目录下的 `.env`。

use anyhow::{Context, Result};
use ilib_common::Credentials;
use ilib_sftp::HostKeyPolicy;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// CLI 配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// 数据库连接
    #[serde(default)]
    pub database: DatabaseConfig,

    /// SFTP 下载
    #[serde(default)]
    pub sftp: SftpSettings,
}

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// ODBC 驱动名称
    #[serde(default = "default_driver")]
    pub driver: String,

    /// 系统名 / 主机地址
    pub system: Option<String>,

    /// 用户 ID
    pub user: Option<String>,

    /// 密码
    pub password: Option<String>,
}

fn default_driver() -> String {
    "{IBM i Access ODBC Driver}".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: default_driver(),
            system: None,
            user: None,
            password: None,
        }
    }
}

/// SFTP 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SftpSettings {
    /// SSH 端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 连接超时（秒）
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// 主机密钥策略: "accept_any" 或 "known_hosts"
    #[serde(default)]
    pub host_key_policy: HostKeyPolicy,

    /// known_hosts 文件（默认 ~/.ssh/known_hosts）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub known_hosts_path: Option<PathBuf>,
}

fn default_port() -> u16 {
    22
}

fn default_connect_timeout() -> u64 {
    30
}

impl Default for SftpSettings {
    fn default() -> Self {
        Self {
            port: default_port(),
            connect_timeout: default_connect_timeout(),
            host_key_policy: HostKeyPolicy::default(),
            known_hosts_path: None,
        }
    }
}

impl SftpSettings {
    /// 展开 `~` 后的 known_hosts 路径
    pub fn known_hosts_path(&self) -> Option<PathBuf> {
        self.known_hosts_path
            .as_ref()
            .map(|path| PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned()))
    }
}

impl CliConfig {
    /// 获取配置文件路径
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("无法获取用户主目录")?;
        Ok(home.join(".config").join("ilib").join("config.toml"))
    }

    /// 加载配置
    ///
    /// 指定路径时文件必须存在；使用默认路径时文件不存在则使用默认值。
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => {
                let path = Self::config_path()?;
                if path.exists() {
                    Self::load_from_file(&path)?
                } else {
                    tracing::debug!("No config file found, using defaults");
                    Self::default()
                }
            }
        };

        config.apply_env_vars()?;
        Ok(config)
    }

    /// 从指定文件加载配置
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
        let content = fs::read_to_string(&expanded)
            .with_context(|| format!("读取配置文件失败: {}", expanded))?;

        tracing::debug!("Loading config from: {}", expanded);
        toml::from_str(&content).with_context(|| format!("解析配置文件失败: {}", expanded))
    }

    /// 从环境变量覆盖配置
    fn apply_env_vars(&mut self) -> Result<()> {
        self.apply_env_from(|key| env::var(key).ok())
    }

    fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(driver) = lookup("DB_DRIVER") {
            self.database.driver = driver;
        }
        if let Some(system) = lookup("DB_SYSTEM") {
            self.database.system = Some(system);
        }
        if let Some(user) = lookup("DB_USER") {
            self.database.user = Some(user);
        }
        if let Some(password) = lookup("DB_PASSWORD") {
            self.database.password = Some(password);
        }
        if let Some(port) = lookup("ILIB_SFTP_PORT") {
            self.sftp.port = port.parse().context("Invalid ILIB_SFTP_PORT value")?;
        }
        Ok(())
    }

    /// 生成连接凭据，缺少必填项时报错
    pub fn credentials(&self) -> Result<Credentials> {
        let system = required(&self.database.system, "系统名", "DB_SYSTEM", "system")?;
        let user = required(&self.database.user, "用户", "DB_USER", "user")?;
        let password = required(&self.database.password, "密码", "DB_PASSWORD", "password")?;
        Ok(Credentials::new(user, password, system, self.database.driver.clone()))
    }

    /// 脱敏后的 TOML 文本
    pub fn to_masked_toml(&self) -> Result<String> {
        let mut masked = self.clone();
        if masked.database.password.is_some() {
            masked.database.password = Some("******".to_string());
        }
        toml::to_string_pretty(&masked).context("序列化配置失败")
    }
}

fn required<'a>(value: &'a Option<String>, label: &str, env_key: &str, field: &str) -> Result<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .with_context(|| format!("缺少数据库{}: 设置 {} 或 [database].{}", label, env_key, field))
}
