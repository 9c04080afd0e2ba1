//! IBM i 对象名校验

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// 系统对象名最大长度
pub const MAX_OBJECT_NAME_LEN: usize = 10;

/// 参数校验错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// 名称为空
    #[error("A {0} name is required.")]
    EmptyName(&'static str),

    /// 名称过长
    #[error("The {kind} name '{name}' is too long. Maximum length is {max}.")]
    NameTooLong {
        kind: &'static str,
        name: String,
        max: usize,
    },

    /// 名称包含非法字符
    #[error("The {kind} name '{name}' contains invalid characters.")]
    InvalidCharacters { kind: &'static str, name: String },

    /// 缺少必填参数
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

/// 已校验的系统对象名（大写存储）
///
/// 规则：非空、不超过 10 个字符、仅 `A-Z 0-9 $ # @ _ .`，首字符不能是数字。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectName(String);

impl ObjectName {
    /// 校验库名
    pub fn library(name: &str) -> Result<Self, ValidationError> {
        Self::parse("library", name)
    }

    /// 校验保存文件名
    pub fn save_file(name: &str) -> Result<Self, ValidationError> {
        Self::parse("save file", name)
    }

    /// 按指定对象种类校验名称，`kind` 只用于错误信息
    pub fn parse(kind: &'static str, name: &str) -> Result<Self, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName(kind));
        }
        if name.chars().count() > MAX_OBJECT_NAME_LEN {
            return Err(ValidationError::NameTooLong {
                kind,
                name: name.to_string(),
                max: MAX_OBJECT_NAME_LEN,
            });
        }

        let valid_char = |c: char| c.is_ascii_alphanumeric() || matches!(c, '$' | '#' | '@' | '_' | '.');
        let starts_with_digit = name.chars().next().is_some_and(|c| c.is_ascii_digit());
        if starts_with_digit || !name.chars().all(valid_char) {
            return Err(ValidationError::InvalidCharacters {
                kind,
                name: name.to_string(),
            });
        }

        Ok(Self(name.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ObjectName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ObjectName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse("object", &value)
    }
}

impl From<ObjectName> for String {
    fn from(name: ObjectName) -> Self {
        name.0
    }
}
