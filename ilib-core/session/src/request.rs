//! 保存库请求与结果

use ilib_common::{ObjectName, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// 保存文件默认描述
pub const DEFAULT_DESCRIPTION: &str = "A SaveFile from iLibrary";

/// 默认目标版本
pub const DEFAULT_TARGET_RELEASE: &str = "*CURRENT";

/// 默认保存设备
pub const DEFAULT_DEVICE: &str = "*SAVF";

/// 保存文件引用：`LIB/NAME`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveFileRef {
    pub library: ObjectName,
    pub name: ObjectName,
}

impl SaveFileRef {
    pub fn new(library: ObjectName, name: ObjectName) -> Self {
        Self { library, name }
    }

    /// 校验库名和保存文件名后构造
    pub fn parse(library: &str, name: &str) -> Result<Self, ValidationError> {
        Ok(Self::new(ObjectName::library(library)?, ObjectName::save_file(name)?))
    }

    /// QSYS 文件系统路径：`/QSYS.LIB/LIB.LIB/NAME.FILE`
    pub fn qsys_path(&self) -> String {
        format!("/QSYS.LIB/{}.LIB/{}.FILE", self.library, self.name)
    }

    /// 下载后的流文件名：`NAME.savf`
    pub fn stream_file_name(&self) -> String {
        format!("{}.savf", self.name)
    }
}

impl fmt::Display for SaveFileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.library, self.name)
    }
}

/// 下载选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadOptions {
    /// 本地目录
    pub local_dir: PathBuf,
    /// IFS 上的临时目录
    pub remote_dir: String,
    /// SSH 端口（覆盖默认值）
    pub port: Option<u16>,
    /// 下载成功后删除保存文件
    pub remove_save_file: bool,
}

impl DownloadOptions {
    pub fn new(local_dir: impl Into<PathBuf>, remote_dir: impl Into<String>) -> Self {
        Self {
            local_dir: local_dir.into(),
            remote_dir: remote_dir.into(),
            port: None,
            remove_save_file: true,
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn keep_save_file(mut self) -> Self {
        self.remove_save_file = false;
        self
    }

    /// IFS 目录，去掉末尾的 `/`
    pub fn remote_dir(&self) -> Result<&str, ValidationError> {
        let dir = self.remote_dir.trim_end_matches('/');
        if self.remote_dir.trim().is_empty() {
            return Err(ValidationError::MissingField("remote_path"));
        }
        Ok(if dir.is_empty() { "/" } else { dir })
    }

    /// 本地目录不能为空
    pub fn local_dir(&self) -> Result<&PathBuf, ValidationError> {
        if self.local_dir.as_os_str().is_empty() {
            return Err(ValidationError::MissingField("local_path"));
        }
        Ok(&self.local_dir)
    }
}

/// 保存库请求
///
/// 名称在 [`crate::Session::save_library`] 中校验，其余参数原样传给 CL 命令。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveLibraryRequest {
    pub library: String,
    pub save_file: String,
    pub target_library: Option<String>,
    pub description: Option<String>,
    pub target_release: Option<String>,
    pub device: Option<String>,
    pub volume: Option<String>,
    pub max_records: Option<String>,
    pub asp: Option<String>,
    pub wait_file: Option<String>,
    pub share: Option<String>,
    pub authority: Option<String>,
    pub download: Option<DownloadOptions>,
}

impl SaveLibraryRequest {
    pub fn new(library: impl Into<String>, save_file: impl Into<String>) -> Self {
        Self {
            library: library.into(),
            save_file: save_file.into(),
            ..Default::default()
        }
    }

    /// 保存文件所在库（默认与被保存的库相同）
    pub fn target_library(mut self, library: impl Into<String>) -> Self {
        self.target_library = Some(library.into());
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub fn target_release(mut self, release: impl Into<String>) -> Self {
        self.target_release = Some(release.into());
        self
    }

    pub fn device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }

    pub fn volume(mut self, volume: impl Into<String>) -> Self {
        self.volume = Some(volume.into());
        self
    }

    pub fn max_records(mut self, value: impl Into<String>) -> Self {
        self.max_records = Some(value.into());
        self
    }

    pub fn asp(mut self, value: impl Into<String>) -> Self {
        self.asp = Some(value.into());
        self
    }

    pub fn wait_file(mut self, value: impl Into<String>) -> Self {
        self.wait_file = Some(value.into());
        self
    }

    pub fn share(mut self, value: impl Into<String>) -> Self {
        self.share = Some(value.into());
        self
    }

    pub fn authority(mut self, value: impl Into<String>) -> Self {
        self.authority = Some(value.into());
        self
    }

    pub fn download(mut self, options: DownloadOptions) -> Self {
        self.download = Some(options);
        self
    }

    /// 被保存的库
    pub fn library_name(&self) -> Result<ObjectName, ValidationError> {
        ObjectName::library(&self.library)
    }

    /// 保存文件引用，目标库缺省时使用被保存的库
    pub fn save_file_ref(&self) -> Result<SaveFileRef, ValidationError> {
        let library = match self.target_library.as_deref() {
            Some(lib) if !lib.trim().is_empty() => lib,
            _ => self.library.as_str(),
        };
        SaveFileRef::parse(library, &self.save_file)
    }

    pub fn description_or_default(&self) -> &str {
        non_empty(&self.description).unwrap_or(DEFAULT_DESCRIPTION)
    }

    pub fn target_release_or_default(&self) -> &str {
        non_empty(&self.target_release).unwrap_or(DEFAULT_TARGET_RELEASE)
    }

    pub fn device_or_default(&self) -> &str {
        non_empty(&self.device).unwrap_or(DEFAULT_DEVICE)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// 保存库的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveOutcome {
    pub save_file: SaveFileRef,
    /// 下载后的本地路径
    pub local_path: Option<PathBuf>,
    /// 下载的字节数
    pub bytes_downloaded: Option<u64>,
    /// 保存文件是否已删除
    pub save_file_removed: bool,
}

impl SaveOutcome {
    pub fn downloaded(&self) -> bool {
        self.local_path.is_some()
    }
}
