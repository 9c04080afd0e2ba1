//! CL 命令构造
//!
//! 只负责拼接命令文本，执行由 [`ilib_db2::SqlExecutor::run_command`] 完成。

use crate::request::{SaveFileRef, SaveLibraryRequest};

/// CL 字符串常量：包上单引号，内部单引号加倍
pub fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

fn push_param(command: &mut String, keyword: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
        command.push_str(&format!(" {}({})", keyword, value));
    }
}

/// `CRTSAVF FILE(LIB/SAVF) TEXT('...') [MAXRCDS] [ASP] [WAITFILE] [SHARE] [AUT]`
pub fn create_save_file(savf: &SaveFileRef, request: &SaveLibraryRequest) -> String {
    let mut command = format!(
        "CRTSAVF FILE({}) TEXT({})",
        savf,
        quote(request.description_or_default())
    );
    push_param(&mut command, "MAXRCDS", request.max_records.as_deref());
    push_param(&mut command, "ASP", request.asp.as_deref());
    push_param(&mut command, "WAITFILE", request.wait_file.as_deref());
    push_param(&mut command, "SHARE", request.share.as_deref());
    push_param(&mut command, "AUT", request.authority.as_deref());
    command
}

/// `SAVLIB LIB(LIB) DEV(dev) SAVF(LIB/SAVF) TGTRLS(ver) [VOL]`
pub fn save_library(library: &str, savf: &SaveFileRef, request: &SaveLibraryRequest) -> String {
    let mut command = format!(
        "SAVLIB LIB({}) DEV({}) SAVF({}) TGTRLS({})",
        library,
        request.device_or_default(),
        savf,
        request.target_release_or_default()
    );
    push_param(&mut command, "VOL", request.volume.as_deref());
    command
}

/// 把保存文件复制为 IFS 流文件
pub fn copy_to_stream_file(savf: &SaveFileRef, stream_file: &str) -> String {
    format!(
        "CPYTOSTMF FROMMBR({}) TOSTMF({}) STMFOPT(*REPLACE)",
        quote(&savf.qsys_path()),
        quote(stream_file)
    )
}

/// shell 双引号字符串，转义 `\`、`"`、`$` 和反引号
pub fn shell_quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for c in text.chars() {
        if matches!(c, '\\' | '"' | '$' | '`') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// 通过 QSH 删除 IFS 流文件
///
/// 路径先按 shell 规则加引号，再整体作为 CL 字符串常量。
pub fn remove_stream_file(stream_file: &str) -> String {
    let shell = format!("rm -f {}", shell_quote(stream_file));
    format!("QSH CMD({})", quote(&shell))
}

/// `DLTF FILE(LIB/SAVF)`
pub fn delete_file(savf: &SaveFileRef) -> String {
    format!("DLTF FILE({})", savf)
}

/// IFS 目录与文件名拼接
pub fn join_ifs_path(dir: &str, file: &str) -> String {
    if dir.ends_with('/') {
        format!("{}{}", dir, file)
    } else {
        format!("{}/{}", dir, file)
    }
}
