//! 会话行为测试（使用内存中的执行器和传输实现）

use async_trait::async_trait;
use ilib_common::Credentials;
use ilib_db2::{CatalogRecord, DbError, SqlExecutor};
use ilib_session::{DownloadOptions, SaveLibraryRequest, Session, SessionError};
use ilib_sftp::{FileTransfer, SftpConfig, SftpError, TransferConnector};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Journal {
    queries: Vec<(String, Vec<String>)>,
    commands: Vec<String>,
    executor_closed: bool,
    executor_dropped: bool,
    connects: Vec<u16>,
    downloads: Vec<(String, String)>,
    transfer_disconnected: bool,
}

type SharedJournal = Arc<Mutex<Journal>>;

struct FakeExecutor {
    journal: SharedJournal,
    failing_commands: Vec<&'static str>,
}

impl FakeExecutor {
    fn new(journal: &SharedJournal) -> Self {
        Self {
            journal: Arc::clone(journal),
            failing_commands: Vec::new(),
        }
    }

    fn failing(mut self, prefix: &'static str) -> Self {
        self.failing_commands.push(prefix);
        self
    }
}

fn record(pairs: &[(&str, Value)]) -> CatalogRecord {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[async_trait]
impl SqlExecutor for FakeExecutor {
    async fn query(&self, sql: &str, params: &[String]) -> ilib_db2::Result<Vec<CatalogRecord>> {
        self.journal
            .lock()
            .unwrap()
            .queries
            .push((sql.to_string(), params.to_vec()));

        let library = params.first().map(String::as_str);
        let rows = if sql.contains("LIBRARY_INFO") && library == Some("QGPL") {
            vec![record(&[
                ("OBJECT_COUNT", json!(312)),
                ("LIBRARY_SIZE", json!(104_857_600)),
                ("TEXT_DESCRIPTION", json!("General Purpose Library")),
                ("CREATION_DATE", json!("2019-03-01 10:15:00.000000")),
            ])]
        } else if sql.contains("SYSMEMBERSTAT") && library == Some("MYLIB") {
            vec![record(&[
                ("SYSTEM_TABLE_NAME", json!("QRPGLESRC")),
                ("SYSTEM_TABLE_MEMBER", json!("HELLO")),
                ("SOURCE_TYPE", json!("RPGLE")),
            ])]
        } else if sql.contains("OBJECT_STATISTICS") && library == Some("MYLIB") {
            let mut rows = vec![record(&[
                ("OBJNAME", json!("QRPGLESRC")),
                ("OBJTYPE", json!("*FILE")),
                ("OBJATTRIBUTE", json!("PF-SRC")),
            ])];
            if !sql.contains("PF-SRC") {
                rows.push(record(&[
                    ("OBJNAME", json!("HELLO")),
                    ("OBJTYPE", json!("*PGM")),
                    ("OBJATTRIBUTE", json!("RPGLE")),
                ]));
            }
            rows
        } else {
            Vec::new()
        };
        Ok(rows)
    }

    async fn run_command(&self, command: &str) -> ilib_db2::Result<()> {
        self.journal
            .lock()
            .unwrap()
            .commands
            .push(command.to_string());

        if self.failing_commands.iter().any(|p| command.starts_with(p)) {
            return Err(DbError::CommandError {
                command: command.to_string(),
                message: "CPF2105: Object not found".to_string(),
            });
        }
        Ok(())
    }

    async fn close(&self) -> ilib_db2::Result<()> {
        self.journal.lock().unwrap().executor_closed = true;
        Ok(())
    }
}

impl Drop for FakeExecutor {
    fn drop(&mut self) {
        self.journal.lock().unwrap().executor_dropped = true;
    }
}

#[derive(Clone, Copy, PartialEq)]
enum TransferMode {
    Ok,
    ConnectFails,
    DownloadFails,
}

struct FakeConnector {
    journal: SharedJournal,
    content: Vec<u8>,
    mode: TransferMode,
}

impl FakeConnector {
    fn new(journal: &SharedJournal, mode: TransferMode) -> Self {
        Self {
            journal: Arc::clone(journal),
            content: b"SAVF-CONTENT-0123456789".repeat(64),
            mode,
        }
    }
}

#[async_trait]
impl TransferConnector for FakeConnector {
    async fn connect(&self, config: &SftpConfig) -> ilib_sftp::Result<Box<dyn FileTransfer>> {
        self.journal.lock().unwrap().connects.push(config.port);
        if self.mode == TransferMode::ConnectFails {
            return Err(SftpError::ConnectionError("connection refused".to_string()));
        }
        Ok(Box::new(FakeTransfer {
            journal: Arc::clone(&self.journal),
            content: self.content.clone(),
            mode: self.mode,
        }))
    }
}

struct FakeTransfer {
    journal: SharedJournal,
    content: Vec<u8>,
    mode: TransferMode,
}

#[async_trait]
impl FileTransfer for FakeTransfer {
    async fn remote_size(&mut self, _remote: &str) -> ilib_sftp::Result<u64> {
        Ok(self.content.len() as u64)
    }

    async fn download(&mut self, remote: &str, local: &Path) -> ilib_sftp::Result<u64> {
        self.journal
            .lock()
            .unwrap()
            .downloads
            .push((remote.to_string(), local.display().to_string()));
        if self.mode == TransferMode::DownloadFails {
            return Err(SftpError::SizeMismatch {
                expected: self.content.len() as u64,
                actual: 0,
            });
        }
        tokio::fs::write(local, &self.content).await?;
        Ok(self.content.len() as u64)
    }

    async fn disconnect(&mut self) -> ilib_sftp::Result<()> {
        self.journal.lock().unwrap().transfer_disconnected = true;
        Ok(())
    }
}

fn credentials() -> Credentials {
    Credentials::with_default_driver("MYUSER", "secret", "pub400.com")
}

fn session_with(executor: FakeExecutor, connector: FakeConnector) -> Session {
    Session::from_parts(credentials(), Box::new(executor), Arc::new(connector))
}

fn fake_session(journal: &SharedJournal) -> Session {
    session_with(
        FakeExecutor::new(journal),
        FakeConnector::new(journal, TransferMode::Ok),
    )
}

fn is_validation(result: &Result<impl std::fmt::Debug, SessionError>) -> bool {
    matches!(result, Err(SessionError::Validation(_)))
}

#[tokio::test]
async fn test_long_library_name_rejected_before_any_call() {
    let journal = SharedJournal::default();
    let mut session = fake_session(&journal);
    let long = "ABCDEFGHIJK";

    assert!(is_validation(&session.library_info(long).await));
    assert!(is_validation(&session.library_info_json(long).await));
    assert!(is_validation(&session.file_info(long, false).await));
    assert!(is_validation(&session.file_info_json(long, true).await));
    assert!(is_validation(&session.source_members(long).await));
    assert!(is_validation(&session.source_members_json(long).await));
    assert!(is_validation(&session.remove_file(long, "MYSAVF").await));
    assert!(is_validation(
        &session
            .save_library(&SaveLibraryRequest::new(long, "MYSAVF"))
            .await
    ));
    assert!(is_validation(
        &session
            .save_library(&SaveLibraryRequest::new("MYLIB", "MYLIBSAVE").target_library(long))
            .await
    ));
    assert!(is_validation(
        &session
            .save_library(&SaveLibraryRequest::new("MYLIB", "SAVEFILE123"))
            .await
    ));

    let journal = journal.lock().unwrap();
    assert!(journal.queries.is_empty());
    assert!(journal.commands.is_empty());
    assert!(journal.connects.is_empty());
}

#[tokio::test]
async fn test_missing_download_paths_rejected_before_any_call() {
    let journal = SharedJournal::default();
    let mut session = fake_session(&journal);

    let request = SaveLibraryRequest::new("MYLIB", "MYLIBSAVE")
        .download(DownloadOptions::new("./backups", ""));
    assert!(is_validation(&session.save_library(&request).await));
    assert!(journal.lock().unwrap().commands.is_empty());
}

#[tokio::test]
async fn test_library_info_json_for_qgpl() {
    let journal = SharedJournal::default();
    let session = fake_session(&journal);

    let text = session.library_info_json("qgpl").await.unwrap();
    let value: Value = serde_json::from_str(&text).unwrap();
    assert!(value.get("CREATION_DATE").is_some());
    assert_eq!(value["TEXT_DESCRIPTION"], "General Purpose Library");
    assert_eq!(value["OBJECT_COUNT"], 312);

    let journal = journal.lock().unwrap();
    let (_, params) = &journal.queries[0];
    assert!(params.iter().all(|p| p == "QGPL"));
}

#[tokio::test]
async fn test_library_info_not_found() {
    let journal = SharedJournal::default();
    let session = fake_session(&journal);

    assert!(session.library_info("NOSUCHLIB").await.unwrap().is_none());

    let text = session.library_info_json("NOSUCHLIB").await.unwrap();
    let value: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["error"], "No data found for library: NOSUCHLIB");
}

#[tokio::test]
async fn test_file_info() {
    let journal = SharedJournal::default();
    let session = fake_session(&journal);

    let all = session.file_info("MYLIB", false).await.unwrap();
    assert_eq!(all.len(), 2);

    let sources = session.file_info("MYLIB", true).await.unwrap();
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].get_str("OBJATTRIBUTE"), Some("PF-SRC"));

    let empty = session.file_info_json("EMPTYLIB", false).await.unwrap();
    assert_eq!(empty, "[]");
}

#[tokio::test]
async fn test_source_members() {
    let journal = SharedJournal::default();
    let session = fake_session(&journal);

    let text = session.source_members_json("MYLIB").await.unwrap();
    let value: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value[0]["SYSTEM_TABLE_MEMBER"], "HELLO");
}

#[tokio::test]
async fn test_save_without_download_never_connects() {
    let journal = SharedJournal::default();
    let mut session = fake_session(&journal);

    let outcome = session
        .save_library(&SaveLibraryRequest::new("MYLIB", "MYLIBSAVE"))
        .await
        .unwrap();

    assert!(!outcome.downloaded());
    assert!(!outcome.save_file_removed);
    assert_eq!(outcome.save_file.to_string(), "MYLIB/MYLIBSAVE");

    let journal = journal.lock().unwrap();
    assert!(journal.connects.is_empty());
    assert_eq!(
        journal.commands,
        vec![
            "CRTSAVF FILE(MYLIB/MYLIBSAVE) TEXT('A SaveFile from iLibrary')".to_string(),
            "SAVLIB LIB(MYLIB) DEV(*SAVF) SAVF(MYLIB/MYLIBSAVE) TGTRLS(*CURRENT)".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_save_with_download_writes_local_file() {
    let dir = tempfile::tempdir().unwrap();
    let local_dir = dir.path().join("backups");
    let journal = SharedJournal::default();
    let mut session = fake_session(&journal);

    let request = SaveLibraryRequest::new("MYLIB", "MYLIBSAVE")
        .download(DownloadOptions::new(&local_dir, "/home/MYUSER/"));
    let outcome = session.save_library(&request).await.unwrap();

    let local_path = local_dir.join("MYLIBSAVE.savf");
    assert_eq!(outcome.local_path.as_deref(), Some(local_path.as_path()));
    let size = std::fs::metadata(&local_path).unwrap().len();
    assert_eq!(outcome.bytes_downloaded, Some(size));
    assert!(outcome.save_file_removed);

    let journal = journal.lock().unwrap();
    assert_eq!(journal.connects, vec![22]);
    assert_eq!(journal.downloads[0].0, "/home/MYUSER/MYLIBSAVE.savf");
    assert_eq!(
        journal.commands[2..],
        [
            "CPYTOSTMF FROMMBR('/QSYS.LIB/MYLIB.LIB/MYLIBSAVE.FILE') \
             TOSTMF('/home/MYUSER/MYLIBSAVE.savf') STMFOPT(*REPLACE)"
                .to_string(),
            "QSH CMD('rm -f \"/home/MYUSER/MYLIBSAVE.savf\"')".to_string(),
            "DLTF FILE(MYLIB/MYLIBSAVE)".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_remote_directory_with_space_is_cleaned_up_as_one_path() {
    let dir = tempfile::tempdir().unwrap();
    let journal = SharedJournal::default();
    let mut session = fake_session(&journal);

    let request = SaveLibraryRequest::new("MYLIB", "MYLIBSAVE")
        .download(DownloadOptions::new(dir.path(), "/home/MY USER"));
    session.save_library(&request).await.unwrap();

    let journal = journal.lock().unwrap();
    assert_eq!(journal.downloads[0].0, "/home/MY USER/MYLIBSAVE.savf");
    assert_eq!(
        journal.commands[3],
        "QSH CMD('rm -f \"/home/MY USER/MYLIBSAVE.savf\"')"
    );
}

#[tokio::test]
async fn test_keep_save_file_after_download() {
    let dir = tempfile::tempdir().unwrap();
    let journal = SharedJournal::default();
    let mut session = fake_session(&journal);

    let request = SaveLibraryRequest::new("MYLIB", "MYLIBSAVE")
        .download(DownloadOptions::new(dir.path(), "/tmp").keep_save_file());
    let outcome = session.save_library(&request).await.unwrap();

    assert!(!outcome.save_file_removed);
    let journal = journal.lock().unwrap();
    assert!(!journal.commands.iter().any(|c| c.starts_with("DLTF")));
}

#[tokio::test]
async fn test_ifs_cleanup_failure_is_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let journal = SharedJournal::default();
    let mut session = session_with(
        FakeExecutor::new(&journal).failing("QSH"),
        FakeConnector::new(&journal, TransferMode::Ok),
    );

    let request = SaveLibraryRequest::new("MYLIB", "MYLIBSAVE")
        .download(DownloadOptions::new(dir.path(), "/tmp"));
    let outcome = session.save_library(&request).await.unwrap();
    assert!(outcome.save_file_removed);
}

#[tokio::test]
async fn test_connect_failure_keeps_save_file() {
    let dir = tempfile::tempdir().unwrap();
    let journal = SharedJournal::default();
    let mut session = session_with(
        FakeExecutor::new(&journal),
        FakeConnector::new(&journal, TransferMode::ConnectFails),
    );

    let request = SaveLibraryRequest::new("MYLIB", "MYLIBSAVE")
        .download(DownloadOptions::new(dir.path(), "/tmp"));
    let result = session.save_library(&request).await;

    assert!(matches!(result, Err(SessionError::Transfer(_))));
    let journal = journal.lock().unwrap();
    assert!(!journal.commands.iter().any(|c| c.starts_with("DLTF")));
    assert!(!journal.commands.iter().any(|c| c.starts_with("QSH")));
}

#[tokio::test]
async fn test_download_failure_keeps_save_file() {
    let dir = tempfile::tempdir().unwrap();
    let journal = SharedJournal::default();
    let mut session = session_with(
        FakeExecutor::new(&journal),
        FakeConnector::new(&journal, TransferMode::DownloadFails),
    );

    let request = SaveLibraryRequest::new("MYLIB", "MYLIBSAVE")
        .download(DownloadOptions::new(dir.path(), "/tmp"));
    let result = session.save_library(&request).await;

    assert!(matches!(
        result,
        Err(SessionError::Transfer(SftpError::SizeMismatch { .. }))
    ));
    assert!(!journal
        .lock()
        .unwrap()
        .commands
        .iter()
        .any(|c| c.starts_with("DLTF")));
}

#[tokio::test]
async fn test_save_stops_after_failed_command() {
    let journal = SharedJournal::default();
    let mut session = session_with(
        FakeExecutor::new(&journal).failing("CRTSAVF"),
        FakeConnector::new(&journal, TransferMode::Ok),
    );

    let result = session
        .save_library(&SaveLibraryRequest::new("MYLIB", "MYLIBSAVE"))
        .await;

    assert!(matches!(result, Err(SessionError::RemoteCommand { .. })));
    assert_eq!(journal.lock().unwrap().commands.len(), 1);
}

#[tokio::test]
async fn test_port_override_reconnects() {
    let dir = tempfile::tempdir().unwrap();
    let journal = SharedJournal::default();
    let mut session = fake_session(&journal);

    let first = SaveLibraryRequest::new("MYLIB", "SAVE1")
        .download(DownloadOptions::new(dir.path(), "/tmp"));
    let second = SaveLibraryRequest::new("MYLIB", "SAVE2")
        .download(DownloadOptions::new(dir.path(), "/tmp"));
    let third = SaveLibraryRequest::new("MYLIB", "SAVE3")
        .download(DownloadOptions::new(dir.path(), "/tmp").port(2222));

    session.save_library(&first).await.unwrap();
    session.save_library(&second).await.unwrap();
    session.save_library(&third).await.unwrap();

    let journal = journal.lock().unwrap();
    assert_eq!(journal.connects, vec![22, 2222]);
    assert!(journal.transfer_disconnected);
}

#[tokio::test]
async fn test_configured_sftp_port_is_used() {
    let dir = tempfile::tempdir().unwrap();
    let journal = SharedJournal::default();
    let mut session = fake_session(&journal).configure_sftp(|c| c.port(2022));

    let request = SaveLibraryRequest::new("MYLIB", "MYLIBSAVE")
        .download(DownloadOptions::new(dir.path(), "/tmp"));
    session.save_library(&request).await.unwrap();

    assert_eq!(journal.lock().unwrap().connects, vec![2022]);
}

#[tokio::test]
async fn test_remove_missing_file() {
    let journal = SharedJournal::default();
    let mut session = session_with(
        FakeExecutor::new(&journal).failing("DLTF"),
        FakeConnector::new(&journal, TransferMode::Ok),
    );

    match session.remove_file("MYLIB", "nope").await {
        Err(SessionError::RemoteCommand { command, message }) => {
            assert_eq!(command, "DLTF FILE(MYLIB/NOPE)");
            assert!(message.contains("CPF2105"));
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_run_closes_on_success() {
    let journal = SharedJournal::default();
    let session = fake_session(&journal);

    let info = session
        .run(|s| Box::pin(async move { s.library_info("QGPL").await }))
        .await
        .unwrap();

    assert!(info.is_some());
    let journal = journal.lock().unwrap();
    assert!(journal.executor_closed);
    assert!(journal.executor_dropped);
}

#[tokio::test]
async fn test_run_closes_on_error() {
    let dir = tempfile::tempdir().unwrap();
    let local_dir = dir.path().to_path_buf();
    let journal = SharedJournal::default();
    let session = session_with(
        FakeExecutor::new(&journal).failing("DLTF"),
        FakeConnector::new(&journal, TransferMode::Ok),
    );

    let result = session
        .run(|s| {
            Box::pin(async move {
                let request = SaveLibraryRequest::new("MYLIB", "MYLIBSAVE")
                    .download(DownloadOptions::new(local_dir, "/tmp"));
                s.save_library(&request).await
            })
        })
        .await;

    assert!(matches!(result, Err(SessionError::RemoteCommand { .. })));
    let journal = journal.lock().unwrap();
    assert!(journal.executor_closed);
    assert!(journal.transfer_disconnected);
}

#[tokio::test]
async fn test_drop_releases_executor() {
    let journal = SharedJournal::default();
    {
        let session = fake_session(&journal);
        let _ = session.library_info("QGPL").await;
    }
    assert!(journal.lock().unwrap().executor_dropped);
}

#[tokio::test]
async fn test_explicit_close() {
    let journal = SharedJournal::default();
    let session = fake_session(&journal);
    session.close().await.unwrap();

    let journal = journal.lock().unwrap();
    assert!(journal.executor_closed);
    assert!(!journal.transfer_disconnected);
}
