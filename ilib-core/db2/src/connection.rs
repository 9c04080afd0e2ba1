use async_trait::async_trait;
use ilib_common::Credentials;
use odbc_api::buffers::TextRowSet;
use odbc_api::{
    Connection, ConnectionOptions, Cursor, DataType, Environment, IntoParameter, ResultSetMetadata,
};
use serde_json::Value;
use std::sync::{Arc, Mutex, OnceLock};
use tracing::{debug, info};

use crate::error::{DbError, Result};
use crate::executor::{SqlExecutor, QCMDEXC_CALL};
use crate::record::CatalogRecord;

/// 每批获取的行数
const FETCH_BATCH_SIZE: usize = 256;

/// 单个文本单元格的最大长度
const MAX_TEXT_LEN: usize = 4096;

/// 进程级 ODBC 环境，只创建一次
static ODBC_ENV: OnceLock<Environment> = OnceLock::new();

fn environment() -> Result<&'static Environment> {
    if let Some(env) = ODBC_ENV.get() {
        return Ok(env);
    }
    let env = Environment::new()
        .map_err(|e| DbError::ConnectionError(format!("Failed to create ODBC environment: {}", e)))?;
    Ok(ODBC_ENV.get_or_init(|| env))
}

type SharedConnection = Arc<Mutex<Option<Connection<'static>>>>;

/// ODBC 连接 - 负责与 IBM i 的 Db2 连接
///
/// 驱动调用是阻塞的，全部放到 `spawn_blocking` 中执行。
/// 值被丢弃时连接随之断开。
pub struct OdbcConnection {
    conn: SharedConnection,
    host: String,
}

impl OdbcConnection {
    /// 建立连接
    ///
    /// # 示例
    /// ```no_run
    /// # use ilib_db2::OdbcConnection;
    /// # use ilib_common::Credentials;
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let creds = Credentials::with_default_driver("MYUSER", "secret", "pub400.com");
    /// let conn = OdbcConnection::connect(&creds).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(credentials: &Credentials) -> Result<Self> {
        let conn_str = connection_string(credentials);
        let host = credentials.host.clone();

        info!("Connecting to Db2 for i at: {}", host);

        let conn = tokio::task::spawn_blocking(move || {
            let env = environment()?;
            env.connect_with_connection_string(&conn_str, ConnectionOptions::default())
                .map_err(|e| DbError::ConnectionError(e.to_string()))
        })
        .await
        .map_err(|e| DbError::TaskError(e.to_string()))??;

        debug!("Db2 connection established: {}", host);

        Ok(Self {
            conn: Arc::new(Mutex::new(Some(conn))),
            host,
        })
    }

    /// 在阻塞线程中使用连接
    async fn with_connection<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection<'static>) -> Result<T> + Send + 'static,
    {
        let shared = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = shared
                .lock()
                .map_err(|_| DbError::TaskError("connection mutex poisoned".to_string()))?;
            let conn = guard.as_ref().ok_or(DbError::Closed)?;
            f(conn)
        })
        .await
        .map_err(|e| DbError::TaskError(e.to_string()))?
    }
}

#[async_trait]
impl SqlExecutor for OdbcConnection {
    async fn query(&self, sql: &str, params: &[String]) -> Result<Vec<CatalogRecord>> {
        debug!("执行查询: {}", sql);
        let sql = sql.to_string();
        let params = params.to_vec();
        self.with_connection(move |conn| fetch_records(conn, &sql, &params))
            .await
    }

    async fn run_command(&self, command: &str) -> Result<()> {
        debug!("执行命令: {}", command);
        let command = command.to_string();
        self.with_connection(move |conn| {
            conn.execute(QCMDEXC_CALL, &command.as_str().into_parameter())
                .map(|_| ())
                .map_err(|e| DbError::CommandError {
                    command: command.clone(),
                    message: e.to_string(),
                })
        })
        .await
    }

    async fn close(&self) -> Result<()> {
        let shared = Arc::clone(&self.conn);
        let closed = tokio::task::spawn_blocking(move || {
            let mut guard = shared
                .lock()
                .map_err(|_| DbError::TaskError("connection mutex poisoned".to_string()))?;
            Ok::<_, DbError>(guard.take())
        })
        .await
        .map_err(|e| DbError::TaskError(e.to_string()))??;

        match closed {
            Some(conn) => {
                // Drop 时驱动执行断开
                tokio::task::spawn_blocking(move || drop(conn))
                    .await
                    .map_err(|e| DbError::TaskError(e.to_string()))?;
                info!("Db2 connection closed: {}", self.host);
            }
            None => debug!("Db2 connection to {} already closed", self.host),
        }
        Ok(())
    }
}

/// 构造 ODBC 连接串
pub fn connection_string(credentials: &Credentials) -> String {
    format!(
        "DRIVER={};SYSTEM={};UID={};PWD={};",
        escape_attribute(&credentials.driver),
        escape_attribute(&credentials.host),
        escape_attribute(&credentials.user),
        escape_attribute(&credentials.password),
    )
}

/// 含有分隔符的属性值需要用花括号包裹
fn escape_attribute(value: &str) -> String {
    let already_braced = value.starts_with('{') && value.ends_with('}');
    if already_braced || !value.contains([';', '{', '}']) {
        value.to_string()
    } else {
        format!("{{{}}}", value.replace('}', "}}"))
    }
}

fn query_error(e: odbc_api::Error) -> DbError {
    DbError::QueryError(e.to_string())
}

fn fetch_records(
    conn: &Connection<'_>,
    sql: &str,
    params: &[String],
) -> Result<Vec<CatalogRecord>> {
    let bound: Vec<_> = params.iter().map(|p| p.as_str().into_parameter()).collect();

    let Some(mut cursor) = conn.execute(sql, bound.as_slice()).map_err(query_error)? else {
        return Ok(Vec::new());
    };

    let names: Vec<String> = cursor
        .column_names()
        .map_err(query_error)?
        .collect::<std::result::Result<_, _>>()
        .map_err(query_error)?;

    let mut integer_columns = Vec::with_capacity(names.len());
    for index in 1..=names.len() {
        let data_type = cursor.col_data_type(index as u16).map_err(query_error)?;
        integer_columns.push(is_integer_type(&data_type));
    }

    let mut buffers =
        TextRowSet::for_cursor(FETCH_BATCH_SIZE, &mut cursor, Some(MAX_TEXT_LEN)).map_err(query_error)?;
    let mut row_set = cursor.bind_buffer(&mut buffers).map_err(query_error)?;

    let mut records = Vec::new();
    while let Some(batch) = row_set.fetch().map_err(query_error)? {
        for row in 0..batch.num_rows() {
            let record: CatalogRecord = names
                .iter()
                .enumerate()
                .map(|(col, name)| (name.clone(), decode_cell(batch.at(col, row), integer_columns[col])))
                .collect();
            records.push(record);
        }
    }

    debug!("查询返回 {} 行", records.len());
    Ok(records)
}

fn is_integer_type(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::TinyInt | DataType::SmallInt | DataType::Integer | DataType::BigInt
    )
}

/// 把驱动返回的文本单元格转换成 JSON 值
///
/// CHAR 列带有尾部空格，这里去掉。
pub(crate) fn decode_cell(bytes: Option<&[u8]>, integer: bool) -> Value {
    let Some(bytes) = bytes else {
        return Value::Null;
    };
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim_end();

    if integer {
        if let Ok(n) = text.trim().parse::<i64>() {
            return Value::from(n);
        }
    }
    Value::String(text.to_string())
}
