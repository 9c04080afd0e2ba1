//! 系统目录查询
//!
//! 所有查询都是只读的，库名通过参数绑定传入。

use ilib_common::ObjectName;
use tracing::debug;

use crate::error::Result;
use crate::executor::SqlExecutor;
use crate::record::{CatalogRecord, LibraryInfo};

/// 库信息，附带库对象 (*LIB) 的创建时间
pub const LIBRARY_INFO_SQL: &str = "\
SELECT L.*, O.OBJCREATED AS CREATION_DATE \
FROM TABLE(QSYS2.LIBRARY_INFO(LIBRARY_NAME => ?)) L \
LEFT JOIN TABLE(QSYS2.OBJECT_STATISTICS('QSYS', '*LIB', OBJECT_NAME => ?)) O ON 1 = 1";

/// 库中所有对象
pub const OBJECT_LIST_SQL: &str = "\
SELECT * FROM TABLE(QSYS2.OBJECT_STATISTICS(?, '*ALL')) X \
ORDER BY OBJNAME";

/// 库中的源物理文件
pub const SOURCE_FILE_LIST_SQL: &str = "\
SELECT * FROM TABLE(QSYS2.OBJECT_STATISTICS(?, '*FILE')) X \
WHERE OBJATTRIBUTE = 'PF-SRC' \
ORDER BY OBJNAME";

/// 库中源文件的成员
pub const SOURCE_MEMBER_LIST_SQL: &str = "\
SELECT * FROM QSYS2.SYSMEMBERSTAT \
WHERE SYSTEM_TABLE_SCHEMA = ? AND SOURCE_TYPE IS NOT NULL \
ORDER BY SYSTEM_TABLE_NAME, SYSTEM_TABLE_MEMBER";

/// 查询库信息，未找到时返回 `None`
pub async fn library_info(
    executor: &dyn SqlExecutor,
    library: &ObjectName,
) -> Result<Option<LibraryInfo>> {
    let params = [library.to_string(), library.to_string()];
    let mut rows = executor.query(LIBRARY_INFO_SQL, &params).await?;
    debug!("LIBRARY_INFO {} 返回 {} 行", library, rows.len());

    if rows.is_empty() {
        return Ok(None);
    }
    Ok(Some(LibraryInfo::new(rows.swap_remove(0))))
}

/// 列出库中对象，`source_only` 时只返回源物理文件
pub async fn object_list(
    executor: &dyn SqlExecutor,
    library: &ObjectName,
    source_only: bool,
) -> Result<Vec<CatalogRecord>> {
    let sql = if source_only {
        SOURCE_FILE_LIST_SQL
    } else {
        OBJECT_LIST_SQL
    };
    executor.query(sql, &[library.to_string()]).await
}

/// 列出库中所有源成员
pub async fn source_members(
    executor: &dyn SqlExecutor,
    library: &ObjectName,
) -> Result<Vec<CatalogRecord>> {
    executor
        .query(SOURCE_MEMBER_LIST_SQL, &[library.to_string()])
        .await
}
