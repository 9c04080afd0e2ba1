//! CLI 通用输出格式化模块
//!
//! 提供 table/json 两种输出格式的通用实现

use anyhow::Result;
use ilib_db2::CatalogRecord;
use serde::Serialize;
use serde_json::Value;

/// 可输出为表格行的数据 trait
pub trait TableRow {
    /// 返回表格列标题
    fn headers() -> Vec<&'static str>;

    /// 返回该项的表格行数据
    fn row(&self) -> Vec<String>;
}

/// 表格格式输出
pub fn print_table<T: TableRow>(items: &[T]) {
    let headers = T::headers();

    let header_line: String = headers
        .iter()
        .map(|h| format!("{:<20}", h))
        .collect::<Vec<_>>()
        .join(" ");
    println!("{}", header_line);
    println!("{}", "-".repeat(header_line.len()));

    for item in items {
        let row_line: String = item
            .row()
            .iter()
            .map(|c| format!("{:<20}", c))
            .collect::<Vec<_>>()
            .join(" ");
        println!("{}", row_line);
    }
}

/// JSON 格式输出
pub fn print_json<T: Serialize>(items: &[T]) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(items)?);
    Ok(())
}

/// 根据格式参数选择输出方式
pub fn output_formatted<T: TableRow + Serialize>(items: &[T], format: &str) -> Result<()> {
    match format {
        "json" => print_json(items)?,
        _ => print_table(items),
    }
    Ok(())
}

/// 单元格文本：字符串原样输出，NULL 输出为空
pub fn cell(record: &CatalogRecord, column: &str) -> String {
    match record.get(column) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
