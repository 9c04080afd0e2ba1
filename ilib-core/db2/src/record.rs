//! 目录查询结果

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 一行目录查询结果：列名 -> 值（保持列顺序）
///
/// 整数列为 JSON 数字，时间戳/日期/小数等其余非空值为字符串，NULL 为 `null`。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogRecord(Map<String, Value>);

impl CatalogRecord {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// 追加一列
    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        self.0.insert(column.into(), value);
    }

    /// 按列名取值（列名不区分大小写）
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0
            .get(column)
            .or_else(|| self.0.get(&column.to_ascii_uppercase()))
    }

    /// 按列名取字符串值
    pub fn get_str(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(Value::as_str)
    }

    /// 按列名取整数值（兼容驱动以字符串返回的数字）
    pub fn get_i64(&self, column: &str) -> Option<i64> {
        match self.get(column)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for CatalogRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for CatalogRecord {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// 库信息（`QSYS2.LIBRARY_INFO` 加上库对象自身的创建时间）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LibraryInfo(CatalogRecord);

impl LibraryInfo {
    pub fn new(record: CatalogRecord) -> Self {
        Self(record)
    }

    pub fn text_description(&self) -> Option<&str> {
        self.0.get_str("TEXT_DESCRIPTION")
    }

    pub fn creation_date(&self) -> Option<&str> {
        self.0.get_str("CREATION_DATE")
    }

    pub fn object_count(&self) -> Option<i64> {
        self.0.get_i64("OBJECT_COUNT")
    }

    pub fn library_size(&self) -> Option<i64> {
        self.0.get_i64("LIBRARY_SIZE")
    }

    pub fn record(&self) -> &CatalogRecord {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> CatalogRecord {
        let mut record = CatalogRecord::new();
        record.insert("OBJECT_COUNT", json!(42));
        record.insert("LIBRARY_SIZE", json!("1048576"));
        record.insert("TEXT_DESCRIPTION", json!("General Purpose Library"));
        record.insert("CREATION_DATE", json!("2019-03-01 10:15:00.000000"));
        record.insert("JOURNAL_NAME", Value::Null);
        record
    }

    #[test]
    fn test_column_order_is_preserved() {
        let record = sample();
        let columns: Vec<_> = record.columns().collect();
        assert_eq!(
            columns,
            vec![
                "OBJECT_COUNT",
                "LIBRARY_SIZE",
                "TEXT_DESCRIPTION",
                "CREATION_DATE",
                "JOURNAL_NAME"
            ]
        );
    }

    #[test]
    fn test_library_info_accessors() {
        let info = LibraryInfo::new(sample());
        assert_eq!(info.object_count(), Some(42));
        assert_eq!(info.library_size(), Some(1_048_576));
        assert_eq!(info.text_description(), Some("General Purpose Library"));
        assert!(info.creation_date().is_some());
    }

    #[test]
    fn test_serializes_as_flat_object() {
        let info = LibraryInfo::new(sample());
        let json = serde_json::to_string(&info).unwrap();
        assert!(json.starts_with("{\"OBJECT_COUNT\":42"));
        assert!(json.contains("\"JOURNAL_NAME\":null"));
    }

    #[test]
    fn test_lowercase_lookup() {
        let record = sample();
        assert_eq!(record.get_str("text_description"), Some("General Purpose Library"));
    }
}
