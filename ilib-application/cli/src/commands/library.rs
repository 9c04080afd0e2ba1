//! 库信息查询命令

use anyhow::Result;
use colored::Colorize;
use ilib_db2::CatalogRecord;
use serde::Serialize;

use super::common::open_session;
use super::output::{cell, output_formatted, TableRow};
use crate::config::CliConfig;

pub async fn handle(action: crate::LibraryAction, config: &CliConfig) -> Result<()> {
    match action {
        crate::LibraryAction::Info { library, format } => info(config, &library, &format).await,
        crate::LibraryAction::Files {
            library,
            source_only,
            format,
        } => files(config, &library, source_only, &format).await,
        crate::LibraryAction::Members { library, format } => {
            members(config, &library, &format).await
        }
    }
}

/// 库信息的一列
#[derive(Serialize)]
struct FieldRow {
    column: String,
    value: String,
}

impl TableRow for FieldRow {
    fn headers() -> Vec<&'static str> {
        vec!["COLUMN", "VALUE"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.column.clone(), self.value.clone()]
    }
}

/// 库中对象
#[derive(Serialize)]
struct ObjectRow {
    name: String,
    object_type: String,
    attribute: String,
    size: String,
    text: String,
}

impl From<&CatalogRecord> for ObjectRow {
    fn from(record: &CatalogRecord) -> Self {
        Self {
            name: cell(record, "OBJNAME"),
            object_type: cell(record, "OBJTYPE"),
            attribute: cell(record, "OBJATTRIBUTE"),
            size: cell(record, "OBJSIZE"),
            text: cell(record, "OBJTEXT"),
        }
    }
}

impl TableRow for ObjectRow {
    fn headers() -> Vec<&'static str> {
        vec!["OBJECT", "TYPE", "ATTRIBUTE", "SIZE", "TEXT"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.object_type.clone(),
            self.attribute.clone(),
            self.size.clone(),
            self.text.clone(),
        ]
    }
}

/// 源成员
#[derive(Serialize)]
struct MemberRow {
    file: String,
    member: String,
    source_type: String,
    rows: String,
    last_changed: String,
}

impl From<&CatalogRecord> for MemberRow {
    fn from(record: &CatalogRecord) -> Self {
        Self {
            file: cell(record, "SYSTEM_TABLE_NAME"),
            member: cell(record, "SYSTEM_TABLE_MEMBER"),
            source_type: cell(record, "SOURCE_TYPE"),
            rows: cell(record, "NUMBER_ROWS"),
            last_changed: cell(record, "LAST_SOURCE_UPDATE_TIMESTAMP"),
        }
    }
}

impl TableRow for MemberRow {
    fn headers() -> Vec<&'static str> {
        vec!["FILE", "MEMBER", "TYPE", "ROWS", "LAST CHANGED"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.file.clone(),
            self.member.clone(),
            self.source_type.clone(),
            self.rows.clone(),
            self.last_changed.clone(),
        ]
    }
}

async fn info(config: &CliConfig, library: &str, format: &str) -> Result<()> {
    let session = open_session(config).await?;

    if format == "json" {
        let json = session.library_info_json(library).await;
        session.close().await?;
        println!("{}", json?);
        return Ok(());
    }

    let info = session.library_info(library).await;
    session.close().await?;

    match info? {
        Some(info) => {
            println!("{} {}\n", "库".bold(), library.to_uppercase().cyan().bold());
            let rows: Vec<FieldRow> = info
                .record()
                .columns()
                .map(|column| FieldRow {
                    column: column.to_string(),
                    value: cell(info.record(), column),
                })
                .collect();
            output_formatted(&rows, format)?;
        }
        None => {
            println!("{} 库 {} 不存在", "✗".red().bold(), library.to_uppercase());
        }
    }

    Ok(())
}

async fn files(config: &CliConfig, library: &str, source_only: bool, format: &str) -> Result<()> {
    let session = open_session(config).await?;

    if format == "json" {
        let json = session.file_info_json(library, source_only).await;
        session.close().await?;
        println!("{}", json?);
        return Ok(());
    }

    let records = session.file_info(library, source_only).await;
    session.close().await?;
    let records = records?;

    if records.is_empty() {
        println!("{}", "没有找到任何对象".yellow());
        return Ok(());
    }

    let rows: Vec<ObjectRow> = records.iter().map(ObjectRow::from).collect();
    output_formatted(&rows, format)?;
    println!("\n共 {} 个对象", rows.len().to_string().green());
    Ok(())
}

async fn members(config: &CliConfig, library: &str, format: &str) -> Result<()> {
    let session = open_session(config).await?;

    if format == "json" {
        let json = session.source_members_json(library).await;
        session.close().await?;
        println!("{}", json?);
        return Ok(());
    }

    let records = session.source_members(library).await;
    session.close().await?;
    let records = records?;

    if records.is_empty() {
        println!("{}", "没有找到任何源成员".yellow());
        return Ok(());
    }

    let rows: Vec<MemberRow> = records.iter().map(MemberRow::from).collect();
    output_formatted(&rows, format)?;
    println!("\n共 {} 个成员", rows.len().to_string().green());
    Ok(())
}
