//! CLI 命令处理模块

pub mod common; // 公共工具函数
pub mod config;
pub mod library;
pub mod output;
pub mod save;
pub mod savf;
