//! # 批量处理模块
//!
//! 提供多个计算目录的并行解码能力。
//!
//! ## 功能
//! - 收集作业根目录下的计算目录
//! - 并行解码
//! - 进度反馈与统计
//!
//! ## 依赖关系
//! - 被 `commands/scan.rs` 使用
//! - 使用 `rayon` 进行并行处理
//! - 使用 `indicatif` 显示进度

pub mod collector;
pub mod runner;

pub use collector::DirCollector;
pub use runner::{BatchResult, BatchRunner, ProcessResult};
