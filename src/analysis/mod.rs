//! # 派生量模块
//!
//! 只依赖解码后的记录计算派生物理量，不读取文件。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` (CalculationDir)、`commands/` 使用
//! - 使用 `models/electronic.rs`
//! - 子模块: gap, workfunction

pub mod gap;
pub mod workfunction;

pub use gap::band_gap;
pub use workfunction::work_function;
