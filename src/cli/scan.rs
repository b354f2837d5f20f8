//! # scan 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/scan.rs`

use clap::Args;
use std::path::PathBuf;

/// scan 子命令参数
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Root directory containing calculation sub-directories
    pub job_dir: PathBuf,

    /// Glob pattern for calculation directory names (comma-separated, e.g., "relax-*,scf")
    #[arg(long, default_value = "*")]
    pub pattern: String,

    /// Number of parallel jobs (0 = auto)
    #[arg(short, long, default_value_t = 0)]
    pub jobs: usize,

    /// Recurse into subdirectories
    #[arg(long, default_value_t = false)]
    pub recursive: bool,

    /// Number of lowest-energy calculations to print
    #[arg(long, default_value_t = 20)]
    pub top_n: usize,
}
