//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `parse`: 解码单个计算目录中的一种产物或派生量
//! - `scan`: 并行解码作业根目录下的所有计算目录并按能量排序
//!
//! ## 全局参数
//! - `--dir` / `VASPOUT_DIR`: 计算目录
//! - `--config` / `VASPOUT_CONFIG`: YAML 解码配置
//! - `-v`: 日志级别（可叠加）
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: parse, scan

pub mod parse;
pub mod scan;

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// vaspout - VASP 输出产物解码工具
#[derive(Parser)]
#[command(name = "vaspout")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(about = "Decode VASP output artifacts into structured records", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Calculation directory holding the VASP output files
    #[arg(short, long, global = true, env = "VASPOUT_DIR", default_value = ".")]
    pub dir: PathBuf,

    /// YAML file overriding artifact file names and decoding thresholds
    #[arg(long, global = true, env = "VASPOUT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Decode one artifact or derived quantity of a calculation directory
    Parse(parse::ParseArgs),

    /// Decode every calculation directory under a job root and rank by energy
    Scan(scan::ScanArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_args_after_subcommand() {
        let cli = Cli::try_parse_from(["vaspout", "parse", "gap", "-d", "calc", "-vv"]).unwrap();
        assert_eq!(cli.dir, PathBuf::from("calc"));
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Parse(_)));
    }
}
