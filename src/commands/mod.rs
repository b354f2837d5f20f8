//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。命令只负责展示，解码全部委托给库。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `batch/`, `utils/` 与 `vaspout` 库
//! - 子模块: parse, scan

pub mod parse;
pub mod scan;

use crate::cli::{Cli, Commands};
use vaspout::config::DecodeConfig;
use vaspout::error::Result;

use log::info;
use std::path::Path;

/// 执行命令
pub fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Parse(args) => parse::execute(args, &cli.dir, config),
        Commands::Scan(args) => scan::execute(args, config),
    }
}

/// 读取解码配置；未指定时使用默认值
fn load_config(path: Option<&Path>) -> Result<DecodeConfig> {
    match path {
        Some(p) => {
            info!("loading decode config from {}", p.display());
            DecodeConfig::from_yaml_file(p)
        }
        None => Ok(DecodeConfig::default()),
    }
}
