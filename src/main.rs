//! # vaspout - VASP 输出产物解码工具
//!
//! `vaspout` 库之上的命令行展示层。
//!
//! ## 子命令
//! - `parse` - 解码单个计算目录中的一种产物或派生量
//! - `scan`  - 并行解码作业根目录下的所有计算并按能量排序
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     └── vaspout (解码库)
//!   ├── batch/      (并行批量解码)
//!   └── utils/      (输出与进度条)
//! ```

mod batch;
mod cli;
mod commands;
mod utils;

use clap::Parser;
use cli::Cli;
use log::LevelFilter;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();
    init_logger(cli.verbose);

    if let Err(e) = commands::run(cli) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}

/// 默认 warn，`-v` info，`-vv` 及以上 debug；`RUST_LOG` 优先
fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}
