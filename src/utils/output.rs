//! # 美化输出工具
//!
//! 提供统一的终端输出样式：状态标签、标题栏、键值行与解码诊断。
//!
//! ## 依赖关系
//! - 被 `main.rs` 与所有 `commands/` 模块使用
//! - 使用 `colored` crate

use vaspout::models::Diagnostic;

use colored::Colorize;

/// 诊断最多逐条打印的数量
const MAX_LISTED_DIAGNOSTICS: usize = 10;

/// 打印错误消息
pub fn print_error(msg: &str) {
    eprintln!("{} {}", "[ERR]".red().bold(), msg);
}

/// 打印警告消息
pub fn print_warning(msg: &str) {
    println!("{} {}", "[WARN]".yellow().bold(), msg);
}

/// 打印信息消息
pub fn print_info(msg: &str) {
    println!("{} {}", "[*]".blue().bold(), msg);
}

/// 打印跳过消息
pub fn print_skip(msg: &str) {
    println!("{} {}", "[SKIP]".dimmed(), msg);
}

/// 打印完成消息
pub fn print_done(msg: &str) {
    println!("{} {}", "[DONE]".green().bold(), msg);
}

/// 打印标题栏
pub fn print_header(title: &str) {
    let line = "─".repeat(60);
    println!("\n{}", line.dimmed());
    println!("  {}", title.bold());
    println!("{}\n", line.dimmed());
}

/// 打印分隔线
pub fn print_separator() {
    println!("{}", "─".repeat(60).dimmed());
}

/// 打印一行 `名称  值`
pub fn print_field(name: &str, value: &str) {
    println!("  {:<26} {}", name.dimmed(), value);
}

/// 打印被跳过字段的诊断
pub fn print_diagnostics(source: &str, diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }
    print_warning(&format!(
        "{}: {} malformed field(s) skipped",
        source,
        diagnostics.len()
    ));
    for d in diagnostics.iter().take(MAX_LISTED_DIAGNOSTICS) {
        println!(
            "    line {:>6}  {:<16} {}",
            d.line,
            d.field,
            format!("'{}'", d.token).dimmed()
        );
    }
    if diagnostics.len() > MAX_LISTED_DIAGNOSTICS {
        println!("    ... {} more", diagnostics.len() - MAX_LISTED_DIAGNOSTICS);
    }
}

/// 格式化可选数值，缺失时为 `-`
pub fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", precision, v),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_opt() {
        assert_eq!(fmt_opt(Some(-1.23456), 3), "-1.235");
        assert_eq!(fmt_opt(None, 3), "-");
    }
}
