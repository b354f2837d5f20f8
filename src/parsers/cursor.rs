//! # 定位解码游标
//!
//! EIGENVAL、DOSCAR 与体积数据文件都是按声明数目逐行读取的定长格式。
//! 游标负责逐行前进，并在内容与声明数目不符时给出带行号的结构错误。
//!
//! ## 依赖关系
//! - 被 `parsers/eigenval.rs`, `parsers/doscar.rs`, `parsers/poscar.rs`, `parsers/volumetric.rs` 使用

use crate::error::{Result, VaspError};

use std::str::FromStr;

pub struct LineCursor<'a> {
    format: &'static str,
    source: &'a str,
    lines: Vec<&'a str>,
    pos: usize,
}

impl<'a> LineCursor<'a> {
    pub fn new(format: &'static str, content: &'a str, source: &'a str) -> Self {
        LineCursor {
            format,
            source,
            lines: content.lines().collect(),
            pos: 0,
        }
    }

    /// 已消耗的行数，也是最近读取行的行号（从 1 开始）
    pub fn lineno(&self) -> usize {
        self.pos
    }

    pub fn peek(&self) -> Option<&'a str> {
        self.lines.get(self.pos).copied()
    }

    /// 剩余内容是否全为空白
    pub fn rest_is_blank(&self) -> bool {
        self.lines[self.pos.min(self.lines.len())..]
            .iter()
            .all(|l| l.trim().is_empty())
    }

    pub fn next_line(&mut self, what: &str) -> Result<&'a str> {
        match self.lines.get(self.pos).copied() {
            Some(line) => {
                self.pos += 1;
                Ok(line)
            }
            None => Err(self.error(format!(
                "unexpected end of file at line {} while reading {}",
                self.pos + 1,
                what
            ))),
        }
    }

    pub fn skip_blank(&mut self) {
        while self.peek().map_or(false, |l| l.trim().is_empty()) {
            self.pos += 1;
        }
    }

    pub fn next_nonblank(&mut self, what: &str) -> Result<&'a str> {
        self.skip_blank();
        self.next_line(what)
    }

    /// 解析最近读取行中的一个记号
    pub fn number<T: FromStr>(&self, token: &str, what: &str) -> Result<T> {
        token.parse().map_err(|_| {
            self.error(format!(
                "line {}: invalid {} '{}'",
                self.lineno(),
                what,
                token
            ))
        })
    }

    /// 解析一行的前 `n` 个记号
    pub fn numbers<T: FromStr>(&self, line: &str, n: usize, what: &str) -> Result<Vec<T>> {
        let tokens: Vec<&str> = line.split_whitespace().take(n).collect();
        if tokens.len() < n {
            return Err(self.error(format!(
                "line {}: expected {} values for {}, found {}",
                self.lineno(),
                n,
                what,
                tokens.len()
            )));
        }
        tokens.iter().map(|t| self.number(t, what)).collect()
    }

    /// 从当前位置起跨行读取恰好 `count` 个浮点数，之后游标停在最后一个被消耗记号所在行之后
    pub fn take_floats(&mut self, count: usize, what: &str) -> Result<Vec<f64>> {
        // 每个数至少占一个字符加一个分隔符
        let remaining: usize = self.lines[self.pos.min(self.lines.len())..]
            .iter()
            .map(|l| l.len() + 1)
            .sum();
        let mut values = Vec::with_capacity(count.min(remaining / 2 + 1));
        while values.len() < count {
            let line = self.next_line(what)?;
            for token in line.split_whitespace() {
                if values.len() == count {
                    break;
                }
                values.push(self.number(token, what)?);
            }
        }
        Ok(values)
    }

    pub fn error(&self, reason: impl Into<String>) -> VaspError {
        VaspError::malformed(self.format, self.source, reason)
    }
}
