//! # 解析诊断
//!
//! 单个数值字段解析失败时不中止解码，而是跳过该字段并记录一条诊断，
//! 同时通过 `log::warn!` 输出。解码结果携带完整的诊断列表。
//!
//! ## 依赖关系
//! - 被所有 `parsers/` 使用
//! - 使用 `log` 记录被跳过的字段

use log::warn;
use serde::{Deserialize, Serialize};

/// 被跳过字段的诊断信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// 行号（从 1 开始）
    pub line: usize,
    /// 字段名
    pub field: String,
    /// 无法解析的原始文本
    pub token: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "line {}: skipped field '{}' (unparsable token '{}')",
            self.line, self.field, self.token
        )
    }
}

/// 单次解码的诊断收集器
#[derive(Debug)]
pub struct Diagnostics {
    source: String,
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new(source: impl Into<String>) -> Self {
        Diagnostics {
            source: source.into(),
            items: Vec::new(),
        }
    }

    /// 记录一个被跳过的字段
    pub fn skip(&mut self, line: usize, field: &str, token: &str) {
        let diag = Diagnostic {
            line,
            field: field.to_string(),
            token: token.to_string(),
        };
        warn!("{}: {}", self.source, diag);
        self.items.push(diag);
    }

    /// 尝试解析浮点数，失败时记录诊断
    pub fn parse_f64(&mut self, line: usize, field: &str, token: &str) -> Option<f64> {
        match token.parse::<f64>() {
            Ok(v) => Some(v),
            Err(_) => {
                self.skip(line, field, token);
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_f64_records_failures() {
        let mut diags = Diagnostics::new("OSZICAR");
        assert_eq!(diags.parse_f64(3, "E0", "-1.5E+01"), Some(-15.0));
        assert_eq!(diags.parse_f64(4, "mag", "*******"), None);
        assert!(!diags.is_empty());

        let items = diags.into_vec();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].line, 4);
        assert_eq!(items[0].field, "mag");
        assert_eq!(
            items[0].to_string(),
            "line 4: skipped field 'mag' (unparsable token '*******')"
        );
    }
}
