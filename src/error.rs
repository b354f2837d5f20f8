//! # 统一错误处理模块
//!
//! 定义 vaspout 的所有错误类型，使用 `thiserror` 派生。
//!
//! 错误分三类：
//! - 缺失产物 (`ArtifactNotFound`)：调用方可以降级处理（跳过、提示"无数据"）
//! - 结构错误 (`MalformedStructure`, `Xml`)：声明的数目与实际内容不符，位置解码无法继续
//! - 单个字段解析失败不是错误，而是记录为 [`Diagnostic`](crate::models::Diagnostic)
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 使用 `roxmltree::Error` 作为 XML 错误来源

use thiserror::Error;

/// vaspout 统一错误类型
#[derive(Error, Debug)]
pub enum VaspError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("{artifact} not found: {path}")]
    ArtifactNotFound { artifact: String, path: String },

    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 解析错误
    // ─────────────────────────────────────────────────────────────
    #[error("Malformed {format} file: {path}\nReason: {reason}")]
    MalformedStructure {
        format: String,
        path: String,
        reason: String,
    },

    #[error("Malformed XML document: {path}")]
    Xml {
        path: String,
        #[source]
        source: roxmltree::Error,
    },

    // ─────────────────────────────────────────────────────────────
    // 配置与参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid configuration file: {path}\nReason: {reason}")]
    Config { path: String, reason: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

impl VaspError {
    /// 构造结构错误
    pub fn malformed(format: &str, path: &str, reason: impl Into<String>) -> Self {
        VaspError::MalformedStructure {
            format: format.to_string(),
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    /// 是否为缺失产物错误（调用方应降级而不是中止）
    pub fn is_missing_artifact(&self) -> bool {
        matches!(self, VaspError::ArtifactNotFound { .. })
    }
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, VaspError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_artifact_flag() {
        let err = VaspError::ArtifactNotFound {
            artifact: "OUTCAR".to_string(),
            path: "/tmp/x/OUTCAR".to_string(),
        };
        assert!(err.is_missing_artifact());
        assert_eq!(err.to_string(), "OUTCAR not found: /tmp/x/OUTCAR");

        let err = VaspError::malformed("EIGENVAL", "EIGENVAL", "truncated");
        assert!(!err.is_missing_artifact());
        assert!(err.to_string().contains("truncated"));
    }
}
