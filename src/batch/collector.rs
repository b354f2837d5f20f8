//! # 计算目录收集器
//!
//! 在作业根目录下收集含有标志文件（默认 OUTCAR）的计算子目录。
//!
//! ## 功能
//! - glob 模式匹配目录名（逗号分隔多模式）
//! - 递归目录搜索
//! - 结果按路径排序，保证输出稳定
//!
//! ## 依赖关系
//! - 被 `commands/scan.rs` 调用
//! - 使用 `walkdir` 遍历目录, `glob` 匹配目录名

use vaspout::error::{Result, VaspError};

use glob::Pattern;
use log::debug;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 计算目录收集器
pub struct DirCollector {
    /// 作业根目录
    root: PathBuf,
    /// 目录名匹配模式
    patterns: Vec<Pattern>,
    /// 目录中必须存在的文件名
    marker: Option<String>,
    /// 是否递归
    recursive: bool,
}

impl DirCollector {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            patterns: Vec::new(),
            marker: None,
            recursive: false,
        }
    }

    /// 设置目录名匹配模式（逗号分隔的多模式）
    pub fn with_pattern(mut self, pattern: &str) -> Result<Self> {
        self.patterns = pattern
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                Pattern::new(s).map_err(|e| {
                    VaspError::InvalidArgument(format!("invalid pattern '{}': {}", s, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(self)
    }

    /// 只收集含有该文件的目录
    pub fn with_marker(mut self, file_name: &str) -> Self {
        self.marker = Some(file_name.to_string());
        self
    }

    /// 设置是否递归搜索
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// 收集所有匹配的计算目录
    pub fn collect(&self) -> Vec<PathBuf> {
        if !self.root.is_dir() {
            return vec![];
        }

        let max_depth = if self.recursive { usize::MAX } else { 1 };

        let mut dirs: Vec<PathBuf> = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(max_depth)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_dir())
            .filter(|e| self.matches_patterns(e.path()))
            .filter(|e| match &self.marker {
                Some(name) => e.path().join(name).is_file(),
                None => true,
            })
            .map(|e| e.path().to_path_buf())
            .collect();

        dirs.sort();
        debug!("{}: {} calculation directories", self.root.display(), dirs.len());
        dirs
    }

    /// 目录名是否匹配任一模式；未设置模式时全部匹配
    fn matches_patterns(&self, path: &Path) -> bool {
        if self.patterns.is_empty() {
            return true;
        }
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => return false,
        };
        self.patterns.iter().any(|p| p.matches(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn job_tree() -> tempfile::TempDir {
        let root = tempfile::tempdir().unwrap();
        for name in ["relax-01", "relax-02", "scf", "empty"] {
            fs::create_dir(root.path().join(name)).unwrap();
        }
        for name in ["relax-01", "relax-02", "scf"] {
            fs::write(root.path().join(name).join("OUTCAR"), "").unwrap();
        }
        fs::create_dir_all(root.path().join("scf").join("nested")).unwrap();
        fs::write(root.path().join("scf/nested/OUTCAR"), "").unwrap();
        root
    }

    fn names(dirs: &[PathBuf]) -> Vec<String> {
        dirs.iter()
            .map(|d| d.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_collect_marked_dirs() {
        let root = job_tree();
        let dirs = DirCollector::new(root.path().to_path_buf())
            .with_marker("OUTCAR")
            .collect();
        assert_eq!(names(&dirs), vec!["relax-01", "relax-02", "scf"]);
    }

    #[test]
    fn test_pattern_filters_dir_names() {
        let root = job_tree();
        let dirs = DirCollector::new(root.path().to_path_buf())
            .with_pattern("relax-*, emp?y")
            .unwrap()
            .collect();
        assert_eq!(names(&dirs), vec!["empty", "relax-01", "relax-02"]);
    }

    #[test]
    fn test_recursive_finds_nested() {
        let root = job_tree();
        let dirs = DirCollector::new(root.path().to_path_buf())
            .with_marker("OUTCAR")
            .recursive(true)
            .collect();
        assert_eq!(dirs.len(), 4);
        assert!(names(&dirs).contains(&"nested".to_string()));
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let result = DirCollector::new(PathBuf::from(".")).with_pattern("[relax");
        assert!(matches!(result, Err(VaspError::InvalidArgument(_))));
    }

    #[test]
    fn test_missing_root_collects_nothing() {
        let dirs = DirCollector::new(PathBuf::from("/no/such/jobs")).collect();
        assert!(dirs.is_empty());
    }
}
