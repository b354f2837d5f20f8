//! # 批量执行器
//!
//! 在 rayon 线程池中并行解码多个计算目录。
//!
//! ## 功能
//! - 基于 rayon 的并行迭代
//! - 进度条显示
//! - 解码记录收集与失败汇总
//!
//! ## 依赖关系
//! - 被 `commands/scan.rs` 调用
//! - 使用 `utils/progress.rs` 创建进度条
//! - 使用 `rayon` 进行并行计算

use crate::utils::progress;
use vaspout::error::{Result, VaspError};

use rayon::prelude::*;
use std::path::PathBuf;

/// 单个目录处理结果
#[derive(Debug, Clone)]
pub enum ProcessResult<T> {
    /// 解码成功
    Success(T),
    /// 跳过（如缺少产物）
    Skipped(String),
    /// 解码失败
    Failed(String, String), // (目录路径, 错误信息)
}

/// 批量处理结果统计
#[derive(Debug)]
pub struct BatchResult<T> {
    pub success: usize,
    pub skipped: usize,
    pub failed: usize,
    /// 失败详情
    pub failures: Vec<(String, String)>,
    /// 成功解码的记录，顺序与输入一致
    pub records: Vec<T>,
}

impl<T> Default for BatchResult<T> {
    fn default() -> Self {
        BatchResult {
            success: 0,
            skipped: 0,
            failed: 0,
            failures: Vec::new(),
            records: Vec::new(),
        }
    }
}

impl<T> BatchResult<T> {
    /// 合并处理结果
    pub fn merge(&mut self, result: ProcessResult<T>) {
        match result {
            ProcessResult::Success(record) => {
                self.success += 1;
                self.records.push(record);
            }
            ProcessResult::Skipped(_) => self.skipped += 1,
            ProcessResult::Failed(path, err) => {
                self.failed += 1;
                self.failures.push((path, err));
            }
        }
    }

    /// 总处理数量
    pub fn total(&self) -> usize {
        self.success + self.skipped + self.failed
    }
}

/// 批量执行器
pub struct BatchRunner {
    /// 并行作业数
    jobs: usize,
}

impl BatchRunner {
    /// 创建批量执行器，`jobs == 0` 时使用全部 CPU
    pub fn new(jobs: usize) -> Self {
        let jobs = if jobs == 0 { num_cpus::get() } else { jobs };
        Self { jobs }
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// 并行处理目录列表
    pub fn run<T, F>(&self, dirs: Vec<PathBuf>, processor: F) -> Result<BatchResult<T>>
    where
        T: Send,
        F: Fn(&PathBuf) -> ProcessResult<T> + Sync + Send,
    {
        let pb = progress::create_progress_bar(dirs.len() as u64, "Decoding");

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()
            .map_err(|e| VaspError::Other(format!("failed to start worker pool: {}", e)))?;

        let results: Vec<ProcessResult<T>> = pool.install(|| {
            dirs.par_iter()
                .map(|dir| {
                    let result = processor(dir);
                    pb.inc(1);
                    result
                })
                .collect()
        });

        pb.finish_and_clear();

        let mut batch_result = BatchResult::default();
        for result in results {
            batch_result.merge(result);
        }

        Ok(batch_result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_counts_and_records() {
        let mut batch = BatchResult::default();
        batch.merge(ProcessResult::Success(1));
        batch.merge(ProcessResult::Skipped("a".into()));
        batch.merge(ProcessResult::Failed("b".into(), "bad".into()));
        batch.merge(ProcessResult::Success(2));

        assert_eq!(batch.total(), 4);
        assert_eq!(batch.success, 2);
        assert_eq!(batch.records, vec![1, 2]);
        assert_eq!(batch.failures, vec![("b".to_string(), "bad".to_string())]);
    }

    #[test]
    fn test_run_keeps_input_order() {
        let dirs: Vec<PathBuf> = (0..8).map(|i| PathBuf::from(format!("calc{}", i))).collect();
        let batch = BatchRunner::new(2)
            .run(dirs, |d| {
                let name = d.display().to_string();
                if name.ends_with('3') {
                    ProcessResult::Skipped(name)
                } else {
                    ProcessResult::Success(name)
                }
            })
            .unwrap();

        assert_eq!(batch.success, 7);
        assert_eq!(batch.skipped, 1);
        assert_eq!(batch.records[0], "calc0");
        assert_eq!(batch.records[6], "calc7");
    }

    #[test]
    fn test_zero_jobs_uses_all_cpus() {
        assert_eq!(BatchRunner::new(0).jobs(), num_cpus::get());
        assert_eq!(BatchRunner::new(3).jobs(), 3);
    }
}
