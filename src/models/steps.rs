//! # 迭代历史数据模型
//!
//! OSZICAR 中的离子步与电子步记录。字段保持文件中出现的顺序。
//!
//! ## 依赖关系
//! - 被 `parsers/oszicar.rs` 使用
//! - 使用 `indexmap` 保持字段顺序

use super::Diagnostic;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// 一个电子自洽迭代
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectronicStep {
    /// 迭代序号（文件中给出的 N）
    pub iteration: usize,
    /// 算法前缀（DAV, RMM, CG, SDA），裸数字行为 None
    pub algorithm: Option<String>,
    /// 命名字段：E, dE, d_eps, ncg, rms, rms(c)
    pub fields: IndexMap<String, f64>,
}

impl ElectronicStep {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.fields.get(name).copied()
    }
}

/// 一个离子步的汇总行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IonicStep {
    /// 离子步序号（从 1 开始）
    pub index: usize,
    /// 命名字段：F, E0, dE, mag, T, E, EK, ...
    pub fields: IndexMap<String, f64>,
}

impl IonicStep {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.fields.get(name).copied()
    }

    /// 自由能 F
    pub fn free_energy(&self) -> Option<f64> {
        self.get("F")
    }

    /// E0 (sigma -> 0)
    pub fn energy_sigma0(&self) -> Option<f64> {
        self.get("E0")
    }

    pub fn magnetization(&self) -> Option<f64> {
        self.get("mag")
    }
}

/// OSZICAR 解析结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepHistory {
    /// 离子步
    pub ionic_steps: Vec<IonicStep>,
    /// 与 `ionic_steps` 平行：每个离子步所属的电子步
    pub electronic_steps: Vec<Vec<ElectronicStep>>,
    /// 最后一个离子汇总行之后、尚未结束的电子步
    pub pending: Vec<ElectronicStep>,
    /// 被跳过字段的诊断
    pub diagnostics: Vec<Diagnostic>,
}

impl StepHistory {
    pub fn len(&self) -> usize {
        self.ionic_steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ionic_steps.is_empty()
    }

    /// 最终能量：最后一个离子步的 E0，缺失时退回 F
    pub fn final_energy(&self) -> Option<f64> {
        let last = self.ionic_steps.last()?;
        last.energy_sigma0().or_else(|| last.free_energy())
    }

    /// 每个离子步的能量 (E0 优先，其次 F)
    pub fn energies(&self) -> Vec<Option<f64>> {
        self.ionic_steps
            .iter()
            .map(|s| s.energy_sigma0().or_else(|| s.free_energy()))
            .collect()
    }

    /// 每个离子步的总磁矩
    pub fn magnetizations(&self) -> Vec<Option<f64>> {
        self.ionic_steps.iter().map(IonicStep::magnetization).collect()
    }

    /// 指定离子步（从 1 开始）的电子步
    pub fn electronic_for(&self, index: usize) -> Option<&[ElectronicStep]> {
        if index == 0 {
            return None;
        }
        self.electronic_steps.get(index - 1).map(|v| v.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ionic(index: usize, fields: &[(&str, f64)]) -> IonicStep {
        IonicStep {
            index,
            fields: fields.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }

    #[test]
    fn test_final_energy_prefers_e0() {
        let history = StepHistory {
            ionic_steps: vec![
                ionic(1, &[("F", -10.0), ("E0", -10.1)]),
                ionic(2, &[("F", -11.0)]),
            ],
            electronic_steps: vec![vec![], vec![]],
            ..Default::default()
        };
        assert_eq!(history.final_energy(), Some(-11.0));
        assert_eq!(history.energies(), vec![Some(-10.1), Some(-11.0)]);
        assert_eq!(history.magnetizations(), vec![None, None]);
        assert!(history.electronic_for(0).is_none());
        assert_eq!(history.electronic_for(2).map(|s| s.len()), Some(0));
    }
}
