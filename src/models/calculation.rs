//! # OUTCAR 计算结果数据模型
//!
//! 存储从 OUTCAR 中提取的标量、力、张量等信息。
//! 标量按"最后一次出现"策略取值：VASP 每个迭代追加一行，最后一行即收敛值。
//!
//! ## 依赖关系
//! - 被 `parsers/outcar.rs`, `parsers/scanner.rs` 使用
//! - 被 `commands/` 使用

use super::Diagnostic;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// OUTCAR 标量名
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKey {
    /// free energy TOTEN (eV)
    TotalEnergy,
    /// energy without entropy (eV)
    EnergyWithoutEntropy,
    /// energy(sigma->0) (eV)
    EnergySigma0,
    /// enthalpy is TOTEN (eV)，恒压计算才有
    Enthalpy,
    /// E-fermi (eV)
    FermiEnergy,
    /// number of electron
    TotalElectrons,
    /// magnetization (μB)
    TotalMagnetization,
    /// volume of cell (Å³)
    Volume,
    /// NIONS
    Ions,
}

impl ScalarKey {
    pub const ALL: [ScalarKey; 9] = [
        ScalarKey::TotalEnergy,
        ScalarKey::EnergyWithoutEntropy,
        ScalarKey::EnergySigma0,
        ScalarKey::Enthalpy,
        ScalarKey::FermiEnergy,
        ScalarKey::TotalElectrons,
        ScalarKey::TotalMagnetization,
        ScalarKey::Volume,
        ScalarKey::Ions,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ScalarKey::TotalEnergy => "total_energy",
            ScalarKey::EnergyWithoutEntropy => "energy_without_entropy",
            ScalarKey::EnergySigma0 => "energy_sigma0",
            ScalarKey::Enthalpy => "enthalpy",
            ScalarKey::FermiEnergy => "fermi_energy",
            ScalarKey::TotalElectrons => "total_electrons",
            ScalarKey::TotalMagnetization => "total_magnetization",
            ScalarKey::Volume => "volume",
            ScalarKey::Ions => "ions",
        }
    }
}

impl std::fmt::Display for ScalarKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 标量结果：每个键至多一个值，总是最后一次出现的值
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScalarResult {
    values: BTreeMap<ScalarKey, f64>,
}

impl ScalarResult {
    pub fn from_map(values: BTreeMap<ScalarKey, f64>) -> Self {
        ScalarResult { values }
    }

    pub fn get(&self, key: ScalarKey) -> Option<f64> {
        self.values.get(&key).copied()
    }

    pub fn contains(&self, key: ScalarKey) -> bool {
        self.values.contains_key(&key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ScalarKey, f64)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn total_energy(&self) -> Option<f64> {
        self.get(ScalarKey::TotalEnergy)
    }

    pub fn fermi_energy(&self) -> Option<f64> {
        self.get(ScalarKey::FermiEnergy)
    }

    pub fn total_electrons(&self) -> Option<f64> {
        self.get(ScalarKey::TotalElectrons)
    }

    pub fn total_magnetization(&self) -> Option<f64> {
        self.get(ScalarKey::TotalMagnetization)
    }

    /// 原子数 (NIONS)
    pub fn ions(&self) -> Option<usize> {
        self.get(ScalarKey::Ions)
            .filter(|n| *n >= 0.0)
            .map(|n| n.round() as usize)
    }
}

/// 单个原子的位置与受力
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AtomForce {
    /// 笛卡尔坐标 (Å)
    pub position: [f64; 3],
    /// 受力 (eV/Å)
    pub force: [f64; 3],
}

impl AtomForce {
    pub fn magnitude(&self) -> f64 {
        let f = self.force;
        (f[0] * f[0] + f[1] * f[1] + f[2] * f[2]).sqrt()
    }
}

/// 受力概要（一个离子步）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForceSummary {
    pub max: f64,
    pub rms: f64,
}

/// 一个构型的受力表
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForceRecord {
    pub atoms: Vec<AtomForce>,
}

impl ForceRecord {
    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// 最大受力模长
    pub fn max_force(&self) -> Option<f64> {
        self.atoms.iter().map(AtomForce::magnitude).reduce(f64::max)
    }

    /// 受力模长的均方根
    pub fn rms_force(&self) -> Option<f64> {
        if self.atoms.is_empty() {
            return None;
        }
        let sum_sq: f64 = self.atoms.iter().map(|a| a.magnitude().powi(2)).sum();
        Some((sum_sq / self.atoms.len() as f64).sqrt())
    }

    pub fn summary(&self) -> Option<ForceSummary> {
        Some(ForceSummary {
            max: self.max_force()?,
            rms: self.rms_force()?,
        })
    }
}

/// 应力张量 (kBar)：XX YY ZZ XY YZ ZX
pub type StressTensor = [f64; 6];

/// 弹性张量 (kBar)，6x6 Voigt 记号
pub type ElasticTensor = [[f64; 6]; 6];

/// 介电张量 3x3
pub type DielectricTensor = [[f64; 3]; 3];

/// OUTCAR 解析结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutcarResult {
    /// 标量
    pub scalars: ScalarResult,

    /// 离子弛豫是否达到要求精度
    pub converged: bool,

    /// 计算是否正常结束
    pub finished: bool,

    /// 最终构型的位置与受力
    pub forces: Option<ForceRecord>,

    /// 每个离子步的受力概要
    pub force_history: Vec<ForceSummary>,

    /// 应力张量
    pub stress: Option<StressTensor>,

    /// 弹性张量
    pub elastic: Option<ElasticTensor>,

    /// 宏观静态介电张量（电子部分）
    pub dielectric: Option<DielectricTensor>,

    /// 宏观静态介电张量（离子贡献）
    pub dielectric_ionic: Option<DielectricTensor>,

    /// 被跳过字段的诊断
    pub diagnostics: Vec<Diagnostic>,
}

impl OutcarResult {
    /// 每原子能量
    pub fn energy_per_atom(&self) -> Option<f64> {
        match (self.scalars.total_energy(), self.scalars.ions()) {
            (Some(e), Some(n)) if n > 0 => Some(e / n as f64),
            _ => None,
        }
    }

    /// 压强 (kBar)：应力对角元平均
    pub fn pressure_kbar(&self) -> Option<f64> {
        self.stress.map(|s| (s[0] + s[1] + s[2]) / 3.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_force_record_statistics() {
        let record = ForceRecord {
            atoms: vec![
                AtomForce {
                    position: [0.0; 3],
                    force: [3.0, 4.0, 0.0],
                },
                AtomForce {
                    position: [1.0; 3],
                    force: [0.0, 0.0, 0.0],
                },
            ],
        };
        assert_eq!(record.max_force(), Some(5.0));
        let rms = record.rms_force().unwrap();
        assert!((rms - (12.5f64).sqrt()).abs() < 1e-12);
        assert!(ForceRecord::default().summary().is_none());
    }

    #[test]
    fn test_energy_per_atom_and_pressure() {
        let mut values = BTreeMap::new();
        values.insert(ScalarKey::TotalEnergy, -20.0);
        values.insert(ScalarKey::Ions, 4.0);
        let result = OutcarResult {
            scalars: ScalarResult::from_map(values),
            stress: Some([3.0, 6.0, 9.0, 0.0, 0.0, 0.0]),
            ..Default::default()
        };
        assert_eq!(result.energy_per_atom(), Some(-5.0));
        assert_eq!(result.pressure_kbar(), Some(6.0));
    }
}
