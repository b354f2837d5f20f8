//! # 电子结构数据模型
//!
//! 能带 (EIGENVAL)、投影能带 (PROCAR)、态密度 (DOSCAR) 以及派生量（带隙、功函数）。
//!
//! ## 数组约定
//! - `eigenvalues`: [k, band, 0] = 能量, [k, band, 1] = 占据数
//! - `projections`: [k, band, atom, orbital]
//! - DOS 数组不含能量列，能量单独存放于 `energies`
//!
//! ## 依赖关系
//! - 被 `parsers/eigenval.rs`, `parsers/procar.rs`, `parsers/doscar.rs` 使用
//! - 被 `analysis/` 使用
//! - 使用 `ndarray`

use super::Diagnostic;

use ndarray::{Array1, Array2, Array3, Array4, Axis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 能带结构 (EIGENVAL)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandStructure {
    /// 电子数
    pub nelect: f64,
    /// k 点坐标 (K x 3)
    pub kpoints: Array2<f64>,
    /// k 点权重 (K)
    pub weights: Array1<f64>,
    /// 本征值与占据数 (K x B x 2)；自旋极化时为自旋向上
    pub eigenvalues: Array3<f64>,
    /// 自旋向下的本征值与占据数（仅 ISPIN = 2）
    pub spin_down: Option<Array3<f64>>,
}

impl BandStructure {
    pub fn nkpts(&self) -> usize {
        self.kpoints.nrows()
    }

    pub fn nbands(&self) -> usize {
        self.eigenvalues.len_of(Axis(1))
    }

    pub fn is_spin_polarized(&self) -> bool {
        self.spin_down.is_some()
    }

    /// 相对费米能级的能带能量 (K x B)
    pub fn energies_relative_to(&self, efermi: f64) -> Array2<f64> {
        self.eigenvalues.index_axis(Axis(2), 0).mapv(|e| e - efermi)
    }

    /// 沿路径的累积 k 距离
    pub fn kpath_distances(&self) -> Array1<f64> {
        let mut dists = Vec::with_capacity(self.nkpts());
        let mut acc = 0.0;
        for (i, row) in self.kpoints.outer_iter().enumerate() {
            if i > 0 {
                let prev = self.kpoints.row(i - 1);
                let d: f64 = row
                    .iter()
                    .zip(prev.iter())
                    .map(|(a, b)| (a - b).powi(2))
                    .sum();
                acc += d.sqrt();
            }
            dists.push(acc);
        }
        Array1::from_vec(dists)
    }
}

/// 投影能带结构 (PROCAR)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedBandStructure {
    /// k 点坐标 (K x 3)
    pub kpoints: Array2<f64>,
    /// 本征值与占据数 (K x B x 2)
    pub eigenvalues: Array3<f64>,
    /// 轨道投影 (K x B x A x O)
    pub projections: Array4<f64>,
    /// 轨道名称，长度等于 projections 第四维
    pub orbitals: Vec<String>,
    /// 被跳过字段的诊断
    pub diagnostics: Vec<Diagnostic>,
}

impl ProjectedBandStructure {
    pub fn nkpts(&self) -> usize {
        self.projections.len_of(Axis(0))
    }

    pub fn nbands(&self) -> usize {
        self.projections.len_of(Axis(1))
    }

    pub fn natoms(&self) -> usize {
        self.projections.len_of(Axis(2))
    }

    /// 轨道名对应的列索引
    pub fn orbital_index(&self, name: &str) -> Option<usize> {
        self.orbitals.iter().position(|o| o == name)
    }

    /// 对选定原子与轨道求和的投影权重 (K x B)
    ///
    /// `atoms` 为 0 起始的原子索引，`None` 表示全部原子；
    /// `orbitals` 为轨道名，`None` 表示全部轨道，未知的名称被忽略。
    pub fn weights(&self, atoms: Option<&[usize]>, orbitals: Option<&[&str]>) -> Array2<f64> {
        let atom_idx: Vec<usize> = match atoms {
            Some(list) => list
                .iter()
                .copied()
                .filter(|&a| a < self.natoms())
                .collect(),
            None => (0..self.natoms()).collect(),
        };
        let orb_idx: Vec<usize> = match orbitals {
            Some(names) => names.iter().filter_map(|n| self.orbital_index(n)).collect(),
            None => (0..self.orbitals.len()).collect(),
        };

        let mut weights = Array2::zeros((self.nkpts(), self.nbands()));
        for ((ik, ib), w) in weights.indexed_iter_mut() {
            for &ia in &atom_idx {
                for &io in &orb_idx {
                    *w += self.projections[[ik, ib, ia, io]];
                }
            }
        }
        weights
    }
}

/// 态密度 (DOSCAR)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DosRecord {
    /// 费米能 (eV)
    pub efermi: f64,
    pub emin: f64,
    pub emax: f64,
    /// 能量格点数
    pub nedos: usize,
    /// 头部声明的原子数
    pub natoms: usize,
    /// 能量格点 (NEDOS)
    pub energies: Array1<f64>,
    /// 总态密度 (NEDOS x C)，不含能量列：
    /// 非自旋 [dos, int]，自旋 [up, down, int_up, int_down]
    pub total: Array2<f64>,
    /// 每原子投影态密度（原子索引从 0 开始），不含能量列
    pub pdos: Option<BTreeMap<usize, Array2<f64>>>,
}

impl DosRecord {
    /// 自旋分辨（三列及以上）
    pub fn is_spin_polarized(&self) -> bool {
        self.total.ncols() >= 3
    }

    /// 相对费米能级的能量
    pub fn shifted_energies(&self) -> Array1<f64> {
        self.energies.mapv(|e| e - self.efermi)
    }

    /// 指定原子（从 0 开始）的投影态密度
    pub fn atom_pdos(&self, atom: usize) -> Option<&Array2<f64>> {
        self.pdos.as_ref()?.get(&atom)
    }
}

/// 带隙分析结果
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandGap {
    /// 带隙 (eV)，不小于 0
    pub gap: f64,
    /// 价带顶 (eV)
    pub vbm: f64,
    /// 导带底 (eV)
    pub cbm: f64,
    /// 价带顶所在 k 点索引
    pub vbm_kindex: usize,
    /// 导带底所在 k 点索引
    pub cbm_kindex: usize,
    /// 是否为直接带隙
    pub direct: bool,
}

impl BandGap {
    /// 是否为金属（带隙为零）
    pub fn is_metallic(&self) -> bool {
        self.gap <= 0.0
    }
}

/// 功函数分析结果
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorkFunction {
    /// 真空能级 (eV)
    pub vacuum_level: f64,
    /// 费米能 (eV)
    pub fermi_energy: f64,
    /// 功函数 (eV)
    pub work_function: f64,
}
