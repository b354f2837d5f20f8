//! # 晶体结构数据模型
//!
//! 体积数据文件 (LOCPOT/CHGCAR) 与 vasprun.xml 共用的晶格与结构表示。
//!
//! ## 依赖关系
//! - 被 `parsers/poscar.rs`, `parsers/volumetric.rs`, `parsers/vasprun.rs` 使用
//! - 被 `models/grid.rs` 使用
//! - 无外部模块依赖

use serde::{Deserialize, Serialize};

/// 晶格表示
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lattice {
    /// 晶格向量矩阵 (3x3)，行向量表示 a, b, c（已乘缩放因子，单位 Å）
    pub matrix: [[f64; 3]; 3],
}

impl Lattice {
    /// 从晶格向量矩阵创建
    pub fn from_vectors(matrix: [[f64; 3]; 3]) -> Self {
        Lattice { matrix }
    }

    /// 行列式（有符号体积）
    pub fn determinant(&self) -> f64 {
        let a = self.matrix[0];
        let b = self.matrix[1];
        let c = self.matrix[2];

        a[0] * (b[1] * c[2] - b[2] * c[1]) - a[1] * (b[0] * c[2] - b[2] * c[0])
            + a[2] * (b[0] * c[1] - b[1] * c[0])
    }

    /// 晶胞体积（行列式绝对值）
    pub fn volume(&self) -> f64 {
        self.determinant().abs()
    }

    /// 第 `index` 个晶格向量的长度
    pub fn vector_length(&self, index: usize) -> f64 {
        let v = self.matrix[index];
        (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
    }

    /// 所有向量乘以同一因子
    pub fn scaled(&self, factor: f64) -> Self {
        let mut matrix = self.matrix;
        for row in matrix.iter_mut() {
            for x in row.iter_mut() {
                *x *= factor;
            }
        }
        Lattice { matrix }
    }
}

/// POSCAR 形式的结构前导部分
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    /// 注释行
    pub comment: String,

    /// 晶格
    pub lattice: Lattice,

    /// 元素符号（VASP 4 格式文件中为空）
    pub species: Vec<String>,

    /// 每种元素的原子数
    pub counts: Vec<usize>,

    /// 原子坐标（与文件中的坐标类型一致）
    pub positions: Vec<[f64; 3]>,

    /// 坐标是否为笛卡尔坐标
    pub cartesian: bool,
}

impl Structure {
    /// 原子总数
    pub fn num_atoms(&self) -> usize {
        self.counts.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lattice_volume_cubic() {
        let lattice = Lattice::from_vectors([[5.0, 0.0, 0.0], [0.0, 5.0, 0.0], [0.0, 0.0, 5.0]]);
        assert!((lattice.volume() - 125.0).abs() < 1e-9);
    }

    #[test]
    fn test_left_handed_volume_is_positive() {
        let lattice = Lattice::from_vectors([[0.0, 2.0, 0.0], [2.0, 0.0, 0.0], [0.0, 0.0, 2.0]]);
        assert!(lattice.determinant() < 0.0);
        assert!((lattice.volume() - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_vector_length_and_scaling() {
        let lattice = Lattice::from_vectors([[3.0, 4.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 10.0]]);
        assert!((lattice.vector_length(0) - 5.0).abs() < 1e-9);
        let doubled = lattice.scaled(2.0);
        assert!((doubled.vector_length(2) - 20.0).abs() < 1e-9);
    }
}
