//! # 体积数据模型
//!
//! LOCPOT（静电势）与 CHGCAR（电荷密度）共用的三维标量场表示。
//!
//! 数组按 `[ix, iy, iz]` 索引；文件中 x 变化最快。
//!
//! ## 依赖关系
//! - 被 `parsers/volumetric.rs`, `analysis/workfunction.rs` 使用
//! - 使用 `models/structure.rs`
//! - 使用 `ndarray`

use super::Structure;
use crate::error::VaspError;

use ndarray::{Array1, Array2, Array3, Axis};
use serde::{Deserialize, Serialize};

/// 网格方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridAxis {
    X,
    Y,
    Z,
}

impl GridAxis {
    pub fn index(&self) -> usize {
        match self {
            GridAxis::X => 0,
            GridAxis::Y => 1,
            GridAxis::Z => 2,
        }
    }
}

impl TryFrom<usize> for GridAxis {
    type Error = VaspError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(GridAxis::X),
            1 => Ok(GridAxis::Y),
            2 => Ok(GridAxis::Z),
            _ => Err(VaspError::InvalidArgument(format!(
                "axis index must be 0, 1 or 2, got {}",
                value
            ))),
        }
    }
}

impl std::fmt::Display for GridAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GridAxis::X => write!(f, "x"),
            GridAxis::Y => write!(f, "y"),
            GridAxis::Z => write!(f, "z"),
        }
    }
}

/// 体积数据种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GridKind {
    /// 静电势 (eV)，原样存储
    Potential,
    /// 电荷密度：文件存储 电荷 x 体积，解码后除以晶胞体积
    ChargeDensity,
}

impl GridKind {
    /// 是否需要按晶胞体积归一化
    pub fn is_volume_normalized(&self) -> bool {
        matches!(self, GridKind::ChargeDensity)
    }
}

/// 三维标量场
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumetricGrid {
    pub kind: GridKind,
    /// 结构前导部分（晶格已乘缩放因子）
    pub structure: Structure,
    /// 网格维度 (nx, ny, nz)
    pub dims: [usize; 3],
    /// 标量场，形状等于 `dims`
    pub data: Array3<f64>,
}

/// 平面平均曲线
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanarAverage {
    pub axis: GridAxis,
    /// 沿该方向的晶格向量长度 (Å)
    pub length: f64,
    /// 采样位置：[0, length) 上等距，不含端点
    pub positions: Array1<f64>,
    /// 平均值
    pub values: Array1<f64>,
}

impl VolumetricGrid {
    pub fn nx(&self) -> usize {
        self.dims[0]
    }

    pub fn ny(&self) -> usize {
        self.dims[1]
    }

    pub fn nz(&self) -> usize {
        self.dims[2]
    }

    /// 网格点总数
    pub fn len(&self) -> usize {
        self.dims.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 沿 `axis` 的平面平均：对另外两个方向求平均
    pub fn planar_average(&self, axis: GridAxis) -> PlanarAverage {
        let a = axis.index();
        let n = self.dims[a];

        let values: Array1<f64> = (0..n)
            .map(|i| self.data.index_axis(Axis(a), i).mean().unwrap_or(0.0))
            .collect();

        let length = self.structure.lattice.vector_length(a);
        let positions: Array1<f64> = (0..n).map(|i| length * i as f64 / n as f64).collect();

        PlanarAverage {
            axis,
            length,
            positions,
            values,
        }
    }

    /// 垂直于 `axis`、位于分数坐标 `fraction` 处的二维切片
    pub fn slice(&self, axis: GridAxis, fraction: f64) -> Array2<f64> {
        let a = axis.index();
        let n = self.dims[a] as i64;
        let idx = ((fraction * n as f64).floor() as i64).rem_euclid(n.max(1)) as usize;
        self.data.index_axis(Axis(a), idx).to_owned()
    }

    /// 场的最小值与最大值
    pub fn value_range(&self) -> Option<(f64, f64)> {
        let mut iter = self.data.iter().copied();
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }
}
