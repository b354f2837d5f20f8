//! # 数据模型模块
//!
//! 定义各解码器返回的不可变记录。所有记录在每次解码时新建，不跨调用缓存。
//!
//! ## 依赖关系
//! - 被 `parsers/`, `analysis/` 和 `commands/` 使用
//! - 子模块: structure, calculation, steps, electronic, grid, diagnostic

pub mod calculation;
pub mod diagnostic;
pub mod electronic;
pub mod grid;
pub mod steps;
pub mod structure;

pub use calculation::{
    AtomForce, DielectricTensor, ElasticTensor, ForceRecord, ForceSummary, OutcarResult,
    ScalarKey, ScalarResult, StressTensor,
};
pub use diagnostic::{Diagnostic, Diagnostics};
pub use electronic::{BandGap, BandStructure, DosRecord, ProjectedBandStructure, WorkFunction};
pub use grid::{GridAxis, GridKind, PlanarAverage, VolumetricGrid};
pub use steps::{ElectronicStep, IonicStep, StepHistory};
pub use structure::{Lattice, Structure};
