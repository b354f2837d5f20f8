//! # vaspout - VASP 输出产物结构化解码
//!
//! 将 VASP 写出的定长文本（以及 vasprun.xml）解码为带类型的数值记录，
//! 并在记录之上计算带隙、功函数等派生量。
//!
//! ## 支持的产物
//! - `OUTCAR` - 能量、费米能、磁矩、受力、应力/弹性/介电张量、收敛标志
//! - `OSZICAR` - 离子步与电子步迭代历史
//! - `EIGENVAL` - 能带
//! - `PROCAR` - 轨道投影能带
//! - `DOSCAR` - 总态密度与分原子投影态密度
//! - `LOCPOT` / `CHGCAR` - 三维静电势 / 电荷密度网格
//! - `vasprun.xml` - 参数、最终能量与最终结构
//!
//! ## 错误处理约定
//! - 产物缺失：`VaspError::ArtifactNotFound`，调用方可降级处理
//! - 单个字段无法解析：跳过并记录 `Diagnostic`
//! - 声明数目与内容不符：`VaspError::MalformedStructure`
//!
//! ## 依赖关系
//! ```text
//! lib.rs
//!   ├── parsers/    (各产物解码器, CalculationDir)
//!   │     ├── models/    (数据模型)
//!   │     └── config.rs  (文件名与阈值)
//!   ├── analysis/   (带隙、功函数)
//!   └── error.rs    (错误处理)
//! ```

pub mod analysis;
pub mod config;
pub mod error;
pub mod models;
pub mod parsers;

pub use config::{Artifact, DecodeConfig};
pub use error::{Result, VaspError};
pub use parsers::CalculationDir;
