//! # parse 子命令 CLI 定义
//!
//! 选择要解码的产物或派生量，以及派生量的附加参数。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/parse.rs`

use vaspout::config::Artifact;
use vaspout::models::GridAxis;

use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// 解码目标
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ParseTarget {
    /// Final energies, Fermi level and magnetisation from OUTCAR
    Energy,
    /// Final force table and per-step force history from OUTCAR
    Forces,
    /// Band gap derived from EIGENVAL
    Gap,
    /// Convergence flags, scalars and tensors from OUTCAR
    Summary,
    /// Ionic and electronic step history from OSZICAR
    Steps,
    /// Band structure from EIGENVAL
    Bands,
    /// Orbital-projected bands from PROCAR
    Procar,
    /// Density of states from DOSCAR
    Dos,
    /// Work function from the LOCPOT planar average
    Workfunction,
    /// Electrostatic potential grid from LOCPOT
    Potential,
    /// Charge density grid from CHGCAR
    Charge,
    /// Parameters, final energies and structure from vasprun.xml
    Vasprun,
}

impl ParseTarget {
    /// 目标读取的主要产物
    pub fn artifact(&self) -> Artifact {
        match self {
            ParseTarget::Energy | ParseTarget::Forces | ParseTarget::Summary => Artifact::Outcar,
            ParseTarget::Steps => Artifact::Oszicar,
            ParseTarget::Gap | ParseTarget::Bands => Artifact::Eigenval,
            ParseTarget::Procar => Artifact::Procar,
            ParseTarget::Dos => Artifact::Doscar,
            ParseTarget::Workfunction | ParseTarget::Potential => Artifact::Locpot,
            ParseTarget::Charge => Artifact::Chgcar,
            ParseTarget::Vasprun => Artifact::Vasprun,
        }
    }
}

impl std::fmt::Display for ParseTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseTarget::Energy => write!(f, "energy"),
            ParseTarget::Forces => write!(f, "forces"),
            ParseTarget::Gap => write!(f, "gap"),
            ParseTarget::Summary => write!(f, "summary"),
            ParseTarget::Steps => write!(f, "steps"),
            ParseTarget::Bands => write!(f, "bands"),
            ParseTarget::Procar => write!(f, "procar"),
            ParseTarget::Dos => write!(f, "dos"),
            ParseTarget::Workfunction => write!(f, "workfunction"),
            ParseTarget::Potential => write!(f, "potential"),
            ParseTarget::Charge => write!(f, "charge"),
            ParseTarget::Vasprun => write!(f, "vasprun"),
        }
    }
}

/// 平面平均方向
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum AxisArg {
    X,
    Y,
    Z,
}

impl From<AxisArg> for GridAxis {
    fn from(axis: AxisArg) -> Self {
        match axis {
            AxisArg::X => GridAxis::X,
            AxisArg::Y => GridAxis::Y,
            AxisArg::Z => GridAxis::Z,
        }
    }
}

/// parse 子命令参数
#[derive(Args, Debug)]
pub struct ParseArgs {
    /// What to decode
    #[arg(value_enum)]
    pub target: ParseTarget,

    /// Read the target's artifact from this file instead of the calculation directory
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Averaging axis for workfunction/potential/charge (default: from config)
    #[arg(long, value_enum)]
    pub axis: Option<AxisArg>,

    /// Fermi energy in eV for workfunction (default: E-fermi from OUTCAR, else 0)
    #[arg(long, allow_hyphen_values = true)]
    pub fermi: Option<f64>,

    /// Maximum number of table rows to print
    #[arg(long, default_value_t = 20)]
    pub rows: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_artifacts() {
        assert_eq!(ParseTarget::Gap.artifact(), Artifact::Eigenval);
        assert_eq!(ParseTarget::Workfunction.artifact(), Artifact::Locpot);
        assert_eq!(ParseTarget::Summary.artifact(), Artifact::Outcar);
        assert_eq!(ParseTarget::Steps.to_string(), "steps");
    }

    #[test]
    fn test_axis_conversion() {
        assert_eq!(GridAxis::from(AxisArg::X), GridAxis::X);
        assert_eq!(GridAxis::from(AxisArg::Z), GridAxis::Z);
    }
}
