//! # 解析器模块
//!
//! 每种 VASP 输出产物一个解码器，每次调用都重新读取并解析文件，不做缓存。
//!
//! | 产物 | 解码器 | 结果 |
//! |------|--------|------|
//! | OUTCAR | `outcar` | `OutcarResult` |
//! | OSZICAR | `oszicar` | `StepHistory` |
//! | EIGENVAL | `eigenval` | `BandStructure` |
//! | PROCAR | `procar` | `ProjectedBandStructure` |
//! | DOSCAR | `doscar` | `DosRecord` |
//! | LOCPOT / CHGCAR | `volumetric` | `VolumetricGrid` |
//! | vasprun.xml | `vasprun` | `VasprunResult` |
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 使用 `models/` 数据模型, `config.rs`, `analysis/`
//! - 子模块: outcar, oszicar, eigenval, procar, doscar, poscar, volumetric, vasprun, scanner, cursor

mod cursor;
pub mod doscar;
pub mod eigenval;
pub mod oszicar;
pub mod outcar;
pub mod poscar;
pub mod procar;
pub mod scanner;
pub mod vasprun;
pub mod volumetric;

pub use vasprun::VasprunResult;

use crate::analysis;
use crate::config::{Artifact, DecodeConfig};
use crate::error::{Result, VaspError};
use crate::models::{
    BandGap, BandStructure, DosRecord, GridAxis, OutcarResult, ProjectedBandStructure,
    StepHistory, VolumetricGrid, WorkFunction,
};

use log::{debug, info};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// 读取产物文件；文件不存在时返回 `ArtifactNotFound`
pub fn read_artifact(path: &Path, artifact: Artifact) -> Result<String> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => VaspError::ArtifactNotFound {
            artifact: artifact.to_string(),
            path: path.display().to_string(),
        },
        _ => VaspError::FileReadError {
            path: path.display().to_string(),
            source: e,
        },
    })
}

/// 一个 VASP 计算目录
///
/// 按配置的文件名定位各产物，每个方法独立解码，互不共享状态。
#[derive(Debug, Clone)]
pub struct CalculationDir {
    pub dir: PathBuf,
    pub config: DecodeConfig,
}

impl CalculationDir {
    /// 打开计算目录，目录必须存在
    pub fn open(dir: impl Into<PathBuf>, config: DecodeConfig) -> Result<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(VaspError::DirectoryNotFound {
                path: dir.display().to_string(),
            });
        }
        Ok(CalculationDir { dir, config })
    }

    /// 产物在该目录下的路径
    pub fn path(&self, artifact: Artifact) -> PathBuf {
        self.config.resolve(&self.dir, artifact, None)
    }

    pub fn has(&self, artifact: Artifact) -> bool {
        self.path(artifact).is_file()
    }

    pub fn outcar(&self) -> Result<OutcarResult> {
        outcar::parse_outcar(&self.path(Artifact::Outcar))
    }

    pub fn oszicar(&self) -> Result<StepHistory> {
        oszicar::parse_oszicar(&self.path(Artifact::Oszicar))
    }

    pub fn eigenval(&self) -> Result<BandStructure> {
        eigenval::parse_eigenval(&self.path(Artifact::Eigenval))
    }

    pub fn procar(&self) -> Result<ProjectedBandStructure> {
        procar::parse_procar(&self.path(Artifact::Procar))
    }

    pub fn doscar(&self) -> Result<DosRecord> {
        doscar::parse_doscar(&self.path(Artifact::Doscar))
    }

    pub fn locpot(&self) -> Result<VolumetricGrid> {
        volumetric::parse_locpot(&self.path(Artifact::Locpot))
    }

    pub fn chgcar(&self) -> Result<VolumetricGrid> {
        volumetric::parse_chgcar(&self.path(Artifact::Chgcar))
    }

    pub fn vasprun(&self) -> Result<VasprunResult> {
        vasprun::parse_vasprun(&self.path(Artifact::Vasprun))
    }

    /// 由 EIGENVAL 计算带隙；没有占据态或空态时为 `None`
    pub fn band_gap(&self) -> Result<Option<BandGap>> {
        let bands = self.eigenval()?;
        Ok(analysis::band_gap(
            bands.eigenvalues.view(),
            self.config.occupation_threshold,
        ))
    }

    /// 由 LOCPOT 平面平均计算功函数
    ///
    /// `fermi` 为 `None` 时从 OUTCAR 读取费米能；OUTCAR 缺失或无 E-fermi 时取 0.0。
    /// `axis` 为 `None` 时使用配置中的平面平均方向。
    pub fn work_function(&self, fermi: Option<f64>, axis: Option<GridAxis>) -> Result<WorkFunction> {
        let axis = axis.unwrap_or(self.config.planar_axis);
        let fermi = match fermi {
            Some(f) => f,
            None => self.fermi_from_outcar()?,
        };

        let grid = self.locpot()?;
        let profile = grid.planar_average(axis);
        debug!(
            "{}: planar average along {} over {} points",
            self.dir.display(),
            axis,
            profile.values.len()
        );

        analysis::work_function(&profile.values.to_vec(), fermi)
    }

    fn fermi_from_outcar(&self) -> Result<f64> {
        match self.outcar() {
            Ok(result) => Ok(result.scalars.fermi_energy().unwrap_or_else(|| {
                info!("{}: no E-fermi in OUTCAR, using 0.0", self.dir.display());
                0.0
            })),
            Err(e) if e.is_missing_artifact() => {
                info!("{}: OUTCAR not found, using Fermi energy 0.0", self.dir.display());
                Ok(0.0)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::fs;

    const LOCPOT: &str = "slab
1.0
1.0 0.0 0.0
0.0 1.0 0.0
0.0 0.0 5.0
H
1
Direct
0.0 0.0 0.0

1 1 5
1.0 2.0 5.0 2.0 1.0
";

    #[test]
    fn test_open_missing_directory() {
        let err = CalculationDir::open("/nonexistent/vaspout/calc", DecodeConfig::default());
        assert!(matches!(err, Err(VaspError::DirectoryNotFound { .. })));
    }

    #[test]
    fn test_missing_artifact_is_signalled() {
        let dir = tempfile::tempdir().unwrap();
        let calc = CalculationDir::open(dir.path(), DecodeConfig::default()).unwrap();
        assert!(!calc.has(Artifact::Eigenval));
        assert!(calc.eigenval().unwrap_err().is_missing_artifact());
        assert!(calc.doscar().unwrap_err().is_missing_artifact());
        assert!(calc.band_gap().unwrap_err().is_missing_artifact());
    }

    #[test]
    fn test_configured_file_name_is_used() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("OUTCAR.relax"),
            " E-fermi :   1.2500     XC(G=0):  -6.1\n",
        )
        .unwrap();
        let mut config = DecodeConfig::default();
        config.files.outcar = "OUTCAR.relax".to_string();
        let calc = CalculationDir::open(dir.path(), config).unwrap();
        assert_eq!(calc.outcar().unwrap().scalars.fermi_energy(), Some(1.25));
    }

    #[test]
    fn test_work_function_fermi_falls_back_to_zero() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("LOCPOT"), LOCPOT).unwrap();
        let calc = CalculationDir::open(dir.path(), DecodeConfig::default()).unwrap();

        let wf = calc.work_function(None, None).unwrap();
        assert_abs_diff_eq!(wf.vacuum_level, 5.0);
        assert_abs_diff_eq!(wf.fermi_energy, 0.0);
        assert_abs_diff_eq!(wf.work_function, 5.0);

        let wf = calc.work_function(Some(3.0), Some(GridAxis::Z)).unwrap();
        assert_abs_diff_eq!(wf.work_function, 2.0);
    }

    #[test]
    fn test_work_function_reads_fermi_from_outcar() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("LOCPOT"), LOCPOT).unwrap();
        fs::write(dir.path().join("OUTCAR"), " E-fermi :   1.5000\n").unwrap();
        let calc = CalculationDir::open(dir.path(), DecodeConfig::default()).unwrap();

        let wf = calc.work_function(None, None).unwrap();
        assert_abs_diff_eq!(wf.fermi_energy, 1.5);
        assert_abs_diff_eq!(wf.work_function, 3.5);
    }
}
