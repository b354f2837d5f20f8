//! # 解码配置
//!
//! 显式传入每次解码调用的配置值：各产物的文件名、占据阈值、默认平面平均方向。
//! 不存在全局单例，不同目录/产物的解码可以安全地并行执行。
//!
//! ## 配置文件格式 (YAML)
//! ```text
//! files:
//!   outcar: OUTCAR.relax
//!   vasprun: vasprun-final.xml
//! occupation_threshold: 0.5
//! planar_axis: z
//! ```
//! 缺省的键回退到默认值。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` (CalculationDir)、`commands/` 使用
//! - 使用 `models/grid.rs` 的 GridAxis
//! - 使用 `serde_yaml` 读取配置文件

use crate::error::{Result, VaspError};
use crate::models::GridAxis;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// VASP 输出产物种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Artifact {
    Outcar,
    Oszicar,
    Eigenval,
    Procar,
    Doscar,
    Locpot,
    Chgcar,
    Vasprun,
}

impl Artifact {
    /// VASP 写出的默认文件名
    pub fn default_file_name(&self) -> &'static str {
        match self {
            Artifact::Outcar => "OUTCAR",
            Artifact::Oszicar => "OSZICAR",
            Artifact::Eigenval => "EIGENVAL",
            Artifact::Procar => "PROCAR",
            Artifact::Doscar => "DOSCAR",
            Artifact::Locpot => "LOCPOT",
            Artifact::Chgcar => "CHGCAR",
            Artifact::Vasprun => "vasprun.xml",
        }
    }
}

impl std::fmt::Display for Artifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.default_file_name())
    }
}

/// 各产物的文件名
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileNames {
    pub outcar: String,
    pub oszicar: String,
    pub eigenval: String,
    pub procar: String,
    pub doscar: String,
    pub locpot: String,
    pub chgcar: String,
    pub vasprun: String,
}

impl Default for FileNames {
    fn default() -> Self {
        FileNames {
            outcar: Artifact::Outcar.default_file_name().to_string(),
            oszicar: Artifact::Oszicar.default_file_name().to_string(),
            eigenval: Artifact::Eigenval.default_file_name().to_string(),
            procar: Artifact::Procar.default_file_name().to_string(),
            doscar: Artifact::Doscar.default_file_name().to_string(),
            locpot: Artifact::Locpot.default_file_name().to_string(),
            chgcar: Artifact::Chgcar.default_file_name().to_string(),
            vasprun: Artifact::Vasprun.default_file_name().to_string(),
        }
    }
}

/// 解码配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeConfig {
    /// 各产物文件名
    pub files: FileNames,

    /// 占据数大于该值的能带视为占据态
    pub occupation_threshold: f64,

    /// 平面平均的默认方向
    pub planar_axis: GridAxis,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        DecodeConfig {
            files: FileNames::default(),
            occupation_threshold: 0.5,
            planar_axis: GridAxis::Z,
        }
    }
}

impl DecodeConfig {
    /// 从 YAML 文件读取配置
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| VaspError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_yaml_str(&content, &path.display().to_string())
    }

    /// 从 YAML 字符串读取配置
    pub fn from_yaml_str(content: &str, origin: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: DecodeConfig =
            serde_yaml::from_str(content).map_err(|e| VaspError::Config {
                path: origin.to_string(),
                reason: e.to_string(),
            })?;

        if !(0.0..=2.0).contains(&config.occupation_threshold) {
            return Err(VaspError::Config {
                path: origin.to_string(),
                reason: format!(
                    "occupation_threshold must lie in [0, 2], got {}",
                    config.occupation_threshold
                ),
            });
        }
        Ok(config)
    }

    /// 产物的配置文件名
    pub fn file_name(&self, artifact: Artifact) -> &str {
        let f = &self.files;
        match artifact {
            Artifact::Outcar => &f.outcar,
            Artifact::Oszicar => &f.oszicar,
            Artifact::Eigenval => &f.eigenval,
            Artifact::Procar => &f.procar,
            Artifact::Doscar => &f.doscar,
            Artifact::Locpot => &f.locpot,
            Artifact::Chgcar => &f.chgcar,
            Artifact::Vasprun => &f.vasprun,
        }
    }

    /// 覆盖产物文件名；绝对路径会替代计算目录
    pub fn set_file_name(&mut self, artifact: Artifact, name: impl Into<String>) {
        let f = &mut self.files;
        let slot = match artifact {
            Artifact::Outcar => &mut f.outcar,
            Artifact::Oszicar => &mut f.oszicar,
            Artifact::Eigenval => &mut f.eigenval,
            Artifact::Procar => &mut f.procar,
            Artifact::Doscar => &mut f.doscar,
            Artifact::Locpot => &mut f.locpot,
            Artifact::Chgcar => &mut f.chgcar,
            Artifact::Vasprun => &mut f.vasprun,
        };
        *slot = name.into();
    }

    /// 解析产物路径：显式路径优先，否则为 `dir/<文件名>`
    pub fn resolve(&self, dir: &Path, artifact: Artifact, explicit: Option<&Path>) -> PathBuf {
        match explicit {
            Some(p) => p.to_path_buf(),
            None => dir.join(self.file_name(artifact)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DecodeConfig::default();
        assert_eq!(config.file_name(Artifact::Outcar), "OUTCAR");
        assert_eq!(config.file_name(Artifact::Vasprun), "vasprun.xml");
        assert_eq!(config.occupation_threshold, 0.5);
        assert_eq!(config.planar_axis, GridAxis::Z);
    }

    #[test]
    fn test_partial_yaml_falls_back_to_defaults() {
        let yaml = "files:\n  outcar: OUTCAR.relax\nplanar_axis: x\n";
        let config = DecodeConfig::from_yaml_str(yaml, "test.yaml").unwrap();
        assert_eq!(config.file_name(Artifact::Outcar), "OUTCAR.relax");
        assert_eq!(config.file_name(Artifact::Doscar), "DOSCAR");
        assert_eq!(config.planar_axis, GridAxis::X);
        assert_eq!(config.occupation_threshold, 0.5);
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let err = DecodeConfig::from_yaml_str("occupation_threshold: 5.0\n", "bad.yaml");
        assert!(matches!(err, Err(VaspError::Config { .. })));
    }

    #[test]
    fn test_resolve_prefers_explicit_path() {
        let config = DecodeConfig::default();
        let dir = Path::new("/calc");
        assert_eq!(
            config.resolve(dir, Artifact::Locpot, None),
            PathBuf::from("/calc/LOCPOT")
        );
        assert_eq!(
            config.resolve(dir, Artifact::Locpot, Some(Path::new("/other/LOCPOT.vac"))),
            PathBuf::from("/other/LOCPOT.vac")
        );
    }

    #[test]
    fn test_set_file_name() {
        let mut config = DecodeConfig::default();
        config.set_file_name(Artifact::Chgcar, "CHGCAR.sum");
        assert_eq!(
            config.resolve(Path::new("/calc"), Artifact::Chgcar, None),
            PathBuf::from("/calc/CHGCAR.sum")
        );
        config.set_file_name(Artifact::Chgcar, "/tmp/AECCAR0");
        assert_eq!(
            config.resolve(Path::new("/calc"), Artifact::Chgcar, None),
            PathBuf::from("/tmp/AECCAR0")
        );
    }
}
