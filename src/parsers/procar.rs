//! # VASP PROCAR 解析器
//!
//! 解析轨道投影能带。
//!
//! ## PROCAR 格式说明
//! ```text
//! PROCAR lm decomposed
//! # of k-points:    2         # of bands:   4         # of ions:   2
//!
//!  k-point     1 :    0.00000000 0.00000000 0.00000000     weight = 0.25000000
//!
//! band     1 # energy   -5.81200000 # occ.  1.00000000
//!
//! ion      s     py     pz     px    dxy    dyz    dz2    dxz  x2-y2    tot
//!     1  0.100  0.000  0.000  0.000  0.000  0.000  0.000  0.000  0.000  0.100
//!     2  0.200  0.000  0.000  0.000  0.000  0.000  0.000  0.000  0.000  0.200
//! tot    0.300  0.000  0.000  0.000  0.000  0.000  0.000  0.000  0.000  0.300
//! ```
//!
//! - 第一个 `ion` 行给出轨道名称，末尾的 `tot` 列被丢弃
//! - 原子序号从 1 开始，存储时转换为从 0 开始；超出头部原子数的行被忽略
//! - 每行投影值按轨道数截断或补零
//! - 自旋极化文件只读取前 `# of k-points` 个 k 点块
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` (CalculationDir)、`commands/` 使用
//! - 使用 `models/electronic.rs`

use super::read_artifact;
use crate::config::Artifact;
use crate::error::{Result, VaspError};
use crate::models::{Diagnostics, ProjectedBandStructure};

use lazy_static::lazy_static;
use log::debug;
use ndarray::{Array2, Array3, Array4};
use regex::Regex;
use std::path::Path;

lazy_static! {
    static ref HEADER_RE: Regex =
        Regex::new(r"# of k-points:\s*(\d+)\s*# of bands:\s*(\d+)\s*# of ions:\s*(\d+)").unwrap();
    static ref KPOINT_RE: Regex = Regex::new(r"^\s*k-point\s+\d+\s*:").unwrap();
    // 负号可能与前一个坐标相连: "0.50000000-0.50000000"
    static ref COORD_RE: Regex = Regex::new(r"-?\d*\.\d+(?:[Ee][-+]?\d+)?").unwrap();
    static ref BAND_RE: Regex = Regex::new(r"^\s*band\s+\d+").unwrap();
    static ref ENERGY_RE: Regex = Regex::new(r"energy\s+(\S+)").unwrap();
    static ref OCC_RE: Regex = Regex::new(r"occ\.\s+(\S+)").unwrap();
    static ref ION_ROW_RE: Regex = Regex::new(r"^\s*(\d+)\s+(.*)$").unwrap();
}

/// 解析 VASP PROCAR 文件
pub fn parse_procar(path: &Path) -> Result<ProjectedBandStructure> {
    let content = read_artifact(path, Artifact::Procar)?;
    parse_procar_content(&content, &path.display().to_string())
}

/// 从字符串内容解析 PROCAR
pub fn parse_procar_content(content: &str, source: &str) -> Result<ProjectedBandStructure> {
    let caps = HEADER_RE
        .captures(content)
        .ok_or_else(|| VaspError::malformed("PROCAR", source, "missing k-point/band/ion header"))?;
    let count = |i: usize| -> Result<usize> {
        caps[i]
            .parse()
            .map_err(|_| VaspError::malformed("PROCAR", source, format!("invalid count '{}'", &caps[i])))
    };
    let nkpts = count(1)?;
    let nbands = count(2)?;
    let natoms = count(3)?;

    let orbitals = orbital_names(content);
    let norb = orbitals.len();

    let mut diags = Diagnostics::new(source);
    let mut kpoints = Array2::zeros((nkpts, 3));
    let mut eigenvalues = Array3::zeros((nkpts, nbands, 2));
    let mut projections = Array4::zeros((nkpts, nbands, natoms, norb));

    let mut bands_seen = vec![0usize; nkpts];
    let mut kpts_seen = 0;
    let mut ik: Option<usize> = None;
    let mut ib: Option<usize> = None;

    for (idx, line) in content.lines().enumerate() {
        let lineno = idx + 1;

        if let Some(m) = KPOINT_RE.find(line) {
            if kpts_seen == nkpts {
                break;
            }
            let k = kpts_seen;
            kpts_seen += 1;
            ik = Some(k);
            ib = None;

            let coords: Vec<&str> = COORD_RE
                .find_iter(&line[m.end()..])
                .take(3)
                .map(|c| c.as_str())
                .collect();
            if coords.len() < 3 {
                diags.skip(lineno, "kpoint", line.trim());
            }
            for (j, c) in coords.iter().enumerate() {
                if let Some(v) = diags.parse_f64(lineno, "kpoint", c) {
                    kpoints[[k, j]] = v;
                }
            }
            continue;
        }

        let k = match ik {
            Some(k) => k,
            None => continue,
        };

        if BAND_RE.is_match(line) {
            if bands_seen[k] == nbands {
                ib = None;
                continue;
            }
            let b = bands_seen[k];
            bands_seen[k] += 1;
            ib = Some(b);

            if let Some(c) = ENERGY_RE.captures(line) {
                if let Some(v) = diags.parse_f64(lineno, "energy", &c[1]) {
                    eigenvalues[[k, b, 0]] = v;
                }
            }
            if let Some(c) = OCC_RE.captures(line) {
                if let Some(v) = diags.parse_f64(lineno, "occupation", &c[1]) {
                    eigenvalues[[k, b, 1]] = v;
                }
            }
            continue;
        }

        let b = match ib {
            Some(b) => b,
            None => continue,
        };

        if let Some(c) = ION_ROW_RE.captures(line) {
            let atom = match c[1].parse::<usize>() {
                Ok(n) if n >= 1 && n <= natoms => n - 1,
                _ => continue,
            };
            for (o, token) in c[2].split_whitespace().take(norb).enumerate() {
                if let Some(v) = diags.parse_f64(lineno, "projection", token) {
                    projections[[k, b, atom, o]] = v;
                }
            }
        }
    }

    if kpts_seen < nkpts {
        return Err(VaspError::malformed(
            "PROCAR",
            source,
            format!("header declares {} k-points, found {}", nkpts, kpts_seen),
        ));
    }
    if let Some((k, seen)) = bands_seen.iter().enumerate().find(|(_, n)| **n < nbands) {
        return Err(VaspError::malformed(
            "PROCAR",
            source,
            format!(
                "k-point {} has {} bands, header declares {}",
                k + 1,
                seen,
                nbands
            ),
        ));
    }

    debug!(
        "{}: {} k-points, {} bands, {} ions, orbitals {:?}",
        source, nkpts, nbands, natoms, orbitals
    );

    Ok(ProjectedBandStructure {
        kpoints,
        eigenvalues,
        projections,
        orbitals,
        diagnostics: diags.into_vec(),
    })
}

/// 第一个 `ion` 行的轨道名称（去掉末尾的 `tot`）
fn orbital_names(content: &str) -> Vec<String> {
    let mut names: Vec<String> = content
        .lines()
        .map(|l| l.split_whitespace().collect::<Vec<_>>())
        .find(|t| t.first() == Some(&"ion"))
        .map(|t| t[1..].iter().map(|s| s.to_string()).collect())
        .unwrap_or_default();
    if names.last().map(|s| s.as_str()) == Some("tot") {
        names.pop();
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROCAR: &str = r#"PROCAR lm decomposed
# of k-points:    2         # of bands:   2         # of ions:   2

 k-point     1 :    0.00000000 0.00000000 0.00000000     weight = 0.50000000

band     1 # energy   -5.00000000 # occ.  1.00000000

ion      s      p      d    tot
    1  0.100  0.200  0.000  0.300
    2  0.300  0.000  0.100  0.400
tot    0.400  0.200  0.100  0.700

band     2 # energy    3.00000000 # occ.  0.00000000

ion      s      p      d    tot
    1  0.000  0.500  0.000  0.500
    2  0.000  0.100  0.200  0.300
tot    0.000  0.600  0.200  0.800

 k-point     2 :    0.50000000-0.50000000 0.00000000     weight = 0.50000000

band     1 # energy   -4.00000000 # occ.  1.00000000

ion      s      p      d    tot
    1  0.150  0.150  0.000  0.300
    2  0.250  0.050  0.100  0.400
tot    0.400  0.200  0.100  0.700

band     2 # energy    2.50000000 # occ.  0.00000000

ion      s      p      d    tot
    1  0.010  0.490  0.000  0.500
    2  0.000  0.100  0.200  0.300
tot    0.010  0.590  0.200  0.800
"#;

    #[test]
    fn test_shapes_and_orbitals() {
        let procar = parse_procar_content(PROCAR, "PROCAR").unwrap();
        assert_eq!(procar.orbitals, vec!["s", "p", "d"]);
        assert_eq!(procar.projections.shape(), &[2, 2, 2, 3]);
        assert_eq!(procar.eigenvalues.shape(), &[2, 2, 2]);
        assert_eq!(procar.natoms(), 2);
        assert!(procar.diagnostics.is_empty());
    }

    #[test]
    fn test_atom_index_is_zero_based() {
        let procar = parse_procar_content(PROCAR, "PROCAR").unwrap();
        // 文件中的原子 2 存放在索引 1
        assert_eq!(procar.projections[[0, 0, 1, 0]], 0.3);
        assert_eq!(procar.projections[[0, 0, 0, 1]], 0.2);
        assert_eq!(procar.projections[[1, 1, 0, 1]], 0.49);
    }

    #[test]
    fn test_energies_occupations_and_kpoints() {
        let procar = parse_procar_content(PROCAR, "PROCAR").unwrap();
        assert_eq!(procar.eigenvalues[[0, 1, 0]], 3.0);
        assert_eq!(procar.eigenvalues[[0, 0, 1]], 1.0);
        assert_eq!(procar.eigenvalues[[1, 1, 0]], 2.5);
        assert_eq!(procar.kpoints[[1, 0]], 0.5);
        assert_eq!(procar.kpoints[[1, 1]], -0.5);
    }

    #[test]
    fn test_ion_rows_beyond_declared_atoms_are_ignored() {
        let content = PROCAR.replace("# of ions:   2", "# of ions:   1");
        let procar = parse_procar_content(&content, "PROCAR").unwrap();
        assert_eq!(procar.projections.shape(), &[2, 2, 1, 3]);
        assert_eq!(procar.projections[[0, 0, 0, 0]], 0.1);
    }

    #[test]
    fn test_missing_kpoint_block_is_structural() {
        let content = PROCAR.replace("# of k-points:    2", "# of k-points:    3");
        let err = parse_procar_content(&content, "PROCAR").unwrap_err();
        assert!(matches!(err, VaspError::MalformedStructure { .. }));
        assert!(parse_procar_content("no header", "PROCAR").is_err());
    }

    #[test]
    fn test_malformed_projection_is_skipped() {
        let content = PROCAR.replacen("0.100  0.200", "0.100  x.xxx", 1);
        let procar = parse_procar_content(&content, "PROCAR").unwrap();
        assert_eq!(procar.projections[[0, 0, 0, 1]], 0.0);
        assert_eq!(procar.diagnostics.len(), 1);
        assert_eq!(procar.diagnostics[0].field, "projection");
    }
}
