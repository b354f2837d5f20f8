//! # VASP EIGENVAL 解析器
//!
//! ## EIGENVAL 格式说明
//! ```text
//!     2    2    1    1          # 原子数 原子数 块数 ISPIN
//!   ...                         # 第 2-5 行：体积、晶格常数、温度、注释
//!     8     2     4             # 电子数 k 点数 能带数
//!
//!   0.000E+00  0.000E+00  0.000E+00  0.250E+00     # k 点坐标 + 权重
//!     1   -6.1234   1.0000                         # 能带序号 能量 [占据数]
//!   ...
//! ```
//! ISPIN = 2 时每行为 `序号 能量↑ 能量↓ [占据↑ 占据↓]`。
//!
//! 严格按位置解码：任何与声明数目不符的内容都是结构错误。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` (CalculationDir)、`commands/` 使用
//! - 使用 `models/electronic.rs`, `parsers/cursor.rs`

use super::cursor::LineCursor;
use super::read_artifact;
use crate::config::Artifact;
use crate::error::Result;
use crate::models::BandStructure;

use log::debug;
use ndarray::{Array1, Array2, Array3};
use std::path::Path;

/// 解析 VASP EIGENVAL 文件
pub fn parse_eigenval(path: &Path) -> Result<BandStructure> {
    let content = read_artifact(path, Artifact::Eigenval)?;
    parse_eigenval_content(&content, &path.display().to_string())
}

/// 从字符串内容解析 EIGENVAL
pub fn parse_eigenval_content(content: &str, source: &str) -> Result<BandStructure> {
    let mut cur = LineCursor::new("EIGENVAL", content, source);

    // Line 0: ISPIN 为第 4 个记号
    let first = cur.next_line("header")?;
    let ispin: usize = match first.split_whitespace().nth(3) {
        Some(t) => cur.number(t, "ISPIN")?,
        None => 1,
    };
    let spin_polarized = ispin == 2;

    for _ in 0..4 {
        cur.next_line("header")?;
    }

    // Line 5: 电子数 k 点数 能带数
    let counts = cur.next_line("electron, k-point and band counts")?;
    let tokens: Vec<&str> = counts.split_whitespace().collect();
    if tokens.len() < 3 {
        return Err(cur.error(format!(
            "line 6 must declare electrons, k-points and bands, found '{}'",
            counts.trim()
        )));
    }
    let nelect: f64 = cur.number(tokens[0], "electron count")?;
    let nkpts: usize = cur.number(tokens[1], "k-point count")?;
    let nbands: usize = cur.number(tokens[2], "band count")?;

    let mut kpoints = Array2::zeros((nkpts, 3));
    let mut weights = Array1::zeros(nkpts);
    let mut eigenvalues = Array3::zeros((nkpts, nbands, 2));
    let mut spin_down = if spin_polarized {
        Some(Array3::zeros((nkpts, nbands, 2)))
    } else {
        None
    };

    let min_cols = if spin_polarized { 3 } else { 2 };

    for ik in 0..nkpts {
        let kline = cur.next_nonblank("k-point line")?;
        let k: Vec<f64> = cur.numbers(kline, 4, "k-point coordinates and weight")?;
        for j in 0..3 {
            kpoints[[ik, j]] = k[j];
        }
        weights[ik] = k[3];

        for ib in 0..nbands {
            let row = cur.next_line("band line")?;
            let tokens: Vec<&str> = row.split_whitespace().collect();
            if tokens.len() < min_cols {
                return Err(cur.error(format!(
                    "line {}: expected band {} of k-point {}, found '{}'",
                    cur.lineno(),
                    ib + 1,
                    ik + 1,
                    row.trim()
                )));
            }

            eigenvalues[[ik, ib, 0]] = cur.number(tokens[1], "band energy")?;

            if let Some(down) = spin_down.as_mut() {
                down[[ik, ib, 0]] = cur.number(tokens[2], "band energy")?;
                eigenvalues[[ik, ib, 1]] = optional(&cur, tokens.get(3))?;
                down[[ik, ib, 1]] = optional(&cur, tokens.get(4))?;
            } else {
                eigenvalues[[ik, ib, 1]] = optional(&cur, tokens.get(2))?;
            }
        }
    }

    if !cur.rest_is_blank() {
        return Err(cur.error(format!(
            "line {}: content beyond the declared {} k-points x {} bands",
            cur.lineno() + 1,
            nkpts,
            nbands
        )));
    }

    debug!(
        "{}: {} k-points, {} bands, ISPIN = {}",
        source, nkpts, nbands, ispin
    );

    Ok(BandStructure {
        nelect,
        kpoints,
        weights,
        eigenvalues,
        spin_down,
    })
}

/// 可省略的占据数列，缺省为 0.0
fn optional(cur: &LineCursor, token: Option<&&str>) -> Result<f64> {
    match token {
        Some(t) => cur.number(t, "occupation"),
        None => Ok(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VaspError;

    const EIGENVAL: &str = r#"    2    2    1    1
  0.1641288E+02  0.3866000E-09  0.3866000E-09  0.5475000E-09  0.5000000E-15
  1.000000000000000E-004
  CAR
 Si
     8      2      4

  0.0000000E+00  0.0000000E+00  0.0000000E+00  0.2500000E+00
    1       -5.812000   1.000000
    2        6.245000   1.000000
    3        6.245000   1.000000
    4        6.245000   1.000000

  0.5000000E+00  0.0000000E+00  0.0000000E+00  0.7500000E+00
    1       -3.400000   1.000000
    2       -0.800000   1.000000
    3        5.100000   0.000000
    4        8.900000   0.000000
"#;

    #[test]
    fn test_shape_matches_header() {
        let bands = parse_eigenval_content(EIGENVAL, "EIGENVAL").unwrap();
        assert_eq!(bands.nelect, 8.0);
        assert_eq!(bands.kpoints.nrows(), 2);
        assert_eq!(bands.eigenvalues.shape(), &[2, 4, 2]);
        assert_eq!(bands.weights[1], 0.75);
        assert_eq!(bands.kpoints[[1, 0]], 0.5);
        assert_eq!(bands.eigenvalues[[1, 2, 0]], 5.1);
        assert_eq!(bands.eigenvalues[[1, 2, 1]], 0.0);
        assert!(!bands.is_spin_polarized());
    }

    #[test]
    fn test_missing_occupation_defaults_to_zero() {
        let content = EIGENVAL.replace("   -5.812000   1.000000", "   -5.812000");
        let bands = parse_eigenval_content(&content, "EIGENVAL").unwrap();
        assert_eq!(bands.eigenvalues[[0, 0, 0]], -5.812);
        assert_eq!(bands.eigenvalues[[0, 0, 1]], 0.0);
        assert_eq!(bands.eigenvalues[[0, 1, 1]], 1.0);
    }

    #[test]
    fn test_fewer_bands_than_declared_is_structural() {
        let content = EIGENVAL.replace("     8      2      4", "     8      2      5");
        let err = parse_eigenval_content(&content, "EIGENVAL").unwrap_err();
        assert!(matches!(err, VaspError::MalformedStructure { .. }));
    }

    #[test]
    fn test_extra_kpoint_block_is_structural() {
        let content = EIGENVAL.replace("     8      2      4", "     8      1      4");
        let err = parse_eigenval_content(&content, "EIGENVAL").unwrap_err();
        assert!(matches!(err, VaspError::MalformedStructure { .. }));
        assert!(err.to_string().contains("beyond the declared 1 k-points"));
    }

    #[test]
    fn test_extra_band_line_is_structural() {
        let content = format!("{}    5       10.200000   0.000000\n", EIGENVAL);
        let err = parse_eigenval_content(&content, "EIGENVAL").unwrap_err();
        assert!(matches!(err, VaspError::MalformedStructure { .. }));
    }

    #[test]
    fn test_truncated_file_is_structural() {
        let truncated: String = EIGENVAL.lines().take(14).collect::<Vec<_>>().join("\n");
        let err = parse_eigenval_content(&truncated, "EIGENVAL").unwrap_err();
        assert!(err.to_string().contains("unexpected end of file"));
    }

    #[test]
    fn test_spin_polarized() {
        let content = r#"    1    1    1    2
  header
  header
  CAR
 Fe
     8      1      2

  0.0000000E+00  0.0000000E+00  0.0000000E+00  1.0000000E+00
    1       -1.000000   -0.900000   1.000000   1.000000
    2        2.000000    2.100000   0.000000   0.000000
"#;
        let bands = parse_eigenval_content(content, "EIGENVAL").unwrap();
        assert!(bands.is_spin_polarized());
        let down = bands.spin_down.as_ref().unwrap();
        assert_eq!(bands.eigenvalues[[0, 0, 0]], -1.0);
        assert_eq!(down[[0, 0, 0]], -0.9);
        assert_eq!(down[[0, 0, 1]], 1.0);
        assert_eq!(bands.eigenvalues[[0, 1, 1]], 0.0);
    }
}
