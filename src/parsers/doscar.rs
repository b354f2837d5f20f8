//! # VASP DOSCAR 解析器
//!
//! ## DOSCAR 格式说明
//! ```text
//!    2    2    1    0            # 原子数 ...
//!   ...                          # 第 2-5 行
//!     5.000   -5.000   301   0.500   1.000    # Emax Emin NEDOS Efermi 权重
//!   -5.000   0.000   0.000       # 总态密度：能量 + 各列，共 NEDOS 行
//!   ...
//!     5.000   -5.000   301   0.500   1.000    # 每个原子一个子头部
//!   -5.000   0.000 ...           # 投影态密度 NEDOS 行
//! ```
//!
//! 列数随自旋与 LORBIT 设置变化，按行宽推断；同一块内行宽必须一致。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` (CalculationDir)、`commands/` 使用
//! - 使用 `models/electronic.rs`, `parsers/cursor.rs`

use super::cursor::LineCursor;
use super::read_artifact;
use crate::config::Artifact;
use crate::error::Result;
use crate::models::DosRecord;

use log::debug;
use ndarray::{Array1, Array2};
use std::collections::BTreeMap;
use std::path::Path;

/// 解析 VASP DOSCAR 文件
pub fn parse_doscar(path: &Path) -> Result<DosRecord> {
    let content = read_artifact(path, Artifact::Doscar)?;
    parse_doscar_content(&content, &path.display().to_string())
}

/// 从字符串内容解析 DOSCAR
pub fn parse_doscar_content(content: &str, source: &str) -> Result<DosRecord> {
    let mut cur = LineCursor::new("DOSCAR", content, source);

    let first = cur.next_line("header")?;
    let natoms = cur.numbers::<usize>(first, 1, "atom count")?[0];

    for _ in 0..4 {
        cur.next_line("header")?;
    }

    let header = cur.next_line("energy window")?;
    let window: Vec<f64> = cur.numbers(header, 4, "Emax, Emin, NEDOS and Efermi")?;
    let (emax, emin, efermi) = (window[0], window[1], window[3]);
    let nedos_token = header.split_whitespace().nth(2).unwrap_or_default();
    let nedos: usize = cur.number(nedos_token, "NEDOS")?;

    let (energies, total) = read_block(&mut cur, nedos, "total DOS")?;

    let pdos = if cur.rest_is_blank() {
        None
    } else {
        let mut map = BTreeMap::new();
        for atom in 0..natoms {
            cur.next_nonblank("projected DOS header")?;
            let (_, block) = read_block(&mut cur, nedos, "projected DOS")?;
            map.insert(atom, block);
        }
        Some(map)
    };

    debug!(
        "{}: NEDOS = {}, {} total DOS columns, projected DOS: {}",
        source,
        nedos,
        total.ncols(),
        pdos.as_ref().map_or(0, |m| m.len())
    );

    Ok(DosRecord {
        efermi,
        emin,
        emax,
        nedos,
        natoms,
        energies: Array1::from_vec(energies),
        total,
        pdos,
    })
}

/// 读取 NEDOS 行：第一列为能量，其余列组成数组
fn read_block(cur: &mut LineCursor, nedos: usize, what: &str) -> Result<(Vec<f64>, Array2<f64>)> {
    let mut energies = Vec::with_capacity(nedos);
    let mut values = Vec::new();
    let mut width: Option<usize> = None;

    for _ in 0..nedos {
        let line = cur.next_line(what)?;
        let ncols = line.split_whitespace().count();
        match width {
            None if ncols < 2 => {
                return Err(cur.error(format!(
                    "line {}: {} row needs an energy and at least one value",
                    cur.lineno(),
                    what
                )))
            }
            None => width = Some(ncols),
            Some(w) if w != ncols => {
                return Err(cur.error(format!(
                    "line {}: {} row has {} columns, expected {}",
                    cur.lineno(),
                    what,
                    ncols,
                    w
                )))
            }
            Some(_) => {}
        }

        let row: Vec<f64> = cur.numbers(line, ncols, what)?;
        energies.push(row[0]);
        values.extend_from_slice(&row[1..]);
    }

    let ncols = width.map_or(0, |w| w - 1);
    let block = Array2::from_shape_vec((nedos, ncols), values)
        .map_err(|e| cur.error(format!("{}: {}", what, e)))?;
    Ok((energies, block))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VaspError;

    const HEADER: &str = "   2    2    1    0
  0.1641288E+02  0.3866000E-09  0.3866000E-09  0.5475000E-09  0.5000000E-15
  1.000000000000000E-004
  CAR
 Si
      5.00000000     -5.00000000      3      0.50000000      1.00000000
";

    const TOTAL: &str = "    -5.000  0.1000  0.1000
     0.000  0.5000  1.0000
     5.000  0.2000  2.0000
";

    #[test]
    fn test_total_only_has_no_pdos() {
        let content = format!("{}{}", HEADER, TOTAL);
        let dos = parse_doscar_content(&content, "DOSCAR").unwrap();
        assert_eq!(dos.emax, 5.0);
        assert_eq!(dos.emin, -5.0);
        assert_eq!(dos.nedos, 3);
        assert_eq!(dos.efermi, 0.5);
        assert_eq!(dos.energies.len(), 3);
        assert_eq!(dos.total.shape(), &[3, 2]);
        assert_eq!(dos.total[[1, 0]], 0.5);
        assert!(dos.pdos.is_none());
        assert!(!dos.is_spin_polarized());
        assert_eq!(dos.shifted_energies()[0], -5.5);
    }

    #[test]
    fn test_per_atom_projected_blocks() {
        let atom_block = "      5.00000000     -5.00000000      3      0.50000000      1.00000000
    -5.000  0.010  0.020  0.030
     0.000  0.040  0.050  0.060
     5.000  0.070  0.080  0.090
";
        let content = format!("{}{}{}{}", HEADER, TOTAL, atom_block, atom_block);
        let dos = parse_doscar_content(&content, "DOSCAR").unwrap();
        let pdos = dos.pdos.as_ref().unwrap();
        assert_eq!(pdos.len(), 2);
        assert_eq!(pdos[&1].shape(), &[3, 3]);
        assert_eq!(dos.atom_pdos(0).unwrap()[[2, 1]], 0.08);
        assert!(dos.atom_pdos(2).is_none());
    }

    #[test]
    fn test_spin_polarized_total() {
        let total = "    -5.000  0.1  0.2  0.1  0.2
     0.000  0.5  0.4  1.0  0.9
     5.000  0.2  0.1  2.0  1.8
";
        let content = format!("{}{}", HEADER, total);
        let dos = parse_doscar_content(&content, "DOSCAR").unwrap();
        assert!(dos.is_spin_polarized());
        assert_eq!(dos.total.ncols(), 4);
    }

    #[test]
    fn test_truncated_total_block_is_structural() {
        let content = format!("{}{}", HEADER, "    -5.000  0.1000  0.1000\n");
        let err = parse_doscar_content(&content, "DOSCAR").unwrap_err();
        assert!(matches!(err, VaspError::MalformedStructure { .. }));
    }

    #[test]
    fn test_truncated_projected_block_is_structural() {
        let content = format!("{}{}{}", HEADER, TOTAL, "   5.0 -5.0 3 0.5 1.0\n  -5.0 0.1\n");
        assert!(parse_doscar_content(&content, "DOSCAR").is_err());
    }
}
