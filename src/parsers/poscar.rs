//! # POSCAR 结构前导解析
//!
//! LOCPOT 与 CHGCAR 以 POSCAR 格式的结构开头，之后才是网格数据。
//!
//! ## 前导结构
//! | 行 | 内容 |
//! |----|------|
//! | 0 | 注释 |
//! | 1 | 缩放因子；负数表示目标晶胞体积 |
//! | 2-4 | 晶格向量 |
//! | 5 | 元素符号（VASP 5 起，可省略） |
//! | 5/6 | 各元素原子数 |
//! | 可选 | `Selective dynamics` |
//! | 下一行 | `Direct` 或 `Cartesian` |
//! | 其后 | 每原子一行坐标 |
//!
//! 元素行是否存在靠启发式判断：先尝试把第 6 行当作整数原子数解析，失败则认为它是元素行。
//!
//! ## 依赖关系
//! - 被 `parsers/volumetric.rs` 使用
//! - 使用 `models/structure.rs`, `parsers/cursor.rs`

use super::cursor::LineCursor;
use crate::error::Result;
use crate::models::{Lattice, Structure};

/// 读取结构前导，游标停在最后一个原子坐标行之后
pub(crate) fn parse_preamble(cur: &mut LineCursor) -> Result<Structure> {
    let comment = cur.next_line("comment line")?.trim().to_string();

    let scale_line = cur.next_line("scaling factor")?;
    let scale: f64 = cur.numbers(scale_line, 1, "scaling factor")?[0];

    let mut vectors = [[0.0; 3]; 3];
    for row in vectors.iter_mut() {
        let line = cur.next_line("lattice vector")?;
        let v: Vec<f64> = cur.numbers(line, 3, "lattice vector")?;
        row.copy_from_slice(&v);
    }
    let raw = Lattice::from_vectors(vectors);

    let factor = if scale < 0.0 {
        let volume = raw.volume();
        if volume <= 0.0 {
            return Err(cur.error("negative scaling factor with a degenerate lattice"));
        }
        (scale.abs() / volume).cbrt()
    } else {
        scale
    };
    let lattice = raw.scaled(factor);

    // VASP 4 没有元素行
    let line5 = cur.next_line("species or counts")?;
    let first_token = line5.split_whitespace().next().unwrap_or_default();
    let (species, counts) = if first_token.parse::<usize>().is_ok() {
        let n = line5.split_whitespace().count();
        (Vec::new(), cur.numbers::<usize>(line5, n, "atom counts")?)
    } else {
        let species: Vec<String> = line5.split_whitespace().map(|s| s.to_string()).collect();
        let line6 = cur.next_line("atom counts")?;
        let n = line6.split_whitespace().count();
        (species, cur.numbers::<usize>(line6, n, "atom counts")?)
    };

    if counts.is_empty() {
        return Err(cur.error(format!("line {}: no atom counts", cur.lineno())));
    }

    if cur
        .peek()
        .map_or(false, |l| l.trim().to_lowercase().starts_with('s'))
    {
        cur.next_line("selective dynamics")?;
    }

    let coord_type = cur.next_line("coordinate type")?.trim().to_lowercase();
    let cartesian = coord_type.starts_with('c') || coord_type.starts_with('k');

    let natoms: usize = counts.iter().sum();
    let mut positions = Vec::with_capacity(natoms);
    for _ in 0..natoms {
        let line = cur.next_line("atom position")?;
        let p: Vec<f64> = cur.numbers(line, 3, "atom position")?;
        // 笛卡尔坐标同样乘缩放因子
        let f = if cartesian { factor } else { 1.0 };
        positions.push([p[0] * f, p[1] * f, p[2] * f]);
    }

    Ok(Structure {
        comment,
        lattice,
        species,
        counts,
        positions,
        cartesian,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preamble(content: &str) -> Result<(Structure, usize)> {
        let mut cur = LineCursor::new("POSCAR", content, "test");
        let s = parse_preamble(&mut cur)?;
        Ok((s, cur.lineno()))
    }

    #[test]
    fn test_vasp5_preamble() {
        let content = r#"MgO rocksalt
1.0
4.21 0.00 0.00
0.00 4.21 0.00
0.00 0.00 4.21
Mg O
1 1
Direct
0.00 0.00 0.00
0.50 0.50 0.50
"#;
        let (s, consumed) = preamble(content).unwrap();
        assert_eq!(s.comment, "MgO rocksalt");
        assert_eq!(s.species, vec!["Mg", "O"]);
        assert_eq!(s.num_atoms(), 2);
        assert_eq!(s.positions[1], [0.5, 0.5, 0.5]);
        assert!(!s.cartesian);
        assert_eq!(consumed, 10);
    }

    #[test]
    fn test_vasp4_preamble_without_species() {
        let content = r#"diamond, old header
2.0
2.00 0.00 0.00
0.00 2.00 0.00
0.00 0.00 2.00
2
Cartesian
0.00 0.00 0.00
1.00 1.00 1.00
"#;
        let (s, consumed) = preamble(content).unwrap();
        assert!(s.species.is_empty());
        assert_eq!(s.counts, vec![2]);
        assert!((s.lattice.vector_length(0) - 4.0).abs() < 1e-12);
        assert!(s.cartesian);
        assert_eq!(s.positions[1], [2.0, 2.0, 2.0]);
        assert_eq!(consumed, 9);
    }

    #[test]
    fn test_selective_dynamics_is_skipped() {
        let content = r#"Ni surface, bottom layer fixed
1.0
2.49 0.00 0.00
0.00 2.49 0.00
0.00 0.00 20.0
Ni
2
Selective dynamics
Direct
0.00 0.00 0.10 F F F
0.50 0.50 0.20 T T T
"#;
        let (s, consumed) = preamble(content).unwrap();
        assert_eq!(s.positions.len(), 2);
        assert_eq!(consumed, 11);
    }

    #[test]
    fn test_negative_scale_is_target_volume() {
        let content = r#"cube
-64.0
1.0 0.0 0.0
0.0 1.0 0.0
0.0 0.0 1.0
H
1
Direct
0.0 0.0 0.0
"#;
        let (s, _) = preamble(content).unwrap();
        assert!((s.lattice.volume() - 64.0).abs() < 1e-9);
        assert!((s.lattice.vector_length(2) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_positions_is_structural() {
        let content = "x\n1.0\n1 0 0\n0 1 0\n0 0 1\nH\n3\nDirect\n0 0 0\n";
        assert!(preamble(content).is_err());
    }
}
