//! # VASP OUTCAR 解析器
//!
//! 从主日志 OUTCAR 提取能量、费米能、磁矩、受力表、应力/弹性/介电张量与收敛标志。
//!
//! ## 提取策略
//! - 标量：锚点绑定表 + 最后一次出现为准（见 `parsers/scanner.rs`）
//! - 受力表：`TOTAL-FORCE` 行之后、两条虚线之间的块；最后一个块为最终构型
//! - 张量：锚点之后虚线下方固定行数、固定列数的数值块，同样取最后一个
//! - 未计算的物理量（如无应力块）只是缺失，不是错误
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` (CalculationDir)、`commands/` 使用
//! - 使用 `models/calculation.rs`, `parsers/scanner.rs`

use super::read_artifact;
use super::scanner::{scan_latest, ScalarBinding};
use crate::config::Artifact;
use crate::error::{Result, VaspError};
use crate::models::{
    AtomForce, Diagnostics, ForceRecord, OutcarResult, ScalarKey, ScalarResult, StressTensor,
};

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use std::path::Path;

const FORCE_ANCHOR: &str = "TOTAL-FORCE";
const ELASTIC_ANCHOR: &str = "TOTAL ELASTIC MODULI";
const DIELECTRIC_ANCHOR: &str = "MACROSCOPIC STATIC DIELECTRIC TENSOR";
const IONIC_MARKER: &str = "IONIC CONTRIBUTION";
const CONVERGED_PHRASE: &str = "reached required accuracy";
const FINISHED_PHRASE: &str = "General timing and accounting informations for this job";

lazy_static! {
    static ref SCALAR_BINDINGS: Vec<ScalarBinding<ScalarKey>> = vec![
        // "  free  energy   TOTEN  =       -10.12345678 eV"
        ScalarBinding::new(
            "TOTEN",
            r"free\s+energy\s+TOTEN\s*=\s*(\S+)",
            &[ScalarKey::TotalEnergy],
        ),
        // "  energy  without entropy=      -10.1  energy(sigma->0) =      -10.2"
        ScalarBinding::new(
            "without entropy",
            r"energy\s+without\s+entropy\s*=\s*(\S+)",
            &[ScalarKey::EnergyWithoutEntropy],
        ),
        ScalarBinding::new(
            "sigma->0",
            r"energy\(sigma->0\)\s*=\s*(\S+)",
            &[ScalarKey::EnergySigma0],
        ),
        // "  enthalpy is  TOTEN    =      -123.456789 eV"
        ScalarBinding::new(
            "TOTEN",
            r"enthalpy\s+is\s+TOTEN\s*=\s*(\S+)",
            &[ScalarKey::Enthalpy],
        ),
        // " E-fermi :  -1.2345     XC(G=0): ..."
        ScalarBinding::new("E-fermi", r"E-fermi\s*:\s*(\S+)", &[ScalarKey::FermiEnergy]),
        // " number of electron      16.0000000 magnetization       2.0000000"
        ScalarBinding::new(
            "magnetization",
            r"number of electron\s+(\S+)\s+magnetization\s+(\S+)",
            &[ScalarKey::TotalElectrons, ScalarKey::TotalMagnetization],
        ),
        // "  volume of cell :      123.456789"
        ScalarBinding::new(
            "volume of cell",
            r"volume of cell\s*:\s*(\S+)",
            &[ScalarKey::Volume],
        ),
        // "   NIONS =       8"
        ScalarBinding::new("NIONS", r"NIONS\s*=\s*(\S+)", &[ScalarKey::Ions]),
    ];

    // "  in kB      -2.54     -2.54     -2.54      0.00      0.00      0.00"
    static ref STRESS_RE: Regex = Regex::new(r"in kB((?:\s+\S+){6})").unwrap();
}

/// 解析 VASP OUTCAR 文件
pub fn parse_outcar(path: &Path) -> Result<OutcarResult> {
    let content = read_artifact(path, Artifact::Outcar)?;
    parse_outcar_content(&content, &path.display().to_string())
}

/// 从字符串内容解析 OUTCAR
pub fn parse_outcar_content(content: &str, source: &str) -> Result<OutcarResult> {
    let mut diags = Diagnostics::new(source);
    let lines: Vec<&str> = content.lines().collect();

    let scalars = ScalarResult::from_map(scan_latest(content, &SCALAR_BINDINGS, &mut diags));

    let mut result = OutcarResult {
        converged: content.contains(CONVERGED_PHRASE),
        finished: content.contains(FINISHED_PHRASE),
        ..Default::default()
    };

    // 最终受力块中结构完整（至少 6 列）的行数
    let mut final_rows = 0;
    for (idx, line) in lines.iter().enumerate() {
        if line.contains(FORCE_ANCHOR) {
            if let Some((record, rows)) = read_force_block(&lines, idx, &mut diags) {
                if let Some(summary) = record.summary() {
                    result.force_history.push(summary);
                }
                result.forces = Some(record);
                final_rows = rows;
            }
        } else if line.contains("in kB") {
            if let Some(stress) = read_stress(line, idx, &mut diags) {
                result.stress = Some(stress);
            }
        } else if line.contains(ELASTIC_ANCHOR) {
            if let Some(m) = read_matrix::<6, 6>(&lines, idx, 1, "elastic_tensor", &mut diags) {
                result.elastic = Some(m);
            }
        } else if line.contains(DIELECTRIC_ANCHOR) {
            let ionic = line.contains(IONIC_MARKER);
            let field = if ionic {
                "dielectric_ionic"
            } else {
                "dielectric_tensor"
            };
            if let Some(m) = read_matrix::<3, 3>(&lines, idx, 0, field, &mut diags) {
                if ionic {
                    result.dielectric_ionic = Some(m);
                } else {
                    result.dielectric = Some(m);
                }
            }
        }
    }

    // 受力表行数必须等于原子数；数值损坏的行只记诊断，不计为缺行
    if let (Some(_), Some(nions)) = (&result.forces, scalars.ions()) {
        if final_rows != nions {
            return Err(VaspError::malformed(
                "OUTCAR",
                source,
                format!(
                    "final force table has {} rows but NIONS = {}",
                    final_rows,
                    nions
                ),
            ));
        }
    }

    debug!(
        "{}: {} scalars, {} force blocks, stress: {}, elastic: {}, dielectric: {}",
        source,
        scalars.len(),
        result.force_history.len(),
        result.stress.is_some(),
        result.elastic.is_some(),
        result.dielectric.is_some()
    );

    result.scalars = scalars;
    result.diagnostics = diags.into_vec();
    Ok(result)
}

/// 虚线分隔行
fn is_rule(line: &str) -> bool {
    let t = line.trim();
    t.len() >= 3 && t.chars().all(|c| c == '-')
}

/// 锚点之后第一条虚线的下一行索引
fn block_start(lines: &[&str], anchor: usize) -> Option<usize> {
    lines
        .iter()
        .enumerate()
        .skip(anchor + 1)
        .take(4)
        .find(|(_, l)| is_rule(l))
        .map(|(i, _)| i + 1)
}

/// 从 `start` 开始直到下一条虚线的非空行
fn block_rows<'a>(lines: &'a [&'a str], start: usize) -> impl Iterator<Item = (usize, &'a str)> + 'a {
    lines
        .iter()
        .enumerate()
        .skip(start)
        .map(|(i, l)| (i, *l))
        .take_while(|(_, l)| !is_rule(l))
        .filter(|(_, l)| !l.trim().is_empty())
}

/// 读取一个受力块：每行 位置x3 受力x3
///
/// 同时返回列数完整的行数，其中含损坏数值的行被跳过但仍计入。
fn read_force_block(
    lines: &[&str],
    anchor: usize,
    diags: &mut Diagnostics,
) -> Option<(ForceRecord, usize)> {
    let start = block_start(lines, anchor)?;
    let mut record = ForceRecord::default();
    let mut rows = 0;

    'rows: for (idx, line) in block_rows(lines, start) {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 6 {
            diags.skip(idx + 1, "force_row", line.trim());
            continue;
        }
        rows += 1;
        let mut vals = [0.0; 6];
        for (v, tok) in vals.iter_mut().zip(&tokens) {
            match diags.parse_f64(idx + 1, "force_row", tok) {
                Some(x) => *v = x,
                None => continue 'rows,
            }
        }
        record.atoms.push(AtomForce {
            position: [vals[0], vals[1], vals[2]],
            force: [vals[3], vals[4], vals[5]],
        });
    }

    Some((record, rows))
}

/// 读取一行应力：XX YY ZZ XY YZ ZX
fn read_stress(line: &str, idx: usize, diags: &mut Diagnostics) -> Option<StressTensor> {
    let caps = STRESS_RE.captures(line)?;
    let group = caps.get(1)?.as_str();
    let mut stress = [0.0; 6];
    for (s, tok) in stress.iter_mut().zip(group.split_whitespace()) {
        *s = diags.parse_f64(idx + 1, "stress", tok)?;
    }
    Some(stress)
}

/// 读取锚点虚线下方 R 行、每行跳过 `label_cols` 个标签后取 C 个数
fn read_matrix<const R: usize, const C: usize>(
    lines: &[&str],
    anchor: usize,
    label_cols: usize,
    field: &str,
    diags: &mut Diagnostics,
) -> Option<[[f64; C]; R]> {
    let start = match block_start(lines, anchor) {
        Some(s) => s,
        None => {
            diags.skip(anchor + 1, field, lines[anchor].trim());
            return None;
        }
    };

    let mut matrix = [[0.0; C]; R];
    let mut nrows = 0;
    for (idx, line) in block_rows(lines, start).take(R) {
        let tokens: Vec<&str> = line.split_whitespace().skip(label_cols).collect();
        if tokens.len() < C {
            diags.skip(idx + 1, field, line.trim());
            return None;
        }
        for (c, tok) in tokens.iter().take(C).enumerate() {
            matrix[nrows][c] = diags.parse_f64(idx + 1, field, tok)?;
        }
        nrows += 1;
    }

    if nrows < R {
        diags.skip(anchor + 1, field, &format!("{} of {} rows", nrows, R));
        return None;
    }
    Some(matrix)
}
