//! # VASP OSZICAR 解析器
//!
//! 逐行分类迭代日志：
//! - 电子步行：首个记号为整数（或算法前缀 `DAV:`/`RMM:`/`CG :`/`SDA:` 后跟整数），且不含 `F=`/`E0=`
//! - 离子步行：首个记号为整数，且含有 `F=` 或 `E0=`
//!
//! 电子步在缓冲区中累积，遇到离子步行时整体归属于该离子步。
//!
//! ```text
//!        N       E                     dE             d eps       ncg     rms          rms(c)
//! RMM:   7    -0.847810E+02   -0.10E-02   -0.55E-03   123   0.332E-01    0.123E-01
//!    1 F= -.84780990E+02 E0= -.84775142E+02  d E =-.847810E+02  mag=     3.2666
//! ```
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` (CalculationDir)、`commands/` 使用
//! - 使用 `models/steps.rs`

use super::read_artifact;
use crate::config::Artifact;
use crate::error::Result;
use crate::models::{Diagnostics, ElectronicStep, IonicStep, StepHistory};

use indexmap::IndexMap;
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use std::path::Path;

/// 电子步行的列名（迭代序号之后）
const ELECTRONIC_COLUMNS: [&str; 6] = ["E", "dE", "d_eps", "ncg", "rms", "rms(c)"];

lazy_static! {
    static ref PREFIXED_RE: Regex = Regex::new(r"^\s*([A-Za-z]+)\s*:\s*(\d+)\s*(.*)$").unwrap();
    static ref BARE_RE: Regex = Regex::new(r"^\s*(\d+)\s+(.*)$").unwrap();
    static ref FIELD_RE: Regex = Regex::new(r"([A-Za-z][A-Za-z0-9]*)=\s*(\S+)").unwrap();
    static ref DE_RE: Regex = Regex::new(r"\bd\s+E\s*=\s*(\S+)").unwrap();
    static ref MAG_RE: Regex = Regex::new(r"mag=\s*(\S+)").unwrap();
}

/// 解析 VASP OSZICAR 文件
pub fn parse_oszicar(path: &Path) -> Result<StepHistory> {
    let content = read_artifact(path, Artifact::Oszicar)?;
    Ok(parse_oszicar_content(&content, &path.display().to_string()))
}

/// 从字符串内容解析 OSZICAR
///
/// 逐字段容错：无法解析的数值只记录诊断，因此本函数不会失败。
pub fn parse_oszicar_content(content: &str, source: &str) -> StepHistory {
    let mut diags = Diagnostics::new(source);
    let mut history = StepHistory::default();
    let mut buffer: Vec<ElectronicStep> = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let lineno = idx + 1;
        if line.trim().is_empty() {
            continue;
        }

        let is_ionic_marker = line.contains("F=") || line.contains("E0=");

        if let Some(caps) = PREFIXED_RE.captures(line) {
            if is_ionic_marker {
                continue;
            }
            let iteration = caps[2].parse().unwrap_or(0);
            buffer.push(parse_electronic(
                iteration,
                Some(caps[1].to_string()),
                &caps[3],
                lineno,
                &mut diags,
            ));
        } else if let Some(caps) = BARE_RE.captures(line) {
            let n: usize = caps[1].parse().unwrap_or(0);
            if is_ionic_marker {
                history
                    .ionic_steps
                    .push(parse_ionic(n, line, lineno, &mut diags));
                history.electronic_steps.push(std::mem::take(&mut buffer));
            } else {
                buffer.push(parse_electronic(n, None, &caps[2], lineno, &mut diags));
            }
        }
    }

    debug!(
        "{}: {} ionic steps, {} pending electronic steps",
        source,
        history.ionic_steps.len(),
        buffer.len()
    );

    history.pending = buffer;
    history.diagnostics = diags.into_vec();
    history
}

/// 电子步：按列位置命名
fn parse_electronic(
    iteration: usize,
    algorithm: Option<String>,
    rest: &str,
    lineno: usize,
    diags: &mut Diagnostics,
) -> ElectronicStep {
    let mut fields = IndexMap::new();
    for (name, token) in ELECTRONIC_COLUMNS.iter().zip(rest.split_whitespace()) {
        if let Some(v) = diags.parse_f64(lineno, name, token) {
            fields.insert(name.to_string(), v);
        }
    }
    ElectronicStep {
        iteration,
        algorithm,
        fields,
    }
}

/// 离子步：`NAME=value` 字段，加上 `d E =` 与 `mag=`
fn parse_ionic(index: usize, line: &str, lineno: usize, diags: &mut Diagnostics) -> IonicStep {
    let mut fields = IndexMap::new();

    for caps in FIELD_RE.captures_iter(line) {
        let name = &caps[1];
        if name == "mag" {
            continue;
        }
        if let Some(v) = diags.parse_f64(lineno, name, &caps[2]) {
            fields.insert(name.to_string(), v);
        }
    }

    if let Some(caps) = DE_RE.captures(line) {
        if let Some(v) = diags.parse_f64(lineno, "dE", &caps[1]) {
            fields.insert("dE".to_string(), v);
        }
    }

    if let Some(caps) = MAG_RE.captures(line) {
        if let Some(v) = diags.parse_f64(lineno, "mag", &caps[1]) {
            fields.insert("mag".to_string(), v);
        }
    }

    IonicStep { index, fields }
}
