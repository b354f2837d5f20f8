//! # scan 命令实现
//!
//! 并行解码作业根目录下的所有计算目录，按最终能量排序输出。
//!
//! ## 功能
//! - 收集含有 OUTCAR（按配置文件名）的计算目录
//! - 每个目录解码 OUTCAR，并在 EIGENVAL 存在时计算带隙
//! - 终端表格显示能量排名
//!
//! ## 依赖关系
//! - 使用 `cli/scan.rs` 定义的参数
//! - 使用 `batch/` 并行执行
//! - 使用 `vaspout::parsers::CalculationDir`
//! - 使用 `utils/output.rs`

use crate::batch::{BatchRunner, DirCollector, ProcessResult};
use crate::cli::scan::ScanArgs;
use crate::utils::output::{self, fmt_opt};
use vaspout::config::{Artifact, DecodeConfig};
use vaspout::error::{Result, VaspError};
use vaspout::models::BandGap;
use vaspout::parsers::CalculationDir;

use log::warn;
use std::cmp::Ordering;
use std::path::Path;
use tabled::{Table, Tabled};

/// 单个计算目录的解码摘要
#[derive(Debug, Clone)]
struct ScanRecord {
    name: String,
    energy: Option<f64>,
    energy_per_atom: Option<f64>,
    fermi: Option<f64>,
    gap: Option<BandGap>,
    finished: bool,
    converged: bool,
    diagnostics: usize,
}

/// 排名表行
#[derive(Debug, Clone, Tabled)]
struct RankRow {
    #[tabled(rename = "Rank")]
    rank: usize,
    #[tabled(rename = "Calculation")]
    name: String,
    #[tabled(rename = "Energy (eV)")]
    energy: String,
    #[tabled(rename = "E/atom (eV)")]
    energy_per_atom: String,
    #[tabled(rename = "ΔE (eV)")]
    delta: String,
    #[tabled(rename = "E-fermi (eV)")]
    fermi: String,
    #[tabled(rename = "Gap (eV)")]
    gap: String,
    #[tabled(rename = "Status")]
    status: String,
}

/// 执行 scan 命令
pub fn execute(args: ScanArgs, config: DecodeConfig) -> Result<()> {
    output::print_header("Scanning VASP Calculations");

    if !args.job_dir.is_dir() {
        return Err(VaspError::DirectoryNotFound {
            path: args.job_dir.display().to_string(),
        });
    }

    let marker = config.file_name(Artifact::Outcar).to_string();
    let dirs = DirCollector::new(args.job_dir.clone())
        .with_pattern(&args.pattern)?
        .with_marker(&marker)
        .recursive(args.recursive)
        .collect();

    if dirs.is_empty() {
        output::print_warning(&format!(
            "No directories containing '{}' found under '{}'",
            marker,
            args.job_dir.display()
        ));
        return Ok(());
    }

    let runner = BatchRunner::new(args.jobs);
    output::print_info(&format!(
        "Decoding {} calculations with {} workers...",
        dirs.len(),
        runner.jobs()
    ));

    let batch = runner.run(dirs, |dir| decode_dir(dir, &args.job_dir, &config))?;

    for (path, err) in &batch.failures {
        output::print_error(&format!("{}: {}", path, err));
    }

    let total = batch.total();
    let mut records = batch.records;
    if records.is_empty() {
        output::print_warning("No calculation could be decoded.");
        return Ok(());
    }
    rank_by_energy(&mut records);

    let reference = records.iter().find_map(|r| r.energy);
    let table_rows: Vec<RankRow> = records
        .iter()
        .take(args.top_n)
        .enumerate()
        .map(|(i, r)| RankRow {
            rank: i + 1,
            name: r.name.clone(),
            energy: fmt_opt(r.energy, 6),
            energy_per_atom: fmt_opt(r.energy_per_atom, 6),
            delta: fmt_opt(r.energy.zip(reference).map(|(e, e0)| e - e0), 6),
            fermi: fmt_opt(r.fermi, 4),
            gap: fmt_opt(r.gap.map(|g| g.gap), 4),
            status: status(r).to_string(),
        })
        .collect();

    output::print_header(&format!(
        "Top {} Calculations by Energy",
        args.top_n.min(records.len())
    ));
    println!("{}", Table::new(&table_rows));

    let with_diagnostics = records.iter().filter(|r| r.diagnostics > 0).count();
    if with_diagnostics > 0 {
        output::print_warning(&format!(
            "{} calculation(s) had malformed fields skipped; run `parse` on them for details",
            with_diagnostics
        ));
    }

    output::print_separator();
    output::print_done(&format!(
        "{} decoded, {} skipped, {} failed (of {})",
        batch.success,
        batch.skipped,
        batch.failed,
        total
    ));
    Ok(())
}

/// 解码一个计算目录
fn decode_dir(dir: &Path, root: &Path, config: &DecodeConfig) -> ProcessResult<ScanRecord> {
    let name = dir
        .strip_prefix(root)
        .unwrap_or(dir)
        .display()
        .to_string();

    let calc = match CalculationDir::open(dir, config.clone()) {
        Ok(c) => c,
        Err(e) => return ProcessResult::Failed(name, e.to_string()),
    };

    let outcar = match calc.outcar() {
        Ok(o) => o,
        Err(e) if e.is_missing_artifact() => return ProcessResult::Skipped(name),
        Err(e) => return ProcessResult::Failed(name, e.to_string()),
    };

    let gap = match calc.band_gap() {
        Ok(g) => g,
        Err(e) if e.is_missing_artifact() => None,
        Err(e) => {
            warn!("{}: band gap unavailable: {}", name, e);
            None
        }
    };

    ProcessResult::Success(ScanRecord {
        energy: outcar.scalars.total_energy(),
        energy_per_atom: outcar.energy_per_atom(),
        fermi: outcar.scalars.fermi_energy(),
        gap,
        finished: outcar.finished,
        converged: outcar.converged,
        diagnostics: outcar.diagnostics.len(),
        name,
    })
}

/// 能量升序；没有能量的记录排在最后，其余保持目录顺序
fn rank_by_energy(records: &mut [ScanRecord]) {
    records.sort_by(|a, b| match (a.energy, b.energy) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

fn status(record: &ScanRecord) -> &'static str {
    match (record.finished, record.converged) {
        (true, true) => "converged",
        (true, false) => "finished",
        (false, _) => "running",
    }
}
