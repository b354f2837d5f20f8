//! # parse 命令实现
//!
//! 解码单个计算目录中的一种产物或派生量，并以表格/键值行显示。
//!
//! ## 功能
//! - OUTCAR: 能量、受力、概要（收敛标志与张量）
//! - OSZICAR / EIGENVAL / PROCAR / DOSCAR / vasprun.xml 概览
//! - LOCPOT / CHGCAR 网格与平面平均
//! - 带隙、功函数
//! - 产物缺失时打印 `[SKIP]` 而不报错
//!
//! ## 依赖关系
//! - 使用 `cli/parse.rs` 定义的参数
//! - 使用 `vaspout::parsers::CalculationDir`
//! - 使用 `utils/output.rs`

use crate::cli::parse::{ParseArgs, ParseTarget};
use crate::utils::output::{self, fmt_opt};
use vaspout::config::{Artifact, DecodeConfig};
use vaspout::error::{Result, VaspError};
use vaspout::models::{GridAxis, GridKind, ScalarKey, VolumetricGrid};
use vaspout::parsers::CalculationDir;

use ndarray::Axis;
use std::env;
use std::path::{Path, PathBuf};
use tabled::{Table, Tabled};

/// 键值表行
#[derive(Debug, Clone, Tabled)]
struct FieldRow {
    #[tabled(rename = "Quantity")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
}

impl FieldRow {
    fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        FieldRow {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// 执行 parse 命令
pub fn execute(args: ParseArgs, dir: &Path, mut config: DecodeConfig) -> Result<()> {
    let artifact = args.target.artifact();
    if let Some(file) = &args.file {
        config.set_file_name(artifact, absolute(file)?.display().to_string());
    }
    let calc = CalculationDir::open(dir, config)?;

    output::print_header(&format!(
        "Decoding {} from '{}'",
        args.target,
        calc.path(artifact).display()
    ));

    let axis = args.axis.map(GridAxis::from);
    let outcome = match args.target {
        ParseTarget::Energy => show_energy(&calc),
        ParseTarget::Forces => show_forces(&calc, args.rows),
        ParseTarget::Gap => show_gap(&calc),
        ParseTarget::Summary => show_summary(&calc),
        ParseTarget::Steps => show_steps(&calc, args.rows),
        ParseTarget::Bands => show_bands(&calc, args.rows),
        ParseTarget::Procar => show_procar(&calc),
        ParseTarget::Dos => show_dos(&calc, args.rows),
        ParseTarget::Workfunction => show_work_function(&calc, args.fermi, axis),
        ParseTarget::Potential => calc.locpot().map(|grid| {
            show_grid(&grid, axis.unwrap_or(calc.config.planar_axis), args.rows)
        }),
        ParseTarget::Charge => calc.chgcar().map(|grid| {
            show_grid(&grid, axis.unwrap_or(calc.config.planar_axis), args.rows)
        }),
        ParseTarget::Vasprun => show_vasprun(&calc, args.rows),
    };

    match outcome {
        Err(e) if e.is_missing_artifact() => {
            output::print_skip(&e.to_string());
            Ok(())
        }
        other => other,
    }
}

/// 相对路径以当前工作目录为基准
fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = env::current_dir().map_err(|e| VaspError::FileReadError {
        path: ".".to_string(),
        source: e,
    })?;
    Ok(cwd.join(path))
}

fn source(calc: &CalculationDir, artifact: Artifact) -> String {
    calc.path(artifact).display().to_string()
}

/// 最多 `rows` 个等间隔的下标
fn sample_indices(n: usize, rows: usize) -> Vec<usize> {
    let rows = rows.max(1);
    let step = n.div_ceil(rows);
    (0..n).step_by(step.max(1)).collect()
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

fn join_values(values: impl IntoIterator<Item = f64>, precision: usize) -> String {
    values
        .into_iter()
        .map(|v| format!("{:.*}", precision, v))
        .collect::<Vec<_>>()
        .join("  ")
}

fn print_matrix<const N: usize>(title: &str, rows: &[[f64; N]]) {
    output::print_info(title);
    for row in rows {
        let line: String = row.iter().map(|v| format!("{:>12.4}", v)).collect();
        println!("  {}", line);
    }
}

// ─────────────────────────────────────────────────────────────
// OUTCAR
// ─────────────────────────────────────────────────────────────

fn show_energy(calc: &CalculationDir) -> Result<()> {
    let result = calc.outcar()?;
    if result.scalars.is_empty() {
        output::print_warning("No energy or electronic summary lines found");
    }

    let mut rows: Vec<FieldRow> = result
        .scalars
        .iter()
        .map(|(key, value)| {
            let text = match key {
                ScalarKey::Ions => format!("{:.0}", value),
                _ => format!("{:.6}", value),
            };
            FieldRow::new(key.name(), text)
        })
        .collect();
    if let Some(e) = result.energy_per_atom() {
        rows.push(FieldRow::new("energy_per_atom", format!("{:.6}", e)));
    }

    if !rows.is_empty() {
        println!("{}", Table::new(&rows));
    }
    output::print_diagnostics(&source(calc, Artifact::Outcar), &result.diagnostics);
    Ok(())
}

/// 受力表行
#[derive(Debug, Clone, Tabled)]
struct ForceRow {
    #[tabled(rename = "Atom")]
    atom: usize,
    #[tabled(rename = "Position (Å)")]
    position: String,
    #[tabled(rename = "Force (eV/Å)")]
    force: String,
    #[tabled(rename = "|F| (eV/Å)")]
    magnitude: String,
}

/// 受力历史行
#[derive(Debug, Clone, Tabled)]
struct ForceStepRow {
    #[tabled(rename = "Step")]
    step: usize,
    #[tabled(rename = "Max |F|")]
    max: String,
    #[tabled(rename = "RMS |F|")]
    rms: String,
}

fn show_forces(calc: &CalculationDir, rows: usize) -> Result<()> {
    let result = calc.outcar()?;
    let forces = match &result.forces {
        Some(f) => f,
        None => {
            output::print_warning("No TOTAL-FORCE block found");
            return Ok(());
        }
    };

    let table_rows: Vec<ForceRow> = forces
        .atoms
        .iter()
        .enumerate()
        .take(rows)
        .map(|(i, a)| ForceRow {
            atom: i + 1,
            position: join_values(a.position, 5),
            force: join_values(a.force, 5),
            magnitude: format!("{:.5}", a.magnitude()),
        })
        .collect();
    println!("{}", Table::new(&table_rows));
    if forces.len() > rows {
        output::print_info(&format!("... {} more atoms", forces.len() - rows));
    }

    if let Some(summary) = forces.summary() {
        println!();
        output::print_field("max force (eV/Å)", &format!("{:.5}", summary.max));
        output::print_field("rms force (eV/Å)", &format!("{:.5}", summary.rms));
    }

    if result.force_history.len() > 1 {
        let start = result.force_history.len().saturating_sub(rows);
        let history: Vec<ForceStepRow> = result.force_history[start..]
            .iter()
            .enumerate()
            .map(|(i, s)| ForceStepRow {
                step: start + i + 1,
                max: format!("{:.5}", s.max),
                rms: format!("{:.5}", s.rms),
            })
            .collect();
        output::print_header("Force History");
        println!("{}", Table::new(&history));
    }

    output::print_diagnostics(&source(calc, Artifact::Outcar), &result.diagnostics);
    Ok(())
}

fn show_summary(calc: &CalculationDir) -> Result<()> {
    let result = calc.outcar()?;
    let s = &result.scalars;

    output::print_field("finished", yes_no(result.finished));
    output::print_field("ionic relaxation converged", yes_no(result.converged));
    output::print_field("ions", &s.ions().map_or("-".to_string(), |n| n.to_string()));
    output::print_field("total energy (eV)", &fmt_opt(s.total_energy(), 6));
    output::print_field("energy per atom (eV)", &fmt_opt(result.energy_per_atom(), 6));
    output::print_field("enthalpy (eV)", &fmt_opt(s.get(ScalarKey::Enthalpy), 6));
    output::print_field("Fermi energy (eV)", &fmt_opt(s.fermi_energy(), 4));
    output::print_field("electrons", &fmt_opt(s.total_electrons(), 4));
    output::print_field("magnetization (μB)", &fmt_opt(s.total_magnetization(), 4));
    output::print_field("volume (Å³)", &fmt_opt(s.get(ScalarKey::Volume), 4));
    output::print_field("pressure (kBar)", &fmt_opt(result.pressure_kbar(), 2));
    output::print_field(
        "max force (eV/Å)",
        &fmt_opt(result.forces.as_ref().and_then(|f| f.max_force()), 5),
    );

    if let Some(stress) = result.stress {
        output::print_field("stress XX YY ZZ XY YZ ZX", &join_values(stress, 2));
    }
    println!();
    if let Some(m) = &result.dielectric {
        print_matrix("Static dielectric tensor", m);
    }
    if let Some(m) = &result.dielectric_ionic {
        print_matrix("Static dielectric tensor (ionic contribution)", m);
    }
    if let Some(m) = &result.elastic {
        print_matrix("Total elastic moduli (kBar)", m);
    }

    output::print_diagnostics(&source(calc, Artifact::Outcar), &result.diagnostics);
    Ok(())
}

// ─────────────────────────────────────────────────────────────
// OSZICAR
// ─────────────────────────────────────────────────────────────

/// 离子步行
#[derive(Debug, Clone, Tabled)]
struct StepRow {
    #[tabled(rename = "Step")]
    step: usize,
    #[tabled(rename = "F (eV)")]
    free_energy: String,
    #[tabled(rename = "E0 (eV)")]
    energy: String,
    #[tabled(rename = "dE (eV)")]
    delta: String,
    #[tabled(rename = "mag (μB)")]
    magnetization: String,
    #[tabled(rename = "SCF")]
    scf: usize,
}

fn show_steps(calc: &CalculationDir, rows: usize) -> Result<()> {
    let history = calc.oszicar()?;

    if history.is_empty() {
        output::print_warning("No ionic steps found");
    } else {
        let start = history.len().saturating_sub(rows);
        let table_rows: Vec<StepRow> = history.ionic_steps[start..]
            .iter()
            .enumerate()
            .map(|(i, step)| StepRow {
                step: step.index,
                free_energy: fmt_opt(step.free_energy(), 6),
                energy: fmt_opt(step.energy_sigma0(), 6),
                delta: fmt_opt(step.get("dE"), 4),
                magnetization: fmt_opt(step.magnetization(), 4),
                scf: history.electronic_steps.get(start + i).map_or(0, Vec::len),
            })
            .collect();
        println!("{}", Table::new(&table_rows));
        output::print_field("ionic steps", &history.len().to_string());
        output::print_field("final energy (eV)", &fmt_opt(history.final_energy(), 6));
    }

    if !history.pending.is_empty() {
        output::print_warning(&format!(
            "{} electronic step(s) after the last ionic step",
            history.pending.len()
        ));
    }
    output::print_diagnostics(&source(calc, Artifact::Oszicar), &history.diagnostics);
    Ok(())
}

// ─────────────────────────────────────────────────────────────
// EIGENVAL / PROCAR / DOSCAR
// ─────────────────────────────────────────────────────────────

fn show_gap(calc: &CalculationDir) -> Result<()> {
    output::print_field(
        "occupation threshold",
        &calc.config.occupation_threshold.to_string(),
    );
    match calc.band_gap()? {
        Some(gap) => {
            let kind = if gap.is_metallic() {
                "metallic"
            } else if gap.direct {
                "direct"
            } else {
                "indirect"
            };
            output::print_field("band gap (eV)", &format!("{:.4}", gap.gap));
            output::print_field("type", kind);
            output::print_field(
                "VBM (eV)",
                &format!("{:.4}  at k-point {}", gap.vbm, gap.vbm_kindex + 1),
            );
            output::print_field(
                "CBM (eV)",
                &format!("{:.4}  at k-point {}", gap.cbm, gap.cbm_kindex + 1),
            );
        }
        None => output::print_warning("No occupied or no unoccupied states, band gap undefined"),
    }
    Ok(())
}

/// k 点行
#[derive(Debug, Clone, Tabled)]
struct KpointRow {
    #[tabled(rename = "K")]
    index: usize,
    #[tabled(rename = "Coordinates")]
    coords: String,
    #[tabled(rename = "Weight")]
    weight: String,
    #[tabled(rename = "Path")]
    distance: String,
    #[tabled(rename = "Band range (eV)")]
    range: String,
}

fn show_bands(calc: &CalculationDir, rows: usize) -> Result<()> {
    let bands = calc.eigenval()?;

    output::print_field("electrons", &format!("{:.2}", bands.nelect));
    output::print_field("k-points", &bands.nkpts().to_string());
    output::print_field("bands", &bands.nbands().to_string());
    output::print_field("spin polarized", yes_no(bands.is_spin_polarized()));
    println!();

    let dists = bands.kpath_distances();
    let table_rows: Vec<KpointRow> = sample_indices(bands.nkpts(), rows)
        .into_iter()
        .map(|ik| {
            let energies = bands.eigenvalues.index_axis(Axis(0), ik);
            let energies = energies.column(0);
            let lo = energies.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = energies.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            KpointRow {
                index: ik + 1,
                coords: join_values(bands.kpoints.row(ik).iter().copied(), 4),
                weight: format!("{:.4}", bands.weights[ik]),
                distance: format!("{:.4}", dists[ik]),
                range: format!("{:.3} .. {:.3}", lo, hi),
            }
        })
        .collect();
    println!("{}", Table::new(&table_rows));
    Ok(())
}

/// 轨道权重行
#[derive(Debug, Clone, Tabled)]
struct OrbitalRow {
    #[tabled(rename = "Orbital")]
    name: String,
    #[tabled(rename = "Summed weight")]
    weight: String,
}

fn show_procar(calc: &CalculationDir) -> Result<()> {
    let procar = calc.procar()?;

    output::print_field("k-points", &procar.nkpts().to_string());
    output::print_field("bands", &procar.nbands().to_string());
    output::print_field("ions", &procar.natoms().to_string());
    output::print_field("orbitals", &procar.orbitals.join(" "));
    println!();

    let table_rows: Vec<OrbitalRow> = procar
        .orbitals
        .iter()
        .map(|name| OrbitalRow {
            name: name.clone(),
            weight: format!("{:.4}", procar.weights(None, Some(&[name.as_str()][..])).sum()),
        })
        .collect();
    println!("{}", Table::new(&table_rows));

    output::print_diagnostics(&source(calc, Artifact::Procar), &procar.diagnostics);
    Ok(())
}

/// 态密度行
#[derive(Debug, Clone, Tabled)]
struct DosRow {
    #[tabled(rename = "E - E_F (eV)")]
    energy: String,
    #[tabled(rename = "Total DOS")]
    total: String,
}

fn show_dos(calc: &CalculationDir, rows: usize) -> Result<()> {
    let dos = calc.doscar()?;

    output::print_field("Fermi energy (eV)", &format!("{:.4}", dos.efermi));
    output::print_field(
        "energy window (eV)",
        &format!("{:.3} .. {:.3}", dos.emin, dos.emax),
    );
    output::print_field("NEDOS", &dos.nedos.to_string());
    output::print_field("ions", &dos.natoms.to_string());
    output::print_field("spin polarized", yes_no(dos.is_spin_polarized()));
    output::print_field(
        "projected DOS",
        &dos.pdos
            .as_ref()
            .map_or("none".to_string(), |p| format!("{} atoms", p.len())),
    );
    println!();

    let shifted = dos.shifted_energies();
    let table_rows: Vec<DosRow> = sample_indices(dos.nedos, rows)
        .into_iter()
        .map(|i| DosRow {
            energy: format!("{:.3}", shifted[i]),
            total: join_values(dos.total.row(i).iter().copied(), 4),
        })
        .collect();
    println!("{}", Table::new(&table_rows));
    Ok(())
}

// ─────────────────────────────────────────────────────────────
// LOCPOT / CHGCAR
// ─────────────────────────────────────────────────────────────

fn show_work_function(calc: &CalculationDir, fermi: Option<f64>, axis: Option<GridAxis>) -> Result<()> {
    let wf = calc.work_function(fermi, axis)?;
    output::print_field(
        "averaging axis",
        &axis.unwrap_or(calc.config.planar_axis).to_string(),
    );
    output::print_field("vacuum level (eV)", &format!("{:.4}", wf.vacuum_level));
    output::print_field("Fermi energy (eV)", &format!("{:.4}", wf.fermi_energy));
    output::print_field("work function (eV)", &format!("{:.4}", wf.work_function));
    Ok(())
}

/// 平面平均行
#[derive(Debug, Clone, Tabled)]
struct ProfileRow {
    #[tabled(rename = "Position (Å)")]
    position: String,
    #[tabled(rename = "Average")]
    value: String,
}

fn show_grid(grid: &VolumetricGrid, axis: GridAxis, rows: usize) {
    let kind = match grid.kind {
        GridKind::Potential => "electrostatic potential (eV)",
        GridKind::ChargeDensity => "charge density (e/Å³)",
    };
    let st = &grid.structure;
    let composition: Vec<String> = if st.species.is_empty() {
        st.counts.iter().map(|c| c.to_string()).collect()
    } else {
        st.species
            .iter()
            .zip(&st.counts)
            .map(|(s, c)| format!("{}{}", s, c))
            .collect()
    };

    output::print_field("field", kind);
    output::print_field(
        "grid",
        &format!("{} x {} x {}", grid.dims[0], grid.dims[1], grid.dims[2]),
    );
    output::print_field("composition", &composition.join(" "));
    output::print_field("cell volume (Å³)", &format!("{:.4}", st.lattice.volume()));
    if let Some((lo, hi)) = grid.value_range() {
        output::print_field("value range", &format!("{:.5} .. {:.5}", lo, hi));
    }

    let profile = grid.planar_average(axis);
    output::print_header(&format!("Planar Average along {}", axis));
    let table_rows: Vec<ProfileRow> = sample_indices(profile.values.len(), rows)
        .into_iter()
        .map(|i| ProfileRow {
            position: format!("{:.4}", profile.positions[i]),
            value: format!("{:.5}", profile.values[i]),
        })
        .collect();
    println!("{}", Table::new(&table_rows));
}

// ─────────────────────────────────────────────────────────────
// vasprun.xml
// ─────────────────────────────────────────────────────────────

fn show_vasprun(calc: &CalculationDir, rows: usize) -> Result<()> {
    let result = calc.vasprun()?;

    output::print_field("parameters", &result.parameters.len().to_string());
    output::print_field("eigenvalues", yes_no(result.has_eigenvalues));
    output::print_field("density of states", yes_no(result.has_dos));
    output::print_field("Fermi energy (eV)", &fmt_opt(result.efermi, 4));
    if let Some(positions) = &result.final_positions {
        output::print_field("final positions", &format!("{} atoms", positions.len()));
    }
    println!();

    if !result.parameters.is_empty() {
        let params: Vec<FieldRow> = result
            .parameters
            .iter()
            .take(rows)
            .map(|(k, v)| FieldRow::new(k.as_str(), v.as_str()))
            .collect();
        println!("{}", Table::new(&params));
    }

    if !result.final_energies.is_empty() {
        let energies: Vec<FieldRow> = result
            .final_energies
            .iter()
            .map(|(k, v)| FieldRow::new(k.as_str(), format!("{:.6}", v)))
            .collect();
        output::print_header("Final Energies (eV)");
        println!("{}", Table::new(&energies));
    }

    if let Some(lattice) = &result.final_lattice {
        print_matrix("Final lattice (Å)", &lattice.matrix);
    }

    output::print_diagnostics(&source(calc, Artifact::Vasprun), &result.diagnostics);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_indices() {
        assert_eq!(sample_indices(5, 10), vec![0, 1, 2, 3, 4]);
        assert_eq!(sample_indices(10, 5), vec![0, 2, 4, 6, 8]);
        assert_eq!(sample_indices(7, 3), vec![0, 3, 6]);
        assert_eq!(sample_indices(4, 0), vec![0]);
        assert!(sample_indices(0, 5).is_empty());
        assert_eq!(sample_indices(3, usize::MAX), vec![0, 1, 2]);
    }

    #[test]
    fn test_absolute_keeps_absolute_paths() {
        let path = Path::new("/data/LOCPOT");
        assert_eq!(absolute(path).unwrap(), PathBuf::from("/data/LOCPOT"));
        assert!(absolute(Path::new("LOCPOT")).unwrap().is_absolute());
    }
}
