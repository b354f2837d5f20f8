//! # 体积数据解析器 (LOCPOT / CHGCAR)
//!
//! 两种产物共用一个解码器：
//! 1. POSCAR 格式的结构前导（见 `parsers/poscar.rs`）
//! 2. 空行后的网格维度行 `nx ny nz`
//! 3. 恰好 `nx * ny * nz` 个浮点数，x 变化最快
//!
//! 之后的内容（PAW 增广电荷、自旋密度的第二个网格）不读取。
//! CHGCAR 存储的是 电荷 x 晶胞体积，解码时除以晶胞体积得到密度。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` (CalculationDir)、`commands/` 使用
//! - 使用 `models/grid.rs`, `parsers/poscar.rs`, `parsers/cursor.rs`

use super::cursor::LineCursor;
use super::{poscar, read_artifact};
use crate::config::Artifact;
use crate::error::Result;
use crate::models::{GridKind, VolumetricGrid};

use log::debug;
use ndarray::{Array3, ShapeBuilder};
use std::path::Path;

/// 解析 LOCPOT（静电势）
pub fn parse_locpot(path: &Path) -> Result<VolumetricGrid> {
    parse_volumetric(path, GridKind::Potential)
}

/// 解析 CHGCAR（电荷密度，按体积归一化）
pub fn parse_chgcar(path: &Path) -> Result<VolumetricGrid> {
    parse_volumetric(path, GridKind::ChargeDensity)
}

/// 按种类解析体积数据文件
pub fn parse_volumetric(path: &Path, kind: GridKind) -> Result<VolumetricGrid> {
    let artifact = match kind {
        GridKind::Potential => Artifact::Locpot,
        GridKind::ChargeDensity => Artifact::Chgcar,
    };
    let content = read_artifact(path, artifact)?;
    parse_volumetric_content(&content, &path.display().to_string(), kind)
}

/// 从字符串内容解析体积数据
pub fn parse_volumetric_content(
    content: &str,
    source: &str,
    kind: GridKind,
) -> Result<VolumetricGrid> {
    let format = match kind {
        GridKind::Potential => "LOCPOT",
        GridKind::ChargeDensity => "CHGCAR",
    };
    let mut cur = LineCursor::new(format, content, source);

    let structure = poscar::parse_preamble(&mut cur)?;

    let dims_line = cur.next_nonblank("grid dimensions")?;
    let d: Vec<usize> = cur.numbers(dims_line, 3, "grid dimensions")?;
    let dims = [d[0], d[1], d[2]];
    let npoints = dims
        .iter()
        .try_fold(1usize, |acc, &n| acc.checked_mul(n))
        .ok_or_else(|| {
            cur.error(format!(
                "line {}: grid {} x {} x {} is too large",
                cur.lineno(),
                dims[0],
                dims[1],
                dims[2]
            ))
        })?;
    if npoints == 0 {
        return Err(cur.error(format!(
            "line {}: empty grid {} x {} x {}",
            cur.lineno(),
            dims[0],
            dims[1],
            dims[2]
        )));
    }

    let values = cur.take_floats(npoints, "grid values")?;
    let mut data = Array3::from_shape_vec((dims[0], dims[1], dims[2]).f(), values)
        .map_err(|e| cur.error(e.to_string()))?;

    if kind.is_volume_normalized() {
        let volume = structure.lattice.volume();
        if volume <= 0.0 {
            return Err(cur.error("cell volume is zero, cannot normalize charge density"));
        }
        data.mapv_inplace(|v| v / volume);
    }

    debug!(
        "{}: {} grid {} x {} x {}, {} atoms",
        source,
        format,
        dims[0],
        dims[1],
        dims[2],
        structure.num_atoms()
    );

    Ok(VolumetricGrid {
        kind,
        structure,
        dims,
        data,
    })
}
