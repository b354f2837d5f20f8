//! # 带隙分析
//!
//! 占据数大于阈值的态视为占据态。价带顶取所有 k 点占据态能量的最大值，
//! 导带底取所有 k 点空态能量的最小值；能带交叠时带隙截断为 0。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs`, `commands/` 使用
//! - 使用 `models/electronic.rs`

use crate::models::BandGap;

use ndarray::ArrayView3;

/// 由 (K x B x 2) 本征值数组计算带隙
///
/// 没有占据态或没有空态时返回 `None`。相同能量时保留先出现的 k 点。
pub fn band_gap(eigenvalues: ArrayView3<f64>, occupation_threshold: f64) -> Option<BandGap> {
    let mut vbm: Option<(f64, usize)> = None;
    let mut cbm: Option<(f64, usize)> = None;

    for (ik, kblock) in eigenvalues.outer_iter().enumerate() {
        for band in kblock.outer_iter() {
            let (energy, occ) = (band[0], band[1]);
            if occ > occupation_threshold {
                if vbm.map_or(true, |(e, _)| energy > e) {
                    vbm = Some((energy, ik));
                }
            } else if cbm.map_or(true, |(e, _)| energy < e) {
                cbm = Some((energy, ik));
            }
        }
    }

    let (vbm, vbm_kindex) = vbm?;
    let (cbm, cbm_kindex) = cbm?;

    Some(BandGap {
        gap: (cbm - vbm).max(0.0),
        vbm,
        cbm,
        vbm_kindex,
        cbm_kindex,
        direct: vbm_kindex == cbm_kindex,
    })
}
