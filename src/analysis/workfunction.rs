//! # 功函数分析
//!
//! 真空能级取平面平均静电势的最大值，功函数 = 真空能级 - 费米能。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs`, `commands/` 使用
//! - 使用 `models/electronic.rs`

use crate::error::{Result, VaspError};
use crate::models::WorkFunction;

/// 由平面平均势曲线计算功函数
pub fn work_function(profile: &[f64], fermi_energy: f64) -> Result<WorkFunction> {
    let vacuum_level = profile
        .iter()
        .copied()
        .reduce(f64::max)
        .ok_or_else(|| VaspError::InvalidArgument("planar-averaged potential is empty".into()))?;

    Ok(WorkFunction {
        vacuum_level,
        fermi_energy,
        work_function: vacuum_level - fermi_energy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_work_function_from_profile() {
        let wf = work_function(&[1.0, 2.0, 5.0, 2.0, 1.0], 3.0).unwrap();
        assert_eq!(wf.vacuum_level, 5.0);
        assert_eq!(wf.fermi_energy, 3.0);
        assert_eq!(wf.work_function, 2.0);
    }

    #[test]
    fn test_empty_profile_is_rejected() {
        let err = work_function(&[], 0.0).unwrap_err();
        assert!(matches!(err, VaspError::InvalidArgument(_)));
    }
}
