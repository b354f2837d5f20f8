//! # 最新出现标量扫描器
//!
//! 逐行扫描文本，按"锚点 → 正则 → 标量键"的绑定表提取数值。
//! 同一个键出现多次时，后出现的值覆盖先前的值（最后一次出现为准）。
//!
//! - 只有包含锚点字面量的行才会进行正则匹配
//! - 捕获到的文本无法解析为浮点数时，记录诊断并保留先前的值
//!
//! ## 依赖关系
//! - 被 `parsers/outcar.rs` 使用
//! - 使用 `models/diagnostic.rs`
//! - 使用 `regex`

use crate::models::Diagnostics;

use regex::Regex;
use std::collections::BTreeMap;
use std::fmt::Display;

/// 锚点与捕获组到标量键的绑定
#[derive(Debug)]
pub struct ScalarBinding<K> {
    /// 行内必须出现的字面量
    pub anchor: &'static str,
    /// 数值捕获正则，第 i 个捕获组对应 `keys[i - 1]`
    pub pattern: Regex,
    pub keys: Vec<K>,
}

impl<K: Copy> ScalarBinding<K> {
    pub fn new(anchor: &'static str, pattern: &str, keys: &[K]) -> Self {
        ScalarBinding {
            anchor,
            pattern: Regex::new(pattern).expect("invalid scalar binding pattern"),
            keys: keys.to_vec(),
        }
    }
}

/// 扫描所有行，返回每个键最后一次成功解析的值
pub fn scan_latest<K>(
    text: &str,
    bindings: &[ScalarBinding<K>],
    diags: &mut Diagnostics,
) -> BTreeMap<K, f64>
where
    K: Ord + Copy + Display,
{
    let mut values = BTreeMap::new();

    for (idx, line) in text.lines().enumerate() {
        for binding in bindings {
            if !line.contains(binding.anchor) {
                continue;
            }
            let caps = match binding.pattern.captures_iter(line).last() {
                Some(c) => c,
                None => continue,
            };
            for (i, key) in binding.keys.iter().enumerate() {
                if let Some(m) = caps.get(i + 1) {
                    let name = key.to_string();
                    if let Some(v) = diags.parse_f64(idx + 1, &name, m.as_str()) {
                        values.insert(*key, v);
                    }
                }
            }
        }
    }

    values
}
