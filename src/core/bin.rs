//! 频率bin累加器
//!
//! 一个bin收集同一频率下的全部 (power, hits) 对，保持到达顺序。

use super::record::RawRecord;
use crate::error::{BaselineError, BaselineResult};

/// 单个频率bin
///
/// 不变量：
/// - `powers.len() == hits.len()`
/// - `total_hits == hits.iter().sum()`
#[derive(Debug, Clone, PartialEq)]
pub struct Bin {
    frequency: f64,
    label: String,
    powers: Vec<f64>,
    hits: Vec<u64>,
    total_hits: u64,
}

impl Bin {
    /// 以第一条记录开启新bin
    pub fn open(record: RawRecord) -> Self {
        Self {
            frequency: record.frequency,
            label: record.label,
            powers: vec![record.power],
            hits: vec![record.hits],
            total_hits: record.hits,
        }
    }

    /// 由已知数据直接构造（供测试和离线工具使用）
    ///
    /// 总计数溢出时饱和到 `u64::MAX`，此时 `verify_totals()` 返回 false。
    pub fn from_pairs(frequency: f64, pairs: &[(f64, u64)]) -> Self {
        let powers = pairs.iter().map(|&(p, _)| p).collect();
        let hits: Vec<u64> = pairs.iter().map(|&(_, h)| h).collect();
        let total_hits = hits.iter().fold(0_u64, |acc, &h| acc.saturating_add(h));
        Self {
            frequency,
            label: frequency.to_string(),
            powers,
            hits,
            total_hits,
        }
    }

    /// 同频率记录是否属于本bin
    #[inline]
    pub fn accepts(&self, record: &RawRecord) -> bool {
        record.frequency == self.frequency
    }

    /// 追加一对 (power, hits)
    ///
    /// 总计数超出 `u64` 时返回 `FormatError`，bin保持不变。
    pub(crate) fn push(&mut self, power: f64, hits: u64) -> BaselineResult<()> {
        let total_hits = self.total_hits.checked_add(hits).ok_or_else(|| {
            BaselineError::FormatError(format!(
                "频率 {} 的hits总数溢出u64 / total hits overflow ({} + {hits})",
                self.label, self.total_hits
            ))
        })?;
        self.powers.push(power);
        self.hits.push(hits);
        self.total_hits = total_hits;
        Ok(())
    }

    #[inline]
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    pub fn powers(&self) -> &[f64] {
        &self.powers
    }

    #[inline]
    pub fn hits(&self) -> &[u64] {
        &self.hits
    }

    #[inline]
    pub fn total_hits(&self) -> u64 {
        self.total_hits
    }

    /// (power, hits) 对数量
    #[inline]
    pub fn len(&self) -> usize {
        self.powers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.powers.is_empty()
    }

    /// 总计数为0时百分位无定义
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.total_hits == 0
    }

    /// 校验累加不变量
    pub fn verify_totals(&self) -> bool {
        self.powers.len() == self.hits.len()
            && self
                .hits
                .iter()
                .try_fold(0_u64, |acc, &h| acc.checked_add(h))
                == Some(self.total_hits)
    }

    /// 每个功率级别的概率（%）：hits × 100 / total_hits
    ///
    /// 退化bin返回空序列。
    pub fn probabilities(&self) -> Vec<f64> {
        if self.is_degenerate() {
            return Vec::new();
        }
        let total = self.total_hits as f64;
        self.hits.iter().map(|&h| h as f64 * 100.0 / total).collect()
    }
}
