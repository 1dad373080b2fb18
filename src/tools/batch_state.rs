//! 通道批处理统计模块
//!
//! 记录每个通道的成功/失败以及失败原因分类，支持串行和并行两种模式。

use crate::error::{BaselineError, ErrorCategory};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// 批处理统计快照
#[derive(Debug, Clone, Default)]
pub struct BatchStatsSnapshot {
    /// 成功写出基线的通道数
    pub processed: usize,
    /// 失败的通道数
    pub failed: usize,
    /// 成功通道中被丢弃或不完整的bin总数
    pub bin_failures: usize,
    /// 错误分类统计（错误类型 -> 通道ID列表）
    pub error_stats: HashMap<ErrorCategory, Vec<String>>,
}

impl BatchStatsSnapshot {
    /// 是否至少有一个通道成功
    #[inline]
    pub fn any_succeeded(&self) -> bool {
        self.processed > 0
    }

    /// 出现次数最多的错误类别（全部失败时决定退出码）
    pub fn dominant_category(&self) -> Option<ErrorCategory> {
        self.error_stats
            .iter()
            .max_by_key(|(_, channels)| channels.len())
            .map(|(category, _)| *category)
    }
}

/// 串行批处理统计
#[derive(Debug, Default)]
pub struct SerialBatchStats {
    snapshot: BatchStatsSnapshot,
}

impl SerialBatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一个成功通道及其bin级失败数
    #[inline]
    pub fn inc_processed(&mut self, bin_failures: usize) -> usize {
        self.snapshot.processed += 1;
        self.snapshot.bin_failures += bin_failures;
        self.snapshot.processed
    }

    /// 记录一个失败通道
    #[inline]
    pub fn inc_failed(&mut self, error: &BaselineError, channel: String) -> usize {
        self.snapshot.failed += 1;
        self.snapshot
            .error_stats
            .entry(ErrorCategory::from_baseline_error(error))
            .or_default()
            .push(channel);
        self.snapshot.failed
    }

    pub fn snapshot(&self) -> BatchStatsSnapshot {
        self.snapshot.clone()
    }
}

/// 并行批处理统计（多线程安全）
#[derive(Debug, Clone, Default)]
pub struct ParallelBatchStats {
    processed: Arc<AtomicUsize>,
    failed: Arc<AtomicUsize>,
    bin_failures: Arc<AtomicUsize>,
    error_stats: Arc<Mutex<HashMap<ErrorCategory, Vec<String>>>>,
}

impl ParallelBatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一个成功通道（线程安全）
    #[inline]
    pub fn inc_processed(&self, bin_failures: usize) -> usize {
        self.bin_failures.fetch_add(bin_failures, Ordering::Relaxed);
        self.processed.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// 记录一个失败通道（线程安全）
    pub fn inc_failed(&self, error: &BaselineError, channel: String) -> usize {
        let count = self.failed.fetch_add(1, Ordering::Relaxed) + 1;

        // 某个工作线程panic后锁被污染，统计数据本身仍然完整
        self.error_stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(ErrorCategory::from_baseline_error(error))
            .or_default()
            .push(channel);

        count
    }

    pub fn snapshot(&self) -> BatchStatsSnapshot {
        BatchStatsSnapshot {
            processed: self.processed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            bin_failures: self.bin_failures.load(Ordering::Relaxed),
            error_stats: self
                .error_stats
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        }
    }
}
