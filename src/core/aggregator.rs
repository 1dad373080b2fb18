//! 流式频率bin聚合器
//!
//! 逐条消费原始记录，按频率把连续记录归入同一个bin。
//! 每个bin只有两种状态：`Open`（仍在接收同频率记录）和已关闭（交给回调）。
//! 关闭由两种条件触发：
//! - 新记录的频率与当前bin不同
//! - 调用方显式 `finish()`（记录流结束）
//!
//! 内存占用只与当前bin宽度有关，与整个记录流长度无关。

use super::bin::Bin;
use super::record::{RawRecord, parse_line};
use crate::error::{BaselineError, BaselineResult};
use std::io::BufRead;

/// 聚合过程统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregationSummary {
    /// 读取的总行数
    pub lines: usize,

    /// 有效记录数
    pub records: usize,

    /// 跳过的非数据行数（空行、注释、无分隔符）
    pub skipped_lines: usize,

    /// 关闭的bin数量
    pub bins: usize,
}

/// 聚合器状态机
#[derive(Debug, Default)]
enum AggregatorState {
    /// 尚未收到任何记录，或上一个bin已被flush
    #[default]
    Idle,
    /// 当前bin仍在接收同频率记录
    Open(Bin),
}

/// 流式bin聚合器
///
/// # 使用示例
///
/// ```
/// use station_baseline::core::{BinAggregator, RawRecord};
///
/// # fn main() -> station_baseline::error::BaselineResult<()> {
/// let mut aggregator = BinAggregator::new();
/// assert!(aggregator.push(RawRecord::new(1.0, -100.0, 10))?.is_none());
/// assert!(aggregator.push(RawRecord::new(1.0, -90.0, 20))?.is_none());
///
/// // 频率变化：上一个bin关闭
/// let closed = aggregator.push(RawRecord::new(2.0, -95.0, 100))?.unwrap();
/// assert_eq!(closed.total_hits(), 30);
///
/// // 记录流结束：显式flush
/// let last = aggregator.finish().unwrap();
/// assert_eq!(last.frequency(), 2.0);
/// assert!(aggregator.finish().is_none());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct BinAggregator {
    state: AggregatorState,
    records_seen: usize,
    bins_closed: usize,
}

impl BinAggregator {
    /// 创建空闲状态的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 输入一条记录
    ///
    /// 频率与当前bin相同则追加；不同则关闭当前bin并返回它，
    /// 同时以该记录开启新bin。
    ///
    /// # 错误
    ///
    /// - `FormatError` - 当前bin的hits总数溢出u64（记录不计入，bin保持打开）
    pub fn push(&mut self, record: RawRecord) -> BaselineResult<Option<Bin>> {
        match std::mem::take(&mut self.state) {
            AggregatorState::Idle => {
                self.state = AggregatorState::Open(Bin::open(record));
                self.records_seen += 1;
                Ok(None)
            }
            AggregatorState::Open(mut bin) if bin.accepts(&record) => {
                let pushed = bin.push(record.power, record.hits);
                self.state = AggregatorState::Open(bin);
                pushed?;
                self.records_seen += 1;
                Ok(None)
            }
            AggregatorState::Open(bin) => {
                self.state = AggregatorState::Open(Bin::open(record));
                self.records_seen += 1;
                self.bins_closed += 1;
                Ok(Some(bin))
            }
        }
    }

    /// 记录流结束：关闭并返回仍处于Open状态的bin
    ///
    /// 重复调用返回 `None`，保证每个bin只关闭一次。
    pub fn finish(&mut self) -> Option<Bin> {
        match std::mem::take(&mut self.state) {
            AggregatorState::Open(bin) => {
                self.bins_closed += 1;
                Some(bin)
            }
            AggregatorState::Idle => None,
        }
    }

    /// 当前是否有未关闭的bin
    #[inline]
    pub fn is_open(&self) -> bool {
        matches!(self.state, AggregatorState::Open(_))
    }

    /// 已接收的有效记录数
    #[inline]
    pub fn records_seen(&self) -> usize {
        self.records_seen
    }

    /// 已关闭的bin数
    #[inline]
    pub fn bins_closed(&self) -> usize {
        self.bins_closed
    }

    /// 扫描一组文本行，每关闭一个bin调用一次 `on_bin_closed`
    ///
    /// # 错误
    ///
    /// - `FormatError` - 某行带分隔符但无法解析，或某个bin的hits总数溢出
    /// - `EmptyStream` - 没有任何有效记录（此时回调从未被调用）
    pub fn process<I, S, F>(lines: I, on_bin_closed: F) -> BaselineResult<AggregationSummary>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: FnMut(Bin),
    {
        Self::process_fallible(lines.into_iter().map(Ok), on_bin_closed)
    }

    /// 从 `BufRead` 逐行读取并聚合（不需要把整个响应体读入内存）
    pub fn process_reader<R, F>(reader: R, on_bin_closed: F) -> BaselineResult<AggregationSummary>
    where
        R: BufRead,
        F: FnMut(Bin),
    {
        Self::process_fallible(
            reader.lines().map(|line| line.map_err(BaselineError::from)),
            on_bin_closed,
        )
    }

    fn process_fallible<I, S, F>(
        lines: I,
        mut on_bin_closed: F,
    ) -> BaselineResult<AggregationSummary>
    where
        I: Iterator<Item = BaselineResult<S>>,
        S: AsRef<str>,
        F: FnMut(Bin),
    {
        let mut aggregator = Self::new();
        let mut summary = AggregationSummary::default();

        for (index, line) in lines.enumerate() {
            let line = line?;
            summary.lines += 1;

            let line_number = index + 1;
            match parse_line(line.as_ref(), line_number)? {
                Some(record) => {
                    let closed = aggregator.push(record).map_err(|e| match e {
                        BaselineError::FormatError(msg) => {
                            BaselineError::FormatError(format!("第{line_number}行{msg}"))
                        }
                        other => other,
                    })?;
                    if let Some(bin) = closed {
                        on_bin_closed(bin);
                    }
                }
                None => summary.skipped_lines += 1,
            }
        }

        if let Some(bin) = aggregator.finish() {
            on_bin_closed(bin);
        }

        if aggregator.records_seen() == 0 {
            return Err(BaselineError::EmptyStream(format!(
                "记录流中没有有效数据行（共{}行） / no data records in {} lines",
                summary.lines, summary.lines
            )));
        }

        summary.records = aggregator.records_seen();
        summary.bins = aggregator.bins_closed();
        log::debug!(
            "聚合完成 / aggregation done: {} records, {} bins, {} skipped lines",
            summary.records,
            summary.bins,
            summary.skipped_lines
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(text: &str) -> BaselineResult<(Vec<Bin>, AggregationSummary)> {
        let mut bins = Vec::new();
        let summary = BinAggregator::process(text.split('\n'), |bin| bins.push(bin))?;
        Ok((bins, summary))
    }

    #[test]
    fn test_groups_contiguous_frequencies() {
        let (bins, summary) =
            collect("1.0,-100,10\n1.0,-90,20\n1.0,-80,70\n2.0,-95,100\n").unwrap();

        assert_eq!(bins.len(), 2);
        assert_eq!(bins[0].frequency(), 1.0);
        assert_eq!(bins[0].hits(), &[10, 20, 70]);
        assert_eq!(bins[0].total_hits(), 100);
        assert_eq!(bins[1].frequency(), 2.0);
        assert_eq!(bins[1].total_hits(), 100);
        assert_eq!(summary.records, 4);
        assert_eq!(summary.bins, 2);
        // 末尾换行产生的空行被跳过
        assert_eq!(summary.skipped_lines, 1);
    }

    #[test]
    fn test_trailing_blank_line_does_not_create_bin() {
        let (with_newline, _) = collect("1.0,-100,10\n2.0,-95,5\n").unwrap();
        let (without_newline, _) = collect("1.0,-100,10\n2.0,-95,5").unwrap();
        let (many_blanks, _) = collect("1.0,-100,10\n2.0,-95,5\n\n\n   \n").unwrap();

        assert_eq!(with_newline, without_newline);
        assert_eq!(with_newline, many_blanks);
        assert_eq!(with_newline.len(), 2);
    }

    #[test]
    fn test_last_line_boundary_closes_both_bins_once() {
        // 最后一条结构行本身触发频率变化
        let (bins, summary) = collect("1.0,-100,10\n1.0,-90,20\n3.0,-70,1").unwrap();
        assert_eq!(bins.len(), 2);
        assert_eq!(summary.bins, 2);
        assert_eq!(bins[1].hits(), &[1]);
    }

    #[test]
    fn test_comments_and_headers_are_ignored() {
        let text = "# start=2020-01-01\n#frequency,power,hits\n\n0.5,-150,3\nnot-a-record\n0.5,-140,4\n";
        let (bins, summary) = collect(text).unwrap();
        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].total_hits(), 7);
        assert_eq!(summary.skipped_lines, 5);
    }

    #[test]
    fn test_empty_stream() {
        let mut called = false;
        let result = BinAggregator::process("# only\n\n#comments\n".lines(), |_| called = true);
        assert!(matches!(result, Err(BaselineError::EmptyStream(_))));
        assert!(!called);
    }

    #[test]
    fn test_non_contiguous_frequency_reopens_bin() {
        // 引擎不重排：同一频率再次出现会形成新bin
        let (bins, _) = collect("1.0,-100,1\n2.0,-100,1\n1.0,-90,1\n").unwrap();
        let freqs: Vec<f64> = bins.iter().map(Bin::frequency).collect();
        assert_eq!(freqs, vec![1.0, 2.0, 1.0]);
    }

    #[test]
    fn test_finish_is_idempotent() {
        let mut aggregator = BinAggregator::new();
        assert!(aggregator.finish().is_none());
        aggregator.push(RawRecord::new(1.0, -1.0, 1)).unwrap();
        assert!(aggregator.is_open());
        assert!(aggregator.finish().is_some());
        assert!(aggregator.finish().is_none());
        assert_eq!(aggregator.bins_closed(), 1);
    }

    #[test]
    fn test_overflowing_hits_keep_open_bin() {
        let mut aggregator = BinAggregator::new();
        aggregator.push(RawRecord::new(1.0, -100.0, 1)).unwrap();
        assert!(aggregator.push(RawRecord::new(1.0, -90.0, u64::MAX)).is_err());

        assert!(aggregator.is_open());
        assert_eq!(aggregator.records_seen(), 1);
        let bin = aggregator.finish().unwrap();
        assert_eq!(bin.hits(), &[1]);
    }

    #[test]
    fn test_process_reader() {
        let data = b"1.0,-100,10\n1.0,-90,20\n" as &[u8];
        let mut totals = Vec::new();
        let summary =
            BinAggregator::process_reader(data, |bin| totals.push(bin.total_hits())).unwrap();
        assert_eq!(totals, vec![30]);
        assert_eq!(summary.records, 2);
    }

    #[test]
    fn test_malformed_record_fails_channel() {
        let result = collect("1.0,-100,10\n1.0,-90\n");
        assert!(matches!(result, Err(BaselineError::FormatError(_))));
    }
}
