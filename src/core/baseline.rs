//! 通道基线装配
//!
//! 把聚合器关闭的每个bin交给百分位提取器，再经横轴变换组装为输出行。
//! bin级错误（退化bin、百分位不可达、坐标变换失败）只记录为该bin的失败，
//! 不中断同一通道后续bin的处理。

use super::aggregator::{AggregationSummary, BinAggregator};
use super::axis::AxisMode;
use super::bin::Bin;
use super::percentile::{PercentileExtractor, PercentileRequest};
use crate::error::{BaselineError, BaselineResult};
use serde::Serialize;
use std::io::BufRead;

/// 核心计算配置（不可变，显式传入，无全局状态）
#[derive(Debug, Clone, PartialEq)]
pub struct BaselineConfig {
    /// 百分位请求（决定输出列顺序）
    pub percentiles: PercentileRequest,

    /// 横轴模式
    pub axis: AxisMode,

    /// 是否收集PDF散点（仅绘图需要）
    pub collect_pdf: bool,
}

impl BaselineConfig {
    pub fn new(percentiles: PercentileRequest, axis: AxisMode) -> Self {
        Self {
            percentiles,
            axis,
            collect_pdf: false,
        }
    }

    /// 同时收集PDF散点
    pub fn with_pdf(mut self, collect_pdf: bool) -> Self {
        self.collect_pdf = collect_pdf;
        self
    }
}

/// 基线输出行（每个关闭的bin一行）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaselineRow {
    /// bin频率（Hz）
    pub frequency: f64,

    /// 源数据中的频率文本
    pub label: String,

    /// 横轴值（频率或周期）
    pub x_value: f64,

    /// 与百分位请求对齐的功率值（dB），不可达为 `None`
    pub values: Vec<Option<f64>>,
}

/// PDF散点（绘图用）
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PdfPoint {
    pub x_value: f64,
    pub power: f64,
    /// 该功率级别在bin内的概率（%）
    pub probability: f64,
}

/// 单个bin的失败记录
#[derive(Debug)]
pub struct BinFailure {
    pub label: String,
    pub frequency: f64,
    pub error: BaselineError,
}

/// 一个通道的完整基线结果
#[derive(Debug, Default)]
pub struct ChannelBaseline {
    /// 输出行（按bin关闭顺序）
    pub rows: Vec<BaselineRow>,

    /// bin级失败
    pub failures: Vec<BinFailure>,

    /// 参与统计的PSD数量（取第一个bin的总计数）
    pub psd_count: Option<u64>,

    /// PDF散点（仅在 `collect_pdf` 时填充）
    pub pdf: Vec<PdfPoint>,

    /// 聚合统计
    pub summary: AggregationSummary,
}

impl ChannelBaseline {
    /// 第 `index` 个百分位的曲线（跳过不可达值）
    pub fn curve(&self, index: usize) -> Vec<(f64, f64)> {
        self.rows
            .iter()
            .filter_map(|row| {
                row.values
                    .get(index)
                    .copied()
                    .flatten()
                    .map(|v| (row.x_value, v))
            })
            .collect()
    }
}

/// 行装配器：逐个接收关闭的bin
#[derive(Debug)]
pub struct BaselineAssembler<'a> {
    config: &'a BaselineConfig,
    extractor: PercentileExtractor,
    output: ChannelBaseline,
}

impl<'a> BaselineAssembler<'a> {
    pub fn new(config: &'a BaselineConfig) -> Self {
        Self {
            config,
            extractor: PercentileExtractor::new(config.percentiles.clone()),
            output: ChannelBaseline::default(),
        }
    }

    /// 处理一个关闭的bin
    ///
    /// bin在此被消费，处理完成后不再保留。
    pub fn accept(&mut self, bin: Bin) {
        if self.output.psd_count.is_none() {
            self.output.psd_count = Some(bin.total_hits());
        }

        let percentiles = match self.extractor.extract_bin(&bin) {
            Ok(p) => p,
            Err(error) => return self.fail(&bin, error),
        };

        let x_value = match self.config.axis.transform(bin.frequency()) {
            Ok(x) => x,
            Err(BaselineError::AxisTransformError(msg)) => {
                let error = BaselineError::AxisTransformError(format!(
                    "frequency {}: {msg}",
                    bin.label()
                ));
                return self.fail(&bin, error);
            }
            Err(error) => return self.fail(&bin, error),
        };

        if !percentiles.is_complete() {
            let error = BaselineError::PercentileUnreachable(format!(
                "frequency {}: percentiles {:?} (total_hits={})",
                bin.label(),
                percentiles.unreachable,
                bin.total_hits()
            ));
            self.fail(&bin, error);
        }

        if self.config.collect_pdf {
            self.output.pdf.extend(
                bin.powers()
                    .iter()
                    .zip(bin.probabilities())
                    .map(|(&power, probability)| PdfPoint {
                        x_value,
                        power,
                        probability,
                    }),
            );
        }

        self.output.rows.push(BaselineRow {
            frequency: bin.frequency(),
            label: bin.label().to_string(),
            x_value,
            values: percentiles.values,
        });
    }

    fn fail(&mut self, bin: &Bin, error: BaselineError) {
        log::debug!("bin {} 失败 / failed: {error}", bin.label());
        self.output.failures.push(BinFailure {
            label: bin.label().to_string(),
            frequency: bin.frequency(),
            error,
        });
    }

    /// 结束装配
    pub fn finish(mut self, summary: AggregationSummary) -> ChannelBaseline {
        self.output.summary = summary;
        self.output
    }
}

/// 对一组文本行计算通道基线
///
/// # 错误
///
/// 仅返回通道级错误（`EmptyStream`、`FormatError`）；bin级错误记录在
/// [`ChannelBaseline::failures`] 中。
pub fn compute_baseline<I, S>(lines: I, config: &BaselineConfig) -> BaselineResult<ChannelBaseline>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut assembler = BaselineAssembler::new(config);
    let summary = BinAggregator::process(lines, |bin| assembler.accept(bin))?;
    Ok(assembler.finish(summary))
}

/// 从 `BufRead` 计算通道基线
pub fn compute_baseline_from_reader<R: BufRead>(
    reader: R,
    config: &BaselineConfig,
) -> BaselineResult<ChannelBaseline> {
    let mut assembler = BaselineAssembler::new(config);
    let summary = BinAggregator::process_reader(reader, |bin| assembler.accept(bin))?;
    Ok(assembler.finish(summary))
}
