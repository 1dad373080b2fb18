//! 通道处理模块
//!
//! 负责单个通道的数据获取、基线计算与基线文件写出，以及串行批处理驱动。

use super::batch_state::{BatchStatsSnapshot, SerialBatchStats};
use super::cli::{AppConfig, BaselineFileFormat};
use super::fetcher::{NoiseSource, PdfRequest};
use super::formatter::{self, SummaryRow};
use super::utils;
use crate::core::{ChannelBaseline, compute_baseline};
use crate::error::{BaselineError, BaselineResult, ErrorCategory};
use std::path::PathBuf;

/// 单个通道的成功处理结果
#[derive(Debug)]
pub struct ChannelOutcome {
    pub request: PdfRequest,
    pub baseline: ChannelBaseline,
    /// 写出的基线文件路径
    pub output_path: PathBuf,
}

/// 单个通道的处理报告（成功或失败）
#[derive(Debug)]
pub struct ChannelReport {
    /// 通道在请求列表中的位置
    pub index: usize,
    pub request: PdfRequest,
    pub result: BaselineResult<ChannelOutcome>,
}

impl ChannelReport {
    /// 汇总表行
    pub fn summary_row(&self) -> SummaryRow {
        match &self.result {
            Ok(outcome) => SummaryRow {
                channel: self.request.channel_id(),
                succeeded: true,
                rows: outcome.baseline.rows.len(),
                psd_count: outcome.baseline.psd_count,
                bin_failures: outcome.baseline.failures.len(),
                detail: utils::extract_filename_lossy(&outcome.output_path),
            },
            Err(e) => SummaryRow {
                channel: self.request.channel_id(),
                succeeded: false,
                rows: 0,
                psd_count: None,
                bin_failures: 0,
                detail: format!("[{}] {e}", ErrorCategory::from_baseline_error(e).display_name()),
            },
        }
    }
}

/// 获取并计算一个通道的基线（不写文件）
pub fn compute_channel(
    request: &PdfRequest,
    config: &AppConfig,
    source: &dyn NoiseSource,
) -> BaselineResult<ChannelBaseline> {
    log::info!("fetching {}", source.describe(request));
    let text = source.fetch(request)?;

    let baseline = compute_baseline(text.lines(), &config.baseline).map_err(|e| match e {
        BaselineError::EmptyStream(msg) => {
            BaselineError::EmptyStream(format!("{}: {msg}", request.channel_id()))
        }
        other => other,
    })?;

    for failure in &baseline.failures {
        log::warn!(
            "{} frequency {}: {}",
            request.channel_id(),
            failure.label,
            failure.error
        );
    }
    log::debug!(
        "{}: {} lines, {} bins, {} rows",
        request.channel_id(),
        baseline.summary.lines,
        baseline.summary.bins,
        baseline.rows.len()
    );

    if baseline.rows.is_empty() {
        return Err(BaselineError::EmptyStream(format!(
            "{}: 所有bin均被丢弃 / every bin was dropped",
            request.channel_id()
        )));
    }

    Ok(baseline)
}

/// 将基线写入 `output_dir/NET.STA.LOC.CHAN.<ext>`
pub fn save_baseline(
    request: &PdfRequest,
    baseline: &ChannelBaseline,
    config: &AppConfig,
) -> BaselineResult<PathBuf> {
    utils::ensure_dir(&config.output_dir)?;

    let file_name = utils::baseline_file_name(
        &request.network,
        &request.station,
        &request.location,
        &request.channel,
        config.output_format.extension(),
    );
    let path = config.output_dir.join(file_name);

    let content = match config.output_format {
        BaselineFileFormat::Text => formatter::format_baseline_text(baseline, &config.baseline),
        BaselineFileFormat::Json => {
            formatter::format_baseline_json(request, baseline, &config.baseline)?
        }
    };
    formatter::write_output(&path, &content)?;
    log::info!("baseline written: {}", path.display());

    Ok(path)
}

/// 处理单个通道：获取 → 计算 → 写出基线文件
pub fn process_channel(
    request: &PdfRequest,
    config: &AppConfig,
    source: &dyn NoiseSource,
) -> BaselineResult<ChannelOutcome> {
    let baseline = compute_channel(request, config, source)?;
    let output_path = save_baseline(request, &baseline, config)?;

    Ok(ChannelOutcome {
        request: request.clone(),
        baseline,
        output_path,
    })
}

/// 配置中所有通道的请求（按请求顺序）
pub fn channel_requests(config: &AppConfig) -> Vec<PdfRequest> {
    config
        .channels
        .iter()
        .map(|channel| PdfRequest::for_channel(config, channel))
        .collect()
}

/// 串行处理所有通道
pub fn process_channels_serial(
    config: &AppConfig,
    source: &dyn NoiseSource,
) -> (Vec<ChannelReport>, BatchStatsSnapshot) {
    let requests = channel_requests(config);
    let total = requests.len();
    let mut stats = SerialBatchStats::new();
    let mut reports = Vec::with_capacity(total);

    for (index, request) in requests.into_iter().enumerate() {
        if config.verbose {
            println!(
                "[PROCESSING] [{}/{}] 处理 / Processing: {}",
                index + 1,
                total,
                request.channel_id()
            );
        }

        let result = process_channel(&request, config, source);
        match &result {
            Ok(outcome) => {
                stats.inc_processed(outcome.baseline.failures.len());
                if config.verbose {
                    println!("   [OK] 处理成功 / Processing succeeded");
                }
            }
            Err(e) => {
                report_failure(index, total, &request, e, config.verbose);
                stats.inc_failed(e, request.channel_id());
            }
        }

        reports.push(ChannelReport {
            index,
            request,
            result,
        });
    }

    (reports, stats.snapshot())
}

/// 输出通道失败信息
pub(crate) fn report_failure(
    index: usize,
    total: usize,
    request: &PdfRequest,
    error: &BaselineError,
    verbose: bool,
) {
    let category = ErrorCategory::from_baseline_error(error);
    if verbose {
        println!("   [FAIL] 处理失败 / Processing failed");
        println!("      通道 / Channel: {}", request.channel_id());
        println!("      类别 / Category: {}", category.display_name());
        println!("      错误 / Error: {error}");
        if let Some(source) = std::error::Error::source(error) {
            println!("      原因 / Cause: {source}");
        }
    } else {
        println!(
            "[FAIL] [{}/{}] {} - [{}] {error} / 处理失败",
            index + 1,
            total,
            request.channel_id(),
            category.display_name()
        );
    }
}

/// 批处理收尾：汇总表与错误统计
pub fn show_batch_completion_info(reports: &[ChannelReport], snapshot: &BatchStatsSnapshot) {
    let rows: Vec<SummaryRow> = reports.iter().map(ChannelReport::summary_row).collect();
    println!("{}", formatter::create_summary_table(&rows));
    print!("{}", formatter::create_batch_footer(snapshot));
}
