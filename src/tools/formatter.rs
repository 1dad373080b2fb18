//! 输出格式化模块
//!
//! 负责基线文件（文本/JSON）的生成与解析，以及终端汇总表格。

use super::batch_state::BatchStatsSnapshot;
use super::fetcher::PdfRequest;
use crate::core::{AxisMode, BaselineConfig, BaselineRow, ChannelBaseline};
use crate::error::{BaselineError, BaselineResult};
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets::UTF8_FULL};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

/// 应用程序版本信息
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 不可达百分位在文本文件中的占位符
pub const MISSING_VALUE: &str = "nan";

/// 基线文件头：`#<axis> <p1> percentile <p2> percentile ...`
pub fn baseline_header(config: &BaselineConfig) -> String {
    let mut header = format!("#{}", config.axis.as_str());
    for p in config.percentiles.values() {
        header.push_str(&format!(" {p} percentile"));
    }
    header.push('\n');
    header
}

/// 横轴值文本
///
/// 频率模式直接使用源数据中的频率文本；周期模式使用最短往返十进制表示。
pub fn format_x_value(row: &BaselineRow, axis: AxisMode) -> String {
    match axis {
        AxisMode::Frequency => row.label.clone(),
        AxisMode::Period => row.x_value.to_string(),
    }
}

/// 功率值文本（两位小数）
#[inline]
pub fn format_power(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2}"),
        None => MISSING_VALUE.to_string(),
    }
}

/// 生成文本格式的基线文件内容
pub fn format_baseline_text(baseline: &ChannelBaseline, config: &BaselineConfig) -> String {
    let mut output = baseline_header(config);
    for row in &baseline.rows {
        output.push_str(&format_x_value(row, config.axis));
        for value in &row.values {
            output.push(' ');
            output.push_str(&format_power(*value));
        }
        output.push('\n');
    }
    output
}

/// JSON基线文档
#[derive(Debug, Serialize)]
struct BaselineDocument<'a> {
    tool_version: &'a str,
    generated_at: String,
    target: String,
    start: String,
    end: String,
    axis: AxisMode,
    percentiles: &'a [f64],
    psd_count: Option<u64>,
    rows: &'a [BaselineRow],
    failures: Vec<String>,
}

/// 生成JSON格式的基线文件内容
pub fn format_baseline_json(
    request: &PdfRequest,
    baseline: &ChannelBaseline,
    config: &BaselineConfig,
) -> BaselineResult<String> {
    let document = BaselineDocument {
        tool_version: VERSION,
        generated_at: chrono::Utc::now().to_rfc3339(),
        target: request.channel_id(),
        start: request.dates.start.to_string(),
        end: request.dates.end.to_string(),
        axis: config.axis,
        percentiles: config.percentiles.values(),
        psd_count: baseline.psd_count,
        rows: &baseline.rows,
        failures: baseline
            .failures
            .iter()
            .map(|f| f.error.to_string())
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

/// 写入输出文件
pub fn write_output(path: &Path, content: &str) -> BaselineResult<()> {
    std::fs::write(path, content).map_err(|e| {
        BaselineError::IoError(std::io::Error::new(
            e.kind(),
            format!("写入失败 {}: {e}", path.display()),
        ))
    })
}

// ==================== 基线文件解析 ====================

/// 解析后的基线文件
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaselineTable {
    /// 横轴名称（头部第一项）
    pub axis: String,
    /// 百分位列标签（按列顺序）
    pub percentiles: Vec<String>,
    pub rows: Vec<BaselineTableRow>,
}

/// 解析后的基线文件行
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaselineTableRow {
    pub x: String,
    pub values: Vec<Option<f64>>,
}

/// 解析文本格式的基线文件
pub fn parse_baseline_text(text: &str) -> BaselineResult<BaselineTable> {
    let mut lines = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());

    let (_, header) = lines
        .next()
        .ok_or_else(|| BaselineError::FormatError("基线文件为空".to_string()))?;
    let header = header
        .trim()
        .strip_prefix('#')
        .ok_or_else(|| BaselineError::FormatError(format!("缺少文件头: {header:?}")))?;

    let mut tokens = header.split_whitespace();
    let axis = tokens
        .next()
        .ok_or_else(|| BaselineError::FormatError("文件头缺少横轴名称".to_string()))?
        .to_string();
    let percentiles: Vec<String> = tokens
        .filter(|t| *t != "percentile")
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for (index, line) in lines {
        let mut fields = line.split_whitespace();
        let Some(x) = fields.next() else { continue };
        let values = fields
            .map(|field| parse_power(field, index + 1))
            .collect::<BaselineResult<Vec<_>>>()?;

        if values.len() != percentiles.len() {
            return Err(BaselineError::FormatError(format!(
                "第{}行有{}个值，文件头声明{}个百分位",
                index + 1,
                values.len(),
                percentiles.len()
            )));
        }
        rows.push(BaselineTableRow {
            x: x.to_string(),
            values,
        });
    }

    Ok(BaselineTable {
        axis,
        percentiles,
        rows,
    })
}

fn parse_power(field: &str, line_number: usize) -> BaselineResult<Option<f64>> {
    if field.eq_ignore_ascii_case(MISSING_VALUE) {
        return Ok(None);
    }
    field
        .parse::<f64>()
        .map(Some)
        .map_err(|e| BaselineError::FormatError(format!("第{line_number}行数值无效 {field:?}: {e}")))
}

// ==================== 基线文件配对 ====================

/// 两个基线文件的行配对结果
#[derive(Debug, Clone, PartialEq)]
pub struct RowPairing<'a> {
    /// (基准行, 候选行)，按基准文件顺序
    pub pairs: Vec<(&'a BaselineTableRow, &'a BaselineTableRow)>,
    pub baseline_only: Vec<String>,
    pub candidate_only: Vec<String>,
}

/// 配对两个基线文件的行
///
/// 两个文件的横轴标签序列完全相同时按位置配对（重复标签也能对齐）。
/// 否则按标签配对；此时任一文件中出现重复标签都无法唯一配对，返回 `InvalidInput`。
pub fn pair_baseline_rows<'a>(
    baseline: &'a BaselineTable,
    candidate: &'a BaselineTable,
) -> BaselineResult<RowPairing<'a>> {
    let same_labels = baseline.rows.len() == candidate.rows.len()
        && baseline
            .rows
            .iter()
            .zip(&candidate.rows)
            .all(|(a, b)| a.x == b.x);
    if same_labels {
        return Ok(RowPairing {
            pairs: baseline.rows.iter().zip(&candidate.rows).collect(),
            baseline_only: Vec::new(),
            candidate_only: Vec::new(),
        });
    }

    let baseline_index = index_by_label(baseline, "基准 / baseline")?;
    let candidate_index = index_by_label(candidate, "候选 / candidate")?;

    let mut pairs = Vec::new();
    let mut baseline_only = Vec::new();
    for row in &baseline.rows {
        match candidate_index.get(row.x.as_str()) {
            Some(other) => pairs.push((row, *other)),
            None => baseline_only.push(row.x.clone()),
        }
    }
    let candidate_only = candidate
        .rows
        .iter()
        .filter(|row| !baseline_index.contains_key(row.x.as_str()))
        .map(|row| row.x.clone())
        .collect();

    Ok(RowPairing {
        pairs,
        baseline_only,
        candidate_only,
    })
}

fn index_by_label<'a>(
    table: &'a BaselineTable,
    name: &str,
) -> BaselineResult<HashMap<&'a str, &'a BaselineTableRow>> {
    let mut index = HashMap::with_capacity(table.rows.len());
    let mut duplicates: Vec<&str> = Vec::new();
    for row in &table.rows {
        if index.insert(row.x.as_str(), row).is_some() && !duplicates.contains(&row.x.as_str()) {
            duplicates.push(&row.x);
        }
    }

    if !duplicates.is_empty() {
        return Err(BaselineError::InvalidInput(format!(
            "{name} 横轴标签重复，无法按标签配对 / duplicate x labels: {}",
            duplicates.join(", ")
        )));
    }
    Ok(index)
}

// ==================== 终端汇总 ====================

/// 汇总表中的一行（每个通道一行）
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub channel: String,
    pub succeeded: bool,
    pub rows: usize,
    pub psd_count: Option<u64>,
    pub bin_failures: usize,
    /// 成功时为输出文件名，失败时为错误描述
    pub detail: String,
}

/// 生成通道汇总表
pub fn create_summary_table(rows: &[SummaryRow]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "Channel / 通道",
        "Status / 状态",
        "Rows / 行数",
        "PSDs",
        "Bin failures / bin失败",
        "Output / 输出",
    ]);

    for row in rows {
        let status = if row.succeeded { "OK" } else { "FAIL" };
        let psd = row
            .psd_count
            .map(|n| n.to_string())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            Cell::new(&row.channel),
            Cell::new(status),
            Cell::new(row.rows).set_alignment(CellAlignment::Right),
            Cell::new(psd).set_alignment(CellAlignment::Right),
            Cell::new(row.bin_failures).set_alignment(CellAlignment::Right),
            Cell::new(&row.detail),
        ]);
    }

    table
}

/// 批处理统计尾注（含错误分类）
pub fn create_batch_footer(snapshot: &BatchStatsSnapshot) -> String {
    let total = snapshot.processed + snapshot.failed;
    let mut output = String::new();

    output.push('\n');
    output.push_str("=====================================\n");
    output.push_str("批量处理统计:\n");
    output.push_str(&format!("   总通道数: {total}\n"));
    output.push_str(&format!("   成功处理: {}\n", snapshot.processed));
    output.push_str(&format!("   处理失败: {}\n", snapshot.failed));
    if total > 0 {
        output.push_str(&format!(
            "   处理成功率: {:.1}%\n",
            snapshot.processed as f64 / total as f64 * 100.0
        ));
    }
    if snapshot.bin_failures > 0 {
        output.push_str(&format!("   丢弃/不完整bin: {}\n", snapshot.bin_failures));
    }

    if !snapshot.error_stats.is_empty() {
        output.push_str("\n错误分类:\n");
        let mut categories: Vec<_> = snapshot.error_stats.iter().collect();
        categories.sort_by_key(|(category, _)| category.display_name());
        for (category, channels) in categories {
            output.push_str(&format!(
                "   {}: {} ({})\n",
                category.display_name(),
                channels.len(),
                channels.join(", ")
            ));
        }
    }

    output.push('\n');
    output.push_str(&format!("生成工具: Station Baseline v{VERSION}\n"));
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{PercentileRequest, compute_baseline};

    fn config(axis: AxisMode) -> BaselineConfig {
        BaselineConfig::new(
            PercentileRequest::new(vec![10.0, 50.0, 90.0]).unwrap(),
            axis,
        )
    }

    const STREAM: &str = "1.0,-100,10\n1.0,-90,20\n1.0,-80,70\n2.0,-95,100\n";

    #[test]
    fn test_text_output_frequency() {
        let cfg = config(AxisMode::Frequency);
        let baseline = compute_baseline(STREAM.lines(), &cfg).unwrap();
        let text = format_baseline_text(&baseline, &cfg);
        assert_eq!(
            text,
            "#frequency 10 percentile 50 percentile 90 percentile\n\
             1.0 -100.00 -90.00 -90.00\n\
             2.0 -95.00 -95.00 -95.00\n"
        );
    }

    #[test]
    fn test_text_output_period() {
        let cfg = config(AxisMode::Period);
        let baseline = compute_baseline(STREAM.lines(), &cfg).unwrap();
        let text = format_baseline_text(&baseline, &cfg);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "#period 10 percentile 50 percentile 90 percentile");
        assert_eq!(lines[1], "1 -100.00 -90.00 -90.00");
        assert_eq!(lines[2], "0.5 -95.00 -95.00 -95.00");
    }

    #[test]
    fn test_missing_value_token() {
        assert_eq!(format_power(None), "nan");
        assert_eq!(format_power(Some(-120.456)), "-120.46");
    }

    #[test]
    fn test_parse_written_file() {
        let cfg = config(AxisMode::Frequency);
        let baseline = compute_baseline(STREAM.lines(), &cfg).unwrap();
        let table = parse_baseline_text(&format_baseline_text(&baseline, &cfg)).unwrap();

        assert_eq!(table.axis, "frequency");
        assert_eq!(table.percentiles, vec!["10", "50", "90"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].x, "1.0");
        assert_eq!(table.rows[0].values[0], Some(-100.0));
    }

    #[test]
    fn test_parse_rejects_bad_files() {
        assert!(parse_baseline_text("").is_err());
        assert!(parse_baseline_text("1.0 -100.00\n").is_err());
        assert!(parse_baseline_text("#frequency 5 percentile\n1.0 -1.00 -2.00\n").is_err());
        let table = parse_baseline_text("#period 5 percentile\n2 nan\n").unwrap();
        assert_eq!(table.rows[0].values, vec![None]);
    }

    fn table(labels: &[&str], value: f64) -> BaselineTable {
        BaselineTable {
            axis: "frequency".to_string(),
            percentiles: vec!["50".to_string()],
            rows: labels
                .iter()
                .map(|x| BaselineTableRow {
                    x: x.to_string(),
                    values: vec![Some(value)],
                })
                .collect(),
        }
    }

    #[test]
    fn test_pair_rows_by_position_keeps_duplicates() {
        let a = table(&["1.0", "2.0", "1.0"], -100.0);
        let b = table(&["1.0", "2.0", "1.0"], -90.0);
        let pairing = pair_baseline_rows(&a, &b).unwrap();

        assert_eq!(pairing.pairs.len(), 3, "重复标签按位置对齐，不能合并");
        assert!(std::ptr::eq(pairing.pairs[2].1, &b.rows[2]));
        assert!(pairing.baseline_only.is_empty() && pairing.candidate_only.is_empty());
    }

    #[test]
    fn test_pair_rows_by_label() {
        let a = table(&["1.0", "2.0", "4.0"], -100.0);
        let b = table(&["2.0", "1.0", "8.0"], -90.0);
        let pairing = pair_baseline_rows(&a, &b).unwrap();

        let matched: Vec<&str> = pairing.pairs.iter().map(|(x, _)| x.x.as_str()).collect();
        assert_eq!(matched, vec!["1.0", "2.0"]);
        assert_eq!(pairing.baseline_only, vec!["4.0"]);
        assert_eq!(pairing.candidate_only, vec!["8.0"]);
    }

    #[test]
    fn test_pair_rows_rejects_ambiguous_duplicates() {
        let a = table(&["1.0", "2.0", "1.0"], -100.0);
        let b = table(&["1.0", "2.0"], -90.0);
        match pair_baseline_rows(&a, &b) {
            Err(BaselineError::InvalidInput(msg)) => assert!(msg.contains("1.0"), "{msg}"),
            other => panic!("期望InvalidInput，实际: {other:?}"),
        }
    }

    #[test]
    fn test_summary_table_renders() {
        let table = create_summary_table(&[SummaryRow {
            channel: "BHZ".into(),
            succeeded: true,
            rows: 95,
            psd_count: Some(1234),
            bin_failures: 0,
            detail: "IU.ANMO.00.BHZ.txt".into(),
        }]);
        let rendered = table.to_string();
        assert!(rendered.contains("BHZ"));
        assert!(rendered.contains("1234"));
    }

    #[test]
    fn test_batch_footer_lists_failed_channels() {
        use crate::error::ErrorCategory;

        let mut snapshot = BatchStatsSnapshot {
            processed: 2,
            failed: 1,
            ..Default::default()
        };
        snapshot
            .error_stats
            .insert(ErrorCategory::Network, vec!["IU.ANMO.00.BH2".to_string()]);

        let footer = create_batch_footer(&snapshot);
        assert!(footer.contains("总通道数: 3"));
        assert!(footer.contains("66.7%"));
        assert!(footer.contains("网络错误: 1 (IU.ANMO.00.BH2)"));
    }
}
