//! baseline-inspect - 基线文件离线检查工具
//!
//! 查看已生成的基线文件、对本地噪声PDF文本离线计算基线、比较两个基线文件。
//! 不访问网络。

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use comfy_table::{
    Cell, CellAlignment, ContentArrangement, Table,
    presets::{ASCII_MARKDOWN, UTF8_FULL},
};
use serde::Serialize;
use station_baseline::tools::constants::defaults;
use station_baseline::tools::formatter::{self, BaselineTable, BaselineTableRow};
use station_baseline::{AxisMode, BaselineConfig, PercentileRequest, compute_baseline_from_reader};

// ============================================================================
// CLI 定义
// ============================================================================

#[derive(Parser)]
#[command(name = "baseline-inspect")]
#[command(about = "基线文件检查工具 / Baseline file inspection tool")]
#[command(version)]
struct Cli {
    /// 输出调试日志（RUST_LOG 优先）
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 显示基线文件
    /// Show a baseline text file
    Show {
        /// 基线文件路径
        /// Baseline file path
        file: PathBuf,

        /// 输出格式：markdown, json, table（默认table）
        /// Output format: markdown, json, table (default: table)
        #[arg(long, short = 'f', default_value = "table")]
        format: OutputFormat,
    },

    /// 对本地噪声PDF文本计算基线
    /// Compute a baseline from a local noise-pdf dump
    Compute {
        /// `frequency,power,hits` 文本文件
        /// Noise-pdf text file
        pdf_file: PathBuf,

        /// 百分位列表（逗号分隔）
        /// Percentiles, comma separated
        #[arg(long, short = 'p', default_value = defaults::PERCENTILES)]
        percentiles: String,

        /// 横轴类型 period | frequency
        /// X axis type
        #[arg(long, short = 'x', default_value = defaults::AXIS)]
        xtype: String,

        /// 输出格式
        /// Output format
        #[arg(long, short = 'f', default_value = "table")]
        format: OutputFormat,
    },

    /// 比较两个基线文件
    /// Compare two baseline files row by row
    Compare {
        /// 基准基线文件
        /// Reference baseline file
        #[arg(long, short = 'b')]
        baseline: PathBuf,

        /// 候选基线文件
        /// Candidate baseline file
        #[arg(long, short = 'c')]
        candidate: PathBuf,

        /// 输出格式
        /// Output format
        #[arg(long, short = 'f', default_value = "markdown")]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum OutputFormat {
    #[default]
    Markdown,
    Json,
    Table,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "json" => Ok(OutputFormat::Json),
            "table" => Ok(OutputFormat::Table),
            _ => Err(format!("Unknown format: {s}")),
        }
    }
}

// ============================================================================
// 数据结构
// ============================================================================

/// 单行差值（候选 - 基准）
#[derive(Clone, Debug, Serialize)]
struct CompareRow {
    x: String,
    deltas: Vec<Option<f64>>,
}

/// 对比报告
#[derive(Clone, Debug, Serialize)]
struct CompareReport {
    baseline: String,
    candidate: String,
    axis: String,
    percentiles: Vec<String>,
    rows: Vec<CompareRow>,
    baseline_only: Vec<String>,
    candidate_only: Vec<String>,
    max_abs_delta: Option<f64>,
}

// ============================================================================
// 子命令实现
// ============================================================================

fn load_table(path: &Path) -> Result<BaselineTable> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("无法读取 / cannot read {}", path.display()))?;
    formatter::parse_baseline_text(&text)
        .with_context(|| format!("无法解析 / cannot parse {}", path.display()))
}

fn compute_table(pdf_file: &Path, percentiles: &str, xtype: &str) -> Result<BaselineTable> {
    let request = PercentileRequest::parse_list(percentiles)?;
    let axis: AxisMode = xtype.parse()?;
    let config = BaselineConfig::new(request, axis);

    let file = File::open(pdf_file)
        .with_context(|| format!("无法打开 / cannot open {}", pdf_file.display()))?;
    let baseline = compute_baseline_from_reader(BufReader::new(file), &config)
        .with_context(|| format!("基线计算失败 / baseline failed for {}", pdf_file.display()))?;

    for failure in &baseline.failures {
        eprintln!("[WARNING] {}", failure.error);
    }
    eprintln!(
        "{} lines, {} bins, {} rows, {} PSDs",
        baseline.summary.lines,
        baseline.summary.bins,
        baseline.rows.len(),
        baseline
            .psd_count
            .map(|n| n.to_string())
            .unwrap_or_else(|| "-".to_string())
    );

    Ok(BaselineTable {
        axis: axis.as_str().to_string(),
        percentiles: config
            .percentiles
            .values()
            .iter()
            .map(|p| p.to_string())
            .collect(),
        rows: baseline
            .rows
            .iter()
            .map(|row| BaselineTableRow {
                x: formatter::format_x_value(row, axis),
                values: row.values.clone(),
            })
            .collect(),
    })
}

fn compare_tables(
    baseline_path: &Path,
    baseline: &BaselineTable,
    candidate_path: &Path,
    candidate: &BaselineTable,
) -> Result<CompareReport> {
    if baseline.axis != candidate.axis {
        bail!(
            "横轴不一致 / axis mismatch: {} vs {}",
            baseline.axis,
            candidate.axis
        );
    }
    if baseline.percentiles != candidate.percentiles {
        bail!(
            "百分位列不一致 / percentile columns differ: {:?} vs {:?}",
            baseline.percentiles,
            candidate.percentiles
        );
    }

    let pairing = formatter::pair_baseline_rows(baseline, candidate)?;
    let rows: Vec<CompareRow> = pairing
        .pairs
        .iter()
        .map(|(row, other)| CompareRow {
            x: row.x.clone(),
            deltas: row
                .values
                .iter()
                .zip(&other.values)
                .map(|(a, b)| Some(b.as_ref()? - a.as_ref()?))
                .collect(),
        })
        .collect();

    let max_abs_delta = rows
        .iter()
        .flat_map(|r| r.deltas.iter().flatten())
        .map(|d| d.abs())
        .fold(None, |acc: Option<f64>, d| Some(acc.map_or(d, |m| m.max(d))));

    Ok(CompareReport {
        baseline: baseline_path.display().to_string(),
        candidate: candidate_path.display().to_string(),
        axis: baseline.axis.clone(),
        percentiles: baseline.percentiles.clone(),
        rows,
        baseline_only: pairing.baseline_only,
        candidate_only: pairing.candidate_only,
        max_abs_delta,
    })
}

// ============================================================================
// 输出
// ============================================================================

fn format_value(value: Option<f64>) -> String {
    value
        .map(|v| format!("{v:.2}"))
        .unwrap_or_else(|| formatter::MISSING_VALUE.to_string())
}

fn new_table(format: OutputFormat) -> Table {
    let mut table = Table::new();
    match format {
        OutputFormat::Markdown => table.load_preset(ASCII_MARKDOWN),
        _ => table.load_preset(UTF8_FULL),
    };
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn column_headers(axis: &str, percentiles: &[String]) -> Vec<String> {
    std::iter::once(axis.to_string())
        .chain(percentiles.iter().map(|p| format!("p{p}")))
        .collect()
}

fn output_baseline(table: &BaselineTable, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(table)?);
        return Ok(());
    }

    if format == OutputFormat::Markdown {
        println!("## Baseline / 噪声基线\n");
        println!("- **Axis / 横轴**: {}", table.axis);
        println!("- **Rows / 行数**: {}\n", table.rows.len());
    }

    let mut out = new_table(format);
    out.set_header(column_headers(&table.axis, &table.percentiles));
    for row in &table.rows {
        let mut cells = vec![Cell::new(&row.x)];
        cells.extend(
            row.values
                .iter()
                .map(|v| Cell::new(format_value(*v)).set_alignment(CellAlignment::Right)),
        );
        out.add_row(cells);
    }
    println!("{out}");
    Ok(())
}

fn output_compare(report: &CompareReport, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("## Baseline Comparison / 基线对比\n");
    println!("- **Baseline / 基准**: {}", report.baseline);
    println!("- **Candidate / 候选**: {}", report.candidate);
    println!("- **Matched rows / 匹配行数**: {}", report.rows.len());
    if let Some(max) = report.max_abs_delta {
        println!("- **Max |delta| / 最大差值**: {max:.2} dB");
    }
    if !report.baseline_only.is_empty() {
        println!("- **Baseline only / 仅基准**: {}", report.baseline_only.join(", "));
    }
    if !report.candidate_only.is_empty() {
        println!("- **Candidate only / 仅候选**: {}", report.candidate_only.join(", "));
    }
    println!();

    let mut out = new_table(format);
    out.set_header(column_headers(&report.axis, &report.percentiles));
    for row in &report.rows {
        let mut cells = vec![Cell::new(&row.x)];
        cells.extend(row.deltas.iter().map(|d| {
            let text = d.map(|v| format!("{v:+.2}")).unwrap_or_else(|| "-".to_string());
            Cell::new(text).set_alignment(CellAlignment::Right)
        }));
        out.add_row(cells);
    }
    println!("{out}");
    Ok(())
}

// ============================================================================
// 主函数
// ============================================================================

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Show { file, format } => {
            let table = load_table(&file)?;
            output_baseline(&table, format)
        }
        Commands::Compute {
            pdf_file,
            percentiles,
            xtype,
            format,
        } => {
            let table = compute_table(&pdf_file, &percentiles, &xtype)?;
            output_baseline(&table, format)
        }
        Commands::Compare {
            baseline,
            candidate,
            format,
        } => {
            let reference = load_table(&baseline)?;
            let other = load_table(&candidate)?;
            let report = compare_tables(&baseline, &reference, &candidate, &other)?;
            output_compare(&report, format)
        }
    }
}
