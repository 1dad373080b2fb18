//! 命令行接口模块
//!
//! 负责命令行参数解析、配置管理和程序信息展示。

use super::constants::{defaults, service};
use crate::core::{AxisMode, BaselineConfig, PercentileRequest};
use crate::error::{BaselineError, BaselineResult};
use chrono::NaiveDate;
use clap::{Arg, ArgMatches, Command};
use std::path::PathBuf;
use std::str::FromStr;

/// 应用程序版本信息
const VERSION: &str = env!("CARGO_PKG_VERSION");
const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// 日期输入格式
const DATE_FORMAT: &str = "%Y-%m-%d";

/// 基线文件格式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BaselineFileFormat {
    /// 空格分隔文本（与历史基线文件兼容）
    #[default]
    Text,
    /// JSON文档
    Json,
}

impl BaselineFileFormat {
    /// 文件扩展名
    pub fn extension(self) -> &'static str {
        match self {
            BaselineFileFormat::Text => "txt",
            BaselineFileFormat::Json => "json",
        }
    }
}

impl FromStr for BaselineFileFormat {
    type Err = BaselineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(BaselineFileFormat::Text),
            "json" => Ok(BaselineFileFormat::Json),
            other => Err(BaselineError::InvalidInput(format!(
                "未知的输出格式: {other} (text | json)"
            ))),
        }
    }
}

/// 百分位曲线的绘制方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PercentPlotType {
    /// 折线
    #[default]
    Line,
    /// 每个bin一个短横标记
    Scatter,
}

impl FromStr for PercentPlotType {
    type Err = BaselineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "line" => Ok(PercentPlotType::Line),
            "scatter" => Ok(PercentPlotType::Scatter),
            other => Err(BaselineError::InvalidInput(format!(
                "未知的百分位绘制方式: {other} (line | scatter)"
            ))),
        }
    }
}

/// 请求时间窗口
///
/// 开始与结束日期相同时，窗口覆盖开始当天（结束日期顺延一天）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// 开始日期（含）
    pub start: NaiveDate,
    /// 结束日期（不含）
    pub end: NaiveDate,
    /// 是否为单日窗口
    pub single_day: bool,
}

impl DateRange {
    /// 解析 `YYYY-MM-DD` 格式的开始/结束日期
    pub fn parse(start: &str, end: &str) -> BaselineResult<Self> {
        let start = parse_date(start, "start")?;
        let requested_end = parse_date(end, "end")?;

        if requested_end < start {
            return Err(BaselineError::InvalidInput(format!(
                "结束日期必须不早于开始日期 / end must be >= start: {requested_end} < {start}"
            )));
        }

        let single_day = requested_end == start;
        let end = if single_day {
            start.succ_opt().ok_or_else(|| {
                BaselineError::InvalidInput(format!("日期超出范围: {start}"))
            })?
        } else {
            requested_end
        };

        Ok(Self {
            start,
            end,
            single_day,
        })
    }

    /// 标题/报告中使用的时间描述
    pub fn label(&self) -> String {
        if self.single_day {
            self.start.format(DATE_FORMAT).to_string()
        } else {
            format!(
                "{} - {}",
                self.start.format(DATE_FORMAT),
                self.end.format(DATE_FORMAT)
            )
        }
    }
}

fn parse_date(text: &str, name: &str) -> BaselineResult<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).map_err(|e| {
        BaselineError::InvalidInput(format!("无效的{name}日期 {text:?} (YYYY-MM-DD): {e}"))
    })
}

/// 应用程序配置
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// 台网代码
    pub network: String,

    /// 台站代码
    pub station: String,

    /// 位置代码（`DASH` 已替换为 `--`）
    pub location: String,

    /// 通道列表（按请求顺序）
    pub channels: Vec<String>,

    /// 请求时间窗口
    pub dates: DateRange,

    /// 核心计算配置
    pub baseline: BaselineConfig,

    /// 是否生成基线图
    pub plot: bool,

    /// 百分位曲线绘制方式
    pub percent_plot_type: PercentPlotType,

    /// 基线文件格式
    pub output_format: BaselineFileFormat,

    /// 基线文件目录
    pub output_dir: PathBuf,

    /// 图片目录
    pub image_dir: PathBuf,

    /// noise-pdf 服务地址
    pub service_url: String,

    /// HTTP超时（秒）
    pub timeout_secs: u64,

    /// 离线模式：本地PDF文本目录
    pub pdf_dir: Option<PathBuf>,

    /// 通道并行度（None表示串行）
    pub parallel_channels: Option<usize>,

    /// 是否显示详细信息
    pub verbose: bool,
}

impl AppConfig {
    /// `NET.STA.LOC`
    pub fn station_label(&self) -> String {
        format!("{}.{}.{}", self.network, self.station, self.location)
    }

    /// 是否读取本地PDF文件而不访问网络
    #[inline]
    pub fn is_offline(&self) -> bool {
        self.pdf_dir.is_some()
    }

    /// 从clap解析结果构造配置
    pub fn from_matches(matches: &ArgMatches) -> BaselineResult<Self> {
        let required = |name: &str| -> BaselineResult<String> {
            matches
                .get_one::<String>(name)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .ok_or_else(|| BaselineError::InvalidInput(format!("缺少参数 --{name}")))
        };

        let location = required("loc")?;
        let location = if location == defaults::LOCATION_DASH {
            "--".to_string()
        } else {
            location
        };

        let channels = parse_channels(&required("chan")?)?;
        let dates = DateRange::parse(&required("start")?, &required("end")?)?;
        let percentiles = PercentileRequest::parse_list(&required("percentiles")?)?;
        let axis = AxisMode::from_str(&required("xtype")?)?;
        let plot = matches.get_flag("plot");

        Ok(Self {
            network: required("net")?,
            station: required("sta")?,
            location,
            channels,
            dates,
            baseline: BaselineConfig::new(percentiles, axis).with_pdf(plot),
            plot,
            percent_plot_type: PercentPlotType::from_str(&required("percent-plot-type")?)?,
            output_format: BaselineFileFormat::from_str(&required("format")?)?,
            output_dir: PathBuf::from(required("output-dir")?),
            image_dir: PathBuf::from(required("image-dir")?),
            service_url: required("url")?,
            timeout_secs: matches
                .get_one::<u64>("timeout")
                .copied()
                .unwrap_or(service::REQUEST_TIMEOUT_SECS),
            pdf_dir: matches.get_one::<String>("pdf-dir").map(PathBuf::from),
            parallel_channels: matches.get_one::<usize>("parallel").copied(),
            verbose: matches.get_flag("verbose"),
        })
    }
}

/// 解析逗号分隔的通道列表（忽略空白与空项）
pub fn parse_channels(text: &str) -> BaselineResult<Vec<String>> {
    let channels: Vec<String> = text
        .replace(' ', "")
        .split(',')
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();

    if channels.is_empty() {
        return Err(BaselineError::InvalidInput(
            "通道列表不能为空 / channel list must not be empty".to_string(),
        ));
    }
    Ok(channels)
}

/// 构建命令行定义
pub fn build_command() -> Command {
    Command::new("station-baseline")
        .version(VERSION)
        .about(DESCRIPTION)
        .author("Station Baseline Team")
        .after_help(
            "示例 / Example:\n  station-baseline --net IU --sta ANMO --loc 00 --chan BHZ \\\n      --start 2002-11-20 --end 2008-11-20 --plot -p 10,50,90\n\n\
             参考 / Reference: McNamara et al. (2009), A Method to Establish Seismic Noise \
             Baselines for Automated Station Assessment, SRL 80(4)",
        )
        .arg(Arg::new("net").long("net").short('N').help("台网代码 / network code").required(true))
        .arg(Arg::new("sta").long("sta").short('S').help("台站代码 / station code").required(true))
        .arg(
            Arg::new("loc")
                .long("loc")
                .short('L')
                .help("位置代码，DASH 表示 -- / location code (DASH for --)")
                .required(true),
        )
        .arg(
            Arg::new("chan")
                .long("chan")
                .short('C')
                .help("通道代码，多个以逗号分隔 / channel codes, comma separated")
                .default_value(defaults::CHANNELS),
        )
        .arg(
            Arg::new("start")
                .long("start")
                .help("开始日期 YYYY-MM-DD（当天00:00:00 UTC起）/ start date")
                .required(true),
        )
        .arg(
            Arg::new("end")
                .long("end")
                .help("结束日期 YYYY-MM-DD（不含；与开始相同时覆盖开始当天）/ end date")
                .required(true),
        )
        .arg(
            Arg::new("percentiles")
                .long("percentiles")
                .short('p')
                .help("百分位列表，按输出列顺序 / percentiles in output column order")
                .default_value(defaults::PERCENTILES),
        )
        .arg(
            Arg::new("xtype")
                .long("xtype")
                .short('x')
                .help("横轴类型 period | frequency / x-axis type")
                .default_value(defaults::AXIS),
        )
        .arg(
            Arg::new("plot")
                .long("plot")
                .help("生成SVG基线图 / write SVG baseline plot")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("percent-plot-type")
                .long("percent-plot-type")
                .help("百分位曲线绘制方式 line | scatter / percentile curve style")
                .default_value(defaults::PERCENT_PLOT_TYPE),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .short('f')
                .help("基线文件格式 text | json / baseline file format")
                .default_value("text"),
        )
        .arg(
            Arg::new("output-dir")
                .long("output-dir")
                .short('o')
                .help("基线文件目录 / baseline directory")
                .value_name("DIR")
                .default_value(defaults::BASELINE_DIR),
        )
        .arg(
            Arg::new("image-dir")
                .long("image-dir")
                .help("图片目录 / image directory")
                .value_name("DIR")
                .default_value(defaults::IMAGE_DIR),
        )
        .arg(
            Arg::new("url")
                .long("url")
                .help("noise-pdf 服务地址 / noise-pdf service URL")
                .default_value(service::MUSTANG_NOISE_PDF_URL),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .help("HTTP超时秒数 / HTTP timeout in seconds")
                .value_parser(clap::value_parser!(u64))
                .default_value("120"),
        )
        .arg(
            Arg::new("pdf-dir")
                .long("pdf-dir")
                .help("离线模式：读取 DIR/NET.STA.LOC.CHAN.pdf.txt / offline mode")
                .value_name("DIR"),
        )
        .arg(
            Arg::new("parallel")
                .long("parallel")
                .help("通道并行度（默认串行）/ number of channels processed in parallel")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("显示详细处理信息")
                .action(clap::ArgAction::SetTrue),
        )
}

/// 解析命令行参数并创建配置
pub fn parse_args() -> BaselineResult<AppConfig> {
    AppConfig::from_matches(&build_command().get_matches())
}

/// 显示程序启动信息
pub fn show_startup_info(config: &AppConfig) {
    println!("🚀 Station Baseline v{VERSION} 启动");
    println!("📝 {DESCRIPTION}");
    println!(
        "📡 {} [{}] {} / {}",
        config.station_label(),
        config.channels.join(","),
        config.dates.label(),
        config.baseline.axis
    );
    if config.verbose {
        println!(
            "📊 百分位 / Percentiles: {:?}",
            config.baseline.percentiles.values()
        );
        if let Some(dir) = &config.pdf_dir {
            println!("📁 离线数据目录 / Offline PDF directory: {}", dir.display());
        } else {
            println!("🌐 服务地址 / Service: {}", config.service_url);
        }
    }
    println!();
}

/// 显示程序完成信息
pub fn show_completion_info(config: &AppConfig) {
    if config.verbose {
        println!("✅ 所有通道处理完成！");
    }
}
