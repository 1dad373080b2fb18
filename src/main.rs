//! Station Baseline - 主程序入口
//!
//! 纯流程控制器，负责协调各个工具模块完成通道基线计算任务。

use station_baseline::{
    error::{BaselineError, ErrorCategory},
    tools::{self, AppConfig, BatchStatsSnapshot, ChannelReport, NoiseSource},
};
use std::process;

/// 错误退出码定义
mod exit_codes {
    /// 通用错误
    pub const GENERAL_ERROR: i32 = 1;
    /// 格式/输入错误
    pub const FORMAT_ERROR: i32 = 2;
    /// 网络请求失败
    pub const NETWORK_ERROR: i32 = 3;
    /// 计算错误（空数据、所有bin被丢弃）
    pub const CALCULATION_ERROR: i32 = 4;
    /// 资源/并发错误
    pub const RESOURCE_ERROR: i32 = 5;
}

/// 获取错误建议文本
fn get_error_suggestion(error: &BaselineError) -> &'static str {
    match error {
        BaselineError::InvalidInput(_) => {
            "检查命令行参数是否正确，使用 --help 查看完整用法 / Check if command-line arguments are correct, use --help to see full usage"
        }
        BaselineError::ResourceError(_) => {
            "资源不可用，请重试；若持续失败请降低并发度 / Resource unavailable, retry; if it continues to fail, reduce --parallel"
        }
        BaselineError::EmptyStream(_) => {
            "该时间窗口内没有PSD数据，请确认台站/通道代码和日期范围 / No PSD data in this window, check station/channel codes and dates"
        }
        _ => match ErrorCategory::from_baseline_error(error) {
            ErrorCategory::Network => {
                "检查网络连接或服务地址，必要时增大 --timeout 或使用 --pdf-dir 离线模式 / Check connectivity or service URL, raise --timeout or use --pdf-dir"
            }
            ErrorCategory::Io => {
                "检查输出目录是否可写，离线文件是否存在 / Check that output directories are writable and offline files exist"
            }
            ErrorCategory::Format => {
                "数据行应为 frequency,power,hits 格式 / Data lines must be frequency,power,hits"
            }
            ErrorCategory::Calculation => {
                "所有频率bin均无法计算百分位，请检查数据 / No bin produced percentiles, check the data"
            }
            ErrorCategory::Other => "请检查参数设置 / Please check parameter settings",
        },
    }
}

/// 错误处理和建议
fn handle_error(error: BaselineError) -> ! {
    eprintln!("[ERROR] 错误 / Error: {error}");
    eprintln!("[INFO] 建议 / Suggestion: {}", get_error_suggestion(&error));

    let exit_code = match &error {
        BaselineError::InvalidInput(_) => exit_codes::FORMAT_ERROR,
        BaselineError::ResourceError(_) => exit_codes::RESOURCE_ERROR,
        _ => match ErrorCategory::from_baseline_error(&error) {
            ErrorCategory::Format => exit_codes::FORMAT_ERROR,
            ErrorCategory::Network => exit_codes::NETWORK_ERROR,
            ErrorCategory::Calculation => exit_codes::CALCULATION_ERROR,
            ErrorCategory::Io | ErrorCategory::Other => exit_codes::GENERAL_ERROR,
        },
    };

    process::exit(exit_code);
}

/// 初始化日志（RUST_LOG 优先）
fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_target(false)
        .init();
}

/// 按配置选择串行或并行处理所有通道
fn process_channels(
    config: &AppConfig,
    source: &dyn NoiseSource,
) -> (Vec<ChannelReport>, BatchStatsSnapshot) {
    let Some(degree) = config.parallel_channels else {
        return tools::process_channels_serial(config, source);
    };

    let actual_degree =
        tools::utils::effective_parallel_degree(degree, Some(config.channels.len()));
    if actual_degree == 1 {
        if config.verbose {
            println!("[INFO] 并发度为1，使用串行模式 / Parallelism=1, using serial mode");
        }
        return tools::process_channels_serial(config, source);
    }

    tools::process_channels_parallel(config, source, actual_degree).unwrap_or_else(|e| {
        eprintln!(
            "[WARNING] 并行处理失败 / Parallel processing failed: {e}，回退到串行模式 / fallback to serial"
        );
        tools::process_channels_serial(config, source)
    })
}

/// 绘制所有成功通道（绘图失败不影响基线文件）
fn plot_channels(config: &AppConfig, reports: &[ChannelReport]) {
    let outcomes: Vec<_> = reports.iter().filter_map(|r| r.result.as_ref().ok()).collect();
    if outcomes.is_empty() {
        return;
    }

    let path = tools::plot_path(config, &outcomes);
    match tools::render_baseline_plot(&outcomes, config, &path) {
        Ok(()) => println!("🖼  基线图 / Plot: {}", path.display()),
        Err(e) => eprintln!("[WARNING] 绘图失败 / Plot failed: {e}"),
    }
}

/// 全部通道失败时，取最常见类别中的第一个错误作为进程错误
fn batch_error(reports: Vec<ChannelReport>, snapshot: &BatchStatsSnapshot) -> BaselineError {
    let dominant = snapshot.dominant_category();
    let mut first = None;
    for error in reports.into_iter().filter_map(|r| r.result.err()) {
        if Some(ErrorCategory::from_baseline_error(&error)) == dominant {
            return error;
        }
        first.get_or_insert(error);
    }
    first.unwrap_or_else(|| BaselineError::EmptyStream("没有处理任何通道".to_string()))
}

/// 应用程序主逻辑
fn run(config: &AppConfig) -> Result<(), BaselineError> {
    tools::show_startup_info(config);

    let source = tools::source_from_config(config)?;
    let (reports, snapshot) = process_channels(config, source.as_ref());

    tools::show_batch_completion_info(&reports, &snapshot);

    if !snapshot.any_succeeded() {
        return Err(batch_error(reports, &snapshot));
    }

    if config.plot {
        plot_channels(config, &reports);
    }

    tools::show_completion_info(config);
    Ok(())
}

fn main() {
    let config = match tools::parse_args() {
        Ok(config) => config,
        Err(error) => handle_error(error),
    };
    init_logging(config.verbose);

    if let Err(error) = run(&config) {
        handle_error(error);
    }
}
