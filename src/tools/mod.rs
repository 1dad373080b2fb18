//! 工具模块集合
//!
//! 包含CLI、数据获取、文件输出、绘图等工具模块，支持main.rs的流程控制。

pub mod batch_state;
pub mod cli;
pub mod constants;
pub mod fetcher;
pub mod formatter;
pub mod parallel_processor;
pub mod plot;
pub mod processor;
pub mod utils;

// 重新导出主要的公共接口
pub use batch_state::{BatchStatsSnapshot, ParallelBatchStats, SerialBatchStats};
pub use cli::{
    AppConfig, BaselineFileFormat, DateRange, PercentPlotType, parse_args, show_completion_info,
    show_startup_info,
};
pub use fetcher::{LocalPdfSource, MustangClient, NoiseSource, PdfRequest, source_from_config};
pub use formatter::{
    BaselineTable, BaselineTableRow, RowPairing, create_batch_footer, create_summary_table,
    format_baseline_json, format_baseline_text, pair_baseline_rows, parse_baseline_text,
    write_output,
};
pub use parallel_processor::process_channels_parallel;
pub use plot::{plot_path, render_baseline_plot, render_baseline_svg};
pub use processor::{
    ChannelOutcome, ChannelReport, channel_requests, compute_channel, process_channel,
    process_channels_serial, save_baseline, show_batch_completion_info,
};
pub use utils::path;
