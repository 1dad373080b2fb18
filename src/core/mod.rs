//! 核心算法模块
//!
//! 噪声PDF直方图到百分位基线的聚合引擎：记录解析、bin聚合、加权百分位提取、横轴变换与行装配。

pub mod aggregator;
pub mod axis;
pub mod baseline;
pub mod bin;
pub mod percentile;
pub mod record;

// 重新导出公共接口
pub use aggregator::{AggregationSummary, BinAggregator};
pub use axis::AxisMode;
pub use baseline::{
    BaselineAssembler, BaselineConfig, BaselineRow, BinFailure, ChannelBaseline, PdfPoint,
    compute_baseline, compute_baseline_from_reader,
};
pub use bin::Bin;
pub use percentile::{BinPercentiles, PercentileExtractor, PercentileRequest, extract};
pub use record::{RawRecord, parse_line};
