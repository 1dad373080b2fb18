//! Station Baseline - 台站通道噪声基线工具
//!
//! 从 MUSTANG noise-pdf 服务获取功率谱密度概率分布（`frequency,power,hits`），
//! 对每个频率bin计算加权百分位，得到通道的噪声基线曲线。
//!
//! 方法参考：McNamara, D. E., et al. (2009), *A Method to Establish Seismic
//! Noise Baselines for Automated Station Assessment*, SRL 80(4), 628-637.
//!
//! ## 核心特性
//! - 流式聚合：按频率边界切分bin，一次只持有一个bin
//! - 加权下百分位：命中计数累积，保留原始的非对称取值规则
//! - 频率/周期两种横轴
//! - 通道级并行处理，输出顺序与请求顺序一致
//!
//! ```
//! use station_baseline::{AxisMode, BaselineConfig, PercentileRequest, compute_baseline};
//!
//! let config = BaselineConfig::new(
//!     PercentileRequest::new(vec![10.0, 50.0, 90.0]).unwrap(),
//!     AxisMode::Frequency,
//! );
//! let text = "1.0,-100,10\n1.0,-90,20\n1.0,-80,70\n2.0,-95,100\n";
//! let baseline = compute_baseline(text.lines(), &config).unwrap();
//!
//! assert_eq!(baseline.rows.len(), 2);
//! assert_eq!(baseline.rows[0].values, vec![Some(-100.0), Some(-90.0), Some(-90.0)]);
//! ```

pub mod core;
pub mod error;
pub mod tools;

// 重新导出核心类型
pub use core::{
    AxisMode, BaselineConfig, BaselineRow, Bin, BinAggregator, ChannelBaseline,
    PercentileExtractor, PercentileRequest, RawRecord, compute_baseline,
    compute_baseline_from_reader, extract,
};
pub use error::{BaselineError, BaselineResult, ErrorCategory};
