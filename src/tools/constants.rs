//! 常量和默认配置集中管理
//!
//! 将所有重要常量集中定义，避免"默认值漂移"和重复定义

/// 数据源常量
pub mod service {
    /// MUSTANG noise-pdf 服务查询地址（参数直接追加在 `?` 之后）
    pub const MUSTANG_NOISE_PDF_URL: &str = "http://service.iris.edu/mustang/noise-pdf/1/query?";

    /// 请求的数据质量代码（target 第五段）
    pub const QUALITY_CODE: &str = "M";

    /// HTTP请求超时（秒）
    pub const REQUEST_TIMEOUT_SECS: u64 = 120;

    /// 本地PDF文本文件后缀（离线模式）
    pub const LOCAL_PDF_SUFFIX: &str = "pdf.txt";
}

/// 默认配置值
pub mod defaults {
    /// 默认通道列表
    pub const CHANNELS: &str = "BHZ,BH1,BH2";

    /// 默认百分位（低/中/高）
    pub const PERCENTILES: &str = "5,50,90";

    /// 默认横轴类型
    pub const AXIS: &str = "period";

    /// 百分位曲线默认绘制方式 line | scatter
    pub const PERCENT_PLOT_TYPE: &str = "line";

    /// 位置代码占位符：命令行中 `DASH` 表示 `--`
    pub const LOCATION_DASH: &str = "DASH";

    /// 基线文件输出目录
    pub const BASELINE_DIR: &str = "data/baseline";

    /// 绘图输出目录
    pub const IMAGE_DIR: &str = "image/baseline";
}

/// 绘图参数
pub mod plot {
    /// 频率模式横轴范围（Hz）
    pub const X_LIMITS_FREQUENCY: (f64, f64) = (0.01, 9.0);

    /// 周期模式横轴范围（s）
    pub const X_LIMITS_PERIOD: (f64, f64) = (0.15, 200.0);

    /// 功率范围（dB）
    pub const Y_LIMITS: (f64, f64) = (-200.0, -50.0);

    /// 概率色标范围（%）
    pub const PROBABILITY_LIMITS: (f64, f64) = (-0.3, 30.0);

    /// 每个通道面板的尺寸（像素）
    pub const PANEL_SIZE: (u32, u32) = (1200, 300);

    /// 纵轴标签
    pub const Y_LABEL: &str = "Power (dB)";

    /// 色标标签
    pub const PROBABILITY_LABEL: &str = "Probability (%)";

    /// 色标条宽度（像素，含刻度文字）
    pub const COLORBAR_WIDTH: u32 = 110;

    /// 色标条分段数
    pub const COLORBAR_STEPS: usize = 64;
}

/// 并发度限制常量
pub mod parallel_limits {
    /// 最小并发度
    pub const MIN_PARALLEL_DEGREE: usize = 1;

    /// 最大并发度
    ///
    /// 数据服务端对同一客户端的并发请求有限，超过16没有收益
    pub const MAX_PARALLEL_DEGREE: usize = 16;
}
