//! 横轴模式与频率/周期变换

use crate::error::{BaselineError, BaselineResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 输出横轴类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisMode {
    /// 频率（Hz）
    Frequency,
    /// 周期（s）= 1 / 频率
    #[default]
    Period,
}

impl AxisMode {
    /// 把bin的频率变换为横轴值
    ///
    /// 周期模式下频率为0时返回 `AxisTransformError`，只影响该bin。
    pub fn transform(self, frequency: f64) -> BaselineResult<f64> {
        match self {
            AxisMode::Frequency => Ok(frequency),
            AxisMode::Period => {
                if frequency == 0.0 {
                    Err(BaselineError::AxisTransformError(
                        "frequency == 0，无法换算周期 / division by zero".to_string(),
                    ))
                } else {
                    Ok(1.0 / frequency)
                }
            }
        }
    }

    /// 小写名称（文件头、文件名）
    pub fn as_str(self) -> &'static str {
        match self {
            AxisMode::Frequency => "frequency",
            AxisMode::Period => "period",
        }
    }

    /// 坐标轴标签
    pub fn axis_label(self) -> &'static str {
        match self {
            AxisMode::Frequency => "Frequency (Hz)",
            AxisMode::Period => "Period (s)",
        }
    }
}

impl fmt::Display for AxisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AxisMode {
    type Err = BaselineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "frequency" | "freq" => Ok(AxisMode::Frequency),
            "period" => Ok(AxisMode::Period),
            other => Err(BaselineError::InvalidInput(format!(
                "未知的横轴类型: {other} (period | frequency)"
            ))),
        }
    }
}
