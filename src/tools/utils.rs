//! 工具函数模块
//!
//! 提供输出文件命名、目录处理、并发度计算等通用工具函数。

use super::constants::parallel_limits;

/// 输出文件命名
pub mod naming {
    use crate::core::AxisMode;

    /// 基线文件名：`NET.STA.LOC.CHAN.<ext>`
    #[inline]
    pub fn baseline_file_name(
        network: &str,
        station: &str,
        location: &str,
        channel: &str,
        extension: &str,
    ) -> String {
        [network, station, location, channel, extension].join(".")
    }

    /// 基线图文件名：`NET.STA.LOC.CHAN1-CHAN2_<axis>.svg`
    pub fn plot_file_name(
        network: &str,
        station: &str,
        location: &str,
        channels: &[String],
        axis: AxisMode,
    ) -> String {
        format!(
            "{}.{}.{}.{}_{}.svg",
            network,
            station,
            location,
            channels.join("-"),
            axis.as_str()
        )
    }
}

/// 文件路径处理工具函数
pub mod path {
    use crate::error::{BaselineError, BaselineResult};
    use std::path::Path;

    /// 确保目录存在（递归创建）
    pub fn ensure_dir(dir: &Path) -> BaselineResult<()> {
        if dir.is_dir() {
            return Ok(());
        }
        std::fs::create_dir_all(dir).map_err(|e| {
            BaselineError::IoError(std::io::Error::new(
                e.kind(),
                format!("目录创建失败 {}: {e}", dir.display()),
            ))
        })
    }

    /// 提取文件名（返回String，用于日志显示）
    #[inline]
    pub fn extract_filename_lossy(path: &Path) -> String {
        path.file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string()
    }
}

/// 计算实际并发度
///
/// 请求值被限制在 [MIN, MAX] 内，且不超过任务数。
pub fn effective_parallel_degree(requested: usize, task_count: Option<usize>) -> usize {
    let clamped = requested.clamp(
        parallel_limits::MIN_PARALLEL_DEGREE,
        parallel_limits::MAX_PARALLEL_DEGREE,
    );
    match task_count {
        Some(0) | None => clamped,
        Some(n) => clamped.min(n),
    }
}

// 重新导出为平级函数
pub use naming::{baseline_file_name, plot_file_name};
pub use path::{ensure_dir, extract_filename_lossy};
