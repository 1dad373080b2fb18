//! 加权分位数提取
//!
//! 对单个频率bin的 (hits, power) 直方图计算"下侧"加权百分位：
//! 所选功率是满足以下条件的最小功率值：至少 p% 的加权质量 ≤ 该值，
//! 且至多 p% 的加权质量严格 < 该值。
//!
//! ## 算法
//!
//! 对每个请求的百分位 `p`：
//! 1. 目标水平 `L = p × total_hits / 100.0`（浮点，不取整）
//! 2. 按给定顺序遍历 (hits, power)，维护累积计数 `C` 与上一对的功率 `prev`
//!    （初始化为第一对的功率）
//! 3. 每对先累加 `C`，然后：
//!    - `C == L`：取**当前**功率
//!    - `C > L`：取**上一对**功率
//!    - 否则 `prev` 更新为当前功率，继续
//! 4. 遍历结束仍未命中：该百分位无值（`None`）
//!
//! 相等时取当前、超过时取上一个，这个不对称规则直接决定数值输出，不可替换为插值分位数。
//! 功率按数据源给出的升序排列，提取器不排序、不修改输入。

use super::bin::Bin;
use crate::error::{BaselineError, BaselineResult};
use serde::{Deserialize, Serialize};

/// 百分位请求：有序、非空、每项位于 [0, 100]
///
/// 允许重复；顺序即输出列顺序。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct PercentileRequest(Vec<f64>);

impl PercentileRequest {
    /// 校验并创建百分位请求
    pub fn new(percentiles: Vec<f64>) -> BaselineResult<Self> {
        if percentiles.is_empty() {
            return Err(BaselineError::InvalidInput(
                "百分位列表不能为空 / percentile list must not be empty".to_string(),
            ));
        }

        if let Some(bad) = percentiles
            .iter()
            .find(|p| !p.is_finite() || **p < 0.0 || **p > 100.0)
        {
            return Err(BaselineError::InvalidInput(format!(
                "百分位必须位于[0, 100]: {bad} / percentile out of range"
            )));
        }

        Ok(Self(percentiles))
    }

    /// 解析逗号分隔的百分位列表，如 `"5,50,90"`
    pub fn parse_list(text: &str) -> BaselineResult<Self> {
        let values = text
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<f64>().map_err(|e| {
                    BaselineError::InvalidInput(format!("无效的百分位 {s:?}: {e}"))
                })
            })
            .collect::<BaselineResult<Vec<f64>>>()?;
        Self::new(values)
    }

    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Vec<f64>> for PercentileRequest {
    type Error = BaselineError;

    fn try_from(value: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PercentileRequest> for Vec<f64> {
    fn from(value: PercentileRequest) -> Self {
        value.0
    }
}

/// 计算一组加权百分位
///
/// # 参数
///
/// * `hits` - 每个功率级别的出现次数
/// * `powers` - 功率值（与 `hits` 同序，升序）
/// * `total_hits` - 总计数（应等于 `hits` 之和）
/// * `percentiles` - 请求的百分位
///
/// # 返回值
///
/// 与 `percentiles` 对齐的结果；`None` 表示该百分位不可达。
///
/// # 错误
///
/// - `DegenerateBin` - `total_hits == 0`
/// - `InvalidInput` - `hits` 与 `powers` 长度不一致
pub fn extract(
    hits: &[u64],
    powers: &[f64],
    total_hits: u64,
    percentiles: &[f64],
) -> BaselineResult<Vec<Option<f64>>> {
    if total_hits == 0 {
        return Err(BaselineError::DegenerateBin(
            "total_hits == 0，百分位无定义".to_string(),
        ));
    }

    if hits.len() != powers.len() {
        return Err(BaselineError::InvalidInput(format!(
            "hits与powers长度不一致: {} != {}",
            hits.len(),
            powers.len()
        )));
    }

    Ok(percentiles
        .iter()
        .map(|&p| weighted_percentile(hits, powers, total_hits, p))
        .collect())
}

/// 单个百分位的累积遍历
///
/// 累积计数溢出u64时视为不可达。
fn weighted_percentile(hits: &[u64], powers: &[f64], total_hits: u64, p: f64) -> Option<f64> {
    let level = p * total_hits as f64 / 100.0;
    let mut cumulative: u64 = 0;
    let mut previous = *powers.first()?;

    for (&count, &power) in hits.iter().zip(powers) {
        cumulative = cumulative.checked_add(count)?;
        let reached = cumulative as f64;

        if reached == level {
            return Some(power);
        } else if reached > level {
            return Some(previous);
        }
        previous = power;
    }

    None
}

/// 单个bin的百分位提取结果
#[derive(Debug, Clone, PartialEq)]
pub struct BinPercentiles {
    /// 与请求对齐的值
    pub values: Vec<Option<f64>>,

    /// 不可达的百分位
    pub unreachable: Vec<f64>,
}

impl BinPercentiles {
    /// 是否全部百分位均已求得
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.unreachable.is_empty()
    }
}

/// bin级百分位提取器
///
/// 持有一份百分位请求，对每个关闭的bin调用一次。
#[derive(Debug, Clone)]
pub struct PercentileExtractor {
    request: PercentileRequest,
}

impl PercentileExtractor {
    pub fn new(request: PercentileRequest) -> Self {
        Self { request }
    }

    #[inline]
    pub fn request(&self) -> &PercentileRequest {
        &self.request
    }

    /// 对一个已关闭的bin提取百分位
    ///
    /// 错误信息中附带该bin的频率标签。
    pub fn extract_bin(&self, bin: &Bin) -> BaselineResult<BinPercentiles> {
        let values = extract(
            bin.hits(),
            bin.powers(),
            bin.total_hits(),
            self.request.values(),
        )
        .map_err(|e| match e {
            BaselineError::DegenerateBin(msg) => {
                BaselineError::DegenerateBin(format!("frequency {}: {msg}", bin.label()))
            }
            other => other,
        })?;

        let unreachable = self
            .request
            .values()
            .iter()
            .zip(&values)
            .filter(|(_, v)| v.is_none())
            .map(|(&p, _)| p)
            .collect();

        Ok(BinPercentiles {
            values,
            unreachable,
        })
    }
}
