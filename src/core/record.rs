//! 噪声PDF原始记录解析
//!
//! 输入为 `frequency,power,hits` 文本行。空行、`#`注释行以及不含逗号的行
//! 属于非数据行，直接跳过；带逗号但字段无法解析的行视为结构性损坏。

use crate::error::{BaselineError, BaselineResult};

/// 记录字段分隔符
pub const FIELD_SEPARATOR: char = ',';

/// 注释行标记
pub const COMMENT_MARKER: char = '#';

/// 单条直方图记录
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// 频率（Hz，bin下沿标签）
    pub frequency: f64,

    /// 功率（dB）
    pub power: f64,

    /// 出现次数
    pub hits: u64,

    /// 频率字段的原始文本（去除首尾空白），用作输出行标签
    pub label: String,
}

impl RawRecord {
    /// 创建记录（标签由频率数值生成）
    pub fn new(frequency: f64, power: f64, hits: u64) -> Self {
        Self {
            frequency,
            power,
            hits,
            label: frequency.to_string(),
        }
    }
}

/// 判断一行是否为非数据行（空行/注释/无分隔符）
#[inline]
pub fn is_non_data_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with(COMMENT_MARKER) || !trimmed.contains(FIELD_SEPARATOR)
}

/// 解析单行文本
///
/// # 返回值
///
/// - `Ok(Some(record))` - 有效数据行
/// - `Ok(None)` - 非数据行，调用方应跳过
/// - `Err(FormatError)` - 带分隔符但字段数不为3或数值无法解析
///
/// `line_number` 从1开始，仅用于错误信息。
pub fn parse_line(line: &str, line_number: usize) -> BaselineResult<Option<RawRecord>> {
    if is_non_data_line(line) {
        return Ok(None);
    }

    let fields: Vec<&str> = line.trim().split(FIELD_SEPARATOR).map(str::trim).collect();
    if fields.len() != 3 {
        return Err(BaselineError::FormatError(format!(
            "第{line_number}行字段数为{}，应为3: {:?}",
            fields.len(),
            line.trim()
        )));
    }

    let frequency = parse_finite(fields[0], "frequency", line_number)?;
    let power = parse_finite(fields[1], "power", line_number)?;
    let hits = fields[2].parse::<u64>().map_err(|e| {
        BaselineError::FormatError(format!(
            "第{line_number}行hits字段无效 {:?}: {e}",
            fields[2]
        ))
    })?;

    Ok(Some(RawRecord {
        frequency,
        power,
        hits,
        label: fields[0].to_string(),
    }))
}

fn parse_finite(field: &str, name: &str, line_number: usize) -> BaselineResult<f64> {
    let value = field.parse::<f64>().map_err(|e| {
        BaselineError::FormatError(format!("第{line_number}行{name}字段无效 {field:?}: {e}"))
    })?;

    if !value.is_finite() {
        return Err(BaselineError::FormatError(format!(
            "第{line_number}行{name}字段非有限值: {field:?}"
        )));
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_line() {
        let record = parse_line(" 0.125 , -140.5 , 17 ", 1).unwrap().unwrap();
        assert_eq!(record.frequency, 0.125);
        assert_eq!(record.power, -140.5);
        assert_eq!(record.hits, 17);
        assert_eq!(record.label, "0.125");
    }

    #[test]
    fn test_non_data_lines_skipped() {
        for line in ["", "   ", "# Fields: frequency,power,hits", "#", "no separator here"] {
            assert!(parse_line(line, 1).unwrap().is_none(), "{line:?}");
        }
    }

    #[test]
    fn test_malformed_lines_rejected() {
        for line in ["1.0,-90", "1.0,-90,5,6", "abc,-90,5", "1.0,-90,-5", "1.0,x,5", "inf,-90,5"] {
            assert!(
                matches!(parse_line(line, 7), Err(BaselineError::FormatError(_))),
                "{line:?}"
            );
        }
    }

    #[test]
    fn test_error_mentions_line_number() {
        let err = parse_line("1.0,-90", 42).unwrap_err();
        assert!(err.to_string().contains("第42行"));
    }
}
