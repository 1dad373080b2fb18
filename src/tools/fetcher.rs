//! 噪声PDF数据源
//!
//! 按 `NET.STA.LOC.CHAN` 获取 `frequency,power,hits` 文本。
//! 网络实现使用同步 `reqwest::blocking` 客户端；离线实现读取本地文本文件。
//! 所有实现都只负责取回原始文本，不做任何解析。

use super::cli::{AppConfig, DateRange};
use super::constants::service;
use crate::error::{BaselineError, BaselineResult, network_error};
use std::path::PathBuf;
use std::time::Duration;

/// 单个通道的数据请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfRequest {
    pub network: String,
    pub station: String,
    pub location: String,
    pub channel: String,
    pub dates: DateRange,
}

impl PdfRequest {
    /// 由应用配置构造某个通道的请求
    pub fn for_channel(config: &AppConfig, channel: &str) -> Self {
        Self {
            network: config.network.clone(),
            station: config.station.clone(),
            location: config.location.clone(),
            channel: channel.to_string(),
            dates: config.dates,
        }
    }

    /// `NET.STA.LOC.CHAN`
    pub fn channel_id(&self) -> String {
        format!(
            "{}.{}.{}.{}",
            self.network, self.station, self.location, self.channel
        )
    }

    /// MUSTANG target：`NET.STA.LOC.CHAN.M`
    pub fn target(&self) -> String {
        format!("{}.{}", self.channel_id(), service::QUALITY_CODE)
    }

    /// 完整查询URL
    ///
    /// `base` 形如 `http://host/path/query?`，参数直接追加。
    pub fn query_url(&self, base: &str) -> String {
        format!(
            "{base}target={}&starttime={}&endtime={}&format=text",
            self.target(),
            self.dates.start.format("%Y-%m-%d"),
            self.dates.end.format("%Y-%m-%d")
        )
    }
}

/// 噪声PDF数据源
///
/// `Sync` 约束使同一数据源可以被并行通道共享。
pub trait NoiseSource: Sync {
    /// 获取一个通道的原始PDF文本
    fn fetch(&self, request: &PdfRequest) -> BaselineResult<String>;

    /// 数据源描述（日志用）
    fn describe(&self, request: &PdfRequest) -> String;
}

/// MUSTANG noise-pdf 网络数据源
#[derive(Debug, Clone)]
pub struct MustangClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl MustangClient {
    /// 创建带超时的客户端
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> BaselineResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("station-baseline/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| network_error("HTTP客户端创建失败", e))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// 由应用配置创建
    pub fn from_config(config: &AppConfig) -> BaselineResult<Self> {
        Self::new(config.service_url.clone(), config.timeout_secs)
    }
}

impl NoiseSource for MustangClient {
    fn fetch(&self, request: &PdfRequest) -> BaselineResult<String> {
        let url = request.query_url(&self.base_url);
        log::debug!("requesting: {url}");

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| network_error(&format!("请求失败 {}", request.target()), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BaselineError::NetworkError(format!(
                "{} 返回状态 {status} / unexpected status",
                request.target()
            )));
        }

        Ok(response.text()?)
    }

    fn describe(&self, request: &PdfRequest) -> String {
        request.query_url(&self.base_url)
    }
}

/// 离线数据源：读取 `DIR/NET.STA.LOC.CHAN.pdf.txt`
#[derive(Debug, Clone)]
pub struct LocalPdfSource {
    root: PathBuf,
}

impl LocalPdfSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// 请求对应的本地文件路径
    pub fn path_for(&self, request: &PdfRequest) -> PathBuf {
        self.root.join(format!(
            "{}.{}",
            request.channel_id(),
            service::LOCAL_PDF_SUFFIX
        ))
    }
}

impl NoiseSource for LocalPdfSource {
    fn fetch(&self, request: &PdfRequest) -> BaselineResult<String> {
        let path = self.path_for(request);
        std::fs::read_to_string(&path).map_err(|e| {
            BaselineError::IoError(std::io::Error::new(
                e.kind(),
                format!("无法读取 {}: {e}", path.display()),
            ))
        })
    }

    fn describe(&self, request: &PdfRequest) -> String {
        self.path_for(request).display().to_string()
    }
}

/// 根据配置选择数据源
pub fn source_from_config(config: &AppConfig) -> BaselineResult<Box<dyn NoiseSource>> {
    match &config.pdf_dir {
        Some(dir) => Ok(Box::new(LocalPdfSource::new(dir.clone()))),
        None => Ok(Box::new(MustangClient::from_config(config)?)),
    }
}
