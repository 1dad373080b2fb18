//! 多通道并行处理模块
//!
//! 使用rayon实现通道级并行处理，保证输出顺序与请求顺序一致

use super::batch_state::{BatchStatsSnapshot, ParallelBatchStats};
use super::cli::AppConfig;
use super::fetcher::NoiseSource;
use super::processor::{ChannelReport, channel_requests, process_channel, report_failure};
use crate::error::{BaselineError, BaselineResult};
use rayon::prelude::*;

/// 多通道并行处理
///
/// - 自定义rayon线程池精确控制并发度
/// - 每个通道独立拥有自己的聚合器和输出缓冲
/// - 结果按请求索引排序
pub fn process_channels_parallel(
    config: &AppConfig,
    source: &dyn NoiseSource,
    parallel_degree: usize,
) -> BaselineResult<(Vec<ChannelReport>, BatchStatsSnapshot)> {
    println!("⚡ 启用多通道并行处理：{parallel_degree} 并发度");

    let requests = channel_requests(config);
    let total = requests.len();
    let stats = ParallelBatchStats::new();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(parallel_degree)
        .thread_name(|i| format!("baseline-worker-{i}"))
        .build()
        .map_err(|e| BaselineError::ResourceError(format!("线程池创建失败: {e}")))?;

    let mut reports: Vec<ChannelReport> = pool.install(|| {
        requests
            .into_par_iter()
            .enumerate()
            .map(|(index, request)| {
                let result = process_channel(&request, config, source);

                match &result {
                    Ok(outcome) => {
                        let count = stats.inc_processed(outcome.baseline.failures.len());
                        if config.verbose {
                            println!("✅ [{count}/{total}] {}", request.channel_id());
                        }
                    }
                    Err(e) => {
                        report_failure(index, total, &request, e, false);
                        stats.inc_failed(e, request.channel_id());
                    }
                }

                ChannelReport {
                    index,
                    request,
                    result,
                }
            })
            .collect()
    });

    // 按原始顺序排序（collect已保序，此处保证语义不依赖迭代器实现）
    reports.sort_by_key(|r| r.index);

    Ok((reports, stats.snapshot()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::cli::build_command;
    use crate::tools::fetcher::PdfRequest;
    use std::time::Duration;

    /// 通道越靠前返回越慢，强制乱序完成
    struct SlowFirstSource;

    impl NoiseSource for SlowFirstSource {
        fn fetch(&self, request: &PdfRequest) -> BaselineResult<String> {
            let delay = match request.channel.as_str() {
                "BHZ" => 60,
                "BH1" => 30,
                _ => 0,
            };
            std::thread::sleep(Duration::from_millis(delay));
            Ok("0.5,-120,5\n0.5,-110,5\n".to_string())
        }

        fn describe(&self, request: &PdfRequest) -> String {
            request.channel_id()
        }
    }

    #[test]
    fn test_parallel_results_keep_request_order() {
        let dir = std::env::temp_dir().join(format!(
            "station-baseline-parallel-{}",
            std::process::id()
        ));
        let matches = build_command()
            .try_get_matches_from([
                "station-baseline",
                "-N",
                "XX",
                "-S",
                "TEST",
                "-L",
                "DASH",
                "-C",
                "BHZ,BH1,BH2",
                "--start",
                "2021-03-01",
                "--end",
                "2021-03-01",
                "--output-dir",
                dir.to_str().unwrap(),
            ])
            .unwrap();
        let config = AppConfig::from_matches(&matches).unwrap();

        let (reports, snapshot) = process_channels_parallel(&config, &SlowFirstSource, 3).unwrap();

        let order: Vec<&str> = reports.iter().map(|r| r.request.channel.as_str()).collect();
        assert_eq!(order, vec!["BHZ", "BH1", "BH2"]);
        assert_eq!(snapshot.processed, 3);
        assert!(dir.join("XX.TEST.--.BH2.txt").exists());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
