//! 🛡️ 错误路径和异常场景测试
//!
//! 验证错误只作用于出错的bin或通道，兄弟通道继续处理
//!
//! ## 🎯 测试策略
//!
//! 1. **通道级错误** - 空数据、损坏记录、网络失败、本地文件缺失
//! 2. **bin级错误** - 退化bin与频率0的bin被丢弃
//! 3. **配置错误** - 日期范围、百分位、横轴、输出格式


use pdf_test_fixtures::{MemorySource, TempDir, log, synthetic_pdf, test_config};
use station_baseline::error::{BaselineError, BaselineResult, ErrorCategory};
use station_baseline::tools::{self, AppConfig, LocalPdfSource, PdfRequest};

// ========== 通道级错误 ==========

#[test]
fn test_empty_channel_does_not_stop_siblings() {
    log("测试空通道不影响其他通道", "Testing empty channel isolation");

    let dir = TempDir::new("empty-sibling");
    let config = test_config(dir.path(), &["--chan", "BHZ,BH1"]);
    let source = MemorySource::new()
        .with("BHZ", "# no data in window\n")
        .with("BH1", synthetic_pdf(&["1.0", "0.5"]));

    let (reports, snapshot) = tools::process_channels_serial(&config, &source);

    assert!(
        matches!(reports[0].result, Err(BaselineError::EmptyStream(_))),
        "BHZ应返回EmptyStream，实际: {:?}",
        reports[0].result
    );
    assert!(reports[1].result.is_ok(), "BH1应成功");
    assert_eq!(snapshot.processed, 1);
    assert_eq!(snapshot.error_stats[&ErrorCategory::Calculation].len(), 1);
    assert!(
        !config.output_dir.join("IU.ANMO.00.BHZ.txt").exists(),
        "失败通道不应写出基线文件"
    );
    assert!(config.output_dir.join("IU.ANMO.00.BH1.txt").exists());
    println!("  ✓ BHZ EmptyStream, BH1 written");
}

#[test]
fn test_malformed_record_fails_only_its_channel() {
    log("测试损坏记录", "Testing malformed record");

    let dir = TempDir::new("malformed");
    let config = test_config(dir.path(), &["--chan", "BHZ,BH2"]);
    let source = MemorySource::new()
        .with("BHZ", "1.0,-100,10\n1.0,-90,x\n")
        .with("BH2", "1.0,-100,10\n");

    let (reports, snapshot) = tools::process_channels_serial(&config, &source);

    match &reports[0].result {
        Err(e @ BaselineError::FormatError(_)) => {
            println!("  ✓ 正确返回错误: {e}");
            assert_eq!(ErrorCategory::from_baseline_error(e), ErrorCategory::Format);
        }
        other => panic!("期望FormatError，实际: {other:?}"),
    }
    assert!(reports[1].result.is_ok());
    assert_eq!(snapshot.failed, 1);
}

#[test]
fn test_hits_overflow_fails_only_its_channel() {
    log("测试hits溢出只影响本通道", "Testing hits overflow isolation");

    let dir = TempDir::new("overflow");
    let config = test_config(dir.path(), &["--chan", "BHZ,BH1"]);
    let overflowing = format!("1.0,-100,1\n1.0,-90,{}\n", u64::MAX);
    let source = MemorySource::new()
        .with("BHZ", overflowing)
        .with("BH1", synthetic_pdf(&["1.0", "0.5"]));

    let (reports, snapshot) = tools::process_channels_serial(&config, &source);

    assert!(
        matches!(reports[0].result, Err(BaselineError::FormatError(_))),
        "BHZ应返回FormatError，实际: {:?}",
        reports[0].result
    );
    assert!(reports[1].result.is_ok(), "BH1应成功");
    assert_eq!(snapshot.processed, 1);
    assert_eq!(snapshot.error_stats[&ErrorCategory::Format].len(), 1);
}

#[test]
fn test_network_failure_is_categorised() {
    log("测试网络错误分类", "Testing network error category");

    let dir = TempDir::new("network");
    let config = test_config(dir.path(), &["--chan", "LHZ"]);
    let source = MemorySource::new();

    let (reports, snapshot) = tools::process_channels_serial(&config, &source);

    assert!(matches!(
        reports[0].result,
        Err(BaselineError::NetworkError(_))
    ));
    assert!(!snapshot.any_succeeded());
    assert_eq!(snapshot.dominant_category(), Some(ErrorCategory::Network));
    assert_eq!(source.fetch_count(), 1);
}

#[test]
fn test_missing_local_dump_is_io_error() {
    log("测试离线文件缺失", "Testing missing offline dump");

    let dir = TempDir::new("offline-missing");
    let config = test_config(dir.path(), &["--chan", "BHZ"]);
    let source = LocalPdfSource::new(dir.path());
    let request = PdfRequest::for_channel(&config, "BHZ");

    let result = tools::process_channel(&request, &config, &source);
    match result {
        Err(BaselineError::IoError(e)) => {
            assert_eq!(e.kind(), std::io::ErrorKind::NotFound);
            println!("  ✓ IO错误: {e}");
        }
        other => panic!("期望IoError，实际: {other:?}"),
    }
}

#[test]
fn test_all_bins_dropped_fails_channel() {
    log("测试所有bin被丢弃", "Testing channel with every bin dropped");

    let dir = TempDir::new("all-dropped");
    let config = test_config(dir.path(), &["--chan", "BHZ"]);
    let source = MemorySource::new().with("BHZ", "0,-100,5\n0,-90,5\n");
    let request = PdfRequest::for_channel(&config, "BHZ");

    // 默认周期横轴：频率0无法换算
    let result = tools::compute_channel(&request, &config, &source);
    assert!(
        matches!(result, Err(BaselineError::EmptyStream(_))),
        "没有任何行时通道失败，实际: {result:?}"
    );
}

// ========== bin级错误 ==========

#[test]
fn test_degenerate_bin_dropped_from_file() {
    log("测试退化bin不写入文件", "Testing degenerate bin is left out of the file");

    let dir = TempDir::new("degenerate");
    let config = test_config(dir.path(), &["--chan", "BHZ", "-x", "frequency", "-p", "10,100"]);
    let source = MemorySource::new().with("BHZ", "1.0,-100,10\n1.0,-90,0\n2.0,-95,0\n");
    let request = PdfRequest::for_channel(&config, "BHZ");

    let outcome = tools::process_channel(&request, &config, &source).unwrap();
    assert_eq!(outcome.baseline.rows.len(), 1);
    assert_eq!(outcome.baseline.failures.len(), 1);
    assert_eq!(outcome.baseline.failures[0].label, "2.0");

    let written = std::fs::read_to_string(&outcome.output_path).unwrap();
    assert_eq!(
        written,
        "#frequency 10 percentile 100 percentile\n1.0 -100.00 -100.00\n"
    );
}

// ========== 配置错误 ==========

#[test]
fn test_invalid_configuration_is_rejected() {
    log("测试无效配置", "Testing invalid configuration");

    fn base(end: &str, extra: &[&str]) -> BaselineResult<AppConfig> {
        let mut args = vec![
            "station-baseline",
            "--net",
            "IU",
            "--sta",
            "ANMO",
            "--loc",
            "00",
            "--start",
            "2020-01-10",
            "--end",
        ];
        args.push(end);
        args.extend_from_slice(extra);
        let matches = tools::cli::build_command()
            .try_get_matches_from(args)
            .expect("clap层面参数合法");
        AppConfig::from_matches(&matches)
    }

    assert!(matches!(
        base("2020-01-01", &[]),
        Err(BaselineError::InvalidInput(_))
    ));

    let cases: [&[&str]; 4] = [
        &["-p", "5,150"],
        &["-p", ""],
        &["-x", "wavelength"],
        &["-f", "xml"],
    ];
    for extra in cases {
        let result = base("2020-01-20", extra);
        assert!(
            matches!(result, Err(BaselineError::InvalidInput(_))),
            "{extra:?} 应返回InvalidInput，实际: {result:?}"
        );
    }

    assert!(base("2020-01-20", &[]).is_ok());
}
