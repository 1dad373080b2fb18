//! 记录流聚合测试
//!
//! 验证频率边界切分、bin完整性、非数据行处理以及流结束时的bin关闭


use pdf_test_fixtures::{bin_lines, log, synthetic_pdf};
use station_baseline::core::{
    AggregationSummary, AxisMode, BaselineConfig, Bin, BinAggregator, PercentileRequest, RawRecord,
    compute_baseline, extract, parse_line,
};
use station_baseline::error::BaselineError;
use std::io::Cursor;

fn collect_bins(text: &str) -> (Vec<Bin>, AggregationSummary) {
    let mut bins = Vec::new();
    let summary = BinAggregator::process(text.lines(), |bin| bins.push(bin)).expect("聚合应成功");
    (bins, summary)
}

#[test]
fn test_bins_follow_frequency_boundaries() {
    log("测试频率边界切分", "Testing frequency boundary splitting");

    let text = synthetic_pdf(&["10.0", "5.0", "2.5"]);
    let (bins, summary) = collect_bins(&text);

    assert_eq!(bins.len(), 3, "三个频率应产生三个bin / three frequencies, three bins");
    assert_eq!(summary.bins, 3);
    assert_eq!(summary.records, 63);
    assert_eq!(summary.skipped_lines, 2, "两行注释 / two comment lines");

    let labels: Vec<&str> = bins.iter().map(Bin::label).collect();
    assert_eq!(labels, vec!["10.0", "5.0", "2.5"]);

    for bin in &bins {
        assert_eq!(bin.len(), 21);
        assert!(bin.verify_totals(), "闭合bin的hits之和必须等于total_hits");
        assert_eq!(bin.total_hits(), 121);
    }
    println!("  ✓ 3 bins, totals verified");
}

#[test]
fn test_every_record_lands_in_exactly_one_bin() {
    log("测试记录守恒", "Testing record conservation");

    let text = format!(
        "{}{}{}",
        bin_lines("0.125", &[(-180.0, 3), (-170.0, 4)]),
        bin_lines("0.0625", &[(-175.0, 1)]),
        bin_lines("0.03125", &[(-160.0, 2), (-150.0, 2), (-140.0, 2)])
    );
    let (bins, summary) = collect_bins(&text);

    let record_total: usize = bins.iter().map(Bin::len).sum();
    assert_eq!(record_total, summary.records);
    assert_eq!(record_total, 6);
    assert_eq!(bins[1].powers(), &[-175.0]);
    assert_eq!(bins[2].hits(), &[2, 2, 2]);
}

#[test]
fn test_trailing_newline_does_not_matter() {
    log("测试末尾换行无关性", "Testing trailing-newline independence");

    let with_newline = "1.0,-100,10\n1.0,-90,20\n2.0,-95,100\n\n";
    let without_newline = "1.0,-100,10\n1.0,-90,20\n2.0,-95,100";

    let (a, _) = collect_bins(with_newline);
    let (b, _) = collect_bins(without_newline);
    assert_eq!(a, b, "两种结尾应得到相同的bin / both endings yield identical bins");
    assert_eq!(a.len(), 2);
}

#[test]
fn test_reader_and_lines_agree() {
    log("测试BufRead与行迭代一致", "Testing BufRead path matches line iterator");

    let text = synthetic_pdf(&["8.0", "4.0"]);
    let (from_lines, _) = collect_bins(&text);

    let mut from_reader = Vec::new();
    BinAggregator::process_reader(Cursor::new(text.as_bytes()), |bin| from_reader.push(bin))
        .expect("reader聚合应成功");

    assert_eq!(from_lines, from_reader);
}

#[test]
fn test_comment_only_stream_is_empty() {
    log("测试仅注释输入", "Testing comment-only input");

    let mut called = false;
    let result = BinAggregator::process(
        ["# header", "", "   ", "no separator here"],
        |_| called = true,
    );

    assert!(
        matches!(result, Err(BaselineError::EmptyStream(_))),
        "仅注释/空行应返回EmptyStream，实际: {result:?}"
    );
    assert!(!called, "EmptyStream时不应关闭任何bin");
}

#[test]
fn test_malformed_line_aborts_channel() {
    log("测试损坏行", "Testing malformed line");

    let result = BinAggregator::process(["1.0,-100,10", "1.0,-90", "2.0,-95,100"], |_| {});
    match result {
        Err(BaselineError::FormatError(msg)) => {
            assert!(msg.contains("第2行"), "错误信息应包含行号: {msg}");
            println!("  ✓ FormatError: {msg}");
        }
        other => panic!("期望FormatError，实际: {other:?}"),
    }

    assert!(matches!(
        parse_line("1.0,loud,10", 7),
        Err(BaselineError::FormatError(_))
    ));
    assert!(matches!(
        parse_line("1.0,-90,-3", 8),
        Err(BaselineError::FormatError(_))
    ));
}

#[test]
fn test_label_keeps_source_text() {
    log("测试频率标签保留原文", "Testing frequency label keeps source text");

    let record = parse_line("  0.0100000 , -140.5 , 12 ", 1).unwrap().unwrap();
    assert_eq!(record.label, "0.0100000");
    assert_eq!(record.frequency, 0.01);

    // 数值相等即同一bin，标签取开启bin的第一条记录
    let mut aggregator = BinAggregator::new();
    assert!(aggregator.push(record).unwrap().is_none());
    assert!(aggregator.push(RawRecord::new(0.01, -130.0, 3)).unwrap().is_none());
    let bin = aggregator.finish().expect("应有打开的bin");
    assert_eq!(bin.label(), "0.0100000");
    assert_eq!(bin.total_hits(), 15);
    assert!(aggregator.finish().is_none(), "bin只能关闭一次");
}

#[test]
fn test_repeated_frequency_after_gap_opens_new_bin() {
    log("测试非连续重复频率", "Testing non-contiguous repeated frequency");

    let (bins, _) = collect_bins("1.0,-100,1\n2.0,-90,1\n1.0,-80,1\n");
    assert_eq!(bins.len(), 3, "bin边界只由相邻记录的频率变化决定");
    assert_eq!(bins[0].label(), bins[2].label());
}

#[test]
fn test_hits_overflow_is_a_format_error() {
    log("测试hits累加溢出", "Testing hits sum overflow");

    let config = BaselineConfig::new(
        PercentileRequest::new(vec![5.0, 50.0, 90.0]).unwrap(),
        AxisMode::Frequency,
    );
    let text = format!("1.0,-100,1\n1.0,-90,{}\n", u64::MAX);
    let result = compute_baseline(text.lines(), &config);

    match result {
        Err(BaselineError::FormatError(msg)) => {
            assert!(msg.contains("第2行"), "错误应带行号: {msg}");
            println!("  ✓ {msg}");
        }
        other => panic!("期望FormatError，实际: {other:?}"),
    }
}

#[test]
fn test_max_hits_in_own_bin_is_accepted() {
    log("测试单独的u64::MAX计数", "Testing u64::MAX hits in its own bin");

    let text = format!("1.0,-100,1\n2.0,-90,{}\n", u64::MAX);
    let (bins, _) = collect_bins(&text);

    assert_eq!(bins.len(), 2);
    assert_eq!(bins[1].total_hits(), u64::MAX);
    assert!(bins.iter().all(Bin::verify_totals));
}

#[test]
fn test_extract_overflow_is_unreachable() {
    log("测试累积溢出视为不可达", "Testing cumulative overflow is unreachable");

    let values = extract(&[2, u64::MAX], &[-100.0, -90.0], u64::MAX, &[0.0, 100.0]).unwrap();
    assert_eq!(values, vec![Some(-100.0), None]);
}
