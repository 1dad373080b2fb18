//! 基线绘图模块
//!
//! 每个通道一个面板：PDF散点按概率着色，叠加百分位曲线，横轴对数刻度，
//! 右侧附概率色标。百分位曲线可画成折线或每个bin一个短横标记。
//! 只使用 plotters 的 SVG 后端，不依赖系统字体。

use super::cli::{AppConfig, PercentPlotType};
use super::constants::plot;
use super::processor::ChannelOutcome;
use super::{formatter, utils};
use crate::core::AxisMode;
use crate::error::{BaselineError, BaselineResult, render_error};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::{Path, PathBuf};

/// 三条曲线时使用的配色（低/中/高）
const TRIPLE_COLORS: [RGBColor; 3] = [BLACK, RGBColor(230, 190, 0), RED];

/// 其他数量的曲线循环使用的配色
const CURVE_PALETTE: [RGBColor; 6] = [
    BLACK,
    RGBColor(30, 100, 220),
    RGBColor(0, 150, 70),
    RGBColor(230, 190, 0),
    RGBColor(170, 40, 170),
    RED,
];

/// 第 `index` 条百分位曲线的颜色
fn curve_color(index: usize, count: usize) -> RGBColor {
    if count == TRIPLE_COLORS.len() {
        TRIPLE_COLORS[index]
    } else {
        CURVE_PALETTE[index % CURVE_PALETTE.len()]
    }
}

/// 概率（%）映射到颜色：低概率蓝色，高概率红色
fn probability_color(probability: f64) -> HSLColor {
    let (low, high) = plot::PROBABILITY_LIMITS;
    let t = ((probability - low) / (high - low)).clamp(0.0, 1.0);
    HSLColor(0.66 * (1.0 - t), 1.0, 0.5)
}

fn x_limits(axis: AxisMode) -> (f64, f64) {
    match axis {
        AxisMode::Frequency => plot::X_LIMITS_FREQUENCY,
        AxisMode::Period => plot::X_LIMITS_PERIOD,
    }
}

/// 基线图输出路径：`image_dir/NET.STA.LOC.C1-C2_<axis>.svg`
pub fn plot_path(config: &AppConfig, outcomes: &[&ChannelOutcome]) -> PathBuf {
    let channels: Vec<String> = outcomes
        .iter()
        .map(|o| o.request.channel.clone())
        .collect();
    config.image_dir.join(utils::plot_file_name(
        &config.network,
        &config.station,
        &config.location,
        &channels,
        config.baseline.axis,
    ))
}

/// 将所有通道绘制为一个SVG文档
pub fn render_baseline_svg(
    outcomes: &[&ChannelOutcome],
    config: &AppConfig,
) -> BaselineResult<String> {
    if outcomes.is_empty() {
        return Err(BaselineError::RenderError(
            "没有可绘制的通道 / nothing to plot".to_string(),
        ));
    }

    let (width, panel_height) = plot::PANEL_SIZE;
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (width, panel_height * outcomes.len() as u32))
            .into_drawing_area();
        root.fill(&WHITE)
            .map_err(|e| render_error("背景填充失败", e))?;

        let panels = root.split_evenly((outcomes.len(), 1));
        let last = outcomes.len() - 1;
        for (index, (panel, outcome)) in panels.iter().zip(outcomes).enumerate() {
            let caption = (index == 0).then(|| {
                format!("{}  {}", config.station_label(), config.dates.label())
            });
            let (chart_area, colorbar_area) = panel.split_horizontally(width - plot::COLORBAR_WIDTH);
            draw_panel(&chart_area, outcome, config, caption, index == last)?;
            draw_colorbar(&colorbar_area)?;
        }

        root.present()
            .map_err(|e| render_error("SVG输出失败", e))?;
    }

    Ok(svg)
}

/// 绘制并写出基线图
pub fn render_baseline_plot(
    outcomes: &[&ChannelOutcome],
    config: &AppConfig,
    path: &Path,
) -> BaselineResult<()> {
    let svg = render_baseline_svg(outcomes, config)?;
    if let Some(parent) = path.parent() {
        utils::ensure_dir(parent)?;
    }
    formatter::write_output(path, &svg)?;
    log::info!("plot written: {}", path.display());
    Ok(())
}

fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    outcome: &ChannelOutcome,
    config: &AppConfig,
    caption: Option<String>,
    show_x_desc: bool,
) -> BaselineResult<()> {
    let axis = config.baseline.axis;
    let (x_low, x_high) = x_limits(axis);
    let (y_low, y_high) = plot::Y_LIMITS;
    let in_view = |x: f64, y: f64| (x_low..=x_high).contains(&x) && (y_low..=y_high).contains(&y);

    let mut builder = ChartBuilder::on(area);
    builder
        .margin(10)
        .x_label_area_size(if show_x_desc { 40 } else { 25 })
        .y_label_area_size(60);
    if let Some(caption) = caption {
        builder.caption(caption, ("sans-serif", 20));
    }
    let mut chart = builder
        .build_cartesian_2d((x_low..x_high).log_scale(), y_low..y_high)
        .map_err(|e| render_error("坐标系创建失败", e))?;

    {
        let mut mesh = chart.configure_mesh();
        mesh.y_desc(plot::Y_LABEL);
        if show_x_desc {
            mesh.x_desc(axis.axis_label());
        }
        mesh.draw().map_err(|e| render_error("网格绘制失败", e))?;
    }

    chart
        .draw_series(
            outcome
                .baseline
                .pdf
                .iter()
                .filter(|p| in_view(p.x_value, p.power))
                .map(|p| {
                    Circle::new(
                        (p.x_value, p.power),
                        2,
                        probability_color(p.probability).filled(),
                    )
                }),
        )
        .map_err(|e| render_error("PDF散点绘制失败", e))?;

    let percentiles = config.baseline.percentiles.values();
    for (index, percentile) in percentiles.iter().enumerate() {
        let color = curve_color(index, percentiles.len());
        let curve: Vec<(f64, f64)> = outcome
            .baseline
            .curve(index)
            .into_iter()
            .filter(|&(x, y)| in_view(x, y))
            .collect();

        let series = match config.percent_plot_type {
            PercentPlotType::Line => chart.draw_series(LineSeries::new(curve, color.stroke_width(2))),
            PercentPlotType::Scatter => chart.draw_series(PointSeries::of_element(
                curve,
                5,
                color.stroke_width(3),
                &|coord, size, style| {
                    EmptyElement::at(coord) + PathElement::new(vec![(-size, 0), (size, 0)], style)
                },
            )),
        };
        series
            .map_err(|e| render_error("百分位曲线绘制失败", e))?
            .label(format!("{percentile}%"))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }

    let annotation = format!(
        "{}  {} PSDs",
        outcome.request.channel_id(),
        outcome.baseline.psd_count.unwrap_or(0)
    );
    chart
        .draw_series(std::iter::once(Text::new(
            annotation,
            (x_low * 1.2, y_high - 10.0),
            ("sans-serif", 15),
        )))
        .map_err(|e| render_error("标注绘制失败", e))?;

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(|e| render_error("图例绘制失败", e))?;

    Ok(())
}

/// 概率色标：`PROBABILITY_LIMITS` 范围内的颜色渐变条
fn draw_colorbar<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>) -> BaselineResult<()> {
    let (low, high) = plot::PROBABILITY_LIMITS;
    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .margin_left(0)
        .x_label_area_size(25)
        .y_label_area_size(70)
        .build_cartesian_2d(0.0..1.0, low..high)
        .map_err(|e| render_error("色标坐标系创建失败", e))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .disable_x_axis()
        .y_labels(5)
        .y_desc(plot::PROBABILITY_LABEL)
        .draw()
        .map_err(|e| render_error("色标刻度绘制失败", e))?;

    let step = (high - low) / plot::COLORBAR_STEPS as f64;
    chart
        .draw_series((0..plot::COLORBAR_STEPS).map(|i| {
            let bottom = low + step * i as f64;
            let top = bottom + step;
            Rectangle::new(
                [(0.0, bottom), (1.0, top)],
                probability_color((bottom + top) / 2.0).filled(),
            )
        }))
        .map_err(|e| render_error("色标绘制失败", e))?;

    Ok(())
}
