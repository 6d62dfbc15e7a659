//! SVG chart rendering.
//!
//! Charts are described declaratively ([`Figure`], [`Panel`],
//! [`BarGrid`]) by the commands and drawn here with `plotters`.
//!
//! Log scales are drawn by plotting `log10(y)` on a linear axis and
//! labelling ticks with `10^v`. A secondary Y axis is drawn by projecting
//! its values onto the primary axis, so every series lives on one
//! coordinate system and shares one legend.

use crate::analysis::{AxisRange, Scale};
use anyhow::{Context, Result};
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;

const FONT: &str = "sans-serif";
const TITLE_LINE_HEIGHT: u32 = 28;

/// Pixel offset of the max label (above the point).
const MAX_LABEL_OFFSET: (i32, i32) = (0, -6);
/// Pixel offset of the min label (below the point).
const MIN_LABEL_OFFSET: (i32, i32) = (0, 10);

type Area<'a> = DrawingArea<SVGBackend<'a>, Shift>;
type Chart<'a, 'b> = ChartContext<'a, SVGBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// Point marker of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Circle,
    Cross,
}

/// How consecutive points are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    None,
    /// Thin, mostly transparent connector under the markers.
    Faint,
    Solid,
}

/// Number format for value labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueLabel {
    pub decimals: usize,
    pub unit: &'static str,
}

impl ValueLabel {
    /// `0.412 ms`
    pub const MILLIS: ValueLabel = ValueLabel {
        decimals: 3,
        unit: "ms",
    };
    /// `9.41`
    pub const GBITS: ValueLabel = ValueLabel {
        decimals: 2,
        unit: "",
    };
    /// `0.412`
    pub const MILLIS_BARE: ValueLabel = ValueLabel {
        decimals: 3,
        unit: "",
    };

    pub fn format(&self, value: f64) -> String {
        if self.unit.is_empty() {
            format!("{:.*}", self.decimals, value)
        } else {
            format!("{:.*} {}", self.decimals, value, self.unit)
        }
    }
}

/// One plotted series.
#[derive(Debug, Clone)]
pub struct PlotSeries {
    /// Legend entry; `None` keeps the series out of the legend.
    pub label: Option<String>,
    pub color: RGBColor,
    pub marker: Option<Marker>,
    pub line: Line,
    /// Data-space samples.
    pub points: Vec<(f64, f64)>,
    /// Label the max and min points with this format.
    pub extrema: Option<ValueLabel>,
    /// Plot against the secondary Y axis.
    pub secondary: bool,
}

impl PlotSeries {
    /// Faint line plus circle markers, the default measurement style.
    pub fn new(label: impl Into<String>, color: RGBColor, points: Vec<(f64, f64)>) -> Self {
        Self {
            label: Some(label.into()),
            color,
            marker: Some(Marker::Circle),
            line: Line::Faint,
            points,
            extrema: None,
            secondary: false,
        }
    }

    pub fn marker(mut self, marker: Option<Marker>) -> Self {
        self.marker = marker;
        self
    }

    pub fn line(mut self, line: Line) -> Self {
        self.line = line;
        self
    }

    pub fn extrema(mut self, format: Option<ValueLabel>) -> Self {
        self.extrema = format;
        self
    }

    pub fn on_secondary(mut self) -> Self {
        self.secondary = true;
        self
    }
}

/// Dashed horizontal reference line.
#[derive(Debug, Clone)]
pub struct HLine {
    pub y: f64,
    pub color: RGBColor,
}

/// Free text anchored at a data point.
#[derive(Debug, Clone)]
pub struct Note {
    pub x: f64,
    pub y: f64,
    pub text: String,
    pub color: RGBColor,
}

/// Right-hand Y axis.
#[derive(Debug, Clone)]
pub struct SecondaryAxis {
    pub label: String,
    pub range: AxisRange,
}

/// One set of axes.
#[derive(Debug, Clone)]
pub struct Panel {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub scale: Scale,
    pub x_range: AxisRange,
    pub y_range: AxisRange,
    pub secondary: Option<SecondaryAxis>,
    pub series: Vec<PlotSeries>,
    pub mean_lines: Vec<HLine>,
    pub notes: Vec<Note>,
    /// Add black "IPv6 Baseline" (cross) / "IPv4 Transition" (circle)
    /// entries to the legend.
    pub marker_legend: bool,
    /// Shown in the middle of the panel when no series has points.
    pub empty_message: Option<String>,
}

impl Panel {
    pub fn new(
        title: impl Into<String>,
        x_label: impl Into<String>,
        y_label: impl Into<String>,
        scale: Scale,
        x_range: AxisRange,
        y_range: AxisRange,
    ) -> Self {
        Self {
            title: title.into(),
            x_label: x_label.into(),
            y_label: y_label.into(),
            scale,
            x_range,
            y_range,
            secondary: None,
            series: Vec::new(),
            mean_lines: Vec::new(),
            notes: Vec::new(),
            marker_legend: false,
            empty_message: None,
        }
    }
}

/// A grid of panels under a (possibly multi-line) title.
#[derive(Debug, Clone)]
pub struct Figure {
    pub title: Vec<String>,
    pub rows: usize,
    pub cols: usize,
    /// Size of one panel in pixels.
    pub panel_size: (u32, u32),
    /// Panels in row-major order.
    pub panels: Vec<Panel>,
}

/// One bar of a comparison chart.
#[derive(Debug, Clone)]
pub struct Bar {
    pub label: String,
    pub color: RGBColor,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

/// One bar chart panel.
#[derive(Debug, Clone)]
pub struct BarPanel {
    pub title: String,
    pub x_label: Option<String>,
    pub y_label: String,
    pub bars: Vec<Bar>,
    pub value_label: ValueLabel,
}

/// A grid of bar chart panels.
#[derive(Debug, Clone)]
pub struct BarGrid {
    pub title: Vec<String>,
    pub rows: usize,
    pub cols: usize,
    pub panel_size: (u32, u32),
    pub panels: Vec<BarPanel>,
}

/// Map a data value onto the drawing axis.
pub fn to_axis(value: f64, scale: Scale) -> f64 {
    match scale {
        Scale::Linear => value,
        Scale::Log => value.log10(),
    }
}

fn axis_range(range: AxisRange, scale: Scale) -> AxisRange {
    let (min, max) = (to_axis(range.min, scale), to_axis(range.max, scale));
    if max > min {
        AxisRange::new(min, max)
    } else {
        AxisRange::new(min, min + 1.0)
    }
}

/// Tick label for a drawing-axis value.
pub fn tick_label(value: f64, scale: Scale) -> String {
    let v = match scale {
        Scale::Linear => value,
        Scale::Log => 10f64.powf(value),
    };

    let magnitude = v.abs();
    if magnitude < 1e-12 {
        "0".to_string()
    } else if magnitude >= 100.0 {
        format!("{:.0}", v)
    } else if magnitude >= 1.0 {
        format!("{:.1}", v)
    } else if magnitude >= 0.01 {
        format!("{:.3}", v)
    } else {
        format!("{:.0e}", v)
    }
}

fn title_height(lines: &[String]) -> u32 {
    if lines.is_empty() {
        0
    } else {
        TITLE_LINE_HEIGHT * lines.len() as u32 + 12
    }
}

fn draw_title(area: &Area<'_>, lines: &[String]) -> Result<()> {
    let (width, _) = area.dim_in_pixel();
    let style = TextStyle::from((FONT, 22).into_font()).pos(Pos::new(HPos::Center, VPos::Top));

    for (i, line) in lines.iter().enumerate() {
        let y = 8 + (i as u32 * TITLE_LINE_HEIGHT) as i32;
        area.draw_text(line, &style, ((width / 2) as i32, y))?;
    }

    Ok(())
}

/// Write a figure of time-series panels to `path`.
pub fn render_figure(path: &Path, figure: &Figure) -> Result<()> {
    let header = title_height(&figure.title);
    let size = (
        figure.panel_size.0 * figure.cols as u32,
        figure.panel_size.1 * figure.rows as u32 + header,
    );

    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let (top, body) = root.split_vertically(header);
    draw_title(&top, &figure.title)?;

    for (area, panel) in body
        .split_evenly((figure.rows, figure.cols))
        .iter()
        .zip(&figure.panels)
    {
        draw_panel(area, panel)?;
    }

    root.present()
        .with_context(|| format!("Failed to write chart {}", path.display()))?;
    Ok(())
}

fn draw_panel(area: &Area<'_>, panel: &Panel) -> Result<()> {
    let scale = panel.scale;
    let x = panel.x_range;
    let y = axis_range(panel.y_range, scale);
    let y_format = move |v: &f64| tick_label(*v, scale);

    let mut builder = ChartBuilder::on(area);
    builder
        .caption(&panel.title, (FONT, 16).into_font())
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(60);

    match &panel.secondary {
        None => {
            let mut chart = builder.build_cartesian_2d(x.min..x.max, y.min..y.max)?;
            configure_mesh(&mut chart, panel, &y_format)?;
            draw_content(&mut chart, panel, None)?;
        }
        Some(secondary) => {
            let sy = axis_range(secondary.range, scale);
            builder.right_y_label_area_size(60);

            let mut chart = builder
                .build_cartesian_2d(x.min..x.max, y.min..y.max)?
                .set_secondary_coord(x.min..x.max, sy.min..sy.max);
            configure_mesh(&mut chart, panel, &y_format)?;
            chart
                .configure_secondary_axes()
                .y_desc(secondary.label.as_str())
                .y_label_formatter(&y_format)
                .axis_desc_style((FONT, 13).into_font())
                .draw()?;
            draw_content(&mut chart, panel, Some(sy))?;
        }
    }

    Ok(())
}

fn configure_mesh(
    chart: &mut Chart<'_, '_>,
    panel: &Panel,
    y_format: &dyn Fn(&f64) -> String,
) -> Result<()> {
    chart
        .configure_mesh()
        .x_desc(panel.x_label.as_str())
        .y_desc(panel.y_label.as_str())
        .light_line_style(&BLACK.mix(0.04))
        .bold_line_style(&BLACK.mix(0.12))
        .y_label_formatter(y_format)
        .x_label_formatter(&|v| tick_label(*v, Scale::Linear))
        .axis_desc_style((FONT, 13).into_font())
        .draw()?;
    Ok(())
}

/// Project a data point onto the primary drawing axis.
fn project(
    (x, y): (f64, f64),
    scale: Scale,
    on_secondary: bool,
    primary: AxisRange,
    secondary: Option<AxisRange>,
) -> (f64, f64) {
    let v = to_axis(y, scale);
    match secondary {
        Some(s) if on_secondary && s.span() > 0.0 => {
            (x, primary.min + (v - s.min) / s.span() * primary.span())
        }
        _ => (x, v),
    }
}

fn draw_content<'a, 'b: 'a>(
    chart: &mut Chart<'a, 'b>,
    panel: &Panel,
    secondary: Option<AxisRange>,
) -> Result<()> {
    let scale = panel.scale;
    let primary = axis_range(panel.y_range, scale);
    let mut drawn = 0usize;
    let mut labelled = panel.marker_legend;

    for series in &panel.series {
        let points: Vec<(f64, f64)> = series
            .points
            .iter()
            .copied()
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .filter(|(_, y)| !scale.positive_only() || *y > 0.0)
            .collect();
        if points.is_empty() {
            continue;
        }

        let mapped: Vec<(f64, f64)> = points
            .iter()
            .map(|p| project(*p, scale, series.secondary, primary, secondary))
            .collect();
        let color = series.color;

        match series.line {
            Line::None => {}
            Line::Faint => {
                chart.draw_series(LineSeries::new(
                    mapped.iter().copied(),
                    color.mix(0.3).stroke_width(1),
                ))?;
            }
            Line::Solid => {
                chart.draw_series(LineSeries::new(
                    mapped.iter().copied(),
                    color.stroke_width(2),
                ))?;
            }
        }

        let anno = match series.marker {
            Some(Marker::Circle) => chart.draw_series(
                mapped
                    .iter()
                    .map(|p| Circle::new(*p, 3, color.mix(0.85).filled())),
            )?,
            Some(Marker::Cross) => chart.draw_series(
                mapped
                    .iter()
                    .map(|p| Cross::new(*p, 3, color.mix(0.85).stroke_width(2))),
            )?,
            None => chart.draw_series(std::iter::empty::<Circle<(f64, f64), i32>>())?,
        };

        if let Some(label) = &series.label {
            labelled = true;
            match series.marker {
                Some(Marker::Circle) => anno
                    .label(label)
                    .legend(move |(x, y)| Circle::new((x + 10, y), 4, color.filled())),
                Some(Marker::Cross) => anno
                    .label(label)
                    .legend(move |(x, y)| Cross::new((x + 10, y), 4, color.stroke_width(2))),
                None => anno.label(label).legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                }),
            };
        }

        if let Some(format) = series.extrema {
            draw_extrema(chart, &points, &mapped, format, color)?;
        }

        drawn += 1;
    }

    for line in &panel.mean_lines {
        if scale.positive_only() && line.y <= 0.0 {
            continue;
        }
        let y = to_axis(line.y, scale);
        draw_dashed(chart, panel.x_range, y, line.color)?;
    }

    for note in &panel.notes {
        if scale.positive_only() && note.y <= 0.0 {
            continue;
        }
        let style = (FONT, 11).into_font().color(&note.color);
        chart.draw_series(std::iter::once(
            EmptyElement::at((note.x, to_axis(note.y, scale)))
                + Text::new(note.text.clone(), (4, -2), style),
        ))?;
    }

    if panel.marker_legend && drawn > 0 {
        chart
            .draw_series(std::iter::empty::<Circle<(f64, f64), i32>>())?
            .label("IPv6 Baseline")
            .legend(|(x, y)| Cross::new((x + 10, y), 4, BLACK.stroke_width(2)));
        chart
            .draw_series(std::iter::empty::<Circle<(f64, f64), i32>>())?
            .label("IPv4 Transition")
            .legend(|(x, y)| Circle::new((x + 10, y), 4, BLACK.filled()));
    }

    if drawn == 0 {
        if let Some(message) = &panel.empty_message {
            let plot = chart.plotting_area().strip_coord_spec();
            let (w, h) = plot.dim_in_pixel();
            let style =
                TextStyle::from((FONT, 14).into_font()).pos(Pos::new(HPos::Center, VPos::Center));
            plot.draw_text(message, &style, ((w / 2) as i32, (h / 2) as i32))?;
        }
    } else if labelled {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(&WHITE.mix(0.85))
            .border_style(&BLACK.mix(0.3))
            .label_font((FONT, 11).into_font())
            .draw()?;
    }

    Ok(())
}

/// Label the max point above and the min point below.
fn draw_extrema(
    chart: &mut Chart<'_, '_>,
    points: &[(f64, f64)],
    mapped: &[(f64, f64)],
    format: ValueLabel,
    color: RGBColor,
) -> Result<()> {
    let values: Vec<f64> = points.iter().map(|(_, y)| *y).collect();
    let (Some(i_max), Some(i_min)) = (
        crate::analysis::stats::argmax(&values),
        crate::analysis::stats::argmin(&values),
    ) else {
        return Ok(());
    };

    let font = (FONT, 10).into_font();
    let above = font
        .color(&color.mix(0.95))
        .pos(Pos::new(HPos::Center, VPos::Bottom));
    let below = font
        .color(&color.mix(0.95))
        .pos(Pos::new(HPos::Center, VPos::Top));

    chart.draw_series(std::iter::once(
        EmptyElement::at(mapped[i_max])
            + Text::new(format.format(values[i_max]), MAX_LABEL_OFFSET, above),
    ))?;

    if i_min != i_max {
        chart.draw_series(std::iter::once(
            EmptyElement::at(mapped[i_min])
                + Text::new(format.format(values[i_min]), MIN_LABEL_OFFSET, below),
        ))?;
    }

    Ok(())
}

fn draw_dashed(chart: &mut Chart<'_, '_>, x: AxisRange, y: f64, color: RGBColor) -> Result<()> {
    const SEGMENTS: usize = 60;
    let step = x.span() / SEGMENTS as f64;

    chart.draw_series((0..SEGMENTS).step_by(2).map(|i| {
        let x0 = x.min + i as f64 * step;
        PathElement::new(vec![(x0, y), (x0 + step, y)], color.mix(0.5).stroke_width(1))
    }))?;
    Ok(())
}

/// Write a grid of bar charts to `path`.
pub fn render_bar_grid(path: &Path, grid: &BarGrid) -> Result<()> {
    let header = title_height(&grid.title);
    let size = (
        grid.panel_size.0 * grid.cols as u32,
        grid.panel_size.1 * grid.rows as u32 + header,
    );

    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let (top, body) = root.split_vertically(header);
    draw_title(&top, &grid.title)?;

    for (area, panel) in body
        .split_evenly((grid.rows, grid.cols))
        .iter()
        .zip(&grid.panels)
    {
        draw_bar_panel(area, panel)?;
    }

    root.present()
        .with_context(|| format!("Failed to write chart {}", path.display()))?;
    Ok(())
}

fn draw_bar_panel(area: &Area<'_>, panel: &BarPanel) -> Result<()> {
    if panel.bars.is_empty() {
        let inner = area.titled(&panel.title, (FONT, 16).into_font())?;
        let (w, h) = inner.dim_in_pixel();
        let style =
            TextStyle::from((FONT, 14).into_font()).pos(Pos::new(HPos::Center, VPos::Center));
        inner.draw_text("No Data", &style, ((w / 2) as i32, (h / 2) as i32))?;
        return Ok(());
    }

    let n = panel.bars.len();
    let top = panel
        .bars
        .iter()
        .map(|b| b.max.max(b.avg))
        .filter(|v| v.is_finite())
        .fold(0.0f64, f64::max);
    let y_max = if top > 0.0 { top * 1.15 } else { 1.0 };

    let names: Vec<String> = panel.bars.iter().map(|b| b.label.clone()).collect();
    let x_format = |v: &f64| {
        let i = v.round();
        if (v - i).abs() < 1e-6 && i >= 0.0 && (i as usize) < names.len() {
            names[i as usize].clone()
        } else {
            String::new()
        }
    };

    let mut chart = ChartBuilder::on(area)
        .caption(&panel.title, (FONT, 16).into_font())
        .margin(12)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0f64..y_max)?;

    let y_format = |v: &f64| tick_label(*v, Scale::Linear);

    let mut mesh = chart.configure_mesh();
    mesh.disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&x_format)
        .y_label_formatter(&y_format)
        .y_desc(panel.y_label.as_str())
        .light_line_style(&BLACK.mix(0.04))
        .bold_line_style(&BLACK.mix(0.12))
        .axis_desc_style((FONT, 13).into_font());
    if let Some(x_label) = &panel.x_label {
        mesh.x_desc(x_label.as_str());
    }
    mesh.draw()?;

    chart.draw_series(panel.bars.iter().enumerate().map(|(i, bar)| {
        let x = i as f64;
        Rectangle::new(
            [(x - 0.35, 0.0), (x + 0.35, bar.avg)],
            bar.color.mix(0.7).filled(),
        )
    }))?;

    chart.draw_series(panel.bars.iter().enumerate().map(|(i, bar)| {
        ErrorBar::new_vertical(
            i as f64,
            bar.min,
            bar.avg,
            bar.max,
            BLACK.mix(0.6).filled(),
            10,
        )
    }))?;

    let label_style = TextStyle::from((FONT, 11).into_font()).pos(Pos::new(HPos::Center, VPos::Bottom));
    chart.draw_series(panel.bars.iter().enumerate().map(|(i, bar)| {
        EmptyElement::at((i as f64, bar.avg))
            + Text::new(panel.value_label.format(bar.avg), (0, -4), label_style.clone())
    }))?;

    Ok(())
}
