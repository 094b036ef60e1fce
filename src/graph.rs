use crate::coerce::{parse_decorated, CoercionMode};
use crate::report::{Chart, ChartKind};
use crate::{OutputFormat, RenderOptions};
use anyhow::{Context, Result};
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::prelude::*;
use serde_json::Value;
use std::ops::Range;

const PALETTE: [RGBColor; 8] = [
    RGBColor(59, 130, 246),
    RGBColor(239, 68, 68),
    RGBColor(16, 185, 129),
    RGBColor(245, 158, 11),
    RGBColor(139, 92, 246),
    RGBColor(236, 72, 153),
    RGBColor(20, 184, 166),
    RGBColor(107, 114, 128),
];

/// Largest accepted canvas width or height, in pixels
pub const MAX_CANVAS_SIDE: u32 = 8192;

fn series_color(idx: usize) -> RGBColor {
    PALETTE[idx % PALETTE.len()]
}

/// A named run of y values aligned with the frame's labels
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
}

/// Drawing-ready view of a chart's records
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Line { labels: Vec<String>, series: Vec<Series> },
    Bar { labels: Vec<String>, series: Series },
    Pie { slices: Vec<(String, f64)> },
}

fn label_of(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn number_of(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => parse_decorated(s, CoercionMode::Strict).unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Pull labels and values out of a chart's records. Axis keys fall back to
/// the first and second key of the first record.
pub fn extract_frame(chart: &Chart) -> Result<Frame> {
    let first = chart
        .first_record()
        .with_context(|| format!("Chart '{}' has no records to draw", chart.title))?;
    let keys: Vec<&String> = first.keys().collect();

    let x_key = chart
        .x_axis
        .clone()
        .or_else(|| keys.first().map(|k| k.to_string()))
        .unwrap_or_default();
    let records: Vec<&serde_json::Map<String, Value>> =
        chart.data.iter().filter_map(Value::as_object).collect();
    let labels = || -> Vec<String> { records.iter().map(|r| label_of(r.get(&x_key))).collect() };
    let column = |key: &str| -> Vec<f64> { records.iter().map(|r| number_of(r.get(key))).collect() };

    match &chart.kind {
        ChartKind::Pie => {
            let name_key = if first.contains_key("name") {
                "name"
            } else {
                keys.first()
                    .map(|k| k.as_str())
                    .context("Pie chart records need a name field")?
            };
            let value_key = if first.contains_key("value") {
                "value"
            } else {
                keys.get(1)
                    .map(|k| k.as_str())
                    .context("Pie chart records need a value field")?
            };
            let slices: Vec<(String, f64)> = records
                .iter()
                .map(|r| (label_of(r.get(name_key)), number_of(r.get(value_key))))
                .filter(|(_, v)| *v > 0.0)
                .collect();
            if slices.is_empty() {
                anyhow::bail!("Pie chart '{}' has no positive values", chart.title);
            }
            Ok(Frame::Pie { slices })
        }
        ChartKind::MultiLine => {
            let series: Vec<Series> = keys
                .iter()
                .filter(|k| ***k != x_key)
                .map(|k| Series {
                    name: k.to_string(),
                    values: column(k),
                })
                .collect();
            if series.is_empty() {
                anyhow::bail!("Multi-line chart '{}' has no value series", chart.title);
            }
            Ok(Frame::Line { labels: labels(), series })
        }
        ChartKind::Line | ChartKind::Bar => {
            let y_key = chart
                .y_axis
                .clone()
                .or_else(|| keys.get(1).map(|k| k.to_string()))
                .with_context(|| format!("Chart '{}' has no y axis field", chart.title))?;
            let series = Series {
                values: column(&y_key),
                name: y_key,
            };
            if chart.kind == ChartKind::Line {
                Ok(Frame::Line {
                    labels: labels(),
                    series: vec![series],
                })
            } else {
                Ok(Frame::Bar { labels: labels(), series })
            }
        }
        ChartKind::Other(kind) => anyhow::bail!("Unsupported chart type '{}'", kind),
    }
}

/// Padded y range that always includes zero
fn value_range<'a>(values: impl Iterator<Item = &'a f64>) -> Range<f64> {
    let (min, max) = values.fold((0.0f64, 0.0f64), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if min == max {
        return (min - 1.0)..(max + 1.0);
    }
    let padding = (max - min) * 0.05;
    (min - if min < 0.0 { padding } else { 0.0 })..(max + padding)
}

/// Render a chart to PNG or SVG bytes
pub fn render_chart(chart: &Chart, options: &RenderOptions) -> Result<Vec<u8>> {
    if options.width == 0 || options.height == 0 {
        anyhow::bail!("Canvas size must be positive, got {}x{}", options.width, options.height);
    }
    if options.width > MAX_CANVAS_SIDE || options.height > MAX_CANVAS_SIDE {
        anyhow::bail!(
            "Canvas size {}x{} exceeds the {} pixel limit",
            options.width,
            options.height,
            MAX_CANVAS_SIDE
        );
    }
    let frame = extract_frame(chart)?;
    let size = (options.width, options.height);

    match options.format {
        OutputFormat::Png => {
            let buffer_len = (options.width as usize)
                .checked_mul(options.height as usize)
                .and_then(|pixels| pixels.checked_mul(3))
                .context("Canvas buffer size overflows")?;
            let mut buffer = vec![0u8; buffer_len];
            {
                let root = BitMapBackend::with_buffer(&mut buffer, size).into_drawing_area();
                draw_frame(&root, &chart.title, &frame)?;
            }

            let mut png_bytes = Vec::new();
            {
                let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
                encoder
                    .write_image(&buffer, options.width, options.height, image::ColorType::Rgb8)
                    .context("Failed to encode PNG")?;
            }
            Ok(png_bytes)
        }
        OutputFormat::Svg => {
            let mut svg = String::new();
            {
                let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
                draw_frame(&root, &chart.title, &frame)?;
            }
            Ok(svg.into_bytes())
        }
    }
}

fn draw_frame<DB>(root: &DrawingArea<DB, Shift>, title: &str, frame: &Frame) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).context("Failed to fill background")?;

    match frame {
        Frame::Line { labels, series } => draw_lines(root, title, labels, series)?,
        Frame::Bar { labels, series } => draw_bars(root, title, labels, series)?,
        Frame::Pie { slices } => draw_pie(root, title, slices)?,
    }

    root.present().context("Failed to present drawing")?;
    Ok(())
}

fn draw_lines<DB>(root: &DrawingArea<DB, Shift>, title: &str, labels: &[String], series: &[Series]) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let y_range = value_range(series.iter().flat_map(|s| s.values.iter()));
    let x_range = 0.0..(labels.len() as f64);

    let mut chart = ChartBuilder::on(root)
        .margin(10)
        .caption(title, ("sans-serif", 20))
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, y_range)
        .context("Failed to build chart")?;

    chart
        .configure_mesh()
        .x_labels(labels.len())
        .x_label_formatter(&|x| labels.get(*x as usize).cloned().unwrap_or_default())
        .draw()
        .context("Failed to draw mesh")?;

    for (idx, s) in series.iter().enumerate() {
        let color = series_color(idx);
        let points: Vec<(f64, f64)> = s
            .values
            .iter()
            .enumerate()
            .map(|(i, &v)| (i as f64 + 0.5, v))
            .collect();

        chart
            .draw_series(LineSeries::new(points.clone(), color.stroke_width(2)))
            .context("Failed to draw line series")?
            .label(s.name.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));

        chart
            .draw_series(points.iter().map(|&(x, y)| Circle::new((x, y), 3, color.filled())))
            .context("Failed to draw point series")?;
    }

    if series.len() > 1 {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .context("Failed to draw legend")?;
    }

    Ok(())
}

fn draw_bars<DB>(root: &DrawingArea<DB, Shift>, title: &str, labels: &[String], series: &Series) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let y_range = value_range(series.values.iter());
    let x_range = 0.0..(labels.len() as f64);

    let mut chart = ChartBuilder::on(root)
        .margin(10)
        .caption(title, ("sans-serif", 20))
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, y_range)
        .context("Failed to build chart")?;

    chart
        .configure_mesh()
        .x_labels(labels.len())
        .x_label_formatter(&|x| labels.get(*x as usize).cloned().unwrap_or_default())
        .draw()
        .context("Failed to draw mesh")?;

    let bar_width = 0.8;
    let color = series_color(0);
    chart
        .draw_series(series.values.iter().enumerate().map(|(idx, &v)| {
            let x_center = idx as f64 + 0.5;
            Rectangle::new(
                [(x_center - bar_width / 2.0, 0.0), (x_center + bar_width / 2.0, v)],
                color.filled(),
            )
        }))
        .context("Failed to draw bars")?;

    Ok(())
}

fn draw_pie<DB>(root: &DrawingArea<DB, Shift>, title: &str, slices: &[(String, f64)]) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (width, height) = root.dim_in_pixel();
    let total: f64 = slices.iter().map(|(_, v)| v).sum();

    root.draw_text(
        title,
        &TextStyle::from(("sans-serif", 20).into_font()).color(&BLACK),
        (20, 15),
    )
    .context("Failed to draw title")?;

    let center = ((width as f64 * 0.4) as i32, (height as f64 * 0.55) as i32);
    let radius = (width.min(height) as f64) * 0.35;

    // Start at twelve o'clock, clockwise
    let mut start_angle = -90.0;
    for (idx, (_, value)) in slices.iter().enumerate() {
        let sweep_angle = value / total * 360.0;
        draw_wedge(root, center, radius, start_angle, sweep_angle, series_color(idx))?;
        start_angle += sweep_angle;
    }

    let legend_x = (width as f64 * 0.78) as i32;
    let legend_y = (height as f64 * 0.2) as i32;
    for (idx, (name, value)) in slices.iter().enumerate() {
        let y = legend_y + idx as i32 * 28;
        root.draw(&Rectangle::new(
            [(legend_x, y), (legend_x + 16, y + 16)],
            series_color(idx).filled(),
        ))
        .context("Failed to draw legend swatch")?;
        root.draw_text(
            &format!("{} {:.1}%", name, value / total * 100.0),
            &TextStyle::from(("sans-serif", 14).into_font()),
            (legend_x + 24, y + 2),
        )
        .context("Failed to draw legend label")?;
    }

    Ok(())
}

fn draw_wedge<DB>(
    root: &DrawingArea<DB, Shift>,
    center: (i32, i32),
    radius: f64,
    start_angle: f64,
    sweep_angle: f64,
    color: RGBColor,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let steps = ((sweep_angle.abs() / 2.0).ceil() as usize).max(2);
    let mut points = vec![center];
    for i in 0..=steps {
        let angle = start_angle + sweep_angle * i as f64 / steps as f64;
        let rad = angle.to_radians();
        points.push((
            center.0 + (radius * rad.cos()) as i32,
            center.1 + (radius * rad.sin()) as i32,
        ));
    }

    root.draw(&Polygon::new(points, color.filled()))
        .context("Failed to draw pie segment")?;
    Ok(())
}
