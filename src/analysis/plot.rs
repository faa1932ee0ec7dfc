use std::io::Cursor;

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use plotters::prelude::*;

use crate::error::ScanError;

/// Appearance and labelling of a rendered trace.
#[derive(Clone, Debug)]
pub struct TraceStyle {
    pub width: u32,
    pub height: u32,
    pub caption: String,
    pub x_desc: String,
    pub y_desc: String,
    pub background: RGBColor,
    pub color: RGBColor,
    /// Fixed y range; auto-ranged from the data when `None`.
    pub y_bounds: Option<(f64, f64)>,
}

impl Default for TraceStyle {
    fn default() -> Self {
        Self {
            width: 900,
            height: 700,
            caption: String::new(),
            x_desc: String::new(),
            y_desc: String::new(),
            background: WHITE,
            color: BLUE,
            y_bounds: None,
        }
    }
}

/// Render a single x/y trace into an in-memory PNG.
pub fn render_trace_png(x: &[f64], y: &[f64], style: &TraceStyle) -> Result<Vec<u8>, ScanError> {
    if x.is_empty() || x.len() != y.len() {
        return Err(ScanError::Plot("trace has no samples".into()));
    }
    let (x_min, x_max) = {
        let b = bounds(x);
        if (b.1 - b.0).abs() < f64::EPSILON {
            pad(b)
        } else {
            b
        }
    };
    let (y_min, y_max) = match style.y_bounds {
        Some(b) => b,
        None => pad(bounds(y)),
    };

    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption(&style.caption, ("sans-serif", 20))
            .set_label_area_size(LabelAreaPosition::Left, 60)
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)?;
        chart
            .configure_mesh()
            .x_desc(&style.x_desc)
            .y_desc(&style.y_desc)
            .light_line_style(BLACK.mix(0.1))
            .draw()?;
        chart.draw_series(LineSeries::new(
            x.iter().zip(y).map(|(&x, &y)| (x, y)),
            &style.color,
        ))?;
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}

fn bounds(data: &[f64]) -> (f64, f64) {
    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for &v in data {
        if v.is_finite() {
            lo = lo.min(v);
            hi = hi.max(v);
        }
    }
    if lo > hi {
        (0.0, 1.0)
    } else {
        (lo, hi)
    }
}

fn pad((lo, hi): (f64, f64)) -> (f64, f64) {
    if (hi - lo).abs() < f64::EPSILON {
        (lo - 0.5, hi + 0.5)
    } else {
        let m = 0.05 * (hi - lo);
        (lo - m, hi + m)
    }
}

fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>, ScanError> {
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| ScanError::Plot("failed to allocate image buffer".into()))?;
    let mut output = Vec::new();
    DynamicImage::ImageRgb8(image).write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}
