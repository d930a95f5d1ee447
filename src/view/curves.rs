//! Loss and accuracy against cumulative noise, as two side-by-side panels.

use std::error::Error;
use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::error::{self, NoiseError};
use crate::sweep::ResultSeries;

pub const WIDTH: u32 = 1200;
pub const HEIGHT: u32 = 400;

pub const LOSS_TITLE: &str = "Test Loss with Noise";
pub const ACCURACY_TITLE: &str = "Test Accuracy with Noise";

const LOSS: RGBColor = RGBColor(31, 119, 180);
const ACCURACY: RGBColor = RGBColor(214, 39, 40);

type Panel<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

/// `(lo, hi)` of finite values, widened when degenerate.
fn bounds(values: &[f64]) -> (f64, f64) {
    let (lo, hi) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if lo > hi {
        (0.0, 1.0)
    } else if lo == hi {
        let pad = if lo == 0.0 { 1.0 } else { lo.abs() * 0.05 };
        (lo - pad, hi + pad)
    } else {
        let pad = (hi - lo) * 0.05;
        (lo - pad, hi + pad)
    }
}

fn draw_panel(
    area: &Panel<'_>,
    title: &str,
    ylabel: &str,
    xs: &[f64],
    ys: &[f64],
    colour: RGBColor,
) -> Result<(), Box<dyn Error>> {
    let (x0, x1) = bounds(xs);
    let (y0, y1) = bounds(ys);
    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x0..x1, y0..y1)?;
    chart.configure_mesh().x_desc("Noise").y_desc(ylabel).draw()?;

    let points: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .map(|(&x, &y)| (x, y))
        .collect();
    chart.draw_series(LineSeries::new(points.iter().copied(), &colour))?;
    chart.draw_series(points.iter().map(|&p| Circle::new(p, 3, colour.filled())))?;
    Ok(())
}

fn draw(series: &ResultSeries, path: &Path) -> Result<(), Box<dyn Error>> {
    let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly((1, 2));
    let noise = series.noise_levels();
    draw_panel(&panels[0], LOSS_TITLE, "Test Loss", noise, series.losses(), LOSS)?;
    draw_panel(
        &panels[1],
        ACCURACY_TITLE,
        "Test Accuracy (%)",
        noise,
        series.accuracies(),
        ACCURACY,
    )?;
    root.present()?;
    Ok(())
}

/// Loss on the left, accuracy on the right, both against noise.
pub fn render_curves(series: &ResultSeries, path: &Path) -> error::Result<()> {
    draw(series, path).map_err(|e| NoiseError::Render {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
