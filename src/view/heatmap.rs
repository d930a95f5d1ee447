//! Weight-matrix heatmaps.

use std::error::Error;
use std::path::Path;

use plotters::prelude::*;

use super::colormap::{bwr, TwoSlopeNorm};
use crate::error::{self, NoiseError};
use crate::neural::params::WeightSnapshot;

pub const WIDTH: u32 = 1000;
pub const HEIGHT: u32 = 800;

const BAR_WIDTH: u32 = 140;
const BAR_STEPS: usize = 128;

/// Title drawn above the heatmap of step weights at `noise`.
pub fn caption(noise: f64) -> String {
    format!("Visualization with Noise: {}", noise)
}

/// Render one output row per class, one column per input, under `title`.
///
/// Row 0 sits at the top. A colour bar labelled from `min` to `max` of the
/// weights sits on the right.
pub fn render_heatmap(weights: &WeightSnapshot, title: &str, path: &Path) -> error::Result<()> {
    draw(weights, title, path).map_err(|e| NoiseError::Render {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn draw(weights: &WeightSnapshot, title: &str, path: &Path) -> Result<(), Box<dyn Error>> {
    let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled(title, ("sans-serif", 24))?;
    let (map_area, bar_area) = root.split_horizontally(WIDTH - BAR_WIDTH);

    let (rows, cols) = (weights.rows(), weights.cols());
    let (vmin, vmax) = weights.range();
    let norm = TwoSlopeNorm::new(vmin, vmax);

    let mut map = ChartBuilder::on(&map_area)
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(40)
        .build_cartesian_2d(0f64..cols.max(1) as f64, 0f64..rows.max(1) as f64)?;
    let flip = |y: &f64| format!("{:.0}", (rows as f64 - y).max(0.0));
    map.configure_mesh()
        .disable_mesh()
        .y_label_formatter(&flip)
        .draw()?;
    map.draw_series(
        (0..rows)
            .flat_map(|r| (0..cols).map(move |c| (r, c)))
            .map(|(r, c)| {
                let top = (rows - r) as f64;
                let colour = bwr(norm.apply(weights.get(r, c)));
                Rectangle::new([(c as f64, top - 1.0), (c as f64 + 1.0, top)], colour.filled())
            }),
    )?;

    let (lo, hi) = if norm.is_flat() {
        (vmin as f64 - 0.5, vmax as f64 + 0.5)
    } else {
        (vmin as f64, vmax as f64)
    };
    let mut bar = ChartBuilder::on(&bar_area)
        .margin(10)
        .margin_left(20)
        .right_y_label_area_size(60)
        .build_cartesian_2d(0f64..1f64, lo..hi)?;
    bar.configure_mesh()
        .disable_mesh()
        .disable_x_axis()
        .y_label_formatter(&|v: &f64| format!("{:.3}", v))
        .draw()?;
    let step = (hi - lo) / BAR_STEPS as f64;
    bar.draw_series((0..BAR_STEPS).map(|i| {
        let y0 = lo + step * i as f64;
        let colour = bwr(norm.apply((y0 + step / 2.0) as f32));
        Rectangle::new([(0.0, y0), (1.0, y0 + step)], colour.filled())
    }))?;

    root.present()?;
    Ok(())
}
