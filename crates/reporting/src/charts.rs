//! SVG charts: lifetime value histogram and cohort heatmap.

use crate::cohort::CohortMatrix;
use crate::lifetime_value::Histogram;
use insights_core::{InsightsError, InsightsResult};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;
use tracing::{info, warn};

const BAR_COLOR: RGBColor = RGBColor(31, 119, 180);

/// Yellow-green-blue ramp, light to dark.
const HEAT_STOPS: [(u8, u8, u8); 5] = [
    (255, 255, 217),
    (199, 233, 180),
    (65, 182, 196),
    (34, 94, 168),
    (8, 29, 88),
];

fn chart_err<E: std::fmt::Display>(e: E) -> InsightsError {
    InsightsError::Chart(e.to_string())
}

/// Color for `value` in `[0, 1]` on the heat ramp.
pub fn heat_color(value: f64) -> RGBColor {
    let v = value.clamp(0.0, 1.0) * (HEAT_STOPS.len() - 1) as f64;
    let i = (v.floor() as usize).min(HEAT_STOPS.len() - 2);
    let frac = v - i as f64;
    let (r0, g0, b0) = HEAT_STOPS[i];
    let (r1, g1, b1) = HEAT_STOPS[i + 1];
    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
    RGBColor(lerp(r0, r1), lerp(g0, g1), lerp(b0, b1))
}

/// Render the histogram as bars. Returns `false` when there is nothing to
/// draw.
pub fn render_ltv_histogram(
    histogram: &Histogram,
    path: &Path,
    (width, height): (u32, u32),
) -> InsightsResult<bool> {
    let (Some(&lo), Some(&hi)) = (histogram.edges.first(), histogram.edges.last()) else {
        warn!(
            bins = histogram.counts.len(),
            "LTV histogram is empty, skipping chart"
        );
        return Ok(false);
    };
    let y_max = histogram.max_count() + histogram.max_count() / 10 + 1;

    let root = SVGBackend::new(path, (width, height)).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Customer Lifetime Value Distribution", ("sans-serif", 22))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(lo..hi, 0u64..y_max)
        .map_err(chart_err)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("LTV")
        .y_desc("Number of Customers")
        .draw()
        .map_err(chart_err)?;

    chart
        .draw_series(histogram.bins().map(|(left, right, count)| {
            Rectangle::new([(left, 0u64), (right, count)], BAR_COLOR.filled())
        }))
        .map_err(chart_err)?;

    root.present().map_err(chart_err)?;
    info!(path = %path.display(), "LTV histogram rendered");
    Ok(true)
}

/// Render the cohort matrix as an annotated heatmap, first cohort on top.
/// Returns `false` when the matrix is empty.
pub fn render_cohort_heatmap(
    matrix: &CohortMatrix,
    path: &Path,
    (width, height): (u32, u32),
) -> InsightsResult<bool> {
    if matrix.is_empty() {
        warn!("Empty cohort matrix, skipping heatmap");
        return Ok(false);
    }

    let n_cols = matrix.active_months.len() as i32;
    let n_rows = matrix.rows.len() as i32;
    let max = matrix.max_cell().max(1) as f64;

    let col_labels: Vec<String> = matrix.active_months.iter().map(|m| m.to_string()).collect();
    let row_labels: Vec<String> = matrix.cohort_months().map(|m| m.to_string()).collect();
    // Row 0 is drawn at the top, so y = n_rows - 1 - row.
    let to_y = |row: i32| n_rows - 1 - row;

    let x_fmt = |v: &SegmentValue<i32>| match v {
        SegmentValue::CenterOf(c) => col_labels.get(*c as usize).cloned().unwrap_or_default(),
        _ => String::new(),
    };
    let y_fmt = |v: &SegmentValue<i32>| match v {
        SegmentValue::CenterOf(y) => row_labels
            .get(to_y(*y) as usize)
            .cloned()
            .unwrap_or_default(),
        _ => String::new(),
    };

    let root = SVGBackend::new(path, (width, height)).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Cohort Analysis: Monthly Active Users", ("sans-serif", 22))
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d((0i32..n_cols).into_segmented(), (0i32..n_rows).into_segmented())
        .map_err(chart_err)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(n_cols as usize)
        .y_labels(n_rows as usize)
        .x_label_formatter(&x_fmt)
        .y_label_formatter(&y_fmt)
        .x_desc("active_month")
        .y_desc("cohort_month")
        .draw()
        .map_err(chart_err)?;

    let cells: Vec<(i32, i32, u64)> = matrix
        .rows
        .iter()
        .enumerate()
        .flat_map(|(r, row)| {
            row.active_customers
                .iter()
                .enumerate()
                .map(move |(c, &count)| (c as i32, to_y(r as i32), count))
        })
        .collect();

    chart
        .draw_series(cells.iter().map(|&(x, y, count)| {
            Rectangle::new(
                [
                    (SegmentValue::Exact(x), SegmentValue::Exact(y)),
                    (SegmentValue::Exact(x + 1), SegmentValue::Exact(y + 1)),
                ],
                heat_color(count as f64 / max).filled(),
            )
        }))
        .map_err(chart_err)?;

    let centered = Pos::new(HPos::Center, VPos::Center);
    chart
        .draw_series(cells.iter().map(|&(x, y, count)| {
            let ink = if count as f64 / max > 0.6 { &WHITE } else { &BLACK };
            Text::new(
                count.to_string(),
                (SegmentValue::CenterOf(x), SegmentValue::CenterOf(y)),
                ("sans-serif", 14).into_font().color(ink).pos(centered),
            )
        }))
        .map_err(chart_err)?;

    root.present().map_err(chart_err)?;
    info!(path = %path.display(), "Cohort heatmap rendered");
    Ok(true)
}
