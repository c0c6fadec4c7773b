use std::io::Write as _;
use std::ops::Range;

use anyhow::{Context as _, Result, bail};
use log::info;
use plotters::prelude::{
    BLUE, ChartBuilder, Circle, Color as _, IntoDrawingArea as _, IntoLogRange as _, SVGBackend,
    WHITE,
};
use post_flight_core::pipeline::collect_points;

use crate::{
    args::PlotCli,
    config::{PlotConfig, PostFlightConfig},
    csv_file::{read_table, write_atomic},
};

pub fn plot(args: PlotCli, config: &PostFlightConfig) -> Result<()> {
    let input = read_table(&args.input)?;
    let plot_config = &config.plot;

    let (points, report) = collect_points(&input, &plot_config.x_column, &plot_config.y_column, true)
        .with_context(|| format!("failed to read points from {}", input.name()))?;
    report.log_summary("plot");
    if points.is_empty() {
        bail!("{} has no rows to plot", input.name());
    }

    let svg = render_scatter(&points, plot_config)?;
    let output = args.output.unwrap_or_else(|| args.input.with_extension("svg"));
    write_atomic(&output, |file| {
        file.write_all(svg.as_bytes())?;
        Ok(())
    })?;
    info!("plot saved to {}", output.display());
    Ok(())
}

/// Scatter plot with a logarithmic x axis, as an svg document.
fn render_scatter(points: &[(f64, f64)], config: &PlotConfig) -> Result<String> {
    let x_range = padded_range(points.iter().map(|(x, _)| *x), true)?;
    let y_range = padded_range(points.iter().map(|(_, y)| *y), false)?;

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (config.width, config.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(&config.title, ("sans-serif", 30))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_range.log_scale(), y_range)?;

        chart
            .configure_mesh()
            .x_desc(config.x_label.as_str())
            .y_desc(config.y_label.as_str())
            .draw()?;

        chart.draw_series(
            points
                .iter()
                .map(|&(x, y)| Circle::new((x, y), 3, BLUE.filled())),
        )?;

        root.present()?;
    }
    Ok(svg)
}

/// min..max of `values`, widened when every value is the same. Ranges for a
/// log axis are widened by a factor instead of an offset so they stay
/// positive. No values, or a bound that is not finite, is an error.
fn padded_range(values: impl Iterator<Item = f64>, logarithmic: bool) -> Result<Range<f64>> {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), value| {
        (min.min(value), max.max(value))
    });
    if !min.is_finite() || !max.is_finite() {
        bail!("cannot fit an axis to {}..{}", min, max);
    }
    Ok(if min < max {
        min..max
    } else if logarithmic {
        min / 2.0..max * 2.0
    } else {
        min - 1.0..max + 1.0
    })
}
