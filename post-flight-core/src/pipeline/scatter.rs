use crate::{
    error::PipelineError,
    report::{ProcessReport, SkipReason},
    table::Table,
};

/// `(x, y)` pairs from two numeric columns, in row order. Rows with an
/// infinite or NaN value are skipped. With `positive_x` rows whose x is not
/// above zero are skipped too, for plotting on a logarithmic axis.
pub fn collect_points(
    input: &Table,
    x_column: &str,
    y_column: &str,
    positive_x: bool,
) -> Result<(Vec<(f64, f64)>, ProcessReport), PipelineError> {
    input.ensure_not_empty()?;
    let x = input.column(x_column)?;
    let y = input.column(y_column)?;

    let mut report = ProcessReport::new(input.len());
    let mut points = Vec::with_capacity(input.len());
    for row in 0..input.len() {
        let point = input.parse_f64(row, x).and_then(|x_value| {
            if !x_value.is_finite() || (positive_x && x_value <= 0.0) {
                return Err(out_of_domain(x_column, x_value));
            }
            let y_value = input.parse_f64(row, y)?;
            if !y_value.is_finite() {
                return Err(out_of_domain(y_column, y_value));
            }
            Ok((x_value, y_value))
        });
        match point {
            Ok(point) => points.push(point),
            Err(reason) => report.skip(input.name(), row, reason),
        }
    }

    report.rows_out = points.len();
    Ok((points, report))
}

fn out_of_domain(column: &str, value: f64) -> SkipReason {
    SkipReason::OutOfDomain {
        column: column.into(),
        value: value.to_string(),
    }
}
