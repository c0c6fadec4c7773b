//! Table level operations. Each one takes its inputs and configuration,
//! returns the output table, and reports the rows it had to skip.

mod distance;
mod interpolate;
mod merge;
mod range;
mod scatter;

pub use distance::{DistanceConfig, annotate_distance};
pub use interpolate::{InterpolationConfig, LatLon, interpolate_positions};
pub use merge::{FieldMapping, MergeConfig, merge_reference};
pub use range::{RangeConfig, annotate_range, estimate_range};
pub use scatter::collect_points;
