use serde::{Deserialize, Serialize};

use crate::{
    error::{AlignError, SeriesRole},
    time_series::TimeSeries,
};

/// How the reference clock relates to the primary clock.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TimeBasePolicy {
    /// The reference logger produced one sample every `sampling_period_ms`,
    /// starting when the primary log started. Reference timestamps are
    /// ignored; the reference index is derived from elapsed primary time.
    RawMillisecondOffset { sampling_period_ms: i64 },
    /// Both series carry absolute instants on the same clock.
    AbsoluteTime,
    /// Reference timestamps are shifted by `offset_ms` before the join.
    /// Without an explicit offset the two series' start times are lined up.
    ConstantOffset { offset_ms: Option<i64> },
}

/// The reference sample chosen for every primary sample, both indexed in
/// input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
    matches: Vec<usize>,
    fallbacks: usize,
}

impl Alignment {
    pub fn matches(&self) -> &[usize] {
        &self.matches
    }

    pub fn reference_index(&self, primary_index: usize) -> usize {
        self.matches[primary_index]
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Number of primary samples that had no qualifying reference sample and
    /// were given the earliest (as-of join) or a clamped (fixed period) one.
    pub fn fallback_count(&self) -> usize {
        self.fallbacks
    }
}

/// Backward ("as-of") join of a primary series against a reference series.
#[derive(Debug, Clone)]
pub struct TimeSeriesAligner {
    policy: TimeBasePolicy,
}

impl TimeSeriesAligner {
    pub fn new(policy: TimeBasePolicy) -> Self {
        Self { policy }
    }

    pub fn align<P, R>(
        &self,
        primary: &TimeSeries<P>,
        reference: &TimeSeries<R>,
    ) -> Result<Alignment, AlignError> {
        if primary.is_empty() {
            return Err(AlignError::EmptySeries(SeriesRole::Primary));
        }
        if reference.is_empty() {
            return Err(AlignError::EmptySeries(SeriesRole::Reference));
        }

        let alignment = match self.policy {
            TimeBasePolicy::RawMillisecondOffset { sampling_period_ms } => {
                fixed_period_join(primary, reference.len(), sampling_period_ms)?
            }
            TimeBasePolicy::AbsoluteTime => as_of_join(primary, reference, 0),
            TimeBasePolicy::ConstantOffset { offset_ms } => {
                let offset_ms = match offset_ms {
                    Some(offset_ms) => offset_ms,
                    // both series are non-empty here
                    None => primary.start_ms().unwrap_or(0) - reference.start_ms().unwrap_or(0),
                };
                log_debug!("reference clock offset: {}ms", offset_ms);
                as_of_join(primary, reference, offset_ms)
            }
        };

        log_debug!(
            "aligned {} primary samples against {} reference samples, {} fell back",
            alignment.len(),
            reference.len(),
            alignment.fallback_count()
        );
        Ok(alignment)
    }
}

fn fixed_period_join<P>(
    primary: &TimeSeries<P>,
    reference_len: usize,
    sampling_period_ms: i64,
) -> Result<Alignment, AlignError> {
    if sampling_period_ms <= 0 {
        return Err(AlignError::InvalidSamplingPeriod(sampling_period_ms));
    }

    let start_ms = primary.samples()[0].timestamp_ms;
    let last = reference_len - 1;
    let mut fallbacks = 0;
    let matches = primary
        .samples()
        .iter()
        .map(|sample| {
            let elapsed_ms = sample.timestamp_ms.saturating_sub(start_ms);
            let index = elapsed_ms.div_euclid(sampling_period_ms);
            if index < 0 {
                fallbacks += 1;
                0
            } else if index as u64 > last as u64 {
                fallbacks += 1;
                last
            } else {
                index as usize
            }
        })
        .collect();

    Ok(Alignment { matches, fallbacks })
}

/// Two-pointer sweep over both series in timestamp order. `cursor` counts the
/// reference samples at or before the current primary timestamp; it never
/// moves backwards because primary samples are visited in ascending order.
fn as_of_join<P, R>(
    primary: &TimeSeries<P>,
    reference: &TimeSeries<R>,
    reference_offset_ms: i64,
) -> Alignment {
    let reference_order = reference.sorted_order();
    let reference_ts = |position: usize| {
        reference.samples()[reference_order[position]]
            .timestamp_ms
            .saturating_add(reference_offset_ms)
    };

    let mut matches = vec![0usize; primary.len()];
    let mut fallbacks = 0;
    let mut cursor = 0usize;
    for primary_index in primary.sorted_order() {
        let target = primary.samples()[primary_index].timestamp_ms;
        while cursor < reference_order.len() && reference_ts(cursor) <= target {
            cursor += 1;
        }

        matches[primary_index] = if cursor == 0 {
            fallbacks += 1;
            reference_order[0]
        } else {
            reference_order[cursor - 1]
        };
    }

    Alignment { matches, fallbacks }
}
