use serde::{Deserialize, Serialize};

use crate::aligner::Alignment;

/// A point in a time series. `timestamp_ms` is either milliseconds on a
/// logger's own clock or milliseconds since the unix epoch, depending on how
/// the series was normalized.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Sample<D> {
    pub timestamp_ms: i64,
    pub data: D,
}

impl<D> Sample<D> {
    pub fn new(timestamp_ms: i64, data: D) -> Self {
        Sample { timestamp_ms, data }
    }
}

/// Samples in input order. Sorting happens on demand through
/// [`TimeSeries::sorted_order`] so results can always be mapped back onto
/// the input order.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TimeSeries<D> {
    samples: Vec<Sample<D>>,
}

impl<D> TimeSeries<D> {
    pub fn new(samples: Vec<Sample<D>>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[Sample<D>] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Input indices ordered by timestamp, ties kept in input order.
    pub fn sorted_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.samples.len()).collect();
        order.sort_by_key(|&i| self.samples[i].timestamp_ms);
        order
    }

    pub fn is_sorted(&self) -> bool {
        self.samples
            .windows(2)
            .all(|pair| pair[0].timestamp_ms <= pair[1].timestamp_ms)
    }

    /// Smallest timestamp, `None` for an empty series.
    pub fn start_ms(&self) -> Option<i64> {
        self.samples.iter().map(|s| s.timestamp_ms).min()
    }

    /// Builds the merged series: one sample per primary sample, same order,
    /// with `merge` applied to a copy of the primary data and the matched
    /// reference data.
    pub fn merge_with<R, F>(
        &self,
        reference: &TimeSeries<R>,
        alignment: &Alignment,
        mut merge: F,
    ) -> TimeSeries<D>
    where
        D: Clone,
        F: FnMut(&mut D, &R),
    {
        let samples = self
            .samples
            .iter()
            .zip(alignment.matches())
            .map(|(sample, &matched)| {
                let mut data = sample.data.clone();
                merge(&mut data, &reference.samples[matched].data);
                Sample::new(sample.timestamp_ms, data)
            })
            .collect();
        TimeSeries::new(samples)
    }
}

impl<D> FromIterator<Sample<D>> for TimeSeries<D> {
    fn from_iter<T: IntoIterator<Item = Sample<D>>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
