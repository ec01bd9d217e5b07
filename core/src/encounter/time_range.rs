//! Union of time intervals

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSegment {
    pub begin: f64,
    pub end: f64,
}

impl TimeSegment {
    pub fn new(begin: f64, end: f64) -> Self {
        Self { begin, end }
    }

    pub fn total(&self) -> f64 {
        self.end - self.begin
    }
}

/// Sorted, non-overlapping segments. Adding a segment merges every segment it
/// overlaps or touches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    segments: Vec<TimeSegment>,
}

impl TimeRange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_segment(segment: TimeSegment) -> Self {
        let mut range = Self::new();
        range.add(segment);
        range
    }

    /// Union-add a segment. Inverted segments are ignored.
    pub fn add(&mut self, segment: TimeSegment) {
        if segment.end < segment.begin || segment.begin.is_nan() || segment.end.is_nan() {
            return;
        }

        let start = self.segments.partition_point(|s| s.end < segment.begin);
        let stop = self.segments.partition_point(|s| s.begin <= segment.end);

        let mut merged = segment;
        if start < stop {
            merged.begin = merged.begin.min(self.segments[start].begin);
            merged.end = merged.end.max(self.segments[stop - 1].end);
        }
        self.segments.splice(start..stop, std::iter::once(merged));
    }

    /// Length of the union in seconds
    pub fn total_seconds(&self) -> f64 {
        self.segments.iter().map(TimeSegment::total).sum()
    }

    pub fn segments(&self) -> &[TimeSegment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(segments: &[(f64, f64)]) -> TimeRange {
        let mut range = TimeRange::new();
        for (begin, end) in segments {
            range.add(TimeSegment::new(*begin, *end));
        }
        range
    }

    #[test]
    fn disjoint_segments_sum() {
        let r = range(&[(0.0, 5.0), (10.0, 12.0)]);
        assert_eq!(r.segments().len(), 2);
        assert_eq!(r.total_seconds(), 7.0);
    }

    #[test]
    fn overlapping_segments_union() {
        let r = range(&[(0.0, 10.0), (0.0, 5.0), (8.0, 15.0)]);
        assert_eq!(r.segments(), &[TimeSegment::new(0.0, 15.0)]);
        assert_eq!(r.total_seconds(), 15.0);
    }

    #[test]
    fn bridging_segment_merges_neighbours() {
        let r = range(&[(20.0, 25.0), (0.0, 5.0), (10.0, 12.0), (4.0, 21.0)]);
        assert_eq!(r.segments(), &[TimeSegment::new(0.0, 25.0)]);
    }

    #[test]
    fn touching_segments_merge() {
        let r = range(&[(0.0, 5.0), (5.0, 9.0)]);
        assert_eq!(r.segments().len(), 1);
        assert_eq!(r.total_seconds(), 9.0);
    }

    #[test]
    fn out_of_order_adds_stay_sorted() {
        let r = range(&[(30.0, 31.0), (10.0, 11.0), (20.0, 21.0)]);
        let begins: Vec<f64> = r.segments().iter().map(|s| s.begin).collect();
        assert_eq!(begins, vec![10.0, 20.0, 30.0]);
        assert_eq!(r.segments().last().map(|s| s.end), Some(31.0));
    }

    #[test]
    fn union_matches_brute_force_coverage() {
        let inputs = [(3.0, 7.0), (1.0, 2.0), (6.0, 9.0), (2.0, 3.0), (12.0, 14.0), (13.0, 13.5)];
        let r = range(&inputs);

        // Unit steps of 0.5 covered by any input interval
        let covered = (0..40)
            .map(|i| i as f64 * 0.5)
            .filter(|t| inputs.iter().any(|(b, e)| *t >= *b && *t + 0.5 <= *e))
            .count();
        assert_eq!(r.total_seconds(), covered as f64 * 0.5);
    }

    #[test]
    fn inverted_segment_ignored() {
        let r = range(&[(5.0, 1.0)]);
        assert!(r.is_empty());
        assert_eq!(r.total_seconds(), 0.0);
    }
}
