use crate::jvm::Error;

/// Half-open interval `[start, end)` of code offsets
///
/// Nothing stops `start` from exceeding `end`, but the functions in this module all assume
/// well-formed, non-negative intervals.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct Range {
    pub start: i32,
    pub end: i32,
}

impl Range {
    pub const fn new(start: i32, end: i32) -> Range {
        Range { start, end }
    }

    /// Number of offsets covered
    pub fn len(&self) -> usize {
        (self.end - self.start).max(0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn contains(&self, offset: i32) -> bool {
        self.start <= offset && offset < self.end
    }
}

impl From<std::ops::Range<i32>> for Range {
    fn from(range: std::ops::Range<i32>) -> Range {
        Range::new(range.start, range.end)
    }
}

/// Sort ranges by their start and merge any that overlap or touch
///
/// Absent entries (`None`) are skipped, so this accepts both `Range` and `Option<Range>` items.
/// The output is ascending, pairwise disjoint, and has the fewest ranges covering the same
/// offsets as the input. Ranges that merely touch (`a.end == b.start`) are merged too.
pub fn normalize<I>(ranges: I) -> Vec<Range>
where
    I: IntoIterator,
    I::Item: Into<Option<Range>>,
{
    let mut ranges: Vec<Range> = ranges.into_iter().filter_map(|range| range.into()).collect();

    // Stable, so equal starts keep their relative order
    ranges.sort_by_key(|range| range.start);

    let mut merged: Vec<Range> = Vec::with_capacity(ranges.len());
    for next in ranges {
        match merged.last_mut() {
            Some(current) if next.start <= current.end => {
                current.end = current.end.max(next.end);
            }
            _ => merged.push(next),
        }
    }
    merged
}

/// Compute the gaps left by `ranges` inside `[0, universe_size)`
///
/// The ranges need not be normalized first. Together, `normalize(ranges)` and the output cover
/// `[0, universe_size)` exactly once. Ranges reaching past `universe_size` are a bug in the
/// caller and are reported as `Error::InvariantViolation` rather than being truncated.
pub fn invert<I>(ranges: I, universe_size: i32) -> Result<Vec<Range>, Error>
where
    I: IntoIterator,
    I::Item: Into<Option<Range>>,
{
    if universe_size <= 0 {
        return Err(Error::InvalidArgument(format!(
            "universe size must be positive, got {}",
            universe_size
        )));
    }

    let ordered = normalize(ranges);
    let (first, last) = match (ordered.first(), ordered.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Ok(vec![Range::new(0, universe_size)]),
    };

    if last.end > universe_size {
        log::error!(
            "Range {:?} extends past the end of a universe of size {}",
            last,
            universe_size
        );
        return Err(Error::InvariantViolation(format!(
            "range {}..{} exceeds universe size {}",
            last.start, last.end, universe_size
        )));
    }

    let mut inverted = vec![];

    // Gap before the first range
    if first.start != 0 {
        inverted.push(Range::new(0, first.start));
    }

    // Gaps between ranges
    for pair in ordered.windows(2) {
        inverted.push(Range::new(pair[0].end, pair[1].start));
    }

    // Gap after the last range
    if last.end != universe_size {
        inverted.push(Range::new(last.end, universe_size));
    }

    Ok(inverted)
}

#[cfg(test)]
mod test {
    use super::*;

    fn r(start: i32, end: i32) -> Range {
        Range::new(start, end)
    }

    /// Number of ranges in `ranges` containing each offset of `[0, size)`
    fn coverage(ranges: &[Range], size: i32) -> Vec<usize> {
        (0..size)
            .map(|offset| ranges.iter().filter(|range| range.contains(offset)).count())
            .collect()
    }

    #[test]
    fn normalize_merges_overlapping() {
        assert_eq!(
            normalize(vec![r(5, 10), r(1, 3), r(8, 12)]),
            vec![r(1, 3), r(5, 12)]
        );
    }

    #[test]
    fn normalize_merges_touching() {
        assert_eq!(normalize(vec![r(3, 6), r(0, 3)]), vec![r(0, 6)]);
        assert_eq!(normalize(vec![r(0, 2), r(3, 6)]), vec![r(0, 2), r(3, 6)]);
    }

    #[test]
    fn normalize_nested_and_absent() {
        let ranges = vec![Some(r(2, 20)), None, Some(r(4, 6)), Some(r(10, 25)), None];
        assert_eq!(normalize(ranges), vec![r(2, 25)]);
        assert_eq!(normalize(Vec::<Range>::new()), Vec::<Range>::new());
        assert_eq!(normalize(vec![None::<Range>]), Vec::<Range>::new());
    }

    #[test]
    fn normalize_preserves_union_and_is_idempotent() {
        let input = vec![r(7, 9), r(0, 2), r(1, 4), r(12, 13), r(8, 11), r(15, 15)];
        let normalized = normalize(input.clone());

        for pair in normalized.windows(2) {
            assert!(pair[0].end < pair[1].start, "{:?} not disjoint", pair);
        }

        let covered_in = coverage(&input, 20).into_iter().map(|c| c > 0);
        let covered_out = coverage(&normalized, 20).into_iter().map(|c| c > 0);
        assert!(covered_in.eq(covered_out));

        assert_eq!(normalize(normalized.clone()), normalized);
    }

    #[test]
    fn invert_example() {
        assert_eq!(
            invert(vec![r(1, 3), r(5, 12)], 15).unwrap(),
            vec![r(0, 1), r(3, 5), r(12, 15)]
        );
    }

    #[test]
    fn invert_edges() {
        assert_eq!(invert(Vec::<Range>::new(), 7).unwrap(), vec![r(0, 7)]);
        assert_eq!(invert(vec![r(0, 7)], 7).unwrap(), Vec::<Range>::new());
        assert_eq!(invert(vec![r(0, 3)], 7).unwrap(), vec![r(3, 7)]);
        assert_eq!(invert(vec![r(3, 7)], 7).unwrap(), vec![r(0, 3)]);
    }

    #[test]
    fn invert_partitions_universe() {
        let input = vec![r(4, 9), r(2, 5), r(14, 16), r(11, 12)];
        let normalized = normalize(input.clone());
        let inverted = invert(input, 20).unwrap();

        let mut both = normalized;
        both.extend(inverted);
        assert!(coverage(&both, 20).into_iter().all(|c| c == 1));
    }

    #[test]
    fn invert_rejects_bad_universe() {
        assert!(matches!(
            invert(vec![r(0, 1)], 0),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            invert(Vec::<Range>::new(), -4),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn invert_rejects_ranges_past_universe() {
        assert!(matches!(
            invert(vec![r(2, 11)], 10),
            Err(Error::InvariantViolation(_))
        ));
    }
}
