use rand::Rng;

use crate::request::DateRange;

/// Draws `count` independent, uniformly distributed unix timestamps inside
/// `range` (both ends inclusive) and returns them sorted ascending.
///
/// Sorting before assignment keeps rewritten history chronological: the
/// i-th oldest commit receives the i-th smallest timestamp.
pub fn random_timestamps<R: Rng + ?Sized>(range: &DateRange, count: usize, rng: &mut R) -> Vec<i64> {
    let (lo, hi) = (range.first_second(), range.last_second());
    let mut stamps: Vec<i64> = (0..count).map(|_| rng.gen_range(lo..=hi)).collect();
    stamps.sort_unstable();
    stamps
}

/// Pairs commits (oldest first) with sorted timestamps drawn from `range`.
pub fn assign_timestamps<R: Rng + ?Sized>(
    commits: &[String],
    range: &DateRange,
    rng: &mut R,
) -> Vec<(String, i64)> {
    let stamps = random_timestamps(range, commits.len(), rng);
    commits.iter().cloned().zip(stamps).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn range(start: (i32, u32, u32), end: (i32, u32, u32)) -> DateRange {
        let s = NaiveDate::from_ymd_opt(start.0, start.1, start.2).expect("valid start");
        let e = NaiveDate::from_ymd_opt(end.0, end.1, end.2).expect("valid end");
        DateRange::new(s, e).expect("valid range")
    }

    #[test]
    fn timestamps_fall_inside_window_and_are_sorted() {
        let r = range((2023, 1, 1), (2023, 1, 31));
        let mut rng = StdRng::seed_from_u64(7);
        for n in [1usize, 2, 5, 100, 1000] {
            let stamps = random_timestamps(&r, n, &mut rng);
            assert_eq!(stamps.len(), n);
            assert!(stamps.iter().all(|t| (r.first_second()..=r.last_second()).contains(t)));
            assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn zero_commits_yield_no_timestamps() {
        let r = range((2023, 1, 1), (2023, 1, 2));
        let mut rng = StdRng::seed_from_u64(1);
        assert!(random_timestamps(&r, 0, &mut rng).is_empty());
    }

    #[test]
    fn single_day_window_stays_within_that_day() {
        let r = range((2020, 2, 29), (2020, 2, 29));
        let mut rng = StdRng::seed_from_u64(42);
        let stamps = random_timestamps(&r, 500, &mut rng);
        let day_start = r.first_second();
        assert!(stamps.iter().all(|t| *t >= day_start && *t < day_start + 86_400));
    }

    #[test]
    fn assignment_follows_commit_order() {
        let r = range((2023, 1, 1), (2023, 1, 31));
        let commits: Vec<String> = ["c1", "c2", "c3", "c4", "c5"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mut rng = StdRng::seed_from_u64(99);
        let assigned = assign_timestamps(&commits, &r, &mut rng);

        let ids: Vec<&str> = assigned.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2", "c3", "c4", "c5"]);
        assert!(assigned.windows(2).all(|w| w[0].1 <= w[1].1));
    }
}
