use availability_engine::{
    compute_available_times, compute_off_hours, merge_interval, resolve_time_slots, round_to_grid,
    split_intervals, Anchor, DateInterval, EnglishRecognizer, Rounding, TimeValueInterval,
    MAX_SLOTS,
};
use chrono::DateTime;
use proptest::prelude::*;

const MINUTE: i64 = 60_000;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;

// 2020-01-01T00:00:00Z .. 2030-01-01T00:00:00Z
const EPOCH_2020: i64 = 1_577_836_800_000;
const EPOCH_2030: i64 = 1_893_456_000_000;

fn interval() -> impl Strategy<Value = TimeValueInterval> {
    (0i64..10 * DAY, 0i64..6 * HOUR)
        .prop_map(|(start, len)| TimeValueInterval::new(EPOCH_2020 + start, EPOCH_2020 + start + len))
}

fn is_sorted_and_disjoint(intervals: &[TimeValueInterval]) -> bool {
    intervals.windows(2).all(|w| w[0].end <= w[1].start)
}

fn utc_anchor(now_ms: i64) -> Anchor {
    let now = DateTime::from_timestamp_millis(now_ms).unwrap();
    Anchor::new(now, chrono_tz::UTC)
}

proptest! {
    /// Free intervals are sorted, pairwise disjoint, and never empty.
    #[test]
    fn available_times_sorted_and_disjoint(
        busy in prop::collection::vec(interval(), 0..30),
        off_hours in prop::collection::vec(interval(), 0..10),
        now in 0i64..10 * DAY,
    ) {
        let free = compute_available_times(&busy, &off_hours, EPOCH_2020 + now);
        prop_assert!(is_sorted_and_disjoint(&free), "not disjoint: {:?}", free);
        prop_assert!(free.iter().all(|f| f.end > f.start));
        prop_assert!(free.iter().all(|f| f.start >= EPOCH_2020 + now));
        for f in &free {
            prop_assert!(busy.iter().chain(off_hours.iter()).all(|b| !f.overlaps(b)));
        }
    }

    /// Merging a selected interval keeps free time sorted and disjoint.
    #[test]
    fn merge_interval_keeps_invariants(
        busy in prop::collection::vec(interval(), 1..20),
        current in interval(),
    ) {
        let free = compute_available_times(&busy, &[], EPOCH_2020);
        let merged = merge_interval(Some(current), &free);
        prop_assert!(is_sorted_and_disjoint(&merged), "not disjoint: {:?}", merged);
        prop_assert!(merged.iter().any(|m| m.contains(&current)));
    }

    /// The splitter never returns more than the cap.
    #[test]
    fn split_never_exceeds_cap(
        intervals in prop::collection::vec(interval(), 0..40),
        duration in 1i64..4 * 60,
        floor in prop::option::of(0i64..10 * DAY),
    ) {
        let slots = split_intervals(&intervals, duration * MINUTE, floor.map(|f| EPOCH_2020 + f));
        prop_assert!(slots.len() <= MAX_SLOTS);
    }

    /// Every slot has the requested length and lies within one input interval.
    #[test]
    fn split_slots_have_requested_duration(
        intervals in prop::collection::vec(interval(), 0..10),
        duration in 1i64..4 * 60,
    ) {
        let duration = duration * MINUTE;
        for slot in split_intervals(&intervals, duration, None) {
            prop_assert_eq!(slot.duration_ms(), duration);
            prop_assert!(intervals.iter().any(|i| i.contains(&slot)), "stray slot: {:?}", slot);
        }
    }

    /// Rounding up never moves backwards or by a full hour.
    #[test]
    fn round_up_is_bounded(value in EPOCH_2020..EPOCH_2030, nearest_to in 1i64..240) {
        let rounded = round_to_grid(value, nearest_to, Rounding::Up);
        prop_assert!(rounded >= value);
        prop_assert!(rounded - value < 30 * MINUTE);
        prop_assert!(round_to_grid(value, nearest_to, Rounding::Down) <= value);
    }

    /// An empty request with no free time still yields slots of the
    /// requested duration, starting no earlier than the next five-minute mark.
    #[test]
    fn empty_request_always_yields_slots(now in EPOCH_2020..EPOCH_2030, minutes in 1i64..8 * 60) {
        let anchor = utc_anchor(now);
        let recognizer = EnglishRecognizer::new(anchor);
        let duration = minutes * MINUTE;
        let resolution = resolve_time_slots(&recognizer, &anchor, "", None, &[], duration);

        let earliest = round_to_grid(now, 5, Rounding::Up);
        prop_assert!(!resolution.is_recognized);
        prop_assert!(!resolution.slots.is_empty());
        for slot in resolution.slots.iter().map(DateInterval::to_values) {
            prop_assert_eq!(slot.duration_ms(), duration);
            prop_assert!(slot.start >= earliest);
        }
    }

    /// Wide-open working hours never produce off hours.
    #[test]
    fn wide_open_hours_have_no_off_hours(start in 0i64..365 * DAY, days in 0i64..30) {
        let anchor = utc_anchor(EPOCH_2020 + start);
        let recognizer = EnglishRecognizer::new(anchor);
        let window = TimeValueInterval::new(EPOCH_2020 + start, EPOCH_2020 + start + days * DAY);
        let off = compute_off_hours(&recognizer, "12:00 AM", "11:59 PM", window, &anchor).unwrap();
        prop_assert!(off.is_empty(), "got: {:?}", off);
    }
}
