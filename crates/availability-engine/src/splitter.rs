//! Subdivision of free intervals into fixed-length candidate slots.
//!
//! Interior slots sit on a grid derived from the requested duration so that
//! suggestions land on human-friendly times (on the hour or half hour for
//! hour-long slots, quarter hours for 45-minute slots). Two boundary slots
//! keep the first and last usable moments of a free interval reachable even
//! when they are off the grid.
//!
//! The output is hard-capped at [`MAX_SLOTS`]. Free windows can stretch over
//! many days and an uncapped split grows without bound.

use crate::interval::TimeValueInterval;
use crate::time_of_day::{MS_PER_HOUR, MS_PER_MINUTE};

/// Upper bound on the number of slots produced by one [`split_intervals`] call.
pub const MAX_SLOTS: usize = 20;

/// Minimum distance from the grid before an off-grid boundary slot is added.
pub const BOUNDARY_SLOT_THRESHOLD_MS: i64 = 5 * MS_PER_MINUTE;

/// The grid never gets coarser than this many minutes.
pub const ROUNDING_CEILING_MINUTES: i64 = 30;

/// Rounding direction for [`round_to_grid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    Up,
    Down,
}

/// Greatest common divisor of `|nearest_to|` and [`ROUNDING_CEILING_MINUTES`].
///
/// A zero `nearest_to` yields the ceiling itself.
pub fn grid_minutes(nearest_to: i64) -> i64 {
    let mut n1 = nearest_to.abs().max(ROUNDING_CEILING_MINUTES);
    let mut n2 = nearest_to.abs().min(ROUNDING_CEILING_MINUTES);
    // Usually returns within two iterations.
    loop {
        if n2 == 0 {
            return n1;
        }
        n1 %= n2;
        if n1 == 0 {
            return n2;
        }
        n2 %= n1;
    }
}

/// Round the within-hour component of an epoch-millisecond value to the grid
/// of `gcd(nearest_to_minutes, 30)` minutes.
///
/// Hours and above pass through unchanged, so rounding up from `10:50` on a
/// 30-minute grid yields `11:00`.
pub fn round_to_grid(value_ms: i64, nearest_to_minutes: i64, rounding: Rounding) -> i64 {
    let grid_ms = grid_minutes(nearest_to_minutes) * MS_PER_MINUTE;
    let within_hour = value_ms.rem_euclid(MS_PER_HOUR);
    let hours_and_above = value_ms - within_hour;
    let steps = match rounding {
        Rounding::Up => (within_hour + grid_ms - 1) / grid_ms,
        Rounding::Down => within_hour / grid_ms,
    };
    hours_and_above + steps * grid_ms
}

/// Split `intervals` into slots of exactly `duration_ms`.
///
/// # Arguments
///
/// * `intervals` — Free (or caller-given) intervals, in the order to scan
/// * `duration_ms` — Length of every produced slot; non-positive yields nothing
/// * `earliest_start` — Optional floor; interval starts are clamped to it
///
/// # Returns
///
/// At most [`MAX_SLOTS`] slots. Slots from intervals shorter than twice the
/// duration may overlap each other.
pub fn split_intervals(
    intervals: &[TimeValueInterval],
    duration_ms: i64,
    earliest_start: Option<i64>,
) -> Vec<TimeValueInterval> {
    if intervals.is_empty() || duration_ms <= 0 {
        return Vec::new();
    }

    let duration_minutes = duration_ms / MS_PER_MINUTE;
    let mut slots: Vec<TimeValueInterval> = Vec::new();

    for interval in intervals {
        let end = interval.end;
        if earliest_start.is_some_and(|floor| end <= floor) {
            continue;
        }
        let start = earliest_start.map_or(interval.start, |floor| interval.start.max(floor));
        if end - start < duration_ms {
            continue;
        }

        let rounded_start = round_to_grid(start, duration_minutes, Rounding::Up);

        if rounded_start - start >= BOUNDARY_SLOT_THRESHOLD_MS {
            slots.push(TimeValueInterval::new(start, start + duration_ms));
        }

        let latest_start = end - duration_ms;
        let mut slot_start = rounded_start;
        while slot_start <= latest_start && slots.len() < MAX_SLOTS {
            slots.push(TimeValueInterval::new(slot_start, slot_start + duration_ms));
            slot_start += duration_ms;
        }

        if let Some(last) = slots.last() {
            if slots.len() < MAX_SLOTS && end - last.end >= BOUNDARY_SLOT_THRESHOLD_MS {
                slots.push(TimeValueInterval::new(end - duration_ms, end));
            }
        }

        if slots.len() >= MAX_SLOTS {
            tracing::debug!(cap = MAX_SLOTS, "Slot cap reached");
            break;
        }
    }

    slots
}
