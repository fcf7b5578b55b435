#[cfg(test)]
mod tests {
    use crate::availability::{compute_open_slots, find_conflict, fits_block};
    use crate::hours::MinuteRange;
    use bodywork_db::BookedInterval;
    use proptest::prelude::*;

    // Non-overlapping intervals inside the day, built from (gap, length) pairs
    fn booked_intervals(layout: &[(u32, u32)]) -> Vec<BookedInterval> {
        let mut intervals = Vec::new();
        let mut cursor = 0;
        for (i, (gap, len)) in layout.iter().enumerate() {
            let start = cursor + gap;
            let end = start + len;
            if end > 1440 {
                break;
            }
            intervals.push(BookedInterval {
                id: i as i64 + 1,
                start_minute: start,
                end_minute: end,
            });
            cursor = end;
        }
        intervals
    }

    fn windows_overlap(a: u32, b: u32, duration: u32, break_minutes: u32) -> bool {
        a < b + duration + break_minutes && b < a + duration + break_minutes
    }

    proptest! {
        // Every returned slot lies in a block and collides with nothing
        #[test]
        fn test_open_slots_are_bookable(
            block_start in 0u32..720,
            block_len in 30u32..720,
            booked_layout in prop::collection::vec((0u32..180, 15u32..150), 0..6),
            duration in prop::sample::select(vec![30u32, 45, 60, 90, 120]),
            break_minutes in 0u32..30,
            step in prop::sample::select(vec![5u32, 10, 15, 30]),
            earliest in 0u32..1440,
        ) {
            let blocks = [MinuteRange { from: block_start, to: block_start + block_len }];
            let booked = booked_intervals(&booked_layout);

            let slots = compute_open_slots(&blocks, &booked, duration, break_minutes, step, earliest);

            for slot in &slots {
                prop_assert!(*slot >= earliest);
                prop_assert!(fits_block(&blocks, *slot, duration, break_minutes));
                prop_assert!(find_conflict(*slot, duration, break_minutes, &booked).is_none());
                prop_assert_eq!((*slot - block_start) % step, 0);
            }
            prop_assert!(slots.windows(2).all(|w| w[0] < w[1]));
        }

        // Same inputs, same answer
        #[test]
        fn test_open_slots_idempotent(
            booked_layout in prop::collection::vec((0u32..180, 15u32..150), 0..6),
            duration in prop::sample::select(vec![60u32, 90, 120]),
            break_minutes in 0u32..30,
        ) {
            let blocks = [MinuteRange { from: 540, to: 1020 }];
            let booked = booked_intervals(&booked_layout);
            let first = compute_open_slots(&blocks, &booked, duration, break_minutes, 15, 0);
            let second = compute_open_slots(&blocks, &booked, duration, break_minutes, 15, 0);
            prop_assert_eq!(first, second);
        }

        // Booking open slots one after another never produces overlapping windows
        #[test]
        fn test_sequential_bookings_never_overlap(
            picks in prop::collection::vec(0usize..64, 1..12),
            duration in prop::sample::select(vec![60u32, 90, 120]),
            break_minutes in 0u32..30,
        ) {
            let blocks = [MinuteRange { from: 540, to: 1020 }];
            let mut booked: Vec<BookedInterval> = Vec::new();

            for (i, pick) in picks.iter().enumerate() {
                let slots = compute_open_slots(&blocks, &booked, duration, break_minutes, 15, 0);
                if slots.is_empty() {
                    break;
                }
                let start = slots[pick % slots.len()];
                booked.push(BookedInterval {
                    id: i as i64 + 1,
                    start_minute: start,
                    end_minute: start + duration,
                });
            }

            for (i, a) in booked.iter().enumerate() {
                for b in booked.iter().skip(i + 1) {
                    prop_assert!(!windows_overlap(a.start_minute, b.start_minute, duration, break_minutes));
                }
            }
        }
    }
}
