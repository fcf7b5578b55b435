#[cfg(test)]
mod tests {
    use crate::availability::{
        compute_open_slots, find_conflict, fits_block, overlaps, AvailabilityChecker,
        AvailabilityError, SlotAvailability, SlotRequest,
    };
    use crate::hours::MinuteRange;
    use crate::test_support::{
        as_appointments, at, fixed_now, hours, memory_stores, monday, saturday,
    };
    use bodywork_common::models::{AppointmentStatus, NewAppointment};
    use bodywork_db::{AppointmentRepository, BookedInterval};
    use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};

    const DAY: MinuteRange = MinuteRange { from: 540, to: 1020 };

    fn booked(id: i64, start: u32, end: u32) -> BookedInterval {
        BookedInterval {
            id,
            start_minute: start,
            end_minute: end,
        }
    }

    fn new_appointment(date: NaiveDate, start: NaiveTime, duration: u32) -> NewAppointment {
        NewAppointment {
            client_name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            phone: "+41 79 123 45 67".to_string(),
            appointment_date: date,
            start_time: start,
            duration_minutes: duration,
            focus_areas: vec![],
            pressure_preference: None,
            special_requests: None,
            status: AppointmentStatus::Confirmed,
            created_at: Utc::now(),
        }
    }

    async fn checker_with(existing: &[(NaiveTime, u32)]) -> AvailabilityChecker {
        let stores = memory_stores().await;
        for (start, duration) in existing {
            stores
                .appointments
                .create(new_appointment(monday(), *start, *duration))
                .await
                .unwrap();
        }
        AvailabilityChecker::new(hours(), as_appointments(&stores)).with_clock(fixed_now)
    }

    #[test]
    fn overlap_includes_break_on_both_sides() {
        // existing 09:00-10:00, window with break until 10:15
        let existing = booked(1, 540, 600);
        assert!(overlaps(570, 60, 15, &existing)); // 09:30
        assert!(overlaps(600, 60, 15, &existing)); // 10:00, inside the break
        assert!(!overlaps(615, 60, 15, &existing)); // 10:15
        // 07:45 + 60 + 15 ends exactly at 09:00
        assert!(!overlaps(465, 60, 15, &existing));
        assert!(overlaps(470, 60, 15, &existing));
    }

    #[test]
    fn find_conflict_returns_first_collision() {
        let booked = vec![booked(1, 540, 600), booked(2, 700, 760)];
        assert_eq!(find_conflict(690, 60, 15, &booked).map(|b| b.id), Some(2));
        assert!(find_conflict(615, 60, 15, &booked).is_none());
    }

    #[test]
    fn block_must_hold_session_and_break() {
        // 16:30 + 60 + 15 = 17:45 > 17:00
        assert!(!fits_block(&[DAY], 990, 60, 15));
        // 15:45 + 60 + 15 = 17:00
        assert!(fits_block(&[DAY], 945, 60, 15));
        assert!(!fits_block(&[DAY], 530, 60, 15));
    }

    #[test]
    fn open_slots_skip_booked_windows() {
        let booked = vec![booked(1, 540, 600)];
        let slots = compute_open_slots(&[DAY], &booked, 60, 15, 15, 0);
        assert_eq!(slots.first(), Some(&615));
        assert_eq!(slots.last(), Some(&945));
        assert!(slots.iter().all(|s| s % 15 == 0));
        assert!(!slots.contains(&600));
    }

    #[test]
    fn open_slots_respect_earliest_start() {
        let slots = compute_open_slots(&[DAY], &[], 60, 15, 15, 601);
        assert_eq!(slots.first(), Some(&615));
        let none = compute_open_slots(&[DAY], &[], 60, 15, 15, 1020);
        assert!(none.is_empty());
    }

    #[test]
    fn open_slots_merge_overlapping_blocks() {
        let blocks = [MinuteRange { from: 540, to: 720 }, MinuteRange { from: 600, to: 780 }];
        let slots = compute_open_slots(&blocks, &[], 60, 0, 30, 0);
        let mut sorted = slots.clone();
        sorted.dedup();
        assert_eq!(slots, sorted);
        assert_eq!(slots, vec![540, 570, 600, 630, 660, 690, 720]);
    }

    #[tokio::test]
    async fn scenario_monday_bookings() {
        let checker = checker_with(&[(at(9, 0), 60)]).await;

        let overlapping = SlotRequest {
            date: monday(),
            start: at(9, 30),
            duration_minutes: 60,
        };
        assert!(matches!(
            checker.check(&overlapping).await,
            Err(AvailabilityError::SlotConflict { .. })
        ));

        let after_break = SlotRequest {
            date: monday(),
            start: at(10, 15),
            duration_minutes: 60,
        };
        let window = checker.check(&after_break).await.unwrap();
        assert_eq!(window.end_time, at(11, 15));
        assert_eq!(window.break_time, 15);
    }

    #[tokio::test]
    async fn saturday_is_outside_business_hours() {
        let checker = checker_with(&[]).await;
        let slot = SlotRequest {
            date: saturday(),
            start: at(10, 0),
            duration_minutes: 60,
        };
        match checker.check(&slot).await {
            Err(AvailabilityError::OutsideBusinessHours(msg)) => {
                assert!(msg.contains("Saturdays"))
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn block_end_boundary_is_rejected() {
        let checker = checker_with(&[]).await;
        let slot = SlotRequest {
            date: monday(),
            start: at(16, 30),
            duration_minutes: 60,
        };
        assert!(matches!(
            checker.check(&slot).await,
            Err(AvailabilityError::OutsideBusinessHours(_))
        ));
    }

    #[tokio::test]
    async fn hours_are_checked_before_conflicts() {
        let checker = checker_with(&[(at(15, 0), 60)]).await;
        let slot = SlotRequest {
            date: monday(),
            start: at(16, 30),
            duration_minutes: 60,
        };
        assert!(matches!(
            checker.check(&slot).await,
            Err(AvailabilityError::OutsideBusinessHours(_))
        ));
    }

    #[tokio::test]
    async fn unoffered_duration_is_rejected() {
        let checker = checker_with(&[]).await;
        let slot = SlotRequest {
            date: monday(),
            start: at(9, 0),
            duration_minutes: 45,
        };
        assert!(matches!(
            checker.check(&slot).await,
            Err(AvailabilityError::InvalidDuration(45))
        ));
    }

    fn monday_morning() -> DateTime<Utc> {
        // 10:00 in Zurich (UTC+1 in January)
        Utc.with_ymd_and_hms(2030, 1, 7, 9, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn minimum_notice_applies() {
        let stores = memory_stores().await;
        let checker =
            AvailabilityChecker::new(hours(), as_appointments(&stores)).with_clock(monday_morning);

        // one hour notice: earliest start is 11:00 local
        let too_soon = SlotRequest {
            date: monday(),
            start: at(10, 45),
            duration_minutes: 60,
        };
        assert!(matches!(
            checker.check(&too_soon).await,
            Err(AvailabilityError::TooSoon { .. })
        ));

        let fine = SlotRequest {
            date: monday(),
            start: at(11, 0),
            duration_minutes: 60,
        };
        assert!(checker.check(&fine).await.is_ok());

        let slots = checker.open_slots(monday(), 60).await.unwrap();
        assert_eq!(slots.first(), Some(&at(11, 0)));

        let past = NaiveDate::from_ymd_opt(2030, 1, 4).unwrap();
        assert!(checker.open_slots(past, 60).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn check_is_idempotent_without_writes() {
        let checker = checker_with(&[(at(9, 0), 60)]).await;
        let slot = SlotRequest {
            date: monday(),
            start: at(11, 0),
            duration_minutes: 90,
        };
        let first = checker.check(&slot).await.unwrap();
        let second = checker.check(&slot).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn open_slots_reflect_bookings_and_closed_days() {
        let checker = checker_with(&[(at(9, 0), 60)]).await;
        let slots = checker.open_slots(monday(), 60).await.unwrap();
        assert_eq!(slots.first(), Some(&at(10, 15)));
        assert_eq!(slots.last(), Some(&at(15, 45)));

        for start in &slots {
            let slot = SlotRequest {
                date: monday(),
                start: *start,
                duration_minutes: 60,
            };
            assert!(checker.check(&slot).await.is_ok(), "{start} should be bookable");
        }

        assert!(checker.open_slots(saturday(), 60).await.unwrap().is_empty());
    }
}
