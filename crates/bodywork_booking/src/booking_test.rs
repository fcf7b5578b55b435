#[cfg(test)]
mod tests {
    use crate::availability::{
        AvailabilityChecker, AvailabilityError, MockSlotAvailability, SlotAvailability,
        SlotWindow,
    };
    use crate::booking::{BookingService, RetryPolicy, SideEffectStatus};
    use crate::error::BookingError;
    use crate::test_support::{
        as_appointments, as_audit, at, fixed_now, hours, memory_stores, monday, saturday,
        RecordingCalendar, RecordingNotifier, Stores,
    };
    use crate::validation::{BookingInput, Minutes};
    use bodywork_common::models::{AppointmentStatus, SYSTEM_ACTOR};
    use bodywork_common::services::{BoxedError, CalendarService, NotificationService};
    use bodywork_db::{AppointmentRepository, AuditLogRepository};
    use chrono::NaiveTime;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::time::Duration;

    fn form(start: &str, duration: u32) -> BookingInput {
        BookingInput {
            full_name: Some("Jane Doe".to_string()),
            email: Some("jane@example.com".to_string()),
            phone: Some("+41 79 123 45 67".to_string()),
            appointment_date: Some("2030-01-07".to_string()),
            start_time: Some(start.to_string()),
            duration: Some(Minutes::Number(f64::from(duration))),
            focus_areas: None,
            pressure_preference: Some("medium".to_string()),
            special_requests: None,
        }
    }

    fn quick_retries() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 2,
            delay: Duration::from_millis(1),
        }
    }

    fn service(stores: &Stores) -> BookingService {
        let checker: Arc<dyn SlotAvailability> = Arc::new(
            AvailabilityChecker::new(hours(), as_appointments(stores)).with_clock(fixed_now),
        );
        BookingService::new(hours(), checker, as_appointments(stores), as_audit(stores))
    }

    #[tokio::test]
    async fn scenario_monday_nine_then_overlap_then_after_break() {
        let stores = memory_stores().await;
        let service = service(&stores);

        let first = service.submit_booking(&form("09:00", 60)).await.unwrap();
        assert_eq!(first.appointment.status, AppointmentStatus::Confirmed);
        assert_eq!(first.appointment.end_time, at(10, 0));

        let clash = service.submit_booking(&form("09:30", 60)).await;
        assert!(matches!(
            clash,
            Err(BookingError::Availability(AvailabilityError::SlotConflict { .. }))
        ));

        let later = service.submit_booking(&form("10:15", 60)).await.unwrap();
        assert_ne!(later.appointment.id, first.appointment.id);
    }

    #[tokio::test]
    async fn stored_appointment_matches_input() {
        let stores = memory_stores().await;
        let service = service(&stores);

        let mut input = form("13:00", 90);
        input.full_name = Some("  Jane <b>Doe</b> ".to_string());
        input.email = Some("JANE@example.com".to_string());
        let outcome = service.submit_booking(&input).await.unwrap();

        let stored = stores
            .appointments
            .get(outcome.appointment.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.client_name, "Jane Doe");
        assert_eq!(stored.email, "jane@example.com");
        assert_eq!(stored.appointment_date, monday());
        assert_eq!(stored.start_time, at(13, 0));
        assert_eq!(stored.end_time, at(14, 30));
        assert_eq!(stored.duration_minutes, 90);
        assert_eq!(stored, outcome.appointment);
    }

    #[tokio::test]
    async fn validation_failure_touches_nothing() {
        let stores = memory_stores().await;
        let mut checker = MockSlotAvailability::new();
        checker.expect_check().never();
        let service = BookingService::new(
            hours(),
            Arc::new(checker),
            as_appointments(&stores),
            as_audit(&stores),
        );

        let mut input = form("09:00", 60);
        input.email = Some("not-an-email".to_string());
        match service.submit_booking(&input).await {
            Err(BookingError::Validation(fields)) => {
                assert_eq!(fields.len(), 1);
                assert_eq!(fields[0].field, "email");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(
            stores
                .appointments
                .count_by_status(AppointmentStatus::Confirmed)
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn saturday_submission_is_outside_business_hours() {
        let stores = memory_stores().await;
        let service = service(&stores);
        let mut input = form("10:00", 60);
        input.appointment_date = Some(saturday().to_string());
        assert!(matches!(
            service.submit_booking(&input).await,
            Err(BookingError::Availability(
                AvailabilityError::OutsideBusinessHours(_)
            ))
        ));
    }

    #[tokio::test]
    async fn commit_time_conflict_is_distinguished() {
        let stores = memory_stores().await;
        // Someone else already holds 09:00, but the pre-check saw a free slot
        service(&stores)
            .submit_booking(&form("09:00", 60))
            .await
            .unwrap();

        let mut checker = MockSlotAvailability::new();
        checker.expect_check().times(1).returning(|slot| {
            Ok(SlotWindow {
                date: slot.date,
                start_time: slot.start,
                end_time: NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
                duration: slot.duration_minutes,
                break_time: 15,
            })
        });
        let racing = BookingService::new(
            hours(),
            Arc::new(checker),
            as_appointments(&stores),
            as_audit(&stores),
        );

        assert!(matches!(
            racing.submit_booking(&form("09:30", 60)).await,
            Err(BookingError::ConflictAtCommit)
        ));
    }

    #[tokio::test]
    async fn creation_is_audited_without_pii() {
        let stores = memory_stores().await;
        let outcome = service(&stores)
            .submit_booking(&form("09:00", 60))
            .await
            .unwrap();

        let entries = stores
            .audit
            .list(Some("appointment"), Some(&outcome.appointment.id.to_string()), 10)
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, "appointment_created");
        assert_eq!(entries[0].actor, SYSTEM_ACTOR);
        let details = entries[0].details.to_string();
        assert!(details.contains("09:00"));
        assert!(!details.contains("jane@example.com"));
        assert!(!details.contains("Jane Doe"));
    }

    #[tokio::test]
    async fn side_effects_are_skipped_without_collaborators() {
        let stores = memory_stores().await;
        let outcome = service(&stores)
            .submit_booking(&form("09:00", 60))
            .await
            .unwrap();
        assert_eq!(outcome.side_effects.calendar_sync, SideEffectStatus::Skipped);
        assert_eq!(outcome.side_effects.client_confirmation, SideEffectStatus::Skipped);
        assert_eq!(
            outcome.side_effects.practitioner_notification,
            SideEffectStatus::Skipped
        );
    }

    #[tokio::test]
    async fn notifications_are_retried_then_reported() {
        let stores = memory_stores().await;

        let flaky = Arc::new(RecordingNotifier::failing(1));
        let notifier: Arc<dyn NotificationService<Error = BoxedError>> = flaky.clone();
        let service = service(&stores).with_notifications(Some(notifier), quick_retries());
        let outcome = service.submit_booking(&form("09:00", 60)).await.unwrap();
        assert_eq!(outcome.side_effects.client_confirmation, SideEffectStatus::Sent);
        assert_eq!(outcome.side_effects.practitioner_notification, SideEffectStatus::Sent);
        assert_eq!(flaky.client_calls.load(Ordering::SeqCst), 2);

        let down = Arc::new(RecordingNotifier::failing(u32::MAX));
        let notifier: Arc<dyn NotificationService<Error = BoxedError>> = down.clone();
        let service = self::service(&stores).with_notifications(Some(notifier), quick_retries());
        let outcome = service.submit_booking(&form("11:00", 60)).await.unwrap();
        assert_eq!(outcome.side_effects.client_confirmation, SideEffectStatus::Failed);
        assert_eq!(
            outcome.side_effects.practitioner_notification,
            SideEffectStatus::Failed
        );
        assert_eq!(down.client_calls.load(Ordering::SeqCst), 2);
        // the booking itself stands
        assert!(stores
            .appointments
            .get(outcome.appointment.id)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn calendar_reference_is_stored() {
        let stores = memory_stores().await;
        let calendar = Arc::new(RecordingCalendar::default());
        let dyn_calendar: Arc<dyn CalendarService<Error = BoxedError>> = calendar.clone();
        let service = service(&stores).with_calendar(Some(dyn_calendar));

        let outcome = service.submit_booking(&form("09:00", 60)).await.unwrap();
        let expected = format!("evt-{}", outcome.appointment.id);
        assert_eq!(outcome.side_effects.calendar_sync, SideEffectStatus::Sent);
        assert_eq!(outcome.appointment.external_calendar_id.as_deref(), Some(expected.as_str()));

        let stored = stores
            .appointments
            .get(outcome.appointment.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.external_calendar_id, Some(expected));
        assert!(calendar.deleted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn calendar_failure_keeps_booking_and_is_audited() {
        let stores = memory_stores().await;
        let calendar = Arc::new(RecordingCalendar {
            fail_create: true,
            ..RecordingCalendar::default()
        });
        let dyn_calendar: Arc<dyn CalendarService<Error = BoxedError>> = calendar.clone();
        let service = service(&stores).with_calendar(Some(dyn_calendar));

        let outcome = service.submit_booking(&form("09:00", 60)).await.unwrap();
        assert_eq!(outcome.side_effects.calendar_sync, SideEffectStatus::Failed);
        assert_eq!(outcome.appointment.external_calendar_id, None);

        let actions: Vec<String> = stores
            .audit
            .list(Some("appointment"), None, 10)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.action)
            .collect();
        assert_eq!(actions, vec!["calendar_sync_failed", "appointment_created"]);
    }

    #[tokio::test]
    async fn calendar_event_is_compensated_when_reference_cannot_be_stored() {
        let stores = memory_stores().await;
        let calendar = Arc::new(RecordingCalendar::default());
        let dyn_calendar: Arc<dyn CalendarService<Error = BoxedError>> = calendar.clone();
        let service = service(&stores).with_calendar(Some(dyn_calendar));

        // Break the table after the reservation so the reference update fails
        stores
            .client
            .execute(
                "CREATE TRIGGER block_reference BEFORE UPDATE OF external_calendar_id ON appointments \
                 BEGIN SELECT RAISE(ABORT, 'read only'); END",
            )
            .await
            .unwrap();

        let outcome = service.submit_booking(&form("09:00", 60)).await.unwrap();
        assert_eq!(outcome.side_effects.calendar_sync, SideEffectStatus::Failed);
        assert_eq!(
            calendar.created.lock().unwrap().clone(),
            calendar.deleted.lock().unwrap().clone()
        );
        assert_eq!(calendar.deleted.lock().unwrap().len(), 1);
    }
}
