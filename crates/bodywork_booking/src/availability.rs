// --- File: crates/bodywork_booking/src/availability.rs ---
use crate::hours::{weekday_number, BusinessHours, MinuteRange};
use async_trait::async_trait;
use bodywork_common::models::{minute_of_day, time_from_minute};
use bodywork_db::{AppointmentRepository, BookedInterval, DbError};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

// --- Error Handling ---
#[derive(Error, Debug)]
pub enum AvailabilityError {
    #[error("{0}")]
    OutsideBusinessHours(String),
    #[error("Slot overlaps appointment {conflicting_id}")]
    SlotConflict { conflicting_id: i64 },
    #[error("Bookings must start at or after {earliest}")]
    TooSoon { earliest: NaiveDateTime },
    #[error("{0} minutes is not an offered duration")]
    InvalidDuration(u32),
    #[error("Schedule store error: {0}")]
    Store(#[from] DbError),
}

// --- Data Structures ---

/// A requested appointment window, before anything is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotRequest {
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub duration_minutes: u32,
}

/// A window that passed the availability check.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SlotWindow {
    #[serde(skip)]
    pub date: NaiveDate,
    #[serde(with = "bodywork_common::models::hhmm")]
    #[cfg_attr(feature = "openapi", schema(value_type = String, example = "09:00"))]
    pub start_time: NaiveTime,
    #[serde(with = "bodywork_common::models::hhmm")]
    #[cfg_attr(feature = "openapi", schema(value_type = String, example = "10:00"))]
    pub end_time: NaiveTime,
    pub duration: u32,
    pub break_time: u32,
}

// --- Slot arithmetic ---

/// True when `[start, start + duration + break)` overlaps `[b.start, b.end + break)`.
pub fn overlaps(start: u32, duration: u32, break_minutes: u32, booked: &BookedInterval) -> bool {
    start < booked.end_minute + break_minutes && booked.start_minute < start + duration + break_minutes
}

/// The first booked interval that collides with the requested window.
pub fn find_conflict(
    start: u32,
    duration: u32,
    break_minutes: u32,
    booked: &[BookedInterval],
) -> Option<&BookedInterval> {
    booked
        .iter()
        .find(|b| overlaps(start, duration, break_minutes, b))
}

/// True when the session plus its trailing break fits inside one block.
pub fn fits_block(blocks: &[MinuteRange], start: u32, duration: u32, break_minutes: u32) -> bool {
    blocks
        .iter()
        .any(|b| start >= b.from && start + duration + break_minutes <= b.to)
}

/// Start minutes of every free slot.
///
/// Candidates step through each block from its opening time; a candidate is kept when
/// it starts at or after `earliest_start`, fits the block including the break and
/// collides with nothing in `booked`. The result is sorted and free of duplicates.
pub fn compute_open_slots(
    blocks: &[MinuteRange],
    booked: &[BookedInterval],
    duration: u32,
    break_minutes: u32,
    step: u32,
    earliest_start: u32,
) -> Vec<u32> {
    let step = step.max(1);
    let mut slots = Vec::new();

    for block in blocks {
        let mut candidate = block.from;
        if candidate < earliest_start {
            let behind = earliest_start - block.from;
            candidate = block.from + behind.div_ceil(step) * step;
        }
        while candidate + duration + break_minutes <= block.to {
            if find_conflict(candidate, duration, break_minutes, booked).is_none() {
                slots.push(candidate);
            }
            candidate += step;
        }
    }

    slots.sort_unstable();
    slots.dedup();
    slots
}

fn weekday_name(date: NaiveDate) -> &'static str {
    match weekday_number(date) {
        0 => "Sundays",
        1 => "Mondays",
        2 => "Tuesdays",
        3 => "Wednesdays",
        4 => "Thursdays",
        5 => "Fridays",
        _ => "Saturdays",
    }
}

// --- Checker ---

/// Decides whether a slot can be booked and which slots are still open.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SlotAvailability: Send + Sync {
    /// Business hours first, then minimum notice, then conflicts.
    async fn check(&self, slot: &SlotRequest) -> Result<SlotWindow, AvailabilityError>;

    /// Open start times on `date` for a session of `duration_minutes`.
    async fn open_slots(
        &self,
        date: NaiveDate,
        duration_minutes: u32,
    ) -> Result<Vec<NaiveTime>, AvailabilityError>;
}

pub type Clock = fn() -> DateTime<Utc>;

/// [`SlotAvailability`] backed by the schedule store.
pub struct AvailabilityChecker {
    hours: Arc<BusinessHours>,
    store: Arc<dyn AppointmentRepository>,
    clock: Clock,
}

impl AvailabilityChecker {
    pub fn new(hours: Arc<BusinessHours>, store: Arc<dyn AppointmentRepository>) -> Self {
        Self {
            hours,
            store,
            clock: Utc::now,
        }
    }

    /// Replace the wall clock, mostly for tests.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Earliest bookable local date-time, now plus the minimum notice.
    pub fn earliest_start(&self) -> NaiveDateTime {
        let now = (self.clock)().with_timezone(&self.hours.time_zone).naive_local();
        now + Duration::minutes(self.hours.min_notice_minutes)
    }

    fn ensure_duration(&self, duration_minutes: u32) -> Result<(), AvailabilityError> {
        if self.hours.offers_duration(duration_minutes) {
            Ok(())
        } else {
            Err(AvailabilityError::InvalidDuration(duration_minutes))
        }
    }
}

#[async_trait]
impl SlotAvailability for AvailabilityChecker {
    async fn check(&self, slot: &SlotRequest) -> Result<SlotWindow, AvailabilityError> {
        self.ensure_duration(slot.duration_minutes)?;
        let brk = self.hours.break_minutes;

        let blocks = self.hours.blocks_for(slot.date);
        if blocks.is_empty() {
            return Err(AvailabilityError::OutsideBusinessHours(format!(
                "We are closed on {}.",
                weekday_name(slot.date)
            )));
        }
        let start = minute_of_day(slot.start);
        if !fits_block(&blocks, start, slot.duration_minutes, brk) {
            return Err(AvailabilityError::OutsideBusinessHours(
                "The requested time is outside our business hours.".to_string(),
            ));
        }

        let earliest = self.earliest_start();
        if slot.date.and_time(slot.start) < earliest {
            return Err(AvailabilityError::TooSoon { earliest });
        }

        let booked = self.store.booked_intervals(slot.date).await?;
        if let Some(conflict) = find_conflict(start, slot.duration_minutes, brk, &booked) {
            debug!(
                date = %slot.date,
                start = %slot.start,
                conflicting_id = conflict.id,
                "Requested slot overlaps an existing appointment"
            );
            return Err(AvailabilityError::SlotConflict {
                conflicting_id: conflict.id,
            });
        }

        Ok(SlotWindow {
            date: slot.date,
            start_time: slot.start,
            end_time: slot.start + Duration::minutes(i64::from(slot.duration_minutes)),
            duration: slot.duration_minutes,
            break_time: brk,
        })
    }

    async fn open_slots(
        &self,
        date: NaiveDate,
        duration_minutes: u32,
    ) -> Result<Vec<NaiveTime>, AvailabilityError> {
        self.ensure_duration(duration_minutes)?;

        let blocks = self.hours.blocks_for(date);
        if blocks.is_empty() {
            return Ok(Vec::new());
        }

        let earliest = self.earliest_start();
        let earliest_minute = if date < earliest.date() {
            return Ok(Vec::new());
        } else if date == earliest.date() {
            let time = earliest.time();
            let partial = time.second() > 0 || time.nanosecond() > 0;
            minute_of_day(time) + u32::from(partial)
        } else {
            0
        };

        let booked = self.store.booked_intervals(date).await?;
        let slots = compute_open_slots(
            &blocks,
            &booked,
            duration_minutes,
            self.hours.break_minutes,
            self.hours.slot_step_minutes,
            earliest_minute,
        );

        Ok(slots.into_iter().filter_map(time_from_minute).collect())
    }
}
