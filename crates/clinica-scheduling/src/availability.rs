//! Free-slot computation for a doctor and appointment type.
//!
//! Candidate slot starts are generated lazily at the configured granularity,
//! anchored at the business-day opening, and filtered against the doctor's
//! scheduled appointments under half-open overlap semantics. The booked
//! intervals are snapshotted once when the iterator is built; iteration does
//! no further storage I/O.

use std::sync::Arc;

use clinica_config::ClinicSettings;
use clinica_core::{AppointmentTypeId, DoctorId, EntityKind, TimeSlot};
use clinica_storage::ClinicStore;
use time::{Duration, OffsetDateTime, Time};
use tracing::debug;

use crate::error::BookingError;

/// Computes free slots from the committed appointment state.
#[derive(Clone)]
pub struct AvailabilityCalculator {
    store: Arc<dyn ClinicStore>,
    settings: Arc<ClinicSettings>,
}

impl AvailabilityCalculator {
    pub fn new(store: Arc<dyn ClinicStore>, settings: Arc<ClinicSettings>) -> Self {
        Self { store, settings }
    }

    /// Free slots for `doctor_id` performing `type_id` inside `range`.
    ///
    /// `granularity_minutes` overrides the configured slot granularity when
    /// given. The doctor must be active and capable of the appointment type.
    ///
    /// Returns a lazy iterator ordered by start ascending; clone it to
    /// restart from the beginning.
    pub async fn free_slots(
        &self,
        doctor_id: DoctorId,
        type_id: AppointmentTypeId,
        range: TimeSlot,
        granularity_minutes: Option<u32>,
    ) -> Result<FreeSlotIter, BookingError> {
        let doctor = self
            .store
            .get_doctor(doctor_id)
            .await?
            .ok_or_else(|| {
                BookingError::invalid_reference(EntityKind::Doctor.to_string(), doctor_id)
            })?;
        if !doctor.active {
            return Err(BookingError::DoctorInactive(doctor_id));
        }

        let kind = self
            .store
            .get_appointment_type(type_id)
            .await?
            .ok_or_else(|| {
                BookingError::invalid_reference(EntityKind::AppointmentType.to_string(), type_id)
            })?;
        if !self.store.has_capability(doctor_id, type_id).await? {
            return Err(BookingError::CapabilityMismatch { doctor_id, type_id });
        }

        let granularity = granularity_minutes
            .unwrap_or(self.settings.scheduling.slot_granularity_minutes)
            .max(1);
        let buffer = self.settings.scheduling.appointment_buffer_minutes;
        let (day_start, day_end) = self
            .settings
            .business_hours
            .resolve()
            .map_err(|e| BookingError::Configuration(e.to_string()))?;

        // Buffered appointments just outside the range can still collide
        // with candidates inside it, so the snapshot query is widened.
        let query_range = range.padded(buffer);
        let busy: Vec<TimeSlot> = self
            .store
            .scheduled_for_doctor(doctor_id, query_range)
            .await?
            .iter()
            .map(|a| a.slot().padded(buffer))
            .collect();

        debug!(
            doctor_id = %doctor_id,
            type_id = %type_id,
            busy = busy.len(),
            granularity,
            "availability snapshot taken"
        );

        Ok(FreeSlotIter::new(
            range,
            day_start,
            day_end,
            granularity,
            kind.duration_minutes,
            busy,
        ))
    }
}

/// Lazy, finite, restartable sequence of free slots, ordered by start.
///
/// Cloning is cheap (the busy snapshot is shared) and yields an iterator
/// positioned back at the start of the range.
#[derive(Debug, Clone)]
pub struct FreeSlotIter {
    range: TimeSlot,
    day_start: Time,
    day_end: Time,
    step: Duration,
    duration: Duration,
    busy: Arc<[TimeSlot]>,
    cursor: OffsetDateTime,
}

impl FreeSlotIter {
    fn new(
        range: TimeSlot,
        day_start: Time,
        day_end: Time,
        granularity_minutes: u32,
        duration_minutes: u32,
        busy: Vec<TimeSlot>,
    ) -> Self {
        Self {
            range,
            day_start,
            day_end,
            step: Duration::minutes(i64::from(granularity_minutes.max(1))),
            duration: Duration::minutes(i64::from(duration_minutes.max(1))),
            busy: busy.into(),
            cursor: range.start,
        }
    }

    /// Rewinds the iterator to the start of the range.
    pub fn reset(&mut self) {
        self.cursor = self.range.start;
    }

    /// The overall range this iterator covers.
    pub fn range(&self) -> TimeSlot {
        self.range
    }
}

impl Iterator for FreeSlotIter {
    type Item = TimeSlot;

    fn next(&mut self) -> Option<TimeSlot> {
        loop {
            let cursor = self.cursor;
            if cursor >= self.range.end {
                return None;
            }

            let date = cursor.date();
            let day_open = date.with_time(self.day_start).assume_utc();
            let day_close = date.with_time(self.day_end).assume_utc();

            // Before opening: snap forward to the day's first boundary.
            if cursor < day_open {
                self.cursor = day_open;
                continue;
            }

            // Candidate starts are anchored at the day opening; align a
            // mid-step cursor up to the next boundary.
            let step_ns = self.step.whole_nanoseconds();
            let offset_ns = (cursor - day_open).whole_nanoseconds();
            let rem = offset_ns % step_ns;
            if rem != 0 {
                self.cursor = cursor + Duration::nanoseconds((step_ns - rem) as i64);
                continue;
            }

            // Past closing (or would run past it): move to the next day.
            let end = cursor + self.duration;
            if cursor >= day_close || end > day_close {
                let next_day = match date.next_day() {
                    Some(d) => d,
                    None => return None,
                };
                self.cursor = next_day.with_time(self.day_start).assume_utc();
                continue;
            }

            // Candidates are scoped to the requested range; the cursor only
            // moves forward, so the first overrun ends the sequence.
            if end > self.range.end {
                return None;
            }

            let candidate = TimeSlot { start: cursor, end };
            self.cursor = cursor + self.step;

            if self.busy.iter().any(|b| b.overlaps(&candidate)) {
                continue;
            }
            return Some(candidate);
        }
    }
}
