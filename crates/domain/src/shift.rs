//! Shift assignments: rostered working windows and their lifecycle.
//!
//! A shift is anchored to the date it starts on. When `end` is earlier than
//! `start` the shift crosses midnight and ends on the following day; the same
//! rule drives duration, overlap and roster coverage.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::error::ConstraintError;
use crate::id::{ShiftId, StaffId};

/// Lifecycle state of a [`ShiftAssignment`].
///
/// `Scheduled` moves once, to either `Completed` or `Cancelled`; both are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl ShiftStatus {
    /// Whether the shift still counts toward daily hours and overlap checks.
    #[must_use]
    pub fn is_active(self) -> bool {
        !matches!(self, Self::Cancelled)
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl fmt::Display for ShiftStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scheduled => f.write_str("scheduled"),
            Self::Completed => f.write_str("completed"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// A non-empty wall-clock interval starting on `date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShiftWindow {
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
}

impl ShiftWindow {
    /// # Errors
    ///
    /// Returns [`ConstraintError::ZeroLengthShift`] when `start == end`.
    pub fn new(date: NaiveDate, start: NaiveTime, end: NaiveTime) -> Result<Self, ConstraintError> {
        if start == end {
            return Err(ConstraintError::ZeroLengthShift);
        }
        Ok(Self { date, start, end })
    }

    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    #[must_use]
    pub fn start(&self) -> NaiveTime {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> NaiveTime {
        self.end
    }

    #[must_use]
    pub fn crosses_midnight(&self) -> bool {
        self.end < self.start
    }

    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        let raw = self.end - self.start;
        if self.crosses_midnight() {
            raw + TimeDelta::days(1)
        } else {
            raw
        }
    }

    #[must_use]
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.start)
    }

    #[must_use]
    pub fn ends_at(&self) -> NaiveDateTime {
        self.starts_at() + self.duration()
    }

    /// Half-open interval intersection; back-to-back shifts do not overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.starts_at() < other.ends_at() && other.starts_at() < self.ends_at()
    }

    /// Whether `moment` falls in `[starts_at, ends_at)`.
    #[must_use]
    pub fn covers(&self, moment: NaiveDateTime) -> bool {
        self.starts_at() <= moment && moment < self.ends_at()
    }
}

/// A staff member's assignment to a ward for one shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftAssignment {
    pub id: ShiftId,
    pub staff_id: StaffId,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub ward: String,
    pub status: ShiftStatus,
}

impl ShiftAssignment {
    /// The assignment's interval.
    ///
    /// # Errors
    ///
    /// Returns [`ConstraintError::ZeroLengthShift`] for a stored record whose
    /// start and end coincide.
    pub fn window(&self) -> Result<ShiftWindow, ConstraintError> {
        ShiftWindow::new(self.date, self.start, self.end)
    }

    /// Move the assignment to `to`, enforcing the lifecycle.
    ///
    /// # Errors
    ///
    /// Returns [`ConstraintError::InvalidShiftTransition`] unless the shift is
    /// `Scheduled` and `to` is terminal.
    pub fn transition_to(&mut self, to: ShiftStatus) -> Result<(), ConstraintError> {
        if self.status != ShiftStatus::Scheduled || !to.is_terminal() {
            return Err(ConstraintError::InvalidShiftTransition {
                shift_id: self.id,
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }
}

/// A validated, not yet persisted shift assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftDraft {
    pub id: ShiftId,
    pub staff_id: StaffId,
    pub window: ShiftWindow,
    pub ward: String,
}

impl ShiftDraft {
    #[must_use]
    pub fn new(staff_id: StaffId, window: ShiftWindow, ward: impl Into<String>) -> Self {
        Self {
            id: ShiftId::new(),
            staff_id,
            window,
            ward: ward.into(),
        }
    }

    /// Turn the draft into a `Scheduled` assignment.
    #[must_use]
    pub fn into_assignment(self) -> ShiftAssignment {
        ShiftAssignment {
            id: self.id,
            staff_id: self.staff_id,
            date: self.window.date(),
            start: self.window.start(),
            end: self.window.end(),
            ward: self.ward,
            status: ShiftStatus::Scheduled,
        }
    }
}
