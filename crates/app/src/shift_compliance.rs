//! Shift compliance engine: validates shift assignments against the daily
//! hours cap and the no-overlap rule, and answers roster-presence queries.
//!
//! Proposals are checked without locks. Commits lock the staff member's day
//! (and both neighbouring days, which overnight shifts can reach into) and
//! repeat the checks against current state before writing.

use chrono::{NaiveDate, NaiveTime, TimeDelta};

use carehub_domain::error::{CareHubError, ConflictError, ConstraintError, NotFoundError};
use carehub_domain::id::{ShiftId, StaffId};
use carehub_domain::shift::{ShiftAssignment, ShiftDraft, ShiftStatus, ShiftWindow};
use carehub_domain::time::Timestamp;

use crate::locks::{KeyGuard, KeyedLocks};
use crate::ports::{Record, ResourceRepository};

/// Limits applied to each staff member's roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftPolicy {
    /// Maximum scheduled time per staff member and calendar day.
    pub daily_cap: TimeDelta,
}

impl Default for ShiftPolicy {
    fn default() -> Self {
        Self {
            daily_cap: TimeDelta::hours(8),
        }
    }
}

impl ShiftPolicy {
    #[must_use]
    pub fn with_daily_hours(hours: u32) -> Self {
        Self {
            daily_cap: TimeDelta::hours(i64::from(hours)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Propose,
    Commit,
}

/// Sole writer of `ShiftAssignment` records.
pub struct ShiftComplianceEngine<R> {
    repo: R,
    policy: ShiftPolicy,
    day_locks: KeyedLocks<(StaffId, NaiveDate)>,
}

impl<R: ResourceRepository + Sync> ShiftComplianceEngine<R> {
    pub fn new(repo: R, policy: ShiftPolicy) -> Self {
        Self {
            repo,
            policy,
            day_locks: KeyedLocks::new(),
        }
    }

    #[must_use]
    pub fn policy(&self) -> ShiftPolicy {
        self.policy
    }

    /// Validate a shift for `staff_id` without persisting it.
    ///
    /// An `end` earlier than `start` means the shift ends the next day.
    ///
    /// # Errors
    ///
    /// - [`ConstraintError::ZeroLengthShift`] when `start == end`
    /// - [`CareHubError::NotFound`] / [`ConstraintError::StaffInactive`] for
    ///   an unknown or inactive staff member
    /// - [`ConstraintError::ShiftOverlap`] when the shift intersects an
    ///   existing one
    /// - [`ConstraintError::DailyCapExceeded`] when the day's total would pass
    ///   the cap
    #[tracing::instrument(skip(self, ward))]
    pub async fn propose_assignment(
        &self,
        staff_id: StaffId,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        ward: impl Into<String>,
    ) -> Result<ShiftDraft, CareHubError> {
        let window = ShiftWindow::new(date, start, end)?;
        self.ensure_active_staff(staff_id).await?;
        let draft = ShiftDraft::new(staff_id, window, ward);
        self.check_roster(&draft, Stage::Propose)
            .await
            .inspect_err(|err| tracing::warn!(error = %err, "shift proposal rejected"))?;
        tracing::debug!(shift_id = %draft.id, minutes = window.duration().num_minutes(), "shift proposal accepted");
        Ok(draft)
    }

    /// Persist a draft as a `Scheduled` assignment after re-checking it
    /// against the current roster.
    ///
    /// # Errors
    ///
    /// - [`ConflictError::ShiftAlreadyCommitted`] when the draft was
    ///   committed before, whatever its current status
    /// - [`ConflictError::ShiftOverlap`] when an overlapping shift was
    ///   committed since the proposal
    /// - [`ConstraintError::DailyCapExceeded`] when the cap would now be passed
    /// - the staff errors of [`propose_assignment`](Self::propose_assignment)
    #[tracing::instrument(skip(self, draft), fields(shift_id = %draft.id, staff_id = %draft.staff_id))]
    pub async fn commit(&self, draft: ShiftDraft) -> Result<ShiftAssignment, CareHubError> {
        let _guards = self.lock_days(draft.staff_id, draft.window.date()).await;
        if let Some(stored) = self.repo.get_shift(draft.id).await? {
            tracing::warn!(status = %stored.status, "shift commit rejected, already committed");
            return Err(ConflictError::ShiftAlreadyCommitted(draft.id).into());
        }
        self.ensure_active_staff(draft.staff_id).await?;
        self.check_roster(&draft, Stage::Commit)
            .await
            .inspect_err(|err| tracing::warn!(error = %err, "shift commit rejected"))?;

        let assignment = draft.into_assignment();
        self.repo
            .save_group(vec![Record::Shift(assignment.clone())])
            .await?;
        tracing::info!("shift committed");
        Ok(assignment)
    }

    /// Close out a scheduled shift.
    ///
    /// # Errors
    ///
    /// Returns [`CareHubError::NotFound`] for an unknown shift or
    /// [`ConstraintError::InvalidShiftTransition`] unless it is `Scheduled`.
    pub async fn complete_shift(&self, id: ShiftId) -> Result<ShiftAssignment, CareHubError> {
        self.transition(id, ShiftStatus::Completed).await
    }

    /// Cancel a scheduled shift; its hours stop counting toward the cap.
    ///
    /// # Errors
    ///
    /// Returns [`CareHubError::NotFound`] for an unknown shift or
    /// [`ConstraintError::InvalidShiftTransition`] unless it is `Scheduled`.
    pub async fn cancel_shift(&self, id: ShiftId) -> Result<ShiftAssignment, CareHubError> {
        self.transition(id, ShiftStatus::Cancelled).await
    }

    #[tracing::instrument(skip(self))]
    async fn transition(
        &self,
        id: ShiftId,
        to: ShiftStatus,
    ) -> Result<ShiftAssignment, CareHubError> {
        let observed = self.load_shift(id).await?;
        let _guard = self
            .day_locks
            .acquire((observed.staff_id, observed.date))
            .await;

        let mut shift = self.load_shift(id).await?;
        shift.transition_to(to)?;
        self.repo.save_group(vec![Record::Shift(shift.clone())]).await?;
        tracing::info!(status = %shift.status, "shift status changed");
        Ok(shift)
    }

    /// Whether some scheduled or completed shift of `staff_id` covers `at`.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn is_rostered(&self, staff_id: StaffId, at: Timestamp) -> Result<bool, CareHubError> {
        let moment = at.naive_utc();
        let day = moment.date();
        let previous = day.pred_opt().unwrap_or(day);
        let shifts = self
            .repo
            .find_shifts(move |s| {
                s.staff_id == staff_id
                    && s.status.is_active()
                    && (s.date == day || s.date == previous)
            })
            .await?;
        Ok(shifts
            .iter()
            .filter_map(|s| s.window().ok())
            .any(|window| window.covers(moment)))
    }

    /// Non-cancelled shifts of `staff_id` starting on `date`, earliest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn roster_for(
        &self,
        staff_id: StaffId,
        date: NaiveDate,
    ) -> Result<Vec<ShiftAssignment>, CareHubError> {
        let mut shifts = self
            .repo
            .find_shifts(move |s| s.staff_id == staff_id && s.date == date && s.status.is_active())
            .await?;
        shifts.sort_by_key(|s| (s.start, s.id));
        Ok(shifts)
    }

    async fn load_shift(&self, id: ShiftId) -> Result<ShiftAssignment, CareHubError> {
        self.repo.get_shift(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "ShiftAssignment",
                id: id.to_string(),
            }
            .into()
        })
    }

    async fn ensure_active_staff(&self, staff_id: StaffId) -> Result<(), CareHubError> {
        let staff = self.repo.get_staff(staff_id).await?.ok_or_else(|| NotFoundError {
            entity: "Staff",
            id: staff_id.to_string(),
        })?;
        if !staff.active {
            return Err(ConstraintError::StaffInactive(staff_id).into());
        }
        Ok(())
    }

    async fn lock_days(&self, staff_id: StaffId, date: NaiveDate) -> Vec<KeyGuard> {
        let days = [date.pred_opt(), Some(date), date.succ_opt()];
        self.day_locks
            .acquire_all(days.into_iter().flatten().map(|day| (staff_id, day)))
            .await
    }

    /// Overlap against shifts starting on the neighbouring days too; the cap
    /// only against shifts starting on the same day.
    async fn check_roster(&self, draft: &ShiftDraft, stage: Stage) -> Result<(), CareHubError> {
        let staff_id = draft.staff_id;
        let date = draft.window.date();
        let first = date.pred_opt().unwrap_or(date);
        let last = date.succ_opt().unwrap_or(date);
        let draft_id = draft.id;
        let existing = self
            .repo
            .find_shifts(move |s| {
                s.staff_id == staff_id
                    && s.status.is_active()
                    && s.date >= first
                    && s.date <= last
                    && s.id != draft_id
            })
            .await?;

        let mut scheduled = TimeDelta::zero();
        for shift in &existing {
            let Ok(window) = shift.window() else {
                continue;
            };
            if window.overlaps(&draft.window) {
                return Err(match stage {
                    Stage::Propose => ConstraintError::ShiftOverlap {
                        staff_id,
                        existing: shift.id,
                    }
                    .into(),
                    Stage::Commit => ConflictError::ShiftOverlap {
                        staff_id,
                        existing: shift.id,
                    }
                    .into(),
                });
            }
            if shift.date == date {
                scheduled += window.duration();
            }
        }

        let proposed = draft.window.duration();
        if scheduled + proposed > self.policy.daily_cap {
            return Err(ConstraintError::DailyCapExceeded {
                staff_id,
                date,
                scheduled_minutes: scheduled.num_minutes(),
                proposed_minutes: proposed.num_minutes(),
                cap_minutes: self.policy.daily_cap.num_minutes(),
            }
            .into());
        }
        Ok(())
    }
}
