//! Facility operations service: the use cases exposed to callers.
//!
//! Every mutating use case authorizes the acting staff member first, then
//! dispatches to the engine owning the records involved. Failures
//! short-circuit before any write.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};

use carehub_domain::action::{Action, ActionContext, ActionType, TargetRef};
use carehub_domain::bed::Bed;
use carehub_domain::consistency::{Violation, check_occupancy, check_roster};
use carehub_domain::error::{CareHubError, ConstraintError, NotFoundError};
use carehub_domain::id::{BedId, ResidentId, ShiftId, StaffId};
use carehub_domain::resident::Resident;
use carehub_domain::shift::{ShiftAssignment, ShiftDraft};
use carehub_domain::staff::Staff;
use carehub_domain::time::now;

use crate::authorization::AuthorizationGuard;
use crate::bed_allocation::BedAllocationEngine;
use crate::ports::ResourceRepository;
use crate::shift_compliance::{ShiftComplianceEngine, ShiftPolicy};

type SharedShifts<R> = Arc<ShiftComplianceEngine<Arc<R>>>;

/// Orchestrates authorization, the engines and the repository.
pub struct FacilityOperationsService<R> {
    repo: Arc<R>,
    beds: BedAllocationEngine<Arc<R>>,
    shifts: SharedShifts<R>,
    guard: AuthorizationGuard<SharedShifts<R>>,
}

impl<R: ResourceRepository + Send + Sync> FacilityOperationsService<R> {
    /// Create a new service backed by the given repository.
    pub fn new(repo: R, policy: ShiftPolicy) -> Self {
        Self::from_arc(Arc::new(repo), policy)
    }

    /// Create a new service from a repository already shared elsewhere.
    pub fn from_arc(repo: Arc<R>, policy: ShiftPolicy) -> Self {
        let shifts = Arc::new(ShiftComplianceEngine::new(Arc::clone(&repo), policy));
        Self {
            beds: BedAllocationEngine::new(Arc::clone(&repo)),
            guard: AuthorizationGuard::new(Arc::clone(&shifts)),
            shifts,
            repo,
        }
    }

    async fn load_staff(&self, id: StaffId) -> Result<Staff, CareHubError> {
        self.repo.get_staff(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Staff",
                id: id.to_string(),
            }
            .into()
        })
    }

    async fn authorize_actor(
        &self,
        actor: StaffId,
        action: ActionType,
        target: Option<TargetRef>,
    ) -> Result<Staff, CareHubError> {
        let staff = self.load_staff(actor).await?;
        let context = ActionContext { at: now(), target };
        self.guard.authorize(&staff, action, &context).await?;
        Ok(staff)
    }

    /// Admit a new resident into the best suitable vacant bed.
    ///
    /// `preferred_ward`, when given, replaces the resident's own preference.
    ///
    /// # Errors
    ///
    /// Returns an authorization error when `actor` may not admit,
    /// [`ConstraintError::NoSuitableBed`] when no vacant bed qualifies, or the
    /// failures of [`BedAllocationEngine::admit`]. A bed taken between the scan
    /// and the write surfaces as a conflict; nothing is retried.
    #[tracing::instrument(skip(self, resident), fields(resident_id = %resident.id))]
    pub async fn admit_resident(
        &self,
        actor: StaffId,
        mut resident: Resident,
        preferred_ward: Option<String>,
    ) -> Result<Bed, CareHubError> {
        self.authorize_actor(actor, ActionType::Admit, Some(TargetRef::Resident(resident.id)))
            .await?;
        resident.validate()?;
        if preferred_ward.is_some() {
            resident.preferred_ward = preferred_ward;
        }

        let candidates = self.beds.find_suitable_beds(&resident).await?;
        let Some(best) = candidates.first() else {
            return Err(ConstraintError::NoSuitableBed(resident.id).into());
        };
        let placement = self.beds.admit(resident, best.id).await?;
        Ok(placement.bed)
    }

    /// Discharge a resident, vacating their bed.
    ///
    /// # Errors
    ///
    /// Returns an authorization error when `actor` may not discharge, or the
    /// failures of [`BedAllocationEngine::discharge`].
    #[tracing::instrument(skip(self))]
    pub async fn discharge_resident(
        &self,
        actor: StaffId,
        resident_id: ResidentId,
    ) -> Result<(), CareHubError> {
        self.authorize_actor(
            actor,
            ActionType::Discharge,
            Some(TargetRef::Resident(resident_id)),
        )
        .await?;
        self.beds.discharge(resident_id).await?;
        Ok(())
    }

    /// Move a placed resident to another bed.
    ///
    /// # Errors
    ///
    /// Returns an authorization error when `actor` may not admit, or the
    /// failures of [`BedAllocationEngine::transfer`].
    #[tracing::instrument(skip(self))]
    pub async fn transfer_resident(
        &self,
        actor: StaffId,
        resident_id: ResidentId,
        bed_id: BedId,
    ) -> Result<Bed, CareHubError> {
        self.authorize_actor(actor, ActionType::Admit, Some(TargetRef::Bed(bed_id)))
            .await?;
        Ok(self.beds.transfer(resident_id, bed_id).await?.bed)
    }

    /// Suitable vacant beds for a stored resident, best first.
    ///
    /// # Errors
    ///
    /// Returns [`CareHubError::NotFound`] for an unknown resident, or a
    /// storage error.
    pub async fn suitable_beds(&self, resident_id: ResidentId) -> Result<Vec<Bed>, CareHubError> {
        let resident = self.repo.get_resident(resident_id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Resident",
                id: resident_id.to_string(),
            }
        })?;
        self.beds.find_suitable_beds(&resident).await
    }

    /// Vacant beds, optionally in a single ward.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn vacant_beds(&self, ward: Option<String>) -> Result<Vec<Bed>, CareHubError> {
        self.beds.find_vacant_beds(ward).await
    }

    /// Validate a shift for `staff_id` without persisting it.
    ///
    /// # Errors
    ///
    /// Returns an authorization error when `actor` may not administer shifts,
    /// or the failures of [`ShiftComplianceEngine::propose_assignment`].
    #[tracing::instrument(skip(self, ward))]
    pub async fn propose_shift(
        &self,
        actor: StaffId,
        staff_id: StaffId,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        ward: impl Into<String>,
    ) -> Result<ShiftDraft, CareHubError> {
        self.authorize_actor(actor, ActionType::ShiftAdmin, Some(TargetRef::Staff(staff_id)))
            .await?;
        self.shifts
            .propose_assignment(staff_id, date, start, end, ward)
            .await
    }

    /// Persist a previously proposed shift.
    ///
    /// # Errors
    ///
    /// Returns an authorization error when `actor` may not administer shifts,
    /// or the failures of [`ShiftComplianceEngine::commit`].
    #[tracing::instrument(skip(self, draft), fields(shift_id = %draft.id))]
    pub async fn commit_shift(
        &self,
        actor: StaffId,
        draft: ShiftDraft,
    ) -> Result<ShiftAssignment, CareHubError> {
        self.authorize_actor(actor, ActionType::ShiftAdmin, Some(TargetRef::Shift(draft.id)))
            .await?;
        self.shifts.commit(draft).await
    }

    /// Close out a scheduled shift.
    ///
    /// # Errors
    ///
    /// Returns an authorization error when `actor` may not administer shifts,
    /// or the failures of [`ShiftComplianceEngine::complete_shift`].
    pub async fn complete_shift(
        &self,
        actor: StaffId,
        shift_id: ShiftId,
    ) -> Result<ShiftAssignment, CareHubError> {
        self.authorize_actor(actor, ActionType::ShiftAdmin, Some(TargetRef::Shift(shift_id)))
            .await?;
        self.shifts.complete_shift(shift_id).await
    }

    /// Cancel a scheduled shift.
    ///
    /// # Errors
    ///
    /// Returns an authorization error when `actor` may not administer shifts,
    /// or the failures of [`ShiftComplianceEngine::cancel_shift`].
    pub async fn cancel_shift(
        &self,
        actor: StaffId,
        shift_id: ShiftId,
    ) -> Result<ShiftAssignment, CareHubError> {
        self.authorize_actor(actor, ActionType::ShiftAdmin, Some(TargetRef::Shift(shift_id)))
            .await?;
        self.shifts.cancel_shift(shift_id).await
    }

    /// Non-cancelled shifts of a staff member on one day.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn roster_for(
        &self,
        staff_id: StaffId,
        date: NaiveDate,
    ) -> Result<Vec<ShiftAssignment>, CareHubError> {
        self.shifts.roster_for(staff_id, date).await
    }

    /// Decide whether `staff` may perform `action` in `context`.
    ///
    /// # Errors
    ///
    /// See [`AuthorizationGuard::authorize`].
    pub async fn authorize_action(
        &self,
        staff: &Staff,
        action: ActionType,
        context: &ActionContext,
    ) -> Result<(), CareHubError> {
        self.guard.authorize(staff, action, context).await
    }

    /// Authorize an attempted action by its recorded staff id and timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`CareHubError::NotFound`] for an unknown staff member, and
    /// otherwise see [`AuthorizationGuard::authorize`].
    #[tracing::instrument(skip(self, action), fields(staff_id = %action.staff_id, action_type = %action.action_type))]
    pub async fn perform_action(&self, action: &Action) -> Result<(), CareHubError> {
        let staff = self.load_staff(action.staff_id).await?;
        self.guard
            .authorize(&staff, action.action_type, &action.context())
            .await
    }

    /// Scan the whole store for broken occupancy and roster invariants.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn audit_consistency(&self) -> Result<Vec<Violation>, CareHubError> {
        let beds = self.repo.find_beds(|_| true).await?;
        let residents = self.repo.find_residents(|_| true).await?;
        let shifts = self.repo.find_shifts(|_| true).await?;

        let mut violations = check_occupancy(&beds, &residents);
        violations.extend(check_roster(&shifts, self.shifts.policy().daily_cap));
        tracing::info!(
            beds = beds.len(),
            residents = residents.len(),
            shifts = shifts.len(),
            violations = violations.len(),
            "consistency audit finished"
        );
        Ok(violations)
    }
}
