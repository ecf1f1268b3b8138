//! Authorization guard: role capabilities plus roster gating for clinical
//! actions.

use std::future::Future;
use std::sync::Arc;

use carehub_domain::action::{ActionContext, ActionType};
use carehub_domain::error::{AuthorizationError, CareHubError, RosterError};
use carehub_domain::id::StaffId;
use carehub_domain::staff::Staff;
use carehub_domain::time::Timestamp;

use crate::ports::ResourceRepository;
use crate::shift_compliance::ShiftComplianceEngine;

/// Answers whether a staff member is on shift at a given moment.
pub trait RosterLookup {
    fn is_rostered(
        &self,
        staff_id: StaffId,
        at: Timestamp,
    ) -> impl Future<Output = Result<bool, CareHubError>> + Send;
}

impl<R: ResourceRepository + Send + Sync> RosterLookup for ShiftComplianceEngine<R> {
    fn is_rostered(
        &self,
        staff_id: StaffId,
        at: Timestamp,
    ) -> impl Future<Output = Result<bool, CareHubError>> + Send {
        ShiftComplianceEngine::is_rostered(self, staff_id, at)
    }
}

impl<T: RosterLookup + Send + Sync> RosterLookup for Arc<T> {
    fn is_rostered(
        &self,
        staff_id: StaffId,
        at: Timestamp,
    ) -> impl Future<Output = Result<bool, CareHubError>> + Send {
        (**self).is_rostered(staff_id, at)
    }
}

/// Decides whether a staff member may perform an action. Performs no writes.
pub struct AuthorizationGuard<L> {
    roster: L,
}

impl<L: RosterLookup + Sync> AuthorizationGuard<L> {
    pub fn new(roster: L) -> Self {
        Self { roster }
    }

    /// Allow `action` for `staff` in `context`, or say why not.
    ///
    /// # Errors
    ///
    /// - [`AuthorizationError::StaffInactive`] for an inactive staff member
    /// - [`AuthorizationError::MissingCapability`] when the role lacks the action
    /// - [`RosterError::NotRostered`] for a clinical action outside any shift
    /// - a storage error from the roster lookup
    #[tracing::instrument(skip(self, staff, context), fields(staff_id = %staff.id, role = %staff.role))]
    pub async fn authorize(
        &self,
        staff: &Staff,
        action: ActionType,
        context: &ActionContext,
    ) -> Result<(), CareHubError> {
        if !staff.active {
            return Err(AuthorizationError::StaffInactive(staff.id).into());
        }
        if !staff.role.can(action) {
            tracing::warn!("capability missing");
            return Err(AuthorizationError::MissingCapability {
                staff_id: staff.id,
                role: staff.role,
                action,
            }
            .into());
        }
        if action.is_clinical() && !self.roster.is_rostered(staff.id, context.at).await? {
            tracing::warn!(at = %context.at, "clinical action outside roster");
            return Err(RosterError::NotRostered {
                staff_id: staff.id,
                at: context.at,
            }
            .into());
        }
        Ok(())
    }
}
