//! Error taxonomy shared across the workspace.
//!
//! Each failure family is its own typed error and converts into
//! [`CareHubError`] via `#[from]`. Adapters wrap their own errors into
//! [`CareHubError::Storage`].

use chrono::NaiveDate;

use crate::action::ActionType;
use crate::id::{BedId, ResidentId, ShiftId, StaffId};
use crate::shift::ShiftStatus;
use crate::staff::Role;
use crate::time::Timestamp;

/// Top-level error returned by every fallible operation in the core.
#[derive(Debug, thiserror::Error)]
pub enum CareHubError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error("resource conflict: {0}")]
    ResourceConflict(#[from] ConflictError),

    #[error("constraint violation: {0}")]
    ConstraintViolation(#[from] ConstraintError),

    #[error("unauthorized: {0}")]
    Authorization(#[from] AuthorizationError),

    #[error("roster: {0}")]
    Roster(#[from] RosterError),

    #[error("storage error")]
    Storage(Box<dyn std::error::Error + Send + Sync>),
}

/// Malformed input rejected by a builder or `validate` call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,
    #[error("ward must not be empty")]
    EmptyWard,
}

/// An id that does not resolve to a stored record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} not found: {id}")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// Contention on a resource someone else holds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConflictError {
    #[error("bed {bed_id} occupied by resident {occupant}")]
    BedOccupied { bed_id: BedId, occupant: ResidentId },

    #[error("staff {staff_id} already holds overlapping shift {existing}")]
    ShiftOverlap { staff_id: StaffId, existing: ShiftId },

    #[error("resident {0} changed beds concurrently; reload and retry")]
    ResidentMoved(ResidentId),

    #[error("shift {0} was already committed")]
    ShiftAlreadyCommitted(ShiftId),
}

/// A domain rule the requested change would break.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConstraintError {
    #[error("bed {bed_id} is gender-restricted against resident {resident_id}")]
    GenderMismatch {
        bed_id: BedId,
        resident_id: ResidentId,
    },

    #[error("resident {resident_id} requires isolation but bed {bed_id} is not isolation-capable")]
    IsolationRequired {
        bed_id: BedId,
        resident_id: ResidentId,
    },

    #[error("resident {resident_id} already has bed {bed_id}; release first")]
    ResidentAlreadyPlaced {
        resident_id: ResidentId,
        bed_id: BedId,
    },

    #[error("resident {0} has no bed")]
    ResidentNotPlaced(ResidentId),

    #[error("resident {0} is not active")]
    ResidentInactive(ResidentId),

    #[error("resident {0} already exists")]
    ResidentAlreadyExists(ResidentId),

    #[error("bed {0} is already vacant")]
    BedVacant(BedId),

    #[error("no suitable bed for resident {0}")]
    NoSuitableBed(ResidentId),

    #[error("shift start and end must differ")]
    ZeroLengthShift,

    #[error("overlap with shift {existing} of staff {staff_id}")]
    ShiftOverlap { staff_id: StaffId, existing: ShiftId },

    #[error(
        "daily cap exceeded for staff {staff_id} on {date}: {scheduled_minutes} min scheduled + {proposed_minutes} min proposed > {cap_minutes} min"
    )]
    DailyCapExceeded {
        staff_id: StaffId,
        date: NaiveDate,
        scheduled_minutes: i64,
        proposed_minutes: i64,
        cap_minutes: i64,
    },

    #[error("staff {0} is not active")]
    StaffInactive(StaffId),

    #[error("shift {shift_id} cannot move from {from} to {to}")]
    InvalidShiftTransition {
        shift_id: ShiftId,
        from: ShiftStatus,
        to: ShiftStatus,
    },
}

/// The acting staff member may not perform the requested action.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthorizationError {
    #[error("staff {staff_id} with role {role} lacks capability {action}")]
    MissingCapability {
        staff_id: StaffId,
        role: Role,
        action: ActionType,
    },

    #[error("staff {0} is not active")]
    StaffInactive(StaffId),
}

/// A clinical action attempted outside any rostered window.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RosterError {
    #[error("staff {staff_id} is not rostered at {at}")]
    NotRostered { staff_id: StaffId, at: Timestamp },
}
