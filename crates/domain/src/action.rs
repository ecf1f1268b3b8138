//! Actions: things a staff member attempts, evaluated but never persisted.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::{BedId, ResidentId, ShiftId, StaffId};
use crate::time::Timestamp;

/// Kind of action a staff member may attempt. Each variant is also the
/// capability required to perform it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionType {
    Admit,
    Discharge,
    StaffAdmin,
    ShiftAdmin,
    Report,
    Prescribe,
    ReviewPrescription,
    ViewResident,
    AdministerMedication,
    RecordVitals,
}

impl ActionType {
    /// Clinical actions additionally require the actor to be on shift.
    #[must_use]
    pub fn is_clinical(self) -> bool {
        matches!(
            self,
            Self::AdministerMedication | Self::RecordVitals | Self::Prescribe
        )
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admit => "admit",
            Self::Discharge => "discharge",
            Self::StaffAdmin => "staff-admin",
            Self::ShiftAdmin => "shift-admin",
            Self::Report => "report",
            Self::Prescribe => "prescribe",
            Self::ReviewPrescription => "review-prescription",
            Self::ViewResident => "view-resident",
            Self::AdministerMedication => "administer-medication",
            Self::RecordVitals => "record-vitals",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to the record an action is aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum TargetRef {
    Resident(ResidentId),
    Bed(BedId),
    Staff(StaffId),
    Shift(ShiftId),
}

/// Circumstances an authorization decision is taken in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionContext {
    /// Moment the action happens; roster presence is checked against it.
    pub at: Timestamp,
    pub target: Option<TargetRef>,
}

impl ActionContext {
    #[must_use]
    pub fn at(at: Timestamp) -> Self {
        Self { at, target: None }
    }

    #[must_use]
    pub fn with_target(mut self, target: TargetRef) -> Self {
        self.target = Some(target);
        self
    }
}

/// An attempted action by a staff member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub staff_id: StaffId,
    pub action_type: ActionType,
    pub timestamp: Timestamp,
    pub target: Option<TargetRef>,
}

impl Action {
    #[must_use]
    pub fn context(&self) -> ActionContext {
        ActionContext {
            at: self.timestamp,
            target: self.target,
        }
    }
}
