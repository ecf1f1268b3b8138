//! Staff: facility employees and the role → capability table.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::action::ActionType;
use crate::error::{CareHubError, ValidationError};
use crate::id::StaffId;

const MANAGER_CAPABILITIES: &[ActionType] = &[
    ActionType::Admit,
    ActionType::Discharge,
    ActionType::StaffAdmin,
    ActionType::ShiftAdmin,
    ActionType::Report,
];

const DOCTOR_CAPABILITIES: &[ActionType] = &[
    ActionType::Prescribe,
    ActionType::ReviewPrescription,
    ActionType::ViewResident,
];

const NURSE_CAPABILITIES: &[ActionType] = &[
    ActionType::AdministerMedication,
    ActionType::RecordVitals,
    ActionType::ViewResident,
];

/// Job role of a staff member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Manager,
    Doctor,
    Nurse,
}

impl Role {
    /// Actions this role is allowed to perform.
    #[must_use]
    pub fn capabilities(self) -> &'static [ActionType] {
        match self {
            Self::Manager => MANAGER_CAPABILITIES,
            Self::Doctor => DOCTOR_CAPABILITIES,
            Self::Nurse => NURSE_CAPABILITIES,
        }
    }

    #[must_use]
    pub fn can(self, action: ActionType) -> bool {
        self.capabilities().contains(&action)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manager => f.write_str("manager"),
            Self::Doctor => f.write_str("doctor"),
            Self::Nurse => f.write_str("nurse"),
        }
    }
}

/// A facility employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Staff {
    pub id: StaffId,
    pub name: String,
    pub role: Role,
    pub active: bool,
}

impl Staff {
    /// Create a builder for constructing a [`Staff`] member.
    #[must_use]
    pub fn builder(role: Role) -> StaffBuilder {
        StaffBuilder {
            id: None,
            name: None,
            role,
            active: true,
        }
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`CareHubError::Validation`] when `name` is empty.
    pub fn validate(&self) -> Result<(), CareHubError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`Staff`].
#[derive(Debug)]
pub struct StaffBuilder {
    id: Option<StaffId>,
    name: Option<String>,
    role: Role,
    active: bool,
}

impl StaffBuilder {
    #[must_use]
    pub fn id(mut self, id: StaffId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Consume the builder, validate, and return a [`Staff`] member.
    ///
    /// # Errors
    ///
    /// Returns [`CareHubError::Validation`] if `name` is missing or empty.
    pub fn build(self) -> Result<Staff, CareHubError> {
        let staff = Staff {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            role: self.role,
            active: self.active,
        };
        staff.validate()?;
        Ok(staff)
    }
}
