//! Resident: a person admitted to the facility.

use serde::{Deserialize, Serialize};

use crate::error::{CareHubError, ValidationError};
use crate::id::{BedId, ResidentId};

/// Recorded gender of a resident, matched against bed restrictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// A person admitted to the facility.
///
/// `current_bed` mirrors [`Bed::occupied_by`](crate::bed::Bed::occupied_by)
/// and is written only by the bed allocation engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resident {
    pub id: ResidentId,
    pub name: String,
    pub gender: Gender,
    pub requires_isolation: bool,
    /// Ward the resident should preferably be placed in.
    pub preferred_ward: Option<String>,
    pub current_bed: Option<BedId>,
    pub active: bool,
}

impl Resident {
    /// Create a builder for constructing a [`Resident`].
    #[must_use]
    pub fn builder() -> ResidentBuilder {
        ResidentBuilder::default()
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

    /// Whether the resident currently occupies a bed.
    #[must_use]
    pub fn is_placed(&self) -> bool {
        self.current_bed.is_some()
    }
}

/// Step-by-step builder for [`Resident`].
#[derive(Debug, Default)]
pub struct ResidentBuilder {
    id: Option<ResidentId>,
    name: Option<String>,
    gender: Option<Gender>,
    requires_isolation: bool,
    preferred_ward: Option<String>,
}

impl ResidentBuilder {
    #[must_use]
    pub fn id(mut self, id: ResidentId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn gender(mut self, gender: Gender) -> Self {
        self.gender = Some(gender);
        self
    }

    #[must_use]
    pub fn requires_isolation(mut self, requires_isolation: bool) -> Self {
        self.requires_isolation = requires_isolation;
        self
    }

    #[must_use]
    pub fn preferred_ward(mut self, ward: impl Into<String>) -> Self {
        self.preferred_ward = Some(ward.into());
        self
    }

    /// Consume the builder, validate, and return an active, unplaced [`Resident`].
    ///
    /// The gender defaults to [`Gender::Other`] when not provided.
    ///
    /// # Errors
    ///
    /// Returns [`CareHubError::Validation`] if `name` is missing or empty.
    pub fn build(self) -> Result<Resident, CareHubError> {
        let resident = Resident {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            gender: self.gender.unwrap_or(Gender::Other),
            requires_isolation: self.requires_isolation,
            preferred_ward: self.preferred_ward,
            current_bed: None,
            active: true,
        };
        resident.validate()?;
        Ok(resident)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_build_active_unplaced_resident() {
        let resident = Resident::builder()
            .name("Ada")
            .gender(Gender::Female)
            .build()
            .unwrap();
        assert!(resident.active);
        assert!(!resident.is_placed());
        assert!(!resident.requires_isolation);
    }

    #[test]
    fn should_return_validation_error_when_name_is_blank() {
        let result = Resident::builder().name("   ").build();
        assert!(matches!(
            result,
            Err(CareHubError::Validation(ValidationError::EmptyName))
        ));
    }

    #[test]
    fn should_serialize_gender_in_snake_case() {
        let json = serde_json::to_string(&Gender::Female).unwrap();
        assert_eq!(json, "\"female\"");
    }
}
