//! Bed: the unit of occupancy, and the suitability rules for placing a
//! resident in it.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::{CareHubError, ConstraintError, ValidationError};
use crate::id::{BedId, ResidentId};
use crate::resident::{Gender, Resident};

/// Physical kind of bed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BedType {
    #[default]
    Standard,
    Electric,
    Special,
}

/// Occupancy restriction by resident gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenderRestriction {
    #[default]
    #[serde(rename = "none")]
    Unrestricted,
    MaleOnly,
    FemaleOnly,
}

impl GenderRestriction {
    /// Whether a resident of `gender` may occupy a bed with this restriction.
    #[must_use]
    pub fn admits(self, gender: Gender) -> bool {
        match self {
            Self::Unrestricted => true,
            Self::MaleOnly => gender == Gender::Male,
            Self::FemaleOnly => gender == Gender::Female,
        }
    }
}

/// A bed within a room of a ward.
///
/// `occupied_by` mirrors [`Resident::current_bed`] and is written only by the
/// bed allocation engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bed {
    pub id: BedId,
    pub ward: String,
    pub room: String,
    pub bed_number: u32,
    pub bed_type: BedType,
    pub gender_restriction: GenderRestriction,
    pub isolation_capable: bool,
    pub occupied_by: Option<ResidentId>,
}

impl Bed {
    /// Create a builder for constructing a [`Bed`].
    #[must_use]
    pub fn builder() -> BedBuilder {
        BedBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`CareHubError::Validation`] when `ward` is empty.
    pub fn validate(&self) -> Result<(), CareHubError> {
        if self.ward.trim().is_empty() {
            return Err(ValidationError::EmptyWard.into());
        }
        Ok(())
    }

    #[must_use]
    pub fn is_vacant(&self) -> bool {
        self.occupied_by.is_none()
    }

    /// Check gender and isolation rules for placing `resident` here.
    ///
    /// Vacancy is not part of suitability; callers check it separately.
    ///
    /// # Errors
    ///
    /// Returns [`ConstraintError::GenderMismatch`] or
    /// [`ConstraintError::IsolationRequired`].
    pub fn check_suitability(&self, resident: &Resident) -> Result<(), ConstraintError> {
        if !self.gender_restriction.admits(resident.gender) {
            return Err(ConstraintError::GenderMismatch {
                bed_id: self.id,
                resident_id: resident.id,
            });
        }
        if resident.requires_isolation && !self.isolation_capable {
            return Err(ConstraintError::IsolationRequired {
                bed_id: self.id,
                resident_id: resident.id,
            });
        }
        Ok(())
    }

    /// Boolean form of [`check_suitability`](Self::check_suitability).
    #[must_use]
    pub fn is_suitable_for(&self, resident: &Resident) -> bool {
        self.check_suitability(resident).is_ok()
    }

    /// Sort key used to order suitable beds for `resident`.
    #[must_use]
    pub fn placement_rank(&self, resident: &Resident) -> PlacementRank {
        let wastes_isolation = self.isolation_capable && !resident.requires_isolation;
        let outside_preferred_ward = resident
            .preferred_ward
            .as_deref()
            .is_some_and(|ward| ward != self.ward);
        PlacementRank {
            wastes_isolation,
            outside_preferred_ward,
            bed_id: self.id,
        }
    }
}

/// Ordering of candidate beds: beds that keep isolation stock free first,
/// then beds in the preferred ward, then ascending bed id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementRank {
    wastes_isolation: bool,
    outside_preferred_ward: bool,
    bed_id: BedId,
}

impl Ord for PlacementRank {
    fn cmp(&self, other: &Self) -> Ordering {
        self.wastes_isolation
            .cmp(&other.wastes_isolation)
            .then(self.outside_preferred_ward.cmp(&other.outside_preferred_ward))
            .then(self.bed_id.cmp(&other.bed_id))
    }
}

impl PartialOrd for PlacementRank {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Step-by-step builder for [`Bed`].
#[derive(Debug, Default)]
pub struct BedBuilder {
    id: Option<BedId>,
    ward: Option<String>,
    room: Option<String>,
    bed_number: u32,
    bed_type: BedType,
    gender_restriction: GenderRestriction,
    isolation_capable: bool,
}

impl BedBuilder {
    #[must_use]
    pub fn id(mut self, id: BedId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn ward(mut self, ward: impl Into<String>) -> Self {
        self.ward = Some(ward.into());
        self
    }

    #[must_use]
    pub fn room(mut self, room: impl Into<String>) -> Self {
        self.room = Some(room.into());
        self
    }

    #[must_use]
    pub fn bed_number(mut self, bed_number: u32) -> Self {
        self.bed_number = bed_number;
        self
    }

    #[must_use]
    pub fn bed_type(mut self, bed_type: BedType) -> Self {
        self.bed_type = bed_type;
        self
    }

    #[must_use]
    pub fn gender_restriction(mut self, restriction: GenderRestriction) -> Self {
        self.gender_restriction = restriction;
        self
    }

    #[must_use]
    pub fn isolation_capable(mut self, isolation_capable: bool) -> Self {
        self.isolation_capable = isolation_capable;
        self
    }

    /// Consume the builder, validate, and return a vacant [`Bed`].
    ///
    /// # Errors
    ///
    /// Returns [`CareHubError::Validation`] if `ward` is missing or empty.
    pub fn build(self) -> Result<Bed, CareHubError> {
        let bed = Bed {
            id: self.id.unwrap_or_default(),
            ward: self.ward.unwrap_or_default(),
            room: self.room.unwrap_or_default(),
            bed_number: self.bed_number,
            bed_type: self.bed_type,
            gender_restriction: self.gender_restriction,
            isolation_capable: self.isolation_capable,
            occupied_by: None,
        };
        bed.validate()?;
        Ok(bed)
    }
}
