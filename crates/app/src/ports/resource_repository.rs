//! Resource repository port: persistence for beds, residents, staff and
//! shift assignments.

use std::future::Future;
use std::sync::Arc;

use carehub_domain::bed::Bed;
use carehub_domain::error::CareHubError;
use carehub_domain::id::{BedId, ResidentId, ShiftId, StaffId};
use carehub_domain::resident::Resident;
use carehub_domain::shift::ShiftAssignment;
use carehub_domain::staff::Staff;

/// One record in a [`ResourceRepository::save_group`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Bed(Bed),
    Resident(Resident),
    Staff(Staff),
    Shift(ShiftAssignment),
}

/// Store for the records the core reads and mutates.
///
/// `save_group` upserts every record in one transaction: either all of them
/// are persisted or none is.
pub trait ResourceRepository {
    fn get_bed(&self, id: BedId)
    -> impl Future<Output = Result<Option<Bed>, CareHubError>> + Send;

    fn get_resident(
        &self,
        id: ResidentId,
    ) -> impl Future<Output = Result<Option<Resident>, CareHubError>> + Send;

    fn get_staff(
        &self,
        id: StaffId,
    ) -> impl Future<Output = Result<Option<Staff>, CareHubError>> + Send;

    fn get_shift(
        &self,
        id: ShiftId,
    ) -> impl Future<Output = Result<Option<ShiftAssignment>, CareHubError>> + Send;

    /// All beds matching `predicate`, in no particular order.
    fn find_beds<P>(&self, predicate: P) -> impl Future<Output = Result<Vec<Bed>, CareHubError>> + Send
    where
        P: Fn(&Bed) -> bool + Send + 'static;

    /// All residents matching `predicate`, in no particular order.
    fn find_residents<P>(
        &self,
        predicate: P,
    ) -> impl Future<Output = Result<Vec<Resident>, CareHubError>> + Send
    where
        P: Fn(&Resident) -> bool + Send + 'static;

    /// All shift assignments matching `predicate`, in no particular order.
    fn find_shifts<P>(
        &self,
        predicate: P,
    ) -> impl Future<Output = Result<Vec<ShiftAssignment>, CareHubError>> + Send
    where
        P: Fn(&ShiftAssignment) -> bool + Send + 'static;

    /// Atomically upsert every record.
    fn save_group(
        &self,
        records: Vec<Record>,
    ) -> impl Future<Output = Result<(), CareHubError>> + Send;
}

impl<T: ResourceRepository + Send + Sync> ResourceRepository for Arc<T> {
    fn get_bed(
        &self,
        id: BedId,
    ) -> impl Future<Output = Result<Option<Bed>, CareHubError>> + Send {
        (**self).get_bed(id)
    }

    fn get_resident(
        &self,
        id: ResidentId,
    ) -> impl Future<Output = Result<Option<Resident>, CareHubError>> + Send {
        (**self).get_resident(id)
    }

    fn get_staff(
        &self,
        id: StaffId,
    ) -> impl Future<Output = Result<Option<Staff>, CareHubError>> + Send {
        (**self).get_staff(id)
    }

    fn get_shift(
        &self,
        id: ShiftId,
    ) -> impl Future<Output = Result<Option<ShiftAssignment>, CareHubError>> + Send {
        (**self).get_shift(id)
    }

    fn find_beds<P>(&self, predicate: P) -> impl Future<Output = Result<Vec<Bed>, CareHubError>> + Send
    where
        P: Fn(&Bed) -> bool + Send + 'static,
    {
        (**self).find_beds(predicate)
    }

    fn find_residents<P>(
        &self,
        predicate: P,
    ) -> impl Future<Output = Result<Vec<Resident>, CareHubError>> + Send
    where
        P: Fn(&Resident) -> bool + Send + 'static,
    {
        (**self).find_residents(predicate)
    }

    fn find_shifts<P>(
        &self,
        predicate: P,
    ) -> impl Future<Output = Result<Vec<ShiftAssignment>, CareHubError>> + Send
    where
        P: Fn(&ShiftAssignment) -> bool + Send + 'static,
    {
        (**self).find_shifts(predicate)
    }

    fn save_group(
        &self,
        records: Vec<Record>,
    ) -> impl Future<Output = Result<(), CareHubError>> + Send {
        (**self).save_group(records)
    }
}
