//! In-memory [`ResourceRepository`] and fixtures shared by the app tests.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use carehub_domain::bed::{Bed, GenderRestriction};
use carehub_domain::error::CareHubError;
use carehub_domain::id::{BedId, ResidentId, ShiftId, StaffId};
use carehub_domain::resident::{Gender, Resident};
use carehub_domain::shift::ShiftAssignment;
use carehub_domain::staff::{Role, Staff};

use crate::ports::{Record, ResourceRepository};

/// Full contents of the store, comparable for before/after checks.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub beds: BTreeMap<BedId, Bed>,
    pub residents: BTreeMap<ResidentId, Resident>,
    pub staff: BTreeMap<StaffId, Staff>,
    pub shifts: BTreeMap<ShiftId, ShiftAssignment>,
}

#[derive(Default)]
pub struct InMemoryResourceRepo {
    store: Mutex<Snapshot>,
    writes: AtomicUsize,
    failing_write: AtomicUsize,
}

impl InMemoryResourceRepo {
    pub fn seeded(records: impl IntoIterator<Item = Record>) -> Self {
        let repo = Self::default();
        {
            let mut store = repo.store.lock().unwrap();
            for record in records {
                apply(&mut store, record);
            }
        }
        repo
    }

    pub fn snapshot(&self) -> Snapshot {
        self.store.lock().unwrap().clone()
    }

    /// Make the `nth` next `save_group` call (1-based) fail without applying
    /// anything, the way a dropped storage transaction would.
    pub fn fail_write(&self, nth: usize) {
        let done = self.writes.load(Ordering::SeqCst);
        self.failing_write.store(done + nth, Ordering::SeqCst);
    }
}

fn apply(store: &mut Snapshot, record: Record) {
    match record {
        Record::Bed(bed) => {
            store.beds.insert(bed.id, bed);
        }
        Record::Resident(resident) => {
            store.residents.insert(resident.id, resident);
        }
        Record::Staff(staff) => {
            store.staff.insert(staff.id, staff);
        }
        Record::Shift(shift) => {
            store.shifts.insert(shift.id, shift);
        }
    }
}

impl ResourceRepository for InMemoryResourceRepo {
    fn get_bed(
        &self,
        id: BedId,
    ) -> impl Future<Output = Result<Option<Bed>, CareHubError>> + Send {
        let result = self.store.lock().unwrap().beds.get(&id).cloned();
        async { Ok(result) }
    }

    fn get_resident(
        &self,
        id: ResidentId,
    ) -> impl Future<Output = Result<Option<Resident>, CareHubError>> + Send {
        let result = self.store.lock().unwrap().residents.get(&id).cloned();
        async { Ok(result) }
    }

    fn get_staff(
        &self,
        id: StaffId,
    ) -> impl Future<Output = Result<Option<Staff>, CareHubError>> + Send {
        let result = self.store.lock().unwrap().staff.get(&id).cloned();
        async { Ok(result) }
    }

    fn get_shift(
        &self,
        id: ShiftId,
    ) -> impl Future<Output = Result<Option<ShiftAssignment>, CareHubError>> + Send {
        let result = self.store.lock().unwrap().shifts.get(&id).cloned();
        async { Ok(result) }
    }

    fn find_beds<P>(&self, predicate: P) -> impl Future<Output = Result<Vec<Bed>, CareHubError>> + Send
    where
        P: Fn(&Bed) -> bool + Send + 'static,
    {
        let store = self.store.lock().unwrap();
        let result: Vec<Bed> = store.beds.values().filter(|b| predicate(b)).cloned().collect();
        async { Ok(result) }
    }

    fn find_residents<P>(
        &self,
        predicate: P,
    ) -> impl Future<Output = Result<Vec<Resident>, CareHubError>> + Send
    where
        P: Fn(&Resident) -> bool + Send + 'static,
    {
        let store = self.store.lock().unwrap();
        let result: Vec<Resident> = store
            .residents
            .values()
            .filter(|r| predicate(r))
            .cloned()
            .collect();
        async { Ok(result) }
    }

    fn find_shifts<P>(
        &self,
        predicate: P,
    ) -> impl Future<Output = Result<Vec<ShiftAssignment>, CareHubError>> + Send
    where
        P: Fn(&ShiftAssignment) -> bool + Send + 'static,
    {
        let store = self.store.lock().unwrap();
        let result: Vec<ShiftAssignment> = store
            .shifts
            .values()
            .filter(|s| predicate(s))
            .cloned()
            .collect();
        async { Ok(result) }
    }

    fn save_group(
        &self,
        records: Vec<Record>,
    ) -> impl Future<Output = Result<(), CareHubError>> + Send {
        let attempt = self.writes.fetch_add(1, Ordering::SeqCst) + 1;
        let outcome = if attempt == self.failing_write.load(Ordering::SeqCst) {
            Err(CareHubError::Storage("write rejected by store".into()))
        } else {
            let mut store = self.store.lock().unwrap();
            for record in records {
                apply(&mut store, record);
            }
            Ok(())
        };
        async { outcome }
    }
}

pub fn id_bed(n: u128) -> BedId {
    BedId::from_uuid(uuid::Uuid::from_u128(n))
}

pub fn id_resident(n: u128) -> ResidentId {
    ResidentId::from_uuid(uuid::Uuid::from_u128(n))
}

pub fn bed(n: u128, ward: &str, isolation_capable: bool) -> Bed {
    Bed::builder()
        .id(id_bed(n))
        .ward(ward)
        .room("101")
        .bed_number(u32::try_from(n).unwrap())
        .isolation_capable(isolation_capable)
        .build()
        .unwrap()
}

pub fn restricted_bed(n: u128, restriction: GenderRestriction) -> Bed {
    Bed {
        gender_restriction: restriction,
        ..bed(n, "wardA", false)
    }
}

pub fn resident(n: u128, gender: Gender, requires_isolation: bool) -> Resident {
    Resident::builder()
        .id(id_resident(n))
        .name(format!("Resident {n}"))
        .gender(gender)
        .requires_isolation(requires_isolation)
        .build()
        .unwrap()
}

pub fn staff(role: Role) -> Staff {
    Staff::builder(role).name(role.to_string()).build().unwrap()
}
