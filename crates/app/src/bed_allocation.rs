//! Bed allocation engine: matches residents to beds and owns the
//! resident ↔ bed cross-reference.
//!
//! Scans run without locks and may go stale; every mutation locks the bed
//! (then the resident), re-reads both under the lock, re-validates and writes
//! both sides in a single [`ResourceRepository::save_group`] call.

use carehub_domain::bed::Bed;
use carehub_domain::error::{CareHubError, ConflictError, ConstraintError, NotFoundError};
use carehub_domain::id::{BedId, ResidentId};
use carehub_domain::resident::Resident;

use crate::locks::KeyedLocks;
use crate::ports::{Record, ResourceRepository};

/// Both sides of a bed assignment as persisted by the last write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub bed: Bed,
    pub resident: Resident,
}

/// Sole writer of `Bed::occupied_by` and `Resident::current_bed`.
pub struct BedAllocationEngine<R> {
    repo: R,
    bed_locks: KeyedLocks<BedId>,
    resident_locks: KeyedLocks<ResidentId>,
}

impl<R: ResourceRepository + Sync> BedAllocationEngine<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            bed_locks: KeyedLocks::new(),
            resident_locks: KeyedLocks::new(),
        }
    }

    async fn load_bed(&self, id: BedId) -> Result<Bed, CareHubError> {
        self.repo.get_bed(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Bed",
                id: id.to_string(),
            }
            .into()
        })
    }

    async fn load_resident(&self, id: ResidentId) -> Result<Resident, CareHubError> {
        self.repo.get_resident(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Resident",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// Vacant beds the resident may occupy, best candidate first.
    ///
    /// Beds that are not isolation-capable come first for residents who do
    /// not need isolation, then beds in the resident's preferred ward, then
    /// ascending bed id. An empty result is not an error.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    #[tracing::instrument(skip(self, resident), fields(resident_id = %resident.id))]
    pub async fn find_suitable_beds(&self, resident: &Resident) -> Result<Vec<Bed>, CareHubError> {
        let candidate = resident.clone();
        let mut beds = self
            .repo
            .find_beds(move |bed| bed.is_vacant() && bed.is_suitable_for(&candidate))
            .await?;
        beds.sort_by_key(|bed| bed.placement_rank(resident));
        tracing::debug!(count = beds.len(), "suitable beds found");
        Ok(beds)
    }

    /// Vacant beds, optionally restricted to one ward, by ascending id.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn find_vacant_beds(&self, ward: Option<String>) -> Result<Vec<Bed>, CareHubError> {
        let mut beds = self
            .repo
            .find_beds(move |bed| {
                bed.is_vacant() && ward.as_deref().is_none_or(|ward| ward == bed.ward)
            })
            .await?;
        beds.sort_by_key(|bed| bed.id);
        Ok(beds)
    }

    /// Whether `resident` could be placed in bed `bed_id`, by gender and
    /// isolation rules only. Nothing is mutated.
    ///
    /// # Errors
    ///
    /// Returns [`CareHubError::NotFound`] when the bed does not exist, or a
    /// storage error from the repository.
    pub async fn is_bed_suitable_for_resident(
        &self,
        bed_id: BedId,
        resident: &Resident,
    ) -> Result<bool, CareHubError> {
        Ok(self.load_bed(bed_id).await?.is_suitable_for(resident))
    }

    /// Place a stored resident in a bed.
    ///
    /// # Errors
    ///
    /// In order of precedence:
    /// - [`CareHubError::NotFound`] for an unknown resident or bed
    /// - [`ConflictError::BedOccupied`] when the bed is taken
    /// - [`ConstraintError::ResidentAlreadyPlaced`] when the resident has a bed
    /// - [`ConstraintError::ResidentInactive`] for a discharged resident
    /// - [`ConstraintError::GenderMismatch`] / [`ConstraintError::IsolationRequired`]
    #[tracing::instrument(skip(self))]
    pub async fn assign(
        &self,
        resident_id: ResidentId,
        bed_id: BedId,
    ) -> Result<Placement, CareHubError> {
        let _bed_guard = self.bed_locks.acquire(bed_id).await;
        let _resident_guard = self.resident_locks.acquire(resident_id).await;

        let resident = self.load_resident(resident_id).await?;
        let bed = self.load_bed(bed_id).await?;
        check_assignable(&bed, &resident)
            .inspect_err(|err| tracing::warn!(error = %err, "assignment rejected"))?;
        self.write_placement(bed, resident).await
    }

    /// Create a new resident already placed in `bed_id`, in one write.
    ///
    /// # Errors
    ///
    /// Returns [`ConstraintError::ResidentAlreadyExists`] when the id is taken,
    /// [`CareHubError::Validation`] for an invalid resident, and otherwise the
    /// same failures as [`assign`](Self::assign).
    #[tracing::instrument(skip(self, resident), fields(resident_id = %resident.id))]
    pub async fn admit(&self, resident: Resident, bed_id: BedId) -> Result<Placement, CareHubError> {
        resident.validate()?;
        let _bed_guard = self.bed_locks.acquire(bed_id).await;
        let _resident_guard = self.resident_locks.acquire(resident.id).await;

        if self.repo.get_resident(resident.id).await?.is_some() {
            return Err(ConstraintError::ResidentAlreadyExists(resident.id).into());
        }
        let bed = self.load_bed(bed_id).await?;
        check_assignable(&bed, &resident)
            .inspect_err(|err| tracing::warn!(error = %err, "admission rejected"))?;
        self.write_placement(bed, resident).await
    }

    async fn write_placement(
        &self,
        mut bed: Bed,
        mut resident: Resident,
    ) -> Result<Placement, CareHubError> {
        bed.occupied_by = Some(resident.id);
        resident.current_bed = Some(bed.id);
        self.repo
            .save_group(vec![
                Record::Bed(bed.clone()),
                Record::Resident(resident.clone()),
            ])
            .await?;
        tracing::info!(bed_id = %bed.id, resident_id = %resident.id, "resident placed");
        Ok(Placement { bed, resident })
    }

    /// Vacate a bed, clearing both sides of the cross-reference.
    ///
    /// # Errors
    ///
    /// Returns [`ConstraintError::BedVacant`] when nobody occupies the bed,
    /// [`CareHubError::NotFound`] for an unknown bed, or a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn release(&self, bed_id: BedId) -> Result<Placement, CareHubError> {
        let _bed_guard = self.bed_locks.acquire(bed_id).await;
        let bed = self.load_bed(bed_id).await?;
        let Some(resident_id) = bed.occupied_by else {
            return Err(ConstraintError::BedVacant(bed_id).into());
        };

        let _resident_guard = self.resident_locks.acquire(resident_id).await;
        let resident = self.load_resident(resident_id).await?;
        self.clear_placement(bed, resident).await
    }

    /// Caller holds the locks of both records.
    async fn clear_placement(
        &self,
        mut bed: Bed,
        mut resident: Resident,
    ) -> Result<Placement, CareHubError> {
        bed.occupied_by = None;
        if resident.current_bed == Some(bed.id) {
            resident.current_bed = None;
        }
        self.repo
            .save_group(vec![
                Record::Bed(bed.clone()),
                Record::Resident(resident.clone()),
            ])
            .await?;
        tracing::info!(bed_id = %bed.id, resident_id = %resident.id, "bed released");
        Ok(Placement { bed, resident })
    }

    /// Move a placed resident to another bed: release, then assign.
    ///
    /// Both beds and the resident stay locked from the checks until the last
    /// write, so nothing can take the original bed in between. If the assign
    /// write fails, the original placement is written back and the assign
    /// error returned.
    ///
    /// # Errors
    ///
    /// - [`ConstraintError::ResidentNotPlaced`] when the resident has no bed
    /// - [`ConflictError::ResidentMoved`] when the resident changed beds while
    ///   the transfer was waiting for its locks
    /// - the failures of [`assign`](Self::assign) for the target bed
    #[tracing::instrument(skip(self))]
    pub async fn transfer(
        &self,
        resident_id: ResidentId,
        bed_id: BedId,
    ) -> Result<Placement, CareHubError> {
        let observed = self.load_resident(resident_id).await?;
        let Some(origin) = observed.current_bed else {
            return Err(ConstraintError::ResidentNotPlaced(resident_id).into());
        };
        let _bed_guards = self.bed_locks.acquire_all([origin, bed_id]).await;
        let _resident_guard = self.resident_locks.acquire(resident_id).await;

        let resident = self.load_resident(resident_id).await?;
        let origin_bed = self.load_bed(origin).await?;
        if resident.current_bed != Some(origin) || origin_bed.occupied_by != Some(resident_id) {
            return Err(ConflictError::ResidentMoved(resident_id).into());
        }
        let target = self.load_bed(bed_id).await?;
        if let Some(occupant) = target.occupied_by {
            return Err(ConflictError::BedOccupied { bed_id, occupant }.into());
        }
        target
            .check_suitability(&resident)
            .inspect_err(|err| tracing::warn!(error = %err, "transfer rejected"))?;

        let released = self.clear_placement(origin_bed, resident).await?;
        match self.write_placement(target, released.resident.clone()).await {
            Ok(placement) => Ok(placement),
            Err(err) => {
                tracing::warn!(error = %err, %origin, "transfer failed, restoring original bed");
                self.write_placement(released.bed, released.resident)
                    .await
                    .inspect_err(|restore_err| {
                        tracing::error!(error = %restore_err, %origin, "could not restore original bed");
                    })?;
                Err(err)
            }
        }
    }

    /// Mark a resident inactive, vacating their bed in the same write.
    ///
    /// # Errors
    ///
    /// Returns [`ConstraintError::ResidentInactive`] for an already discharged
    /// resident, [`ConflictError::ResidentMoved`] when the resident changed
    /// beds while the discharge was waiting, or a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn discharge(&self, resident_id: ResidentId) -> Result<Resident, CareHubError> {
        let observed = self.load_resident(resident_id).await?;
        let _bed_guard = if let Some(bed_id) = observed.current_bed {
            Some(self.bed_locks.acquire(bed_id).await)
        } else {
            None
        };
        let _resident_guard = self.resident_locks.acquire(resident_id).await;

        let mut resident = self.load_resident(resident_id).await?;
        if resident.current_bed != observed.current_bed {
            return Err(ConflictError::ResidentMoved(resident_id).into());
        }
        if !resident.active {
            return Err(ConstraintError::ResidentInactive(resident_id).into());
        }

        let mut records = Vec::with_capacity(2);
        if let Some(bed_id) = resident.current_bed.take() {
            let mut bed = self.load_bed(bed_id).await?;
            if bed.occupied_by == Some(resident_id) {
                bed.occupied_by = None;
            }
            records.push(Record::Bed(bed));
        }
        resident.active = false;
        records.push(Record::Resident(resident.clone()));
        self.repo.save_group(records).await?;
        tracing::info!(%resident_id, "resident discharged");
        Ok(resident)
    }
}

fn check_assignable(bed: &Bed, resident: &Resident) -> Result<(), CareHubError> {
    if let Some(occupant) = bed.occupied_by {
        return Err(ConflictError::BedOccupied {
            bed_id: bed.id,
            occupant,
        }
        .into());
    }
    if let Some(bed_id) = resident.current_bed {
        return Err(ConstraintError::ResidentAlreadyPlaced {
            resident_id: resident.id,
            bed_id,
        }
        .into());
    }
    if !resident.active {
        return Err(ConstraintError::ResidentInactive(resident.id).into());
    }
    bed.check_suitability(resident)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use carehub_domain::bed::GenderRestriction;
    use carehub_domain::consistency::check_occupancy;
    use carehub_domain::resident::Gender;

    use super::*;
    use crate::testing::{InMemoryResourceRepo, bed, id_bed, id_resident, resident, restricted_bed};

    fn engine(records: Vec<Record>) -> BedAllocationEngine<Arc<InMemoryResourceRepo>> {
        BedAllocationEngine::new(Arc::new(InMemoryResourceRepo::seeded(records)))
    }

    fn scenario_beds() -> Vec<Record> {
        vec![
            Record::Bed(bed(1, "wardA", false)),
            Record::Bed(bed(2, "wardA", true)),
        ]
    }

    fn assert_consistent(repo: &InMemoryResourceRepo) {
        let snapshot = repo.snapshot();
        let beds: Vec<Bed> = snapshot.beds.into_values().collect();
        let residents: Vec<Resident> = snapshot.residents.into_values().collect();
        assert!(check_occupancy(&beds, &residents).is_empty());
    }

    #[tokio::test]
    async fn should_rank_plain_bed_before_isolation_bed_when_isolation_not_needed() {
        let engine = engine(scenario_beds());
        let r = resident(10, Gender::Female, false);

        let beds = engine.find_suitable_beds(&r).await.unwrap();
        let ids: Vec<BedId> = beds.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![id_bed(1), id_bed(2)]);
    }

    #[tokio::test]
    async fn should_offer_only_isolation_beds_when_isolation_required() {
        let engine = engine(scenario_beds());
        let r = resident(11, Gender::Female, true);

        let beds = engine.find_suitable_beds(&r).await.unwrap();
        let ids: Vec<BedId> = beds.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![id_bed(2)]);
    }

    #[tokio::test]
    async fn should_return_empty_list_when_no_bed_qualifies() {
        let engine = engine(vec![Record::Bed(restricted_bed(
            1,
            GenderRestriction::MaleOnly,
        ))]);
        let r = resident(10, Gender::Female, false);

        assert!(engine.find_suitable_beds(&r).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_skip_occupied_beds_and_prefer_resident_ward() {
        let mut occupied = bed(1, "wardB", false);
        occupied.occupied_by = Some(id_resident(99));
        let engine = engine(vec![
            Record::Bed(occupied),
            Record::Bed(bed(2, "wardA", false)),
            Record::Bed(bed(3, "wardB", false)),
        ]);
        let mut r = resident(10, Gender::Male, false);
        r.preferred_ward = Some("wardB".to_string());

        let ids: Vec<BedId> = engine
            .find_suitable_beds(&r)
            .await
            .unwrap()
            .iter()
            .map(|b| b.id)
            .collect();
        assert_eq!(ids, vec![id_bed(3), id_bed(2)]);
    }

    #[tokio::test]
    async fn should_list_vacant_beds_in_ward() {
        let mut occupied = bed(3, "wardA", false);
        occupied.occupied_by = Some(id_resident(99));
        let engine = engine(vec![
            Record::Bed(bed(2, "wardA", false)),
            Record::Bed(bed(1, "wardB", false)),
            Record::Bed(occupied),
        ]);

        let all = engine.find_vacant_beds(None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, id_bed(1));

        let ward_a = engine.find_vacant_beds(Some("wardA".to_string())).await.unwrap();
        assert_eq!(ward_a.len(), 1);
        assert_eq!(ward_a[0].id, id_bed(2));
    }

    #[tokio::test]
    async fn should_answer_suitability_without_mutating() {
        let repo = Arc::new(InMemoryResourceRepo::seeded(scenario_beds()));
        let engine = BedAllocationEngine::new(Arc::clone(&repo));
        let before = repo.snapshot();
        let r = resident(11, Gender::Female, true);

        assert!(!engine.is_bed_suitable_for_resident(id_bed(1), &r).await.unwrap());
        assert!(engine.is_bed_suitable_for_resident(id_bed(2), &r).await.unwrap());
        assert_eq!(repo.snapshot(), before);
    }

    #[tokio::test]
    async fn should_write_both_sides_when_assigning() {
        let repo = Arc::new(InMemoryResourceRepo::seeded(vec![
            Record::Bed(bed(1, "wardA", false)),
            Record::Resident(resident(10, Gender::Female, false)),
        ]));
        let engine = BedAllocationEngine::new(Arc::clone(&repo));

        let placement = engine.assign(id_resident(10), id_bed(1)).await.unwrap();
        assert_eq!(placement.bed.occupied_by, Some(id_resident(10)));
        assert_eq!(placement.resident.current_bed, Some(id_bed(1)));

        let snapshot = repo.snapshot();
        assert_eq!(snapshot.beds[&id_bed(1)].occupied_by, Some(id_resident(10)));
        assert_eq!(snapshot.residents[&id_resident(10)].current_bed, Some(id_bed(1)));
    }

    #[tokio::test]
    async fn should_return_not_found_for_unknown_ids() {
        let engine = engine(vec![Record::Bed(bed(1, "wardA", false))]);
        let result = engine.assign(id_resident(10), id_bed(1)).await;
        assert!(matches!(result, Err(CareHubError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_fail_with_conflict_and_leave_state_untouched_when_bed_occupied() {
        let mut taken = bed(1, "wardA", false);
        let mut occupant = resident(20, Gender::Male, false);
        taken.occupied_by = Some(occupant.id);
        occupant.current_bed = Some(taken.id);
        let repo = Arc::new(InMemoryResourceRepo::seeded(vec![
            Record::Bed(taken),
            Record::Resident(occupant),
            Record::Resident(resident(10, Gender::Female, false)),
        ]));
        let engine = BedAllocationEngine::new(Arc::clone(&repo));
        let before = repo.snapshot();

        let result = engine.assign(id_resident(10), id_bed(1)).await;
        assert!(matches!(
            result,
            Err(CareHubError::ResourceConflict(ConflictError::BedOccupied { .. }))
        ));
        assert_eq!(repo.snapshot(), before);
    }

    #[tokio::test]
    async fn should_require_release_before_second_assignment() {
        let engine = engine(vec![
            Record::Bed(bed(1, "wardA", false)),
            Record::Bed(bed(2, "wardA", false)),
            Record::Resident(resident(10, Gender::Female, false)),
        ]);
        engine.assign(id_resident(10), id_bed(1)).await.unwrap();

        let result = engine.assign(id_resident(10), id_bed(2)).await;
        assert!(matches!(
            result,
            Err(CareHubError::ConstraintViolation(
                ConstraintError::ResidentAlreadyPlaced { .. }
            ))
        ));
    }

    #[tokio::test]
    async fn should_revalidate_gender_and_isolation_on_assign() {
        let engine = engine(vec![
            Record::Bed(restricted_bed(1, GenderRestriction::MaleOnly)),
            Record::Bed(bed(2, "wardA", false)),
            Record::Resident(resident(10, Gender::Female, true)),
        ]);

        let gender = engine.assign(id_resident(10), id_bed(1)).await;
        assert!(matches!(
            gender,
            Err(CareHubError::ConstraintViolation(
                ConstraintError::GenderMismatch { .. }
            ))
        ));

        let isolation = engine.assign(id_resident(10), id_bed(2)).await;
        assert!(matches!(
            isolation,
            Err(CareHubError::ConstraintViolation(
                ConstraintError::IsolationRequired { .. }
            ))
        ));
    }

    #[tokio::test]
    async fn should_clear_both_sides_on_release() {
        let repo = Arc::new(InMemoryResourceRepo::seeded(vec![
            Record::Bed(bed(1, "wardA", false)),
            Record::Resident(resident(10, Gender::Female, false)),
        ]));
        let engine = BedAllocationEngine::new(Arc::clone(&repo));
        engine.assign(id_resident(10), id_bed(1)).await.unwrap();

        let released = engine.release(id_bed(1)).await.unwrap();
        assert!(released.bed.is_vacant());
        assert!(!released.resident.is_placed());
        assert_consistent(&repo);
    }

    #[tokio::test]
    async fn should_reject_release_of_vacant_bed() {
        let engine = engine(scenario_beds());
        let result = engine.release(id_bed(1)).await;
        assert!(matches!(
            result,
            Err(CareHubError::ConstraintViolation(ConstraintError::BedVacant(_)))
        ));
    }

    #[tokio::test]
    async fn should_move_resident_on_transfer() {
        let repo = Arc::new(InMemoryResourceRepo::seeded(vec![
            Record::Bed(bed(1, "wardA", false)),
            Record::Bed(bed(2, "wardB", false)),
            Record::Resident(resident(10, Gender::Female, false)),
        ]));
        let engine = BedAllocationEngine::new(Arc::clone(&repo));
        engine.assign(id_resident(10), id_bed(1)).await.unwrap();

        let placement = engine.transfer(id_resident(10), id_bed(2)).await.unwrap();
        assert_eq!(placement.bed.id, id_bed(2));
        let snapshot = repo.snapshot();
        assert!(snapshot.beds[&id_bed(1)].is_vacant());
        assert_eq!(snapshot.beds[&id_bed(2)].occupied_by, Some(id_resident(10)));
        assert_consistent(&repo);
    }

    #[tokio::test]
    async fn should_keep_original_bed_when_transfer_target_unsuitable() {
        let repo = Arc::new(InMemoryResourceRepo::seeded(vec![
            Record::Bed(bed(1, "wardA", true)),
            Record::Bed(bed(2, "wardA", false)),
            Record::Resident(resident(10, Gender::Female, true)),
        ]));
        let engine = BedAllocationEngine::new(Arc::clone(&repo));
        engine.assign(id_resident(10), id_bed(1)).await.unwrap();
        let before = repo.snapshot();

        let result = engine.transfer(id_resident(10), id_bed(2)).await;
        assert!(matches!(
            result,
            Err(CareHubError::ConstraintViolation(
                ConstraintError::IsolationRequired { .. }
            ))
        ));
        assert_eq!(repo.snapshot(), before);
    }

    #[tokio::test]
    async fn should_put_resident_back_when_transfer_write_fails() {
        let repo = Arc::new(InMemoryResourceRepo::seeded(vec![
            Record::Bed(bed(1, "wardA", false)),
            Record::Bed(bed(2, "wardB", false)),
            Record::Resident(resident(10, Gender::Female, false)),
        ]));
        let engine = BedAllocationEngine::new(Arc::clone(&repo));
        engine.assign(id_resident(10), id_bed(1)).await.unwrap();
        let before = repo.snapshot();
        // first write vacates bed 1, second would occupy bed 2
        repo.fail_write(2);

        let result = engine.transfer(id_resident(10), id_bed(2)).await;
        assert!(matches!(result, Err(CareHubError::Storage(_))));
        assert_eq!(repo.snapshot(), before);
        assert_consistent(&repo);
    }

    #[tokio::test]
    async fn should_report_resident_moved_when_placement_changes_while_transfer_waits() {
        let repo = Arc::new(InMemoryResourceRepo::seeded(vec![
            Record::Bed(bed(1, "wardA", false)),
            Record::Bed(bed(2, "wardA", false)),
            Record::Bed(bed(3, "wardA", false)),
            Record::Resident(resident(10, Gender::Female, false)),
        ]));
        let engine = Arc::new(BedAllocationEngine::new(Arc::clone(&repo)));
        engine.assign(id_resident(10), id_bed(1)).await.unwrap();

        let held = engine.bed_locks.acquire(id_bed(1)).await;
        let transfer = tokio::spawn({
            let engine = Arc::clone(&engine);
            async move { engine.transfer(id_resident(10), id_bed(2)).await }
        });
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        let snapshot = repo.snapshot();
        let mut origin = snapshot.beds[&id_bed(1)].clone();
        let mut elsewhere = snapshot.beds[&id_bed(3)].clone();
        let mut moved = snapshot.residents[&id_resident(10)].clone();
        origin.occupied_by = None;
        elsewhere.occupied_by = Some(moved.id);
        moved.current_bed = Some(elsewhere.id);
        repo.save_group(vec![
            Record::Bed(origin),
            Record::Bed(elsewhere),
            Record::Resident(moved),
        ])
        .await
        .unwrap();
        drop(held);

        let result = transfer.await.unwrap();
        assert!(matches!(
            result,
            Err(CareHubError::ResourceConflict(ConflictError::ResidentMoved(_)))
        ));
        let snapshot = repo.snapshot();
        assert!(snapshot.beds[&id_bed(2)].is_vacant());
        assert_eq!(snapshot.residents[&id_resident(10)].current_bed, Some(id_bed(3)));
        assert_consistent(&repo);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn should_never_leave_transferred_resident_bedless_under_contention() {
        for _ in 0..50 {
            let repo = Arc::new(InMemoryResourceRepo::seeded(vec![
                Record::Bed(bed(1, "wardA", false)),
                Record::Bed(bed(2, "wardA", false)),
                Record::Resident(resident(10, Gender::Other, false)),
                Record::Resident(resident(20, Gender::Other, false)),
                Record::Resident(resident(30, Gender::Other, false)),
            ]));
            let engine = Arc::new(BedAllocationEngine::new(Arc::clone(&repo)));
            engine.assign(id_resident(10), id_bed(1)).await.unwrap();

            let transfer = tokio::spawn({
                let engine = Arc::clone(&engine);
                async move { engine.transfer(id_resident(10), id_bed(2)).await }
            });
            let into_origin = tokio::spawn({
                let engine = Arc::clone(&engine);
                async move { engine.assign(id_resident(20), id_bed(1)).await }
            });
            let into_target = tokio::spawn({
                let engine = Arc::clone(&engine);
                async move { engine.assign(id_resident(30), id_bed(2)).await }
            });
            let transferred = transfer.await.unwrap();
            let _ = into_origin.await.unwrap();
            let _ = into_target.await.unwrap();

            let snapshot = repo.snapshot();
            let current = snapshot.residents[&id_resident(10)].current_bed;
            match transferred {
                Ok(_) => assert_eq!(current, Some(id_bed(2))),
                Err(err) => {
                    assert!(matches!(
                        err,
                        CareHubError::ResourceConflict(ConflictError::BedOccupied { .. })
                    ));
                    assert_eq!(current, Some(id_bed(1)));
                }
            }
            assert_consistent(&repo);
        }
    }

    #[tokio::test]
    async fn should_vacate_bed_and_deactivate_on_discharge() {
        let repo = Arc::new(InMemoryResourceRepo::seeded(vec![
            Record::Bed(bed(1, "wardA", false)),
            Record::Resident(resident(10, Gender::Female, false)),
        ]));
        let engine = BedAllocationEngine::new(Arc::clone(&repo));
        engine.assign(id_resident(10), id_bed(1)).await.unwrap();

        let discharged = engine.discharge(id_resident(10)).await.unwrap();
        assert!(!discharged.active);
        assert!(!discharged.is_placed());
        assert!(repo.snapshot().beds[&id_bed(1)].is_vacant());
        assert_consistent(&repo);

        let again = engine.discharge(id_resident(10)).await;
        assert!(matches!(
            again,
            Err(CareHubError::ConstraintViolation(
                ConstraintError::ResidentInactive(_)
            ))
        ));
    }

    #[tokio::test]
    async fn should_refuse_to_place_discharged_resident() {
        let engine = engine(vec![
            Record::Bed(bed(1, "wardA", false)),
            Record::Resident(resident(10, Gender::Female, false)),
        ]);
        engine.discharge(id_resident(10)).await.unwrap();

        let result = engine.assign(id_resident(10), id_bed(1)).await;
        assert!(matches!(
            result,
            Err(CareHubError::ConstraintViolation(
                ConstraintError::ResidentInactive(_)
            ))
        ));
    }

    #[tokio::test]
    async fn should_admit_new_resident_into_bed_in_one_write() {
        let repo = Arc::new(InMemoryResourceRepo::seeded(scenario_beds()));
        let engine = BedAllocationEngine::new(Arc::clone(&repo));

        let placement = engine
            .admit(resident(10, Gender::Male, false), id_bed(1))
            .await
            .unwrap();
        assert_eq!(placement.resident.current_bed, Some(id_bed(1)));
        assert_consistent(&repo);

        let duplicate = engine
            .admit(resident(10, Gender::Male, false), id_bed(2))
            .await;
        assert!(matches!(
            duplicate,
            Err(CareHubError::ConstraintViolation(
                ConstraintError::ResidentAlreadyExists(_)
            ))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn should_let_exactly_one_concurrent_assign_win() {
        let repo = Arc::new(InMemoryResourceRepo::seeded(vec![
            Record::Bed(bed(1, "wardA", false)),
            Record::Resident(resident(10, Gender::Female, false)),
        ]));
        let engine = Arc::new(BedAllocationEngine::new(Arc::clone(&repo)));

        let first = tokio::spawn({
            let engine = Arc::clone(&engine);
            async move { engine.assign(id_resident(10), id_bed(1)).await }
        });
        let second = tokio::spawn({
            let engine = Arc::clone(&engine);
            async move { engine.assign(id_resident(10), id_bed(1)).await }
        });
        let results = [first.await.unwrap(), second.await.unwrap()];

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results.iter().any(|r| matches!(
            r,
            Err(CareHubError::ResourceConflict(ConflictError::BedOccupied { .. }))
        )));
        let snapshot = repo.snapshot();
        assert_eq!(snapshot.beds[&id_bed(1)].occupied_by, Some(id_resident(10)));
        assert_consistent(&repo);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn should_place_distinct_residents_once_each_under_contention() {
        let mut records: Vec<Record> = (1..=3).map(|n| Record::Bed(bed(n, "wardA", false))).collect();
        records.extend((10..16).map(|n| Record::Resident(resident(n, Gender::Other, false))));
        let repo = Arc::new(InMemoryResourceRepo::seeded(records));
        let engine = Arc::new(BedAllocationEngine::new(Arc::clone(&repo)));

        let mut handles = Vec::new();
        for n in 10..16 {
            for b in 1..=3 {
                let engine = Arc::clone(&engine);
                handles.push(tokio::spawn(async move {
                    engine.assign(id_resident(n), id_bed(b)).await
                }));
            }
        }
        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }

        assert_eq!(successes, 3);
        assert_consistent(&repo);
    }
}
