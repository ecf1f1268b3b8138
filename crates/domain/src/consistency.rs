//! Consistency invariants over stored state.
//!
//! Checked by the audit use case; a correctly operated store never yields a
//! [`Violation`].

use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, TimeDelta};
use serde::Serialize;

use crate::bed::Bed;
use crate::id::{BedId, ResidentId, ShiftId, StaffId};
use crate::resident::Resident;
use crate::shift::{ShiftAssignment, ShiftWindow};

/// A broken invariant found in stored state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// A bed names an occupant that does not point back at it.
    DanglingOccupant { bed_id: BedId, resident_id: ResidentId },
    /// A resident names a bed that does not point back at them.
    DanglingBed { resident_id: ResidentId, bed_id: BedId },
    /// An occupied bed breaks the gender or isolation rule for its occupant.
    UnsuitablePlacement { bed_id: BedId, resident_id: ResidentId },
    DailyCapExceeded {
        staff_id: StaffId,
        date: NaiveDate,
        minutes: i64,
    },
    OverlappingShifts {
        staff_id: StaffId,
        first: ShiftId,
        second: ShiftId,
    },
    /// A stored shift whose start and end coincide.
    ZeroLengthShift { shift_id: ShiftId },
}

/// Check the bed ↔ resident cross-reference and placement rules.
#[must_use]
pub fn check_occupancy(beds: &[Bed], residents: &[Resident]) -> Vec<Violation> {
    let beds_by_id: HashMap<BedId, &Bed> = beds.iter().map(|b| (b.id, b)).collect();
    let residents_by_id: HashMap<ResidentId, &Resident> =
        residents.iter().map(|r| (r.id, r)).collect();
    let mut violations = Vec::new();

    for bed in beds {
        let Some(resident_id) = bed.occupied_by else {
            continue;
        };
        match residents_by_id.get(&resident_id) {
            Some(resident) if resident.current_bed == Some(bed.id) => {
                if !bed.is_suitable_for(resident) {
                    violations.push(Violation::UnsuitablePlacement {
                        bed_id: bed.id,
                        resident_id,
                    });
                }
            }
            _ => violations.push(Violation::DanglingOccupant {
                bed_id: bed.id,
                resident_id,
            }),
        }
    }

    for resident in residents {
        let Some(bed_id) = resident.current_bed else {
            continue;
        };
        let points_back = beds_by_id
            .get(&bed_id)
            .is_some_and(|bed| bed.occupied_by == Some(resident.id));
        if !points_back {
            violations.push(Violation::DanglingBed {
                resident_id: resident.id,
                bed_id,
            });
        }
    }

    violations
}

/// Check the daily-hours cap and the no-overlap rule over non-cancelled shifts.
#[must_use]
pub fn check_roster(shifts: &[ShiftAssignment], daily_cap: TimeDelta) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut by_staff: BTreeMap<StaffId, Vec<(&ShiftAssignment, ShiftWindow)>> =
        BTreeMap::new();

    for shift in shifts.iter().filter(|s| s.status.is_active()) {
        match shift.window() {
            Ok(window) => by_staff.entry(shift.staff_id).or_default().push((shift, window)),
            Err(_) => violations.push(Violation::ZeroLengthShift { shift_id: shift.id }),
        }
    }

    for (staff_id, mut entries) in by_staff {
        entries.sort_by_key(|(_, w)| w.starts_at());

        let mut per_day: BTreeMap<NaiveDate, TimeDelta> = BTreeMap::new();
        for (_, window) in &entries {
            *per_day.entry(window.date()).or_insert_with(TimeDelta::zero) += window.duration();
        }
        for (date, total) in per_day {
            if total > daily_cap {
                violations.push(Violation::DailyCapExceeded {
                    staff_id,
                    date,
                    minutes: total.num_minutes(),
                });
            }
        }

        for (i, (first, a)) in entries.iter().enumerate() {
            for (second, b) in &entries[i + 1..] {
                if a.overlaps(b) {
                    violations.push(Violation::OverlappingShifts {
                        staff_id,
                        first: first.id,
                        second: second.id,
                    });
                }
            }
        }
    }

    violations
}
