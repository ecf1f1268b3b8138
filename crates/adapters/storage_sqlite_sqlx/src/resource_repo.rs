//! `SQLite` implementation of [`ResourceRepository`].

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqliteConnection, SqlitePool};

use carehub_app::ports::{Record, ResourceRepository};
use carehub_domain::bed::Bed;
use carehub_domain::error::CareHubError;
use carehub_domain::id::{BedId, ResidentId, ShiftId, StaffId};
use carehub_domain::resident::Resident;
use carehub_domain::shift::ShiftAssignment;
use carehub_domain::staff::Staff;

use crate::codec::{decode_enum, encode_enum, parse_column, parse_optional};
use crate::error::StorageError;

struct BedRow(Bed);

impl<'r> FromRow<'r, SqliteRow> for BedRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let bed_number: i64 = row.try_get("bed_number")?;
        let bed_type: String = row.try_get("bed_type")?;
        let gender_restriction: String = row.try_get("gender_restriction")?;
        let occupied_by: Option<String> = row.try_get("occupied_by")?;

        Ok(Self(Bed {
            id: parse_column(&id)?,
            ward: row.try_get("ward")?,
            room: row.try_get("room")?,
            bed_number: u32::try_from(bed_number)
                .map_err(|err| sqlx::Error::Decode(Box::new(err)))?,
            bed_type: decode_enum(&bed_type)?,
            gender_restriction: decode_enum(&gender_restriction)?,
            isolation_capable: row.try_get("isolation_capable")?,
            occupied_by: parse_optional(occupied_by)?,
        }))
    }
}

struct ResidentRow(Resident);

impl<'r> FromRow<'r, SqliteRow> for ResidentRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let gender: String = row.try_get("gender")?;
        let current_bed_id: Option<String> = row.try_get("current_bed_id")?;

        Ok(Self(Resident {
            id: parse_column(&id)?,
            name: row.try_get("name")?,
            gender: decode_enum(&gender)?,
            requires_isolation: row.try_get("requires_isolation")?,
            preferred_ward: row.try_get("preferred_ward")?,
            current_bed: parse_optional(current_bed_id)?,
            active: row.try_get("active")?,
        }))
    }
}

struct StaffRow(Staff);

impl<'r> FromRow<'r, SqliteRow> for StaffRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let role: String = row.try_get("role")?;

        Ok(Self(Staff {
            id: parse_column(&id)?,
            name: row.try_get("name")?,
            role: decode_enum(&role)?,
            active: row.try_get("active")?,
        }))
    }
}

struct ShiftRow(ShiftAssignment);

impl<'r> FromRow<'r, SqliteRow> for ShiftRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let staff_id: String = row.try_get("staff_id")?;
        let date: String = row.try_get("date")?;
        let start: String = row.try_get("start_time")?;
        let end: String = row.try_get("end_time")?;
        let status: String = row.try_get("status")?;

        Ok(Self(ShiftAssignment {
            id: parse_column(&id)?,
            staff_id: parse_column(&staff_id)?,
            date: parse_column(&date)?,
            start: parse_column(&start)?,
            end: parse_column(&end)?,
            ward: row.try_get("ward")?,
            status: decode_enum(&status)?,
        }))
    }
}

const SELECT_BED_BY_ID: &str = "SELECT * FROM beds WHERE id = ?";
const SELECT_ALL_BEDS: &str = "SELECT * FROM beds";
const UPSERT_BED: &str = "INSERT INTO beds \
    (id, ward, room, bed_number, bed_type, gender_restriction, isolation_capable, occupied_by) \
    VALUES (?, ?, ?, ?, ?, ?, ?, ?) \
    ON CONFLICT(id) DO UPDATE SET \
    ward = excluded.ward, room = excluded.room, bed_number = excluded.bed_number, \
    bed_type = excluded.bed_type, gender_restriction = excluded.gender_restriction, \
    isolation_capable = excluded.isolation_capable, occupied_by = excluded.occupied_by";

const SELECT_RESIDENT_BY_ID: &str = "SELECT * FROM residents WHERE id = ?";
const SELECT_ALL_RESIDENTS: &str = "SELECT * FROM residents";
const UPSERT_RESIDENT: &str = "INSERT INTO residents \
    (id, name, gender, requires_isolation, preferred_ward, current_bed_id, active) \
    VALUES (?, ?, ?, ?, ?, ?, ?) \
    ON CONFLICT(id) DO UPDATE SET \
    name = excluded.name, gender = excluded.gender, \
    requires_isolation = excluded.requires_isolation, preferred_ward = excluded.preferred_ward, \
    current_bed_id = excluded.current_bed_id, active = excluded.active";

const SELECT_STAFF_BY_ID: &str = "SELECT * FROM staff WHERE id = ?";
const UPSERT_STAFF: &str = "INSERT INTO staff (id, name, role, active) VALUES (?, ?, ?, ?) \
    ON CONFLICT(id) DO UPDATE SET name = excluded.name, role = excluded.role, active = excluded.active";

const SELECT_SHIFT_BY_ID: &str = "SELECT * FROM shift_assignments WHERE id = ?";
const SELECT_ALL_SHIFTS: &str = "SELECT * FROM shift_assignments ORDER BY date, start_time";
const UPSERT_SHIFT: &str = "INSERT INTO shift_assignments \
    (id, staff_id, date, start_time, end_time, ward, status) \
    VALUES (?, ?, ?, ?, ?, ?, ?) \
    ON CONFLICT(id) DO UPDATE SET \
    staff_id = excluded.staff_id, date = excluded.date, start_time = excluded.start_time, \
    end_time = excluded.end_time, ward = excluded.ward, status = excluded.status";

async fn upsert_bed(conn: &mut SqliteConnection, bed: &Bed) -> Result<(), StorageError> {
    sqlx::query(UPSERT_BED)
        .bind(bed.id.to_string())
        .bind(&bed.ward)
        .bind(&bed.room)
        .bind(i64::from(bed.bed_number))
        .bind(encode_enum(&bed.bed_type)?)
        .bind(encode_enum(&bed.gender_restriction)?)
        .bind(bed.isolation_capable)
        .bind(bed.occupied_by.map(|id| id.to_string()))
        .execute(conn)
        .await?;
    Ok(())
}

async fn upsert_resident(
    conn: &mut SqliteConnection,
    resident: &Resident,
) -> Result<(), StorageError> {
    sqlx::query(UPSERT_RESIDENT)
        .bind(resident.id.to_string())
        .bind(&resident.name)
        .bind(encode_enum(&resident.gender)?)
        .bind(resident.requires_isolation)
        .bind(resident.preferred_ward.as_deref())
        .bind(resident.current_bed.map(|id| id.to_string()))
        .bind(resident.active)
        .execute(conn)
        .await?;
    Ok(())
}

async fn upsert_staff(conn: &mut SqliteConnection, staff: &Staff) -> Result<(), StorageError> {
    sqlx::query(UPSERT_STAFF)
        .bind(staff.id.to_string())
        .bind(&staff.name)
        .bind(encode_enum(&staff.role)?)
        .bind(staff.active)
        .execute(conn)
        .await?;
    Ok(())
}

async fn upsert_shift(
    conn: &mut SqliteConnection,
    shift: &ShiftAssignment,
) -> Result<(), StorageError> {
    sqlx::query(UPSERT_SHIFT)
        .bind(shift.id.to_string())
        .bind(shift.staff_id.to_string())
        .bind(shift.date.to_string())
        .bind(shift.start.to_string())
        .bind(shift.end.to_string())
        .bind(&shift.ward)
        .bind(encode_enum(&shift.status)?)
        .execute(conn)
        .await?;
    Ok(())
}

/// `SQLite`-backed store for beds, residents, staff and shift assignments.
pub struct SqliteResourceRepository {
    pool: SqlitePool,
}

impl SqliteResourceRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl ResourceRepository for SqliteResourceRepository {
    fn get_bed(&self, id: BedId) -> impl Future<Output = Result<Option<Bed>, CareHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let row: Option<BedRow> = sqlx::query_as(SELECT_BED_BY_ID)
                .bind(id.to_string())
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;
            Ok(row.map(|row| row.0))
        }
    }

    fn get_resident(
        &self,
        id: ResidentId,
    ) -> impl Future<Output = Result<Option<Resident>, CareHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let row: Option<ResidentRow> = sqlx::query_as(SELECT_RESIDENT_BY_ID)
                .bind(id.to_string())
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;
            Ok(row.map(|row| row.0))
        }
    }

    fn get_staff(
        &self,
        id: StaffId,
    ) -> impl Future<Output = Result<Option<Staff>, CareHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let row: Option<StaffRow> = sqlx::query_as(SELECT_STAFF_BY_ID)
                .bind(id.to_string())
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;
            Ok(row.map(|row| row.0))
        }
    }

    fn get_shift(
        &self,
        id: ShiftId,
    ) -> impl Future<Output = Result<Option<ShiftAssignment>, CareHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let row: Option<ShiftRow> = sqlx::query_as(SELECT_SHIFT_BY_ID)
                .bind(id.to_string())
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;
            Ok(row.map(|row| row.0))
        }
    }

    fn find_beds<P>(&self, predicate: P) -> impl Future<Output = Result<Vec<Bed>, CareHubError>> + Send
    where
        P: Fn(&Bed) -> bool + Send + 'static,
    {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<BedRow> = sqlx::query_as(SELECT_ALL_BEDS)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;
            Ok(rows
                .into_iter()
                .map(|row| row.0)
                .filter(predicate)
                .collect())
        }
    }

    fn find_residents<P>(
        &self,
        predicate: P,
    ) -> impl Future<Output = Result<Vec<Resident>, CareHubError>> + Send
    where
        P: Fn(&Resident) -> bool + Send + 'static,
    {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<ResidentRow> = sqlx::query_as(SELECT_ALL_RESIDENTS)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;
            Ok(rows
                .into_iter()
                .map(|row| row.0)
                .filter(predicate)
                .collect())
        }
    }

    fn find_shifts<P>(
        &self,
        predicate: P,
    ) -> impl Future<Output = Result<Vec<ShiftAssignment>, CareHubError>> + Send
    where
        P: Fn(&ShiftAssignment) -> bool + Send + 'static,
    {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<ShiftRow> = sqlx::query_as(SELECT_ALL_SHIFTS)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;
            Ok(rows
                .into_iter()
                .map(|row| row.0)
                .filter(predicate)
                .collect())
        }
    }

    fn save_group(
        &self,
        records: Vec<Record>,
    ) -> impl Future<Output = Result<(), CareHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let mut tx = pool.begin().await.map_err(StorageError::from)?;
            for record in &records {
                match record {
                    Record::Bed(bed) => upsert_bed(&mut *tx, bed).await?,
                    Record::Resident(resident) => upsert_resident(&mut *tx, resident).await?,
                    Record::Staff(staff) => upsert_staff(&mut *tx, staff).await?,
                    Record::Shift(shift) => upsert_shift(&mut *tx, shift).await?,
                }
            }
            tx.commit().await.map_err(StorageError::from)?;
            tracing::debug!(records = records.len(), "record group committed");
            Ok(())
        }
    }
}
