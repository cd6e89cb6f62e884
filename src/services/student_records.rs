use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use sqlx::postgres::PgRow;
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::{Database, Repository, SqlValue};
use crate::error::ApiError;
use crate::middleware::{AuthUser, Page};
use crate::models::certificate::{CertificateStats, CreateCertificate};
use crate::models::internship::{check_dates, CreateInternship, InternshipStats, UpdateInternship};
use crate::models::validate::Validator;
use crate::models::{Certificate, Changeset, Editable, Internship, Role, Student};
use crate::services::crud::{CrudService, ListParams};
use crate::services::people::PeopleService;

/// Records a student keeps about themself
pub trait StudentRecord: Editable {
    type Create: DeserializeOwned + Changeset + Send + Sync + 'static;
    type Stats: for<'r> FromRow<'r, PgRow> + Serialize + Send + Sync + Unpin + 'static;

    /// Aggregate query over live rows
    const STATS_SQL: &'static str;

    fn student_id(&self) -> Uuid;

    /// Checks that need the stored row as well as the incoming change
    fn check_update(&self, _input: &Self::Update) -> Result<(), ApiError> {
        Ok(())
    }
}

impl StudentRecord for Internship {
    type Create = CreateInternship;
    type Stats = InternshipStats;

    const STATS_SQL: &'static str = "SELECT COUNT(*) AS total, \
            COUNT(*) FILTER (WHERE status = 'APPLIED') AS applied, \
            COUNT(*) FILTER (WHERE status = 'ONGOING') AS ongoing, \
            COUNT(*) FILTER (WHERE status = 'COMPLETED') AS completed, \
            COUNT(*) FILTER (WHERE status = 'CANCELLED') AS cancelled, \
            COUNT(DISTINCT student_id) AS students \
         FROM internships WHERE is_deleted = false";

    fn student_id(&self) -> Uuid {
        self.student_id
    }

    fn check_update(&self, input: &UpdateInternship) -> Result<(), ApiError> {
        let mut v = Validator::new();
        let end = if input.end_date.is_some() { input.end_date } else { self.end_date };
        check_dates(&mut v, Some(input.start_date.unwrap_or(self.start_date)), end);
        v.finish()
    }
}

impl StudentRecord for Certificate {
    type Create = CreateCertificate;
    type Stats = CertificateStats;

    const STATS_SQL: &'static str =
        "SELECT COUNT(*) AS total, COUNT(DISTINCT student_id) AS students FROM certificates WHERE is_deleted = false";

    fn student_id(&self) -> Uuid {
        self.student_id
    }
}

pub struct StudentRecordService<'a> {
    db: &'a Database,
}

impl<'a> StudentRecordService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub async fn create<T: StudentRecord>(&self, user: &AuthUser, input: &T::Create) -> Result<T, ApiError> {
        let student = PeopleService::new(self.db).current_student(user).await?;
        let mut changes = input.changes();
        changes.insert(0, ("student_id", SqlValue::Uuid(student.id)));
        let record = Repository::<T>::insert(self.db.pool(), changes).await?;
        tracing::info!(resource = T::TABLE, student_id = %student.id, "Created student record");
        Ok(record)
    }

    pub async fn mine<T: StudentRecord>(&self, user: &AuthUser, params: ListParams) -> Result<Page<T>, ApiError> {
        let student = PeopleService::new(self.db).current_student(user).await?;
        let params = params.with_scope(json!({ "student_id": student.id.to_string() }));
        CrudService::new(self.db).list::<T>(&params).await
    }

    pub async fn for_student<T: StudentRecord>(&self, student_id: Uuid, params: ListParams) -> Result<Page<T>, ApiError> {
        Repository::<Student>::get(self.db.pool(), student_id).await?;
        let params = params.with_scope(json!({ "student_id": student_id.to_string() }));
        CrudService::new(self.db).list::<T>(&params).await
    }

    /// Owner, faculty and admins may read a record
    pub async fn get<T: StudentRecord>(&self, user: &AuthUser, id: Uuid) -> Result<T, ApiError> {
        let record = Repository::<T>::get(self.db.pool(), id).await?;
        if user.is(Role::Student) {
            self.ensure_owner(user, &record).await?;
        }
        Ok(record)
    }

    pub async fn update<T: StudentRecord>(&self, user: &AuthUser, id: Uuid, input: &T::Update) -> Result<T, ApiError> {
        let record = Repository::<T>::get(self.db.pool(), id).await?;
        self.ensure_owner(user, &record).await?;
        record.check_update(input)?;
        CrudService::new(self.db).update::<T>(id, input).await
    }

    pub async fn delete<T: StudentRecord>(&self, user: &AuthUser, id: Uuid) -> Result<T, ApiError> {
        let record = Repository::<T>::get(self.db.pool(), id).await?;
        self.ensure_owner(user, &record).await?;
        CrudService::new(self.db).soft_delete::<T>(id).await
    }

    pub async fn stats<T: StudentRecord>(&self) -> Result<T::Stats, ApiError> {
        Ok(sqlx::query_as::<_, T::Stats>(T::STATS_SQL).fetch_one(self.db.pool()).await?)
    }

    async fn ensure_owner<T: StudentRecord>(&self, user: &AuthUser, record: &T) -> Result<(), ApiError> {
        let student = PeopleService::new(self.db).current_student(user).await?;
        if record.student_id() != student.id {
            return Err(ApiError::forbidden(format!(
                "You can only access your own {}s.",
                T::NAME.to_lowercase()
            )));
        }
        Ok(())
    }
}
