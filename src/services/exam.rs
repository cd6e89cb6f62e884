use serde_json::json;
use uuid::Uuid;

use crate::database::{Database, Repository, SqlValue};
use crate::error::ApiError;
use crate::models::exam::CreateExam;
use crate::models::{Changeset, Exam, ExamType, Semester};

pub struct ExamService<'a> {
    db: &'a Database,
}

impl<'a> ExamService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// One live exam per (semester, type); a soft-deleted twin is revived with the new values.
    pub async fn create(&self, input: &CreateExam) -> Result<Exam, ApiError> {
        if Repository::<Semester>::find(self.db.pool(), input.semester_id).await?.is_none() {
            return Err(ApiError::bad_request("Semester does not exist."));
        }

        match self.find_any(input.semester_id, input.exam_type).await? {
            Some(existing) if !existing.is_deleted => Err(ApiError::conflict(format!(
                "A {} exam already exists for this semester.",
                input.exam_type
            ))),
            Some(existing) => {
                let mut tx = self.db.pool().begin().await?;
                sqlx::query("UPDATE exams SET is_deleted = false WHERE id = $1")
                    .bind(existing.id)
                    .execute(&mut *tx)
                    .await?;
                let exam = Repository::<Exam>::update(&mut *tx, existing.id, input.changes()).await?;
                tx.commit().await?;
                tracing::info!(exam_id = %exam.id, "Revived soft-deleted exam");
                Ok(exam)
            }
            None => Ok(Repository::<Exam>::insert(self.db.pool(), input.changes()).await?),
        }
    }

    pub async fn set_published(&self, id: Uuid, published: bool) -> Result<Exam, ApiError> {
        let exam = Repository::<Exam>::get(self.db.pool(), id).await?;
        if exam.is_published == published {
            let state = if published { "published" } else { "unpublished" };
            return Err(ApiError::bad_request(format!("Exam is already {}.", state)));
        }
        let exam = Repository::<Exam>::update(self.db.pool(), id, vec![("is_published", SqlValue::Bool(published))])
            .await?;
        tracing::info!(exam_id = %id, published, "Changed exam visibility");
        Ok(exam)
    }

    /// Live exam for a semester and type, created with a default name when missing
    pub async fn find_or_create(
        &self,
        semester_id: Uuid,
        exam_type: ExamType,
        name: Option<&str>,
    ) -> Result<Exam, ApiError> {
        if let Some(exam) = Repository::<Exam>::find_by(
            self.db.pool(),
            json!({ "semester_id": semester_id.to_string(), "exam_type": exam_type.as_str() }),
        )
        .await?
        {
            return Ok(exam);
        }

        let input = CreateExam {
            name: name.map(str::to_string).unwrap_or_else(|| format!("{} Examination", exam_type)),
            exam_type,
            semester_id,
            description: None,
            max_marks: None,
            pass_marks: None,
            exam_date: None,
            is_published: false,
        };
        self.create(&input).await
    }

    async fn find_any(&self, semester_id: Uuid, exam_type: ExamType) -> Result<Option<Exam>, ApiError> {
        Ok(sqlx::query_as::<_, Exam>("SELECT * FROM exams WHERE semester_id = $1 AND exam_type = $2::exam_type")
            .bind(semester_id)
            .bind(exam_type.as_str())
            .fetch_optional(self.db.pool())
            .await?)
    }
}
