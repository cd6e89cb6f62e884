use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::{Database, Repository, SqlValue};
use crate::error::ApiError;
use crate::middleware::{AuthUser, Page};
use crate::models::assignment::{AssignmentStatistics, CreateAssignment, UpdateAssignment};
use crate::models::submission::{CreateSubmission, GradeSubmission, UpdateSubmission};
use crate::models::{Assignment, Changeset, Course, Role, Submission};
use crate::services::course::CourseService;
use crate::services::crud::{CrudService, ListParams};
use crate::services::people::PeopleService;

/// Assignments and their submissions, with course-level ownership checks.
pub struct AssignmentService<'a> {
    db: &'a Database,
}

impl<'a> AssignmentService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub async fn create(&self, user: &AuthUser, input: &CreateAssignment) -> Result<Assignment, ApiError> {
        let faculty = PeopleService::new(self.db).current_faculty(user).await?;
        let course = Repository::<Course>::find(self.db.pool(), input.course_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Course not found."))?;
        if course.faculty_id != faculty.id {
            return Err(ApiError::forbidden("You are not assigned to teach this course."));
        }

        let mut changes = input.changes();
        changes.push(("faculty_id", SqlValue::Uuid(faculty.id)));
        let assignment = Repository::<Assignment>::insert(self.db.pool(), changes).await?;
        tracing::info!(assignment_id = %assignment.id, course_id = %course.id, "Created assignment");
        Ok(assignment)
    }

    /// Faculty see their own assignments, students those of their enrolled courses.
    pub async fn list(&self, user: &AuthUser, params: ListParams) -> Result<Page<Assignment>, ApiError> {
        let params = match user.role {
            Role::Admin => params,
            Role::Faculty => {
                let faculty = PeopleService::new(self.db).current_faculty(user).await?;
                params.with_scope(json!({ "faculty_id": faculty.id.to_string() }))
            }
            Role::Student => {
                let student = PeopleService::new(self.db).current_student(user).await?;
                let courses = enrolled_course_ids(self.db, student.id).await?;
                params.with_scope(json!({ "course_id": { "$in": courses } }))
            }
        };
        CrudService::new(self.db).list::<Assignment>(&params).await
    }

    pub async fn get(&self, user: &AuthUser, id: Uuid) -> Result<Assignment, ApiError> {
        let assignment = Repository::<Assignment>::get(self.db.pool(), id).await?;
        match user.role {
            Role::Admin => {}
            Role::Faculty => self.ensure_teaches(user, &assignment).await?,
            Role::Student => {
                let student = PeopleService::new(self.db).current_student(user).await?;
                if !CourseService::new(self.db).is_enrolled(assignment.course_id, student.id).await? {
                    return Err(ApiError::forbidden("You are not enrolled in this course."));
                }
            }
        }
        Ok(assignment)
    }

    pub async fn update(&self, user: &AuthUser, id: Uuid, input: &UpdateAssignment) -> Result<Assignment, ApiError> {
        let assignment = Repository::<Assignment>::get(self.db.pool(), id).await?;
        self.ensure_teaches(user, &assignment).await?;
        let changes = input.changes();
        if changes.is_empty() {
            return Err(ApiError::bad_request("At least one field must be provided for update."));
        }
        Ok(Repository::<Assignment>::update(self.db.pool(), id, changes).await?)
    }

    pub async fn delete(&self, user: &AuthUser, id: Uuid) -> Result<Assignment, ApiError> {
        let assignment = Repository::<Assignment>::get(self.db.pool(), id).await?;
        self.ensure_teaches(user, &assignment).await?;
        CrudService::new(self.db).soft_delete::<Assignment>(id).await
    }

    pub async fn statistics(&self, user: &AuthUser, id: Uuid) -> Result<AssignmentStatistics, ApiError> {
        let assignment = Repository::<Assignment>::get(self.db.pool(), id).await?;
        if !user.is(Role::Admin) {
            self.ensure_teaches(user, &assignment).await?;
        }
        Ok(sqlx::query_as::<_, AssignmentStatistics>(
            "SELECT COUNT(*) AS total_submissions, \
                    COUNT(*) FILTER (WHERE status = 'GRADED') AS graded_submissions, \
                    COUNT(*) FILTER (WHERE status <> 'GRADED') AS pending_submissions, \
                    COUNT(*) FILTER (WHERE is_late) AS late_submissions, \
                    ROUND(AVG(marks_awarded), 2) AS average_marks \
             FROM submissions WHERE assignment_id = $1",
        )
        .bind(id)
        .fetch_one(self.db.pool())
        .await?)
    }

    pub async fn submit(&self, user: &AuthUser, input: &CreateSubmission) -> Result<Submission, ApiError> {
        let student = PeopleService::new(self.db).current_student(user).await?;
        let assignment = Repository::<Assignment>::find(self.db.pool(), input.assignment_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Assignment not found."))?;
        if !CourseService::new(self.db).is_enrolled(assignment.course_id, student.id).await? {
            return Err(ApiError::forbidden("You are not enrolled in this course."));
        }
        let existing = Repository::<Submission>::find_by(
            self.db.pool(),
            json!({ "assignment_id": assignment.id.to_string(), "student_id": student.id.to_string() }),
        )
        .await?;
        if existing.is_some() {
            return Err(ApiError::conflict("You have already submitted this assignment."));
        }

        let now = Utc::now();
        let mut changes = input.changes();
        changes.push(("student_id", SqlValue::Uuid(student.id)));
        changes.push(("is_late", SqlValue::Bool(now > assignment.due_date)));
        changes.push(("submitted_at", SqlValue::Timestamp(now)));
        let submission = Repository::<Submission>::insert(self.db.pool(), changes).await?;
        tracing::info!(submission_id = %submission.id, late = submission.is_late, "Received submission");
        Ok(submission)
    }

    pub async fn submissions_for(&self, user: &AuthUser, params: ListParams) -> Result<Page<Submission>, ApiError> {
        let assignment_id = params
            .filters
            .iter()
            .find(|(column, _)| *column == "assignment_id")
            .and_then(|(_, value)| value.as_str())
            .and_then(|raw| Uuid::parse_str(raw).ok())
            .ok_or_else(|| ApiError::bad_request("assignmentId is required."))?;
        let assignment = Repository::<Assignment>::get(self.db.pool(), assignment_id).await?;
        if !user.is(Role::Admin) {
            self.ensure_teaches(user, &assignment).await?;
        }
        CrudService::new(self.db).list::<Submission>(&params).await
    }

    pub async fn my_submissions(&self, user: &AuthUser, params: ListParams) -> Result<Page<Submission>, ApiError> {
        let student = PeopleService::new(self.db).current_student(user).await?;
        let params = params.with_scope(json!({ "student_id": student.id.to_string() }));
        CrudService::new(self.db).list::<Submission>(&params).await
    }

    pub async fn submission(&self, user: &AuthUser, id: Uuid) -> Result<Submission, ApiError> {
        let submission = Repository::<Submission>::get(self.db.pool(), id).await?;
        match user.role {
            Role::Admin => {}
            Role::Student => {
                self.own_submission(user, &submission).await?;
            }
            Role::Faculty => {
                let assignment = Repository::<Assignment>::get(self.db.pool(), submission.assignment_id).await?;
                self.ensure_teaches(user, &assignment).await?;
            }
        }
        Ok(submission)
    }

    pub async fn update_submission(
        &self,
        user: &AuthUser,
        id: Uuid,
        input: &UpdateSubmission,
    ) -> Result<Submission, ApiError> {
        let submission = Repository::<Submission>::get(self.db.pool(), id).await?;
        self.own_submission(user, &submission).await?;
        if submission.is_graded() {
            return Err(ApiError::bad_request("Cannot update a graded submission."));
        }
        let mut changes = input.changes();
        if changes.is_empty() {
            return Err(ApiError::bad_request("At least one field must be provided for update."));
        }

        let content = resulting_text(&changes, "content", submission.content.clone());
        let file_path = resulting_text(&changes, "file_path", submission.file_path.clone());
        if content.is_none() && file_path.is_none() {
            return Err(ApiError::bad_request("Submission must have either content or a file."));
        }

        let assignment = Repository::<Assignment>::get(self.db.pool(), submission.assignment_id).await?;
        let now = Utc::now();
        changes.push(("is_late", SqlValue::Bool(now > assignment.due_date)));
        changes.push(("submitted_at", SqlValue::Timestamp(now)));
        Ok(Repository::<Submission>::update(self.db.pool(), id, changes).await?)
    }

    pub async fn delete_submission(&self, user: &AuthUser, id: Uuid) -> Result<(), ApiError> {
        let submission = Repository::<Submission>::get(self.db.pool(), id).await?;
        self.own_submission(user, &submission).await?;
        if submission.is_graded() {
            return Err(ApiError::bad_request("Cannot delete a graded submission."));
        }
        Repository::<Submission>::hard_delete(self.db.pool(), id).await?;
        Ok(())
    }

    pub async fn grade(&self, user: &AuthUser, id: Uuid, input: &GradeSubmission) -> Result<Submission, ApiError> {
        let submission = Repository::<Submission>::get(self.db.pool(), id).await?;
        let assignment = Repository::<Assignment>::get(self.db.pool(), submission.assignment_id).await?;
        self.ensure_teaches(user, &assignment).await?;
        input.validate(assignment.total_marks)?;

        let graded = Repository::<Submission>::update(self.db.pool(), id, input.changes(Utc::now())).await?;
        tracing::info!(submission_id = %id, marks = %input.marks_awarded, "Graded submission");
        Ok(graded)
    }

    async fn ensure_teaches(&self, user: &AuthUser, assignment: &Assignment) -> Result<(), ApiError> {
        let faculty = PeopleService::new(self.db).current_faculty(user).await?;
        let course = Repository::<Course>::get(self.db.pool(), assignment.course_id).await?;
        if assignment.faculty_id != faculty.id && course.faculty_id != faculty.id {
            return Err(ApiError::forbidden("You are not assigned to teach this course."));
        }
        Ok(())
    }

    async fn own_submission(&self, user: &AuthUser, submission: &Submission) -> Result<(), ApiError> {
        let student = PeopleService::new(self.db).current_student(user).await?;
        if submission.student_id != student.id {
            return Err(ApiError::forbidden("You can only access your own submissions."));
        }
        Ok(())
    }
}

async fn enrolled_course_ids(db: &Database, student_id: Uuid) -> Result<Vec<Value>, ApiError> {
    let ids: Vec<Uuid> = sqlx::query_scalar("SELECT course_id FROM student_enrollments WHERE student_id = $1")
        .bind(student_id)
        .fetch_all(db.pool())
        .await?;
    Ok(ids.into_iter().map(|id| Value::String(id.to_string())).collect())
}

/// Value a text column will hold once `changes` are applied
fn resulting_text(changes: &[(&'static str, SqlValue)], column: &str, current: Option<String>) -> Option<String> {
    match changes.iter().find(|(name, _)| *name == column) {
        Some((_, SqlValue::Text(text))) => Some(text.clone()),
        Some(_) => None,
        None => current,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::ColumnKind;

    #[test]
    fn cleared_fields_do_not_count_as_content() {
        let changes = vec![
            ("content", SqlValue::Null(ColumnKind::Text)),
            ("file_path", SqlValue::text("https://res.cloudinary.com/x.pdf")),
        ];
        assert_eq!(resulting_text(&changes, "content", Some("draft".into())), None);
        assert_eq!(
            resulting_text(&changes, "file_path", None).as_deref(),
            Some("https://res.cloudinary.com/x.pdf")
        );
        assert_eq!(resulting_text(&[], "content", Some("draft".into())).as_deref(), Some("draft"));
    }
}
