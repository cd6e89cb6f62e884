use calamine::{Data, Range};
use serde_json::json;
use sqlx::PgExecutor;
use std::collections::HashMap;
use uuid::Uuid;

use super::forms::{AttendanceForm, MatrixForm, ResultsForm};
use super::matrix::{self, Allocation, MatrixScope};
use super::results::parse_results;
use super::rows::{AttendanceRow, FacultyRow, StudentRow, SubjectRow};
use super::{describe, sheet, ImportSummary, Tally};
use crate::auth::generate_random_password;
use crate::database::{Database, Repository, Resource};
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::models::academic_year::CreateAcademicYear;
use crate::models::exam_result::{CreateExamResult, SubjectGrade};
use crate::models::faculty::CreateFaculty;
use crate::models::student::CreateStudent;
use crate::models::subject::CreateSubject;
use crate::models::{
    AcademicYear, Changeset, College, Course, Department, Division, Faculty, ResultStatus, Semester, SemesterType,
    Student, Subject,
};
use crate::services::attendance::upsert as upsert_attendance;
use crate::services::exam::ExamService;
use crate::services::exam_result::ExamResultService;
use crate::services::mail::Mailer;
use crate::services::people::PeopleService;
use crate::services::processing::ProcessingClient;

const GENERATED_PASSWORD_LENGTH: usize = 12;

/// Spreadsheet imports of master data, results and attendance
pub struct UploadService<'a> {
    db: &'a Database,
    mailer: &'a dyn Mailer,
}

/// (email, full name, generated password) of an account created by an import
type Welcome = (String, String, String);

impl<'a> UploadService<'a> {
    pub fn new(db: &'a Database, mailer: &'a dyn Mailer) -> Self {
        Self { db, mailer }
    }

    pub async fn faculty(&self, bytes: &[u8]) -> Result<ImportSummary, ApiError> {
        let range = sheet::first_sheet(bytes)?;
        let mut tally = Tally::default();
        let rows = collect_rows(&range, FacultyRow::parse, &mut tally);
        self.faculty_rows(rows, tally).await
    }

    /// Create faculty accounts from parsed sheet rows and mail their credentials
    pub async fn faculty_rows(&self, rows: Vec<(usize, FacultyRow)>, mut tally: Tally) -> Result<ImportSummary, ApiError> {
        let colleges: HashMap<String, Uuid> =
            live::<College>(self.db, json!({})).await?.into_iter().map(|c| (c.abbreviation.to_uppercase(), c.id)).collect();
        let college_ids: Vec<String> = colleges.values().map(Uuid::to_string).collect();
        let departments: HashMap<(Uuid, String), Uuid> =
            live::<Department>(self.db, json!({ "college_id": { "$in": college_ids } }))
                .await?
                .into_iter()
                .map(|d| ((d.college_id, d.name.to_lowercase()), d.id))
                .collect();

        let people = PeopleService::new(self.db);
        let mut welcomes = Vec::new();
        for (row_number, row) in rows {
            let Some(&college_id) = colleges.get(&row.college.to_uppercase()) else {
                tally.skip(row_number, format!("college '{}' not found", row.college));
                continue;
            };
            let Some(&department_id) = departments.get(&(college_id, row.department.to_lowercase())) else {
                tally.skip(row_number, format!("department '{}' not found in {}", row.department, row.college));
                continue;
            };

            let input = CreateFaculty {
                email: row.email,
                password: generate_random_password(GENERATED_PASSWORD_LENGTH),
                full_name: row.full_name,
                abbreviation: row.abbreviation,
                designation: row.designation,
                joining_date: row.joining_date,
                department_id,
            };
            if let Err(err) = input.validate() {
                tally.skip(row_number, describe(&err));
                continue;
            }
            match people.create_faculty(&input).await {
                Ok(_) => {
                    tally.created();
                    welcomes.push((input.email, input.full_name, input.password));
                }
                Err(err) => skip_or_fail(&mut tally, row_number, err)?,
            }
        }

        self.send_welcomes(welcomes).await;
        Ok(tally.finish("Faculty data"))
    }

    pub async fn students(&self, bytes: &[u8]) -> Result<ImportSummary, ApiError> {
        let range = sheet::first_sheet(bytes)?;
        let mut tally = Tally::default();
        let rows = collect_rows(&range, StudentRow::parse, &mut tally);
        self.student_rows(rows, tally).await
    }

    /// Create student accounts in the default college, creating or reviving
    /// the academic years, semesters and divisions the rows name
    pub async fn student_rows(&self, rows: Vec<(usize, StudentRow)>, mut tally: Tally) -> Result<ImportSummary, ApiError> {
        let college = default_college(self.db).await?;
        let departments: HashMap<String, Uuid> =
            live::<Department>(self.db, json!({ "college_id": college.id.to_string() }))
                .await?
                .into_iter()
                .map(|d| (d.abbreviation.to_uppercase(), d.id))
                .collect();
        let mut years: HashMap<String, Uuid> = HashMap::new();
        let mut semesters: HashMap<(Uuid, Uuid, i32), Uuid> = HashMap::new();
        let mut divisions: HashMap<(Uuid, String), Uuid> = HashMap::new();

        let people = PeopleService::new(self.db);
        let mut welcomes = Vec::new();
        for (row_number, row) in rows {
            let Some(&department_id) = departments.get(&row.department.to_uppercase()) else {
                tally.skip(row_number, format!("department '{}' not found in {}", row.department, college.abbreviation));
                continue;
            };

            let academic_year_id = match years.get(&row.academic_year) {
                Some(id) => *id,
                None => match upsert_academic_year(self.db.pool(), college.id, &row.academic_year).await {
                    Ok(year) => {
                        tracing::debug!(year = %year.year, college = %college.abbreviation, "Academic year ready for import");
                        years.insert(year.year.clone(), year.id);
                        year.id
                    }
                    Err(err) => {
                        skip_or_fail(&mut tally, row_number, err)?;
                        continue;
                    }
                },
            };

            let semester_key = (academic_year_id, department_id, row.semester_number);
            let semester_id = match semesters.get(&semester_key) {
                Some(id) => *id,
                None => match upsert_semester(self.db.pool(), academic_year_id, department_id, row.semester_number).await {
                    Ok(semester) => {
                        semesters.insert(semester_key, semester.id);
                        semester.id
                    }
                    Err(err) => {
                        skip_or_fail(&mut tally, row_number, err)?;
                        continue;
                    }
                },
            };

            let division_key = (semester_id, row.division.to_uppercase());
            let division_id = match divisions.get(&division_key) {
                Some(id) => *id,
                None => match upsert_division(self.db.pool(), semester_id, &row.division).await {
                    Ok(division) => {
                        divisions.insert(division_key, division.id);
                        division.id
                    }
                    Err(err) => {
                        skip_or_fail(&mut tally, row_number, err)?;
                        continue;
                    }
                },
            };

            let input = CreateStudent {
                email: row.email,
                password: generate_random_password(GENERATED_PASSWORD_LENGTH),
                full_name: row.full_name,
                enrollment_number: row.enrollment_number,
                batch: row.batch,
                department_id,
                semester_id,
                division_id,
            };
            if let Err(err) = input.validate() {
                tally.skip(row_number, describe(&err));
                continue;
            }
            match people.create_student(&input).await {
                Ok(_) => {
                    tally.created();
                    welcomes.push((input.email, input.full_name, input.password));
                }
                Err(err) => skip_or_fail(&mut tally, row_number, err)?,
            }
        }

        self.send_welcomes(welcomes).await;
        Ok(tally.finish("Student data"))
    }

    pub async fn subjects(&self, bytes: &[u8]) -> Result<ImportSummary, ApiError> {
        let range = sheet::first_sheet(bytes)?;
        let mut tally = Tally::default();
        let rows = collect_rows(&range, SubjectRow::parse, &mut tally);

        let mut departments: HashMap<String, Uuid> = HashMap::new();
        for department in live::<Department>(self.db, json!({})).await? {
            departments.entry(department.abbreviation.to_uppercase()).or_insert(department.id);
        }

        for (row_number, row) in rows {
            let Some(&department_id) = departments.get(&row.department.to_uppercase()) else {
                tally.skip(row_number, format!("department '{}' not found", row.department));
                continue;
            };
            let input = CreateSubject {
                name: row.name,
                abbreviation: row.abbreviation,
                code: row.code,
                subject_type: row.subject_type,
                semester_number: row.semester_number,
                department_id,
            };
            if let Err(err) = input.validate() {
                tally.skip(row_number, describe(&err));
                continue;
            }
            match Repository::<Subject>::insert(self.db.pool(), input.changes()).await {
                Ok(_) => tally.created(),
                Err(err) => skip_or_fail(&mut tally, row_number, err.into())?,
            }
        }

        Ok(tally.finish("Subject data"))
    }

    /// Forward the matrix to the processing service and create the courses it allocates
    pub async fn faculty_matrix(
        &self,
        processing: &ProcessingClient,
        form: &MatrixForm,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<ImportSummary, ApiError> {
        let department = Repository::<Department>::find(self.db.pool(), form.department_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Department not found."))?;
        let college = Repository::<College>::get(self.db.pool(), department.college_id).await?;
        let year = Repository::<AcademicYear>::find_by(
            self.db.pool(),
            json!({ "college_id": college.id.to_string(), "year": form.academic_year }),
        )
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Academic year {} not found.", form.academic_year)))?;

        let fields = [
            ("deptAbbreviation", department.abbreviation.clone()),
            ("collegeAbbreviation", college.abbreviation.clone()),
        ];
        let reply = processing.faculty_matrix(file_name, bytes, &fields).await?;

        let allocations = match matrix::allocations(&reply, &college.abbreviation, &department.abbreviation)? {
            MatrixScope::Found(found) => found,
            MatrixScope::MissingCollege => {
                return Ok(empty_summary(format!("College {} was not found in the faculty matrix.", college.abbreviation)))
            }
            MatrixScope::MissingDepartment => {
                return Ok(empty_summary(format!(
                    "Department {} was not found in the faculty matrix.",
                    department.abbreviation
                )))
            }
        };

        let department_filter = json!({ "department_id": department.id.to_string() });
        let subjects: HashMap<String, Uuid> = live::<Subject>(self.db, department_filter.clone())
            .await?
            .into_iter()
            .map(|s| (s.abbreviation.to_uppercase(), s.id))
            .collect();
        let faculties: HashMap<String, Uuid> = live::<Faculty>(self.db, department_filter)
            .await?
            .into_iter()
            .filter_map(|f| f.abbreviation.map(|a| (a.to_uppercase(), f.id)))
            .collect();

        let mut tally = Tally::default();
        let mut semesters: HashMap<i32, Uuid> = HashMap::new();
        let mut divisions: HashMap<(Uuid, String), Uuid> = HashMap::new();
        for allocation in &allocations {
            let entry = describe_allocation(allocation);
            if SemesterType::for_number(allocation.semester_number) != form.semester_type {
                tally.skip_entry(&entry, format!("semester is not in the {} term", form.semester_type));
                continue;
            }
            let Some(&subject_id) = subjects.get(&allocation.subject.to_uppercase()) else {
                tally.skip_entry(&entry, format!("subject '{}' not found", allocation.subject));
                continue;
            };
            let Some(&faculty_id) = faculties.get(&allocation.faculty.to_uppercase()) else {
                tally.skip_entry(&entry, format!("faculty '{}' not found", allocation.faculty));
                continue;
            };

            let semester_id = match semesters.get(&allocation.semester_number) {
                Some(id) => *id,
                None => match upsert_semester(self.db.pool(), year.id, department.id, allocation.semester_number).await {
                    Ok(semester) => {
                        semesters.insert(allocation.semester_number, semester.id);
                        semester.id
                    }
                    Err(err) => {
                        skip_entry_or_fail(&mut tally, &entry, err)?;
                        continue;
                    }
                },
            };
            let division_key = (semester_id, allocation.division.to_uppercase());
            let division_id = match divisions.get(&division_key) {
                Some(id) => *id,
                None => match upsert_division(self.db.pool(), semester_id, &allocation.division).await {
                    Ok(division) => {
                        divisions.insert(division_key, division.id);
                        division.id
                    }
                    Err(err) => {
                        skip_entry_or_fail(&mut tally, &entry, err)?;
                        continue;
                    }
                },
            };

            let inserted = sqlx::query(
                "INSERT INTO courses (id, subject_id, faculty_id, semester_id, division_id, lecture_type, batch) \
                 VALUES ($1, $2, $3, $4, $5, $6::lecture_type, $7) \
                 ON CONFLICT DO NOTHING",
            )
            .bind(Uuid::new_v4())
            .bind(subject_id)
            .bind(faculty_id)
            .bind(semester_id)
            .bind(division_id)
            .bind(allocation.lecture_type.as_str())
            .bind(allocation.batch.as_deref())
            .execute(self.db.pool())
            .await;

            match inserted.map(|done| done.rows_affected()) {
                Ok(0) => tally.skip_entry(&entry, "course already exists"),
                Ok(count) => tally.add_created(count as usize),
                Err(err) => skip_entry_or_fail(&mut tally, &entry, err.into())?,
            }
        }

        Ok(tally.finish("Faculty matrix"))
    }

    pub async fn results(&self, form: &ResultsForm, bytes: &[u8]) -> Result<ImportSummary, ApiError> {
        let range = sheet::first_sheet(bytes)?;
        let (rows, rejected) = parse_results(&range)?;

        let semester = find_semester(self.db, form.academic_year_id, form.department_id, form.semester_number).await?;
        let exam = ExamService::new(self.db)
            .find_or_create(semester.id, form.exam_type, form.exam_name.as_deref())
            .await?;

        let subjects: HashMap<String, Uuid> =
            live::<Subject>(self.db, json!({ "department_id": form.department_id.to_string() }))
                .await?
                .into_iter()
                .map(|s| (s.code.to_uppercase(), s.id))
                .collect();
        let enrollments: Vec<&str> = rows.iter().map(|r| r.enrollment_number.as_str()).collect();
        let students = students_by_enrollment(self.db, &enrollments).await?;

        let mut tally = Tally::default();
        for (row_number, reason) in rejected {
            tally.skip(row_number, reason);
        }

        let service = ExamResultService::new(self.db);
        for row in rows {
            let grades = row
                .grades
                .iter()
                .filter_map(|(code, grade)| {
                    subjects
                        .get(code)
                        .map(|subject_id| SubjectGrade { subject_id: *subject_id, grade: grade.clone() })
                })
                .collect();
            let input = CreateExamResult {
                exam_id: exam.id,
                student_id: students.get(&row.enrollment_number).copied(),
                student_enrollment_number: row.enrollment_number.clone(),
                spi: row.spi,
                cpi: row.cpi,
                status: if row.passed() { ResultStatus::Pass } else { ResultStatus::Fail },
                results: grades,
            };
            match service.create(&input).await {
                Ok(_) => tally.created(),
                Err(err) => skip_or_fail(&mut tally, row.row_number, err)?,
            }
        }

        Ok(tally.finish("Exam results"))
    }

    pub async fn attendance(&self, form: &AttendanceForm, bytes: &[u8]) -> Result<ImportSummary, ApiError> {
        let range = sheet::first_sheet(bytes)?;
        let mut tally = Tally::default();
        let rows = collect_rows(&range, AttendanceRow::parse, &mut tally);

        let semester = find_semester(self.db, form.academic_year_id, form.department_id, form.semester_number).await?;
        let course = Repository::<Course>::find_by(
            self.db.pool(),
            json!({
                "subject_id": form.subject_id.to_string(),
                "semester_id": semester.id.to_string(),
                "division_id": form.division_id.to_string(),
                "lecture_type": form.lecture_type.as_str(),
                "batch": form.batch,
            }),
        )
        .await?
        .ok_or_else(|| ApiError::not_found("Course not found."))?;

        let enrollments: Vec<&str> = rows.iter().map(|(_, r)| r.enrollment_number.as_str()).collect();
        let students = students_by_enrollment(self.db, &enrollments).await?;

        for (row_number, row) in rows {
            let Some(&student_id) = students.get(&row.enrollment_number) else {
                tally.skip(row_number, format!("student '{}' not found", row.enrollment_number));
                continue;
            };
            match upsert_attendance(self.db.pool(), student_id, course.id, form.date, row.status).await {
                Ok(_) => tally.created(),
                Err(err) => skip_or_fail(&mut tally, row_number, err)?,
            }
        }

        tracing::info!(course_id = %course.id, date = %form.date, "Imported attendance sheet");
        Ok(tally.finish("Attendance"))
    }

    /// Mail failures are logged; the accounts already exist
    async fn send_welcomes(&self, welcomes: Vec<Welcome>) {
        for (email, full_name, password) in welcomes {
            if let Err(err) = self.mailer.send_welcome(&email, &full_name, &password).await {
                tracing::warn!(to = %email, "Welcome message failed: {}", err);
            }
        }
    }
}

fn collect_rows<R>(
    range: &Range<Data>,
    parse: fn(&[Data]) -> Result<Option<R>, String>,
    tally: &mut Tally,
) -> Vec<(usize, R)> {
    let mut rows = Vec::new();
    for (row_number, cells) in sheet::data_rows(range) {
        match parse(cells) {
            Ok(Some(row)) => rows.push((row_number, row)),
            Ok(None) => {}
            Err(reason) => tally.skip(row_number, reason),
        }
    }
    rows
}

/// Client errors skip the row; anything else aborts the import
fn skip_or_fail(tally: &mut Tally, row_number: usize, err: ApiError) -> Result<(), ApiError> {
    if err.status_code() >= 500 {
        return Err(err);
    }
    tally.skip(row_number, describe(&err));
    Ok(())
}

fn skip_entry_or_fail(tally: &mut Tally, entry: &str, err: ApiError) -> Result<(), ApiError> {
    if err.status_code() >= 500 {
        return Err(err);
    }
    tally.skip_entry(entry, describe(&err));
    Ok(())
}

fn empty_summary(message: String) -> ImportSummary {
    tracing::warn!("{}", message);
    ImportSummary { message, created_count: 0, skipped_count: 0 }
}

fn describe_allocation(allocation: &Allocation) -> String {
    match &allocation.batch {
        Some(batch) => format!(
            "sem {} div {} {} {} batch {}",
            allocation.semester_number, allocation.division, allocation.subject, allocation.lecture_type, batch
        ),
        None => format!(
            "sem {} div {} {} {}",
            allocation.semester_number, allocation.division, allocation.subject, allocation.lecture_type
        ),
    }
}

async fn live<T: Resource>(db: &Database, where_clause: serde_json::Value) -> Result<Vec<T>, ApiError> {
    let filter = FilterData { where_clause: Some(where_clause), ..Default::default() };
    Ok(Repository::<T>::select(db.pool(), filter).await?)
}

/// The oldest college receives student imports
async fn default_college(db: &Database) -> Result<College, ApiError> {
    let filter = FilterData { order: Some(json!("created_at asc")), limit: Some(1), ..Default::default() };
    Repository::<College>::select(db.pool(), filter)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::not_found("No college found. Create a college before importing students."))
}

async fn find_semester(
    db: &Database,
    academic_year_id: Uuid,
    department_id: Uuid,
    semester_number: i32,
) -> Result<Semester, ApiError> {
    Repository::<Semester>::find_by(
        db.pool(),
        json!({
            "academic_year_id": academic_year_id.to_string(),
            "department_id": department_id.to_string(),
            "semester_number": semester_number,
        }),
    )
    .await?
    .ok_or_else(|| ApiError::not_found("Semester not found."))
}

async fn students_by_enrollment(db: &Database, enrollments: &[&str]) -> Result<HashMap<String, Uuid>, ApiError> {
    if enrollments.is_empty() {
        return Ok(HashMap::new());
    }
    Ok(live::<Student>(db, json!({ "enrollment_number": { "$in": enrollments } }))
        .await?
        .into_iter()
        .map(|s| (s.enrollment_number, s.id))
        .collect())
}

/// Academic year of a college by its label, revived if it was soft-deleted.
/// Years created here start inactive.
pub async fn upsert_academic_year<'c, E>(executor: E, college_id: Uuid, year: &str) -> Result<AcademicYear, ApiError>
where
    E: PgExecutor<'c>,
{
    let input = CreateAcademicYear { year: year.trim().to_string(), college_id, is_active: false };
    input.validate()?;
    Ok(sqlx::query_as::<_, AcademicYear>(
        "INSERT INTO academic_years (id, year, college_id, is_active) VALUES ($1, $2, $3, false) \
         ON CONFLICT (college_id, year) \
         DO UPDATE SET is_deleted = false, updated_at = now() \
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(input.year)
    .bind(college_id)
    .fetch_one(executor)
    .await?)
}

/// Semester for (year, department, number), revived if it was soft-deleted
pub async fn upsert_semester<'c, E>(
    executor: E,
    academic_year_id: Uuid,
    department_id: Uuid,
    semester_number: i32,
) -> Result<Semester, ApiError>
where
    E: PgExecutor<'c>,
{
    Ok(sqlx::query_as::<_, Semester>(
        "INSERT INTO semesters (id, semester_number, semester_type, department_id, academic_year_id) \
         VALUES ($1, $2, $3::semester_type, $4, $5) \
         ON CONFLICT (academic_year_id, department_id, semester_number) \
         DO UPDATE SET is_deleted = false, updated_at = now() \
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(semester_number)
    .bind(SemesterType::for_number(semester_number).as_str())
    .bind(department_id)
    .bind(academic_year_id)
    .fetch_one(executor)
    .await?)
}

pub async fn upsert_division<'c, E>(executor: E, semester_id: Uuid, name: &str) -> Result<Division, ApiError>
where
    E: PgExecutor<'c>,
{
    Ok(sqlx::query_as::<_, Division>(
        "INSERT INTO divisions (id, name, semester_id) VALUES ($1, $2, $3) \
         ON CONFLICT (semester_id, name) \
         DO UPDATE SET is_deleted = false, updated_at = now() \
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(name.trim().to_uppercase())
    .bind(semester_id)
    .fetch_one(executor)
    .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LectureType;

    #[test]
    fn allocations_are_described_for_logs() {
        let lab = Allocation {
            semester_number: 5,
            division: "A".into(),
            subject: "DBMS".into(),
            faculty: "KBP".into(),
            lecture_type: LectureType::Practical,
            batch: Some("A1".into()),
        };
        assert_eq!(describe_allocation(&lab), "sem 5 div A DBMS PRACTICAL batch A1");
    }

    #[test]
    fn server_errors_abort_the_import() {
        let mut tally = Tally::default();
        assert!(skip_or_fail(&mut tally, 3, ApiError::conflict("Email already exists.")).is_ok());
        assert!(skip_or_fail(&mut tally, 4, ApiError::internal_server_error("boom")).is_err());
        assert_eq!(tally.finish("Faculty data").skipped_count, 1);
    }

    #[test]
    fn allocation_conflicts_skip_the_entry() {
        let mut tally = Tally::default();
        let entry = "sem 5 div A DBMS THEORY";
        assert!(skip_entry_or_fail(&mut tally, entry, ApiError::conflict("duplicate")).is_ok());
        assert!(skip_entry_or_fail(&mut tally, entry, ApiError::service_unavailable("down")).is_err());
        let summary = tally.finish("Faculty matrix");
        assert_eq!((summary.created_count, summary.skipped_count), (0, 1));
    }
}
