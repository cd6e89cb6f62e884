use anyhow::Result;
use serde_json::{json, Value};
use uuid::Uuid;

use trackademy_api::auth::{generate_jwt, Claims};
use trackademy_api::database::{Database, Repository};
use trackademy_api::models::faculty::CreateFaculty;
use trackademy_api::models::student::CreateStudent;
use trackademy_api::models::{
    AcademicYear, Changeset, College, Course, Creatable, Department, Designation, Division, Faculty, Role, Semester,
    Student, Subject,
};
use trackademy_api::services::people::PeopleService;
use trackademy_api::upload::service::upsert_academic_year;

pub const PASSWORD: &str = "Campus@2025";

/// Upper-case prefix plus eight random hex digits
pub fn unique(prefix: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{}{}", prefix, &id[..8]).to_uppercase()
}

/// `YYYY-YYYY` label no other test is likely to use
pub fn unique_year() -> String {
    let first = 2100 + (Uuid::new_v4().as_u128() % 7000) as i32;
    format!("{}-{}", first, first + 1)
}

pub fn bearer_for(user_id: Uuid, role: Role) -> String {
    let claims = Claims::new(user_id, format!("{}@tests.local", user_id.simple()), role);
    format!("Bearer {}", generate_jwt(&claims).expect("token"))
}

pub async fn insert<T: Creatable>(db: &Database, body: Value) -> Result<T> {
    let input: T::Create = serde_json::from_value(body)?;
    input.validate()?;
    Ok(Repository::<T>::insert(db.pool(), input.changes()).await?)
}

/// One college with a semester-5 division, a theory course and its teacher,
/// and one student of the division enrolled in nothing yet
pub struct Campus {
    pub college: College,
    pub department: Department,
    pub year: AcademicYear,
    pub semester: Semester,
    pub division: Division,
    pub subject: Subject,
    pub faculty: Faculty,
    pub student: Student,
    pub course: Course,
}

impl Campus {
    pub async fn create(db: &Database) -> Result<Self> {
        let tag = unique("T");
        let college: College =
            insert(db, json!({ "name": format!("Institute {tag}"), "abbreviation": tag.clone() })).await?;
        let department: Department = insert(
            db,
            json!({ "name": "Computer Engineering", "abbreviation": "CE", "collegeId": college.id }),
        )
        .await?;
        let year = upsert_academic_year(db.pool(), college.id, &unique_year()).await?;
        let semester: Semester = insert(
            db,
            json!({
                "semesterNumber": 5,
                "semesterType": "ODD",
                "departmentId": department.id,
                "academicYearId": year.id,
            }),
        )
        .await?;
        let division: Division = insert(db, json!({ "name": "A", "semesterId": semester.id })).await?;
        let subject: Subject = insert(
            db,
            json!({
                "name": "Database Management Systems",
                "abbreviation": "DBMS",
                "code": format!("S{}", &tag[1..]),
                "semesterNumber": 5,
                "departmentId": department.id,
            }),
        )
        .await?;

        let faculty = PeopleService::new(db)
            .create_faculty(&CreateFaculty {
                email: format!("{}@faculty.tests.local", tag.to_lowercase()),
                password: PASSWORD.into(),
                full_name: "Kiran Patel".into(),
                abbreviation: Some("KBP".into()),
                designation: Designation::Professor,
                joining_date: None,
                department_id: department.id,
            })
            .await?;
        let course: Course = insert(
            db,
            json!({
                "subjectId": subject.id,
                "facultyId": faculty.id,
                "semesterId": semester.id,
                "divisionId": division.id,
                "lectureType": "THEORY",
            }),
        )
        .await?;

        let student = student_in(db, &division, &semester).await?;
        Ok(Self { college, department, year, semester, division, subject, faculty, student, course })
    }

    /// Another student in the same division
    pub async fn add_student(&self, db: &Database) -> Result<Student> {
        student_in(db, &self.division, &self.semester).await
    }

    pub async fn enroll(&self, db: &Database, student: &Student) -> Result<()> {
        sqlx::query("INSERT INTO student_enrollments (id, student_id, course_id) VALUES ($1, $2, $3)")
            .bind(Uuid::new_v4())
            .bind(student.id)
            .bind(self.course.id)
            .execute(db.pool())
            .await?;
        Ok(())
    }

    pub fn faculty_bearer(&self) -> String {
        bearer_for(self.faculty.user_id, Role::Faculty)
    }

    pub fn student_bearer(&self) -> String {
        bearer_for(self.student.user_id, Role::Student)
    }
}

async fn student_in(db: &Database, division: &Division, semester: &Semester) -> Result<Student> {
    let enrollment_number = unique("EN");
    Ok(PeopleService::new(db)
        .create_student(&CreateStudent {
            email: format!("{}@students.tests.local", enrollment_number.to_lowercase()),
            password: PASSWORD.into(),
            full_name: format!("Student {enrollment_number}"),
            enrollment_number,
            batch: "A1".into(),
            department_id: semester.department_id,
            semester_id: semester.id,
            division_id: division.id,
        })
        .await?)
}
