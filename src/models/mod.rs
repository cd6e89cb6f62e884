pub mod enums;
pub mod validate;

pub mod academic_year;
pub mod assignment;
pub mod attendance;
pub mod certificate;
pub mod college;
pub mod course;
pub mod department;
pub mod division;
pub mod exam;
pub mod exam_result;
pub mod faculty;
pub mod internship;
pub mod semester;
pub mod student;
pub mod subject;
pub mod submission;
pub mod user;

use serde::de::DeserializeOwned;

use crate::database::{Changes, Resource};
use crate::error::ApiError;

pub use academic_year::AcademicYear;
pub use assignment::Assignment;
pub use attendance::Attendance;
pub use certificate::Certificate;
pub use college::College;
pub use course::Course;
pub use department::Department;
pub use division::Division;
pub use enums::*;
pub use exam::Exam;
pub use exam_result::{ExamResult, SubjectResult};
pub use faculty::Faculty;
pub use internship::Internship;
pub use semester::Semester;
pub use student::Student;
pub use subject::Subject;
pub use submission::Submission;
pub use user::User;

/// Validated client input that maps onto table columns.
pub trait Changeset {
    fn validate(&self) -> Result<(), ApiError>;
    fn changes(&self) -> Changes;
}

/// Resources created straight from a request body.
pub trait Creatable: Resource {
    type Create: DeserializeOwned + Changeset + Send + Sync + 'static;
}

/// Resources updated straight from a request body.
pub trait Editable: Resource {
    type Update: DeserializeOwned + Changeset + Send + Sync + 'static;
}
