use chrono::NaiveDate;
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

use super::sheet::parse_date_text;
use super::UploadError;
use crate::models::validate::{blank_to_none, is_academic_year};
use crate::models::{ExamType, LectureType, SemesterType};

/// Text fields sent alongside the workbook in a multipart upload
#[derive(Debug, Clone, Default)]
pub struct FormFields(HashMap<String, String>);

impl FormFields {
    pub fn new(fields: HashMap<String, String>) -> Self {
        Self(fields)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn optional(&self, name: &str) -> Option<String> {
        blank_to_none(self.0.get(name).map(String::as_str))
    }

    pub fn required(&self, name: &'static str) -> Result<String, UploadError> {
        self.optional(name).ok_or(UploadError::Field(name))
    }

    pub fn parsed<T: FromStr>(&self, name: &'static str) -> Result<T, UploadError> {
        self.required(name)?.parse().map_err(|_| UploadError::Field(name))
    }

    /// Enum labels are accepted in any case
    fn label<T: FromStr>(&self, name: &'static str) -> Result<T, UploadError> {
        self.required(name)?.to_ascii_uppercase().parse().map_err(|_| UploadError::Field(name))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatrixForm {
    pub academic_year: String,
    pub semester_type: SemesterType,
    pub department_id: Uuid,
}

impl MatrixForm {
    pub fn parse(fields: &FormFields) -> Result<Self, UploadError> {
        let academic_year = fields.required("academicYear")?;
        if !is_academic_year(&academic_year) {
            return Err(UploadError::Field("academicYear"));
        }
        Ok(Self {
            academic_year,
            semester_type: fields.label("semesterType")?,
            department_id: fields.parsed("departmentId")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultsForm {
    pub exam_name: Option<String>,
    pub exam_type: ExamType,
    pub academic_year_id: Uuid,
    pub department_id: Uuid,
    pub semester_number: i32,
}

impl ResultsForm {
    pub fn parse(fields: &FormFields) -> Result<Self, UploadError> {
        Ok(Self {
            exam_name: fields.optional("examName"),
            exam_type: fields.label("examType")?,
            academic_year_id: fields.parsed("academicYearId")?,
            department_id: fields.parsed("departmentId")?,
            semester_number: semester_number(fields)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceForm {
    pub academic_year_id: Uuid,
    pub department_id: Uuid,
    pub semester_number: i32,
    pub division_id: Uuid,
    pub subject_id: Uuid,
    pub lecture_type: LectureType,
    pub batch: Option<String>,
    pub date: NaiveDate,
}

impl AttendanceForm {
    pub fn parse(fields: &FormFields) -> Result<Self, UploadError> {
        let lecture_type: LectureType = fields.label("lectureType")?;
        let batch = fields.optional("batch");
        if lecture_type == LectureType::Practical && batch.is_none() {
            return Err(UploadError::Field("batch"));
        }
        let date = parse_date_text(&fields.required("date")?).ok_or(UploadError::Field("date"))?;

        Ok(Self {
            academic_year_id: fields.parsed("academicYearId")?,
            department_id: fields.parsed("departmentId")?,
            semester_number: semester_number(fields)?,
            division_id: fields.parsed("divisionId")?,
            subject_id: fields.parsed("subjectId")?,
            lecture_type,
            batch: if lecture_type == LectureType::Practical { batch } else { None },
            date,
        })
    }
}

fn semester_number(fields: &FormFields) -> Result<i32, UploadError> {
    let number: i32 = fields.parsed("semesterNumber")?;
    if (1..=12).contains(&number) {
        Ok(number)
    } else {
        Err(UploadError::Field("semesterNumber"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> FormFields {
        let mut form = FormFields::default();
        for (name, value) in pairs {
            form.insert(*name, *value);
        }
        form
    }

    #[test]
    fn matrix_form_checks_year_format() {
        let id = Uuid::new_v4().to_string();
        let form = MatrixForm::parse(&fields(&[
            ("academicYear", "2025-2026"),
            ("semesterType", "odd"),
            ("departmentId", &id),
        ]))
        .unwrap();
        assert_eq!(form.semester_type, SemesterType::Odd);

        let err = MatrixForm::parse(&fields(&[("academicYear", "2025"), ("semesterType", "ODD"), ("departmentId", &id)]))
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing or invalid form field 'academicYear'.");
    }

    #[test]
    fn results_form_treats_blank_exam_name_as_missing() {
        let id = Uuid::new_v4().to_string();
        let form = ResultsForm::parse(&fields(&[
            ("examName", "  "),
            ("examType", "FINAL"),
            ("academicYearId", &id),
            ("departmentId", &id),
            ("semesterNumber", "5"),
        ]))
        .unwrap();
        assert_eq!(form.exam_name, None);
        assert_eq!(form.exam_type, ExamType::Final);
    }

    #[test]
    fn attendance_form_reads_day_first_dates_and_requires_lab_batch() {
        let id = Uuid::new_v4().to_string();
        let mut pairs = vec![
            ("academicYearId", id.as_str()),
            ("departmentId", id.as_str()),
            ("semesterNumber", "3"),
            ("divisionId", id.as_str()),
            ("subjectId", id.as_str()),
            ("lectureType", "THEORY"),
            ("batch", "A1"),
            ("date", "14-08-2025"),
        ];
        let form = AttendanceForm::parse(&fields(&pairs)).unwrap();
        assert_eq!(form.date, NaiveDate::from_ymd_opt(2025, 8, 14).unwrap());
        assert_eq!(form.batch, None);

        pairs[5] = ("lectureType", "PRACTICAL");
        pairs[6] = ("batch", "");
        assert!(matches!(AttendanceForm::parse(&fields(&pairs)), Err(UploadError::Field("batch"))));
    }
}
