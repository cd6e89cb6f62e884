//! Typed rows of the master-data import sheets.
//!
//! Column 0 is always a serial number. `parse` returns `Ok(None)` for rows
//! whose key columns are both blank and `Err(reason)` for rows to skip.

use calamine::Data;
use chrono::NaiveDate;

use super::sheet::{date, is_truthy, number, opt_text, text};
use crate::models::validate::{is_academic_year, is_email};
use crate::models::{AttendanceStatus, Designation, SubjectType};

#[derive(Debug, Clone, PartialEq)]
pub struct FacultyRow {
    pub full_name: String,
    pub email: String,
    pub abbreviation: Option<String>,
    pub designation: Designation,
    pub department: String,
    pub joining_date: Option<NaiveDate>,
    pub college: String,
}

impl FacultyRow {
    pub fn parse(row: &[Data]) -> Result<Option<Self>, String> {
        let full_name = text(row, 1);
        let email = text(row, 2);
        if full_name.is_empty() && email.is_empty() {
            return Ok(None);
        }
        if full_name.is_empty() {
            return Err("full name is missing".into());
        }
        if !is_email(&email) {
            return Err(format!("'{}' is not a valid email", email));
        }
        let raw_designation = text(row, 4);
        let designation = Designation::from_sheet(&raw_designation)
            .ok_or_else(|| format!("unknown designation '{}'", raw_designation))?;
        let department = required(row, 5, "department")?;
        let college = required(row, 7, "college abbreviation")?;

        Ok(Some(Self {
            full_name,
            email,
            abbreviation: opt_text(row, 3),
            designation,
            department,
            joining_date: date(row, 6),
            college,
        }))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudentRow {
    pub full_name: String,
    pub enrollment_number: String,
    pub department: String,
    pub semester_number: i32,
    pub division: String,
    pub batch: String,
    pub email: String,
    pub academic_year: String,
}

impl StudentRow {
    pub fn parse(row: &[Data]) -> Result<Option<Self>, String> {
        let full_name = text(row, 1);
        let enrollment_number = text(row, 2);
        if full_name.is_empty() && enrollment_number.is_empty() {
            return Ok(None);
        }
        if full_name.is_empty() || enrollment_number.is_empty() {
            return Err("student name and enrollment number are both required".into());
        }
        let department = required(row, 3, "department")?;
        let semester_number = semester(row, 4)?;
        let division = required(row, 5, "division")?;
        let batch = required(row, 6, "batch")?;
        let email = text(row, 7);
        if !is_email(&email) {
            return Err(format!("'{}' is not a valid email", email));
        }
        let academic_year = text(row, 8);
        if !is_academic_year(&academic_year) {
            return Err(format!("'{}' is not an academic year like 2025-2026", academic_year));
        }

        Ok(Some(Self {
            full_name,
            enrollment_number,
            department,
            semester_number,
            division,
            batch,
            email,
            academic_year,
        }))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubjectRow {
    pub name: String,
    pub abbreviation: String,
    pub code: String,
    pub semester_number: i32,
    pub subject_type: SubjectType,
    pub department: String,
}

impl SubjectRow {
    pub fn parse(row: &[Data]) -> Result<Option<Self>, String> {
        let name = text(row, 1);
        let code = text(row, 3);
        if name.is_empty() && code.is_empty() {
            return Ok(None);
        }
        if name.is_empty() || code.is_empty() {
            return Err("subject name and code are both required".into());
        }
        let abbreviation = required(row, 2, "abbreviation")?;
        let semester_number = semester(row, 4)?;
        let subject_type = if is_truthy(&text(row, 5)) { SubjectType::Elective } else { SubjectType::Mandatory };
        let department = required(row, 6, "department")?;

        Ok(Some(Self { name, abbreviation, code, semester_number, subject_type, department }))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceRow {
    pub enrollment_number: String,
    pub status: AttendanceStatus,
}

impl AttendanceRow {
    pub fn parse(row: &[Data]) -> Result<Option<Self>, String> {
        let enrollment_number = text(row, 1);
        let raw_status = text(row, 2);
        if enrollment_number.is_empty() && raw_status.is_empty() {
            return Ok(None);
        }
        if enrollment_number.is_empty() {
            return Err("enrollment number is missing".into());
        }
        let status = match raw_status.to_ascii_uppercase().as_str() {
            "1" | "P" | "PRESENT" => AttendanceStatus::Present,
            "0" | "A" | "ABSENT" => AttendanceStatus::Absent,
            other => return Err(format!("attendance status must be 1 or 0, got '{}'", other)),
        };
        Ok(Some(Self { enrollment_number, status }))
    }
}

fn required(row: &[Data], col: usize, what: &str) -> Result<String, String> {
    opt_text(row, col).ok_or_else(|| format!("{} is missing", what))
}

fn semester(row: &[Data], col: usize) -> Result<i32, String> {
    match number(row, col) {
        Some(n) if (1..=12).contains(&n) => Ok(n as i32),
        _ => Err(format!("semester '{}' must be a number from 1 to 12", text(row, col))),
    }
}
