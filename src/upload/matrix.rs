use serde_json::{Map, Value};

use super::UploadError;
use crate::models::LectureType;

/// One faculty assignment read from the processing service reply
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub semester_number: i32,
    pub division: String,
    pub subject: String,
    pub faculty: String,
    pub lecture_type: LectureType,
    pub batch: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum MatrixScope {
    Found(Vec<Allocation>),
    MissingCollege,
    MissingDepartment,
}

/// Walk `results[college][department][semester][division][subject]`.
///
/// Semester keys that are not numbers and subjects without any designated
/// faculty are ignored.
pub fn allocations(reply: &Value, college: &str, department: &str) -> Result<MatrixScope, UploadError> {
    let results = reply
        .get("results")
        .and_then(Value::as_object)
        .ok_or_else(|| UploadError::Layout("The processing service reply has no results.".into()))?;

    let Some(college_node) = lookup(results, college) else {
        return Ok(MatrixScope::MissingCollege);
    };
    let Some(department_node) = lookup(college_node, department) else {
        return Ok(MatrixScope::MissingDepartment);
    };

    let mut found = Vec::new();
    for (semester_key, divisions) in department_node {
        let Ok(semester_number) = semester_key.trim().parse::<i32>() else {
            tracing::warn!(semester = %semester_key, "Ignoring non-numeric semester in faculty matrix");
            continue;
        };
        let Some(divisions) = divisions.as_object() else { continue };

        for (division, subjects) in divisions {
            let Some(subjects) = subjects.as_object() else { continue };
            for (subject, offering) in subjects {
                collect_offering(&mut found, semester_number, division, subject, offering);
            }
        }
    }
    Ok(MatrixScope::Found(found))
}

fn collect_offering(found: &mut Vec<Allocation>, semester_number: i32, division: &str, subject: &str, offering: &Value) {
    let allocation = |faculty: &str, lecture_type, batch: Option<&str>| Allocation {
        semester_number,
        division: division.trim().to_string(),
        subject: subject.trim().to_string(),
        faculty: faculty.trim().to_string(),
        lecture_type,
        batch: batch.map(|b| b.trim().to_string()),
    };

    if let Some(faculty) = designated(offering.get("lectures")) {
        found.push(allocation(faculty, LectureType::Theory, None));
    }
    if let Some(labs) = offering.get("labs").and_then(Value::as_object) {
        for (batch, lab) in labs {
            if let Some(faculty) = designated(Some(lab)) {
                found.push(allocation(faculty, LectureType::Practical, Some(batch)));
            }
        }
    }
}

fn designated(node: Option<&Value>) -> Option<&str> {
    node?
        .get("designated_faculty")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|f| !f.is_empty())
}

/// Keys are matched exactly first, then case-insensitively
fn lookup<'v>(map: &'v Map<String, Value>, key: &str) -> Option<&'v Map<String, Value>> {
    map.get(key)
        .or_else(|| map.iter().find(|(k, _)| k.eq_ignore_ascii_case(key)).map(|(_, v)| v))
        .and_then(Value::as_object)
}
