//! Parser for university result sheets.
//!
//! The sheet carries a few title rows, then a header row that contains an
//! `EXAM NO.` cell. Subject columns are headed like `CE501-N (4)` and span
//! two cells whose text is joined into the grade. `CURRENT SEMESTER` and
//! `CUMMULATIVE` each open a three-column block whose last column holds the
//! SPI or CPI.

use calamine::{Data, Range};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

use super::sheet::text;
use super::UploadError;

static SUBJECT_HEADER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z]{2}\d{3}[A-Z]?)-N\s\(\d+\)$").expect("subject header pattern compiles"));

const EXAM_NO_HEADER: &str = "EXAM NO.";
const CURRENT_SEMESTER_HEADER: &str = "CURRENT SEMESTER";
const CUMULATIVE_HEADER: &str = "CUMMULATIVE";

#[derive(Debug, Clone, PartialEq)]
pub struct SubjectColumn {
    pub code: String,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultLayout {
    pub header_row: usize,
    pub exam_no: usize,
    pub enrollment: usize,
    pub name: Option<usize>,
    pub subjects: Vec<SubjectColumn>,
    pub spi: usize,
    pub cpi: usize,
}

/// One student's line on the sheet
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub row_number: usize,
    pub enrollment_number: String,
    pub name: Option<String>,
    pub spi: Decimal,
    pub cpi: Decimal,
    /// (subject code, normalised grade)
    pub grades: Vec<(String, String)>,
}

impl ResultRow {
    /// A result fails when any subject is failed or missed
    pub fn passed(&self) -> bool {
        !self.grades.iter().any(|(_, grade)| is_failing_grade(grade))
    }
}

pub fn detect_layout(range: &Range<Data>) -> Result<ResultLayout, UploadError> {
    let (header_row, header) = range
        .rows()
        .enumerate()
        .find(|(_, row)| (0..row.len()).any(|c| text(row, c).eq_ignore_ascii_case(EXAM_NO_HEADER)))
        .ok_or_else(|| UploadError::Layout(format!("no '{}' header row found", EXAM_NO_HEADER)))?;

    let headers: Vec<String> = (0..header.len()).map(|c| text(header, c).to_uppercase()).collect();
    let find = |pred: &dyn Fn(&str) -> bool| headers.iter().position(|h| pred(h.as_str()));

    let exam_no = find(&|h| h == EXAM_NO_HEADER).unwrap_or(0);
    let enrollment = find(&|h| h.contains("ENROLL")).unwrap_or(exam_no);
    let name = find(&|h| h == "NAME" || h.contains("STUDENT NAME"));
    let spi = find(&|h| h == CURRENT_SEMESTER_HEADER)
        .map(|c| c + 2)
        .ok_or_else(|| UploadError::Layout(format!("no '{}' column found", CURRENT_SEMESTER_HEADER)))?;
    let cpi = find(&|h| h == CUMULATIVE_HEADER)
        .map(|c| c + 2)
        .ok_or_else(|| UploadError::Layout(format!("no '{}' column found", CUMULATIVE_HEADER)))?;

    let subjects = headers
        .iter()
        .enumerate()
        .filter_map(|(index, h)| {
            SUBJECT_HEADER_RE.captures(h).map(|caps| SubjectColumn { code: caps[1].to_string(), index })
        })
        .collect();

    Ok(ResultLayout { header_row, exam_no, enrollment, name, subjects, spi, cpi })
}

/// Map a raw grade cell to the stored grade
pub fn normalize_grade(raw: &str) -> String {
    let value = raw.trim();
    let squashed = value.replace(' ', "").to_lowercase();
    if value.is_empty() || value == "--" {
        "-".to_string()
    } else if value.contains("AB") {
        "Absent".to_string()
    } else if squashed.contains("ext") {
        "Failed External".to_string()
    } else if squashed.contains("mid") {
        "Failed Mid Term".to_string()
    } else {
        value.to_string()
    }
}

pub fn is_failing_grade(grade: &str) -> bool {
    grade == "Absent" || grade.starts_with("Failed") || grade.split_whitespace().any(|part| part == "FF")
}

/// Parse every student row under the header. Rows without an enrollment
/// number or with unreadable indices are reported by row number.
pub fn parse_results(range: &Range<Data>) -> Result<(Vec<ResultRow>, Vec<(usize, String)>), UploadError> {
    let layout = detect_layout(range)?;
    let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);
    let mut rows = Vec::new();
    let mut rejected = Vec::new();

    for (i, cells) in range.rows().enumerate().skip(layout.header_row + 1) {
        let row_number = first_row + i + 1;
        let exam_no = text(cells, layout.exam_no);
        let enrollment_number = text(cells, layout.enrollment);
        if exam_no.eq_ignore_ascii_case(EXAM_NO_HEADER) {
            continue;
        }
        if exam_no.is_empty() && enrollment_number.is_empty() {
            continue;
        }
        if enrollment_number.is_empty() {
            rejected.push((row_number, "missing enrollment number".to_string()));
            continue;
        }

        let (spi, cpi) = match (index_value(cells, layout.spi), index_value(cells, layout.cpi)) {
            (Some(spi), Some(cpi)) => (spi, cpi),
            _ => {
                rejected.push((row_number, format!("unreadable SPI/CPI for {}", enrollment_number)));
                continue;
            }
        };

        let grades = layout
            .subjects
            .iter()
            .map(|subject| {
                let joined = format!("{} {}", text(cells, subject.index), text(cells, subject.index + 1));
                (subject.code.clone(), normalize_grade(&joined))
            })
            .collect();

        rows.push(ResultRow {
            row_number,
            enrollment_number,
            name: layout.name.map(|c| text(cells, c)).filter(|n| !n.is_empty()),
            spi,
            cpi,
            grades,
        });
    }
    Ok((rows, rejected))
}

fn index_value(cells: &[Data], col: usize) -> Option<Decimal> {
    let raw = text(cells, col);
    let value = Decimal::from_str(raw.trim()).ok()?;
    if value < Decimal::ZERO || value > Decimal::TEN {
        return None;
    }
    Some(value.round_dp(2))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(rows: &[&[&str]]) -> Range<Data> {
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(1);
        let mut range = Range::new((0, 0), (rows.len() as u32 - 1, width as u32 - 1));
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                if !value.is_empty() {
                    range.set_value((r as u32, c as u32), Data::String(value.to_string()));
                }
            }
        }
        range
    }

    fn sample() -> Range<Data> {
        sheet(&[
            &["LDRP INSTITUTE OF TECHNOLOGY AND RESEARCH"],
            &["EXAM NO.", "ENROLLMENT NO.", "NAME", "CE501-N (4)", "", "CE502-N (4)", "", "CURRENT SEMESTER", "", "", "CUMMULATIVE", "", ""],
            &["1001", "22BECE30001", "Asha Patel", "AA", "", "AB", "", "22", "180", "8.18", "88", "700", "7.95"],
            &["1002", "22BECE30002", "Ravi Shah", "BC", "", "FF", "ext", "22", "120", "5.45", "88", "560", "6.36"],
            &["EXAM NO.", "", "", "", "", "", "", "", "", "", "", "", ""],
            &["1003", "22BECE30003", "Mira Joshi", "AB", "", "BB", "", "22", "150", "11.2", "88", "600", "6.82"],
            &["", "", "", "", "", "", "", "", "", "", "", "", ""],
        ])
    }

    #[test]
    fn detects_header_blocks_and_subjects() {
        let layout = detect_layout(&sample()).unwrap();
        assert_eq!(layout.header_row, 1);
        assert_eq!(layout.enrollment, 1);
        assert_eq!(layout.spi, 9);
        assert_eq!(layout.cpi, 12);
        let codes: Vec<&str> = layout.subjects.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, vec!["CE501", "CE502"]);
    }

    #[test]
    fn parses_rows_and_rejects_bad_indices() {
        let (rows, rejected) = parse_results(&sample()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].enrollment_number, "22BECE30001");
        assert_eq!(rows[0].spi, Decimal::new(818, 2));
        assert_eq!(rows[0].grades[1], ("CE502".to_string(), "Absent".to_string()));
        assert!(!rows[0].passed());
        assert_eq!(rows[1].grades[1].1, "Failed External");
        assert_eq!(rejected, vec![(6, "unreadable SPI/CPI for 22BECE30003".to_string())]);
    }

    #[test]
    fn grades_are_normalised() {
        assert_eq!(normalize_grade("  "), "-");
        assert_eq!(normalize_grade("--"), "-");
        assert_eq!(normalize_grade("AB "), "Absent");
        assert_eq!(normalize_grade("FF Mid Sem"), "Failed Mid Term");
        assert_eq!(normalize_grade("AA"), "AA");
        assert!(is_failing_grade("FF"));
        assert!(!is_failing_grade("AA"));
    }

    #[test]
    fn sheets_without_exam_header_are_rejected() {
        let range = sheet(&[&["Name", "SPI"], &["Asha", "8"]]);
        assert!(matches!(detect_layout(&range), Err(UploadError::Layout(_))));
    }
}
