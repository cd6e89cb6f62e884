use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use chrono::{Duration, NaiveDate};
use std::io::Cursor;

use super::UploadError;

/// First worksheet of an uploaded workbook
pub fn first_sheet(bytes: &[u8]) -> Result<Range<Data>, UploadError> {
    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes.to_vec())).map_err(|e| UploadError::Workbook(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(UploadError::MissingSheet)?
        .map_err(|e| UploadError::Workbook(e.to_string()))?;
    if range.is_empty() {
        return Err(UploadError::MissingSheet);
    }
    Ok(range)
}

/// Data rows (everything below the header row), paired with 1-based sheet row numbers
pub fn data_rows(range: &Range<Data>) -> impl Iterator<Item = (usize, &[Data])> {
    let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);
    range.rows().enumerate().skip(1).map(move |(i, cells)| (first_row + i + 1, cells))
}

/// Trimmed text of a cell; whole numbers lose their `.0`
pub fn text(row: &[Data], col: usize) -> String {
    match row.get(col) {
        None | Some(Data::Empty) | Some(Data::Error(_)) => String::new(),
        Some(Data::String(s)) | Some(Data::DateTimeIso(s)) | Some(Data::DurationIso(s)) => s.trim().to_string(),
        Some(Data::Int(i)) => i.to_string(),
        Some(Data::Float(f)) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Some(Data::Float(f)) => f.to_string(),
        Some(Data::Bool(b)) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        Some(Data::DateTime(dt)) => excel_serial_to_date(dt.as_f64()).map(|d| d.to_string()).unwrap_or_default(),
    }
}

pub fn opt_text(row: &[Data], col: usize) -> Option<String> {
    let value = text(row, col);
    if value.is_empty() { None } else { Some(value) }
}

pub fn number(row: &[Data], col: usize) -> Option<i64> {
    match row.get(col) {
        Some(Data::Int(i)) => Some(*i),
        Some(Data::Float(f)) if f.fract() == 0.0 => Some(*f as i64),
        Some(Data::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Date from an Excel serial, a date cell, or `YYYY-MM-DD` / `DD-MM-YYYY` / `DD/MM/YYYY` text
pub fn date(row: &[Data], col: usize) -> Option<NaiveDate> {
    match row.get(col) {
        Some(Data::DateTime(dt)) => excel_serial_to_date(dt.as_f64()),
        Some(Data::Float(f)) => excel_serial_to_date(*f),
        Some(Data::Int(i)) => excel_serial_to_date(*i as f64),
        Some(Data::String(s)) | Some(Data::DateTimeIso(s)) => parse_date_text(s),
        _ => None,
    }
}

pub fn parse_date_text(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let raw = raw.split('T').next().unwrap_or(raw);
    ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
}

/// Excel's day zero is 1899-12-30 (it keeps the phantom 1900 leap day)
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !(1.0..2_958_466.0).contains(&serial) {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30).map(|epoch| epoch + Duration::days(serial.trunc() as i64))
}

pub fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_uppercase().as_str(), "TRUE" | "YES" | "Y" | "1")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_normalises_numbers_and_blanks() {
        let row = vec![
            Data::Float(1.0),
            Data::Float(22012345.0),
            Data::String("  Asha Patel ".into()),
            Data::Empty,
            Data::Bool(true),
            Data::Float(7.25),
        ];
        assert_eq!(text(&row, 1), "22012345");
        assert_eq!(text(&row, 2), "Asha Patel");
        assert_eq!(text(&row, 3), "");
        assert_eq!(text(&row, 4), "TRUE");
        assert_eq!(text(&row, 5), "7.25");
        assert_eq!(text(&row, 9), "");
        assert_eq!(opt_text(&row, 3), None);
    }

    #[test]
    fn dates_accept_serials_and_text() {
        let row = vec![Data::Float(45292.0), Data::String("15-07-2024".into()), Data::String("2024-07-15".into())];
        assert_eq!(date(&row, 0), NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(date(&row, 1), NaiveDate::from_ymd_opt(2024, 7, 15));
        assert_eq!(date(&row, 2), NaiveDate::from_ymd_opt(2024, 7, 15));
        assert_eq!(parse_date_text("July 15"), None);
    }

    #[test]
    fn data_rows_skip_the_header_and_number_from_two() {
        let mut range = Range::new((0, 0), (2, 1));
        range.set_value((0, 0), Data::String("Sr".into()));
        range.set_value((1, 0), Data::Float(1.0));
        range.set_value((2, 0), Data::Float(2.0));
        let numbers: Vec<usize> = data_rows(&range).map(|(n, _)| n).collect();
        assert_eq!(numbers, vec![2, 3]);
    }

    #[test]
    fn garbage_bytes_are_not_a_workbook() {
        assert!(matches!(first_sheet(b"not a spreadsheet"), Err(UploadError::Workbook(_))));
    }

    #[test]
    fn truthy_values() {
        assert!(is_truthy("TRUE"));
        assert!(is_truthy(" yes"));
        assert!(!is_truthy("FALSE"));
        assert!(!is_truthy(""));
    }
}
