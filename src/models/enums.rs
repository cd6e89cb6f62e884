use crate::database::value::{ColumnKind, SqlValue};

/// Declares a Rust enum mirroring a Postgres enum type, with its column kind
/// and label conversions.
macro_rules! pg_enum {
    ($(#[$meta:meta])* $name:ident, $type_name:tt { $($variant:ident => $label:tt),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, sqlx::Type)]
        #[sqlx(type_name = $type_name)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                #[sqlx(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            pub const TYPE_NAME: &'static str = $type_name;
            pub const LABELS: &'static [&'static str] = &[$($label),+];
            pub const KIND: ColumnKind = ColumnKind::Enum($type_name, Self::LABELS);

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            pub fn to_sql(self) -> SqlValue {
                SqlValue::Enum { type_name: $type_name, value: self.as_str().to_string() }
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label => Ok($name::$variant),)+
                    other => Err(format!("invalid {}: {}", $type_name, other)),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pg_enum!(Role, "user_role" {
    Admin => "ADMIN",
    Faculty => "FACULTY",
    Student => "STUDENT",
});

pg_enum!(Designation, "designation" {
    Hod => "HOD",
    Professor => "PROFESSOR",
    AsstProfessor => "ASST_PROFESSOR",
    LabAssistant => "LAB_ASSISTANT",
});

pg_enum!(SemesterType, "semester_type" {
    Odd => "ODD",
    Even => "EVEN",
});

pg_enum!(SubjectType, "subject_type" {
    Mandatory => "MANDATORY",
    Elective => "ELECTIVE",
});

pg_enum!(LectureType, "lecture_type" {
    Theory => "THEORY",
    Practical => "PRACTICAL",
});

pg_enum!(ExamType, "exam_type" {
    Midterm => "MIDTERM",
    Remedial => "REMEDIAL",
    Final => "FINAL",
});

pg_enum!(ResultStatus, "result_status" {
    Pass => "PASS",
    Fail => "FAIL",
});

pg_enum!(AttendanceStatus, "attendance_status" {
    Present => "PRESENT",
    Absent => "ABSENT",
});

pg_enum!(SubmissionStatus, "submission_status" {
    Submitted => "SUBMITTED",
    PendingReview => "PENDING_REVIEW",
    Graded => "GRADED",
});

pg_enum!(InternshipStatus, "internship_status" {
    Applied => "APPLIED",
    Ongoing => "ONGOING",
    Completed => "COMPLETED",
    Cancelled => "CANCELLED",
});

impl SemesterType {
    /// Odd-numbered semesters run in the odd term
    pub fn for_number(semester_number: i32) -> Self {
        if semester_number % 2 == 1 { SemesterType::Odd } else { SemesterType::Even }
    }
}

impl Designation {
    /// Lenient parse used by spreadsheet imports: case and whitespace are ignored.
    pub fn from_sheet(raw: &str) -> Option<Self> {
        let key: String = raw
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '.' && *c != '_')
            .collect::<String>()
            .to_uppercase();
        match key.as_str() {
            "HEADOFDEPARTMENT" | "HOD" => Some(Designation::Hod),
            "PROFESSOR" => Some(Designation::Professor),
            "ASSISTANTPROFESSOR" | "ASSTPROF" | "ASSTPROFESSOR" => Some(Designation::AsstProfessor),
            "LABASSISTANT" => Some(Designation::LabAssistant),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip_through_from_str() {
        for label in ExamType::LABELS {
            let parsed: ExamType = label.parse().unwrap();
            assert_eq!(parsed.as_str(), *label);
        }
        assert!("QUIZ".parse::<ExamType>().is_err());
    }

    #[test]
    fn serde_uses_database_labels() {
        assert_eq!(serde_json::to_value(Designation::AsstProfessor).unwrap(), "ASST_PROFESSOR");
        let status: SubmissionStatus = serde_json::from_value(serde_json::json!("PENDING_REVIEW")).unwrap();
        assert_eq!(status, SubmissionStatus::PendingReview);
    }

    #[test]
    fn semester_type_follows_parity() {
        assert_eq!(SemesterType::for_number(5), SemesterType::Odd);
        assert_eq!(SemesterType::for_number(6), SemesterType::Even);
    }

    #[test]
    fn sheet_designations_are_normalised() {
        assert_eq!(Designation::from_sheet("Head of Department"), Some(Designation::Hod));
        assert_eq!(Designation::from_sheet("asst. prof"), Some(Designation::AsstProfessor));
        assert_eq!(Designation::from_sheet("Assistant Professor"), Some(Designation::AsstProfessor));
        assert_eq!(Designation::from_sheet("Lab Assistant"), Some(Designation::LabAssistant));
        assert_eq!(Designation::from_sheet("Dean"), None);
    }

    #[test]
    fn enum_kind_lists_labels() {
        assert_eq!(Role::KIND, ColumnKind::Enum("user_role", &["ADMIN", "FACULTY", "STUDENT"]));
        assert_eq!(Role::Faculty.to_sql().placeholder(1), "$1::user_role");
    }
}
