//! Records managed from the admin dashboard.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use schoolops_auth::Role;
use schoolops_core::{
    DomainError, Entity, Quantity, SchoolEntryId, SubmissionId, Term, UserId,
};

/// Whether the counted workbooks have been handed over to the school.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Delivery {
    Yes,
    #[default]
    No,
}

impl Delivery {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Yes => "Yes",
            Self::No => "No",
        }
    }
}

impl core::fmt::Display for Delivery {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for Delivery {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            v if v.eq_ignore_ascii_case("yes") => Ok(Self::Yes),
            v if v.eq_ignore_ascii_case("no") => Ok(Self::No),
            other => Err(DomainError::validation(format!(
                "unknown delivery status '{other}'"
            ))),
        }
    }
}

/// One workbook count sent from the form page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub id: SubmissionId,
    pub school: String,
    pub location: String,
    pub grade: String,
    pub term: Option<Term>,
    pub workbook: String,
    pub count: u32,
    pub remark: String,
    pub submitted_by: String,
    pub submitted_at: NaiveDateTime,
    pub delivered: Delivery,
}

impl Entity for Submission {
    type Id = SubmissionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Inclusive calendar-day window over `submitted_at`. Either bound may be open.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        let day = at.date();
        self.from.is_none_or(|from| day >= from) && self.to.is_none_or(|to| day <= to)
    }
}

/// A school/location row in the directory that feeds the form's pickers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolEntry {
    pub id: SchoolEntryId,
    pub school_name: String,
    pub location: String,
    pub reporting_branch: String,
    pub num_students: Option<u32>,
}

impl Entity for SchoolEntry {
    type Id = SchoolEntryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Input for a new directory row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSchoolEntry {
    pub school_name: String,
    pub location: String,
    pub reporting_branch: String,
    pub num_students: Option<u32>,
}

impl NewSchoolEntry {
    /// Validate the add-school form. Student count may be left blank.
    pub fn parse(
        school_name: &str,
        location: &str,
        reporting_branch: &str,
        num_students: &str,
    ) -> Result<Self, DomainError> {
        let school_name = school_name.trim();
        let location = location.trim();
        if school_name.is_empty() {
            return Err(DomainError::required("School name"));
        }
        if location.is_empty() {
            return Err(DomainError::required("Location"));
        }
        Ok(Self {
            school_name: school_name.to_string(),
            location: location.to_string(),
            reporting_branch: reporting_branch.trim().to_string(),
            num_students: parse_optional_count(num_students)?,
        })
    }

    pub fn into_entry(self, id: SchoolEntryId) -> SchoolEntry {
        SchoolEntry {
            id,
            school_name: self.school_name,
            location: self.location,
            reporting_branch: self.reporting_branch,
            num_students: self.num_students,
        }
    }
}

fn parse_optional_count(raw: &str) -> Result<Option<u32>, DomainError> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    Quantity::parse(raw, "Number of students").map(|q| Some(q.get()))
}

/// Editable columns of a directory row.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SchoolField {
    SchoolName,
    Location,
    ReportingBranch,
    NumStudents,
}

/// Raw text of the row being edited. Validated on save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchoolDraft {
    pub id: SchoolEntryId,
    pub school_name: String,
    pub location: String,
    pub reporting_branch: String,
    pub num_students: String,
}

impl SchoolDraft {
    pub fn from_entry(entry: &SchoolEntry) -> Self {
        Self {
            id: entry.id,
            school_name: entry.school_name.clone(),
            location: entry.location.clone(),
            reporting_branch: entry.reporting_branch.clone(),
            num_students: entry.num_students.map(|n| n.to_string()).unwrap_or_default(),
        }
    }

    pub fn set(&mut self, field: SchoolField, value: &str) {
        let slot = match field {
            SchoolField::SchoolName => &mut self.school_name,
            SchoolField::Location => &mut self.location,
            SchoolField::ReportingBranch => &mut self.reporting_branch,
            SchoolField::NumStudents => &mut self.num_students,
        };
        *slot = value.to_string();
    }

    pub fn validate(&self) -> Result<SchoolEntry, DomainError> {
        NewSchoolEntry::parse(
            &self.school_name,
            &self.location,
            &self.reporting_branch,
            &self.num_students,
        )
        .map(|entry| entry.into_entry(self.id))
    }
}

/// An account as listed on the users tab. Passwords never come back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub name: Option<String>,
    pub email: String,
    pub role: Role,
}

impl Entity for UserAccount {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Account form input.
///
/// Used both to create an account and to overwrite an existing one; the
/// backend requires the password in either case.
#[derive(Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: Option<String>,
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl NewUser {
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            name: None,
            email: email.trim().to_string(),
            password: password.to_string(),
            role: Role::user(),
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        let name = name.trim();
        self.name = (!name.is_empty()).then(|| name.to_string());
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(DomainError::validation("Enter email & password"));
        }
        Ok(())
    }

    pub fn into_account(self, id: UserId) -> UserAccount {
        UserAccount {
            id,
            name: self.name,
            email: self.email,
            role: self.role,
        }
    }
}

impl core::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NewUser")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn date_range_is_inclusive_on_whole_days() {
        let range = DateRange::new(Some(day(2024, 6, 1)), Some(day(2024, 6, 30)));
        assert!(range.contains(at(2024, 6, 1, 0)));
        assert!(range.contains(at(2024, 6, 30, 23)));
        assert!(!range.contains(at(2024, 5, 31, 23)));
        assert!(!range.contains(at(2024, 7, 1, 0)));
    }

    #[test]
    fn open_bounds_accept_everything_on_that_side() {
        assert!(DateRange::default().contains(at(1999, 1, 1, 0)));
        let since = DateRange::new(Some(day(2024, 6, 1)), None);
        assert!(since.contains(at(2030, 1, 1, 0)));
        assert!(!since.contains(at(2024, 5, 1, 0)));
    }

    #[test]
    fn delivery_parses_case_insensitively() {
        assert_eq!("yes".parse::<Delivery>().unwrap(), Delivery::Yes);
        assert_eq!(" No ".parse::<Delivery>().unwrap(), Delivery::No);
        assert!("maybe".parse::<Delivery>().is_err());
        assert_eq!(Delivery::default(), Delivery::No);
    }

    #[test]
    fn school_entry_requires_name_and_location() {
        assert_eq!(
            NewSchoolEntry::parse("", "North", "", "").unwrap_err(),
            DomainError::required("School name")
        );
        assert_eq!(
            NewSchoolEntry::parse("Greenwood", " ", "", "").unwrap_err(),
            DomainError::required("Location")
        );
        let entry = NewSchoolEntry::parse(" Greenwood ", "North", "B1", "").unwrap();
        assert_eq!(entry.school_name, "Greenwood");
        assert_eq!(entry.num_students, None);
    }

    #[test]
    fn student_count_must_be_a_whole_number() {
        let err = NewSchoolEntry::parse("Greenwood", "North", "B1", "lots").unwrap_err();
        assert_eq!(err.to_string(), "Number of students must be a whole number");
        let entry = NewSchoolEntry::parse("Greenwood", "North", "B1", "320").unwrap();
        assert_eq!(entry.num_students, Some(320));
    }

    #[test]
    fn draft_edits_validate_back_into_an_entry() {
        let entry = SchoolEntry {
            id: SchoolEntryId::new(4),
            school_name: "Greenwood".into(),
            location: "North".into(),
            reporting_branch: "B1".into(),
            num_students: Some(300),
        };
        let mut draft = SchoolDraft::from_entry(&entry);
        assert_eq!(draft.num_students, "300");

        draft.set(SchoolField::ReportingBranch, "B2");
        draft.set(SchoolField::NumStudents, "");
        let saved = draft.validate().unwrap();
        assert_eq!(saved.id, entry.id);
        assert_eq!(saved.reporting_branch, "B2");
        assert_eq!(saved.num_students, None);
    }

    #[test]
    fn new_user_needs_email_and_password() {
        assert_eq!(
            NewUser::new("", "pw").validate().unwrap_err().to_string(),
            "Enter email & password"
        );
        assert!(NewUser::new("a@b.com", "").validate().is_err());
        assert!(NewUser::new("a@b.com", "pw").validate().is_ok());
        assert!(!format!("{:?}", NewUser::new("a@b.com", "hunter2")).contains("hunter2"));
    }

    #[test]
    fn blank_name_is_none() {
        assert_eq!(NewUser::new("a@b.com", "pw").with_name("  ").name, None);
        assert_eq!(
            NewUser::new("a@b.com", "pw").with_name("Asha").name.as_deref(),
            Some("Asha")
        );
    }

    proptest! {
        #[test]
        fn range_matches_day_bounds(
            from in 0i64..400,
            len in 0i64..60,
            offset in -30i64..460,
            hour in 0u32..24,
        ) {
            let base = day(2024, 1, 1);
            let start = base + chrono::Duration::days(from);
            let end = start + chrono::Duration::days(len);
            let day_seen = base + chrono::Duration::days(offset);
            let range = DateRange::new(Some(start), Some(end));
            let inside = day_seen >= start && day_seen <= end;
            prop_assert_eq!(range.contains(day_seen.and_hms_opt(hour, 0, 0).unwrap()), inside);
        }
    }
}
