//! JSON bodies exchanged with the service of record.
//!
//! Responses are decoded into these structs first and converted to domain
//! types with `TryFrom`, so a malformed payload surfaces as
//! [`TransportError::Parse`] instead of leaking into component state.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

use schoolops_auth::Role;
use schoolops_core::{
    InventoryItemId, Quantity, SchoolEntryId, SubmissionId, Term, TransportError, UserId,
};
use schoolops_dashboard::{Delivery, NewUser, SchoolEntry, Submission, UserAccount};
use schoolops_inventory::InventoryItem;

/// A value the backend sends as either a JSON string or a number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Text(String),
    Number(serde_json::Number),
}

impl Scalar {
    pub fn into_text(self) -> String {
        match self {
            Scalar::Text(s) => s,
            Scalar::Number(n) => n.to_string(),
        }
    }
}

/// Workbook names arrive bare or wrapped in `{"workbooks": [...]}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum WorkbookNames {
    Bare(Vec<String>),
    Wrapped { workbooks: Vec<String> },
}

impl WorkbookNames {
    pub fn into_names(self) -> Vec<String> {
        match self {
            WorkbookNames::Bare(names) | WorkbookNames::Wrapped { workbooks: names } => names,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportingBranchReply {
    #[serde(default)]
    pub reporting_branch: Option<String>,
}

/// `{"success": bool, "message"?: string, "id"?: int}`, plus the row count
/// some bulk endpoints add.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<u64>,
}

impl Ack {
    /// `success: false` becomes [`TransportError::Rejected`] with the
    /// server's message, or `fallback` when it sent none.
    pub fn into_result(self, fallback: &str) -> Result<Ack, TransportError> {
        if self.success {
            Ok(self)
        } else {
            Err(TransportError::rejected(self.message, fallback))
        }
    }

    pub fn require_id(&self) -> Result<i64, TransportError> {
        self.id
            .ok_or_else(|| TransportError::Parse("acknowledgment is missing the new id".into()))
    }
}

fn parse_err(what: &str, detail: impl core::fmt::Display) -> TransportError {
    TransportError::Parse(format!("{what}: {detail}"))
}

fn non_negative(what: &str, value: i64) -> Result<u32, TransportError> {
    u32::try_from(value).map_err(|_| parse_err(what, format!("{value} is not a valid count")))
}

#[derive(Debug, Clone, Deserialize)]
pub struct InventoryRow {
    pub id: i64,
    pub grade: Scalar,
    pub workbook_name: String,
    pub quantity: i64,
}

impl TryFrom<InventoryRow> for InventoryItem {
    type Error = TransportError;

    fn try_from(row: InventoryRow) -> Result<Self, Self::Error> {
        Ok(InventoryItem {
            id: InventoryItemId::new(row.id),
            grade: row.grade.into_text(),
            workbook_name: row.workbook_name,
            quantity: Quantity::new(non_negative("inventory quantity", row.quantity)?),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QuantityBody {
    pub quantity: u32,
}

/// Timestamps come back either as ISO-8601 text or in the HTTP date format
/// the backend's JSON encoder uses for datetime columns.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, TransportError> {
    let raw = raw.trim();
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(at) = NaiveDateTime::parse_from_str(raw, pattern) {
            return Ok(at);
        }
    }
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .map(|at| at.naive_utc())
        .map_err(|err| parse_err("submitted_at", format!("{raw:?}: {err}")))
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionRow {
    pub id: i64,
    pub school_name: String,
    #[serde(default)]
    pub location: Option<String>,
    pub grade: Scalar,
    #[serde(default)]
    pub term: Option<Scalar>,
    #[serde(default)]
    pub workbook: Option<String>,
    pub count: i64,
    #[serde(default)]
    pub remark: Option<String>,
    #[serde(default)]
    pub submitted_by: Option<String>,
    pub submitted_at: String,
    #[serde(default)]
    pub delivered: Option<String>,
}

impl TryFrom<SubmissionRow> for Submission {
    type Error = TransportError;

    fn try_from(row: SubmissionRow) -> Result<Self, Self::Error> {
        let term = row.term.and_then(|t| t.into_text().parse::<Term>().ok());
        let delivered = match row.delivered.as_deref() {
            None | Some("") => Delivery::No,
            Some(raw) => raw
                .parse::<Delivery>()
                .map_err(|err| parse_err("delivered", err))?,
        };
        Ok(Submission {
            id: SubmissionId::new(row.id),
            school: row.school_name,
            location: row.location.unwrap_or_default(),
            grade: row.grade.into_text(),
            term,
            workbook: row.workbook.unwrap_or_default(),
            count: non_negative("submission count", row.count)?,
            remark: row.remark.unwrap_or_default(),
            submitted_by: row.submitted_by.unwrap_or_default(),
            submitted_at: parse_timestamp(&row.submitted_at)?,
            delivered,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MarkDeliveredBody {
    pub ids: Vec<i64>,
    pub delivered: &'static str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchoolEntryRow {
    pub id: i64,
    pub school_name: String,
    pub location: String,
    #[serde(default)]
    pub reporting_branch: Option<String>,
    #[serde(default)]
    pub num_students: Option<i64>,
}

impl TryFrom<SchoolEntryRow> for SchoolEntry {
    type Error = TransportError;

    fn try_from(row: SchoolEntryRow) -> Result<Self, Self::Error> {
        Ok(SchoolEntry {
            id: SchoolEntryId::new(row.id),
            school_name: row.school_name,
            location: row.location,
            reporting_branch: row.reporting_branch.unwrap_or_default(),
            num_students: row
                .num_students
                .map(|n| non_negative("num_students", n))
                .transpose()?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserRow {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
}

impl From<UserRow> for UserAccount {
    fn from(row: UserRow) -> Self {
        UserAccount {
            id: UserId::new(row.id),
            name: row.name.filter(|n| !n.trim().is_empty()),
            email: row.email,
            role: row.role.map(Role::new).unwrap_or_default(),
        }
    }
}

#[derive(Serialize)]
pub struct NewUserBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
    pub email: &'a str,
    pub password: &'a str,
    pub role: &'a str,
}

impl<'a> From<&'a NewUser> for NewUserBody<'a> {
    fn from(user: &'a NewUser) -> Self {
        Self {
            name: user.name.as_deref(),
            email: &user.email,
            password: &user.password,
            role: user.role.as_str(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginReply {
    pub success: bool,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserInfoReply {
    pub success: bool,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Serialize)]
pub struct EmailBody<'a> {
    pub email: &'a str,
}

#[derive(Serialize)]
pub struct ResetBody<'a> {
    pub token: &'a str,
    pub password: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn grades_accept_strings_and_numbers() {
        let grades: Vec<Scalar> = serde_json::from_value(json!(["5", 6, "KG"])).unwrap();
        let grades: Vec<String> = grades.into_iter().map(Scalar::into_text).collect();
        assert_eq!(grades, ["5", "6", "KG"]);
    }

    #[test]
    fn workbook_names_accept_both_shapes() {
        let bare: WorkbookNames = serde_json::from_value(json!(["Maths 5"])).unwrap();
        let wrapped: WorkbookNames =
            serde_json::from_value(json!({ "workbooks": ["Maths 5"] })).unwrap();
        assert_eq!(bare.into_names(), wrapped.into_names());
    }

    #[test]
    fn failed_ack_carries_the_server_message() {
        let ack: Ack = serde_json::from_value(json!({ "success": false, "message": "No IDs provided" }))
            .unwrap();
        assert_eq!(
            ack.into_result("Update failed").unwrap_err(),
            TransportError::Rejected("No IDs provided".into())
        );

        let silent: Ack = serde_json::from_value(json!({ "success": false })).unwrap();
        assert_eq!(silent.into_result("Update failed").unwrap_err().to_string(), "Update failed");
    }

    #[test]
    fn ack_without_success_flag_is_malformed() {
        assert!(serde_json::from_value::<Ack>(json!({ "id": 3 })).is_err());
    }

    #[test]
    fn negative_inventory_is_a_parse_error() {
        let row: InventoryRow = serde_json::from_value(
            json!({ "id": 1, "grade": 5, "workbook_name": "Maths 5", "quantity": -2 }),
        )
        .unwrap();
        assert!(matches!(InventoryItem::try_from(row), Err(TransportError::Parse(_))));
    }

    #[test]
    fn submission_rows_tolerate_backend_quirks() {
        let row: SubmissionRow = serde_json::from_value(json!({
            "id": 4,
            "school_name": "Greenwood",
            "location": "North",
            "grade": 5,
            "term": "2",
            "workbook": "Maths 5",
            "count": 30,
            "remark": null,
            "submitted_by": "asha@example.com",
            "submitted_at": "Sat, 01 Jun 2024 10:30:00 GMT",
            "delivered": "Yes"
        }))
        .unwrap();
        let submission = Submission::try_from(row).unwrap();
        assert_eq!(submission.grade, "5");
        assert_eq!(submission.term, Some(Term::Second));
        assert_eq!(submission.remark, "");
        assert_eq!(submission.delivered, Delivery::Yes);
        assert_eq!(submission.submitted_at.to_string(), "2024-06-01 10:30:00");
    }

    #[test]
    fn timestamps_accept_iso_text() {
        let at = parse_timestamp("2024-06-01T10:30:00.250000").unwrap();
        assert_eq!(at.format("%Y-%m-%d %H:%M").to_string(), "2024-06-01 10:30");
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn user_rows_default_to_the_user_role() {
        let row: UserRow =
            serde_json::from_value(json!({ "id": 2, "name": "", "email": "a@b.com" })).unwrap();
        let account = UserAccount::from(row);
        assert_eq!(account.role, Role::user());
        assert_eq!(account.name, None);
    }
}
