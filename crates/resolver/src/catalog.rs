//! Port to the catalog/record service the form page reads from and submits to.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use schoolops_core::{Quantity, SubmissionId, Term, TransportError};

/// Parameters for a workbook-name lookup.
///
/// `school` and `location` narrow the result when the backend supports it;
/// a backend that only keys workbooks by grade may ignore them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkbookQuery {
    pub grade: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl WorkbookQuery {
    pub fn for_grade(grade: impl Into<String>) -> Self {
        Self {
            grade: grade.into(),
            school: None,
            location: None,
        }
    }

    pub fn at(mut self, school: &str, location: &str) -> Self {
        self.school = Some(school.to_string()).filter(|s| !s.is_empty());
        self.location = Some(location.to_string()).filter(|l| !l.is_empty());
        self
    }
}

/// A completed workbook count, ready to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitRecord {
    pub school: String,
    pub location: String,
    pub grade: String,
    pub term: Term,
    pub workbook: String,
    pub count: Quantity,
    pub remark: String,
    pub submitted_by: String,
}

/// Server acknowledgment of a submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitReceipt {
    pub id: Option<SubmissionId>,
    pub message: Option<String>,
}

/// Catalog collaborator.
///
/// Lookups return plain lists; an empty list is a valid "nothing configured"
/// answer, not an error.
#[async_trait]
pub trait CatalogService: Send + Sync {
    async fn list_schools(&self) -> Result<Vec<String>, TransportError>;

    async fn list_locations(&self, school: &str) -> Result<Vec<String>, TransportError>;

    /// Reporting branch of a (school, location) pair; empty when unknown.
    async fn reporting_branch(&self, school: &str, location: &str)
        -> Result<String, TransportError>;

    async fn list_grades(&self) -> Result<Vec<String>, TransportError>;

    async fn list_workbook_names(&self, query: &WorkbookQuery)
        -> Result<Vec<String>, TransportError>;

    async fn submit_record(&self, record: &SubmitRecord) -> Result<SubmitReceipt, TransportError>;
}
