//! Selection state of one form session and its cascade rules.
//!
//! The four dimensions form a chain: school → location → grade/term →
//! workbook. Changing a dimension clears everything downstream of it in the
//! same call, before any lookup for the new value is issued.
//!
//! Lookups are described by [`LookupTicket`]s. A ticket records the
//! generation of the dimension it was issued under; every upstream change
//! bumps the generations below it, so a response that arrives after the user
//! moved on no longer matches and is dropped by the `apply_*` methods.

use schoolops_core::{DomainError, Quantity, Term};

use crate::catalog::{SubmitRecord, WorkbookQuery};
use crate::error::ResolverError;

/// A remote lookup the resolver needs, with the inputs it was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Locations { school: String },
    ReportingBranch { school: String, location: String },
    WorkbookNames(WorkbookQuery),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTicket {
    generation: u64,
    lookup: Lookup,
}

impl LookupTicket {
    pub fn lookup(&self) -> &Lookup {
        &self.lookup
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Generations {
    school: u64,
    location: u64,
    grade: u64,
}

/// Everything the form shows for the current partial selection.
///
/// Empty strings mean "not selected".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    school: String,
    location: String,
    grade: String,
    term: Option<Term>,
    workbook: String,
    reporting_branch: String,
    location_options: Vec<String>,
    workbook_options: Vec<String>,
    count: String,
    remark: String,
    generations: Generations,
    closed: bool,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn school(&self) -> &str {
        &self.school
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn grade(&self) -> &str {
        &self.grade
    }

    pub fn term(&self) -> Option<Term> {
        self.term
    }

    pub fn workbook(&self) -> &str {
        &self.workbook
    }

    pub fn reporting_branch(&self) -> &str {
        &self.reporting_branch
    }

    pub fn location_options(&self) -> &[String] {
        &self.location_options
    }

    pub fn workbook_options(&self) -> &[String] {
        &self.workbook_options
    }

    pub fn count(&self) -> &str {
        &self.count
    }

    pub fn remark(&self) -> &str {
        &self.remark
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// True when only one location exists and it was filled in for the user.
    pub fn location_is_fixed(&self) -> bool {
        self.location_options.len() == 1 && self.location == self.location_options[0]
    }

    // ─────────────────────────────────────────────────────────────────────
    // Cascade
    // ─────────────────────────────────────────────────────────────────────

    fn clear_from_location(&mut self) {
        self.location.clear();
        self.location_options.clear();
        self.clear_from_grade();
        self.reporting_branch.clear();
    }

    fn clear_from_grade(&mut self) {
        self.grade.clear();
        self.term = None;
        self.clear_workbook();
    }

    fn clear_workbook(&mut self) {
        self.workbook.clear();
        self.workbook_options.clear();
    }

    fn bump_school(&mut self) {
        self.generations.school += 1;
        self.bump_location();
    }

    fn bump_location(&mut self) {
        self.generations.location += 1;
        self.bump_grade();
    }

    fn bump_grade(&mut self) {
        self.generations.grade += 1;
    }

    /// Set the school and clear everything below it.
    ///
    /// Returns the location lookup to run, or `None` for an empty school.
    pub fn select_school(&mut self, school: &str) -> Option<LookupTicket> {
        self.bump_school();
        self.school = school.trim().to_string();
        self.clear_from_location();

        if self.school.is_empty() {
            return None;
        }
        Some(LookupTicket {
            generation: self.generations.school,
            lookup: Lookup::Locations {
                school: self.school.clone(),
            },
        })
    }

    /// Set the location and clear grade, term, workbook and reporting branch.
    ///
    /// Returns the reporting-branch lookup when both school and location are set.
    pub fn select_location(&mut self, location: &str) -> Option<LookupTicket> {
        self.bump_location();
        self.location = location.trim().to_string();
        self.reporting_branch.clear();
        self.clear_from_grade();
        self.branch_ticket()
    }

    fn branch_ticket(&self) -> Option<LookupTicket> {
        if self.school.is_empty() || self.location.is_empty() {
            return None;
        }
        Some(LookupTicket {
            generation: self.generations.location,
            lookup: Lookup::ReportingBranch {
                school: self.school.clone(),
                location: self.location.clone(),
            },
        })
    }

    /// Set the grade and clear the workbook.
    ///
    /// Returns the workbook-name lookup, or `None` for an empty grade.
    pub fn select_grade(&mut self, grade: &str) -> Option<LookupTicket> {
        self.bump_grade();
        self.grade = grade.trim().to_string();
        self.clear_workbook();

        if self.grade.is_empty() {
            return None;
        }
        Some(LookupTicket {
            generation: self.generations.grade,
            lookup: Lookup::WorkbookNames(
                WorkbookQuery::for_grade(self.grade.clone()).at(&self.school, &self.location),
            ),
        })
    }

    /// Term feeds no lookup; it only completes the selection.
    pub fn select_term(&mut self, term: Option<Term>) {
        self.term = term;
    }

    pub fn select_workbook(&mut self, workbook: &str) -> Result<(), DomainError> {
        let workbook = workbook.trim();
        if workbook.is_empty() {
            self.workbook.clear();
            return Ok(());
        }
        if !self.workbook_options.iter().any(|w| w == workbook) {
            return Err(DomainError::validation(format!(
                "'{workbook}' is not a workbook for the selected grade"
            )));
        }
        self.workbook = workbook.to_string();
        Ok(())
    }

    pub fn set_count(&mut self, raw: &str) {
        self.count = raw.trim().to_string();
    }

    pub fn set_remark(&mut self, raw: &str) {
        self.remark = raw.to_string();
    }

    // ─────────────────────────────────────────────────────────────────────
    // Lookup results
    // ─────────────────────────────────────────────────────────────────────

    /// Whether a response for `ticket` may still be applied.
    pub fn is_current(&self, ticket: &LookupTicket) -> bool {
        if self.closed {
            return false;
        }
        let current = match ticket.lookup {
            Lookup::Locations { .. } => self.generations.school,
            Lookup::ReportingBranch { .. } => self.generations.location,
            Lookup::WorkbookNames(_) => self.generations.grade,
        };
        current == ticket.generation
    }

    /// Store the location options for the school the ticket was issued for.
    ///
    /// A single location is auto-selected; the returned ticket is the
    /// reporting-branch lookup for it. Stale tickets change nothing.
    pub fn apply_locations(
        &mut self,
        ticket: &LookupTicket,
        locations: Vec<String>,
    ) -> Option<LookupTicket> {
        if !matches!(ticket.lookup, Lookup::Locations { .. }) || !self.is_current(ticket) {
            tracing::debug!(generation = ticket.generation, "discarding stale location list");
            return None;
        }

        self.location_options = locations;
        match self.location_options.as_slice() {
            [only] => {
                let only = only.clone();
                self.select_location(&only)
            }
            _ => None,
        }
    }

    /// Returns whether the branch was applied.
    pub fn apply_reporting_branch(&mut self, ticket: &LookupTicket, branch: String) -> bool {
        if !matches!(ticket.lookup, Lookup::ReportingBranch { .. }) || !self.is_current(ticket) {
            tracing::debug!(generation = ticket.generation, "discarding stale reporting branch");
            return false;
        }
        self.reporting_branch = branch.trim().to_string();
        true
    }

    /// Returns whether the options were applied. Never auto-selects.
    pub fn apply_workbook_options(&mut self, ticket: &LookupTicket, options: Vec<String>) -> bool {
        if !matches!(ticket.lookup, Lookup::WorkbookNames(_)) || !self.is_current(ticket) {
            tracing::debug!(generation = ticket.generation, "discarding stale workbook options");
            return false;
        }
        self.workbook_options = options;
        if !self.workbook_options.contains(&self.workbook) {
            self.workbook.clear();
        }
        true
    }

    // ─────────────────────────────────────────────────────────────────────
    // Submission
    // ─────────────────────────────────────────────────────────────────────

    pub fn can_submit(&self) -> bool {
        !self.school.is_empty()
            && !self.location.is_empty()
            && !self.grade.is_empty()
            && self.term.is_some()
            && !self.workbook.is_empty()
            && !self.remark.trim().is_empty()
            && Quantity::parse(&self.count, "Count").is_ok()
    }

    /// Build the record to send, or the first reason the form is incomplete.
    pub fn to_record(&self, submitted_by: &str) -> Result<SubmitRecord, ResolverError> {
        if self.school.is_empty() {
            return Err(DomainError::required("School").into());
        }
        if self.location.is_empty() {
            return Err(DomainError::required("Location").into());
        }
        if self.grade.is_empty() {
            return Err(DomainError::required("Grade").into());
        }
        let Some(term) = self.term else {
            return Err(DomainError::required("Term").into());
        };
        if self.workbook.is_empty() {
            if self.workbook_options.is_empty() {
                return Err(ResolverError::NoWorkbookConfigured {
                    grade: self.grade.clone(),
                    school: self.school.clone(),
                    location: self.location.clone(),
                });
            }
            return Err(DomainError::validation("Workbook must be selected").into());
        }
        let count = Quantity::parse(&self.count, "Count")?;
        if self.remark.trim().is_empty() {
            return Err(DomainError::required("Remark").into());
        }

        Ok(SubmitRecord {
            school: self.school.clone(),
            location: self.location.clone(),
            grade: self.grade.clone(),
            term,
            workbook: self.workbook.clone(),
            count,
            remark: self.remark.trim().to_string(),
            submitted_by: submitted_by.to_string(),
        })
    }

    /// Start a fresh selection. Outstanding lookups become stale.
    pub fn reset(&mut self) {
        let generations = self.generations;
        *self = Self {
            generations,
            closed: self.closed,
            ..Self::default()
        };
        self.bump_school();
    }

    /// End the form session; no lookup result is applied afterwards.
    pub fn close(&mut self) {
        self.reset();
        self.closed = true;
    }
}
