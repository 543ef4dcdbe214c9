//! Async driver for the dependent-selection chain.

use std::sync::Arc;

use tokio::sync::Mutex;

use schoolops_auth::Session;
use schoolops_core::{DomainError, Term};

use crate::catalog::{CatalogService, SubmitReceipt};
use crate::error::ResolverError;
use crate::state::{Lookup, LookupTicket, SelectionState};

/// Top-level pickers, loaded once per form session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormOptions {
    pub schools: Vec<String>,
    pub grades: Vec<String>,
}

#[derive(Debug, Default)]
struct FormSession {
    selection: SelectionState,
    options: FormOptions,
    submitting: bool,
}

/// Drives one form session against a [`CatalogService`].
///
/// The handle is cheap to clone. Each operation locks the session only to
/// mutate it, never across a request, so a handler for one field can run
/// while a lookup for another is still outstanding. Responses that no longer
/// match the current selection are dropped (see [`SelectionState`]).
pub struct Resolver<C: ?Sized> {
    catalog: Arc<C>,
    session: Arc<Mutex<FormSession>>,
}

impl<C: ?Sized> Clone for Resolver<C> {
    fn clone(&self) -> Self {
        Self {
            catalog: Arc::clone(&self.catalog),
            session: Arc::clone(&self.session),
        }
    }
}

impl<C> Resolver<C>
where
    C: CatalogService + ?Sized,
{
    pub fn new(catalog: Arc<C>) -> Self {
        Self {
            catalog,
            session: Arc::new(Mutex::new(FormSession::default())),
        }
    }

    /// Copy of the current selection, for rendering.
    pub async fn snapshot(&self) -> SelectionState {
        self.session.lock().await.selection.clone()
    }

    pub async fn options(&self) -> FormOptions {
        self.session.lock().await.options.clone()
    }

    pub async fn can_submit(&self) -> bool {
        self.session.lock().await.selection.can_submit()
    }

    /// Fetch schools and grades. A failed lookup leaves its list empty.
    pub async fn load_options(&self) {
        let (schools, grades) =
            tokio::join!(self.catalog.list_schools(), self.catalog.list_grades());

        let schools = schools.unwrap_or_else(|err| {
            tracing::warn!(error = %err, "school list unavailable");
            Vec::new()
        });
        let grades = grades.unwrap_or_else(|err| {
            tracing::warn!(error = %err, "grade list unavailable");
            Vec::new()
        });

        let mut session = self.session.lock().await;
        if session.selection.is_closed() {
            return;
        }
        session.options = FormOptions { schools, grades };
    }

    pub async fn select_school(&self, school: &str) {
        let ticket = self.session.lock().await.selection.select_school(school);
        if let Some(ticket) = ticket {
            self.run(ticket).await;
        }
    }

    pub async fn select_location(&self, location: &str) {
        let ticket = self.session.lock().await.selection.select_location(location);
        if let Some(ticket) = ticket {
            self.run(ticket).await;
        }
    }

    pub async fn select_grade(&self, grade: &str) {
        let ticket = self.session.lock().await.selection.select_grade(grade);
        if let Some(ticket) = ticket {
            self.run(ticket).await;
        }
    }

    pub async fn select_term(&self, term: Option<Term>) {
        self.session.lock().await.selection.select_term(term);
    }

    pub async fn select_workbook(&self, workbook: &str) -> Result<(), ResolverError> {
        self.session
            .lock()
            .await
            .selection
            .select_workbook(workbook)
            .map_err(ResolverError::from)
    }

    pub async fn set_count(&self, raw: &str) {
        self.session.lock().await.selection.set_count(raw);
    }

    pub async fn set_remark(&self, raw: &str) {
        self.session.lock().await.selection.set_remark(raw);
    }

    /// Send the completed form as `session`'s user.
    ///
    /// On success the selection starts over, unless the user changed the form
    /// while the request was out; those edits are kept. On failure the
    /// selection is left exactly as it was so the user can retry.
    pub async fn submit(&self, session: &Session) -> Result<SubmitReceipt, ResolverError> {
        let record = {
            let mut form = self.session.lock().await;
            if form.submitting {
                return Err(DomainError::conflict("Submission already in progress").into());
            }
            let record = form.selection.to_record(session.submitter())?;
            form.submitting = true;
            record
        };

        let result = self.catalog.submit_record(&record).await;

        let mut form = self.session.lock().await;
        form.submitting = false;
        match result {
            Ok(receipt) => {
                let unchanged = form
                    .selection
                    .to_record(session.submitter())
                    .is_ok_and(|current| current == record);
                if unchanged {
                    form.selection.reset();
                } else {
                    tracing::debug!("form edited during submission; keeping the edits");
                }
                tracing::info!(
                    session_id = %session.id(),
                    school = %record.school,
                    grade = %record.grade,
                    term = record.term.number(),
                    workbook = %record.workbook,
                    count = record.count.get(),
                    "workbook count submitted"
                );
                Ok(receipt)
            }
            Err(err) => {
                tracing::warn!(session_id = %session.id(), error = %err, "submission failed");
                Err(err.into())
            }
        }
    }

    /// Leave the form. Responses still in flight are discarded on arrival.
    pub async fn close(&self) {
        self.session.lock().await.selection.close();
    }

    /// Run one lookup and whatever it chains into.
    async fn run(&self, ticket: LookupTicket) {
        let mut next = Some(ticket);
        while let Some(ticket) = next.take() {
            next = match ticket.lookup() {
                Lookup::Locations { school } => {
                    let locations = self.catalog.list_locations(school).await.unwrap_or_else(|err| {
                        tracing::warn!(%school, error = %err, "location lookup failed");
                        Vec::new()
                    });
                    self.session
                        .lock()
                        .await
                        .selection
                        .apply_locations(&ticket, locations)
                }
                Lookup::ReportingBranch { school, location } => {
                    let branch = self
                        .catalog
                        .reporting_branch(school, location)
                        .await
                        .unwrap_or_else(|err| {
                            tracing::warn!(%school, %location, error = %err, "reporting branch lookup failed");
                            String::new()
                        });
                    self.session
                        .lock()
                        .await
                        .selection
                        .apply_reporting_branch(&ticket, branch);
                    None
                }
                Lookup::WorkbookNames(query) => {
                    let options = self
                        .catalog
                        .list_workbook_names(query)
                        .await
                        .unwrap_or_else(|err| {
                            tracing::warn!(grade = %query.grade, error = %err, "workbook lookup failed");
                            Vec::new()
                        });
                    self.session
                        .lock()
                        .await
                        .selection
                        .apply_workbook_options(&ticket, options);
                    None
                }
            };
        }
    }
}
