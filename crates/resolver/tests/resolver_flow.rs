use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use schoolops_auth::{Role, Session};
use schoolops_core::{SubmissionId, Term, TransportError};
use schoolops_resolver::{
    CatalogService, Resolver, ResolverError, SubmitReceipt, SubmitRecord, WorkbookQuery,
};

/// Scriptable catalog. Lookups for schools in `held` wait for `release`.
#[derive(Default)]
struct FakeCatalog {
    locations: HashMap<String, Vec<String>>,
    branches: HashMap<(String, String), String>,
    workbooks: HashMap<String, Vec<String>>,
    fail_lookups: bool,
    fail_submit: bool,
    hold_submit: bool,
    held: HashSet<String>,
    release: Notify,
    calls: Mutex<Vec<String>>,
    submitted: Mutex<Vec<SubmitRecord>>,
}

impl FakeCatalog {
    fn greenwood() -> Self {
        let mut fake = FakeCatalog::default();
        fake.locations.insert("Greenwood".into(), vec!["Main Campus".into()]);
        fake.locations
            .insert("Oakridge".into(), vec!["East".into(), "West".into()]);
        fake.branches.insert(
            ("Greenwood".into(), "Main Campus".into()),
            "North Branch".into(),
        );
        fake.branches
            .insert(("Oakridge".into(), "West".into()), "South Branch".into());
        fake.workbooks
            .insert("5".into(), vec!["Maths 5".into(), "English 5".into()]);
        fake.workbooks.insert("6".into(), vec!["Maths 6".into()]);
        fake
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogService for FakeCatalog {
    async fn list_schools(&self) -> Result<Vec<String>, TransportError> {
        if self.fail_lookups {
            return Err(TransportError::Network("offline".into()));
        }
        let mut schools: Vec<String> = self.locations.keys().cloned().collect();
        schools.sort();
        Ok(schools)
    }

    async fn list_locations(&self, school: &str) -> Result<Vec<String>, TransportError> {
        self.record(format!("locations:{school}"));
        if self.held.contains(school) {
            self.release.notified().await;
        }
        if self.fail_lookups {
            return Err(TransportError::Network("offline".into()));
        }
        Ok(self.locations.get(school).cloned().unwrap_or_default())
    }

    async fn reporting_branch(&self, school: &str, location: &str) -> Result<String, TransportError> {
        self.record(format!("branch:{school}/{location}"));
        if self.fail_lookups {
            return Err(TransportError::Api { status: 500, message: "boom".into() });
        }
        Ok(self
            .branches
            .get(&(school.to_string(), location.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn list_grades(&self) -> Result<Vec<String>, TransportError> {
        if self.fail_lookups {
            return Err(TransportError::Network("offline".into()));
        }
        Ok(vec!["5".into(), "6".into()])
    }

    async fn list_workbook_names(&self, query: &WorkbookQuery) -> Result<Vec<String>, TransportError> {
        self.record(format!("workbooks:{}", query.grade));
        if self.fail_lookups {
            return Err(TransportError::Network("offline".into()));
        }
        Ok(self.workbooks.get(&query.grade).cloned().unwrap_or_default())
    }

    async fn submit_record(&self, record: &SubmitRecord) -> Result<SubmitReceipt, TransportError> {
        self.record(format!("submit:{}", record.workbook));
        if self.hold_submit {
            self.release.notified().await;
        }
        if self.fail_submit {
            return Err(TransportError::Network("connection reset".into()));
        }
        self.submitted.lock().unwrap().push(record.clone());
        Ok(SubmitReceipt {
            id: Some(SubmissionId::new(101)),
            message: Some("Form submitted successfully".into()),
        })
    }
}

fn field_worker() -> Session {
    Session::new("ana@school.org", Role::user(), "Ana")
}

async fn fill_form(resolver: &Resolver<FakeCatalog>) {
    resolver.select_school("Greenwood").await;
    resolver.select_grade("5").await;
    resolver.select_term(Some(Term::First)).await;
    resolver.select_workbook("English 5").await.unwrap();
    resolver.set_count("40").await;
    resolver.set_remark("received in full").await;
}

#[tokio::test]
async fn single_location_school_auto_fills_location_and_branch() {
    let catalog = Arc::new(FakeCatalog::greenwood());
    let resolver = Resolver::new(Arc::clone(&catalog));

    resolver.select_school("Greenwood").await;

    let state = resolver.snapshot().await;
    assert_eq!(state.location(), "Main Campus");
    assert_eq!(state.reporting_branch(), "North Branch");
    assert_eq!(
        catalog.calls(),
        ["locations:Greenwood", "branch:Greenwood/Main Campus"]
    );
}

#[tokio::test]
async fn multi_location_school_waits_for_a_pick() {
    let catalog = Arc::new(FakeCatalog::greenwood());
    let resolver = Resolver::new(Arc::clone(&catalog));

    resolver.select_school("Oakridge").await;
    let state = resolver.snapshot().await;
    assert_eq!(state.location(), "");
    assert_eq!(state.location_options(), ["East", "West"]);

    resolver.select_location("West").await;
    assert_eq!(resolver.snapshot().await.reporting_branch(), "South Branch");
}

#[tokio::test]
async fn failed_lookups_degrade_to_empty_fields() {
    let catalog = Arc::new(FakeCatalog {
        fail_lookups: true,
        ..FakeCatalog::greenwood()
    });
    let resolver = Resolver::new(Arc::clone(&catalog));

    resolver.load_options().await;
    resolver.select_school("Greenwood").await;
    resolver.select_location("Main Campus").await;
    resolver.select_grade("5").await;

    let options = resolver.options().await;
    assert!(options.schools.is_empty());
    assert!(options.grades.is_empty());

    let state = resolver.snapshot().await;
    assert_eq!(state.reporting_branch(), "");
    assert!(state.workbook_options().is_empty());
}

#[tokio::test]
async fn term_change_does_not_refetch_workbooks() {
    let catalog = Arc::new(FakeCatalog::greenwood());
    let resolver = Resolver::new(Arc::clone(&catalog));

    resolver.select_school("Greenwood").await;
    resolver.select_grade("5").await;
    resolver.select_term(Some(Term::Second)).await;
    resolver.select_term(Some(Term::Third)).await;

    let workbook_calls = catalog
        .calls()
        .into_iter()
        .filter(|c| c.starts_with("workbooks:"))
        .count();
    assert_eq!(workbook_calls, 1);
}

#[tokio::test]
async fn late_response_for_previous_school_is_discarded() {
    let mut fake = FakeCatalog::greenwood();
    fake.locations.insert("Alpha".into(), vec!["Alpha Hall".into()]);
    fake.held.insert("Alpha".into());
    let catalog = Arc::new(fake);
    let resolver = Resolver::new(Arc::clone(&catalog));

    let slow = tokio::spawn({
        let resolver = resolver.clone();
        async move { resolver.select_school("Alpha").await }
    });
    while !catalog.calls().iter().any(|c| c == "locations:Alpha") {
        tokio::task::yield_now().await;
    }

    resolver.select_school("Greenwood").await;
    catalog.release.notify_one();
    slow.await.unwrap();

    let state = resolver.snapshot().await;
    assert_eq!(state.school(), "Greenwood");
    assert_eq!(state.location(), "Main Campus");
    assert_eq!(state.location_options(), ["Main Campus"]);
    assert!(!catalog.calls().iter().any(|c| c.starts_with("branch:Alpha")));
}

#[tokio::test]
async fn closing_the_form_discards_in_flight_lookups() {
    let mut fake = FakeCatalog::greenwood();
    fake.held.insert("Greenwood".into());
    let catalog = Arc::new(fake);
    let resolver = Resolver::new(Arc::clone(&catalog));

    let pending = tokio::spawn({
        let resolver = resolver.clone();
        async move { resolver.select_school("Greenwood").await }
    });
    while catalog.calls().is_empty() {
        tokio::task::yield_now().await;
    }

    resolver.close().await;
    catalog.release.notify_one();
    pending.await.unwrap();

    let state = resolver.snapshot().await;
    assert!(state.is_closed());
    assert_eq!(state.location(), "");
    assert_eq!(catalog.calls(), ["locations:Greenwood"]);
}

#[tokio::test]
async fn successful_submit_resets_the_form() {
    let catalog = Arc::new(FakeCatalog::greenwood());
    let resolver = Resolver::new(Arc::clone(&catalog));
    fill_form(&resolver).await;
    assert!(resolver.can_submit().await);

    let receipt = resolver.submit(&field_worker()).await.unwrap();
    assert_eq!(receipt.id, Some(SubmissionId::new(101)));

    let sent = catalog.submitted.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].school, "Greenwood");
    assert_eq!(sent[0].location, "Main Campus");
    assert_eq!(sent[0].workbook, "English 5");
    assert_eq!(sent[0].submitted_by, "ana@school.org");

    let state = resolver.snapshot().await;
    assert_eq!(state.school(), "");
    assert_eq!(state.count(), "");
    assert!(!resolver.can_submit().await);
}

#[tokio::test]
async fn edits_made_during_submit_survive_the_acknowledgment() {
    let catalog = Arc::new(FakeCatalog {
        hold_submit: true,
        ..FakeCatalog::greenwood()
    });
    let resolver = Resolver::new(Arc::clone(&catalog));
    fill_form(&resolver).await;
    let session = field_worker();

    let edit = async {
        while !catalog.calls().iter().any(|c| c == "submit:English 5") {
            tokio::task::yield_now().await;
        }
        resolver.set_count("12").await;
        resolver.select_workbook("Maths 5").await.unwrap();
        catalog.release.notify_one();
    };
    let (receipt, ()) = tokio::join!(resolver.submit(&session), edit);
    receipt.unwrap();

    let state = resolver.snapshot().await;
    assert_eq!(state.school(), "Greenwood");
    assert_eq!(state.workbook(), "Maths 5");
    assert_eq!(state.count(), "12");
    assert!(resolver.can_submit().await);
    assert_eq!(catalog.submitted.lock().unwrap()[0].count.get(), 40);
}

#[tokio::test]
async fn failed_submit_keeps_the_form_for_retry() {
    let catalog = Arc::new(FakeCatalog {
        fail_submit: true,
        ..FakeCatalog::greenwood()
    });
    let resolver = Resolver::new(Arc::clone(&catalog));
    fill_form(&resolver).await;
    let before = resolver.snapshot().await;

    let err = resolver.submit(&field_worker()).await.unwrap_err();
    assert!(matches!(err, ResolverError::Transport(_)));
    assert_eq!(resolver.snapshot().await, before);
    assert!(resolver.can_submit().await);
}

#[tokio::test]
async fn incomplete_form_is_rejected_without_a_request() {
    let catalog = Arc::new(FakeCatalog::greenwood());
    let resolver = Resolver::new(Arc::clone(&catalog));
    resolver.select_school("Greenwood").await;

    let err = resolver.submit(&field_worker()).await.unwrap_err();
    assert_eq!(err.to_string(), "Grade must be filled");
    assert!(catalog.submitted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn grade_without_workbooks_explains_the_block() {
    let catalog = Arc::new(FakeCatalog::greenwood());
    let resolver = Resolver::new(Arc::clone(&catalog));
    resolver.select_school("Greenwood").await;
    resolver.select_grade("9").await;
    resolver.select_term(Some(Term::First)).await;
    resolver.set_count("3").await;
    resolver.set_remark("x").await;

    let err = resolver.submit(&field_worker()).await.unwrap_err();
    assert!(matches!(err, ResolverError::NoWorkbookConfigured { .. }));
    assert!(err.to_string().contains("grade 9"));
}
