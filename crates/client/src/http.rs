//! REST adapter for every service port, over `reqwest`.

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use schoolops_auth::{AuthError, Authenticator, Credentials, LoginGrant, Role};
use schoolops_core::{
    InventoryItemId, Quantity, SchoolEntryId, SubmissionId, TransportError, UserId,
};
use schoolops_dashboard::{
    Delivery, NewSchoolEntry, NewUser, SchoolDataService, SchoolEntry, Submission,
    SubmissionService, UserAccount, UserAdminService,
};
use schoolops_inventory::{InventoryItem, InventoryService, NewInventoryItem};
use schoolops_resolver::{CatalogService, SubmitReceipt, SubmitRecord, WorkbookQuery};

use crate::config::ClientConfig;
use crate::wire::{
    Ack, EmailBody, InventoryRow, LoginReply, MarkDeliveredBody, NewUserBody, QuantityBody,
    ReportingBranchReply, ResetBody, Scalar, SchoolEntryRow, SubmissionRow, UserInfoReply,
    UserRow, WorkbookNames,
};

/// Client for the school operations REST service.
///
/// One connection pool is shared by every clone of the inner `reqwest`
/// client; wrap the backend in an `Arc` to share it between components.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send and map non-2xx statuses to [`TransportError::Api`], preferring
    /// the `message` of an error envelope over the raw body.
    async fn send(&self, req: RequestBuilder) -> Result<Response, TransportError> {
        let resp = req
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = resp.status();
        tracing::debug!(status = status.as_u16(), url = %resp.url(), "backend response");
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Ack>(&body)
            .ok()
            .and_then(|ack| ack.message)
            .unwrap_or(body);
        Err(TransportError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn fetch<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, TransportError> {
        self.send(req)
            .await?
            .json::<T>()
            .await
            .map_err(|e| TransportError::Parse(e.to_string()))
    }

    async fn ack(&self, req: RequestBuilder, fallback: &str) -> Result<Ack, TransportError> {
        self.fetch::<Ack>(req).await?.into_result(fallback)
    }

    async fn rows<R, T>(&self, path: &str) -> Result<Vec<T>, TransportError>
    where
        R: DeserializeOwned,
        T: TryFrom<R, Error = TransportError>,
    {
        let raw: Vec<R> = self.fetch(self.client.get(self.url(path))).await?;
        raw.into_iter().map(T::try_from).collect()
    }
}

fn auth_error(err: TransportError) -> AuthError {
    match err {
        TransportError::Rejected(message) => AuthError::Rejected(message),
        TransportError::Api { status, message } if (400..500).contains(&status) && !message.is_empty() => {
            AuthError::Rejected(message)
        }
        other => AuthError::Transport(other.to_string()),
    }
}

#[async_trait]
impl CatalogService for HttpBackend {
    async fn list_schools(&self) -> Result<Vec<String>, TransportError> {
        self.fetch(self.client.get(self.url("/schools"))).await
    }

    async fn list_locations(&self, school: &str) -> Result<Vec<String>, TransportError> {
        let req = self.client.get(self.url("/locations")).query(&[("school", school)]);
        self.fetch(req).await
    }

    async fn reporting_branch(&self, school: &str, location: &str) -> Result<String, TransportError> {
        let req = self
            .client
            .get(self.url("/reporting_branch"))
            .query(&[("school", school), ("location", location)]);
        match self.fetch::<ReportingBranchReply>(req).await {
            Ok(reply) => Ok(reply.reporting_branch.unwrap_or_default()),
            Err(TransportError::Api { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Ok(String::new())
            }
            Err(err) => Err(err),
        }
    }

    async fn list_grades(&self) -> Result<Vec<String>, TransportError> {
        let grades: Vec<Scalar> = self.fetch(self.client.get(self.url("/grades"))).await?;
        Ok(grades.into_iter().map(Scalar::into_text).collect())
    }

    async fn list_workbook_names(&self, query: &WorkbookQuery) -> Result<Vec<String>, TransportError> {
        let req = self.client.get(self.url("/workbook_name")).query(query);
        let names: WorkbookNames = self.fetch(req).await?;
        Ok(names.into_names())
    }

    async fn submit_record(&self, record: &SubmitRecord) -> Result<SubmitReceipt, TransportError> {
        let req = self.client.post(self.url("/submit")).json(record);
        let ack = self.ack(req, "Submission was not accepted").await?;
        Ok(SubmitReceipt {
            id: ack.id.map(SubmissionId::new),
            message: ack.message,
        })
    }
}

#[async_trait]
impl InventoryService for HttpBackend {
    async fn list_inventory(&self) -> Result<Vec<InventoryItem>, TransportError> {
        self.rows::<InventoryRow, _>("/admin/workbooks").await
    }

    async fn update_inventory_quantity(
        &self,
        id: InventoryItemId,
        quantity: Quantity,
    ) -> Result<(), TransportError> {
        let req = self
            .client
            .put(self.url(&format!("/admin/workbooks/{id}")))
            .json(&QuantityBody { quantity: quantity.get() });
        self.ack(req, "Update failed").await.map(drop)
    }

    async fn create_inventory_item(
        &self,
        item: &NewInventoryItem,
    ) -> Result<InventoryItemId, TransportError> {
        let req = self.client.post(self.url("/admin/workbooks")).json(item);
        let ack = self.ack(req, "Could not add workbook").await?;
        ack.require_id().map(InventoryItemId::new)
    }

    async fn delete_inventory_item(&self, id: InventoryItemId) -> Result<(), TransportError> {
        let req = self.client.delete(self.url(&format!("/admin/workbooks/{id}")));
        self.ack(req, "Delete failed").await.map(drop)
    }
}

#[async_trait]
impl SubmissionService for HttpBackend {
    async fn list_submissions(&self) -> Result<Vec<Submission>, TransportError> {
        self.rows::<SubmissionRow, _>("/admin/form-submissions").await
    }

    async fn delete_submission(&self, id: SubmissionId) -> Result<(), TransportError> {
        let req = self.client.delete(self.url(&format!("/admin/form-submissions/{id}")));
        self.ack(req, "Delete failed").await.map(drop)
    }

    async fn mark_delivered(
        &self,
        ids: &[SubmissionId],
        delivered: Delivery,
    ) -> Result<u64, TransportError> {
        let body = MarkDeliveredBody {
            ids: ids.iter().map(|id| id.get()).collect(),
            delivered: delivered.as_str(),
        };
        let req = self.client.put(self.url("/admin/mark-delivered")).json(&body);
        let ack = self.ack(req, "Update failed").await?;
        Ok(ack.updated.unwrap_or(ids.len() as u64))
    }
}

#[async_trait]
impl SchoolDataService for HttpBackend {
    async fn list_school_entries(&self) -> Result<Vec<SchoolEntry>, TransportError> {
        self.rows::<SchoolEntryRow, _>("/admin/entries").await
    }

    async fn create_school_entry(
        &self,
        entry: &NewSchoolEntry,
    ) -> Result<SchoolEntryId, TransportError> {
        let req = self.client.post(self.url("/admin/entries")).json(entry);
        let ack = self.ack(req, "Could not add school").await?;
        ack.require_id().map(SchoolEntryId::new)
    }

    async fn update_school_entry(&self, entry: &SchoolEntry) -> Result<(), TransportError> {
        let req = self
            .client
            .put(self.url(&format!("/admin/update/{}", entry.id)))
            .json(entry);
        self.ack(req, "Update failed").await.map(drop)
    }

    async fn delete_school_entry(&self, id: SchoolEntryId) -> Result<(), TransportError> {
        let req = self.client.delete(self.url(&format!("/admin/delete/{id}")));
        self.ack(req, "Delete failed").await.map(drop)
    }
}

#[async_trait]
impl UserAdminService for HttpBackend {
    async fn list_users(&self) -> Result<Vec<UserAccount>, TransportError> {
        let rows: Vec<UserRow> = self.fetch(self.client.get(self.url("/admin/users"))).await?;
        Ok(rows.into_iter().map(UserAccount::from).collect())
    }

    async fn create_user(&self, user: &NewUser) -> Result<UserId, TransportError> {
        let req = self
            .client
            .post(self.url("/admin/users"))
            .json(&NewUserBody::from(user));
        let ack = self.ack(req, "User creation failed").await?;
        ack.require_id().map(UserId::new)
    }

    async fn update_user(&self, id: UserId, user: &NewUser) -> Result<(), TransportError> {
        let req = self
            .client
            .put(self.url(&format!("/admin/users/{id}")))
            .json(&NewUserBody::from(user));
        self.ack(req, "Update failed").await.map(drop)
    }

    async fn delete_user(&self, id: UserId) -> Result<(), TransportError> {
        let req = self.client.delete(self.url(&format!("/admin/users/{id}")));
        self.ack(req, "Delete failed").await.map(drop)
    }
}

#[async_trait]
impl Authenticator for HttpBackend {
    async fn login(&self, credentials: &Credentials) -> Result<LoginGrant, AuthError> {
        let req = self.client.post(self.url("/login")).json(credentials);
        let reply = match self.fetch::<LoginReply>(req).await {
            Ok(reply) => reply,
            Err(TransportError::Api { status, .. }) if status == StatusCode::UNAUTHORIZED.as_u16() => {
                return Err(AuthError::InvalidCredentials);
            }
            Err(err) => return Err(auth_error(err)),
        };
        if !reply.success {
            tracing::debug!(message = ?reply.message, "login refused");
            return Err(AuthError::InvalidCredentials);
        }
        Ok(LoginGrant {
            email: reply.email.unwrap_or_else(|| credentials.email.clone()),
            role: reply.role.map(Role::new).unwrap_or_default(),
        })
    }

    async fn display_name(&self, email: &str) -> Result<Option<String>, AuthError> {
        let req = self.client.get(self.url("/user-info")).query(&[("email", email)]);
        match self.fetch::<UserInfoReply>(req).await {
            Ok(reply) if reply.success => Ok(reply.name.filter(|n| !n.trim().is_empty())),
            Ok(_) => Ok(None),
            Err(TransportError::Api { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => Ok(None),
            Err(err) => Err(auth_error(err)),
        }
    }

    async fn request_password_reset(&self, email: &str) -> Result<String, AuthError> {
        let req = self.client.post(self.url("/forgot-password")).json(&EmailBody { email });
        let ack = self
            .ack(req, "Could not process request")
            .await
            .map_err(auth_error)?;
        Ok(ack
            .message
            .unwrap_or_else(|| "Check your email for instructions".to_string()))
    }

    async fn reset_password(&self, token: &str, new_password: &str) -> Result<String, AuthError> {
        let body = ResetBody {
            token,
            password: new_password,
        };
        let req = self.client.post(self.url("/reset-password")).json(&body);
        let ack = self
            .ack(req, "Password reset failed")
            .await
            .map_err(auth_error)?;
        Ok(ack
            .message
            .unwrap_or_else(|| "Password reset successful".to_string()))
    }
}
