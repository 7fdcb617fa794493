use super::models::{GeneratedSchedule, PdfFile, Reminder, ReminderDraft};
use crate::components::store::{keys, LocalStore};
use crate::config::Config;
use crate::error::{api_error, auth_error, config_error, PlannerResult};
use crate::utils::analytics::{direct_server_response_handler, AnalyticsRecord};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Bearer-authenticated client for the remote planner API.
///
/// The token is read from the local store on every request, so a token
/// saved while the client is running is picked up immediately.
#[derive(Clone)]
pub struct ApiClient {
    base_url: Url,
    client: Client,
    store: Arc<dyn LocalStore>,
}

impl ApiClient {
    /// Create a client for `api_url` using an existing HTTP client
    pub fn new(api_url: &str, store: Arc<dyn LocalStore>, client: Client) -> PlannerResult<Self> {
        let base_url = Url::parse(api_url)
            .map_err(|e| config_error(&format!("Invalid API URL {}: {}", api_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(config_error(&format!("API URL {} cannot be a base", api_url)));
        }

        Ok(Self {
            base_url,
            client,
            store,
        })
    }

    /// Create a client from the application configuration
    pub fn from_config(config: &Config, store: Arc<dyn LocalStore>) -> PlannerResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Self::new(&config.api_url, store, client)
    }

    fn endpoint(&self, segments: &[&str]) -> PlannerResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| config_error("API URL cannot be a base"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn bearer_token(&self) -> PlannerResult<String> {
        self.store
            .get(keys::TOKEN)
            .await?
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| auth_error("No authentication token found"))
    }

    /// Start an authorized request; fails before any I/O when there is no token
    async fn request(&self, method: Method, segments: &[&str]) -> PlannerResult<RequestBuilder> {
        let token = self.bearer_token().await?;
        let url = self.endpoint(segments)?;
        debug!("{} {}", method, url);
        Ok(self.client.request(method, url).bearer_auth(token))
    }

    async fn send(&self, request: RequestBuilder) -> PlannerResult<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Could not read error response".to_string());
        Err(api_error(status.as_u16(), &error_message(status, &body)))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> PlannerResult<T> {
        let response = self.send(request).await?;
        Ok(response.json::<T>().await?)
    }

    /// List all reminders
    pub async fn get_reminders(&self) -> PlannerResult<Vec<Reminder>> {
        let request = self.request(Method::GET, &["reminders"]).await?;
        self.send_json(request).await
    }

    /// Create a reminder and return it as stored
    pub async fn create_reminder(&self, draft: &ReminderDraft) -> PlannerResult<Reminder> {
        let request = self.request(Method::POST, &["reminders"]).await?;
        self.send_json(request.json(draft)).await
    }

    /// Replace the fields of an existing reminder
    pub async fn update_reminder(&self, id: &str, draft: &ReminderDraft) -> PlannerResult<Reminder> {
        let request = self.request(Method::PUT, &["reminders", id]).await?;
        self.send_json(request.json(draft)).await
    }

    /// Delete a reminder
    pub async fn delete_reminder(&self, id: &str) -> PlannerResult<()> {
        let request = self.request(Method::DELETE, &["reminders", id]).await?;
        self.send(request).await?;
        Ok(())
    }

    /// Upload a PDF for later use
    pub async fn upload_pdf(&self, file: PdfFile) -> PlannerResult<Value> {
        let form = Form::new().part("file", pdf_part(file)?);
        let request = self.request(Method::POST, &["pdf", "upload"]).await?;
        self.send_json(request.multipart(form)).await
    }

    /// Have the API extract the contents of a PDF
    pub async fn parse_pdf(&self, file: PdfFile) -> PlannerResult<Value> {
        let form = Form::new().part("file", pdf_part(file)?);
        let request = self.request(Method::POST, &["pdf", "parse"]).await?;
        self.send_json(request.multipart(form)).await
    }

    /// Generate a study schedule from course PDFs.
    ///
    /// Stored preferences are attached when present. Task times in the
    /// returned schedule are normalized.
    pub async fn generate_schedule(&self, files: Vec<PdfFile>) -> PlannerResult<GeneratedSchedule> {
        info!("Generating schedule from {} file(s)", files.len());

        let mut form = Form::new();
        for file in files {
            form = form.part("files", pdf_part(file)?);
        }
        if let Some(preferences) = self.store.get(keys::USER_PREFERENCES).await? {
            form = form.text("preferences", preferences);
        }

        let request = self.request(Method::POST, &["schedule", "generate"]).await?;
        let response: Value = self.send_json(request.multipart(form)).await?;
        Ok(GeneratedSchedule::from_response(response))
    }

    /// Fetch admin analytics, normalized whatever shape the server sends
    pub async fn fetch_analytics(&self) -> PlannerResult<AnalyticsRecord> {
        let request = self.request(Method::GET, &["admin", "analytics"]).await?;
        let response: Value = self.send_json(request).await?;
        Ok(direct_server_response_handler(&response))
    }
}

fn pdf_part(file: PdfFile) -> PlannerResult<Part> {
    Ok(Part::bytes(file.bytes)
        .file_name(file.file_name)
        .mime_str("application/pdf")?)
}

/// The server's own message when the body carries one
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        let message = ["message", "error"]
            .iter()
            .find_map(|field| value.get(field).and_then(Value::as_str));
        if let Some(message) = message {
            return message.to_string();
        }
    }

    let body = body.trim();
    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    } else {
        body.to_string()
    }
}
