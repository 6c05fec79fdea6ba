use std::sync::Arc;

use reqwest::{Client, multipart};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::api::types::{
    ContactOutcome, ContactSubmission, ErrorBody, ProjectDraft, ProjectListPayload, ProjectRecord,
    UploadedImage,
};
use crate::storage::TokenStore;

const DEFAULT_BASE_URL: &str = "https://back-end-api-gfl0.onrender.com";
const GENERIC_SERVER_ERROR: &str = "server error";

/// Uploads above this size are rejected locally, before any request is made.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("token storage error: {0}")]
    TokenStore(String),
    #[error("invalid upload: {0}")]
    InvalidUpload(String),
}

/// Typed client for the portfolio backend. Every method normalizes transport
/// failures into [`ApiError`]; nothing past this boundary sees a raw response.
///
/// Credentials are injected at construction rather than read from ambient
/// state; the token is loaded through the store on every call.
pub struct ProjectsClient<S: TokenStore> {
    http: Client,
    base_url: String,
    tokens: Arc<S>,
}

impl<S: TokenStore> ProjectsClient<S> {
    pub fn new(http: Client, tokens: Arc<S>) -> Self {
        Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            tokens,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn projects_url(&self) -> String {
        format!("{}/api/projects", self.base_url)
    }

    /// Fetch the full project list. The backend has shipped both a bare array
    /// and a `{"projects": [...]}` wrapper; both normalize to the same value.
    pub async fn list_projects(&self) -> Result<Vec<ProjectRecord>, ApiError> {
        let payload: ProjectListPayload = self
            .send_json(self.http.get(self.projects_url()), true)
            .await?;
        Ok(payload.into())
    }

    pub async fn get_project(&self, id: &str) -> Result<ProjectRecord, ApiError> {
        let url = format!("{}/{}", self.projects_url(), id);
        self.send_json(self.http.get(url), true).await
    }

    pub async fn create_project(&self, draft: &ProjectDraft) -> Result<ProjectRecord, ApiError> {
        self.send_json(self.http.post(self.projects_url()).json(draft), true)
            .await
    }

    pub async fn update_project(
        &self,
        id: &str,
        draft: &ProjectDraft,
    ) -> Result<ProjectRecord, ApiError> {
        let url = format!("{}/{}", self.projects_url(), id);
        self.send_json(self.http.put(url).json(draft), true).await
    }

    /// Delete a project. Success is decided by the HTTP status alone: any 2xx
    /// counts, the response body is ignored.
    pub async fn delete_project(&self, id: &str) -> Result<(), ApiError> {
        let url = format!("{}/{}", self.projects_url(), id);
        self.send(self.http.delete(url), true).await?;
        Ok(())
    }

    pub async fn list_categories(&self) -> Result<Vec<String>, ApiError> {
        let url = format!("{}/categories", self.projects_url());
        self.send_json(self.http.get(url), true).await
    }

    /// Upload an image as a multipart request. Oversized payloads and
    /// non-image files are rejected locally, before any request is made.
    pub async fn upload_image(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedImage, ApiError> {
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(ApiError::InvalidUpload(format!(
                "file exceeds the {MAX_UPLOAD_BYTES} byte limit"
            )));
        }
        let mime = image_mime(file_name, &bytes).ok_or_else(|| {
            ApiError::InvalidUpload("unsupported file type, expected an image".to_string())
        })?;

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime)?;
        let form = multipart::Form::new().part("image", part);

        let url = format!("{}/api/upload", self.base_url);
        self.send_json(self.http.post(url).multipart(form), true)
            .await
    }

    /// Submit the contact form. This endpoint is the one unauthenticated call
    /// the backend exposes.
    pub async fn submit_contact(
        &self,
        submission: &ContactSubmission,
    ) -> Result<ContactOutcome, ApiError> {
        let url = format!("{}/api/contact", self.base_url);
        self.send_json(self.http.post(url).json(submission), false)
            .await
    }

    async fn send_json<T>(
        &self,
        builder: reqwest::RequestBuilder,
        authenticated: bool,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let response = self.send(builder, authenticated).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(ApiError::Decode)
    }

    async fn send(
        &self,
        mut builder: reqwest::RequestBuilder,
        authenticated: bool,
    ) -> Result<reqwest::Response, ApiError> {
        if authenticated {
            let token = self
                .tokens
                .load_token()
                .await
                .map_err(|err| ApiError::TokenStore(err.to_string()))?;
            match token {
                Some(token) => builder = builder.bearer_auth(token),
                // Without a token the request goes out bare and the backend's
                // rejection surfaces as a Server error.
                None => debug!("no stored token, sending unauthenticated request"),
            }
        }

        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|parsed| parsed.message)
            .unwrap_or_else(|| GENERIC_SERVER_ERROR.to_string());
        warn!(status = status.as_u16(), %message, "request rejected by server");
        Err(ApiError::Server {
            status: status.as_u16(),
            message,
        })
    }
}

fn image_mime(file_name: &str, bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        return Some("image/png");
    }
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }
    if bytes.starts_with(b"GIF8") {
        return Some("image/gif");
    }
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return Some("image/webp");
    }

    // Fall back to the extension for files too short to sniff.
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("png") => Some("image/png"),
        Some("jpg" | "jpeg") => Some("image/jpeg"),
        Some("gif") => Some("image/gif"),
        Some("webp") => Some("image/webp"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StaticToken;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_client(server: &MockServer, token: StaticToken) -> ProjectsClient<StaticToken> {
        ProjectsClient::new(reqwest::Client::new(), Arc::new(token))
            .with_base_url(server.uri())
    }

    #[tokio::test]
    async fn list_projects_normalizes_bare_array() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/projects"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{"id": "1", "title": "A"}])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, StaticToken::new("secret"));
        let projects = client.list_projects().await.expect("list loads");

        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].id, "1");
        assert_eq!(projects[0].title, "A");
    }

    #[tokio::test]
    async fn list_projects_normalizes_wrapped_object() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/projects"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"projects": [{"id": "1", "title": "A"}]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, StaticToken::new("secret"));
        let projects = client.list_projects().await.expect("list loads");

        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].id, "1");
    }

    #[tokio::test]
    async fn missing_token_sends_no_authorization_header() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/projects"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/projects"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"message": "missing token"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, StaticToken::absent());
        let err = client
            .list_projects()
            .await
            .expect_err("unauthorized surfaces");

        match err {
            ApiError::Server { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "missing token");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn server_error_prefers_payload_message() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/projects/p9"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"message": "project not found"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, StaticToken::new("secret"));
        let err = client.get_project("p9").await.expect_err("404 surfaces");

        match err {
            ApiError::Server { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "project not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn server_error_without_payload_uses_generic_message() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/projects"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, StaticToken::new("secret"));
        let err = client.list_projects().await.expect_err("500 surfaces");

        match err {
            ApiError::Server { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, GENERIC_SERVER_ERROR);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn network_failure_is_a_network_error() {
        let client = ProjectsClient::new(reqwest::Client::new(), Arc::new(StaticToken::absent()))
            .with_base_url("http://127.0.0.1:1");

        let err = client
            .list_projects()
            .await
            .expect_err("unreachable server errors");
        assert!(matches!(err, ApiError::Network(_)));
    }

    #[tokio::test]
    async fn returns_decode_error_on_invalid_json() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/projects"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, StaticToken::new("secret"));
        let err = client.list_projects().await.expect_err("decode fails");
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn delete_succeeds_on_2xx_regardless_of_body() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/api/projects/p1"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_string("gone"))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, StaticToken::new("secret"));
        client.delete_project("p1").await.expect("delete succeeds");
    }

    #[tokio::test]
    async fn delete_failure_carries_server_message() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/api/projects/p1"))
            .respond_with(
                ResponseTemplate::new(403).set_body_json(json!({"message": "not allowed"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, StaticToken::new("secret"));
        let err = client.delete_project("p1").await.expect_err("403 surfaces");

        match err {
            ApiError::Server { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "not allowed");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_and_update_round_trip_drafts() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/projects"))
            .and(body_json(json!({"title": "New", "description": "d"})))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(json!({"id": "p1", "title": "New", "description": "d"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/api/projects/p1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": "p1", "title": "Renamed", "description": "d"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, StaticToken::new("secret"));
        let draft = ProjectDraft {
            title: "New".into(),
            description: "d".into(),
            ..ProjectDraft::default()
        };

        let created = client.create_project(&draft).await.expect("create");
        assert_eq!(created.id, "p1");

        let renamed = ProjectDraft {
            title: "Renamed".into(),
            description: "d".into(),
            ..ProjectDraft::default()
        };
        let updated = client.update_project("p1", &renamed).await.expect("update");
        assert_eq!(updated.title, "Renamed");
    }

    #[tokio::test]
    async fn list_categories_returns_strings() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/projects/categories"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(["Web", "Print"])))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, StaticToken::new("secret"));
        let categories = client.list_categories().await.expect("categories load");
        assert_eq!(categories, vec!["Web".to_string(), "Print".to_string()]);
    }

    #[tokio::test]
    async fn upload_rejects_oversized_file_without_a_request() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/upload"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = make_client(&server, StaticToken::new("secret"));
        let oversized = vec![0u8; MAX_UPLOAD_BYTES + 1];
        let err = client
            .upload_image("big.png", oversized)
            .await
            .expect_err("oversized rejected");
        assert!(matches!(err, ApiError::InvalidUpload(_)));
    }

    #[tokio::test]
    async fn upload_rejects_non_image_file_without_a_request() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/upload"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = make_client(&server, StaticToken::new("secret"));
        let err = client
            .upload_image("notes.txt", b"plain text".to_vec())
            .await
            .expect_err("non-image rejected");
        assert!(matches!(err, ApiError::InvalidUpload(_)));
    }

    #[tokio::test]
    async fn upload_sends_multipart_and_parses_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/upload"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "fileUrl": "https://cdn.example.com/shot.png",
                "fileName": "shot.png",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, StaticToken::new("secret"));
        let png = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'].to_vec();
        let uploaded = client
            .upload_image("shot.png", png)
            .await
            .expect("upload succeeds");

        assert_eq!(uploaded.file_url, "https://cdn.example.com/shot.png");
        assert_eq!(uploaded.file_name.as_deref(), Some("shot.png"));
    }

    #[tokio::test]
    async fn contact_submission_is_unauthenticated() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/contact"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/api/contact"))
            .and(body_json(json!({
                "firstName": "Ada",
                "lastName": "Lovelace",
                "email": "ada@example.com",
                "message": "I have a project for you",
                "recaptchaToken": "tok",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, StaticToken::new("secret"));
        let submission = ContactSubmission {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            message: "I have a project for you".into(),
            recaptcha_token: "tok".into(),
        };

        let outcome = client
            .submit_contact(&submission)
            .await
            .expect("submission succeeds");
        assert!(outcome.success);
    }

    #[test]
    fn image_mime_sniffs_magic_bytes_before_extension() {
        let jpeg = [0xFF, 0xD8, 0xFF, 0xE0];
        assert_eq!(image_mime("misnamed.txt", &jpeg), Some("image/jpeg"));
        assert_eq!(image_mime("tiny.webp", b"RI"), Some("image/webp"));
        assert_eq!(image_mime("notes.txt", b"hello"), None);
    }
}
