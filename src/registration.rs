//! Client side of the face registration service.

use crate::{config::RegistrationConfig, image_store::DirectionMap, Error, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Body of `POST /register`
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationRequest<'a> {
    pub user_id: &'a str,
    pub face_images: &'a DirectionMap,
}

/// Successful answer to `POST /register`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub direction_count: Option<u32>,
}

impl RegistrationResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Body of `POST /verify`
#[derive(Debug, Clone, Serialize)]
pub struct VerificationRequest<'a> {
    pub rgb_image: &'a str,
}

/// Answer to `POST /verify`
///
/// A non-matching face is a normal answer, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResponse {
    pub status: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub message: Option<String>,
}

impl VerificationResponse {
    /// The service matched the face to a registered user
    pub fn is_match(&self) -> bool {
        self.status == "success" && self.user_id.is_some()
    }
}

/// Answer to `GET /health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub models_loaded: Option<bool>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Registration service operations
pub trait RegistrationClient {
    /// Submit the five captured directions for `user_id`
    ///
    /// # Errors
    ///
    /// Returns `RegistrationTransport` when the service cannot be reached or
    /// answers with an HTTP error, and `RegistrationRejected` when it refuses
    /// the request
    fn register(&self, user_id: &str, images: DirectionMap) -> Result<RegistrationResponse>;

    /// Match one face image against registered users
    ///
    /// # Errors
    ///
    /// Returns `RegistrationTransport` on transport or HTTP failures
    fn verify(&self, image: &str) -> Result<VerificationResponse>;

    /// Query service health
    ///
    /// # Errors
    ///
    /// Returns `RegistrationTransport` on transport or HTTP failures
    fn health(&self) -> Result<HealthStatus>;
}

/// Accept only `"success"` bodies, surfacing the server message otherwise
///
/// # Errors
///
/// Returns `RegistrationRejected` for any other status
pub fn check_registration(response: RegistrationResponse) -> Result<RegistrationResponse> {
    if response.is_success() {
        return Ok(response);
    }
    let reason = response
        .message
        .clone()
        .unwrap_or_else(|| format!("status '{}'", response.status));
    Err(Error::RegistrationRejected(reason))
}

/// JSON-over-HTTP registration client
pub struct HttpRegistrationClient {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpRegistrationClient {
    pub fn new(config: &RegistrationConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout()).build();
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            agent,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn read_json<T: serde::de::DeserializeOwned>(response: ureq::Response) -> Result<T> {
        response
            .into_json()
            .map_err(|e| Error::RegistrationTransport(format!("Invalid response body: {e}")))
    }
}

/// Map a ureq failure to a transport error, keeping the server's reason
fn transport_error(err: ureq::Error) -> Error {
    match err {
        ureq::Error::Status(code, response) => {
            let body = response.into_string().unwrap_or_default();
            let detail = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| {
                    v.get("detail")
                        .or_else(|| v.get("message"))
                        .and_then(|d| d.as_str().map(str::to_string))
                })
                .unwrap_or(body);
            warn!("Registration service answered HTTP {code}: {detail}");
            Error::RegistrationTransport(format!("HTTP {code}: {detail}"))
        }
        ureq::Error::Transport(transport) => {
            warn!("Registration service unreachable: {transport}");
            Error::RegistrationTransport(transport.to_string())
        }
    }
}

impl RegistrationClient for HttpRegistrationClient {
    fn register(&self, user_id: &str, images: DirectionMap) -> Result<RegistrationResponse> {
        info!("Submitting {} directions for user '{user_id}'", images.iter().count());
        let body = RegistrationRequest {
            user_id,
            face_images: &images,
        };
        let response = self
            .agent
            .post(&self.url("/register"))
            .send_json(&body)
            .map_err(transport_error)?;
        let parsed: RegistrationResponse = Self::read_json(response)?;
        debug!("Registration response: {parsed:?}");
        check_registration(parsed)
    }

    fn verify(&self, image: &str) -> Result<VerificationResponse> {
        let response = self
            .agent
            .post(&self.url("/verify"))
            .send_json(VerificationRequest { rgb_image: image })
            .map_err(transport_error)?;
        Self::read_json(response)
    }

    fn health(&self) -> Result<HealthStatus> {
        let response = self.agent.get(&self.url("/health")).call().map_err(transport_error)?;
        Self::read_json(response)
    }
}
