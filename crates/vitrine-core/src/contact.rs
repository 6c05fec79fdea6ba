use std::sync::LazyLock;

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use thiserror::Error;
use tracing::{info, warn};

use crate::api::ProjectsClient;
use crate::api::types::{ContactOutcome, ContactSubmission};
use crate::storage::TokenStore;

pub const MIN_MESSAGE_CHARS: usize = 10;
pub const SUCCESS_NOTICE_MILLIS: i64 = 3000;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("valid email pattern"));

/// Client-side check that blocks submission before any network call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("please complete the captcha challenge")]
    MissingCaptcha,
    #[error("all fields are required")]
    MissingFields,
    #[error("the provided email address is invalid")]
    InvalidEmail,
    #[error("the message must contain at least {MIN_MESSAGE_CHARS} characters")]
    MessageTooShort,
}

/// Contact form state. Fields are kept verbatim as typed; trimming happens at
/// validation and submission time.
#[derive(Debug, Default)]
pub struct ContactForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub message: String,
    captcha_token: Option<String>,
    submitting: bool,
    error: Option<String>,
    success_until: Option<DateTime<Utc>>,
}

impl ContactForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the challenge token handed out by the external captcha widget.
    pub fn set_captcha_token(&mut self, token: impl Into<String>) {
        self.captcha_token = Some(token.into());
    }

    pub fn clear_captcha_token(&mut self) {
        self.captcha_token = None;
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether the success notice is still on screen; it dismisses itself
    /// 3 seconds after a delivered submission.
    pub fn success_visible(&self, now: DateTime<Utc>) -> bool {
        self.success_until.map(|until| now < until).unwrap_or(false)
    }

    /// Captcha first, then required fields, then email shape, then message
    /// length, mirroring the order the form reports problems in.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let captcha_present = self
            .captcha_token
            .as_deref()
            .map(str::trim)
            .is_some_and(|token| !token.is_empty());
        if !captcha_present {
            return Err(ValidationError::MissingCaptcha);
        }

        if self.first_name.trim().is_empty()
            || self.last_name.trim().is_empty()
            || self.email.trim().is_empty()
            || self.message.trim().is_empty()
        {
            return Err(ValidationError::MissingFields);
        }

        if !EMAIL_PATTERN.is_match(self.email.trim()) {
            return Err(ValidationError::InvalidEmail);
        }

        if self.message.trim().chars().count() < MIN_MESSAGE_CHARS {
            return Err(ValidationError::MessageTooShort);
        }

        Ok(())
    }

    /// Validate and submit. A delivered submission clears the fields and the
    /// captcha token and arms the success notice; any failure keeps the
    /// fields intact and sets the message instead.
    pub async fn submit<S: TokenStore>(
        &mut self,
        client: &ProjectsClient<S>,
        now: DateTime<Utc>,
    ) {
        if self.submitting {
            return;
        }

        if let Err(err) = self.validate() {
            self.error = Some(err.to_string());
            return;
        }

        let submission = ContactSubmission {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            message: self.message.trim().to_string(),
            recaptcha_token: self.captcha_token.clone().unwrap_or_default(),
        };

        self.submitting = true;
        let outcome = client.submit_contact(&submission).await;
        self.submitting = false;

        match outcome {
            Ok(ContactOutcome { success: true, .. }) => {
                info!("contact form delivered");
                self.first_name.clear();
                self.last_name.clear();
                self.email.clear();
                self.message.clear();
                self.captcha_token = None;
                self.error = None;
                self.success_until = Some(now + Duration::milliseconds(SUCCESS_NOTICE_MILLIS));
            }
            Ok(ContactOutcome { success: false, message }) => {
                let message =
                    message.unwrap_or_else(|| "the message could not be sent".to_string());
                warn!(%message, "contact endpoint refused the submission");
                self.error = Some(message);
            }
            Err(err) => {
                warn!(error = %err, "contact submission failed");
                self.error = Some(err.to_string());
            }
        }
    }
}
