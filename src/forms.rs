//! Outbound form submissions: the contact form goes to an email relay as
//! JSON, newsletter sign-ups go to a form processor as a urlencoded post.
//! Neither is retried.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use spdlog::{info, warn};
use thiserror::Error;
use ureq::Agent;

use crate::config::Forms;

const DEFAULT_TIMEOUT: u64 = 15;

#[derive(Debug, Clone, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewsletterForm {
    #[serde(default)]
    pub email: String,
}

fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    !email.is_empty() && email.contains('@')
}

impl ContactForm {
    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty()
            && !self.message.trim().is_empty()
            && is_valid_email(&self.email)
    }
}

impl NewsletterForm {
    pub fn is_valid(&self) -> bool {
        is_valid_email(&self.email)
    }
}

/// Outcome shown inline next to the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionStatus {
    pub success: bool,
    pub message: &'static str,
}

impl SubmissionStatus {
    pub fn contact(success: bool) -> Self {
        let message = if success {
            "Message sent successfully!"
        } else {
            "Failed to send message. Please try again."
        };
        SubmissionStatus { success, message }
    }

    pub fn newsletter(success: bool) -> Self {
        let message = if success {
            "Thanks for subscribing!"
        } else {
            "Something went wrong. Try again."
        };
        SubmissionStatus { success, message }
    }
}

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] ureq::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

pub trait FormRelay: Send + Sync {
    fn send_contact(&self, form: &ContactForm) -> Result<(), RelayError>;

    fn subscribe(&self, form: &NewsletterForm) -> Result<(), RelayError>;
}

#[derive(Serialize)]
struct TemplateParams<'a> {
    name: &'a str,
    email: &'a str,
    title: &'a str,
}

#[derive(Serialize)]
struct EmailRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    template_params: TemplateParams<'a>,
}

pub struct HttpFormRelay {
    agent: Agent,
    forms: Forms,
}

impl HttpFormRelay {
    pub fn new(forms: Forms) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(forms.timeout_secs.unwrap_or(DEFAULT_TIMEOUT))))
            .http_status_as_error(false)
            .build()
            .into();

        HttpFormRelay {
            agent,
            forms,
        }
    }
}

fn check_status(response: ureq::http::Response<ureq::Body>) -> Result<(), RelayError> {
    let status = response.status().as_u16();
    if (200..300).contains(&status) {
        return Ok(());
    }
    let body = response.into_body()
        .read_to_string()
        .unwrap_or_else(|_| "(unable to read error body)".to_owned());
    Err(RelayError::Status { status, body })
}

impl FormRelay for HttpFormRelay {
    fn send_contact(&self, form: &ContactForm) -> Result<(), RelayError> {
        let request = EmailRequest {
            service_id: &self.forms.email_service_id,
            template_id: &self.forms.email_template_id,
            user_id: &self.forms.email_user_id,
            template_params: TemplateParams {
                name: form.name.trim(),
                email: form.email.trim(),
                title: form.message.trim(),
            },
        };

        let response = self.agent
            .post(&self.forms.email_relay_url)
            .send_json(&request)?;
        check_status(response)
    }

    fn subscribe(&self, form: &NewsletterForm) -> Result<(), RelayError> {
        let response = self.agent
            .post(&self.forms.newsletter_url)
            .header("Accept", "application/json")
            .send_form([("email", form.email.trim())])?;
        check_status(response)
    }
}

/// Validates and forwards a contact message. Invalid input never reaches
/// the relay.
pub fn submit_contact(relay: &dyn FormRelay, form: &ContactForm) -> SubmissionStatus {
    if !form.is_valid() {
        info!("Rejected contact form with missing fields");
        return SubmissionStatus::contact(false);
    }

    match relay.send_contact(form) {
        Ok(()) => SubmissionStatus::contact(true),
        Err(e) => {
            warn!("Error sending contact message: {}", e);
            SubmissionStatus::contact(false)
        }
    }
}

pub fn subscribe_newsletter(relay: &dyn FormRelay, form: &NewsletterForm) -> SubmissionStatus {
    if !form.is_valid() {
        info!("Rejected newsletter sign-up without a valid email");
        return SubmissionStatus::newsletter(false);
    }

    match relay.subscribe(form) {
        Ok(()) => SubmissionStatus::newsletter(true),
        Err(e) => {
            warn!("Error subscribing to newsletter: {}", e);
            SubmissionStatus::newsletter(false)
        }
    }
}
