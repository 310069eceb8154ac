//! Activation email delivery via Mailjet
//!
//! Builds the v3 send payload and posts it with basic auth. The activation
//! link points at the auth service's `/verify` endpoint carrying the token
//! from the pipeline message.

use serde::Serialize;

use crate::core::config::{Config, ConfigError};

const MAILJET_SEND_URL: &str = "https://api.mailjet.com/v3/send";

/// Mailer error types
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Failed to reach mail provider: {0}")]
    Transport(String),

    #[error("Mail provider returned status {0}")]
    Provider(u16),
}

/// Mailjet v3 send payload
#[derive(Debug, Serialize)]
struct SendMailBody {
    #[serde(rename = "FromEmail")]
    from_email: String,
    #[serde(rename = "FromName")]
    from_name: String,
    #[serde(rename = "Subject")]
    subject: String,
    #[serde(rename = "Text-part")]
    text_part: String,
    #[serde(rename = "Html-part")]
    html_part: String,
    #[serde(rename = "Recipients")]
    recipients: Vec<Recipient>,
}

#[derive(Debug, Serialize)]
struct Recipient {
    #[serde(rename = "Email")]
    email: String,
}

/// Sends account activation emails
#[derive(Clone)]
pub struct Mailer {
    client: reqwest::Client,
    api_key: String,
    secret_key: String,
    sender_email: String,
    verify_link_base: String,
}

impl Mailer {
    /// Create a mailer with explicit credentials
    pub fn new(
        api_key: impl Into<String>,
        secret_key: impl Into<String>,
        sender_email: impl Into<String>,
        verify_link_base: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            secret_key: secret_key.into(),
            sender_email: sender_email.into(),
            verify_link_base: verify_link_base.into(),
        }
    }

    /// Create a mailer from application config
    ///
    /// The Mailjet settings are optional in [`Config`] because only the
    /// notification service needs them; here they become required.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let api_key = config
            .mailjet_api_key
            .clone()
            .ok_or(ConfigError::Missing("MAILJET_API_KEY"))?;
        let secret_key = config
            .mailjet_secret_key
            .clone()
            .ok_or(ConfigError::Missing("MAILJET_SECRET_KEY"))?;
        let sender_email = config
            .sender_email
            .clone()
            .ok_or(ConfigError::Missing("SENDER_EMAIL"))?;

        Ok(Self::new(
            api_key,
            secret_key,
            sender_email,
            config.verify_link_base(),
        ))
    }

    fn activation_body(&self, to_email: &str, token: &str) -> SendMailBody {
        let link = format!("{}/verify?token={}", self.verify_link_base, token);

        SendMailBody {
            from_email: self.sender_email.clone(),
            from_name: "Tasklane".to_string(),
            subject: "Verify Your Account".to_string(),
            text_part: format!(
                "Please use the following token to activate your account: {}",
                token
            ),
            html_part: format!(
                "<h3>Please use the following link to activate your account:</h3><a target='_blank' href='{}'>Activate</a>",
                link
            ),
            recipients: vec![Recipient {
                email: to_email.to_string(),
            }],
        }
    }

    /// Send an activation email carrying the verification token
    pub async fn send_activation(&self, to_email: &str, token: &str) -> Result<(), MailError> {
        let body = self.activation_body(to_email, token);

        let response = self
            .client
            .post(MAILJET_SEND_URL)
            .basic_auth(&self.api_key, Some(&self.secret_key))
            .json(&body)
            .send()
            .await
            .map_err(|err| MailError::Transport(err.to_string()))?;

        if !response.status().is_success() {
            return Err(MailError::Provider(response.status().as_u16()));
        }

        Ok(())
    }
}
