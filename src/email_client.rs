//! Client for the external email-delivery service.
//!
//! The core only hands over the `{token, email, first_name, last_name}`
//! tuple produced by the reset and verification flows; MIME assembly and
//! SMTP transport live in the delivery service.

use serde::Serialize;

#[derive(Clone)]
pub struct EmailClient {
    http_client: reqwest::Client,
    base_url: String,
    sender: String,
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    token: &'a str,
    first_name: &'a str,
    last_name: &'a str,
}

impl EmailClient {
    pub fn new(base_url: String, sender: String, http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            base_url,
            sender,
        }
    }

    pub async fn send_password_reset(
        &self,
        recipient: &str,
        first_name: &str,
        last_name: &str,
        token: &str,
    ) -> Result<(), String> {
        self.send(recipient, "Reset your password", first_name, last_name, token)
            .await
    }

    pub async fn send_verification(
        &self,
        recipient: &str,
        first_name: &str,
        last_name: &str,
        token: &str,
    ) -> Result<(), String> {
        self.send(recipient, "Verify your account", first_name, last_name, token)
            .await
    }

    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        first_name: &str,
        last_name: &str,
        token: &str,
    ) -> Result<(), String> {
        let url = format!("{}/email", self.base_url);
        let request = SendEmailRequest {
            from: &self.sender,
            to: recipient,
            subject,
            token,
            first_name,
            last_name,
        };

        self.http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| format!("failed to reach email service: {}", e))?
            .error_for_status()
            .map_err(|e| format!("email service returned error: {}", e))?;

        Ok(())
    }
}
