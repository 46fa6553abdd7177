// src/services/email.rs
//! Outbound email
//!
//! Handlers depend on the `Mailer` trait. Production uses Amazon SES when a
//! sender address is configured; otherwise `LogMailer` records the send in
//! the log so local setups work without AWS credentials.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_sesv2::config::Region;
use aws_sdk_sesv2::types::{Body as SesBody, Content, Destination, EmailContent, Message};
use aws_sdk_sesv2::Client as SesClient;
use thiserror::Error;
use tracing::info;

use crate::common::safe_email_log;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("SES operation failed: {0}")]
    Ses(String),
}

#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError>;
}

/// Sends through Amazon SES v2 using the default AWS credential chain
pub struct SesMailer {
    client: SesClient,
    from_email: String,
}

impl SesMailer {
    pub async fn new(from_email: String, region: String) -> Self {
        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region))
            .load()
            .await;

        Self {
            client: SesClient::new(&aws_config),
            from_email,
        }
    }
}

#[async_trait]
impl Mailer for SesMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        let destination = Destination::builder().to_addresses(&email.to).build();

        let subject = Content::builder()
            .data(&email.subject)
            .charset("UTF-8")
            .build()
            .map_err(|e| MailError::Ses(format!("Failed to build subject: {}", e)))?;

        let body = Content::builder()
            .data(&email.html_body)
            .charset("UTF-8")
            .build()
            .map_err(|e| MailError::Ses(format!("Failed to build body: {}", e)))?;

        let message = Message::builder()
            .subject(subject)
            .body(SesBody::builder().html(body).build())
            .build();

        let result = self
            .client
            .send_email()
            .from_email_address(&self.from_email)
            .destination(destination)
            .content(EmailContent::builder().simple(message).build())
            .send()
            .await
            .map_err(|e| MailError::Ses(format!("Send failed: {}", e)))?;

        info!(
            to = %safe_email_log(&email.to),
            message_id = ?result.message_id(),
            "Email sent via SES"
        );
        Ok(())
    }
}

/// Used when SES is not configured
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        info!(
            to = %safe_email_log(&email.to),
            subject = %email.subject,
            "Email delivery not configured; message logged only"
        );
        Ok(())
    }
}

/// Data for the account-credentials email sent to a new patient
#[derive(Debug, Clone)]
pub struct CredentialsEmailData {
    pub patient_name: String,
    pub email: String,
    pub temporary_password: String,
    pub login_url: String,
}

pub fn generate_credentials_email(data: &CredentialsEmailData) -> OutgoingEmail {
    let html_body = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <style>
        body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; }}
        .container {{ max-width: 600px; margin: 0 auto; padding: 20px; }}
        .header {{ background-color: #0D9488; color: white; padding: 20px; text-align: center; }}
        .content {{ padding: 20px; background-color: #f9f9f9; }}
        .credentials {{ background-color: #CCFBF1; padding: 15px; border-left: 4px solid #0D9488; margin: 15px 0; }}
        .footer {{ padding: 20px; text-align: center; font-size: 12px; color: #666; }}
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>Your PhysioCheck Account</h1>
        </div>
        <div class="content">
            <p>Hello {},</p>

            <p>Your physiotherapist has created an account for you.</p>

            <div class="credentials">
                <p><strong>Login Email:</strong> {}<br>
                <strong>Temporary Password:</strong> {}</p>
            </div>

            <p>Log in here: <a href="{}">{}</a></p>

            <p>Please change your password after your first login.</p>

            <p>Best regards,<br>
            PhysioCheck Team</p>
        </div>
        <div class="footer">
            <p>This is an automated message. Please do not reply directly to this email.</p>
        </div>
    </div>
</body>
</html>"#,
        data.patient_name,
        data.email,
        data.temporary_password,
        data.login_url,
        data.login_url
    );

    OutgoingEmail {
        to: data.email.clone(),
        subject: "Your PhysioCheck Account".to_string(),
        html_body,
    }
}
