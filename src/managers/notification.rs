//! Email notification manager
//!
//! Sends the buffered log records of one run as a single plain-text message,
//! either over SMTP or through the local `sendmail`.

use crate::config::{EmailConfig, SmtpConfig};
use crate::managers::logging::MailReport;
use anyhow::{bail, Context, Result};
use chrono::Local;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::io::Write;
use std::process::{Command, Stdio};
use tracing::{debug, error, info};

/// Used when `sendmail` is not on `PATH`
const DEFAULT_SENDMAIL: &str = "/usr/sbin/sendmail";

#[derive(Debug, Clone)]
pub struct NotificationManager {
    config: EmailConfig,
}

impl NotificationManager {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Send the report, logging instead of failing
    ///
    /// Returns whether the message was handed to the transport.
    pub fn send_report(&self, report: &MailReport) -> bool {
        if !self.is_enabled() {
            debug!("Email notification disabled, skipping");
            return false;
        }
        if report.is_empty() {
            debug!("No log records to send, skipping email");
            return false;
        }

        let body = report.body();
        let result = match self.config.smtp {
            Some(ref smtp) => self.send_smtp(smtp, body),
            None => self.send_sendmail(&body),
        };

        match result {
            Ok(()) => {
                info!("Email was sent to {}", self.config.to.header_value());
                true
            }
            Err(e) => {
                error!("Failed to send email: {:#}", e);
                false
            }
        }
    }

    fn build_message(&self, body: String) -> Result<Message> {
        let from: Mailbox = self
            .config
            .from
            .parse()
            .with_context(|| format!("Invalid sender address '{}'", self.config.from))?;

        let mut builder = Message::builder()
            .from(from)
            .subject(self.config.subject.clone())
            .header(ContentType::TEXT_PLAIN);

        for address in self.config.to.addresses() {
            let to: Mailbox = address
                .parse()
                .with_context(|| format!("Invalid recipient address '{}'", address))?;
            builder = builder.to(to);
        }

        builder.body(body).context("Failed to build email message")
    }

    fn send_smtp(&self, smtp: &SmtpConfig, body: String) -> Result<()> {
        let message = self.build_message(body)?;

        let mut builder = if smtp.use_starttls {
            SmtpTransport::starttls_relay(&smtp.host)
                .with_context(|| format!("Failed to set up STARTTLS for '{}'", smtp.host))?
        } else {
            SmtpTransport::builder_dangerous(&smtp.host)
        }
        .port(smtp.port);

        if !smtp.password.is_empty() {
            builder = builder.credentials(Credentials::new(
                self.config.from.clone(),
                smtp.password.clone(),
            ));
        }

        debug!("Sending email via SMTP {}:{}", smtp.host, smtp.port);
        builder
            .build()
            .send(&message)
            .with_context(|| format!("SMTP delivery via '{}' failed", smtp.host))?;
        Ok(())
    }

    /// Headers and body as handed to `sendmail -t`
    pub fn compose(&self, body: &str) -> String {
        format!(
            "From: {}\r\nTo: {}\r\nSubject: {}\r\nDate: {}\r\n\
             MIME-Version: 1.0\r\nContent-Type: text/plain; charset=utf-8\r\n\
             Content-Transfer-Encoding: 8bit\r\n\r\n{}",
            self.config.from,
            self.config.to.header_value(),
            self.config.subject,
            Local::now().to_rfc2822(),
            body
        )
    }

    fn send_sendmail(&self, body: &str) -> Result<()> {
        let sendmail = which::which("sendmail")
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| DEFAULT_SENDMAIL.to_string());
        debug!("Sending email via {}", sendmail);

        let mut child = Command::new(&sendmail)
            .args(["-t", "-oi"])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to start '{}'", sendmail))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(self.compose(body).as_bytes())
                .context("Failed to write message to sendmail")?;
        }

        let status = child.wait().context("Failed to wait for sendmail")?;
        if !status.success() {
            bail!("sendmail exited with {}", status);
        }
        Ok(())
    }
}
