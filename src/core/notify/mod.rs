//! Webhook notifications for capsule cleanup.
//!
//! A CSV export lists `user_email` and `capsule_url` per row. Rows are
//! filtered, grouped per user, and each user gets one webhook POST carrying
//! their capsule URLs as a small HTML body.

pub mod rows;
pub mod trigger;

pub use rows::CleanupNotificationSettings;
pub use trigger::TriggerCleanupNotificationSettings;

use std::collections::HashMap;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{Error, RemoteRequestFailedDetails, Result};

pub const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(30);

/// One CSV data row. `number` is 1-based and excludes the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRow {
    pub number: usize,
    pub user_email: Option<String>,
    pub capsule_url: Option<String>,
}

#[derive(Deserialize)]
struct RawRow {
    user_email: Option<String>,
    capsule_url: Option<String>,
}

impl CsvRow {
    fn column<'a>(&self, value: &'a Option<String>, name: &str) -> Result<&'a str> {
        value.as_deref().ok_or_else(|| {
            Error::validation_invalid_argument(
                "csv_file",
                format!("Row {} has no {} column", self.number, name),
                None,
                None,
            )
        })
    }

    pub fn user_email(&self) -> Result<&str> {
        self.column(&self.user_email, "user_email")
    }

    pub fn capsule_url(&self) -> Result<&str> {
        self.column(&self.capsule_url, "capsule_url")
    }
}

/// Parse CSV text with a header row. Columns other than `user_email` and `capsule_url` are ignored.
///
/// Rows may be ragged: fields past the header are dropped and missing ones read as `None`.
pub fn parse_rows(content: &str) -> Result<Vec<CsvRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes());
    let mut rows = Vec::new();
    for (index, record) in reader.deserialize::<RawRow>().enumerate() {
        let raw = record.map_err(|e| {
            Error::validation_invalid_argument(
                "csv_file",
                format!("Could not parse row {}: {}", index + 1, e),
                None,
                None,
            )
        })?;
        rows.push(CsvRow {
            number: index + 1,
            user_email: raw.user_email,
            capsule_url: raw.capsule_url,
        });
    }
    log::debug!("Read {} rows from CSV file", rows.len());
    Ok(rows)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserCapsules {
    pub user_email: String,
    pub capsule_urls: Vec<String>,
}

impl UserCapsules {
    pub fn payload(&self) -> Value {
        let mut body = String::from("<body>");
        for url in &self.capsule_urls {
            body.push_str(url);
            body.push_str("<br>");
        }
        body.push_str("</body>");
        json!({
            "user_email": self.user_email,
            "capsule_urls": body,
        })
    }
}

/// Group rows by user email, keeping users and their URLs in first-seen order.
pub fn group_by_user(rows: &[CsvRow]) -> Result<Vec<UserCapsules>> {
    let mut groups: Vec<UserCapsules> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let email = row.user_email()?;
        let url = row.capsule_url()?.to_string();
        match index.get(email) {
            Some(&i) => groups[i].capsule_urls.push(url),
            None => {
                index.insert(email.to_string(), groups.len());
                groups.push(UserCapsules {
                    user_email: email.to_string(),
                    capsule_urls: vec![url],
                });
            }
        }
    }

    log::debug!("Grouped data for {} users", groups.len());
    Ok(groups)
}

pub trait WebhookSender {
    fn send(&self, payload: &Value) -> Result<()>;
}

/// JSON POSTs to a fixed URL. Certificate verification is disabled.
pub struct HttpWebhook {
    client: Client,
    url: String,
}

impl HttpWebhook {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(WEBHOOK_TIMEOUT)
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| Error::internal_io(e.to_string(), Some("create HTTP client".to_string())))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    fn request_error(&self, e: reqwest::Error) -> Error {
        Error::remote_request_failed(RemoteRequestFailedDetails {
            url: self.url.clone(),
            status: e.status().map(|s| s.as_u16()),
            error: e.to_string(),
        })
    }
}

impl WebhookSender for HttpWebhook {
    fn send(&self, payload: &Value) -> Result<()> {
        self.client
            .post(&self.url)
            .json(payload)
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(|e| self.request_error(e))?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NotificationReport {
    pub rows_read: usize,
    pub rows_excluded: usize,
    pub users_notified: usize,
    pub users_failed: usize,
}

/// Send one notification per user. With `fail_fast` the first failure is
/// returned; otherwise failures are logged and counted.
pub fn send_notifications(
    groups: &[UserCapsules],
    sender: &dyn WebhookSender,
    fail_fast: bool,
    report: &mut NotificationReport,
) -> Result<()> {
    for group in groups {
        match sender.send(&group.payload()) {
            Ok(()) => {
                log::info!("Successfully sent notification for {}", group.user_email);
                report.users_notified += 1;
            }
            Err(err) => {
                log::error!("Failed to send notification for {}: {}", group.user_email, err);
                if fail_fast {
                    return Err(err);
                }
                report.users_failed += 1;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::RefCell;

    /// Records payloads and fails for the listed users.
    #[derive(Default)]
    pub struct RecordingSender {
        pub sent: RefCell<Vec<Value>>,
        pub failing_users: Vec<String>,
    }

    impl WebhookSender for RecordingSender {
        fn send(&self, payload: &Value) -> Result<()> {
            let user = payload["user_email"].as_str().unwrap_or_default();
            if self.failing_users.iter().any(|u| u == user) {
                return Err(Error::remote_request_failed(RemoteRequestFailedDetails {
                    url: "https://hooks.example.org/cleanup".to_string(),
                    status: Some(500),
                    error: "Internal Server Error".to_string(),
                }));
            }
            self.sent.borrow_mut().push(payload.clone());
            Ok(())
        }
    }

    pub const SAMPLE_CSV: &str = "\
user_email,capsule_url,last_used
alice@example.org,https://codeocean.example.org/capsule/1,2024-01-01
bob@example.org,https://codeocean.example.org/capsule/2,2024-02-01
alice@example.org,https://codeocean.example.org/capsule/3,2024-03-01
carol@example.org,https://codeocean.example.org/capsule/4,2024-04-01
";
}
