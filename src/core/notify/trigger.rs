//! Cleanup notification with an exclude list of user emails or capsule URLs.
//!
//! Both inputs may be local paths or `s3://bucket/key` URIs.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{
    group_by_user, parse_rows, send_notifications, CsvRow, HttpWebhook, NotificationReport,
    WebhookSender,
};
use crate::error::Result;
use crate::settings::JobSettings;
use crate::source::{DefaultReader, Location, ObjectReader};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerCleanupNotificationSettings {
    pub csv_file: String,
    /// One user email or capsule URL per line.
    pub exclude_list_file: String,
    pub webhook_url: String,
}

impl JobSettings for TriggerCleanupNotificationSettings {
    const FIELDS: &'static [&'static str] = &["csv_file", "exclude_list_file", "webhook_url"];
    const TEXT_FIELDS: &'static [&'static str] = &["csv_file", "exclude_list_file", "webhook_url"];
}

pub fn parse_exclude_items(content: &str) -> HashSet<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Drop rows whose user email or capsule URL is listed.
pub fn filter_rows(rows: Vec<CsvRow>, exclude: &HashSet<String>) -> Result<(Vec<CsvRow>, usize)> {
    let mut kept = Vec::with_capacity(rows.len());
    let mut excluded = 0;
    for row in rows {
        let email = row.user_email()?;
        let url = row.capsule_url()?;
        if exclude.contains(email) || exclude.contains(url) {
            log::info!("Excluding row {}: {} - {}", row.number, email, url);
            excluded += 1;
            continue;
        }
        kept.push(row);
    }
    log::debug!("Filtered data: {} rows remaining", kept.len());
    Ok((kept, excluded))
}

pub fn run(settings: &TriggerCleanupNotificationSettings) -> Result<NotificationReport> {
    let sender = HttpWebhook::new(&settings.webhook_url)?;
    run_with(settings, &DefaultReader, &sender)
}

pub fn run_with(
    settings: &TriggerCleanupNotificationSettings,
    reader: &dyn ObjectReader,
    sender: &dyn WebhookSender,
) -> Result<NotificationReport> {
    log::info!("Starting webhook notification job");

    let exclude_location = Location::parse(&settings.exclude_list_file)?;
    let exclude = parse_exclude_items(&reader.read_to_string(&exclude_location)?);
    log::debug!("Exclude items: {:?}", exclude);

    let csv_location = Location::parse(&settings.csv_file)?;
    let rows = parse_rows(&reader.read_to_string(&csv_location)?)?;
    let rows_read = rows.len();
    let (kept, rows_excluded) = filter_rows(rows, &exclude)?;

    let mut report = NotificationReport {
        rows_read,
        rows_excluded,
        ..Default::default()
    };
    let groups = group_by_user(&kept)?;
    send_notifications(&groups, sender, true, &mut report)?;

    log::info!("Webhook notification job completed");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::super::testing::{RecordingSender, SAMPLE_CSV};
    use super::*;
    use crate::error::Error;
    use std::collections::HashMap;

    /// Serves fixed content keyed by the rendered location.
    struct FakeReader(HashMap<String, String>);

    impl ObjectReader for FakeReader {
        fn read_to_string(&self, location: &Location) -> Result<String> {
            self.0
                .get(&location.to_string())
                .cloned()
                .ok_or_else(|| Error::remote_read_failed(location.to_string(), "NoSuchKey"))
        }
    }

    fn reader(exclude: &str) -> FakeReader {
        FakeReader(
            [
                ("s3://bucket/capsules.csv".to_string(), SAMPLE_CSV.to_string()),
                ("s3://bucket/exclude.txt".to_string(), exclude.to_string()),
            ]
            .into_iter()
            .collect(),
        )
    }

    fn settings() -> TriggerCleanupNotificationSettings {
        TriggerCleanupNotificationSettings {
            csv_file: "s3://bucket/capsules.csv".to_string(),
            exclude_list_file: "s3://bucket/exclude.txt".to_string(),
            webhook_url: "https://hooks.example.org/cleanup".to_string(),
        }
    }

    #[test]
    fn exclude_items_are_trimmed_lines() {
        let items = parse_exclude_items("  alice@example.org \n\nhttps://x/capsule/2\n");
        assert_eq!(items.len(), 2);
        assert!(items.contains("alice@example.org"));
        assert!(items.contains("https://x/capsule/2"));
    }

    #[test]
    fn rows_matching_email_or_url_are_dropped() {
        let sender = RecordingSender::default();
        let report = run_with(
            &settings(),
            &reader("alice@example.org\nhttps://codeocean.example.org/capsule/4\n"),
            &sender,
        )
        .unwrap();

        assert_eq!(report.rows_read, 4);
        assert_eq!(report.rows_excluded, 3);
        assert_eq!(report.users_notified, 1);
        let sent = sender.sent.borrow();
        assert_eq!(sent[0]["user_email"], "bob@example.org");
        assert_eq!(
            sent[0]["capsule_urls"],
            "<body>https://codeocean.example.org/capsule/2<br></body>"
        );
    }

    #[test]
    fn first_webhook_failure_fails_the_job() {
        let sender = RecordingSender {
            failing_users: vec!["alice@example.org".to_string()],
            ..Default::default()
        };
        let err = run_with(&settings(), &reader(""), &sender).unwrap_err();
        assert_eq!(err.code.as_str(), "remote.request_failed");
        assert!(sender.sent.borrow().is_empty());
    }

    #[test]
    fn unreadable_source_surfaces_read_error() {
        let mut job = settings();
        job.csv_file = "s3://bucket/missing.csv".to_string();
        let err = run_with(&job, &reader(""), &RecordingSender::default()).unwrap_err();
        assert_eq!(err.code.as_str(), "remote.read_failed");
    }
}
