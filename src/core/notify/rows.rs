//! Cleanup notification with an exclude list of CSV row numbers.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{
    group_by_user, parse_rows, send_notifications, HttpWebhook, NotificationReport, WebhookSender,
};
use crate::error::Result;
use crate::settings::JobSettings;
use crate::utils::io;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupNotificationSettings {
    pub csv_file: PathBuf,
    /// Comma-separated, 1-based row numbers to skip.
    pub exclude_list_file: PathBuf,
    pub webhook_url: String,
}

impl JobSettings for CleanupNotificationSettings {
    const FIELDS: &'static [&'static str] = &["csv_file", "exclude_list_file", "webhook_url"];
    const TEXT_FIELDS: &'static [&'static str] = &["csv_file", "exclude_list_file", "webhook_url"];
}

/// Row numbers listed in `content`. Tokens that are not plain digits are ignored.
pub fn parse_excluded_rows(content: &str) -> BTreeSet<usize> {
    content
        .trim()
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty() && token.chars().all(|c| c.is_ascii_digit()))
        .filter_map(|token| token.parse().ok())
        .collect()
}

/// A missing exclude file means nothing is excluded.
pub fn excluded_rows(path: &Path) -> Result<BTreeSet<usize>> {
    let content = io::read_file_if_exists(path, &format!("read {}", path.display()))?;
    Ok(content.map(|c| parse_excluded_rows(&c)).unwrap_or_default())
}

pub fn run(settings: &CleanupNotificationSettings) -> Result<NotificationReport> {
    let sender = HttpWebhook::new(&settings.webhook_url)?;
    run_with_sender(settings, &sender)
}

pub fn run_with_sender(
    settings: &CleanupNotificationSettings,
    sender: &dyn WebhookSender,
) -> Result<NotificationReport> {
    log::info!("Starting webhook notification job");

    let exclude = excluded_rows(&settings.exclude_list_file)?;
    log::debug!("Exclude rows: {:?}", exclude);

    let content = io::read_file(
        &settings.csv_file,
        &format!("read {}", settings.csv_file.display()),
    )?;
    let rows = parse_rows(&content)?;

    let mut report = NotificationReport {
        rows_read: rows.len(),
        ..Default::default()
    };
    let mut kept = Vec::with_capacity(rows.len());
    for row in rows {
        if exclude.contains(&row.number) {
            log::info!(
                "Excluding row {}: {}",
                row.number,
                row.user_email.as_deref().unwrap_or("N/A")
            );
            report.rows_excluded += 1;
        } else {
            kept.push(row);
        }
    }

    let groups = group_by_user(&kept)?;
    send_notifications(&groups, sender, false, &mut report)?;

    log::info!("Webhook notification job completed");
    Ok(report)
}
