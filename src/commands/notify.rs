use clap::Args;
use serde::Serialize;

use upload_utils::notify::{rows, trigger, CleanupNotificationSettings, NotificationReport, TriggerCleanupNotificationSettings};

use super::{load_settings, CmdResult, JobArgs};

#[derive(Args)]
pub struct NotifyArgs {
    #[command(flatten)]
    job: JobArgs,
}

#[derive(Serialize)]
pub struct NotifyOutput {
    command: &'static str,
    #[serde(flatten)]
    report: NotificationReport,
}

pub fn run_rows(args: NotifyArgs) -> CmdResult<NotifyOutput> {
    let settings: CleanupNotificationSettings = load_settings(&args.job)?;
    let report = rows::run(&settings)?;

    upload_utils::log_status!(
        "notify",
        "{} notified, {} failed",
        report.users_notified,
        report.users_failed
    );

    Ok((
        NotifyOutput {
            command: "cleanup-notification",
            report,
        },
        0,
    ))
}

pub fn run_trigger(args: NotifyArgs) -> CmdResult<NotifyOutput> {
    let settings: TriggerCleanupNotificationSettings = load_settings(&args.job)?;
    let report = trigger::run(&settings)?;

    upload_utils::log_status!("notify", "{} notified", report.users_notified);

    Ok((
        NotifyOutput {
            command: "trigger-cleanup-notification",
            report,
        },
        0,
    ))
}
