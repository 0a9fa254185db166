//! CSV reports over every attendee.

use crate::types::Attendee;
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Which report to render.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    /// Every field of every attendee
    #[default]
    Full,
    /// Who has checked in
    CheckIn,
    /// Who has collected their kit
    Kit,
}

impl ReportKind {
    /// Download name for this report.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Full => "attendees.csv",
            Self::CheckIn => "check_in_summary.csv",
            Self::Kit => "kit_summary.csv",
        }
    }
}

/// Header row of the check-in summary.
pub const CHECK_IN_HEADER: [&str; 5] = ["Name", "Email", "Role", "Checked In", "Registration Time"];

/// Header row of the kit summary.
pub const KIT_HEADER: [&str; 4] = ["Name", "Email", "Role", "Kit Collected"];

/// Header row of the exported report.
pub const REPORT_HEADER: [&str; 10] = [
    "Name",
    "Email",
    "Phone",
    "Role",
    "Identifier",
    "Registered",
    "Checked In At",
    "Lunch Collected",
    "Kit Collected",
    "Registration Time",
];

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn yes_no(flag: bool) -> &'static str {
    if flag { "Yes" } else { "No" }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.format(TIME_FORMAT).to_string()
}

/// Render `kind` over attendees in the order given.
///
/// # Errors
///
/// Fails only if the CSV writer does.
pub fn render<'a>(
    kind: ReportKind,
    attendees: impl IntoIterator<Item = &'a Attendee>,
) -> anyhow::Result<String> {
    match kind {
        ReportKind::Full => render_report(attendees),
        ReportKind::CheckIn => write_rows(CHECK_IN_HEADER, attendees, |attendee| {
            [
                attendee.name.clone(),
                attendee.email.clone(),
                attendee.role.clone().unwrap_or_default(),
                yes_no(attendee.registered).to_string(),
                timestamp(attendee.registration_time),
            ]
        }),
        ReportKind::Kit => write_rows(KIT_HEADER, attendees, |attendee| {
            [
                attendee.name.clone(),
                attendee.email.clone(),
                attendee.role.clone().unwrap_or_default(),
                yes_no(attendee.kit_collected).to_string(),
            ]
        }),
    }
}

/// Render attendees, in the order given, as the full CSV report.
///
/// # Errors
///
/// Fails only if the CSV writer does.
pub fn render_report<'a>(attendees: impl IntoIterator<Item = &'a Attendee>) -> anyhow::Result<String> {
    write_rows(REPORT_HEADER, attendees, |attendee| {
        [
            attendee.name.clone(),
            attendee.email.clone(),
            attendee.phone_number.clone().unwrap_or_default(),
            attendee.role.clone().unwrap_or_default(),
            attendee.identifier.as_str().to_string(),
            yes_no(attendee.registered).to_string(),
            attendee.checked_in_at.map(timestamp).unwrap_or_default(),
            yes_no(attendee.lunch_collected).to_string(),
            yes_no(attendee.kit_collected).to_string(),
            timestamp(attendee.registration_time),
        ]
    })
}

fn write_rows<'a, const N: usize>(
    header: [&str; N],
    attendees: impl IntoIterator<Item = &'a Attendee>,
    row: impl Fn(&Attendee) -> [String; N],
) -> anyhow::Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(header).context("writing header")?;

    for attendee in attendees {
        writer
            .write_record(row(attendee))
            .with_context(|| format!("writing {}", attendee.identifier))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| anyhow::anyhow!("flushing report: {}", err.error()))?;
    String::from_utf8(bytes).context("report is not UTF-8")
}
