//! iCalendar rendering for cached delivery estimates.

use chrono::{DateTime, NaiveDate, Utc};

use crate::models::DeliveryEstimate;

const UID_DOMAIN: &str = "postnord-i-kalendern.se";
const SWEDISH_MONTHS: [&str; 12] = [
    "januari",
    "februari",
    "mars",
    "april",
    "maj",
    "juni",
    "juli",
    "augusti",
    "september",
    "oktober",
    "november",
    "december",
];

/// Emoji prefixed to each event summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryIcon {
    #[default]
    Postbox,
    Package,
    Letter,
}

impl DeliveryIcon {
    /// Unknown or missing values fall back to the postbox.
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("package") => DeliveryIcon::Package,
            Some("letter") => DeliveryIcon::Letter,
            _ => DeliveryIcon::Postbox,
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            DeliveryIcon::Postbox => "📬",
            DeliveryIcon::Package => "📦",
            DeliveryIcon::Letter => "✉️",
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum DateLabel {
    Delivery,
    Upcoming,
}

impl DateLabel {
    fn name(self) -> &'static str {
        match self {
            DateLabel::Delivery => "delivery",
            DateLabel::Upcoming => "upcoming",
        }
    }

    fn description(self) -> &'static str {
        match self {
            DateLabel::Delivery => "Planerad utdelning",
            DateLabel::Upcoming => "Kommande utdelning",
        }
    }

    fn value(self, estimate: &DeliveryEstimate) -> &str {
        match self {
            DateLabel::Delivery => &estimate.delivery,
            DateLabel::Upcoming => &estimate.upcoming,
        }
    }
}

/// Parses labels shaped like `"14 oktober, 2025"`.
pub fn parse_swedish_date(label: &str) -> Option<NaiveDate> {
    let mut parts = label.split_whitespace();
    let day: u32 = parts.next()?.parse().ok()?;
    let month_name = parts.next()?.trim_end_matches(',').to_lowercase();
    let year: i32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }

    let month = SWEDISH_MONTHS.iter().position(|m| *m == month_name)? as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Renders a VCALENDAR with one all-day event per parseable date label.
pub fn render_calendar(
    estimate: &DeliveryEstimate,
    postal_code: &str,
    icon: DeliveryIcon,
    now: DateTime<Utc>,
) -> String {
    let title = format!("PostNord utdelningar - {}", estimate.city);
    let mut lines = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        "CALSCALE:GREGORIAN".to_string(),
        format!("PRODID:-//{}//Postnord Calendar//SV", UID_DOMAIN),
        format!("NAME:{}", title),
        format!("X-WR-CALNAME:{}", title),
        "METHOD:PUBLISH".to_string(),
        "X-PUBLISHED-TTL:PT12H".to_string(),
        "REFRESH-INTERVAL;VALUE=DURATION:PT12H".to_string(),
    ];

    let dtstamp = now.format("%Y%m%dT%H%M%SZ").to_string();
    for label in [DateLabel::Delivery, DateLabel::Upcoming] {
        let Some(date) = parse_swedish_date(label.value(estimate)) else {
            tracing::warn!(
                "skipping {} for {}: unparseable date {:?}",
                label.name(),
                postal_code,
                label.value(estimate)
            );
            continue;
        };

        lines.extend([
            "BEGIN:VEVENT".to_string(),
            format!("UID:{}-{}@{}", label.name(), postal_code, UID_DOMAIN),
            format!("DTSTAMP:{}", dtstamp),
            format!("DTSTART;VALUE=DATE:{}", date.format("%Y%m%d")),
            format!("SUMMARY;LANGUAGE=sv:{} Utdelning i {}", icon.emoji(), estimate.city),
            "X-FUNAMBOL-ALLDAY:1".to_string(),
            "X-MICROSOFT-CDO-ALLDAYEVENT:TRUE".to_string(),
            format!("DESCRIPTION;LANGUAGE=sv:{} från PostNord", label.description()),
            "STATUS:CONFIRMED".to_string(),
            "TRANSP:TRANSPARENT".to_string(),
            "CLASS:PUBLIC".to_string(),
            "END:VEVENT".to_string(),
        ]);
    }

    lines.push("END:VCALENDAR".to_string());

    let mut calendar = lines.join("\r\n");
    calendar.push_str("\r\n");
    calendar
}
