//! Minimal iCalendar (RFC 5545) writer.
//!
//! Only the subset needed for reminder files: one `VEVENT` per calendar with
//! display alarms. Lines end in CRLF and are folded at 75 octets.

use chrono::{DateTime, Days, NaiveDate, Utc};

const PRODID: &str = "-//Docket//Meeting Assistant//EN";

/// Maximum characters kept from free-text fields.
pub const MAX_TEXT_CHARS: usize = 200;

const FOLD_OCTETS: usize = 75;

/// When an event happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTiming {
    /// An all-day entry on a date.
    AllDay(NaiveDate),
    /// A timed entry in UTC.
    Timed {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// A single calendar event with alarms.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEvent {
    pub uid: String,
    pub summary: String,
    pub description: Option<String>,
    pub timing: EventTiming,
    pub created: DateTime<Utc>,
    /// `(minutes before start, display text)`
    pub alarms: Vec<(u32, String)>,
    /// iCalendar priority, 1 (highest) to 9 (lowest).
    pub priority: Option<u8>,
    pub categories: Vec<String>,
}

impl CalendarEvent {
    pub fn new(summary: impl Into<String>, timing: EventTiming, created: DateTime<Utc>) -> Self {
        Self {
            uid: uuid::Uuid::new_v4().to_string(),
            summary: summary.into(),
            description: None,
            timing,
            created,
            alarms: Vec::new(),
            priority: None,
            categories: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        if !description.is_empty() {
            self.description = Some(description);
        }
        self
    }

    pub fn with_alarm(mut self, minutes_before: u32, text: impl Into<String>) -> Self {
        self.alarms.push((minutes_before, text.into()));
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.categories.push(category.into());
        self
    }

    /// Render a complete `VCALENDAR` document.
    pub fn render(&self) -> String {
        let mut lines: Vec<String> = vec![
            "BEGIN:VCALENDAR".into(),
            "VERSION:2.0".into(),
            format!("PRODID:{PRODID}"),
            "CALSCALE:GREGORIAN".into(),
            "METHOD:PUBLISH".into(),
            "BEGIN:VEVENT".into(),
            format!("UID:{}", self.uid),
            format!("DTSTAMP:{}", format_utc(self.created)),
            format!("CREATED:{}", format_utc(self.created)),
        ];

        match self.timing {
            EventTiming::AllDay(date) => {
                // DTEND is exclusive for date values.
                let end = date.checked_add_days(Days::new(1)).unwrap_or(date);
                lines.push(format!("DTSTART;VALUE=DATE:{}", date.format("%Y%m%d")));
                lines.push(format!("DTEND;VALUE=DATE:{}", end.format("%Y%m%d")));
            }
            EventTiming::Timed { start, end } => {
                lines.push(format!("DTSTART:{}", format_utc(start)));
                lines.push(format!("DTEND:{}", format_utc(end)));
            }
        }

        lines.push(format!("SUMMARY:{}", escape_text(&truncate(&self.summary))));
        if let Some(description) = &self.description {
            lines.push(format!("DESCRIPTION:{}", escape_text(&truncate(description))));
        }
        if let Some(priority) = self.priority {
            lines.push(format!("PRIORITY:{priority}"));
        }
        if !self.categories.is_empty() {
            let joined: Vec<String> = self.categories.iter().map(|c| escape_text(c)).collect();
            lines.push(format!("CATEGORIES:{}", joined.join(",")));
        }

        for (minutes, text) in &self.alarms {
            lines.push("BEGIN:VALARM".into());
            lines.push("ACTION:DISPLAY".into());
            lines.push(format!("DESCRIPTION:{}", escape_text(&truncate(text))));
            lines.push(format!("TRIGGER:-PT{minutes}M"));
            lines.push("END:VALARM".into());
        }

        lines.push("END:VEVENT".into());
        lines.push("END:VCALENDAR".into());

        let mut out = String::new();
        for line in lines {
            out.push_str(&fold(&line));
            out.push_str("\r\n");
        }
        out
    }
}

/// UTC date-time in `YYYYMMDDTHHMMSSZ` form.
pub fn format_utc(dt: DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Escape a TEXT value: backslash, comma, semicolon and newlines.
pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ',' => out.push_str("\\,"),
            ';' => out.push_str("\\;"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            other => out.push(other),
        }
    }
    out
}

/// Truncate to [`MAX_TEXT_CHARS`], marking the cut with "...".
pub fn truncate(s: &str) -> String {
    if s.chars().count() <= MAX_TEXT_CHARS {
        return s.to_string();
    }
    let kept: String = s.chars().take(MAX_TEXT_CHARS - 3).collect();
    format!("{kept}...")
}

/// Fold a content line at 75 octets without splitting a UTF-8 sequence.
fn fold(line: &str) -> String {
    if line.len() <= FOLD_OCTETS {
        return line.to_string();
    }
    let mut out = String::with_capacity(line.len() + line.len() / FOLD_OCTETS * 3);
    let mut width = 0;
    // Continuation lines start with a space, which counts toward the limit.
    let mut limit = FOLD_OCTETS;
    for c in line.chars() {
        let len = c.len_utf8();
        if width + len > limit {
            out.push_str("\r\n ");
            width = 0;
            limit = FOLD_OCTETS - 1;
        }
        out.push(c);
        width += len;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn created() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("a,b;c\\d\ne"), "a\\,b\\;c\\\\d\\ne");
    }

    #[test]
    fn test_truncate_long_text() {
        let long = "x".repeat(250);
        let cut = truncate(&long);
        assert_eq!(cut.chars().count(), MAX_TEXT_CHARS);
        assert!(cut.ends_with("..."));
        assert_eq!(truncate("short"), "short");
    }

    #[test]
    fn test_render_timed_event() {
        let start = Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 15, 15, 30, 0).unwrap();
        let ics = CalendarEvent::new("Send report", EventTiming::Timed { start, end }, created())
            .with_description("Q1, draft")
            .with_alarm(60, "Reminder: Send report")
            .render();

        assert!(ics.starts_with("BEGIN:VCALENDAR\r\n"));
        assert!(ics.ends_with("END:VCALENDAR\r\n"));
        assert!(ics.contains("DTSTART:20240115T143000Z\r\n"));
        assert!(ics.contains("DTEND:20240115T153000Z\r\n"));
        assert!(ics.contains("DTSTAMP:20240110T080000Z\r\n"));
        assert!(ics.contains("DESCRIPTION:Q1\\, draft\r\n"));
        assert!(ics.contains("TRIGGER:-PT60M\r\n"));
        assert_eq!(ics.matches("BEGIN:VALARM").count(), 1);
    }

    #[test]
    fn test_render_all_day_event() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let ics = CalendarEvent::new("Budget", EventTiming::AllDay(date), created()).render();
        assert!(ics.contains("DTSTART;VALUE=DATE:20240115\r\n"));
        assert!(ics.contains("DTEND;VALUE=DATE:20240116\r\n"));
        assert!(!ics.contains("DESCRIPTION"));
    }

    #[test]
    fn test_long_lines_are_folded() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let summary = "é".repeat(120);
        let ics = CalendarEvent::new(summary, EventTiming::AllDay(date), created()).render();
        for line in ics.split("\r\n") {
            assert!(line.len() <= 75, "line too long: {}", line.len());
        }
    }
}
