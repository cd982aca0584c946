//! Best-effort attendee scraping.
//!
//! Looks for lines such as `Attendees: Alice, Bob` and keeps the alphabetic
//! words after the colon. Misses names written any other way.

const PARTICIPANT_KEYWORDS: &[&str] = &["attendee", "participant", "present", "joined"];

/// Names listed after attendee-style keywords, de-duplicated in order.
pub fn extract_participants(content: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();

    for line in content.lines() {
        let lower = line.to_lowercase();
        if !PARTICIPANT_KEYWORDS.iter().any(|k| lower.contains(k)) {
            continue;
        }
        let Some((_, rest)) = line.split_once(':') else {
            continue;
        };

        for word in rest.split(|c: char| c.is_whitespace() || c == ',') {
            let word = word.trim();
            if word.chars().count() <= 2 || !word.chars().all(char::is_alphabetic) {
                continue;
            }
            if !names.iter().any(|n| n.eq_ignore_ascii_case(word)) {
                names.push(word.to_string());
            }
        }
    }

    names
}
