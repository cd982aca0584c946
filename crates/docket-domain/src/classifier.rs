//! Meeting-versus-question classification for inbound messages.

use docket_types::TurnKind;

/// Phrases that suggest a message carries meeting notes.
pub const MEETING_INDICATORS: &[&str] = &[
    "meeting",
    "discussed",
    "action items",
    "follow up",
    "agenda",
    "attendees",
    "participants",
    "minutes",
    "next steps",
    "decisions",
    "twinmind",
    "transcript",
    "call with",
    "meeting with",
    "zoom",
    "teams",
];

/// Messages at least this long need only one indicator.
pub const LONG_MESSAGE_CHARS: usize = 100;

/// Number of distinct indicators present (case-insensitive).
pub fn indicator_count(text: &str) -> usize {
    let lower = text.to_lowercase();
    MEETING_INDICATORS
        .iter()
        .filter(|indicator| lower.contains(*indicator))
        .count()
}

/// One indicator in a message over 100 characters, or two anywhere.
pub fn is_meeting_content(text: &str) -> bool {
    let count = indicator_count(text);
    (count >= 1 && text.chars().count() > LONG_MESSAGE_CHARS) || count >= 2
}

pub fn classify(text: &str) -> TurnKind {
    if is_meeting_content(text) {
        TurnKind::Meeting
    } else {
        TurnKind::Query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn padded(phrase: &str, len: usize) -> String {
        let mut text = phrase.to_string();
        while text.chars().count() < len {
            text.push_str(" x");
        }
        text.chars().take(len).collect()
    }

    #[test]
    fn test_single_indicator_needs_length() {
        let long = padded("Here are the action items", 150);
        assert_eq!(indicator_count(&long), 1);
        assert_eq!(classify(&long), TurnKind::Meeting);

        let short = padded("Here are the action items", 80);
        assert_eq!(classify(&short), TurnKind::Query);
    }

    #[test]
    fn test_two_indicators_any_length() {
        assert_eq!(classify("meeting agenda"), TurnKind::Meeting);
        assert_eq!(classify("What is on the AGENDA for the Meeting?"), TurnKind::Meeting);
    }

    #[test]
    fn test_plain_question() {
        assert_eq!(classify("What did I promise Bob?"), TurnKind::Query);
        assert_eq!(classify(""), TurnKind::Query);
    }
}
