//! System prompts and prompt builders for the gateway operations.

/// Characters of content sent for title generation.
pub const TITLE_SAMPLE_CHARS: usize = 500;

/// Characters of content sent for categorization.
pub const CATEGORY_SAMPLE_CHARS: usize = 1000;

pub const TITLE_SYSTEM: &str = r#"Generate a brief, descriptive title for this meeting based on the content.
The title should be 3-8 words and capture the main topic or purpose.
Examples: "Q1 Budget Review", "Team Standup", "Project Kickoff Meeting"

Respond with only the title, no quotes or extra text."#;

pub const CATEGORY_SYSTEM: &str = r#"Analyze the meeting content and categorize it as one of:
- work: Business meetings, project discussions, team meetings, client calls
- personal: Personal appointments, family meetings, social events, personal planning
- health: Medical appointments, therapy sessions, wellness discussions
- finance: Financial planning, investment discussions, budget meetings
- education: Learning sessions, training, courses, workshops
- other: Anything that doesn't fit the above categories

Respond with only the category name (lowercase, one word)."#;

pub const ACTION_ITEMS_SYSTEM: &str = r#"You are an expert at extracting action items from meeting notes.

Analyze the meeting content and extract action items in JSON format. For each action item, provide:
- title: Brief, clear title (required)
- description: More detailed description if available
- due_date: If mentioned, in ISO format (YYYY-MM-DD), otherwise null
- priority: "low", "medium", or "high" based on urgency
- requires_travel: true if the item mentions a location or travel
- assignee: person responsible if mentioned, otherwise null

Return only a valid JSON array of action items. If no action items found, return empty array [].

Example format:
[
  {
    "title": "Review quarterly budget",
    "description": "Analyze Q4 spending and prepare recommendations",
    "due_date": "2024-01-15",
    "priority": "high",
    "requires_travel": false,
    "assignee": "John Smith"
  }
]"#;

pub const SUMMARY_SYSTEM: &str = r#"You are an expert at summarizing meetings.

Create a concise, well-structured summary that includes:
- Key topics discussed
- Important decisions made
- Next steps or action items mentioned
- Any deadlines or dates mentioned

Keep the summary professional, focused on actionable information, and under 300 words.
Use bullet points for clarity when appropriate."#;

pub const ANSWER_SYSTEM: &str = r#"You are a helpful personal assistant. Use the provided context from the user's meetings and conversations to answer their question.

Guidelines:
- If the context contains relevant information, use it to provide a specific, helpful answer
- If the context doesn't contain relevant information, say so clearly and offer to help in other ways
- Be conversational but professional
- Keep responses concise but complete
- If you mention specific meetings or dates, be precise
- Don't make up information that's not in the context"#;

pub fn title_prompt(content: &str) -> String {
    format!(
        "Generate a title for this meeting:\n\n{}...",
        head(content, TITLE_SAMPLE_CHARS)
    )
}

pub fn category_prompt(content: &str) -> String {
    let mut sample = head(content, CATEGORY_SAMPLE_CHARS).to_string();
    if content.chars().count() > CATEGORY_SAMPLE_CHARS {
        sample.push_str("...");
    }
    format!("Categorize this meeting:\n\n{sample}")
}

pub fn action_items_prompt(content: &str) -> String {
    format!("Meeting content:\n\n{content}")
}

pub fn summary_prompt(content: &str) -> String {
    format!("Please summarize this meeting:\n\n{content}")
}

pub fn answer_prompt(question: &str, context: &str) -> String {
    format!(
        "Context from previous meetings and conversations:\n{context}\n\nUser question: {question}\n\nPlease provide a helpful response based on the context above."
    )
}

/// The first `n` characters of `s`, on a char boundary.
pub fn head(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
