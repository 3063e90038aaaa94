//! Prompt templates for the content agents and the judge.

use crate::types::{ContentCategory, ContentResult, Location};

/// Default value for a metadata field the model omitted
#[derive(Debug, Clone, Copy)]
pub(crate) enum FieldDefault {
    Text(&'static str),
    List,
}

/// Per-category prompt and reply shape
#[derive(Debug, Clone, Copy)]
pub(crate) struct ContentSpec {
    /// Top-level key wrapping the record in the model's JSON reply
    pub key: &'static str,
    /// Field holding the long-form description
    pub description_field: &'static str,
    pub metadata: &'static [(&'static str, FieldDefault)],
    pub system_prompt: &'static str,
    pub task: &'static str,
    pub example: &'static str,
}

const VIDEO: ContentSpec = ContentSpec {
    key: "video",
    description_field: "description",
    metadata: &[
        ("channel", FieldDefault::Text("")),
        ("duration_estimate", FieldDefault::Text("")),
        ("why_relevant", FieldDefault::Text("")),
    ],
    system_prompt: "You are a YouTube content curator. You find the single most relevant video for someone visiting a location.",
    task: "Suggest 1 highly relevant YouTube video that would be interesting for someone visiting this location. Favor historical documentaries, travel guides, cultural features, local stories, architectural tours and natural beauty showcases.",
    example: r#"{
  "video": {
    "title": "The Siege of Masada: Ancient Israel's Last Stand",
    "channel": "History Channel",
    "duration_estimate": "45 minutes",
    "relevance_score": 95,
    "description": "Documentary about the siege and the last stand against Rome",
    "why_relevant": "Historical context for visitors to understand the site"
  }
}"#,
};

const MUSIC: ContentSpec = ContentSpec {
    key: "music",
    description_field: "description",
    metadata: &[
        ("artist", FieldDefault::Text("")),
        ("type", FieldDefault::Text("song")),
        ("genre", FieldDefault::Text("")),
        ("why_relevant", FieldDefault::Text("")),
    ],
    system_prompt: "You are a music curator. You suggest the music that best captures the essence of a location.",
    task: "Suggest 1 highly relevant song or album for someone visiting this location. Consider local music traditions, the historical era, themes tied to the place, and music that matches the setting.",
    example: r#"{
  "music": {
    "title": "Jerusalem of Gold",
    "artist": "Naomi Shemer",
    "type": "song",
    "genre": "Israeli folk",
    "relevance_score": 95,
    "description": "Iconic song about Jerusalem and its significance",
    "why_relevant": "The song is synonymous with the city"
  }
}"#,
};

const HISTORY: ContentSpec = ContentSpec {
    key: "story",
    description_field: "narrative",
    metadata: &[
        ("key_facts", FieldDefault::List),
        ("time_period", FieldDefault::Text("")),
        ("historical_figures", FieldDefault::List),
    ],
    system_prompt: "You are a historical storyteller. You write engaging, factually accurate narratives about places.",
    task: "Write a compelling historical narrative (300-500 words) about this location in story format, with specific dates, people and events.",
    example: r#"{
  "story": {
    "title": "The Siege of Masada: 960 Souls Against Rome",
    "narrative": "In 73 CE, atop an isolated rock plateau overlooking the Dead Sea...",
    "key_facts": ["Masada was built by Herod the Great between 37-31 BCE"],
    "relevance_score": 95,
    "time_period": "73-74 CE",
    "historical_figures": ["Eleazar ben Ya'ir", "Flavius Silva"]
  }
}"#,
};

pub(crate) fn spec_for(category: ContentCategory) -> &'static ContentSpec {
    match category {
        ContentCategory::Video => &VIDEO,
        ContentCategory::Music => &MUSIC,
        ContentCategory::History => &HISTORY,
    }
}

const CONTENT_TEMPLATE: &str = "**Location Information:**
- Name: {name}
- Description: {description}
- Category: {kind}

**Task:**
{task}

**Output Format (JSON only, no explanation):**
{example}

Return ONLY the JSON object, no other text.";

pub(crate) fn content_prompt(category: ContentCategory, location: &Location) -> String {
    let spec = spec_for(category);
    let description = if location.description().is_empty() {
        "No description available"
    } else {
        location.description()
    };
    CONTENT_TEMPLATE
        .replace("{name}", location.name())
        .replace("{description}", description)
        .replace("{kind}", location.kind().as_str())
        .replace("{task}", spec.task)
        .replace("{example}", spec.example)
}

pub(crate) const JUDGE_SYSTEM_PROMPT: &str =
    "You are a content judge. You compare content options for a location and select exactly one winner.";

const JUDGE_DESCRIPTION_LIMIT: usize = 200;

pub(crate) fn judge_prompt(location_name: &str, results: &[ContentResult]) -> String {
    let mut prompt = format!(
        "Evaluate these content options for the location \"{}\" and select the single best one.\n\n",
        location_name
    );
    for (index, result) in results.iter().enumerate() {
        prompt.push_str(&format!(
            "**OPTION {} - {}:**\nTitle: {}\nDescription: {}\nRelevance Score: {}\n\n",
            index + 1,
            result.category,
            result.title,
            truncate(&result.description, JUDGE_DESCRIPTION_LIMIT),
            result.relevance_score
        ));
    }

    let choices: Vec<String> = results
        .iter()
        .map(|r| format!("\"{}\"", r.category))
        .collect();
    prompt.push_str(
        "**Evaluation Criteria:**
1. Relevance to the location (0-40 points)
2. Educational value (0-25 points)
3. Entertainment value (0-20 points)
4. Quality and uniqueness (0-15 points)

**Output Format (JSON only, no explanation):**
{
  \"selected\": ",
    );
    prompt.push_str(&choices.join(" | "));
    prompt.push_str(
        ",
  \"reasoning\": \"2-3 sentences on why this option is best for this location\",
  \"scores\": { \"<option>\": <0-100>, ... }
}

Return ONLY the JSON object, no other text.",
    );
    prompt
}

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut shortened: String = text.chars().take(limit).collect();
    shortened.push_str("...");
    shortened
}
