//! Core data model: locations, content categories, content results and judgments.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Content category produced for every location.
///
/// Wire names follow the content sources (`youtube`, `spotify`, `history`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContentCategory {
    #[serde(rename = "youtube")]
    Video,
    #[serde(rename = "spotify")]
    Music,
    #[serde(rename = "history")]
    History,
}

impl ContentCategory {
    /// Every category, in default fan-out order.
    pub const ALL: [ContentCategory; 3] = [
        ContentCategory::Video,
        ContentCategory::Music,
        ContentCategory::History,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ContentCategory::Video => "youtube",
            ContentCategory::Music => "spotify",
            ContentCategory::History => "history",
        }
    }

    /// Tie-break rank for fallback selection. Higher wins; every category has a distinct rank.
    pub fn priority(self) -> u8 {
        match self {
            ContentCategory::History => 3,
            ContentCategory::Video => 2,
            ContentCategory::Music => 1,
        }
    }
}

impl fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "youtube" | "video" => Ok(ContentCategory::Video),
            "spotify" | "music" => Ok(ContentCategory::Music),
            "history" | "narrative" => Ok(ContentCategory::History),
            other => Err(ValidationError::UnknownCategory(other.to_string())),
        }
    }
}

/// Kind of point of interest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationKind {
    Historical,
    Cultural,
    Natural,
    Religious,
    Entertainment,
}

impl LocationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LocationKind::Historical => "historical",
            LocationKind::Cultural => "cultural",
            LocationKind::Natural => "natural",
            LocationKind::Religious => "religious",
            LocationKind::Entertainment => "entertainment",
        }
    }
}

impl FromStr for LocationKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "historical" => Ok(LocationKind::Historical),
            "cultural" => Ok(LocationKind::Cultural),
            "natural" => Ok(LocationKind::Natural),
            "religious" => Ok(LocationKind::Religious),
            "entertainment" => Ok(LocationKind::Entertainment),
            other => Err(ValidationError::UnknownLocationKind(other.to_string())),
        }
    }
}

/// A point of interest along a route.
///
/// Validated on construction and read-only afterwards. `name` is the correlation
/// key shared by the queues and the final judgment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LocationRecord")]
pub struct Location {
    name: String,
    lat: f64,
    lon: f64,
    description: String,
    kind: LocationKind,
    distance_from_start_km: f64,
}

#[derive(Deserialize)]
struct LocationRecord {
    name: String,
    lat: f64,
    lon: f64,
    #[serde(default)]
    description: String,
    kind: LocationKind,
    #[serde(default)]
    distance_from_start_km: f64,
}

impl TryFrom<LocationRecord> for Location {
    type Error = ValidationError;

    fn try_from(record: LocationRecord) -> Result<Self, Self::Error> {
        Location::new(
            record.name,
            record.lat,
            record.lon,
            record.description,
            record.kind,
            record.distance_from_start_km,
        )
    }
}

impl Location {
    pub fn new(
        name: impl Into<String>,
        lat: f64,
        lon: f64,
        description: impl Into<String>,
        kind: LocationKind,
        distance_from_start_km: f64,
    ) -> Result<Self, ValidationError> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(ValidationError::Latitude(lat));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(ValidationError::Longitude(lon));
        }
        if !(distance_from_start_km >= 0.0) {
            return Err(ValidationError::Distance(distance_from_start_km));
        }
        Ok(Self {
            name: name.into(),
            lat,
            lon,
            description: description.into(),
            kind,
            distance_from_start_km,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn coordinates(&self) -> (f64, f64) {
        (self.lat, self.lon)
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn kind(&self) -> LocationKind {
        self.kind
    }

    pub fn distance_from_start_km(&self) -> f64 {
        self.distance_from_start_km
    }
}

/// Relevance score in `0..=100`
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "i64", into = "u8")]
pub struct RelevanceScore(u8);

impl RelevanceScore {
    pub const ZERO: RelevanceScore = RelevanceScore(0);
    pub const MAX: RelevanceScore = RelevanceScore(100);

    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if (0..=100).contains(&value) {
            Ok(RelevanceScore(value as u8))
        } else {
            Err(ValidationError::RelevanceScore(value))
        }
    }

    /// Saturate out-of-range values into `0..=100`.
    pub fn clamped(value: i64) -> Self {
        RelevanceScore(value.clamp(0, 100) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for RelevanceScore {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        RelevanceScore::new(value)
    }
}

impl From<RelevanceScore> for u8 {
    fn from(score: RelevanceScore) -> Self {
        score.0
    }
}

impl fmt::Display for RelevanceScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Output of one content worker, success or failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentResult {
    pub category: ContentCategory,
    pub title: String,
    pub description: String,
    pub relevance_score: RelevanceScore,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
    /// Name of the agent that produced this result
    #[serde(default)]
    pub agent: String,
    /// Name of the location this content is for
    pub location_name: String,
}

impl ContentResult {
    pub fn new(
        category: ContentCategory,
        location_name: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        relevance_score: RelevanceScore,
    ) -> Self {
        Self {
            category,
            title: title.into(),
            description: description.into(),
            relevance_score,
            metadata: BTreeMap::new(),
            agent: category.as_str().to_string(),
            location_name: location_name.into(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Zero-score result standing in for a failed task.
    pub fn failure(
        category: ContentCategory,
        location_name: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        error: impl Into<String>,
        error_type: &str,
    ) -> Self {
        Self::new(
            category,
            location_name,
            title,
            description,
            RelevanceScore::ZERO,
        )
        .with_metadata("error", error.into())
        .with_metadata("error_type", error_type)
    }

    /// Zero-score result for a task that did not finish before the fan-out deadline.
    pub fn timeout(
        category: ContentCategory,
        location_name: impl Into<String>,
        deadline: Duration,
    ) -> Self {
        Self::failure(
            category,
            location_name,
            format!("Error: {} agent timeout", category),
            format!("Agent exceeded timeout of {:.1}s", deadline.as_secs_f64()),
            "timeout",
            "timeout",
        )
        .with_metadata("timeout", true)
    }

    pub fn is_failure(&self) -> bool {
        self.metadata.contains_key("error")
    }

    pub fn is_timeout(&self) -> bool {
        self.metadata.get("timeout") == Some(&Value::Bool(true))
    }
}

/// How a judgment's winner was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMethod {
    OnlyOption,
    Judge,
    Fallback,
}

/// The selected content for one location plus every candidate considered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "JudgmentRecord")]
pub struct Judgment {
    location: String,
    selected_category: ContentCategory,
    selected_content: ContentResult,
    reasoning: String,
    scores: BTreeMap<ContentCategory, u8>,
    all_content: Vec<ContentResult>,
    method: SelectionMethod,
}

#[derive(Deserialize)]
struct JudgmentRecord {
    location: String,
    selected_category: ContentCategory,
    selected_content: ContentResult,
    reasoning: String,
    #[serde(default)]
    scores: BTreeMap<ContentCategory, u8>,
    all_content: Vec<ContentResult>,
    method: SelectionMethod,
}

impl TryFrom<JudgmentRecord> for Judgment {
    type Error = ValidationError;

    fn try_from(record: JudgmentRecord) -> Result<Self, Self::Error> {
        if record.selected_content.category != record.selected_category {
            return Err(ValidationError::Judgment(format!(
                "selected_category is '{}' but selected_content.category is '{}'",
                record.selected_category, record.selected_content.category
            )));
        }
        if !record.all_content.contains(&record.selected_content) {
            return Err(ValidationError::Judgment(
                "selected_content is not among all_content".to_string(),
            ));
        }
        Ok(Self {
            location: record.location,
            selected_category: record.selected_category,
            selected_content: record.selected_content,
            reasoning: record.reasoning,
            scores: record.scores,
            all_content: record.all_content,
            method: record.method,
        })
    }
}

impl Judgment {
    /// Build a judgment selecting `all_content[selected]`.
    pub fn new(
        all_content: Vec<ContentResult>,
        selected: usize,
        reasoning: impl Into<String>,
        scores: BTreeMap<ContentCategory, u8>,
        method: SelectionMethod,
    ) -> Result<Self, ValidationError> {
        let selected_content = all_content.get(selected).cloned().ok_or_else(|| {
            ValidationError::Judgment(format!(
                "selected index {} out of range for {} candidates",
                selected,
                all_content.len()
            ))
        })?;
        Ok(Self {
            location: selected_content.location_name.clone(),
            selected_category: selected_content.category,
            selected_content,
            reasoning: reasoning.into(),
            scores,
            all_content,
            method,
        })
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn selected_category(&self) -> ContentCategory {
        self.selected_category
    }

    pub fn selected_content(&self) -> &ContentResult {
        &self.selected_content
    }

    pub fn reasoning(&self) -> &str {
        &self.reasoning
    }

    pub fn scores(&self) -> &BTreeMap<ContentCategory, u8> {
        &self.scores
    }

    pub fn all_content(&self) -> &[ContentResult] {
        &self.all_content
    }

    pub fn method(&self) -> SelectionMethod {
        self.method
    }

    pub fn is_fallback(&self) -> bool {
        self.method == SelectionMethod::Fallback
    }
}
