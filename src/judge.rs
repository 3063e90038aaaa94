//! Selection stage: picks exactly one content result per location.
//!
//! The primary path asks a [`ContentJudge`] for a verdict. Any failure on that
//! path (error, timeout, unparseable reply, or a pick that is not among the
//! candidates) drops to [`fallback_selection`], which is purely algorithmic:
//! highest relevance score, ties broken by [`ContentCategory::priority`].

use crate::error::{GenerationError, SelectionError};
use crate::types::{ContentCategory, ContentResult, Judgment, SelectionMethod};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

mod verdict;

pub use verdict::{extract_json_block, parse_json_object, parse_verdict, Verdict};

/// LLM-backed judge. Returns the raw reply; parsing stays in [`Selector`].
#[async_trait]
pub trait ContentJudge: Send + Sync {
    async fn evaluate(
        &self,
        location_name: &str,
        results: &[ContentResult],
    ) -> Result<String, GenerationError>;
}

/// Chooses the winning content result for one location.
#[derive(Clone)]
pub struct Selector {
    judge: Option<Arc<dyn ContentJudge>>,
    timeout: Duration,
}

impl Selector {
    pub fn new(judge: Option<Arc<dyn ContentJudge>>, timeout: Duration) -> Self {
        Self { judge, timeout }
    }

    /// Selector that never consults a judge.
    pub fn fallback_only() -> Self {
        Self {
            judge: None,
            timeout: Duration::ZERO,
        }
    }

    pub fn has_judge(&self) -> bool {
        self.judge.is_some()
    }

    /// Select one result.
    ///
    /// Fails only for caller errors: no results, or results for more than one location.
    pub async fn select(&self, results: Vec<ContentResult>) -> Result<Judgment, SelectionError> {
        let location = check_single_location(&results)?.to_string();

        if results.len() == 1 {
            let only = &results[0];
            info!(location = %location, selected = %only.category, "Only one content option available");
            let reasoning = format!(
                "Only one content option was available. Selected {} by default.",
                only.category
            );
            let scores = BTreeMap::from([(only.category, only.relevance_score.get())]);
            return build(results, 0, reasoning, scores, SelectionMethod::OnlyOption);
        }

        let Some(judge) = &self.judge else {
            debug!(location = %location, "No judge configured, using fallback selection");
            return fallback_selection(results, None);
        };

        let reply = match tokio::time::timeout(self.timeout, judge.evaluate(&location, &results))
            .await
        {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                warn!(location = %location, error = %e, "Judge call failed, using fallback selection");
                return fallback_selection(results, Some(&e.to_string()));
            }
            Err(_) => {
                let e = GenerationError::Timeout(self.timeout);
                warn!(location = %location, error = %e, "Judge call timed out, using fallback selection");
                return fallback_selection(results, Some(&e.to_string()));
            }
        };

        let verdict = match parse_verdict(&reply) {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!(location = %location, error = %e, "Failed to parse judge response, using fallback");
                return fallback_selection(results, Some(&e.to_string()));
            }
        };

        let Some(index) = results.iter().position(|r| r.category == verdict.selected) else {
            warn!(
                location = %location,
                selected = %verdict.selected,
                "Selected category not found in content, using fallback"
            );
            let note = format!("judge selected '{}' which was not offered", verdict.selected);
            return fallback_selection(results, Some(&note));
        };

        let scores = merge_scores(&results, &verdict.scores);
        info!(location = %location, selected = %verdict.selected, "Judge selected content");
        build(results, index, verdict.reasoning, scores, SelectionMethod::Judge)
    }
}

/// Deterministic selection: highest relevance score, ties broken by category priority.
///
/// `note` is appended to the reasoning to record why the judge was bypassed.
pub fn fallback_selection(
    results: Vec<ContentResult>,
    note: Option<&str>,
) -> Result<Judgment, SelectionError> {
    let index = results
        .iter()
        .enumerate()
        .max_by_key(|(_, r)| (r.relevance_score, r.category.priority()))
        .map(|(index, _)| index)
        .ok_or(SelectionError::NoCandidates)?;

    let winner = &results[index];
    let mut reasoning = format!(
        "Selected {} based on highest relevance score ({}).",
        winner.category, winner.relevance_score
    );
    if let Some(note) = note {
        reasoning.push_str(&format!(" Fallback reason: {}.", note.trim_end_matches('.')));
    }

    let scores = merge_scores(&results, &BTreeMap::new());
    build(results, index, reasoning, scores, SelectionMethod::Fallback)
}

/// Relevance scores for every supplied category, overridden by judge scores where given.
fn merge_scores(
    results: &[ContentResult],
    judged: &BTreeMap<ContentCategory, u8>,
) -> BTreeMap<ContentCategory, u8> {
    let mut scores = BTreeMap::new();
    for result in results {
        let score = result.relevance_score.get();
        scores
            .entry(result.category)
            .and_modify(|existing: &mut u8| *existing = (*existing).max(score))
            .or_insert(score);
    }
    for (category, score) in judged {
        if let Some(slot) = scores.get_mut(category) {
            *slot = *score;
        }
    }
    scores
}

fn check_single_location(results: &[ContentResult]) -> Result<&str, SelectionError> {
    let first = results.first().ok_or(SelectionError::NoCandidates)?;
    if let Some(other) = results
        .iter()
        .find(|r| r.location_name != first.location_name)
    {
        return Err(SelectionError::MixedLocations {
            expected: first.location_name.clone(),
            found: other.location_name.clone(),
        });
    }
    Ok(&first.location_name)
}

fn build(
    results: Vec<ContentResult>,
    index: usize,
    reasoning: String,
    scores: BTreeMap<ContentCategory, u8>,
    method: SelectionMethod,
) -> Result<Judgment, SelectionError> {
    // Index always comes from the non-empty `results`.
    Judgment::new(results, index, reasoning, scores, method).map_err(|_| SelectionError::NoCandidates)
}
