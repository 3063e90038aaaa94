//! Fallback selection is deterministic and always picks a maximal candidate.

use proptest::prelude::*;
use routeguide::{
    fallback_selection, ContentCategory, ContentResult, RelevanceScore, SelectionMethod,
};

/// One to three results with distinct categories and arbitrary scores.
fn candidates() -> impl Strategy<Value = Vec<ContentResult>> {
    (
        proptest::sample::subsequence(ContentCategory::ALL.to_vec(), 1..=3),
        proptest::collection::vec(0i64..=100, 3),
    )
        .prop_flat_map(|(categories, scores)| {
            let results: Vec<ContentResult> = categories
                .into_iter()
                .zip(scores)
                .map(|(category, score)| {
                    ContentResult::new(
                        category,
                        "Route 90",
                        format!("{} option", category),
                        "",
                        RelevanceScore::new(score).unwrap(),
                    )
                })
                .collect();
            Just(results).prop_shuffle()
        })
}

proptest! {
    #[test]
    fn fallback_picks_highest_score_then_priority(results in candidates()) {
        let judgment = fallback_selection(results.clone(), None).unwrap();
        let winner = judgment.selected_content();

        prop_assert_eq!(judgment.method(), SelectionMethod::Fallback);
        prop_assert_eq!(winner.category, judgment.selected_category());
        prop_assert!(results.contains(winner));
        for other in &results {
            prop_assert!(
                (winner.relevance_score, winner.category.priority())
                    >= (other.relevance_score, other.category.priority())
            );
        }
    }

    #[test]
    fn fallback_ignores_input_order(results in candidates()) {
        let forward = fallback_selection(results.clone(), None).unwrap();
        let mut reversed = results;
        reversed.reverse();
        let backward = fallback_selection(reversed, None).unwrap();
        prop_assert_eq!(forward.selected_category(), backward.selected_category());
        prop_assert_eq!(forward.reasoning(), backward.reasoning());
    }
}
