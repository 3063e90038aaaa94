//! End-to-end pipeline runs with scripted generation services.

use routeguide::{
    ContentCategory, ContentJudge, ContentPipeline, RelevanceScore, RouteGuideConfig,
    SelectionMethod,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::integration::{location, FixedJudge, Script, ScriptedGenerator};

fn fast_config() -> RouteGuideConfig {
    let mut config = RouteGuideConfig::default();
    config.pipeline.content_timeout_ms = 300;
    config.pipeline.judge_timeout_ms = 200;
    config.queues.operation_timeout_ms = 200;
    config
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_one_category_always_times_out() {
    let generator = Arc::new(ScriptedGenerator::new(&[
        (ContentCategory::Video, Script::NeverFinishes),
        (ContentCategory::Music, Script::Score(40)),
        (ContentCategory::History, Script::Slow(Duration::from_millis(20), 75)),
    ]));
    let pipeline = ContentPipeline::new(&fast_config(), generator, None).unwrap();
    let route = vec![
        location("Jaffa", 0.0),
        location("Caesarea", 55.0),
        location("Haifa", 95.0),
    ];

    let started = Instant::now();
    let judgments = pipeline.run(&route).await.unwrap();
    // Three deadlines of 300ms, nowhere near an unbounded hang.
    assert!(started.elapsed() < Duration::from_secs(5));

    assert_eq!(judgments.len(), 3);
    for (judgment, expected) in judgments.iter().zip(["Jaffa", "Caesarea", "Haifa"]) {
        assert_eq!(judgment.location(), expected);
        assert_eq!(judgment.all_content().len(), 3);

        let timeouts: Vec<_> = judgment
            .all_content()
            .iter()
            .filter(|r| r.is_timeout())
            .collect();
        assert_eq!(timeouts.len(), 1);
        assert_eq!(timeouts[0].category, ContentCategory::Video);
        assert_eq!(timeouts[0].relevance_score, RelevanceScore::ZERO);

        assert_ne!(judgment.selected_category(), ContentCategory::Video);
        assert_eq!(judgment.selected_category(), ContentCategory::History);
        assert_eq!(
            judgment.selected_content().category,
            judgment.selected_category()
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_fully_failed_location_still_judged() {
    let generator = Arc::new(ScriptedGenerator::new(&[
        (ContentCategory::Video, Script::Fails),
        (ContentCategory::Music, Script::Fails),
        (ContentCategory::History, Script::NeverFinishes),
    ]));
    let pipeline = ContentPipeline::new(&fast_config(), generator, None).unwrap();
    let judgments = pipeline.run(&[location("Atlit", 20.0)]).await.unwrap();

    assert_eq!(judgments.len(), 1);
    let judgment = &judgments[0];
    assert!(judgment.is_fallback());
    assert!(judgment.all_content().iter().all(|r| r.is_failure()));
    // Everything tied at zero: History wins on priority.
    assert_eq!(judgment.selected_category(), ContentCategory::History);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_judge_verdict_used_when_valid() {
    let generator = Arc::new(ScriptedGenerator::new(&[]));
    let judge: Arc<dyn ContentJudge> = Arc::new(FixedJudge {
        reply: "```json\n{\"selected\": \"spotify\", \"reasoning\": \"Beach soundtrack.\"}\n```"
            .to_string(),
    });
    let pipeline = ContentPipeline::new(&fast_config(), generator, Some(judge)).unwrap();
    let judgments = pipeline
        .run(&[location("Tel Aviv", 0.0), location("Netanya", 30.0)])
        .await
        .unwrap();

    assert_eq!(judgments.len(), 2);
    for judgment in &judgments {
        assert_eq!(judgment.method(), SelectionMethod::Judge);
        assert_eq!(judgment.selected_category(), ContentCategory::Music);
        assert_eq!(judgment.reasoning(), "Beach soundtrack.");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_judge_naming_unknown_category_falls_back() {
    let generator = Arc::new(ScriptedGenerator::new(&[
        (ContentCategory::Video, Script::Score(90)),
    ]));
    let judge: Arc<dyn ContentJudge> = Arc::new(FixedJudge {
        reply: r#"{"selected": "podcast", "reasoning": "Best listen."}"#.to_string(),
    });
    let pipeline = ContentPipeline::new(&fast_config(), generator, Some(judge)).unwrap();
    let judgments = pipeline.run(&[location("Herzliya", 12.0)]).await.unwrap();

    assert!(judgments[0].is_fallback());
    assert_eq!(judgments[0].selected_category(), ContentCategory::Video);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_batched_run_matches_sequential_selection() {
    let scripts = [
        (ContentCategory::Video, Script::Slow(Duration::from_millis(30), 61)),
        (ContentCategory::Music, Script::Score(62)),
        (ContentCategory::History, Script::Slow(Duration::from_millis(10), 60)),
    ];
    let route: Vec<_> = (0..7)
        .map(|i| location(&format!("stop-{}", i), i as f64 * 10.0))
        .collect();

    let sequential = ContentPipeline::new(
        &fast_config(),
        Arc::new(ScriptedGenerator::new(&scripts)),
        None,
    )
    .unwrap()
    .run(&route)
    .await
    .unwrap();

    let mut config = fast_config();
    config.pipeline.batch_size = 3;
    let generator = Arc::new(ScriptedGenerator::new(&scripts));
    let batched = ContentPipeline::new(&config, generator.clone(), None)
        .unwrap()
        .run_batched(&route)
        .await
        .unwrap();

    assert_eq!(generator.calls(), 21);
    assert_eq!(batched.len(), sequential.len());
    for (a, b) in batched.iter().zip(&sequential) {
        assert_eq!(a.location(), b.location());
        assert_eq!(a.selected_category(), ContentCategory::Music);
        assert_eq!(a.selected_category(), b.selected_category());
    }
}

#[tokio::test]
async fn test_clear_between_runs() {
    let pipeline = ContentPipeline::new(
        &fast_config(),
        Arc::new(ScriptedGenerator::new(&[])),
        None,
    )
    .unwrap();
    pipeline
        .enqueue_locations(&[location("Ashkelon", 60.0)])
        .await
        .unwrap();
    let report = pipeline.clear();
    assert_eq!(report.locations, 1);

    // Nothing left to consume: the queue-driven run ends quietly.
    assert!(pipeline.run_from_queue(3).await.unwrap().is_empty());
}
