use lexmatch::{
    CorpusIndex, EngineConfig, EngineState, Error, Match, SnowballLemmatizer, StopwordConfig, TextualEntry,
};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

const FAQ: &str = "Is tuna a good fish for cooking?";
const SASHIMI: &str = "Yellow tailed tuna makes for great sashimi";
const DISH: &str = "Good tuna sashimi is a fish dish";

fn sample_corpus() -> Vec<TextualEntry> {
    vec![
        TextualEntry::with_origin(FAQ, "faq"),
        TextualEntry::with_origin(SASHIMI, "menu"),
        TextualEntry::with_origin("The quick brown fox jumped over the bridge", "typing"),
        TextualEntry::new("The salmon is a fish of the northern rivers"),
        TextualEntry::new("The trout is a fish of the mountain lakes"),
        TextualEntry::new("The cod is the fish of the fish and chips"),
        TextualEntry::new("Grilled mackerel is a fish for the summer"),
        TextualEntry::new("The baker is going to the bakery"),
        TextualEntry::new("The train is leaving the station for Dover"),
        TextualEntry::new("Rice cooking is the first step for good sushi"),
        TextualEntry::new(DISH),
        TextualEntry::with_origin(SASHIMI, "market"),
    ]
}

async fn filled_engine() -> Arc<CorpusIndex> {
    let engine = Arc::new(CorpusIndex::new());
    engine.fill(sample_corpus()).unwrap().await.unwrap();
    engine
}

fn first_text(found: &Match) -> &str {
    found.entries[0].text()
}

#[tokio::test]
async fn fill_publishes_the_corpus() {
    let engine = Arc::new(CorpusIndex::new());
    assert_eq!(engine.state(), EngineState::NotFilled);
    let summary = engine.fill(sample_corpus()).unwrap().await.unwrap();
    assert!(engine.is_filled());
    assert_eq!(summary.input_entries, 12);
    assert_eq!(summary.indexed_entries, 12);
    assert_eq!(summary.groups, 11);
    assert_eq!(summary.stopwords, 1);
    assert!(engine.stopwords().unwrap().contains("the"));
}

#[tokio::test]
async fn query_found_in_corpus() {
    let engine = filled_engine().await;
    let found = engine.best_result(&TextualEntry::new("yellow tuna"), false).unwrap().unwrap();
    assert!(first_text(&found).contains("Yellow"));
    assert!(found.quality > 0.2);
}

#[tokio::test]
async fn match_lists_every_duplicate() {
    let engine = filled_engine().await;
    let found = engine.best_result(&TextualEntry::new(SASHIMI), false).unwrap().unwrap();
    assert!(found.quality > 0.8);
    let origins: Vec<Option<&str>> = found.entries.iter().map(TextualEntry::origin).collect();
    assert_eq!(origins, vec![Some("menu"), Some("market")]);
    assert!(found.entries.iter().all(|e| e.text() == SASHIMI));
}

#[tokio::test]
async fn query_not_found_in_corpus() {
    let engine = filled_engine().await;
    let found = engine.best_result(&TextualEntry::new("Zwei Zwerge stehen an der Kueche"), true).unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn unrelated_query_against_single_entry_corpus() {
    let engine = Arc::new(CorpusIndex::new());
    engine.fill(vec![TextualEntry::new("The quick brown fox jumped over the bridge")]).unwrap().await.unwrap();
    assert!(engine.best_result(&TextualEntry::new("yellow tailed tuna"), false).unwrap().is_none());
    assert!(engine.best_result(&TextualEntry::new("yellow tailed tuna"), true).unwrap().is_none());
}

#[tokio::test]
async fn list_of_results_for_query() {
    let engine = filled_engine().await;
    let results = engine.results(0.1, &TextualEntry::new(FAQ)).unwrap().unwrap();
    assert_eq!(first_text(&results[0]), FAQ);
    assert_eq!(results[0].quality, 1.0);
    assert!(results.iter().all(|r| r.quality <= results[0].quality));
    // every entry but the fox shares at least one token with the question
    assert_eq!(results.len(), 10);
    assert_eq!(first_text(&results[1]), DISH);
}

#[tokio::test]
async fn results_respect_threshold_and_order() {
    let engine = filled_engine().await;
    let results = engine.results(0.4, &TextualEntry::new(FAQ)).unwrap().unwrap();
    assert!(results.iter().all(|r| r.quality >= 0.4));
    assert!(results.windows(2).all(|w| w[0].quality >= w[1].quality));
    let texts: Vec<&str> = results.iter().map(first_text).collect();
    assert_eq!(
        texts,
        vec![
            FAQ,
            DISH,
            "Grilled mackerel is a fish for the summer",
            "Rice cooking is the first step for good sushi",
            "The salmon is a fish of the northern rivers",
            "The trout is a fish of the mountain lakes",
        ]
    );
    assert!(engine.results(1.0, &TextualEntry::new("lighthouse keeper")).unwrap().is_none());
}

#[tokio::test]
async fn lowercase_query_matches_capitalized_entry() {
    let engine = Arc::new(CorpusIndex::new());
    engine
        .fill(vec![
            TextualEntry::new("Grilled mackerel is a fish for the summer"),
            TextualEntry::new("The trout is a fish of the mountain lakes"),
            TextualEntry::new("Rice cooking is the first step for good sushi"),
        ])
        .unwrap()
        .await
        .unwrap();
    let found = engine.best_result(&TextualEntry::new("grilled mackerel"), true).unwrap().unwrap();
    assert_eq!(first_text(&found), "Grilled mackerel is a fish for the summer");
    assert_eq!(found.quality, 1.0);
    let found = engine.best_result(&TextualEntry::new("Cooking rice"), true).unwrap().unwrap();
    assert_eq!(found.quality, 1.0);
}

#[tokio::test]
async fn corpus_of_one_distinct_token_indexes_nothing() {
    let engine = Arc::new(CorpusIndex::new());
    let corpus = vec![TextualEntry::new("tuna"), TextualEntry::new("Tuna!"), TextualEntry::new("tuna, tuna")];
    let summary = engine.fill(corpus).unwrap().await.unwrap();
    assert_eq!(summary.input_entries, 3);
    assert_eq!(summary.indexed_entries, 0);
    assert_eq!(summary.discarded_entries, 3);
    assert_eq!(summary.groups, 0);
    assert_eq!(summary.stopwords, 1);
    assert!(engine.is_filled());
    assert!(engine.normalized_entries().unwrap().is_empty());

    let query = TextualEntry::new("tuna");
    assert!(engine.best_result(&query, false).unwrap().is_none());
    assert!(engine.best_result(&query, true).unwrap().is_none());
    assert!(engine.results(0.0, &query).unwrap().is_none());
}

#[tokio::test]
async fn early_accept_is_not_exhaustive() {
    let engine = filled_engine().await;
    let query = TextualEntry::new("good tuna fish sashimi");
    let fast = engine.best_result(&query, false).unwrap().unwrap();
    assert_eq!(first_text(&fast), FAQ);
    assert_eq!(fast.quality, 0.75);
    let best = engine.best_result(&query, true).unwrap().unwrap();
    assert_eq!(first_text(&best), DISH);
    assert_eq!(best.quality, 1.0);
}

#[tokio::test]
async fn scores_are_containment_ratios() {
    let engine = filled_engine().await;
    for text in [FAQ, SASHIMI, "tuna", "fish chips and salmon", "the baker leaves for Dover"] {
        let query_tokens = engine.normalize_query(text).unwrap();
        let Some(results) = engine.results(0.0, &TextualEntry::new(text)).unwrap() else {
            continue;
        };
        for result in results {
            assert!((0.0..=1.0).contains(&result.quality));
            let covered = query_tokens.is_subset(&result.tokens);
            assert_eq!(result.quality == 1.0, covered, "{text} vs {:?}", result.tokens);
        }
    }
}

#[tokio::test]
async fn queries_before_fill_fail() {
    let engine = CorpusIndex::new();
    let query = TextualEntry::new("tuna");
    assert!(matches!(engine.best_result(&query, true), Err(Error::EngineNotFilled)));
    assert!(matches!(engine.results(0.5, &query), Err(Error::EngineNotFilled)));
}

#[tokio::test]
async fn invalid_threshold_is_rejected() {
    let engine = filled_engine().await;
    let query = TextualEntry::new("tuna");
    assert!(matches!(engine.results(1.1, &query), Err(Error::InvalidArgumentValue { .. })));
    assert!(matches!(engine.results(f32::NAN, &query), Err(Error::InvalidArgumentValue { .. })));
}

#[tokio::test]
async fn second_fill_is_rejected() {
    let engine = Arc::new(CorpusIndex::new());
    let first = engine.fill(sample_corpus()).unwrap();
    let second = engine.fill(sample_corpus());
    assert!(matches!(second, Err(Error::AlreadyFilling) | Err(Error::AlreadyFilled)));
    first.await.unwrap();
    assert!(matches!(engine.fill(sample_corpus()), Err(Error::AlreadyFilled)));
}

#[test]
fn completion_callback_fires_after_publish() {
    let engine = Arc::new(CorpusIndex::new());
    let (tx, rx) = mpsc::channel();
    let observer = Arc::clone(&engine);
    engine
        .fill_with(sample_corpus(), move |outcome| {
            tx.send((outcome.map(|s| s.groups), observer.state())).unwrap();
        })
        .unwrap();
    let (groups, state) = rx.recv().unwrap();
    assert_eq!(groups.unwrap(), 11);
    assert_eq!(state, EngineState::Filled);
    assert!(rx.recv().is_err(), "callback must fire once");
}

#[test]
fn background_fill_runs_on_the_rayon_pool() {
    let engine = Arc::new(CorpusIndex::new());
    let (tx, rx) = mpsc::channel();
    engine
        .fill_with(sample_corpus(), move |outcome| {
            tx.send((outcome.is_ok(), rayon::current_thread_index().is_some())).unwrap();
        })
        .unwrap();
    assert_eq!(rx.recv().unwrap(), (true, true));
}

#[test]
fn concurrent_queries_agree() {
    let engine = Arc::new(CorpusIndex::new());
    engine.fill(sample_corpus()).unwrap().wait().unwrap();
    let workers: Vec<_> = (0..8)
        .map(|_| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                let found = engine.best_result(&TextualEntry::new("good tuna fish sashimi"), true).unwrap().unwrap();
                (found.entries[0].text().to_string(), found.quality)
            })
        })
        .collect();
    for worker in workers {
        assert_eq!(worker.join().unwrap(), (DISH.to_string(), 1.0));
    }
}

#[test]
fn custom_config_changes_early_accept() {
    let config = EngineConfig { early_accept: 0.8, stopwords: StopwordConfig::default() };
    let engine = Arc::new(CorpusIndex::with_config(lexmatch::EnglishLemmatizer, config).unwrap());
    engine.fill(sample_corpus()).unwrap().wait().unwrap();
    // 0.75 for the FAQ entry no longer short-circuits the scan
    let found = engine.best_result(&TextualEntry::new("good tuna fish sashimi"), false).unwrap().unwrap();
    assert_eq!(first_text(&found), DISH);

    let bad = EngineConfig { early_accept: 2.0, ..EngineConfig::default() };
    assert!(matches!(CorpusIndex::with_config(lexmatch::EnglishLemmatizer, bad), Err(Error::InvalidConfig(_))));
}

#[test]
fn snowball_lemmatizer_can_be_injected() {
    let engine = Arc::new(CorpusIndex::with_lemmatizer(SnowballLemmatizer::english()));
    engine.fill(sample_corpus()).unwrap().wait().unwrap();
    let found = engine.best_result(&TextualEntry::new(SASHIMI), true).unwrap().unwrap();
    assert_eq!(found.quality, 1.0);
    assert_eq!(found.entries.len(), 2);
}
