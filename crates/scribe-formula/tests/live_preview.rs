//! Live preview pipeline tests
//!
//! These run under paused time, so debounce windows and slow service calls
//! resolve deterministically without real waiting.

use std::sync::Arc;
use std::time::Duration;

use futures::future::FutureExt;
use scribe_core::{ExternalServices, FormulaContext, ServiceFuture, Value};
use scribe_formula::{EvaluateOptions, LivePreview, PreviewOptions};

fn preview_options() -> PreviewOptions {
    PreviewOptions {
        debounce: Duration::from_millis(300),
        evaluate: EvaluateOptions {
            timeout: Duration::from_secs(60),
        },
    }
}

/// Weather provider whose latency is encoded in the location text, so a
/// test can stage a slow generation racing a fast one.
struct StagedLatency;

impl ExternalServices for StagedLatency {
    fn weather<'a>(&'a self, location: &'a str) -> ServiceFuture<'a> {
        let delay = if location == "slow" {
            Duration::from_secs(10)
        } else {
            Duration::from_millis(1)
        };
        async move {
            tokio::time::sleep(delay).await;
            Ok(Value::text(format!("sunny in {}", location)))
        }
        .boxed()
    }

    fn distance<'a>(&'a self, _from: &'a str, _to: &'a str) -> ServiceFuture<'a> {
        async move { Ok(Value::Number(0.0)) }.boxed()
    }

    fn route<'a>(&'a self, _from: &'a str, _to: &'a str) -> ServiceFuture<'a> {
        async move { Ok(Value::text("")) }.boxed()
    }
}

/// Rapid edits within the debounce window publish exactly one result, for
/// the final text; no intermediate parse error is ever shown.
#[tokio::test(start_paused = true)]
async fn test_rapid_edits_publish_once() {
    let (preview, mut updates) = LivePreview::spawn(FormulaContext::default, preview_options());

    preview.edit("S");
    tokio::time::sleep(Duration::from_millis(50)).await;
    preview.edit("SU");
    tokio::time::sleep(Duration::from_millis(50)).await;
    preview.edit("SUM(1,2)");

    let update = updates.recv().await.unwrap();
    assert_eq!(update.text, "SUM(1,2)");
    assert_eq!(update.generation, 3);
    assert!(update.result.success);
    assert_eq!(update.result.value, Some(Value::Number(3.0)));

    // Nothing else arrives once the pipeline is quiet
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(updates.try_recv().is_err());

    preview.shutdown().await;
}

/// A slow evaluation that completes after a newer one has settled is
/// silently discarded; the newer result stands.
#[tokio::test(start_paused = true)]
async fn test_stale_generation_is_discarded() {
    let (preview, mut updates) = LivePreview::spawn(
        || {
            FormulaContext::builder()
                .services(Arc::new(StagedLatency))
                .build()
        },
        preview_options(),
    );

    // Generation 1 debounces at 300ms and then spends 10s in the provider
    preview.edit("WEATHER(\"slow\")");

    // Generation 2 arrives while generation 1 is still in flight
    tokio::time::sleep(Duration::from_millis(400)).await;
    preview.edit("SUM(1,2)");

    let update = updates.recv().await.unwrap();
    assert_eq!(update.generation, 2);
    assert_eq!(update.result.value, Some(Value::Number(3.0)));

    // Let the slow generation finish; its result must never surface
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(updates.try_recv().is_err());

    preview.shutdown().await;
}

/// A parse error in the settled text is published (the editor shows it
/// inline); it is not swallowed like a superseded intermediate state.
#[tokio::test(start_paused = true)]
async fn test_settled_parse_error_is_published() {
    let (preview, mut updates) = LivePreview::spawn(FormulaContext::default, preview_options());

    preview.edit("SUM(1, 2");

    let update = updates.recv().await.unwrap();
    assert!(!update.result.success);
    assert_eq!(update.result.error.as_deref(), Some("unbalanced parentheses"));
    assert!(update.dependencies.is_empty());

    preview.shutdown().await;
}

/// Settled updates carry the dependency set for reactive invalidation
#[tokio::test(start_paused = true)]
async fn test_updates_carry_dependencies() {
    let (preview, mut updates) = LivePreview::spawn(
        || {
            FormulaContext::builder()
                .field("price", 100.0)
                .field("tax", 25.0)
                .build()
        },
        preview_options(),
    );

    preview.edit("SUM(price, tax)");

    let update = updates.recv().await.unwrap();
    assert!(update.result.success);
    assert_eq!(update.result.value, Some(Value::Number(125.0)));

    let mut deps: Vec<&str> = update.dependencies.iter().map(|s| s.as_str()).collect();
    deps.sort_unstable();
    assert_eq!(deps, vec!["price", "tax"]);

    preview.shutdown().await;
}

/// Each evaluation gets a fresh context snapshot from the factory
#[tokio::test(start_paused = true)]
async fn test_context_factory_called_per_evaluation() {
    use std::sync::atomic::{AtomicU64, Ordering};

    let calls = Arc::new(AtomicU64::new(0));
    let calls_in_factory = Arc::clone(&calls);

    let (preview, mut updates) = LivePreview::spawn(
        move || {
            calls_in_factory.fetch_add(1, Ordering::SeqCst);
            FormulaContext::default()
        },
        preview_options(),
    );

    preview.edit("SUM(1)");
    updates.recv().await.unwrap();

    preview.edit("SUM(2)");
    updates.recv().await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);

    preview.shutdown().await;
}
