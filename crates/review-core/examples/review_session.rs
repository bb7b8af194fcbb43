//! Review session example
//!
//! Walks a surface through analysis, typing, undo and persistence. Run with
//! `RUST_LOG=review_core=debug` to see anchoring decisions.

use review_core::{
    Analyzer, AnalyzerError, Insight, MemoryStore, ReviewConfig, ReviewSurface, TimerKey,
};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Flags every occurrence of a fixed phrase.
struct PhraseAnalyzer {
    phrase: &'static str,
    criterion: &'static str,
}

impl Analyzer for PhraseAnalyzer {
    async fn analyze(
        &self,
        text: &str,
        max_insights: usize,
    ) -> Result<Vec<Insight>, AnalyzerError> {
        let len = self.phrase.chars().count();
        let insights = text
            .match_indices(self.phrase)
            .take(max_insights)
            .map(|(byte, _)| {
                let start = text[..byte].chars().count();
                Insight::local(self.criterion, self.phrase, start..start + len)
            })
            .collect();
        Ok(insights)
    }
}

fn print_insights(surface: &ReviewSurface) {
    for insight in surface.insights() {
        let span = format!("{}..{}", insight.range_start, insight.range_end);
        let stale = insight.is_stale;
        println!(
            "  {:<12} {span:>8} stale={stale} {:?}",
            insight.criterion_id, insight.quote
        );
    }
    println!("  stale: {:.1}%", surface.stale_percentage());
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = ReviewConfig::load().unwrap_or_default();
    let mut surface = ReviewSurface::new(
        "The proposal lacks evidence. Further evidence is expected from the pilot.",
        config,
    );

    let changes = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&changes);
    surface.subscribe(move |change| {
        *counter.lock().unwrap() += 1;
        println!(
            "  change: {:?} (version {} -> {})",
            change.kind, change.old_version, change.new_version
        );
    });

    println!("1. Analysis:");
    let analyzer = PhraseAnalyzer {
        phrase: "evidence",
        criterion: "evidence",
    };
    if let Err(err) = surface.analyze(&analyzer).await {
        println!("  analysis failed: {err}");
    }
    print_insights(&surface);

    println!("\n2. Typing at the start:");
    let t0 = Instant::now();
    surface.handle_input(
        "Overall, the proposal lacks evidence. Further evidence is expected from the pilot.",
        9,
        t0,
    );
    print_insights(&surface);

    println!("\n3. Rewriting the first finding:");
    surface.handle_input(
        "Overall, the proposal lacks data. Further evidence is expected from the pilot.",
        33,
        t0 + Duration::from_millis(400),
    );
    print_insights(&surface);

    let fired = surface.tick(t0 + Duration::from_secs(1));
    println!("  timers fired: {fired:?}");
    assert!(fired.contains(&TimerKey::Commit));

    println!("\n4. Undo:");
    surface.undo(t0 + Duration::from_secs(2));
    println!("  text: {}", surface.content());
    print_insights(&surface);

    println!("\n5. Save:");
    let mut store = MemoryStore::new();
    match surface.save(&mut store) {
        Ok(id) => println!("  saved as {id}"),
        Err(err) => println!("  save failed: {err}"),
    }

    println!("\nTotal changes observed: {}", changes.lock().unwrap());
}
