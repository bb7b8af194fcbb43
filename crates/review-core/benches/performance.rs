use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use review_core::{
    AnchorManager, CellMetrics, CriterionRegistry, Insight, LayoutOptions, OverlayRenderer,
    TextEdit, TextLayout, Viewport,
};

const PARAGRAPH: &str = "The committee reviewed the proposal and found the evidence for the \
    option incomplete; costs and risks require a further assessment before approval.";

fn large_text(paragraphs: usize) -> String {
    let mut out = String::with_capacity(paragraphs * 160);
    for i in 0..paragraphs {
        out.push_str(&format!("Section {i:05}. "));
        out.push_str(PARAGRAPH);
        out.push('\n');
    }
    out.pop();
    out
}

/// One insight per paragraph, on the word "evidence".
fn insights_for(manager: &AnchorManager, text: &str) -> Vec<Insight> {
    let mut insights = Vec::new();
    let mut line_start = 0usize;
    for (i, line) in text.split('\n').enumerate() {
        if let Some(byte) = line.find("evidence") {
            let start = line_start + line[..byte].chars().count();
            let raw = Insight::new(format!("i{i}"), "evidence", "evidence", start..start + 8);
            insights.push(manager.enhance(&raw, text));
        }
        line_start += line.chars().count() + 1;
    }
    insights
}

fn bench_apply_edit_at_top(c: &mut Criterion) {
    let manager = AnchorManager::default();
    let text = large_text(2_000);
    let insights = insights_for(&manager, &text);
    let edit = TextEdit::insert(0, "Draft. ");
    let edited = edit.apply(&text);

    c.bench_function("apply_edit/shift_2k_insights", |b| {
        b.iter(|| manager.apply_edit(black_box(&insights), &edit, &edited))
    });
}

fn bench_full_reanchor(c: &mut Criterion) {
    let manager = AnchorManager::default();
    let text = large_text(500);
    let insights = insights_for(&manager, &text);
    let edited = format!("Draft. {text}");

    c.bench_function("refresh_all/500_insights", |b| {
        b.iter_batched(
            || insights.clone(),
            |insights| black_box(manager.refresh_all(&insights, &edited)),
            BatchSize::LargeInput,
        )
    });
}

fn bench_overlay_render(c: &mut Criterion) {
    let manager = AnchorManager::default();
    let text = large_text(2_000);
    let insights = insights_for(&manager, &text);
    let criteria = CriterionRegistry::decision_rubric();
    let renderer = OverlayRenderer::new(criteria, CellMetrics::default());
    let options = LayoutOptions::default();
    let layout = TextLayout::new(&text, options);
    let view = Viewport {
        scroll_x: 0.0,
        scroll_y: 20_000.0,
        height: Some(800.0),
    };

    c.bench_function("layout/2k_paragraphs", |b| {
        b.iter(|| TextLayout::new(black_box(&text), options).row_count())
    });
    c.bench_function("overlay_render/visible_window", |b| {
        b.iter(|| renderer.render(&layout, &insights, &view, None).len())
    });
}

criterion_group!(
    benches,
    bench_apply_edit_at_top,
    bench_full_reanchor,
    bench_overlay_render
);
criterion_main!(benches);
