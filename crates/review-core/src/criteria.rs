//! Review rubric registry.
//!
//! Criteria are identified by opaque string keys. The engine only looks up a display name and
//! a color token per key; unknown keys fall back to [`FALLBACK_COLOR`] and show the raw id.

use std::collections::HashMap;

/// Color token used for criteria missing from the registry.
pub const FALLBACK_COLOR: &str = "neutral";

/// One rubric criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Criterion {
    /// Stable key referenced by insights.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Color token resolved by the presentation layer.
    pub color: String,
}

impl Criterion {
    /// Create a criterion.
    pub fn new(id: impl Into<String>, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color: color.into(),
        }
    }
}

/// Static criterion lookup table.
#[derive(Debug, Clone, Default)]
pub struct CriterionRegistry {
    order: Vec<String>,
    by_id: HashMap<String, Criterion>,
}

impl CriterionRegistry {
    /// Build a registry; later entries with a duplicate id replace earlier ones.
    pub fn new(criteria: impl IntoIterator<Item = Criterion>) -> Self {
        let mut registry = Self::default();
        for criterion in criteria {
            if !registry.by_id.contains_key(&criterion.id) {
                registry.order.push(criterion.id.clone());
            }
            registry.by_id.insert(criterion.id.clone(), criterion);
        }
        registry
    }

    /// The twelve-criterion rubric for decision documents.
    pub fn decision_rubric() -> Self {
        Self::new([
            Criterion::new("purpose", "Purpose and context", "blue"),
            Criterion::new("problem", "Problem definition", "indigo"),
            Criterion::new("evidence", "Evidence base", "teal"),
            Criterion::new("options", "Options analysis", "green"),
            Criterion::new("costs", "Costs and benefits", "lime"),
            Criterion::new("risks", "Risks and mitigations", "orange"),
            Criterion::new("legal", "Legal and policy alignment", "red"),
            Criterion::new("consultation", "Consultation", "pink"),
            Criterion::new("equity", "Equity and impact", "purple"),
            Criterion::new("implementation", "Implementation plan", "cyan"),
            Criterion::new("evaluation", "Monitoring and evaluation", "amber"),
            Criterion::new("clarity", "Clarity of recommendation", "yellow"),
        ])
    }

    /// Look up a criterion.
    pub fn get(&self, id: &str) -> Option<&Criterion> {
        self.by_id.get(id)
    }

    /// Color token for `id`, falling back for unknown keys.
    pub fn color_for(&self, id: &str) -> &str {
        match self.get(id) {
            Some(criterion) => criterion.color.as_str(),
            None => FALLBACK_COLOR,
        }
    }

    /// Display name for `id`; unknown keys display as themselves.
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        match self.get(id) {
            Some(criterion) => criterion.name.as_str(),
            None => id,
        }
    }

    /// Criteria in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Criterion> {
        self.order.iter().filter_map(|id| self.by_id.get(id))
    }

    /// Number of criteria.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// `true` if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
