//! Optional facet overlay (`usage-data/facets/*.json`).
//!
//! Facets are computed elsewhere and may be missing entirely; only their
//! goal-category counts feed the summary.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;
use wrapped_core::models::FacetData;

use crate::reader::{list_json_files, read_json_file};

/// Load every facet file in `dir`, skipping unreadable or malformed ones.
pub fn load_facets(dir: &Path) -> Vec<FacetData> {
    let files = list_json_files(dir);
    let facets: Vec<FacetData> = files
        .iter()
        .filter_map(|path| read_json_file::<FacetData>(path))
        .collect();
    debug!(
        "Loaded {} of {} facet files from {}",
        facets.len(),
        files.len(),
        dir.display()
    );
    facets
}

/// Sum the goal-category counts of all facets.
pub fn facet_goal_counts(facets: &[FacetData]) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for facet in facets {
        for (category, count) in &facet.goal_categories {
            let total = counts.entry(category.clone()).or_insert(0u64);
            *total = total.saturating_add(*count);
        }
    }
    counts
}
