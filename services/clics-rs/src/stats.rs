//! Per-language colexification statistics.
//!
//! For every variety: how many edges of the graph it attests, and how many
//! it could have attested given the concepts its word list covers. Both
//! counts are also taken over the edges that pass the pruning threshold.
//! Run these on the unpruned graph.

use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::graph::ColexGraph;
use crate::types::{ColexEdge, EdgeFilter, Wordlist};

/// Colexification affinity of one variety.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageStats {
    /// Dataset-qualified variety id.
    pub variety: String,
    pub glottocode: Option<String>,
    /// Edges attested in this variety.
    pub colexifications_all: usize,
    /// Edges attested, plus edges whose two concepts both occur in the
    /// word list.
    pub potential_all: usize,
    pub colexifications_threshold: usize,
    pub potential_threshold: usize,
}

struct EdgeView<'a> {
    a: &'a str,
    b: &'a str,
    edge: &'a ColexEdge,
    passes: bool,
}

/// Statistics for every word list, sorted by variety id.
///
/// An edge passes when its `filter` count reaches `threshold`, the same
/// rule [`ColexGraph::prune`] applies. Edges without any language are
/// ignored.
pub fn language_stats(
    graph: &ColexGraph,
    wordlists: &[Wordlist],
    filter: EdgeFilter,
    threshold: usize,
) -> Vec<LanguageStats> {
    let edges: Vec<EdgeView<'_>> = graph
        .edges()
        .filter(|(_, _, e)| !e.languages.is_empty())
        .map(|(a, b, edge)| EdgeView {
            a: &a.id,
            b: &b.id,
            edge,
            passes: edge.weight(filter.weight()) >= threshold as f64,
        })
        .collect();

    let mut stats: Vec<LanguageStats> = wordlists
        .par_iter()
        .map(|list| {
            let gid = list.variety.gid();
            let inventory: BTreeSet<&str> = list
                .forms
                .iter()
                .filter_map(|f| f.concept_id.as_deref())
                .collect();

            let mut stats = LanguageStats {
                variety: gid.clone(),
                glottocode: list.variety.glottocode.clone(),
                colexifications_all: 0,
                potential_all: 0,
                colexifications_threshold: 0,
                potential_threshold: 0,
            };
            for view in &edges {
                let attested = view.edge.varieties.contains(&gid);
                if attested {
                    stats.colexifications_all += 1;
                    stats.potential_all += 1;
                    if view.passes {
                        stats.colexifications_threshold += 1;
                        stats.potential_threshold += 1;
                    }
                } else if inventory.contains(view.a) && inventory.contains(view.b) {
                    stats.potential_all += 1;
                    if view.passes {
                        stats.potential_threshold += 1;
                    }
                }
            }
            stats
        })
        .collect();

    stats.sort_by(|x, y| x.variety.cmp(&y.variety));
    stats
}

/// Languages attesting each edge, keyed by the ordered concept pair.
pub fn colex2lang(graph: &ColexGraph) -> BTreeMap<(String, String), BTreeSet<String>> {
    graph
        .edges()
        .map(|(a, b, edge)| {
            let key = if a.id <= b.id {
                (a.id.clone(), b.id.clone())
            } else {
                (b.id.clone(), a.id.clone())
            };
            (key, edge.languages.iter().cloned().collect())
        })
        .collect()
}
