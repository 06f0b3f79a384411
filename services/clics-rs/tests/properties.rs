use clics_core::community::{subgraph::SubgraphCover, SubgraphOptions};
use clics_core::{build, ColexGraph, Options, Registry, Variety, WordForm, Wordlist};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

/// Word lists over a small token/concept alphabet so that colexifications
/// are frequent. Family is a function of glottocode.
fn wordlists_strategy() -> impl Strategy<Value = Vec<Wordlist>> {
    let forms = proptest::collection::vec((0..6usize, 0..6usize), 0..12);
    proptest::collection::vec(forms, 1..6).prop_map(|languages| {
        languages
            .into_iter()
            .enumerate()
            .map(|(l, forms)| {
                let glottocode = l % 3;
                let variety = Variety::new(format!("v{l}"), "prop")
                    .with_glottocode(format!("g{glottocode}"))
                    .with_family(format!("f{}", glottocode % 2));
                let forms = forms
                    .into_iter()
                    .enumerate()
                    .map(|(i, (t, c))| WordForm::new(format!("{i}"), format!("t{t}"), format!("c{c}")))
                    .collect();
                let mut list = Wordlist::new(variety, forms);
                list.sort_by_token();
                list
            })
            .collect()
    })
}

fn edge_counts(graph: &ColexGraph) -> BTreeMap<(String, String), usize> {
    graph
        .edges()
        .map(|(a, b, e)| {
            let key = if a.id <= b.id {
                (a.id.clone(), b.id.clone())
            } else {
                (b.id.clone(), a.id.clone())
            };
            (key, e.count)
        })
        .collect()
}

proptest! {
    #[test]
    fn no_self_loops(lists in wordlists_strategy()) {
        let graph = build(&lists).unwrap();
        for (a, b, _) in graph.edges() {
            prop_assert_ne!(&a.id, &b.id);
        }
    }

    #[test]
    fn counts_are_nested(lists in wordlists_strategy()) {
        let graph = build(&lists).unwrap();
        for (_, _, e) in graph.edges() {
            prop_assert!(e.summary.family_count <= e.summary.language_count);
            prop_assert!(e.summary.language_count <= e.summary.variety_count);
            prop_assert!(e.summary.variety_count <= e.count);
            prop_assert_eq!(e.words.len(), e.count);
            prop_assert_eq!(e.families.len(), e.count);
        }
        for node in graph.nodes() {
            prop_assert!(node.summary.family_count <= node.summary.language_count);
            prop_assert!(node.summary.language_count <= node.summary.variety_count);
        }
    }

    #[test]
    fn input_order_does_not_change_edges(lists in wordlists_strategy()) {
        let forward = build(&lists).unwrap();
        let mut reversed = lists.clone();
        reversed.reverse();
        let backward = build(&reversed).unwrap();

        prop_assert_eq!(edge_counts(&forward), edge_counts(&backward));
        let ids = |g: &ColexGraph| g.nodes().map(|n| n.id.clone()).collect::<BTreeSet<_>>();
        prop_assert_eq!(ids(&forward), ids(&backward));
    }

    #[test]
    fn subgraph_cover_is_complete(lists in wordlists_strategy()) {
        let graph = build(&lists).unwrap();
        let covered: BTreeSet<String> = SubgraphCover::new(&graph, &SubgraphOptions::default())
            .flatten()
            .collect();
        prop_assert_eq!(covered.len(), graph.node_count());
    }

    #[test]
    fn registry_algorithms_cover_all_nodes(lists in wordlists_strategy()) {
        let graph = build(&lists).unwrap();
        let registry = Registry::new();
        for algorithm in registry.algorithms() {
            let covered: BTreeSet<String> = registry
                .cluster(&graph, algorithm.name, &Options::new())
                .unwrap()
                .flatten()
                .collect();
            prop_assert_eq!(covered.len(), graph.node_count());
        }
    }
}
