//! Extraction of colexifications from per-language word lists.
//!
//! Each word list is scanned independently (in parallel) into token groups
//! and pairwise occurrences; the per-language results are then merged into
//! a single graph in input order, followed by one summary pass.

use ahash::AHashSet;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::graph::ColexGraph;
use crate::types::{Variety, WordForm, Wordlist};

/// Restricts which varieties and concepts enter the graph. Every unset
/// field accepts everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildFilter {
    /// Keep only varieties of this family.
    pub family: Option<String>,
    /// Keep only forms of these concept ids.
    pub concepts: Option<BTreeSet<String>>,
    /// Keep only these varieties, by id or dataset-qualified id. Takes
    /// precedence over `family`.
    pub languages: Option<BTreeSet<String>>,
}

impl BuildFilter {
    pub fn family(mut self, family: impl Into<String>) -> Self {
        self.family = Some(family.into());
        self
    }

    pub fn concepts<I, S>(mut self, concepts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.concepts = Some(concepts.into_iter().map(Into::into).collect());
        self
    }

    pub fn languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.languages = Some(languages.into_iter().map(Into::into).collect());
        self
    }

    pub fn accepts_variety(&self, variety: &Variety) -> bool {
        match (&self.languages, &self.family) {
            (Some(languages), _) => {
                languages.contains(&variety.id) || languages.contains(&variety.gid())
            }
            (None, Some(family)) => variety.family.as_ref() == Some(family),
            (None, None) => true,
        }
    }

    pub fn accepts_concept(&self, concept: &str) -> bool {
        self.concepts
            .as_ref()
            .map_or(true, |concepts| concepts.contains(concept))
    }
}

/// Forms of one variety sharing a normalized token, at most one per concept.
#[derive(Debug, Clone)]
pub struct TokenGroup<'a> {
    pub token: &'a str,
    pub forms: Vec<(&'a str, &'a WordForm)>,
}

impl<'a> TokenGroup<'a> {
    /// Whether the group links two or more concepts.
    pub fn is_colexification(&self) -> bool {
        self.forms.len() > 1
    }

    /// All unordered pairs of forms in the group.
    pub fn pairs(&self) -> impl Iterator<Item = ((&'a str, &'a WordForm), (&'a str, &'a WordForm))> + '_ {
        self.forms
            .iter()
            .enumerate()
            .flat_map(move |(i, &a)| self.forms[i + 1..].iter().map(move |&b| (a, b)))
    }
}

/// Group the forms of a word list by token.
///
/// Forms without token or concept are skipped, and a token made only of
/// whitespace counts as no token. Forms must arrive grouped
/// by token (see [`Wordlist::sort_by_token`]); a token that reappears after
/// a different one is a [`Error::DataIntegrity`] error. Within a group only
/// the first form of each concept is kept.
pub fn token_groups(wordlist: &Wordlist) -> Result<Vec<TokenGroup<'_>>> {
    token_groups_filtered(wordlist, &BuildFilter::default())
}

/// [`token_groups`] restricted to the concepts `filter` accepts.
pub fn token_groups_filtered<'a>(
    wordlist: &'a Wordlist,
    filter: &BuildFilter,
) -> Result<Vec<TokenGroup<'a>>> {
    let mut groups: Vec<TokenGroup<'_>> = Vec::new();
    let mut seen: AHashSet<&str> = AHashSet::new();

    for form in &wordlist.forms {
        let (Some(token), Some(concept)) = (form.token.as_deref(), form.concept_id.as_deref())
        else {
            continue;
        };
        if token.trim().is_empty() || concept.is_empty() || !filter.accepts_concept(concept) {
            continue;
        }

        match groups.last_mut() {
            Some(group) if group.token == token => {
                if !group.forms.iter().any(|&(c, _)| c == concept) {
                    group.forms.push((concept, form));
                }
            }
            _ => {
                if !seen.insert(token) {
                    return Err(Error::DataIntegrity {
                        variety: wordlist.variety.gid(),
                        token: token.to_string(),
                    });
                }
                groups.push(TokenGroup {
                    token,
                    forms: vec![(concept, form)],
                });
            }
        }
    }

    Ok(groups)
}

/// Token groups of one variety, ready to be merged into a graph.
#[derive(Debug, Clone)]
pub struct LanguageColexifications<'a> {
    pub variety: &'a Variety,
    pub groups: Vec<TokenGroup<'a>>,
}

impl LanguageColexifications<'_> {
    pub fn occurrence_count(&self) -> usize {
        self.groups
            .iter()
            .map(|g| g.forms.len() * (g.forms.len() - 1) / 2)
            .sum()
    }

    fn merge_into(&self, graph: &mut ColexGraph) {
        for group in &self.groups {
            for &(concept, form) in &group.forms {
                graph.add_expression(concept, form, group.token, self.variety);
            }
            for (a, b) in group.pairs() {
                graph.add_occurrence(a, b, group.token, self.variety);
            }
        }
    }
}

/// Scan one word list.
pub fn colexify<'a>(
    wordlist: &'a Wordlist,
    filter: &BuildFilter,
) -> Result<LanguageColexifications<'a>> {
    Ok(LanguageColexifications {
        variety: &wordlist.variety,
        groups: token_groups_filtered(wordlist, filter)?,
    })
}

/// Build the colexification graph of all word lists.
pub fn build(wordlists: &[Wordlist]) -> Result<ColexGraph> {
    build_filtered(wordlists, &BuildFilter::default())
}

/// Build the graph of the varieties and concepts `filter` accepts.
pub fn build_filtered(wordlists: &[Wordlist], filter: &BuildFilter) -> Result<ColexGraph> {
    let languages: Vec<LanguageColexifications<'_>> = wordlists
        .par_iter()
        .filter(|list| filter.accepts_variety(&list.variety))
        .map(|list| colexify(list, filter))
        .collect::<Result<_>>()?;

    let mut graph = ColexGraph::new();
    for language in &languages {
        debug!(
            variety = %language.variety.gid(),
            occurrences = language.occurrence_count(),
            "merging colexifications"
        );
        language.merge_into(&mut graph);
    }
    graph.summarize();

    info!(
        languages = languages.len(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "built colexification graph"
    );
    Ok(graph)
}
