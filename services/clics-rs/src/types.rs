//! Shared data structures for the colexification kernel.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A set of concept ids produced by one clustering pass.
pub type Community = BTreeSet<String>;

/// Language or dialect sample of the underlying lexical data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Variety {
    pub id: String,
    pub source: String,
    pub name: String,
    pub glottocode: Option<String>,
    pub family: Option<String>,
    pub macroarea: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Variety {
    pub fn new(id: impl Into<String>, source: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            source: source.into(),
            ..Self::default()
        }
    }

    pub fn with_glottocode(mut self, glottocode: impl Into<String>) -> Self {
        self.glottocode = Some(glottocode.into());
        self
    }

    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.family = Some(family.into());
        self
    }

    /// Dataset-qualified identifier.
    pub fn gid(&self) -> String {
        format!("{}-{}", self.source, self.id)
    }

    /// Key used for distinct-language counts. Varieties without a
    /// glottocode count as languages of their own.
    pub fn language_key(&self) -> String {
        self.glottocode.clone().unwrap_or_else(|| self.gid())
    }

    /// Family name, empty when unknown.
    pub fn family_key(&self) -> String {
        self.family.clone().unwrap_or_default()
    }
}

/// A single lexical entry of a variety.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WordForm {
    pub id: String,
    pub source: String,
    /// Raw orthographic form.
    pub form: String,
    /// Normalized comparison token.
    pub token: Option<String>,
    pub concept_id: Option<String>,
    pub gloss: Option<String>,
}

impl WordForm {
    pub fn new(
        id: impl Into<String>,
        token: impl Into<String>,
        concept_id: impl Into<String>,
    ) -> Self {
        let token = token.into();
        Self {
            id: id.into(),
            form: token.clone(),
            token: Some(token),
            concept_id: Some(concept_id.into()),
            ..Self::default()
        }
    }

    pub fn with_gloss(mut self, gloss: impl Into<String>) -> Self {
        self.gloss = Some(gloss.into());
        self
    }

    pub fn gid(&self) -> String {
        format!("{}-{}", self.source, self.id)
    }
}

/// All forms of one variety.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Wordlist {
    pub variety: Variety,
    pub forms: Vec<WordForm>,
}

impl Wordlist {
    pub fn new(variety: Variety, forms: Vec<WordForm>) -> Self {
        Self { variety, forms }
    }

    /// Stable sort by token so the builder can group forms in one pass.
    pub fn sort_by_token(&mut self) {
        self.forms.sort_by(|a, b| a.token.cmp(&b.token));
    }
}

/// Derived counts of a concept node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSummary {
    pub variety_count: usize,
    pub language_count: usize,
    pub family_count: usize,
    pub word_count: usize,
}

/// Concept node with per-occurrence provenance. All lists share indices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConceptNode {
    pub id: String,
    pub gloss: Option<String>,
    pub occurrences: Vec<String>,
    pub words: Vec<String>,
    pub varieties: Vec<String>,
    pub languages: Vec<String>,
    pub families: Vec<String>,
    pub summary: NodeSummary,
    /// Cluster annotations keyed by attribute name.
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

impl ConceptNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Display label, falling back to the id.
    pub fn label(&self) -> &str {
        self.gloss.as_deref().unwrap_or(&self.id)
    }

    pub(crate) fn push(&mut self, form: &WordForm, token: &str, variety: &Variety) {
        if self.gloss.is_none() {
            self.gloss.clone_from(&form.gloss);
        }
        self.occurrences.push(form.gid());
        self.words.push(token.to_string());
        self.varieties.push(variety.gid());
        self.languages.push(variety.language_key());
        self.families.push(variety.family_key());
    }

    pub(crate) fn summarize(&mut self) {
        self.summary = NodeSummary {
            variety_count: distinct(&self.varieties),
            language_count: distinct(&self.languages),
            family_count: distinct_nonempty(&self.families),
            word_count: distinct(&self.occurrences),
        };
    }

    pub fn weight(&self, attr: NodeWeight) -> f64 {
        let value = match attr {
            NodeWeight::Families => self.summary.family_count,
            NodeWeight::Languages => self.summary.language_count,
            NodeWeight::Words => self.summary.word_count,
            NodeWeight::Varieties => self.summary.variety_count,
        };
        value as f64
    }
}

/// Derived counts of a colexification edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeSummary {
    pub variety_count: usize,
    pub language_count: usize,
    pub family_count: usize,
    pub word_count: usize,
}

/// Colexification edge with per-occurrence provenance. All lists share
/// indices and have length `count`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColexEdge {
    pub count: usize,
    /// Backing token of each occurrence.
    pub words: Vec<String>,
    /// Form ids of the two colexified entries.
    pub form_pairs: Vec<(String, String)>,
    pub varieties: Vec<String>,
    pub languages: Vec<String>,
    pub families: Vec<String>,
    pub summary: EdgeSummary,
    pub cognate_count: Option<usize>,
}

impl ColexEdge {
    pub(crate) fn push(&mut self, token: &str, pair: (String, String), variety: &Variety) {
        self.count += 1;
        self.words.push(token.to_string());
        self.form_pairs.push(pair);
        self.varieties.push(variety.gid());
        self.languages.push(variety.language_key());
        self.families.push(variety.family_key());
    }

    pub(crate) fn summarize(&mut self) {
        let pairs: HashSet<&(String, String)> = self.form_pairs.iter().collect();
        self.summary = EdgeSummary {
            variety_count: distinct(&self.varieties),
            language_count: distinct(&self.languages),
            family_count: distinct_nonempty(&self.families),
            word_count: pairs.len(),
        };
    }

    pub fn weight(&self, attr: EdgeWeight) -> f64 {
        let value = match attr {
            EdgeWeight::Count => self.count,
            EdgeWeight::Words => self.summary.word_count,
            EdgeWeight::Languages => self.summary.language_count,
            EdgeWeight::Families => self.summary.family_count,
            EdgeWeight::Varieties => self.summary.variety_count,
            EdgeWeight::CognateCount => self.cognate_count.unwrap_or(1),
        };
        value as f64
    }
}

fn distinct(values: &[String]) -> usize {
    values.iter().collect::<HashSet<_>>().len()
}

fn distinct_nonempty(values: &[String]) -> usize {
    values
        .iter()
        .filter(|v| !v.is_empty())
        .collect::<HashSet<_>>()
        .len()
}

/// Count used to prune edges after construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeFilter {
    #[default]
    Families,
    Languages,
    Words,
}

impl EdgeFilter {
    pub fn weight(self) -> EdgeWeight {
        match self {
            EdgeFilter::Families => EdgeWeight::Families,
            EdgeFilter::Languages => EdgeWeight::Languages,
            EdgeFilter::Words => EdgeWeight::Words,
        }
    }
}

impl fmt::Display for EdgeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EdgeFilter::Families => "families",
            EdgeFilter::Languages => "languages",
            EdgeFilter::Words => "words",
        };
        f.write_str(name)
    }
}

impl FromStr for EdgeFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "families" => Ok(EdgeFilter::Families),
            "languages" => Ok(EdgeFilter::Languages),
            "words" => Ok(EdgeFilter::Words),
            other => Err(Error::UnknownAttribute(other.to_string())),
        }
    }
}

/// Numeric edge attribute usable as a weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeWeight {
    #[serde(rename = "count")]
    Count,
    #[serde(rename = "WordWeight")]
    Words,
    #[serde(rename = "LanguageWeight")]
    Languages,
    #[serde(rename = "FamilyWeight")]
    Families,
    #[serde(rename = "VarietyWeight")]
    Varieties,
    #[serde(rename = "cognate_count")]
    CognateCount,
}

impl FromStr for EdgeWeight {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "count" | "weight" => Ok(EdgeWeight::Count),
            "WordWeight" => Ok(EdgeWeight::Words),
            "LanguageWeight" => Ok(EdgeWeight::Languages),
            "FamilyWeight" => Ok(EdgeWeight::Families),
            "VarietyWeight" => Ok(EdgeWeight::Varieties),
            "cognate_count" => Ok(EdgeWeight::CognateCount),
            other => Err(Error::UnknownAttribute(other.to_string())),
        }
    }
}

/// Numeric node attribute usable as a vertex weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeWeight {
    #[serde(rename = "FamilyFrequency")]
    Families,
    #[serde(rename = "LanguageFrequency")]
    Languages,
    #[serde(rename = "WordFrequency")]
    Words,
    #[serde(rename = "VarietyFrequency")]
    Varieties,
}

impl FromStr for NodeWeight {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FamilyFrequency" => Ok(NodeWeight::Families),
            "LanguageFrequency" => Ok(NodeWeight::Languages),
            "WordFrequency" => Ok(NodeWeight::Words),
            "VarietyFrequency" => Ok(NodeWeight::Varieties),
            other => Err(Error::UnknownAttribute(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variety_keys() {
        let v = Variety::new("l1", "ds").with_family("Indo-European");
        assert_eq!(v.gid(), "ds-l1");
        assert_eq!(v.language_key(), "ds-l1");
        assert_eq!(v.family_key(), "Indo-European");

        let v = v.with_glottocode("stan1293");
        assert_eq!(v.language_key(), "stan1293");
    }

    #[test]
    fn test_missing_family_not_counted() {
        let mut edge = ColexEdge::default();
        let v = Variety::new("l1", "ds");
        edge.push("kan", ("a".into(), "b".into()), &v);
        edge.summarize();
        assert_eq!(edge.summary.family_count, 0);
        assert_eq!(edge.summary.language_count, 1);
    }

    #[test]
    fn test_weight_names() {
        assert_eq!("FamilyWeight".parse::<EdgeWeight>().unwrap(), EdgeWeight::Families);
        assert_eq!(
            "FamilyFrequency".parse::<NodeWeight>().unwrap(),
            NodeWeight::Families
        );
        assert!("bogus".parse::<EdgeWeight>().is_err());
        assert_eq!("words".parse::<EdgeFilter>().unwrap().to_string(), "words");
    }
}
