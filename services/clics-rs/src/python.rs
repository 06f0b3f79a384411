use numpy::{IntoPyArray, PyArray2};
use pyo3::exceptions::{PyKeyError, PyValueError};
use pyo3::prelude::*;
use std::collections::HashMap;

use crate::cognacy::CognacyWeighter;
use crate::colexify::build;
use crate::community::{Options, Registry};
use crate::diffusion::transition_matrix;
use crate::error::Error;
use crate::graph::{ColexGraph, GraphStats};
use crate::types::{EdgeFilter, EdgeWeight, Variety, WordForm, Wordlist};

impl From<Error> for PyErr {
    fn from(err: Error) -> Self {
        match err {
            Error::UnknownAlgorithm(_) | Error::UnknownAttribute(_) => {
                PyKeyError::new_err(err.to_string())
            }
            _ => PyValueError::new_err(err.to_string()),
        }
    }
}

// ============================================================================
// GRAPH
// ============================================================================

/// `(variety, family, form_id, token, concept)`
type Record = (String, Option<String>, String, String, String);

fn wordlists(records: Vec<Record>) -> Vec<Wordlist> {
    let mut lists: Vec<Wordlist> = Vec::new();
    let mut slot: HashMap<String, usize> = HashMap::new();
    for (variety, family, form_id, token, concept) in records {
        let idx = *slot.entry(variety.clone()).or_insert_with(|| {
            let mut v = Variety::new(variety.clone(), "py");
            v.family = family;
            lists.push(Wordlist::new(v, Vec::new()));
            lists.len() - 1
        });
        lists[idx].forms.push(WordForm::new(form_id, token, concept));
    }
    for list in &mut lists {
        list.sort_by_token();
    }
    lists
}

#[pyclass(name = "ColexGraph")]
struct PyColexGraph {
    inner: ColexGraph,
}

#[pymethods]
impl PyColexGraph {
    #[staticmethod]
    fn from_records(records: Vec<Record>) -> PyResult<Self> {
        Ok(Self {
            inner: build(&wordlists(records))?,
        })
    }

    #[staticmethod]
    fn from_json(json: &str) -> PyResult<Self> {
        Ok(Self {
            inner: ColexGraph::from_json(json)?,
        })
    }

    fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    fn prune(&mut self, edgefilter: &str, threshold: usize) -> PyResult<usize> {
        let filter: EdgeFilter = edgefilter.parse()?;
        Ok(self.inner.prune(filter, threshold))
    }

    fn weight_by_cognacy(&mut self, threshold: f64) -> PyResult<()> {
        let graph = std::mem::take(&mut self.inner);
        self.inner = CognacyWeighter::new(threshold).weight(graph)?;
        Ok(())
    }

    fn cluster(&self, algorithm: &str, options: Option<HashMap<String, String>>) -> PyResult<Vec<Vec<String>>> {
        let options: Options = options.unwrap_or_default().into_iter().collect();
        Ok(Registry::new()
            .cluster(&self.inner, algorithm, &options)?
            .map(|c| c.into_iter().collect())
            .collect())
    }

    fn transition_matrix<'py>(
        &self,
        py: Python<'py>,
        weight: &str,
        steps: usize,
        normalize: bool,
    ) -> PyResult<(&'py PyArray2<f64>, Vec<String>)> {
        let weight: EdgeWeight = weight.parse()?;
        let t = transition_matrix(&self.inner, weight, steps, normalize)?;
        Ok((t.matrix.into_pyarray(py), t.nodes))
    }

    fn stats(&self, algorithm: Option<&str>) -> PyGraphStats {
        PyGraphStats::from(self.inner.stats(algorithm))
    }

    fn to_json(&self) -> PyResult<String> {
        Ok(self.inner.to_json()?)
    }
}

// ============================================================================
// PYTHON WRAPPER TYPES
// ============================================================================

#[pyclass(name = "GraphStats")]
struct PyGraphStats {
    #[pyo3(get)]
    num_nodes: usize,
    #[pyo3(get)]
    num_edges: usize,
    #[pyo3(get)]
    avg_degree: f64,
    #[pyo3(get)]
    density: f64,
    #[pyo3(get)]
    num_components: usize,
    #[pyo3(get)]
    num_communities: Option<usize>,
}

impl From<GraphStats> for PyGraphStats {
    fn from(stats: GraphStats) -> Self {
        Self {
            num_nodes: stats.num_nodes,
            num_edges: stats.num_edges,
            avg_degree: stats.avg_degree,
            density: stats.density,
            num_components: stats.num_components,
            num_communities: stats.num_communities,
        }
    }
}

#[pyfunction]
fn cluster_algorithms() -> Vec<(&'static str, &'static str)> {
    Registry::new()
        .algorithms()
        .map(|a| (a.name, a.description))
        .collect()
}

// ============================================================================
// MODULE DEFINITION
// ============================================================================

#[pymodule]
fn clics_core(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(cluster_algorithms, m)?)?;
    m.add_class::<PyColexGraph>()?;
    m.add_class::<PyGraphStats>()?;
    Ok(())
}
