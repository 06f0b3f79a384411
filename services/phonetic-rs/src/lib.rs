//! Segment-level phonetic distances for colexification analysis.
//!
//! Tokens are compared as sequences of segments: whitespace-separated
//! segments when the token is already segmented (`"k a n"`), otherwise
//! extended grapheme clusters. Distances are normalized to `[0, 1]`.

use ndarray::Array2;
use rayon::prelude::*;
use unicode_segmentation::UnicodeSegmentation;

/// Split a token into comparable segments.
pub fn segments(token: &str) -> Vec<&str> {
    if token.chars().any(char::is_whitespace) {
        token.split_whitespace().collect()
    } else {
        token.graphemes(true).collect()
    }
}

/// Compute the normalized comparison form of a raw orthographic form.
///
/// The form is transliterated to ASCII, then everything outside ASCII
/// letters, digits and `@` is dropped and the rest lowercased. Returns
/// `None` when nothing survives.
pub fn clics_form(word: &str) -> Option<String> {
    let form: String = deunicode::deunicode(word)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '@')
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if form.is_empty() {
        None
    } else {
        Some(form)
    }
}

/// Segment edit distance, single-row dynamic program.
pub fn levenshtein(a: &[&str], b: &[&str]) -> usize {
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for (i, x) in a.iter().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, y) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if x == y {
                diagonal
            } else {
                1 + diagonal.min(above).min(row[j])
            };
            diagonal = above;
        }
    }
    row[b.len()]
}

/// Normalized edit distance between two segment sequences.
///
/// Symmetric, `0.0` for identical sequences, `1.0` when nothing aligns.
/// Two empty sequences are identical.
pub fn phonetic_distance(a: &[&str], b: &[&str]) -> f64 {
    let max_len = a.len().max(b.len());
    if max_len == 0 {
        0.0
    } else {
        levenshtein(a, b) as f64 / max_len as f64
    }
}

/// Distance between two unsegmented tokens.
pub fn token_distance(a: &str, b: &str) -> f64 {
    phonetic_distance(&segments(a), &segments(b))
}

/// Batch compute token distances for many pairs (parallelized).
pub fn batch_distance(pairs: &[(String, String)]) -> Vec<f64> {
    pairs
        .par_iter()
        .map(|(a, b)| token_distance(a, b))
        .collect()
}

/// Symmetric pairwise matrix of `distance` over segmented tokens, with a
/// zero diagonal. The first error aborts the whole matrix.
pub fn distance_matrix_with<E, F>(tokens: &[Vec<&str>], distance: F) -> Result<Array2<f64>, E>
where
    E: Send,
    F: Fn(&[&str], &[&str]) -> Result<f64, E> + Sync,
{
    let n = tokens.len();
    let pairs: Vec<(usize, usize)> = (0..n)
        .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
        .collect();

    let distances: Vec<f64> = pairs
        .par_iter()
        .map(|&(i, j)| distance(&tokens[i], &tokens[j]))
        .collect::<Result<_, E>>()?;

    let mut matrix = Array2::<f64>::zeros((n, n));
    for (&(i, j), d) in pairs.iter().zip(distances) {
        matrix[[i, j]] = d;
        matrix[[j, i]] = d;
    }
    Ok(matrix)
}

#[cfg(feature = "python")]
mod python {
    use pyo3::prelude::*;

    #[pyfunction]
    fn clics_form(word: &str) -> PyResult<Option<String>> {
        Ok(super::clics_form(word))
    }

    #[pyfunction]
    fn phonetic_distance(a: &str, b: &str) -> PyResult<f64> {
        Ok(super::token_distance(a, b))
    }

    #[pyfunction]
    fn batch_phonetic_distance(pairs: Vec<(String, String)>) -> PyResult<Vec<f64>> {
        Ok(super::batch_distance(&pairs))
    }

    #[pymodule]
    fn clics_phonetic(_py: Python, m: &PyModule) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(clics_form, m)?)?;
        m.add_function(wrap_pyfunction!(phonetic_distance, m)?)?;
        m.add_function(wrap_pyfunction!(batch_phonetic_distance, m)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments() {
        assert_eq!(segments("k a n"), vec!["k", "a", "n"]);
        assert_eq!(segments("kan"), vec!["k", "a", "n"]);
        assert_eq!(segments("tʃ a"), vec!["tʃ", "a"]);
    }

    #[test]
    fn test_identical_tokens() {
        assert_eq!(token_distance("pater", "pater"), 0.0);
    }

    #[test]
    fn test_phonetic_distance() {
        let dist = token_distance("pater", "pitar");
        assert!(dist > 0.0 && dist < 0.5);
        assert_eq!(dist, token_distance("pitar", "pater"));
    }

    #[test]
    fn test_disjoint_tokens() {
        assert_eq!(token_distance("abc", "xyz"), 1.0);
    }

    #[test]
    fn test_clics_form() {
        assert_eq!(clics_form("Hánd-1").as_deref(), Some("hand1"));
        assert_eq!(clics_form("--"), None);
        assert_eq!(clics_form(""), None);
    }

    #[test]
    fn test_clics_form_transliterates() {
        assert_eq!(clics_form("рука").as_deref(), Some("ruka"));
        assert_eq!(clics_form("æ").as_deref(), Some("ae"));
        assert_eq!(clics_form("ø").as_deref(), Some("o"));
        assert_eq!(clics_form("straße").as_deref(), Some("strasse"));
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein(&segments("kitten"), &segments("sitting")), 3);
        assert_eq!(levenshtein(&[], &segments("abc")), 3);
        assert_eq!(levenshtein(&segments("k a n"), &segments("k a n")), 0);
    }

    #[test]
    fn test_distance_matrix() {
        let tokens: Vec<Vec<&str>> = ["pater", "pitar", "mater"].iter().map(|t| segments(t)).collect();
        let matrix = distance_matrix_with(&tokens, |a, b| Ok::<_, ()>(phonetic_distance(a, b))).unwrap();
        assert_eq!(matrix.shape(), &[3, 3]);
        assert_eq!(matrix[[0, 0]], 0.0);
        assert_eq!(matrix[[0, 1]], matrix[[1, 0]]);
        assert_eq!(matrix[[0, 2]], 0.2);
    }

    #[test]
    fn test_distance_matrix_stops_on_error() {
        let tokens: Vec<Vec<&str>> = vec![vec!["a"], vec![], vec!["b"]];
        let result = distance_matrix_with(&tokens, |a, b| {
            if a.is_empty() || b.is_empty() {
                Err("empty")
            } else {
                Ok(phonetic_distance(a, b))
            }
        });
        assert_eq!(result, Err("empty"));
    }
}
