// ROUGE-L scoring over lowercase, stemmed alphanumeric tokens

use rust_stemmers::{Algorithm, Stemmer};
use serde::Serialize;

/// Tokens this short are compared as written
const MIN_STEM_LENGTH: usize = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RougeScore {
    pub precision: f64,
    pub recall: f64,
    pub fmeasure: f64,
}

/// Lowercase, split on anything that is not a letter or digit, and stem English suffixes
#[inline]
pub fn tokenize(text: &str) -> Vec<String> {
    let stemmer = Stemmer::create(Algorithm::English);
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(|token| {
            if token.chars().count() >= MIN_STEM_LENGTH {
                stemmer.stem(token).into_owned()
            } else {
                token.to_string()
            }
        })
        .collect()
}

/// Longest common subsequence overlap between a reference and a candidate
#[inline]
pub fn rouge_l(reference: &str, candidate: &str) -> RougeScore {
    let reference = tokenize(reference);
    let candidate = tokenize(candidate);
    if reference.is_empty() || candidate.is_empty() {
        return RougeScore::default();
    }

    let lcs = lcs_length(&reference, &candidate) as f64;
    let precision = lcs / candidate.len() as f64;
    let recall = lcs / reference.len() as f64;
    let fmeasure = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    RougeScore {
        precision,
        recall,
        fmeasure,
    }
}

fn lcs_length(a: &[String], b: &[String]) -> usize {
    // Two rolling rows of the DP table
    let mut previous = vec![0usize; b.len() + 1];
    let mut current = vec![0usize; b.len() + 1];

    for token in a {
        for (j, other) in b.iter().enumerate() {
            current[j + 1] = if token == other {
                previous[j] + 1
            } else {
                current[j].max(previous[j + 1])
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}
