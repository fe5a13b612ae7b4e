// Summary comparison
// Runs several summarization models over one text and scores each result against it


mod rouge;

pub use rouge::{rouge_l, tokenize, RougeScore};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::SummarizeConfig;
use crate::{Result, ScoutError};

/// Target summary length in words
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SummaryBounds {
    pub min_words: u32,
    pub max_words: u32,
}

impl Default for SummaryBounds {
    #[inline]
    fn default() -> Self {
        Self {
            min_words: 30,
            max_words: 100,
        }
    }
}

impl From<&SummarizeConfig> for SummaryBounds {
    #[inline]
    fn from(config: &SummarizeConfig) -> Self {
        Self {
            min_words: config.min_words,
            max_words: config.max_words,
        }
    }
}

/// A model that condenses text
pub trait Summarizer: Send + Sync {
    /// Label shown next to the summary
    fn name(&self) -> &str;

    fn summarize(&self, text: &str, bounds: SummaryBounds) -> anyhow::Result<String>;
}

/// A summary and how it relates to the input
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredSummary {
    pub summary: String,
    pub word_count: usize,
    pub rouge_l: f64,
}

/// One model's result; a failed model keeps its error message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryComparison {
    pub model: String,
    pub outcome: std::result::Result<ScoredSummary, String>,
}

impl SummaryComparison {
    #[inline]
    pub fn scored(&self) -> Option<&ScoredSummary> {
        self.outcome.as_ref().ok()
    }
}

/// Whitespace-separated word count
#[inline]
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Summarize `text` with every model, in order
///
/// Blank input is rejected before any model runs. A failing model is recorded in its own
/// comparison and the remaining models still run.
#[inline]
pub fn compare_summaries(
    text: &str,
    summarizers: &[&dyn Summarizer],
    bounds: SummaryBounds,
) -> Result<Vec<SummaryComparison>> {
    if text.trim().is_empty() {
        return Err(ScoutError::Summarization(
            "Input text is empty".to_string(),
        ));
    }
    if summarizers.is_empty() {
        return Err(ScoutError::Summarization(
            "No summarization models configured".to_string(),
        ));
    }

    info!(
        "Summarizing {} words with {} models",
        word_count(text),
        summarizers.len()
    );

    Ok(summarizers
        .iter()
        .map(|summarizer| {
            let outcome = match summarizer.summarize(text, bounds) {
                Ok(summary) => {
                    let score = rouge_l(text, &summary);
                    debug!(
                        "{} produced {} words, ROUGE-L {:.3}",
                        summarizer.name(),
                        word_count(&summary),
                        score.fmeasure
                    );
                    Ok(ScoredSummary {
                        word_count: word_count(&summary),
                        rouge_l: score.fmeasure,
                        summary,
                    })
                }
                Err(e) => {
                    warn!("Summarization with {} failed: {:#}", summarizer.name(), e);
                    Err(format!("{:#}", e))
                }
            };

            SummaryComparison {
                model: summarizer.name().to_string(),
                outcome,
            }
        })
        .collect())
}
