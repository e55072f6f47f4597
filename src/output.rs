//! Result types returned by a successful pipeline run.

use crate::pipeline::cards::CardList;
use serde::Serialize;
use std::path::PathBuf;

/// A packaged deck plus what it took to produce it.
#[derive(Debug, Clone, Serialize)]
pub struct DeckOutput {
    /// Location of the written `.apkg`.
    pub package_path: PathBuf,
    pub deck_name: String,
    pub deck_id: i64,
    /// The validated cards that went into the package, in order.
    pub cards: CardList,
    pub stats: PipelineStats,
}

impl DeckOutput {
    pub fn card_count(&self) -> usize {
        self.cards.len()
    }
}

/// Sizes and per-stage timings of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    /// Characters of raw extracted text.
    pub raw_chars: usize,
    /// Characters after normalisation.
    pub cleaned_chars: usize,
    pub extract_duration_ms: u64,
    pub normalize_duration_ms: u64,
    pub generate_duration_ms: u64,
    pub package_duration_ms: u64,
    pub total_duration_ms: u64,
}

impl PipelineStats {
    /// Share of the raw text removed by normalisation, 0.0–1.0.
    pub fn noise_ratio(&self) -> f64 {
        if self.raw_chars == 0 {
            return 0.0;
        }
        1.0 - self.cleaned_chars as f64 / self.raw_chars as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noise_ratio_handles_empty_input() {
        assert_eq!(PipelineStats::default().noise_ratio(), 0.0);
        let stats = PipelineStats {
            raw_chars: 200,
            cleaned_chars: 150,
            ..Default::default()
        };
        assert!((stats.noise_ratio() - 0.25).abs() < f64::EPSILON);
    }
}
