use std::fs;
use std::path::Path;

use dropshop_core::domain::candidate::CandidateProduct;
use dropshop_core::intelligence::ProductAnalyzer;

use crate::commands::{load_config, CommandResult, EXIT_INPUT};

/// Scores a JSON array of candidates with the configured criteria. Nothing is
/// written to the database.
pub fn run(file: &Path) -> CommandResult {
    let config = match load_config("analyze") {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let candidates = match read_candidates(file) {
        Ok(candidates) => candidates,
        Err(message) => return CommandResult::failure("analyze", "input", message, EXIT_INPUT),
    };

    let analyzer = ProductAnalyzer::new(config.scoring);
    let batch = analyzer.analyze_batch(&candidates);
    let message = format!(
        "analyzed {} candidates: {} approved, {} rejected, {} filtered, {} invalid",
        batch.stats.total_analyzed,
        batch.stats.approved,
        batch.stats.rejected,
        batch.filtered,
        batch.invalid.len()
    );
    CommandResult::success_with_data("analyze", message, &batch)
}

fn read_candidates(file: &Path) -> Result<Vec<CandidateProduct>, String> {
    let raw = fs::read_to_string(file)
        .map_err(|error| format!("failed to read `{}`: {error}", file.display()))?;
    serde_json::from_str(&raw)
        .map_err(|error| format!("`{}` is not a JSON array of candidates: {error}", file.display()))
}
