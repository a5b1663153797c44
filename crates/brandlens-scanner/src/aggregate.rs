//! Weighted aggregation of scan results into one overall score.

use brandlens_backends::{Backend, BackendWeights};
use brandlens_db::ScanResultRow;

/// Weighted mean of visibility scores over all result rows, rounded to the
/// nearest integer. Fallback rows contribute their zero at full weight.
///
/// The reduction is commutative and associative over the row set, so row
/// order never changes the outcome. An empty set scores 0, not NaN. A row
/// whose backend tag is unknown contributes at weight 1.0.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn overall_score(results: &[ScanResultRow], weights: &BackendWeights) -> f32 {
    let mut total_weight = 0.0_f64;
    let mut weighted_sum = 0.0_f64;

    for result in results {
        let weight = result
            .backend
            .parse::<Backend>()
            .map_or(1.0, |b| weights.weight_for(b));
        weighted_sum += f64::from(result.visibility_score) * weight;
        total_weight += weight;
    }

    if total_weight > 0.0 {
        (weighted_sum / total_weight).round() as f32
    } else {
        0.0
    }
}
