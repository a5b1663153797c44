//! Scan orchestration for BrandLens.
//!
//! [`run_scan`] drives one scan through its lifecycle: mark it running, load
//! its brand and query set, fan the (query × backend) matrix out
//! concurrently, classify every response, persist exactly one result row per
//! cell (failures included, as zero-score fallbacks), then aggregate the
//! weighted overall score and mark the scan completed.
//!
//! Every cell is independent: a backend failure is absorbed into that cell's
//! fallback row and never aborts a sibling. Aggregation runs only after all
//! cells have settled.

mod aggregate;

use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde_json::Value;
use sqlx::PgPool;
use thiserror::Error;

use brandlens_backends::{Backend, BackendClient, BackendError, BackendWeights};
use brandlens_classifier::{classify_with_weights, ScoreWeights, Signals};
use brandlens_db::{BrandRow, DbError, NewScanResult, QueryRow, ScanRow};

pub use aggregate::overall_score;

/// Tuning knobs for one orchestrator instance, captured at construction so
/// tests can substitute alternate weights, limits and retry policies.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// In-flight ceiling for concurrent backend calls.
    pub max_concurrent_probes: usize,
    /// Stored response text is truncated to this many characters.
    pub response_text_max_chars: usize,
    /// Per-backend aggregation weights.
    pub weights: BackendWeights,
    /// Classifier scoring constants.
    pub score_weights: ScoreWeights,
    /// Attempts for the terminal completion write before escalating.
    pub complete_retry_attempts: u32,
    pub complete_retry_backoff_ms: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_concurrent_probes: 8,
            response_text_max_chars: 2000,
            weights: BackendWeights::default(),
            score_weights: ScoreWeights::default(),
            complete_retry_attempts: 3,
            complete_retry_backoff_ms: 500,
        }
    }
}

impl ScanConfig {
    #[must_use]
    pub fn from_app_config(config: &brandlens_core::AppConfig) -> Self {
        Self {
            max_concurrent_probes: config.scan_max_concurrent_probes,
            ..Self::default()
        }
    }
}

/// Errors that abort a whole scan run, as opposed to per-cell faults.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Db(#[from] DbError),
}

/// Runs the scan with the given internal id to a terminal state.
///
/// Expects the scan to exist in `pending` status; communicates its outcome
/// entirely through the persisted scan/result rows, so the caller may be a
/// spawned task, a queue worker or a CLI invocation.
///
/// # Errors
///
/// Returns [`ScanError`] when the scan cannot be started (missing or not
/// `pending`), when its context cannot be loaded (the scan is marked
/// `failed` first), or when the terminal completion write keeps failing
/// after the configured retries.
pub async fn run_scan(
    pool: &PgPool,
    client: &BackendClient,
    config: &ScanConfig,
    scan_id: i64,
) -> Result<(), ScanError> {
    brandlens_db::start_scan(pool, scan_id).await?;

    let ctx = match brandlens_db::get_scan_context(pool, scan_id).await {
        Ok(ctx) => ctx,
        Err(e) => {
            tracing::error!(scan_id, error = %e, "failed to load scan context; marking scan failed");
            fail_scan_best_effort(pool, scan_id).await;
            return Err(e.into());
        }
    };

    let cells: Vec<(QueryRow, Backend)> = ctx
        .queries
        .iter()
        .flat_map(|query| Backend::ALL.iter().map(move |backend| (query.clone(), *backend)))
        .collect();

    tracing::info!(
        scan_id,
        brand = %ctx.brand.name,
        queries = ctx.queries.len(),
        cells = cells.len(),
        "starting scan work phase"
    );

    let max_concurrent = config.max_concurrent_probes.max(1);
    let scan = &ctx.scan;
    let brand = &ctx.brand;
    let outcomes: Vec<bool> = stream::iter(cells)
        .map(|(query, backend)| async move {
            run_single_probe(pool, client, config, scan, brand, &query, backend).await
        })
        .buffer_unordered(max_concurrent)
        .collect()
        .await;

    let failed_inserts = outcomes.iter().filter(|inserted| !**inserted).count();
    if failed_inserts > 0 {
        tracing::warn!(
            scan_id,
            failed_inserts,
            total_cells = outcomes.len(),
            "some result rows could not be persisted"
        );
    }

    let results = brandlens_db::list_results_by_scan(pool, scan_id).await?;
    let score = aggregate::overall_score(&results, &config.weights);

    complete_scan_with_retry(pool, scan_id, score, config).await?;

    tracing::info!(scan_id, overall_score = score, results = results.len(), "scan completed");
    Ok(())
}

/// Runs one (query, backend) cell: backend call, classification, one row
/// insert. All faults stay inside this function; the return value only says
/// whether the row made it into the database.
async fn run_single_probe(
    pool: &PgPool,
    client: &BackendClient,
    config: &ScanConfig,
    scan: &ScanRow,
    brand: &BrandRow,
    query: &QueryRow,
    backend: Backend,
) -> bool {
    let new_result = match client.query(backend, &query.prompt_text).await {
        Ok(response) => {
            let native_citations =
                (!response.citations.is_empty()).then_some(response.citations.as_slice());
            let signals = classify_with_weights(
                &response.text,
                &brand.name,
                brand.domain.as_deref(),
                native_citations,
                &config.score_weights,
            );
            build_result(
                scan.id,
                query.id,
                backend,
                truncate_chars(&response.text, config.response_text_max_chars),
                &signals,
            )
        }
        Err(e) => {
            tracing::warn!(
                scan_id = scan.id,
                query_id = query.id,
                backend = %backend,
                error = %e,
                "backend call failed; recording fallback result"
            );
            fallback_result(scan.id, query.id, backend, &e)
        }
    };

    match brandlens_db::insert_scan_result(pool, &new_result).await {
        Ok(_) => true,
        Err(e) => {
            tracing::error!(
                scan_id = scan.id,
                query_id = query.id,
                backend = %backend,
                error = %e,
                "failed to insert scan result"
            );
            false
        }
    }
}

fn build_result(
    scan_id: i64,
    query_id: i64,
    backend: Backend,
    response_text: String,
    signals: &Signals,
) -> NewScanResult {
    NewScanResult {
        scan_id,
        query_id,
        backend: backend.as_str().to_owned(),
        response_text,
        brand_mentioned: signals.brand_mentioned,
        domain_mentioned: signals.domain_mentioned,
        mention_count: i32::try_from(signals.mention_count).unwrap_or(i32::MAX),
        mention_positions: to_json_array(&signals.mention_positions),
        citations: to_json_array(&signals.citations),
        sentiment: signals.sentiment.as_str().to_owned(),
        visibility_score: i32::from(signals.visibility_score),
        rank_position: signals
            .rank_position
            .and_then(|rank| i32::try_from(rank).ok()),
    }
}

/// The zero-score row recorded when a backend call fails, so aggregation
/// never has to special-case missing cells.
fn fallback_result(
    scan_id: i64,
    query_id: i64,
    backend: Backend,
    error: &BackendError,
) -> NewScanResult {
    let signals = Signals::not_mentioned();
    let mut result = build_result(
        scan_id,
        query_id,
        backend,
        format!("Error: {error}"),
        &signals,
    );
    result.response_text = truncate_chars(&result.response_text, 2000);
    result
}

fn to_json_array<T: serde::Serialize>(items: &[T]) -> Value {
    serde_json::to_value(items).unwrap_or_else(|_| Value::Array(Vec::new()))
}

/// Character-safe truncation with an ellipsis marker, mirroring what the
/// read boundary shows for long responses.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_owned();
    }
    let mut truncated: String = text.chars().take(max_chars).collect();
    truncated.push('…');
    truncated
}

/// Retry the terminal completion write. All adapter work has already been
/// paid for at this point; losing it to one flaky write would waste the
/// whole scan, so this keeps trying before escalating to the caller.
async fn complete_scan_with_retry(
    pool: &PgPool,
    scan_id: i64,
    score: f32,
    config: &ScanConfig,
) -> Result<(), ScanError> {
    let attempts = config.complete_retry_attempts.max(1);
    let mut last_err: Option<DbError> = None;

    for attempt in 1..=attempts {
        match brandlens_db::complete_scan(pool, scan_id, score).await {
            Ok(()) => return Ok(()),
            Err(e @ DbError::InvalidScanTransition { .. }) => {
                // The scan left `running` under us; retrying cannot help.
                return Err(e.into());
            }
            Err(e) => {
                tracing::warn!(
                    scan_id,
                    attempt,
                    attempts,
                    error = %e,
                    "completion write failed"
                );
                last_err = Some(e);
                if attempt < attempts {
                    tokio::time::sleep(Duration::from_millis(
                        config.complete_retry_backoff_ms.saturating_mul(u64::from(attempt)),
                    ))
                    .await;
                }
            }
        }
    }

    Err(last_err
        .map(ScanError::from)
        .unwrap_or_else(|| DbError::NotFound.into()))
}

async fn fail_scan_best_effort(pool: &PgPool, scan_id: i64) {
    if let Err(e) = brandlens_db::fail_scan(pool, scan_id).await {
        tracing::error!(scan_id, error = %e, "failed to mark scan as failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_text_verbatim() {
        assert_eq!(truncate_chars("short", 2000), "short");
    }

    #[test]
    fn truncate_cuts_on_character_boundaries() {
        let text = "é".repeat(10);
        let cut = truncate_chars(&text, 4);
        assert_eq!(cut.chars().count(), 5); // 4 kept + ellipsis
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn default_config_matches_storage_bounds() {
        let config = ScanConfig::default();
        assert_eq!(config.response_text_max_chars, 2000);
        assert!(config.max_concurrent_probes >= 1);
    }

    #[test]
    fn fallback_result_is_zero_scored() {
        let result = fallback_result(1, 2, Backend::Gemini, &BackendError::MissingApiKey("gemini"));
        assert_eq!(result.visibility_score, 0);
        assert_eq!(result.sentiment, "not_mentioned");
        assert!(!result.brand_mentioned);
        assert!(result.response_text.starts_with("Error:"));
        assert_eq!(result.backend, "gemini");
    }
}
