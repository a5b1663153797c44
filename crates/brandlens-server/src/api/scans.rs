//! Scan trigger and read routes.
//!
//! `POST /api/v1/scans` is the trigger boundary: it persists an anonymous
//! brand, its queries and a `pending` scan, spawns the orchestrator on the
//! runtime, and answers immediately — the caller polls the read route for
//! the outcome.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use brandlens_core::ScanStatus;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

/// Anonymous scans are readable for one week.
const SCAN_EXPIRY_DAYS: i64 = 7;

const MAX_QUERIES_PER_SCAN: usize = 3;
const MIN_QUERY_CHARS: usize = 10;
const MAX_QUERY_CHARS: usize = 500;
const MAX_BRAND_NAME_CHARS: usize = 100;
const MAX_DOMAIN_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
pub(super) struct CreateScanRequest {
    pub brand_name: String,
    #[serde(default)]
    pub domain: Option<String>,
    pub queries: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct CreateScanData {
    pub scan_id: Uuid,
}

#[derive(Debug, Serialize)]
pub(super) struct ScanDetail {
    pub id: Uuid,
    pub status: ScanStatus,
    pub overall_score: Option<f32>,
    pub triggered_by: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub brand: BrandSummary,
    pub results: Vec<ScanResultItem>,
}

#[derive(Debug, Serialize)]
pub(super) struct BrandSummary {
    pub name: String,
    pub domain: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct ScanResultItem {
    pub id: i64,
    pub backend: String,
    pub query_id: i64,
    pub query: String,
    pub response_text: Option<String>,
    pub brand_mentioned: bool,
    pub domain_mentioned: bool,
    pub mention_count: i32,
    pub mention_positions: Value,
    pub citations: Value,
    pub sentiment: String,
    pub visibility_score: i32,
    pub rank_position: Option<i32>,
}

fn validate(request: &CreateScanRequest) -> Result<(), String> {
    let name = request.brand_name.trim();
    if name.is_empty() {
        return Err("brand name is required".to_owned());
    }
    if name.chars().count() > MAX_BRAND_NAME_CHARS {
        return Err(format!(
            "brand name must be under {MAX_BRAND_NAME_CHARS} characters"
        ));
    }

    if let Some(domain) = request.domain.as_deref() {
        if domain.chars().count() > MAX_DOMAIN_CHARS {
            return Err(format!("domain must be under {MAX_DOMAIN_CHARS} characters"));
        }
    }

    if request.queries.is_empty() {
        return Err("at least one query is required".to_owned());
    }
    if request.queries.len() > MAX_QUERIES_PER_SCAN {
        return Err(format!("maximum {MAX_QUERIES_PER_SCAN} queries per scan"));
    }
    for query in &request.queries {
        let chars = query.chars().count();
        if chars < MIN_QUERY_CHARS {
            return Err(format!("query must be at least {MIN_QUERY_CHARS} characters"));
        }
        if chars > MAX_QUERY_CHARS {
            return Err(format!("query must be under {MAX_QUERY_CHARS} characters"));
        }
    }

    Ok(())
}

pub(super) async fn create_scan(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(request): Json<CreateScanRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Err(reason) = validate(&request) {
        return Err(ApiError::new(req_id.0, "validation_error", reason));
    }

    let domain = request
        .domain
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());

    let brand = brandlens_db::create_brand(&state.pool, request.brand_name.trim(), domain, true)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    for (i, prompt) in request.queries.iter().enumerate() {
        let sort_order = i32::try_from(i).unwrap_or(i32::MAX);
        brandlens_db::create_query(&state.pool, brand.id, prompt, sort_order)
            .await
            .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    }

    let expires_at = Utc::now() + Duration::days(SCAN_EXPIRY_DAYS);
    let scan = brandlens_db::create_scan(&state.pool, brand.id, "manual", Some(expires_at))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    // Run the work phase in the background; the outcome is communicated
    // entirely through the persisted scan and result rows.
    let pool = state.pool.clone();
    let client = state.client.clone();
    let scan_config = state.scan_config.clone();
    let scan_id = scan.id;
    tokio::spawn(async move {
        if let Err(e) = brandlens_scanner::run_scan(&pool, &client, &scan_config, scan_id).await {
            tracing::error!(scan_id, error = %e, "background scan run failed");
        }
    });

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: CreateScanData {
                scan_id: scan.public_id,
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

pub(super) async fn get_scan(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(scan_id): Path<Uuid>,
) -> Result<Json<ApiResponse<ScanDetail>>, ApiError> {
    let scan = brandlens_db::get_scan_by_public_id(&state.pool, scan_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "not_found", "scan not found"))?;

    if scan.expires_at.is_some_and(|at| at < Utc::now()) {
        return Err(ApiError::new(req_id.0, "gone", "this scan has expired"));
    }

    let brand = brandlens_db::get_brand(&state.pool, scan.brand_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "not_found", "scan not found"))?;

    let results = brandlens_db::list_results_with_queries(&state.pool, scan.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let status: ScanStatus = scan.status.parse().map_err(|_| {
        ApiError::new(req_id.0.clone(), "internal_error", "invalid scan status")
    })?;

    let detail = ScanDetail {
        id: scan.public_id,
        status,
        overall_score: scan.overall_score,
        triggered_by: scan.triggered_by,
        created_at: scan.created_at,
        completed_at: scan.completed_at,
        brand: BrandSummary {
            name: brand.name,
            domain: brand.domain,
        },
        results: results
            .into_iter()
            .map(|row| ScanResultItem {
                id: row.id,
                backend: row.backend,
                query_id: row.query_id,
                query: row.prompt_text,
                response_text: row.response_text,
                brand_mentioned: row.brand_mentioned,
                domain_mentioned: row.domain_mentioned,
                mention_count: row.mention_count,
                mention_positions: row.mention_positions,
                citations: row.citations,
                sentiment: row.sentiment,
                visibility_score: row.visibility_score,
                rank_position: row.rank_position,
            })
            .collect(),
    };

    Ok(Json(ApiResponse {
        data: detail,
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(brand_name: &str, queries: &[&str]) -> CreateScanRequest {
        CreateScanRequest {
            brand_name: brand_name.to_owned(),
            domain: None,
            queries: queries.iter().map(|q| (*q).to_owned()).collect(),
        }
    }

    #[test]
    fn accepts_a_well_formed_request() {
        let req = request("Acme", &["what is the best CRM for startups?"]);
        assert!(validate(&req).is_ok());
    }

    #[test]
    fn rejects_empty_query_list() {
        let req = request("Acme", &[]);
        assert!(validate(&req).is_err());
    }

    #[test]
    fn rejects_too_many_queries() {
        let queries = vec!["a query of sufficient length"; 4];
        let req = CreateScanRequest {
            brand_name: "Acme".to_owned(),
            domain: None,
            queries: queries.iter().map(|q| (*q).to_owned()).collect(),
        };
        assert!(validate(&req).is_err());
    }

    #[test]
    fn rejects_query_length_out_of_bounds() {
        assert!(validate(&request("Acme", &["short one"])).is_err());
        let long = "x".repeat(501);
        assert!(validate(&request("Acme", &[long.as_str()])).is_err());
    }

    #[test]
    fn rejects_oversized_brand_name() {
        let name = "x".repeat(101);
        let req = request(&name, &["what is the best CRM for startups?"]);
        assert!(validate(&req).is_err());
    }

    #[test]
    fn rejects_oversized_domain() {
        let mut req = request("Acme", &["what is the best CRM for startups?"]);
        req.domain = Some("d".repeat(201));
        assert!(validate(&req).is_err());
    }
}
