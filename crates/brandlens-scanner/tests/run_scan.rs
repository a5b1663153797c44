//! End-to-end orchestrator tests: a migrated Postgres database plus a
//! wiremock server standing in for all four backends.

use brandlens_backends::{BackendClient, BackendSettings};
use brandlens_scanner::{run_scan, ScanConfig, ScanError};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const QUERY_ONE: &str = "what is the best CRM for startups?";
const QUERY_TWO: &str = "top CRM platforms in 2026";

fn test_client(base_url: &str) -> BackendClient {
    let mut settings = BackendSettings::default();
    for provider in [
        &mut settings.openai,
        &mut settings.anthropic,
        &mut settings.perplexity,
        &mut settings.gemini,
    ] {
        provider.api_key = Some("test-key".to_owned());
        provider.base_url = base_url.to_owned();
    }
    // Retries disabled so a mocked 500 fails exactly once.
    BackendClient::new(settings, 30, 0, 0).expect("client construction should not fail")
}

fn openai_style_body(text: &str) -> serde_json::Value {
    serde_json::json!({
        "choices": [ { "message": { "role": "assistant", "content": text } } ]
    })
}

/// Mount success mocks for all four backend paths, all answering `text`.
async fn mount_all_backends(server: &MockServer, text: &str) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_style_body(text)))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_style_body(text)))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "content": [ { "type": "text", "text": text } ]
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash-lite:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [ { "content": { "parts": [ { "text": text } ] } } ]
        })))
        .mount(server)
        .await;
}

async fn seed_scan(pool: &sqlx::PgPool, prompts: &[&str]) -> brandlens_db::ScanRow {
    let brand = brandlens_db::create_brand(pool, "Acme", Some("acme.com"), true)
        .await
        .expect("create brand");
    for (i, prompt) in prompts.iter().enumerate() {
        brandlens_db::create_query(pool, brand.id, prompt, i32::try_from(i).unwrap())
            .await
            .expect("create query");
    }
    brandlens_db::create_scan(pool, brand.id, "manual", None)
        .await
        .expect("create scan")
}

#[sqlx::test(migrations = "../../migrations")]
async fn scan_with_partial_backend_failure_still_completes(pool: sqlx::PgPool) {
    let server = MockServer::start().await;

    // Anthropic answers 500 for the first query only; priority 1 beats the
    // catch-all success mock mounted below.
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(body_string_contains(QUERY_ONE))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .with_priority(1)
        .mount(&server)
        .await;

    // "Acme is great" → one mention, positive sentiment: 40 + 5 = 45.
    mount_all_backends(&server, "Acme is great for startups.").await;

    let scan = seed_scan(&pool, &[QUERY_ONE, QUERY_TWO]).await;
    let client = test_client(&server.uri());
    let config = ScanConfig::default();

    run_scan(&pool, &client, &config, scan.id)
        .await
        .expect("scan should complete despite one failing cell");

    // 2 queries × 4 backends ⇒ exactly 8 rows, one of them the fallback.
    let results = brandlens_db::list_results_by_scan(&pool, scan.id)
        .await
        .expect("list results");
    assert_eq!(results.len(), 8);

    let fallbacks: Vec<_> = results
        .iter()
        .filter(|r| r.response_text.as_deref().is_some_and(|t| t.starts_with("Error:")))
        .collect();
    assert_eq!(fallbacks.len(), 1, "exactly one fallback row expected");
    assert_eq!(fallbacks[0].backend, "anthropic");
    assert_eq!(fallbacks[0].visibility_score, 0);
    assert_eq!(fallbacks[0].sentiment, "not_mentioned");

    // Weighted mean including the fallback zero at full weight:
    // 45 × (1 + 1.2 + 1 + 1 + 1 + 1.2 + 1) / (8.4) = 333 / 8.4 → 40.
    let reloaded = brandlens_db::get_scan(&pool, scan.id)
        .await
        .expect("get scan")
        .expect("scan exists");
    assert_eq!(reloaded.status, "completed");
    assert_eq!(reloaded.overall_score, Some(40.0));
    assert!(reloaded.completed_at.is_some());
}

#[sqlx::test(migrations = "../../migrations")]
async fn scan_with_no_queries_completes_with_zero_score(pool: sqlx::PgPool) {
    let server = MockServer::start().await;
    let scan = seed_scan(&pool, &[]).await;
    let client = test_client(&server.uri());

    run_scan(&pool, &client, &ScanConfig::default(), scan.id)
        .await
        .expect("empty scan should still complete");

    let reloaded = brandlens_db::get_scan(&pool, scan.id)
        .await
        .expect("get scan")
        .expect("scan exists");
    assert_eq!(reloaded.status, "completed");
    assert_eq!(reloaded.overall_score, Some(0.0));

    let results = brandlens_db::list_results_by_scan(&pool, scan.id)
        .await
        .expect("list results");
    assert!(results.is_empty());

    // The work phase was a no-op: nothing ever reached the mock server.
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn signals_flow_into_result_rows(pool: sqlx::PgPool) {
    let server = MockServer::start().await;

    // Ranked-list answer with a markdown citation.
    let text = "The contenders:\n1. Acme — see [Acme](https://acme.com)\n2. Other";
    mount_all_backends(&server, text).await;

    let scan = seed_scan(&pool, &[QUERY_ONE]).await;
    let client = test_client(&server.uri());

    run_scan(&pool, &client, &ScanConfig::default(), scan.id)
        .await
        .expect("scan completes");

    let results = brandlens_db::list_results_by_scan(&pool, scan.id)
        .await
        .expect("list results");
    assert_eq!(results.len(), 4);

    let openai_row = results
        .iter()
        .find(|r| r.backend == "openai")
        .expect("openai row");
    assert!(openai_row.brand_mentioned);
    assert_eq!(openai_row.rank_position, Some(1));
    // Three whole-word mentions (list line, link label, URL host), so:
    // 40 base + 10 domain + 8 repeat + 15 rank + 12 citation = 85.
    assert_eq!(openai_row.mention_count, 3);
    assert_eq!(openai_row.visibility_score, 85);
    let citations = openai_row.citations.as_array().expect("citations array");
    assert_eq!(citations.len(), 1);
    assert_eq!(citations[0]["brand_related"], serde_json::Value::Bool(true));
}

#[sqlx::test(migrations = "../../migrations")]
async fn all_backends_failing_still_yields_full_result_grid(pool: sqlx::PgPool) {
    let server = MockServer::start().await;
    // No mocks mounted: every call hits a 404 from wiremock and becomes a
    // fallback row.
    let scan = seed_scan(&pool, &[QUERY_ONE]).await;
    let client = test_client(&server.uri());

    run_scan(&pool, &client, &ScanConfig::default(), scan.id)
        .await
        .expect("scan completes on fallbacks alone");

    let results = brandlens_db::list_results_by_scan(&pool, scan.id)
        .await
        .expect("list results");
    assert_eq!(results.len(), 4);
    assert!(results.iter().all(|r| r.visibility_score == 0));

    let reloaded = brandlens_db::get_scan(&pool, scan.id)
        .await
        .expect("get scan")
        .expect("scan exists");
    assert_eq!(reloaded.status, "completed");
    assert_eq!(reloaded.overall_score, Some(0.0));
}

#[sqlx::test(migrations = "../../migrations")]
async fn run_scan_rejects_non_pending_scan(pool: sqlx::PgPool) {
    let server = MockServer::start().await;
    let scan = seed_scan(&pool, &[QUERY_ONE]).await;
    brandlens_db::start_scan(&pool, scan.id).await.expect("start");

    let client = test_client(&server.uri());
    let result = run_scan(&pool, &client, &ScanConfig::default(), scan.id).await;

    assert!(
        matches!(
            result,
            Err(ScanError::Db(brandlens_db::DbError::InvalidScanTransition { .. }))
        ),
        "a scan already running must not be restarted, got: {result:?}"
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn missing_scan_fails_before_any_work(pool: sqlx::PgPool) {
    let server = MockServer::start().await;
    let client = test_client(&server.uri());

    let result = run_scan(&pool, &client, &ScanConfig::default(), 999_999).await;
    assert!(result.is_err());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn long_responses_are_truncated_for_storage(pool: sqlx::PgPool) {
    let server = MockServer::start().await;
    let long_text = format!("Acme {}", "x".repeat(3000));
    mount_all_backends(&server, &long_text).await;

    let scan = seed_scan(&pool, &[QUERY_ONE]).await;
    let client = test_client(&server.uri());

    run_scan(&pool, &client, &ScanConfig::default(), scan.id)
        .await
        .expect("scan completes");

    let results = brandlens_db::list_results_by_scan(&pool, scan.id)
        .await
        .expect("list results");
    for row in &results {
        let stored = row.response_text.as_deref().expect("stored text");
        assert!(
            stored.chars().count() <= 2001,
            "stored text must be capped (2000 chars + ellipsis)"
        );
        // Classification ran on the full text, not the truncated copy.
        assert!(row.brand_mentioned);
    }
}
