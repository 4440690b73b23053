//! Integration tests for query and delete endpoints

mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use pulse_config::IngestConfig;

use common::*;

async fn submit_at(app: &TestApp, id: &str, level: &str, source: &str, timestamp: i64) {
    let response = send(
        app,
        json_request(
            Method::POST,
            "/api/logs",
            Some(source),
            Some(json!({
                "id": id,
                "message": format!("message {id}"),
                "level": level,
                "timestamp": timestamp,
                "scriptId": format!("{source}.js"),
            })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

async fn seeded() -> TestApp {
    let app = test_app();
    submit_at(&app, "a", "info", "web", 1_000).await;
    submit_at(&app, "b", "error", "web", 2_000).await;
    submit_at(&app, "c", "warn", "api", 3_000).await;
    submit_at(&app, "d", "error", "api", 4_000).await;
    app
}

#[tokio::test]
async fn test_query_newest_first() {
    let app = seeded().await;

    let page = response_json(send(&app, get("/api/logs")).await).await;
    assert_eq!(page["total"], 4);
    assert_eq!(page_ids(&page), ["d", "c", "b", "a"]);
}

#[tokio::test]
async fn test_query_filters() {
    let app = seeded().await;

    let page = response_json(send(&app, get("/api/logs?level=error")).await).await;
    assert_eq!(page_ids(&page), ["d", "b"]);

    let page = response_json(send(&app, get("/api/logs?level=error,warn&sourceId=api")).await).await;
    assert_eq!(page_ids(&page), ["d", "c"]);

    let page = response_json(send(&app, get("/api/logs?scriptId=web.js")).await).await;
    assert_eq!(page_ids(&page), ["b", "a"]);

    let page = response_json(send(&app, get("/api/logs?search=MESSAGE%20c")).await).await;
    assert_eq!(page_ids(&page), ["c"]);
}

#[tokio::test]
async fn test_query_time_range() {
    let app = seeded().await;

    let page = response_json(send(&app, get("/api/logs?start=2000&end=3000")).await).await;
    assert_eq!(page_ids(&page), ["c", "b"]);

    let page = response_json(
        send(&app, get("/api/logs?start=1970-01-01T00:00:03Z")).await,
    )
    .await;
    assert_eq!(page_ids(&page), ["d", "c"]);

    // entirely outside the live range: empty, not an error
    let response = send(&app, get("/api/logs?end=500")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["total"], 0);

    let page = response_json(send(&app, get("/api/logs?start=99999")).await).await;
    assert_eq!(page["total"], 0);

    let response = send(&app, get("/api/logs?start=yesterday")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_query_pagination() {
    let app = seeded().await;

    let page = response_json(send(&app, get("/api/logs?offset=1&limit=2")).await).await;
    assert_eq!(page["total"], 4);
    assert_eq!(page["offset"], 1);
    assert_eq!(page["limit"], 2);
    assert_eq!(page_ids(&page), ["c", "b"]);

    let page = response_json(send(&app, get("/api/logs?offset=10")).await).await;
    assert!(page_ids(&page).is_empty());
}

#[tokio::test]
async fn test_get_unknown_log() {
    let app = seeded().await;

    let response = send(&app, get("/api/logs/missing")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response_json(response).await["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_eviction_is_visible_to_queries() {
    let app = test_app_with(
        IngestConfig {
            max_logs: 3,
            ..IngestConfig::default()
        },
        None,
    );
    for (i, id) in ["A", "B", "C", "D"].into_iter().enumerate() {
        submit_at(&app, id, "info", "web", 1_000 + i as i64).await;
    }

    let page = response_json(send(&app, get("/api/logs")).await).await;
    assert_eq!(page_ids(&page), ["D", "C", "B"]);

    let page = response_json(send(&app, get("/api/logs?sourceId=web&level=info")).await).await;
    assert_eq!(page_ids(&page), ["D", "C", "B"]);

    let response = send(&app, get("/api/logs/A")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_logs_by_source() {
    let app = seeded().await;

    let response = send(
        &app,
        json_request(Method::DELETE, "/api/logs?sourceId=web", None, None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["deleted"], 2);

    let page = response_json(send(&app, get("/api/logs")).await).await;
    assert_eq!(page_ids(&page), ["d", "c"]);

    let response = send(&app, json_request(Method::DELETE, "/api/logs", None, None)).await;
    assert_eq!(response_json(response).await["deleted"], 2);
    let page = response_json(send(&app, get("/api/logs")).await).await;
    assert_eq!(page["total"], 0);
}

#[tokio::test]
async fn test_delete_monitoring_by_module() {
    let app = test_app();
    for module in ["cart", "cart", "menu"] {
        let response = send(
            &app,
            json_request(
                Method::POST,
                "/api/monitoring",
                None,
                Some(json!({ "moduleId": module, "type": "event", "name": "click" })),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = send(
        &app,
        json_request(Method::DELETE, "/api/monitoring?moduleId=cart", None, None),
    )
    .await;
    assert_eq!(response_json(response).await["deleted"], 2);

    let page = response_json(send(&app, get("/api/monitoring")).await).await;
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["moduleId"], "menu");
}
