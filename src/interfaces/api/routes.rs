use axum::{
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::common::di::AppState;
use crate::interfaces::api::handlers::{
    item_handler, outfit_handler, session_handler, trash_handler, upload_handler,
};

/// Creates API routes for the application
pub fn create_api_routes(state: AppState) -> Router {
    let session_router = Router::new()
        .route(
            "/",
            get(session_handler::get_session)
                .put(session_handler::put_session)
                .delete(session_handler::delete_session),
        )
        .route("/reload", post(session_handler::reload));

    let items_router = Router::new()
        .route("/", get(item_handler::list_items).post(item_handler::upload_item))
        .route("/favorites", get(item_handler::list_favorites))
        .route("/{kind}/{id}/trash", post(trash_handler::move_to_trash))
        .route("/{kind}/{id}/favorite", put(item_handler::toggle_favorite));

    let trash_router = Router::new()
        .route("/", get(trash_handler::get_trash_items).delete(trash_handler::empty_trash))
        .route("/{kind}/{id}/restore", post(trash_handler::restore_from_trash))
        .route("/{kind}/{id}", delete(trash_handler::delete_permanently));

    let uploads_router = Router::new()
        .route("/pending", get(upload_handler::pending_upload))
        .route("/{upload_id}", delete(upload_handler::cancel_upload))
        .route("/{upload_id}/style", post(upload_handler::choose_style));

    let api = Router::new()
        .route("/health", get(|| async { Json(json!({ "status": "ok" })) }))
        .nest("/session", session_router)
        .nest("/items", items_router)
        .nest("/trash", trash_router)
        .nest("/uploads", uploads_router)
        .route(
            "/outfits",
            get(outfit_handler::list_outfits).post(outfit_handler::save_outfit),
        )
        .route("/stats", get(outfit_handler::stats))
        .route("/transform/health", get(upload_handler::transform_health));

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::common::config::AppConfig;

    const BOUNDARY: &str = "oxiwardrobe-test-boundary";

    async fn app() -> Router {
        let mut config = AppConfig::default();
        config.transform.enabled = false;
        let state = AppState::ephemeral(config).await.unwrap();
        create_api_routes(state)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn method_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder().method(method).uri(uri).body(Body::empty()).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn upload_request(category: &str, name: &str) -> Request<Body> {
        upload_request_with_style(category, name, Some("original"))
    }

    fn upload_request_with_style(category: &str, name: &str, style: Option<&str>) -> Request<Body> {
        let png: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 1];
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{b}\r\nContent-Disposition: form-data; name=\"category\"\r\n\r\n{category}\r\n\
                 --{b}\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\n{name}\r\n",
                b = BOUNDARY
            )
            .as_bytes(),
        );
        if let Some(style) = style {
            body.extend_from_slice(
                format!(
                    "--{b}\r\nContent-Disposition: form-data; name=\"style\"\r\n\r\n{style}\r\n",
                    b = BOUNDARY
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(
            format!(
                "--{b}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"shirt.png\"\r\n\
                 Content-Type: image/png\r\n\r\n",
                b = BOUNDARY
            )
            .as_bytes(),
        );
        body.extend_from_slice(png);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/items")
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", BOUNDARY))
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_and_anonymous_session() {
        let app = app().await;

        let (status, body) = send(&app, get_request("/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, body) = send(&app, get_request("/api/session")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ownerId"], "anonymous");
        assert_eq!(body["mode"], "local");
        assert_eq!(body["status"]["status"], "anonymous");
    }

    #[tokio::test]
    async fn test_upload_trash_and_restore_over_http() {
        let app = app().await;

        let (status, body) = send(&app, upload_request("upper", "Blue Shirt")).await;
        assert_eq!(status, StatusCode::CREATED);
        let kind = body["data"]["kind"].as_str().unwrap().to_string();
        let id = body["data"]["id"].as_str().unwrap().to_string();
        assert_eq!(kind, "local");
        assert!(body["data"]["imageUrl"].as_str().unwrap().starts_with("data:image/png;base64,"));

        let (_, items) = send(&app, get_request("/api/items?category=upper&q=blue")).await;
        assert_eq!(items.as_array().unwrap().len(), 1);

        let (status, _) = send(&app, method_request("POST", &format!("/api/items/{}/{}/trash", kind, id))).await;
        assert_eq!(status, StatusCode::OK);
        let (_, items) = send(&app, get_request("/api/items")).await;
        assert!(items.as_array().unwrap().is_empty());
        let (_, trash) = send(&app, get_request("/api/trash")).await;
        assert_eq!(trash[0]["name"], "Blue Shirt");

        let (status, body) =
            send(&app, method_request("POST", &format!("/api/trash/{}/{}/restore", kind, id))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["id"], id.as_str());

        let (status, body) =
            send(&app, method_request("POST", &format!("/api/trash/{}/{}/restore", kind, id))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"].is_null());
    }

    #[tokio::test]
    async fn test_error_responses() {
        let app = app().await;

        let (status, body) = send(&app, method_request("POST", "/api/items/remote/1/trash")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("Invalid item kind"));

        let (status, _) = send(&app, method_request("POST", "/api/items/local/404/trash")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, json_request("POST", "/api/outfits", json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, get_request("/api/items?sort=price")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, method_request("DELETE", "/api/trash/local/404")).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_uploads_and_transform_endpoints() {
        let app = app().await;

        let (status, _) = send(&app, get_request("/api/uploads/pending")).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let uri = format!("/api/uploads/{}/style", uuid::Uuid::new_v4());
        let (status, _) = send(&app, json_request("POST", &uri, json!({ "style": "cartoon" }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(&app, get_request("/api/transform/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["enabled"], false);
        assert_eq!(body["available"], false);

        let (_, stats) = send(&app, get_request("/api/stats")).await;
        assert_eq!(stats["totalItems"], 0);
        assert_eq!(stats["byCategory"]["accessories"], 0);
    }

    #[tokio::test]
    async fn test_cancel_pending_upload_over_http() {
        let mut config = AppConfig::default();
        config.transform.enabled = true;
        config.transform.service_url = "http://127.0.0.1:9/api/cartoonize".to_string();
        let app = create_api_routes(AppState::ephemeral(config).await.unwrap());

        let upload = {
            let app = app.clone();
            tokio::spawn(async move { send(&app, upload_request_with_style("upper", "Waiting Shirt", None)).await })
        };

        let upload_id = loop {
            let (status, body) = send(&app, get_request("/api/uploads/pending")).await;
            if status == StatusCode::OK {
                break body["uploadId"].as_str().unwrap().to_string();
            }
            tokio::task::yield_now().await;
        };

        let uri = format!("/api/uploads/{}", upload_id);
        let (status, _) = send(&app, method_request("DELETE", &uri)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = upload.await.unwrap();
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("cancelled"));

        let (status, _) = send(&app, method_request("DELETE", &uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (_, items) = send(&app, get_request("/api/items")).await;
        assert!(items.as_array().unwrap().is_empty());
    }
}
