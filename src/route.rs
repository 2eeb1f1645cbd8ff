use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::{handler::*, middleware::mw_require_auth, AppState};

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let app = Router::new()
        .route("/me", get(get_me).delete(delete_me))
        .route("/lists", get(get_lists).post(create_list))
        .route(
            "/lists/:id",
            get(get_list_tree).patch(rename_list).delete(delete_list),
        )
        .route("/items", post(create_item))
        .route(
            "/items/:id",
            get(get_item).patch(update_item).delete(delete_item),
        )
        .route("/items/:id/toggle", post(toggle_item))
        .route("/items/:id/collapse", post(toggle_collapse))
        .route("/items/:id/move", post(move_item))
        .route("/move-targets", get(get_move_targets))
        .route("/logout", post(logout))
        .route_layer(from_fn_with_state(app_state.clone(), mw_require_auth))
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/", get(health_checker_handler))
        .with_state(app_state);
    app
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, db};
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn app() -> Router {
        let pool = db::connect_in_memory().await.unwrap();
        let config = Config::from_lookup(|name| (name == "JWT_SECRET").then(|| "test".to_string())).unwrap();
        create_router(Arc::new(AppState::new(pool, &config)))
    }

    async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        let mut request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let response = app
            .clone()
            .oneshot(request.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn login(app: &Router, username: &str) -> String {
        let credentials = json!({"username": username, "password": "pw"});
        let (status, _) = send(app, "POST", "/register", None, credentials.clone()).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, body) = send(app, "POST", "/login", None, credentials).await;
        assert_eq!(status, StatusCode::OK);
        body["data"]["access_token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        let app = app().await;
        let (status, body) = send(&app, "GET", "/lists", None, Value::Null).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["status"], "fail");

        let (status, _) = send(&app, "GET", "/lists", Some("garbage"), Value::Null).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app, "GET", "/", None, Value::Null).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn logout_requires_a_token_and_succeeds_with_one() {
        let app = app().await;
        let (status, _) = send(&app, "POST", "/logout", None, Value::Null).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let token = login(&app, "ada").await;
        let (status, body) = send(&app, "POST", "/logout", Some(&token), Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
    }

    #[tokio::test]
    async fn build_move_and_read_a_tree_over_http() {
        let app = app().await;
        let token = login(&app, "ada").await;
        let token = Some(token.as_str());

        let (status, body) = send(&app, "POST", "/lists", token, json!({"title": "Home"})).await;
        assert_eq!(status, StatusCode::CREATED);
        let list_id = body["data"]["list"]["id"].as_i64().unwrap();

        let (_, body) = send(&app, "POST", "/items", token, json!({"content": "A", "list_id": list_id})).await;
        let a = body["data"]["item"]["id"].as_i64().unwrap();
        let (_, body) = send(&app, "POST", "/items", token, json!({"content": "B", "parent_id": a})).await;
        let b = body["data"]["item"]["id"].as_i64().unwrap();
        let (status, body) = send(&app, "POST", "/items", token, json!({"content": "C", "parent_id": b})).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["item"]["level"], 3);

        let (status, body) = send(
            &app,
            "POST",
            &format!("/items/{}/move", a),
            token,
            json!({"target_type": "item", "target_id": b}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "fail");

        let (status, _) = send(
            &app,
            "POST",
            &format!("/items/{}/move", b),
            token,
            json!({"target_type": "list", "target_id": list_id}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, "POST", &format!("/items/{}/toggle", b), token, Value::Null).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, "GET", &format!("/lists/{}", list_id), token, Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        let items = body["data"]["items"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1]["id"], b);
        assert_eq!(items[1]["level"], 1);
        assert_eq!(items[1]["completed"], true);
        assert_eq!(items[1]["children"][0]["level"], 2);
        assert_eq!(items[1]["children"][0]["completed"], true);
    }

    #[tokio::test]
    async fn other_users_lists_are_not_found() {
        let app = app().await;
        let ada = login(&app, "ada").await;
        let bob = login(&app, "bob").await;

        let (_, body) = send(&app, "POST", "/lists", Some(&ada), json!({"title": "Home"})).await;
        let list_id = body["data"]["list"]["id"].as_i64().unwrap();

        let (status, _) = send(&app, "GET", &format!("/lists/{}", list_id), Some(&bob), Value::Null).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, "DELETE", &format!("/lists/{}", list_id), Some(&bob), Value::Null).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, "DELETE", &format!("/lists/{}", list_id), Some(&ada), Value::Null).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }
}
