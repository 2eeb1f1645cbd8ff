use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde_json::json;

use crate::{
    error::AppResult,
    model::{CurrentUser, ItemId, ListId},
    schema::{CreateItemSchema, CredentialsSchema, ListSchema, MoveItemSchema, UpdateItemSchema},
    AppState,
};

// Handler for the health checker route
pub async fn health_checker_handler() -> impl IntoResponse {
    const MESSAGE: &str = "Hierarchical to-do API with Rust, SQLX, SQLite, and Axum";

    let json_response = serde_json::json!({
        "status": "success",
        "message": MESSAGE
    });

    Json(json_response)
}

// Handler for registering a new account
pub async fn register(
    State(data): State<Arc<AppState>>,
    Json(body): Json<CredentialsSchema>,
) -> AppResult<impl IntoResponse> {
    let user = data.accounts.register(&body.username, &body.password).await?;
    let json_response = json!({"status": "success", "data": json!({ "user": user })});
    Ok((StatusCode::CREATED, Json(json_response)))
}

// Handler for exchanging credentials for a bearer token
pub async fn login(
    State(data): State<Arc<AppState>>,
    Json(body): Json<CredentialsSchema>,
) -> AppResult<impl IntoResponse> {
    let (user, token) = data.accounts.login(&body.username, &body.password).await?;
    let json_response = json!({"status": "success", "data": json!({
        "user": user,
        "access_token": token,
        "token_type": "Bearer"
    })});
    Ok((StatusCode::OK, Json(json_response)))
}

// Handler for logging out; tokens are stateless and the client discards its own
pub async fn logout(Extension(current): Extension<CurrentUser>) -> impl IntoResponse {
    tracing::info!(user_id = current.user_id, "user logged out");
    Json(json!({"status": "success", "message": "Logout successful"}))
}

// Handler for the acting user's own account
pub async fn get_me(
    State(data): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> AppResult<impl IntoResponse> {
    let user = data.accounts.find(current.user_id).await?;
    Ok(Json(json!({"status": "success", "data": json!({ "user": user })})))
}

// Handler for deleting the acting user together with all their lists
pub async fn delete_me(
    State(data): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> AppResult<impl IntoResponse> {
    data.accounts.delete_account(current.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Handler for getting all lists of the acting user
pub async fn get_lists(
    State(data): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> AppResult<impl IntoResponse> {
    let lists = data.tree.lists_for(current.user_id).await?;
    let json_response = json!({
        "status": "success",
        "results": lists.len(),
        "lists": lists
    });
    Ok((StatusCode::OK, Json(json_response)))
}

// Handler for creating a new list
pub async fn create_list(
    State(data): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<ListSchema>,
) -> AppResult<impl IntoResponse> {
    let list = data.tree.create_list(current.user_id, &body.title).await?;
    let json_response = json!({"status": "success", "data": json!({ "list": list })});
    Ok((StatusCode::CREATED, Json(json_response)))
}

// Handler for getting a list's item tree
pub async fn get_list_tree(
    Path(id): Path<ListId>,
    State(data): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> AppResult<impl IntoResponse> {
    let items = data.tree.get_tree(current.user_id, id).await?;
    let json_response = json!({"status": "success", "data": json!({ "items": items })});
    Ok((StatusCode::OK, Json(json_response)))
}

// Handler for renaming a list
pub async fn rename_list(
    Path(id): Path<ListId>,
    State(data): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<ListSchema>,
) -> AppResult<impl IntoResponse> {
    let list = data.tree.rename_list(current.user_id, id, &body.title).await?;
    Ok(Json(json!({"status": "success", "data": json!({ "list": list })})))
}

// Handler for deleting a list and every item in it
pub async fn delete_list(
    Path(id): Path<ListId>,
    State(data): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> AppResult<impl IntoResponse> {
    data.tree.delete_list(current.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Handler for creating a new item at the top of a list or under a parent
pub async fn create_item(
    State(data): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<CreateItemSchema>,
) -> AppResult<impl IntoResponse> {
    let item = data
        .tree
        .create_item(current.user_id, body.list_id, body.parent_id, &body.content)
        .await?;
    let json_response = json!({"status": "success", "data": json!({ "item": item })});
    Ok((StatusCode::CREATED, Json(json_response)))
}

// Handler for getting an item with its subtree and breadcrumbs
pub async fn get_item(
    Path(id): Path<ItemId>,
    State(data): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> AppResult<impl IntoResponse> {
    let detail = data.tree.get_item(current.user_id, id).await?;
    Ok(Json(json!({"status": "success", "data": detail})))
}

// Handler for updating an item's content and/or completion
pub async fn update_item(
    Path(id): Path<ItemId>,
    State(data): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<UpdateItemSchema>,
) -> AppResult<impl IntoResponse> {
    let item = data
        .tree
        .update_item(current.user_id, id, body.content.as_deref(), body.completed)
        .await?;
    Ok(Json(json!({"status": "success", "data": json!({ "item": item })})))
}

// Handler for toggling an item's completion, cascading to its subtree
pub async fn toggle_item(
    Path(id): Path<ItemId>,
    State(data): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> AppResult<impl IntoResponse> {
    let item = data.tree.toggle_completed(current.user_id, id).await?;
    Ok(Json(json!({"status": "success", "data": json!({ "item": item })})))
}

// Handler for collapsing or expanding an item
pub async fn toggle_collapse(
    Path(id): Path<ItemId>,
    State(data): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> AppResult<impl IntoResponse> {
    let item = data.tree.toggle_collapsed(current.user_id, id).await?;
    Ok(Json(json!({"status": "success", "data": json!({ "item": item })})))
}

// Handler for moving an item under another list or item
pub async fn move_item(
    Path(id): Path<ItemId>,
    State(data): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<MoveItemSchema>,
) -> AppResult<impl IntoResponse> {
    let item = data.tree.move_item(current.user_id, id, body.target()?).await?;
    Ok(Json(json!({"status": "success", "data": json!({ "item": item })})))
}

// Handler for deleting an item and its subtree
pub async fn delete_item(
    Path(id): Path<ItemId>,
    State(data): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> AppResult<impl IntoResponse> {
    data.tree.delete_item(current.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Handler for listing every list and item the acting user can move into
pub async fn get_move_targets(
    State(data): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> AppResult<impl IntoResponse> {
    let targets = data.tree.move_targets(current.user_id).await?;
    Ok(Json(json!({"status": "success", "data": targets})))
}
