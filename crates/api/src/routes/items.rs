//! Catalog item endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{ItemId, ItemKind, Money};
use domain::{CreateItem, ItemUpdate};
use serde::{Deserialize, Serialize};
use store::{Item, Store};

use super::parse_numeric_id;
use crate::AppState;
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateItemRequest {
    pub id: i64,
    pub kind: String,
    pub description: String,
    pub price_cents: i64,
    #[serde(default)]
    pub extra: bool,
}

#[derive(Deserialize)]
pub struct UpdateItemRequest {
    pub description: String,
    pub price_cents: i64,
    #[serde(default)]
    pub extra: bool,
}

#[derive(Deserialize)]
pub struct ListItemsParams {
    pub kind: Option<String>,
}

// -- Response types --

#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub id: i64,
    pub kind: ItemKind,
    pub description: String,
    pub price_cents: i64,
    pub extra: bool,
}

impl From<Item> for ItemResponse {
    fn from(item: Item) -> Self {
        Self {
            id: item.id.as_i64(),
            kind: item.kind,
            description: item.description,
            price_cents: item.price.cents(),
            extra: item.extra,
        }
    }
}

// -- Handlers --

/// POST /items: add a drink or ingredient under a caller-chosen id.
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<CreateItemRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ItemResponse>), ApiError> {
    let Json(req) = payload?;
    let item = state
        .catalog
        .create_item(CreateItem {
            id: ItemId::new(req.id),
            kind: req.kind,
            description: req.description,
            price: Money::from_cents(req.price_cents),
            extra: req.extra,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(item.into())))
}

/// GET /items: list items, optionally `?kind=DRINK|INGREDIENT`.
#[tracing::instrument(skip(state, params))]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    params: Result<Query<ListItemsParams>, QueryRejection>,
) -> Result<Json<Vec<ItemResponse>>, ApiError> {
    let Query(params) = params?;
    let kind = params
        .kind
        .map(|raw| {
            raw.to_ascii_uppercase()
                .parse::<ItemKind>()
                .map_err(|e| ApiError::BadRequest(e.to_string()))
        })
        .transpose()?;

    let items = state.catalog.list_items(kind).await?;
    Ok(Json(items.into_iter().map(ItemResponse::from).collect()))
}

/// GET /items/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<ItemResponse>, ApiError> {
    let id = ItemId::new(parse_numeric_id("item", &id)?);
    let item = state.catalog.get_item(id).await?;
    Ok(Json(item.into()))
}

/// PUT /items/{id}: replace description, price and flag.
#[tracing::instrument(skip(state, payload))]
pub async fn update<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateItemRequest>, JsonRejection>,
) -> Result<Json<ItemResponse>, ApiError> {
    let id = ItemId::new(parse_numeric_id("item", &id)?);
    let Json(req) = payload?;
    let item = state
        .catalog
        .update_item(
            id,
            ItemUpdate {
                description: req.description,
                price: Money::from_cents(req.price_cents),
                extra: req.extra,
            },
        )
        .await?;
    Ok(Json(item.into()))
}

/// DELETE /items/{id}
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = ItemId::new(parse_numeric_id("item", &id)?);
    state.catalog.delete_item(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
