//! Product (burger) endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{Money, ProductId};
use domain::{IngredientRequest, ProductDraft, ProductView};
use serde::{Deserialize, Serialize};
use store::Store;

use super::items::ItemResponse;
use super::{LineBody, parse_numeric_id};
use crate::AppState;
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateProductRequest {
    pub id: i64,
    pub description: String,
    pub price_cents: i64,
    #[serde(default)]
    pub ingredients: Vec<LineBody>,
}

#[derive(Deserialize)]
pub struct UpdateProductRequest {
    pub description: String,
    pub price_cents: i64,
    #[serde(default)]
    pub ingredients: Vec<LineBody>,
}

#[derive(Deserialize)]
pub struct ListProductsParams {
    pub description: Option<String>,
}

fn draft(description: String, price_cents: i64, ingredients: Vec<LineBody>) -> ProductDraft {
    ProductDraft {
        description,
        price: Money::from_cents(price_cents),
        ingredients: ingredients
            .into_iter()
            .map(|line| IngredientRequest::new(line.id, line.quantity))
            .collect(),
    }
}

// -- Response types --

#[derive(Debug, Serialize)]
pub struct IngredientResponse {
    pub item: ItemResponse,
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: i64,
    pub description: String,
    pub price_cents: i64,
    pub ingredients: Vec<IngredientResponse>,
}

impl From<ProductView> for ProductResponse {
    fn from(view: ProductView) -> Self {
        Self {
            id: view.product.id.as_i64(),
            description: view.product.description,
            price_cents: view.product.price.cents(),
            ingredients: view
                .ingredients
                .into_iter()
                .map(|i| IngredientResponse {
                    item: i.item.into(),
                    quantity: i.quantity,
                })
                .collect(),
        }
    }
}

// -- Handlers --

/// POST /products: create a product with its full ingredient list.
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<CreateProductRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let Json(req) = payload?;
    let view = state
        .products
        .create_product(
            ProductId::new(req.id),
            draft(req.description, req.price_cents, req.ingredients),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(view.into())))
}

/// GET /products: list products, optionally `?description=` substring.
#[tracing::instrument(skip(state, params))]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    params: Result<Query<ListProductsParams>, QueryRejection>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let Query(params) = params?;
    let views = match params.description.as_deref().map(str::trim) {
        Some(term) if !term.is_empty() => state.products.search_products(term).await?,
        _ => state.products.list_products().await?,
    };
    Ok(Json(views.into_iter().map(ProductResponse::from).collect()))
}

/// GET /products/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let id = ProductId::new(parse_numeric_id("product", &id)?);
    let view = state.products.get_product(id).await?;
    Ok(Json(view.into()))
}

/// PUT /products/{id}: replace the product and its whole ingredient list.
#[tracing::instrument(skip(state, payload))]
pub async fn update<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateProductRequest>, JsonRejection>,
) -> Result<Json<ProductResponse>, ApiError> {
    let id = ProductId::new(parse_numeric_id("product", &id)?);
    let Json(req) = payload?;
    let view = state
        .products
        .update_product(id, draft(req.description, req.price_cents, req.ingredients))
        .await?;
    Ok(Json(view.into()))
}

/// DELETE /products/{id}
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = ProductId::new(parse_numeric_id("product", &id)?);
    state.products.delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
