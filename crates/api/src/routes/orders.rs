//! Order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{OrderId, OrderStatus};
use domain::{CreateOrder, DrinkRequest, OrderView, ProductRequest, UpdateOrder};
use serde::{Deserialize, Serialize};
use store::{OrderQuery, Product, Store};

use super::LineBody;
use super::items::ItemResponse;
use crate::AppState;
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub description: String,
    pub customer_name: String,
    pub address: String,
    pub phone: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub products: Vec<LineBody>,
    #[serde(default)]
    pub drinks: Vec<LineBody>,
}

/// Every field is optional; missing or blank fields keep their value, and
/// an empty line list keeps the stored lines.
#[derive(Deserialize, Default)]
#[serde(default)]
pub struct UpdateOrderRequest {
    pub description: Option<String>,
    pub status: Option<String>,
    pub customer_name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub products: Vec<LineBody>,
    pub drinks: Vec<LineBody>,
}

#[derive(Deserialize)]
pub struct ListOrdersParams {
    #[serde(default)]
    pub unfinished: bool,
}

fn product_requests(lines: Vec<LineBody>) -> Vec<ProductRequest> {
    lines
        .into_iter()
        .map(|line| ProductRequest::new(line.id, line.quantity))
        .collect()
}

fn drink_requests(lines: Vec<LineBody>) -> Vec<DrinkRequest> {
    lines
        .into_iter()
        .map(|line| DrinkRequest::new(line.id, line.quantity))
        .collect()
}

// -- Response types --

#[derive(Debug, Serialize)]
pub struct ProductSummary {
    pub id: i64,
    pub description: String,
    pub price_cents: i64,
}

impl From<Product> for ProductSummary {
    fn from(product: Product) -> Self {
        Self {
            id: product.id.as_i64(),
            description: product.description,
            price_cents: product.price.cents(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProductLineResponse {
    pub product_id: i64,
    pub quantity: u32,
    /// `null` once the product has been deleted.
    pub product: Option<ProductSummary>,
}

#[derive(Debug, Serialize)]
pub struct DrinkLineResponse {
    pub item_id: i64,
    pub quantity: u32,
    pub drink: Option<ItemResponse>,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub description: String,
    pub status: OrderStatus,
    pub customer_name: String,
    pub address: String,
    pub phone: String,
    pub notes: String,
    pub total_cents: i64,
    pub products: Vec<ProductLineResponse>,
    pub drinks: Vec<DrinkLineResponse>,
}

impl From<OrderView> for OrderResponse {
    fn from(view: OrderView) -> Self {
        let order = view.order;
        Self {
            id: order.id.to_string(),
            created_at: order.created_at,
            description: order.description,
            status: order.status,
            customer_name: order.customer_name,
            address: order.address,
            phone: order.phone,
            notes: order.notes,
            total_cents: order.total.cents(),
            products: view
                .products
                .into_iter()
                .map(|line| ProductLineResponse {
                    product_id: line.product_id.as_i64(),
                    quantity: line.quantity,
                    product: line.product.map(ProductSummary::from),
                })
                .collect(),
            drinks: view
                .drinks
                .into_iter()
                .map(|line| DrinkLineResponse {
                    item_id: line.item_id.as_i64(),
                    quantity: line.quantity,
                    drink: line.drink.map(ItemResponse::from),
                })
                .collect(),
        }
    }
}

// -- Handlers --

/// POST /orders: place an order.
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let Json(req) = payload?;
    let cmd = CreateOrder {
        description: req.description,
        customer_name: req.customer_name,
        address: req.address,
        phone: req.phone,
        notes: req.notes,
        products: product_requests(req.products),
        drinks: drink_requests(req.drinks),
    };
    let view = state.orders.create(cmd).await?;
    Ok((StatusCode::CREATED, Json(view.into())))
}

/// GET /orders: list orders in creation order, optionally `?unfinished=true`.
#[tracing::instrument(skip(state, params))]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    params: Result<Query<ListOrdersParams>, QueryRejection>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let Query(params) = params?;
    let query = OrderQuery {
        unfinished_only: params.unfinished,
    };
    let views = state.orders.list(query).await?;
    Ok(Json(views.into_iter().map(OrderResponse::from).collect()))
}

/// GET /orders/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let id = parse_order_id(&id)?;
    let view = state.orders.get(id).await?;
    Ok(Json(view.into()))
}

/// PUT /orders/{id}: partial update.
#[tracing::instrument(skip(state, payload))]
pub async fn update<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateOrderRequest>, JsonRejection>,
) -> Result<Json<OrderResponse>, ApiError> {
    let id = parse_order_id(&id)?;
    let Json(req) = payload?;

    let status = match req.status.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => Some(
            raw.to_ascii_uppercase()
                .parse::<OrderStatus>()
                .map_err(|e| ApiError::BadRequest(e.to_string()))?,
        ),
        _ => None,
    };

    let cmd = UpdateOrder {
        description: req.description,
        status,
        customer_name: req.customer_name,
        address: req.address,
        phone: req.phone,
        notes: req.notes,
        products: product_requests(req.products),
        drinks: drink_requests(req.drinks),
    };
    let view = state.orders.update(id, cmd).await?;
    Ok(Json(view.into()))
}

/// DELETE /orders/{id}
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_order_id(&id)?;
    state.orders.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid order id: {e}")))?;
    Ok(OrderId::from_uuid(uuid))
}
