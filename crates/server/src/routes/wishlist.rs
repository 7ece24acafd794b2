//! Wishlist route handlers.
//!
//! Handlers only translate HTTP to service calls; authorization and
//! idempotency live in [`WishlistService`](crate::services::WishlistService).

use std::collections::BTreeSet;

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
};
use tracing::instrument;

use wishlist_core::{IdError, VariantId, WishlistItemId};

use crate::error::Result;
use crate::middleware::{RequireCustomer, RequireSalesChannel};
use crate::models::{
    AddItemRequest, VariantCountsQuery, VariantCountsResponse, WishlistContents, WishlistResponse,
};
use crate::services::WishlistError;
use crate::state::AppState;

/// `GET /store/wishlist`
#[instrument(skip_all, fields(customer_id = %customer.customer_id, sales_channel_id = %channel))]
pub async fn get_wishlist(
    State(state): State<AppState>,
    RequireCustomer(customer): RequireCustomer,
    RequireSalesChannel(channel): RequireSalesChannel,
) -> Result<Json<WishlistContents>> {
    let contents = state
        .wishlists()
        .get_wishlist(&customer.customer_id, &channel)
        .await?;

    Ok(Json(contents))
}

/// `POST /store/wishlist` with `{"variant_id": ...}`
#[instrument(skip_all, fields(customer_id = %customer.customer_id, sales_channel_id = %channel))]
pub async fn add_item(
    State(state): State<AppState>,
    RequireCustomer(customer): RequireCustomer,
    RequireSalesChannel(channel): RequireSalesChannel,
    payload: std::result::Result<Json<AddItemRequest>, JsonRejection>,
) -> Result<Json<WishlistResponse>> {
    let Json(request) = payload.map_err(|e| WishlistError::InvalidInput(e.body_text()))?;
    let variant_id = parse_variant_id(request.variant_id.as_deref().unwrap_or_default())?;

    let wishlist = state
        .wishlists()
        .add_item(&variant_id, &customer.customer_id, &channel)
        .await?;

    Ok(Json(WishlistResponse { wishlist }))
}

/// `DELETE /store/wishlist/{item_id}`
#[instrument(skip_all, fields(customer_id = %customer.customer_id, item_id = %item_id))]
pub async fn remove_item(
    State(state): State<AppState>,
    RequireCustomer(customer): RequireCustomer,
    Path(item_id): Path<String>,
) -> Result<Json<WishlistResponse>> {
    let item_id = WishlistItemId::parse(&item_id)
        .map_err(|_| WishlistError::item_not_found())?;

    let wishlist = state
        .wishlists()
        .remove_item(&item_id, &customer.customer_id)
        .await?;

    Ok(Json(WishlistResponse { wishlist }))
}

/// `GET /store/wishlist/variant-counts?variant_ids=a,b`
///
/// Public: counts are aggregate and carry no customer data.
#[instrument(skip_all)]
pub async fn variant_counts(
    State(state): State<AppState>,
    Query(query): Query<VariantCountsQuery>,
) -> Result<Json<VariantCountsResponse>> {
    let variant_ids = parse_variant_list(query.variant_ids.as_deref().unwrap_or_default())?;

    let counts = state.wishlists().count_items_by_variant(&variant_ids).await?;

    Ok(Json(counts.into()))
}

fn parse_variant_id(raw: &str) -> Result<VariantId> {
    VariantId::parse(raw).map_err(|e| match e {
        IdError::Empty => WishlistError::InvalidInput("variant_id is required".to_string()).into(),
        IdError::TooLong { .. } => {
            WishlistError::InvalidInput(format!("Invalid variant_id: {e}")).into()
        }
    })
}

/// Split a comma-separated list, skipping blanks and duplicates.
fn parse_variant_list(raw: &str) -> Result<BTreeSet<VariantId>> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(parse_variant_id)
        .collect()
}
