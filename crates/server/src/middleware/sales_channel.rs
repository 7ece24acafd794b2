//! Sales channel extractor.
//!
//! Resolves the `x-publishable-api-key` header to the first sales channel
//! associated with the key.

use axum::{extract::FromRequestParts, http::request::Parts};

use wishlist_core::SalesChannelId;

use crate::error::AppError;
use crate::services::WishlistError;
use crate::state::AppState;

/// The HTTP header carrying the publishable API key.
pub const PUBLISHABLE_KEY_HEADER: &str = "x-publishable-api-key";

const MISSING_SALES_CHANNEL: &str = "At least one sales channel ID is required to be associated with the publishable API key in the request header.";

/// Extractor that requires a sales channel for the request.
///
/// Rejects with 400 if the header is missing or the key has no channels.
pub struct RequireSalesChannel(pub SalesChannelId);

impl FromRequestParts<AppState> for RequireSalesChannel {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let key = parts
            .headers
            .get(PUBLISHABLE_KEY_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(missing_sales_channel)?;

        let channels = state.channels().resolve(key).await?;

        channels
            .into_iter()
            .next()
            .map(Self)
            .ok_or_else(missing_sales_channel)
    }
}

fn missing_sales_channel() -> AppError {
    WishlistError::InvalidInput(MISSING_SALES_CHANNEL.to_string()).into()
}
