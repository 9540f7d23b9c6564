use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::{ApiError, ApiResult};
use crate::models::{ApiResponse, CreateGoldPriceRequest, DaysQuery, GoldPriceQuote};
use crate::storage::{NewGoldPrice, Storage};

/// Fallback market price (MYR per troy ounce) used until a real quote is
/// recorded.
pub const DEFAULT_PRICE_PER_OZ: Decimal = dec!(8889.25);

/// Default look-back for the price history query, in days
const DEFAULT_HISTORY_DAYS: i64 = 30;

/// Latest market quote. An empty series is seeded with the default price so
/// valuation always has something to work from.
pub async fn get_gold_price(
    State(storage): State<Arc<dyn Storage>>,
) -> ApiResult<Json<ApiResponse<GoldPriceQuote>>> {
    let quote = match storage.latest_gold_price().await? {
        Some(quote) => quote,
        None => {
            storage
                .create_gold_price(NewGoldPrice {
                    price_per_oz: DEFAULT_PRICE_PER_OZ,
                    quoted_at: Utc::now(),
                })
                .await?
        }
    };
    Ok(Json(ApiResponse::ok(quote)))
}

pub async fn create_gold_price(
    State(storage): State<Arc<dyn Storage>>,
    Json(request): Json<CreateGoldPriceRequest>,
) -> ApiResult<Json<ApiResponse<GoldPriceQuote>>> {
    if request.price_per_oz <= Decimal::ZERO {
        return Err(ApiError::Validation(
            "Price per ounce must be positive".to_string(),
        ));
    }
    let quote = storage
        .create_gold_price(NewGoldPrice {
            price_per_oz: request.price_per_oz,
            quoted_at: request.quoted_at,
        })
        .await?;
    Ok(Json(ApiResponse::ok(quote)))
}

pub async fn gold_price_history(
    State(storage): State<Arc<dyn Storage>>,
    Query(query): Query<DaysQuery>,
) -> ApiResult<Json<ApiResponse<Vec<GoldPriceQuote>>>> {
    let days = query.days.unwrap_or(DEFAULT_HISTORY_DAYS);
    if days < 0 {
        return Err(ApiError::Validation(
            "Day window cannot be negative".to_string(),
        ));
    }
    let quotes = storage.gold_price_history(days).await?;
    Ok(Json(ApiResponse::ok(quotes)))
}
