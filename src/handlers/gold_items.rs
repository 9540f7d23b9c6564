use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use rust_decimal_macros::dec;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::handlers::gold_price::DEFAULT_PRICE_PER_OZ;
use crate::models::{ApiResponse, CreateGoldItemRequest, GoldItem, ValuationRequest};
use crate::storage::{NewGoldItem, Storage};
use crate::valuation::{compute_valuation, Valuation, RECOGNIZED_PURITIES};

pub async fn create_gold_item(
    State(storage): State<Arc<dyn Storage>>,
    Json(request): Json<CreateGoldItemRequest>,
) -> ApiResult<Json<ApiResponse<GoldItem>>> {
    request.validate()?;

    if request.weight_grams <= dec!(0) {
        return Err(ApiError::Validation(
            "Weight must be positive".to_string(),
        ));
    }
    if !RECOGNIZED_PURITIES.contains(&request.purity) {
        return Err(ApiError::Validation(format!(
            "Unrecognized purity {}K",
            request.purity
        )));
    }
    if request.estimated_value <= dec!(0) {
        return Err(ApiError::Validation(
            "Estimated value must be positive".to_string(),
        ));
    }

    let item = storage
        .create_gold_item(NewGoldItem {
            item_type: request.item_type,
            weight_grams: request.weight_grams,
            purity: request.purity,
            description: request.description,
            estimated_value: request.estimated_value,
        })
        .await?;

    Ok(Json(ApiResponse::ok(item)))
}

pub async fn get_gold_item(
    State(storage): State<Arc<dyn Storage>>,
    Path(id): Path<i32>,
) -> ApiResult<Json<ApiResponse<GoldItem>>> {
    let item = storage.get_gold_item(id).await?;
    Ok(Json(ApiResponse::ok(item)))
}

pub async fn list_gold_items(
    State(storage): State<Arc<dyn Storage>>,
) -> ApiResult<Json<ApiResponse<Vec<GoldItem>>>> {
    let items = storage.list_gold_items().await?;
    Ok(Json(ApiResponse::ok(items)))
}

/// Value a hypothetical item against the latest market price (or an
/// explicit price supplied by the caller).
pub async fn compute_gold_valuation(
    State(storage): State<Arc<dyn Storage>>,
    Json(request): Json<ValuationRequest>,
) -> ApiResult<Json<ApiResponse<Valuation>>> {
    let price = match request.price_per_oz {
        Some(price) => price,
        None => storage
            .latest_gold_price()
            .await?
            .map(|q| q.price_per_oz)
            .unwrap_or(DEFAULT_PRICE_PER_OZ),
    };

    let valuation = compute_valuation(
        request.weight_grams,
        request.purity,
        price,
        request.financing_ratio,
    )?;
    Ok(Json(ApiResponse::ok(valuation)))
}
