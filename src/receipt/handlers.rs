use axum::extract::{Json, Query, State};
use axum::http::StatusCode;

use super::models::{
    AddShopRequest, GetReceiptByIdQuery, GetReceiptByUrlRequest, Receipt, ReceiptPayload,
    ReceiptUrl,
};
use super::store::{PgReceiptUrls, PgReceipts};
use crate::shop::models::{Shop, ShopFilter, ShopItem, ShopItemFilter};
use crate::shop::store::{PgShopItems, PgShops};
use crate::store::{StoreError, Table};
use crate::utils::error::HandlerError;
use crate::utils::hash::make_hash;
use crate::utils::response::ApiResponse;
use crate::utils::types::Pool;
use crate::utils::{internal_error, types};

pub async fn get_by_id<R>(receipts: &R, receipt_id: &str) -> Result<Option<Receipt>, StoreError>
where
    R: Table<Id = String, Record = Receipt>,
{
    receipts.read_one(&receipt_id.to_owned()).await
}

/// Resolves a url to its receipt through the hashed url mapping. A miss at
/// either step is plain absence.
pub async fn get_by_url<U, R>(
    urls: &U,
    receipts: &R,
    url: &str,
) -> Result<Option<Receipt>, StoreError>
where
    U: Table<Id = String, Record = ReceiptUrl>,
    R: Table<Id = String, Record = Receipt>,
{
    tracing::info!("receipt url: {}", url);

    let Some(mapping) = urls.read_one(&make_hash(url)).await? else {
        return Ok(None);
    };

    tracing::info!("receipt id: {}", mapping.receipt_id);

    receipts.read_one(&mapping.receipt_id).await
}

/// Reconciles and stores a submitted receipt.
///
/// Order matters: the shop is resolved first, purchase lines are matched
/// against that shop's catalog, and only then is the receipt written, so the
/// stored row carries the resolved references. The receipt write is an
/// upsert; the url mappings are appended afterwards and none of it runs in a
/// transaction (a late failure can leave a stored receipt without mappings).
pub async fn get_or_create<S, I, R, U>(
    shops: &S,
    items: &I,
    receipts: &R,
    urls: &U,
    mut receipt: Receipt,
) -> Result<Receipt, StoreError>
where
    S: Table<Record = Shop, Filter = ShopFilter>,
    I: Table<Record = ShopItem, Filter = ShopItemFilter>,
    R: Table<Record = Receipt>,
    U: Table<Record = ReceiptUrl, NewRecord = ReceiptUrl>,
{
    let source = ShopFilter::Source {
        address: receipt.shop_address.clone(),
        company_id: receipt.company_id.clone(),
        country_code: receipt.country_code,
    };

    if let Some(shop) = shops.read_many(&source, 1).await?.into_iter().next() {
        receipt.shop_id = shop.id;

        if let Some(shop_id) = shop.id {
            for purchase in &mut receipt.purchases {
                let filter = ShopItemFilter {
                    name: purchase.name.clone(),
                    shop_id,
                };
                if let Some(item) = items.read_many(&filter, 1).await?.into_iter().next() {
                    purchase.item_id = Some(item.id);
                    purchase.status = item.status.unwrap_or_default();
                }
            }
        }
    }

    receipts.create_or_update_one(receipt.clone()).await?;

    urls.create_one(ReceiptUrl::new(&receipt.receipt_url, &receipt.id))
        .await?;

    if let Some(canonical) = &receipt.receipt_canonical_url {
        urls.create_one(ReceiptUrl::new(canonical, &receipt.id))
            .await?;
    }

    tracing::info!("stored receipt: {}", receipt.id);

    Ok(receipt)
}

/// Links a shop to an already stored receipt. A store that reports no row
/// updated is a failure, not a silent no-op.
pub async fn add_shop_id<R>(
    receipts: &R,
    shop_id: i32,
    mut receipt: Receipt,
) -> Result<Receipt, HandlerError>
where
    R: Table<Id = String, Record = Receipt, Patch = Receipt>,
{
    receipt.shop_id = Some(shop_id);

    let updated = receipts.update_one(&receipt.id, receipt.clone()).await?;
    if !updated {
        return Err(HandlerError::UpdateFailed(receipt.id));
    }

    Ok(receipt)
}

pub async fn get_receipt_by_id(
    State(pool): State<Pool>,
    Query(params): Query<GetReceiptByIdQuery>,
) -> types::Result<ApiResponse<Receipt>> {
    tracing::info!("Receipt ID: {}", params.receipt_id);

    let receipts = PgReceipts::new(pool);

    let receipt = get_by_id(&receipts, &params.receipt_id)
        .await
        .map_err(internal_error)?;

    let Some(receipt) = receipt else {
        return Err((StatusCode::NOT_FOUND, "Receipt not found".to_owned()));
    };

    Ok(Json(ApiResponse::ok(
        "Receipt retrieved successfully",
        receipt,
    )))
}

pub async fn get_or_create_receipt(
    State(pool): State<Pool>,
    Json(payload): Json<ReceiptPayload>,
) -> types::Result<ApiResponse<Receipt>> {
    tracing::info!("Receipt URL: {}", payload.receipt_url);

    let shops = PgShops::new(pool.clone());
    let items = PgShopItems::new(pool.clone());
    let receipts = PgReceipts::new(pool.clone());
    let urls = PgReceiptUrls::new(pool);

    let receipt = get_or_create(&shops, &items, &receipts, &urls, Receipt::from(payload))
        .await
        .map_err(internal_error)?;

    Ok(Json(ApiResponse::ok(
        "Receipt retrieved or created successfully",
        receipt,
    )))
}

pub async fn get_receipt_by_url(
    State(pool): State<Pool>,
    Json(payload): Json<GetReceiptByUrlRequest>,
) -> types::Result<ApiResponse<Receipt>> {
    tracing::info!("Receipt URL: {}", payload.url);

    let urls = PgReceiptUrls::new(pool.clone());
    let receipts = PgReceipts::new(pool);

    let receipt = get_by_url(&urls, &receipts, &payload.url)
        .await
        .map_err(internal_error)?;

    let Some(receipt) = receipt else {
        return Err((StatusCode::NOT_FOUND, "Receipt not found".to_owned()));
    };

    Ok(Json(ApiResponse::ok(
        "Receipt retrieved successfully",
        receipt,
    )))
}

pub async fn add_shop(
    State(pool): State<Pool>,
    Json(payload): Json<AddShopRequest>,
) -> types::Result<ApiResponse<Receipt>> {
    let receipts = PgReceipts::new(pool);

    let receipt = add_shop_id(&receipts, payload.shop_id, Receipt::from(payload.receipt))
        .await
        .map_err(internal_error)?;

    Ok(Json(ApiResponse::ok(
        "Shop linked to receipt successfully",
        receipt,
    )))
}
