use axum::extract::{Json, State};
use axum::http::StatusCode;

use super::models::{Shop, ShopFilter, ShopPayload};
use super::store::PgShops;
use crate::store::{StoreError, Table};
use crate::utils::response::ApiResponse;
use crate::utils::types::Pool;
use crate::utils::{internal_error, types};

/// Looks a shop up by its canonical `osm_id` and inserts it on a miss.
///
/// On a hit, stored-null legacy columns are filled from the incoming shop;
/// the merge is only returned, never written back. `osm_id` is never
/// backfilled.
pub async fn get_or_create<S>(shops: &S, shop: Shop) -> Result<Shop, StoreError>
where
    S: Table<Id = i32, Record = Shop, NewRecord = Shop, Filter = ShopFilter>,
{
    let found = shops
        .read_many(&ShopFilter::OsmId(shop.osm_id.clone()), 1)
        .await?;
    tracing::info!("shop lookup for {}: {} match(es)", shop.osm_id, found.len());

    if let Some(mut existing) = found.into_iter().next() {
        if existing.country_code.is_none() {
            existing.country_code = shop.country_code;
        }
        if existing.company_id.is_none() {
            existing.company_id = shop.company_id;
        }
        if existing.address.is_none() {
            existing.address = shop.address;
        }
        if existing.osm_data.is_none() {
            existing.osm_data = shop.osm_data;
        }
        return Ok(existing);
    }

    let id = shops.create_one(shop.clone()).await?;
    tracing::info!("created shop {} for {}", id, shop.osm_id);

    let mut created = shop;
    created.id = Some(id);
    Ok(created)
}

pub async fn get_or_create_shop(
    State(pool): State<Pool>,
    Json(payload): Json<ShopPayload>,
) -> types::Result<ApiResponse<Shop>> {
    let shop =
        Shop::try_from(payload).map_err(|reason| (StatusCode::UNPROCESSABLE_ENTITY, reason))?;
    tracing::info!("Get or create shop request: {}", shop.osm_id);

    let shops = PgShops::new(pool);
    let shop = get_or_create(&shops, shop).await.map_err(internal_error)?;

    Ok(Json(ApiResponse::ok(
        "Shop retrieved or created successfully",
        shop,
    )))
}
