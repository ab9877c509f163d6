use crate::domain::{
    ACTIVE_LABEL, Brand, Lot, LotDraft, LotId, LotUpdate, LotsPage, Model, NewLot, SOLD_LABEL,
    UserId, Viewer,
};
use crate::error::LotsError;
use crate::filter::LotFilters;
use crate::query::{
    CountRow, LotRow, PagedLotRow, Pagination, count_query, decode_lots, decode_page,
    liked_lots_query, lot_by_id_query, page_query, seller_lots_query,
};
use async_trait::async_trait;
use common::persistence::PgPool;
use common::persistence::models::lots as orm;
use common::persistence::schema::{brands, cars, liked_lots, models, sell_lots};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::{
    ExpressionMethods, OptionalExtension, PgTextExpressionMethods, QueryDsl, SelectableHelper,
};
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use futures::StreamExt;
use tracing::{debug, instrument, warn};

/// Persistence boundary of the lots catalogue.
#[async_trait]
pub trait LotsRepository: Send + Sync {
    async fn lots_count(&self) -> Result<i64, LotsError>;

    async fn lots_by_params_count(&self, filters: &LotFilters) -> Result<i64, LotsError>;

    async fn lots_by_params(
        &self,
        viewer: Viewer,
        filters: &LotFilters,
        pagination: Pagination,
    ) -> Result<LotsPage, LotsError>;

    async fn lot_by_id(&self, viewer: Viewer, lot_id: LotId) -> Result<Option<Lot>, LotsError>;

    async fn brands(&self) -> Result<Vec<Brand>, LotsError>;

    /// Every model when `brand_name` is `None`, otherwise the models of the
    /// brand matched case-insensitively.
    async fn models(&self, brand_name: Option<&str>) -> Result<Vec<Model>, LotsError>;

    async fn user_posted_lots(&self, user_id: UserId) -> Result<Vec<Lot>, LotsError>;

    async fn user_liked_lots(&self, user_id: UserId) -> Result<Vec<Lot>, LotsError>;

    /// Resolves brand and model, then inserts the car and the active lot
    /// atomically.
    async fn create_lot(&self, new_lot: &NewLot) -> Result<LotId, LotsError>;

    /// Overwrites the car and the mutable lot attributes atomically. The
    /// seller and the sale status are never touched.
    async fn update_lot(&self, update: &LotUpdate) -> Result<(), LotsError>;

    /// Removes the lot and its car atomically, likes go with the lot.
    async fn delete_lot(&self, lot_id: LotId) -> Result<(), LotsError>;

    async fn like_lot(&self, user_id: UserId, lot_id: LotId) -> Result<(), LotsError>;

    async fn unlike_lot(&self, user_id: UserId, lot_id: LotId) -> Result<(), LotsError>;

    /// Returns `false` when the lot does not exist or was already sold.
    async fn mark_lot_as_sold(&self, lot_id: LotId) -> Result<bool, LotsError>;
}

#[derive(Clone)]
pub struct PgLotsRepository {
    pool: PgPool,
}

impl PgLotsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn resolve_brand(conn: &mut AsyncPgConnection, brand: &str) -> Result<i32, LotsError> {
    brands::table
        .filter(brands::brand_name.eq(brand))
        .select(brands::brand_id)
        .first::<i32>(conn)
        .await
        .optional()?
        .ok_or_else(|| LotsError::UnknownBrand(brand.to_string()))
}

async fn resolve_model(
    conn: &mut AsyncPgConnection,
    brand_id: i32,
    draft: &LotDraft,
) -> Result<i32, LotsError> {
    models::table
        .filter(models::brand_id.eq(brand_id))
        .filter(models::model_name.eq(&draft.model))
        .select(models::model_id)
        .first::<i32>(conn)
        .await
        .optional()?
        .ok_or_else(|| LotsError::UnknownModel {
            brand: draft.brand.clone(),
            model: draft.model.clone(),
        })
}

fn car_record(draft: &LotDraft, brand_id: i32, model_id: i32) -> orm::CarRecord<'_> {
    orm::CarRecord {
        brand_id,
        model_id,
        made_year: draft.made_year,
        engine_type: &draft.engine,
        transmission: &draft.transmission,
        wheel_drive: &draft.wheel_drive,
    }
}

fn single_lot(row: LotRow) -> Result<Lot, LotsError> {
    Lot::try_from(row).map_err(|e| DieselError::DeserializationError(Box::new(e)).into())
}

#[async_trait]
impl LotsRepository for PgLotsRepository {
    #[instrument(skip_all)]
    async fn lots_count(&self) -> Result<i64, LotsError> {
        let mut conn = self.pool.get().await?;
        Ok(sell_lots::table
            .count()
            .get_result::<i64>(&mut conn)
            .await?)
    }

    #[instrument(skip_all)]
    async fn lots_by_params_count(&self, filters: &LotFilters) -> Result<i64, LotsError> {
        let query = count_query(filters)?;
        let mut conn = self.pool.get().await?;
        let row = query
            .into_boxed()
            .get_result::<CountRow>(&mut conn)
            .await?;
        Ok(row.count)
    }

    #[instrument(skip(self, filters))]
    async fn lots_by_params(
        &self,
        viewer: Viewer,
        filters: &LotFilters,
        pagination: Pagination,
    ) -> Result<LotsPage, LotsError> {
        let query = page_query(viewer, filters, pagination)?;
        let mut conn = self.pool.get().await?;
        let rows = query
            .into_boxed()
            .load_stream::<PagedLotRow>(&mut conn)
            .await?
            .collect::<Vec<_>>()
            .await;
        let page = decode_page(rows);

        let total = match page.total {
            Some(total) => total,
            // past the last page, or every row failed to decode
            None if pagination.offset() > 0 || page.skipped > 0 => {
                let row = count_query(filters)?
                    .into_boxed()
                    .get_result::<CountRow>(&mut conn)
                    .await?;
                row.count
            }
            None => 0,
        };
        debug!("loaded `{}` lots of `{total}`", page.lots.len());

        Ok(LotsPage {
            lots: page.lots,
            total,
        })
    }

    #[instrument(skip(self))]
    async fn lot_by_id(&self, viewer: Viewer, lot_id: LotId) -> Result<Option<Lot>, LotsError> {
        let mut conn = self.pool.get().await?;
        lot_by_id_query(viewer, lot_id)
            .into_boxed()
            .get_result::<LotRow>(&mut conn)
            .await
            .optional()?
            .map(single_lot)
            .transpose()
    }

    #[instrument(skip_all)]
    async fn brands(&self) -> Result<Vec<Brand>, LotsError> {
        let mut conn = self.pool.get().await?;
        let brands = brands::table
            .select(orm::Brand::as_select())
            .order(brands::brand_name.asc())
            .load::<orm::Brand>(&mut conn)
            .await?;
        Ok(brands
            .into_iter()
            .map(|b| Brand {
                brand_id: b.brand_id,
                brand_name: b.brand_name,
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn models(&self, brand_name: Option<&str>) -> Result<Vec<Model>, LotsError> {
        let mut conn = self.pool.get().await?;
        let mut query = models::table
            .inner_join(brands::table)
            .select(orm::Model::as_select())
            .order(models::model_name.asc())
            .into_boxed();
        if let Some(brand_name) = brand_name {
            query = query.filter(brands::brand_name.ilike(brand_name));
        }
        let models = query.load::<orm::Model>(&mut conn).await?;
        Ok(models
            .into_iter()
            .map(|m| Model {
                model_id: m.model_id,
                brand_id: m.brand_id,
                model_name: m.model_name,
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn user_posted_lots(&self, user_id: UserId) -> Result<Vec<Lot>, LotsError> {
        let mut conn = self.pool.get().await?;
        let rows = seller_lots_query(user_id)
            .into_boxed()
            .load_stream::<LotRow>(&mut conn)
            .await?
            .collect::<Vec<_>>()
            .await;
        Ok(decode_lots(rows))
    }

    #[instrument(skip(self))]
    async fn user_liked_lots(&self, user_id: UserId) -> Result<Vec<Lot>, LotsError> {
        let mut conn = self.pool.get().await?;
        let rows = liked_lots_query(user_id)
            .into_boxed()
            .load_stream::<LotRow>(&mut conn)
            .await?
            .collect::<Vec<_>>()
            .await;
        Ok(decode_lots(rows))
    }

    #[instrument(skip_all, fields(seller_id = new_lot.seller_id))]
    async fn create_lot(&self, new_lot: &NewLot) -> Result<LotId, LotsError> {
        let mut conn = self.pool.get().await?;
        conn.transaction::<_, LotsError, _>(|conn| {
            async move {
                let draft = &new_lot.draft;
                let brand_id = resolve_brand(conn, &draft.brand).await?;
                let model_id = resolve_model(conn, brand_id, draft).await?;

                let car_id = diesel::insert_into(cars::table)
                    .values(&car_record(draft, brand_id, model_id))
                    .returning(cars::car_id)
                    .get_result::<i32>(conn)
                    .await?;
                let lot_id = diesel::insert_into(sell_lots::table)
                    .values(&orm::NewSellLot {
                        seller_id: new_lot.seller_id,
                        car_id,
                        sale_price: draft.sale_price,
                        sale_status: ACTIVE_LABEL,
                        vin_code: &draft.vin_code,
                        mileage: draft.mileage,
                        color: &draft.color,
                        description: &draft.description,
                        images_paths: Some(new_lot.images.as_slice()),
                    })
                    .returning(sell_lots::lot_id)
                    .get_result::<i32>(conn)
                    .await?;
                debug!("inserted lot `{lot_id}` with car `{car_id}`");
                Ok(lot_id)
            }
            .scope_boxed()
        })
        .await
    }

    #[instrument(skip_all, fields(lot_id = update.lot_id))]
    async fn update_lot(&self, update: &LotUpdate) -> Result<(), LotsError> {
        let mut conn = self.pool.get().await?;
        conn.transaction::<_, LotsError, _>(|conn| {
            async move {
                let draft = &update.draft;
                let brand_id = resolve_brand(conn, &draft.brand).await?;
                let model_id = resolve_model(conn, brand_id, draft).await?;

                diesel::update(cars::table.find(update.car_id))
                    .set(&car_record(draft, brand_id, model_id))
                    .execute(conn)
                    .await?;
                let updated = diesel::update(sell_lots::table.find(update.lot_id))
                    .set(&orm::SellLotChangeset {
                        sale_price: draft.sale_price,
                        vin_code: &draft.vin_code,
                        mileage: draft.mileage,
                        color: &draft.color,
                        description: &draft.description,
                        images_paths: Some(update.images.as_slice()),
                    })
                    .execute(conn)
                    .await?;
                if updated == 0 {
                    return Err(LotsError::LotNotFound(update.lot_id));
                }
                Ok(())
            }
            .scope_boxed()
        })
        .await
    }

    #[instrument(skip(self))]
    async fn delete_lot(&self, lot_id: LotId) -> Result<(), LotsError> {
        let mut conn = self.pool.get().await?;
        conn.transaction::<_, LotsError, _>(|conn| {
            async move {
                let car_id = diesel::delete(sell_lots::table.find(lot_id))
                    .returning(sell_lots::car_id)
                    .get_result::<i32>(conn)
                    .await
                    .optional()?
                    .ok_or(LotsError::LotNotFound(lot_id))?;
                diesel::delete(cars::table.find(car_id))
                    .execute(conn)
                    .await?;
                debug!("deleted lot `{lot_id}` with car `{car_id}`");
                Ok(())
            }
            .scope_boxed()
        })
        .await
    }

    #[instrument(skip(self))]
    async fn like_lot(&self, user_id: UserId, lot_id: LotId) -> Result<(), LotsError> {
        let mut conn = self.pool.get().await?;
        diesel::insert_into(liked_lots::table)
            .values(&orm::LikedLot { user_id, lot_id })
            .on_conflict_do_nothing()
            .execute(&mut conn)
            .await
            .map_err(|e| match e {
                DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                    LotsError::LotNotFound(lot_id)
                }
                e => e.into(),
            })?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn unlike_lot(&self, user_id: UserId, lot_id: LotId) -> Result<(), LotsError> {
        let mut conn = self.pool.get().await?;
        diesel::delete(
            liked_lots::table
                .filter(liked_lots::user_id.eq(user_id))
                .filter(liked_lots::lot_id.eq(lot_id)),
        )
        .execute(&mut conn)
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn mark_lot_as_sold(&self, lot_id: LotId) -> Result<bool, LotsError> {
        let mut conn = self.pool.get().await?;
        let updated = diesel::update(
            sell_lots::table
                .filter(sell_lots::lot_id.eq(lot_id))
                .filter(sell_lots::sale_status.ne(SOLD_LABEL)),
        )
        .set(sell_lots::sale_status.eq(SOLD_LABEL))
        .execute(&mut conn)
        .await?;
        if updated == 0 {
            warn!("lot `{lot_id}` was not marked as sold");
        }
        Ok(updated > 0)
    }
}
