use crate::domain::{
    Brand, Lot, LotDraft, LotId, LotUpdate, LotsPage, Model, NewLot, SaleStatus, UserId, Viewer,
};
use crate::error::LotsError;
use crate::filter::LotFilters;
use crate::images::{ImageChanges, ImageCoordinator};
use crate::query::Pagination;
use crate::repository::LotsRepository;
use crate::storage::{ImageFile, ImageStorageExt};
use tracing::{info, instrument, warn};

/// Entry point of the lots core. Owns the ordering between ownership checks,
/// image storage calls and database writes.
pub struct LotsService<R, S> {
    repository: R,
    images: ImageCoordinator<S>,
}

impl<R, S> LotsService<R, S>
where
    R: LotsRepository,
    S: ImageStorageExt,
{
    pub fn new(repository: R, images: ImageCoordinator<S>) -> Self {
        Self { repository, images }
    }

    pub async fn lots_count(&self) -> Result<i64, LotsError> {
        self.repository.lots_count().await
    }

    pub async fn lots_by_params_count(&self, filters: &LotFilters) -> Result<i64, LotsError> {
        self.repository.lots_by_params_count(filters).await
    }

    pub async fn lots_by_params(
        &self,
        viewer: Viewer,
        filters: &LotFilters,
        pagination: Pagination,
    ) -> Result<LotsPage, LotsError> {
        self.repository
            .lots_by_params(viewer, filters, pagination)
            .await
    }

    pub async fn lot_by_id(&self, viewer: Viewer, lot_id: LotId) -> Result<Lot, LotsError> {
        self.repository
            .lot_by_id(viewer, lot_id)
            .await?
            .ok_or(LotsError::LotNotFound(lot_id))
    }

    pub async fn brands(&self) -> Result<Vec<Brand>, LotsError> {
        self.repository.brands().await
    }

    /// An empty or single space brand lists every model.
    pub async fn models(&self, brand: &str) -> Result<Vec<Model>, LotsError> {
        let brand = match brand {
            "" | " " => None,
            brand => Some(brand),
        };
        self.repository.models(brand).await
    }

    pub async fn user_posted_lots(&self, user_id: UserId) -> Result<Vec<Lot>, LotsError> {
        self.repository.user_posted_lots(user_id).await
    }

    pub async fn user_liked_lots(&self, user_id: UserId) -> Result<Vec<Lot>, LotsError> {
        self.repository.user_liked_lots(user_id).await
    }

    #[instrument(skip(self, draft, files), fields(n_files = files.len()))]
    pub async fn create_lot(
        &self,
        seller_id: UserId,
        draft: LotDraft,
        files: Vec<ImageFile>,
    ) -> Result<LotId, LotsError> {
        let images = self.images.store(files).await?;
        let lot_id = self
            .repository
            .create_lot(&NewLot {
                seller_id,
                draft,
                images,
            })
            .await?;
        info!("created lot `{lot_id}`");
        Ok(lot_id)
    }

    #[instrument(skip(self, draft, changes))]
    pub async fn update_lot(
        &self,
        user_id: UserId,
        lot_id: LotId,
        draft: LotDraft,
        changes: ImageChanges,
    ) -> Result<(), LotsError> {
        let lot = self.owned_lot(user_id, lot_id).await?;
        let images = self
            .images
            .reconcile(changes.restricted_to(&lot.images))
            .await?;
        self.repository
            .update_lot(&LotUpdate {
                lot_id,
                car_id: lot.car.car_id,
                draft,
                images,
            })
            .await?;
        info!("updated lot `{lot_id}`");
        Ok(())
    }

    /// The row deletion is final, a failed image cleanup is still returned.
    #[instrument(skip(self))]
    pub async fn delete_lot(&self, user_id: UserId, lot_id: LotId) -> Result<(), LotsError> {
        let lot = self.owned_lot(user_id, lot_id).await?;
        self.repository.delete_lot(lot_id).await?;
        info!("deleted lot `{lot_id}`");
        self.images.purge(&lot.images).await?;
        Ok(())
    }

    pub async fn like_lot(&self, user_id: UserId, lot_id: LotId) -> Result<(), LotsError> {
        self.repository.like_lot(user_id, lot_id).await
    }

    pub async fn unlike_lot(&self, user_id: UserId, lot_id: LotId) -> Result<(), LotsError> {
        self.repository.unlike_lot(user_id, lot_id).await
    }

    #[instrument(skip(self))]
    pub async fn buy_lot(&self, lot_id: LotId) -> Result<(), LotsError> {
        let lot = self.lot_by_id(Viewer::Anonymous, lot_id).await?;
        if lot.sale_status == SaleStatus::Sold {
            return Err(LotsError::AlreadySold(lot_id));
        }
        // a concurrent buyer may win between the read and the guarded update
        if !self.repository.mark_lot_as_sold(lot_id).await? {
            return Err(LotsError::AlreadySold(lot_id));
        }
        info!("lot `{lot_id}` sold");
        Ok(())
    }

    async fn owned_lot(&self, user_id: UserId, lot_id: LotId) -> Result<Lot, LotsError> {
        let lot = self.lot_by_id(Viewer::User(user_id), lot_id).await?;
        if lot.seller_id != user_id {
            warn!(
                lot_id,
                user_id,
                seller_id = lot.seller_id,
                "lot mutation rejected, not the seller"
            );
            return Err(LotsError::OwnershipMismatch { lot_id, user_id });
        }
        Ok(lot)
    }
}
