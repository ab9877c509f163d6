//! In-memory doubles of the store and the image storage service.

use crate::domain::{
    Brand, Car, Lot, LotDraft, LotId, LotUpdate, LotsPage, Model, NewLot, SaleStatus, UserId,
    Viewer,
};
use crate::error::LotsError;
use crate::filter::{LotFilters, build_predicate};
use crate::query::Pagination;
use crate::repository::LotsRepository;
use crate::storage::{ImageFile, ImageStorageExt, StorageError};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

pub(crate) fn image(name: &str) -> ImageFile {
    ImageFile {
        filename: name.to_string(),
        content: Bytes::from_static(b"fake image"),
    }
}

pub(crate) fn draft(brand: &str, model: &str) -> LotDraft {
    LotDraft {
        brand: brand.to_string(),
        model: model.to_string(),
        engine: "petrol".to_string(),
        transmission: "manual".to_string(),
        wheel_drive: "fwd".to_string(),
        made_year: 2012,
        vin_code: "WVWZZZ1KZCW000001".to_string(),
        color: "white".to_string(),
        mileage: 90000,
        sale_price: 8500,
        description: "garage kept".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StorageCall {
    Upload(Vec<String>),
    Delete(Vec<String>),
}

#[derive(Clone, Default)]
pub(crate) struct RecordingStorage {
    calls: Arc<Mutex<Vec<StorageCall>>>,
    fail_uploads: bool,
    fail_deletes: bool,
}

impl RecordingStorage {
    pub(crate) fn failing_uploads() -> Self {
        Self {
            fail_uploads: true,
            ..Default::default()
        }
    }

    pub(crate) fn failing_deletes() -> Self {
        Self {
            fail_deletes: true,
            ..Default::default()
        }
    }

    pub(crate) fn calls(&self) -> Vec<StorageCall> {
        self.calls.lock().unwrap().clone()
    }

    fn rejected() -> StorageError {
        StorageError::UnexpectedStatus {
            status: 500,
            body: "storage unavailable".to_string(),
        }
    }
}

#[async_trait]
impl ImageStorageExt for RecordingStorage {
    async fn upload_images(&self, files: Vec<ImageFile>) -> Result<(), StorageError> {
        let names = files.into_iter().map(|f| f.filename).collect();
        self.calls.lock().unwrap().push(StorageCall::Upload(names));
        if self.fail_uploads {
            return Err(Self::rejected());
        }
        Ok(())
    }

    async fn delete_images(&self, filenames: &[String]) -> Result<(), StorageError> {
        self.calls
            .lock()
            .unwrap()
            .push(StorageCall::Delete(filenames.to_vec()));
        if self.fail_deletes {
            return Err(Self::rejected());
        }
        Ok(())
    }
}

#[derive(Default)]
struct State {
    brands: Vec<Brand>,
    models: Vec<Model>,
    lots: BTreeMap<LotId, Lot>,
    likes: HashSet<(UserId, LotId)>,
    next_id: i32,
}

impl State {
    fn resolve(&self, draft: &LotDraft) -> Result<(i32, i32), LotsError> {
        let brand = self
            .brands
            .iter()
            .find(|b| b.brand_name == draft.brand)
            .ok_or_else(|| LotsError::UnknownBrand(draft.brand.clone()))?;
        let model = self
            .models
            .iter()
            .find(|m| m.brand_id == brand.brand_id && m.model_name == draft.model)
            .ok_or_else(|| LotsError::UnknownModel {
                brand: draft.brand.clone(),
                model: draft.model.clone(),
            })?;
        Ok((brand.brand_id, model.model_id))
    }

    fn view(&self, lot: &Lot, viewer: Viewer) -> Lot {
        let mut lot = lot.clone();
        lot.is_liked = viewer
            .user_id()
            .is_some_and(|user_id| self.likes.contains(&(user_id, lot.lot_id)));
        lot
    }

    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

fn car(draft: &LotDraft, car_id: i32, brand_id: i32, model_id: i32) -> Car {
    Car {
        car_id,
        brand_id,
        model_id,
        brand: draft.brand.clone(),
        model: draft.model.clone(),
        engine: draft.engine.clone(),
        transmission: draft.transmission.clone(),
        wheel_drive: draft.wheel_drive.clone(),
        made_year: draft.made_year,
        vin_code: draft.vin_code.clone(),
        color: draft.color.clone(),
        mileage: draft.mileage,
    }
}

fn bound(value: &str, zero_is_unbounded: bool) -> Option<i32> {
    if value.is_empty() || (zero_is_unbounded && value == "0") {
        return None;
    }
    value.trim().parse().ok()
}

fn matches(filters: &LotFilters, lot: &Lot) -> bool {
    (filters.brand.is_empty() || filters.brand == lot.car.brand)
        && (filters.model.is_empty() || filters.model == lot.car.model)
        && bound(&filters.min_price, false).is_none_or(|min| lot.sale_price >= min)
        && bound(&filters.max_price, true).is_none_or(|max| lot.sale_price <= max)
        && bound(&filters.min_year, true).is_none_or(|min| lot.car.made_year >= min)
        && bound(&filters.max_year, true).is_none_or(|max| lot.car.made_year <= max)
}

/// Catalogue kept in memory, mirrors the store's ordering and referential
/// rules.
#[derive(Clone, Default)]
pub(crate) struct InMemoryLots {
    state: Arc<Mutex<State>>,
}

impl InMemoryLots {
    /// Toyota (Camry, Corolla) and BMW (X5).
    pub(crate) fn seeded() -> Self {
        let repository = Self::default();
        {
            let mut state = repository.state.lock().unwrap();
            state.brands = vec![
                Brand {
                    brand_id: 1,
                    brand_name: "Toyota".to_string(),
                },
                Brand {
                    brand_id: 2,
                    brand_name: "BMW".to_string(),
                },
            ];
            state.models = vec![
                Model {
                    model_id: 1,
                    brand_id: 1,
                    model_name: "Camry".to_string(),
                },
                Model {
                    model_id: 2,
                    brand_id: 1,
                    model_name: "Corolla".to_string(),
                },
                Model {
                    model_id: 3,
                    brand_id: 2,
                    model_name: "X5".to_string(),
                },
            ];
        }
        repository
    }

    pub(crate) fn lot(&self, lot_id: LotId) -> Option<Lot> {
        self.state.lock().unwrap().lots.get(&lot_id).cloned()
    }

    pub(crate) fn lots_len(&self) -> usize {
        self.state.lock().unwrap().lots.len()
    }

    pub(crate) fn likes_len(&self) -> usize {
        self.state.lock().unwrap().likes.len()
    }

    pub(crate) fn set_post_date(&self, lot_id: LotId, post_date: NaiveDate) {
        if let Some(lot) = self.state.lock().unwrap().lots.get_mut(&lot_id) {
            lot.post_date = post_date;
        }
    }
}

#[async_trait]
impl LotsRepository for InMemoryLots {
    async fn lots_count(&self) -> Result<i64, LotsError> {
        Ok(self.state.lock().unwrap().lots.len() as i64)
    }

    async fn lots_by_params_count(&self, filters: &LotFilters) -> Result<i64, LotsError> {
        build_predicate(filters, 1)?;
        let state = self.state.lock().unwrap();
        Ok(state.lots.values().filter(|l| matches(filters, l)).count() as i64)
    }

    async fn lots_by_params(
        &self,
        viewer: Viewer,
        filters: &LotFilters,
        pagination: Pagination,
    ) -> Result<LotsPage, LotsError> {
        build_predicate(filters, 1)?;
        let state = self.state.lock().unwrap();
        let mut matching = state
            .lots
            .values()
            .filter(|l| matches(filters, l))
            .collect::<Vec<_>>();
        matching.sort_by(|a, b| (b.post_date, b.lot_id).cmp(&(a.post_date, a.lot_id)));
        Ok(LotsPage {
            total: matching.len() as i64,
            lots: matching
                .into_iter()
                .skip(pagination.offset() as usize)
                .take(pagination.size() as usize)
                .map(|l| state.view(l, viewer))
                .collect(),
        })
    }

    async fn lot_by_id(&self, viewer: Viewer, lot_id: LotId) -> Result<Option<Lot>, LotsError> {
        let state = self.state.lock().unwrap();
        Ok(state.lots.get(&lot_id).map(|l| state.view(l, viewer)))
    }

    async fn brands(&self) -> Result<Vec<Brand>, LotsError> {
        Ok(self.state.lock().unwrap().brands.clone())
    }

    async fn models(&self, brand_name: Option<&str>) -> Result<Vec<Model>, LotsError> {
        let state = self.state.lock().unwrap();
        let brand_ids = state
            .brands
            .iter()
            .filter(|b| brand_name.is_none_or(|name| b.brand_name.eq_ignore_ascii_case(name)))
            .map(|b| b.brand_id)
            .collect::<HashSet<_>>();
        Ok(state
            .models
            .iter()
            .filter(|m| brand_ids.contains(&m.brand_id))
            .cloned()
            .collect())
    }

    async fn user_posted_lots(&self, user_id: UserId) -> Result<Vec<Lot>, LotsError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .lots
            .values()
            .filter(|l| l.seller_id == user_id)
            .map(|l| state.view(l, Viewer::User(user_id)))
            .collect())
    }

    async fn user_liked_lots(&self, user_id: UserId) -> Result<Vec<Lot>, LotsError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .lots
            .values()
            .filter(|l| state.likes.contains(&(user_id, l.lot_id)))
            .map(|l| state.view(l, Viewer::User(user_id)))
            .collect())
    }

    async fn create_lot(&self, new_lot: &NewLot) -> Result<LotId, LotsError> {
        let mut state = self.state.lock().unwrap();
        let (brand_id, model_id) = state.resolve(&new_lot.draft)?;
        let lot_id = state.next_id();
        let draft = &new_lot.draft;
        let lot = Lot {
            lot_id,
            seller_id: new_lot.seller_id,
            car: car(draft, lot_id + 1000, brand_id, model_id),
            post_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            sale_price: draft.sale_price,
            sale_status: SaleStatus::Active,
            description: draft.description.clone(),
            images: new_lot.images.clone(),
            is_liked: false,
        };
        state.lots.insert(lot_id, lot);
        Ok(lot_id)
    }

    async fn update_lot(&self, update: &LotUpdate) -> Result<(), LotsError> {
        let mut state = self.state.lock().unwrap();
        let (brand_id, model_id) = state.resolve(&update.draft)?;
        let lot = state
            .lots
            .get_mut(&update.lot_id)
            .ok_or(LotsError::LotNotFound(update.lot_id))?;
        let draft = &update.draft;
        lot.car = car(draft, update.car_id, brand_id, model_id);
        lot.sale_price = draft.sale_price;
        lot.description = draft.description.clone();
        lot.images = update.images.clone();
        Ok(())
    }

    async fn delete_lot(&self, lot_id: LotId) -> Result<(), LotsError> {
        let mut state = self.state.lock().unwrap();
        state
            .lots
            .remove(&lot_id)
            .ok_or(LotsError::LotNotFound(lot_id))?;
        state.likes.retain(|(_, liked)| *liked != lot_id);
        Ok(())
    }

    async fn like_lot(&self, user_id: UserId, lot_id: LotId) -> Result<(), LotsError> {
        let mut state = self.state.lock().unwrap();
        if !state.lots.contains_key(&lot_id) {
            return Err(LotsError::LotNotFound(lot_id));
        }
        state.likes.insert((user_id, lot_id));
        Ok(())
    }

    async fn unlike_lot(&self, user_id: UserId, lot_id: LotId) -> Result<(), LotsError> {
        self.state.lock().unwrap().likes.remove(&(user_id, lot_id));
        Ok(())
    }

    async fn mark_lot_as_sold(&self, lot_id: LotId) -> Result<bool, LotsError> {
        let mut state = self.state.lock().unwrap();
        match state.lots.get_mut(&lot_id) {
            Some(lot) if lot.sale_status == SaleStatus::Active => {
                lot.sale_status = SaleStatus::Sold;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
