use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct Lot {
    #[serde(rename = "LotID")]
    pub lot_id: i32,
    #[serde(rename = "SellerID")]
    pub seller_id: i32,
    pub car: Car,
    #[schema(example = "2025-10-13")]
    pub post_date: String,
    pub sale_price: i32,
    #[schema(example = "Продається")]
    pub sale_status: String,
    pub description: String,
    pub is_liked: bool,
    pub images: Vec<String>,
}

impl From<lots::domain::Lot> for Lot {
    fn from(value: lots::domain::Lot) -> Self {
        Self {
            lot_id: value.lot_id,
            seller_id: value.seller_id,
            car: value.car.into(),
            post_date: value.post_date.format("%Y-%m-%d").to_string(),
            sale_price: value.sale_price,
            sale_status: value.sale_status.label().to_string(),
            description: value.description,
            is_liked: value.is_liked,
            images: value.images,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct Car {
    #[serde(rename = "CarID")]
    pub car_id: i32,
    #[serde(rename = "BrandID")]
    pub brand_id: i32,
    #[serde(rename = "ModelID")]
    pub model_id: i32,
    pub brand: String,
    pub model: String,
    pub engine: String,
    pub transmission: String,
    pub wheel_drive: String,
    pub made_year: i32,
    pub vin_code: String,
    pub color: String,
    pub mileage: i32,
}

impl From<lots::domain::Car> for Car {
    fn from(value: lots::domain::Car) -> Self {
        Self {
            car_id: value.car_id,
            brand_id: value.brand_id,
            model_id: value.model_id,
            brand: value.brand,
            model: value.model,
            engine: value.engine,
            transmission: value.transmission,
            wheel_drive: value.wheel_drive,
            made_year: value.made_year,
            vin_code: value.vin_code,
            color: value.color,
            mileage: value.mileage,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct LotsResponse {
    pub lots: Vec<Lot>,
    pub total: i64,
}

impl From<lots::domain::LotsPage> for LotsResponse {
    fn from(value: lots::domain::LotsPage) -> Self {
        Self {
            lots: value.lots.into_iter().map(Lot::from).collect(),
            total: value.total,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct Brand {
    #[serde(rename = "BrandID")]
    pub brand_id: i32,
    pub brand_name: String,
}

impl From<lots::domain::Brand> for Brand {
    fn from(value: lots::domain::Brand) -> Self {
        Self {
            brand_id: value.brand_id,
            brand_name: value.brand_name,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct Model {
    #[serde(rename = "ModelID")]
    pub model_id: i32,
    #[serde(rename = "BrandID")]
    pub brand_id: i32,
    pub model_name: String,
}

impl From<lots::domain::Model> for Model {
    fn from(value: lots::domain::Model) -> Self {
        Self {
            model_id: value.model_id,
            brand_id: value.brand_id,
            model_name: value.model_name,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatedLot {
    pub message: String,
    pub lot_id: i32,
}
