pub use chrono::NaiveDate;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub type LotId = i32;
pub type UserId = i32;

/// Identity of whoever is reading lots, resolved by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Viewer {
    #[default]
    Anonymous,
    User(UserId),
}

impl Viewer {
    /// Non-positive identifiers denote an anonymous viewer.
    pub fn from_raw(user_id: i32) -> Self {
        if user_id > 0 {
            Self::User(user_id)
        } else {
            Self::Anonymous
        }
    }

    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Self::User(id) => Some(*id),
            Self::Anonymous => None,
        }
    }
}

impl From<UserId> for Viewer {
    fn from(value: UserId) -> Self {
        Self::from_raw(value)
    }
}

pub const ACTIVE_LABEL: &str = "Продається";
pub const SOLD_LABEL: &str = "Продано";

/// Sale status of a lot, persisted as its localized label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaleStatus {
    Active,
    Sold,
}

impl SaleStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Active => ACTIVE_LABEL,
            Self::Sold => SOLD_LABEL,
        }
    }
}

impl Display for SaleStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown sale status label: `{0}`")]
pub struct UnknownSaleStatus(pub String);

impl FromStr for SaleStatus {
    type Err = UnknownSaleStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ACTIVE_LABEL => Ok(Self::Active),
            SOLD_LABEL => Ok(Self::Sold),
            other => Err(UnknownSaleStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Brand {
    pub brand_id: i32,
    pub brand_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    pub model_id: i32,
    pub brand_id: i32,
    pub model_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Car {
    pub car_id: i32,
    pub brand_id: i32,
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

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lot {
    pub lot_id: LotId,
    pub seller_id: UserId,
    pub car: Car,
    pub post_date: NaiveDate,
    pub sale_price: i32,
    pub sale_status: SaleStatus,
    pub description: String,
    pub images: Vec<String>,
    /// Computed per viewer, never persisted on the lot.
    pub is_liked: bool,
}

/// One page of lots together with the number of lots matching the filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LotsPage {
    pub lots: Vec<Lot>,
    pub total: i64,
}

/// Lot attributes as submitted by a seller, brand and model are given by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LotDraft {
    pub brand: String,
    pub model: String,
    pub engine: String,
    pub transmission: String,
    pub wheel_drive: String,
    pub made_year: i32,
    pub vin_code: String,
    pub color: String,
    pub mileage: i32,
    pub sale_price: i32,
    pub description: String,
}

/// A lot ready to be inserted, its images are already named by the storage
/// coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLot {
    pub seller_id: UserId,
    pub draft: LotDraft,
    pub images: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotUpdate {
    pub lot_id: LotId,
    pub car_id: i32,
    pub draft: LotDraft,
    pub images: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewer_from_raw() {
        assert_eq!(Viewer::from_raw(0), Viewer::Anonymous);
        assert_eq!(Viewer::from_raw(-3), Viewer::Anonymous);
        assert_eq!(Viewer::from_raw(7), Viewer::User(7));
        assert_eq!(Viewer::from_raw(7).user_id(), Some(7));
        assert_eq!(Viewer::Anonymous.user_id(), None);
    }

    #[test]
    fn test_sale_status_labels() {
        assert_eq!("Продається".parse(), Ok(SaleStatus::Active));
        assert_eq!("Продано".parse(), Ok(SaleStatus::Sold));
        assert_eq!(SaleStatus::Sold.label(), SOLD_LABEL);
        assert_eq!(
            "sold".parse::<SaleStatus>(),
            Err(UnknownSaleStatus("sold".to_string()))
        );
    }
}
