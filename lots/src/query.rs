use crate::domain::{Car, Lot, LotId, UnknownSaleStatus, UserId, Viewer};
use crate::error::LotsError;
use crate::filter::{BindArg, LotFilters, PredicateBuilder};
use chrono::NaiveDate;
use diesel::QueryableByName;
use diesel::pg::Pg;
use diesel::query_builder::{BoxedSqlQuery, SqlQuery};
use diesel::result::QueryResult;
use diesel::sql_types::{Array, BigInt, Bool, Date, Integer, Nullable, Text};
use tracing::warn;

pub const DEFAULT_PAGE_SIZE: i64 = 10;

const LOT_COLUMNS: &str = "\
sl.lot_id, sl.seller_id, sl.postdate, sl.sale_price, sl.sale_status, sl.vin_code, \
sl.mileage, sl.color, sl.description, sl.images_paths, \
c.car_id, c.made_year, c.engine_type, c.transmission, c.wheel_drive, \
b.brand_id, b.brand_name, m.model_id, m.model_name";

const LOT_JOINS: &str = "\
FROM sell_lots sl
JOIN cars c ON sl.car_id = c.car_id
JOIN brands b ON c.brand_id = b.brand_id
JOIN models m ON c.model_id = m.model_id";

/// 1-based page number and page size, normalized on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: i64,
    size: i64,
}

impl Pagination {
    pub fn new(page: i64, size: i64) -> Self {
        Self {
            page: if page < 1 { 1 } else { page },
            size: if size < 1 { DEFAULT_PAGE_SIZE } else { size },
        }
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn size(&self) -> i64 {
        self.size
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.size)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

/// SQL text plus the arguments for its `$<n>` placeholders, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotQuery {
    pub sql: String,
    pub args: Vec<BindArg>,
}

impl LotQuery {
    pub fn into_boxed(self) -> BoxedSqlQuery<'static, Pg, SqlQuery> {
        self.args
            .into_iter()
            .fold(diesel::sql_query(self.sql).into_boxed(), |query, arg| {
                match arg {
                    BindArg::Int(v) => query.bind::<Integer, _>(v),
                    BindArg::BigInt(v) => query.bind::<BigInt, _>(v),
                    BindArg::Text(v) => query.bind::<Text, _>(v),
                }
            })
    }
}

/// Selects the liked flag for `viewer`, binding the viewer id as the next
/// placeholder when there is one.
fn liked_column(viewer: Viewer, args: &mut Vec<BindArg>) -> String {
    match viewer {
        Viewer::User(user_id) => {
            args.push(BindArg::Int(user_id));
            format!(
                "EXISTS (SELECT 1 FROM liked_lots ll WHERE ll.user_id = ${} AND ll.lot_id = sl.lot_id) AS is_liked",
                args.len()
            )
        }
        Viewer::Anonymous => "false AS is_liked".to_string(),
    }
}

pub fn count_query(filters: &LotFilters) -> Result<LotQuery, LotsError> {
    let predicate = PredicateBuilder::starting_at(1).filters(filters)?.finish();
    let mut sql = format!("SELECT COUNT(*) AS count\n{LOT_JOINS}\nWHERE 1=1");
    if !predicate.clauses.is_empty() {
        sql.push('\n');
        sql.push_str(&predicate.sql());
    }
    Ok(LotQuery {
        sql,
        args: predicate.args,
    })
}

/// Filtered page ordered by post date, most recent first, with the total
/// number of matching lots attached to every row through a window count.
pub fn page_query(
    viewer: Viewer,
    filters: &LotFilters,
    pagination: Pagination,
) -> Result<LotQuery, LotsError> {
    let mut args = Vec::new();
    let liked = liked_column(viewer, &mut args);

    let mut builder = PredicateBuilder::starting_at(args.len() + 1).filters(filters)?;
    let limit = builder.push_raw(BindArg::BigInt(pagination.size()));
    let offset = builder.push_raw(BindArg::BigInt(pagination.offset()));
    let predicate = builder.finish();

    let mut sql = format!(
        "SELECT {LOT_COLUMNS}, {liked}, COUNT(*) OVER() AS total_count\n{LOT_JOINS}\nWHERE 1=1"
    );
    if !predicate.clauses.is_empty() {
        sql.push('\n');
        sql.push_str(&predicate.sql());
    }
    sql.push_str(&format!(
        "\nORDER BY sl.postdate DESC, sl.lot_id DESC LIMIT ${limit} OFFSET ${offset}"
    ));

    args.extend(predicate.args);
    Ok(LotQuery { sql, args })
}

pub fn lot_by_id_query(viewer: Viewer, lot_id: LotId) -> LotQuery {
    let mut args = vec![BindArg::Int(lot_id)];
    let liked = liked_column(viewer, &mut args);
    LotQuery {
        sql: format!("SELECT {LOT_COLUMNS}, {liked}\n{LOT_JOINS}\nWHERE sl.lot_id = $1"),
        args,
    }
}

/// Lots posted by `seller_id`, the liked flag is computed for the seller.
pub fn seller_lots_query(seller_id: UserId) -> LotQuery {
    let mut args = vec![BindArg::Int(seller_id)];
    let liked = liked_column(Viewer::from_raw(seller_id), &mut args);
    LotQuery {
        sql: format!(
            "SELECT {LOT_COLUMNS}, {liked}\n{LOT_JOINS}\nWHERE sl.seller_id = $1\nORDER BY sl.postdate DESC, sl.lot_id DESC"
        ),
        args,
    }
}

pub fn liked_lots_query(user_id: UserId) -> LotQuery {
    LotQuery {
        sql: format!(
            "SELECT {LOT_COLUMNS}, true AS is_liked\n{LOT_JOINS}\nJOIN liked_lots ll ON sl.lot_id = ll.lot_id\nWHERE ll.user_id = $1\nORDER BY sl.postdate DESC, sl.lot_id DESC"
        ),
        args: vec![BindArg::Int(user_id)],
    }
}

#[derive(Debug, Clone, QueryableByName)]
pub struct LotRow {
    #[diesel(sql_type = Integer)]
    pub lot_id: i32,
    #[diesel(sql_type = Integer)]
    pub seller_id: i32,
    #[diesel(sql_type = Date)]
    pub postdate: NaiveDate,
    #[diesel(sql_type = Integer)]
    pub sale_price: i32,
    #[diesel(sql_type = Text)]
    pub sale_status: String,
    #[diesel(sql_type = Text)]
    pub vin_code: String,
    #[diesel(sql_type = Integer)]
    pub mileage: i32,
    #[diesel(sql_type = Text)]
    pub color: String,
    #[diesel(sql_type = Text)]
    pub description: String,
    #[diesel(sql_type = Nullable<Array<Text>>)]
    pub images_paths: Option<Vec<String>>,
    #[diesel(sql_type = Integer)]
    pub car_id: i32,
    #[diesel(sql_type = Integer)]
    pub made_year: i32,
    #[diesel(sql_type = Text)]
    pub engine_type: String,
    #[diesel(sql_type = Text)]
    pub transmission: String,
    #[diesel(sql_type = Text)]
    pub wheel_drive: String,
    #[diesel(sql_type = Integer)]
    pub brand_id: i32,
    #[diesel(sql_type = Text)]
    pub brand_name: String,
    #[diesel(sql_type = Integer)]
    pub model_id: i32,
    #[diesel(sql_type = Text)]
    pub model_name: String,
    #[diesel(sql_type = Bool)]
    pub is_liked: bool,
}

#[derive(Debug, Clone, QueryableByName)]
pub struct PagedLotRow {
    #[diesel(embed)]
    pub lot: LotRow,
    #[diesel(sql_type = BigInt)]
    pub total_count: i64,
}

#[derive(Debug, Clone, Copy, QueryableByName)]
pub struct CountRow {
    #[diesel(sql_type = BigInt)]
    pub count: i64,
}

impl TryFrom<LotRow> for Lot {
    type Error = UnknownSaleStatus;

    fn try_from(value: LotRow) -> Result<Self, Self::Error> {
        Ok(Self {
            lot_id: value.lot_id,
            seller_id: value.seller_id,
            post_date: value.postdate,
            sale_price: value.sale_price,
            sale_status: value.sale_status.parse()?,
            description: value.description,
            images: value.images_paths.unwrap_or_default(),
            is_liked: value.is_liked,
            car: Car {
                car_id: value.car_id,
                brand_id: value.brand_id,
                model_id: value.model_id,
                brand: value.brand_name,
                model: value.model_name,
                engine: value.engine_type,
                transmission: value.transmission,
                wheel_drive: value.wheel_drive,
                made_year: value.made_year,
                vin_code: value.vin_code,
                color: value.color,
                mileage: value.mileage,
            },
        })
    }
}

#[derive(Debug, Default)]
pub struct DecodedPage {
    pub lots: Vec<Lot>,
    /// Window count read from any row that reached the client, `None` when
    /// no row did.
    pub total: Option<i64>,
    pub skipped: usize,
}

/// Decodes rows one by one, a row that fails is logged and skipped.
pub fn decode_lots(rows: impl IntoIterator<Item = QueryResult<LotRow>>) -> Vec<Lot> {
    rows.into_iter()
        .filter_map(|row| match row {
            Ok(row) => to_lot(row),
            Err(e) => {
                warn!(row_error = ?e, "skipping lot row that failed to decode");
                None
            }
        })
        .collect()
}

pub fn decode_page(rows: impl IntoIterator<Item = QueryResult<PagedLotRow>>) -> DecodedPage {
    rows.into_iter()
        .fold(DecodedPage::default(), |mut page, row| {
            match row {
                Ok(PagedLotRow { lot, total_count }) => {
                    page.total = Some(total_count);
                    match to_lot(lot) {
                        Some(lot) => page.lots.push(lot),
                        None => page.skipped += 1,
                    }
                }
                Err(e) => {
                    warn!(row_error = ?e, "skipping lot row that failed to decode");
                    page.skipped += 1;
                }
            }
            page
        })
}

fn to_lot(row: LotRow) -> Option<Lot> {
    let lot_id = row.lot_id;
    match Lot::try_from(row) {
        Ok(lot) => Some(lot),
        Err(e) => {
            warn!(lot_id, row_error = %e, "skipping lot row with invalid values");
            None
        }
    }
}
