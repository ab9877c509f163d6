pub mod lots {
    use diesel::prelude::*;

    #[derive(Debug, Queryable, Selectable, Identifiable)]
    #[diesel(table_name = crate::persistence::schema::brands)]
    #[diesel(check_for_backend(diesel::pg::Pg))]
    #[diesel(primary_key(brand_id))]
    pub struct Brand {
        pub brand_id: i32,
        pub brand_name: String,
    }

    #[derive(Debug, Queryable, Selectable, Identifiable, Associations)]
    #[diesel(table_name = crate::persistence::schema::models)]
    #[diesel(belongs_to(Brand, foreign_key = brand_id))]
    #[diesel(check_for_backend(diesel::pg::Pg))]
    #[diesel(primary_key(model_id))]
    pub struct Model {
        pub model_id: i32,
        pub brand_id: i32,
        pub model_name: String,
    }

    #[derive(Insertable)]
    #[diesel(table_name = crate::persistence::schema::brands)]
    pub struct NewBrand<'a> {
        pub brand_name: &'a str,
    }

    #[derive(Insertable)]
    #[diesel(table_name = crate::persistence::schema::models)]
    pub struct NewModel<'a> {
        pub brand_id: i32,
        pub model_name: &'a str,
    }

    /// Used both for inserting a car and for overwriting its attributes on
    /// lot update, the car is only ever written together with its lot.
    #[derive(Insertable, AsChangeset)]
    #[diesel(table_name = crate::persistence::schema::cars)]
    pub struct CarRecord<'a> {
        pub brand_id: i32,
        pub model_id: i32,
        pub made_year: i32,
        pub engine_type: &'a str,
        pub transmission: &'a str,
        pub wheel_drive: &'a str,
    }

    /// `postdate` is left to the column default (`CURRENT_DATE`).
    #[derive(Insertable)]
    #[diesel(table_name = crate::persistence::schema::sell_lots)]
    pub struct NewSellLot<'a> {
        pub seller_id: i32,
        pub car_id: i32,
        pub sale_price: i32,
        pub sale_status: &'a str,
        pub vin_code: &'a str,
        pub mileage: i32,
        pub color: &'a str,
        pub description: &'a str,
        pub images_paths: Option<&'a [String]>,
    }

    /// Seller, status and post date are absent, none of them
    /// may change through a lot update.
    #[derive(AsChangeset)]
    #[diesel(table_name = crate::persistence::schema::sell_lots)]
    pub struct SellLotChangeset<'a> {
        pub sale_price: i32,
        pub vin_code: &'a str,
        pub mileage: i32,
        pub color: &'a str,
        pub description: &'a str,
        pub images_paths: Option<&'a [String]>,
    }

    #[derive(Insertable)]
    #[diesel(table_name = crate::persistence::schema::liked_lots)]
    pub struct LikedLot {
        pub user_id: i32,
        pub lot_id: i32,
    }
}
