use sea_orm::entity::prelude::*;

/// Contract-farming application. `id` comes from a sequence starting at 1000
/// and is shown to users as `CF{id}`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "contract_applications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
    pub status: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub personal_info: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub address: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub land_details: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub banking_details: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub contract_terms: Json,
    pub land_area_satak: f64,
    pub total_contract_value: f64,
    pub remarks: Option<String>,
    pub last_updated: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
