use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub count: i64,
    /// cents
    pub price: i64,
    pub discount_price: Option<i64>,
    #[sea_orm(unique)]
    pub slug: String,
}

impl Model {
    /// Price a buyer pays: the discount when one is set.
    pub fn effective_price(&self) -> i64 {
        self.discount_price.unwrap_or(self.price)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
