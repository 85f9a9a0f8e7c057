//! `SeaORM` Entity for issued OR numbers across all payment stores.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "official_receipts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub or_number: String,
    /// `ledger` or `legacy`.
    pub source: String,
    pub payment_id: Uuid,
    pub issued_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
