//! `SeaORM` Entity for ledger payments.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::PaymentMethod;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ledger_payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub ledger_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub amount: Decimal,
    #[sea_orm(unique)]
    pub or_number: String,
    pub method: PaymentMethod,
    pub processed_by: Option<Uuid>,
    pub paid_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::student_ledgers::Entity",
        from = "Column::LedgerId",
        to = "super::student_ledgers::Column::Id",
        on_delete = "Cascade"
    )]
    StudentLedgers,
}

impl Related<super::student_ledgers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StudentLedgers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
