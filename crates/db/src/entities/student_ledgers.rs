//! `SeaORM` Entity for per-year student ledgers.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::LedgerStatus;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "student_ledgers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub student_id: Uuid,
    pub school_year: String,
    pub grade_level: Option<i16>,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub total_charges: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub total_payments: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub balance: Decimal,
    pub status: LedgerStatus,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ledger_charges::Entity")]
    LedgerCharges,
    #[sea_orm(has_many = "super::ledger_payments::Entity")]
    LedgerPayments,
}

impl Related<super::ledger_charges::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LedgerCharges.def()
    }
}

impl Related<super::ledger_payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LedgerPayments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
