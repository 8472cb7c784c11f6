//! Append-only log of destructive reconciliation rewrites.
//!
//! Written only when reconciliation runs in truncate mode and rewrites a
//! withdrawal that could not have been covered. Rows are never updated or
//! deleted.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "balance_adjustments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub transaction_id: i64,
    pub user_id: i64,
    pub original_amount_minor: i64,
    pub adjusted_amount_minor: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
