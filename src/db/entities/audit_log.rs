use base_entity_derive::base_entity;
use sea_orm::entity::prelude::*;

#[base_entity(created_at = "timestamp", append_only = "true")]
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, DeriveEntityModel)]
#[sea_orm(table_name = "audit_logs")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Caller id from the bearer token, or `Anonymous`.
    #[sea_orm(indexed)]
    pub user_id: String,
    /// `"{METHOD} {path}"`
    pub action: String,
    pub details: Json,
}

impl ActiveModelBehavior for ActiveModel {}
