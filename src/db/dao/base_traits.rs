//! Implemented by `#[base_entity]` for every entity the DAO layer manages.

pub trait HasCreatedAtColumn: sea_orm::EntityTrait {
    /// Column used for the default newest-first ordering.
    fn created_at_column() -> Self::Column;
}

pub trait HasIdActiveModel {
    fn set_id(&mut self, id: uuid::Uuid);
}

pub trait TimestampedActiveModel {
    fn set_created_at(&mut self, ts: sea_orm::entity::prelude::DateTimeWithTimeZone);
    /// No-op for append-only entities.
    fn set_updated_at(&mut self, ts: sea_orm::entity::prelude::DateTimeWithTimeZone);
}
