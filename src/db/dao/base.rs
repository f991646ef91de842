use chrono::Utc;
use sea_orm::sea_query::{Expr, ExprTrait, LikeExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult,
    IntoActiveModel, Order, PaginatorTrait, PrimaryKeyTrait, QueryFilter, QueryOrder, QuerySelect,
    Select,
};
use uuid::Uuid;

use super::base_traits::{HasCreatedAtColumn, HasIdActiveModel, TimestampedActiveModel};
use super::error::{DaoLayerError, DaoResult};

#[derive(Debug, serde::Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub page: u64,
    pub page_size: u64,
    pub has_next: bool,
    /// Rows matching the filters across all pages, when it was counted.
    pub total: Option<u64>,
}

#[derive(Debug, Clone)]
pub enum FilterOp {
    Eq(sea_orm::sea_query::Value),
    Compare {
        op: CompareOp,
        value: sea_orm::sea_query::Value,
    },
    Like { pattern: String, escape: char },
}

#[derive(Debug, Clone, Copy)]
pub enum CompareOp {
    Lte,
    Gte,
}

#[derive(Debug, Clone)]
pub struct ColumnFilter<C> {
    pub column: C,
    pub op: FilterOp,
}

impl<C> ColumnFilter<C> {
    pub fn eq(column: C, value: impl Into<sea_orm::sea_query::Value>) -> Self {
        Self {
            column,
            op: FilterOp::Eq(value.into()),
        }
    }

    pub fn compare(column: C, op: CompareOp, value: impl Into<sea_orm::sea_query::Value>) -> Self {
        Self {
            column,
            op: FilterOp::Compare {
                op,
                value: value.into(),
            },
        }
    }

    /// Substring match; `%`, `_` and `\` in `needle` are matched literally.
    pub fn contains(column: C, needle: &str) -> Self {
        let mut pattern = String::with_capacity(needle.len() + 2);
        pattern.push('%');
        for ch in needle.chars() {
            if matches!(ch, '%' | '_' | '\\') {
                pattern.push('\\');
            }
            pattern.push(ch);
        }
        pattern.push('%');
        Self {
            column,
            op: FilterOp::Like {
                pattern,
                escape: '\\',
            },
        }
    }
}

fn apply_filters<E>(select: Select<E>, filters: &[ColumnFilter<E::Column>]) -> Select<E>
where
    E: EntityTrait,
    E::Column: Clone,
{
    filters.iter().fold(select, |select, filter| match &filter.op {
        FilterOp::Eq(value) => select.filter(filter.column.clone().eq(value.clone())),
        FilterOp::Compare { op, value } => {
            let expr = Expr::col(filter.column.clone());
            let value = Expr::val(value.clone());
            let expr = match op {
                CompareOp::Lte => expr.lte(value),
                CompareOp::Gte => expr.gte(value),
            };
            select.filter(expr)
        }
        FilterOp::Like { pattern, escape } => select.filter(
            Expr::col(filter.column.clone()).like(LikeExpr::new(pattern).escape(*escape)),
        ),
    })
}

#[async_trait::async_trait]
pub trait DaoBase: Clone + Send + Sync + Sized
where
    <Self::Entity as EntityTrait>::Model:
        FromQueryResult + IntoActiveModel<<Self::Entity as EntityTrait>::ActiveModel> + Send + Sync,
    <Self::Entity as EntityTrait>::ActiveModel:
        ActiveModelTrait<Entity = Self::Entity> + HasIdActiveModel + TimestampedActiveModel + Send,
    <<Self::Entity as EntityTrait>::PrimaryKey as PrimaryKeyTrait>::ValueType:
        From<Uuid> + Send + Sync,
    Self::Entity: HasCreatedAtColumn,
{
    type Entity: EntityTrait + Send + Sync;
    const MAX_PAGE_SIZE: u64 = 100;

    fn from_db(db: DatabaseConnection) -> Self;

    fn new(db: &DatabaseConnection) -> Self {
        Self::from_db(db.clone())
    }

    fn db(&self) -> &DatabaseConnection;

    /// Rejects empty or oversized pages and pages whose row offset does not
    /// fit the signed 64-bit OFFSET the database binds.
    fn check_pagination(page: u64, page_size: u64) -> DaoResult<()> {
        if page == 0 || page_size == 0 || page_size > Self::MAX_PAGE_SIZE {
            return Err(DaoLayerError::InvalidPagination { page, page_size });
        }
        let offset = (page - 1).checked_mul(page_size);
        if offset.is_none_or(|offset| offset > i64::MAX as u64) {
            return Err(DaoLayerError::InvalidPagination { page, page_size });
        }
        Ok(())
    }

    async fn create(
        &self,
        data: impl IntoActiveModel<<Self::Entity as EntityTrait>::ActiveModel> + Send,
    ) -> DaoResult<<Self::Entity as EntityTrait>::Model> {
        let now = Utc::now().fixed_offset();
        let mut active = data.into_active_model();
        active.set_id(Uuid::new_v4());
        active.set_created_at(now);
        active.set_updated_at(now);
        active.insert(self.db()).await.map_err(DaoLayerError::Db)
    }

    async fn find_by_id(&self, id: Uuid) -> DaoResult<<Self::Entity as EntityTrait>::Model> {
        let model = Self::Entity::find_by_id(id)
            .one(self.db())
            .await
            .map_err(DaoLayerError::Db)?;

        model.ok_or(DaoLayerError::NotFound {
            entity: std::any::type_name::<Self::Entity>(),
            id,
        })
    }

    async fn find(
        &self,
        page: u64,
        page_size: u64,
        order: Option<(<Self::Entity as EntityTrait>::Column, Order)>,
        apply: impl FnOnce(Select<Self::Entity>) -> Select<Self::Entity> + Send,
    ) -> DaoResult<PaginatedResponse<<Self::Entity as EntityTrait>::Model>> {
        Self::check_pagination(page, page_size)?;

        let filtered = apply(Self::Entity::find());
        let ordered = match order {
            Some((column, order)) => filtered.order_by(column, order),
            None => filtered.order_by_desc(Self::Entity::created_at_column()),
        };
        let fetch_size = page_size.saturating_add(1);
        let offset = (page - 1) * page_size;
        let mut data = ordered
            .limit(fetch_size)
            .offset(offset)
            .all(self.db())
            .await
            .map_err(DaoLayerError::Db)?;

        let has_next = data.len() > page_size as usize;
        if has_next {
            data.truncate(page_size as usize);
        }

        Ok(PaginatedResponse {
            data,
            page,
            page_size,
            has_next,
            total: None,
        })
    }

    /// Paged query with column filters. Also counts every matching row into
    /// `total`.
    async fn find_with_filters(
        &self,
        page: u64,
        page_size: u64,
        order: Option<(<Self::Entity as EntityTrait>::Column, Order)>,
        filters: &[ColumnFilter<<Self::Entity as EntityTrait>::Column>],
    ) -> DaoResult<PaginatedResponse<<Self::Entity as EntityTrait>::Model>>
    where
        <Self::Entity as EntityTrait>::Column: Clone + Send + Sync,
    {
        Self::check_pagination(page, page_size)?;

        let total = self.count_with_filters(filters).await?;
        let mut response = self
            .find(page, page_size, order, |select| apply_filters(select, filters))
            .await?;
        response.total = Some(total);
        Ok(response)
    }

    async fn count_with_filters(
        &self,
        filters: &[ColumnFilter<<Self::Entity as EntityTrait>::Column>],
    ) -> DaoResult<u64>
    where
        <Self::Entity as EntityTrait>::Column: Clone + Send + Sync,
    {
        apply_filters(Self::Entity::find(), filters)
            .count(self.db())
            .await
            .map_err(DaoLayerError::Db)
    }

    async fn update<F>(&self, id: Uuid, apply: F) -> DaoResult<<Self::Entity as EntityTrait>::Model>
    where
        F: for<'a> FnOnce(&'a mut <Self::Entity as EntityTrait>::ActiveModel) + Send,
    {
        let model = Self::Entity::find_by_id(id)
            .one(self.db())
            .await
            .map_err(DaoLayerError::Db)?
            .ok_or(DaoLayerError::NotFound {
                entity: std::any::type_name::<Self::Entity>(),
                id,
            })?;

        let mut active = model.into_active_model();
        apply(&mut active);
        active.set_updated_at(Utc::now().fixed_offset());

        active.update(self.db()).await.map_err(DaoLayerError::Db)
    }
}
