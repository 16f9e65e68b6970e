//! Unified SQL BackendAdapter implementation.
//!
//! Uses a macro to generate implementations for each SQL backend,
//! eliminating code duplication while maintaining type safety.

use std::marker::PhantomData;

use super::SqlDatabase;

/// SQL-based implementation of BackendAdapter.
///
/// This generic implementation works with any SQL database that implements
/// the `SqlDatabase` trait (PostgreSQL, SQLite). Statements are built with
/// sea-query so that upsert and insert-or-ignore render in each dialect.
pub struct SqlStore<DB: SqlDatabase> {
    pool: DB::Pool,
    _marker: PhantomData<DB>,
}

impl<DB: SqlDatabase> SqlStore<DB> {
    /// Create a new SQL store with the given pool.
    pub fn new(pool: DB::Pool) -> Self {
        Self {
            pool,
            _marker: PhantomData,
        }
    }

    /// Get the underlying pool.
    pub fn pool(&self) -> &DB::Pool {
        &self.pool
    }
}

/// Macro to implement BackendAdapter for a specific SQL backend.
///
/// `$row_type` is the engine's row type, used by the row decoders.
macro_rules! impl_backend_adapter {
    ($db_type:ty, $feature:literal, $row_type:ty) => {
        #[cfg(feature = $feature)]
        impl SqlStore<$db_type> {
            fn group_from_row(
                row: &$row_type,
            ) -> crate::storage::Result<crate::storage::GroupRecord> {
                use sqlx::Row;

                Ok(crate::storage::GroupRecord {
                    id: row.try_get("id")?,
                    name: row.try_get("name")?,
                    created_at: row.try_get("created_at")?,
                    updated_at: row.try_get("updated_at")?,
                    deleted_at: row.try_get("deleted_at")?,
                })
            }

            fn message_from_row(
                row: &$row_type,
            ) -> crate::storage::Result<crate::storage::MessageRecord> {
                use sqlx::Row;

                Ok(crate::storage::MessageRecord {
                    id: row.try_get("id")?,
                    group_id: row.try_get("group_id")?,
                    user_id: row.try_get("user_id")?,
                    body: row.try_get("body")?,
                    message_type: row.try_get("type")?,
                    timestamp: row.try_get("timestamp")?,
                    created_at: row.try_get("created_at")?,
                    updated_at: row.try_get("updated_at")?,
                    deleted_at: row.try_get("deleted_at")?,
                    metadata_blob: row.try_get("metadata_blob")?,
                })
            }

            fn snapshot_from_row(
                row: &$row_type,
            ) -> crate::storage::Result<crate::storage::SnapshotRecord> {
                use sqlx::Row;

                Ok(crate::storage::SnapshotRecord {
                    id: row.try_get("id")?,
                    group_id: row.try_get("group_id")?,
                    name: row.try_get("name")?,
                    users_count: row.try_get("users_count")?,
                    description: row.try_get("description")?,
                    created_at: row.try_get("created_at")?,
                    updated_at: row.try_get("updated_at")?,
                    deleted_at: row.try_get("deleted_at")?,
                })
            }

            fn history_select() -> sea_query::SelectStatement {
                use crate::storage::schema::History;

                sea_query::Query::select()
                    .columns([
                        History::Id,
                        History::GroupId,
                        History::Name,
                        History::UsersCount,
                        History::Description,
                        History::CreatedAt,
                        History::UpdatedAt,
                        History::DeletedAt,
                    ])
                    .from(History::Table)
                    .to_owned()
            }
        }

        #[cfg(feature = $feature)]
        #[async_trait::async_trait]
        impl crate::storage::BackendAdapter for SqlStore<$db_type> {
            fn kind(&self) -> crate::storage::BackendKind {
                <$db_type as SqlDatabase>::KIND
            }

            async fn upsert_group(
                &self,
                group: &crate::storage::GroupUpsert,
            ) -> crate::storage::Result<()> {
                use sea_query::{OnConflict, Query};

                use crate::storage::schema::Groups;

                let now = crate::storage::helpers::now_rfc3339();

                let stmt = Query::insert()
                    .into_table(Groups::Table)
                    .columns([Groups::Id, Groups::Name, Groups::CreatedAt, Groups::UpdatedAt])
                    .values_panic([
                        group.id.as_str().into(),
                        group.name.as_str().into(),
                        now.clone().into(),
                        now.into(),
                    ])
                    .on_conflict(
                        OnConflict::column(Groups::Id)
                            .update_columns([Groups::Name, Groups::UpdatedAt])
                            .to_owned(),
                    )
                    .to_owned();

                let sql = <$db_type>::build_insert(stmt);
                sqlx::query(&sql).execute(&self.pool).await?;

                Ok(())
            }

            async fn insert_message_if_absent(
                &self,
                message: &crate::storage::NewMessage,
            ) -> crate::storage::Result<bool> {
                use sea_query::{OnConflict, Query};

                use crate::storage::schema::Messages;

                let now = crate::storage::helpers::now_rfc3339();

                let stmt = Query::insert()
                    .into_table(Messages::Table)
                    .columns([
                        Messages::Id,
                        Messages::GroupId,
                        Messages::UserId,
                        Messages::Body,
                        Messages::Type,
                        Messages::Timestamp,
                        Messages::CreatedAt,
                        Messages::UpdatedAt,
                        Messages::MetadataBlob,
                    ])
                    .values_panic([
                        message.id.as_str().into(),
                        message.group_id.as_str().into(),
                        message.user_id.clone().into(),
                        message.body.clone().into(),
                        message.message_type.clone().into(),
                        message.timestamp.into(),
                        now.clone().into(),
                        now.into(),
                        message.metadata_blob.clone().into(),
                    ])
                    .on_conflict(OnConflict::column(Messages::Id).do_nothing().to_owned())
                    .to_owned();

                let sql = <$db_type>::build_insert(stmt);
                let result = sqlx::query(&sql).execute(&self.pool).await?;

                Ok(result.rows_affected() > 0)
            }

            async fn insert_history_snapshot(
                &self,
                snapshot: &crate::storage::GroupSnapshot,
            ) -> crate::storage::Result<i64> {
                use sea_query::Query;
                use sqlx::Row;

                use crate::storage::schema::History;

                let now = crate::storage::helpers::now_rfc3339();

                let stmt = Query::insert()
                    .into_table(History::Table)
                    .columns([
                        History::GroupId,
                        History::Name,
                        History::UsersCount,
                        History::Description,
                        History::CreatedAt,
                        History::UpdatedAt,
                    ])
                    .values_panic([
                        snapshot.group_id.as_str().into(),
                        snapshot.name.clone().into(),
                        snapshot.users_count.into(),
                        snapshot.description.clone().into(),
                        now.clone().into(),
                        now.into(),
                    ])
                    .returning_col(History::Id)
                    .to_owned();

                let sql = <$db_type>::build_insert(stmt);
                let row = sqlx::query(&sql).fetch_one(&self.pool).await?;

                Ok(row.try_get("id")?)
            }

            async fn get_latest_history_snapshot(
                &self,
                group_id: &str,
            ) -> crate::storage::Result<Option<crate::storage::SnapshotRecord>> {
                use sea_query::{Expr, Order};

                use crate::storage::schema::History;

                let stmt = Self::history_select()
                    .and_where(Expr::col(History::GroupId).eq(group_id))
                    .order_by(History::Id, Order::Desc)
                    .limit(1)
                    .to_owned();

                let sql = <$db_type>::build_select(stmt);
                let row = sqlx::query(&sql).fetch_optional(&self.pool).await?;

                row.as_ref().map(Self::snapshot_from_row).transpose()
            }

            async fn get_group(
                &self,
                id: &str,
            ) -> crate::storage::Result<Option<crate::storage::GroupRecord>> {
                use sea_query::{Expr, Query};

                use crate::storage::schema::Groups;

                let stmt = Query::select()
                    .columns([
                        Groups::Id,
                        Groups::Name,
                        Groups::CreatedAt,
                        Groups::UpdatedAt,
                        Groups::DeletedAt,
                    ])
                    .from(Groups::Table)
                    .and_where(Expr::col(Groups::Id).eq(id))
                    .to_owned();

                let sql = <$db_type>::build_select(stmt);
                let row = sqlx::query(&sql).fetch_optional(&self.pool).await?;

                row.as_ref().map(Self::group_from_row).transpose()
            }

            async fn list_groups(
                &self,
            ) -> crate::storage::Result<Vec<crate::storage::GroupRecord>> {
                use sea_query::{Order, Query};

                use crate::storage::schema::Groups;

                let stmt = Query::select()
                    .columns([
                        Groups::Id,
                        Groups::Name,
                        Groups::CreatedAt,
                        Groups::UpdatedAt,
                        Groups::DeletedAt,
                    ])
                    .from(Groups::Table)
                    .order_by(Groups::Name, Order::Asc)
                    .order_by(Groups::Id, Order::Asc)
                    .to_owned();

                let sql = <$db_type>::build_select(stmt);
                let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

                rows.iter().map(Self::group_from_row).collect()
            }

            async fn list_messages(
                &self,
                group_id: &str,
                limit: u32,
            ) -> crate::storage::Result<Vec<crate::storage::MessageRecord>> {
                use sea_query::{Expr, Order, Query};

                use crate::storage::schema::Messages;

                let stmt = Query::select()
                    .columns([
                        Messages::Id,
                        Messages::GroupId,
                        Messages::UserId,
                        Messages::Body,
                        Messages::Type,
                        Messages::Timestamp,
                        Messages::CreatedAt,
                        Messages::UpdatedAt,
                        Messages::DeletedAt,
                        Messages::MetadataBlob,
                    ])
                    .from(Messages::Table)
                    .and_where(Expr::col(Messages::GroupId).eq(group_id))
                    .order_by(Messages::Timestamp, Order::Asc)
                    .order_by(Messages::Id, Order::Asc)
                    .limit(u64::from(limit))
                    .to_owned();

                let sql = <$db_type>::build_select(stmt);
                let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

                rows.iter().map(Self::message_from_row).collect()
            }

            async fn list_history(
                &self,
                group_id: &str,
            ) -> crate::storage::Result<Vec<crate::storage::SnapshotRecord>> {
                use sea_query::{Expr, Order};

                use crate::storage::schema::History;

                let stmt = Self::history_select()
                    .and_where(Expr::col(History::GroupId).eq(group_id))
                    .order_by(History::Id, Order::Asc)
                    .to_owned();

                let sql = <$db_type>::build_select(stmt);
                let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

                rows.iter().map(Self::snapshot_from_row).collect()
            }
        }
    };
}

// Generate implementations for each SQL backend
impl_backend_adapter!(super::postgres::Postgres, "postgres", sqlx::postgres::PgRow);
impl_backend_adapter!(super::sqlite::Sqlite, "sqlite", sqlx::sqlite::SqliteRow);
