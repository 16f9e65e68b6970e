//! Unified SQL storage implementation.
//!
//! This module provides the shared `BackendAdapter` implementation for the
//! SQL engines (PostgreSQL, SQLite). The implementation is parameterized by
//! database type using the `SqlDatabase` trait.

mod query;
mod store;

pub use query::SqlDatabase;
pub use store::SqlStore;

#[cfg(feature = "postgres")]
pub mod postgres {
    //! PostgreSQL database backend.

    use sea_query::PostgresQueryBuilder;
    use sqlx::PgPool;

    use crate::storage::BackendKind;

    /// PostgreSQL database marker type.
    pub struct Postgres;

    impl super::SqlDatabase for Postgres {
        type Pool = PgPool;

        const KIND: BackendKind = BackendKind::Networked;

        fn build_select(stmt: sea_query::SelectStatement) -> String {
            stmt.to_string(PostgresQueryBuilder)
        }

        fn build_insert(stmt: sea_query::InsertStatement) -> String {
            stmt.to_string(PostgresQueryBuilder)
        }
    }

    /// PostgreSQL store.
    pub type PostgresStore = super::SqlStore<Postgres>;
}

#[cfg(feature = "sqlite")]
pub mod sqlite {
    //! SQLite database backend.

    use sea_query::SqliteQueryBuilder;
    use sqlx::SqlitePool;

    use crate::storage::BackendKind;

    /// SQLite database marker type.
    pub struct Sqlite;

    impl super::SqlDatabase for Sqlite {
        type Pool = SqlitePool;

        const KIND: BackendKind = BackendKind::Embedded;

        fn build_select(stmt: sea_query::SelectStatement) -> String {
            stmt.to_string(SqliteQueryBuilder)
        }

        fn build_insert(stmt: sea_query::InsertStatement) -> String {
            stmt.to_string(SqliteQueryBuilder)
        }
    }

    /// SQLite store.
    pub type SqliteStore = super::SqlStore<Sqlite>;
}
