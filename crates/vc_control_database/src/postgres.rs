//! PostgreSQL implementation of the configuration store.

use crate::{
    ConfigTable, ConfigWrite, DatabaseResult, GuildConfigRecord, GuildConfigStore, SaveAllReport,
    SaveOutcome, StorageResult, StoreSettings, StoredRecord, TableColumns, WriteShape,
    decode_stored, ensure_schema, read_all, read_one, read_record, write_batch, write_tiered,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_types::{Jsonb, Nullable, Text, Timestamptz};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{info, instrument, warn};
use vc_control_error::{DatabaseError, DatabaseErrorKind, StorageError, StorageErrorKind};

const UPSERT_FULL: &str = "INSERT INTO guild_configs (guild_id, name, data, updated_at) \
     VALUES ($1, $2, $3, now()) \
     ON CONFLICT (guild_id) DO UPDATE \
     SET data = EXCLUDED.data, name = EXCLUDED.name, updated_at = now()";

const UPSERT_MINIMAL: &str = "INSERT INTO guild_configs (guild_id, data) VALUES ($1, $2) \
     ON CONFLICT (guild_id) DO UPDATE SET data = EXCLUDED.data";

const TABLE_COLUMNS: &str = "SELECT column_name::text AS column_name, \
     data_type::text AS data_type FROM information_schema.columns \
     WHERE table_schema = current_schema() AND table_name = 'guild_configs'";

#[derive(QueryableByName)]
struct ColumnRow {
    #[diesel(sql_type = Text)]
    column_name: String,
    #[diesel(sql_type = Text)]
    data_type: String,
}

#[derive(QueryableByName)]
struct DataRow {
    #[diesel(sql_type = Text)]
    guild_id: String,
    #[diesel(sql_type = Nullable<Text>)]
    data: Option<String>,
}

#[derive(QueryableByName)]
struct RecordRow {
    #[diesel(sql_type = Nullable<Text>)]
    name: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    data: Option<String>,
    #[diesel(sql_type = Nullable<Timestamptz>)]
    updated_at: Option<DateTime<Utc>>,
}

fn table_columns(conn: &mut PgConnection) -> DatabaseResult<TableColumns> {
    let rows: Vec<ColumnRow> = diesel::sql_query(TABLE_COLUMNS).load(conn)?;
    Ok(TableColumns::new(
        rows.into_iter().map(|row| (row.column_name, row.data_type)),
    ))
}

impl ConfigTable for PgConnection {
    fn execute_ddl(&mut self, statement: &str) -> DatabaseResult<()> {
        diesel::sql_query(statement).execute(self)?;
        Ok(())
    }

    fn upsert(&mut self, shape: WriteShape, row: &ConfigWrite<'_>) -> DatabaseResult<()> {
        // The catalog check does not depend on the server's message locale.
        if table_columns(self)?.accepts(shape) == Some(false) {
            return Err(DatabaseError::new(DatabaseErrorKind::ShapeUnsupported(
                format!("guild_configs does not take a {shape} write"),
            )));
        }
        match shape {
            WriteShape::Full => diesel::sql_query(UPSERT_FULL)
                .bind::<Text, _>(row.guild_id)
                .bind::<Nullable<Text>, _>(row.name)
                .bind::<Jsonb, _>(row.data)
                .execute(self)?,
            WriteShape::Minimal => diesel::sql_query(UPSERT_MINIMAL)
                .bind::<Text, _>(row.guild_id)
                .bind::<Jsonb, _>(row.data)
                .execute(self)?,
            WriteShape::Text => diesel::sql_query(UPSERT_MINIMAL)
                .bind::<Text, _>(row.guild_id)
                .bind::<Text, _>(row.encoded()?)
                .execute(self)?,
        };
        Ok(())
    }

    fn select_all(&mut self) -> DatabaseResult<Vec<(String, Option<String>)>> {
        let rows: Vec<DataRow> =
            diesel::sql_query("SELECT guild_id, data::text AS data FROM guild_configs")
                .load(self)?;
        Ok(rows.into_iter().map(|row| (row.guild_id, row.data)).collect())
    }

    fn select_one(&mut self, guild_id: &str) -> DatabaseResult<Option<Option<String>>> {
        let row: Option<DataRow> = diesel::sql_query(
            "SELECT guild_id, data::text AS data FROM guild_configs WHERE guild_id = $1",
        )
        .bind::<Text, _>(guild_id)
        .get_result(self)
        .optional()?;
        Ok(row.map(|row| row.data))
    }

    fn select_record(&mut self, guild_id: &str) -> DatabaseResult<Option<StoredRecord>> {
        if table_columns(self)?.has_metadata() == Some(false) {
            return Err(DatabaseError::new(DatabaseErrorKind::ShapeUnsupported(
                "guild_configs has no metadata columns".to_string(),
            )));
        }
        let row: Option<RecordRow> = diesel::sql_query(
            "SELECT name, data::text AS data, updated_at FROM guild_configs WHERE guild_id = $1",
        )
        .bind::<Text, _>(guild_id)
        .get_result(self)
        .optional()?;
        Ok(row.map(|row| StoredRecord {
            name: row.name,
            data: row.data,
            updated_at: row.updated_at,
        }))
    }

    fn within_transaction<T, F>(&mut self, f: F) -> DatabaseResult<T>
    where
        F: FnOnce(&mut Self) -> DatabaseResult<T>,
    {
        Connection::transaction(self, f)
    }

    fn within_savepoint<T, F>(&mut self, f: F) -> DatabaseResult<T>
    where
        F: FnOnce(&mut Self) -> DatabaseResult<T>,
    {
        // Diesel opens a savepoint when a transaction is already running.
        Connection::transaction(self, f)
    }
}

/// PostgreSQL-backed configuration store with connection pooling.
///
/// Each operation checks out its own connection on the blocking thread pool
/// and returns it when done; nothing is held between operations.
#[derive(Clone)]
pub struct PostgresGuildConfigStore {
    pool: Pool<ConnectionManager<PgConnection>>,
}

impl std::fmt::Debug for PostgresGuildConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresGuildConfigStore")
            .field("pool_state", &self.pool.state())
            .finish()
    }
}

impl PostgresGuildConfigStore {
    /// Build a lazily connecting pool for `settings`.
    pub fn connect(settings: &StoreSettings) -> DatabaseResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(settings.connection_url());
        let pool = Pool::builder()
            .max_size(*settings.pool_size())
            .min_idle(Some(0))
            .connection_timeout(Duration::from_secs(*settings.connection_timeout_secs()))
            .build_unchecked(manager);
        Ok(Self { pool })
    }

    async fn run<T, F>(&self, f: F) -> DatabaseResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> DatabaseResult<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|e| DatabaseError::new(DatabaseErrorKind::Pool(e.to_string())))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| DatabaseError::new(DatabaseErrorKind::Task(e.to_string())))?
    }
}

fn read_failure(err: DatabaseError) -> StorageError {
    StorageError::new(StorageErrorKind::Read(err.kind.to_string()))
}

fn write_failure(guild_id: &str, err: DatabaseError) -> StorageError {
    StorageError::new(StorageErrorKind::Write {
        guild_id: guild_id.to_string(),
        reason: err.kind.to_string(),
    })
}

#[async_trait]
impl GuildConfigStore for PostgresGuildConfigStore {
    fn is_enabled(&self) -> bool {
        true
    }

    #[instrument(skip(self))]
    async fn ensure_schema(&self) {
        match self.run(|conn| Ok(ensure_schema(conn))).await {
            Ok(applied) => info!(applied, "Guild config schema ensured"),
            Err(e) => warn!(error = %e, "Could not reach database to ensure schema"),
        }
    }

    #[instrument(skip(self))]
    async fn load_all(&self) -> StorageResult<BTreeMap<String, JsonValue>> {
        let configs = self.run(read_all::<PgConnection>).await.map_err(read_failure)?;
        info!(count = configs.len(), "Loaded guild configs");
        Ok(configs)
    }

    #[instrument(skip(self))]
    async fn load_one(&self, guild_id: &str) -> StorageResult<Option<JsonValue>> {
        let guild_id = guild_id.to_string();
        self.run(move |conn| read_one(conn, &guild_id))
            .await
            .map_err(read_failure)
    }

    #[instrument(skip(self))]
    async fn load_record(&self, guild_id: &str) -> StorageResult<Option<GuildConfigRecord>> {
        let owned = guild_id.to_string();
        let record = self
            .run(move |conn| read_record(conn, &owned))
            .await
            .map_err(read_failure)?;
        Ok(record.map(|record| {
            GuildConfigRecord::new(
                guild_id,
                record.name,
                record
                    .data
                    .as_deref()
                    .map(decode_stored)
                    .unwrap_or(JsonValue::Null),
                record.updated_at,
            )
        }))
    }

    #[instrument(skip(self, config))]
    async fn save_one(&self, guild_id: &str, config: &JsonValue) -> StorageResult<SaveOutcome> {
        let owned = guild_id.to_string();
        let config = config.clone();
        let shape = self
            .run(move |conn| conn.within_transaction(|t| write_tiered(t, &owned, &config)))
            .await
            .map_err(|e| write_failure(guild_id, e))?;
        info!(%shape, "Saved guild config");
        Ok(SaveOutcome::Written(shape))
    }

    #[instrument(skip(self, configs), fields(count = configs.len()))]
    async fn save_all(&self, configs: &BTreeMap<String, JsonValue>) -> StorageResult<SaveAllReport> {
        let configs = configs.clone();
        let report = self
            .run(move |conn| write_batch(conn, &configs))
            .await
            .map_err(|e| StorageError::new(StorageErrorKind::Unavailable(e.kind.to_string())))?;
        info!(
            written = report.written.len(),
            failed = report.failed.len(),
            "Saved guild configs"
        );
        Ok(report)
    }
}
