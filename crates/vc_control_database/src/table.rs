//! Backend-neutral table operations for guild configuration rows.
//!
//! [`ConfigTable`] is the seam between the store's policies (which write shape
//! to try, how to decode stored text, how a batch keeps going past a bad row)
//! and the connection that actually runs SQL. `PgConnection` implements it in
//! the `postgres` module.

use crate::DatabaseResult;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use tracing::{debug, instrument, warn};
use vc_control_core::keys;
use vc_control_error::{DatabaseError, DatabaseErrorKind};

use crate::store::SaveAllReport;

/// Idempotent, additive schema statements, applied in order.
pub const SCHEMA_STATEMENTS: [&str; 3] = [
    "CREATE TABLE IF NOT EXISTS guild_configs (\
     guild_id TEXT PRIMARY KEY, \
     name TEXT, \
     data JSONB NOT NULL, \
     updated_at TIMESTAMPTZ)",
    "ALTER TABLE guild_configs ADD COLUMN IF NOT EXISTS name TEXT",
    "ALTER TABLE guild_configs ADD COLUMN IF NOT EXISTS updated_at TIMESTAMPTZ",
];

/// Row shape used for an upsert, richest first.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum WriteShape {
    /// `guild_id`, `name`, JSON `data` and `updated_at = now()`
    Full,
    /// `guild_id` and JSON `data`
    Minimal,
    /// `guild_id` and `data` bound as JSON-encoded text
    Text,
}

/// A single guild's row as handed to [`ConfigTable::upsert`].
#[derive(Debug, Clone, Copy)]
pub struct ConfigWrite<'a> {
    /// Primary key
    pub guild_id: &'a str,
    /// Display label copied out of the config's `name` key
    pub name: Option<&'a str>,
    /// Settings object
    pub data: &'a JsonValue,
}

impl<'a> ConfigWrite<'a> {
    /// Build the row for `guild_id` holding `data`.
    pub fn new(guild_id: &'a str, data: &'a JsonValue) -> Self {
        Self {
            guild_id,
            name: data.get(keys::NAME).and_then(JsonValue::as_str),
            data,
        }
    }

    /// `data` as JSON-encoded text.
    pub fn encoded(&self) -> DatabaseResult<String> {
        Ok(serde_json::to_string(self.data)?)
    }
}

/// A stored row including its metadata columns.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    /// Display label, if the column exists and is set
    pub name: Option<String>,
    /// `data` rendered as text
    pub data: Option<String>,
    /// Last write time, if the column exists and is set
    pub updated_at: Option<DateTime<Utc>>,
}

/// Columns of the live `guild_configs` table, keyed by name with the
/// catalog's `data_type` as value.
///
/// Lets a backend decide whether a shape fits without relying on the
/// wording of server error messages, which follows the server's locale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableColumns(BTreeMap<String, String>);

impl TableColumns {
    /// Build from `(column_name, data_type)` pairs.
    pub fn new<I, N, D>(columns: I) -> Self
    where
        I: IntoIterator<Item = (N, D)>,
        N: Into<String>,
        D: Into<String>,
    {
        Self(
            columns
                .into_iter()
                .map(|(name, data_type)| (name.into(), data_type.into().to_lowercase()))
                .collect(),
        )
    }

    fn has(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    fn data_is_json(&self) -> Option<bool> {
        self.0
            .get("data")
            .map(|data_type| matches!(data_type.as_str(), "json" | "jsonb"))
    }

    /// Whether `shape` can be written, `None` when the table was not found.
    ///
    /// # Examples
    ///
    /// ```
    /// use vc_control_database::{TableColumns, WriteShape};
    ///
    /// let legacy = TableColumns::new([("guild_id", "text"), ("data", "text")]);
    /// assert_eq!(legacy.accepts(WriteShape::Minimal), Some(false));
    /// assert_eq!(legacy.accepts(WriteShape::Text), Some(true));
    /// ```
    pub fn accepts(&self, shape: WriteShape) -> Option<bool> {
        let json = self.data_is_json()?;
        Some(match shape {
            WriteShape::Full => json && self.has("name") && self.has("updated_at"),
            WriteShape::Minimal => json,
            WriteShape::Text => !json,
        })
    }

    /// Whether the metadata columns can be selected, `None` when the table
    /// was not found.
    pub fn has_metadata(&self) -> Option<bool> {
        self.data_is_json()?;
        Some(self.has("name") && self.has("updated_at"))
    }
}

/// SQL operations the store needs from a connection.
///
/// Implementors report schema mismatches as
/// [`DatabaseErrorKind::ShapeUnsupported`] so the tier chain can tell them
/// apart from every other failure.
pub trait ConfigTable {
    /// Run one schema statement outside any transaction.
    fn execute_ddl(&mut self, statement: &str) -> DatabaseResult<()>;

    /// Insert or update one row using `shape`.
    fn upsert(&mut self, shape: WriteShape, row: &ConfigWrite<'_>) -> DatabaseResult<()>;

    /// Every row as `(guild_id, data text)`.
    fn select_all(&mut self) -> DatabaseResult<Vec<(String, Option<String>)>>;

    /// One row's data text.
    fn select_one(&mut self, guild_id: &str) -> DatabaseResult<Option<Option<String>>>;

    /// One row with its metadata columns.
    fn select_record(&mut self, guild_id: &str) -> DatabaseResult<Option<StoredRecord>>;

    /// Run `f` in a transaction, committing on `Ok`.
    fn within_transaction<T, F>(&mut self, f: F) -> DatabaseResult<T>
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> DatabaseResult<T>;

    /// Run `f` in a savepoint nested in the current transaction, rolling
    /// back to it on `Err`.
    fn within_savepoint<T, F>(&mut self, f: F) -> DatabaseResult<T>
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> DatabaseResult<T>;
}

/// Apply [`SCHEMA_STATEMENTS`], logging and skipping any that fail.
///
/// Returns how many statements succeeded.
#[instrument(name = "config_table.ensure_schema", skip(table))]
pub fn ensure_schema<T: ConfigTable>(table: &mut T) -> usize {
    let mut applied = 0;
    for statement in SCHEMA_STATEMENTS {
        match table.execute_ddl(statement) {
            Ok(()) => applied += 1,
            Err(e) => warn!(error = %e, statement, "Schema statement failed, continuing"),
        }
    }
    debug!(applied, total = SCHEMA_STATEMENTS.len(), "Schema ensured");
    applied
}

/// Decode a stored `data` value.
///
/// Text holding JSON is parsed; a JSON string whose content is itself a JSON
/// object (written double-encoded) is unwrapped; anything unparseable comes
/// back as a JSON string holding the raw text.
///
/// # Examples
///
/// ```
/// use vc_control_database::decode_stored;
/// use serde_json::json;
///
/// assert_eq!(decode_stored(r#"{"guest_role": 30}"#), json!({"guest_role": 30}));
/// assert_eq!(decode_stored(r#""{\"guest_role\": 30}""#), json!({"guest_role": 30}));
/// assert_eq!(decode_stored("{broken"), json!("{broken"));
/// ```
pub fn decode_stored(raw: &str) -> JsonValue {
    match serde_json::from_str::<JsonValue>(raw) {
        Ok(JsonValue::String(inner)) => match serde_json::from_str::<JsonValue>(&inner) {
            Ok(object @ JsonValue::Object(_)) => object,
            _ => JsonValue::String(inner),
        },
        Ok(value) => value,
        Err(_) => JsonValue::String(raw.to_string()),
    }
}

fn decode_column(raw: Option<String>) -> JsonValue {
    raw.as_deref().map(decode_stored).unwrap_or(JsonValue::Null)
}

/// Load every row as guild id → decoded config.
pub fn read_all<T: ConfigTable>(table: &mut T) -> DatabaseResult<BTreeMap<String, JsonValue>> {
    Ok(table
        .select_all()?
        .into_iter()
        .map(|(guild_id, raw)| (guild_id, decode_column(raw)))
        .collect())
}

/// Load one guild's decoded config, `None` when no row exists.
pub fn read_one<T: ConfigTable>(table: &mut T, guild_id: &str) -> DatabaseResult<Option<JsonValue>> {
    Ok(table.select_one(guild_id)?.map(decode_column))
}

/// Load one row with metadata, falling back to data only on tables that
/// lack the metadata columns.
pub fn read_record<T: ConfigTable>(
    table: &mut T,
    guild_id: &str,
) -> DatabaseResult<Option<StoredRecord>> {
    match table.select_record(guild_id) {
        Err(e) if e.is_shape_unsupported() => {
            debug!(error = %e, "Metadata columns unavailable, reading data only");
            Ok(table.select_one(guild_id)?.map(|data| StoredRecord {
                name: None,
                data,
                updated_at: None,
            }))
        }
        other => other,
    }
}

/// Upsert one guild, trying each [`WriteShape`] in turn.
///
/// Each attempt runs in its own savepoint. Only shape-unsupported failures
/// fall through to the next shape; any other failure is returned as-is.
#[instrument(name = "config_table.write_tiered", skip(table, config), fields(shape = tracing::field::Empty))]
pub fn write_tiered<T: ConfigTable>(
    table: &mut T,
    guild_id: &str,
    config: &JsonValue,
) -> DatabaseResult<WriteShape> {
    let row = ConfigWrite::new(guild_id, config);
    let mut last_mismatch = None;

    for shape in [WriteShape::Full, WriteShape::Minimal, WriteShape::Text] {
        match table.within_savepoint(|t| t.upsert(shape, &row)) {
            Ok(()) => {
                tracing::Span::current().record("shape", shape.as_ref());
                if shape != WriteShape::Full {
                    debug!(%shape, "Wrote guild config with a degraded shape");
                }
                return Ok(shape);
            }
            Err(e) if e.is_shape_unsupported() => {
                debug!(%shape, error = %e, "Write shape unsupported, trying next");
                last_mismatch = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_mismatch.unwrap_or_else(|| {
        DatabaseError::new(DatabaseErrorKind::ShapeUnsupported(
            "no write shape accepted".to_string(),
        ))
    }))
}

/// Upsert every entry in one transaction, continuing past entries whose
/// tier chain fails.
#[instrument(name = "config_table.write_batch", skip(table, configs), fields(count = configs.len()))]
pub fn write_batch<T: ConfigTable>(
    table: &mut T,
    configs: &BTreeMap<String, JsonValue>,
) -> DatabaseResult<SaveAllReport> {
    table.within_transaction(|t| {
        let mut report = SaveAllReport::default();
        for (guild_id, config) in configs {
            match write_tiered(t, guild_id, config) {
                Ok(shape) => report.written.push((guild_id.clone(), shape)),
                Err(e) => {
                    warn!(guild_id, error = %e, "Failed to write guild config, continuing batch");
                    report.failed.push((guild_id.clone(), e.kind.to_string()));
                }
            }
        }
        Ok(report)
    })
}
