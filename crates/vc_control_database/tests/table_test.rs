//! Tier fallback and decoding tests against an in-memory table.

use serde_json::{Value as JsonValue, json};
use std::collections::BTreeMap;
use vc_control_database::{
    ConfigTable, ConfigWrite, DatabaseResult, StoredRecord, TableColumns, WriteShape, ensure_schema,
    read_all, read_one, read_record, write_batch, write_tiered,
};
use vc_control_error::{DatabaseError, DatabaseErrorKind};

#[derive(Debug, Clone, PartialEq)]
struct Row {
    name: Option<String>,
    data: String,
    touched: bool,
}

/// Table double whose columns can be made to look like older deployments.
#[derive(Debug, Clone)]
struct FakeTable {
    has_name: bool,
    has_updated_at: bool,
    text_data: bool,
    failing_ddl: Option<&'static str>,
    refused_guild: Option<&'static str>,
    rows: BTreeMap<String, Row>,
    attempts: Vec<WriteShape>,
    transactions: usize,
    aborted: bool,
}

impl FakeTable {
    fn current() -> Self {
        Self {
            has_name: true,
            has_updated_at: true,
            text_data: false,
            failing_ddl: None,
            refused_guild: None,
            rows: BTreeMap::new(),
            attempts: Vec::new(),
            transactions: 0,
            aborted: false,
        }
    }

    fn without_metadata_columns() -> Self {
        Self {
            has_name: false,
            has_updated_at: false,
            ..Self::current()
        }
    }

    fn with_text_data() -> Self {
        Self {
            text_data: true,
            ..Self::current()
        }
    }

    fn insert_raw(&mut self, guild_id: &str, data: &str) {
        self.rows.insert(
            guild_id.to_string(),
            Row {
                name: None,
                data: data.to_string(),
                touched: false,
            },
        );
    }

    fn upsert_row(&mut self, shape: WriteShape, row: &ConfigWrite<'_>) -> DatabaseResult<()> {
        if self.refused_guild == Some(row.guild_id) {
            return Err(DatabaseError::new(DatabaseErrorKind::Query(
                "permission denied for table guild_configs".to_string(),
            )));
        }

        let name = match shape {
            WriteShape::Full => {
                if !self.has_name {
                    return Err(Self::shape_error(
                        r#"column "name" of relation "guild_configs" does not exist"#,
                    ));
                }
                if self.text_data {
                    return Err(Self::shape_error(
                        r#"column "data" is of type text but expression is of type jsonb"#,
                    ));
                }
                row.name.map(str::to_string)
            }
            WriteShape::Minimal => {
                if self.text_data {
                    return Err(Self::shape_error(
                        r#"column "data" is of type text but expression is of type jsonb"#,
                    ));
                }
                None
            }
            WriteShape::Text => {
                if !self.text_data {
                    return Err(Self::shape_error(
                        r#"column "data" is of type jsonb but expression is of type text"#,
                    ));
                }
                None
            }
        };

        let previous_name = self.rows.get(row.guild_id).and_then(|r| r.name.clone());
        self.rows.insert(
            row.guild_id.to_string(),
            Row {
                name: name.or(previous_name),
                data: row.encoded()?,
                touched: shape == WriteShape::Full,
            },
        );
        Ok(())
    }

    fn shape_error(message: &str) -> DatabaseError {
        DatabaseError::new(DatabaseErrorKind::classify(message))
    }
}

impl ConfigTable for FakeTable {
    fn execute_ddl(&mut self, statement: &str) -> DatabaseResult<()> {
        if self.failing_ddl.is_some_and(|fragment| statement.contains(fragment)) {
            return Err(DatabaseError::new(DatabaseErrorKind::Query(
                "must be owner of table guild_configs".to_string(),
            )));
        }
        if statement.contains("ADD COLUMN IF NOT EXISTS name") {
            self.has_name = true;
        }
        if statement.contains("ADD COLUMN IF NOT EXISTS updated_at") {
            self.has_updated_at = true;
        }
        Ok(())
    }

    fn upsert(&mut self, shape: WriteShape, row: &ConfigWrite<'_>) -> DatabaseResult<()> {
        self.attempts.push(shape);
        if self.aborted {
            return Err(DatabaseError::new(DatabaseErrorKind::Query(
                "current transaction is aborted, commands ignored until end of transaction block"
                    .to_string(),
            )));
        }
        let result = self.upsert_row(shape, row);
        self.aborted = result.is_err();
        result
    }

    fn select_all(&mut self) -> DatabaseResult<Vec<(String, Option<String>)>> {
        Ok(self
            .rows
            .iter()
            .map(|(id, row)| (id.clone(), Some(row.data.clone())))
            .collect())
    }

    fn select_one(&mut self, guild_id: &str) -> DatabaseResult<Option<Option<String>>> {
        Ok(self.rows.get(guild_id).map(|row| Some(row.data.clone())))
    }

    fn select_record(&mut self, guild_id: &str) -> DatabaseResult<Option<StoredRecord>> {
        if !self.has_name || !self.has_updated_at {
            return Err(Self::shape_error(r#"column "name" does not exist"#));
        }
        Ok(self.rows.get(guild_id).map(|row| StoredRecord {
            name: row.name.clone(),
            data: Some(row.data.clone()),
            updated_at: None,
        }))
    }

    fn within_transaction<T, F>(&mut self, f: F) -> DatabaseResult<T>
    where
        F: FnOnce(&mut Self) -> DatabaseResult<T>,
    {
        self.transactions += 1;
        self.aborted = false;
        let result = self.within_savepoint(f)?;
        if self.aborted {
            return Err(DatabaseError::new(DatabaseErrorKind::Query(
                "transaction aborted before commit".to_string(),
            )));
        }
        Ok(result)
    }

    fn within_savepoint<T, F>(&mut self, f: F) -> DatabaseResult<T>
    where
        F: FnOnce(&mut Self) -> DatabaseResult<T>,
    {
        let snapshot = self.rows.clone();
        let result = f(self);
        if result.is_err() {
            self.rows = snapshot;
            self.aborted = false;
        }
        result
    }
}

fn sample() -> JsonValue {
    json!({
        "name": "Guild One",
        "allowed_roles": [10],
        "verified_roles": [20],
        "guest_role": 30,
        "log_channel": 40,
        "custom": {"keep": true},
    })
}

#[test]
fn test_current_table_uses_full_shape() {
    let mut table = FakeTable::current();
    let shape = write_tiered(&mut table, "1", &sample()).expect("write succeeds");

    assert_eq!(shape, WriteShape::Full);
    assert_eq!(table.attempts, vec![WriteShape::Full]);
    assert_eq!(table.rows["1"].name.as_deref(), Some("Guild One"));
    assert!(table.rows["1"].touched);
    assert_eq!(read_one(&mut table, "1").expect("read"), Some(sample()));
}

#[test]
fn test_missing_columns_fall_back_to_minimal() {
    let mut table = FakeTable::without_metadata_columns();
    let shape = write_tiered(&mut table, "1", &sample()).expect("write succeeds");

    assert_eq!(shape, WriteShape::Minimal);
    assert_eq!(table.attempts, vec![WriteShape::Full, WriteShape::Minimal]);
    assert_eq!(read_one(&mut table, "1").expect("read"), Some(sample()));
}

#[test]
fn test_text_column_falls_back_to_text() {
    let mut table = FakeTable::with_text_data();
    let shape = write_tiered(&mut table, "1", &sample()).expect("write succeeds");

    assert_eq!(shape, WriteShape::Text);
    assert_eq!(
        table.attempts,
        vec![WriteShape::Full, WriteShape::Minimal, WriteShape::Text]
    );
    assert_eq!(read_one(&mut table, "1").expect("read"), Some(sample()));
}

#[test]
fn test_other_failures_are_not_retried() {
    let mut table = FakeTable::current();
    table.refused_guild = Some("1");

    let err = write_tiered(&mut table, "1", &sample()).expect_err("write refused");

    assert!(!err.is_shape_unsupported());
    assert_eq!(table.attempts, vec![WriteShape::Full]);
    assert!(table.rows.is_empty());
}

#[test]
fn test_repeated_writes_keep_one_row() {
    let mut table = FakeTable::current();
    write_tiered(&mut table, "1", &sample()).expect("first write");
    let replacement = json!({"guest_role": 31});
    write_tiered(&mut table, "1", &replacement).expect("second write");

    assert_eq!(table.rows.len(), 1);
    assert_eq!(read_one(&mut table, "1").expect("read"), Some(replacement));
}

#[test]
fn test_batch_continues_past_failing_entry() {
    let mut table = FakeTable::current();
    table.refused_guild = Some("2");

    let configs: BTreeMap<String, JsonValue> = [
        ("1".to_string(), json!({"guest_role": 1})),
        ("2".to_string(), json!({"guest_role": 2})),
        ("3".to_string(), json!({"guest_role": 3})),
    ]
    .into_iter()
    .collect();

    let report = write_batch(&mut table, &configs).expect("batch commits");

    assert_eq!(table.transactions, 1);
    assert!(!report.is_complete());
    assert_eq!(
        report.written,
        vec![
            ("1".to_string(), WriteShape::Full),
            ("3".to_string(), WriteShape::Full)
        ]
    );
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "2");
    assert!(report.failed[0].1.contains("permission denied"));

    let stored = read_all(&mut table).expect("read all");
    assert_eq!(stored.keys().collect::<Vec<_>>(), vec!["1", "3"]);
}

fn batch() -> BTreeMap<String, JsonValue> {
    [
        ("1".to_string(), sample()),
        ("2".to_string(), json!({"guest_role": 2})),
        ("3".to_string(), json!({"verified_roles": [3, 4]})),
    ]
    .into_iter()
    .collect()
}

#[test]
fn test_batch_on_legacy_columns_writes_minimal_rows() {
    let mut table = FakeTable::without_metadata_columns();
    let configs = batch();

    let report = write_batch(&mut table, &configs).expect("batch commits");

    assert!(report.is_complete());
    assert_eq!(table.transactions, 1);
    assert_eq!(
        report.written,
        vec![
            ("1".to_string(), WriteShape::Minimal),
            ("2".to_string(), WriteShape::Minimal),
            ("3".to_string(), WriteShape::Minimal),
        ]
    );
    assert_eq!(read_all(&mut table).expect("read all"), configs);
}

#[test]
fn test_batch_on_text_column_writes_text_rows() {
    let mut table = FakeTable::with_text_data();
    let configs = batch();

    let report = write_batch(&mut table, &configs).expect("batch commits");

    assert!(report.is_complete());
    assert_eq!(table.transactions, 1);
    assert_eq!(
        report.written,
        vec![
            ("1".to_string(), WriteShape::Text),
            ("2".to_string(), WriteShape::Text),
            ("3".to_string(), WriteShape::Text),
        ]
    );
    // every entry falls through Full and Minimal first
    assert_eq!(table.attempts.len(), 9);
    assert_eq!(read_all(&mut table).expect("read all"), configs);
}

#[test]
fn test_ensure_schema_upgrades_legacy_table() {
    let mut table = FakeTable::without_metadata_columns();
    assert_eq!(ensure_schema(&mut table), 3);

    let shape = write_tiered(&mut table, "1", &sample()).expect("write succeeds");
    assert_eq!(shape, WriteShape::Full);
}

#[test]
fn test_ensure_schema_skips_failing_statements() {
    let mut table = FakeTable::without_metadata_columns();
    table.failing_ddl = Some("CREATE TABLE");

    assert_eq!(ensure_schema(&mut table), 2);
    assert!(table.has_name);
    assert!(table.has_updated_at);
}

#[test]
fn test_read_record_degrades_without_metadata_columns() {
    let mut table = FakeTable::without_metadata_columns();
    table.insert_raw("1", r#"{"guest_role": 30}"#);

    let record = read_record(&mut table, "1")
        .expect("read")
        .expect("row exists");
    assert_eq!(record.name, None);
    assert_eq!(record.data.as_deref(), Some(r#"{"guest_role": 30}"#));

    assert_eq!(read_record(&mut table, "2").expect("read"), None);
}

#[test]
fn test_read_record_includes_name() {
    let mut table = FakeTable::current();
    write_tiered(&mut table, "1", &sample()).expect("write");

    let record = read_record(&mut table, "1")
        .expect("read")
        .expect("row exists");
    assert_eq!(record.name.as_deref(), Some("Guild One"));
}

#[test]
fn test_legacy_text_rows_decode() {
    let mut table = FakeTable::with_text_data();
    table.insert_raw("1", r#""{\"guest_role\": 30}""#);
    table.insert_raw("2", "not json {");
    table.insert_raw("3", r#"{"log_channel": "40"}"#);

    let stored = read_all(&mut table).expect("read all");

    assert_eq!(stored["1"], json!({"guest_role": 30}));
    assert_eq!(stored["2"], json!("not json {"));
    assert_eq!(stored["3"], json!({"log_channel": "40"}));
    assert_eq!(read_one(&mut table, "4").expect("read"), None);
}

#[test]
fn test_catalog_columns_decide_write_shapes() {
    let current = TableColumns::new([
        ("guild_id", "text"),
        ("name", "text"),
        ("data", "jsonb"),
        ("updated_at", "timestamp with time zone"),
    ]);
    assert_eq!(current.accepts(WriteShape::Full), Some(true));
    assert_eq!(current.accepts(WriteShape::Minimal), Some(true));
    assert_eq!(current.accepts(WriteShape::Text), Some(false));
    assert_eq!(current.has_metadata(), Some(true));

    let legacy = TableColumns::new([("guild_id", "text"), ("data", "JSON")]);
    assert_eq!(legacy.accepts(WriteShape::Full), Some(false));
    assert_eq!(legacy.accepts(WriteShape::Minimal), Some(true));
    assert_eq!(legacy.has_metadata(), Some(false));

    let text = TableColumns::new([("guild_id", "text"), ("data", "text")]);
    assert_eq!(text.accepts(WriteShape::Minimal), Some(false));
    assert_eq!(text.accepts(WriteShape::Text), Some(true));
}

#[test]
fn test_missing_table_leaves_decision_to_server() {
    let missing = TableColumns::default();
    assert_eq!(missing.accepts(WriteShape::Full), None);
    assert_eq!(missing.has_metadata(), None);
}

#[test]
fn test_localized_server_messages_are_not_shape_errors() {
    let kind = DatabaseErrorKind::classify(
        r#"Spalte »name« von Relation »guild_configs« existiert nicht"#,
    );
    assert!(!kind.is_shape_unsupported());
}
