//! Database error types.

/// Database error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum DatabaseErrorKind {
    /// Connection failed
    #[display("Database connection error: {}", _0)]
    Connection(String),
    /// Connection pool could not hand out a connection
    #[display("Connection pool error: {}", _0)]
    Pool(String),
    /// Query execution failed
    #[display("Database query error: {}", _0)]
    Query(String),
    /// The table does not have the columns or column types a write assumed
    #[display("Unsupported table shape: {}", _0)]
    ShapeUnsupported(String),
    /// Serialization/deserialization error
    #[display("Serialization error: {}", _0)]
    Serialization(String),
    /// Blocking database task did not complete
    #[display("Database task failed: {}", _0)]
    Task(String),
}

impl DatabaseErrorKind {
    /// Classify a server error message.
    ///
    /// Undefined-column and datatype-mismatch failures mean the statement
    /// does not fit the table's shape; everything else is a plain query error.
    ///
    /// Matching assumes the server reports errors in English
    /// (`lc_messages = 'C'` or an English locale). Diesel does not expose the
    /// SQLSTATE, so the PostgreSQL backend also checks the table's columns in
    /// `information_schema` before each write and does not rely on this alone.
    ///
    /// # Examples
    ///
    /// ```
    /// use vc_control_error::DatabaseErrorKind;
    ///
    /// let kind = DatabaseErrorKind::classify(
    ///     r#"column "name" of relation "guild_configs" does not exist"#,
    /// );
    /// assert!(kind.is_shape_unsupported());
    ///
    /// let kind = DatabaseErrorKind::classify("permission denied for table guild_configs");
    /// assert!(!kind.is_shape_unsupported());
    /// ```
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        let undefined_column = lower.contains("column") && lower.contains("does not exist");
        let type_mismatch =
            lower.contains("is of type") && lower.contains("but expression is of type");
        if undefined_column || type_mismatch {
            Self::ShapeUnsupported(message.to_string())
        } else {
            Self::Query(message.to_string())
        }
    }

    /// Whether a write with a narrower shape may still succeed.
    pub fn is_shape_unsupported(&self) -> bool {
        matches!(self, Self::ShapeUnsupported(_))
    }
}

/// Database error with source location tracking.
///
/// # Examples
///
/// ```
/// use vc_control_error::{DatabaseError, DatabaseErrorKind};
///
/// let err = DatabaseError::new(DatabaseErrorKind::Pool("timed out".into()));
/// assert!(format!("{}", err).contains("timed out"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Database Error: {} at line {} in {}", kind, line, file)]
pub struct DatabaseError {
    /// The kind of error that occurred
    pub kind: DatabaseErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl DatabaseError {
    /// Create a new DatabaseError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: DatabaseErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Whether a write with a narrower shape may still succeed.
    pub fn is_shape_unsupported(&self) -> bool {
        self.kind.is_shape_unsupported()
    }
}

impl From<diesel::result::Error> for DatabaseError {
    #[track_caller]
    fn from(err: diesel::result::Error) -> Self {
        match &err {
            diesel::result::Error::DatabaseError(_, info) => {
                DatabaseError::new(DatabaseErrorKind::classify(info.message()))
            }
            _ => DatabaseError::new(DatabaseErrorKind::Query(err.to_string())),
        }
    }
}

impl From<diesel::ConnectionError> for DatabaseError {
    #[track_caller]
    fn from(err: diesel::ConnectionError) -> Self {
        DatabaseError::new(DatabaseErrorKind::Connection(err.to_string()))
    }
}

impl From<serde_json::Error> for DatabaseError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        DatabaseError::new(DatabaseErrorKind::Serialization(err.to_string()))
    }
}
