/// Generic record controller
///
/// A type-parameterized CRUD layer shared by every entity model. Each entity
/// describes itself through the [`Record`] trait (table, column list, id),
/// and its input types through [`Insert`] and [`Patch`] — explicit field
/// lists, no reflection. The controller turns those descriptions into SQL
/// and handles the one storage failure that is translated into a typed
/// application error: unique-constraint violations.
///
/// All methods are generic over `PgExecutor`, so the same operation runs
/// against the pool directly or inside an explicit transaction.
///
/// # Example
///
/// ```no_run
/// use noteleaf_shared::db::controller::{Controller, Filter};
/// use noteleaf_shared::models::user::User;
/// # use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), noteleaf_shared::db::controller::StoreError> {
/// let users: Controller<User> = Controller::new();
/// let admins = users.all(&pool, &[Filter::eq("is_admin", true)]).await?;
/// # Ok(())
/// # }
/// ```

use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::QueryAs;
use sqlx::{FromRow, PgExecutor, Postgres};
use std::marker::PhantomData;
use uuid::Uuid;

/// Defensive ceiling for paginated reads; a larger limit is clamped here.
pub const MAX_PAGE_LIMIT: i64 = 5000;

/// Error type for storage operations
///
/// Only unique-constraint violations are translated into `Validation`;
/// every other database failure propagates as `Database` and is treated
/// as fatal by callers.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested record does not exist
    #[error("Item not found")]
    NotFound,

    /// A domain or uniqueness constraint was violated
    #[error("{0}")]
    Validation(String),

    /// Any other storage failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Classifies a sqlx error, translating Postgres unique violations
    /// (SQLSTATE 23505) into `Validation` with a readable message.
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or_default();
                return StoreError::Validation(unique_violation_message(constraint));
            }
        }
        StoreError::Database(err)
    }
}

/// Derives a human-readable message from a unique-constraint name.
///
/// Postgres names default unique constraints `<table>_<column>_key`; the
/// table prefix and the `_key`/`_idx`/`_pkey`/`_unique` suffix are dropped
/// so the caller sees the offending field, not the storage detail.
pub fn unique_violation_message(constraint: &str) -> String {
    let mut parts: Vec<&str> = constraint.split('_').collect();
    if matches!(parts.last(), Some(&"key") | Some(&"idx") | Some(&"pkey") | Some(&"unique")) {
        parts.pop();
    }
    if parts.len() > 1 {
        parts.remove(0);
    }
    let field = parts.join("_");
    if field.is_empty() {
        "duplicate value violates a uniqueness constraint".to_string()
    } else {
        format!("{} is already in use", field)
    }
}

/// An entity the controller can operate on
///
/// Implementations list their columns explicitly; `COLUMNS` is the select
/// list used by every query, so it must stay in sync with the struct's
/// `FromRow` derive.
pub trait Record: for<'r> FromRow<'r, PgRow> + Clone + Send + Unpin {
    /// Table name
    const TABLE: &'static str;

    /// Comma-separated select list, in `FromRow` field order
    const COLUMNS: &'static str;

    /// Primary key of this record
    fn id(&self) -> Uuid;
}

/// Explicit insert field set for a record type
pub trait Insert<R: Record> {
    /// Column/value pairs to insert; generated columns (id, created_at)
    /// are left to the database defaults.
    fn values(&self) -> Vec<(&'static str, Value)>;
}

/// Explicit partial-update field set for a record type
///
/// Only fields present in the patch appear in `changes()`; a nullable
/// field set to an explicit null is represented by the `Nullable*`
/// variants carrying `None`. Fields absent from the patch are untouched.
pub trait Patch<R: Record> {
    fn changes(&self) -> Vec<(&'static str, Value)>;
}

/// A bindable SQL value
///
/// The nullable variants keep Postgres type inference intact when an
/// explicit NULL is written to a typed column.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    NullableText(Option<String>),
    Bool(bool),
    Int(i64),
    Uuid(Uuid),
    NullableUuid(Option<Uuid>),
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

/// Filter comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// Exact equality
    Eq,
    /// Case-insensitive substring match (SQL `ILIKE '%..%'`)
    Contains,
}

/// A single predicate restricting a query
#[derive(Debug, Clone)]
pub struct Filter {
    pub column: &'static str,
    pub op: Op,
    pub value: Value,
}

impl Filter {
    /// Equality predicate on a named column
    pub fn eq(column: &'static str, value: impl Into<Value>) -> Self {
        Self {
            column,
            op: Op::Eq,
            value: value.into(),
        }
    }

    /// Case-insensitive substring predicate on a text column
    ///
    /// The needle is matched literally; `%`, `_`, and `\` in it have no
    /// pattern meaning.
    pub fn contains(column: &'static str, needle: impl Into<String>) -> Self {
        Self {
            column,
            op: Op::Contains,
            value: Value::Text(escape_like(&needle.into())),
        }
    }
}

/// Escapes `ILIKE` pattern metacharacters so a needle matches literally.
///
/// Postgres treats backslash as the default escape character inside
/// LIKE/ILIKE patterns, so escaping the needle before binding is enough.
pub fn escape_like(needle: &str) -> String {
    needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Binds a [`Value`] onto a query, preserving its SQL type.
fn bind_value<'q, O>(
    query: QueryAs<'q, Postgres, O, PgArguments>,
    value: &Value,
) -> QueryAs<'q, Postgres, O, PgArguments> {
    match value {
        Value::Text(v) => query.bind(v.clone()),
        Value::NullableText(v) => query.bind(v.clone()),
        Value::Bool(v) => query.bind(*v),
        Value::Int(v) => query.bind(*v),
        Value::Uuid(v) => query.bind(*v),
        Value::NullableUuid(v) => query.bind(*v),
    }
}

/// Renders a WHERE clause for the given filters, with placeholders
/// starting at `$first_placeholder`. Empty filters render nothing.
fn where_clause(filters: &[Filter], first_placeholder: usize) -> String {
    if filters.is_empty() {
        return String::new();
    }
    let predicates: Vec<String> = filters
        .iter()
        .enumerate()
        .map(|(i, f)| {
            let n = first_placeholder + i;
            match f.op {
                Op::Eq => format!("{} = ${}", f.column, n),
                Op::Contains => format!("{} ILIKE '%' || ${} || '%'", f.column, n),
            }
        })
        .collect();
    format!(" WHERE {}", predicates.join(" AND "))
}

/// Type-parameterized CRUD controller
///
/// Stateless; one `Controller<R>` per entity type, usually held as an
/// associated constant on the model.
pub struct Controller<R: Record> {
    _entity: PhantomData<R>,
}

impl<R: Record> Default for Controller<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> Controller<R> {
    pub const fn new() -> Self {
        Self {
            _entity: PhantomData,
        }
    }

    fn select_sql(filters: &[Filter]) -> String {
        format!(
            "SELECT {} FROM {}{}",
            R::COLUMNS,
            R::TABLE,
            where_clause(filters, 1)
        )
    }

    /// First matching record, or `None` without error.
    pub async fn first<'e, E>(&self, exec: E, filters: &[Filter]) -> Result<Option<R>, StoreError>
    where
        E: PgExecutor<'e>,
    {
        let sql = format!("{} LIMIT 1", Self::select_sql(filters));
        let mut query = sqlx::query_as::<_, R>(&sql);
        for f in filters {
            query = bind_value(query, &f.value);
        }
        query.fetch_optional(exec).await.map_err(StoreError::from_sqlx)
    }

    /// First matching record; `NotFound` if nothing matches.
    pub async fn first_or_error<'e, E>(&self, exec: E, filters: &[Filter]) -> Result<R, StoreError>
    where
        E: PgExecutor<'e>,
    {
        self.first(exec, filters).await?.ok_or(StoreError::NotFound)
    }

    /// Every matching record, in natural storage order.
    pub async fn all<'e, E>(&self, exec: E, filters: &[Filter]) -> Result<Vec<R>, StoreError>
    where
        E: PgExecutor<'e>,
    {
        let sql = Self::select_sql(filters);
        let mut query = sqlx::query_as::<_, R>(&sql);
        for f in filters {
            query = bind_value(query, &f.value);
        }
        query.fetch_all(exec).await.map_err(StoreError::from_sqlx)
    }

    /// Shorthand for `all` restricted by exact-match equality on named fields.
    pub async fn all_by<'e, E>(
        &self,
        exec: E,
        fields: &[(&'static str, Value)],
    ) -> Result<Vec<R>, StoreError>
    where
        E: PgExecutor<'e>,
    {
        let filters: Vec<Filter> = fields
            .iter()
            .map(|(column, value)| Filter::eq(column, value.clone()))
            .collect();
        self.all(exec, &filters).await
    }

    /// Single record by id.
    ///
    /// With `error_on_missing`, an absent record is `NotFound`; otherwise
    /// absence is `Ok(None)`.
    pub async fn get_by_id<'e, E>(
        &self,
        exec: E,
        id: Uuid,
        error_on_missing: bool,
    ) -> Result<Option<R>, StoreError>
    where
        E: PgExecutor<'e>,
    {
        let record = self.first(exec, &[Filter::eq("id", id)]).await?;
        if record.is_none() && error_on_missing {
            return Err(StoreError::NotFound);
        }
        Ok(record)
    }

    /// Number of matching records.
    pub async fn count<'e, E>(&self, exec: E, filters: &[Filter]) -> Result<i64, StoreError>
    where
        E: PgExecutor<'e>,
    {
        let sql = format!(
            "SELECT COUNT(*) FROM {}{}",
            R::TABLE,
            where_clause(filters, 1)
        );
        let mut query = sqlx::query_as::<_, (i64,)>(&sql);
        for f in filters {
            query = bind_value(query, &f.value);
        }
        let (count,) = query.fetch_one(exec).await.map_err(StoreError::from_sqlx)?;
        Ok(count)
    }

    /// Paginated read, identifier-ascending so pages are stable.
    ///
    /// `limit` is clamped to [`MAX_PAGE_LIMIT`].
    pub async fn read_page<'e, E>(&self, exec: E, skip: i64, limit: i64) -> Result<Vec<R>, StoreError>
    where
        E: PgExecutor<'e>,
    {
        let limit = limit.clamp(0, MAX_PAGE_LIMIT);
        let sql = format!(
            "SELECT {} FROM {} ORDER BY id ASC OFFSET $1 LIMIT $2",
            R::COLUMNS,
            R::TABLE
        );
        sqlx::query_as::<_, R>(&sql)
            .bind(skip.max(0))
            .bind(limit)
            .fetch_all(exec)
            .await
            .map_err(StoreError::from_sqlx)
    }

    /// Inserts a new record and returns it with generated id and timestamps.
    ///
    /// A unique-constraint violation becomes `StoreError::Validation`
    /// carrying a message derived from the constraint name; the statement
    /// is atomic so nothing is left behind.
    pub async fn create<'e, E, I>(&self, exec: E, input: &I) -> Result<R, StoreError>
    where
        E: PgExecutor<'e>,
        I: Insert<R>,
    {
        let values = input.values();
        let columns: Vec<&str> = values.iter().map(|(c, _)| *c).collect();
        let placeholders: Vec<String> = (1..=values.len()).map(|n| format!("${}", n)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            R::TABLE,
            columns.join(", "),
            placeholders.join(", "),
            R::COLUMNS
        );
        let mut query = sqlx::query_as::<_, R>(&sql);
        for (_, value) in &values {
            query = bind_value(query, value);
        }
        query.fetch_one(exec).await.map_err(StoreError::from_sqlx)
    }

    /// Applies a partial update to an existing record.
    ///
    /// Only fields present in the patch are written; an empty patch is a
    /// no-op returning the record unchanged. `updated_at` is stamped on
    /// every effective update.
    pub async fn update<'e, E, P>(&self, exec: E, record: &R, patch: &P) -> Result<R, StoreError>
    where
        E: PgExecutor<'e>,
        P: Patch<R>,
    {
        let changes = patch.changes();
        if changes.is_empty() {
            return Ok(record.clone());
        }

        let assignments: Vec<String> = changes
            .iter()
            .enumerate()
            .map(|(i, (column, _))| format!("{} = ${}", column, i + 2))
            .collect();
        let sql = format!(
            "UPDATE {} SET updated_at = NOW(), {} WHERE id = $1 RETURNING {}",
            R::TABLE,
            assignments.join(", "),
            R::COLUMNS
        );
        let mut query = sqlx::query_as::<_, R>(&sql).bind(record.id());
        for (_, value) in &changes {
            query = bind_value(query, value);
        }
        query
            .fetch_optional(exec)
            .await
            .map_err(StoreError::from_sqlx)?
            .ok_or(StoreError::NotFound)
    }

    /// Deletes a record by id and returns the removed record.
    pub async fn delete_by_id<'e, E>(&self, exec: E, id: Uuid) -> Result<R, StoreError>
    where
        E: PgExecutor<'e>,
    {
        let sql = format!(
            "DELETE FROM {} WHERE id = $1 RETURNING {}",
            R::TABLE,
            R::COLUMNS
        );
        sqlx::query_as::<_, R>(&sql)
            .bind(id)
            .fetch_optional(exec)
            .await
            .map_err(StoreError::from_sqlx)?
            .ok_or(StoreError::NotFound)
    }
}
