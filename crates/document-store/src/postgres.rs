use async_trait::async_trait;
use futures_util::TryStreamExt;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::document::document_id;
use crate::store::{DeleteResult, DocumentStore, UpdateResult, record_operation};
use crate::{
    Collection, Context, Document, EntityStoreError, Filter, ID_FIELD, Lookup, Pipeline, Result,
    Stage, Unwind,
};

/// PostgreSQL-backed document store implementation.
///
/// Every collection lives in one `documents` table as JSONB rows keyed by
/// `(collection, id)`. Pipelines are compiled to a single SQL statement so
/// the join runs inside the database.
#[derive(Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    /// Creates a new PostgreSQL document store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the database at `url`.
    pub async fn connect(url: &str) -> Result<Self> {
        Ok(Self::new(PgPool::connect(url).await?))
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_document(row: PgRow) -> Result<Document> {
        match row.try_get::<Value, _>("doc").map_err(column_error)? {
            Value::Object(doc) => Ok(doc),
            other => Err(EntityStoreError::InvalidDocument(format!(
                "stored value is not an object: {other}"
            ))),
        }
    }
}

/// Maps a failure to read a column of a fetched row.
///
/// A value that cannot be decoded is a bad stored document, not an
/// unreachable store.
fn column_error(err: sqlx::Error) -> EntityStoreError {
    match err {
        sqlx::Error::ColumnDecode { index, source } => {
            EntityStoreError::InvalidDocument(format!("column {index}: {source}"))
        }
        other => EntityStoreError::Unavailable(other),
    }
}

/// A positional parameter of a compiled statement.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SqlParam {
    Text(String),
    Json(Value),
}

/// Accumulates `$n` parameters while SQL text is generated.
#[derive(Debug, Default)]
struct Params(Vec<SqlParam>);

impl Params {
    fn text(&mut self, value: impl Into<String>) -> String {
        self.0.push(SqlParam::Text(value.into()));
        format!("${}::text", self.0.len())
    }

    fn json(&mut self, value: Value) -> String {
        self.0.push(SqlParam::Json(value));
        format!("${}", self.0.len())
    }
}

/// Compiles a pipeline over `collection` into one SQL statement.
///
/// Each stage wraps the previous one as a subquery carrying `doc` and the
/// insertion sequence, which orders the final output.
pub(crate) fn compile_pipeline(
    collection: Collection,
    pipeline: &Pipeline,
) -> (String, Vec<SqlParam>) {
    let mut params = Params::default();
    let mut sql = format!(
        "SELECT d.doc, d.inserted FROM documents d WHERE d.collection = {}",
        params.text(collection.as_str())
    );

    for (depth, stage) in pipeline.stages.iter().enumerate() {
        let alias = format!("s{depth}");
        sql = match stage {
            Stage::Lookup(lookup) => compile_lookup(&sql, &alias, lookup, &mut params),
            Stage::Unwind(unwind) => compile_unwind(&sql, &alias, unwind, &mut params),
            Stage::Match(filter) => compile_match(&sql, &alias, filter, &mut params),
        };
    }

    (
        format!("SELECT r.doc FROM ({sql}) AS r ORDER BY r.inserted"),
        params.0,
    )
}

fn compile_lookup(inner: &str, alias: &str, lookup: &Lookup, params: &mut Params) -> String {
    let as_field = params.text(lookup.as_field.as_str());
    let from = params.text(lookup.from.as_str());
    let foreign = params.text(lookup.foreign_field.as_str());
    let local = params.text(lookup.local_field.as_str());
    format!(
        "SELECT {alias}.doc || jsonb_build_object({as_field}, COALESCE((\
            SELECT jsonb_agg(f.doc ORDER BY f.inserted) FROM documents f \
            WHERE f.collection = {from} \
            AND COALESCE(f.doc -> {foreign}, 'null'::jsonb) = COALESCE({alias}.doc -> {local}, 'null'::jsonb)\
         ), '[]'::jsonb)) AS doc, {alias}.inserted FROM ({inner}) AS {alias}"
    )
}

fn compile_unwind(inner: &str, alias: &str, unwind: &Unwind, params: &mut Params) -> String {
    let path = params.text(unwind.path.as_str());
    let field = format!("{alias}.doc -> {path}");
    let elements = format!(
        "jsonb_array_elements(CASE \
            WHEN {field} IS NULL OR jsonb_typeof({field}) = 'null' THEN '[]'::jsonb \
            WHEN jsonb_typeof({field}) = 'array' THEN {field} \
            ELSE jsonb_build_array({field}) END) AS e(value)"
    );
    let join = if unwind.preserve_null_and_empty {
        format!("LEFT JOIN LATERAL {elements} ON true")
    } else {
        format!("CROSS JOIN LATERAL {elements}")
    };
    format!(
        "SELECT CASE WHEN e.value IS NULL THEN {alias}.doc - {path} \
         ELSE {alias}.doc || jsonb_build_object({path}, e.value) END AS doc, \
         {alias}.inserted FROM ({inner}) AS {alias} {join}"
    )
}

fn compile_match(inner: &str, alias: &str, filter: &Filter, params: &mut Params) -> String {
    let predicate = if filter.is_empty() {
        "true".to_string()
    } else {
        filter
            .conditions
            .iter()
            .map(|(field, value)| {
                let field = params.text(field.as_str());
                let value = params.json(value.clone());
                format!("{alias}.doc -> {field} = {value}")
            })
            .collect::<Vec<_>>()
            .join(" AND ")
    };
    format!("SELECT {alias}.doc, {alias}.inserted FROM ({inner}) AS {alias} WHERE {predicate}")
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn ping(&self, ctx: &Context) -> Result<()> {
        ctx.run(async {
            sqlx::query("SELECT 1").execute(&self.pool).await?;
            Ok(())
        })
        .await
    }

    async fn find_all(&self, ctx: &Context, collection: Collection) -> Result<Vec<Document>> {
        record_operation(collection, "find_all");
        ctx.run(async {
            let rows = sqlx::query(
                "SELECT doc FROM documents WHERE collection = $1 ORDER BY inserted ASC",
            )
            .bind(collection.as_str())
            .fetch_all(&self.pool)
            .await?;

            rows.into_iter().map(Self::row_to_document).collect()
        })
        .await
    }

    async fn find_by_id(
        &self,
        ctx: &Context,
        collection: Collection,
        id: &str,
    ) -> Result<Document> {
        record_operation(collection, "find_by_id");
        ctx.run(async {
            let row = sqlx::query("SELECT doc FROM documents WHERE collection = $1 AND id = $2")
                .bind(collection.as_str())
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

            match row {
                Some(row) => Self::row_to_document(row),
                None => Err(EntityStoreError::NotFound {
                    collection,
                    id: id.to_string(),
                }),
            }
        })
        .await
    }

    async fn insert(&self, ctx: &Context, collection: Collection, doc: Document) -> Result<()> {
        record_operation(collection, "insert");
        let id = document_id(&doc)?.to_string();
        ctx.run(async move {
            sqlx::query("INSERT INTO documents (collection, id, doc) VALUES ($1, $2, $3)")
                .bind(collection.as_str())
                .bind(&id)
                .bind(Json(Value::Object(doc)))
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    if let sqlx::Error::Database(ref db_err) = e
                        && db_err.is_unique_violation()
                    {
                        return EntityStoreError::DuplicateId {
                            collection,
                            id: id.clone(),
                        };
                    }
                    EntityStoreError::Unavailable(e)
                })?;
            Ok(())
        })
        .await
    }

    async fn update_by_id(
        &self,
        ctx: &Context,
        collection: Collection,
        id: &str,
        mut patch: Document,
    ) -> Result<UpdateResult> {
        record_operation(collection, "update_by_id");
        // The primary id never changes.
        patch.remove(ID_FIELD);
        ctx.run(async move {
            let result = sqlx::query(
                "UPDATE documents SET doc = doc || $3 WHERE collection = $1 AND id = $2",
            )
            .bind(collection.as_str())
            .bind(id)
            .bind(Json(Value::Object(patch)))
            .execute(&self.pool)
            .await?;

            Ok(UpdateResult {
                matched: result.rows_affected(),
            })
        })
        .await
    }

    async fn delete_by_id(
        &self,
        ctx: &Context,
        collection: Collection,
        id: &str,
    ) -> Result<DeleteResult> {
        record_operation(collection, "delete_by_id");
        ctx.run(async {
            let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
                .bind(collection.as_str())
                .bind(id)
                .execute(&self.pool)
                .await?;

            Ok(DeleteResult {
                deleted: result.rows_affected(),
            })
        })
        .await
    }

    async fn aggregate(
        &self,
        ctx: &Context,
        collection: Collection,
        pipeline: Pipeline,
    ) -> Result<Vec<Document>> {
        record_operation(collection, "aggregate");
        let (sql, params) = compile_pipeline(collection, &pipeline);
        tracing::debug!(%collection, stages = ?pipeline.stage_names(), %sql, "compiled pipeline");

        ctx.run(async {
            let mut query = sqlx::query(&sql);
            for param in params {
                query = match param {
                    SqlParam::Text(text) => query.bind(text),
                    SqlParam::Json(value) => query.bind(Json(value)),
                };
            }

            // Rows are decoded as the cursor advances.
            let mut rows = query.fetch(&self.pool);
            let mut docs = Vec::new();
            while let Some(row) = rows.try_next().await? {
                docs.push(Self::row_to_document(row)?);
            }
            Ok(docs)
        })
        .await
    }
}
