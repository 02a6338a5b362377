//! Document repository

use super::scope::{push_client_join, push_order_and_page, push_owner_scope, push_search};
use crate::domain::{
    Document, DocumentCategory, DocumentClient, DocumentFilter, DocumentSortKey, DocumentView,
    NewDocument, StringUuid, UserSummary,
};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::{FromRow, MySql, MySqlPool, QueryBuilder};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Insert every row or none
    async fn create_many(&self, documents: &[NewDocument]) -> Result<Vec<DocumentView>>;
    async fn find_owned(&self, owner_id: StringUuid, id: StringUuid) -> Result<Option<DocumentView>>;
    async fn update(
        &self,
        owner_id: StringUuid,
        id: StringUuid,
        category: DocumentCategory,
        description: Option<String>,
    ) -> Result<DocumentView>;
    async fn delete(&self, owner_id: StringUuid, id: StringUuid) -> Result<()>;
    async fn list(&self, filter: &DocumentFilter) -> Result<Vec<DocumentView>>;
    async fn count(&self, filter: &DocumentFilter) -> Result<i64>;
}

pub struct DocumentRepositoryImpl {
    pool: MySqlPool,
}

impl DocumentRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

const DOCUMENT_VIEW_COLUMNS: &str = r#"
    SELECT d.id, d.filename, d.original_name, d.mimetype, d.size, d.path, d.category,
           d.description, d.client_id, d.uploaded_by_id, d.created_at, d.updated_at,
           cl.name AS client_name, cl.email AS client_email,
           u.first_name AS uploader_first_name, u.last_name AS uploader_last_name,
           u.email AS uploader_email
    FROM documents d
"#;

#[derive(FromRow)]
struct DocumentRow {
    #[sqlx(flatten)]
    document: Document,
    client_name: String,
    client_email: String,
    uploader_first_name: String,
    uploader_last_name: String,
    uploader_email: String,
}

impl From<DocumentRow> for DocumentView {
    fn from(row: DocumentRow) -> Self {
        let client = DocumentClient {
            id: row.document.client_id,
            name: row.client_name,
            email: row.client_email,
        };
        let uploaded_by = UserSummary {
            id: row.document.uploaded_by_id,
            first_name: row.uploader_first_name,
            last_name: row.uploader_last_name,
            email: row.uploader_email,
        };
        DocumentView {
            document: row.document,
            client,
            uploaded_by,
        }
    }
}

fn sort_column(key: DocumentSortKey) -> &'static str {
    match key {
        DocumentSortKey::CreatedAt => "d.created_at",
        DocumentSortKey::OriginalName => "d.original_name",
        DocumentSortKey::Size => "d.size",
        DocumentSortKey::Category => "d.category",
    }
}

/// Base select with the client join and ownership predicate already applied
fn scoped_select(owner_id: StringUuid) -> QueryBuilder<'static, MySql> {
    let mut qb = QueryBuilder::<MySql>::new(DOCUMENT_VIEW_COLUMNS);
    push_client_join(&mut qb, "d");
    qb.push(" JOIN users u ON u.id = d.uploaded_by_id");
    push_owner_scope(&mut qb, owner_id);
    qb
}

fn push_filters(qb: &mut QueryBuilder<'_, MySql>, filter: &DocumentFilter) {
    if let Some(client_id) = filter.client_id {
        qb.push(" AND d.client_id = ").push_bind(client_id);
    }
    if let Some(category) = filter.category {
        qb.push(" AND d.category = ").push_bind(category);
    }
    if let Some(pattern) = filter.search_pattern() {
        let columns: &[&str] = if filter.search_client_name {
            &["d.original_name", "d.description", "cl.name"]
        } else {
            &["d.original_name", "d.description"]
        };
        push_search(qb, &pattern, columns);
    }
}

#[async_trait]
impl DocumentRepository for DocumentRepositoryImpl {
    async fn create_many(&self, documents: &[NewDocument]) -> Result<Vec<DocumentView>> {
        let mut tx = self.pool.begin().await?;

        for doc in documents {
            sqlx::query(
                r#"
                INSERT INTO documents (id, filename, original_name, mimetype, size, path, category,
                                       description, client_id, uploaded_by_id, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NOW(3), NOW(3))
                "#,
            )
            .bind(doc.id)
            .bind(&doc.filename)
            .bind(&doc.original_name)
            .bind(&doc.mimetype)
            .bind(doc.size)
            .bind(&doc.path)
            .bind(doc.category)
            .bind(&doc.description)
            .bind(doc.client_id)
            .bind(doc.uploaded_by_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        let mut created = Vec::with_capacity(documents.len());
        for doc in documents {
            let row = sqlx::query_as::<_, DocumentRow>(&format!(
                "{} JOIN clients cl ON cl.id = d.client_id JOIN users u ON u.id = d.uploaded_by_id WHERE d.id = ?",
                DOCUMENT_VIEW_COLUMNS
            ))
            .bind(doc.id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create document")))?;
            created.push(DocumentView::from(row));
        }

        Ok(created)
    }

    async fn find_owned(&self, owner_id: StringUuid, id: StringUuid) -> Result<Option<DocumentView>> {
        let mut qb = scoped_select(owner_id);
        qb.push(" AND d.id = ").push_bind(id);

        let row = qb
            .build_query_as::<DocumentRow>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(DocumentView::from))
    }

    async fn update(
        &self,
        owner_id: StringUuid,
        id: StringUuid,
        category: DocumentCategory,
        description: Option<String>,
    ) -> Result<DocumentView> {
        sqlx::query(
            r#"
            UPDATE documents d
            JOIN clients cl ON cl.id = d.client_id
            SET d.category = ?, d.description = ?, d.updated_at = NOW(3)
            WHERE d.id = ? AND cl.created_by_id = ?
            "#,
        )
        .bind(category)
        .bind(description)
        .bind(id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;

        // rows_affected is 0 for a matched row whose values did not change, so read back instead
        self.find_owned(owner_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Document not found".to_string()))
    }

    async fn delete(&self, owner_id: StringUuid, id: StringUuid) -> Result<()> {
        let result = sqlx::query(
            r#"
            DELETE d FROM documents d
            JOIN clients cl ON cl.id = d.client_id
            WHERE d.id = ? AND cl.created_by_id = ?
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Document not found".to_string()));
        }

        Ok(())
    }

    async fn list(&self, filter: &DocumentFilter) -> Result<Vec<DocumentView>> {
        let mut qb = scoped_select(filter.owner_id);
        push_filters(&mut qb, filter);
        push_order_and_page(
            &mut qb,
            sort_column(filter.sort_by),
            filter.sort_order,
            "d.id",
            filter.page,
        );

        let rows = qb.build_query_as::<DocumentRow>().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(DocumentView::from).collect())
    }

    async fn count(&self, filter: &DocumentFilter) -> Result<i64> {
        let mut qb = QueryBuilder::<MySql>::new("SELECT COUNT(*) FROM documents d");
        push_client_join(&mut qb, "d");
        push_owner_scope(&mut qb, filter.owner_id);
        push_filters(&mut qb, filter);

        let row: (i64,) = qb.build_query_as().fetch_one(&self.pool).await?;
        Ok(row.0)
    }
}
