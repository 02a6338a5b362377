//! Compliance alert repository

use super::scope::{push_client_join, push_order_and_page, push_owner_scope, push_search};
use crate::domain::{
    AlertChanges, AlertFilter, AlertRecord, AlertSortKey, ClientSummary, ComplianceAlert,
    NewAlert, StringUuid,
};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::{FromRow, MySql, MySqlPool, QueryBuilder};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ComplianceRepository: Send + Sync {
    async fn create(&self, owner_id: StringUuid, alert: &NewAlert) -> Result<AlertRecord>;
    async fn find_owned(&self, owner_id: StringUuid, id: StringUuid) -> Result<Option<AlertRecord>>;
    async fn update(
        &self,
        owner_id: StringUuid,
        id: StringUuid,
        changes: &AlertChanges,
    ) -> Result<AlertRecord>;
    async fn delete(&self, owner_id: StringUuid, id: StringUuid) -> Result<()>;
    async fn list(&self, filter: &AlertFilter) -> Result<Vec<AlertRecord>>;
    async fn count(&self, filter: &AlertFilter) -> Result<i64>;
}

pub struct ComplianceRepositoryImpl {
    pool: MySqlPool,
}

impl ComplianceRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

const ALERT_VIEW_COLUMNS: &str = r#"
    SELECT a.id, a.title, a.description, a.due_date, a.priority, a.status, a.client_id,
           a.created_at, a.updated_at,
           cl.name AS client_name, cl.email AS client_email,
           cl.company_name AS client_company_name
    FROM compliance_alerts a
"#;

#[derive(FromRow)]
struct AlertRow {
    #[sqlx(flatten)]
    alert: ComplianceAlert,
    client_name: String,
    client_email: String,
    client_company_name: Option<String>,
}

impl From<AlertRow> for AlertRecord {
    fn from(row: AlertRow) -> Self {
        let client = ClientSummary {
            id: row.alert.client_id,
            name: row.client_name,
            email: row.client_email,
            company_name: row.client_company_name,
        };
        AlertRecord {
            alert: row.alert,
            client,
        }
    }
}

fn sort_column(key: AlertSortKey) -> &'static str {
    match key {
        AlertSortKey::DueDate => "a.due_date",
        AlertSortKey::CreatedAt => "a.created_at",
        // Ordinal rank rather than alphabetical
        AlertSortKey::Priority => "FIELD(a.priority, 'LOW', 'MEDIUM', 'HIGH', 'URGENT')",
        AlertSortKey::Title => "a.title",
        AlertSortKey::Status => "a.status",
    }
}

fn scoped_select(owner_id: StringUuid) -> QueryBuilder<'static, MySql> {
    let mut qb = QueryBuilder::<MySql>::new(ALERT_VIEW_COLUMNS);
    push_client_join(&mut qb, "a");
    push_owner_scope(&mut qb, owner_id);
    qb
}

fn push_filters(qb: &mut QueryBuilder<'_, MySql>, filter: &AlertFilter) {
    if let Some(client_id) = filter.client_id {
        qb.push(" AND a.client_id = ").push_bind(client_id);
    }
    if let Some(status) = filter.status {
        qb.push(" AND a.status = ").push_bind(status);
    }
    if let Some(priority) = filter.priority {
        qb.push(" AND a.priority = ").push_bind(priority);
    }
    if let Some(window) = filter.due_within {
        qb.push(" AND a.due_date >= ")
            .push_bind(window.from)
            .push(" AND a.due_date <= ")
            .push_bind(window.to);
    }
    if let Some(pattern) = filter.search_pattern() {
        push_search(qb, &pattern, &["a.title", "a.description", "cl.name"]);
    }
}

#[async_trait]
impl ComplianceRepository for ComplianceRepositoryImpl {
    async fn create(&self, owner_id: StringUuid, alert: &NewAlert) -> Result<AlertRecord> {
        sqlx::query(
            r#"
            INSERT INTO compliance_alerts (id, title, description, due_date, priority, status,
                                           client_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, NOW(3), NOW(3))
            "#,
        )
        .bind(alert.id)
        .bind(&alert.title)
        .bind(&alert.description)
        .bind(alert.due_date)
        .bind(alert.priority)
        .bind(alert.status)
        .bind(alert.client_id)
        .execute(&self.pool)
        .await?;

        self.find_owned(owner_id, alert.id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create compliance alert")))
    }

    async fn find_owned(&self, owner_id: StringUuid, id: StringUuid) -> Result<Option<AlertRecord>> {
        let mut qb = scoped_select(owner_id);
        qb.push(" AND a.id = ").push_bind(id);

        let row = qb
            .build_query_as::<AlertRow>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(AlertRecord::from))
    }

    async fn update(
        &self,
        owner_id: StringUuid,
        id: StringUuid,
        changes: &AlertChanges,
    ) -> Result<AlertRecord> {
        sqlx::query(
            r#"
            UPDATE compliance_alerts a
            JOIN clients cl ON cl.id = a.client_id
            SET a.title = ?, a.description = ?, a.due_date = ?, a.priority = ?, a.status = ?,
                a.updated_at = NOW(3)
            WHERE a.id = ? AND cl.created_by_id = ?
            "#,
        )
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(changes.due_date)
        .bind(changes.priority)
        .bind(changes.status)
        .bind(id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;

        self.find_owned(owner_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Compliance alert not found".to_string()))
    }

    async fn delete(&self, owner_id: StringUuid, id: StringUuid) -> Result<()> {
        let result = sqlx::query(
            r#"
            DELETE a FROM compliance_alerts a
            JOIN clients cl ON cl.id = a.client_id
            WHERE a.id = ? AND cl.created_by_id = ?
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Compliance alert not found".to_string()));
        }

        Ok(())
    }

    async fn list(&self, filter: &AlertFilter) -> Result<Vec<AlertRecord>> {
        let mut qb = scoped_select(filter.owner_id);
        push_filters(&mut qb, filter);
        push_order_and_page(
            &mut qb,
            sort_column(filter.sort_by),
            filter.sort_order,
            "a.id",
            filter.page,
        );

        let rows = qb.build_query_as::<AlertRow>().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(AlertRecord::from).collect())
    }

    async fn count(&self, filter: &AlertFilter) -> Result<i64> {
        let mut qb = QueryBuilder::<MySql>::new("SELECT COUNT(*) FROM compliance_alerts a");
        push_client_join(&mut qb, "a");
        push_owner_scope(&mut qb, filter.owner_id);
        push_filters(&mut qb, filter);

        let row: (i64,) = qb.build_query_as().fetch_one(&self.pool).await?;
        Ok(row.0)
    }
}
