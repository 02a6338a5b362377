//! Client repository

use super::scope::{push_order_and_page, push_search};
use crate::domain::{
    patch_nullable, Client, ClientFilter, ClientSortKey, ClientView, CreateClientInput,
    StringUuid, UpdateClientInput, UserSummary,
};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::{FromRow, MySql, MySqlPool, QueryBuilder};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClientRepository: Send + Sync {
    async fn create(&self, owner_id: StringUuid, input: &CreateClientInput) -> Result<ClientView>;
    /// Client owned by `owner_id`, active or not
    async fn find_owned(&self, owner_id: StringUuid, id: StringUuid) -> Result<Option<ClientView>>;
    /// Another of this CA's clients already using `email`
    async fn find_by_email(
        &self,
        owner_id: StringUuid,
        email: &str,
        exclude_id: Option<StringUuid>,
    ) -> Result<Option<Client>>;
    async fn update(
        &self,
        owner_id: StringUuid,
        id: StringUuid,
        input: &UpdateClientInput,
    ) -> Result<ClientView>;
    async fn set_active(&self, owner_id: StringUuid, id: StringUuid, active: bool) -> Result<ClientView>;
    async fn list(&self, filter: &ClientFilter) -> Result<Vec<ClientView>>;
    async fn count(&self, filter: &ClientFilter) -> Result<i64>;
}

pub struct ClientRepositoryImpl {
    pool: MySqlPool,
}

impl ClientRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

const CLIENT_VIEW_SELECT: &str = r#"
    SELECT cl.id, cl.name, cl.email, cl.phone, cl.company_name, cl.gstin, cl.pan, cl.address,
           cl.is_active, cl.created_by_id, cl.created_at, cl.updated_at,
           u.first_name AS creator_first_name, u.last_name AS creator_last_name,
           u.email AS creator_email
    FROM clients cl
    JOIN users u ON u.id = cl.created_by_id
"#;

#[derive(FromRow)]
struct ClientRow {
    #[sqlx(flatten)]
    client: Client,
    creator_first_name: String,
    creator_last_name: String,
    creator_email: String,
}

impl From<ClientRow> for ClientView {
    fn from(row: ClientRow) -> Self {
        let created_by = UserSummary {
            id: row.client.created_by_id,
            first_name: row.creator_first_name,
            last_name: row.creator_last_name,
            email: row.creator_email,
        };
        ClientView {
            client: row.client,
            created_by,
        }
    }
}

fn sort_column(key: ClientSortKey) -> &'static str {
    match key {
        ClientSortKey::CreatedAt => "cl.created_at",
        ClientSortKey::Name => "cl.name",
        ClientSortKey::Email => "cl.email",
        ClientSortKey::CompanyName => "cl.company_name",
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, MySql>, filter: &ClientFilter) {
    qb.push(" WHERE cl.created_by_id = ").push_bind(filter.owner_id);
    if !filter.include_inactive {
        qb.push(" AND cl.is_active = TRUE");
    }
    if let Some(id) = filter.id {
        qb.push(" AND cl.id = ").push_bind(id);
    }
    if let Some(pattern) = filter.search_pattern() {
        push_search(
            qb,
            &pattern,
            &["cl.name", "cl.email", "cl.company_name", "cl.phone"],
        );
    }
}

#[async_trait]
impl ClientRepository for ClientRepositoryImpl {
    async fn create(&self, owner_id: StringUuid, input: &CreateClientInput) -> Result<ClientView> {
        let id = StringUuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO clients (id, name, email, phone, company_name, gstin, pan, address,
                                 is_active, created_by_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NOW(3), NOW(3))
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.company_name)
        .bind(&input.gstin)
        .bind(&input.pan)
        .bind(&input.address)
        .bind(input.is_active.unwrap_or(true))
        .bind(owner_id)
        .execute(&self.pool)
        .await?;

        self.find_owned(owner_id, id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create client")))
    }

    async fn find_owned(&self, owner_id: StringUuid, id: StringUuid) -> Result<Option<ClientView>> {
        let row = sqlx::query_as::<_, ClientRow>(&format!(
            "{} WHERE cl.id = ? AND cl.created_by_id = ?",
            CLIENT_VIEW_SELECT
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ClientView::from))
    }

    async fn find_by_email(
        &self,
        owner_id: StringUuid,
        email: &str,
        exclude_id: Option<StringUuid>,
    ) -> Result<Option<Client>> {
        let mut qb = QueryBuilder::<MySql>::new(
            r#"
            SELECT id, name, email, phone, company_name, gstin, pan, address,
                   is_active, created_by_id, created_at, updated_at
            FROM clients
            WHERE created_by_id = "#,
        );
        qb.push_bind(owner_id)
            .push(" AND email = ")
            .push_bind(email.to_string());
        if let Some(exclude_id) = exclude_id {
            qb.push(" AND id <> ").push_bind(exclude_id);
        }
        qb.push(" LIMIT 1");

        let client = qb
            .build_query_as::<Client>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(client)
    }

    async fn update(
        &self,
        owner_id: StringUuid,
        id: StringUuid,
        input: &UpdateClientInput,
    ) -> Result<ClientView> {
        let existing = self
            .find_owned(owner_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Client not found".to_string()))?
            .client;

        let name = input.name.as_ref().unwrap_or(&existing.name);
        let email = input.email.as_ref().unwrap_or(&existing.email);
        let phone = patch_nullable(&input.phone, &existing.phone);
        let company_name = patch_nullable(&input.company_name, &existing.company_name);
        let gstin = patch_nullable(&input.gstin, &existing.gstin);
        let pan = patch_nullable(&input.pan, &existing.pan);
        let address = patch_nullable(&input.address, &existing.address);

        sqlx::query(
            r#"
            UPDATE clients
            SET name = ?, email = ?, phone = ?, company_name = ?, gstin = ?, pan = ?, address = ?,
                updated_at = NOW(3)
            WHERE id = ? AND created_by_id = ?
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(phone)
        .bind(company_name)
        .bind(gstin)
        .bind(pan)
        .bind(address)
        .bind(id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;

        self.find_owned(owner_id, id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to update client")))
    }

    async fn set_active(&self, owner_id: StringUuid, id: StringUuid, active: bool) -> Result<ClientView> {
        let result = sqlx::query(
            r#"
            UPDATE clients
            SET is_active = ?, updated_at = NOW(3)
            WHERE id = ? AND created_by_id = ?
            "#,
        )
        .bind(active)
        .bind(id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Client not found".to_string()));
        }

        self.find_owned(owner_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Client not found".to_string()))
    }

    async fn list(&self, filter: &ClientFilter) -> Result<Vec<ClientView>> {
        let mut qb = QueryBuilder::<MySql>::new(CLIENT_VIEW_SELECT);
        push_filters(&mut qb, filter);
        push_order_and_page(
            &mut qb,
            sort_column(filter.sort_by),
            filter.sort_order,
            "cl.id",
            filter.page,
        );

        let rows = qb.build_query_as::<ClientRow>().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(ClientView::from).collect())
    }

    async fn count(&self, filter: &ClientFilter) -> Result<i64> {
        let mut qb = QueryBuilder::<MySql>::new("SELECT COUNT(*) FROM clients cl");
        push_filters(&mut qb, filter);

        let row: (i64,) = qb.build_query_as().fetch_one(&self.pool).await?;
        Ok(row.0)
    }
}
