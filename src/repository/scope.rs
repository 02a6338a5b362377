//! Query fragments shared by every repository that reads client-owned data.
//!
//! Documents, invoices and compliance alerts have no owner column of their
//! own; they belong to a CA through their client. Every statement touching
//! those tables joins `clients cl` and filters on `cl.created_by_id`, and the
//! builders here are the only place that predicate is written.

use crate::domain::{PageRequest, SortOrder, StringUuid};
use sqlx::{MySql, QueryBuilder};

/// `JOIN clients cl ON cl.id = <alias>.client_id`
pub(crate) fn push_client_join(qb: &mut QueryBuilder<'_, MySql>, alias: &str) {
    qb.push(" JOIN clients cl ON cl.id = ")
        .push(alias)
        .push(".client_id");
}

/// Opens the WHERE clause with the ownership predicate; later filters
/// append with `AND`.
pub(crate) fn push_owner_scope(qb: &mut QueryBuilder<'_, MySql>, owner_id: StringUuid) {
    qb.push(" WHERE cl.created_by_id = ").push_bind(owner_id);
}

/// `AND (col1 LIKE ? OR col2 LIKE ? ...)` with an escaped pattern
pub(crate) fn push_search(qb: &mut QueryBuilder<'_, MySql>, pattern: &str, columns: &[&str]) {
    if columns.is_empty() {
        return;
    }
    qb.push(" AND (");
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            qb.push(" OR ");
        }
        qb.push(*column)
            .push(" LIKE ")
            .push_bind(pattern.to_string());
    }
    qb.push(")");
}

/// `ORDER BY <column> <dir>, <tiebreak> LIMIT ? OFFSET ?`. Columns come from
/// per-resource whitelists, never from request text.
pub(crate) fn push_order_and_page(
    qb: &mut QueryBuilder<'_, MySql>,
    column: &'static str,
    order: SortOrder,
    tiebreak: &'static str,
    page: PageRequest,
) {
    qb.push(" ORDER BY ")
        .push(column)
        .push(" ")
        .push(order.as_sql())
        .push(", ")
        .push(tiebreak)
        .push(" ")
        .push(order.as_sql());
    qb.push(" LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset());
}
