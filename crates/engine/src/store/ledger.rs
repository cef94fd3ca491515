use sea_orm::{
    ConnectionTrait, FromQueryResult, QueryFilter, QueryOrder, Statement, Value, prelude::*,
};

use crate::{
    EngineError, HistoryRow, LedgerEntry, LedgerQuery, NewLedgerEntry, ResultEngine, SortOrder,
    UnitOfWork, ledger_entries,
};

/// Active entries with the balance after each, summed over the whole ledger
/// so that filtering never changes a row's balance.
const HISTORY_SOURCE: &str = "SELECT id, owner_user_id, employee_id, display_name, category, \
     quantity, related_case_key, is_user_initiated, active, created_at, \
     SUM(quantity) OVER (ORDER BY id ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW) \
     AS balance_after \
     FROM credit_ledger WHERE active = ?";

/// Appends `entry` and returns its id.
///
/// Rejects a zero quantity or a sign that disagrees with the category. The
/// balance bounds are the caller's responsibility.
pub async fn append(uow: &UnitOfWork, entry: &NewLedgerEntry) -> ResultEngine<i32> {
    entry.validate()?;
    let model = ledger_entries::ActiveModel::from(entry)
        .insert(uow.conn())
        .await?;
    Ok(model.id)
}

/// Most recent active entry.
pub async fn find_latest(uow: &UnitOfWork) -> ResultEngine<Option<LedgerEntry>> {
    ledger_entries::Entity::find()
        .filter(ledger_entries::Column::Active.eq(true))
        .order_by_desc(ledger_entries::Column::CreatedAt)
        .order_by_desc(ledger_entries::Column::Id)
        .one(uow.conn())
        .await?
        .map(LedgerEntry::try_from)
        .transpose()
}

/// Active entries matching `query` with their running balance, plus the
/// number of matches before paging.
pub async fn history(
    uow: &UnitOfWork,
    query: &LedgerQuery,
) -> ResultEngine<(Vec<HistoryRow>, u64)> {
    let backend = uow.conn().get_database_backend();
    let (filter, values) = history_filter(query);

    let count = Statement::from_sql_and_values(
        backend,
        format!("SELECT COUNT(*) AS total FROM ({HISTORY_SOURCE}) AS history WHERE {filter}"),
        values.clone(),
    );
    let total = uow
        .conn()
        .query_one(count)
        .await?
        .ok_or_else(|| EngineError::Database(DbErr::RecordNotFound("history".to_string())))?
        .try_get::<i64>("", "total")?;

    let order = match query.order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    };
    let mut sql = format!(
        "SELECT * FROM ({HISTORY_SOURCE}) AS history WHERE {filter} ORDER BY id {order}"
    );
    let mut values = values;
    if let Some(page) = query.page {
        // offset() bounds both values to i64
        let offset = page.offset()? as i64;
        sql.push_str(" LIMIT ? OFFSET ?");
        values.push((page.limit as i64).into());
        values.push(offset.into());
    }

    let rows = uow
        .conn()
        .query_all(Statement::from_sql_and_values(backend, sql, values))
        .await?;
    let rows = rows
        .iter()
        .map(|row| {
            let model = ledger_entries::Model::from_query_result(row, "")?;
            Ok(HistoryRow {
                entry: LedgerEntry::try_from(model)?,
                balance_after: row.try_get::<i64>("", "balance_after")?,
            })
        })
        .collect::<ResultEngine<Vec<_>>>()?;
    Ok((rows, total.max(0) as u64))
}

/// WHERE clause over the history columns and its bound values, the active
/// flag first.
fn history_filter(query: &LedgerQuery) -> (String, Vec<Value>) {
    let mut clauses = vec!["1 = 1".to_string()];
    let mut values: Vec<Value> = vec![true.into()];

    if !query.categories.is_empty() {
        let marks = vec!["?"; query.categories.len()].join(", ");
        clauses.push(format!("category IN ({marks})"));
        values.extend(query.categories.iter().map(|c| c.as_str().into()));
    }
    if let Some(employee_id) = &query.employee_id {
        clauses.push("instr(lower(employee_id), ?) > 0".to_string());
        values.push(employee_id.to_lowercase().into());
    }
    if let Some(name) = &query.display_name {
        clauses.push("instr(lower(display_name), ?) > 0".to_string());
        values.push(name.to_lowercase().into());
    }
    if let Some(from) = query.from {
        clauses.push("created_at >= ?".to_string());
        values.push(from.into());
    }
    if let Some(to) = query.to {
        clauses.push("created_at <= ?".to_string());
        values.push(to.into());
    }
    (clauses.join(" AND "), values)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::LedgerCategory;

    #[test]
    fn empty_query_has_only_the_active_flag() {
        let (filter, values) = history_filter(&LedgerQuery::new());
        assert_eq!(filter, "1 = 1");
        assert_eq!(values, vec![Value::from(true)]);
    }

    #[test]
    fn filters_bind_in_placeholder_order() {
        let now = Utc::now();
        let query = LedgerQuery::new()
            .category(LedgerCategory::Use)
            .category(LedgerCategory::Cancel)
            .employee_id("EMP-04")
            .between(now, now);
        let (filter, values) = history_filter(&query);
        assert_eq!(
            filter,
            "1 = 1 AND category IN (?, ?) AND instr(lower(employee_id), ?) > 0 \
             AND created_at >= ? AND created_at <= ?"
        );
        assert_eq!(values.len(), 6);
        assert_eq!(values[3], Value::from("emp-04"));
        assert_eq!(filter.matches('?').count() + 1, values.len());
    }
}
