use sea_orm::{PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, prelude::*, sea_query::Expr};

use crate::{Notification, NotificationKind, Page, ResultEngine, UnitOfWork, notifications};

pub async fn create(uow: &UnitOfWork, user_id: i32, kind: &NotificationKind) -> ResultEngine<i32> {
    let model = notifications::ActiveModel::new(user_id, kind)
        .insert(uow.conn())
        .await?;
    Ok(model.id)
}

/// Newest first. Returns the page and the total count for the user.
pub async fn list_for_user(
    uow: &UnitOfWork,
    user_id: i32,
    page: Page,
) -> ResultEngine<(Vec<Notification>, u64)> {
    let query = notifications::Entity::find()
        .filter(notifications::Column::UserId.eq(user_id))
        .order_by_desc(notifications::Column::CreatedAt)
        .order_by_desc(notifications::Column::Id);
    let page = Page::new(page.index, page.limit.max(1));
    let offset = page.offset()?;
    let total = query.clone().count(uow.conn()).await?;
    let models = query
        .offset(offset)
        .limit(page.limit)
        .all(uow.conn())
        .await?;
    let items = models
        .into_iter()
        .map(Notification::try_from)
        .collect::<ResultEngine<Vec<_>>>()?;
    Ok((items, total))
}

pub async fn mark_all_read(uow: &UnitOfWork, user_id: i32) -> ResultEngine<u64> {
    let res = notifications::Entity::update_many()
        .col_expr(notifications::Column::Read, Expr::value(true))
        .filter(notifications::Column::UserId.eq(user_id))
        .filter(notifications::Column::Read.eq(false))
        .exec(uow.conn())
        .await?;
    Ok(res.rows_affected)
}

pub async fn unread_count(uow: &UnitOfWork, user_id: i32) -> ResultEngine<u64> {
    Ok(notifications::Entity::find()
        .filter(notifications::Column::UserId.eq(user_id))
        .filter(notifications::Column::Read.eq(false))
        .count(uow.conn())
        .await?)
}
