use crate::{Notification, Page, ResultEngine, coordinator::with_uow, store};

use super::Engine;

impl Engine {
    /// A page of the user's notifications, newest first, with the total count.
    ///
    /// Reading marks every notification of the user as read.
    pub async fn notifications(
        &self,
        user_id: i32,
        page: Page,
    ) -> ResultEngine<(Vec<Notification>, u64)> {
        with_uow!(self, |uow| {
            let listed = store::notifications::list_for_user(&uow, user_id, page).await?;
            store::notifications::mark_all_read(&uow, user_id).await?;
            Ok(listed)
        })
    }

    pub async fn unread_notifications(&self, user_id: i32) -> ResultEngine<u64> {
        with_uow!(self, |uow| store::notifications::unread_count(&uow, user_id).await)
    }
}
