use axum::{
    extract::{Path, Query, State},
    Json,
};
use dropshop_core::domain::notification::{Notification, NotificationId};
use serde::{Deserialize, Serialize};

use crate::api::{not_found, repository_failure, ApiResult};
use crate::state::AppState;

const DEFAULT_LIMIT: u32 = 50;
const MAX_LIMIT: u32 = 200;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct NotificationParams {
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct NotificationList {
    pub success: bool,
    pub notifications: Vec<Notification>,
    pub unread_count: i64,
}

#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    pub success: bool,
    pub updated: u64,
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<NotificationParams>,
) -> ApiResult<NotificationList> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let notifications =
        state.notifications.list(params.unread_only, limit).await.map_err(repository_failure)?;
    let unread_count = state.notifications.unread_count().await.map_err(repository_failure)?;
    Ok(Json(NotificationList { success: true, notifications, unread_count }))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<MarkReadResponse> {
    let found = state
        .notifications
        .mark_read(&NotificationId(id.clone()))
        .await
        .map_err(repository_failure)?;
    if !found {
        return Err(not_found("notification", id));
    }
    Ok(Json(MarkReadResponse { success: true, updated: 1 }))
}

pub async fn mark_all_read(State(state): State<AppState>) -> ApiResult<MarkReadResponse> {
    let updated = state.notifications.mark_all_read().await.map_err(repository_failure)?;
    Ok(Json(MarkReadResponse { success: true, updated }))
}

#[cfg(test)]
mod tests {
    use axum::{
        extract::{Path, Query, State},
        http::StatusCode,
        Json,
    };
    use dropshop_core::domain::notification::Notification;

    use super::{list, mark_all_read, mark_read, NotificationParams};
    use crate::state::test_support::test_state;

    #[tokio::test]
    async fn read_lifecycle() {
        let state = test_state().await;
        let first = Notification::new_order("o-1", "ED-1-AAAAAA", "25.00 USD");
        state.notify(first.clone()).await;
        state.notify(Notification::low_stock("p-1", "Desk Lamp", 2)).await;

        let Json(unread) = list(
            State(state.clone()),
            Query(NotificationParams { unread_only: true, limit: None }),
        )
        .await
        .expect("list");
        assert_eq!(unread.notifications.len(), 2);
        assert_eq!(unread.unread_count, 2);

        mark_read(State(state.clone()), Path(first.id.0.clone())).await.expect("mark read");
        let Json(all) = list(State(state.clone()), Query(NotificationParams::default())).await.expect("list");
        assert_eq!(all.notifications.len(), 2);
        assert_eq!(all.unread_count, 1);

        let Json(cleared) = mark_all_read(State(state.clone())).await.expect("read all");
        assert_eq!(cleared.updated, 1);

        let (status, _) =
            mark_read(State(state), Path("missing".to_string())).await.expect_err("missing");
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
