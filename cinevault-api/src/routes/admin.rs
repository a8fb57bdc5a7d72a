/// Back-office endpoints
///
/// Creator applications are reviewed manually; these endpoints are the
/// review surface. The bearer layer authenticates the caller, and the
/// handlers reject anything but the admin role with 403 before touching
/// stores.
///
/// # Endpoints
///
/// - `POST /v1/admin/creators/:account_id/approve`
/// - `POST /v1/admin/creators/:account_id/reject`

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use cinevault_shared::auth::middleware::AuthContext;
use serde::Serialize;
use uuid::Uuid;

/// Plain success acknowledgment
#[derive(Debug, Serialize)]
pub struct AckResponse {
    pub success: bool,
}

fn require_admin(auth: &AuthContext) -> Result<(), ApiError> {
    if !auth.role.can_approve_creators() {
        return Err(ApiError::Forbidden(
            "Creator review requires the admin role".to_string(),
        ));
    }
    Ok(())
}

/// Approve a pending creator application
pub async fn approve_creator(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(account_id): Path<Uuid>,
) -> ApiResult<Json<AckResponse>> {
    require_admin(&auth)?;

    state.auth.review_creator(account_id, true).await?;
    Ok(Json(AckResponse { success: true }))
}

/// Reject a pending creator application
pub async fn reject_creator(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(account_id): Path<Uuid>,
) -> ApiResult<Json<AckResponse>> {
    require_admin(&auth)?;

    state.auth.review_creator(account_id, false).await?;
    Ok(Json(AckResponse { success: true }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinevault_shared::models::profile::Role;

    fn context(role: Role) -> AuthContext {
        AuthContext {
            account_id: Uuid::new_v4(),
            email: "someone@example.com".to_string(),
            role,
        }
    }

    #[test]
    fn test_only_admin_passes_the_gate() {
        assert!(require_admin(&context(Role::Admin)).is_ok());
        assert!(require_admin(&context(Role::User)).is_err());
        assert!(require_admin(&context(Role::Creator)).is_err());
        assert!(require_admin(&context(Role::Subscriber)).is_err());
    }
}
