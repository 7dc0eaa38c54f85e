use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, QueryOrder, QuerySelect, Set};
use uuid::Uuid;

use crate::{
    audit,
    dto::users::UserList,
    entity::users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin, ensure_super_admin},
    models::{Role, User},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

pub async fn list_users(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<UserList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize();

    let finder = Users::find().order_by_desc(UserCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(User::from)
        .collect();

    Ok(ApiResponse::success(
        "Users",
        UserList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

async fn find_user(state: &AppState, id: Uuid) -> AppResult<UserModel> {
    Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn set_role(
    state: &AppState,
    actor: &AuthUser,
    id: Uuid,
    role: Role,
) -> AppResult<ApiResponse<User>> {
    ensure_super_admin(actor)?;
    if actor.user_id == id {
        return Err(AppError::BadRequest("You cannot change your own role".into()));
    }

    let existing = find_user(state, id).await?;
    if existing.role == Role::SuperAdmin.as_str() {
        return Err(AppError::BadRequest("Super admins cannot be demoted".into()));
    }

    let mut active: UserActive = existing.into();
    active.role = Set(role.as_str().to_string());
    let updated = active.update(&state.orm).await?;

    audit::record(
        state,
        Some(actor.user_id),
        "user_role_change",
        "users",
        serde_json::json!({ "user_id": id, "role": role.as_str() }),
    )
    .await;

    Ok(ApiResponse::success("Role updated", User::from(updated), Some(Meta::empty())))
}

pub async fn set_blocked(
    state: &AppState,
    actor: &AuthUser,
    id: Uuid,
    blocked: bool,
) -> AppResult<ApiResponse<User>> {
    ensure_admin(actor)?;
    if actor.user_id == id {
        return Err(AppError::BadRequest("You cannot block yourself".into()));
    }

    let existing = find_user(state, id).await?;
    let target_role: Role = existing.role.parse().unwrap_or(Role::User);
    if target_role.is_admin() && actor.role != Role::SuperAdmin {
        return Err(AppError::Forbidden);
    }

    let mut active: UserActive = existing.into();
    active.is_blocked = Set(blocked);
    let updated = active.update(&state.orm).await?;

    audit::record(
        state,
        Some(actor.user_id),
        if blocked { "user_block" } else { "user_unblock" },
        "users",
        serde_json::json!({ "user_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        if blocked { "User blocked" } else { "User unblocked" },
        User::from(updated),
        Some(Meta::empty()),
    ))
}
