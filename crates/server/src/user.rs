//! Self-service account registration

use api_types::user::{Register, UserCreated};
use axum::{Json, extract::State};
use chrono::Utc;
use sea_orm::{ActiveValue, EntityTrait, SqlErr};

use crate::{ServerError, server::ServerState};
use ledger::{Role, hash_password, users};

pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<Register>,
) -> Result<Json<UserCreated>, ServerError> {
    let username = payload.username.trim().to_string();
    if username.is_empty() {
        return Err(ServerError::Generic("username must not be empty".to_string()));
    }
    if payload.password.is_empty() {
        return Err(ServerError::Generic("password must not be empty".to_string()));
    }

    let account = users::ActiveModel {
        id: ActiveValue::NotSet,
        username: ActiveValue::Set(username.clone()),
        password: ActiveValue::Set(hash_password(&payload.password)),
        role: ActiveValue::Set(Role::Member.as_str().to_string()),
        is_active: ActiveValue::Set(true),
        created_at: ActiveValue::Set(Utc::now()),
    };

    // No existence pre-check: the unique username index decides, so two
    // concurrent registrations cannot both pass.
    let created = match users::Entity::insert(account)
        .exec_with_returning(&state.db)
        .await
    {
        Ok(model) => model,
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            return Err(ServerError::Conflict(format!(
                "username {username} is already taken"
            )));
        }
        Err(err) => return Err(ledger::LedgerError::from(err).into()),
    };

    Ok(Json(UserCreated {
        id: created.id,
        username: created.username,
    }))
}
