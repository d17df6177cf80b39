//! User model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// Initiator as embedded in event payloads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserShort {
    pub id: i64,
    pub name: String,
}

/// Create user request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct NewUser {
    #[validate(length(min = 2, max = 250))]
    pub name: String,
    #[validate(email, length(min = 6, max = 254))]
    pub email: String,
}
