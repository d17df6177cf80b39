//! Event category model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// Create or rename category request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CategoryName {
    #[validate(length(min = 1, max = 50))]
    pub name: String,
}
