//! Event comment model

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::datetime;

/// Comment as returned to clients
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub text: String,
    pub author_name: String,
    #[serde(with = "datetime")]
    #[schema(value_type = String, example = "2024-01-01 12:00:00")]
    pub created_on: NaiveDateTime,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct NewComment {
    #[validate(length(min = 1, max = 2000))]
    pub text: String,
}

impl NewComment {
    /// Text with surrounding whitespace removed, `None` when nothing is left
    pub fn trimmed_text(&self) -> Option<&str> {
        let t = self.text.trim();
        (!t.is_empty()).then_some(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_comment_rejected() {
        let c = NewComment { text: "   ".into() };
        assert!(c.validate().is_ok());
        assert_eq!(c.trimmed_text(), None);

        let c = NewComment { text: " See you there ".into() };
        assert_eq!(c.trimmed_text(), Some("See you there"));

        let c = NewComment { text: String::new() };
        assert!(c.validate().is_err());
    }
}
