//! Participation request model

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::{
    datetime,
    enums::{RequestDecision, RequestStatus},
};

/// Participation request record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParticipationRequest {
    pub id: i64,
    #[serde(rename = "event")]
    pub event_id: i64,
    #[serde(rename = "requester")]
    pub requester_id: i64,
    pub status: RequestStatus,
    #[serde(with = "datetime")]
    #[schema(value_type = String, example = "2024-01-01 12:00:00")]
    pub created: NaiveDateTime,
}

/// Bulk decision on an event's pending requests
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateRequest {
    pub request_ids: Vec<i64>,
    pub status: RequestDecision,
}

/// Requests whose status changed during a bulk decision
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateResult {
    pub confirmed_requests: Vec<ParticipationRequest>,
    pub rejected_requests: Vec<ParticipationRequest>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        let req = ParticipationRequest {
            id: 1,
            event_id: 2,
            requester_id: 3,
            status: RequestStatus::Pending,
            created: datetime::parse("2024-01-01 10:00:00").unwrap(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["event"], 2);
        assert_eq!(json["requester"], 3);
        assert_eq!(json["status"], "PENDING");
        assert_eq!(json["created"], "2024-01-01 10:00:00");
    }

    #[test]
    fn test_status_update_request_parse() {
        let body: StatusUpdateRequest =
            serde_json::from_str(r#"{"requestIds":[4,5],"status":"CONFIRMED"}"#).unwrap();
        assert_eq!(body.request_ids, vec![4, 5]);
        assert_eq!(body.status, RequestDecision::Confirmed);

        assert!(serde_json::from_str::<StatusUpdateRequest>(
            r#"{"requestIds":[4],"status":"CANCELED"}"#
        )
        .is_err());
    }
}
