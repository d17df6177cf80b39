//! Participation request workflow
//!
//! Every write that depends on an event's confirmed count runs in one
//! transaction that first locks the event row, so concurrent creations and
//! confirmations for the same event are serialized.

use std::collections::{HashMap, HashSet};

use crate::{
    error::{AppError, AppResult},
    models::{
        datetime,
        enums::{EventState, RequestDecision, RequestStatus},
        event::Event,
        request::{ParticipationRequest, StatusUpdateRequest, StatusUpdateResult},
    },
    repository::Repository,
};

/// Decide the initial status of a new request, or why it cannot be made
pub fn check_new_request(
    event: &Event,
    requester_id: i64,
    has_active_request: bool,
    confirmed: i64,
) -> AppResult<RequestStatus> {
    if has_active_request {
        return Err(AppError::Conflict("Cannot add a repeat request.".to_string()));
    }
    if event.initiator_id == requester_id {
        return Err(AppError::Conflict(
            "Initiator cannot add a request to their own event.".to_string(),
        ));
    }
    if event.state != EventState::Published {
        return Err(AppError::Conflict(
            "Cannot participate in an unpublished event.".to_string(),
        ));
    }
    if event.is_full(confirmed) {
        return Err(AppError::Conflict(
            "The participant limit has been reached.".to_string(),
        ));
    }

    if event.needs_moderation() {
        Ok(RequestStatus::Pending)
    } else {
        Ok(RequestStatus::Confirmed)
    }
}

fn ensure_initiator(event: &Event, user_id: i64) -> AppResult<()> {
    if event.initiator_id != user_id {
        return Err(AppError::Conflict(
            "User is not the initiator of the event.".to_string(),
        ));
    }
    Ok(())
}

/// Drop repeated ids, keeping first occurrences in order
fn dedup_ids(ids: &[i64]) -> Vec<i64> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// Arrange loaded requests in the order their ids were asked for
fn in_request_order(
    ids: &[i64],
    loaded: Vec<ParticipationRequest>,
) -> AppResult<Vec<ParticipationRequest>> {
    let mut by_id: HashMap<i64, ParticipationRequest> =
        loaded.into_iter().map(|r| (r.id, r)).collect();
    ids.iter()
        .map(|id| {
            by_id
                .remove(id)
                .ok_or_else(|| AppError::NotFound(format!("Request with id={} was not found", id)))
        })
        .collect()
}

/// Compute the outcome of a bulk decision without touching storage.
///
/// `batch` holds the targeted requests in input order, `pending` every
/// PENDING request of the event. Confirmations are counted from
/// `confirmed`; the first one past the limit fails the whole batch. Once
/// the limit is reached, every other pending request is rejected too.
pub fn plan_status_change(
    event: &Event,
    confirmed: i64,
    batch: Vec<ParticipationRequest>,
    pending: Vec<ParticipationRequest>,
    decision: RequestDecision,
) -> AppResult<StatusUpdateResult> {
    for request in &batch {
        if request.event_id != event.id {
            return Err(AppError::Conflict(format!(
                "Request with id={} does not belong to event with id={}",
                request.id, event.id
            )));
        }
        if request.status != RequestStatus::Pending {
            return Err(AppError::Conflict(
                "Request must have status PENDING".to_string(),
            ));
        }
    }

    let limit = i64::from(event.participant_limit);
    let mut counter = confirmed;
    let mut result = StatusUpdateResult::default();

    for mut request in batch {
        request.status = decision.into();
        match decision {
            RequestDecision::Confirmed => {
                if counter >= limit {
                    return Err(AppError::Conflict(
                        "The participant limit has been reached.".to_string(),
                    ));
                }
                counter += 1;
                result.confirmed_requests.push(request);
            }
            RequestDecision::Rejected => result.rejected_requests.push(request),
        }
    }

    if counter >= limit {
        let decided: HashSet<i64> = result
            .confirmed_requests
            .iter()
            .chain(result.rejected_requests.iter())
            .map(|r| r.id)
            .collect();
        for mut request in pending.into_iter().filter(|r| !decided.contains(&r.id)) {
            request.status = RequestStatus::Rejected;
            result.rejected_requests.push(request);
        }
    }

    Ok(result)
}

#[derive(Clone)]
pub struct RequestsService {
    repository: Repository,
}

impl RequestsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Requests made by a user
    pub async fn get_user_requests(&self, user_id: i64) -> AppResult<Vec<ParticipationRequest>> {
        self.repository.users.get_by_id(user_id).await?;
        self.repository.requests.list_by_requester(user_id).await
    }

    /// Ask to participate in an event
    pub async fn create_request(
        &self,
        requester_id: i64,
        event_id: i64,
    ) -> AppResult<ParticipationRequest> {
        self.repository.users.get_by_id(requester_id).await?;

        let mut tx = self.repository.pool.begin().await?;
        let event = self.repository.events.lock_by_id(&mut tx, event_id).await?;
        let has_active = self
            .repository
            .requests
            .exists_active(&mut tx, requester_id, event_id)
            .await?;
        let confirmed = self.repository.requests.count_confirmed(&mut tx, event_id).await?;

        let status = check_new_request(&event, requester_id, has_active, confirmed)?;
        let request = self
            .repository
            .requests
            .insert(&mut tx, event_id, requester_id, status, datetime::now())
            .await?;
        tx.commit().await?;

        tracing::info!(
            "User {} requested event {} (request {}, {})",
            requester_id,
            event_id,
            request.id,
            request.status
        );
        Ok(request)
    }

    /// Cancel one's own request; canceling twice changes nothing
    pub async fn cancel_request(
        &self,
        requester_id: i64,
        request_id: i64,
    ) -> AppResult<ParticipationRequest> {
        self.repository.users.get_by_id(requester_id).await?;
        let request = self.repository.requests.get_by_id(request_id).await?;

        if request.requester_id != requester_id {
            return Err(AppError::Conflict(
                "User is not the requester of this request.".to_string(),
            ));
        }
        if request.status == RequestStatus::Canceled {
            return Ok(request);
        }

        let canceled = self
            .repository
            .requests
            .update_status(request_id, RequestStatus::Canceled)
            .await?;
        tracing::info!("Request {} canceled by user {}", request_id, requester_id);
        Ok(canceled)
    }

    /// Every request made for an event, for its initiator
    pub async fn get_event_participants(
        &self,
        initiator_id: i64,
        event_id: i64,
    ) -> AppResult<Vec<ParticipationRequest>> {
        self.repository.users.get_by_id(initiator_id).await?;
        let event = self.repository.events.get_by_id(event_id).await?;
        ensure_initiator(&event, initiator_id)?;
        self.repository.requests.list_by_event(event_id).await
    }

    /// Confirm or reject a batch of pending requests of an event
    pub async fn change_request_status(
        &self,
        initiator_id: i64,
        event_id: i64,
        update: &StatusUpdateRequest,
    ) -> AppResult<StatusUpdateResult> {
        self.repository.users.get_by_id(initiator_id).await?;

        let mut tx = self.repository.pool.begin().await?;
        let event = self.repository.events.lock_by_id(&mut tx, event_id).await?;
        ensure_initiator(&event, initiator_id)?;

        if !event.needs_moderation() {
            return Ok(StatusUpdateResult::default());
        }

        let ids = dedup_ids(&update.request_ids);
        let locked = self.repository.requests.lock_by_ids(&mut tx, &ids).await?;
        let batch = in_request_order(&ids, locked)?;
        let confirmed = self.repository.requests.count_confirmed(&mut tx, event_id).await?;
        let pending = self
            .repository
            .requests
            .lock_pending_by_event(&mut tx, event_id)
            .await?;

        let result = plan_status_change(&event, confirmed, batch, pending, update.status)?;

        let confirmed_ids: Vec<i64> = result.confirmed_requests.iter().map(|r| r.id).collect();
        let rejected_ids: Vec<i64> = result.rejected_requests.iter().map(|r| r.id).collect();
        self.repository
            .requests
            .set_status(&mut tx, &confirmed_ids, RequestStatus::Confirmed)
            .await?;
        self.repository
            .requests
            .set_status(&mut tx, &rejected_ids, RequestStatus::Rejected)
            .await?;
        tx.commit().await?;

        tracing::info!(
            "Event {}: {} request(s) confirmed, {} rejected",
            event_id,
            confirmed_ids.len(),
            rejected_ids.len()
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::sample_event;

    fn request(id: i64, event_id: i64, requester_id: i64, status: RequestStatus) -> ParticipationRequest {
        ParticipationRequest {
            id,
            event_id,
            requester_id,
            status,
            created: datetime::parse("2024-01-01 10:00:00").unwrap(),
        }
    }

    fn ids(requests: &[ParticipationRequest]) -> Vec<i64> {
        requests.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_unlimited_event_confirms_immediately() {
        let event = sample_event(1, 0, true);
        assert_eq!(
            check_new_request(&event, 2, false, 500).unwrap(),
            RequestStatus::Confirmed
        );
    }

    #[test]
    fn test_moderation_off_confirms_immediately() {
        let event = sample_event(1, 5, false);
        assert_eq!(
            check_new_request(&event, 2, false, 0).unwrap(),
            RequestStatus::Confirmed
        );
    }

    #[test]
    fn test_moderated_event_starts_pending() {
        let event = sample_event(1, 5, true);
        assert_eq!(
            check_new_request(&event, 2, false, 0).unwrap(),
            RequestStatus::Pending
        );
    }

    #[test]
    fn test_new_request_conflicts() {
        let event = sample_event(1, 2, true);
        assert!(matches!(
            check_new_request(&event, 2, true, 0),
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            check_new_request(&event, event.initiator_id, false, 0),
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            check_new_request(&event, 2, false, 2),
            Err(AppError::Conflict(_))
        ));

        let mut pending = sample_event(1, 0, true);
        pending.state = EventState::Pending;
        match check_new_request(&pending, 2, false, 0) {
            Err(AppError::Conflict(msg)) => assert!(msg.contains("unpublished")),
            other => panic!("expected Conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_confirming_last_slot_cascades_rejection() {
        // limit 1, A and B pending, confirm A
        let event = sample_event(1, 1, true);
        let a = request(10, 1, 2, RequestStatus::Pending);
        let b = request(11, 1, 3, RequestStatus::Pending);

        let result = plan_status_change(
            &event,
            0,
            vec![a.clone()],
            vec![a, b],
            RequestDecision::Confirmed,
        )
        .unwrap();

        assert_eq!(ids(&result.confirmed_requests), vec![10]);
        assert_eq!(ids(&result.rejected_requests), vec![11]);
        assert_eq!(result.confirmed_requests[0].status, RequestStatus::Confirmed);
        assert_eq!(result.rejected_requests[0].status, RequestStatus::Rejected);
    }

    #[test]
    fn test_confirming_past_limit_fails_whole_batch() {
        let event = sample_event(1, 2, true);
        let batch = vec![
            request(10, 1, 2, RequestStatus::Pending),
            request(11, 1, 3, RequestStatus::Pending),
        ];
        let result = plan_status_change(&event, 1, batch.clone(), batch, RequestDecision::Confirmed);
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[test]
    fn test_confirm_when_already_full_fails() {
        let event = sample_event(1, 1, true);
        let batch = vec![request(10, 1, 2, RequestStatus::Pending)];
        let result = plan_status_change(&event, 1, batch.clone(), batch, RequestDecision::Confirmed);
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[test]
    fn test_confirmed_never_exceeds_limit() {
        let event = sample_event(1, 3, true);
        let pending: Vec<_> = (0..5)
            .map(|i| request(10 + i, 1, 100 + i, RequestStatus::Pending))
            .collect();
        let result = plan_status_change(
            &event,
            1,
            pending[..2].to_vec(),
            pending.clone(),
            RequestDecision::Confirmed,
        )
        .unwrap();
        assert_eq!(result.confirmed_requests.len(), 2);
        assert_eq!(ids(&result.rejected_requests), vec![12, 13, 14]);
    }

    #[test]
    fn test_reject_below_limit_leaves_others_pending() {
        let event = sample_event(1, 3, true);
        let a = request(10, 1, 2, RequestStatus::Pending);
        let b = request(11, 1, 3, RequestStatus::Pending);
        let result =
            plan_status_change(&event, 0, vec![a.clone()], vec![a, b], RequestDecision::Rejected)
                .unwrap();
        assert!(result.confirmed_requests.is_empty());
        assert_eq!(ids(&result.rejected_requests), vec![10]);
    }

    #[test]
    fn test_non_pending_request_rejected() {
        let event = sample_event(1, 3, true);
        let batch = vec![request(10, 1, 2, RequestStatus::Confirmed)];
        match plan_status_change(&event, 1, batch, vec![], RequestDecision::Rejected) {
            Err(AppError::Conflict(msg)) => assert_eq!(msg, "Request must have status PENDING"),
            other => panic!("expected Conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_request_of_other_event_rejected() {
        let event = sample_event(1, 3, true);
        let batch = vec![request(10, 2, 2, RequestStatus::Pending)];
        assert!(matches!(
            plan_status_change(&event, 0, batch, vec![], RequestDecision::Confirmed),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn test_batch_keeps_input_order() {
        let loaded = vec![
            request(10, 1, 2, RequestStatus::Pending),
            request(11, 1, 3, RequestStatus::Pending),
        ];
        let ordered = in_request_order(&[11, 10], loaded.clone()).unwrap();
        assert_eq!(ids(&ordered), vec![11, 10]);

        assert!(matches!(
            in_request_order(&[10, 99], loaded),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_dedup_ids() {
        assert_eq!(dedup_ids(&[3, 1, 3, 2, 1]), vec![3, 1, 2]);
    }
}
