// src/threads.rs
//! Pairs each request of a chat with the response that answers it.

use serde::Serialize;

use crate::models::{Request, Response};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationThread {
    pub request: Request,
    pub response: Option<Response>,
}

/// One thread per request, oldest request first.
///
/// A response answers the request named by its `request_id`. Rows without
/// a link fall back to timing: the first unlinked response created strictly
/// after the request. Linked responses are never reused that way.
pub fn build_threads(requests: &[Request], responses: &[Response]) -> Vec<ConversationThread> {
    let mut sorted_requests: Vec<&Request> = requests.iter().collect();
    sorted_requests.sort_by_key(|request| request.created_at);

    let mut sorted_responses: Vec<&Response> = responses.iter().collect();
    sorted_responses.sort_by_key(|response| response.created_at);

    sorted_requests
        .into_iter()
        .map(|request| {
            let linked = sorted_responses
                .iter()
                .find(|response| response.request_id == Some(request.id));

            let response = linked.or_else(|| {
                sorted_responses.iter().find(|response| {
                    response.request_id.is_none()
                        && response.chat_id == request.chat_id
                        && response.created_at > request.created_at
                })
            });

            ConversationThread {
                request: request.clone(),
                response: response.map(|r| (*r).clone()),
            }
        })
        .collect()
}

/// Most recent request by `created_at`; ties go to the higher id.
pub fn latest_request(requests: &[Request]) -> Option<&Request> {
    requests.iter().max_by_key(|request| (request.created_at, request.id))
}
