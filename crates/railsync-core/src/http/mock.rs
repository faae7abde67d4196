//! Recording transport for tests
//!
//! Records every request it is handed and replays queued responses in
//! order. Lets dispatcher tests assert on exact paths, verbs, and bodies,
//! including that precondition failures make zero transport invocations.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::http::transport::{HttpTransport, RestRequest, RestResponse, TransportError};

#[derive(Debug, Default)]
pub struct MockTransport {
    requests: Mutex<Vec<RestRequest>>,
    responses: Mutex<VecDeque<std::result::Result<RestResponse, String>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response to hand back, in FIFO order.
    pub fn push_response(&self, status: u16, body: &str) {
        self.responses
            .lock()
            .expect("mock response queue poisoned")
            .push_back(Ok(RestResponse {
                status,
                body: body.to_string(),
            }));
    }

    /// Queue a transport failure.
    pub fn push_error(&self, message: &str) {
        self.responses
            .lock()
            .expect("mock response queue poisoned")
            .push_back(Err(message.to_string()));
    }

    /// Every request executed so far, in order.
    pub fn requests(&self) -> Vec<RestRequest> {
        self.requests
            .lock()
            .expect("mock request log poisoned")
            .clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .expect("mock request log poisoned")
            .len()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn execute(&self, request: RestRequest) -> std::result::Result<RestResponse, TransportError> {
        self.requests
            .lock()
            .expect("mock request log poisoned")
            .push(request);
        match self
            .responses
            .lock()
            .expect("mock response queue poisoned")
            .pop_front()
        {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(TransportError::new(message)),
            None => Err(TransportError::new("no queued response")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;

    #[tokio::test]
    async fn test_mock_records_and_replays() {
        let mock = MockTransport::new();
        mock.push_response(200, "{}");
        mock.push_error("connection refused");

        let request = RestRequest {
            method: Method::GET,
            url: "http://localhost:3000/articles.json".to_string(),
            basic_auth: None,
            body: None,
        };

        let first = mock.execute(request.clone()).await.unwrap();
        assert_eq!(first.status, 200);
        let second = mock.execute(request).await.unwrap_err();
        assert_eq!(second.message, "connection refused");
        assert_eq!(mock.request_count(), 2);
        assert_eq!(mock.requests()[0].url, "http://localhost:3000/articles.json");
    }
}
