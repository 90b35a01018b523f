use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use gembridge_common::{
    GatewayError, GatewayResult, RelayClient, UpstreamHttpRequest, UpstreamHttpResponse,
};

/// Replays canned responses in order and remembers every request it saw.
#[derive(Default)]
pub struct RecordingRelay {
    responses: Mutex<VecDeque<UpstreamHttpResponse>>,
    pub requests: Mutex<Vec<UpstreamHttpRequest>>,
}

impl RecordingRelay {
    pub fn with_responses(responses: Vec<UpstreamHttpResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl RelayClient for RecordingRelay {
    async fn send(&self, req: UpstreamHttpRequest) -> GatewayResult<UpstreamHttpResponse> {
        self.requests.lock().unwrap().push(req);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| GatewayError::upstream_unreachable("no canned response"))
    }
}

pub fn response(status: u16, content_type: Option<&str>, body: &'static [u8]) -> UpstreamHttpResponse {
    UpstreamHttpResponse {
        status,
        headers: content_type
            .map(|value| vec![("content-type".to_string(), value.to_string())])
            .unwrap_or_default(),
        body: Bytes::from_static(body),
    }
}
