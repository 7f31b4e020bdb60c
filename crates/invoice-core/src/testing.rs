//! In-process stand-in for the invoice service.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

use reqwest::header::{HeaderMap, AUTHORIZATION};
use serde_json::Value;
use tokio::sync::Notify;

use crate::api::{
    ApiResponse, InvoiceApi, SignInPayload, SignUpPayload, TransportError, TransportResult,
};
use crate::config::{ClientConfig, Endpoints};
use crate::upload::UploadRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    SignIn,
    SignUp,
    ProcessInvoice,
    ListInvoices,
    GetInvoice,
    DeleteInvoice,
    Health,
}

/// One request as the fake saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub endpoint: Endpoint,
    pub body: Option<Value>,
    pub authorization: Option<String>,
    /// Path parameter, when the route has one.
    pub target: Option<String>,
    pub export_format: Option<String>,
    pub file_name: Option<String>,
}

impl RecordedCall {
    fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            body: None,
            authorization: None,
            target: None,
            export_format: None,
            file_name: None,
        }
    }

    fn with_auth(mut self, auth: &HeaderMap) -> Self {
        self.authorization = auth
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        self
    }
}

type Reply = Result<ApiResponse, String>;

/// Replays canned replies per endpoint. The last reply queued for an
/// endpoint repeats; an endpoint with none is unreachable.
#[derive(Debug)]
pub struct FakeApi {
    endpoints: Endpoints,
    replies: Mutex<HashMap<Endpoint, VecDeque<Reply>>>,
    holds: Mutex<HashMap<Endpoint, Arc<Notify>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            endpoints: ClientConfig::default().endpoints(),
            replies: Mutex::new(HashMap::new()),
            holds: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn reply(self, endpoint: Endpoint, status: u16, body: &str) -> Self {
        self.push(endpoint, Ok(ApiResponse::new(status, body)))
    }

    pub fn fail(self, endpoint: Endpoint, reason: &str) -> Self {
        self.push(endpoint, Err(reason.to_string()))
    }

    /// Requests to `endpoint` wait until the returned handle is notified.
    pub fn hold(self, endpoint: Endpoint) -> (Self, Arc<Notify>) {
        let release = Arc::new(Notify::new());
        self.holds
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(endpoint, release.clone());
        (self, release)
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn calls_to(&self, endpoint: Endpoint) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.endpoint == endpoint)
            .count()
    }

    fn push(self, endpoint: Endpoint, reply: Reply) -> Self {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(endpoint)
            .or_default()
            .push_back(reply);
        self
    }

    async fn respond(&self, call: RecordedCall) -> TransportResult<ApiResponse> {
        let endpoint = call.endpoint;
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);

        let hold = self
            .holds
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&endpoint)
            .cloned();
        if let Some(release) = hold {
            release.notified().await;
        }

        let reply = {
            let mut replies = self.replies.lock().unwrap_or_else(PoisonError::into_inner);
            let queue = replies.entry(endpoint).or_default();
            if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            }
        };
        match reply {
            Some(Ok(response)) => Ok(response),
            Some(Err(reason)) => Err(TransportError::Unreachable(reason)),
            None => Err(TransportError::Unreachable(format!(
                "no reply configured for {endpoint:?}"
            ))),
        }
    }
}

impl InvoiceApi for FakeApi {
    fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    async fn sign_in(&self, payload: &SignInPayload) -> TransportResult<ApiResponse> {
        let mut call = RecordedCall::new(Endpoint::SignIn);
        call.body = serde_json::to_value(payload).ok();
        self.respond(call).await
    }

    async fn sign_up(&self, payload: &SignUpPayload) -> TransportResult<ApiResponse> {
        let mut call = RecordedCall::new(Endpoint::SignUp);
        call.body = serde_json::to_value(payload).ok();
        self.respond(call).await
    }

    async fn process_invoice(
        &self,
        auth: HeaderMap,
        upload: UploadRequest,
    ) -> TransportResult<ApiResponse> {
        let mut call = RecordedCall::new(Endpoint::ProcessInvoice).with_auth(&auth);
        call.export_format = Some(upload.export_format.as_str().to_string());
        call.file_name = Some(upload.file.name);
        self.respond(call).await
    }

    async fn list_invoices(&self, auth: HeaderMap) -> TransportResult<ApiResponse> {
        self.respond(RecordedCall::new(Endpoint::ListInvoices).with_auth(&auth))
            .await
    }

    async fn get_invoice(&self, auth: HeaderMap, invoice_id: &str) -> TransportResult<ApiResponse> {
        let mut call = RecordedCall::new(Endpoint::GetInvoice).with_auth(&auth);
        call.target = Some(invoice_id.to_string());
        self.respond(call).await
    }

    async fn delete_invoice(
        &self,
        auth: HeaderMap,
        invoice_id: &str,
    ) -> TransportResult<ApiResponse> {
        let mut call = RecordedCall::new(Endpoint::DeleteInvoice).with_auth(&auth);
        call.target = Some(invoice_id.to_string());
        self.respond(call).await
    }

    async fn health(&self) -> TransportResult<ApiResponse> {
        self.respond(RecordedCall::new(Endpoint::Health)).await
    }
}
