//! reqwest-backed implementation of [`InvoiceApi`].

use reqwest::header::{HeaderMap, ACCEPT};
use reqwest::{multipart, Client, RequestBuilder};

use super::{
    ApiResponse, InvoiceApi, SignInPayload, SignUpPayload, TransportError, TransportResult,
};
use crate::config::{ClientConfig, Endpoints};
use crate::upload::UploadRequest;

/// HTTP client for the invoice service.
#[derive(Debug, Clone)]
pub struct HttpInvoiceApi {
    endpoints: Endpoints,
    client: Client,
}

impl HttpInvoiceApi {
    pub fn new(config: &ClientConfig) -> crate::Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(TransportError::from)?;
        Ok(Self {
            endpoints: config.endpoints(),
            client,
        })
    }

    async fn execute(&self, request: RequestBuilder) -> TransportResult<ApiResponse> {
        let response = request
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        tracing::debug!(status, bytes = body.len(), "Invoice service responded");
        Ok(ApiResponse { status, body })
    }
}

impl InvoiceApi for HttpInvoiceApi {
    fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    async fn sign_in(&self, payload: &SignInPayload) -> TransportResult<ApiResponse> {
        let request = self.client.post(self.endpoints.sign_in()).json(payload);
        self.execute(request).await
    }

    async fn sign_up(&self, payload: &SignUpPayload) -> TransportResult<ApiResponse> {
        let request = self.client.post(self.endpoints.sign_up()).json(payload);
        self.execute(request).await
    }

    async fn process_invoice(
        &self,
        auth: HeaderMap,
        upload: UploadRequest,
    ) -> TransportResult<ApiResponse> {
        let UploadRequest {
            file,
            export_format,
        } = upload;
        let file_part = multipart::Part::bytes(file.bytes)
            .file_name(file.name)
            .mime_str(&file.mime_type)?;
        let form = multipart::Form::new()
            .part("file", file_part)
            .text("export_format", export_format.as_str());

        let request = self
            .client
            .post(self.endpoints.process_invoice())
            .headers(auth)
            .multipart(form);
        self.execute(request).await
    }

    async fn list_invoices(&self, auth: HeaderMap) -> TransportResult<ApiResponse> {
        let request = self.client.get(self.endpoints.invoices()).headers(auth);
        self.execute(request).await
    }

    async fn get_invoice(&self, auth: HeaderMap, invoice_id: &str) -> TransportResult<ApiResponse> {
        let request = self
            .client
            .get(self.endpoints.invoice(invoice_id))
            .headers(auth);
        self.execute(request).await
    }

    async fn delete_invoice(
        &self,
        auth: HeaderMap,
        invoice_id: &str,
    ) -> TransportResult<ApiResponse> {
        let request = self
            .client
            .delete(self.endpoints.invoice(invoice_id))
            .headers(auth);
        self.execute(request).await
    }

    async fn health(&self) -> TransportResult<ApiResponse> {
        let request = self.client.get(self.endpoints.health());
        self.execute(request).await
    }
}
