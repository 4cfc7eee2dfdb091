//! reqwest implementation of [`Backend`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::{
    AnalysisEnvelope, Backend, BackendError, ChatReply, ChatTurn, CompareRequest,
    ComparisonEnvelope, Endpoint, FilePayload,
};
use crate::config::BackendConfig;

/// HTTP client for the analysis and chatbot backend.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http: reqwest::Client,
    message_url: Url,
    upload_url: Url,
    analyze_url: Url,
    compare_url: Url,
}

impl HttpBackend {
    /// Build a client from configuration.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Self::with_client(config, builder.build()?)
    }

    /// Build with a caller-supplied reqwest client.
    pub fn with_client(config: &BackendConfig, http: reqwest::Client) -> Result<Self, BackendError> {
        let base = Url::parse(&config.base_url)?;
        Ok(Self {
            http,
            message_url: base.join(&config.message_path)?,
            upload_url: base.join(&config.upload_path)?,
            analyze_url: base.join(&config.analyze_path)?,
            compare_url: base.join(&config.compare_path)?,
        })
    }

    /// Resolved URL for an endpoint.
    #[must_use]
    pub fn url(&self, endpoint: Endpoint) -> &Url {
        match endpoint {
            Endpoint::Message => &self.message_url,
            Endpoint::Upload => &self.upload_url,
            Endpoint::Analyze => &self.analyze_url,
            Endpoint::Compare => &self.compare_url,
        }
    }

    async fn read_json<T: DeserializeOwned>(
        endpoint: Endpoint,
        response: reqwest::Response,
    ) -> Result<T, BackendError> {
        let status = response.status();
        debug!(endpoint = %endpoint, status = status.as_u16(), "Backend responded");
        if !status.is_success() {
            return Err(BackendError::Status {
                endpoint,
                status: status.as_u16(),
            });
        }
        Ok(response.json::<T>().await?)
    }

    fn file_part(file: &FilePayload) -> Result<Part, BackendError> {
        Ok(Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.mime_type)?)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn send_message(&self, turn: &ChatTurn) -> Result<String, BackendError> {
        let response = self
            .http
            .post(self.message_url.clone())
            .json(turn)
            .send()
            .await?;
        let reply: ChatReply = Self::read_json(Endpoint::Message, response).await?;
        reply.into_text(Endpoint::Message)
    }

    async fn upload_attachment(
        &self,
        session_id: &str,
        file: &FilePayload,
    ) -> Result<String, BackendError> {
        let form = Form::new()
            .text("session_id", session_id.to_owned())
            .part("file", Self::file_part(file)?);
        let response = self
            .http
            .post(self.upload_url.clone())
            .multipart(form)
            .send()
            .await?;
        let reply: ChatReply = Self::read_json(Endpoint::Upload, response).await?;
        reply.into_text(Endpoint::Upload)
    }

    async fn analyze_bill(&self, file: &FilePayload) -> Result<Value, BackendError> {
        let form = Form::new().part("file", Self::file_part(file)?);
        let response = self
            .http
            .post(self.analyze_url.clone())
            .multipart(form)
            .send()
            .await?;
        let envelope: AnalysisEnvelope = Self::read_json(Endpoint::Analyze, response).await?;
        envelope.into_value()
    }

    async fn compare_bills(
        &self,
        current: &Value,
        previous: &Value,
    ) -> Result<Value, BackendError> {
        let body = CompareRequest {
            current_bill: current,
            previous_bill: previous,
        };
        let response = self
            .http
            .post(self.compare_url.clone())
            .json(&body)
            .send()
            .await?;
        let envelope: ComparisonEnvelope = Self::read_json(Endpoint::Compare, response).await?;
        Ok(envelope.into_value())
    }
}
