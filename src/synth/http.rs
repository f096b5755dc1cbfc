use async_trait::async_trait;
use log::{debug, error};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::SynthesisError;
use crate::synth::{SpeechSynthesizer, SynthesizedVoice, VoicePayload};

/// HTTP client for a remote text-to-speech service
#[derive(Debug)]
pub struct HttpSynthesizer {
    /// Base URL of the synthesis API
    base_url: String,
    /// API key sent as a bearer token; empty for unauthenticated services
    api_key: String,
    /// Voice model requested from the service
    model: String,
    /// HTTP client for making requests
    client: Client,
    /// Maximum number of retry attempts for transient failures
    max_retries: u32,
    /// Base backoff time in milliseconds for exponential backoff
    backoff_base_ms: u64,
}

/// Speech request for the synthesis API
#[derive(Debug, Serialize)]
pub struct SpeechRequest {
    /// Voice model to use
    model: String,
    /// Voice identifier
    voice: String,
    /// Markup to speak
    input: String,
    /// Requested container format
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<String>,
    /// Playback sample rate hint
    #[serde(skip_serializing_if = "Option::is_none")]
    sample_rate: Option<u32>,
}

impl SpeechRequest {
    pub fn new(model: impl Into<String>, voice: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            voice: voice.into(),
            input: input.into(),
            format: None,
            sample_rate: None,
        }
    }

    /// Set the container format for the response audio
    #[allow(dead_code)]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }
}

/// Speech response from the synthesis API
#[derive(Debug, Deserialize)]
pub struct SpeechResponse {
    /// URL of the rendered audio
    pub audio_url: String,
    /// Spoken length in seconds
    pub duration_secs: f64,
    /// Voice the service actually used
    #[serde(default)]
    pub voice: Option<String>,
}

impl HttpSynthesizer {
    /// Create a new client from a complete base URL.
    ///
    /// Uses connection pooling for better performance with concurrent
    /// requests.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .pool_idle_timeout(Duration::from_secs(90))
                .pool_max_idle_per_host(8)
                .tcp_keepalive(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
            max_retries,
            backoff_base_ms,
        }
    }

    fn speech_url(&self) -> String {
        format!("{}/v1/speech", self.base_url)
    }

    /// Send one speech request with retry logic.
    ///
    /// Server errors and network failures retry with exponential backoff.
    /// Rate limiting (429) returns immediately so the caller's batch pacer
    /// can react; client errors never retry.
    async fn request_speech(&self, request: &SpeechRequest) -> Result<SpeechResponse, SynthesisError> {
        let url = self.speech_url();

        let mut attempt = 0;
        let mut last_error = None;

        while attempt <= self.max_retries {
            let mut builder = self.client.post(&url).json(request);
            if !self.api_key.is_empty() {
                builder = builder.bearer_auth(&self.api_key);
            }

            match builder.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let response_text = response.text().await.map_err(|e| {
                            SynthesisError::RequestFailed(format!(
                                "Failed to read speech response body: {}",
                                e
                            ))
                        })?;

                        return serde_json::from_str::<SpeechResponse>(&response_text).map_err(|e| {
                            error!(
                                "Failed to parse speech response: {}. Raw response (first 500 chars): {}",
                                e,
                                response_text.chars().take(500).collect::<String>()
                            );
                            SynthesisError::ParseError(e.to_string())
                        });
                    } else if status == StatusCode::TOO_MANY_REQUESTS {
                        let message = response
                            .text()
                            .await
                            .unwrap_or_else(|_| "rate limited".to_string());
                        return Err(SynthesisError::RateLimited(message));
                    } else if status.is_server_error() {
                        let error_text = response
                            .text()
                            .await
                            .unwrap_or_else(|_| "Failed to get error response text".to_string());
                        error!(
                            "Speech API error ({}): {} - attempt {}/{}",
                            status,
                            error_text,
                            attempt + 1,
                            self.max_retries + 1
                        );
                        last_error = Some(SynthesisError::ApiError {
                            status_code: status.as_u16(),
                            message: error_text,
                        });
                    } else {
                        let error_text = response
                            .text()
                            .await
                            .unwrap_or_else(|_| "Failed to get error response text".to_string());
                        error!("Speech API error ({}): {}", status, error_text);
                        return Err(SynthesisError::ApiError {
                            status_code: status.as_u16(),
                            message: error_text,
                        });
                    }
                }
                Err(e) => {
                    last_error = Some(SynthesisError::ConnectionError(e.to_string()));
                    error!(
                        "Speech API network error: {} - attempt {}/{}",
                        e,
                        attempt + 1,
                        self.max_retries + 1
                    );
                }
            }

            attempt += 1;

            // If we have more retries left, wait with exponential backoff
            if attempt <= self.max_retries {
                let backoff_ms = self.backoff_base_ms * (1u64 << (attempt - 1));
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            SynthesisError::RequestFailed(format!(
                "Speech request failed after {} attempts",
                self.max_retries + 1
            ))
        }))
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSynthesizer {
    async fn synthesize(
        &self,
        voice_id: &str,
        markup: &str,
    ) -> Result<SynthesizedVoice, SynthesisError> {
        debug!(
            "Requesting synthesis: voice='{}', markup length {}",
            voice_id,
            markup.chars().count()
        );

        let request = SpeechRequest::new(&self.model, voice_id, markup);
        let response = self.request_speech(&request).await?;

        if response.audio_url.is_empty() || response.duration_secs <= 0.0 {
            return Err(SynthesisError::Unusable {
                voice_id: voice_id.to_string(),
                reason: format!(
                    "audio_url empty={}, duration={}",
                    response.audio_url.is_empty(),
                    response.duration_secs
                ),
            });
        }

        Ok(SynthesizedVoice {
            payload: VoicePayload::Url(response.audio_url),
            duration_secs: response.duration_secs,
        })
    }

    async fn test_connection(&self) -> Result<(), SynthesisError> {
        let url = format!("{}/v1/voices", self.base_url);
        let mut builder = self.client.get(&url);
        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| SynthesisError::ConnectionError(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(SynthesisError::ApiError {
                status_code: response.status().as_u16(),
                message: "voice listing failed".to_string(),
            })
        }
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
