//! Classification service client.
//!
//! Asks a multimodal model whether a photo's path and file name agree with
//! its capture metadata. The service answers in free text; the label is
//! pulled out with [`parse_label`] and any communication failure becomes a
//! `JUDGE_ERROR` vote.
//!
//! The wire format is the OpenAI-compatible chat completions API served by
//! LM Studio, llama.cpp server, vLLM and friends.

use crate::cancel::CancellationToken;
use crate::config::{AppConfig, ClassifierConfig, NetworkConfig};
use crate::error::{ChronofileError, Result};
use crate::judgment::{parse_label, ClassificationLabel};
use crate::metadata::MetadataSummary;
use async_trait::async_trait;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Everything the service sees about one photo.
#[derive(Debug, Clone)]
pub struct ClassificationRequest {
    /// Path relative to the analysis root, split into components.
    pub path_components: Vec<String>,
    pub filename: String,
    pub metadata: MetadataSummary,
    pub image_bytes: Vec<u8>,
}

impl ClassificationRequest {
    /// Text prompt listing the path, metadata and the allowed answers.
    pub fn prompt(&self) -> String {
        let answers = ClassificationLabel::ANSWERS
            .iter()
            .map(|label| format!("\"{}\"", label))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "Analyze the photo's path, file name and EXIF data and decide:\n\
             1. Whether the path/file name and the EXIF data are related\n\
             2. If related, whether they agree with each other\n\
             3. If they disagree, which side is more likely wrong\n\
             \n\
             Path: {path}\n\
             File name: {filename}\n\
             EXIF:\n\
             - Capture date: {date}\n\
             - Make: {make}\n\
             - Model: {model}\n\
             - GPS: {gps}\n\
             \n\
             The image is attached. Use its content as well, in particular whether the \
             subject or scenery relates to the file name or path.\n\
             \n\
             Answer with exactly one of:\n{answers}\n",
            path = self.path_components.join("/"),
            filename = self.filename,
            date = self.metadata.date_time_original,
            make = self.metadata.make,
            model = self.metadata.model,
            gps = if self.metadata.has_gps { "present" } else { "absent" },
            answers = answers,
        )
    }
}

/// A service that judges path/metadata consistency.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Send one request and return the raw text response.
    async fn classify(&self, request: &ClassificationRequest) -> Result<String>;
}

/// Response from `POST /chat/completions`.
#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Helper to create a network error.
fn net_err(msg: String) -> ChronofileError {
    ChronofileError::Network {
        message: msg,
        cause: None,
    }
}

/// [`Classifier`] speaking the OpenAI-compatible chat completions API.
pub struct OpenAiClassifier {
    base_url: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiClassifier {
    pub fn new(config: &ClassifierConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(NetworkConfig::CONNECT_TIMEOUT)
            .user_agent(AppConfig::USER_AGENT)
            .build()
            .map_err(|e| ChronofileError::Config {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            client,
        })
    }

    fn request_body(&self, request: &ClassificationRequest) -> serde_json::Value {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&request.image_bytes);
        json!({
            "model": self.model,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": request.prompt() },
                    {
                        "type": "image_url",
                        "image_url": { "url": format!("data:image/jpeg;base64,{}", encoded) }
                    }
                ]
            }]
        })
    }
}

#[async_trait]
impl Classifier for OpenAiClassifier {
    async fn classify(&self, request: &ClassificationRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!("Classifying {} via {}", request.filename, url);

        let mut builder = self.client.post(&url).json(&self.request_body(request));
        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(net_err(format!("Classifier returned {}: {}", status, body)));
        }
        parse_completion(&body)
    }
}

/// Text of the first choice in a chat completions response body.
fn parse_completion(body: &str) -> Result<String> {
    let completion: ChatCompletion = serde_json::from_str(body)?;
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| net_err("Classifier response had no content".to_string()))
}

/// Ask once and reduce the answer to a label.
///
/// Errors and deadline overruns become [`ClassificationLabel::JudgeError`].
pub async fn judge_once(
    classifier: &dyn Classifier,
    request: &ClassificationRequest,
    timeout: Duration,
) -> ClassificationLabel {
    match tokio::time::timeout(timeout, classifier.classify(request)).await {
        Ok(Ok(response)) => {
            debug!("Classifier response for {}: {}", request.filename, response);
            parse_label(&response)
        }
        Ok(Err(e)) => {
            if e.is_service_failure() {
                warn!("Classification failed for {}: {}", request.filename, e);
            } else {
                error!("Unexpected classifier error for {}: {}", request.filename, e);
            }
            ClassificationLabel::JudgeError
        }
        Err(_) => {
            let e = ChronofileError::Timeout(timeout);
            warn!("Classification failed for {}: {}", request.filename, e);
            ClassificationLabel::JudgeError
        }
    }
}

/// Collect `samples` judgments one after another.
///
/// Stops issuing calls once `cancel` fires and returns
/// [`ChronofileError::Cancelled`]; a partial batch is never returned.
pub async fn collect_judgments(
    classifier: &dyn Classifier,
    request: &ClassificationRequest,
    samples: usize,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<Vec<ClassificationLabel>> {
    let mut batch = Vec::with_capacity(samples);
    for _ in 0..samples {
        cancel.check()?;
        batch.push(judge_once(classifier, request, timeout).await);
    }
    Ok(batch)
}
