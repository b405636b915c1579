use std::fs;
use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::blocking::{multipart, Client, Response};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::state::data::{GenerationMode, GenerationRequest};

/// Anything that can turn a request into raw image bytes.
///
/// Calls block until the service answers, so they belong on a worker
/// thread, never on the UI thread.
pub trait GenerationClient: Send + Sync {
    fn generate(&self, request: &GenerationRequest) -> AppResult<Vec<u8>>;
}

/// Client for the OpenAI images API (`/images/generations`, `/images/edits`)
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http_client: Client,
    api_key: Option<String>,
    model: String,
    api_base: String,
}

impl OpenAiClient {
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        let http_client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http_client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            api_base: config.api_base.clone(),
        })
    }

    fn require_api_key(&self) -> AppResult<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            AppError::config("OPENAI_API is missing. Add it to your environment or a .env file")
        })
    }

    fn create(&self, api_key: &str, prompt: &str) -> AppResult<Vec<u8>> {
        let payload = CreatePayload {
            model: &self.model,
            prompt,
        };

        let response = self
            .http_client
            .post(format!("{}/images/generations", self.api_base))
            .bearer_auth(api_key)
            .json(&payload)
            .send()?;

        self.read_image_response(response)
    }

    fn edit(&self, api_key: &str, prompt: &str, source: &Path) -> AppResult<Vec<u8>> {
        let bytes = fs::read(source)?;
        let file_name = source
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "image.png".to_string());

        let image = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime_for(source))?;
        let form = multipart::Form::new()
            .text("model", self.model.clone())
            .text("prompt", prompt.to_string())
            .part("image", image);

        let response = self
            .http_client
            .post(format!("{}/images/edits", self.api_base))
            .bearer_auth(api_key)
            .multipart(form)
            .send()?;

        self.read_image_response(response)
    }

    fn read_image_response(&self, response: Response) -> AppResult<Vec<u8>> {
        let status = response.status();
        let body = response.text()?;

        if !status.is_success() {
            return Err(parse_http_error(status, &body));
        }

        let parsed: ImagesResponse = serde_json::from_str(&body)?;
        match first_image(parsed)? {
            ImagePayload::Base64(data) => Ok(STANDARD.decode(data.trim())?),
            ImagePayload::Url(url) => self.download(&url),
        }
    }

    fn download(&self, url: &str) -> AppResult<Vec<u8>> {
        let response = self.http_client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::service(format!(
                "image download failed ({status})"
            )));
        }

        Ok(response.bytes()?.to_vec())
    }
}

impl GenerationClient for OpenAiClient {
    fn generate(&self, request: &GenerationRequest) -> AppResult<Vec<u8>> {
        let api_key = self.require_api_key()?;

        match &request.mode {
            GenerationMode::Create => {
                log::info!("Submitting prompt with no image");
                self.create(api_key, &request.prompt)
            }
            GenerationMode::Edit { source } => {
                log::info!("Submitting prompt with {}", source.display());
                self.edit(api_key, &request.prompt, source)
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct CreatePayload<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    b64_json: Option<String>,
    url: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
enum ImagePayload {
    Base64(String),
    Url(String),
}

fn first_image(response: ImagesResponse) -> AppResult<ImagePayload> {
    let datum = response
        .data
        .into_iter()
        .next()
        .ok_or_else(|| AppError::service("the service returned no image"))?;

    match (datum.b64_json, datum.url) {
        (Some(data), _) if !data.trim().is_empty() => Ok(ImagePayload::Base64(data)),
        (_, Some(url)) if !url.trim().is_empty() => Ok(ImagePayload::Url(url)),
        _ => Err(AppError::service("the service response had no image payload")),
    }
}

fn parse_http_error(status: StatusCode, body: &str) -> AppError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| {
            json.pointer("/error/message")
                .or_else(|| json.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string());

    AppError::service(format!("image request failed ({status}): {message}"))
}

fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => "image/png",
    }
}
