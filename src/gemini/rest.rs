use std::future::Future;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use super::backend::{
    GeneratedImage, GenerationBackend, ImageRequest, Operation, VideoRequest,
};
use crate::config::{Config, SharedApiKey};
use crate::error::{AppError, Result};

/// Upper bound on the buffer reserved from a Content-Length header.
const MAX_PREALLOC: u64 = 64 << 20;

/// Imagen request types
#[derive(Serialize)]
struct PredictRequest<I, P> {
    instances: Vec<I>,
    parameters: P,
}

#[derive(Serialize)]
struct ImageInstance {
    prompt: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageParameters {
    sample_count: u32,
    aspect_ratio: String,
    output_options: OutputOptions,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OutputOptions {
    mime_type: String,
}

/// Imagen response types
#[derive(Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    #[serde(default)]
    bytes_base64_encoded: Option<String>,
    #[serde(default)]
    mime_type: Option<String>,
}

/// Veo request types
#[derive(Serialize)]
struct VideoInstance {
    prompt: String,
    image: InlineImage,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineImage {
    bytes_base64_encoded: String,
    mime_type: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoParameters {
    sample_count: u32,
    resolution: String,
    aspect_ratio: String,
}

/// Gemini REST API backend.
///
/// Requests run on the tokio runtime behind `runtime` when one is given, so the
/// backend can be awaited from a non-tokio executor such as the GTK main loop.
#[derive(Clone)]
pub struct GeminiRest {
    client: reqwest::Client,
    base_url: String,
    api_key: SharedApiKey,
    runtime: Option<tokio::runtime::Handle>,
}

impl GeminiRest {
    pub fn new(config: &Config, api_key: SharedApiKey) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key,
            runtime: None,
        }
    }

    pub fn with_runtime(mut self, runtime: tokio::runtime::Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    fn key(&self) -> Result<String> {
        self.api_key
            .get()
            .ok_or_else(|| AppError::credential("API key is not set"))
    }

    async fn run<T, F>(&self, fut: F) -> Result<T>
    where
        T: Send + 'static,
        F: Future<Output = Result<T>> + Send + 'static,
    {
        match &self.runtime {
            Some(handle) => handle
                .spawn(fut)
                .await
                .map_err(|e| AppError::backend(format!("request task failed: {e}")))?,
            None => fut.await,
        }
    }
}

impl GenerationBackend for GeminiRest {
    fn has_credentials(&self) -> bool {
        self.api_key.get().is_some()
    }

    async fn generate_images(&self, request: &ImageRequest) -> Result<Vec<GeneratedImage>> {
        let url = format!("{}/models/{}:predict", self.base_url, request.model);
        let key = self.key()?;
        let body = PredictRequest {
            instances: vec![ImageInstance {
                prompt: request.prompt.clone(),
            }],
            parameters: ImageParameters {
                sample_count: request.number_of_images,
                aspect_ratio: request.aspect_ratio.clone(),
                output_options: OutputOptions {
                    mime_type: request.output_mime_type.clone(),
                },
            },
        };
        let default_mime = request.output_mime_type.clone();
        let client = self.client.clone();

        self.run(async move {
            let resp: PredictResponse = post_json(&client, &url, &key, &body).await?;
            resp.predictions
                .into_iter()
                .filter_map(|p| Some((p.bytes_base64_encoded?, p.mime_type)))
                .map(|(data, mime)| {
                    let bytes = STANDARD
                        .decode(data.as_bytes())
                        .map_err(|e| AppError::backend(format!("invalid image payload: {e}")))?;
                    Ok(GeneratedImage {
                        mime_type: mime.unwrap_or_else(|| default_mime.clone()),
                        bytes,
                    })
                })
                .collect::<Result<Vec<_>>>()
        })
        .await
    }

    async fn generate_videos(&self, request: &VideoRequest) -> Result<Operation> {
        let url = format!("{}/models/{}:predictLongRunning", self.base_url, request.model);
        let key = self.key()?;
        let body = PredictRequest {
            instances: vec![VideoInstance {
                prompt: request.prompt.clone(),
                image: InlineImage {
                    bytes_base64_encoded: request.image.data.clone(),
                    mime_type: request.image.mime_type.clone(),
                },
            }],
            parameters: VideoParameters {
                sample_count: request.number_of_videos,
                resolution: request.resolution.clone(),
                aspect_ratio: request.aspect_ratio.as_str().to_string(),
            },
        };
        let client = self.client.clone();

        self.run(async move { post_json(&client, &url, &key, &body).await })
            .await
    }

    async fn get_operation(&self, operation: &Operation) -> Result<Operation> {
        let url = format!("{}/{}", self.base_url, operation.name);
        let key = self.key()?;
        let client = self.client.clone();

        self.run(async move {
            let resp = client.get(&url).query(&[("key", key)]).send().await?;
            read_json(resp).await
        })
        .await
    }

    async fn fetch_media(&self, uri: &str) -> Result<Vec<u8>> {
        use futures_util::StreamExt;

        let key = self.key()?;
        let mut url = reqwest::Url::parse(uri)
            .map_err(|e| AppError::download(format!("invalid media location {uri}: {e}")))?;
        url.query_pairs_mut().append_pair("key", &key);
        let client = self.client.clone();

        self.run(async move {
            let resp = client
                .get(url)
                .send()
                .await
                .map_err(|e| AppError::download(e.to_string()))?;
            let status = resp.status();
            if !status.is_success() {
                return Err(AppError::download(format!(
                    "Failed to download video file. Status: {status}"
                )));
            }

            let total = resp.content_length().unwrap_or(0);
            let mut bytes = Vec::with_capacity(initial_capacity(total));
            let mut stream = resp.bytes_stream();
            while let Some(chunk) = stream.next().await {
                let chunk = chunk.map_err(|e| AppError::download(e.to_string()))?;
                bytes.extend_from_slice(&chunk);
                log::debug!("Downloaded {} / {total} bytes", bytes.len());
            }
            log::info!("Video downloaded ({} bytes)", bytes.len());
            Ok(bytes)
        })
        .await
    }
}

fn initial_capacity(content_length: u64) -> usize {
    content_length.min(MAX_PREALLOC) as usize
}

async fn post_json<B, T>(client: &reqwest::Client, url: &str, key: &str, body: &B) -> Result<T>
where
    B: Serialize,
    T: for<'de> Deserialize<'de>,
{
    let resp = client
        .post(url)
        .query(&[("key", key)])
        .json(body)
        .send()
        .await?;
    read_json(resp).await
}

async fn read_json<T>(resp: reqwest::Response) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    if !resp.status().is_success() {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        return Err(AppError::backend(format!("Gemini API error {status}: {text}")));
    }
    Ok(resp.json().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::AspectRatio;

    #[test]
    fn download_buffer_does_not_trust_huge_content_length() {
        assert_eq!(initial_capacity(0), 0);
        assert_eq!(initial_capacity(1024), 1024);
        assert_eq!(initial_capacity(u64::MAX), MAX_PREALLOC as usize);
    }

    #[test]
    fn image_request_body_matches_predict_schema() {
        let body = PredictRequest {
            instances: vec![ImageInstance {
                prompt: "a rocket".into(),
            }],
            parameters: ImageParameters {
                sample_count: 1,
                aspect_ratio: "1:1".into(),
                output_options: OutputOptions {
                    mime_type: "image/jpeg".into(),
                },
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["instances"][0]["prompt"], "a rocket");
        assert_eq!(json["parameters"]["sampleCount"], 1);
        assert_eq!(json["parameters"]["aspectRatio"], "1:1");
        assert_eq!(json["parameters"]["outputOptions"]["mimeType"], "image/jpeg");
    }

    #[test]
    fn video_request_body_carries_image_and_ratio() {
        let body = PredictRequest {
            instances: vec![VideoInstance {
                prompt: "float".into(),
                image: InlineImage {
                    bytes_base64_encoded: "AAAA".into(),
                    mime_type: "image/png".into(),
                },
            }],
            parameters: VideoParameters {
                sample_count: 1,
                resolution: "720p".into(),
                aspect_ratio: AspectRatio::Portrait.as_str().into(),
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["instances"][0]["image"]["bytesBase64Encoded"], "AAAA");
        assert_eq!(json["instances"][0]["image"]["mimeType"], "image/png");
        assert_eq!(json["parameters"]["aspectRatio"], "9:16");
        assert_eq!(json["parameters"]["resolution"], "720p");
    }

    #[test]
    fn predict_response_tolerates_missing_predictions() {
        let resp: PredictResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.predictions.is_empty());

        let resp: PredictResponse = serde_json::from_str(
            r#"{ "predictions": [ { "bytesBase64Encoded": "AQID", "mimeType": "image/jpeg" } ] }"#,
        )
        .unwrap();
        assert_eq!(resp.predictions[0].bytes_base64_encoded.as_deref(), Some("AQID"));
    }

    #[test]
    fn missing_key_is_reported_without_network() {
        let backend = GeminiRest::new(&Config::default(), SharedApiKey::new(""));
        assert!(!backend.has_credentials());
        assert!(matches!(backend.key(), Err(AppError::Credential(_))));

        let backend = GeminiRest::new(&Config::default(), SharedApiKey::new("k"));
        assert!(backend.has_credentials());
    }
}
