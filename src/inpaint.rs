//! Remote inpainting through a multimodal generation API.
//!
//! The [`Inpainter`] trait is the only seam between the editing flow and the
//! network. [`GeminiClient`] is the production implementation talking to the
//! Gemini `generateContent` REST endpoint; tests swap in a stub.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::encoded::{EncodedImage, DEFAULT_MEDIA_TYPE};
use crate::error::{Error, Result};
use crate::geometry::{Rect, Size};
use crate::region;

/// Default image-capable model.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";
/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Something that can replace a described region of an image.
pub trait Inpainter {
    /// Send `image` and `instruction` out and return the generated image.
    ///
    /// # Errors
    ///
    /// Any transport, API or empty-response failure.
    fn inpaint(&self, image: &EncodedImage, instruction: &str) -> Result<EncodedImage>;
}

impl<T: Inpainter + ?Sized> Inpainter for &T {
    fn inpaint(&self, image: &EncodedImage, instruction: &str) -> Result<EncodedImage> {
        (**self).inpaint(image, instruction)
    }
}

impl<T: Inpainter + ?Sized> Inpainter for Box<T> {
    fn inpaint(&self, image: &EncodedImage, instruction: &str) -> Result<EncodedImage> {
        (**self).inpaint(image, instruction)
    }
}

/// Describe `selection` and ask `inpainter` to remove what it covers.
///
/// # Errors
///
/// Propagates the inpainter's error unchanged.
pub fn remove_watermark<I: Inpainter + ?Sized>(
    inpainter: &I,
    image: &EncodedImage,
    selection: &Rect,
    container: Size,
) -> Result<EncodedImage> {
    let instruction = region::instruction(selection, container);
    tracing::debug!(%selection, %container, "built instruction: {instruction}");
    inpainter.inpaint(image, &instruction)
}

/// Blocking client for the Gemini `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Build a client from configuration.
    ///
    /// A missing API key is not an error here; it is reported by
    /// [`Inpainter::inpaint`] before any request is attempted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the HTTP client cannot be constructed.
    pub fn new(config: &Config) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("mark-vanish/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Same as [`GeminiClient::new`] but with an explicit key and endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the HTTP client cannot be constructed.
    pub fn with_endpoint(
        api_key: Option<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let config = Config {
            api_key,
            model: model.into(),
            base_url: base_url.into(),
            timeout,
            ..Config::default()
        };
        Self::new(&config)
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

impl Inpainter for GeminiClient {
    fn inpaint(&self, image: &EncodedImage, instruction: &str) -> Result<EncodedImage> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(Error::MissingApiKey)?;

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: image.media_type().to_string(),
                            data: image.payload().to_string(),
                        },
                    },
                    Part::Text {
                        text: instruction.to_string(),
                    },
                ],
            }],
        };

        tracing::info!(model = %self.model, bytes = image.approx_byte_len(), "sending inpainting request");
        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            tracing::warn!(status = status.as_u16(), "generation API error: {message}");
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: GenerateContentResponse = response.json()?;
        let image = body.first_image().ok_or(Error::NoImageReturned)?;
        tracing::info!(media_type = image.media_type(), "received inpainted image");
        Ok(image)
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum Part {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Text {
        text: String,
    },
    Other(serde_json::Value),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

impl GenerateContentResponse {
    /// First inline payload across all candidates; later ones are ignored.
    fn first_image(self) -> Option<EncodedImage> {
        self.candidates
            .into_iter()
            .flat_map(|c| c.content.parts)
            .find_map(|part| match part {
                Part::InlineData { inline_data } => {
                    let media_type = if inline_data.mime_type.is_empty() {
                        DEFAULT_MEDIA_TYPE.to_string()
                    } else {
                        inline_data.mime_type
                    };
                    Some(EncodedImage::from_base64(media_type, inline_data.data))
                }
                Part::Text { .. } | Part::Other(_) => None,
            })
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    struct Recorder {
        seen: RefCell<Vec<String>>,
    }

    impl Inpainter for Recorder {
        fn inpaint(&self, image: &EncodedImage, instruction: &str) -> Result<EncodedImage> {
            self.seen.borrow_mut().push(instruction.to_string());
            Ok(image.clone())
        }
    }

    #[test]
    fn remove_watermark_sends_positional_instruction() {
        let recorder = Recorder {
            seen: RefCell::new(Vec::new()),
        };
        let img = EncodedImage::from_bytes("image/png", &[1, 2, 3]);
        let out = remove_watermark(
            &recorder,
            &img,
            &Rect::new(250.0, 260.0, 30.0, 30.0),
            Size::new(300.0, 300.0),
        )
        .unwrap();
        assert_eq!(out, img);
        let seen = recorder.seen.borrow();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].contains("bottom right"));
        assert!(seen[0].contains("(around 250, 260)"));
    }

    #[test]
    fn first_image_skips_text_parts() {
        let body: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[
                {"content":{"parts":[{"text":"here you go"}]}},
                {"content":{"parts":[
                    {"inlineData":{"mimeType":"image/webp","data":"AAAA"}},
                    {"inlineData":{"mimeType":"image/png","data":"BBBB"}}
                ]}}
            ]}"#,
        )
        .unwrap();
        let img = body.first_image().unwrap();
        assert_eq!(img.media_type(), "image/webp");
        assert_eq!(img.payload(), "AAAA");
    }

    #[test]
    fn first_image_defaults_media_type() {
        let body: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"inlineData":{"data":"AAAA"}}]}}]}"#,
        )
        .unwrap();
        assert_eq!(body.first_image().unwrap().media_type(), "image/png");
    }

    #[test]
    fn empty_response_has_no_image() {
        let body: GenerateContentResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(body.first_image().is_none());
        let body: GenerateContentResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"OTHER"}}"#).unwrap();
        assert!(body.first_image().is_none());
    }

    #[test]
    fn request_serializes_inline_data_then_text() {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: "image/jpeg".to_string(),
                            data: "AAEC".to_string(),
                        },
                    },
                    Part::Text {
                        text: "heal it".to_string(),
                    },
                ],
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "contents": [{
                    "parts": [
                        {"inlineData": {"mimeType": "image/jpeg", "data": "AAEC"}},
                        {"text": "heal it"}
                    ]
                }]
            })
        );
    }

    #[test]
    fn missing_key_fails_before_any_request() {
        // Unroutable base URL: reaching the network would surface an Http error instead.
        let client =
            GeminiClient::with_endpoint(None, DEFAULT_MODEL, "http://127.0.0.1:9", None).unwrap();
        let img = EncodedImage::from_bytes("image/png", &[0]);
        assert!(matches!(
            client.inpaint(&img, "x"),
            Err(Error::MissingApiKey)
        ));

        let client =
            GeminiClient::with_endpoint(Some(String::new()), DEFAULT_MODEL, "http://127.0.0.1:9", None)
                .unwrap();
        assert!(matches!(
            client.inpaint(&img, "x"),
            Err(Error::MissingApiKey)
        ));
    }
}
