//! Image analysis client: auto-tagging and background removal.
//!
//! Both calls are best effort. Any failure, including a missing API key, is
//! logged and reported as `None` so the item form keeps working without it.

use anyhow::{Context, Result};
use async_trait::async_trait;
use closet_common::{CategoryL1, Color, ItemDraft, Season};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, warn};

pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com";
const TAGGING_MODEL: &str = "gemini-2.5-flash";
const IMAGE_MODEL: &str = "gemini-2.5-flash-image";

const TAGGING_PROMPT: &str = "Analyze this clothing item. \
Identify the main category (Top, Bottom, Shoes, Dress, Hat). \
Identify the specific sub-category (e.g. T-Shirt, Jeans, Sneakers). \
Identify the primary color. \
Identify the season (Warm, Cold, All). \
Return JSON.";

const BACKGROUND_PROMPT: &str = "Isolate the clothing item in this image. \
Keep the item exactly as it is, but replace the background with pure white color.";

/// Attribute guesses for a photographed item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagSuggestion {
    pub category_l1: String,
    #[serde(default)]
    pub category_l2: String,
    pub color: String,
    pub season: String,
}

impl TagSuggestion {
    /// Copy recognised values into a draft; unrecognised ones are left alone.
    /// The subtype is always taken as suggested.
    pub fn apply_to(&self, draft: &mut ItemDraft) {
        if let Ok(category) = self.category_l1.parse::<CategoryL1>() {
            draft.category_l1 = category;
        }
        draft.category_l2 = Some(self.category_l2.trim().to_string());
        if let Ok(color) = self.color.parse::<Color>() {
            draft.color = color;
        }
        if let Ok(season) = self.season.parse::<Season>() {
            draft.season = season;
        }
    }
}

#[async_trait]
pub trait ClothingVision: Send + Sync {
    async fn tag(&self, image: &str) -> Option<TagSuggestion>;

    /// Returns a `data:image/png;base64,` URL of the cleaned-up image
    async fn remove_background(&self, image: &str) -> Option<String>;
}

/// Used when no vision service is configured.
pub struct NoVision;

#[async_trait]
impl ClothingVision for NoVision {
    async fn tag(&self, _image: &str) -> Option<TagSuggestion> {
        None
    }

    async fn remove_background(&self, _image: &str) -> Option<String> {
        None
    }
}

/// Strip a `data:image/...;base64,` prefix, leaving the raw payload
pub fn strip_data_url(image: &str) -> &str {
    for mime in ["png", "jpeg", "jpg", "webp"] {
        let prefix = format!("data:image/{};base64,", mime);
        if let Some(payload) = image.strip_prefix(prefix.as_str()) {
            return payload;
        }
    }
    image
}

// generateContent response, reduced to what is read here

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
struct InlineData {
    data: Option<String>,
}

impl GenerateResponse {
    fn parts(&self) -> impl Iterator<Item = &Part> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.iter())
            .into_iter()
            .flatten()
    }

    fn text(&self) -> Option<String> {
        let text: String = self.parts().filter_map(|p| p.text.as_deref()).collect();
        (!text.is_empty()).then_some(text)
    }

    fn inline_image(&self) -> Option<&str> {
        self.parts()
            .filter_map(|p| p.inline_data.as_ref())
            .find_map(|d| d.data.as_deref())
            .filter(|d| !d.is_empty())
    }
}

/// Client for the Gemini `generateContent` REST endpoint.
pub struct GeminiVision {
    api_key: Option<String>,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiVision {
    pub fn new(api_key: Option<String>, base_url: String) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url,
            client: reqwest::Client::new(),
        }
    }

    async fn generate(&self, model: &str, body: serde_json::Value) -> Result<Option<GenerateResponse>> {
        let Some(api_key) = &self.api_key else {
            warn!("No vision API key configured, skipping {}", model);
            return Ok(None);
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            model
        );
        debug!("Calling vision model {}", model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .context("Vision request failed")?;

        if !response.status().is_success() {
            anyhow::bail!("Vision request returned {}", response.status());
        }

        let parsed = response
            .json()
            .await
            .context("Failed to parse vision response")?;
        Ok(Some(parsed))
    }

    async fn try_tag(&self, image: &str) -> Result<Option<TagSuggestion>> {
        let body = json!({
            "contents": [{
                "parts": [
                    { "inlineData": { "mimeType": "image/png", "data": strip_data_url(image) } },
                    { "text": TAGGING_PROMPT }
                ]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "OBJECT",
                    "properties": {
                        "categoryL1": {
                            "type": "STRING",
                            "enum": CategoryL1::ALL.iter().map(|c| c.as_str()).collect::<Vec<_>>()
                        },
                        "categoryL2": { "type": "STRING" },
                        "color": { "type": "STRING" },
                        "season": {
                            "type": "STRING",
                            "enum": [Season::Warm.label(), Season::Cold.label(), Season::AllYear.label()]
                        }
                    },
                    "required": ["categoryL1", "categoryL2", "color", "season"]
                }
            }
        });

        let Some(response) = self.generate(TAGGING_MODEL, body).await? else {
            return Ok(None);
        };
        match response.text() {
            Some(text) => Ok(Some(
                serde_json::from_str(&text).context("Tag response is not valid JSON")?,
            )),
            None => Ok(None),
        }
    }

    async fn try_remove_background(&self, image: &str) -> Result<Option<String>> {
        let body = json!({
            "contents": [{
                "parts": [
                    { "inlineData": { "mimeType": "image/png", "data": strip_data_url(image) } },
                    { "text": BACKGROUND_PROMPT }
                ]
            }]
        });

        let Some(response) = self.generate(IMAGE_MODEL, body).await? else {
            return Ok(None);
        };
        Ok(response
            .inline_image()
            .map(|data| format!("data:image/png;base64,{}", data)))
    }
}

#[async_trait]
impl ClothingVision for GeminiVision {
    async fn tag(&self, image: &str) -> Option<TagSuggestion> {
        match self.try_tag(image).await {
            Ok(tags) => tags,
            Err(e) => {
                error!("Image tagging failed: {:#}", e);
                None
            }
        }
    }

    async fn remove_background(&self, image: &str) -> Option<String> {
        match self.try_remove_background(image).await {
            Ok(image) => image,
            Err(e) => {
                error!("Background removal failed: {:#}", e);
                None
            }
        }
    }
}
