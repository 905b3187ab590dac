//! services/orchestrator/src/adapters/image_gen.rs
//!
//! This module contains the adapter for the image-generation provider.
//! It implements the `ImageGenerationService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::images::{CreateImageRequestArgs, Image, ImageModel, ImageResponseFormat, ImageSize},
    Client,
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use bytes::Bytes;
use social_pilot_core::{
    domain::AspectRatio,
    ports::{ImageGenerationService, ImageRequest, PortError, PortResult},
};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `ImageGenerationService` port using the
/// OpenAI image API.
#[derive(Clone)]
pub struct OpenAiImageAdapter {
    client: Client<OpenAIConfig>,
    model: ImageModel,
}

impl OpenAiImageAdapter {
    /// Creates a new `OpenAiImageAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: ImageModel) -> Self {
        Self { client, model }
    }
}

/// Formats the visual instruction the provider receives for one item.
fn build_prompt(request: &ImageRequest) -> String {
    let style = request
        .stylistic_context
        .as_deref()
        .unwrap_or("clean, high-contrast social media photography");
    format!(
        "Social media {} for {}. Visual: {}. Style: {}",
        request.content_type, request.niche, request.visual_prompt, style
    )
}

/// Portrait requests get a 9:16-shaped canvas, everything else 1:1.
fn image_size(aspect_ratio: AspectRatio) -> ImageSize {
    match aspect_ratio {
        AspectRatio::Portrait => ImageSize::S1024x1792,
        AspectRatio::Square => ImageSize::S1024x1024,
    }
}

//=========================================================================================
// `ImageGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ImageGenerationService for OpenAiImageAdapter {
    /// Generates one visual asset and returns the raw image bytes.
    async fn generate_image(&self, request: &ImageRequest) -> PortResult<Bytes> {
        let api_request = CreateImageRequestArgs::default()
            .model(self.model.clone())
            .prompt(build_prompt(request))
            .size(image_size(request.aspect_ratio))
            .response_format(ImageResponseFormat::B64Json)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .images()
            .generate(api_request)
            .await
            .map_err(|e: OpenAIError| PortError::GenerationFailed(e.to_string()))?;

        // Extract the base64 payload from the first result, if any.
        let b64 = response.data.iter().find_map(|image| match image.as_ref() {
            Image::B64Json { b64_json, .. } => Some(b64_json.as_str().to_string()),
            Image::Url { .. } => None,
        });

        let b64 = b64.ok_or_else(|| {
            PortError::GenerationFailed("provider returned no image payload".to_string())
        })?;
        let decoded = BASE64
            .decode(b64.as_bytes())
            .map_err(|e| PortError::GenerationFailed(e.to_string()))?;
        if decoded.is_empty() {
            return Err(PortError::GenerationFailed(
                "provider returned an empty image payload".to_string(),
            ));
        }

        Ok(Bytes::from(decoded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use social_pilot_core::domain::ContentType;

    #[test]
    fn test_prompt_carries_niche_visual_and_style() {
        let request = ImageRequest {
            content_type: ContentType::Reel,
            visual_prompt: "Sunrise over a desk".to_string(),
            niche: "AI SaaS for Lawyers".to_string(),
            stylistic_context: Some("Warm minimalism".to_string()),
            aspect_ratio: AspectRatio::Portrait,
        };
        let prompt = build_prompt(&request);
        assert!(prompt.contains("Social media Reel for AI SaaS for Lawyers"));
        assert!(prompt.contains("Sunrise over a desk"));
        assert!(prompt.contains("Warm minimalism"));
    }

    #[test]
    fn test_prompt_falls_back_without_persona_style() {
        let request = ImageRequest {
            content_type: ContentType::Post,
            visual_prompt: "v".to_string(),
            niche: "n".to_string(),
            stylistic_context: None,
            aspect_ratio: AspectRatio::Square,
        };
        assert!(build_prompt(&request).contains("photography"));
    }

    #[test]
    fn test_aspect_ratio_maps_to_canvas_size() {
        assert_eq!(image_size(AspectRatio::Portrait), ImageSize::S1024x1792);
        assert_eq!(image_size(AspectRatio::Square), ImageSize::S1024x1024);
    }
}
