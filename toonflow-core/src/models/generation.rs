//! Generation endpoint wire shapes.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ============================================================================
// Request
// ============================================================================

/// Request body for the remote image-generation endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Source image, base64-encoded.
    pub image: String,
    /// MIME type of the source image.
    pub mime_type: String,
    /// Style-derived transformation prompt.
    pub prompt: String,
    /// Optional pre-generated description of the source image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl GenerationRequest {
    /// Creates a request without a description.
    pub fn new(
        image: impl Into<String>,
        mime_type: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            image: image.into(),
            mime_type: mime_type.into(),
            prompt: prompt.into(),
            description: None,
        }
    }
}

// ============================================================================
// Response
// ============================================================================

/// Response body from the remote image-generation endpoint.
///
/// A successful response carries at least one of `image` (base64) or
/// `image_url`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Transformed image, base64-encoded.
    #[serde(default)]
    pub image: Option<String>,
    /// URL of the transformed image, when the server stores it remotely.
    #[serde(default)]
    pub image_url: Option<String>,
    /// MIME type of the transformed image.
    #[serde(default = "default_mime_type")]
    pub mime_type: String,
    /// Optional text accompanying the image.
    #[serde(default)]
    pub accompanying_text: Option<String>,
}

fn default_mime_type() -> String {
    "image/jpeg".to_string()
}

impl GenerationResponse {
    /// Validates that the response carries an image payload.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidData`] when both `image` and `image_url`
    /// are absent or empty.
    pub fn validate(&self) -> Result<(), CoreError> {
        let has_inline = self.image.as_deref().is_some_and(|s| !s.is_empty());
        let has_url = self.image_url.as_deref().is_some_and(|s| !s.is_empty());
        if has_inline || has_url {
            Ok(())
        } else {
            Err(CoreError::InvalidData(
                "response carries neither an inline image nor an image URL".to_string(),
            ))
        }
    }
}

// ============================================================================
// Generated Image
// ============================================================================

/// Normalized successful generation output handed back to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedImage {
    /// Transformed image, base64-encoded, when returned inline.
    pub image: Option<String>,
    /// Remote URL of the transformed image, when stored server-side.
    pub image_url: Option<String>,
    /// MIME type of the transformed image.
    pub mime_type: String,
}

impl GeneratedImage {
    /// Builds the output from a validated response.
    pub fn from_response(response: GenerationResponse) -> Self {
        Self {
            image: response.image,
            image_url: response.image_url,
            mime_type: response.mime_type,
        }
    }

    /// Renders the inline payload as a `data:` URL, if present.
    pub fn data_url(&self) -> Option<String> {
        self.image
            .as_deref()
            .map(|b64| format!("data:{};base64,{}", self.mime_type, b64))
    }
}

// ============================================================================
// Tests
// ============================================================================
