//! Style catalog entry type.

use serde::{Deserialize, Serialize};

/// A selectable transformation style.
///
/// Static configuration data, not user state. `requires_pro` determines
/// whether selecting the style must route through the paywall gate instead
/// of proceeding to generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleEntry {
    /// Stable identifier ("anime", "ghibli", ...).
    pub id: String,
    /// Human-readable name.
    pub display_name: String,
    /// Short description shown in pickers.
    pub description: String,
    /// True when the style is gated behind the pro tier.
    pub requires_pro: bool,
    /// Transformation prompt sent to the generation endpoint.
    pub prompt: String,
}

impl StyleEntry {
    /// Creates a new style entry.
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        description: impl Into<String>,
        requires_pro: bool,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            description: description.into(),
            requires_pro,
            prompt: prompt.into(),
        }
    }
}
