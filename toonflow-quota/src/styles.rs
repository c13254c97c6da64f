//! The style catalog.
//!
//! Static registry of the transformation styles the app offers, each with
//! its backend prompt and its tier requirement. One style is free so the
//! free tier has something real to try; the rest are pro-only.

use std::sync::OnceLock;

use toonflow_core::StyleEntry;

static CATALOG: OnceLock<Vec<StyleEntry>> = OnceLock::new();

fn build_catalog() -> Vec<StyleEntry> {
    vec![
        StyleEntry::new(
            "ghibli",
            "Studio Ghibli",
            "Soft watercolor worlds and gentle characters",
            false,
            "Transform this photo into a Studio Ghibli style illustration with \
             soft watercolor backgrounds, gentle natural lighting, and warm, \
             hand-painted textures.",
        ),
        StyleEntry::new(
            "anime",
            "Anime",
            "Bold Japanese animation look",
            true,
            "Transform this photo into a Japanese anime illustration with big \
             expressive eyes, clean line art, vivid colors, and dramatic \
             lighting.",
        ),
        StyleEntry::new(
            "pixar",
            "3D Animation",
            "Polished 3D animated-movie characters",
            true,
            "Transform this photo into a polished 3D animated movie style with \
             rounded character features, soft global illumination, and vibrant \
             cinematic color grading.",
        ),
        StyleEntry::new(
            "western_comic",
            "Comic Book",
            "Inked panels and halftone shading",
            true,
            "Transform this photo into a western comic book illustration with \
             bold ink outlines, halftone shading, and saturated primary colors.",
        ),
        StyleEntry::new(
            "vintage_disney",
            "Vintage Cartoon",
            "Hand-drawn golden-age animation",
            true,
            "Transform this photo into a vintage hand-drawn cartoon in the \
             style of golden-age animation, with rubber-hose limbs, soft cel \
             shading, and a muted film-grain palette.",
        ),
        StyleEntry::new(
            "flat_vector",
            "Flat Vector",
            "Minimal geometric vector art",
            true,
            "Transform this photo into flat vector art with simple geometric \
             shapes, a limited modern color palette, and no gradients or \
             outlines.",
        ),
        StyleEntry::new(
            "sketchbook",
            "Pencil Sketch",
            "Loose graphite sketchbook drawing",
            true,
            "Transform this photo into a loose pencil sketch with visible \
             graphite strokes, crosshatched shading, and untouched paper \
             texture.",
        ),
    ]
}

/// Read-only access to the built-in styles.
pub struct StyleCatalog;

impl StyleCatalog {
    /// Every style, in display order.
    pub fn all() -> &'static [StyleEntry] {
        CATALOG.get_or_init(build_catalog)
    }

    /// Looks up a style by its stable id.
    pub fn get(id: &str) -> Option<&'static StyleEntry> {
        Self::all().iter().find(|style| style.id == id)
    }

    /// Styles available on the free tier.
    pub fn free_styles() -> impl Iterator<Item = &'static StyleEntry> {
        Self::all().iter().filter(|style| !style.requires_pro)
    }

    /// Styles requiring an active subscription.
    pub fn pro_styles() -> impl Iterator<Item = &'static StyleEntry> {
        Self::all().iter().filter(|style| style.requires_pro)
    }
}
