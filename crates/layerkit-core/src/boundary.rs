//! The opaque collaborator interfaces the core itself never implements: the
//! rendering backend (display list, compositor, drawable canvas), bitmap
//! factories, and font matching. Everything here is a trait (or a minimal
//! concrete shape needed to exercise the root's frame loop in tests) — the
//! real Skia/font-shaping/image-codec implementations live in a host, not in
//! this crate.

use layerkit_foundation::{Rect, Scalar, Size, TimePoint};
use std::fmt;

// ---------------------------------------------------------------------
// Display list / compositor / canvas
// ---------------------------------------------------------------------

/// Implemented by a host's render backend to actually paint a layer's
/// content into the display list. Opaque to the core (the
/// runtime only sees an opaque display-list and drawable canvas").
pub trait LayerContent {
    fn draw(&self, layer_id: u64, display_list: &mut DisplayList);
}

/// Counters populated while walking the tree in `Layer::draw`, surfaced in
/// the frame-slowness diagnostic.
#[derive(Debug, Clone, Copy, Default)]
pub struct DrawMetrics {
    pub visited_layers: u64,
    pub draw_cache_miss: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct LayerRecord {
    pub layer_id: u64,
    pub visual_frame: Rect,
}

/// An opaque ordered record of draw operations plus the time at which they
/// were produced (glossary: "Display list"). The core only appends layer
/// bookkeeping records here; actual paint commands are pushed by whatever
/// `LayerContent` a host attaches, through a side channel of its own —
/// out of scope for this crate.
#[derive(Debug, Clone)]
pub struct DisplayList {
    pub size: Size,
    pub time: TimePoint,
    records: Vec<LayerRecord>,
}

impl DisplayList {
    pub fn new(size: Size, time: TimePoint) -> Self {
        Self {
            size,
            time,
            records: Vec::new(),
        }
    }

    pub fn record_layer(&mut self, layer_id: u64, visual_frame: Rect) {
        self.records.push(LayerRecord {
            layer_id,
            visual_frame,
        });
    }

    pub fn records(&self) -> &[LayerRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct CompositorPlane {
    pub layer_ids: Vec<u64>,
}

/// Partitions a display list's draw operations into composition planes;
/// opaque to the core (spec glossary).
#[derive(Debug, Clone, Default)]
pub struct CompositorPlaneList {
    pub planes: Vec<CompositorPlane>,
}

pub trait Compositor {
    fn compose(&mut self, display_list: &DisplayList) -> CompositorPlaneList;
}

/// Fallback compositor used when a host doesn't supply its own: every
/// recorded layer lands in a single plane. Real plane partitioning
/// (opaque/transparent splitting, overlay promotion, ...) is a rendering
/// backend concern, not something this crate decides.
#[derive(Debug, Default)]
pub struct SinglePlaneCompositor;

impl Compositor for SinglePlaneCompositor {
    fn compose(&mut self, display_list: &DisplayList) -> CompositorPlaneList {
        CompositorPlaneList {
            planes: vec![CompositorPlane {
                layer_ids: display_list.records().iter().map(|r| r.layer_id).collect(),
            }],
        }
    }
}

/// The drawable surface a host hands `LayerRoot::draw_in_canvas` — a
/// scoped-acquisition render target.
pub trait DrawableSurfaceCanvas {
    fn size(&self) -> Size;
    fn clear(&mut self);
    fn draw_display_list(&mut self, display_list: &DisplayList, scale_x: Scalar, scale_y: Scalar);
}

// ---------------------------------------------------------------------
// Bitmaps
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorType {
    Unknown,
    Rgba8888,
    Bgra8888,
    Alpha8,
    Gray8,
    RgbaF16,
    RgbaF32,
}

impl ColorType {
    /// `None` for `Unknown`; every other variant has a fixed pixel size.
    pub fn bytes_per_pixel(self) -> Option<u32> {
        match self {
            ColorType::Unknown => None,
            ColorType::Alpha8 | ColorType::Gray8 => Some(1),
            ColorType::Rgba8888 | ColorType::Bgra8888 => Some(4),
            ColorType::RgbaF16 => Some(8),
            ColorType::RgbaF32 => Some(16),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlphaType {
    Opaque,
    Premul,
    Unpremul,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapInfo {
    pub width: u32,
    pub height: u32,
    pub color_type: ColorType,
    pub alpha_type: AlphaType,
}

/// Resource-acquisition failure: bitmap locking, surface
/// creation, decode failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitmapError(pub String);

impl fmt::Display for BitmapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bitmap error: {}", self.0)
    }
}

impl std::error::Error for BitmapError {}

/// A rectangular pixel buffer with scoped byte access.
pub trait Bitmap {
    fn info(&self) -> BitmapInfo;
    fn lock_bytes(&self) -> Result<&[u8], BitmapError>;
    fn unlock_bytes(&self);
}

pub trait BitmapFactory {
    type Error: std::error::Error;
    fn create(&self, info: BitmapInfo) -> Result<Box<dyn Bitmap>, Self::Error>;
}

// ---------------------------------------------------------------------
// Fonts
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWidth {
    UltraCondensed,
    ExtraCondensed,
    Condensed,
    SemiCondensed,
    Normal,
    SemiExpanded,
    Expanded,
    ExtraExpanded,
    UltraExpanded,
}

/// A weight on the usual 100 (Thin) .. 900 (Black) CSS-style scale, plus an
/// `ExtraBlack` slot one step above `Black` used only as the slant-mismatch
/// penalty magnitude in `score_font_style`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FontWeight(pub i32);

impl FontWeight {
    pub const THIN: FontWeight = FontWeight(100);
    pub const EXTRA_LIGHT: FontWeight = FontWeight(200);
    pub const LIGHT: FontWeight = FontWeight(300);
    pub const NORMAL: FontWeight = FontWeight(400);
    pub const MEDIUM: FontWeight = FontWeight(500);
    pub const SEMI_BOLD: FontWeight = FontWeight(600);
    pub const BOLD: FontWeight = FontWeight(700);
    pub const EXTRA_BOLD: FontWeight = FontWeight(800);
    pub const BLACK: FontWeight = FontWeight(900);
    pub const EXTRA_BLACK: FontWeight = FontWeight(1000);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontSlant {
    Upright,
    Italic,
    Oblique,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontStyle {
    pub width: FontWidth,
    pub weight: FontWeight,
    pub slant: FontSlant,
}

/// `score = candidate.weight - desired.weight`, with a penalty of
/// `±(ExtraBlack + 1)` added in the same direction as the weight-distance
/// sign when the slants differ. The best match minimizes
/// `|score|`, tie-broken by the lower raw score (lighter weights win ties).
pub fn score_font_style(candidate: FontStyle, desired: FontStyle) -> i32 {
    let mut score = candidate.weight.0 - desired.weight.0;
    if candidate.slant != desired.slant {
        let penalty = FontWeight::EXTRA_BLACK.0 + 1;
        score += if score >= 0 { penalty } else { -penalty };
    }
    score
}

/// Picks the index of the best-scoring candidate, or `None` for an empty
/// slice.
pub fn best_font_match(candidates: &[FontStyle], desired: FontStyle) -> Option<usize> {
    candidates
        .iter()
        .map(|c| score_font_style(*c, desired))
        .enumerate()
        .min_by_key(|(_, score)| (score.abs(), *score))
        .map(|(index, _)| index)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FamilyId(pub u32);

/// Typeface lookup by family + style, with fallback by character. The core
/// depends only on the symbolic style enums and the scoring function above;
/// shaping, loading and the typeface representation itself are a host
/// concern for a host to own, not this crate.
pub trait TypefaceRegistry {
    type Typeface;
    fn lookup(&self, family: FamilyId, style: FontStyle) -> Option<Self::Typeface>;
    fn fallback_for_char(&self, character: char, style: FontStyle) -> Option<Self::Typeface>;
}

pub trait FontManager {
    type Typeface;
    type Error: std::error::Error;
    fn match_family_style(&self, family_name: &str, style: FontStyle) -> Result<Self::Typeface, Self::Error>;
    fn match_family_style_character(
        &self,
        family_name: &str,
        style: FontStyle,
        character: char,
    ) -> Result<Self::Typeface, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style(weight: i32, slant: FontSlant) -> FontStyle {
        FontStyle {
            width: FontWidth::Normal,
            weight: FontWeight(weight),
            slant,
        }
    }

    #[test]
    fn score_is_plain_weight_distance_when_slants_match() {
        let desired = style(400, FontSlant::Upright);
        let candidate = style(700, FontSlant::Upright);
        assert_eq!(score_font_style(candidate, desired), 300);
    }

    #[test]
    fn slant_mismatch_adds_penalty_in_the_score_direction() {
        let desired = style(400, FontSlant::Upright);
        let heavier_italic = style(700, FontSlant::Italic);
        assert_eq!(score_font_style(heavier_italic, desired), 300 + 1001);

        let lighter_italic = style(100, FontSlant::Italic);
        assert_eq!(score_font_style(lighter_italic, desired), -300 - 1001);
    }

    #[test]
    fn best_match_minimizes_absolute_score_preferring_lighter_on_ties() {
        let desired = style(400, FontSlant::Upright);
        let candidates = [style(300, FontSlant::Upright), style(500, FontSlant::Upright)];
        let best = best_font_match(&candidates, desired).unwrap();
        assert_eq!(best, 0, "symmetric ties prefer the lighter weight");
    }

    #[test]
    fn color_type_byte_sizes_match_spec_table() {
        assert_eq!(ColorType::Unknown.bytes_per_pixel(), None);
        assert_eq!(ColorType::Rgba8888.bytes_per_pixel(), Some(4));
        assert_eq!(ColorType::Bgra8888.bytes_per_pixel(), Some(4));
        assert_eq!(ColorType::Alpha8.bytes_per_pixel(), Some(1));
        assert_eq!(ColorType::Gray8.bytes_per_pixel(), Some(1));
        assert_eq!(ColorType::RgbaF16.bytes_per_pixel(), Some(8));
        assert_eq!(ColorType::RgbaF32.bytes_per_pixel(), Some(16));
    }
}
