//! Generated placeholder cover.

/// MIME type of the placeholder.
pub const PLACEHOLDER_CONTENT_TYPE: &str = "image/svg+xml";

/// Placeholder canvas width in pixels.
pub const PLACEHOLDER_WIDTH: u32 = 300;

/// Placeholder canvas height in pixels.
pub const PLACEHOLDER_HEIGHT: u32 = 450;

/// Render the placeholder: a bordered page glyph with a "No cover" caption.
pub fn placeholder_svg() -> String {
    let (w, h) = (PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT);
    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">
  <rect width="{w}" height="{h}" fill="#f5f5f5"/>
  <rect x="100" y="150" width="100" height="130" rx="4" fill="none" stroke="#d4d4d4" stroke-width="2"/>
  <path d="M120 170 h60 M120 190 h50 M120 210 h40" stroke="#d4d4d4" stroke-width="2" stroke-linecap="round"/>
  <text x="150" y="320" text-anchor="middle" font-family="system-ui, sans-serif" font-size="14" fill="#a3a3a3">No cover</text>
</svg>"##
    )
}
