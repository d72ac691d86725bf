//! Capture stage: turning a preview card into pixels.

use async_trait::async_trait;
use creative_core::{CreativeError, CreativeResult};
use creative_dco::PreviewCard;
use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{Rgba, RgbaImage};
use tracing::debug;

/// Rasterizes the current preview. Implementations fail with
/// `CreativeError::Capture` when there is no surface to render from.
#[async_trait]
pub trait PreviewCapture: Send + Sync {
    async fn capture(&self, card: &PreviewCard) -> CreativeResult<RgbaImage>;
}

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const INK: Rgba<u8> = Rgba([51, 51, 51, 255]);
const MUTED: Rgba<u8> = Rgba([85, 85, 85, 255]);
const FOOTNOTE: Rgba<u8> = Rgba([102, 102, 102, 255]);
const PLACEHOLDER: Rgba<u8> = Rgba([229, 231, 235, 255]);
const PLACEHOLDER_INK: Rgba<u8> = Rgba([156, 163, 175, 255]);
const BUTTON: Rgba<u8> = Rgba([102, 126, 234, 255]);

/// Software renderer for the preview card. Draws on a white background at
/// the layout's aspect ratio, using an 8×8 bitmap font. Remote images are
/// not fetched; a placeholder block marks where the product image goes.
#[derive(Debug, Clone)]
pub struct CardRasterizer {
    width: u32,
}

impl CardRasterizer {
    pub fn new(width: u32) -> Self {
        Self { width }
    }

    /// Canvas size for a card, scaled from the layout's placement size.
    pub fn canvas_size(&self, card: &PreviewCard) -> (u32, u32) {
        let (lw, lh) = card.layout.dimensions();
        let height = (self.width as u64 * lh as u64 / lw as u64) as u32;
        (self.width, height)
    }

    pub fn render(&self, card: &PreviewCard) -> CreativeResult<RgbaImage> {
        let (width, height) = self.canvas_size(card);
        if width < 64 || height < 64 {
            return Err(CreativeError::Capture(format!(
                "preview surface too small to render ({width}x{height})"
            )));
        }

        let mut img = RgbaImage::from_pixel(width, height, WHITE);
        let accent = card
            .theme
            .as_ref()
            .and_then(|t| parse_hex(&t.primary))
            .unwrap_or(BUTTON);
        let headline_color = card
            .theme
            .as_ref()
            .and_then(|t| parse_hex(&t.primary))
            .unwrap_or(INK);

        let pad = (width / 20).max(8) as i32;
        let scale = (width / 180).max(1);
        let small = scale.saturating_sub(1).max(1);
        let inner = width as i32 - 2 * pad;
        let w = width as i32;
        let h = height as i32;

        if card.theme.is_some() {
            let border = (width / 135).max(2) as i32;
            fill_rect(&mut img, 0, 0, w - 1, border - 1, accent);
            fill_rect(&mut img, 0, h - border, w - 1, h - 1, accent);
            fill_rect(&mut img, 0, 0, border - 1, h - 1, accent);
            fill_rect(&mut img, w - border, 0, w - 1, h - 1, accent);
        }

        let mut y = pad;
        y = draw_paragraph(&mut img, pad, y, inner, &card.headline, headline_color, scale, 3);
        y += pad / 2;

        if card.image_url.is_some() {
            let block = (h as f32 * 0.35) as i32;
            fill_rect(&mut img, pad, y, pad + inner - 1, y + block - 1, PLACEHOLDER);
            let label_w = text_width("IMAGE", small);
            draw_text(
                &mut img,
                pad + (inner - label_w) / 2,
                y + (block - glyph_height(small)) / 2,
                "IMAGE",
                PLACEHOLDER_INK,
                small,
            );
            y += block + pad / 2;
        }

        y = draw_paragraph(&mut img, pad, y, inner, &card.subhead, MUTED, small, 3);
        y += pad / 2;

        if !card.cta.trim().is_empty() {
            let label = truncate_to_width(card.cta.trim(), inner - pad, scale);
            let button_w = (text_width(&label, scale) + pad).min(inner);
            let button_h = glyph_height(scale) * 2;
            fill_rect(&mut img, pad, y, pad + button_w - 1, y + button_h - 1, accent);
            draw_text(
                &mut img,
                pad + (button_w - text_width(&label, scale)) / 2,
                y + (button_h - glyph_height(scale)) / 2,
                &label,
                WHITE,
                scale,
            );
        }

        if let Some(disclaimer) = card.disclaimer.as_deref() {
            let footnote = 1;
            let lines = wrap(disclaimer, chars_per_line(inner, footnote));
            let line_h = glyph_height(footnote) + 2;
            let mut fy = h - pad - line_h * lines.len() as i32;
            for line in &lines {
                draw_text(&mut img, pad, fy, line, FOOTNOTE, footnote);
                fy += line_h;
            }
        }

        debug!(
            width,
            height,
            layout = %card.layout,
            retailer = card.retailer.as_deref().unwrap_or("none"),
            "preview card rasterized"
        );
        Ok(img)
    }
}

#[async_trait]
impl PreviewCapture for CardRasterizer {
    async fn capture(&self, card: &PreviewCard) -> CreativeResult<RgbaImage> {
        self.render(card)
    }
}

/// `#RRGGBB` (or `#RGB`) to an opaque pixel.
pub fn parse_hex(hex: &str) -> Option<Rgba<u8>> {
    let digits = hex.trim().strip_prefix('#')?;
    let expanded: String = match digits.len() {
        3 => digits.chars().flat_map(|c| [c, c]).collect(),
        6 => digits.to_string(),
        _ => return None,
    };
    let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).ok();
    Some(Rgba([channel(0)?, channel(2)?, channel(4)?, 255]))
}

fn glyph_height(scale: u32) -> i32 {
    8 * scale as i32
}

fn text_width(text: &str, scale: u32) -> i32 {
    text.chars().count() as i32 * 8 * scale as i32
}

fn chars_per_line(width: i32, scale: u32) -> usize {
    (width / (8 * scale as i32)).max(1) as usize
}

fn truncate_to_width(text: &str, width: i32, scale: u32) -> String {
    text.chars().take(chars_per_line(width, scale)).collect()
}

/// Greedy word wrap; words longer than a line are split.
fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            lines.push(word.drain(..max_chars).collect());
        }
        let word: String = word.into_iter().collect();
        if word.is_empty() {
            continue;
        }
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Draws up to `max_lines` wrapped lines and returns the y below them.
#[allow(clippy::too_many_arguments)]
fn draw_paragraph(
    img: &mut RgbaImage,
    x: i32,
    y: i32,
    width: i32,
    text: &str,
    color: Rgba<u8>,
    scale: u32,
    max_lines: usize,
) -> i32 {
    let line_h = glyph_height(scale) + 2 * scale as i32;
    let mut cursor = y;
    for line in wrap(text, chars_per_line(width, scale)).iter().take(max_lines) {
        draw_text(img, x, cursor, line, color, scale);
        cursor += line_h;
    }
    cursor
}

fn draw_text(img: &mut RgbaImage, x: i32, y: i32, text: &str, color: Rgba<u8>, scale: u32) {
    let scale_i = scale.max(1) as i32;
    let mut cursor_x = x;
    for ch in text.chars() {
        let Some(glyph) = BASIC_FONTS.get(ch).or_else(|| BASIC_FONTS.get('?')) else {
            cursor_x += 8 * scale_i;
            continue;
        };
        for (row_idx, row) in glyph.iter().enumerate() {
            for col_idx in 0..8 {
                if (row >> col_idx) & 1 == 0 {
                    continue;
                }
                let px = cursor_x + col_idx * scale_i;
                let py = y + row_idx as i32 * scale_i;
                fill_rect(img, px, py, px + scale_i - 1, py + scale_i - 1, color);
            }
        }
        cursor_x += 8 * scale_i;
    }
}

fn fill_rect(img: &mut RgbaImage, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgba<u8>) {
    let (w, h) = (img.width() as i32, img.height() as i32);
    let min_x = x0.min(x1).max(0);
    let max_x = x0.max(x1).min(w - 1);
    let min_y = y0.min(y1).max(0);
    let max_y = y0.max(y1).min(h - 1);
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            img.put_pixel(x as u32, y as u32, color);
        }
    }
}
