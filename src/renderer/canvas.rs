//! Canvas 2D drawing of the retained scene plus the HUD line

use glam::Vec2;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::game::AsteroidField;
use crate::platform::ImageCache;
use crate::scene::{NodeKind, NodeState};

const BACKGROUND: &str = "#05060f";
const LABEL_COLOR: &str = "#ffffff";
const HUD_COLOR: &str = "#9fe8ff";
const LABEL_FONT: &str = "bold 22px sans-serif";
const HUD_FONT: &str = "20px sans-serif";
const BANNER_FONT: &str = "bold 56px sans-serif";

pub struct CanvasRenderer {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    images: ImageCache,
    arena: Vec2,
}

impl CanvasRenderer {
    pub fn new(canvas: HtmlCanvasElement, images: ImageCache, arena: Vec2) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self {
            canvas,
            ctx,
            images,
            arena,
        })
    }

    /// Match the backing store to the element's CSS size
    pub fn resize(&self, device_pixel_ratio: f64) {
        let width = (self.canvas.client_width() as f64 * device_pixel_ratio) as u32;
        let height = (self.canvas.client_height() as f64 * device_pixel_ratio) as u32;
        if width != self.canvas.width() || height != self.canvas.height() {
            self.canvas.set_width(width);
            self.canvas.set_height(height);
        }
    }

    /// Uniform arena-to-canvas scale and the letterbox offset
    fn viewport(&self) -> (f64, f64, f64) {
        let cw = self.canvas.width() as f64;
        let ch = self.canvas.height() as f64;
        let scale = (cw / self.arena.x as f64).min(ch / self.arena.y as f64);
        let ox = (cw - self.arena.x as f64 * scale) / 2.0;
        let oy = (ch - self.arena.y as f64 * scale) / 2.0;
        (scale, ox, oy)
    }

    pub fn render(&self, field: &AsteroidField) {
        let ctx = &self.ctx;
        let _ = ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
        ctx.set_fill_style_str("#000000");
        ctx.fill_rect(0.0, 0.0, self.canvas.width() as f64, self.canvas.height() as f64);

        let (scale, ox, oy) = self.viewport();
        let _ = ctx.set_transform(scale, 0.0, 0.0, scale, ox, oy);
        ctx.set_fill_style_str(BACKGROUND);
        ctx.fill_rect(0.0, 0.0, self.arena.x as f64, self.arena.y as f64);

        for node in field.scene().nodes() {
            if node.visible {
                self.draw_node(&node);
            }
        }

        self.draw_hud(field);
    }

    fn draw_node(&self, node: &NodeState) {
        let ctx = &self.ctx;
        let pos = node.position;
        match &node.kind {
            NodeKind::Sprite { image } => {
                let images = self.images.borrow();
                let Some(element) = images.get(image.url()) else {
                    return;
                };
                let size = image.size() * node.scale;
                let _ = ctx.draw_image_with_html_image_element_and_dw_and_dh(
                    element,
                    (pos.x - size.x / 2.0) as f64,
                    (pos.y - size.y / 2.0) as f64,
                    size.x as f64,
                    size.y as f64,
                );
            }
            NodeKind::Label { text } => {
                ctx.set_font(LABEL_FONT);
                ctx.set_text_align("center");
                ctx.set_text_baseline("middle");
                ctx.set_fill_style_str(LABEL_COLOR);
                let _ = ctx.fill_text(text, pos.x as f64, pos.y as f64);
            }
        }
    }

    fn draw_hud(&self, field: &AsteroidField) {
        let ctx = &self.ctx;
        let score = field.score();

        ctx.set_font(HUD_FONT);
        ctx.set_text_align("left");
        ctx.set_text_baseline("top");
        ctx.set_fill_style_str(HUD_COLOR);
        let line = format!(
            "Score {}   Lives {}   Shoot factors and multiples of {}",
            score.points,
            score.lives,
            field.target()
        );
        let _ = ctx.fill_text(&line, 16.0, 12.0);

        if field.is_game_over() {
            let cx = self.arena.x as f64 / 2.0;
            let cy = self.arena.y as f64 / 2.0;
            ctx.set_text_align("center");
            ctx.set_text_baseline("middle");
            ctx.set_font(BANNER_FONT);
            let _ = ctx.fill_text("GAME OVER", cx, cy - 30.0);
            ctx.set_font(HUD_FONT);
            let _ = ctx.fill_text("Press Enter to play again", cx, cy + 30.0);
        }
    }
}
