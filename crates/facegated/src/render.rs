//! Output surfaces: the details panel and the face-box overlay.

use facegate_core::{BoundingBox, PanelContent};
use image::{Rgba, RgbaImage};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

const BOX_COLOR: Rgba<u8> = Rgba([0, 120, 255, 255]);

/// Text panel the recognition status and detail records are written to.
pub trait Panel: Send + Sync {
    fn show(&self, content: &PanelContent);
}

/// Canvas redrawn on every tick.
pub trait Overlay: Send + Sync {
    /// Match the canvas to the display size.
    fn resize(&self, _width: u32, _height: u32) {}
    fn clear(&self);
    fn draw_box(&self, bbox: BoundingBox, caption: &str);
    /// Push the finished drawing to its destination.
    fn present(&self) {}
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Prints panel content to stdout, skipping repeats of what is already shown.
#[derive(Default)]
pub struct TerminalPanel {
    shown: Mutex<Option<PanelContent>>,
}

impl TerminalPanel {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Panel for TerminalPanel {
    fn show(&self, content: &PanelContent) {
        let mut shown = lock(&self.shown);
        if shown.as_ref() == Some(content) {
            return;
        }
        println!("{content}");
        println!("---");
        *shown = Some(content.clone());
    }
}

/// In-memory overlay of captioned boxes, optionally written out as a PNG.
pub struct CanvasOverlay {
    size: Mutex<(u32, u32)>,
    boxes: Mutex<Vec<(BoundingBox, String)>>,
    output: Option<PathBuf>,
}

impl CanvasOverlay {
    pub fn new(output: Option<PathBuf>) -> Self {
        Self {
            size: Mutex::new((0, 0)),
            boxes: Mutex::new(Vec::new()),
            output,
        }
    }

    #[cfg(test)]
    pub fn boxes(&self) -> Vec<(BoundingBox, String)> {
        lock(&self.boxes).clone()
    }

    /// Rasterise the current boxes as outlines on a transparent canvas.
    pub fn render(&self) -> RgbaImage {
        let (w, h) = *lock(&self.size);
        let mut canvas = RgbaImage::new(w, h);
        for (bbox, _) in lock(&self.boxes).iter() {
            draw_outline(&mut canvas, bbox);
        }
        canvas
    }
}

impl Overlay for CanvasOverlay {
    fn resize(&self, width: u32, height: u32) {
        *lock(&self.size) = (width, height);
    }

    fn clear(&self) {
        lock(&self.boxes).clear();
    }

    fn draw_box(&self, bbox: BoundingBox, caption: &str) {
        tracing::debug!(
            x = bbox.x,
            y = bbox.y,
            width = bbox.width,
            height = bbox.height,
            caption,
            "overlay box"
        );
        lock(&self.boxes).push((bbox, caption.to_string()));
    }

    fn present(&self) {
        let Some(path) = &self.output else {
            return;
        };
        if let Err(e) = self.render().save(path) {
            tracing::warn!(path = %path.display(), error = %e, "failed to write overlay");
        }
    }
}

/// One-pixel rectangle outline, clipped to the canvas.
fn draw_outline(canvas: &mut RgbaImage, bbox: &BoundingBox) {
    let (w, h) = (canvas.width() as i64, canvas.height() as i64);
    if w == 0 || h == 0 {
        return;
    }
    let x0 = bbox.x.round() as i64;
    let y0 = bbox.y.round() as i64;
    let x1 = (bbox.x + bbox.width).round() as i64;
    let y1 = (bbox.y + bbox.height).round() as i64;

    let mut put = |x: i64, y: i64| {
        if (0..w).contains(&x) && (0..h).contains(&y) {
            canvas.put_pixel(x as u32, y as u32, BOX_COLOR);
        }
    };
    for x in x0..=x1 {
        put(x, y0);
        put(x, y1);
    }
    for y in y0..=y1 {
        put(x0, y);
        put(x1, y);
    }
}
