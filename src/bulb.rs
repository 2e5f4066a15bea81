use palette::blend::Compose;
use palette::{LinSrgba, Srgba, WithAlpha};

/// Peak opacity of the specular highlight, in the 0..=255 range of the bulb
/// colors.
const HIGHLIGHT_ALPHA: f32 = 150.0 / 255.0;
const GLOW_ALPHA: f32 = 0.35;
/// Glow radius relative to the bulb radius.
const GLOW_EXTENT: f32 = 1.6;

const CAP_WIDTH: u32 = 8;
const CAP_HEIGHT: u32 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum BulbStyle {
    /// 18 px round bulbs.
    Round,
    /// Upright oval bulbs with a small socket cap.
    Oval,
}

impl BulbStyle {
    /// Outer size of one bulb, cap included.
    pub fn size(&self) -> (u32, u32) {
        match self {
            BulbStyle::Round => (18, 18),
            BulbStyle::Oval => (18, 24),
        }
    }

    /// Height of the strip window. A glowing strip leaves room for the halo
    /// above and below the bulbs.
    pub fn strip_height(&self, glow: bool) -> u32 {
        match (self, glow) {
            (BulbStyle::Round, false) => 24,
            (BulbStyle::Round, true) => 32,
            (BulbStyle::Oval, false) => 32,
            (BulbStyle::Oval, true) => 40,
        }
    }
}

/// RGBA8 pixel buffer, row-major without padding.
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32) -> PixelBuffer {
        PixelBuffer {
            width,
            height,
            data: vec![0; (width * height * 4) as usize],
        }
    }

    pub fn pitch(&self) -> usize {
        self.width as usize * 4
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    fn offset(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * 4)
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Srgba<u8>> {
        let i = self.offset(x, y)?;
        Some(Srgba::new(
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ))
    }

    /// Composites `color` over the pixel. Out-of-bounds writes are clipped.
    pub fn blend(&mut self, x: i32, y: i32, color: LinSrgba) {
        let Some(i) = self.offset(x, y) else {
            return;
        };

        let dst: LinSrgba = Srgba::new(
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        )
        .into_linear();
        let out: Srgba<u8> = Srgba::from_linear(color.over(dst));
        self.data[i] = out.red;
        self.data[i + 1] = out.green;
        self.data[i + 2] = out.blue;
        self.data[i + 3] = out.alpha;
    }

    fn fill_rect(&mut self, x: i32, y: i32, width: u32, height: u32, color: LinSrgba) {
        for py in y..y + height as i32 {
            for px in x..x + width as i32 {
                self.blend(px, py, color);
            }
        }
    }

    /// Calls `shade` with the normalized elliptical distance from the center
    /// of each pixel within `extent` radii.
    fn paint_ellipse<F>(&mut self, cx: f32, cy: f32, rx: f32, ry: f32, extent: f32, shade: F)
    where
        F: Fn(f32) -> Option<LinSrgba>,
    {
        let left = (cx - rx * extent).floor() as i32;
        let right = (cx + rx * extent).ceil() as i32;
        let top = (cy - ry * extent).floor() as i32;
        let bottom = (cy + ry * extent).ceil() as i32;

        for py in top..bottom {
            for px in left..right {
                let dx = (px as f32 + 0.5 - cx) / rx;
                let dy = (py as f32 + 0.5 - cy) / ry;
                if let Some(color) = shade(dx.hypot(dy)) {
                    self.blend(px, py, color);
                }
            }
        }
    }
}

pub struct Bulb {
    color: Srgba<u8>,
}

impl Bulb {
    pub fn new() -> Bulb {
        Bulb {
            color: Srgba::new(0, 0, 0, 255),
        }
    }

    #[cfg(test)]
    pub fn color(&self) -> Srgba<u8> {
        self.color
    }

    pub fn set_color(&mut self, color: Srgba<u8>) {
        self.color = color;
    }

    /// Paints the bulb with its top-left corner at `(x, y)`.
    pub fn render(&self, buffer: &mut PixelBuffer, x: i32, y: i32, style: BulbStyle, glow: bool) {
        let (width, height) = style.size();
        let body_top = match style {
            BulbStyle::Round => y,
            BulbStyle::Oval => y + CAP_HEIGHT as i32,
        };
        let body_height = height - (body_top - y) as u32;

        let rx = width as f32 / 2.0;
        let ry = body_height as f32 / 2.0;
        let cx = x as f32 + rx;
        let cy = body_top as f32 + ry;
        // Edge antialiasing width, in radii.
        let edge = 1.0 / rx.min(ry);

        let color: LinSrgba = self.color.into_linear();
        let coverage = |d: f32| ((1.0 - d) / edge + 0.5).clamp(0.0, 1.0);

        if glow {
            buffer.paint_ellipse(cx, cy, rx, ry, GLOW_EXTENT, |d| {
                if d >= GLOW_EXTENT {
                    return None;
                }
                let falloff = ((GLOW_EXTENT - d) / (GLOW_EXTENT - 1.0)).min(1.0);
                Some(color.color.with_alpha(color.alpha * GLOW_ALPHA * falloff))
            });
        }

        if style == BulbStyle::Oval {
            let cap = Srgba::new(110u8, 110, 110, 255).into_linear();
            let cap_x = x + ((width - CAP_WIDTH) / 2) as i32;
            buffer.fill_rect(cap_x, y, CAP_WIDTH, CAP_HEIGHT, cap);
        }

        buffer.paint_ellipse(cx, cy, rx, ry, 1.0, |d| {
            let alpha = coverage(d);
            if alpha <= 0.0 {
                return None;
            }
            Some(color.color.with_alpha(color.alpha * alpha))
        });

        let white = palette::LinSrgb::new(1.0, 1.0, 1.0);
        buffer.paint_ellipse(cx, cy, rx, ry, 1.0, |d| {
            if d >= 1.0 {
                return None;
            }
            Some(white.with_alpha(HIGHLIGHT_ALPHA * (1.0 - d) * coverage(d)))
        });
    }
}
