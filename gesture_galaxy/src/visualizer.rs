//! Software-rendered 3D scene using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │ GESTURE GALAXY                          PROCESSING PHOTOS... 3 │
//! │ FORMATION: GATHERED  GESTURE: FIST  PHOTOS: 44                 │
//! │                                                                │
//! │              · starfield ·   [photo billboards]   ·            │
//! │                                                                │
//! │ upload notice                                                  │
//! │ OPEN HAND: SCATTER • FIST: GATHER • PINCH: INSPECT             │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The camera orbits the origin slowly on +Z and stands still while a photo
//! is focused.  Photos are camera-facing squares drawn back to front.

use std::f32::consts::TAU;
use std::time::Duration;

use minifb::{Key, KeyRepeat, Window, WindowOptions};
use nalgebra::Vector3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::warn;

use hand_gesture::{GestureSymbol, PoseHandle};
use photo_formation::{Formation, Particle, Photo, TextureSlot, Transform};

use crate::backend::SIMULATED;
use crate::error::GalaxyError;
use crate::gesture::{Command, SimKey};

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W:     usize = 1000;
pub const WIN_H:     usize = 640;
const BG_COLOR:      u32   = 0xFF05060F;
const PANEL_BG:      u32   = 0xFF0F1430;
const ERROR_BG:      u32   = 0xFF4A0E1C;
const GOLD:          u32   = 0xFFFFD700;
const MISSING:       u32   = 0xFF8A2BE2;  // purple "missing file" square
const TEXT:          u32   = 0xFFEEEEEE;
const DIM_TEXT:      u32   = 0xFF8888AA;
const WARN_TEXT:     u32   = 0xFFFFB347;

const FOV_Y:         f32   = 0.872_664_6; // 50°
const NEAR:          f32   = 0.5;
/// Half the edge of a scale-1 photo, world units.
const PHOTO_HALF:    f32   = 0.9;
const ORBIT_RADIUS:  f32   = 25.0;
const ORBIT_HEIGHT:  f32   = 4.0;
/// Radians per second.
const ORBIT_RATE:    f32   = 0.08;
const STAR_COUNT:    usize = 600;
const STAR_RADIUS:   f32   = 90.0;

pub const INSTRUCTIONS: &str = "OPEN HAND: SCATTER • FIST: GATHER • PINCH: INSPECT";

// ════════════════════════════════════════════════════════════════════════════
// FrameState — what the app hands the renderer each frame
// ════════════════════════════════════════════════════════════════════════════

/// Read-only snapshot of everything one frame draws.
pub struct FrameState<'a> {
    pub particles:  &'a [Particle],
    pub photos:     &'a [Photo],
    pub formation:  Formation,
    pub focus:      Option<usize>,
    pub gesture:    GestureSymbol,
    /// Camera ready callback has fired.
    pub live:       bool,
    /// Fatal camera error; when set nothing but the error banner is drawn.
    pub error:      Option<&'a str>,
    /// Photos whose texture is still decoding.
    pub processing: usize,
    /// Transient upload notice.
    pub notice:     Option<&'a str>,
}

// ════════════════════════════════════════════════════════════════════════════
// OrbitCamera
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitCamera {
    pub yaw:    f32,
    pub radius: f32,
    pub height: f32,
}

/// A world point on screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projected {
    pub x:               f32,
    pub y:               f32,
    /// Distance along the view axis.
    pub depth:           f32,
    pub pixels_per_unit: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        OrbitCamera { yaw: 0.0, radius: ORBIT_RADIUS, height: ORBIT_HEIGHT }
    }
}

impl OrbitCamera {
    pub fn eye(&self) -> Vector3<f32> {
        Vector3::new(self.radius * self.yaw.sin(), self.height, self.radius * self.yaw.cos())
    }

    pub fn advance(&mut self, dt: f32, frozen: bool) {
        if frozen || !(dt.is_finite() && dt > 0.0) {
            return;
        }
        self.yaw = (self.yaw + ORBIT_RATE * dt) % TAU;
    }

    /// Perspective projection onto a `WIN_W`×`WIN_H` screen, looking at the
    /// origin.  `None` behind the near plane.
    pub fn project(&self, p: &Vector3<f32>) -> Option<Projected> {
        let eye   = self.eye();
        let fwd   = (-eye).try_normalize(1e-6)?;
        let right = fwd.cross(&Vector3::y()).try_normalize(1e-6)?;
        let up    = right.cross(&fwd);

        let d = p - eye;
        let depth = d.dot(&fwd);
        if depth < NEAR {
            return None;
        }
        let focal = (WIN_H as f32 * 0.5) / (FOV_Y * 0.5).tan();
        let ppu = focal / depth;
        Some(Projected {
            x: WIN_W as f32 * 0.5 + d.dot(&right) * ppu,
            y: WIN_H as f32 * 0.5 - d.dot(&up) * ppu,
            depth,
            pixels_per_unit: ppu,
        })
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Star {
    pos:   Vector3<f32>,
    color: u32,
}

fn starfield(seed: u64) -> Vec<Star> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed ^ 0x57a2);
    (0..STAR_COUNT)
        .map(|_| {
            let z: f32   = rng.gen_range(-1.0..1.0);
            let phi: f32 = rng.gen_range(0.0..TAU);
            let r = (1.0 - z * z).sqrt();
            let level: u32 = rng.gen_range(60..220);
            Star {
                pos:   Vector3::new(r * phi.cos(), z, r * phi.sin()) * STAR_RADIUS,
                color: 0xFF000000 | (level << 16) | (level << 8) | (level + 30).min(255),
            }
        })
        .collect()
}

// ════════════════════════════════════════════════════════════════════════════
// Canvas — framebuffer and drawing primitives
// ════════════════════════════════════════════════════════════════════════════

pub struct Canvas {
    pub width:  usize,
    pub height: usize,
    pub buf:    Vec<u32>,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Canvas { width, height, buf: vec![BG_COLOR; width * height] }
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        (x < self.width && y < self.height).then(|| self.buf[y * self.width + x])
    }

    fn fill(&mut self, color: u32) { self.buf.fill(color); }

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y + h).min(self.height) {
            for col in x..(x + w).min(self.width) {
                self.buf[row * self.width + col] = color;
            }
        }
    }

    fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        if x < self.width && y < self.height {
            self.buf[y * self.width + x] = color;
        }
    }

    fn blend_pixel(&mut self, x: usize, y: usize, color: u32, alpha: f32) {
        if x < self.width && y < self.height {
            let i = y * self.width + x;
            self.buf[i] = blend(self.buf[i], color, alpha);
        }
    }

    /// Text in the 3×5 bitmap font, each font pixel drawn `scale`×`scale`.
    fn draw_text(&mut self, text: &str, x: usize, y: usize, color: u32, scale: usize) {
        let scale = scale.max(1);
        let mut cx = x;
        for ch in text.chars() {
            if cx + 3 * scale > self.width { break; }
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        self.fill_rect(cx + col * scale, y + row * scale, scale, scale, color);
                    }
                }
            }
            cx += 4 * scale; // 3 wide + 1 gap
        }
    }

    fn draw_text_centered(&mut self, text: &str, y: usize, color: u32, scale: usize) {
        let x = self.width.saturating_sub(text_width(text, scale)) / 2;
        self.draw_text(text, x, y, color, scale);
    }
}

pub fn text_width(text: &str, scale: usize) -> usize {
    (text.chars().count() * 4).saturating_sub(1) * scale.max(1)
}

/// Greedy word wrap to at most `max_chars` per line.
pub fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if !line.is_empty() && line.chars().count() + 1 + word.chars().count() > max_chars {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() { line.push(' '); }
        line.push_str(word);
    }
    if !line.is_empty() { lines.push(line); }
    lines
}

// ════════════════════════════════════════════════════════════════════════════
// Scene painting
// ════════════════════════════════════════════════════════════════════════════

/// Paint one full frame into `canvas`.
pub fn paint(canvas: &mut Canvas, camera: &OrbitCamera, stars: &[Star], frame: &FrameState<'_>) {
    canvas.fill(BG_COLOR);

    if let Some(msg) = frame.error {
        draw_error_banner(canvas, msg);
        return;
    }

    for s in stars {
        if let Some(p) = camera.project(&s.pos) {
            if p.x >= 0.0 && p.y >= 0.0 {
                canvas.set_pixel(p.x as usize, p.y as usize, s.color);
            }
        }
    }

    // ── Photos, far to near ───────────────────────────────────────────────
    let mut order: Vec<(usize, Projected)> = frame.particles.iter()
        .enumerate()
        .filter_map(|(i, p)| camera.project(&p.current.position).map(|pr| (i, pr)))
        .collect();
    order.sort_by(|a, b| b.1.depth.total_cmp(&a.1.depth));
    for (i, proj) in order {
        if let Some(photo) = frame.photos.get(i) {
            draw_photo(canvas, &proj, &frame.particles[i].current, photo);
        }
    }

    draw_hud(canvas, frame);

    if !frame.live {
        draw_loading_banner(canvas);
    }
}

fn draw_photo(canvas: &mut Canvas, proj: &Projected, t: &Transform, photo: &Photo) {
    let half = PHOTO_HALF * t.scale * proj.pixels_per_unit;
    let alpha = t.opacity.clamp(0.0, 1.0);
    if half < 0.5 || alpha <= 0.0 {
        return;
    }
    let size = 2.0 * half;
    let x0 = proj.x - half;
    let y0 = proj.y - half;
    if x0 >= canvas.width as f32 || y0 >= canvas.height as f32 || x0 + size <= 0.0 || y0 + size <= 0.0 {
        return;
    }
    let xs = x0.max(0.0) as usize..((x0 + size).ceil().max(0.0) as usize).min(canvas.width);
    let ys = y0.max(0.0) as usize..((y0 + size).ceil().max(0.0) as usize).min(canvas.height);

    match photo.texture() {
        TextureSlot::Ready(tex) => {
            for py in ys {
                let v = (py as f32 + 0.5 - y0) / size;
                for px in xs.clone() {
                    let u = (px as f32 + 0.5 - x0) / size;
                    canvas.blend_pixel(px, py, 0xFF000000 | tex.sample(u, v), alpha);
                }
            }
        }
        TextureSlot::Failed(_) => {
            for py in ys {
                for px in xs.clone() {
                    canvas.blend_pixel(px, py, MISSING, alpha);
                }
            }
        }
        TextureSlot::Pending => {
            let edge = ((size * 0.04).ceil() as usize).max(1);
            for py in ys.clone() {
                for px in xs.clone() {
                    let dx = (px as f32 - x0).min(x0 + size - px as f32 - 1.0);
                    let dy = (py as f32 - y0).min(y0 + size - py as f32 - 1.0);
                    if dx < edge as f32 || dy < edge as f32 {
                        canvas.blend_pixel(px, py, GOLD, alpha);
                    }
                }
            }
        }
    }
}

fn draw_hud(canvas: &mut Canvas, frame: &FrameState<'_>) {
    canvas.draw_text("GESTURE GALAXY", 16, 14, GOLD, 3);

    let status = format!(
        "FORMATION: {}   GESTURE: {}   PHOTOS: {}",
        frame.formation, frame.gesture, frame.photos.len()
    );
    canvas.draw_text(&status, 16, 38, TEXT, 2);

    if let Some(photo) = frame.focus.and_then(|i| frame.photos.get(i)) {
        canvas.draw_text(&format!("FOCUS: {}", photo.source.name()), 16, 56, DIM_TEXT, 2);
    }

    if frame.processing > 0 {
        let msg = format!("PROCESSING PHOTOS... {}", frame.processing);
        let x = canvas.width.saturating_sub(text_width(&msg, 2) + 16);
        canvas.draw_text(&msg, x, 16, WARN_TEXT, 2);
    }

    let bottom = canvas.height.saturating_sub(24);
    if let Some(notice) = frame.notice {
        canvas.draw_text(notice, 16, bottom.saturating_sub(22), WARN_TEXT, 2);
    }
    canvas.draw_text_centered(INSTRUCTIONS, bottom, TEXT, 2);

    let legend = if SIMULATED {
        "HOLD O/F/P = OPEN/FIST/PINCH   R = RESTART   Q = QUIT"
    } else {
        "R = RESTART   Q = QUIT"
    };
    canvas.draw_text_centered(legend, canvas.height.saturating_sub(8), DIM_TEXT, 1);
}

fn draw_loading_banner(canvas: &mut Canvas) {
    let (w, h) = (360, 56);
    let x = canvas.width.saturating_sub(w) / 2;
    let y = canvas.height.saturating_sub(h) / 2;
    canvas.fill_rect(x, y, w, h, PANEL_BG);
    canvas.draw_text_centered("STARTING CAMERA...", y + 14, GOLD, 3);
    canvas.draw_text_centered("ALLOW CAMERA ACCESS", y + 36, DIM_TEXT, 2);
}

fn draw_error_banner(canvas: &mut Canvas, message: &str) {
    let lines = wrap(message, 44);
    let (w, h) = (560, 96 + 16 * lines.len());
    let x = canvas.width.saturating_sub(w) / 2;
    let y = canvas.height.saturating_sub(h) / 2;
    canvas.fill_rect(x, y, w, h, ERROR_BG);
    canvas.draw_text_centered("CAMERA ERROR", y + 16, GOLD, 3);
    for (i, line) in lines.iter().enumerate() {
        canvas.draw_text_centered(line, y + 46 + 16 * i, TEXT, 2);
    }
    canvas.draw_text_centered("PRESS R TO RETRY   Q TO QUIT", y + h - 26, WARN_TEXT, 2);
}

// ════════════════════════════════════════════════════════════════════════════
// SceneRenderer — the window
// ════════════════════════════════════════════════════════════════════════════

pub struct SceneRenderer {
    window: Window,
    canvas: Canvas,
    camera: OrbitCamera,
    stars:  Vec<Star>,
}

impl SceneRenderer {
    pub fn new(seed: u64) -> Result<Self, GalaxyError> {
        let mut window = Window::new(
            "Gesture Galaxy",
            WIN_W, WIN_H,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        ).map_err(|e| GalaxyError::Window(e.to_string()))?;

        window.limit_update_rate(Some(Duration::from_millis(16))); // ~60fps

        Ok(SceneRenderer {
            window,
            canvas: Canvas::new(WIN_W, WIN_H),
            camera: OrbitCamera::default(),
            stars:  starfield(seed),
        })
    }

    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Current camera position, world space.
    pub fn viewer(&self) -> Vector3<f32> { self.camera.eye() }

    /// Poll the keyboard.  In simulation builds the held pose key is written
    /// into `pose`.
    pub fn poll_input(&mut self, pose: &PoseHandle) -> Option<Command> {
        if !self.window.is_open()
            || self.window.is_key_pressed(Key::Q, KeyRepeat::No)
            || self.window.is_key_pressed(Key::Escape, KeyRepeat::No)
        {
            return Some(Command::Quit);
        }

        if SIMULATED {
            let held = [(Key::O, SimKey::OpenHand), (Key::F, SimKey::Fist), (Key::P, SimKey::Pinch)]
                .into_iter()
                .find(|(k, _)| self.window.is_key_down(*k))
                .map(|(_, s)| s.pose());
            pose.set(held);
        }

        if self.window.is_key_pressed(Key::R, KeyRepeat::No) {
            return Some(Command::Restart);
        }
        None
    }

    /// Advance the orbit by `dt` seconds and show one frame.
    pub fn render(&mut self, frame: &FrameState<'_>, dt: f32) {
        let frozen = frame.formation == Formation::Focused || frame.error.is_some();
        self.camera.advance(dt, frozen);
        paint(&mut self.canvas, &self.camera, &self.stars, frame);
        if let Err(e) = self.window.update_with_buffer(&self.canvas.buf, WIN_W, WIN_H) {
            warn!(error = %e, "frame not presented");
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'a' | 'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' | 'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' | 'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' | 'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' | 'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' | 'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' | 'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' | 'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' | 'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' | 'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' | 'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' | 'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' | 'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' | 'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'o' | 'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' | 'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' | 'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' | 'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' | 'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' | 'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' | 'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' | 'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' | 'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' | 'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' | 'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' | 'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '_' => [0b000, 0b000, 0b000, 0b000, 0b111],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        '!' => [0b010, 0b010, 0b010, 0b000, 0b010],
        '(' => [0b001, 0b010, 0b010, 0b010, 0b001],
        ')' => [0b100, 0b010, 0b010, 0b010, 0b100],
        '•' => [0b000, 0b010, 0b111, 0b010, 0b000],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}

/// Alpha-blend two ARGB colors. `t` = 0.0 → all `a`, `t` = 1.0 → all `b`.
fn blend(a: u32, b: u32, t: f32) -> u32 {
    let t = t.clamp(0.0, 1.0);
    let lerp = |ca: u32, cb: u32| (ca as f32 * (1.0 - t) + cb as f32 * t).round() as u32;
    let ar = (a >> 16) & 0xFF; let br = (b >> 16) & 0xFF;
    let ag = (a >>  8) & 0xFF; let bg = (b >>  8) & 0xFF;
    let ab =  a        & 0xFF; let bb =  b        & 0xFF;
    0xFF000000 | (lerp(ar, br) << 16) | (lerp(ag, bg) << 8) | lerp(ab, bb)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
