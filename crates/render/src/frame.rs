//! CPU frame compositing: the heat map, the trace, and the agent marker.
//!
//! Paint order is surface, trace dots, trace segments, then the marker.
//! The marker is a 30×10 body ellipse with a 5×5 "eye" ten pixels ahead on
//! its local x axis, the whole thing rotated by the agent's heading around
//! its rounded position. Everything clips to the frame.

use glam::DVec2;
use gradient_sim_core::agent::AgentSnapshot;
use gradient_sim_core::spectrum::Rgb8;
use gradient_sim_core::surface::RenderSurface;

use crate::pixel::surface_to_rgba;

/// Diameter of each trace dot.
pub const TRACE_DOT_DIAMETER: f64 = 10.0;
/// Body ellipse diameters before rotation.
pub const BODY_SIZE: DVec2 = DVec2::new(30.0, 10.0);
/// Eye ellipse diameters.
pub const EYE_SIZE: DVec2 = DVec2::new(5.0, 5.0);
/// Distance of the eye centre along the marker's local x axis.
pub const EYE_OFFSET: f64 = 10.0;

pub const TRACE_COLOR: Rgb8 = Rgb8::WHITE;
pub const BODY_COLOR: Rgb8 = Rgb8::MAGENTA;
pub const EYE_COLOR: Rgb8 = Rgb8::WHITE;
pub const OUTLINE_COLOR: Rgb8 = Rgb8::BLACK;

/// Rounds half up (`floor(v + 0.5)`), or `None` for non-finite input.
pub fn round_half_up(v: f64) -> Option<i64> {
    v.is_finite().then(|| (v + 0.5).floor() as i64)
}

fn round_point(p: DVec2) -> Option<DVec2> {
    Some(DVec2::new(round_half_up(p.x)? as f64, round_half_up(p.y)? as f64))
}

/// An ellipse whose centre sits `offset` along the local x axis of a frame
/// rotated by `angle` around `pivot`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipse {
    pub pivot: DVec2,
    pub offset: f64,
    pub size: DVec2,
    pub angle: f64,
}

impl Ellipse {
    pub fn circle(center: DVec2, diameter: f64) -> Self {
        Self {
            pivot: center,
            offset: 0.0,
            size: DVec2::splat(diameter),
            angle: 0.0,
        }
    }

    /// `p` in the ellipse's own axes, relative to its centre.
    fn to_local(&self, p: DVec2) -> DVec2 {
        let d = p - self.pivot;
        let (sin, cos) = self.angle.sin_cos();
        DVec2::new(d.x * cos + d.y * sin - self.offset, -d.x * sin + d.y * cos)
    }

    /// Whether `p` lies inside the ellipse shrunk by `inset` on each radius.
    fn contains(&self, p: DVec2, inset: f64) -> bool {
        let radii = self.size / 2.0 - DVec2::splat(inset);
        if radii.x <= 0.0 || radii.y <= 0.0 {
            return false;
        }
        let l = self.to_local(p) / radii;
        l.length_squared() <= 1.0
    }

    fn reach(&self) -> f64 {
        self.offset.abs() + self.size.max_element() / 2.0 + 1.0
    }
}

/// An RGBA8 image the painter draws into.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl Frame {
    /// Starts a frame from the precomputed heat map.
    pub fn from_surface(surface: &RenderSurface) -> Self {
        Self {
            width: surface.width(),
            height: surface.height(),
            data: surface_to_rgba(surface),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major RGBA8 bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_rgba(self) -> Vec<u8> {
        self.data
    }

    /// Colour at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) * 4;
        Some(Rgb8::new(self.data[i], self.data[i + 1], self.data[i + 2]))
    }

    fn put(&mut self, x: i64, y: i64, color: Rgb8) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let i = (y as usize * self.width + x as usize) * 4;
        self.data[i..i + 4].copy_from_slice(&color.to_rgba());
    }

    /// Visits every in-frame pixel within `reach` of `center`.
    fn for_each_near(&mut self, center: DVec2, reach: f64, mut f: impl FnMut(&mut Self, i64, i64)) {
        let max_x = self.width as f64 - 1.0;
        let max_y = self.height as f64 - 1.0;
        let x0 = (center.x - reach).floor().max(0.0);
        let x1 = (center.x + reach).ceil().min(max_x);
        let y0 = (center.y - reach).floor().max(0.0);
        let y1 = (center.y + reach).ceil().min(max_y);
        if x0 > x1 || y0 > y1 {
            return;
        }
        for y in y0 as i64..=y1 as i64 {
            for x in x0 as i64..=x1 as i64 {
                f(self, x, y);
            }
        }
    }

    pub fn fill_ellipse(&mut self, ellipse: &Ellipse, color: Rgb8) {
        self.for_each_near(ellipse.pivot, ellipse.reach(), |frame, x, y| {
            if ellipse.contains(DVec2::new(x as f64, y as f64), 0.0) {
                frame.put(x, y, color);
            }
        });
    }

    /// One-pixel outline of `ellipse`.
    pub fn stroke_ellipse(&mut self, ellipse: &Ellipse, color: Rgb8) {
        self.for_each_near(ellipse.pivot, ellipse.reach(), |frame, x, y| {
            let p = DVec2::new(x as f64, y as f64);
            if ellipse.contains(p, 0.0) && !ellipse.contains(p, 1.0) {
                frame.put(x, y, color);
            }
        });
    }

    /// Straight segment between two points, clipped to the frame first.
    pub fn draw_line(&mut self, from: DVec2, to: DVec2, color: Rgb8) {
        let bounds = DVec2::new(self.width as f64, self.height as f64);
        let Some((a, b)) = clip_segment(from, to, bounds) else {
            return;
        };
        let (Some(mut x), Some(mut y), Some(x1), Some(y1)) = (
            round_half_up(a.x),
            round_half_up(a.y),
            round_half_up(b.x),
            round_half_up(b.y),
        ) else {
            return;
        };
        let dx = (x1 - x).abs();
        let dy = -(y1 - y).abs();
        let sx = if x < x1 { 1 } else { -1 };
        let sy = if y < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.put(x, y, color);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }
}

/// Liang-Barsky clip of `a→b` to `[-1, bounds.x] × [-1, bounds.y]`.
fn clip_segment(a: DVec2, b: DVec2, bounds: DVec2) -> Option<(DVec2, DVec2)> {
    if !(a.is_finite() && b.is_finite()) {
        return None;
    }
    let d = b - a;
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);
    for (p, q) in [
        (-d.x, a.x + 1.0),
        (d.x, bounds.x - a.x),
        (-d.y, a.y + 1.0),
        (d.y, bounds.y - a.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            t0 = t0.max(t);
        } else {
            t1 = t1.min(t);
        }
        if t0 > t1 {
            return None;
        }
    }
    Some((a + d * t0, a + d * t1))
}

/// Paints the agent marker rotated by `snapshot.direction`.
///
/// Skipped entirely while the position is non-finite. A non-finite heading
/// draws unrotated.
pub fn draw_agent(frame: &mut Frame, snapshot: &AgentSnapshot) {
    let Some(pivot) = round_point(snapshot.position) else {
        return;
    };
    let angle = if snapshot.direction.is_finite() {
        snapshot.direction
    } else {
        0.0
    };
    let body = Ellipse {
        pivot,
        offset: 0.0,
        size: BODY_SIZE,
        angle,
    };
    let eye = Ellipse {
        offset: EYE_OFFSET,
        size: EYE_SIZE,
        ..body
    };
    frame.fill_ellipse(&body, BODY_COLOR);
    frame.stroke_ellipse(&body, OUTLINE_COLOR);
    frame.fill_ellipse(&eye, EYE_COLOR);
    frame.stroke_ellipse(&eye, OUTLINE_COLOR);
}

/// Paints trace dots at rounded positions, then joins consecutive dots.
pub fn draw_trace(frame: &mut Frame, trace: &[DVec2]) {
    let dots: Vec<DVec2> = trace.iter().filter_map(|&p| round_point(p)).collect();
    for &dot in &dots {
        frame.fill_ellipse(&Ellipse::circle(dot, TRACE_DOT_DIAMETER), TRACE_COLOR);
    }
    for pair in dots.windows(2) {
        frame.draw_line(pair[0], pair[1], TRACE_COLOR);
    }
}

/// Builds a full frame: surface, trace, then agent.
pub fn compose(surface: &RenderSurface, snapshot: &AgentSnapshot, trace: &[DVec2]) -> Frame {
    let mut frame = Frame::from_surface(surface);
    draw_trace(&mut frame, trace);
    draw_agent(&mut frame, snapshot);
    frame
}
