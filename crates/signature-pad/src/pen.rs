//! Pen rasterizer
//!
//! Strokes are drawn as straight segments with round caps: every pixel whose
//! center lies within half the pen width of the segment gets ink, with a
//! one-pixel anti-aliased rim. A dot is a zero-length segment.

use tracing::debug;

use crate::constants::{DEFAULT_LINE_WIDTH, INK_COLOR};
use crate::surface::CpuSurface;
use crate::types::{PixelRect, StrokePoint};

/// Pen appearance
#[derive(Debug, Clone)]
pub struct PenStyle {
    /// Line width in CSS pixels
    pub width: f32,
    /// RGBA ink color
    pub color: [f32; 4],
}

impl Default for PenStyle {
    fn default() -> Self {
        Self {
            width: DEFAULT_LINE_WIDTH,
            color: INK_COLOR,
        }
    }
}

/// Rasterizes CSS-pixel geometry onto a device-resolution surface
#[derive(Debug, Clone)]
pub struct Pen {
    style: PenStyle,
    /// Device pixels per CSS pixel
    scale: f32,
}

impl Pen {
    pub fn new(style: PenStyle, scale: f32) -> Self {
        Self {
            style: PenStyle {
                width: style.width.max(0.0),
                ..style
            },
            scale,
        }
    }

    pub fn style(&self) -> &PenStyle {
        &self.style
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Filled dot at `at` (diameter = pen width)
    pub fn dot(&self, surface: &mut CpuSurface, at: StrokePoint) -> Option<PixelRect> {
        self.segment(surface, at, at)
    }

    /// Straight round-capped segment from `from` to `to`
    ///
    /// Returns the pixel rect that received ink, or None if the segment
    /// missed the surface entirely.
    pub fn segment(
        &self,
        surface: &mut CpuSurface,
        from: StrokePoint,
        to: StrokePoint,
    ) -> Option<PixelRect> {
        let radius = self.style.width * self.scale / 2.0;
        if radius <= 0.0 || surface.width == 0 || surface.height == 0 {
            return None;
        }

        let (ax, ay) = (from.x * self.scale, from.y * self.scale);
        let (bx, by) = (to.x * self.scale, to.y * self.scale);
        let (abx, aby) = (bx - ax, by - ay);
        let len_sq = abx * abx + aby * aby;

        // Half a pixel of slack for the anti-aliased rim
        let reach = radius + 0.5;
        let y_min = clamp_floor(ay.min(by) - reach, surface.height);
        let y_max = clamp_ceil(ay.max(by) + reach, surface.height);

        let mut touched: Option<PixelRect> = None;
        for py in y_min..y_max {
            let cy = py as f32 + 0.5;
            let Some((lo, hi)) = capsule_row_span(ax, ay, bx, by, reach, cy) else {
                continue;
            };
            let x_min = clamp_floor(lo - 0.5, surface.width);
            let x_max = clamp_ceil(hi + 0.5, surface.width);

            for px in x_min..x_max {
                let cx = px as f32 + 0.5;

                let t = if len_sq > 0.0 {
                    (((cx - ax) * abx + (cy - ay) * aby) / len_sq).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let dx = cx - (ax + abx * t);
                let dy = cy - (ay + aby * t);
                let distance = (dx * dx + dy * dy).sqrt();

                let coverage = (reach - distance).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    surface.blend_pixel(px, py, self.style.color, coverage);
                    let pixel = PixelRect {
                        x: px,
                        y: py,
                        width: 1,
                        height: 1,
                    };
                    touched = Some(match touched {
                        Some(rect) => rect.union(pixel),
                        None => pixel,
                    });
                }
            }
        }

        debug!(
            "Pen::segment ({:.1}, {:.1}) -> ({:.1}, {:.1}) radius={:.2} touched={:?}",
            from.x, from.y, to.x, to.y, radius, touched
        );
        touched
    }
}

/// Horizontal extent of the capsule around segment `a`-`b` on the row `y = cy`
///
/// The capsule is convex, so its intersection with a row is one interval:
/// the union of both end caps and the band swept by the segment body.
fn capsule_row_span(ax: f32, ay: f32, bx: f32, by: f32, r: f32, cy: f32) -> Option<(f32, f32)> {
    let mut span = None;
    for (px, py) in [(ax, ay), (bx, by)] {
        let dy = cy - py;
        if dy.abs() <= r {
            let half = (r * r - dy * dy).sqrt();
            widen(&mut span, px - half, px + half);
        }
    }
    if let Some((lo, hi)) = body_row_span(ax, ay, bx, by, r, cy) {
        widen(&mut span, lo, hi);
    }
    span
}

/// Row extent of the band swept by the segment body (caps excluded)
fn body_row_span(ax: f32, ay: f32, bx: f32, by: f32, r: f32, cy: f32) -> Option<(f32, f32)> {
    let (abx, aby) = (bx - ax, by - ay);
    let len_sq = abx * abx + aby * aby;
    if len_sq <= 0.0 {
        return None;
    }
    let (mut lo, mut hi) = (f32::NEG_INFINITY, f32::INFINITY);

    // Perpendicular distance to the segment's line is within r
    if aby == 0.0 {
        if (cy - ay).abs() > r {
            return None;
        }
    } else {
        let center = ax + (cy - ay) * abx / aby;
        let half = r * len_sq.sqrt() / aby.abs();
        lo = lo.max(center - half);
        hi = hi.min(center + half);
    }

    // Projection onto the segment falls inside [0, 1]
    let offset = (cy - ay) * aby;
    if abx == 0.0 {
        if !(0.0..=len_sq).contains(&offset) {
            return None;
        }
    } else {
        let x0 = ax - offset / abx;
        let x1 = ax + (len_sq - offset) / abx;
        lo = lo.max(x0.min(x1));
        hi = hi.min(x0.max(x1));
    }

    (lo <= hi).then_some((lo, hi))
}

fn widen(span: &mut Option<(f32, f32)>, lo: f32, hi: f32) {
    *span = Some(match *span {
        Some((a, b)) => (a.min(lo), b.max(hi)),
        None => (lo, hi),
    });
}

#[inline]
fn clamp_floor(v: f32, limit: u32) -> u32 {
    (v.floor().max(0.0) as u32).min(limit)
}

#[inline]
fn clamp_ceil(v: f32, limit: u32) -> u32 {
    (v.ceil().max(0.0) as u32).min(limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ink_at(surface: &CpuSurface, x: u32, y: u32) -> f32 {
        surface.get_pixel(x, y).map(|p| p[3]).unwrap_or(0.0)
    }

    #[test]
    fn test_dot_paints_center() {
        let mut surface = CpuSurface::new(20, 20);
        let pen = Pen::new(PenStyle::default(), 1.0);

        let rect = pen.dot(&mut surface, StrokePoint::new(10.5, 10.5));

        assert!(rect.is_some());
        assert!((ink_at(&surface, 10, 10) - 1.0).abs() < 1e-6);
        assert_eq!(ink_at(&surface, 0, 0), 0.0);
    }

    #[test]
    fn test_segment_covers_path() {
        let mut surface = CpuSurface::new(40, 20);
        let pen = Pen::new(PenStyle::default(), 1.0);

        pen.segment(
            &mut surface,
            StrokePoint::new(5.5, 10.5),
            StrokePoint::new(30.5, 10.5),
        );

        for x in 5..=30 {
            assert!(ink_at(&surface, x, 10) > 0.9, "gap at x={x}");
        }
        assert_eq!(ink_at(&surface, 18, 2), 0.0);
    }

    #[test]
    fn test_scale_widens_stroke() {
        let mut thin = CpuSurface::new(40, 40);
        let mut thick = CpuSurface::new(80, 80);
        Pen::new(PenStyle::default(), 1.0).dot(&mut thin, StrokePoint::new(10.0, 10.0));
        Pen::new(PenStyle::default(), 2.0).dot(&mut thick, StrokePoint::new(10.0, 10.0));

        let inked = |s: &CpuSurface| s.pixels().iter().filter(|p| p[3] > 0.0).count();
        assert!(inked(&thick) > inked(&thin));
        // Same CSS point lands at (20, 20) on the 2x buffer
        assert!(ink_at(&thick, 20, 20) > 0.9);
    }

    #[test]
    fn test_row_spans_match_full_scan() {
        let pen = Pen::new(
            PenStyle {
                width: 5.0,
                ..Default::default()
            },
            1.0,
        );
        let cases = [
            ((3.0, 4.0), (60.0, 41.0)),
            ((60.0, 3.0), (2.0, 40.0)),
            ((30.0, 5.0), (30.0, 40.0)),
            ((5.0, 22.5), (55.0, 22.5)),
            ((20.0, 20.0), (20.0, 20.0)),
        ];

        for (from, to) in cases {
            let mut surface = CpuSurface::new(64, 48);
            pen.segment(
                &mut surface,
                StrokePoint::new(from.0, from.1),
                StrokePoint::new(to.0, to.1),
            );

            let (ax, ay, bx, by) = (from.0, from.1, to.0, to.1);
            let (abx, aby) = (bx - ax, by - ay);
            let len_sq = abx * abx + aby * aby;
            let reach = 2.5 + 0.5;
            for py in 0..48u32 {
                for px in 0..64u32 {
                    let (cx, cy) = (px as f32 + 0.5, py as f32 + 0.5);
                    let t = if len_sq > 0.0 {
                        (((cx - ax) * abx + (cy - ay) * aby) / len_sq).clamp(0.0, 1.0)
                    } else {
                        0.0
                    };
                    let (dx, dy) = (cx - (ax + abx * t), cy - (ay + aby * t));
                    let expected = (reach - (dx * dx + dy * dy).sqrt()).clamp(0.0, 1.0);
                    let got = ink_at(&surface, px, py);
                    // Pixels right on the rim may fall either side of the span edge
                    if expected > 1e-3 {
                        assert!(got > 0.0, "missed ({px}, {py}) for {from:?}->{to:?}");
                    }
                    if got > 0.0 {
                        assert!(expected > 0.0, "stray ({px}, {py}) for {from:?}->{to:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_long_diagonal_only_visits_its_band() {
        let pen = Pen::new(PenStyle::default(), 1.0);
        let (lo, hi) = capsule_row_span(0.0, 0.0, 100.0, 100.0, 2.0, 50.0).unwrap();
        assert!(lo > 47.0 && hi < 53.0, "span {lo}..{hi}");
        assert_eq!(capsule_row_span(0.0, 0.0, 100.0, 0.0, 2.0, 5.0), None);

        let mut surface = CpuSurface::new(1024, 1024);
        pen.segment(
            &mut surface,
            StrokePoint::new(0.0, 0.0),
            StrokePoint::new(1023.0, 1023.0),
        );
        let inked = surface.pixels().iter().filter(|p| p[3] > 0.0).count();
        assert!(inked < 1024 * 8, "inked {inked} pixels");
        assert!(ink_at(&surface, 512, 512) > 0.9);
    }

    #[test]
    fn test_segment_outside_surface() {
        let mut surface = CpuSurface::new(10, 10);
        let pen = Pen::new(PenStyle::default(), 1.0);

        let rect = pen.segment(
            &mut surface,
            StrokePoint::new(50.0, 50.0),
            StrokePoint::new(60.0, 60.0),
        );

        assert!(rect.is_none());
        assert!(surface.is_blank());
    }

    #[test]
    fn test_zero_size_surface_is_noop() {
        let mut surface = CpuSurface::new(0, 0);
        let pen = Pen::new(PenStyle::default(), 2.0);
        assert!(pen.dot(&mut surface, StrokePoint::new(0.0, 0.0)).is_none());
    }
}
