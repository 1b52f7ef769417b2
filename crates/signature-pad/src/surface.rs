//! CPU raster surface backing the signature pad

/// An RGBA CPU surface in linear [0, 1] floats, transparent when created.
/// Pixels are stored row-major at backing (device) resolution.
pub struct CpuSurface {
    pub width: u32,
    pub height: u32,
    pixels: Vec<[f32; 4]>,
}

impl CpuSurface {
    /// Fully transparent surface of `width` x `height` backing pixels
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0.0; 4]; width as usize * height as usize],
        }
    }

    pub fn clear(&mut self, color: [f32; 4]) {
        self.pixels.fill(color);
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| y as usize * self.width as usize + x as usize)
    }

    /// None outside the surface
    #[inline]
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[f32; 4]> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// Ignored outside the surface
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, color: [f32; 4]) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color;
        }
    }

    /// Source-over blend of `color` at `opacity` onto the pixel
    #[inline]
    pub fn blend_pixel(&mut self, x: u32, y: u32, color: [f32; 4], opacity: f32) {
        let Some(index) = self.index(x, y) else {
            return;
        };
        let dst = self.pixels[index];

        let src_alpha = color[3] * opacity;
        let inv_src_alpha = 1.0 - src_alpha;
        let out_alpha = src_alpha + dst[3] * inv_src_alpha;
        if out_alpha <= 0.0 {
            self.pixels[index] = [0.0, 0.0, 0.0, 0.0];
            return;
        }

        // Straight (non-premultiplied) color channels
        let mix = |s: f32, d: f32| (s * src_alpha + d * dst[3] * inv_src_alpha) / out_alpha;
        self.pixels[index] = [
            mix(color[0], dst[0]),
            mix(color[1], dst[1]),
            mix(color[2], dst[2]),
            out_alpha,
        ];
    }

    /// True if no pixel has any coverage
    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|p| p[3] <= 0.0)
    }

    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    /// Row-major pixel data
    #[inline]
    pub fn pixels(&self) -> &[[f32; 4]] {
        &self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_surface() {
        let surface = CpuSurface::new(100, 50);
        assert_eq!(surface.width, 100);
        assert_eq!(surface.height, 50);
        assert_eq!(surface.pixel_count(), 5000);
        assert!(surface.is_blank());
    }

    #[test]
    fn test_zero_size_surface() {
        let mut surface = CpuSurface::new(0, 0);
        assert_eq!(surface.pixel_count(), 0);
        assert_eq!(surface.get_pixel(0, 0), None);
        surface.blend_pixel(0, 0, [0.0, 0.0, 0.0, 1.0], 1.0);
        assert!(surface.is_blank());
    }

    #[test]
    fn test_pixel_access_is_bounds_checked() {
        let mut surface = CpuSurface::new(8, 4);
        let ink = [0.0, 0.0, 0.0, 1.0];

        surface.set_pixel(7, 3, ink);
        assert_eq!(surface.get_pixel(7, 3), Some(ink));
        assert!(!surface.is_blank());

        surface.set_pixel(8, 0, ink);
        assert_eq!(surface.get_pixel(8, 0), None);
        assert_eq!(surface.get_pixel(0, 4), None);
    }

    #[test]
    fn test_blend_onto_transparent_keeps_color() {
        let mut surface = CpuSurface::new(4, 4);
        surface.blend_pixel(1, 1, [0.0, 0.0, 0.0, 1.0], 0.5);

        let p = surface.get_pixel(1, 1).unwrap();
        assert!(p[0].abs() < 1e-6);
        assert!((p[3] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_blend_onto_white() {
        let mut surface = CpuSurface::new(10, 10);
        surface.clear([1.0, 1.0, 1.0, 1.0]);

        surface.blend_pixel(5, 5, [1.0, 0.0, 0.0, 1.0], 0.5);

        let result = surface.get_pixel(5, 5).unwrap();
        assert!((result[0] - 1.0).abs() < 0.01);
        assert!((result[1] - 0.5).abs() < 0.01);
        assert!((result[2] - 0.5).abs() < 0.01);
        assert!((result[3] - 1.0).abs() < 0.01);
    }
}
