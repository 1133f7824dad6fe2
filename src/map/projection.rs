use glam::DVec2;
use std::f64::consts::{PI, TAU};

/// Reference surface the default scale is tuned for
const REFERENCE_WIDTH: f64 = 600.0;
const REFERENCE_HEIGHT: f64 = 400.0;
const REFERENCE_SCALE: f64 = 700.0;

/// Albers equal-area conic, rotated and centered like a d3-style projection
#[derive(Clone, Debug)]
struct ConicEqualArea {
    /// Longitude rotation (radians, added to lambda)
    rotate: f64,
    n: f64,
    c: f64,
    r0: f64,
    /// Raw projected center
    center: DVec2,
    scale: f64,
    translate: DVec2,
}

impl ConicEqualArea {
    fn new(rotate_deg: f64, center_deg: (f64, f64), parallels_deg: (f64, f64)) -> Self {
        let (phi0, phi1) = (parallels_deg.0.to_radians(), parallels_deg.1.to_radians());
        let sy0 = phi0.sin();
        let n = (sy0 + phi1.sin()) / 2.0;
        let c = 1.0 + sy0 * (2.0 * n - sy0);
        let r0 = c.sqrt() / n;

        let mut conic = Self {
            rotate: rotate_deg.to_radians(),
            n,
            c,
            r0,
            center: DVec2::ZERO,
            scale: 1.0,
            translate: DVec2::ZERO,
        };
        conic.center = conic.raw(center_deg.0.to_radians(), center_deg.1.to_radians());
        conic
    }

    /// Unscaled conic projection of (lambda, phi) in radians
    fn raw(&self, lambda: f64, phi: f64) -> DVec2 {
        let r = (self.c - 2.0 * self.n * phi.sin()).max(0.0).sqrt() / self.n;
        let theta = lambda * self.n;
        DVec2::new(r * theta.sin(), self.r0 - r * theta.cos())
    }

    fn project(&self, lon: f64, lat: f64) -> DVec2 {
        let mut lambda = lon.to_radians() + self.rotate;
        if lambda > PI {
            lambda -= TAU;
        } else if lambda < -PI {
            lambda += TAU;
        }
        let p = self.raw(lambda, lat.to_radians()) - self.center;
        DVec2::new(self.translate.x + self.scale * p.x, self.translate.y - self.scale * p.y)
    }
}

/// Axis-aligned clip extent in screen space
#[derive(Clone, Copy, Debug)]
struct Extent {
    min: DVec2,
    max: DVec2,
}

impl Extent {
    fn contains(&self, p: DVec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// Which inset of the composite projection a point belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Inset {
    Lower48,
    Alaska,
    Hawaii,
}

/// Composite Albers projection for the United States: the lower 48 plus
/// scaled and translated Alaska and Hawaii insets.
#[derive(Clone, Debug)]
pub struct AlbersUsa {
    lower48: ConicEqualArea,
    alaska: ConicEqualArea,
    hawaii: ConicEqualArea,
    lower48_extent: Extent,
    alaska_extent: Extent,
    hawaii_extent: Extent,
    pub scale: f64,
    pub translate: DVec2,
}

impl AlbersUsa {
    pub fn new(scale: f64, translate: DVec2) -> Self {
        let k = scale;
        let (x, y) = (translate.x, translate.y);

        let mut lower48 = ConicEqualArea::new(96.0, (-0.6, 38.7), (29.5, 45.5));
        let mut alaska = ConicEqualArea::new(154.0, (-2.0, 58.5), (55.0, 65.0));
        let mut hawaii = ConicEqualArea::new(157.0, (-3.0, 19.9), (8.0, 18.0));

        lower48.scale = k;
        lower48.translate = translate;
        alaska.scale = k * 0.35;
        alaska.translate = DVec2::new(x - 0.307 * k, y + 0.201 * k);
        hawaii.scale = k;
        hawaii.translate = DVec2::new(x - 0.205 * k, y + 0.212 * k);

        let extent = |x0: f64, y0: f64, x1: f64, y1: f64| Extent {
            min: DVec2::new(x + x0 * k, y + y0 * k),
            max: DVec2::new(x + x1 * k, y + y1 * k),
        };

        Self {
            lower48,
            alaska,
            hawaii,
            lower48_extent: extent(-0.455, -0.238, 0.455, 0.238),
            alaska_extent: extent(-0.425, 0.120, -0.214, 0.234),
            hawaii_extent: extent(-0.214, 0.166, -0.115, 0.234),
            scale,
            translate,
        }
    }

    /// Fit to a pixel surface, keeping the reference scale-to-size ratio
    pub fn fit(width: usize, height: usize) -> Self {
        let (w, h) = (width as f64, height as f64);
        let ratio = (w / REFERENCE_WIDTH).min(h / REFERENCE_HEIGHT);
        Self::new(REFERENCE_SCALE * ratio, DVec2::new(w / 2.0, h / 2.0))
    }

    fn conic(&self, inset: Inset) -> &ConicEqualArea {
        match inset {
            Inset::Lower48 => &self.lower48,
            Inset::Alaska => &self.alaska,
            Inset::Hawaii => &self.hawaii,
        }
    }

    /// First inset whose clip extent holds the projected point
    pub fn locate(&self, lon: f64, lat: f64) -> Option<Inset> {
        if !lon.is_finite() || !lat.is_finite() {
            return None;
        }
        [
            (Inset::Lower48, self.lower48_extent),
            (Inset::Alaska, self.alaska_extent),
            (Inset::Hawaii, self.hawaii_extent),
        ]
        .into_iter()
        .find(|(inset, extent)| extent.contains(self.conic(*inset).project(lon, lat)))
        .map(|(inset, _)| inset)
    }

    /// Project with a specific inset, no clipping
    pub fn project_in(&self, inset: Inset, lon: f64, lat: f64) -> DVec2 {
        self.conic(inset).project(lon, lat)
    }

    /// Project a geographic point, `None` if it falls outside every inset
    pub fn project(&self, lon: f64, lat: f64) -> Option<DVec2> {
        self.locate(lon, lat).map(|inset| self.project_in(inset, lon, lat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> AlbersUsa {
        AlbersUsa::new(1070.0, DVec2::new(480.0, 250.0))
    }

    #[test]
    fn test_center_maps_to_translate() {
        let p = reference().project(-96.6, 38.7).unwrap();
        assert!((p.x - 480.0).abs() < 1e-9);
        assert!((p.y - 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_west_is_left_north_is_up() {
        let proj = reference();
        let sf = proj.project(-122.42, 37.77).unwrap();
        let boston = proj.project(-71.06, 42.36).unwrap();
        let miami = proj.project(-80.19, 25.76).unwrap();
        assert!(sf.x < boston.x);
        assert!(miami.y > boston.y);
    }

    #[test]
    fn test_insets() {
        let proj = reference();
        assert_eq!(proj.locate(-87.63, 41.88), Some(Inset::Lower48));
        assert_eq!(proj.locate(-149.9, 61.2), Some(Inset::Alaska));
        assert_eq!(proj.locate(-157.86, 21.31), Some(Inset::Hawaii));
    }

    #[test]
    fn test_outside_usa_is_unprojectable() {
        let proj = reference();
        assert!(proj.project(-0.13, 51.51).is_none());
        assert!(proj.project(f64::NAN, 40.0).is_none());
    }

    #[test]
    fn test_fit_uses_smaller_ratio() {
        let proj = AlbersUsa::fit(1200, 400);
        assert!((proj.scale - 700.0).abs() < 1e-9);
        assert_eq!(proj.translate, DVec2::new(600.0, 200.0));
    }
}
