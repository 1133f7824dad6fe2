use glam::DVec2;
use log::debug;
use rayon::prelude::*;

use crate::braille::BrailleCanvas;
use crate::map::geometry::{draw_ring, fill_polygon};
use crate::map::projection::AlbersUsa;

/// A geographic ring (sequence of lon/lat coordinates)
pub type Ring = Vec<(f64, f64)>;

/// A named boundary: polygons of exterior ring plus holes
#[derive(Clone, Debug, PartialEq)]
pub struct Region {
    pub name: Option<String>,
    pub polygons: Vec<Vec<Ring>>,
}

/// Fill stride in braille pixels
const FILL_STRIDE: usize = 2;

/// Rasterised map surface
pub struct MapLayers {
    /// Stippled region interiors
    pub fill: BrailleCanvas,
    /// Region boundaries
    pub outline: BrailleCanvas,
}

/// Draws region boundaries through the Albers USA projection
pub struct MapRenderer {
    regions: Vec<Region>,
}

impl MapRenderer {
    pub fn new(regions: Vec<Region>) -> Self {
        Self { regions }
    }

    /// Render every region onto fresh canvases of `width` x `height` cells
    pub fn render(&self, projection: &AlbersUsa, width: usize, height: usize) -> MapLayers {
        let mut layers = MapLayers {
            fill: BrailleCanvas::new(width, height),
            outline: BrailleCanvas::new(width, height),
        };

        let projected: Vec<Vec<Vec<DVec2>>> = self
            .regions
            .par_iter()
            .flat_map_iter(|region| region.polygons.iter().map(move |polygon| (region, polygon)))
            .filter_map(|(region, polygon)| {
                let rings = project_polygon(projection, polygon);
                if rings.is_none() {
                    debug!(
                        "skipping a polygon of {} outside every inset",
                        region.name.as_deref().unwrap_or("unnamed region")
                    );
                }
                rings
            })
            .collect();

        for rings in &projected {
            fill_polygon(&mut layers.fill, rings, FILL_STRIDE);
            for ring in rings {
                draw_ring(&mut layers.outline, ring);
            }
        }

        layers
    }
}

/// Project all rings of a polygon with the inset that accepts the first
/// locatable exterior vertex.
fn project_polygon(projection: &AlbersUsa, polygon: &[Ring]) -> Option<Vec<Vec<DVec2>>> {
    let exterior = polygon.first()?;
    let inset = exterior
        .iter()
        .find_map(|&(lon, lat)| projection.locate(lon, lat))?;

    Some(
        polygon
            .iter()
            .map(|ring| {
                ring.iter()
                    .map(|&(lon, lat)| projection.project_in(inset, lon, lat))
                    .filter(|p| p.is_finite())
                    .collect()
            })
            .collect(),
    )
}
