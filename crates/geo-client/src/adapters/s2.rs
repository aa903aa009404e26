//! # S2 Cell Geometry
//!
//! [`CellGeometry`] backed by the `s2` crate. The disc around a position is
//! modelled as a spherical cap whose angle is `radius_km / EARTH_RADIUS_KM`.

use crate::domain::CellId;
use crate::ports::CellGeometry;
use s2::cap::Cap;
use s2::cellid::CellID;
use s2::latlng::LatLng;
use s2::point::Point;
use s2::region::RegionCoverer;
use s2::s1::{Angle, Rad};
use tracing::trace;

/// Mean Earth radius used to turn distances into cap angles.
pub const EARTH_RADIUS_KM: f64 = 6371.01;

/// S2 hierarchy adapter.
#[derive(Debug, Clone, Copy, Default)]
pub struct S2Geometry;

impl S2Geometry {
    /// New adapter.
    pub fn new() -> Self {
        Self
    }
}

impl CellGeometry for S2Geometry {
    fn cell_at(&self, lat: f64, lng: f64) -> CellId {
        let ll = LatLng::from_degrees(lat, lng);
        CellId::new(CellID::from(&ll).0)
    }

    fn cover(
        &self,
        lat: f64,
        lng: f64,
        radius_km: f64,
        max_level: u8,
        max_cells: usize,
    ) -> Vec<CellId> {
        let ll = LatLng::from_degrees(lat, lng);
        let center = Point::from(&ll);
        let angle = Angle::from(Rad(radius_km / EARTH_RADIUS_KM));
        let cap = Cap::from_center_angle(&center, &angle);

        let coverer = RegionCoverer {
            min_level: 0,
            max_level,
            level_mod: 1,
            max_cells,
        };
        let cells: Vec<CellId> = coverer
            .covering(&cap)
            .0
            .into_iter()
            .map(|id| CellId::new(id.0))
            .collect();
        trace!(lat, lng, radius_km, cells = cells.len(), "Covered disc");
        cells
    }
}
