//! Geographic primitives shared by listings and the map surface.

use serde::{Deserialize, Serialize};

/// A longitude/latitude pair, in that order (the order the service uses)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LngLat {
    /// Longitude in degrees
    pub lng: f64,
    /// Latitude in degrees
    pub lat: f64,
}

impl LngLat {
    /// Create a new point
    #[must_use]
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// The `(0, 0)` point the service sends for listings it could not geocode
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        self.lng == 0.0 && self.lat == 0.0
    }

    /// Interpret a raw coordinate sequence as a placeable point.
    ///
    /// Returns `None` unless the slice holds exactly two finite numbers that
    /// are not the `(0, 0)` sentinel.
    #[must_use]
    pub fn from_slice(raw: &[f64]) -> Option<Self> {
        match raw {
            [lng, lat] if lng.is_finite() && lat.is_finite() => {
                let point = Self::new(*lng, *lat);
                (!point.is_sentinel()).then_some(point)
            }
            _ => None,
        }
    }
}

/// Axis-aligned bounding region that grows as points are added
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Bounds {
    extent: Option<(LngLat, LngLat)>,
}

impl Bounds {
    /// Empty region
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Grow the region to include `point`
    pub fn extend(&mut self, point: LngLat) {
        self.extent = Some(match self.extent {
            None => (point, point),
            Some((sw, ne)) => (
                LngLat::new(sw.lng.min(point.lng), sw.lat.min(point.lat)),
                LngLat::new(ne.lng.max(point.lng), ne.lat.max(point.lat)),
            ),
        });
    }

    /// True until the first point is added
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.extent.is_none()
    }

    /// South-west corner
    #[must_use]
    pub fn south_west(&self) -> Option<LngLat> {
        self.extent.map(|(sw, _)| sw)
    }

    /// North-east corner
    #[must_use]
    pub fn north_east(&self) -> Option<LngLat> {
        self.extent.map(|(_, ne)| ne)
    }

    /// Midpoint of the region
    #[must_use]
    pub fn center(&self) -> Option<LngLat> {
        self.extent
            .map(|(sw, ne)| LngLat::new((sw.lng + ne.lng) / 2.0, (sw.lat + ne.lat) / 2.0))
    }
}

impl FromIterator<LngLat> for Bounds {
    fn from_iter<I: IntoIterator<Item = LngLat>>(iter: I) -> Self {
        let mut bounds = Self::new();
        for point in iter {
            bounds.extend(point);
        }
        bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_slice_rejects_sentinel_and_bad_shapes() {
        assert_eq!(LngLat::from_slice(&[0.0, 0.0]), None);
        assert_eq!(LngLat::from_slice(&[]), None);
        assert_eq!(LngLat::from_slice(&[-122.4]), None);
        assert_eq!(LngLat::from_slice(&[-122.4, 37.7, 3.0]), None);
        assert_eq!(LngLat::from_slice(&[f64::NAN, 37.7]), None);
        assert_eq!(
            LngLat::from_slice(&[-122.4, 37.7]),
            Some(LngLat::new(-122.4, 37.7))
        );
        // Only the exact pair is a sentinel
        assert!(LngLat::from_slice(&[0.0, 51.5]).is_some());
    }

    #[test]
    fn test_bounds_extend() {
        let mut bounds = Bounds::new();
        assert!(bounds.is_empty());
        assert_eq!(bounds.center(), None);

        bounds.extend(LngLat::new(-122.5, 37.7));
        bounds.extend(LngLat::new(-122.3, 37.9));
        bounds.extend(LngLat::new(-122.4, 37.8));

        assert_eq!(bounds.south_west(), Some(LngLat::new(-122.5, 37.7)));
        assert_eq!(bounds.north_east(), Some(LngLat::new(-122.3, 37.9)));
        let center = bounds.center().unwrap();
        assert!((center.lng + 122.4).abs() < 1e-9);
        assert!((center.lat - 37.8).abs() < 1e-9);
    }
}
