use geojson::Feature;
use log::error;

use crate::{MapHost, MarkerHandle, SelectionError};
use trail_router_types::{GeoPoint, MarkerStyle};

pub const MAX_POINTS: usize = 2;

struct Marker {
    point: GeoPoint,
    handle: MarkerHandle,
}

/// The user's picks, in click order, each with the marker drawn for it.
#[derive(Default)]
pub struct PointStore {
    markers: Vec<Marker>,
}

impl PointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_point<H: MapHost + ?Sized>(
        &mut self,
        host: &mut H,
        point: GeoPoint,
        style: &MarkerStyle,
    ) -> Result<(), SelectionError> {
        if self.markers.len() >= MAX_POINTS {
            error!("Refusing to add {point}, already holding {} points", self.markers.len());
            return Err(SelectionError::CapacityExceeded);
        }
        let handle = host.add_marker(point, style);
        self.markers.push(Marker { point, handle });
        Ok(())
    }

    pub fn clear<H: MapHost + ?Sized>(&mut self, host: &mut H) {
        if self.markers.is_empty() {
            return;
        }
        let handles: Vec<MarkerHandle> = self.markers.drain(..).map(|m| m.handle).collect();
        host.remove_markers(&handles);
    }

    pub fn count(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn points(&self) -> Vec<GeoPoint> {
        self.markers.iter().map(|m| m.point).collect()
    }
}

/// A marker as a GeoJSON point, for hosts that draw from GeoJSON.
pub fn marker_feature(point: GeoPoint, style: &MarkerStyle) -> Feature {
    let mut feature = Feature::from(geojson::Geometry::from(geojson::Value::Point(vec![
        point.longitude,
        point.latitude,
    ])));
    feature.set_property("type", "marker");
    feature.set_property("color", css_rgb(style.color));
    feature.set_property("outline_color", css_rgb(style.outline_color));
    feature.set_property("outline_width", style.outline_width);
    feature
}

pub(crate) fn css_rgb([r, g, b]: [u8; 3]) -> String {
    format!("rgb({r}, {g}, {b})")
}
