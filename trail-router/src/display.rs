use geo::MultiLineString;
use geojson::Feature;

use crate::points::css_rgb;
use crate::{LayerHandle, MapHost, Notice};
use trail_router_types::{DirectionSegment, DirectionStep, LineStyle, RouteSolution};

/// What `RouteDisplay::show` ended up putting on screen
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Shown {
    Directions(usize),
    NoDirections,
}

/// Owns the drawn route lines and the direction list derived from the last solve.
#[derive(Default)]
pub struct RouteDisplay {
    route_lines: Vec<LayerHandle>,
    directions: Vec<DirectionStep>,
    showing: bool,
}

impl RouteDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces whatever is drawn. Every result gets a line, but only the first result's
    /// directions are listed.
    pub fn show<H: MapHost + ?Sized>(
        &mut self,
        host: &mut H,
        solution: &RouteSolution,
        style: &LineStyle,
    ) -> Shown {
        self.remove_lines(host);
        for result in &solution.results {
            self.route_lines
                .push(host.add_route_line(&result.geometry, style));
        }
        self.showing = true;

        self.directions = solution
            .results
            .first()
            .and_then(|result| result.directions.as_ref())
            .map(|segments| segments.iter().map(DirectionSegment::to_step).collect())
            .unwrap_or_default();
        host.directions_changed(&self.directions);

        if self.directions.is_empty() {
            host.notify(&Notice::NoDirectionsFound);
            return Shown::NoDirections;
        }
        Shown::Directions(self.directions.len())
    }

    pub fn clear<H: MapHost + ?Sized>(&mut self, host: &mut H) {
        self.remove_lines(host);
        self.showing = false;
        self.directions.clear();
        host.directions_changed(&self.directions);
    }

    pub fn current_directions(&self) -> &[DirectionStep] {
        &self.directions
    }

    /// True after a successful solve, even one without any directions
    pub fn is_showing(&self) -> bool {
        self.showing
    }

    fn remove_lines<H: MapHost + ?Sized>(&mut self, host: &mut H) {
        for handle in self.route_lines.drain(..) {
            host.remove_route_line(handle);
        }
    }
}

/// A route as a GeoJSON feature carrying its line style, for hosts that draw from GeoJSON.
pub fn route_line_feature(geometry: &MultiLineString, style: &LineStyle) -> Feature {
    let mut feature = Feature::from(geojson::Geometry::from(geojson::Value::from(geometry)));
    feature.set_property("type", "route");
    feature.set_property("color", css_rgb(style.color));
    feature.set_property("width", style.width);
    feature
}
