use std::fmt;

use geo::MultiLineString;

use trail_router_types::{DirectionStep, GeoPoint, LineStyle, MarkerStyle};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct MarkerHandle(pub u32);
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct LayerHandle(pub u32);

/// Something the user has to be told about.
#[derive(Clone, PartialEq, Debug)]
pub enum Notice {
    RouteSolveFailed { reason: String },
    NoDirectionsFound,
}

impl Notice {
    /// A blocking notice has to be acknowledged before the user carries on.
    pub fn is_blocking(&self) -> bool {
        matches!(self, Notice::RouteSolveFailed { .. })
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::RouteSolveFailed { reason } => write!(f, "Error calculating route: {reason}"),
            Notice::NoDirectionsFound => write!(f, "No directions found"),
        }
    }
}

/// The map widget, as seen by the selection logic. Hit-testing against the selectable layer
/// happens on the host side; the controller only ever sees the resolved point.
pub trait MapHost {
    fn add_marker(&mut self, point: GeoPoint, style: &MarkerStyle) -> MarkerHandle;
    fn remove_markers(&mut self, handles: &[MarkerHandle]);

    fn add_route_line(&mut self, geometry: &MultiLineString, style: &LineStyle) -> LayerHandle;
    fn remove_route_line(&mut self, handle: LayerHandle);

    fn notify(&mut self, notice: &Notice);

    /// Called with the whole list every time it's replaced or emptied
    fn directions_changed(&mut self, _steps: &[DirectionStep]) {}

    /// Release the widget and every event subscription. Called once, when the controller owning
    /// this host is dropped.
    fn teardown(&mut self) {}
}
