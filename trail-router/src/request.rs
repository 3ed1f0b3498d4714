use crate::SelectionError;
use trail_router_types::{GeoPoint, RouteRequest};

/// Requests always ask for direction text; the list is part of what the user sees.
#[derive(Default)]
pub struct RouteRequestBuilder;

impl RouteRequestBuilder {
    pub fn new() -> Self {
        Self
    }

    /// The first point is the origin, the second the destination.
    pub fn build(&self, points: &[GeoPoint]) -> Result<RouteRequest, SelectionError> {
        match points {
            [origin, destination] => Ok(RouteRequest {
                stops: [*origin, *destination],
                return_directions: true,
            }),
            _ => Err(SelectionError::InvalidStopCount(points.len())),
        }
    }
}
