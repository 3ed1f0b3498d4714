use std::collections::BTreeMap;

use anyhow::{bail, Result};
use geo::{line_measures::LengthMeasurable, Haversine, MultiLineString};
use geojson::{Feature, FeatureCollection, GeoJson};
use log::{info, warn};

use trail_router::{
    marker_feature, route_line_feature, DirectionStep, GeoPoint, LayerHandle, LineStyle,
    MapConfig, MapHost, MarkerHandle, MarkerStyle, Notice, RouteClient, SelectionController,
    SelectionState,
};

/// A map host with no screen. Markers and route lines are kept as GeoJSON features.
#[derive(Default)]
pub struct GeoJsonMapHost {
    next_id: u32,
    markers: BTreeMap<u32, Feature>,
    route_lines: BTreeMap<u32, Feature>,
    directions: Vec<DirectionStep>,
    notices: Vec<Notice>,
}

impl GeoJsonMapHost {
    pub fn directions(&self) -> &[DirectionStep] {
        &self.directions
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Everything currently drawn, with the direction list as a foreign member.
    pub fn to_geojson(&self) -> Result<GeoJson> {
        let mut collection: FeatureCollection = self
            .markers
            .values()
            .chain(self.route_lines.values())
            .cloned()
            .collect();
        let mut members = serde_json::Map::new();
        members.insert(
            "directions".to_string(),
            serde_json::to_value(&self.directions)?,
        );
        collection.foreign_members = Some(members);
        Ok(GeoJson::from(collection))
    }

    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

impl MapHost for GeoJsonMapHost {
    fn add_marker(&mut self, point: GeoPoint, style: &MarkerStyle) -> MarkerHandle {
        let id = self.next_id();
        self.markers.insert(id, marker_feature(point, style));
        MarkerHandle(id)
    }

    fn remove_markers(&mut self, handles: &[MarkerHandle]) {
        for handle in handles {
            self.markers.remove(&handle.0);
        }
    }

    fn add_route_line(&mut self, geometry: &MultiLineString, style: &LineStyle) -> LayerHandle {
        let id = self.next_id();
        let meters: f64 = geometry
            .iter()
            .map(|line| line.length(&Haversine))
            .sum();
        let mut feature = route_line_feature(geometry, style);
        feature.set_property("length_meters", meters);
        self.route_lines.insert(id, feature);
        LayerHandle(id)
    }

    fn remove_route_line(&mut self, handle: LayerHandle) {
        self.route_lines.remove(&handle.0);
    }

    fn notify(&mut self, notice: &Notice) {
        if notice.is_blocking() {
            warn!("{notice}");
        } else {
            info!("{notice}");
        }
        self.notices.push(notice.clone());
    }

    fn directions_changed(&mut self, steps: &[DirectionStep]) {
        self.directions = steps.to_vec();
    }
}

pub struct RouteOutput {
    pub directions: Vec<DirectionStep>,
    pub geojson: GeoJson,
}

/// Picks `origin` then `destination`, exactly like two clicks on the map, and returns what ends
/// up drawn.
pub async fn route_between<C: RouteClient + ?Sized>(
    config: MapConfig,
    client: &C,
    origin: GeoPoint,
    destination: GeoPoint,
) -> Result<RouteOutput> {
    let mut controller = SelectionController::new(GeoJsonMapHost::default(), config);
    controller.mark_loaded();

    for pt in [origin, destination] {
        controller.click(Some(pt), client).await;
    }

    let state = controller.state();
    if state != SelectionState::Routed {
        let reason = controller
            .host()
            .notices()
            .last()
            .map(|notice| notice.to_string())
            .unwrap_or_else(|| format!("ended up {state:?}"));
        bail!("No route from {origin} to {destination}: {reason}");
    }

    // The list as it was pushed to the host
    let host = controller.host();
    Ok(RouteOutput {
        directions: host.directions().to_vec(),
        geojson: host.to_geojson()?,
    })
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use geo::LineString;
    use trail_router::{DirectionSegment, RouteError, RouteRequest, RouteResult, RouteSolution};
    use url::Url;

    use super::*;

    struct FixedClient(Option<RouteSolution>);

    #[async_trait(?Send)]
    impl RouteClient for FixedClient {
        async fn solve(&self, _: &Url, _: &RouteRequest) -> Result<RouteSolution, RouteError> {
            self.0
                .clone()
                .ok_or_else(|| RouteError::Malformed("unavailable".to_string()))
        }
    }

    fn origin() -> GeoPoint {
        GeoPoint::new(34.07, -118.73)
    }

    fn destination() -> GeoPoint {
        GeoPoint::new(34.06, -118.70)
    }

    #[tokio::test]
    async fn writes_markers_route_and_directions() {
        let client = FixedClient(Some(RouteSolution {
            results: vec![RouteResult {
                geometry: MultiLineString::new(vec![LineString::from(vec![
                    (-118.73, 34.07),
                    (-118.70, 34.06),
                ])]),
                directions: Some(vec![DirectionSegment {
                    text: Some("Head north".to_string()),
                    length: Some(0.5),
                }]),
            }],
        }));

        let output = route_between(MapConfig::default(), &client, origin(), destination())
            .await
            .unwrap();
        assert_eq!(
            output.directions,
            vec![DirectionStep {
                text: "Head north".to_string(),
                length_miles: 0.5,
            }]
        );

        let GeoJson::FeatureCollection(collection) = output.geojson else {
            panic!("expected a FeatureCollection");
        };
        // Two markers, then the route
        assert_eq!(collection.features.len(), 3);
        let route = &collection.features[2];
        assert_eq!(
            route.property("type"),
            Some(&serde_json::Value::from("route"))
        );
        let meters = route.property("length_meters").unwrap().as_f64().unwrap();
        assert!(meters > 2900.0 && meters < 3100.0, "{meters}");
        assert_eq!(
            collection.foreign_members.unwrap()["directions"][0]["lengthMiles"],
            0.5
        );
    }

    #[tokio::test]
    async fn failed_solve_is_an_error() {
        let err = route_between(MapConfig::default(), &FixedClient(None), origin(), destination())
            .await
            .err()
            .unwrap();
        assert!(
            err.to_string().contains("Error calculating route"),
            "{err}"
        );
    }
}
