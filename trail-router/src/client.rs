use async_trait::async_trait;
use geo::{LineString, MultiLineString};
use log::debug;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::error::{ServiceErrorDetail, ServiceErrorPayload};
use crate::RouteError;
use trail_router_types::{DirectionSegment, RouteRequest, RouteResult, RouteSolution};

/// Something that can solve a route between two stops. The call is the controller's only
/// suspension point.
#[async_trait(?Send)]
pub trait RouteClient {
    async fn solve(
        &self,
        endpoint: &Url,
        request: &RouteRequest,
    ) -> Result<RouteSolution, RouteError>;
}

// --- Wire format of the network analysis solve endpoint ---
#[derive(Deserialize)]
struct SolveResponse {
    routes: Option<RouteFeatureSet>,
    #[serde(default)]
    directions: Vec<Directions>,
    error: Option<ServiceErrorDetail>,
}
#[derive(Deserialize)]
struct RouteFeatureSet {
    #[serde(default)]
    features: Vec<RouteFeature>,
}
#[derive(Deserialize)]
struct RouteFeature {
    geometry: Option<PolylineGeometry>,
}
#[derive(Deserialize)]
struct PolylineGeometry {
    // Each vertex is [x, y] or [x, y, z]
    #[serde(default)]
    paths: Vec<Vec<Vec<f64>>>,
}
#[derive(Deserialize)]
struct Directions {
    #[serde(default)]
    features: Vec<DirectionFeature>,
}
#[derive(Deserialize)]
struct DirectionFeature {
    #[serde(default)]
    attributes: DirectionAttributes,
}
#[derive(Deserialize, Default)]
struct DirectionAttributes {
    text: Option<String>,
    length: Option<f64>,
}

/// Form parameters for one solve. Stops are sent in WGS84, and everything comes back in WGS84
/// with lengths in miles.
pub fn solve_params(request: &RouteRequest, token: Option<&str>) -> Vec<(&'static str, String)> {
    let features: Vec<serde_json::Value> = request
        .stops
        .iter()
        .map(|pt| {
            json!({
                "geometry": {
                    "x": pt.longitude,
                    "y": pt.latitude,
                    "spatialReference": { "wkid": 4326 },
                }
            })
        })
        .collect();
    let stops = json!({ "features": features });

    let mut params = vec![
        ("f", "json".to_string()),
        ("stops", stops.to_string()),
        ("returnDirections", request.return_directions.to_string()),
        ("returnRoutes", "true".to_string()),
        ("directionsLengthUnits", "esriNAUMiles".to_string()),
        ("outSR", "4326".to_string()),
    ];
    if let Some(token) = token {
        params.push(("token", token.to_string()));
    }
    params
}

/// Turns a solve response body into a solution. Route i is paired with directions entry i.
pub fn parse_solve_response(body: &str) -> Result<RouteSolution, RouteError> {
    let response: SolveResponse = serde_json::from_str(body)?;
    if let Some(err) = response.error {
        return Err(err.into());
    }

    let mut directions_by_route = response.directions.into_iter();
    let mut results = Vec::new();
    for feature in response.routes.map(|set| set.features).unwrap_or_default() {
        let geometry = match feature.geometry {
            Some(geometry) => to_multi_line_string(geometry)?,
            None => MultiLineString::new(Vec::new()),
        };
        let directions = directions_by_route.next().map(|entry| {
            entry
                .features
                .into_iter()
                .map(|f| DirectionSegment {
                    text: f.attributes.text,
                    length: f.attributes.length,
                })
                .collect()
        });
        results.push(RouteResult {
            geometry,
            directions,
        });
    }
    Ok(RouteSolution { results })
}

fn to_multi_line_string(geometry: PolylineGeometry) -> Result<MultiLineString, RouteError> {
    let mut lines = Vec::new();
    for path in geometry.paths {
        let mut pts = Vec::new();
        for vertex in path {
            match vertex.as_slice() {
                [x, y, ..] => pts.push((*x, *y)),
                _ => {
                    return Err(RouteError::Malformed(format!(
                        "path vertex with {} ordinates",
                        vertex.len()
                    )))
                }
            }
        }
        lines.push(LineString::from(pts));
    }
    Ok(MultiLineString::new(lines))
}

/// Solves against an ArcGIS-style `NAServer` route service.
#[derive(Clone)]
pub struct ArcGisRouteClient {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl ArcGisRouteClient {
    pub fn new(api_key: Option<String>) -> Result<Self, RouteError> {
        Ok(Self {
            client: http_client()?,
            api_key,
        })
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(15))
        .build()
}

// The browser owns timeouts
#[cfg(target_arch = "wasm32")]
fn http_client() -> Result<reqwest::Client, reqwest::Error> {
    Ok(reqwest::Client::new())
}

#[async_trait(?Send)]
impl RouteClient for ArcGisRouteClient {
    async fn solve(
        &self,
        endpoint: &Url,
        request: &RouteRequest,
    ) -> Result<RouteSolution, RouteError> {
        let url = format!("{}/solve", endpoint.as_str().trim_end_matches('/'));
        debug!(
            "Solving route from {} to {} with {url}",
            request.origin(),
            request.destination()
        );

        let response = self
            .client
            .post(url)
            .form(&solve_params(request, self.api_key.as_deref()))
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        interpret_response(status, body)
    }
}

/// Turns a finished HTTP exchange into a solution. A failing status still carries the service's
/// own error payload when there is one; anything else (a proxy's HTML page, say) is kept as-is.
pub fn interpret_response(status: StatusCode, body: String) -> Result<RouteSolution, RouteError> {
    if !status.is_success() {
        if let Ok(payload) = serde_json::from_str::<ServiceErrorPayload>(&body) {
            return Err(payload.error.into());
        }
        return Err(RouteError::Status {
            status: status.as_u16(),
            body,
        });
    }
    parse_solve_response(&body)
}
