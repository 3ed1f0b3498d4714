use std::fmt;
use std::str::FromStr;

use geo::MultiLineString;
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_ROUTE_URL: &str =
    "https://route-api.arcgis.com/arcgis/rest/services/World/Route/NAServer/Route_World";
pub const TRAILHEADS_URL: &str =
    "https://services3.arcgis.com/GVgbJbqm8hXASVYi/arcgis/rest/services/Trailheads/FeatureServer/0";
pub const TRAILS_URL: &str =
    "https://services3.arcgis.com/GVgbJbqm8hXASVYi/arcgis/rest/services/Trails/FeatureServer/0";
pub const PARKS_URL: &str = "https://services3.arcgis.com/GVgbJbqm8hXASVYi/arcgis/rest/services/Parks_and_Open_Space/FeatureServer/0";

/// A WGS84 coordinate picked on the map.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl From<GeoPoint> for geo::Point {
    fn from(pt: GeoPoint) -> Self {
        geo::Point::new(pt.longitude, pt.latitude)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// Parses "lat,lon"
impl FromStr for GeoPoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lon) = s
            .split_once(',')
            .ok_or_else(|| format!("expected \"lat,lon\", got {s:?}"))?;
        let lat: f64 = lat
            .trim()
            .parse()
            .map_err(|err| format!("bad latitude {lat:?}: {err}"))?;
        let lon: f64 = lon
            .trim()
            .parse()
            .map_err(|err| format!("bad longitude {lon:?}: {err}"))?;
        let pt = GeoPoint::new(lat, lon);
        if !pt.is_valid() {
            return Err(format!("{pt} is outside WGS84 bounds"));
        }
        Ok(pt)
    }
}

/// One leg of a solved route, as shown in the direction list.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DirectionStep {
    pub text: String,
    pub length_miles: f64,
}

/// Stops for one solve, origin first.
#[derive(Clone, PartialEq, Debug)]
pub struct RouteRequest {
    pub stops: [GeoPoint; 2],
    pub return_directions: bool,
}

impl RouteRequest {
    pub fn origin(&self) -> GeoPoint {
        self.stops[0]
    }

    pub fn destination(&self) -> GeoPoint {
        self.stops[1]
    }
}

/// A direction segment exactly as the service returned it. Either attribute may be missing.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct DirectionSegment {
    pub text: Option<String>,
    pub length: Option<f64>,
}

impl DirectionSegment {
    pub fn to_step(&self) -> DirectionStep {
        DirectionStep {
            text: self.text.clone().unwrap_or_default(),
            length_miles: self.length.unwrap_or(0.0),
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct RouteResult {
    pub geometry: MultiLineString,
    pub directions: Option<Vec<DirectionSegment>>,
}

#[derive(Clone, PartialEq, Debug, Default)]
pub struct RouteSolution {
    pub results: Vec<RouteResult>,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct MarkerStyle {
    pub color: [u8; 3],
    pub outline_color: [u8; 3],
    pub outline_width: f64,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            color: [226, 119, 40],
            outline_color: [255, 255, 255],
            outline_width: 1.0,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct LineStyle {
    pub color: [u8; 3],
    pub width: f64,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            color: [5, 150, 255],
            width: 3.0,
        }
    }
}

/// Everything the map view needs to start. Every field can be omitted and falls back to the
/// trailheads setup.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(default, rename_all = "camelCase")]
pub struct MapConfig {
    pub basemap: String,
    pub center: GeoPoint,
    pub zoom: u8,
    pub route_url: Url,
    /// Only clicks that hit this layer produce a point
    pub selectable_layer_url: String,
    /// Drawn underneath, never hit-tested
    pub context_layer_urls: Vec<String>,
    pub marker_style: MarkerStyle,
    pub route_line_style: LineStyle,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            basemap: "streets-vector".to_string(),
            center: GeoPoint::new(34.07817583063242, -118.73682450024377),
            zoom: 10,
            route_url: Url::parse(DEFAULT_ROUTE_URL).expect("DEFAULT_ROUTE_URL is a valid URL"),
            selectable_layer_url: TRAILHEADS_URL.to_string(),
            context_layer_urls: vec![TRAILS_URL.to_string(), PARKS_URL.to_string()],
            marker_style: MarkerStyle::default(),
            route_line_style: LineStyle::default(),
        }
    }
}
