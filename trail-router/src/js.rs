use std::rc::Rc;
use std::sync::Once;

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::{
    route_line_feature, ArcGisRouteClient, GeoPoint, HostCall, HostSink, MapConfig, SharedRouter,
};

static START: Once = Once::new();

#[wasm_bindgen]
extern "C" {
    /// The page's adapter around its map widget. Clicks are hit-tested against the selectable
    /// layer on the JS side before being passed to `onClick`. Marker and route line ids are
    /// picked by the router; `removeMarkers` and `removeRouteLine` refer back to them.
    pub type MapWidget;

    #[wasm_bindgen(method, js_name = addMarker)]
    fn add_marker(this: &MapWidget, id: u32, lon: f64, lat: f64, style: JsValue);
    #[wasm_bindgen(method, js_name = removeMarkers)]
    fn remove_markers(this: &MapWidget, ids: &[u32]);
    #[wasm_bindgen(method, js_name = addRouteLine)]
    fn add_route_line(this: &MapWidget, id: u32, feature: JsValue);
    #[wasm_bindgen(method, js_name = removeRouteLine)]
    fn remove_route_line(this: &MapWidget, id: u32);
    #[wasm_bindgen(method)]
    fn notify(this: &MapWidget, message: String, blocking: bool);
    #[wasm_bindgen(method, js_name = setDirections)]
    fn set_directions(this: &MapWidget, steps: JsValue);
    #[wasm_bindgen(method)]
    fn destroy(this: &MapWidget);
}

struct JsSink {
    widget: MapWidget,
}

impl HostSink for JsSink {
    fn apply(&self, call: HostCall) {
        match call {
            HostCall::AddMarker {
                handle,
                point,
                style,
            } => self
                .widget
                .add_marker(handle.0, point.longitude, point.latitude, to_js(&style)),
            HostCall::RemoveMarkers(handles) => {
                let ids: Vec<u32> = handles.iter().map(|h| h.0).collect();
                self.widget.remove_markers(&ids);
            }
            HostCall::AddRouteLine {
                handle,
                geometry,
                style,
            } => self
                .widget
                .add_route_line(handle.0, to_js(&route_line_feature(&geometry, &style))),
            HostCall::RemoveRouteLine(handle) => self.widget.remove_route_line(handle.0),
            HostCall::Notify(notice) => self.widget.notify(notice.to_string(), notice.is_blocking()),
            HostCall::SetDirections(steps) => self.widget.set_directions(to_js(&steps)),
            HostCall::Teardown => self.widget.destroy(),
        }
    }
}

#[wasm_bindgen]
pub struct JsTrailRouter {
    router: SharedRouter<JsSink, ArcGisRouteClient>,
}

#[wasm_bindgen]
impl JsTrailRouter {
    /// `config` may be undefined or any subset of `MapConfig`.
    #[wasm_bindgen(constructor)]
    pub fn new(
        widget: MapWidget,
        config: JsValue,
        api_key: Option<String>,
    ) -> Result<JsTrailRouter, JsValue> {
        START.call_once(|| {
            // Panics shouldn't happen, but if they do, console.log them.
            console_error_panic_hook::set_once();
            console_log::init_with_level(log::Level::Info).ok();
        });

        let config: MapConfig = if config.is_undefined() || config.is_null() {
            MapConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config).map_err(err_to_js)?
        };
        let client = ArcGisRouteClient::new(api_key).map_err(err_to_js)?;

        Ok(Self {
            router: SharedRouter::new(Rc::new(JsSink { widget }), config, client),
        })
    }

    /// The effective config, so the page can set up the basemap and layers from it.
    #[wasm_bindgen(js_name = mapConfig)]
    pub fn map_config(&self) -> Result<JsValue, JsValue> {
        Ok(to_js(&self.router.config().map_err(err_to_js)?))
    }

    /// True the first time only
    #[wasm_bindgen(js_name = markLoaded)]
    pub fn mark_loaded(&self) -> Result<bool, JsValue> {
        self.router.mark_loaded().map_err(err_to_js)
    }

    /// A click that hit the selectable layer
    #[wasm_bindgen(js_name = onClick)]
    pub fn on_click(&self, lon: f64, lat: f64) -> Result<(), JsValue> {
        let pt = GeoPoint::new(lat, lon);
        if !pt.is_valid() {
            log::warn!("Ignoring click at invalid coordinate {pt}");
            return Ok(());
        }
        self.handle_click(Some(pt))
    }

    #[wasm_bindgen(js_name = onMissedClick)]
    pub fn on_missed_click(&self) -> Result<(), JsValue> {
        self.handle_click(None)
    }

    #[wasm_bindgen(js_name = onPointerMove)]
    pub fn on_pointer_move(&self, lon: f64, lat: f64, shift_held: bool) {
        self.router
            .on_pointer_move(Some(GeoPoint::new(lat, lon)), shift_held);
    }

    #[wasm_bindgen(js_name = clearRoute)]
    pub fn clear_route(&self) -> Result<(), JsValue> {
        self.router.clear().map_err(err_to_js)
    }

    pub fn directions(&self) -> Result<JsValue, JsValue> {
        Ok(to_js(&self.router.directions().map_err(err_to_js)?))
    }

    pub fn state(&self) -> Result<String, JsValue> {
        let state = self.router.state().map_err(err_to_js)?;
        Ok(format!("{state:?}"))
    }
}

impl JsTrailRouter {
    fn handle_click(&self, hit: Option<GeoPoint>) -> Result<(), JsValue> {
        if let Some(solve) = self.router.on_click(hit).map_err(err_to_js)? {
            wasm_bindgen_futures::spawn_local(async move {
                solve.await;
            });
        }
        Ok(())
    }
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> JsValue {
    match value.serialize(&serde_wasm_bindgen::Serializer::json_compatible()) {
        Ok(value) => value,
        Err(err) => {
            log::error!("Couldn't pass a value to JS: {err}");
            JsValue::NULL
        }
    }
}

fn err_to_js<E: std::fmt::Display>(err: E) -> JsValue {
    JsValue::from_str(&err.to_string())
}
