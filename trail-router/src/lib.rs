//! Pick two points on a map's selectable layer, route between them with a remote routing service,
//! and keep the drawn route and its direction list in sync with the selection.

mod client;
mod display;
mod error;
mod host;
#[cfg(target_arch = "wasm32")]
mod js;
mod points;
mod request;
mod shared;

use log::{debug, error, info, warn};
use url::Url;

pub use client::{
    interpret_response, parse_solve_response, solve_params, ArcGisRouteClient, RouteClient,
};
pub use display::{route_line_feature, RouteDisplay, Shown};
pub use error::{ReentrantCall, RouteError, SelectionError};
pub use host::{LayerHandle, MapHost, MarkerHandle, Notice};
pub use points::{marker_feature, PointStore, MAX_POINTS};
pub use request::RouteRequestBuilder;
pub use shared::{HostCall, HostSink, QueuedHost, SharedRouter};
pub use trail_router_types::{
    DirectionSegment, DirectionStep, GeoPoint, LineStyle, MapConfig, MarkerStyle, RouteRequest,
    RouteResult, RouteSolution, DEFAULT_ROUTE_URL,
};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SelectionState {
    Empty,
    OnePoint,
    /// Two points, waiting on the routing service
    Solving,
    Routed,
    /// Two points, but the solve failed. The next click clears.
    Unrouted,
}

/// Identifies one solve. A completion only applies if its ticket is still the pending one.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SolveTicket(u64);

/// A solve the host has to run and hand back through `finish_solve`.
#[derive(Clone, PartialEq, Debug)]
pub struct PendingSolve {
    pub ticket: SolveTicket,
    pub endpoint: Url,
    pub request: RouteRequest,
}

#[derive(Clone, PartialEq, Debug)]
pub enum ClickOutcome {
    /// The click missed the selectable layer
    Ignored,
    /// A solve is in flight
    Busy,
    FirstPoint,
    SolveRequested(PendingSolve),
    Cleared,
    Rejected(SelectionError),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SolveOutcome {
    /// The selection moved on before the result arrived
    Stale,
    Routed { steps: usize },
    NoDirections,
    Failed,
}

/// The click-driven selection state machine. Owns the host; dropping the controller tears the
/// host down.
pub struct SelectionController<H: MapHost> {
    host: H,
    config: MapConfig,
    requests: RouteRequestBuilder,
    points: PointStore,
    display: RouteDisplay,
    pending: Option<SolveTicket>,
    next_ticket: u64,
    loaded: bool,
}

impl<H: MapHost> SelectionController<H> {
    pub fn new(host: H, config: MapConfig) -> Self {
        Self {
            host,
            config,
            requests: RouteRequestBuilder::new(),
            points: PointStore::new(),
            display: RouteDisplay::new(),
            pending: None,
            next_ticket: 0,
            loaded: false,
        }
    }

    pub fn state(&self) -> SelectionState {
        if self.pending.is_some() {
            return SelectionState::Solving;
        }
        match self.points.count() {
            0 => SelectionState::Empty,
            1 => SelectionState::OnePoint,
            _ if self.display.is_showing() => SelectionState::Routed,
            _ => SelectionState::Unrouted,
        }
    }

    /// Handles one click. `hit` is the point on the selectable layer, if the click landed on it.
    pub fn on_click(&mut self, hit: Option<GeoPoint>) -> ClickOutcome {
        let Some(point) = hit else {
            debug!("Click missed the selectable layer");
            return ClickOutcome::Ignored;
        };

        match self.state() {
            SelectionState::Solving => {
                warn!("Ignoring click at {point}, still waiting on a route");
                ClickOutcome::Busy
            }
            SelectionState::Empty => {
                match self
                    .points
                    .add_point(&mut self.host, point, &self.config.marker_style)
                {
                    Ok(()) => ClickOutcome::FirstPoint,
                    Err(err) => reject(err),
                }
            }
            SelectionState::OnePoint => {
                if let Err(err) =
                    self.points
                        .add_point(&mut self.host, point, &self.config.marker_style)
                {
                    return reject(err);
                }
                let request = match self.requests.build(&self.points.points()) {
                    Ok(request) => request,
                    Err(err) => return reject(err),
                };

                self.next_ticket += 1;
                let ticket = SolveTicket(self.next_ticket);
                self.pending = Some(ticket);
                ClickOutcome::SolveRequested(PendingSolve {
                    ticket,
                    endpoint: self.config.route_url.clone(),
                    request,
                })
            }
            SelectionState::Routed | SelectionState::Unrouted => {
                self.clear();
                ClickOutcome::Cleared
            }
        }
    }

    /// Applies the result of a solve started by `on_click`.
    pub fn finish_solve(
        &mut self,
        ticket: SolveTicket,
        result: Result<RouteSolution, RouteError>,
    ) -> SolveOutcome {
        if self.pending != Some(ticket) {
            debug!("Dropping the result of {ticket:?}, the selection has changed since");
            return SolveOutcome::Stale;
        }
        self.pending = None;

        match result {
            Ok(solution) => {
                match self
                    .display
                    .show(&mut self.host, &solution, &self.config.route_line_style)
                {
                    Shown::Directions(steps) => {
                        info!(
                            "Route has {} results and {steps} direction steps",
                            solution.results.len()
                        );
                        SolveOutcome::Routed { steps }
                    }
                    Shown::NoDirections => SolveOutcome::NoDirections,
                }
            }
            Err(err) => {
                error!("Error calculating route: {err}");
                self.host.notify(&Notice::RouteSolveFailed {
                    reason: err.to_string(),
                });
                SolveOutcome::Failed
            }
        }
    }

    /// `on_click`, then run any solve it asks for and apply the result before returning.
    pub async fn click<C: RouteClient + ?Sized>(
        &mut self,
        hit: Option<GeoPoint>,
        client: &C,
    ) -> ClickOutcome {
        let outcome = self.on_click(hit);
        if let ClickOutcome::SolveRequested(pending) = &outcome {
            let result = client.solve(&pending.endpoint, &pending.request).await;
            self.finish_solve(pending.ticket, result);
        }
        outcome
    }

    /// Removes the markers, the route and the directions. A solve still in flight will be
    /// ignored when it lands.
    pub fn clear(&mut self) {
        self.points.clear(&mut self.host);
        self.display.clear(&mut self.host);
        self.pending = None;
        info!("Route cleared");
    }

    /// Shift-hover diagnostics
    pub fn on_pointer_move(&self, point: Option<GeoPoint>, shift_held: bool) {
        if let (true, Some(pt)) = (shift_held, point) {
            debug!("Map pointer moved: {}, {}", pt.longitude, pt.latitude);
        }
    }

    /// True only the first time, when the map has finished loading.
    pub fn mark_loaded(&mut self) -> bool {
        if self.loaded {
            return false;
        }
        self.loaded = true;
        info!("Map loaded");
        true
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn points(&self) -> Vec<GeoPoint> {
        self.points.points()
    }

    pub fn current_directions(&self) -> &[DirectionStep] {
        self.display.current_directions()
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }
}

impl<H: MapHost> Drop for SelectionController<H> {
    fn drop(&mut self) {
        debug!("Tearing down the map host");
        self.host.teardown();
    }
}

// Broken invariants are logged and dropped, never shown to the user
fn reject(err: SelectionError) -> ClickOutcome {
    error!("Selection invariant violated: {err}");
    ClickOutcome::Rejected(err)
}
