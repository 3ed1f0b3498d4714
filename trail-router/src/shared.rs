//! The controller as an event-driven UI holds it: shared between the widget's callbacks and the
//! solves running in the background, with every widget call made outside of any borrow so the
//! widget's handlers are free to read the router back.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::future::Future;
use std::rc::Rc;

use geo::MultiLineString;
use log::error;

use crate::{
    ClickOutcome, DirectionStep, GeoPoint, LayerHandle, LineStyle, MapConfig, MapHost,
    MarkerHandle, MarkerStyle, Notice, ReentrantCall, RouteClient, SelectionController,
    SelectionState, SolveOutcome,
};

/// One call to the widget, recorded while the controller was borrowed.
#[derive(Clone, PartialEq, Debug)]
pub enum HostCall {
    AddMarker {
        handle: MarkerHandle,
        point: GeoPoint,
        style: MarkerStyle,
    },
    RemoveMarkers(Vec<MarkerHandle>),
    AddRouteLine {
        handle: LayerHandle,
        geometry: MultiLineString,
        style: LineStyle,
    },
    RemoveRouteLine(LayerHandle),
    Notify(Notice),
    SetDirections(Vec<DirectionStep>),
    Teardown,
}

/// The widget end of a `SharedRouter`. Calls arrive in order, and never while the controller is
/// borrowed. Handles are chosen on this side, so the widget has to remember the ones it's given.
pub trait HostSink {
    fn apply(&self, call: HostCall);
}

type CallQueue = Rc<RefCell<VecDeque<HostCall>>>;

/// Records what the controller does to its host and hands it over to the sink later.
pub struct QueuedHost<S: HostSink> {
    next_id: u32,
    queue: CallQueue,
    sink: Rc<S>,
}

impl<S: HostSink> QueuedHost<S> {
    fn push(&self, call: HostCall) {
        self.queue.borrow_mut().push_back(call);
    }

    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

impl<S: HostSink> MapHost for QueuedHost<S> {
    fn add_marker(&mut self, point: GeoPoint, style: &MarkerStyle) -> MarkerHandle {
        let handle = MarkerHandle(self.next_id());
        self.push(HostCall::AddMarker {
            handle,
            point,
            style: style.clone(),
        });
        handle
    }

    fn remove_markers(&mut self, handles: &[MarkerHandle]) {
        self.push(HostCall::RemoveMarkers(handles.to_vec()));
    }

    fn add_route_line(&mut self, geometry: &MultiLineString, style: &LineStyle) -> LayerHandle {
        let handle = LayerHandle(self.next_id());
        self.push(HostCall::AddRouteLine {
            handle,
            geometry: geometry.clone(),
            style: style.clone(),
        });
        handle
    }

    fn remove_route_line(&mut self, handle: LayerHandle) {
        self.push(HostCall::RemoveRouteLine(handle));
    }

    fn notify(&mut self, notice: &Notice) {
        self.push(HostCall::Notify(notice.clone()));
    }

    fn directions_changed(&mut self, steps: &[DirectionStep]) {
        self.push(HostCall::SetDirections(steps.to_vec()));
    }

    // The controller is going away, so there's no later point to flush at
    fn teardown(&mut self) {
        flush(&self.queue, self.sink.as_ref());
        self.sink.apply(HostCall::Teardown);
    }
}

fn flush<S: HostSink + ?Sized>(queue: &CallQueue, sink: &S) {
    loop {
        // The queue borrow ends with this statement; `apply` may queue more.
        let Some(call) = queue.borrow_mut().pop_front() else {
            return;
        };
        sink.apply(call);
    }
}

/// A `SelectionController` shared between UI callbacks and in-flight solves. Solves only keep a
/// weak reference, so dropping the router tears the widget down right away and a late result
/// is dropped.
pub struct SharedRouter<S: HostSink, C: RouteClient> {
    controller: Rc<RefCell<SelectionController<QueuedHost<S>>>>,
    queue: CallQueue,
    sink: Rc<S>,
    client: C,
}

impl<S, C> SharedRouter<S, C>
where
    S: HostSink + 'static,
    C: RouteClient + Clone + 'static,
{
    pub fn new(sink: Rc<S>, config: MapConfig, client: C) -> Self {
        let queue = CallQueue::default();
        let host = QueuedHost {
            next_id: 0,
            queue: queue.clone(),
            sink: sink.clone(),
        };
        Self {
            controller: Rc::new(RefCell::new(SelectionController::new(host, config))),
            queue,
            sink,
            client,
        }
    }

    // Runs `f` on the controller, then delivers whatever it did to the widget.
    fn update<T>(
        &self,
        f: impl FnOnce(&mut SelectionController<QueuedHost<S>>) -> T,
    ) -> Result<T, ReentrantCall> {
        let result = {
            let mut controller = self
                .controller
                .try_borrow_mut()
                .map_err(|_| ReentrantCall)?;
            f(&mut controller)
        };
        flush(&self.queue, self.sink.as_ref());
        Ok(result)
    }

    fn read<T>(
        &self,
        f: impl FnOnce(&SelectionController<QueuedHost<S>>) -> T,
    ) -> Result<T, ReentrantCall> {
        let controller = self.controller.try_borrow().map_err(|_| ReentrantCall)?;
        Ok(f(&controller))
    }

    /// Handles a click. If it starts a solve, the returned future runs it and applies the result;
    /// the caller decides where it runs. It's fine to never poll it.
    pub fn on_click(
        &self,
        hit: Option<GeoPoint>,
    ) -> Result<Option<impl Future<Output = SolveOutcome> + 'static>, ReentrantCall> {
        let ClickOutcome::SolveRequested(pending) = self.update(|c| c.on_click(hit))? else {
            return Ok(None);
        };

        let controller = Rc::downgrade(&self.controller);
        let queue = self.queue.clone();
        let sink = self.sink.clone();
        let client = self.client.clone();
        Ok(Some(async move {
            let result = client.solve(&pending.endpoint, &pending.request).await;
            let Some(controller) = controller.upgrade() else {
                return SolveOutcome::Stale;
            };
            let outcome = match controller.try_borrow_mut() {
                Ok(mut controller) => controller.finish_solve(pending.ticket, result),
                Err(_) => {
                    error!("Router was busy when {:?} finished", pending.ticket);
                    return SolveOutcome::Stale;
                }
            };
            flush(&queue, sink.as_ref());
            outcome
        }))
    }

    pub fn clear(&self) -> Result<(), ReentrantCall> {
        self.update(|c| c.clear())
    }

    pub fn mark_loaded(&self) -> Result<bool, ReentrantCall> {
        self.update(|c| c.mark_loaded())
    }

    pub fn on_pointer_move(&self, hover: Option<GeoPoint>, shift_held: bool) {
        if self
            .read(|c| c.on_pointer_move(hover, shift_held))
            .is_err()
        {
            error!("Dropping a pointer move, the router is busy");
        }
    }

    pub fn state(&self) -> Result<SelectionState, ReentrantCall> {
        self.read(|c| c.state())
    }

    pub fn directions(&self) -> Result<Vec<DirectionStep>, ReentrantCall> {
        self.read(|c| c.current_directions().to_vec())
    }

    pub fn config(&self) -> Result<MapConfig, ReentrantCall> {
        self.read(|c| c.config().clone())
    }
}
