use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::libraries::endpoint_state::EndpointState;
use crate::libraries::map_widget::{DragEnd, MapView, MapWidget};
use crate::models::{EndpointRole, LatLng, Path, PathResponse, SyncError};
use crate::services::path_client::PathClient;

/// Pending drag events buffered between the widget and the controller
const DRAG_EVENT_BUFFER: usize = 32;

/// How the line is redrawn after a marker moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedrawStrategy {
    /// Ask the path service for the path between the endpoints
    #[default]
    RemotePath,
    /// Connect the markers with a straight line, no network involved
    DirectLine,
}

#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub strategy: RedrawStrategy,
    pub request_timeout: Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            strategy: RedrawStrategy::RemotePath,
            request_timeout: Duration::from_secs(5),
        }
    }
}

/// What happened to one completed request
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// The line now shows this request's path
    Applied { seq: u64 },
    /// A newer request already settled; the line was left alone
    Discarded { seq: u64, latest: u64 },
    /// The request failed; the line still shows the last good path
    Failed { seq: u64, error: SyncError },
}

type Completion = (u64, Result<PathResponse, SyncError>);

/// Keeps the drawn line in step with the endpoints.
///
/// Owns the endpoint state, the rendered path and the widget. All mutation
/// happens on the task driving the controller; path requests run as separate
/// tasks and only hand their result back. Every trigger gets a sequence
/// number and a result is applied only if it is newer than anything already
/// settled, so a slow stale answer can never replace a fresher line.
pub struct SyncController<C: PathClient, W: MapWidget> {
    state: EndpointState,
    client: Arc<C>,
    widget: W,
    settings: SyncSettings,
    rendered: Path,
    last_issued: u64,
    last_settled: u64,
    in_flight: JoinSet<Completion>,
}

impl<C: PathClient, W: MapWidget> SyncController<C, W> {
    /// The initial line is the straight one between the endpoints
    pub fn new(state: EndpointState, client: Arc<C>, widget: W, settings: SyncSettings) -> Self {
        let (source, target) = state.current_positions();

        Self {
            state,
            client,
            widget,
            settings,
            rendered: Path::direct(source, target),
            last_issued: 0,
            last_settled: 0,
            in_flight: JoinSet::new(),
        }
    }

    /// Set up the widget and subscribe to both markers.
    ///
    /// Returns the stream of drag events to feed into [`SyncController::run`].
    pub fn attach(&mut self, view: &MapView) -> mpsc::Receiver<DragEnd> {
        self.widget.render(view);

        let (source, target) = self.state.current_positions();
        self.widget.place_marker(EndpointRole::Source, source, true);
        self.widget.place_marker(EndpointRole::Target, target, true);
        self.widget.set_polyline(self.rendered.points());

        let (tx, rx) = mpsc::channel(DRAG_EVENT_BUFFER);
        self.widget.subscribe_drag_end(EndpointRole::Source, tx.clone());
        self.widget.subscribe_drag_end(EndpointRole::Target, tx);

        info!(
            "Attached to map: source {} target {} ({:?})",
            source, target, self.settings.strategy
        );
        rx
    }

    /// Handle a marker drop.
    ///
    /// Returns the sequence number assigned to this trigger. With
    /// [`RedrawStrategy::RemotePath`] the path request is now in flight and
    /// settles through [`SyncController::next_completion`].
    pub fn on_endpoint_drag_end(&mut self, role: EndpointRole, position: LatLng) -> Result<u64, SyncError> {
        if let Err(e) = self.state.move_endpoint(role, position) {
            warn!("Rejected {} drag: {}", role, e);
            // Put the marker back where the state says it is
            self.widget.place_marker(role, self.state.position(role), true);
            return Err(e);
        }

        let request = self.state.take_request();
        self.last_issued += 1;
        let seq = self.last_issued;

        match self.settings.strategy {
            RedrawStrategy::DirectLine => {
                let response = PathResponse::new(Path::direct(request.source, request.target));
                self.apply_response(seq, Ok(response));
            }
            RedrawStrategy::RemotePath => {
                debug!("Issuing path request #{}: {}", seq, request.to_query());

                let client = Arc::clone(&self.client);
                let timeout = self.settings.request_timeout;
                self.in_flight.spawn(async move {
                    let result = match tokio::time::timeout(timeout, client.request_path(request)).await {
                        Ok(result) => result,
                        Err(_) => Err(SyncError::PathServiceUnavailable(format!(
                            "no answer within {:?}",
                            timeout
                        ))),
                    };
                    (seq, result)
                });
            }
        }

        Ok(seq)
    }

    /// Apply the result of request `seq` unless something newer already settled
    pub fn apply_response(&mut self, seq: u64, result: Result<PathResponse, SyncError>) -> SyncOutcome {
        if seq == 0 || seq > self.last_issued {
            warn!("Ignoring result for unknown request #{}", seq);
            return SyncOutcome::Discarded {
                seq,
                latest: self.last_settled,
            };
        }

        if seq <= self.last_settled {
            debug!(
                "Discarding stale result #{} (#{} already settled)",
                seq, self.last_settled
            );
            return SyncOutcome::Discarded {
                seq,
                latest: self.last_settled,
            };
        }

        // Failures settle too: anything older describes endpoints the
        // markers have since left.
        self.last_settled = seq;

        match result {
            Ok(response) => {
                self.rendered = response.path;
                self.widget.set_polyline(self.rendered.points());
                info!(
                    "Applied path #{} ({} points, {:.0}m)",
                    seq,
                    self.rendered.points().len(),
                    self.rendered.length_meters()
                );
                SyncOutcome::Applied { seq }
            }
            Err(error) => {
                warn!("Path request #{} failed, keeping current line: {}", seq, error);
                self.widget.show_notice(&error.to_string());
                SyncOutcome::Failed { seq, error }
            }
        }
    }

    /// Wait for the next in-flight request to finish and apply it.
    ///
    /// Returns `None` when nothing is in flight.
    pub async fn next_completion(&mut self) -> Option<SyncOutcome> {
        loop {
            match self.in_flight.join_next().await? {
                Ok((seq, result)) => return Some(self.apply_response(seq, result)),
                Err(e) => error!("Path request task died: {}", e),
            }
        }
    }

    /// Process drag events and completions until the event stream closes
    /// and every in-flight request has settled.
    pub async fn run(mut self, mut events: mpsc::Receiver<DragEnd>) -> Self {
        let mut events_open = true;

        loop {
            tokio::select! {
                event = events.recv(), if events_open => match event {
                    Some(DragEnd { role, position }) => {
                        // Rejections are logged and leave everything as it was
                        let _ = self.on_endpoint_drag_end(role, position);
                    }
                    None => {
                        debug!("Drag event stream closed, {} request(s) in flight", self.pending());
                        events_open = false;
                    }
                },

                outcome = self.next_completion(), if self.pending() > 0 => {
                    debug!("Request settled: {:?}", outcome);
                }

                else => break,
            }
        }

        info!("Sync controller stopped after {} trigger(s)", self.last_issued);
        self
    }

    /// Requests still waiting for an answer
    pub fn pending(&self) -> usize {
        self.in_flight.len()
    }

    pub fn rendered_path(&self) -> &Path {
        &self.rendered
    }

    pub fn endpoints(&self) -> &EndpointState {
        &self.state
    }

    pub fn widget(&self) -> &W {
        &self.widget
    }

    pub fn last_issued(&self) -> u64 {
        self.last_issued
    }

    pub fn last_settled(&self) -> u64 {
        self.last_settled
    }
}
