use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;

use crate::models::{Coordinate, EndpointRole, LatLng};

/// Initial map framing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapView {
    pub center: Coordinate,
    pub zoom: u8,
}

/// A marker was dropped at a new position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DragEnd {
    pub role: EndpointRole,
    pub position: LatLng,
}

/// The map component the controller draws on.
///
/// Only these operations are used; rendering details belong to the widget.
pub trait MapWidget {
    fn render(&mut self, view: &MapView);

    fn place_marker(&mut self, role: EndpointRole, position: Coordinate, draggable: bool);

    /// Replace the whole polyline with `points`, drawn in the given order
    fn set_polyline(&mut self, points: &[Coordinate]);

    /// Deliver every "drag ended" event for the marker to `sender`
    fn subscribe_drag_end(&mut self, role: EndpointRole, sender: mpsc::Sender<DragEnd>);

    /// Surface a transient message such as a failed path request
    fn show_notice(&mut self, _message: &str) {}
}

/// Handle for emitting drag events into whatever subscribed to a widget's
/// markers. Cloneable so it stays usable after the widget is moved.
#[derive(Debug, Clone, Default)]
pub struct MarkerHandles {
    senders: Arc<Mutex<HashMap<EndpointRole, mpsc::Sender<DragEnd>>>>,
}

impl MarkerHandles {
    fn register(&self, role: EndpointRole, sender: mpsc::Sender<DragEnd>) {
        if let Ok(mut senders) = self.senders.lock() {
            senders.insert(role, sender);
        }
    }

    /// Simulate the user dropping a marker
    pub async fn drag_end(&self, role: EndpointRole, position: LatLng) -> anyhow::Result<()> {
        let sender = self
            .senders
            .lock()
            .ok()
            .and_then(|senders| senders.get(&role).cloned())
            .ok_or_else(|| anyhow!("no subscriber for {} marker", role))?;

        sender
            .send(DragEnd { role, position })
            .await
            .map_err(|_| anyhow!("controller stopped listening to {} marker", role))
    }

    /// Drop all subscriptions, closing the event stream
    pub fn release(&self) {
        if let Ok(mut senders) = self.senders.lock() {
            senders.clear();
        }
    }
}

/// Widget without a screen: remembers and logs everything drawn on it.
#[derive(Debug, Default)]
pub struct HeadlessWidget {
    view: Option<MapView>,
    markers: HashMap<EndpointRole, Coordinate>,
    polylines: Vec<Vec<Coordinate>>,
    notices: Vec<String>,
    handles: MarkerHandles,
}

impl HeadlessWidget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handles(&self) -> MarkerHandles {
        self.handles.clone()
    }

    pub fn view(&self) -> Option<&MapView> {
        self.view.as_ref()
    }

    pub fn marker(&self, role: EndpointRole) -> Option<Coordinate> {
        self.markers.get(&role).copied()
    }

    /// Every polyline drawn so far, oldest first
    pub fn polylines(&self) -> &[Vec<Coordinate>] {
        &self.polylines
    }

    pub fn current_polyline(&self) -> Option<&[Coordinate]> {
        self.polylines.last().map(Vec::as_slice)
    }

    pub fn notices(&self) -> &[String] {
        &self.notices
    }
}

impl MapWidget for HeadlessWidget {
    fn render(&mut self, view: &MapView) {
        info!("🗺️ Rendering map at {} (zoom {})", view.center, view.zoom);
        self.view = Some(*view);
    }

    fn place_marker(&mut self, role: EndpointRole, position: Coordinate, draggable: bool) {
        info!("📍 {} marker at {} (draggable: {})", role, position, draggable);
        self.markers.insert(role, position);
    }

    fn set_polyline(&mut self, points: &[Coordinate]) {
        let rendered: Vec<String> = points.iter().map(ToString::to_string).collect();
        info!("Drawing line [{}]", rendered.join(" → "));
        self.polylines.push(points.to_vec());
    }

    fn subscribe_drag_end(&mut self, role: EndpointRole, sender: mpsc::Sender<DragEnd>) {
        self.handles.register(role, sender);
    }

    fn show_notice(&mut self, message: &str) {
        info!("Notice: {}", message);
        self.notices.push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_handles_forward_drag_events() {
        let mut widget = HeadlessWidget::new();
        let handles = widget.handles();
        let (tx, mut rx) = mpsc::channel(4);
        widget.subscribe_drag_end(EndpointRole::Target, tx);

        handles
            .drag_end(EndpointRole::Target, LatLng::new(48.011, 7.82))
            .await
            .unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.role, EndpointRole::Target);
        assert_eq!(event.position, LatLng::new(48.011, 7.82));

        // Nobody listens to the source marker
        assert!(handles
            .drag_end(EndpointRole::Source, LatLng::new(48.0, 7.8))
            .await
            .is_err());

        handles.release();
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn test_polyline_history() {
        let mut widget = HeadlessWidget::new();
        let a = Coordinate::new(48.0, 7.8).unwrap();
        let b = Coordinate::new(48.1, 7.9).unwrap();

        assert!(widget.current_polyline().is_none());
        widget.set_polyline(&[a, b]);
        widget.set_polyline(&[b, a]);

        assert_eq!(widget.polylines().len(), 2);
        assert_eq!(widget.current_polyline(), Some(&[b, a][..]));
    }
}
