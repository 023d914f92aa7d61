use std::sync::Arc;
use std::time::Duration;

use axum::{http::StatusCode, routing::get, Json, Router};
use route_sync::{
    handlers,
    libraries::{
        endpoint_state::EndpointState,
        map_widget::{HeadlessWidget, MapView},
        sync_controller::{SyncController, SyncOutcome, SyncSettings},
    },
    models::{Coordinate, EndpointRole, LatLng, Path, PathRequest, SyncError},
    services::{HttpPathClient, PathClient, PathProvider, StraightLineProvider},
};

fn coord(lat: f64, lng: f64) -> Coordinate {
    Coordinate::new(lat, lng).unwrap()
}

/// Serve `app` on an ephemeral local port and return its base URL
async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/", addr)
}

fn client(base_url: &str) -> HttpPathClient {
    HttpPathClient::new(base_url, "route-sync-tests", Duration::from_secs(5)).unwrap()
}

fn freiburg() -> EndpointState {
    EndpointState::new(coord(48.012653, 7.835194), coord(48.010683, 7.817760))
}

fn view() -> MapView {
    MapView {
        center: coord(48.012653, 7.835194),
        zoom: 15,
    }
}

fn controller(base_url: &str) -> SyncController<HttpPathClient, HeadlessWidget> {
    SyncController::new(
        freiburg(),
        Arc::new(client(base_url)),
        HeadlessWidget::new(),
        SyncSettings::default(),
    )
}

/// Inserts the midpoint between source and target
struct MidpointProvider;

impl PathProvider for MidpointProvider {
    fn path_between(&self, request: &PathRequest) -> Path {
        let mid = coord(
            (request.source.latitude() + request.target.latitude()) / 2.0,
            (request.source.longitude() + request.target.longitude()) / 2.0,
        );
        Path::new(vec![request.source, mid, request.target]).unwrap()
    }
}

#[tokio::test]
async fn drag_target_over_http_redraws_line() {
    let base_url = spawn_server(handlers::router(Arc::new(StraightLineProvider))).await;
    let mut ctl = controller(&base_url);
    let _events = ctl.attach(&view());

    ctl.on_endpoint_drag_end(EndpointRole::Target, LatLng::new(48.011000, 7.820000))
        .unwrap();
    assert_eq!(ctl.next_completion().await, Some(SyncOutcome::Applied { seq: 1 }));

    let expected = [coord(48.012653, 7.835194), coord(48.011, 7.82)];
    assert_eq!(ctl.rendered_path().points(), &expected);
    assert_eq!(ctl.widget().current_polyline(), Some(&expected[..]));
}

#[tokio::test]
async fn intermediate_points_are_drawn_in_order() {
    let base_url = spawn_server(handlers::router(Arc::new(MidpointProvider))).await;

    let request = PathRequest::new(coord(48.0, 7.8), coord(48.2, 8.0));
    let response = client(&base_url).request_path(request).await.unwrap();

    let points = response.path.points();
    assert_eq!(points.len(), 3);
    assert_eq!(points[0], coord(48.0, 7.8));
    assert!((points[1].latitude() - 48.1).abs() < 1e-9);
    assert!((points[1].longitude() - 7.9).abs() < 1e-9);
    assert_eq!(points[2], coord(48.2, 8.0));
}

#[tokio::test]
async fn malformed_response_keeps_last_good_line() {
    let app = Router::new().route(
        "/",
        get(|| async { Json(serde_json::json!({ "route": [48.0, 7.8, 48.1, 7.9] })) }),
    );
    let base_url = spawn_server(app).await;
    let mut ctl = controller(&base_url);
    let before = ctl.rendered_path().clone();

    ctl.on_endpoint_drag_end(EndpointRole::Source, LatLng::new(48.013, 7.836))
        .unwrap();

    match ctl.next_completion().await {
        Some(SyncOutcome::Failed {
            error: SyncError::MalformedResponse(_),
            ..
        }) => {}
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(ctl.rendered_path(), &before);
}

#[tokio::test]
async fn server_error_is_unavailable() {
    let app = Router::new().route("/", get(|| async { StatusCode::SERVICE_UNAVAILABLE }));
    let base_url = spawn_server(app).await;

    let request = PathRequest::new(coord(48.0, 7.8), coord(48.1, 7.9));
    let result = client(&base_url).request_path(request).await;

    assert!(matches!(result, Err(SyncError::PathServiceUnavailable(_))));
}

#[tokio::test]
async fn callback_envelope_is_understood() {
    let app = Router::new().route(
        "/",
        get(|| async { "redrawLineServerCallback({\"path\": [48.0, 7.8, 48.1, 7.9]})" }),
    );
    let base_url = spawn_server(app).await;

    let request = PathRequest::new(coord(48.0, 7.8), coord(48.1, 7.9));
    let response = client(&base_url).request_path(request).await.unwrap();

    assert_eq!(response.path, Path::direct(coord(48.0, 7.8), coord(48.1, 7.9)));
}

#[tokio::test]
async fn run_loop_settles_on_latest_drag() {
    let base_url = spawn_server(handlers::router(Arc::new(StraightLineProvider))).await;
    let widget = HeadlessWidget::new();
    let handles = widget.handles();
    let mut ctl = SyncController::new(
        freiburg(),
        Arc::new(client(&base_url)),
        widget,
        SyncSettings::default(),
    );
    let events = ctl.attach(&view());

    let driver = async {
        for step in 1..=5 {
            let lng = 7.82 + f64::from(step) * 0.001;
            handles
                .drag_end(EndpointRole::Target, LatLng::new(48.011, lng))
                .await
                .unwrap();
        }
        handles.release();
    };

    let (ctl, ()) = tokio::join!(ctl.run(events), driver);

    assert_eq!(ctl.last_issued(), 5);
    assert_eq!(ctl.last_settled(), 5);
    let end = ctl.rendered_path().end();
    assert_eq!(end, ctl.endpoints().position(EndpointRole::Target));
    assert!((end.longitude() - 7.825).abs() < 1e-9);
}
