//! Replays marker drops against a running path service.
//!
//! Usage: `replay_drags target:48.011,7.82 source:48.013,7.836 ...`

use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use tracing::info;

use route_sync::{
    config::Config,
    libraries::{map_widget::HeadlessWidget, sync_controller::SyncController},
    logging,
    models::{EndpointRole, LatLng},
    services::HttpPathClient,
};

fn parse_drag(arg: &str) -> anyhow::Result<(EndpointRole, LatLng)> {
    let (role, position) = arg
        .split_once(':')
        .ok_or_else(|| anyhow!("expected ROLE:LAT,LNG, got {:?}", arg))?;

    let role = match role {
        "source" => EndpointRole::Source,
        "target" => EndpointRole::Target,
        other => bail!("unknown marker {:?} (use source or target)", other),
    };

    let (lat, lng) = position
        .split_once(',')
        .ok_or_else(|| anyhow!("expected LAT,LNG, got {:?}", position))?;

    Ok((
        role,
        LatLng::new(
            lat.trim().parse().context("latitude")?,
            lng.trim().parse().context("longitude")?,
        ),
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init("route_sync=info,replay_drags=info");
    dotenv::dotenv().ok();
    let config = Config::from_env().context("Failed to load configuration")?;

    let drags = std::env::args()
        .skip(1)
        .map(|arg| parse_drag(&arg))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let client = HttpPathClient::new(
        &config.path_service_url,
        &config.user_agent,
        config.request_timeout(),
    )?;

    let widget = HeadlessWidget::new();
    let handles = widget.handles();
    let mut controller = SyncController::new(
        config.endpoints()?,
        Arc::new(client),
        widget,
        config.sync_settings(),
    );
    let events = controller.attach(&config.map_view()?);

    info!("Replaying {} drag(s) against {}", drags.len(), config.path_service_url);

    let driver = async {
        let mut result: anyhow::Result<()> = Ok(());
        for (role, position) in drags {
            if let Err(e) = handles.drag_end(role, position).await {
                result = Err(e);
                break;
            }
        }
        // Closing the stream lets the controller finish
        handles.release();
        result
    };

    let (controller, driven) = tokio::join!(controller.run(events), driver);
    driven?;

    let points: Vec<String> = controller
        .rendered_path()
        .points()
        .iter()
        .map(ToString::to_string)
        .collect();
    println!("{}", points.join(" "));

    for notice in controller.widget().notices() {
        eprintln!("{}", notice);
    }

    Ok(())
}
