use std::time::Duration;

use color_eyre::Result;
use tracing::info;
use traffic_runtime::{ClientState, RenderProjector, RenderState, SimulationDriver, SimulationEngine};

fn lights_summary(render: &RenderState) -> String {
    render
        .lights
        .iter()
        .map(|(lane, phase)| format!("{lane}={}", phase.as_str()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Starts a simulation from the given lane inputs, logs every reconciled
/// snapshot that changed something until `duration` elapses, then stops.
pub async fn run<E: SimulationEngine>(
    mut driver: SimulationDriver<E>,
    mut state: ClientState,
    projector: &RenderProjector,
    duration: Duration,
) -> Result<()> {
    let planned = driver.start(&mut state)?;
    info!(planned, "headless.started");

    let deadline = tokio::time::Instant::now() + duration;
    while let Ok(Some(outcome)) =
        tokio::time::timeout_at(deadline, driver.next_snapshot(&mut state)).await
    {
        if outcome.is_quiet() {
            continue;
        }
        let render = state.render();
        for id in &outcome.entered {
            if let Some(record) = render.vehicle(id.as_str()) {
                let attributes = projector.project(record);
                info!(
                    id = %record.id,
                    vehicle_type = record.kind.wire_name(),
                    priority = record.priority,
                    z_index = attributes.z_index,
                    emphasis = ?attributes.emphasis,
                    "vehicle.entered"
                );
            }
        }
        info!(
            vehicles = render.vehicle_count(),
            entered = outcome.entered.len(),
            updated = outcome.updated.len(),
            departed = outcome.departed.len(),
            lights = %lights_summary(render),
            algorithm = %render.algorithm,
            "snapshot.applied"
        );
    }

    if let Some(report) = driver.join_dispatch().await {
        info!(
            sent = report.sent,
            failed = report.failed,
            skipped = report.skipped,
            "headless.dispatch_complete"
        );
    }
    driver.stop(&mut state)?;
    info!(
        snapshots = state.snapshots_applied(),
        vehicles = state.render().vehicle_count(),
        "headless.finished"
    );
    Ok(())
}
