// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! RoomScan demo: scans a simulated room and identifies it among a few
//! reference layouts.
//!
//! Configuration comes from `ROOMSCAN_*` environment variables, logging is
//! controlled with `RUST_LOG`.

use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use nalgebra::{Isometry3, Point3, Vector3};
use tracing_subscriber::EnvFilter;

use roomscan_core::Ray;
use roomscan_engine::{heading_direction, AnalysisState, RoomScanner, ScannerConfig, SimulatedSensor};
use roomscan_matching::{MatchOutcome, ReferenceRoom};

const FRAME: Duration = Duration::from_millis(100);
const MAX_FRAMES: u32 = 2_000;
const TURN_PER_FRAME_DEG: f64 = 12.0;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,roomscan_engine=debug")),
        )
        .init();

    let config = ScannerConfig::from_env().context("loading configuration")?;

    // A slightly larger room than the "office" layout, turned and moved away
    // from the origin.
    let dimensions = Vector3::new(4.05, 3.0, 3.1);
    let pose = Isometry3::new(Vector3::new(1.5, 0.0, -2.0), Vector3::y() * 30f64.to_radians());
    let sensor = SimulatedSensor::box_room(Point3::origin(), Point3::from(dimensions), 6, &pose)
        .with_reveal_per_poll(2)
        .with_failures(1);

    let references = vec![
        ReferenceRoom::new("office", Point3::origin(), Vector3::new(4.0, 3.0, 3.0)),
        ReferenceRoom::new("lab", Point3::origin(), Vector3::new(4.0, 3.0, 5.0)),
        ReferenceRoom::new("hall", Point3::origin(), Vector3::new(8.0, 3.5, 6.0)),
    ];
    let mut scanner = RoomScanner::new(config, sensor, references)?;

    let eye = pose * Point3::from(dimensions / 2.0);
    let start = Instant::now();
    let mut state = AnalysisState::Idle;
    for frame in 0..MAX_FRAMES {
        let heading = f64::from(frame) * TURN_PER_FRAME_DEG;
        let view = Ray::new(eye, heading_direction(heading, 0.0))?;
        state = scanner.tick(&view, start + FRAME * frame);
        if state.is_terminal() {
            tracing::info!(frame, "Analysis finished");
            break;
        }
    }

    let snapshot = scanner.snapshot();
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    match (state, scanner.outcome()) {
        (AnalysisState::Done, Some(MatchOutcome::Identified(found))) => {
            let shape = scanner.shape().context("identified without a shape")?;
            println!(
                "Identified '{}' (score {:.4}, rotated: {}), measured {:.2} x {:.2} x {:.2} m, yaw {:.1}°",
                found.best.name,
                found.best.score,
                found.best.rotated,
                shape.dimensions.x,
                shape.dimensions.y,
                shape.dimensions.z,
                found.alignment.yaw_deg(),
            );
        }
        (AnalysisState::Done, _) => println!("Room could not be identified"),
        (AnalysisState::Failed, _) => {
            let reason = scanner
                .analysis_error()
                .map_or_else(|| "unknown error".to_string(), |e| e.to_string());
            bail!("analysis failed: {reason}");
        }
        (state, _) => bail!("analysis did not finish within {MAX_FRAMES} frames (state {state:?})"),
    }
    Ok(())
}
