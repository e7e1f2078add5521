// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the scanning engine.

use thiserror::Error;

use crate::analysis::AnalysisState;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Scan does not cover the room yet (up: {up}, down: {down}, horizontal: {horizontal})")]
    InsufficientCoverage {
        up: usize,
        down: usize,
        horizontal: usize,
    },

    #[error("No baked meshes to analyze")]
    NoMeshes,

    #[error("Analysis is still running ({0:?})")]
    AnalysisRunning(AnalysisState),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Configuration parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Reconstruction error: {0}")]
    Reconstruction(#[from] roomscan_geometry::Error),

    #[error("Matching error: {0}")]
    Matching(#[from] roomscan_matching::Error),
}
