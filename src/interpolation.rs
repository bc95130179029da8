// Copyright 2016 The Cartographer Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The full pipeline: extent, square grid, candidates and overlap coefficients, plus the
//! redistribution of hex cell energies onto the square grid.

use crate::candidates::{search_radius, CandidateFinder, RadiusPolicy};
use crate::errors::*;
use crate::geometry::{Extent, HexCell, HexCellId, SquareCellId};
use crate::grid::{get_or_generate_grid, Resolution, SquareGrid, SquareGridStore};
use crate::overlap::{CoefficientMapping, NoOverlapPolicy, OverlapResolver};
use fnv::FnvHashMap;
use log::{debug, info, warn};
use pbr::ProgressBar;
use serde_derive::{Deserialize, Serialize};
use std::io::Stdout;
use std::time::{Duration, Instant};

pub const PROGRESS_REFRESH_RATE_SECS: u64 = 2;

pub fn create_progress_bar(total: usize, message: &str) -> ProgressBar<Stdout> {
    let mut progress_bar = ProgressBar::new(total as u64);
    progress_bar.set_max_refresh_rate(Some(Duration::from_secs(PROGRESS_REFRESH_RATE_SECS)));
    progress_bar.message(&format!("{}: ", message));
    progress_bar
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpolationParameters {
    pub resolution: Resolution,
    pub min_overlap_area: f64,
    pub no_overlap_policy: NoOverlapPolicy,
    pub radius_policy: RadiusPolicy,
    pub show_progress: bool,
}

impl Default for InterpolationParameters {
    fn default() -> Self {
        InterpolationParameters {
            resolution: Resolution::default(),
            min_overlap_area: 0.,
            no_overlap_policy: NoOverlapPolicy::default(),
            radius_policy: RadiusPolicy::default(),
            show_progress: false,
        }
    }
}

impl InterpolationParameters {
    pub fn validate(&self) -> Result<()> {
        self.resolution.validate()?;
        self.overlap_resolver().map(|_| ())
    }

    fn overlap_resolver(&self) -> Result<OverlapResolver> {
        OverlapResolver::new(self.min_overlap_area, self.no_overlap_policy)
    }
}

/// Energy (or any other additive quantity) per square cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquareRaster {
    resolution: Resolution,
    values: Vec<f64>,
}

impl SquareRaster {
    fn zeros(resolution: Resolution) -> Self {
        SquareRaster {
            resolution,
            values: vec![0.; resolution.num_cells()],
        }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Values with `i` as the outer and `j` as the inner index, like the cells of a `SquareGrid`.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, id: SquareCellId) -> Option<f64> {
        if id.i < self.resolution.x && id.j < self.resolution.y {
            Some(self.values[id.i * self.resolution.y + id.j])
        } else {
            None
        }
    }

    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }
}

/// Result of mapping one layer of hex cells onto a square grid.
#[derive(Debug, Clone)]
pub struct Interpolation {
    pub grid: SquareGrid,
    pub mapping: CoefficientMapping,
}

impl Interpolation {
    /// Distributes the energy of every hex cell over the square cells it overlaps, weighted by the
    /// overlap coefficients. Energies of hex cells without coefficients are dropped.
    pub fn interpolate_energies(&self, energies: &FnvHashMap<HexCellId, f64>) -> SquareRaster {
        let mut raster = SquareRaster::zeros(self.grid.resolution());
        let mut num_dropped = 0;
        for (hex_id, energy) in energies {
            let overlaps = match self.mapping.get(*hex_id) {
                Some(overlaps) => overlaps,
                None => {
                    num_dropped += 1;
                    continue;
                }
            };
            for overlap in overlaps {
                if let Some(index) = self.grid.index_of(overlap.square) {
                    raster.values[index] += energy * overlap.coefficient;
                }
            }
        }
        if num_dropped > 0 {
            warn!(
                "Dropped the energy of {} hex cells that have no overlap coefficients.",
                num_dropped
            );
        }
        raster
    }
}

/// Computes the overlap coefficients of `hex_cells` with a square grid laid over the extent of
/// their centers. The grid is taken from `store` if it holds one for `layer` and the requested
/// resolution, otherwise it is generated and saved.
pub fn linear_interpolate_hex_to_square(
    hex_cells: &[HexCell],
    layer: &str,
    parameters: &InterpolationParameters,
    store: &dyn SquareGridStore,
) -> Result<Interpolation> {
    parameters.validate()?;
    let resolver = parameters.overlap_resolver()?;

    let start = Instant::now();
    let extent = Extent::of_hex_centers(hex_cells)?;
    info!(
        "Bounds of {} hex cells: {:?} to {:?}, computed in {:?}.",
        hex_cells.len(),
        extent.min(),
        extent.max(),
        start.elapsed()
    );
    let diag = extent.diag();
    if diag.x <= 0. || diag.y <= 0. {
        warn!(
            "Hex cell centers span no area ({} x {}), the square cells will have no area.",
            diag.x, diag.y
        );
    }

    let start = Instant::now();
    let grid = get_or_generate_grid(store, layer, &extent, parameters.resolution)?;
    info!(
        "Square grid {} with pitch {:?} ready in {:?}.",
        grid.key(),
        grid.pitch(),
        start.elapsed()
    );

    let start = Instant::now();
    let finder = CandidateFinder::new(grid.cells());
    if parameters.radius_policy == RadiusPolicy::Global {
        debug!(
            "Search radius is {}.",
            search_radius(hex_cells, grid.cell_diagonal())
        );
    }
    let candidates = finder.candidates_with_policy(hex_cells, parameters.radius_policy);
    info!(
        "Found {} candidate pairs in {:?}.",
        candidates.iter().map(Vec::len).sum::<usize>(),
        start.elapsed()
    );

    let start = Instant::now();
    let mapping = if parameters.show_progress {
        resolve_with_progress_bar(&resolver, hex_cells, &grid, &candidates)?
    } else {
        resolver.resolve(hex_cells, grid.cells(), &candidates)?
    };
    info!(
        "Overlap coefficients for {} hex cells computed in {:?}.",
        mapping.len(),
        start.elapsed()
    );
    Ok(Interpolation { grid, mapping })
}

fn resolve_with_progress_bar(
    resolver: &OverlapResolver,
    hex_cells: &[HexCell],
    grid: &SquareGrid,
    candidates: &[Vec<usize>],
) -> Result<CoefficientMapping> {
    let mut progress_bar = create_progress_bar(hex_cells.len(), "Calculating overlap coefficients");
    let (progress_tx, progress_rx) = crossbeam::channel::unbounded();
    let mapping = crossbeam::scope(|scope| {
        scope.spawn(|_| {
            for _ in progress_rx.iter() {
                progress_bar.inc();
            }
        });
        let mapping =
            resolver.resolve_with_progress(hex_cells, grid.cells(), candidates, Some(&progress_tx));
        drop(progress_tx);
        mapping
    })
    .map_err(|_| "Progress reporting thread panicked.")??;
    progress_bar.finish();
    Ok(mapping)
}
