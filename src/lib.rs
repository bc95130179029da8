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

//! Maps the hexagonal sensor cells of a detector layer onto a regular square grid. For every hex
//! cell, the square cells it overlaps are found and weighted by their share of the overlapping
//! area, so that per hex cell energies can be redistributed onto the square grid.

#![recursion_limit = "1024"]

#[macro_use]
extern crate error_chain;

pub mod candidates;
#[allow(deprecated)]
pub mod errors;
pub mod geometry;
pub mod grid;
pub mod interpolation;
pub mod overlap;
pub mod source;

pub use crate::candidates::{search_radius, CandidateFinder, RadiusPolicy};
pub use crate::geometry::{Extent, HexCell, HexCellId, SquareCell, SquareCellId};
pub use crate::grid::{
    get_or_generate_grid, GridKey, InMemoryGridStore, OnDiskGridStore, Resolution, SquareGrid,
    SquareGridStore,
};
pub use crate::interpolation::{
    linear_interpolate_hex_to_square, Interpolation, InterpolationParameters, SquareRaster,
};
pub use crate::overlap::{
    intersection_area, CoefficientMapping, NoOverlapPolicy, Overlap, OverlapRecord,
    OverlapResolver,
};
pub use crate::source::{HexCellRecord, HexGeometrySource, JsonHexGeometrySource};
