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

//! Pruning of the hex cell / square cell pairs that need an exact intersection test.

use crate::geometry::{HexCell, SquareCell};
use nalgebra::Point2;
use rayon::prelude::*;
use rstar::primitives::GeomWithData;
use rstar::RTree;
use serde_derive::{Deserialize, Serialize};

type IndexedCenter = GeomWithData<[f64; 2], usize>;

/// How the radius around a hex cell center is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RadiusPolicy {
    /// One radius for all hex cells, large enough for the widest of them.
    Global,
    /// Every hex cell gets a radius from its own geometry. Prunes more, finds the same overlaps.
    PerCell,
}

impl Default for RadiusPolicy {
    fn default() -> Self {
        RadiusPolicy::Global
    }
}

/// The radius around a hex cell center within which any square cell overlapping the hex cell must
/// have its center.
pub fn search_radius(hex_cells: &[HexCell], square_cell_diagonal: f64) -> f64 {
    let max_reach = hex_cells.iter().map(HexCell::reach).fold(0., f64::max);
    max_reach + square_cell_diagonal / 2.
}

/// Spatial index over square cell centers.
pub struct CandidateFinder {
    tree: RTree<IndexedCenter>,
    max_square_cell_diagonal: f64,
}

impl CandidateFinder {
    pub fn new(square_cells: &[SquareCell]) -> Self {
        let centers = square_cells
            .iter()
            .enumerate()
            .map(|(index, cell)| GeomWithData::new([cell.center.x, cell.center.y], index))
            .collect();
        let max_square_cell_diagonal = square_cells
            .iter()
            .map(SquareCell::diagonal)
            .fold(0., f64::max);
        CandidateFinder {
            tree: RTree::bulk_load(centers),
            max_square_cell_diagonal,
        }
    }

    /// Indices of the square cells whose center is at most `radius` away from `center`, in no
    /// particular order.
    pub fn within(&self, center: &Point2<f64>, radius: f64) -> Vec<usize> {
        self.tree
            .locate_within_distance([center.x, center.y], radius * radius)
            .map(|indexed| indexed.data)
            .collect()
    }

    /// Candidate square cell indices for every hex cell, using `radius` for all of them.
    pub fn candidates(&self, hex_cells: &[HexCell], radius: f64) -> Vec<Vec<usize>> {
        hex_cells
            .par_iter()
            .map(|hex_cell| self.within(hex_cell.center(), radius))
            .collect()
    }

    /// Candidate square cell indices for every hex cell, each hex cell using the radius derived
    /// from its own reach.
    pub fn candidates_per_cell(&self, hex_cells: &[HexCell]) -> Vec<Vec<usize>> {
        let half_diagonal = self.max_square_cell_diagonal / 2.;
        hex_cells
            .par_iter()
            .map(|hex_cell| self.within(hex_cell.center(), hex_cell.reach() + half_diagonal))
            .collect()
    }

    pub fn candidates_with_policy(
        &self,
        hex_cells: &[HexCell],
        policy: RadiusPolicy,
    ) -> Vec<Vec<usize>> {
        match policy {
            RadiusPolicy::Global => {
                let radius = search_radius(hex_cells, self.max_square_cell_diagonal);
                self.candidates(hex_cells, radius)
            }
            RadiusPolicy::PerCell => self.candidates_per_cell(hex_cells),
        }
    }
}
