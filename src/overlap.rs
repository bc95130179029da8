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

//! Exact overlap areas between hex cells and their candidate square cells, normalized into
//! coefficients.

use crate::errors::*;
use crate::geometry::{HexCell, HexCellId, SquareCell, SquareCellId};
use crossbeam::channel::Sender;
use fnv::FnvHashMap;
use geo::{Area, BooleanOps};
use log::warn;
use rayon::prelude::*;
use serde_derive::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What to do with a hex cell that overlaps no square cell by more than the minimum area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoOverlapPolicy {
    /// Emit no coefficients for the cell and list it in `CoefficientMapping::unmapped_cells`.
    Skip,
    /// Abort with `ErrorKind::NoOverlap`.
    Fail,
}

impl Default for NoOverlapPolicy {
    fn default() -> Self {
        NoOverlapPolicy::Skip
    }
}

/// The share of a hex cell's overlapping area that falls into one square cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Overlap {
    pub square: SquareCellId,
    pub coefficient: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlapRecord {
    pub hex_id: HexCellId,
    pub square: SquareCellId,
    pub coefficient: f64,
}

/// For every mapped hex cell, the square cells it overlaps and the coefficients, which sum to 1.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoefficientMapping {
    coefficients: BTreeMap<HexCellId, Vec<Overlap>>,
    unmapped: Vec<HexCellId>,
}

impl CoefficientMapping {
    pub fn get(&self, hex_id: HexCellId) -> Option<&[Overlap]> {
        self.coefficients.get(&hex_id).map(Vec::as_slice)
    }

    /// Number of hex cells with coefficients.
    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (HexCellId, &[Overlap])> {
        self.coefficients
            .iter()
            .map(|(hex_id, overlaps)| (*hex_id, overlaps.as_slice()))
    }

    pub fn records(&self) -> impl Iterator<Item = OverlapRecord> + '_ {
        self.iter().flat_map(|(hex_id, overlaps)| {
            overlaps.iter().map(move |overlap| OverlapRecord {
                hex_id,
                square: overlap.square,
                coefficient: overlap.coefficient,
            })
        })
    }

    /// Hex cells that were skipped because they overlap no square cell.
    pub fn unmapped_cells(&self) -> &[HexCellId] {
        &self.unmapped
    }

    /// Number of hex cells overlapping each square cell.
    pub fn square_cell_occupancy(&self) -> FnvHashMap<SquareCellId, usize> {
        let mut occupancy = FnvHashMap::default();
        for record in self.records() {
            *occupancy.entry(record.square).or_insert(0) += 1;
        }
        occupancy
    }

    /// The largest number of hex cells sharing one square cell. A fine enough grid keeps this low;
    /// a value above 3 means square cells are larger than hex cells.
    pub fn max_square_cell_occupancy(&self) -> usize {
        self.square_cell_occupancy()
            .values()
            .cloned()
            .max()
            .unwrap_or(0)
    }
}

/// Area of the intersection of the hex cell with the square cell. Cells that only touch along an
/// edge or in a corner have an intersection area of 0.
pub fn intersection_area(hex_cell: &HexCell, square_cell: &SquareCell) -> f64 {
    let hex_rect = hex_cell.bounding_rect();
    let square_rect = square_cell.rect();
    let overlap_x =
        hex_rect.max().x.min(square_rect.max().x) - hex_rect.min().x.max(square_rect.min().x);
    let overlap_y =
        hex_rect.max().y.min(square_rect.max().y) - hex_rect.min().y.max(square_rect.min().y);
    if overlap_x <= 0. || overlap_y <= 0. {
        return 0.;
    }
    if overlap_x == hex_rect.width() && overlap_y == hex_rect.height() {
        // The square cell contains the whole hex cell.
        return hex_cell.area();
    }
    hex_cell
        .boundary()
        .intersection(&square_cell.polygon())
        .unsigned_area()
}

/// Turns candidate pairs into overlap coefficients.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlapResolver {
    min_overlap_area: f64,
    no_overlap_policy: NoOverlapPolicy,
}

impl Default for OverlapResolver {
    fn default() -> Self {
        OverlapResolver {
            min_overlap_area: 0.,
            no_overlap_policy: NoOverlapPolicy::default(),
        }
    }
}

impl OverlapResolver {
    /// Square cells must overlap a hex cell by strictly more than `min_overlap_area` to receive a
    /// share of it.
    pub fn new(min_overlap_area: f64, no_overlap_policy: NoOverlapPolicy) -> Result<Self> {
        if !min_overlap_area.is_finite() || min_overlap_area < 0. {
            return Err(ErrorKind::InvalidMinOverlapArea(min_overlap_area).into());
        }
        Ok(OverlapResolver {
            min_overlap_area,
            no_overlap_policy,
        })
    }

    pub fn min_overlap_area(&self) -> f64 {
        self.min_overlap_area
    }

    pub fn no_overlap_policy(&self) -> NoOverlapPolicy {
        self.no_overlap_policy
    }

    /// `candidates[k]` holds the indices into `square_cells` to test against `hex_cells[k]`.
    pub fn resolve(
        &self,
        hex_cells: &[HexCell],
        square_cells: &[SquareCell],
        candidates: &[Vec<usize>],
    ) -> Result<CoefficientMapping> {
        self.resolve_with_progress(hex_cells, square_cells, candidates, None)
    }

    /// Like `resolve`, but sends one message to `progress` for every finished hex cell.
    pub fn resolve_with_progress(
        &self,
        hex_cells: &[HexCell],
        square_cells: &[SquareCell],
        candidates: &[Vec<usize>],
        progress: Option<&Sender<()>>,
    ) -> Result<CoefficientMapping> {
        if hex_cells.len() != candidates.len() {
            return Err(format!(
                "Got candidates for {} hex cells, but there are {} hex cells.",
                candidates.len(),
                hex_cells.len()
            )
            .into());
        }

        // The hex cells are independent, only the assembly below is sequential. This keeps the
        // result identical to a single threaded run.
        let per_hex_cell = hex_cells
            .par_iter()
            .zip(candidates.par_iter())
            .map(|(hex_cell, hex_candidates)| {
                let overlaps = self.resolve_hex_cell(hex_cell, square_cells, hex_candidates);
                if let Some(progress) = progress {
                    // A closed channel only means nobody is watching.
                    let _ = progress.send(());
                }
                overlaps
            })
            .collect::<Result<Vec<_>>>()?;

        let mut mapping = CoefficientMapping::default();
        for (hex_cell, overlaps) in hex_cells.iter().zip(per_hex_cell) {
            let hex_id = hex_cell.id();
            let overlaps = match overlaps {
                Some(overlaps) => overlaps,
                None => match self.no_overlap_policy {
                    NoOverlapPolicy::Skip => {
                        mapping.unmapped.push(hex_id);
                        continue;
                    }
                    NoOverlapPolicy::Fail => return Err(ErrorKind::NoOverlap(hex_id).into()),
                },
            };
            if mapping.coefficients.insert(hex_id, overlaps).is_some() {
                return Err(ErrorKind::DuplicateHexCell(hex_id).into());
            }
        }
        if !mapping.unmapped.is_empty() {
            warn!(
                "{} of {} hex cells overlap no square cell by more than {} and were skipped.",
                mapping.unmapped.len(),
                hex_cells.len(),
                self.min_overlap_area
            );
        }
        Ok(mapping)
    }

    /// Returns `None` if no candidate overlaps the hex cell by more than the minimum area.
    fn resolve_hex_cell(
        &self,
        hex_cell: &HexCell,
        square_cells: &[SquareCell],
        candidates: &[usize],
    ) -> Result<Option<Vec<Overlap>>> {
        let mut areas = Vec::with_capacity(candidates.len());
        for &index in candidates {
            let square_cell = square_cells.get(index).ok_or_else(|| {
                format!(
                    "Candidate index {} for hex cell {} is out of range.",
                    index,
                    hex_cell.id()
                )
            })?;
            let area = intersection_area(hex_cell, square_cell);
            if area > self.min_overlap_area {
                areas.push((square_cell.id, area));
            }
        }

        let total_area: f64 = areas.iter().map(|(_, area)| area).sum();
        if areas.is_empty() || total_area <= 0. {
            return Ok(None);
        }
        Ok(Some(
            areas
                .into_iter()
                .map(|(square, area)| Overlap {
                    square,
                    coefficient: area / total_area,
                })
                .collect(),
        ))
    }
}
