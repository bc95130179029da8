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

//! Where hex cell geometry comes from.

use crate::errors::*;
use crate::geometry::{HexCell, HexCellId};
use nalgebra::Point2;
use serde_derive::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

pub trait HexGeometrySource {
    /// All cells of one layer, sorted by id.
    fn hex_cells(&self) -> Result<Vec<HexCell>>;
}

/// One hex cell as it is written in a geometry file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HexCellRecord {
    pub id: HexCellId,
    pub center: [f64; 2],
    pub vertices: Vec<[f64; 2]>,
}

impl HexCellRecord {
    pub fn to_hex_cell(&self) -> Result<HexCell> {
        let vertices: Vec<_> = self
            .vertices
            .iter()
            .map(|v| Point2::new(v[0], v[1]))
            .collect();
        HexCell::new(
            self.id,
            Point2::new(self.center[0], self.center[1]),
            &vertices,
        )
    }
}

/// Validates the records and returns the cells sorted by id.
pub fn hex_cells_from_records(records: &[HexCellRecord]) -> Result<Vec<HexCell>> {
    let mut hex_cells = records
        .iter()
        .map(HexCellRecord::to_hex_cell)
        .collect::<Result<Vec<_>>>()?;
    hex_cells.sort_by_key(HexCell::id);
    for pair in hex_cells.windows(2) {
        if pair[0].id() == pair[1].id() {
            return Err(ErrorKind::DuplicateHexCell(pair[0].id()).into());
        }
    }
    Ok(hex_cells)
}

/// Reads a JSON array of `HexCellRecord`s.
pub struct JsonHexGeometrySource {
    pub path: PathBuf,
}

impl JsonHexGeometrySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonHexGeometrySource { path: path.into() }
    }
}

impl HexGeometrySource for JsonHexGeometrySource {
    fn hex_cells(&self) -> Result<Vec<HexCell>> {
        let file =
            File::open(&self.path).chain_err(|| format!("Could not open {}", self.path.display()))?;
        let records: Vec<HexCellRecord> = serde_json::from_reader(BufReader::new(file))
            .chain_err(|| format!("Could not parse {}", self.path.display()))?;
        hex_cells_from_records(&records)
    }
}
