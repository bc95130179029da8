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

//! Generation of the square grid laid over the extent of a hex cell layer.

mod store;

pub use self::store::*;

use crate::errors::*;
use crate::geometry::{Extent, SquareCell, SquareCellId};
use nalgebra::{Point2, Vector2};
use serde_derive::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of grid points along each axis. The grid spans the extent edge to edge, so a resolution
/// of `n` yields `n - 1` pitches between the first and the last cell center.
#[derive(Debug, Hash, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub x: usize,
    pub y: usize,
}

impl Resolution {
    pub fn new(x: usize, y: usize) -> Self {
        Resolution { x, y }
    }

    /// At least 2 points per axis, and few enough cells to count them in a `usize`.
    pub fn validate(&self) -> Result<()> {
        if self.x < 2 || self.y < 2 || self.checked_num_cells().is_none() {
            return Err(ErrorKind::InvalidResolution(self.x, self.y).into());
        }
        Ok(())
    }

    pub fn checked_num_cells(&self) -> Option<usize> {
        self.x.checked_mul(self.y)
    }

    /// Saturates for resolutions that fail `validate`.
    pub fn num_cells(&self) -> usize {
        self.x.saturating_mul(self.y)
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Resolution::new(500, 500)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "{}x{}", self.x, self.y)
    }
}

impl FromStr for Resolution {
    type Err = Error;

    /// Parses "500x400", or "500" for a resolution that is equal along both axes.
    fn from_str(s: &str) -> Result<Self> {
        let parse = |value: &str| {
            value
                .trim()
                .parse::<usize>()
                .chain_err(|| format!("Invalid resolution '{}'", s))
        };
        let resolution = match s.find('x') {
            Some(pos) => Resolution::new(parse(&s[..pos])?, parse(&s[pos + 1..])?),
            None => {
                let r = parse(s)?;
                Resolution::new(r, r)
            }
        };
        resolution.validate()?;
        Ok(resolution)
    }
}

/// Identifies a square grid in a `SquareGridStore`.
#[derive(Debug, Hash, Clone, PartialEq, Eq)]
pub struct GridKey {
    pub layer: String,
    pub resolution: Resolution,
}

impl GridKey {
    pub fn new(layer: impl Into<String>, resolution: Resolution) -> Self {
        GridKey {
            layer: layer.into(),
            resolution,
        }
    }
}

impl fmt::Display for GridKey {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "layer_{}_res_{}", self.layer, self.resolution)
    }
}

/// The square cells of one layer, stored with `i` as the outer and `j` as the inner index.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SquareGrid {
    layer: String,
    extent: Extent,
    resolution: Resolution,
    cells: Vec<SquareCell>,
}

impl SquareGrid {
    /// Lays a `resolution.x` by `resolution.y` grid over `extent`. Cell centers sit on the grid
    /// points, so the corner cells are centered on the corners of the extent.
    pub fn generate(layer: &str, extent: &Extent, resolution: Resolution) -> Result<Self> {
        resolution.validate()?;
        let pitch = Self::pitch_for(extent, resolution);
        let min = extent.min();
        let mut cells = Vec::with_capacity(resolution.num_cells());
        for i in 0..resolution.x {
            for j in 0..resolution.y {
                let center = Point2::new(min.x + i as f64 * pitch.x, min.y + j as f64 * pitch.y);
                cells.push(SquareCell::new(
                    SquareCellId::new(i, j),
                    center,
                    pitch.x,
                    pitch.y,
                ));
            }
        }
        Ok(SquareGrid {
            layer: layer.to_string(),
            extent: *extent,
            resolution,
            cells,
        })
    }

    fn pitch_for(extent: &Extent, resolution: Resolution) -> Vector2<f64> {
        let diag = extent.diag();
        Vector2::new(
            diag.x / (resolution.x - 1) as f64,
            diag.y / (resolution.y - 1) as f64,
        )
    }

    pub fn key(&self) -> GridKey {
        GridKey::new(self.layer.clone(), self.resolution)
    }

    pub fn layer(&self) -> &str {
        &self.layer
    }

    pub fn extent(&self) -> &Extent {
        &self.extent
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Width and height of every cell.
    pub fn pitch(&self) -> Vector2<f64> {
        Self::pitch_for(&self.extent, self.resolution)
    }

    /// Length of the diagonal of one cell.
    pub fn cell_diagonal(&self) -> f64 {
        self.pitch().norm()
    }

    pub fn cells(&self) -> &[SquareCell] {
        &self.cells
    }

    pub fn index_of(&self, id: SquareCellId) -> Option<usize> {
        if id.i < self.resolution.x && id.j < self.resolution.y {
            Some(id.i * self.resolution.y + id.j)
        } else {
            None
        }
    }

    pub fn cell(&self, id: SquareCellId) -> Option<&SquareCell> {
        self.index_of(id).map(|index| &self.cells[index])
    }

    /// Checks the invariants a grid read back from a store must satisfy.
    pub(crate) fn validate(&self) -> Result<()> {
        self.resolution.validate()?;
        if self.cells.len() != self.resolution.num_cells() {
            return Err(format!(
                "Square grid {} has {} cells, expected {}.",
                self.key(),
                self.cells.len(),
                self.resolution.num_cells()
            )
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ten_by_ten() -> Extent {
        Extent::new(Point2::new(0., 0.), Point2::new(10., 10.))
    }

    #[test]
    fn test_corner_cells_sit_on_extent_corners() {
        for &r in &[2, 3, 11, 50] {
            let grid = SquareGrid::generate("1", &ten_by_ten(), Resolution::new(r, r)).unwrap();
            let first = grid.cell(SquareCellId::new(0, 0)).unwrap();
            let last = grid.cell(SquareCellId::new(r - 1, r - 1)).unwrap();
            assert_eq!(Point2::new(0., 0.), first.center);
            assert_relative_eq!(last.center.x, 10., epsilon = 1e-12);
            assert_relative_eq!(last.center.y, 10., epsilon = 1e-12);
            let expected_pitch = 10. / (r - 1) as f64;
            assert_eq!(expected_pitch, grid.pitch().x);
            assert_eq!(expected_pitch, first.x_length);
            assert_eq!(expected_pitch, last.y_length);
            assert_eq!(r * r, grid.cells().len());
        }
    }

    #[test]
    fn test_non_square_resolution() {
        let extent = Extent::new(Point2::new(-4., 1.), Point2::new(4., 3.));
        let grid = SquareGrid::generate("ee", &extent, Resolution::new(5, 3)).unwrap();
        assert_eq!(Vector2::new(2., 1.), grid.pitch());
        let cell = grid.cell(SquareCellId::new(3, 1)).unwrap();
        assert_eq!(SquareCellId::new(3, 1), cell.id);
        assert_eq!(Point2::new(2., 2.), cell.center);
        assert_eq!(None, grid.cell(SquareCellId::new(5, 0)));
        assert_eq!(None, grid.cell(SquareCellId::new(0, 3)));
    }

    #[test]
    fn test_generation_is_deterministic() {
        let extent = Extent::new(Point2::new(-160.3, -151.7), Point2::new(158.9, 149.2));
        let a = SquareGrid::generate("9", &extent, Resolution::new(37, 41)).unwrap();
        let b = SquareGrid::generate("9", &extent, Resolution::new(37, 41)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_parse_resolution() {
        assert_eq!(Resolution::new(500, 400), "500x400".parse::<Resolution>().unwrap());
        assert_eq!(Resolution::new(64, 64), "64".parse::<Resolution>().unwrap());
        assert!("1x5".parse::<Resolution>().is_err());
        assert!("ax5".parse::<Resolution>().is_err());
        assert!("".parse::<Resolution>().is_err());
        assert!("4294967296x4294967296".parse::<Resolution>().is_err());
    }

    #[test]
    fn test_overflowing_resolution_is_rejected() {
        let huge = Resolution::new(usize::max_value() / 2 + 1, 2);
        assert_eq!(None, huge.checked_num_cells());
        assert_eq!(usize::max_value(), huge.num_cells());
        match SquareGrid::generate("1", &ten_by_ten(), huge) {
            Err(Error(ErrorKind::InvalidResolution(x, 2), _)) => assert_eq!(huge.x, x),
            other => panic!("Unexpected result {:?}", other.map(|grid| grid.resolution())),
        }
        assert!(Resolution::new(usize::max_value() / 2, 2).validate().is_ok());
    }

    #[test]
    fn test_invalid_resolution_is_rejected() {
        for &(x, y) in &[(1, 5), (5, 1), (0, 0)] {
            match SquareGrid::generate("1", &ten_by_ten(), Resolution::new(x, y)) {
                Err(Error(ErrorKind::InvalidResolution(rx, ry), _)) => {
                    assert_eq!((x, y), (rx, ry))
                }
                other => panic!("Unexpected result {:?}", other),
            }
        }
    }
}
