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

//! The two kinds of cells: detector hex cells and square grid cells.

use crate::errors::*;
use geo::{coord, Area, BoundingRect, Coord, LineString, Polygon, Rect};
use nalgebra::Point2;
use serde_derive::{Deserialize, Serialize};
use std::fmt;

/// Hex cells with an area at or below this are rejected as degenerate.
pub const MIN_HEX_CELL_AREA: f64 = 1e-12;

/// The detector's identifier for one sensor cell.
#[derive(Debug, Hash, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HexCellId(pub u64);

impl fmt::Display for HexCellId {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// One sensor cell of a detector layer: a (nominally hexagonal) polygon with a center.
#[derive(Debug, Clone)]
pub struct HexCell {
    id: HexCellId,
    center: Point2<f64>,
    boundary: Polygon<f64>,
    area: f64,
}

impl HexCell {
    /// Builds a cell from the ordered ring of its vertices. The ring may or may not repeat the
    /// first vertex at the end.
    pub fn new(id: HexCellId, center: Point2<f64>, vertices: &[Point2<f64>]) -> Result<Self> {
        let exterior: LineString<f64> = vertices
            .iter()
            .map(|v| coord! { x: v.x, y: v.y })
            .collect::<Vec<Coord<f64>>>()
            .into();
        Self::from_polygon(id, center, Polygon::new(exterior, vec![]))
    }

    /// Fails with `DegenerateGeometry` if the polygon has fewer than three distinct vertices or
    /// (almost) no area. Self-intersections are not detected.
    pub fn from_polygon(
        id: HexCellId,
        center: Point2<f64>,
        boundary: Polygon<f64>,
    ) -> Result<Self> {
        if !center.x.is_finite() || !center.y.is_finite() {
            return Err(
                ErrorKind::DegenerateGeometry(id, "center is not finite".to_string()).into(),
            );
        }
        let mut distinct = boundary.exterior().0.clone();
        distinct.dedup();
        if distinct.len() > 1 && distinct.first() == distinct.last() {
            distinct.pop();
        }
        if distinct.len() < 3 {
            return Err(ErrorKind::DegenerateGeometry(
                id,
                format!("only {} distinct vertices", distinct.len()),
            )
            .into());
        }
        let area = boundary.unsigned_area();
        if area.is_nan() || area <= MIN_HEX_CELL_AREA {
            return Err(ErrorKind::DegenerateGeometry(id, format!("area is {}", area)).into());
        }
        Ok(HexCell {
            id,
            center,
            boundary,
            area,
        })
    }

    pub fn id(&self) -> HexCellId {
        self.id
    }

    pub fn center(&self) -> &Point2<f64> {
        &self.center
    }

    pub fn boundary(&self) -> &Polygon<f64> {
        &self.boundary
    }

    pub fn area(&self) -> f64 {
        self.area
    }

    pub fn bounding_rect(&self) -> Rect<f64> {
        // Unwrap is safe, the constructor guarantees at least three vertices.
        self.boundary.bounding_rect().unwrap()
    }

    /// The largest distance from the center to any vertex. No point of the cell is further away
    /// from the center than this.
    pub fn reach(&self) -> f64 {
        self.boundary
            .exterior()
            .coords()
            .map(|c| nalgebra::distance(&self.center, &Point2::new(c.x, c.y)))
            .fold(0., f64::max)
    }
}

/// Position of a square cell in the grid, `i` along x and `j` along y.
#[derive(Debug, Hash, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SquareCellId {
    pub i: usize,
    pub j: usize,
}

impl SquareCellId {
    pub fn new(i: usize, j: usize) -> Self {
        SquareCellId { i, j }
    }
}

impl fmt::Display for SquareCellId {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "({}, {})", self.i, self.j)
    }
}

/// An axis-aligned rectangular cell of the square grid. `x_length` and `y_length` are the full
/// width and height of the cell.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SquareCell {
    pub id: SquareCellId,
    pub center: Point2<f64>,
    pub x_length: f64,
    pub y_length: f64,
}

impl SquareCell {
    pub fn new(id: SquareCellId, center: Point2<f64>, x_length: f64, y_length: f64) -> Self {
        SquareCell {
            id,
            center,
            x_length,
            y_length,
        }
    }

    pub fn rect(&self) -> Rect<f64> {
        let half_x = self.x_length / 2.;
        let half_y = self.y_length / 2.;
        Rect::new(
            coord! { x: self.center.x - half_x, y: self.center.y - half_y },
            coord! { x: self.center.x + half_x, y: self.center.y + half_y },
        )
    }

    pub fn polygon(&self) -> Polygon<f64> {
        self.rect().to_polygon()
    }

    /// Length of the cell's diagonal.
    pub fn diagonal(&self) -> f64 {
        self.x_length.hypot(self.y_length)
    }

    pub fn area(&self) -> f64 {
        self.x_length * self.y_length
    }
}
