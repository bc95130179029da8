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

//! Axis-aligned bounding rectangle of the hex cell centers.

use crate::errors::*;
use crate::geometry::HexCell;
use nalgebra::{Point2, Vector2};
use serde_derive::{Deserialize, Serialize};

/// An axis-aligned rectangle in the detector plane.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct Extent {
    mins: Point2<f64>,
    maxs: Point2<f64>,
}

impl Extent {
    pub fn new(mins: Point2<f64>, maxs: Point2<f64>) -> Self {
        Extent {
            mins: mins.inf(&maxs),
            maxs: mins.sup(&maxs),
        }
    }

    /// Returns the smallest extent containing all `points`, or `None` if there are none.
    pub fn bounding<'a>(points: impl IntoIterator<Item = &'a Point2<f64>>) -> Option<Self> {
        let mut extent: Option<Extent> = None;
        for p in points {
            extent.get_or_insert(Extent::new(*p, *p)).grow(*p);
        }
        extent
    }

    /// The extent of all hex cell centers, which is what the square grid is laid over.
    pub fn of_hex_centers(hex_cells: &[HexCell]) -> Result<Self> {
        Self::bounding(hex_cells.iter().map(HexCell::center))
            .ok_or_else(|| ErrorKind::EmptyGeometry.into())
    }

    pub fn min(&self) -> &Point2<f64> {
        &self.mins
    }

    pub fn max(&self) -> &Point2<f64> {
        &self.maxs
    }

    pub fn grow(&mut self, p: Point2<f64>) {
        self.mins = self.mins.inf(&p);
        self.maxs = self.maxs.sup(&p);
    }

    pub fn contains(&self, p: &Point2<f64>) -> bool {
        self.mins.x <= p.x && p.x <= self.maxs.x && self.mins.y <= p.y && p.y <= self.maxs.y
    }

    pub fn center(&self) -> Point2<f64> {
        nalgebra::center(&self.mins, &self.maxs)
    }

    pub fn diag(&self) -> Vector2<f64> {
        self.maxs - self.mins
    }
}
