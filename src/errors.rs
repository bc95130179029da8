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

use crate::geometry::HexCellId;
use std::io;

error_chain! {
    foreign_links {
        Io(io::Error);
        Json(serde_json::Error);
    }

    errors {
        InvalidResolution(x: usize, y: usize) {
            description("invalid grid resolution")
            display("Grid resolution must be at least 2 along each axis, got {}x{}.", x, y)
        }

        InvalidMinOverlapArea(value: f64) {
            description("invalid minimum overlap area")
            display("Minimum overlap area must be a finite, non-negative number, got {}.", value)
        }

        NoOverlap(hex_id: HexCellId) {
            description("hex cell does not overlap any square cell")
            display("Hex cell {} has no square cell overlapping it with positive area.", hex_id)
        }

        DegenerateGeometry(hex_id: HexCellId, reason: String) {
            description("degenerate hex cell geometry")
            display("Hex cell {} has degenerate geometry: {}.", hex_id, reason)
        }

        DuplicateHexCell(hex_id: HexCellId) {
            description("duplicate hex cell id")
            display("Hex cell {} was supplied more than once.", hex_id)
        }

        EmptyGeometry {
            description("no hex cells")
            display("The hex geometry contains no cells, cannot compute its extent.")
        }

        GridMismatch(expected: String, found: String) {
            description("stored square grid does not match the request")
            display("Stored square grid is for {}, but {} was requested.", found, expected)
        }
    }
}
