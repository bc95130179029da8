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

use crate::errors::*;
use crate::geometry::Extent;
use crate::grid::{GridKey, Resolution, SquareGrid};
use fnv::FnvHashMap;
use log::{debug, info, warn};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Mutex;

/// Keeps generated square grids around so that repeated runs for the same layer and resolution
/// do not need to regenerate them.
pub trait SquareGridStore: Send + Sync {
    /// Returns `None` if no grid is stored under `key`.
    fn load(&self, key: &GridKey) -> Result<Option<SquareGrid>>;

    fn save(&self, grid: &SquareGrid) -> Result<()>;
}

/// Stores each grid as one JSON file in `directory`.
pub struct OnDiskGridStore {
    pub directory: PathBuf,
}

impl OnDiskGridStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        OnDiskGridStore {
            directory: directory.into(),
        }
    }

    /// Returns the path on disk where the grid for `key` is saved. It is always a direct child of
    /// `directory`, whatever characters the layer contains.
    pub fn path(&self, key: &GridKey) -> PathBuf {
        self.directory.join(format!(
            "sq_cells_layer_{}_res_{}.json",
            encode_layer(&key.layer),
            key.resolution
        ))
    }
}

/// Escapes every byte outside `[A-Za-z0-9_-]` as `%XX`. Since `%` itself is escaped, distinct
/// layers always map to distinct file names.
fn encode_layer(layer: &str) -> String {
    let mut encoded = String::with_capacity(layer.len());
    for byte in layer.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' => {
                encoded.push(char::from(byte))
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

impl SquareGridStore for OnDiskGridStore {
    fn load(&self, key: &GridKey) -> Result<Option<SquareGrid>> {
        let path = self.path(key);
        let file = match File::open(&path) {
            Err(ref err) if err.kind() == ::std::io::ErrorKind::NotFound => return Ok(None),
            e => e,
        }
        .chain_err(|| format!("Could not open {}", path.display()))?;
        let grid: SquareGrid = serde_json::from_reader(BufReader::new(file))
            .chain_err(|| format!("Could not parse {}", path.display()))?;
        if grid.key() != *key {
            return Err(ErrorKind::GridMismatch(key.to_string(), grid.key().to_string()).into());
        }
        grid.validate()?;
        Ok(Some(grid))
    }

    fn save(&self, grid: &SquareGrid) -> Result<()> {
        fs::create_dir_all(&self.directory)
            .chain_err(|| format!("Could not create {}", self.directory.display()))?;
        let path = self.path(&grid.key());
        let mut buf_writer = BufWriter::new(
            File::create(&path).chain_err(|| format!("Could not create {}", path.display()))?,
        );
        serde_json::to_writer(&mut buf_writer, grid)?;
        buf_writer.flush()?;
        Ok(())
    }
}

/// Keeps grids only for the lifetime of the process.
#[derive(Default)]
pub struct InMemoryGridStore {
    grids: Mutex<FnvHashMap<GridKey, SquareGrid>>,
}

impl InMemoryGridStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.grids.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SquareGridStore for InMemoryGridStore {
    fn load(&self, key: &GridKey) -> Result<Option<SquareGrid>> {
        Ok(self.grids.lock().unwrap().get(key).cloned())
    }

    fn save(&self, grid: &SquareGrid) -> Result<()> {
        self.grids.lock().unwrap().insert(grid.key(), grid.clone());
        Ok(())
    }
}

/// Returns the grid for `layer` and `resolution` over `extent` from `store`, generating and saving
/// it if the store has none or only one laid over a different extent. Failures to load or save
/// are logged and otherwise ignored.
pub fn get_or_generate_grid(
    store: &dyn SquareGridStore,
    layer: &str,
    extent: &Extent,
    resolution: Resolution,
) -> Result<SquareGrid> {
    resolution.validate()?;
    let key = GridKey::new(layer, resolution);
    match store.load(&key) {
        Ok(Some(grid)) => {
            if grid.extent() == extent {
                info!("Reusing stored square grid {}.", key);
                return Ok(grid);
            }
            warn!(
                "Stored square grid {} covers {:?}, not {:?}. Regenerating it.",
                key,
                grid.extent(),
                extent
            );
        }
        Ok(None) => debug!("No stored square grid {}.", key),
        Err(Error(ErrorKind::GridMismatch(expected, found), _)) => warn!(
            "Stored square grid for {} is actually for {}. Regenerating it.",
            expected, found
        ),
        Err(err) => warn!(
            "Could not load stored square grid {}, regenerating it: {}",
            key, err
        ),
    }

    let grid = SquareGrid::generate(layer, extent, resolution)?;
    if let Err(err) = store.save(&grid) {
        warn!("Could not store square grid {}, continuing without: {}", key, err);
    }
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point2;
    use tempdir::TempDir;

    fn extent() -> Extent {
        Extent::new(Point2::new(-1.5, 2.25), Point2::new(7.125, 9.))
    }

    #[test]
    fn test_on_disk_round_trip_is_bit_identical() {
        let tmp_dir = TempDir::new("grid_store").unwrap();
        let store = OnDiskGridStore::new(tmp_dir.path().join("sq_cells_data"));
        let extent = Extent::new(Point2::new(-160.1, -153.3), Point2::new(159.7, 151.9));
        let grid = SquareGrid::generate("3", &extent, Resolution::new(13, 7)).unwrap();
        store.save(&grid).unwrap();
        assert!(store.path(&grid.key()).exists());

        let loaded = store.load(&grid.key()).unwrap().unwrap();
        assert_eq!(grid, loaded);
        for (a, b) in grid.cells().iter().zip(loaded.cells()) {
            assert_eq!(a.center.x.to_bits(), b.center.x.to_bits());
            assert_eq!(a.center.y.to_bits(), b.center.y.to_bits());
            assert_eq!(a.x_length.to_bits(), b.x_length.to_bits());
        }
    }

    #[test]
    fn test_on_disk_missing_grid() {
        let tmp_dir = TempDir::new("grid_store").unwrap();
        let store = OnDiskGridStore::new(tmp_dir.path());
        assert!(store
            .load(&GridKey::new("1", Resolution::new(4, 4)))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_on_disk_detects_mismatching_file() {
        let tmp_dir = TempDir::new("grid_store").unwrap();
        let store = OnDiskGridStore::new(tmp_dir.path());
        let grid = SquareGrid::generate("1", &extent(), Resolution::new(4, 4)).unwrap();
        store.save(&grid).unwrap();
        let other_key = GridKey::new("2", Resolution::new(4, 4));
        fs::copy(store.path(&grid.key()), store.path(&other_key)).unwrap();
        match store.load(&other_key) {
            Err(Error(ErrorKind::GridMismatch(..), _)) => (),
            other => panic!("Unexpected result {:?}", other),
        }

        // The wrapper treats this as a cache miss and overwrites the file.
        let regenerated =
            get_or_generate_grid(&store, "2", &extent(), Resolution::new(4, 4)).unwrap();
        assert_eq!(other_key, regenerated.key());
        assert_eq!(regenerated, store.load(&other_key).unwrap().unwrap());
    }

    #[test]
    fn test_get_or_generate_reuses_stored_grid() {
        let store = InMemoryGridStore::new();
        let first = get_or_generate_grid(&store, "5", &extent(), Resolution::new(6, 9)).unwrap();
        assert_eq!(1, store.len());
        let second = get_or_generate_grid(&store, "5", &extent(), Resolution::new(6, 9)).unwrap();
        assert_eq!(first, second);
        assert_eq!(1, store.len());

        get_or_generate_grid(&store, "5", &extent(), Resolution::new(7, 9)).unwrap();
        assert_eq!(2, store.len());
    }

    #[test]
    fn test_layer_is_encoded_in_file_name() {
        let tmp_dir = TempDir::new("grid_store").unwrap();
        let directory = tmp_dir.path().join("cache");
        let store = OnDiskGridStore::new(&directory);
        let resolution = Resolution::new(4, 4);
        for layer in &["EE/12", "../escaped", "a b%2F", "EE_12"] {
            let key = GridKey::new(*layer, resolution);
            let path = store.path(&key);
            assert_eq!(Some(directory.as_path()), path.parent());

            let grid = get_or_generate_grid(&store, layer, &extent(), resolution).unwrap();
            assert_eq!(key, grid.key());
            assert!(path.exists());
            assert_eq!(grid, store.load(&key).unwrap().unwrap());
        }
        assert_eq!(
            "sq_cells_layer_EE%2F12_res_4x4.json",
            store
                .path(&GridKey::new("EE/12", resolution))
                .file_name()
                .unwrap()
                .to_str()
                .unwrap()
        );
        assert_ne!(
            store.path(&GridKey::new("a/b", resolution)),
            store.path(&GridKey::new("a%2Fb", resolution))
        );
        assert_eq!(4, fs::read_dir(&directory).unwrap().count());
    }

    #[test]
    fn test_failed_save_still_returns_grid() {
        let tmp_dir = TempDir::new("grid_store").unwrap();
        // A plain file where the store expects its directory.
        let blocked = tmp_dir.path().join("not_a_directory");
        File::create(&blocked).unwrap();
        let store = OnDiskGridStore::new(&blocked);
        let grid = SquareGrid::generate("1", &extent(), Resolution::new(4, 4)).unwrap();
        assert!(store.save(&grid).is_err());

        let generated =
            get_or_generate_grid(&store, "1", &extent(), Resolution::new(4, 4)).unwrap();
        assert_eq!(grid, generated);
    }

    #[test]
    fn test_corrupt_stored_grid_is_regenerated() {
        let tmp_dir = TempDir::new("grid_store").unwrap();
        let store = OnDiskGridStore::new(tmp_dir.path());
        let key = GridKey::new("1", Resolution::new(3, 3));
        fs::write(store.path(&key), b"{ not json").unwrap();
        assert!(store.load(&key).is_err());

        let grid = get_or_generate_grid(&store, "1", &extent(), Resolution::new(3, 3)).unwrap();
        assert_eq!(grid, store.load(&key).unwrap().unwrap());
    }

    #[test]
    fn test_get_or_generate_regenerates_for_other_extent() {
        let store = InMemoryGridStore::new();
        let resolution = Resolution::new(3, 3);
        get_or_generate_grid(&store, "5", &extent(), resolution).unwrap();
        let other = Extent::new(Point2::new(0., 0.), Point2::new(1., 1.));
        let grid = get_or_generate_grid(&store, "5", &other, resolution).unwrap();
        assert_eq!(&other, grid.extent());
        let stored = store.load(&GridKey::new("5", resolution)).unwrap().unwrap();
        assert_eq!(&other, stored.extent());
    }

    #[test]
    fn test_get_or_generate_rejects_invalid_resolution_before_loading() {
        let store = InMemoryGridStore::new();
        match get_or_generate_grid(&store, "5", &extent(), Resolution::new(1, 3)) {
            Err(Error(ErrorKind::InvalidResolution(1, 3), _)) => (),
            other => panic!("Unexpected result {:?}", other),
        }
        assert!(store.is_empty());
    }
}
