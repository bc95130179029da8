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

use fnv::FnvHashMap;
use hex_to_square::errors::*;
use hex_to_square::{
    linear_interpolate_hex_to_square, HexCellId, HexGeometrySource, InMemoryGridStore,
    InterpolationParameters, JsonHexGeometrySource, NoOverlapPolicy, OnDiskGridStore,
    OverlapRecord, RadiusPolicy, Resolution, SquareGridStore,
};
use log::{error, info};
use serde_derive::Deserialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
#[structopt(name = "hex_to_square")]
struct CommandlineArguments {
    /// JSON file with the hex cells of one layer: a list of {"id", "center", "vertices"}.
    #[structopt(parse(from_os_str))]
    input: PathBuf,

    /// Layer identifier, only used to name the stored square grid.
    #[structopt(long = "layer", default_value = "1")]
    layer: String,

    /// Number of square grid points along x and y, e.g. 500x500 or 500.
    #[structopt(long = "resolution", default_value = "500x500")]
    resolution: Resolution,

    /// Square cells must overlap a hex cell by more than this area to get a coefficient.
    #[structopt(long = "min_overlap_area", default_value = "0.0")]
    min_overlap_area: f64,

    /// Directory to store generated square grids in for reuse. Grids are kept in memory only if
    /// this is not given.
    #[structopt(long = "grid_cache_dir", parse(from_os_str))]
    grid_cache_dir: Option<PathBuf>,

    /// Output JSON file for the overlap coefficients.
    #[structopt(long = "output", parse(from_os_str))]
    output: PathBuf,

    /// JSON file with per hex cell energies: a list of {"id", "energy"}.
    #[structopt(long = "energies", parse(from_os_str))]
    energies: Option<PathBuf>,

    /// Output JSON file for the energies redistributed onto the square grid.
    #[structopt(long = "raster_output", parse(from_os_str))]
    raster_output: Option<PathBuf>,

    /// Abort if a hex cell overlaps no square cell instead of skipping it.
    #[structopt(long = "fail_on_no_overlap")]
    fail_on_no_overlap: bool,

    /// Use a search radius per hex cell instead of one for the whole layer.
    #[structopt(long = "per_cell_radius")]
    per_cell_radius: bool,

    /// Do not show a progress bar.
    #[structopt(long = "no_progress")]
    no_progress: bool,
}

#[derive(Deserialize)]
struct HexCellEnergy {
    id: HexCellId,
    energy: f64,
}

fn read_energies(path: &Path) -> Result<FnvHashMap<HexCellId, f64>> {
    let file = File::open(path).chain_err(|| format!("Could not open {}", path.display()))?;
    let energies: Vec<HexCellEnergy> = serde_json::from_reader(BufReader::new(file))
        .chain_err(|| format!("Could not parse {}", path.display()))?;
    Ok(energies.into_iter().map(|e| (e.id, e.energy)).collect())
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut buf_writer = BufWriter::new(
        File::create(path).chain_err(|| format!("Could not create {}", path.display()))?,
    );
    serde_json::to_writer(&mut buf_writer, value)?;
    buf_writer.flush()?;
    Ok(())
}

fn run(args: CommandlineArguments) -> Result<()> {
    let parameters = InterpolationParameters {
        resolution: args.resolution,
        min_overlap_area: args.min_overlap_area,
        no_overlap_policy: if args.fail_on_no_overlap {
            NoOverlapPolicy::Fail
        } else {
            NoOverlapPolicy::Skip
        },
        radius_policy: if args.per_cell_radius {
            RadiusPolicy::PerCell
        } else {
            RadiusPolicy::Global
        },
        show_progress: !args.no_progress,
    };
    parameters.validate()?;

    let hex_cells = JsonHexGeometrySource::new(&args.input).hex_cells()?;
    info!("Read {} hex cells from {}.", hex_cells.len(), args.input.display());

    let store: Box<dyn SquareGridStore> = match args.grid_cache_dir {
        Some(ref directory) => Box::new(OnDiskGridStore::new(directory)),
        None => Box::new(InMemoryGridStore::new()),
    };
    let interpolation =
        linear_interpolate_hex_to_square(&hex_cells, &args.layer, &parameters, store.as_ref())?;

    let mapping = &interpolation.mapping;
    info!(
        "{} hex cells mapped, {} without overlap. At most {} hex cells share a square cell.",
        mapping.len(),
        mapping.unmapped_cells().len(),
        mapping.max_square_cell_occupancy()
    );
    let records: Vec<OverlapRecord> = mapping.records().collect();
    write_json(&args.output, &records)?;

    if let Some(ref energies_path) = args.energies {
        let energies = read_energies(energies_path)?;
        let raster = interpolation.interpolate_energies(&energies);
        info!(
            "Redistributed a total energy of {} onto the square grid.",
            raster.total()
        );
        match args.raster_output {
            Some(ref raster_path) => write_json(raster_path, &raster)?,
            None => info!("No --raster_output given, not writing the raster."),
        }
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = CommandlineArguments::from_args();
    if let Err(err) = run(args) {
        error!("{}", err);
        for cause in err.iter().skip(1) {
            error!("caused by: {}", cause);
        }
        std::process::exit(1);
    }
}
