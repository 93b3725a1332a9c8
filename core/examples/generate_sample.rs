//! Generate a small synthetic dataset in the expected HDF5 layout, then load
//! it back through the engine and print a summary.
//!
//! Run with: `cargo run --example generate_sample`

use std::str::FromStr;

use anyhow::{Context, Result};
use dataview_core::{PlotSelection, PlotSession};
use hdf5::types::VarLenUnicode;
use ndarray::{Array1, Array3, ArrayView1};
use rand::Rng;

const PATH: &str = "sample.hdf5";

fn str_attr(value: &str) -> Result<VarLenUnicode> {
    VarLenUnicode::from_str(value).context("attribute string is not valid utf-8")
}

fn main() -> Result<()> {
    let mut rng = rand::thread_rng();

    // A drifting Gaussian pulse over x, widening with y, repeated per shot.
    let (nx, ny, nshots) = (64, 32, 8);
    let mut data = Array3::<f64>::zeros((nx, ny, nshots));
    for ((i, j, s), value) in data.indexed_iter_mut() {
        let x = i as f64 / (nx - 1) as f64;
        let y = j as f64 / (ny - 1) as f64;
        let center = 0.3 + 0.4 * y;
        let width = 0.05 + 0.1 * y;
        let pulse = (-0.5 * ((x - center) / width).powi(2)).exp();
        *value = pulse + rng.gen_range(-0.02..0.02) + 0.05 * s as f64;
    }

    let file = hdf5::File::create(PATH).context("creating sample file")?;
    let dataset = file
        .new_dataset_builder()
        .with_data(&data)
        .create("data")
        .context("writing data")?;
    let names: Vec<VarLenUnicode> = ["x", "y", "shot"]
        .iter()
        .map(|n| str_attr(n))
        .collect::<Result<_>>()?;
    dataset
        .new_attr::<VarLenUnicode>()
        .shape((names.len(),))
        .create("dimensions")?
        .write(ArrayView1::from(names.as_slice()))?;
    dataset
        .new_attr::<VarLenUnicode>()
        .create("unit")?
        .write_scalar(&str_attr("V")?)?;

    for (name, len, unit, scale) in [
        ("x", nx, "cm", 2.5),
        ("y", ny, "cm", 1.0),
        ("shot", nshots, "", 1.0),
    ] {
        let coords = Array1::linspace(0.0, scale * (len - 1) as f64, len);
        let axis = file.new_dataset_builder().with_data(&coords).create(name)?;
        axis.new_attr::<VarLenUnicode>()
            .create("unit")?
            .write_scalar(&str_attr(unit)?)?;
    }
    drop(file);
    println!("wrote {PATH} with shape ({nx}, {ny}, {nshots})");

    // Round-trip through the engine: average the shot axis, image over x/y.
    let mut session = PlotSession::new();
    session.load_file(PATH)?;
    session
        .registry_mut()
        .axis_mut(2)
        .context("dataset has no shot axis")?
        .set_average(true);

    match session.refresh(&PlotSelection::image(0, 1)) {
        Some(bundle) => println!(
            "assembled {:?} block, data range ({:.3}, {:.3})",
            bundle.data.shape(),
            bundle.data_range.0,
            bundle.data_range.1
        ),
        None => println!(
            "no plot: {}",
            session.warning().unwrap_or("unknown failure")
        ),
    }

    Ok(())
}
