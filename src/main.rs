//! # ngff-export
//!
//! A command-line tool for exporting images and plates to OME-NGFF.
//!
//! ## Usage
//!
//! ```bash
//! # Export an image directory (image.json + .npy planes) to ./<id>.zarr
//! ngff-export image ./image-42 -o .
//!
//! # Export a plate, caching fetched planes
//! ngff-export plate ./screen/plate.json -o out --cache
//!
//! # Generate demo data
//! ngff-export demo --plate -o demo
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::init_logging(cli.verbosity());
    cli::dispatch(cli)
}
