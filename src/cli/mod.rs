use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use ngff_export::export::ExportOptions;
use ngff_export::pyramid::TARGET_SIZE;

mod config;
mod demo;
mod export;

pub use config::Config;

/// ngff-export - multiresolution OME-NGFF exporter for plane-addressable images
#[derive(Parser)]
#[command(name = "ngff-export")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every export command
#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    /// Directory receiving `<id>.zarr`
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    output: PathBuf,

    /// Cache fetched planes (under the output directory unless --cache-dir is given)
    #[arg(long)]
    cache: bool,

    /// Plane cache directory (implies --cache)
    #[arg(long, value_name = "DIR")]
    cache_dir: Option<PathBuf>,

    /// Square spatial chunk edge in pixels (default: whole planes)
    #[arg(long, value_name = "PIXELS")]
    chunk_size: Option<usize>,

    /// Largest extent of the smallest pyramid level (default: 96)
    #[arg(long = "min-size", value_name = "PIXELS")]
    min_size: Option<usize>,

    /// TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

impl ExportArgs {
    /// Combine flags with the config file; flags win.
    pub fn resolve(&self, config: &Config) -> ExportOptions {
        let file = &config.export;
        let cache_dir = self.cache_dir.clone().or_else(|| file.cache_dir.clone());
        let cache = self.cache || cache_dir.is_some() || file.cache.unwrap_or(false);

        ExportOptions {
            cache_dir: cache.then(|| cache_dir.unwrap_or_else(|| self.output.clone())),
            chunk_size: self.chunk_size.or(file.chunk_size),
            min_level_size: self
                .min_size
                .or(file.min_level_size)
                .unwrap_or(TARGET_SIZE),
            ..ExportOptions::default()
        }
    }

    /// Load the config file, if any, and resolve the export options
    pub fn options(&self) -> Result<ExportOptions> {
        let config = Config::load(self.config.as_deref())?;
        Ok(self.resolve(&config))
    }

    pub fn output(&self) -> &PathBuf {
        &self.output
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Export an image directory (image.json + .npy planes)
    Image {
        /// Image directory
        #[arg(value_name = "DIR")]
        input: PathBuf,

        #[command(flatten)]
        export: ExportArgs,
    },

    /// Export a plate described by a plate.json file
    Plate {
        /// Plate descriptor file
        #[arg(value_name = "PLATE_JSON")]
        input: PathBuf,

        #[command(flatten)]
        export: ExportArgs,
    },

    /// Export generated demo data
    Demo {
        /// Generate a plate instead of a single image
        #[arg(long)]
        plate: bool,

        /// Width and height of the generated planes
        #[arg(long, default_value = "512")]
        size: usize,

        /// Number of focal planes (single image only)
        #[arg(long = "size-z", default_value = "1")]
        size_z: usize,

        /// Number of channels (single image only)
        #[arg(long = "size-c", default_value = "2")]
        size_c: usize,

        /// Number of timepoints (single image only)
        #[arg(long = "size-t", default_value = "1")]
        size_t: usize,

        #[command(flatten)]
        export: ExportArgs,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Image { input, export } => export::run_image(input, &export),
        Commands::Plate { input, export } => export::run_plate(input, &export),
        Commands::Demo {
            plate,
            size,
            size_z,
            size_c,
            size_t,
            export,
        } => demo::run(plate, size, size_z, size_c, size_t, &export),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_export(args: &[&str]) -> ExportArgs {
        let mut argv = vec!["ngff-export", "image", "in"];
        argv.extend_from_slice(args);
        match Cli::parse_from(argv).command {
            Commands::Image { export, .. } => export,
            _ => unreachable!("parsed the image command"),
        }
    }

    #[test]
    fn test_defaults() {
        let options = parse_export(&[]).resolve(&Config::default());
        assert_eq!(options.cache_dir, None);
        assert_eq!(options.chunk_size, None);
        assert_eq!(options.min_level_size, TARGET_SIZE);
    }

    #[test]
    fn test_cache_flag_uses_output_dir() {
        let options = parse_export(&["--cache", "-o", "/out"]).resolve(&Config::default());
        assert_eq!(options.cache_dir, Some(PathBuf::from("/out")));
    }

    #[test]
    fn test_flags_override_config() {
        let config = Config::from_str(
            r#"
            [export]
            chunk_size = 256
            min_level_size = 64
            cache_dir = "/planes"
            "#,
        )
        .unwrap();

        let options = parse_export(&["--chunk-size", "128"]).resolve(&config);
        assert_eq!(options.chunk_size, Some(128));
        assert_eq!(options.min_level_size, 64);
        assert_eq!(options.cache_dir, Some(PathBuf::from("/planes")));
    }

    #[test]
    fn test_config_cache_switch() {
        let config = Config::from_str("[export]\ncache = true").unwrap();
        let options = parse_export(&["-o", "/out"]).resolve(&config);
        assert_eq!(options.cache_dir, Some(PathBuf::from("/out")));
    }
}
