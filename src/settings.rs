use anyhow::{bail, ensure, Context, Result};
use clap::Parser;
use config::{Config, Environment, File};
use log::info;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::PathBuf;

use crate::demo::DemoConfig;
use crate::geom::Scalar;
use crate::scan::ScanConfig;


/// Runtime configuration of the detector build and the helix scan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Radii of the sensitive barrel layers in mm
    pub layer_radii: Vec<Scalar>,
    pub half_z: Scalar,
    pub sensor_thickness: Scalar,
    pub material_maps: bool,
    pub map_bins: (usize, usize),
    pub surface_grids: bool,
    pub finder_bins: usize,
    pub n_helices: usize,
    /// Momentum in GeV
    pub momentum: Scalar,
    pub charge: Scalar,
    /// Field along z in tesla
    pub b_field: Scalar,
    pub max_cos_theta: Scalar,
    pub mask_tolerance: Scalar,
    pub verbose_check: bool,
    pub seed: Option<u64>,
    /// Write the material maps to this file
    pub output: Option<PathBuf>,
}

impl Settings {
    /// The settings in the format of the configuration files.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).context("could not serialize settings")
    }

    pub fn demo_config(&self) -> DemoConfig {
        DemoConfig {
            layer_radii: self.layer_radii.clone(),
            half_z: self.half_z,
            sensor_thickness: self.sensor_thickness,
            use_material_maps: self.material_maps,
            map_bins: self.map_bins,
            surface_grids: self.surface_grids,
            finder_bins: self.finder_bins,
        }
    }

    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            n_helices: self.n_helices,
            momentum: self.momentum,
            charge: self.charge,
            b_field: self.b_field,
            max_cos_theta: self.max_cos_theta,
            mask_tolerance: self.mask_tolerance,
            seed: self.seed,
        }
    }
}

pub fn load_default_config() -> Result<Settings> {
    let root = retrieve_project_root()?;
    let default_config_file = root.join("config/default.toml");

    let settings = Config::builder()
        .add_source(File::from(default_config_file).required(true))
        .build()
        .context("could not load default configuration")?;

    let config: Settings = settings
        .try_deserialize()
        .context("could not deserialize default configuration")?;

    validate_config(&config)?;

    Ok(config)
}

/// Loads `config/local.toml` if present, else `config/default.toml`, then
/// applies `DETGEO_*` environment variables and command line arguments.
pub fn load_config() -> Result<Settings> {
    let root = retrieve_project_root()?;

    let default_config_file = root.join("config/default.toml");
    let local_config = root.join("config/local.toml");

    let config_file = if local_config.exists() {
        info!("using local configuration: {:?}", local_config);
        local_config
    } else {
        info!("using default configuration: {:?}", default_config_file);
        default_config_file
    };

    let settings = Config::builder()
        .add_source(File::from(config_file).required(true))
        .add_source(Environment::with_prefix("detgeo"))
        .build()
        .context("could not load configuration")?;

    let mut config: Settings = settings
        .try_deserialize()
        .context("could not deserialize configuration")?;

    apply_args(&mut config, CliArgs::parse());

    validate_config(&config)?;

    info!("{}", config);

    Ok(config)
}

fn apply_args(config: &mut Settings, args: CliArgs) {
    if let Some(radii) = args.radii {
        config.layer_radii = radii;
    }
    if let Some(half_z) = args.half_z {
        config.half_z = half_z;
    }
    if args.maps {
        config.material_maps = true;
    }
    if let Some(n) = args.helices {
        config.n_helices = n;
    }
    if let Some(p) = args.p {
        config.momentum = p;
    }
    if let Some(q) = args.q {
        config.charge = q;
    }
    if let Some(b) = args.b {
        config.b_field = b;
    }
    if let Some(tol) = args.tol {
        config.mask_tolerance = tol;
    }
    if args.verbose_check {
        config.verbose_check = true;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(output) = args.output {
        config.output = Some(output);
    }
}

/// Project root, holding the `config` directory.
///
/// Taken from `CARGO_MANIFEST_DIR` when run through cargo, else from
/// `DETGEO_ROOT_DIR`, else the nearest parent of the executable with a
/// `config` subdirectory.
fn retrieve_project_root() -> Result<PathBuf> {
    if let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") {
        return Ok(PathBuf::from(manifest_dir));
    }
    if let Ok(path) = env::var("DETGEO_ROOT_DIR") {
        return Ok(PathBuf::from(path));
    }

    let exe_path = env::current_exe().context("failed to get current executable path")?;
    let mut current_dir = exe_path.parent();
    while let Some(dir) = current_dir {
        if dir.join("config").is_dir() {
            return Ok(dir.to_path_buf());
        }
        current_dir = dir.parent();
    }
    bail!("could not find project root directory")
}

pub fn validate_config(config: &Settings) -> Result<()> {
    ensure!(!config.layer_radii.is_empty(), "at least one layer is needed");
    ensure!(
        config.layer_radii[0] > 0.0,
        "layer radii must be positive"
    );
    ensure!(
        config.layer_radii.windows(2).all(|w| w[0] < w[1]),
        "layer radii must be strictly increasing, got {:?}",
        config.layer_radii
    );
    ensure!(config.half_z > 0.0, "half length must be greater than 0");
    ensure!(
        config.sensor_thickness > 0.0,
        "sensor thickness must be greater than 0"
    );
    ensure!(
        config.map_bins.0 > 0 && config.map_bins.1 > 0,
        "material maps need at least one bin per axis"
    );
    ensure!(config.finder_bins > 0, "volume finder needs at least one bin");
    ensure!(config.momentum > 0.0, "momentum must be greater than 0");
    ensure!(
        (0.0..=1.0).contains(&config.max_cos_theta),
        "max cos(theta) must be in [0, 1]"
    );
    ensure!(
        config.mask_tolerance >= 0.0,
        "mask tolerance must not be negative"
    );
    Ok(())
}

#[derive(Parser, Debug)]
#[command(version, about = "detgeo - detector geometry consistency check and helix scan")]
pub struct CliArgs {
    /// Radii of the sensitive layers in mm, separated by spaces.
    #[arg(long, num_args = 1.., value_delimiter = ' ')]
    radii: Option<Vec<Scalar>>,

    /// Half length of the barrel in mm.
    #[arg(long)]
    half_z: Option<Scalar>,

    /// Attach material maps to the layers instead of homogeneous slabs.
    #[arg(long)]
    maps: bool,

    /// Number of helices to shoot.
    #[arg(long)]
    helices: Option<usize>,

    /// Momentum of the helices in GeV.
    #[arg(short)]
    p: Option<Scalar>,

    /// Charge of the helices in units of e.
    #[arg(short)]
    q: Option<Scalar>,

    /// Magnetic field along z in tesla.
    #[arg(short)]
    b: Option<Scalar>,

    /// Tolerance on the mask boundaries in mm.
    #[arg(long)]
    tol: Option<Scalar>,

    /// Report every empty store collection during the consistency check.
    #[arg(long)]
    verbose_check: bool,

    /// Random seed for the helix directions.
    #[arg(short, long)]
    seed: Option<u64>,

    /// Write the material maps as JSON to this file.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Settings:
  - Layer Radii: {:?}
  - Half Length: {}
  - Material Maps: {}
  - Helices: {}
  - Momentum: {} GeV
  - Charge: {}
  - B Field: {} T
  - Mask Tolerance: {}
  ",
            self.layer_radii,
            self.half_z,
            self.material_maps,
            self.n_helices,
            self.momentum,
            self.charge,
            self.b_field,
            self.mask_tolerance,
        )
    }
}
