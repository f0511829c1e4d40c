use crate::error::{SimulationError, SimulationResult};
use crate::physics::field::octree::{DEFAULT_LEAF_CAPACITY, DEFAULT_MIN_REGION_SIZE, DEFAULT_THETA};
use crate::physics::math::{Scalar, Vector};
use bevy::log::{info, warn};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    pub integration: IntegrationConfig,
    pub space_charge: SpaceChargeConfig,
    pub field: FieldConfig,
    pub ions: Vec<IonGroupConfig>,
    pub start_zone: StartZoneConfig,
    pub background_gas: Option<BackgroundGasConfig>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            integration: IntegrationConfig::default(),
            space_charge: SpaceChargeConfig::default(),
            field: FieldConfig::default(),
            ions: vec![IonGroupConfig::default()],
            start_zone: StartZoneConfig::default(),
            background_gas: None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct IntegrationConfig {
    pub time_steps: usize,
    /// Time step length in s
    pub dt: Scalar,
    /// Parallel workers; 0 picks the available parallelism
    pub worker_count: usize,
    pub seed: Option<u64>,
    /// Steps between progress reports; 0 disables reporting
    pub report_interval: usize,
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            time_steps: 2000,
            dt: 1e-8,
            worker_count: 0,
            seed: None,
            report_interval: 100,
        }
    }
}

impl IntegrationConfig {
    pub fn effective_worker_count(&self) -> usize {
        if self.worker_count > 0 {
            self.worker_count
        } else {
            std::thread::available_parallelism().map_or(1, usize::from)
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum FieldSolver {
    /// Barnes-Hut approximation
    #[default]
    Octree,
    /// Exact pairwise sum
    FullSum,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SpaceChargeConfig {
    pub solver: FieldSolver,
    /// Scale applied to the space charge field; 0 turns space charge off
    pub factor: Scalar,
    pub octree_theta: Scalar,
    pub octree_leaf_capacity: usize,
    /// Smallest root region edge in m
    pub octree_min_region_size: Scalar,
}

impl Default for SpaceChargeConfig {
    fn default() -> Self {
        Self {
            solver: FieldSolver::Octree,
            factor: 1.0,
            octree_theta: DEFAULT_THETA,
            octree_leaf_capacity: DEFAULT_LEAF_CAPACITY,
            octree_min_region_size: DEFAULT_MIN_REGION_SIZE,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct FieldConfig {
    /// Homogeneous external field in V/m
    pub uniform_field: [Scalar; 3],
    /// Particles further than this from the origin along any axis splat, in m
    pub domain_half_extent: Scalar,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            uniform_field: [100.0, 0.0, 0.0],
            domain_half_extent: 0.01,
        }
    }
}

impl FieldConfig {
    pub fn uniform_field(&self) -> Vector {
        Vector::from_array(self.uniform_field)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct IonGroupConfig {
    pub count: usize,
    pub mass_amu: Scalar,
    pub charge_elementary: Scalar,
    pub diameter_angstrom: Scalar,
    /// Times of birth are spread uniformly over [0, time_of_birth_range) in s
    pub time_of_birth_range: Scalar,
}

impl Default for IonGroupConfig {
    fn default() -> Self {
        Self {
            count: 500,
            mass_amu: 100.0,
            charge_elementary: 1.0,
            diameter_angstrom: 5.0,
            time_of_birth_range: 0.0,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct StartZoneConfig {
    pub center: [Scalar; 3],
    pub size: [Scalar; 3],
}

impl Default for StartZoneConfig {
    fn default() -> Self {
        Self {
            center: [0.0; 3],
            size: [1e-3; 3],
        }
    }
}

impl StartZoneConfig {
    pub fn center(&self) -> Vector {
        Vector::from_array(self.center)
    }

    pub fn size(&self) -> Vector {
        Vector::from_array(self.size)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct BackgroundGasConfig {
    pub pressure_pa: Scalar,
    pub temperature_k: Scalar,
    pub gas_mass_amu: Scalar,
    pub gas_diameter_angstrom: Scalar,
}

impl Default for BackgroundGasConfig {
    fn default() -> Self {
        Self {
            pressure_pa: 1.0,
            temperature_k: 298.0,
            gas_mass_amu: 28.0,
            gas_diameter_angstrom: 3.7,
        }
    }
}

fn require(condition: bool, message: impl FnOnce() -> String) -> SimulationResult<()> {
    if condition {
        Ok(())
    } else {
        Err(SimulationError::InvalidConfiguration(message()))
    }
}

impl SimulationConfig {
    /// Parse a configuration, failing on unreadable or malformed files
    pub fn load(path: impl AsRef<Path>) -> SimulationResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from a file, falling back to defaults if the file doesn't exist
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!("Config file {} not found. Using defaults.", path.display());
            return Self::default();
        }

        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Failed to load config file {}: {}. Using defaults.", path.display(), e);
                Self::default()
            }
        }
    }

    /// Location of the per-user configuration file, if the platform has one
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "chargedrift")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    pub fn load_from_user_config() -> Self {
        match Self::user_config_path() {
            Some(path) => Self::load_or_default(path),
            None => {
                warn!("No user configuration directory available. Using defaults.");
                Self::default()
            }
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: impl AsRef<Path>) -> SimulationResult<()> {
        let content = self.to_toml()?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn to_toml(&self) -> SimulationResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> SimulationResult<()> {
        let integration = &self.integration;
        require(integration.dt.is_finite() && integration.dt > 0.0, || {
            format!("time step must be positive, got {}", integration.dt)
        })?;

        let space_charge = &self.space_charge;
        require(space_charge.factor.is_finite(), || {
            "space charge factor must be finite".to_string()
        })?;
        require(
            space_charge.octree_theta.is_finite() && space_charge.octree_theta >= 0.0,
            || format!("octree theta must be non-negative, got {}", space_charge.octree_theta),
        )?;
        require(space_charge.octree_leaf_capacity > 0, || {
            "octree leaf capacity must be at least 1".to_string()
        })?;
        let min_region_size = space_charge.octree_min_region_size;
        require(min_region_size.is_finite() && min_region_size > 0.0, || {
            "octree minimum region size must be positive".to_string()
        })?;

        require(
            self.field.uniform_field.iter().all(|c| c.is_finite()),
            || "uniform field must be finite".to_string(),
        )?;
        require(self.field.domain_half_extent > 0.0, || {
            format!("domain half extent must be positive, got {}", self.field.domain_half_extent)
        })?;

        for (index, group) in self.ions.iter().enumerate() {
            require(group.mass_amu > 0.0, || format!("ion group {index}: mass must be positive"))?;
            require(group.charge_elementary.is_finite(), || {
                format!("ion group {index}: charge must be finite")
            })?;
            require(group.diameter_angstrom >= 0.0, || {
                format!("ion group {index}: diameter must not be negative")
            })?;
            require(group.time_of_birth_range >= 0.0, || {
                format!("ion group {index}: time of birth range must not be negative")
            })?;
        }

        require(
            self.start_zone.size.iter().all(|s| s.is_finite() && *s >= 0.0),
            || "start zone size must be finite and non-negative".to_string(),
        )?;
        let half_extent = self.field.domain_half_extent;
        for axis in 0..3 {
            let reach = self.start_zone.center[axis].abs() + 0.5 * self.start_zone.size[axis];
            require(reach < half_extent, || {
                format!("start zone extends to {reach} m on axis {axis}, outside the domain")
            })?;
        }

        if let Some(gas) = &self.background_gas {
            require(gas.pressure_pa >= 0.0, || "gas pressure must not be negative".to_string())?;
            require(gas.temperature_k > 0.0, || "gas temperature must be positive".to_string())?;
            require(gas.gas_mass_amu > 0.0, || "gas mass must be positive".to_string())?;
            require(gas.gas_diameter_angstrom > 0.0, || {
                "gas diameter must be positive".to_string()
            })?;
        }

        Ok(())
    }
}
