//! Generation rules read from a TOML key/value file.

use std::io;

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_MAIN_PATH_ATTEMPTS: u32 = 100;
pub const DEFAULT_BRANCHES_PER_DOOR_LEVEL: u32 = 2;
pub const DEFAULT_DOOR_SPACING: u32 = 2;

#[derive(Debug, Error)]
pub enum RulesError {
    #[error("could not read rules '{name}': {source}")]
    Io {
        name: String,
        #[source]
        source: io::Error,
    },
    #[error("could not parse rules '{name}': {source}")]
    Parse {
        name: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Raw rules as written. Zero lengths mean "derive from the grid size".
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub doors_max: u32,
    pub main_path_length_min: u32,
    pub main_path_length_max: u32,
    pub main_path_attempts_max: u32,
    pub branch_length_min: u32,
    pub branch_length_max: u32,
    pub branches_per_door_level_max: u32,
    pub door_spacing_min: u32,
    /// Chunk map filenames, each declaring its own procgen role.
    pub chunks: Vec<String>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            doors_max: 0,
            main_path_length_min: 0,
            main_path_length_max: 0,
            main_path_attempts_max: DEFAULT_MAIN_PATH_ATTEMPTS,
            branch_length_min: 0,
            branch_length_max: 0,
            branches_per_door_level_max: DEFAULT_BRANCHES_PER_DOOR_LEVEL,
            door_spacing_min: DEFAULT_DOOR_SPACING,
            chunks: Vec::new(),
        }
    }
}

impl RulesConfig {
    pub fn from_toml(name: &str, text: &str) -> Result<Self, RulesError> {
        toml::from_str(text).map_err(|source| RulesError::Parse { name: name.to_string(), source })
    }

    /// Concrete limits for a `rows x cols` grid.
    pub fn resolve(&self, rows: usize, cols: usize) -> PathLimits {
        let cells = rows * cols;
        let span = rows.max(cols);

        let main_length_max =
            if self.main_path_length_max == 0 { cells } else { self.main_path_length_max as usize };
        let main_length_min =
            if self.main_path_length_min == 0 { span } else { self.main_path_length_min as usize };

        let branch_length_max =
            if self.branch_length_max == 0 { span } else { self.branch_length_max as usize };
        let branch_length_min =
            if self.branch_length_min == 0 { 1 } else { self.branch_length_min as usize };

        PathLimits {
            doors_max: self.doors_max,
            main_length_min: main_length_min.min(main_length_max),
            main_length_max,
            main_attempts_max: self.main_path_attempts_max.max(1),
            branch_length_min: branch_length_min.min(branch_length_max),
            branch_length_max,
            branches_per_door_level_max: self.branches_per_door_level_max,
            door_spacing_min: self.door_spacing_min,
        }
    }
}

/// Limits used by a single generation pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PathLimits {
    pub doors_max: u32,
    pub main_length_min: usize,
    pub main_length_max: usize,
    pub main_attempts_max: u32,
    pub branch_length_min: usize,
    pub branch_length_max: usize,
    pub branches_per_door_level_max: u32,
    pub door_spacing_min: u32,
}

impl PathLimits {
    pub fn accepts_main_path(&self, length: usize, doors: u32) -> bool {
        (self.main_length_min..=self.main_length_max).contains(&length)
            && (self.doors_max == 0 || doors > 0)
    }
}
