//! Run folder preparation.
//!
//! A run gets a fresh folder named after a random 32 hex character id,
//! holding the scenario document and both properties files. The engine is
//! launched by the caller with the argument vector from
//! [`PreparedRun::launcher_args`]; nothing here spawns a process.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{LayoutError, ScenarioError, ScenarioResult};
use crate::properties::{PropertiesFiles, SimulationProperties};
use crate::scenario::{Scenario, SCENARIO_FILE};

/// A run folder ready for the simulation engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRun {
    id: String,
    folder: PathBuf,
    scenario_file: PathBuf,
    properties: PropertiesFiles,
    process_count: i64,
}

impl PreparedRun {
    /// Creates `root/<id>` and writes every artifact of the run into it.
    ///
    /// The properties and the scenario are checked before the folder is
    /// created. If a write fails, the folder is removed.
    ///
    /// # Errors
    ///
    /// Returns a `LayoutError`, `ScenarioError::NotValidated` or an I/O error.
    pub fn prepare(
        root: &Path,
        props: &SimulationProperties,
        scenario: &Scenario,
    ) -> ScenarioResult<Self> {
        let props = props.clone().validate()?;
        scenario.serialize()?;

        let id = Uuid::new_v4().simple().to_string();
        fs::create_dir_all(root).map_err(|e| ScenarioError::io(root, e))?;
        let folder = root.join(&id);
        fs::create_dir(&folder).map_err(|e| ScenarioError::io(&folder, e))?;

        let written = scenario.save(&folder).and_then(|scenario_file| {
            let properties = props.save(&folder, &id, Path::new(SCENARIO_FILE))?;
            Ok((scenario_file, properties))
        });
        let (scenario_file, properties) = match written {
            Ok(files) => files,
            Err(e) => {
                if let Err(cleanup) = fs::remove_dir_all(&folder) {
                    warn!(folder = %folder.display(), error = %cleanup, "failed to remove run folder");
                }
                return Err(e);
            }
        };

        info!(
            id = %id,
            folder = %folder.display(),
            processes = props.process_count(),
            "run prepared"
        );

        Ok(Self {
            id,
            folder,
            scenario_file,
            properties,
            process_count: props.process_count(),
        })
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn folder(&self) -> &Path {
        &self.folder
    }

    #[must_use]
    pub fn scenario_file(&self) -> &Path {
        &self.scenario_file
    }

    #[must_use]
    pub const fn properties(&self) -> &PropertiesFiles {
        &self.properties
    }

    #[must_use]
    pub const fn process_count(&self) -> i64 {
        self.process_count
    }

    /// Argument vector launching `binary` under `mpiexec`:
    /// `mpiexec -np <N> <binary> <config.props> <model.props> [--debug=<rank>]`.
    ///
    /// # Errors
    ///
    /// Returns `LayoutError::InvalidManagerRank` with the role `debugger` if
    /// `wait_for_debugger` is not a rank of the run.
    pub fn launcher_args(
        &self,
        mpiexec: &Path,
        binary: &Path,
        wait_for_debugger: Option<i64>,
    ) -> Result<Vec<String>, LayoutError> {
        let mut args = vec![
            mpiexec.display().to_string(),
            "-np".to_string(),
            self.process_count.to_string(),
            binary.display().to_string(),
            self.properties.config.display().to_string(),
            self.properties.model.display().to_string(),
        ];

        if let Some(rank) = wait_for_debugger {
            if !(0..self.process_count).contains(&rank) {
                return Err(LayoutError::InvalidManagerRank {
                    role: "debugger",
                    rank,
                    process_count: self.process_count,
                });
            }
            args.push(format!("--debug={rank}"));
        }

        Ok(args)
    }
}
