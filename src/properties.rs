//! Process layout properties read by the simulation engine at startup.
//!
//! The engine splits the plan over an `x * y` grid of processes and assigns a
//! manager process to each shared resource. Those settings, together with the
//! tick length, the random seed and the output paths, are written as a flat
//! `key = value` document (`model.props`). The engine also expects a
//! `config.props` file next to it, which is left empty.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::artifact;
use crate::error::{LayoutError, ScenarioError, ScenarioResult};

/// File name of the model properties.
pub const MODEL_PROPS: &str = "model.props";
/// File name of the engine configuration properties.
pub const CONFIG_PROPS: &str = "config.props";

/// Process layout and run settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationProperties {
    /// Processes along the x axis.
    pub x: i64,
    /// Processes along the y axis.
    pub y: i64,
    /// Simulated seconds per tick.
    pub seconds_per_tick: i64,
    /// Rank owning the chair pool.
    pub chair_manager_rank: i64,
    /// Rank owning the reception queue.
    pub reception_manager_rank: i64,
    /// Rank owning the triage queue.
    pub triage_manager_rank: i64,
    /// Rank owning the doctor queues.
    pub doctors_manager_rank: i64,
    pub seed: u64,
    /// Whether the engine records per-process performance metrics.
    pub debug_performance: bool,
}

impl Default for SimulationProperties {
    fn default() -> Self {
        Self {
            x: 1,
            y: 1,
            seconds_per_tick: 60,
            chair_manager_rank: 0,
            reception_manager_rank: 0,
            triage_manager_rank: 0,
            doctors_manager_rank: 0,
            seed: 1_574_454,
            debug_performance: false,
        }
    }
}

/// Paths written by [`SimulationProperties::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertiesFiles {
    pub model: PathBuf,
    pub config: PathBuf,
}

impl SimulationProperties {
    /// Number of processes in the layout.
    #[must_use]
    pub const fn process_count(&self) -> i64 {
        self.x.saturating_mul(self.y)
    }

    /// Manager ranks keyed by role.
    #[must_use]
    pub const fn manager_ranks(&self) -> [(&'static str, i64); 4] {
        [
            ("chair", self.chair_manager_rank),
            ("reception", self.reception_manager_rank),
            ("triage", self.triage_manager_rank),
            ("doctors", self.doctors_manager_rank),
        ]
    }

    /// Checks the layout, the tick length and every manager rank.
    ///
    /// # Errors
    ///
    /// - `InvalidLayout` if either axis is below 1
    /// - `InvalidSeconds` if the tick length is negative
    /// - `InvalidManagerRank` for the first rank outside `[0, x * y)`
    pub fn validate(self) -> Result<Self, LayoutError> {
        if self.x < 1 || self.y < 1 {
            return Err(LayoutError::InvalidLayout {
                x: self.x,
                y: self.y,
            });
        }

        if self.seconds_per_tick < 0 {
            return Err(LayoutError::InvalidSeconds {
                seconds: self.seconds_per_tick,
            });
        }

        let process_count = self.process_count();
        for (role, rank) in self.manager_ranks() {
            if !(0..process_count).contains(&rank) {
                return Err(LayoutError::InvalidManagerRank {
                    role,
                    rank,
                    process_count,
                });
            }
        }

        Ok(self)
    }

    /// Renders `model.props`.
    ///
    /// Keys and their order are read literally by the engine.
    #[must_use]
    pub fn render(&self, run_id: &str, output_folder: &Path, hospital_file: &Path) -> String {
        ModelProps {
            props: self,
            run_id,
            output_folder,
            hospital_file,
        }
        .to_string()
    }

    /// Validates the properties and writes `model.props` and an empty
    /// `config.props` into `folder`. Paths inside `model.props` are absolute;
    /// a relative `hospital_file` is taken relative to `folder`.
    ///
    /// # Errors
    ///
    /// Returns a `LayoutError` before anything is written, or an I/O error.
    pub fn save(&self, folder: &Path, run_id: &str, hospital_file: &Path) -> ScenarioResult<PropertiesFiles> {
        let props = self.clone().validate()?;

        let output_folder = fs::canonicalize(folder).map_err(|e| ScenarioError::io(folder, e))?;
        let hospital_file = if hospital_file.is_absolute() {
            hospital_file.to_path_buf()
        } else {
            output_folder.join(hospital_file)
        };

        let text = props.render(run_id, &output_folder, &hospital_file);
        debug!(run_id, processes = props.process_count(), "writing run properties");

        let model = artifact::write_atomic(folder.join(MODEL_PROPS), text.as_bytes())?;
        let config = artifact::write_atomic(folder.join(CONFIG_PROPS), b"")?;
        Ok(PropertiesFiles { model, config })
    }
}

/// `model.props` contents for one run.
struct ModelProps<'a> {
    props: &'a SimulationProperties,
    run_id: &'a str,
    output_folder: &'a Path,
    hospital_file: &'a Path,
}

impl ModelProps<'_> {
    fn section(f: &mut fmt::Formatter<'_>, title: &str, entries: &[(&str, String)]) -> fmt::Result {
        writeln!(f, "# {title}")?;
        for (key, value) in entries {
            writeln!(f, "{key} = {value}")?;
        }
        Ok(())
    }
}

impl fmt::Display for ModelProps<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.props;
        Self::section(f, "Run id", &[("run.id", self.run_id.to_string())])?;
        Self::section(
            f,
            "Process distribution",
            &[
                ("x.process", p.x.to_string()),
                ("y.process", p.y.to_string()),
                ("chair.manager.rank", p.chair_manager_rank.to_string()),
                ("reception.manager.rank", p.reception_manager_rank.to_string()),
                ("triage.manager.rank", p.triage_manager_rank.to_string()),
                ("doctors.manager.rank", p.doctors_manager_rank.to_string()),
            ],
        )?;
        Self::section(
            f,
            "Output",
            &[("output.folder", self.output_folder.display().to_string())],
        )?;
        Self::section(
            f,
            "Debug",
            &[("debug.performance.metrics", p.debug_performance.to_string())],
        )?;
        Self::section(
            f,
            "Hospital file",
            &[("hospital.file", self.hospital_file.display().to_string())],
        )?;
        Self::section(
            f,
            "Simulation",
            &[("seconds.per.tick", p.seconds_per_tick.to_string())],
        )?;
        Self::section(f, "Randomness", &[("random.seed", p.seed.to_string())])
    }
}
