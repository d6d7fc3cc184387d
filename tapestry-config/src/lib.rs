#[macro_use]
extern crate tracing;

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use miette::{Context as _, IntoDiagnostic as _};

#[macro_use]
mod macros;

pub mod error;
pub mod mappings;
pub mod recognizer;
pub mod sequences;
pub mod utils;

pub use crate::error::ValidationError;
pub use crate::mappings::{
    ActionTable, GestureKey, Mappings, MappingsPart, NamedActionTable, GESTURE_KEYS,
};
pub use crate::recognizer::{Thresholds, ThresholdsPart};
pub use crate::sequences::{join_keys, Sequence, Sequences, SEQUENCE_DELIMITER};
pub use crate::utils::{FloatOrInt, MergeWith};

/// Name of the context that is active when nothing else was selected.
pub const DEFAULT_CONTEXT: &str = "default";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub recognizer: Thresholds,
    pub mappings: Mappings,
    pub sequences: Sequences,
    pub initial_context: String,
}

/// Config file contents as written, before applying defaults.
#[derive(knuffel::Decode, Debug, Default, PartialEq)]
pub struct ConfigPart {
    #[knuffel(child)]
    pub recognizer: Option<ThresholdsPart>,
    #[knuffel(child)]
    pub actions: Option<ActionTable>,
    #[knuffel(children(name = "context"))]
    pub contexts: Vec<NamedActionTable>,
    #[knuffel(children(name = "element"))]
    pub elements: Vec<NamedActionTable>,
    #[knuffel(child)]
    pub sequences: Option<Sequences>,
    #[knuffel(child, unwrap(argument))]
    pub initial_context: Option<String>,
}

#[derive(Debug, Clone)]
pub enum ConfigPath {
    /// Explicitly set config path.
    ///
    /// Load the config only from this path.
    Explicit(PathBuf),

    /// Default config path.
    ///
    /// Prioritize the user path, fallback to the system path, fallback to the built-in default
    /// config.
    Regular {
        /// User config path, usually `$XDG_CONFIG_HOME/tapestry/config.kdl`.
        user_path: PathBuf,
        /// System config path, usually `/etc/tapestry/config.kdl`.
        system_path: PathBuf,
    },
}

impl Config {
    /// Config without any mappings or sequences and with default thresholds.
    pub fn empty() -> Self {
        Self {
            recognizer: Thresholds::default(),
            mappings: Mappings::default(),
            sequences: Sequences::default(),
            initial_context: String::from(DEFAULT_CONTEXT),
        }
    }

    pub fn load(path: &Path) -> miette::Result<Self> {
        let contents = fs::read_to_string(path)
            .into_diagnostic()
            .with_context(|| format!("error reading {path:?}"))?;

        let config = Self::parse(
            path.file_name()
                .and_then(OsStr::to_str)
                .unwrap_or("config.kdl"),
            &contents,
        )
        .context("error parsing")?;
        debug!("loaded config from {path:?}");
        Ok(config)
    }

    pub fn parse(filename: &str, text: &str) -> miette::Result<Self> {
        let _span = tracy_client::span!("Config::parse");

        let part: ConfigPart = knuffel::parse(filename, text)?;
        let config = Self::empty().merged_with(&part);
        config.recognizer.validate()?;

        let capacity = config.recognizer.sequence_capacity;
        if let Some(seq) = config.sequences.0.iter().find(|s| s.gestures.len() > capacity) {
            miette::bail!(
                "sequence `{}` has {} gestures but `sequence-capacity` is {capacity}",
                seq.key(),
                seq.gestures.len(),
            );
        }

        Ok(config)
    }
}

impl MergeWith<ConfigPart> for Config {
    fn merge_with(&mut self, part: &ConfigPart) {
        if let Some(recognizer) = &part.recognizer {
            self.recognizer.merge_with(recognizer);
        }

        self.mappings.merge_with(&MappingsPart {
            defaults: part.actions.clone(),
            contexts: part.contexts.clone(),
            elements: part.elements.clone(),
        });

        if let Some(sequences) = &part.sequences {
            self.sequences.0.extend(sequences.0.iter().cloned());
        }

        merge_clone!((self, part), initial_context);
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::parse(
            "default-config.kdl",
            include_str!("../../resources/default-config.kdl"),
        )
        .unwrap()
    }
}

impl ConfigPath {
    /// Loads the config, falling back to the built-in default when no file exists.
    pub fn load(&self) -> miette::Result<Config> {
        let _span = tracy_client::span!("ConfigPath::load");

        let path = match self {
            ConfigPath::Explicit(path) => path.as_path(),
            ConfigPath::Regular {
                user_path,
                system_path,
            } => {
                if user_path.exists() {
                    user_path.as_path()
                } else if system_path.exists() {
                    system_path.as_path()
                } else {
                    debug!("no config file found, using the default config");
                    return Ok(Config::default());
                }
            }
        };

        Config::load(path).context("error loading config")
    }
}
