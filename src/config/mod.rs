//! # turvec Configuration Module
//!
//! This module centralizes configuration for turvec: numeric constants shared
//! across subsystems, and the typed option set accepted by
//! `CREATE INDEX ... WITH (type=ivfflat, ...)`.
//!
//! ## Module Organization
//!
//! - [`constants`]: All numeric configuration values with dependency documentation
//! - [`IvfflatOptions`]: `lists` / `probes` / seed for one IVFFLAT index

pub mod constants;
pub use constants::*;

use crate::error::ExecError;
use eyre::{bail, Result};
use serde::{Deserialize, Serialize};

/// Tuning knobs for one IVFFLAT index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IvfflatOptions {
    pub lists: usize,
    pub probes: usize,
    /// Seed for centroid initialisation. `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for IvfflatOptions {
    fn default() -> Self {
        Self {
            lists: IVFFLAT_DEFAULT_LISTS,
            probes: IVFFLAT_DEFAULT_PROBES,
            seed: None,
        }
    }
}

impl IvfflatOptions {
    pub fn new(lists: usize, probes: usize) -> Result<Self> {
        let options = Self {
            lists,
            probes,
            seed: None,
        };
        options.validate()?;
        Ok(options)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Parses the option list of `CREATE VECTOR INDEX ... WITH (...)`.
    ///
    /// `distance` and `type` are consumed by the caller and skipped here.
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut options = Self::default();
        for (key, value) in pairs {
            match key.trim().to_ascii_lowercase().as_str() {
                "lists" => options.lists = parse_count(key, value)?,
                "probes" => options.probes = parse_count(key, value)?,
                "distance" | "type" => {}
                other => bail!(ExecError::InvalidArgument(format!(
                    "unknown vector index option '{}'",
                    other
                ))),
            }
        }
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        if self.lists == 0 || self.probes == 0 {
            bail!(ExecError::InvalidArgument(
                "lists and probes must be positive".into()
            ));
        }
        if self.probes > self.lists {
            bail!(ExecError::InvalidArgument(format!(
                "probes ({}) cannot exceed lists ({})",
                self.probes, self.lists
            )));
        }
        Ok(())
    }
}

fn parse_count(key: &str, value: &str) -> Result<usize> {
    value.trim().parse::<usize>().map_err(|_| {
        ExecError::InvalidArgument(format!("option '{}' expects a positive integer, got '{}'", key, value))
            .into()
    })
}
