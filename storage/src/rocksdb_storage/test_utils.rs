//! Useful utilities for testing.

use std::{ops::Deref, sync::Arc};

use tempfile::TempDir;

use super::*;

/// Environment in a temporary directory with self-cleanup
pub struct TempEnvironment {
    environment: Arc<Environment>,
    _dir: TempDir,
}

impl TempEnvironment {
    /// Create new `TempEnvironment` with default limits
    pub fn new() -> Self {
        Self::with_config(|config| config)
    }

    /// Create new `TempEnvironment`, adjusting the default config first
    pub fn with_config(adjust: impl FnOnce(EnvironmentConfig) -> EnvironmentConfig) -> Self {
        let dir = TempDir::new().expect("cannot create tempdir");
        let environment = Environment::open(adjust(EnvironmentConfig::new(dir.path())))
            .expect("cannot open environment");
        TempEnvironment {
            environment: Arc::new(environment),
            _dir: dir,
        }
    }

    /// Shared handle to the environment, as tree stores hold it
    pub fn shared(&self) -> Arc<Environment> {
        Arc::clone(&self.environment)
    }
}

impl Default for TempEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for TempEnvironment {
    type Target = Environment;

    fn deref(&self) -> &Self::Target {
        &self.environment
    }
}
