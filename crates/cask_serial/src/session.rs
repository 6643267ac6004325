//! State shared by both directions of a session: nesting depth and, in debug
//! builds with the `debug` feature, the trail of keys from the root.

use alloc::string::String;

use cask_archive::NodeId;

use crate::{Config, Error, Location};

#[cfg(all(debug_assertions, feature = "debug"))]
use alloc::vec::Vec;

// -----------------------------------------------------------------------------
// KeyTrail

#[cfg(all(debug_assertions, feature = "debug"))]
#[derive(Debug, Default)]
struct KeyTrail {
    keys: Vec<String>,
}

#[cfg(all(debug_assertions, feature = "debug"))]
impl KeyTrail {
    fn describe(&self) -> String {
        self.keys.join(" -> ")
    }
}

// -----------------------------------------------------------------------------
// Session

#[derive(Debug, Default)]
pub(crate) struct Session {
    config: Config,
    depth: usize,
    #[cfg(all(debug_assertions, feature = "debug"))]
    trail: KeyTrail,
}

impl Session {
    #[inline]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    #[inline]
    pub fn set_config(&mut self, config: Config) {
        self.config = config;
    }

    /// Steps one level down. Every successful call is paired with [`leave`](Self::leave).
    pub fn enter(&mut self, key: &str, id: Option<NodeId>) -> Result<(), Error> {
        if self.depth >= self.config.max_depth {
            return Err(Error::DepthLimit {
                limit: self.config.max_depth,
                at: self.at(key, id),
            });
        }
        self.depth += 1;
        #[cfg(all(debug_assertions, feature = "debug"))]
        self.trail.keys.push(key.into());
        Ok(())
    }

    pub fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        #[cfg(all(debug_assertions, feature = "debug"))]
        self.trail.keys.pop();
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.config);
    }

    pub fn at(&self, key: &str, id: Option<NodeId>) -> Location {
        Location {
            key: key.into(),
            id,
            trail: self.trail(),
        }
    }

    #[cfg(all(debug_assertions, feature = "debug"))]
    #[inline]
    fn trail(&self) -> Option<String> {
        Some(self.trail.describe())
    }

    #[cfg(not(all(debug_assertions, feature = "debug")))]
    #[inline(always)]
    fn trail(&self) -> Option<String> {
        None
    }
}

// -----------------------------------------------------------------------------
// Tests
