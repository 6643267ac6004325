// -----------------------------------------------------------------------------
// Config

/// Runtime knobs of a serialization session.
///
/// # Examples
///
/// ```
/// use cask_serial::Config;
///
/// let config = Config::new().with_max_depth(16);
/// assert_eq!(config.max_depth, 16);
/// assert_eq!(Config::default().max_depth, Config::DEFAULT_MAX_DEPTH);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Deepest nesting of nodes accepted before failing with
    /// [`Error::DepthLimit`](crate::Error::DepthLimit).
    pub max_depth: usize,
}

impl Config {
    pub const DEFAULT_MAX_DEPTH: usize = 256;

    #[inline]
    pub const fn new() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }

    #[inline]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for Config {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}
