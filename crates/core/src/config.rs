use crate::error::CoreError;

/// Default cap on the number of codes selected at once.
pub const DEFAULT_MAX_SELECTED_CODES: usize = 10;

/// Environment variable overriding [`SelectionConfig::max_codes`].
pub const ENV_MAX_SELECTED_CODES: &str = "MBS_MAX_SELECTED_CODES";

/// Selection engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionConfig {
    /// Maximum number of codes a single selection may hold (at least 1).
    pub max_codes: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            max_codes: DEFAULT_MAX_SELECTED_CODES,
        }
    }
}

impl SelectionConfig {
    pub fn new(max_codes: usize) -> Result<Self, CoreError> {
        if max_codes == 0 {
            return Err(CoreError::Config(
                "max_codes must be at least 1".to_string(),
            ));
        }
        Ok(Self { max_codes })
    }

    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default |
    /// |--------------------------|---------|
    /// | `MBS_MAX_SELECTED_CODES` | `10`    |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(ENV_MAX_SELECTED_CODES) {
            None => Ok(Self::default()),
            Some(raw) => {
                let max_codes: usize = raw.trim().parse().map_err(|_| {
                    CoreError::Config(format!(
                        "{ENV_MAX_SELECTED_CODES} must be a positive integer, got '{raw}'"
                    ))
                })?;
                Self::new(max_codes)
            }
        }
    }
}
