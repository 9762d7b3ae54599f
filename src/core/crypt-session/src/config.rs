//! Session configuration.

/// Algorithm prefix and rounds, fixed for the lifetime of the process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionConfig {
    /// crypt(5) prefix such as `$2b$`; `None` lets the provider choose.
    pub prefix: Option<String>,
    /// Algorithm cost; `0` lets the provider choose.
    pub rounds: u64,
}

impl SessionConfig {
    /// Builds a configuration; an empty prefix counts as absent.
    pub fn new(prefix: Option<&str>, rounds: u64) -> Self {
        Self {
            prefix: prefix.filter(|p| !p.is_empty()).map(str::to_string),
            rounds,
        }
    }

    /// Prefix to hand to the provider.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }
}
