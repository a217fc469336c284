//! Command builder for the migration tool.

/// Builder for migration (truffle) command lines.
#[derive(Debug, Clone)]
pub struct MigrateCmdBuilder {
    network: String,
    reset: bool,
    extra_args: Vec<String>,
}

impl MigrateCmdBuilder {
    /// Create a new builder targeting the given network name.
    pub fn new(network: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            reset: true,
            extra_args: Vec::new(),
        }
    }

    /// Redeploy all contracts from scratch.
    pub fn reset(mut self, reset: bool) -> Self {
        self.reset = reset;
        self
    }

    /// Append extra arguments passed through verbatim.
    pub fn extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args.extend(args);
        self
    }

    /// Build the argument vector.
    pub fn build(self) -> Vec<String> {
        let mut args = vec!["migrate".to_string()];
        if self.reset {
            args.push("--reset".to_string());
        }
        args.push("--network".to_string());
        args.push(self.network);
        args.extend(self.extra_args);
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args() {
        let args = MigrateCmdBuilder::new("development").build();
        assert_eq!(args, vec!["migrate", "--reset", "--network", "development"]);
    }

    #[test]
    fn test_without_reset() {
        let args = MigrateCmdBuilder::new("development").reset(false).build();
        assert_eq!(args, vec!["migrate", "--network", "development"]);
    }
}
