//! Command builder for the app server.

use super::Runner;

/// Builder for app server command lines.
#[derive(Debug, Clone)]
pub struct ServerCmdBuilder {
    runner: Runner,
    script: String,
    extra_args: Vec<String>,
}

impl ServerCmdBuilder {
    /// Create a new builder for the given runner and script.
    pub fn new(runner: Runner, script: impl Into<String>) -> Self {
        Self {
            runner,
            script: script.into(),
            extra_args: Vec::new(),
        }
    }

    /// Append extra arguments passed through verbatim.
    pub fn extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args.extend(args);
        self
    }

    /// The executable to invoke.
    pub fn program(&self) -> String {
        self.runner.to_string()
    }

    /// Build the argument vector.
    pub fn build(self) -> Vec<String> {
        let mut args = match self.runner {
            // Package managers need the `run` subcommand; node takes the
            // script path directly.
            Runner::Npm | Runner::Yarn => vec!["run".to_string(), self.script],
            Runner::Node => vec![self.script],
        };
        args.extend(self.extra_args);
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_npm_args() {
        let builder = ServerCmdBuilder::new(Runner::Npm, "start");
        assert_eq!(builder.program(), "npm");
        assert_eq!(builder.build(), vec!["run", "start"]);
    }

    #[test]
    fn test_yarn_args() {
        let builder = ServerCmdBuilder::new(Runner::Yarn, "dev");
        assert_eq!(builder.program(), "yarn");
        assert_eq!(builder.build(), vec!["run", "dev"]);
    }

    #[test]
    fn test_node_args() {
        let builder = ServerCmdBuilder::new(Runner::Node, "server.js");
        assert_eq!(builder.program(), "node");
        assert_eq!(builder.build(), vec!["server.js"]);
    }
}
