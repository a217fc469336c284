//! Command builder for the dev chain.

/// Builder for dev chain (ganache) command lines.
#[derive(Debug, Clone)]
pub struct GanacheCmdBuilder {
    host: String,
    port: u16,
    network_id: Option<u64>,
    deterministic: bool,
    extra_args: Vec<String>,
}

impl GanacheCmdBuilder {
    /// Create a new builder for the given RPC port.
    pub fn new(port: u16) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port,
            network_id: None,
            deterministic: true,
            extra_args: Vec::new(),
        }
    }

    /// Set the host address to bind.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set a fixed network id.
    pub fn network_id(mut self, network_id: Option<u64>) -> Self {
        self.network_id = network_id;
        self
    }

    /// Enable or disable deterministic account generation.
    pub fn deterministic(mut self, deterministic: bool) -> Self {
        self.deterministic = deterministic;
        self
    }

    /// Append extra arguments passed through verbatim.
    pub fn extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args.extend(args);
        self
    }

    /// Build the argument vector.
    pub fn build(self) -> Vec<String> {
        let mut args = vec![
            "--host".to_string(),
            self.host,
            "--port".to_string(),
            self.port.to_string(),
        ];

        if let Some(network_id) = self.network_id {
            args.push("--networkId".to_string());
            args.push(network_id.to_string());
        }

        if self.deterministic {
            args.push("--deterministic".to_string());
        }

        args.extend(self.extra_args);
        args
    }
}
