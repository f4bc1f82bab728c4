//! Environment configuration and endpoint resolution.
//!
//! Every configuration key is declared as an [`EnvKey`] with a default
//! so the same binary runs unchanged across environments.

/// One environment-variable configuration key.
#[derive(Debug, Clone, Copy)]
pub struct EnvKey {
    pub name: &'static str,
    pub default: &'static str,
}

impl EnvKey {
    /// Resolve from the environment, falling back to the default.
    pub fn get(&self) -> String {
        std::env::var(self.name).unwrap_or_else(|_| self.default.to_string())
    }
}

/// Service listen port.
pub const PORT: EnvKey = EnvKey {
    name: "PORT",
    default: "1310",
};

/// Aggregate coordinator endpoint override.
pub const COORDINATOR_ENDPOINT: EnvKey = EnvKey {
    name: "FOLIO_COORDINATOR_ENDPOINT",
    default: "localhost:1310",
};

/// Event query service endpoint override.
pub const QUERY_ENDPOINT: EnvKey = EnvKey {
    name: "FOLIO_QUERY_ENDPOINT",
    default: "localhost:1310",
};

/// Resolved listen port, falling back to the declared default when the
/// variable is unset or unparseable.
pub fn port() -> u16 {
    PORT.get()
        .parse()
        .unwrap_or_else(|_| PORT.default.parse().expect("default port parses"))
}

/// Strip an optional `scheme://` prefix from an endpoint, leaving the
/// `host:port` authority used for dialling.
pub fn authority(endpoint: &str) -> &str {
    endpoint
        .find("://")
        .map(|i| &endpoint[i + 3..])
        .unwrap_or(endpoint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authority_strips_scheme() {
        assert_eq!(authority("http://localhost:1310"), "localhost:1310");
        assert_eq!(authority("grpc://coordinator:1310"), "coordinator:1310");
        assert_eq!(authority("localhost:1310"), "localhost:1310");
    }

    #[test]
    fn env_key_falls_back_to_default() {
        let key = EnvKey {
            name: "FOLIO_TEST_UNSET_KEY",
            default: "fallback",
        };
        assert_eq!(key.get(), "fallback");
    }

    #[test]
    fn port_defaults_parse() {
        assert_eq!(PORT.default.parse::<u16>().unwrap(), 1310);
    }
}
