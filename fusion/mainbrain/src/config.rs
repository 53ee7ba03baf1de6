//! Startup configuration, read once from the environment. No config file,
//! no CLI flags — every field has a compiled-in default.

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:9833";
const DEFAULT_UPSTREAM_ADDR: &str = "127.0.0.1:9834";

#[derive(Debug, Clone)]
pub struct Config {
    /// Where the downstream broadcast server listens for GUI clients.
    pub bind_addr: String,
    /// Where the upstream tracking source is expected to be listening.
    pub upstream_addr: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("FUSION_BIND_ADDR")
                .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            upstream_addr: std::env::var("FUSION_UPSTREAM_ADDR")
                .unwrap_or_else(|_| DEFAULT_UPSTREAM_ADDR.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_compiled_in_defaults() {
        std::env::remove_var("FUSION_BIND_ADDR");
        std::env::remove_var("FUSION_UPSTREAM_ADDR");
        let config = Config::from_env();
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(config.upstream_addr, DEFAULT_UPSTREAM_ADDR);
    }
}
