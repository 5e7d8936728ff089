// pgdump-core/src/infrastructure/host.rs

use tracing::warn;

pub const UNKNOWN_HOST: &str = "unknown";

/// Host label for metrics and alerts, resolved once at start.
pub fn hostname() -> String {
    match gethostname::gethostname().into_string() {
        Ok(name) if !name.trim().is_empty() => name.trim().to_string(),
        Ok(_) => UNKNOWN_HOST.to_string(),
        Err(raw) => {
            warn!(raw = ?raw, "Host name is not valid UTF-8");
            UNKNOWN_HOST.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hostname_is_never_empty() {
        assert!(!hostname().is_empty());
    }
}
