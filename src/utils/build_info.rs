/// Compile-time build metadata produced by `build.rs`.
#[derive(Debug, Clone, Copy)]
pub struct BuildMetadata {
    pub version: &'static str,
    pub git_hash: &'static str,
    pub git_status: &'static str,
    pub timestamp: &'static str,
    pub target: &'static str,
}

impl BuildMetadata {
    pub fn summary(&self) -> String {
        format!(
            "reminder_core {} ({} {}, built {} for {})",
            self.version, self.git_hash, self.git_status, self.timestamp, self.target
        )
    }
}

pub const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the statically-embedded build metadata.
pub fn current() -> BuildMetadata {
    BuildMetadata {
        version: CLI_VERSION,
        git_hash: option_env!("REMINDER_CORE_BUILD_HASH").unwrap_or("unknown"),
        git_status: option_env!("REMINDER_CORE_BUILD_STATUS").unwrap_or("unknown"),
        timestamp: option_env!("REMINDER_CORE_BUILD_TIMESTAMP").unwrap_or("unknown"),
        target: option_env!("REMINDER_CORE_BUILD_TARGET").unwrap_or("unknown"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_carries_version() {
        let meta = current();
        assert_eq!(meta.version, env!("CARGO_PKG_VERSION"));
        assert!(meta.summary().starts_with("reminder_core "));
    }
}
