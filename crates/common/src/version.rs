use std::fmt;

use serde::Serialize;

/// Compile-time facts about the running binary.
///
/// The values come from environment variables a binary's build script
/// exports; use [`build_info!`](crate::build_info) so they are read while
/// compiling that binary rather than this library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildInfo {
    pub version: &'static str,
    pub build_profile: &'static str,
    pub build_features: &'static str,
    pub build_timestamp: &'static str,
    pub rust_version: &'static str,
    pub target: &'static str,
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, features: {}, built {} for {} with {})",
            self.version,
            self.build_profile,
            self.build_features,
            self.build_timestamp,
            self.target,
            self.rust_version
        )
    }
}

#[macro_export]
macro_rules! build_info {
    () => {
        $crate::version::BuildInfo {
            version: option_env!("REPO_VERSION").unwrap_or(env!("CARGO_PKG_VERSION")),
            build_profile: option_env!("BUILD_PROFILE").unwrap_or("unknown"),
            build_features: option_env!("BUILD_FEATURES").unwrap_or("unknown"),
            build_timestamp: option_env!("BUILD_TIMESTAMP").unwrap_or("unknown"),
            rust_version: option_env!("RUST_VERSION").unwrap_or("unknown"),
            target: option_env!("BUILD_TARGET").unwrap_or("unknown"),
        }
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn falls_back_to_package_version() {
        let info = crate::build_info!();
        assert!(!info.version.is_empty());
        assert!(info.to_string().starts_with(info.version));
    }
}
