//! Property-test run profile with environment overrides.
//!
//! Every property suite in the workspace sizes its runs through
//! [`ProptestRunProfile`], so CI can raise case counts or enable forking in
//! one place.

use std::env;

use proptest::test_runner::Config;

/// Environment variable overriding the number of cases per property.
pub const CASES_ENV_KEY: &str = "TREEPERTURB_PBT_CASES";
/// Environment variable toggling forked execution of property cases.
pub const FORK_ENV_KEY: &str = "TREEPERTURB_PBT_FORK";

/// Case count and fork mode for one property suite.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProptestRunProfile {
    cases: u32,
    fork: bool,
}

impl ProptestRunProfile {
    /// Reads overrides from the environment, falling back to the defaults
    /// when a variable is unset or malformed.
    ///
    /// # Examples
    /// ```
    /// use treeperturb_test_support::profile::ProptestRunProfile;
    ///
    /// let profile = ProptestRunProfile::load(64, false);
    /// assert!(profile.cases() > 0);
    /// ```
    #[must_use]
    pub fn load(default_cases: u32, default_fork: bool) -> Self {
        Self {
            cases: override_or(CASES_ENV_KEY, default_cases, parse_cases),
            fork: override_or(FORK_ENV_KEY, default_fork, parse_flag),
        }
    }

    /// Number of cases per property.
    #[must_use]
    pub fn cases(&self) -> u32 {
        self.cases
    }

    /// Whether cases run in forked subprocesses.
    #[must_use]
    pub fn fork(&self) -> bool {
        self.fork
    }

    /// Proptest configuration carrying this profile.
    ///
    /// # Examples
    /// ```
    /// use treeperturb_test_support::profile::ProptestRunProfile;
    ///
    /// let profile = ProptestRunProfile::load(32, false);
    /// assert_eq!(profile.config().cases, profile.cases());
    /// ```
    #[must_use]
    pub fn config(&self) -> Config {
        Config {
            cases: self.cases,
            fork: self.fork,
            ..Config::default()
        }
    }
}

fn override_or<T: Copy>(key: &'static str, default: T, parse: fn(&str) -> Result<T, String>) -> T {
    let Ok(raw) = env::var(key) else {
        return default;
    };
    parse(&raw).unwrap_or_else(|reason| {
        tracing::warn!(
            env = key,
            raw = %raw,
            reason = %reason,
            "ignoring malformed property-test override",
        );
        default
    })
}

fn parse_cases(raw: &str) -> Result<u32, String> {
    match raw.trim().parse::<u32>() {
        Ok(0) => Err("cases must be > 0".to_owned()),
        Ok(cases) => Ok(cases),
        Err(error) => Err(format!("parse error: {error}")),
    }
}

fn parse_flag(raw: &str) -> Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err("expected one of: true/false/1/0/yes/no/on/off".to_owned()),
    }
}
