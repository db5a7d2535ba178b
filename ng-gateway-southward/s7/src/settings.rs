use crate::protocol::{
    error::Result,
    frame::{AddressResolver, VAreaPolicy},
    planner::PlannerConfig,
};
use config::{Config, Environment, File, Map};
use serde::Deserialize;
use std::{ops::Deref, sync::Arc};

/// Default negotiated PDU length of S7-300/400 CPUs
const DEFAULT_PDU_LEN: u16 = 240;

#[derive(Debug, Clone)]
pub struct S7Settings(Arc<Inner>);

impl Deref for S7Settings {
    type Target = Inner;
    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl Default for S7Settings {
    fn default() -> Self {
        Self(Arc::new(Inner::default()))
    }
}

impl S7Settings {
    /// Load settings from an optional file, then apply `NG_S7__*` environment overrides,
    /// e.g. `NG_S7__PLANNER__PDU_LEN=480`.
    pub fn new(config_path: &str) -> Result<Self> {
        Self::with_env(config_path, None)
    }

    /// Same as [`S7Settings::new`], but reads the `NG_S7__*` overrides from `env`
    /// instead of the process environment when it is `Some`.
    pub fn with_env(config_path: &str, env: Option<Map<String, String>>) -> Result<Self> {
        let builder = Config::builder()
            .add_source(File::with_name(config_path).required(false))
            .add_source(
                Environment::with_prefix("NG_S7")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            );
        let inner: Inner = builder.build()?.try_deserialize()?;
        tracing::debug!(
            pdu_len = inner.planner.pdu_len,
            v_area = ?inner.address.v_area,
            "loaded S7 settings"
        );
        Ok(Self(Arc::new(inner)))
    }

    pub fn planner_config(&self) -> PlannerConfig {
        PlannerConfig::new(self.planner.pdu_len)
    }

    pub fn resolver(&self) -> AddressResolver {
        AddressResolver::new(self.address.v_area)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Inner {
    #[serde(default)]
    pub planner: Planner,
    #[serde(default)]
    pub address: Address,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Planner {
    /// Negotiated PDU length the budgets are derived from.
    ///
    /// # Environment override
    /// - `NG_S7__PLANNER__PDU_LEN=960`
    #[serde(default = "Planner::pdu_len_default")]
    pub pdu_len: u16,
}

impl Default for Planner {
    fn default() -> Self {
        Planner {
            pdu_len: Planner::pdu_len_default(),
        }
    }
}

impl Planner {
    fn pdu_len_default() -> u16 {
        DEFAULT_PDU_LEN
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Address {
    /// Interpretation of the `V` area letter
    #[serde(default)]
    pub v_area: VAreaPolicy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = S7Settings::default();
        assert_eq!(settings.planner.pdu_len, 240);
        assert_eq!(settings.address.v_area, VAreaPolicy::Alias { db_number: 1 });
        assert_eq!(settings.planner_config().s7_pdu_len, 240);
    }

    #[test]
    fn test_missing_file_is_optional() {
        let settings = S7Settings::new("/nonexistent/ng-s7-settings").unwrap();
        assert_eq!(settings.resolver(), AddressResolver::default());
    }
}
