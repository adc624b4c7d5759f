use std::env;
use std::str::FromStr;

use crate::assignment::scorer::ScoringWeights;
use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo,
    Memory,
}

#[derive(Clone)]
pub struct Config {
    pub store_backend: StoreBackend,
    pub mongo_uri: Option<String>,
    pub database_name: String,
    pub jwt_secret: String,
    pub frontend_origin: String,
    pub bind_addr: String,
    pub scoring: ScoringWeights,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let store_backend = match var("STORE_BACKEND")
            .unwrap_or_else(|| "mongo".to_string())
            .to_lowercase()
            .as_str()
        {
            "mongo" | "mongodb" => StoreBackend::Mongo,
            "memory" => StoreBackend::Memory,
            other => {
                return Err(ConfigError::Invalid {
                    name: "STORE_BACKEND",
                    value: other.to_string(),
                })
            }
        };
        let mongo_uri = var("MONGO_URI");
        if store_backend == StoreBackend::Mongo && mongo_uri.is_none() {
            return Err(ConfigError::Missing("MONGO_URI"));
        }

        let defaults = ScoringWeights::default();
        let scoring = ScoringWeights {
            skill: parse_var(&var, "ASSIGN_SKILL_WEIGHT", defaults.skill)?,
            workload: parse_var(&var, "ASSIGN_WORKLOAD_WEIGHT", defaults.workload)?,
            complexity: parse_var(&var, "ASSIGN_COMPLEXITY_WEIGHT", defaults.complexity)?,
            capacity_hours: parse_var(&var, "ASSIGN_CAPACITY_HOURS", defaults.capacity_hours)?,
        };
        check_weights(&scoring)?;

        Ok(Self {
            store_backend,
            mongo_uri,
            database_name: var("DATABASE_NAME").unwrap_or_else(|| "taskline".to_string()),
            jwt_secret: var("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?,
            frontend_origin: var("FRONTEND_ORIGIN")
                .unwrap_or_else(|| "http://localhost:3000".to_string()),
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            scoring,
        })
    }
}

/// Weights must be finite and non-negative; capacity must be finite and positive.
fn check_weights(weights: &ScoringWeights) -> Result<(), ConfigError> {
    let components = [
        ("ASSIGN_SKILL_WEIGHT", weights.skill),
        ("ASSIGN_WORKLOAD_WEIGHT", weights.workload),
        ("ASSIGN_COMPLEXITY_WEIGHT", weights.complexity),
    ];
    for (name, value) in components {
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigError::Invalid {
                name,
                value: value.to_string(),
            });
        }
    }
    if !weights.capacity_hours.is_finite() || weights.capacity_hours <= 0.0 {
        return Err(ConfigError::Invalid {
            name: "ASSIGN_CAPACITY_HOURS",
            value: weights.capacity_hours.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self {
            store_backend: StoreBackend::Memory,
            mongo_uri: None,
            database_name: "taskline-test".to_string(),
            jwt_secret: crate::auth::testing::SECRET.to_string(),
            frontend_origin: "http://localhost:3000".to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
            scoring: ScoringWeights::default(),
        }
    }
}

fn parse_var<T: FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match var(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let mut vars: HashMap<String, String> = HashMap::from([
            ("STORE_BACKEND".to_string(), "memory".to_string()),
            ("JWT_SECRET".to_string(), "s3cret".to_string()),
        ]);
        for (k, v) in pairs {
            vars.insert(k.to_string(), v.to_string());
        }
        move |name| vars.get(name).cloned()
    }

    fn rejected_name(pairs: &[(&str, &str)]) -> Option<&'static str> {
        match Config::from_lookup(lookup(pairs)) {
            Err(ConfigError::Invalid { name, .. }) => Some(name),
            _ => None,
        }
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.database_name, "taskline");
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.scoring, ScoringWeights::default());
    }

    #[test]
    fn mongo_backend_needs_a_uri() {
        let result = Config::from_lookup(lookup(&[("STORE_BACKEND", "mongo")]));
        assert!(matches!(result, Err(ConfigError::Missing("MONGO_URI"))));
    }

    #[test]
    fn parse_var_rejects_non_numbers() {
        assert_eq!(rejected_name(&[("ASSIGN_SKILL_WEIGHT", "heavy")]), Some("ASSIGN_SKILL_WEIGHT"));
    }

    #[test]
    fn negative_weights_are_rejected() {
        for name in ["ASSIGN_SKILL_WEIGHT", "ASSIGN_WORKLOAD_WEIGHT", "ASSIGN_COMPLEXITY_WEIGHT"] {
            assert_eq!(rejected_name(&[(name, "-1")]), Some(name));
        }
    }

    #[test]
    fn non_finite_weights_are_rejected() {
        for value in ["NaN", "inf", "-inf"] {
            assert_eq!(
                rejected_name(&[("ASSIGN_WORKLOAD_WEIGHT", value)]),
                Some("ASSIGN_WORKLOAD_WEIGHT")
            );
        }
    }

    #[test]
    fn capacity_must_be_finite_and_positive() {
        for value in ["0", "-40", "NaN", "inf"] {
            assert_eq!(
                rejected_name(&[("ASSIGN_CAPACITY_HOURS", value)]),
                Some("ASSIGN_CAPACITY_HOURS")
            );
        }
    }

    #[test]
    fn zero_weight_is_allowed() {
        let config = Config::from_lookup(lookup(&[("ASSIGN_COMPLEXITY_WEIGHT", "0")])).unwrap();
        assert_eq!(config.scoring.complexity, 0.0);
    }

    #[test]
    fn from_env_rejects_negative_workload_weight() {
        env::set_var("STORE_BACKEND", "memory");
        env::set_var("JWT_SECRET", "s3cret");
        env::set_var("ASSIGN_WORKLOAD_WEIGHT", "-1");
        let result = Config::from_env();
        env::remove_var("ASSIGN_WORKLOAD_WEIGHT");
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { name: "ASSIGN_WORKLOAD_WEIGHT", .. })
        ));
    }
}
