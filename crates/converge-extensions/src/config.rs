//! Extension configuration.
//!
//! A [`Configuration`] is an immutable TOML tree handed to every extension
//! when it is instantiated. Extensions read it through declared
//! [`ConfigProperty`]s so that missing or ill-typed values fail fast instead
//! of being silently defaulted.

use serde::de::DeserializeOwned;

use crate::error::ConfigError;

/// Key/value configuration backed by a TOML table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Configuration {
    values: toml::Table,
}

impl Configuration {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self {
            values: toml::Table::new(),
        }
    }

    /// Wrap an existing TOML table.
    pub fn from_table(values: toml::Table) -> Self {
        Self { values }
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let values: toml::Table = content.parse()?;
        Ok(Self { values })
    }

    /// Set a value (builder pattern). Dotted keys create nested tables.
    pub fn with(mut self, key: &str, value: impl Into<toml::Value>) -> Self {
        let mut parts: Vec<&str> = key.split('.').collect();
        let Some(last) = parts.pop() else {
            return self;
        };

        let mut table = &mut self.values;
        for part in parts {
            let entry = table
                .entry(part.to_string())
                .or_insert_with(|| toml::Value::Table(toml::Table::new()));
            if !entry.is_table() {
                *entry = toml::Value::Table(toml::Table::new());
            }
            match entry {
                toml::Value::Table(inner) => table = inner,
                _ => return self,
            }
        }
        table.insert(last.to_string(), value.into());
        self
    }

    /// Look up a value by key, falling back to a dotted path through nested tables.
    pub fn get(&self, key: &str) -> Option<&toml::Value> {
        if let Some(value) = self.values.get(key) {
            return Some(value);
        }

        let mut parts = key.split('.');
        let mut current = self.values.get(parts.next()?)?;
        for part in parts {
            current = current.as_table()?.get(part)?;
        }
        Some(current)
    }

    /// Check if a key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Read a value as `T`. Returns `Ok(None)` when the key is absent.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidProperty` if the value cannot be
    /// deserialized as `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => value
                .clone()
                .try_into::<T>()
                .map(Some)
                .map_err(|e| ConfigError::InvalidProperty {
                    key: key.to_string(),
                    reason: e.to_string(),
                }),
        }
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get(key).and_then(|v| v.as_str().map(String::from))
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(toml::Value::as_bool)
    }

    pub fn get_integer(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(toml::Value::as_integer)
    }

    /// The sub-tree under `prefix`, or an empty configuration.
    pub fn sub(&self, prefix: &str) -> Configuration {
        match self.get(prefix) {
            Some(toml::Value::Table(table)) => Self::from_table(table.clone()),
            _ => Self::new(),
        }
    }

    /// Merge `other` over `self`. Tables merge recursively; `other` wins on
    /// conflicting leaves.
    pub fn merged_with(&self, other: &Configuration) -> Configuration {
        let mut values = self.values.clone();
        merge_tables(&mut values, &other.values);
        Self { values }
    }

    /// Top-level keys (sorted).
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.values.keys().map(String::as_str).collect();
        keys.sort();
        keys
    }

    pub fn as_table(&self) -> &toml::Table {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn merge_tables(base: &mut toml::Table, overlay: &toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

/// A declared configuration property.
///
/// ```
/// use converge_extensions::{ConfigProperty, Configuration};
///
/// let partitions = ConfigProperty::<i64>::new("default-partitions")
///     .with_description("Partitions used when a topic omits them")
///     .with_default(1);
///
/// assert_eq!(partitions.get(&Configuration::new()).unwrap(), 1);
///
/// let config = Configuration::new().with("default-partitions", 6);
/// assert_eq!(partitions.get(&config).unwrap(), 6);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigProperty<T> {
    key: String,
    description: String,
    default: Option<T>,
    required: bool,
}

impl<T: DeserializeOwned + Clone> ConfigProperty<T> {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            description: String::new(),
            default: None,
            required: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_default(mut self, default: T) -> Self {
        self.default = Some(default);
        self
    }

    /// Mark the property as required: absent with no default is an error
    /// even through [`get_optional`](Self::get_optional).
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn default_value(&self) -> Option<&T> {
        self.default.as_ref()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// The configured value, else the declared default.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingProperty` when neither exists and
    /// `ConfigError::InvalidProperty` when the value has the wrong type.
    pub fn get(&self, config: &Configuration) -> Result<T, ConfigError> {
        self.get_optional(config)?
            .ok_or_else(|| ConfigError::MissingProperty {
                key: self.key.clone(),
            })
    }

    /// The configured value, else the declared default, else `None`.
    pub fn get_optional(&self, config: &Configuration) -> Result<Option<T>, ConfigError> {
        match config.get_as::<T>(&self.key)? {
            Some(value) => Ok(Some(value)),
            None => match (&self.default, self.required) {
                (Some(default), _) => Ok(Some(default.clone())),
                (None, true) => Err(ConfigError::MissingProperty {
                    key: self.key.clone(),
                }),
                (None, false) => Ok(None),
            },
        }
    }
}
