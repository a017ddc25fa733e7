use indexmap::IndexMap;
use std::fmt;

/// A scalar value in one of the generated `key: value` files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue {
    Str(String),
    Bool(bool),
    Int(i64),
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Str(s) => f.write_str(s),
            ConfigValue::Bool(b) => write!(f, "{}", b),
            ConfigValue::Int(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::Str(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::Str(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<u16> for ConfigValue {
    fn from(value: u16) -> Self {
        ConfigValue::Int(i64::from(value))
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Int(value)
    }
}

/// Options for one target process, keyed in snake_case.
///
/// Insertion order is kept so the emitted file lists keys in the order they
/// were derived.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionSet {
    entries: IndexMap<String, ConfigValue>,
}

impl OptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a key. Replacing keeps the key's original position.
    pub fn set(&mut self, key: &str, value: impl Into<ConfigValue>) {
        self.entries.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.entries.get(key) {
            Some(ConfigValue::Str(s)) => Some(s),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.entries.get(key) {
            Some(ConfigValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.entries.get(key) {
            Some(ConfigValue::Int(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Copy of this set with `keys` removed, order of the rest untouched.
    pub fn without(&self, keys: &[&str]) -> OptionSet {
        let entries = self
            .entries
            .iter()
            .filter(|(k, _)| !keys.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        OptionSet { entries }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<ConfigValue>> FromIterator<(K, V)> for OptionSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        OptionSet {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_display() {
        assert_eq!(ConfigValue::from(true).to_string(), "true");
        assert_eq!(ConfigValue::from(18033u16).to_string(), "18033");
        assert_eq!(ConfigValue::from("regtest").to_string(), "regtest");
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut set = OptionSet::new();
        set.set("api_key", "a");
        set.set("network", "main");
        set.set("api_key", "b");

        let keys: Vec<_> = set.keys().collect();
        assert_eq!(keys, vec!["api_key", "network"]);
        assert_eq!(set.get_str("api_key"), Some("b"));
    }

    #[test]
    fn test_without_strips_keys() {
        let set: OptionSet = [("prune", true), ("spv", false), ("wallet", true)]
            .into_iter()
            .collect();
        let stripped = set.without(&["spv"]);

        assert!(!stripped.contains_key("spv"));
        assert_eq!(stripped.keys().collect::<Vec<_>>(), vec!["prune", "wallet"]);
        assert_eq!(set.len(), 3);
    }
}
