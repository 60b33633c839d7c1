//! Port registry
//!
//! The ordered set of named ports to monitor. Names are unique; port
//! numbers may repeat across names.

use crate::error::PortWatchError;

/// A named port to monitor
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PortSpec {
    /// Display name, unique within a registry
    pub name: String,
    /// Local TCP port
    pub port: u16,
}

impl PortSpec {
    pub fn new(name: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            port,
        }
    }
}

impl std::fmt::Display for PortSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.port)
    }
}

/// Ordered collection of port specs keyed by name
///
/// Iteration follows insertion order, so cycles over an unchanged
/// registry produce batches in the same order every time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    specs: Vec<PortSpec>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry, rejecting duplicate names
    pub fn from_specs<I>(specs: I) -> Result<Self, PortWatchError>
    where
        I: IntoIterator<Item = PortSpec>,
    {
        let mut registry = Self::new();
        for spec in specs {
            registry.add(spec)?;
        }
        Ok(registry)
    }

    /// Append a spec; fails if the name is already taken
    pub fn add(&mut self, spec: PortSpec) -> Result<(), PortWatchError> {
        if self.contains(&spec.name) {
            return Err(PortWatchError::DuplicateName(spec.name));
        }
        self.specs.push(spec);
        Ok(())
    }

    /// Remove a spec by name, returning it if it was present
    pub fn remove(&mut self, name: &str) -> Option<PortSpec> {
        let index = self.specs.iter().position(|s| s.name == name)?;
        Some(self.specs.remove(index))
    }

    pub fn get(&self, name: &str) -> Option<&PortSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PortSpec> {
        self.specs.iter()
    }

    /// Names in registry order
    pub fn names(&self) -> Vec<&str> {
        self.specs.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = &'a PortSpec;
    type IntoIter = std::slice::Iter<'a, PortSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
