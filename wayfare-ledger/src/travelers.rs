use wayfare_shared::{TravelerConfig, SELF_TRAVELER};

/// Known traveler names; always contains the self traveler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TravelerRegistry {
    names: Vec<String>,
}

impl Default for TravelerRegistry {
    fn default() -> Self {
        Self {
            names: vec![SELF_TRAVELER.to_string()],
        }
    }
}

impl TravelerRegistry {
    pub fn from_config(config: TravelerConfig) -> Self {
        let mut registry = Self::default();
        for name in config.available_travelers {
            registry.add(&name);
        }
        registry
    }

    pub fn to_config(&self) -> TravelerConfig {
        TravelerConfig {
            available_travelers: self.names.clone(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Returns false for blank or already known names.
    pub fn add(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.contains(name) {
            return false;
        }
        self.names.push(name.to_string());
        true
    }

    /// The self traveler can't be removed.
    pub fn remove(&mut self, name: &str) -> bool {
        if name == SELF_TRAVELER {
            return false;
        }
        let before = self.names.len();
        self.names.retain(|n| n != name);
        self.names.len() != before
    }
}
