use super::config::{InteractionMode, PairSettings};
use super::error::EngineError;
use super::pair::{PairStyle, SplitRangePair};
use std::collections::HashMap;

/// Constructs a style for `ntypes` atom types from parsed settings.
pub type StyleFactory = fn(PairSettings, usize) -> Result<Box<dyn PairStyle>, EngineError>;

pub const LJ_LONG_COUL_LONG: &str = "lj/long/coul/long";
pub const LJ_CUT_COUL_LONG: &str = "lj/cut/coul/long";

fn lj_long_coul_long(
    settings: PairSettings,
    ntypes: usize,
) -> Result<Box<dyn PairStyle>, EngineError> {
    Ok(Box::new(SplitRangePair::new(
        LJ_LONG_COUL_LONG,
        settings,
        ntypes,
    )))
}

/// Fixed-mode variant: plain cut LJ with split Coulomb.
fn lj_cut_coul_long(
    mut settings: PairSettings,
    ntypes: usize,
) -> Result<Box<dyn PairStyle>, EngineError> {
    settings.dispersion = InteractionMode::Cut;
    settings.coulomb = InteractionMode::Long;
    Ok(Box::new(SplitRangePair::new(
        LJ_CUT_COUL_LONG,
        settings,
        ntypes,
    )))
}

/// Pair styles available by name.
#[derive(Debug, Clone)]
pub struct StyleRegistry {
    factories: HashMap<String, StyleFactory>,
}

impl StyleRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(LJ_LONG_COUL_LONG, lj_long_coul_long);
        registry.register(LJ_CUT_COUL_LONG, lj_cut_coul_long);
        registry
    }

    /// Adds or replaces a style; returns the previous factory under that name.
    pub fn register(&mut self, name: &str, factory: StyleFactory) -> Option<StyleFactory> {
        self.factories.insert(name.to_string(), factory)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn create(
        &self,
        name: &str,
        settings: PairSettings,
        ntypes: usize,
    ) -> Result<Box<dyn PairStyle>, EngineError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| EngineError::UnknownStyle(name.to_string()))?;
        factory(settings, ntypes)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for StyleRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}
