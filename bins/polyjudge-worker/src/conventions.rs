// Identifier naming per target language.
// Plan identifiers are snake_case; adapters pick a convention per category.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Conventionable {
    Namespace,
    Identifier,
    GlobalIdentifier,
    Function,
    Class,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingConvention {
    SnakeCase,
    CamelCase,
    PascalCase,
    MacroCase,
    CamelSnakeCase,
}

impl NamingConvention {
    pub fn apply(&self, name: &str) -> String {
        let words: Vec<&str> = name.split('_').filter(|w| !w.is_empty()).collect();
        match self {
            NamingConvention::SnakeCase => words.iter().map(|w| w.to_lowercase()).collect::<Vec<_>>().join("_"),
            NamingConvention::MacroCase => words.iter().map(|w| w.to_uppercase()).collect::<Vec<_>>().join("_"),
            NamingConvention::PascalCase => words.iter().map(|w| capitalize(w)).collect(),
            NamingConvention::CamelCase => words
                .iter()
                .enumerate()
                .map(|(i, w)| if i == 0 { w.to_lowercase() } else { capitalize(w) })
                .collect(),
            NamingConvention::CamelSnakeCase => words.iter().map(|w| capitalize(w)).collect::<Vec<_>>().join("_"),
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Conventions for every category, with overrides layered on snake_case
#[derive(Debug, Clone, PartialEq)]
pub struct NamingConventions {
    conventions: BTreeMap<Conventionable, NamingConvention>,
}

impl NamingConventions {
    pub fn with_overrides(overrides: &[(Conventionable, NamingConvention)]) -> Self {
        let mut conventions = BTreeMap::from([
            (Conventionable::Namespace, NamingConvention::SnakeCase),
            (Conventionable::Identifier, NamingConvention::SnakeCase),
            (Conventionable::GlobalIdentifier, NamingConvention::SnakeCase),
            (Conventionable::Function, NamingConvention::SnakeCase),
            (Conventionable::Class, NamingConvention::PascalCase),
        ]);
        conventions.extend(overrides.iter().copied());
        Self { conventions }
    }

    pub fn get(&self, category: Conventionable) -> NamingConvention {
        self.conventions.get(&category).copied().unwrap_or(NamingConvention::SnakeCase)
    }

    pub fn apply(&self, category: Conventionable, name: &str) -> String {
        self.get(category).apply(name)
    }
}
