use std::{fs, io, path::Path};

use alchemy_core::{Element, IconKey};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{CatalogError, Registry};

/// Catalog file consulted when no explicit path is provided.
pub const DEFAULT_CATALOG_PATH: &str = "Elements.json";

/// Serializable description of every element and combination rule.
///
/// Keys use the PascalCase layout of existing `Elements.json` files.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogDocument {
    /// Element definitions in registration order.
    #[serde(rename = "Elements")]
    pub elements: Vec<ElementEntry>,
    /// Combination rules in registration order.
    #[serde(rename = "ElementCombinations")]
    pub combinations: Vec<CombinationEntry>,
}

/// Serialized element definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElementEntry {
    /// Display name and catalog key.
    #[serde(rename = "Name")]
    pub name: String,
    /// Icon key resolved by the rendering backend.
    #[serde(rename = "TextureName")]
    pub icon: String,
    /// Whether the element is always offered to the player.
    #[serde(rename = "IsBaseElement", default)]
    pub is_base: bool,
}

impl ElementEntry {
    fn new(name: &str, icon: &str, is_base: bool) -> Self {
        Self {
            name: name.to_owned(),
            icon: icon.to_owned(),
            is_base,
        }
    }
}

/// Serialized combination rule referencing elements by name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CombinationEntry {
    /// First source element.
    #[serde(rename = "Element1")]
    pub first: String,
    /// Second source element.
    #[serde(rename = "Element2")]
    pub second: String,
    /// Names of the produced elements; duplicates produce several units.
    #[serde(rename = "Products")]
    pub products: Vec<String>,
}

impl CombinationEntry {
    fn new(first: &str, second: &str, products: &[&str]) -> Self {
        Self {
            first: first.to_owned(),
            second: second.to_owned(),
            products: products.iter().map(|product| (*product).to_owned()).collect(),
        }
    }
}

impl CatalogDocument {
    /// Catalog written on first launch: four base elements and seven rules.
    #[must_use]
    pub fn default_catalog() -> Self {
        Self {
            elements: vec![
                ElementEntry::new("Water", "water", true),
                ElementEntry::new("Fire", "fire", true),
                ElementEntry::new("Air", "air", true),
                ElementEntry::new("Earth", "earth", true),
                ElementEntry::new("Steam", "steam", false),
                ElementEntry::new("Mud", "mud", false),
                ElementEntry::new("Dust", "dust", false),
                ElementEntry::new("Sand", "sand", false),
                ElementEntry::new("Glass", "glass", false),
                ElementEntry::new("Obsidian", "obsidian", false),
                ElementEntry::new("Lava", "lava", false),
            ],
            combinations: vec![
                CombinationEntry::new("Fire", "Earth", &["Lava"]),
                CombinationEntry::new("Fire", "Sand", &["Glass"]),
                CombinationEntry::new("Fire", "Water", &["Steam", "Steam"]),
                CombinationEntry::new("Water", "Earth", &["Mud"]),
                CombinationEntry::new("Water", "Lava", &["Obsidian"]),
                CombinationEntry::new("Earth", "Air", &["Dust"]),
                CombinationEntry::new("Dust", "Dust", &["Sand"]),
            ],
        }
    }

    /// Parses a catalog document from JSON text.
    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(contents)
    }

    /// Encodes the document as indented JSON.
    pub fn to_json_pretty(&self) -> Result<String, CatalogError> {
        serde_json::to_string_pretty(self).map_err(CatalogError::Encode)
    }

    /// Builds a registry, resolving every rule by element name.
    ///
    /// Loading stops at the first invalid entry: unknown names, rules without
    /// products, duplicate element names and duplicate pairs are all fatal.
    pub fn to_registry(&self) -> Result<Registry, CatalogError> {
        let mut registry = Registry::new();
        for entry in &self.elements {
            registry.register_element(Element::new(
                entry.name.as_str(),
                IconKey::new(&entry.icon),
                entry.is_base,
            ))?;
        }

        for rule in &self.combinations {
            if rule.products.is_empty() {
                return Err(CatalogError::EmptyProducts {
                    first: rule.first.clone(),
                    second: rule.second.clone(),
                });
            }

            let first = resolve(&registry, &rule.first)?;
            let second = resolve(&registry, &rule.second)?;
            let products = rule
                .products
                .iter()
                .map(|product| resolve(&registry, product))
                .collect::<Result<Vec<_>, _>>()?;
            registry.register(&first, &second, products)?;
        }

        Ok(registry)
    }

    /// Reads a catalog document from disk.
    pub fn read(path: &Path) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents).map_err(|source| CatalogError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Writes the document to disk as indented JSON.
    pub fn write(&self, path: &Path) -> Result<(), CatalogError> {
        let json = self.to_json_pretty()?;
        fs::write(path, json).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads the catalog at `path`, writing the default catalog first when the
    /// file does not exist yet.
    pub fn load_or_create(path: &Path) -> Result<Registry, CatalogError> {
        match fs::metadata(path) {
            Ok(_) => {}
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "catalog missing; writing default catalog");
                Self::default_catalog().write(path)?;
            }
            Err(source) => {
                return Err(CatalogError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }

        let registry = Self::read(path)?.to_registry()?;
        debug!(
            path = %path.display(),
            elements = registry.elements().len(),
            combinations = registry.combination_count(),
            "catalog loaded"
        );
        Ok(registry)
    }
}

fn resolve(registry: &Registry, name: &str) -> Result<Element, CatalogError> {
    registry
        .find_by_name(name)
        .cloned()
        .ok_or_else(|| CatalogError::UnknownElementReference {
            name: name.to_owned(),
        })
}
