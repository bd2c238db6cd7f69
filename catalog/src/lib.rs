#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Element catalog and combination registry for Alchemy.
//!
//! The [`Registry`] is an explicitly constructed value owned by whoever loads
//! the catalog. It is read-mostly after loading and handed by reference to the
//! session and the interaction system. Combination lookup is symmetric: the
//! pair key is canonicalised by sorting the two element names, so `(A, B)` and
//! `(B, A)` always resolve to the same entry.

mod document;

use std::{collections::HashMap, path::PathBuf};

use alchemy_core::{Element, ElementName, IconKey};
use tracing::debug;

pub use self::document::{CatalogDocument, CombinationEntry, ElementEntry, DEFAULT_CATALOG_PATH};

/// Errors raised while building or loading a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// A combination for the unordered pair is already registered.
    #[error("combination `{first}` + `{second}` is already registered")]
    DuplicateCombination {
        /// First element of the rejected pair.
        first: ElementName,
        /// Second element of the rejected pair.
        second: ElementName,
    },
    /// Two element definitions share the same name.
    #[error("element `{name}` is defined more than once")]
    DuplicateElement {
        /// Name that was defined twice.
        name: ElementName,
    },
    /// A combination names an element the catalog does not define.
    #[error("combination references unknown element `{name}`")]
    UnknownElementReference {
        /// Name that failed to resolve.
        name: String,
    },
    /// A combination rule lists no products.
    #[error("combination `{first}` + `{second}` lists no products")]
    EmptyProducts {
        /// First element of the rule.
        first: String,
        /// Second element of the rule.
        second: String,
    },
    /// The catalog file could not be read or written.
    #[error("failed to access catalog file {}", path.display())]
    Io {
        /// Location of the catalog file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The catalog file does not contain a valid catalog document.
    #[error("failed to parse catalog file {}", path.display())]
    Parse {
        /// Location of the catalog file.
        path: PathBuf,
        /// Underlying JSON failure.
        #[source]
        source: serde_json::Error,
    },
    /// A catalog document could not be encoded.
    #[error("failed to encode catalog document")]
    Encode(#[source] serde_json::Error),
}

/// Registry of known elements and the combinations between them.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    elements: Vec<Element>,
    index: HashMap<ElementName, usize>,
    combinations: HashMap<(ElementName, ElementName), Vec<Element>>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an element definition.
    ///
    /// Names are catalog keys, so a second definition with the same name is
    /// rejected with [`CatalogError::DuplicateElement`].
    pub fn register_element(&mut self, element: Element) -> Result<(), CatalogError> {
        if self.index.contains_key(element.name()) {
            return Err(CatalogError::DuplicateElement {
                name: element.name().clone(),
            });
        }

        debug!(element = %element, base = element.is_base(), "registered element");
        self.push_element(element);
        Ok(())
    }

    /// Registers the products created by combining `first` with `second`.
    ///
    /// Fails with [`CatalogError::DuplicateCombination`] when either ordering
    /// of the pair is already present. Elements that are not yet known are
    /// added to the registry in the order they appear.
    pub fn register(
        &mut self,
        first: &Element,
        second: &Element,
        products: Vec<Element>,
    ) -> Result<(), CatalogError> {
        let key = pair_key(first.name(), second.name());
        if self.combinations.contains_key(&key) {
            return Err(CatalogError::DuplicateCombination {
                first: first.name().clone(),
                second: second.name().clone(),
            });
        }

        self.remember(first);
        self.remember(second);
        for product in &products {
            self.remember(product);
        }

        debug!(
            first = %first,
            second = %second,
            products = products.len(),
            "registered combination"
        );
        let _ = self.combinations.insert(key, products);
        Ok(())
    }

    /// Products of combining the two elements, in registration order.
    ///
    /// An unregistered pair yields an empty slice: the elements do not react.
    #[must_use]
    pub fn products_of(&self, first: &ElementName, second: &ElementName) -> &[Element] {
        self.combinations
            .get(&pair_key(first, second))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Elements that are always offered to the player, in registration order.
    #[must_use]
    pub fn base_elements(&self) -> Vec<&Element> {
        self.elements
            .iter()
            .filter(|element| element.is_base())
            .collect()
    }

    /// Looks up an element by its exact, case-sensitive display name.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&Element> {
        self.index
            .get(name)
            .and_then(|position| self.elements.get(*position))
    }

    /// Icon assigned to the named element, if the element is known.
    #[must_use]
    pub fn icon_of(&self, name: &ElementName) -> Option<&IconKey> {
        self.find_by_name(name.as_str()).map(Element::icon)
    }

    /// Every known element in registration order.
    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Number of registered combinations.
    #[must_use]
    pub fn combination_count(&self) -> usize {
        self.combinations.len()
    }

    fn remember(&mut self, element: &Element) {
        if !self.index.contains_key(element.name()) {
            self.push_element(element.clone());
        }
    }

    fn push_element(&mut self, element: Element) {
        let _ = self
            .index
            .insert(element.name().clone(), self.elements.len());
        self.elements.push(element);
    }
}

fn pair_key(first: &ElementName, second: &ElementName) -> (ElementName, ElementName) {
    if first <= second {
        (first.clone(), second.clone())
    } else {
        (second.clone(), first.clone())
    }
}
