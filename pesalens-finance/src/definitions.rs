//! Category definitions and the YAML documents they are loaded from.
//!
//! ```yaml
//! categories:
//!   - name: PayBillPayments
//!     type: Bills
//!     description: Pay Bill payments
//!     merchant_type: Biller
//!     color_map: Oranges
//!     entity_extraction: paybill      # optional
//!     direction: outbound             # optional
//!     patterns:
//!       details:
//!         contains: ["pay bill"]
//! ```

use pesalens_core::{Direction, Error, NO_DETAILS, Result, UNCATEGORIZED};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::entity::EntityStrategy;
use crate::rules::{MatchSpec, PatternField, Patterns};

/// A named rule describing which transactions belong to a bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDefinition {
    pub name: String,
    /// Grouping tag for display
    #[serde(rename = "type", default)]
    pub category_type: String,
    #[serde(default)]
    pub description: String,
    /// Label for the counterparty role (recipient, biller, ...)
    #[serde(default)]
    pub merchant_type: String,
    /// Presentation hint; also implies the direction when none is declared
    #[serde(default)]
    pub color_map: String,
    pub patterns: Patterns,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_extraction: Option<EntityStrategy>,
}

impl CategoryDefinition {
    pub fn new(name: impl Into<String>, category_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category_type: category_type.into(),
            description: String::new(),
            merchant_type: String::new(),
            color_map: String::new(),
            patterns: Patterns::new(),
            direction: None,
            entity_extraction: None,
        }
    }

    pub fn with_pattern(mut self, field: PatternField, spec: MatchSpec) -> Self {
        self.patterns = self.patterns.with(field, spec);
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn with_entity_extraction(mut self, strategy: EntityStrategy) -> Self {
        self.entity_extraction = Some(strategy);
        self
    }

    pub fn with_color_map(mut self, color_map: impl Into<String>) -> Self {
        self.color_map = color_map.into();
        self
    }

    /// Declared direction, else inbound for a `Greens` colour map and
    /// outbound for anything else.
    pub fn direction(&self) -> Direction {
        self.direction
            .unwrap_or_else(|| Direction::from_money_in(self.color_map.eq_ignore_ascii_case("greens")))
    }

    /// Declared strategy, else the one implied by the category name.
    pub fn entity_strategy(&self) -> EntityStrategy {
        self.entity_extraction
            .unwrap_or_else(|| EntityStrategy::for_category_name(&self.name))
    }
}

#[derive(Debug, Deserialize)]
struct CategoryDocument {
    categories: Vec<CategoryDefinition>,
}

/// Parse a YAML category document.
pub fn parse_definitions(yaml: &str) -> Result<Vec<CategoryDefinition>> {
    let doc: CategoryDocument = serde_yaml::from_str(yaml)
        .map_err(|e| Error::DefinitionLoad(format!("invalid category document: {e}")))?;
    debug!("Found {} categories in document", doc.categories.len());
    Ok(doc.categories)
}

/// Read and parse a YAML category file.
pub fn load_definitions(path: impl AsRef<Path>) -> Result<Vec<CategoryDefinition>> {
    let path = path.as_ref();
    info!("Loading category definitions from: {}", path.display());
    let yaml = std::fs::read_to_string(path)
        .map_err(|e| Error::DefinitionLoad(format!("reading {}: {e}", path.display())))?;
    parse_definitions(&yaml)
        .map_err(|e| Error::DefinitionLoad(format!("{}: {e}", path.display())))
}

/// Ordered, name-unique list of category definitions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategorySet {
    definitions: Vec<CategoryDefinition>,
}

impl CategorySet {
    /// Validate and wrap `definitions`. Names must be non-empty, unique and
    /// distinct from the `NoDetails` / `uncategorized` sentinels.
    pub fn new(definitions: Vec<CategoryDefinition>) -> Result<Self> {
        let mut seen = HashSet::new();
        for def in &definitions {
            if def.name.trim().is_empty() {
                return Err(Error::DefinitionLoad("category with an empty name".to_string()));
            }
            if def.name == NO_DETAILS || def.name == UNCATEGORIZED {
                return Err(Error::DefinitionLoad(format!(
                    "'{}' is reserved and cannot be used as a category name",
                    def.name
                )));
            }
            if !seen.insert(def.name.as_str()) {
                return Err(Error::DuplicateCategory(def.name.clone()));
            }
            if def.patterns.is_empty() {
                warn!("Category '{}' has no patterns and will match everything", def.name);
            }
        }
        if definitions.is_empty() {
            warn!("No category definitions loaded");
        }
        Ok(Self { definitions })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(load_definitions(path)?)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Self::new(parse_definitions(yaml)?)
    }

    /// Put session-scoped `custom` definitions ahead of the current ones so
    /// they are evaluated first.
    pub fn with_custom(self, custom: Vec<CategoryDefinition>) -> Result<Self> {
        if custom.is_empty() {
            return Ok(self);
        }
        info!("Adding {} custom categories", custom.len());
        let mut definitions = custom;
        definitions.extend(self.definitions);
        Self::new(definitions)
    }

    pub fn definitions(&self) -> &[CategoryDefinition] {
        &self.definitions
    }

    pub fn get(&self, name: &str) -> Option<&CategoryDefinition> {
        self.definitions.iter().find(|d| d.name == name)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
