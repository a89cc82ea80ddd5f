//! Writer configuration
//!
//! Configuration is read from `cds-edit.json` or `cds-edit.toml` files and
//! merged with the defaults below. All fields are optional in files; the
//! accessor methods resolve the effective value.
//!
//! ```jsonc
//! {
//!   "indentStyle": "spaces",
//!   "indentSize": 4,
//!   "vocabularyAliases": {
//!     "com.sap.vocabularies.UI.v1": "UI"
//!   },
//!   "project": {
//!     "isolatedRoots": ["app/admin", "app/browse"]
//!   }
//! }
//! ```

mod loader;

pub use loader::ConfigLoader;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const DEFAULT_INDENT_SIZE: usize = 4;

/// Indent style for inserted text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum IndentStyle {
    /// Use spaces for indentation
    Spaces,
    /// Use tabs for indentation
    Tabs,
}

/// Configuration of the edit synthesizer
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WriterConfiguration {
    /// Indent style (spaces or tabs)
    #[schemars(description = "Indentation style: 'spaces' or 'tabs'")]
    pub indent_style: Option<IndentStyle>,

    /// Indentation width; also used to derive indent levels from columns
    #[schemars(description = "Number of spaces per indentation level")]
    pub indent_size: Option<usize>,

    /// Vocabulary namespace to alias mapping
    #[schemars(description = "Map of vocabulary namespaces to their aliases")]
    pub vocabulary_aliases: Option<BTreeMap<String, String>>,

    /// Project layout
    #[schemars(description = "Layout of the project the documents belong to")]
    pub project: Option<ProjectLayout>,
}

/// Project layout relevant to cross-file references
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectLayout {
    /// Uri prefixes of top-level units that must not import each other
    #[schemars(description = "Uri prefixes of isolated top-level units")]
    #[serde(default)]
    pub isolated_roots: Vec<String>,
}

impl ProjectLayout {
    /// Isolated unit a uri belongs to (the longest matching root)
    pub fn unit_of(&self, uri: &str) -> Option<&str> {
        self.isolated_roots
            .iter()
            .filter(|root| {
                uri.strip_prefix(root.as_str())
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
            })
            .max_by_key(|root| root.len())
            .map(String::as_str)
    }

    /// Check if a reference from one uri to another leaves its isolated unit
    pub fn crosses_boundary(&self, from: &str, to: &str) -> bool {
        match (self.unit_of(from), self.unit_of(to)) {
            (Some(a), Some(b)) => a != b,
            _ => false,
        }
    }
}

impl Default for WriterConfiguration {
    fn default() -> Self {
        Self {
            indent_style: Some(IndentStyle::Spaces),
            indent_size: Some(DEFAULT_INDENT_SIZE),
            vocabulary_aliases: Some(default_vocabulary_aliases()),
            project: Some(ProjectLayout::default()),
        }
    }
}

/// Aliases of the standard vocabularies
pub fn default_vocabulary_aliases() -> BTreeMap<String, String> {
    [
        ("Org.OData.Aggregation.V1", "Aggregation"),
        ("com.sap.vocabularies.Analytics.v1", "Analytics"),
        ("Org.OData.Capabilities.V1", "Capabilities"),
        ("com.sap.vocabularies.Common.v1", "Common"),
        ("com.sap.vocabularies.Communication.v1", "Communication"),
        ("Org.OData.Core.V1", "Core"),
        ("com.sap.vocabularies.HTML5.v1", "HTML5"),
        ("Org.OData.Measures.V1", "Measures"),
        ("com.sap.vocabularies.PersonalData.v1", "PersonalData"),
        ("com.sap.vocabularies.Session.v1", "Session"),
        ("com.sap.vocabularies.UI.v1", "UI"),
        ("Org.OData.Validation.V1", "Validation"),
    ]
    .into_iter()
    .map(|(namespace, alias)| (namespace.to_string(), alias.to_string()))
    .collect()
}

impl WriterConfiguration {
    pub fn indent_style(&self) -> IndentStyle {
        self.indent_style.unwrap_or(IndentStyle::Spaces)
    }

    pub fn indent_size(&self) -> usize {
        self.indent_size
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_INDENT_SIZE)
    }

    /// Text of one indentation unit
    pub fn indent_unit(&self) -> String {
        match self.indent_style() {
            IndentStyle::Spaces => " ".repeat(self.indent_size()),
            IndentStyle::Tabs => "\t".to_string(),
        }
    }

    /// Text of `level` indentation units
    pub fn indent(&self, level: usize) -> String {
        self.indent_unit().repeat(level)
    }

    pub fn project(&self) -> ProjectLayout {
        self.project.clone().unwrap_or_default()
    }

    pub fn aliases(&self) -> VocabularyAliases {
        VocabularyAliases::new(
            self.vocabulary_aliases
                .clone()
                .unwrap_or_else(default_vocabulary_aliases),
        )
    }

    /// Merge another configuration into this one (current takes precedence)
    pub fn merge_with(&mut self, other: WriterConfiguration) {
        if self.indent_style.is_none() {
            self.indent_style = other.indent_style;
        }
        if self.indent_size.is_none() {
            self.indent_size = other.indent_size;
        }
        match (&mut self.vocabulary_aliases, other.vocabulary_aliases) {
            (Some(aliases), Some(other_aliases)) => {
                for (namespace, alias) in other_aliases {
                    aliases.entry(namespace).or_insert(alias);
                }
            }
            (None, other_aliases) => self.vocabulary_aliases = other_aliases,
            _ => {}
        }
        if self.project.is_none() {
            self.project = other.project;
        }
    }
}

/// Lookup between vocabulary namespaces and their aliases
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VocabularyAliases {
    by_namespace: BTreeMap<String, String>,
}

impl VocabularyAliases {
    pub fn new(by_namespace: BTreeMap<String, String>) -> Self {
        Self { by_namespace }
    }

    pub fn is_alias(&self, name: &str) -> bool {
        self.by_namespace.values().any(|alias| alias == name)
    }

    /// Replace a leading vocabulary namespace with its alias
    ///
    /// `com.sap.vocabularies.UI.v1.LineItem` becomes `UI.LineItem`; names
    /// without a known namespace are returned unchanged.
    pub fn shorten(&self, name: &str) -> String {
        self.by_namespace
            .iter()
            .filter_map(|(namespace, alias)| {
                name.strip_prefix(namespace.as_str())
                    .and_then(|rest| rest.strip_prefix('.'))
                    .map(|rest| (namespace.len(), format!("{alias}.{rest}")))
            })
            .max_by_key(|(length, _)| *length)
            .map(|(_, shortened)| shortened)
            .unwrap_or_else(|| name.to_string())
    }

    /// Check if a name starts with a known alias or namespace
    pub fn is_qualified(&self, name: &str) -> bool {
        let shortened = self.shorten(name);
        shortened
            .split_once('.')
            .is_some_and(|(head, _)| self.is_alias(head))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WriterConfiguration::default();
        assert_eq!(config.indent_size(), 4);
        assert_eq!(config.indent(2), "        ");
        assert!(config.aliases().is_alias("UI"));
    }

    #[test]
    fn test_tabs() {
        let config = WriterConfiguration {
            indent_style: Some(IndentStyle::Tabs),
            ..Default::default()
        };
        assert_eq!(config.indent(2), "\t\t");
    }

    #[test]
    fn test_shorten_namespaces() {
        let aliases = WriterConfiguration::default().aliases();
        assert_eq!(aliases.shorten("com.sap.vocabularies.UI.v1.LineItem"), "UI.LineItem");
        assert_eq!(aliases.shorten("UI.LineItem"), "UI.LineItem");
        assert_eq!(aliases.shorten("my.Term"), "my.Term");
        assert!(aliases.is_qualified("Common.Label"));
        assert!(!aliases.is_qualified("Label"));
    }

    #[test]
    fn test_isolated_units() {
        let layout = ProjectLayout {
            isolated_roots: vec!["app/admin".into(), "app/browse".into()],
        };
        assert_eq!(layout.unit_of("app/admin/annotations.cds"), Some("app/admin"));
        assert_eq!(layout.unit_of("app/admin2/annotations.cds"), None);
        assert!(layout.crosses_boundary("app/admin/a.cds", "app/browse/b.cds"));
        assert!(!layout.crosses_boundary("app/admin/a.cds", "srv/service.cds"));
    }
}
