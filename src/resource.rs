//! JSON Resource Descriptor (JRD) types.
//!
//! Optional members are skipped when empty so a minimal resource encodes as
//! `{"links":[...]}`. Maps are ordered, which keeps the encoded output
//! deterministic.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Property map; a `null` value is meaningful in JRD and is preserved
pub type Properties = BTreeMap<String, Option<String>>;

/// Link relation type requested through the `rel` query parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rel(pub String);

impl Rel {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Rel {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for Rel {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for Rel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single JRD link
///
/// The relation type is emitted under the `ref` key for compatibility with
/// existing consumers of this service; `rel` is accepted when reading.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(rename = "ref", alias = "rel")]
    pub rel: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: Properties,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub titles: BTreeMap<String, String>,
}

impl Link {
    /// Link with only `href` and relation type set
    pub fn new(rel: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            rel: rel.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    #[must_use]
    pub fn with_title(mut self, lang: impl Into<String>, title: impl Into<String>) -> Self {
        self.titles.insert(lang.into(), title.into());
        self
    }

    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: Option<String>) -> Self {
        self.properties.insert(key.into(), value);
        self
    }
}

/// The JRD body returned for a resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: Properties,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl Resource {
    pub fn with_links(links: Vec<Link>) -> Self {
        Self {
            links,
            ..Self::default()
        }
    }
}

/// Ordered relation types taken from repeated `rel` parameters
///
/// An empty filter selects every link.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationFilter(Vec<Rel>);

impl RelationFilter {
    pub fn new(rels: Vec<Rel>) -> Self {
        Self(rels)
    }

    pub fn rels(&self) -> &[Rel] {
        &self.0
    }

    pub fn matches(&self, link: &Link) -> bool {
        self.0.is_empty() || self.0.iter().any(|r| r.as_str() == link.rel)
    }

    /// Drop links outside the filter, keeping the resolver's link order
    pub fn apply(&self, resource: &mut Resource) {
        if self.0.is_empty() {
            return;
        }
        resource.links.retain(|link| self.matches(link));
    }
}

impl FromIterator<Rel> for RelationFilter {
    fn from_iter<I: IntoIterator<Item = Rel>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
