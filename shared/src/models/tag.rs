//! Category/Type Tag Model

use super::{BreedId, TagId};
use serde::{Deserialize, Serialize};

/// The two tag families a breed can be filed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagKind {
    Category,
    Type,
}

impl TagKind {
    pub const ALL: [TagKind; 2] = [TagKind::Category, TagKind::Type];

    /// Table holding the tags themselves
    pub fn table(&self) -> &'static str {
        match self {
            Self::Category => "breed_categories",
            Self::Type => "breed_types",
        }
    }

    /// Join table linking breeds to tags
    pub fn link_table(&self) -> &'static str {
        match self {
            Self::Category => "breed_category_links",
            Self::Type => "breed_type_links",
        }
    }
}

/// Tag entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
}

/// Join row between a breed and a tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TagLink {
    pub breed_id: BreedId,
    pub tag_id: TagId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables() {
        assert_eq!(TagKind::Category.table(), "breed_categories");
        assert_eq!(TagKind::Type.link_table(), "breed_type_links");
    }

    #[test]
    fn test_kind_serialize() {
        assert_eq!(serde_json::to_string(&TagKind::Type).unwrap(), "\"type\"");
    }
}
