// schema/mod.rs — shared data model for both asset representations.
//
// The internal (editor) format and the native (engine) format are both
// JSON trees; the types here capture the small fixed-shape records they
// share and the category system that decides which translation rules
// apply to a node.

use serde::{Deserialize, Serialize};

/// A material definition (solid/fluid pair) as the native format spells
/// it. The reverse transformer deserializes untyped material leaves
/// through this shape before unwrapping them to the solid name.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MaterialAsset {
    #[serde(rename = "Solid")]
    pub solid: String,
    #[serde(rename = "Fluid")]
    pub fluid: String,
}

/// Category of an asset node. Disjoint sub-schemas: a node's category is
/// fixed across both representations and selects which type/field rules
/// apply to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Density,
    Curve,
    MaterialProvider,
    Pattern,
    PositionProvider,
    Prop,
    Scanner,
    Assignment,
    VectorProvider,
    EnvironmentProvider,
    TintProvider,
    BlockMask,
    Directionality,
}

impl Category {
    /// The `Category:` prefix used by internal tags, `None` for the
    /// default density category (density tags are bare names).
    pub fn internal_prefix(self) -> Option<&'static str> {
        match self {
            Category::Density => None,
            Category::Curve => Some("Curve"),
            Category::MaterialProvider => Some("Material"),
            Category::Pattern => Some("Pattern"),
            Category::PositionProvider => Some("Position"),
            Category::Prop => Some("Prop"),
            Category::Scanner => Some("Scanner"),
            Category::Assignment => Some("Assignment"),
            Category::VectorProvider => Some("Vector"),
            Category::EnvironmentProvider => Some("Environment"),
            Category::TintProvider => Some("Tint"),
            Category::BlockMask => Some("BlockMask"),
            Category::Directionality => Some("Directionality"),
        }
    }

    /// Spelling used inside native `$NodeId` strings (dotted suffix on
    /// non-density identifiers, substring hint on the reverse path).
    pub fn native_label(self) -> &'static str {
        match self {
            Category::Density => "DensityNode",
            Category::Curve => "Curve",
            Category::MaterialProvider => "MaterialProvider",
            Category::Pattern => "Pattern",
            Category::PositionProvider => "PositionProvider",
            Category::Prop => "Prop",
            Category::Scanner => "Scanner",
            Category::Assignment => "Assignment",
            Category::VectorProvider => "VectorProvider",
            Category::EnvironmentProvider => "EnvironmentProvider",
            Category::TintProvider => "TintProvider",
            Category::BlockMask => "BlockMask",
            Category::Directionality => "Directionality",
        }
    }

    /// Whether native nodes of this category carry a `Skip` flag.
    /// Curves are value tables, not evaluation nodes, and have none.
    pub fn uses_skip(self) -> bool {
        !matches!(self, Category::Curve)
    }

    /// Map an internal tag prefix back to its category.
    pub fn from_internal_prefix(prefix: &str) -> Option<Category> {
        Some(match prefix {
            "Curve" => Category::Curve,
            "Material" => Category::MaterialProvider,
            "Pattern" => Category::Pattern,
            "Position" => Category::PositionProvider,
            "Prop" => Category::Prop,
            "Scanner" => Category::Scanner,
            "Assignment" => Category::Assignment,
            "Vector" => Category::VectorProvider,
            "Environment" => Category::EnvironmentProvider,
            "Tint" => Category::TintProvider,
            "BlockMask" => Category::BlockMask,
            "Directionality" => Category::Directionality,
            _ => return None,
        })
    }
}

/// A node tag parsed once at the translator boundary: the closed category
/// plus the operation name with any category prefix stripped. Carried
/// through recursion instead of re-deriving it from strings at each step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeTag {
    pub category: Category,
    pub op: String,
}

impl NodeTag {
    /// Parse an internal `Type` tag given the category the enclosing
    /// context resolved. A `Category:Name` prefix on the tag wins over
    /// the contextual category; a bare name keeps it.
    pub fn parse_internal(tag: &str, context_category: Category) -> NodeTag {
        if let Some((prefix, op)) = tag.split_once(':') {
            if let Some(category) = Category::from_internal_prefix(prefix) {
                return NodeTag {
                    category,
                    op: op.to_string(),
                };
            }
        }
        NodeTag {
            category: context_category,
            op: tag.to_string(),
        }
    }

    /// Spell this tag the way the internal format writes it.
    pub fn internal_tag(&self) -> String {
        match self.category.internal_prefix() {
            Some(prefix) => format!("{}:{}", prefix, self.op),
            None => self.op.clone(),
        }
    }
}
