// convert/category.rs — category resolution for a single node.
//
// Three fallback strategies, in order: the enclosing parent field name,
// a `Category:` prefix on the declared tag, and (reverse path only) a
// substring scan of the native `$NodeId`. Density is the default.
// Resolution runs once per node, before any field rule, because several
// field rules are category-conditional.

use crate::schema::Category;

/// Map an enclosing field name to the category of the node it holds.
pub fn category_for_field(field: &str) -> Option<Category> {
    Some(match field {
        "MaterialProvider" | "Material" | "TrueMaterial" | "FalseMaterial" | "HighMaterial"
        | "LowMaterial" | "SurfaceMaterial" | "DepthMaterial" | "FluidMaterial" | "Layers"
        | "Entries" => Category::MaterialProvider,
        "Curve" | "AngleCurve" | "DistanceCurve" | "BlendCurve" | "CurveA" | "CurveB" => {
            Category::Curve
        }
        "Pattern" => Category::Pattern,
        "Positions" | "PositionProvider" => Category::PositionProvider,
        "Props" | "Prop" => Category::Prop,
        "Scanner" => Category::Scanner,
        "Assignments" | "Assignment" => Category::Assignment,
        "Vector" | "VectorProvider" => Category::VectorProvider,
        "Environment" | "EnvironmentProvider" => Category::EnvironmentProvider,
        "Tint" | "TintProvider" => Category::TintProvider,
        "BlockMask" | "Mask" => Category::BlockMask,
        "Directionality" => Category::Directionality,
        // Condition trees and arithmetic children are density functions.
        "Condition" | "Field" | "Input" | "InputA" | "InputB" | "Factor" | "TrueInput"
        | "FalseInput" | "WarpSource" | "Inputs" | "Terrain" | "TerrainDensity"
        | "FieldFunction" => Category::Density,
        _ => return None,
    })
}

/// Scan a native `$NodeId` for a category hint. Non-density identifiers
/// carry a dotted `<Type>.<Category>-<token>` suffix; older files spell
/// the material-provider label without the dot, so a plain substring
/// check covers both.
pub fn category_from_node_id(node_id: &str) -> Option<Category> {
    const HINTS: &[(&str, Category)] = &[
        ("MaterialProvider", Category::MaterialProvider),
        (".Pattern", Category::Pattern),
        (".Directionality", Category::Directionality),
        (".Curve", Category::Curve),
        (".PositionProvider", Category::PositionProvider),
        (".Prop", Category::Prop),
        (".Scanner", Category::Scanner),
        (".Assignment", Category::Assignment),
        (".VectorProvider", Category::VectorProvider),
        (".EnvironmentProvider", Category::EnvironmentProvider),
        (".TintProvider", Category::TintProvider),
        (".BlockMask", Category::BlockMask),
    ];
    HINTS
        .iter()
        .find(|(hint, _)| node_id.contains(hint))
        .map(|(_, cat)| *cat)
}

/// Resolve the category of a node. `parent_field` is the name of the
/// field holding the node (if any), `declared_tag` its `Type` value, and
/// `node_id_hint` the native `$NodeId` (reverse path only).
pub fn resolve(
    parent_field: Option<&str>,
    declared_tag: &str,
    node_id_hint: Option<&str>,
) -> Category {
    if let Some(cat) = parent_field.and_then(category_for_field) {
        return cat;
    }
    if let Some((prefix, _)) = declared_tag.split_once(':') {
        if let Some(cat) = Category::from_internal_prefix(prefix) {
            return cat;
        }
    }
    if let Some(cat) = node_id_hint.and_then(category_from_node_id) {
        return cat;
    }
    Category::Density
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_field_wins() {
        // Tag prefix says curve, but the enclosing field pins material.
        assert_eq!(
            resolve(Some("MaterialProvider"), "Curve:Manual", None),
            Category::MaterialProvider
        );
    }

    #[test]
    fn tag_prefix_applies_without_field() {
        assert_eq!(resolve(None, "Prop:Cluster", None), Category::Prop);
    }

    #[test]
    fn node_id_hint_is_last_resort() {
        assert_eq!(
            resolve(None, "SingleMaterial", Some("SingleMaterial.MaterialProvider-a1b2c3d4")),
            Category::MaterialProvider
        );
        assert_eq!(
            resolve(None, "UniformPattern", Some("UniformPattern.Pattern-00ff00ff")),
            Category::Pattern
        );
    }

    #[test]
    fn defaults_to_density() {
        assert_eq!(resolve(None, "Constant", None), Category::Density);
        assert_eq!(
            resolve(None, "Constant", Some("ConstantDensityNode-12345678")),
            Category::Density
        );
    }
}
