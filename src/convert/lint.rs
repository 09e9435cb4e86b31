// convert/lint.rs — explicitly-invoked export lint.
//
// The transformers never reject input; this pass is the one place that
// looks for problems, and it only reports them. Warnings are plain
// human-readable strings for the editor's export dialog.

use serde_json::Value;

use crate::convert::fields::node_type;

/// Lint an internal tree before export. Returns warnings, never fails.
pub fn lint_export(tree: &Value) -> Vec<String> {
    let mut warnings = Vec::new();
    walk(tree, "root", &mut warnings);
    warnings
}

/// Lint a composite biome wrapper: everything `lint_export` checks, plus
/// the sub-trees a complete biome needs.
pub fn lint_biome_export(wrapper: &Value) -> Vec<String> {
    let mut warnings = Vec::new();
    match wrapper.as_object() {
        Some(fields) => {
            match fields.get("Name").and_then(|v| v.as_str()) {
                Some("") | None => warnings.push("biome has no name".to_string()),
                _ => {}
            }
            if !fields.contains_key("Terrain") {
                warnings.push("biome is missing its terrain density tree".to_string());
            }
            if !fields.contains_key("MaterialProvider") {
                warnings.push("biome is missing its material provider".to_string());
            }
            walk(wrapper, "root", &mut warnings);
        }
        None => warnings.push("biome wrapper is not an object".to_string()),
    }
    warnings
}

fn walk(value: &Value, path: &str, warnings: &mut Vec<String>) {
    match value {
        Value::Object(obj) => {
            if let Some("") = node_type(value) {
                warnings.push(format!("{}: node has an empty Type tag", path));
            }
            for (key, child) in obj {
                let child_path = format!("{}.{}", path, key);
                if child.is_null() {
                    warnings.push(format!("{}: field is null", child_path));
                    continue;
                }
                if is_material_field(key) {
                    if let Some("") = child.as_str() {
                        warnings.push(format!("{}: material name is empty", child_path));
                    }
                }
                walk(child, &child_path, warnings);
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                walk(item, &format!("{}[{}]", path, i), warnings);
            }
        }
        _ => {}
    }
}

fn is_material_field(key: &str) -> bool {
    matches!(
        key,
        "Material"
            | "TrueMaterial"
            | "FalseMaterial"
            | "HighMaterial"
            | "LowMaterial"
            | "SurfaceMaterial"
            | "DepthMaterial"
            | "FluidMaterial"
    )
}
