// convert/raise.rs — reverse transformer: native format → internal graph.
//
// Mirrors lower.rs in reverse order of concern. Compound shapes are
// detected before the plain type-rename table runs (after collapse the
// outer wrapper no longer exists), every `$NodeId`/`Skip`/`$Comment` is
// stripped recursively, material leaves unwrap to bare strings, and
// positional `Inputs[]` arrays are distributed back onto named fields.
// Metadata is returned as fragments and folded at the call site instead
// of being accumulated through a shared mutable bag.

use log::debug;
use serde_json::{Map, Value};

use crate::convert::category::resolve;
use crate::convert::fields::*;
use crate::convert::ids::comment_param;
use crate::convert::tables::*;
use crate::schema::{Category, MaterialAsset, NodeTag};

/// Metadata collected on the way up: `$Comment` text in encounter order.
#[derive(Debug, Default)]
pub struct Fragments {
    pub comments: Vec<String>,
}

impl Fragments {
    pub fn merge(&mut self, other: Fragments) {
        self.comments.extend(other.comments);
    }
}

/// Fold helper: absorb a child's fragments, keep its value.
fn fold(into: &mut Fragments, result: (Value, Fragments)) -> Value {
    let (value, fragments) = result;
    into.merge(fragments);
    value
}

/// Raise any native value appearing in a field position. A bare string
/// result represents an unwrapped material leaf.
pub fn raise_value(value: &Value, parent_field: Option<&str>) -> (Value, Fragments) {
    let mut fragments = Fragments::default();
    let raised = match value {
        Value::Object(obj) => match obj.get("Type").and_then(|t| t.as_str()) {
            Some(tag) => {
                let tag = tag.to_string();
                fold(&mut fragments, raise_node(obj, &tag, parent_field))
            }
            None => fold(&mut fragments, raise_untyped(obj)),
        },
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| fold(&mut fragments, raise_value(item, parent_field)))
                .collect(),
        ),
        other => other.clone(),
    };
    (raised, fragments)
}

/// Raise an object with no `Type` tag: unwrap material leaves, promote
/// bare vectors, otherwise strip metadata and recurse into the record.
fn raise_untyped(obj: &Fields) -> (Value, Fragments) {
    let mut fragments = Fragments::default();
    if let Some(Value::String(comment)) = obj.get("$Comment") {
        fragments.comments.push(comment.clone());
    }

    // Material leaf: an untyped `{Solid}` or `{Solid, Fluid}` record
    // unwraps to the solid name.
    if keys_match(obj, &["Solid"]) || keys_match(obj, &["Solid", "Fluid"]) {
        if let Ok(leaf) = serde_json::from_value::<MaterialAsset>(Value::Object(obj.clone())) {
            return (Value::String(leaf.solid), fragments);
        }
    }

    // Bare vector literal: the native format sometimes writes a plain
    // `{X, Y, Z}` record where the internal format expects a node.
    for (kx, ky, kz) in [("X", "Y", "Z"), ("x", "y", "z")] {
        if keys_match(obj, &[kx, ky, kz]) {
            let read = |k: &str| obj.get(k).and_then(|v| v.as_f64()).unwrap_or(0.0);
            let mut node = Map::new();
            node.insert("Type".to_string(), Value::from("Vector:Constant"));
            node.insert("Value".to_string(), vec3_object(read(kx), read(ky), read(kz)));
            return (Value::Object(node), fragments);
        }
    }

    let mut out = Map::new();
    for (key, value) in obj {
        if matches!(key.as_str(), "$NodeId" | "Skip" | "$Comment") {
            continue;
        }
        out.insert(key.clone(), fold(&mut fragments, raise_value(value, Some(key))));
    }
    (Value::Object(out), fragments)
}

/// Raise one native node object.
fn raise_node(obj: &Fields, tag: &str, parent_field: Option<&str>) -> (Value, Fragments) {
    let node_id = obj.get("$NodeId").and_then(|v| v.as_str());
    let category = resolve(parent_field, tag, node_id);

    let mut fragments = Fragments::default();
    if let Some(Value::String(comment)) = obj.get("$Comment") {
        fragments.comments.push(comment.clone());
    }

    if let Some(collapsed) = try_collapse(category, tag, obj) {
        let value = fold(&mut fragments, collapsed);
        return (value, fragments);
    }

    let internal_op = match to_internal(category, tag) {
        Some(renamed) => renamed,
        None => {
            debug!("no internal rename for {:?} op {:?}, passing through", category, tag);
            tag
        }
    };
    let internal_tag = NodeTag {
        category,
        op: internal_op.to_string(),
    }
    .internal_tag();

    let mut out = Map::new();
    out.insert("Type".to_string(), Value::from(internal_tag));

    // Reassemble flattened range groups and vectors before the field loop
    // so the partial scalars never land in the output.
    let range_groups = range_flatten(category, internal_op).unwrap_or(&[]);
    let vec_groups = vec3_flatten(category, internal_op).unwrap_or(&[]);
    let swaps = swap_renames(category, internal_op).unwrap_or(&[]);
    let layout = input_layout_native(tag);

    for (group, min_key, max_key) in range_groups {
        if obj.contains_key(*min_key) || obj.contains_key(*max_key) {
            let min = field_f64(obj, min_key, 0.0);
            let max = field_f64(obj, max_key, 0.0);
            out.insert(group.to_string(), range_object(min, max));
        }
    }
    for (group, base) in vec_groups {
        let keys = [format!("{}X", base), format!("{}Y", base), format!("{}Z", base)];
        if keys.iter().any(|k| obj.contains_key(k)) {
            let read = |k: &String| obj.get(k).and_then(|v| v.as_f64()).unwrap_or(0.0);
            out.insert(
                group.to_string(),
                vec3_object(read(&keys[0]), read(&keys[1]), read(&keys[2])),
            );
        }
    }

    for (key, value) in obj {
        match key.as_str() {
            "Type" | "$NodeId" | "Skip" | "$Comment" => continue,
            _ => {}
        }
        if range_groups
            .iter()
            .any(|(_, min_key, max_key)| key == min_key || key == max_key)
        {
            continue;
        }
        if vec_groups.iter().any(|(_, base)| {
            key.len() == base.len() + 1
                && key.starts_with(base)
                && matches!(key.as_bytes()[key.len() - 1], b'X' | b'Y' | b'Z')
        }) {
            continue;
        }

        // Scale inverts back to frequency; zero stays guarded.
        if key == "Scale" && native_uses_frequency_inversion(tag) {
            let s = value.as_f64().unwrap_or(0.0);
            let freq = if s != 0.0 { 1.0 / s } else { 1.0 };
            out.insert("Frequency".to_string(), json_f64(freq));
            continue;
        }

        // Swap-renames run in reverse: native key back to internal key.
        if let Some((internal_key, _)) = swaps.iter().find(|(_, native)| native == key) {
            out.insert(internal_key.to_string(), value.clone());
            continue;
        }

        // Positional arguments distribute back onto named fields.
        if key == "Inputs" {
            if let (Some(layout), Value::Array(items)) = (layout, value) {
                for (i, item) in items.iter().enumerate() {
                    match layout.get(i) {
                        Some(name) => {
                            let raised = fold(&mut fragments, raise_value(item, Some(name)));
                            out.insert(name.to_string(), raised);
                        }
                        // More inputs than the layout names; keep the
                        // overflow positional rather than dropping it.
                        None => {
                            let raised = fold(&mut fragments, raise_value(item, Some("Inputs")));
                            let overflow = out
                                .entry("Inputs".to_string())
                                .or_insert_with(|| Value::Array(Vec::new()));
                            if let Value::Array(arr) = overflow {
                                arr.push(raised);
                            }
                        }
                    }
                }
                continue;
            }
        }

        // Curve points reshape back to `{x, y}` objects.
        if category == Category::Curve && key == "Points" {
            let points = crate::convert::lower::curve_points(value);
            out.insert("Points".to_string(), points_as_objects(&points));
            continue;
        }

        out.insert(key.clone(), fold(&mut fragments, raise_value(value, Some(key))));
    }

    (Value::Object(out), fragments)
}

fn points_as_objects(points: &[(f64, f64)]) -> Value {
    Value::Array(
        points
            .iter()
            .map(|(x, y)| {
                let mut obj = Map::new();
                obj.insert("x".to_string(), json_f64(*x));
                obj.insert("y".to_string(), json_f64(*y));
                Value::Object(obj)
            })
            .collect(),
    )
}

// ── Biome wrapper ───────────────────────────────────────────────────

/// Raise the composite biome wrapper. The fluid pair is lifted back out
/// of the material provider when the marked gated entry is present.
pub fn raise_biome(wrapper: &Value) -> (Value, Fragments) {
    let empty = Map::new();
    let fields = wrapper.as_object().unwrap_or(&empty);
    let mut fragments = Fragments::default();
    let mut out = Map::new();

    out.insert(
        "Name".to_string(),
        Value::from(field_str(fields, "Name", "Unnamed")),
    );

    if let Some(terrain) = fields.get("TerrainDensity") {
        let raised = fold(&mut fragments, raise_value(terrain, Some("Terrain")));
        out.insert("Terrain".to_string(), raised);
    }

    if let Some(provider) = fields.get("MaterialProvider") {
        match extract_fluid_fill(provider) {
            Some((level, material, remainder)) => {
                let raised = fold(&mut fragments, raise_value(&remainder, Some("MaterialProvider")));
                out.insert("MaterialProvider".to_string(), raised);
                out.insert("FluidLevel".to_string(), json_f64(level));
                out.insert("FluidMaterial".to_string(), Value::from(material));
            }
            None => {
                let raised = fold(&mut fragments, raise_value(provider, Some("MaterialProvider")));
                out.insert("MaterialProvider".to_string(), raised);
            }
        }
    }

    for key in ["EnvironmentProvider", "TintProvider"] {
        if let Some(value) = fields.get(key) {
            let raised = fold(&mut fragments, raise_value(value, Some(key)));
            out.insert(key.to_string(), raised);
        }
    }

    if let Some(props) = fields.get("Props") {
        let raised = fold(&mut fragments, raise_value(props, Some("Prop")));
        out.insert("Props".to_string(), raised);
    }

    (Value::Object(out), fragments)
}

/// Recognize the marked fluid entry at the head of a material sequence.
/// Returns the fluid level, the material name, and the provider with the
/// entry removed (a single remaining entry stands alone again).
fn extract_fluid_fill(provider: &Value) -> Option<(f64, String, Value)> {
    let obj = provider.as_object()?;
    if node_type(provider) != Some("MaterialSequence") {
        return None;
    }
    let entries = obj.get("Entries").and_then(|v| v.as_array())?;
    let first = entries.first()?.as_object()?;
    let comment = first.get("$Comment").and_then(|v| v.as_str())?;
    let level = comment_param(comment, "FluidFill", "Level")
        .or_else(|| first.get("MaxValue").and_then(|v| v.as_f64()))?;
    let material = match first.get("Material") {
        Some(Value::Object(leaf)) => leaf
            .get("Solid")
            .and_then(|v| v.as_str())
            .unwrap_or("Water")
            .to_string(),
        Some(Value::String(name)) => name.clone(),
        _ => "Water".to_string(),
    };

    let rest: Vec<Value> = entries[1..].to_vec();
    let remainder = if rest.len() == 1 {
        rest.into_iter().next().unwrap()
    } else {
        let mut seq = obj.clone();
        seq.insert("Entries".to_string(), Value::Array(rest));
        Value::Object(seq)
    };
    Some((level, material, remainder))
}

// ── Compound collapsers ─────────────────────────────────────────────

/// Recognize a native sub-tree produced by a compound expansion and fold
/// it back into one internal concept. Runs before the rename table.
fn try_collapse(category: Category, tag: &str, obj: &Fields) -> Option<(Value, Fragments)> {
    match (category, tag) {
        (Category::Density, "Mix") => collapse_conditional(obj),
        (Category::Density, "Abs") => collapse_ridge(obj),
        (Category::Density, "Normalizer") => collapse_gradient_density(obj),
        (Category::Density, "Sum") => Some(collapse_sum(obj)),
        (Category::Density, "Multiplier") => Some(collapse_multiplier(obj)),
        (Category::Density, "DomainWarp2D" | "DomainWarp3D") => Some(collapse_domain_warp(obj, tag)),
        (Category::MaterialProvider, "MaterialSequence") => collapse_material_sequence(obj),
        (Category::MaterialProvider, "LayeredMaterial") => collapse_layered(obj),
        (Category::Prop, "WeightedPropList") => Some(collapse_weighted_props(obj)),
        (Category::Directionality, "RandomDirectionality") => {
            Some(collapse_random_directionality())
        }
        _ => None,
    }
}

fn inputs_of(obj: &Fields) -> &[Value] {
    obj.get("Inputs")
        .and_then(|v| v.as_array())
        .map(|a| a.as_slice())
        .unwrap_or(&[])
}

fn internal_node(tag: &str) -> Map<String, Value> {
    let mut out = Map::new();
    out.insert("Type".to_string(), Value::from(tag));
    out
}

fn internal_constant(value: f64) -> Value {
    let mut node = internal_node("Constant");
    node.insert("Value".to_string(), json_f64(value));
    Value::Object(node)
}

/// `Mix` carrying a `Conditional(Threshold=…)` recovery comment: the
/// threshold comes from the comment, the condition from destructuring
/// the known step-factor shape (Clamp → Mul → Sum → condition).
fn collapse_conditional(obj: &Fields) -> Option<(Value, Fragments)> {
    let comment = obj.get("$Comment").and_then(|v| v.as_str())?;
    let threshold = comment_param(comment, "Conditional", "Threshold")?;
    let inputs = inputs_of(obj);

    let mut fragments = Fragments::default();
    let false_branch = inputs
        .first()
        .map(|v| fold(&mut fragments, raise_value(v, Some("FalseInput"))))
        .unwrap_or_else(|| internal_constant(0.0));
    let true_branch = inputs
        .get(1)
        .map(|v| fold(&mut fragments, raise_value(v, Some("TrueInput"))))
        .unwrap_or_else(|| internal_constant(0.0));

    let condition_native = inputs
        .get(2)
        .and_then(|step| step.get("Inputs")?.get(0))
        .and_then(|mul| mul.get("Inputs")?.get(0))
        .and_then(|sum| sum.get("Inputs")?.get(0));
    let condition = condition_native
        .map(|v| fold(&mut fragments, raise_value(v, Some("Condition"))))
        .unwrap_or_else(|| internal_constant(0.0));

    let mut out = internal_node("Conditional");
    out.insert("Condition".to_string(), condition);
    out.insert("Threshold".to_string(), json_f64(threshold));
    out.insert("TrueInput".to_string(), true_branch);
    out.insert("FalseInput".to_string(), false_branch);
    Some((Value::Object(out), fragments))
}

/// `Abs` wrapping exactly one noise child is the ridge-noise lowering.
fn collapse_ridge(obj: &Fields) -> Option<(Value, Fragments)> {
    let inputs = inputs_of(obj);
    if inputs.len() != 1 || !keys_match(obj, &["Type", "Inputs"]) {
        return None;
    }
    let child_tag = node_type(&inputs[0])?;
    if !is_native_noise(child_tag) {
        return None;
    }
    let ridge_tag = if child_tag == "OctaveNoise2D" {
        "SimplexRidgeNoise2D"
    } else {
        "SimplexRidgeNoise3D"
    };
    let (raised, fragments) = raise_value(&inputs[0], None);
    let mut node = raised.as_object().cloned().unwrap_or_default();
    node.insert("Type".to_string(), Value::from(ridge_tag));
    Some((Value::Object(node), fragments))
}

/// `Normalizer` wrapping exactly the height-sampling leaf is the height
/// ramp; the flattened bounds swap back into the ramp's Y fields.
fn collapse_gradient_density(obj: &Fields) -> Option<(Value, Fragments)> {
    let inputs = inputs_of(obj);
    if inputs.len() != 1 || node_type(&inputs[0]) != Some("YSampled") {
        return None;
    }
    let mut out = internal_node("GradientDensity");
    out.insert("FromY".to_string(), json_f64(field_f64(obj, "FromMax", 0.0)));
    out.insert(
        "ToY".to_string(),
        json_f64(field_f64(obj, "FromMin", DEFAULT_WORLD_HEIGHT)),
    );
    Some((Value::Object(out), Fragments::default()))
}

/// Native `Sum`: always raises to the flat n-ary internal form, splicing
/// nested sums that carry no fields beyond their input list.
fn collapse_sum(obj: &Fields) -> (Value, Fragments) {
    let mut fragments = Fragments::default();
    let mut terms = Vec::new();
    flatten_native_sum(obj, &mut terms, &mut fragments);
    let raised = terms
        .into_iter()
        .map(|term| fold(&mut fragments, raise_value(term, Some("Inputs"))))
        .collect();
    let mut out = internal_node("Sum");
    out.insert("Inputs".to_string(), Value::Array(raised));
    for (key, value) in obj {
        match key.as_str() {
            "Type" | "$NodeId" | "Skip" | "$Comment" | "Inputs" => continue,
            _ => {}
        }
        out.insert(key.clone(), fold(&mut fragments, raise_value(value, Some(key))));
    }
    (Value::Object(out), fragments)
}

fn flatten_native_sum<'a>(obj: &'a Fields, out: &mut Vec<&'a Value>, fragments: &mut Fragments) {
    for item in inputs_of(obj) {
        match item.as_object() {
            Some(child)
                if node_type(item) == Some("Sum") && keys_match(child, &["Type", "Inputs"]) =>
            {
                if let Some(Value::String(comment)) = child.get("$Comment") {
                    fragments.comments.push(comment.clone());
                }
                flatten_native_sum(child, out, fragments);
            }
            _ => out.push(item),
        }
    }
}

/// `Multiplier` is the offset-less linear remap; the `Sum`-wrapped
/// offset form is intentionally not collapsed back.
fn collapse_multiplier(obj: &Fields) -> (Value, Fragments) {
    let mut fragments = Fragments::default();
    let input = inputs_of(obj)
        .first()
        .map(|v| fold(&mut fragments, raise_value(v, Some("Input"))))
        .unwrap_or_else(|| internal_constant(0.0));
    let mut out = internal_node("LinearTransform");
    out.insert("Input".to_string(), input);
    out.insert("Scale".to_string(), json_f64(field_f64(obj, "Factor", 1.0)));
    (Value::Object(out), fragments)
}

/// Domain warp: restore the amplitude name, drop the injected warp
/// parameters (they are defaults, not user data), distribute inputs.
fn collapse_domain_warp(obj: &Fields, tag: &str) -> (Value, Fragments) {
    let mut fragments = Fragments::default();
    let mut out = internal_node(tag);
    if let Some(factor) = obj.get("WarpFactor") {
        out.insert("Amplitude".to_string(), factor.clone());
    }
    let layout: &[&str] = &["Input", "WarpSource"];
    for (i, item) in inputs_of(obj).iter().enumerate() {
        if let Some(name) = layout.get(i) {
            let raised = fold(&mut fragments, raise_value(item, Some(name)));
            out.insert(name.to_string(), raised);
        }
    }
    for (key, value) in obj {
        match key.as_str() {
            "Type" | "$NodeId" | "Skip" | "$Comment" | "Inputs" | "WarpFactor"
            | "WarpFrequency" | "Seed" => continue,
            _ => {}
        }
        out.insert(key.clone(), fold(&mut fragments, raise_value(value, Some(key))));
    }
    (Value::Object(out), fragments)
}

/// A sequence whose entries are all field-gated except the last rebuilds
/// the nested conditional chain, innermost-first.
fn collapse_material_sequence(obj: &Fields) -> Option<(Value, Fragments)> {
    let entries = obj.get("Entries").and_then(|v| v.as_array())?;
    if entries.len() < 2 {
        return None;
    }
    let (fallback, gated) = entries.split_last().unwrap();
    if node_type(fallback) == Some("FieldGatedMaterial")
        || !gated
            .iter()
            .all(|e| node_type(e) == Some("FieldGatedMaterial"))
    {
        return None;
    }

    let mut fragments = Fragments::default();
    let mut current = fold(&mut fragments, raise_value(fallback, Some("Material")));
    for entry in gated.iter().rev() {
        let entry_obj = entry.as_object().cloned().unwrap_or_default();
        if let Some(Value::String(comment)) = entry_obj.get("$Comment") {
            fragments.comments.push(comment.clone());
        }
        let condition = entry_obj
            .get("Field")
            .map(|v| fold(&mut fragments, raise_value(v, Some("Condition"))))
            .unwrap_or_else(|| internal_constant(0.0));
        let material = entry_obj
            .get("Material")
            .map(|v| fold(&mut fragments, raise_value(v, Some("Material"))))
            .unwrap_or_else(|| Value::String("Air".to_string()));

        let mut node = internal_node("Material:Conditional");
        node.insert("Condition".to_string(), condition);
        node.insert(
            "Threshold".to_string(),
            json_f64(field_f64(&entry_obj, "MinValue", 0.0)),
        );
        node.insert("TrueMaterial".to_string(), material);
        node.insert("FalseMaterial".to_string(), current);
        current = Value::Object(node);
    }
    Some((current, fragments))
}

/// Exactly two uniform layers fold back into the depth split.
fn collapse_layered(obj: &Fields) -> Option<(Value, Fragments)> {
    let layers = obj.get("Layers").and_then(|v| v.as_array())?;
    if layers.len() != 2
        || !layers
            .iter()
            .all(|l| node_type(l) == Some("UniformLayer"))
    {
        return None;
    }
    let top = layers[0].as_object()?;
    let bottom = layers[1].as_object()?;

    let mut fragments = Fragments::default();
    let surface = top
        .get("Material")
        .map(|v| fold(&mut fragments, raise_value(v, Some("Material"))))
        .unwrap_or_else(|| Value::String("Air".to_string()));
    let depth = bottom
        .get("Material")
        .map(|v| fold(&mut fragments, raise_value(v, Some("Material"))))
        .unwrap_or_else(|| Value::String("Air".to_string()));

    let mut out = internal_node("Material:SpaceAndDepth");
    out.insert(
        "DepthThreshold".to_string(),
        json_f64(field_f64(top, "Thickness", 0.0)),
    );
    out.insert("SurfaceMaterial".to_string(), surface);
    out.insert("DepthMaterial".to_string(), depth);
    Some((Value::Object(out), fragments))
}

/// A weighted prop list with uniform weights collapses to the cluster;
/// non-uniform weights keep the explicit weighted form.
fn collapse_weighted_props(obj: &Fields) -> (Value, Fragments) {
    let mut fragments = Fragments::default();
    let entries: Vec<(f64, Value)> = obj
        .get("Props")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .map(|item| {
                    let entry = item.as_object().cloned().unwrap_or_default();
                    let weight = field_f64(&entry, "Weight", 1.0);
                    if let Some(Value::String(comment)) = entry.get("$Comment") {
                        fragments.comments.push(comment.clone());
                    }
                    let prop = entry
                        .get("Prop")
                        .map(|v| fold(&mut fragments, raise_value(v, Some("Prop"))))
                        .unwrap_or(Value::Null);
                    (weight, prop)
                })
                .collect()
        })
        .unwrap_or_default();

    let uniform = entries
        .windows(2)
        .all(|pair| pair[0].0 == pair[1].0);
    if uniform {
        let mut out = internal_node("Prop:Cluster");
        out.insert(
            "Props".to_string(),
            Value::Array(entries.into_iter().map(|(_, p)| p).collect()),
        );
        (Value::Object(out), fragments)
    } else {
        let weighted = entries
            .into_iter()
            .map(|(weight, prop)| {
                let mut entry = Map::new();
                entry.insert("Weight".to_string(), json_f64(weight));
                entry.insert("Prop".to_string(), prop);
                Value::Object(entry)
            })
            .collect();
        let mut out = internal_node("Prop:Weighted");
        out.insert("Entries".to_string(), Value::Array(weighted));
        (Value::Object(out), fragments)
    }
}

/// The injected seed and pattern sub-node are defaults; discard them.
fn collapse_random_directionality() -> (Value, Fragments) {
    (
        Value::Object(internal_node("Directionality:Uniform")),
        Fragments::default(),
    )
}
