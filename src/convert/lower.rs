// convert/lower.rs — forward transformer: internal graph → native format.
//
// Single-pass recursive descent. Per node: resolve the category, check
// the compound-expander table (a match delegates entirely to the rule),
// otherwise rename the type, generate a `$NodeId`, apply the per-type
// field adjustments, convert named density arguments into a positional
// `Inputs[]` array, recurse into the remaining children, and inject the
// category's `Skip` marker. No input value is ever mutated.

use log::debug;
use serde_json::{Map, Value};
use smallvec::SmallVec;

use crate::convert::category::{category_for_field, resolve};
use crate::convert::fields::*;
use crate::convert::ids::{format_comment, IdGen};
use crate::convert::tables::*;
use crate::schema::Category;

/// Lower any internal value appearing in a node position.
///
/// Strings in material-provider positions become `{Solid}` leaves;
/// objects with a `Type` tag are lowered as nodes; untyped records and
/// scalars pass through unchanged.
pub fn lower_value(
    value: &Value,
    parent_field: Option<&str>,
    context: Category,
    ids: &mut IdGen,
) -> Value {
    let field_category = parent_field
        .and_then(category_for_field)
        .unwrap_or(context);
    match value {
        Value::String(s) if field_category == Category::MaterialProvider => {
            material_leaf(s)
        }
        Value::Object(obj) => match obj.get("Type").and_then(|t| t.as_str()) {
            Some(tag) => {
                let tag = tag.to_string();
                lower_node(obj, &tag, parent_field, ids)
            }
            // Fixed-shape records (ranges, vectors, weight entries) pass
            // through untouched.
            None => value.clone(),
        },
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| lower_value(item, parent_field, field_category, ids))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Lower one internal node object.
fn lower_node(
    fields: &Fields,
    declared_tag: &str,
    parent_field: Option<&str>,
    ids: &mut IdGen,
) -> Value {
    let category = resolve(parent_field, declared_tag, None);
    let op = strip_category_prefix(declared_tag);

    if let Some(expanded) = try_expand(category, op, fields, ids) {
        return expanded;
    }

    let native_op = match to_native(category, op) {
        Some(renamed) => renamed,
        None => {
            debug!("no native rename for {:?} op {:?}, passing through", category, op);
            op
        }
    };

    let mut out = Map::new();
    out.insert("Type".to_string(), Value::from(native_op));
    out.insert(
        "$NodeId".to_string(),
        Value::from(ids.node_id(category, native_op)),
    );

    let layout = input_layout_internal(op);
    let mut inputs: SmallVec<[Option<Value>; 4]> =
        SmallVec::from_elem(None, layout.map_or(0, |l| l.len()));

    for (key, value) in fields {
        if key == "Type" {
            continue;
        }

        // Positional argument: goes into Inputs[], children first.
        if let Some(layout) = layout {
            if let Some(slot) = layout.iter().position(|name| name == key) {
                inputs[slot] = Some(lower_value(value, Some(key), category, ids));
                continue;
            }
        }

        if lower_field(&mut out, category, op, key, value) {
            continue;
        }

        // Remaining children recurse; scalars and fixed-shape records
        // pass through.
        out.insert(
            key.clone(),
            lower_value(value, Some(key), category, ids),
        );
    }

    if let Some(_layout) = layout {
        // Trailing absent arguments truncate; interior gaps are filled
        // with a zero constant so positions stay aligned.
        let last = inputs.iter().rposition(|slot| slot.is_some());
        let filled: Vec<Value> = match last {
            Some(last) => inputs
                .drain(..)
                .take(last + 1)
                .map(|slot| slot.unwrap_or_else(|| native_constant(0.0, ids)))
                .collect(),
            None => Vec::new(),
        };
        out.insert("Inputs".to_string(), Value::Array(filled));
    }

    finish_native(&mut out, category, op);
    Value::Object(out)
}

/// Category- and type-specific field adjustments (spec'd renames,
/// inversions, flattenings). Returns true when the field was consumed.
fn lower_field(out: &mut Fields, category: Category, op: &str, key: &str, value: &Value) -> bool {
    // Frequency ↔ Scale inversion. Zero frequency is special-cased to a
    // unit scale rather than propagating infinity.
    if key == "Frequency" && uses_frequency_inversion(category, op) {
        let f = value.as_f64().unwrap_or(0.0);
        let scale = if f != 0.0 { 1.0 / f } else { 1.0 };
        out.insert("Scale".to_string(), json_f64(scale));
        return true;
    }

    // Bound swap-renames (values travel with the renamed keys).
    if let Some(pairs) = swap_renames(category, op) {
        if let Some((_, native_key)) = pairs.iter().find(|(internal, _)| *internal == key) {
            out.insert(native_key.to_string(), value.clone());
            return true;
        }
    }

    // Nested-range flattening.
    if let Some(groups) = range_flatten(category, op) {
        if let Some((_, min_key, max_key)) = groups.iter().find(|(group, _, _)| *group == key) {
            if let Value::Object(range) = value {
                let min = range.get("Min").cloned().unwrap_or(Value::from(0));
                let max = range.get("Max").cloned().unwrap_or(Value::from(0));
                out.insert(min_key.to_string(), min);
                out.insert(max_key.to_string(), max);
                return true;
            }
        }
    }

    // 3-vector flattening.
    if let Some(pairs) = vec3_flatten(category, op) {
        if let Some((_, base)) = pairs.iter().find(|(internal, _)| *internal == key) {
            if let Value::Object(vec) = value {
                for (component, upper) in [("x", "X"), ("y", "Y"), ("z", "Z")] {
                    let v = vec
                        .get(component)
                        .or_else(|| vec.get(upper))
                        .cloned()
                        .unwrap_or(Value::from(0));
                    out.insert(format!("{}{}", base, upper), v);
                }
                return true;
            }
        }
    }

    // Domain warp: amplitude rename (defaults injected in finish_native).
    if key == "Amplitude" && matches!(op, "DomainWarp2D" | "DomainWarp3D") {
        out.insert("WarpFactor".to_string(), value.clone());
        return true;
    }

    // Curve points reshape: [{x, y}] → [[x, y]].
    if category == Category::Curve && key == "Points" {
        let points = curve_points(value);
        out.insert("Points".to_string(), points_as_pairs(&points));
        return true;
    }

    // Material-string wrapping outside the layout path.
    if category == Category::MaterialProvider && key == "Material" {
        if let Value::String(name) = value {
            out.insert("Material".to_string(), material_leaf(name));
            return true;
        }
    }

    false
}

/// Inject category markers and per-type defaults on a finished node.
fn finish_native(out: &mut Fields, category: Category, op: &str) {
    if matches!(op, "DomainWarp2D" | "DomainWarp3D") {
        out.entry("WarpFactor".to_string())
            .or_insert_with(|| Value::from(1));
        out.entry("WarpFrequency".to_string())
            .or_insert_with(|| json_f64(DEFAULT_WARP_FREQUENCY));
        out.entry("Seed".to_string()).or_insert_with(|| Value::from(0));
    }
    if category.uses_skip() {
        out.insert("Skip".to_string(), Value::Bool(false));
    }
}

fn strip_category_prefix(tag: &str) -> &str {
    if let Some((prefix, op)) = tag.split_once(':') {
        if crate::schema::Category::from_internal_prefix(prefix).is_some() {
            return op;
        }
    }
    tag
}

// ── Native node builders ────────────────────────────────────────────

/// A fresh native density node with just a type, id and Skip marker.
fn native_node(native_op: &str, category: Category, ids: &mut IdGen) -> Fields {
    let mut out = Map::new();
    out.insert("Type".to_string(), Value::from(native_op));
    out.insert(
        "$NodeId".to_string(),
        Value::from(ids.node_id(category, native_op)),
    );
    if category.uses_skip() {
        out.insert("Skip".to_string(), Value::Bool(false));
    }
    out
}

pub(crate) fn native_constant(value: f64, ids: &mut IdGen) -> Value {
    let mut node = native_node("Constant", Category::Density, ids);
    node.insert("Value".to_string(), json_f64(value));
    Value::Object(node)
}

fn native_with_inputs(
    native_op: &str,
    category: Category,
    inputs: Vec<Value>,
    ids: &mut IdGen,
) -> Fields {
    let mut node = native_node(native_op, category, ids);
    node.insert("Inputs".to_string(), Value::Array(inputs));
    node
}

/// The untyped `{Solid}` material leaf.
fn material_leaf(name: &str) -> Value {
    let mut obj = Map::new();
    obj.insert("Solid".to_string(), Value::from(name));
    Value::Object(obj)
}

/// Lower a material field value: strings become leaves, nodes recurse,
/// anything absent defaults to air.
fn lower_material(value: Option<&Value>, ids: &mut IdGen) -> Value {
    match value {
        Some(v) => lower_value(v, Some("Material"), Category::MaterialProvider, ids),
        None => material_leaf("Air"),
    }
}

// ── Compound expanders ──────────────────────────────────────────────

/// Dispatch table for internal concepts with no one-to-one native
/// equivalent. A hit replaces the whole generic path for that node.
fn try_expand(category: Category, op: &str, fields: &Fields, ids: &mut IdGen) -> Option<Value> {
    match (category, op) {
        (Category::Density, "Sum") => Some(expand_sum(fields, ids)),
        (Category::Density, "Conditional") => Some(expand_conditional(fields, ids)),
        (Category::Density, "GradientDensity") => Some(expand_gradient_density(fields, ids)),
        (Category::Density, "LinearTransform") => Some(expand_linear_transform(fields, ids)),
        (Category::Density, "SimplexRidgeNoise2D") => Some(expand_ridge(fields, "FractalNoise2D", ids)),
        (Category::Density, "SimplexRidgeNoise3D") => Some(expand_ridge(fields, "FractalNoise3D", ids)),
        (Category::MaterialProvider, "Conditional") => Some(expand_material_conditional(fields, ids)),
        (Category::MaterialProvider, "HeightGradient") => Some(expand_height_gradient(fields, ids)),
        (Category::MaterialProvider, "SpaceAndDepth") => Some(expand_space_and_depth(fields, ids)),
        (Category::Prop, "Cluster") => Some(expand_prop_cluster(fields, ids)),
        (Category::Prop, "Weighted") => Some(expand_prop_weighted(fields, ids)),
        (Category::Prop, "Conditional") => Some(expand_prop_conditional(fields, ids)),
        (Category::Directionality, "Uniform") => Some(expand_uniform_directionality(ids)),
        (Category::Curve, "Blend") => Some(expand_curve_blend(fields, ids)),
        _ => None,
    }
}

/// N-ary sum: flatten the term list, absorbing nested sums with no
/// extra fields (older encodings produced binary nestings).
fn expand_sum(fields: &Fields, ids: &mut IdGen) -> Value {
    let mut terms = Vec::new();
    collect_sum_terms(fields, &mut terms);
    let lowered = terms
        .into_iter()
        .map(|term| lower_value(term, Some("Inputs"), Category::Density, ids))
        .collect();
    let mut node = native_with_inputs("Sum", Category::Density, lowered, ids);
    // Fields beyond the term list carry through like the generic path.
    for (key, value) in fields {
        match key.as_str() {
            "Type" | "Inputs" | "InputA" | "InputB" => continue,
            _ => {}
        }
        node.insert(key.clone(), lower_value(value, Some(key), Category::Density, ids));
    }
    Value::Object(node)
}

fn collect_sum_terms<'a>(fields: &'a Fields, out: &mut Vec<&'a Value>) {
    let mut push = |term: &'a Value| {
        if let Value::Object(obj) = term {
            let is_bare_sum = node_type(term) == Some("Sum")
                && (keys_match(obj, &["Type", "Inputs"])
                    || keys_match(obj, &["Type", "InputA", "InputB"]));
            if is_bare_sum {
                collect_sum_terms(obj, out);
                return;
            }
        }
        out.push(term);
    };
    if let Some(Value::Array(items)) = fields.get("Inputs") {
        for item in items {
            push(item);
        }
    } else {
        for key in ["InputA", "InputB"] {
            if let Some(v) = fields.get(key) {
                push(v);
            }
        }
    }
}

/// Binary choice in density context: a `Mix` whose factor is a steep
/// clamp around `(condition − threshold) × 10000`, annotated with a
/// recovery comment so the reverse path can destructure it.
fn expand_conditional(fields: &Fields, ids: &mut IdGen) -> Value {
    let threshold = field_f64(fields, "Threshold", 0.0);
    let condition = fields
        .get("Condition")
        .map(|c| lower_value(c, Some("Condition"), Category::Density, ids))
        .unwrap_or_else(|| native_constant(0.0, ids));
    let false_branch = fields
        .get("FalseInput")
        .map(|c| lower_value(c, Some("FalseInput"), Category::Density, ids))
        .unwrap_or_else(|| native_constant(0.0, ids));
    let true_branch = fields
        .get("TrueInput")
        .map(|c| lower_value(c, Some("TrueInput"), Category::Density, ids))
        .unwrap_or_else(|| native_constant(0.0, ids));

    let shifted = native_with_inputs(
        "Sum",
        Category::Density,
        vec![condition, native_constant(-threshold, ids)],
        ids,
    );
    let scaled = native_with_inputs(
        "Mul",
        Category::Density,
        vec![Value::Object(shifted), native_constant(STEP_SHARPNESS, ids)],
        ids,
    );
    let mut step = native_with_inputs("Clamp", Category::Density, vec![Value::Object(scaled)], ids);
    step.insert("WallA".to_string(), Value::from(1));
    step.insert("WallB".to_string(), Value::from(0));

    let mut mix = native_with_inputs(
        "Mix",
        Category::Density,
        vec![false_branch, true_branch, Value::Object(step)],
        ids,
    );
    mix.insert(
        "$Comment".to_string(),
        Value::from(format_comment("Conditional", &[("Threshold", threshold)])),
    );
    Value::Object(mix)
}

/// Height ramp: a `Normalizer` over the height-sampling leaf with the
/// ramp's Y bounds flattened min↔max swapped in slot order.
fn expand_gradient_density(fields: &Fields, ids: &mut IdGen) -> Value {
    let from_y = field_f64(fields, "FromY", 0.0);
    let to_y = field_f64(fields, "ToY", DEFAULT_WORLD_HEIGHT);
    let leaf = native_node("YSampled", Category::Density, ids);
    let mut node = native_with_inputs(
        "Normalizer",
        Category::Density,
        vec![Value::Object(leaf)],
        ids,
    );
    node.insert("FromMin".to_string(), json_f64(to_y));
    node.insert("FromMax".to_string(), json_f64(from_y));
    Value::Object(node)
}

/// Linear remap: a `Multiplier` over the input; a nonzero offset wraps
/// that in a `Sum` with an offset constant (not collapsed on reverse).
fn expand_linear_transform(fields: &Fields, ids: &mut IdGen) -> Value {
    let scale = field_f64(fields, "Scale", 1.0);
    let offset = field_f64(fields, "Offset", 0.0);
    let input = fields
        .get("Input")
        .map(|c| lower_value(c, Some("Input"), Category::Density, ids))
        .unwrap_or_else(|| native_constant(0.0, ids));

    let mut multiplier = native_with_inputs("Multiplier", Category::Density, vec![input], ids);
    multiplier.insert("Factor".to_string(), json_f64(scale));

    if offset == 0.0 {
        return Value::Object(multiplier);
    }
    let sum = native_with_inputs(
        "Sum",
        Category::Density,
        vec![Value::Object(multiplier), native_constant(offset, ids)],
        ids,
    );
    Value::Object(sum)
}

/// Ridge noise: `Abs` wrapping one plain noise node carrying the fields.
fn expand_ridge(fields: &Fields, plain_variant: &str, ids: &mut IdGen) -> Value {
    let mut inner = fields.clone();
    inner.insert("Type".to_string(), Value::from(plain_variant));
    let lowered = lower_node(&inner, plain_variant, None, ids);
    Value::Object(native_with_inputs("Abs", Category::Density, vec![lowered], ids))
}

/// A field-gated material sequence entry.
fn gated_entry(
    field: Value,
    min_value: f64,
    max_value: f64,
    material: Value,
    ids: &mut IdGen,
) -> Value {
    let mut entry = native_node("FieldGatedMaterial", Category::MaterialProvider, ids);
    entry.insert("Field".to_string(), field);
    entry.insert("MinValue".to_string(), json_f64(min_value));
    entry.insert("MaxValue".to_string(), json_f64(max_value));
    entry.insert("Material".to_string(), material);
    Value::Object(entry)
}

fn material_sequence(entries: Vec<Value>, ids: &mut IdGen) -> Value {
    let mut node = native_node("MaterialSequence", Category::MaterialProvider, ids);
    node.insert("Entries".to_string(), Value::Array(entries));
    Value::Object(node)
}

/// Material-provider binary choice: the whole chain of nested
/// conditionals flattens into one sequence, outer choice first, the
/// final false branch as the plain fallback entry.
fn expand_material_conditional(fields: &Fields, ids: &mut IdGen) -> Value {
    let mut entries = Vec::new();
    let mut current = fields;
    let fallback;
    loop {
        let condition = current
            .get("Condition")
            .map(|c| lower_value(c, Some("Condition"), Category::Density, ids))
            .unwrap_or_else(|| native_constant(0.0, ids));
        let threshold = field_f64(current, "Threshold", 0.0);
        let material = lower_material(current.get("TrueMaterial"), ids);
        entries.push(gated_entry(condition, threshold, GATE_OPEN_MAX, material, ids));

        match current.get("FalseMaterial") {
            Some(Value::Object(next))
                if material_conditional_tag(next) =>
            {
                current = next;
            }
            other => {
                fallback = lower_material(other, ids);
                break;
            }
        }
    }
    entries.push(fallback);
    material_sequence(entries, ids)
}

fn material_conditional_tag(obj: &Fields) -> bool {
    matches!(
        obj.get("Type").and_then(|t| t.as_str()),
        Some("Material:Conditional") | Some("Conditional")
    )
}

/// Height-banded material: a two-entry sequence keyed on the midpoint of
/// the configured range. Indistinguishable from an authored sequence on
/// the reverse path — documented one-way.
fn expand_height_gradient(fields: &Fields, ids: &mut IdGen) -> Value {
    let (min, max) = field_range(fields, "Range", 0.0, DEFAULT_WORLD_HEIGHT);
    let midpoint = (min + max) / 2.0;
    let high = lower_material(fields.get("HighMaterial"), ids);
    let low = lower_material(fields.get("LowMaterial"), ids);
    let sample = Value::Object(native_node("YSampled", Category::Density, ids));
    let entries = vec![gated_entry(sample, midpoint, GATE_OPEN_MAX, high, ids), low];
    material_sequence(entries, ids)
}

/// Depth-layered material: exactly two uniform-thickness layers split
/// against the fixed maximum depth.
fn expand_space_and_depth(fields: &Fields, ids: &mut IdGen) -> Value {
    let threshold = field_f64(fields, "DepthThreshold", 4.0);
    let surface = lower_material(fields.get("SurfaceMaterial"), ids);
    let depth = lower_material(fields.get("DepthMaterial"), ids);

    let mut top = native_node("UniformLayer", Category::MaterialProvider, ids);
    top.insert("Thickness".to_string(), json_f64(threshold));
    top.insert("Material".to_string(), surface);
    let mut bottom = native_node("UniformLayer", Category::MaterialProvider, ids);
    bottom.insert("Thickness".to_string(), json_f64(MAX_LAYER_DEPTH - threshold));
    bottom.insert("Material".to_string(), depth);

    let mut node = native_node("LayeredMaterial", Category::MaterialProvider, ids);
    node.insert(
        "Layers".to_string(),
        Value::Array(vec![Value::Object(top), Value::Object(bottom)]),
    );
    Value::Object(node)
}

fn weighted_prop_entry(weight: f64, prop: Value) -> Value {
    let mut entry = Map::new();
    entry.insert("Weight".to_string(), json_f64(weight));
    entry.insert("Prop".to_string(), prop);
    Value::Object(entry)
}

fn weighted_prop_list(entries: Vec<Value>, ids: &mut IdGen) -> Value {
    let mut node = native_node("WeightedPropList", Category::Prop, ids);
    node.insert("Props".to_string(), Value::Array(entries));
    Value::Object(node)
}

/// Prop cluster: a list of equally-weighted child props.
fn expand_prop_cluster(fields: &Fields, ids: &mut IdGen) -> Value {
    let entries = fields
        .get("Props")
        .and_then(|v| v.as_array())
        .map(|props| {
            props
                .iter()
                .map(|p| weighted_prop_entry(1.0, lower_value(p, Some("Prop"), Category::Prop, ids)))
                .collect()
        })
        .unwrap_or_default();
    weighted_prop_list(entries, ids)
}

/// Explicitly weighted prop list (non-uniform weights survive as-is).
fn expand_prop_weighted(fields: &Fields, ids: &mut IdGen) -> Value {
    let entries = fields
        .get("Entries")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .map(|item| {
                    let (weight, prop) = match item {
                        Value::Object(entry) => (
                            field_f64(entry, "Weight", 1.0),
                            entry.get("Prop").cloned().unwrap_or(Value::Null),
                        ),
                        other => (1.0, other.clone()),
                    };
                    let lowered = lower_value(&prop, Some("Prop"), Category::Prop, ids);
                    weighted_prop_entry(weight, lowered)
                })
                .collect()
        })
        .unwrap_or_default();
    weighted_prop_list(entries, ids)
}

/// Prop-category binary choice: the native format has no prop
/// conditional at all, so the true branch survives alone. Permanently
/// lossy, by contract.
fn expand_prop_conditional(fields: &Fields, ids: &mut IdGen) -> Value {
    match fields.get("TrueInput") {
        Some(branch) => lower_value(branch, Some("Prop"), Category::Prop, ids),
        None => Value::Object(native_node("EmptyProp", Category::Prop, ids)),
    }
}

/// Uniform directionality: the native random node with an injected
/// default seed and pattern sub-node.
fn expand_uniform_directionality(ids: &mut IdGen) -> Value {
    let pattern = native_node("UniformPattern", Category::Pattern, ids);
    let mut node = native_node("RandomDirectionality", Category::Directionality, ids);
    node.insert("Seed".to_string(), Value::from(0));
    node.insert("Pattern".to_string(), Value::Object(pattern));
    Value::Object(node)
}

// ── Biome wrapper ───────────────────────────────────────────────────

/// Lower the composite biome wrapper: a terrain density tree, a material
/// provider, environment/tint providers and a prop list, plus the
/// biome-level fluid pair folded into the material provider as a marked
/// gated entry. Missing sub-trees get safe defaults rather than errors.
pub fn lower_biome(wrapper: &Value, editor_metadata: Option<&Value>, ids: &mut IdGen) -> Value {
    let empty = Map::new();
    let fields = wrapper.as_object().unwrap_or(&empty);

    let mut out = Map::new();
    out.insert(
        "Name".to_string(),
        Value::from(field_str(fields, "Name", "Unnamed")),
    );
    out.insert("$NodeId".to_string(), Value::from(ids.prefixed("Biome")));

    let terrain = fields
        .get("Terrain")
        .map(|t| lower_value(t, Some("Terrain"), Category::Density, ids))
        .unwrap_or_else(|| native_constant(0.0, ids));
    out.insert("TerrainDensity".to_string(), terrain);

    let mut provider = match fields.get("MaterialProvider") {
        Some(mp) => lower_value(mp, Some("MaterialProvider"), Category::MaterialProvider, ids),
        None => {
            let mut node = native_node("SingleMaterial", Category::MaterialProvider, ids);
            node.insert("Material".to_string(), material_leaf("Air"));
            Value::Object(node)
        }
    };

    let fluid_level = field_f64(fields, "FluidLevel", 0.0);
    if fluid_level != 0.0 {
        let fluid = field_str(fields, "FluidMaterial", "Water").to_string();
        let sample = Value::Object(native_node("YSampled", Category::Density, ids));
        let mut entry = gated_entry(sample, GATE_OPEN_MIN, fluid_level, material_leaf(&fluid), ids);
        if let Some(obj) = entry.as_object_mut() {
            obj.insert(
                "$Comment".to_string(),
                Value::from(format_comment("FluidFill", &[("Level", fluid_level)])),
            );
        }
        provider = material_sequence(vec![entry, provider], ids);
    }
    out.insert("MaterialProvider".to_string(), provider);

    let environment = fields
        .get("EnvironmentProvider")
        .map(|e| lower_value(e, Some("EnvironmentProvider"), Category::EnvironmentProvider, ids))
        .unwrap_or_else(|| {
            Value::Object(native_node("AnyEnvironment", Category::EnvironmentProvider, ids))
        });
    out.insert("EnvironmentProvider".to_string(), environment);

    if let Some(tint) = fields.get("TintProvider") {
        out.insert(
            "TintProvider".to_string(),
            lower_value(tint, Some("TintProvider"), Category::TintProvider, ids),
        );
    }

    let props = fields
        .get("Props")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .map(|p| lower_value(p, Some("Prop"), Category::Prop, ids))
                .collect()
        })
        .unwrap_or_default();
    out.insert("Props".to_string(), Value::Array(props));

    if let Some(meta) = editor_metadata {
        out.insert("$EditorMetadata".to_string(), meta.clone());
    }
    Value::Object(out)
}

// ── Curve blend resampling ──────────────────────────────────────────

/// Read curve points from either `[{x, y}]` objects or `[[x, y]]` pairs,
/// sorted by x.
pub(crate) fn curve_points(raw: &Value) -> Vec<(f64, f64)> {
    let arr = match raw.as_array() {
        Some(a) => a,
        None => return vec![],
    };
    let mut points: Vec<(f64, f64)> = arr
        .iter()
        .map(|p| {
            if let Some(pair) = p.as_array() {
                (
                    pair.first().and_then(|v| v.as_f64()).unwrap_or(0.0),
                    pair.get(1).and_then(|v| v.as_f64()).unwrap_or(0.0),
                )
            } else if let Some(obj) = p.as_object() {
                (
                    obj.get("x").and_then(|v| v.as_f64()).unwrap_or(0.0),
                    obj.get("y").and_then(|v| v.as_f64()).unwrap_or(0.0),
                )
            } else {
                (0.0, 0.0)
            }
        })
        .collect();
    points.sort_by(|a, b| a.0.total_cmp(&b.0));
    points
}

pub(crate) fn points_as_pairs(points: &[(f64, f64)]) -> Value {
    Value::Array(
        points
            .iter()
            .map(|(x, y)| Value::Array(vec![json_f64(*x), json_f64(*y)]))
            .collect(),
    )
}

/// Linear interpolation on a sorted point list, clamped at the ends.
fn interpolate(points: &[(f64, f64)], x: f64) -> f64 {
    match points {
        [] => 0.0,
        [only] => only.1,
        _ => {
            if x <= points[0].0 {
                return points[0].1;
            }
            if x >= points[points.len() - 1].0 {
                return points[points.len() - 1].1;
            }
            let idx = points.partition_point(|p| p.0 <= x);
            let (x0, y0) = points[idx - 1];
            let (x1, y1) = points[idx];
            if x1 == x0 {
                y0
            } else {
                y0 + (y1 - y0) * (x - x0) / (x1 - x0)
            }
        }
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Multi-curve blend: the target format has no blend primitive, so the
/// two curves are numerically resampled into one manual curve — union of
/// x-coordinates, linear interpolation at foreign points, y-average
/// rounded to a fixed precision. One-way by design.
fn expand_curve_blend(fields: &Fields, ids: &mut IdGen) -> Value {
    let curve_a = curve_points(
        fields
            .get("CurveA")
            .and_then(|c| c.get("Points"))
            .unwrap_or(&Value::Null),
    );
    let curve_b = curve_points(
        fields
            .get("CurveB")
            .and_then(|c| c.get("Points"))
            .unwrap_or(&Value::Null),
    );

    let mut xs: Vec<f64> = curve_a.iter().chain(curve_b.iter()).map(|p| p.0).collect();
    xs.sort_by(|a, b| a.total_cmp(b));
    xs.dedup();

    let merged: Vec<(f64, f64)> = xs
        .into_iter()
        .map(|x| {
            let ya = interpolate(&curve_a, x);
            let yb = interpolate(&curve_b, x);
            (x, round_to((ya + yb) / 2.0, CURVE_BLEND_DECIMALS))
        })
        .collect();

    let mut node = Map::new();
    node.insert("Type".to_string(), Value::from("ManualCurve"));
    node.insert(
        "$NodeId".to_string(),
        Value::from(ids.node_id(Category::Curve, "ManualCurve")),
    );
    node.insert("Points".to_string(), points_as_pairs(&merged));
    Value::Object(node)
}
