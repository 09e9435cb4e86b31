// convert/tables.rs — static mapping tables consulted by both transformers.
//
// Four table families: type renames (both directions), named-argument to
// `Inputs[]` layouts, bound swap-renames, and nested-range flattening
// groups. All are closed match arms; an op absent from a table passes
// through under its own name with its children recursed.

use crate::schema::Category;

// ── Shared constants ────────────────────────────────────────────────

/// Upper bound of an open-ended field gate on a material sequence entry.
pub const GATE_OPEN_MAX: f64 = 1.0e9;

/// Lower bound of an open-ended gate (fluid fill).
pub const GATE_OPEN_MIN: f64 = -1.0e9;

/// Fixed maximum depth a two-layer material split is measured against
/// (the engine's chunk-column depth).
pub const MAX_LAYER_DEPTH: f64 = 64.0;

/// Slope factor of the steep clamp a density conditional lowers to.
pub const STEP_SHARPNESS: f64 = 10000.0;

/// Decimal places kept when a curve blend is resampled.
pub const CURVE_BLEND_DECIMALS: i32 = 4;

/// Warp frequency injected when lowering a domain warp.
pub const DEFAULT_WARP_FREQUENCY: f64 = 0.01;

/// Default upper Y bound of a height ramp.
pub const DEFAULT_WORLD_HEIGHT: f64 = 320.0;

// ── Type-name tables ────────────────────────────────────────────────

/// Density-category rename, internal op → native op. Ops that lower via
/// a compound rule (`Conditional`, `GradientDensity`, `LinearTransform`,
/// ridge noise, n-ary `Sum`) never reach this table.
pub fn density_to_native(op: &str) -> Option<&'static str> {
    Some(match op {
        "Constant" => "Constant",
        "Product" => "Mul",
        "MinFunction" => "Min",
        "MaxFunction" => "Max",
        "AverageFunction" => "Average",
        "Negate" => "Negation",
        "Abs" => "Abs",
        "Clamp" => "Clamp",
        "Mix" => "Mix",
        "CurveFunction" => "CurveFunction",
        "Exponent" => "Power",
        "CoordinateX" => "PositionX",
        "CoordinateY" => "PositionY",
        "CoordinateZ" => "PositionZ",
        "YGradient" => "VerticalGradient",
        "HeightSample" => "YSampled",
        // Both fractal variants collapse to one native noise type; the
        // octave count is the only remaining distinction.
        "SimplexNoise2D" | "FractalNoise2D" => "OctaveNoise2D",
        "SimplexNoise3D" | "FractalNoise3D" => "OctaveNoise3D",
        "DomainWarp2D" => "DomainWarp2D",
        "DomainWarp3D" => "DomainWarp3D",
        "Normalize" => "DoubleNormalizer",
        _ => return None,
    })
}

/// Density-category rename, native op → canonical internal op. Not a
/// perfect inverse: `OctaveNoise2D/3D` always raises to the fractal
/// variant, so the single-octave internal tag is unreachable by
/// round-trip from the native shape alone.
pub fn density_to_internal(op: &str) -> Option<&'static str> {
    Some(match op {
        "Constant" => "Constant",
        "Mul" => "Product",
        "Min" => "MinFunction",
        "Max" => "MaxFunction",
        "Average" => "AverageFunction",
        "Negation" => "Negate",
        "Abs" => "Abs",
        "Clamp" => "Clamp",
        "Mix" => "Mix",
        "CurveFunction" => "CurveFunction",
        "Power" => "Exponent",
        "PositionX" => "CoordinateX",
        "PositionY" => "CoordinateY",
        "PositionZ" => "CoordinateZ",
        "VerticalGradient" => "YGradient",
        "YSampled" => "HeightSample",
        "OctaveNoise2D" => "FractalNoise2D",
        "OctaveNoise3D" => "FractalNoise3D",
        "DomainWarp2D" => "DomainWarp2D",
        "DomainWarp3D" => "DomainWarp3D",
        "DoubleNormalizer" => "Normalize",
        "Multiplier" => "LinearTransform",
        _ => return None,
    })
}

/// Non-density rename, internal op → native op, keyed by category.
pub fn to_native(category: Category, op: &str) -> Option<&'static str> {
    let renamed = match category {
        Category::Density => return density_to_native(op),
        Category::Curve => match op {
            "Manual" => "ManualCurve",
            "Constant" => "ConstantCurve",
            _ => return None,
        },
        Category::MaterialProvider => match op {
            "Constant" => "SingleMaterial",
            "Queue" => "MaterialSequence",
            "Gated" => "FieldGatedMaterial",
            "Layered" => "LayeredMaterial",
            "Layer" => "UniformLayer",
            _ => return None,
        },
        Category::Pattern => match op {
            "Uniform" => "UniformPattern",
            _ => return None,
        },
        Category::PositionProvider => match op {
            "Grid2D" => "GridPositions2D",
            "Scatter" => "ScatterPositions",
            _ => return None,
        },
        Category::Prop => match op {
            "Prefab" => "PrefabProp",
            "Empty" => "EmptyProp",
            "Weighted" => "WeightedPropList",
            _ => return None,
        },
        Category::Scanner => match op {
            "Column" => "ColumnScanner",
            "Sphere" => "SphereScanner",
            _ => return None,
        },
        Category::Assignment => match op {
            "Surface" => "SurfaceAssignment",
            "Cave" => "CaveAssignment",
            _ => return None,
        },
        Category::VectorProvider => match op {
            "Constant" => "ConstantVector",
            _ => return None,
        },
        Category::EnvironmentProvider => match op {
            // `Constant` means "always true" in environment context.
            "Constant" => "AnyEnvironment",
            _ => return None,
        },
        Category::TintProvider => match op {
            "Constant" => "ConstantTint",
            _ => return None,
        },
        Category::BlockMask => match op {
            "All" => "AnyBlock",
            _ => return None,
        },
        Category::Directionality => match op {
            // `Uniform` lowers via compound (injected seed + pattern).
            _ => return None,
        },
    };
    Some(renamed)
}

/// Non-density rename, native op → internal op, keyed by category.
pub fn to_internal(category: Category, op: &str) -> Option<&'static str> {
    let renamed = match category {
        Category::Density => return density_to_internal(op),
        Category::Curve => match op {
            "ManualCurve" => "Manual",
            "ConstantCurve" => "Constant",
            _ => return None,
        },
        Category::MaterialProvider => match op {
            "SingleMaterial" => "Constant",
            "MaterialSequence" => "Queue",
            "FieldGatedMaterial" => "Gated",
            "LayeredMaterial" => "Layered",
            "UniformLayer" => "Layer",
            _ => return None,
        },
        Category::Pattern => match op {
            "UniformPattern" => "Uniform",
            _ => return None,
        },
        Category::PositionProvider => match op {
            "GridPositions2D" => "Grid2D",
            "ScatterPositions" => "Scatter",
            _ => return None,
        },
        Category::Prop => match op {
            "PrefabProp" => "Prefab",
            "EmptyProp" => "Empty",
            _ => return None,
        },
        Category::Scanner => match op {
            "ColumnScanner" => "Column",
            "SphereScanner" => "Sphere",
            _ => return None,
        },
        Category::Assignment => match op {
            "SurfaceAssignment" => "Surface",
            "CaveAssignment" => "Cave",
            _ => return None,
        },
        Category::VectorProvider => match op {
            "ConstantVector" => "Constant",
            _ => return None,
        },
        Category::EnvironmentProvider => match op {
            "AnyEnvironment" => "Constant",
            _ => return None,
        },
        Category::TintProvider => match op {
            "ConstantTint" => "Constant",
            _ => return None,
        },
        Category::BlockMask => match op {
            "AnyBlock" => "All",
            _ => return None,
        },
        Category::Directionality => match op {
            "RandomDirectionality" => "Uniform",
            _ => return None,
        },
    };
    Some(renamed)
}

// ── Named-argument ↔ Inputs[] layout table ──────────────────────────

/// Ordered internal field names that fill positions `0..n-1` of the
/// native `Inputs[]` array, keyed by native op. `Sum` is variadic and
/// handled by the n-ary compound instead.
pub fn input_layout_native(op: &str) -> Option<&'static [&'static str]> {
    Some(match op {
        "Mul" | "Min" | "Max" | "Average" => &["InputA", "InputB"],
        "Mix" => &["InputA", "InputB", "Factor"],
        "Abs" | "Negation" | "Clamp" | "Power" | "CurveFunction" | "Normalizer"
        | "DoubleNormalizer" | "Multiplier" => &["Input"],
        "DomainWarp2D" | "DomainWarp3D" => &["Input", "WarpSource"],
        _ => return None,
    })
}

/// The same layouts keyed by internal op (forward direction).
pub fn input_layout_internal(op: &str) -> Option<&'static [&'static str]> {
    Some(match op {
        "Product" | "MinFunction" | "MaxFunction" | "AverageFunction" => &["InputA", "InputB"],
        "Mix" => &["InputA", "InputB", "Factor"],
        "Abs" | "Negate" | "Clamp" | "Exponent" | "CurveFunction" | "Normalize" => &["Input"],
        "DomainWarp2D" | "DomainWarp3D" => &["Input", "WarpSource"],
        _ => return None,
    })
}

// ── Field rename / swap table ───────────────────────────────────────

/// Pairwise swap-renames, `(internal key, native key)`. The values travel
/// with the renames, so `Min: 0, Max: 1` becomes `WallA: 1, WallB: 0` —
/// swapped, not merely renamed. Intentional format asymmetry.
pub fn swap_renames(category: Category, internal_op: &str) -> Option<&'static [(&'static str, &'static str)]> {
    match (category, internal_op) {
        (Category::Density, "Clamp") => Some(&[("Min", "WallB"), ("Max", "WallA")]),
        _ => None,
    }
}

// ── Nested-range flattening table ───────────────────────────────────

/// `(internal group field, native min key, native max key)` triples: an
/// internal `{Min, Max}` record flattens to two native scalar fields.
pub fn range_flatten(category: Category, internal_op: &str) -> Option<&'static [(&'static str, &'static str, &'static str)]> {
    match (category, internal_op) {
        (Category::Density, "Normalize") => Some(&[
            ("SourceRange", "FromMin", "FromMax"),
            ("TargetRange", "ToMin", "ToMax"),
        ]),
        _ => None,
    }
}

// ── 3-vector flattening table ───────────────────────────────────────

/// `(internal vector field, native scalar base)` pairs: an internal
/// `{x, y, z}` record flattens to `BaseX`/`BaseY`/`BaseZ`.
pub fn vec3_flatten(category: Category, internal_op: &str) -> Option<&'static [(&'static str, &'static str)]> {
    match (category, internal_op) {
        (Category::Density, "SimplexNoise2D" | "FractalNoise2D" | "SimplexNoise3D" | "FractalNoise3D") => {
            Some(&[("Offset", "Offset")])
        }
        (Category::VectorProvider, "Constant") => Some(&[("Value", "")]),
        _ => None,
    }
}

/// Ops whose `Frequency` field inverts to a native `Scale` field.
pub fn uses_frequency_inversion(category: Category, internal_op: &str) -> bool {
    matches!(
        (category, internal_op),
        (
            Category::Density,
            "SimplexNoise2D" | "FractalNoise2D" | "SimplexNoise3D" | "FractalNoise3D"
        )
    )
}

/// Native ops whose `Scale` field inverts back to `Frequency`.
pub fn native_uses_frequency_inversion(op: &str) -> bool {
    matches!(op, "OctaveNoise2D" | "OctaveNoise3D")
}

/// Native noise ops recognized by the ridge-noise collapser.
pub fn is_native_noise(op: &str) -> bool {
    matches!(op, "OctaveNoise2D" | "OctaveNoise3D")
}
