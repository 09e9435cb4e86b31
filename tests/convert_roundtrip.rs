//! Integration tests for the asset-format translator.
//!
//! These tests verify:
//!   1. Round-trip identity: internal → native → internal reproduces the
//!      original tree for shapes both formats express exactly
//!   2. Direction detection picks the right transform for either format
//!   3. Every node in a lowered tree carries a unique `$NodeId`, and no
//!      translator metadata survives the raise
//!   4. Category-sensitive renames: the same internal op name maps to
//!      different native types depending on where the node sits
//!   5. Compound concepts survive a full round trip through their native
//!      encodings (conditional, ridge noise, height ramp, material chain)
//!   6. Documented lossy paths degrade the way the format contract says
//!      (prop conditional, linear-transform offset, curve blend)
//!   7. The composite biome wrapper round-trips including the fluid pair
//!   8. Editor metadata and recovery comments come back on the side
//!      channel instead of polluting the raised tree

use serde_json::{json, Value};
use terraforge_lib::convert::{
    is_native_tree, lower, lower_biome_wrapper, lower_with_editor_metadata, raise,
    raise_biome_wrapper,
};

// ── Helpers ────────────────────────────────────────────────────────

/// Assert no `$NodeId`, `Skip` or `$Comment` key survives anywhere.
fn assert_no_metadata(value: &Value, path: &str) {
    match value {
        Value::Object(obj) => {
            for key in ["$NodeId", "Skip", "$Comment"] {
                assert!(
                    !obj.contains_key(key),
                    "{} still carries {} after raising",
                    path,
                    key
                );
            }
            for (key, child) in obj {
                assert_no_metadata(child, &format!("{}.{}", path, key));
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                assert_no_metadata(item, &format!("{}[{}]", path, i));
            }
        }
        _ => {}
    }
}

/// Collect every `$NodeId` in a native tree.
fn collect_node_ids(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(obj) => {
            if let Some(id) = obj.get("$NodeId").and_then(|v| v.as_str()) {
                out.push(id.to_string());
            }
            for child in obj.values() {
                collect_node_ids(child, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_node_ids(item, out);
            }
        }
        _ => {}
    }
}

fn round_trip(internal: &Value) -> Value {
    let native = lower(internal);
    let (raised, _) = raise(&native);
    raised
}

// ── 1. Round-trip identity ─────────────────────────────────────────

#[test]
fn arithmetic_graph_round_trips_exactly() {
    let original = json!({
        "Type": "Product",
        "InputA": {
            "Type": "Clamp",
            "Input": {"Type": "CoordinateY"},
            "Min": 0,
            "Max": 1
        },
        "InputB": {
            "Type": "Sum",
            "Inputs": [
                {"Type": "Constant", "Value": 0.5},
                {"Type": "Negate", "Input": {"Type": "CoordinateX"}},
                {"Type": "MaxFunction",
                 "InputA": {"Type": "Constant", "Value": -1},
                 "InputB": {"Type": "CoordinateZ"}},
                {"Type": "Constant", "Value": 2}
            ]
        }
    });
    assert_eq!(round_trip(&original), original);
}

#[test]
fn noise_stack_round_trips_exactly() {
    let original = json!({
        "Type": "Normalize",
        "Input": {
            "Type": "FractalNoise2D",
            "Frequency": 0.25,
            "Octaves": 4,
            "Seed": 1337,
            "Offset": {"x": 1, "y": 2, "z": 0}
        },
        "SourceRange": {"Min": -1, "Max": 1},
        "TargetRange": {"Min": 0, "Max": 320}
    });
    assert_eq!(round_trip(&original), original);
}

#[test]
fn zero_frequency_round_trips_through_the_unit_guard() {
    let original = json!({"Type": "FractalNoise3D", "Frequency": 0, "Octaves": 1});
    let native = lower(&original);
    assert_eq!(native["Scale"], json!(1));
    let (raised, _) = raise(&native);
    // 0 is unrepresentable as a scale; it comes back as frequency 1.
    assert_eq!(raised["Frequency"], json!(1));
}

#[test]
fn curve_asset_round_trips_exactly() {
    let original = json!({
        "Type": "CurveFunction",
        "Input": {"Type": "HeightSample"},
        "Curve": {
            "Type": "Curve:Manual",
            "Points": [{"x": 0, "y": 0}, {"x": 0.5, "y": 0.25}, {"x": 1, "y": 1}]
        }
    });
    assert_eq!(round_trip(&original), original);
}

#[test]
fn domain_warp_round_trips_exactly() {
    let original = json!({
        "Type": "DomainWarp2D",
        "Amplitude": 8,
        "Input": {"Type": "FractalNoise2D", "Frequency": 0.5},
        "WarpSource": {"Type": "FractalNoise2D", "Frequency": 0.125}
    });
    assert_eq!(round_trip(&original), original);
}

#[test]
fn vector_provider_round_trips_exactly() {
    let original = json!({
        "Type": "Scanner:Sphere",
        "Radius": 4,
        "Vector": {"Type": "Vector:Constant", "Value": {"x": 0, "y": 1, "z": 0}}
    });
    assert_eq!(round_trip(&original), original);
}

// ── 2. Direction detection ─────────────────────────────────────────

#[test]
fn lowered_trees_read_as_native() {
    let internal = json!({"Type": "Constant", "Value": 1});
    assert!(!is_native_tree(&internal));
    let native = lower(&internal);
    assert!(is_native_tree(&native));
    let (raised, _) = raise(&native);
    assert!(!is_native_tree(&raised));
}

// ── 3. Identifier and metadata hygiene ─────────────────────────────

#[test]
fn every_lowered_node_gets_a_unique_id() {
    let internal = json!({
        "Type": "Conditional",
        "Condition": {"Type": "FractalNoise2D", "Frequency": 0.25},
        "Threshold": 0.5,
        "TrueInput": {"Type": "Constant", "Value": 1},
        "FalseInput": {
            "Type": "Sum",
            "Inputs": [
                {"Type": "CoordinateY"},
                {"Type": "Constant", "Value": -1}
            ]
        }
    });
    let native = lower(&internal);
    let mut ids = Vec::new();
    collect_node_ids(&native, &mut ids);
    // The conditional alone expands to seven synthetic nodes.
    assert!(ids.len() >= 10, "expected a dense id set, got {}", ids.len());
    let mut unique = ids.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), ids.len(), "duplicate $NodeId issued");
}

#[test]
fn raising_scrubs_all_translator_metadata() {
    let internal = json!({
        "Type": "Conditional",
        "Condition": {"Type": "HeightSample"},
        "Threshold": 0.5,
        "TrueInput": {"Type": "SimplexRidgeNoise2D", "Frequency": 0.5},
        "FalseInput": {"Type": "GradientDensity", "FromY": 0, "ToY": 320}
    });
    let (raised, _) = raise(&lower(&internal));
    assert_no_metadata(&raised, "root");
    assert_eq!(raised, internal);
}

// ── 4. Category-sensitive renames ──────────────────────────────────

#[test]
fn bare_constant_maps_by_enclosing_field() {
    // The same bare tag, disambiguated only by where the node sits.
    let density = lower(&json!({"Type": "Constant", "Value": 3}));
    assert_eq!(density["Type"], json!("Constant"));

    let biome = lower_biome_wrapper(
        &json!({
            "Name": "B",
            "MaterialProvider": {"Type": "Constant", "Material": "Stone"},
            "EnvironmentProvider": {"Type": "Constant"}
        }),
        None,
    );
    assert_eq!(biome["MaterialProvider"]["Type"], json!("SingleMaterial"));
    assert_eq!(biome["MaterialProvider"]["Material"], json!({"Solid": "Stone"}));
    assert_eq!(biome["EnvironmentProvider"]["Type"], json!("AnyEnvironment"));
}

// ── 5. Compound round trips ────────────────────────────────────────

#[test]
fn conditional_survives_its_step_function_encoding() {
    let original = json!({
        "Type": "Conditional",
        "Condition": {"Type": "FractalNoise2D", "Frequency": 0.5, "Octaves": 2},
        "Threshold": 0.45,
        "TrueInput": {"Type": "Constant", "Value": 1},
        "FalseInput": {"Type": "Constant", "Value": -1}
    });
    let native = lower(&original);
    assert_eq!(native["Type"], json!("Mix"));
    assert_eq!(native["$Comment"], json!("Conditional(Threshold=0.45)"));
    let (raised, meta) = raise(&native);
    assert_eq!(raised, original);
    assert_eq!(meta.comments, vec!["Conditional(Threshold=0.45)"]);
}

#[test]
fn ridge_noise_survives_the_abs_encoding() {
    let original = json!({
        "Type": "SimplexRidgeNoise3D",
        "Frequency": 0.125,
        "Octaves": 5,
        "Seed": 7
    });
    let native = lower(&original);
    assert_eq!(native["Type"], json!("Abs"));
    assert_eq!(native["Inputs"][0]["Type"], json!("OctaveNoise3D"));
    assert_eq!(round_trip(&original), original);
}

#[test]
fn height_ramp_survives_the_normalizer_encoding() {
    let original = json!({"Type": "GradientDensity", "FromY": 32, "ToY": 128});
    let native = lower(&original);
    assert_eq!(native["Type"], json!("Normalizer"));
    assert_eq!(round_trip(&original), original);
}

#[test]
fn material_chain_survives_the_sequence_encoding() {
    let original = json!({
        "Name": "Peaks",
        "Terrain": {"Type": "Constant", "Value": 1},
        "MaterialProvider": {
            "Type": "Material:Conditional",
            "Condition": {"Type": "HeightSample"},
            "Threshold": 0.7,
            "TrueMaterial": "Snow",
            "FalseMaterial": {
                "Type": "Material:Conditional",
                "Condition": {"Type": "HeightSample"},
                "Threshold": 0.45,
                "TrueMaterial": "Gravel",
                "FalseMaterial": {
                    "Type": "Material:Conditional",
                    "Condition": {"Type": "FractalNoise2D", "Frequency": 0.25},
                    "Threshold": 0.4,
                    "TrueMaterial": "Andesite",
                    "FalseMaterial": "Stone"
                }
            }
        },
        "EnvironmentProvider": {"Type": "Environment:Constant"},
        "Props": []
    });
    let native = lower_biome_wrapper(&original, None);
    let entries = native["MaterialProvider"]["Entries"].as_array().unwrap();
    assert_eq!(entries.len(), 4, "three gates plus the fallback");

    let (raised, _) = raise_biome_wrapper(&native);
    assert_eq!(raised, original);
}

#[test]
fn depth_split_survives_the_layered_encoding() {
    let original = json!({
        "Name": "Plains",
        "Terrain": {"Type": "Constant", "Value": 1},
        "MaterialProvider": {
            "Type": "Material:SpaceAndDepth",
            "DepthThreshold": 4,
            "SurfaceMaterial": "Grass",
            "DepthMaterial": "Stone"
        },
        "EnvironmentProvider": {"Type": "Environment:Constant"},
        "Props": []
    });
    let native = lower_biome_wrapper(&original, None);
    assert_eq!(native["MaterialProvider"]["Type"], json!("LayeredMaterial"));
    let (raised, _) = raise_biome_wrapper(&native);
    assert_eq!(raised, original);
}

#[test]
fn directionality_survives_the_random_encoding() {
    let original = json!({
        "Type": "Scanner:Column",
        "Directionality": {"Type": "Directionality:Uniform"}
    });
    assert_eq!(round_trip(&original), original);
}

// ── 6. Documented lossy paths ──────────────────────────────────────

#[test]
fn prop_conditional_degrades_to_its_true_branch() {
    let original = json!({
        "Name": "Forest",
        "Terrain": {"Type": "Constant", "Value": 1},
        "MaterialProvider": {"Type": "Material:Constant", "Material": "Grass"},
        "EnvironmentProvider": {"Type": "Environment:Constant"},
        "Props": [{
            "Type": "Prop:Conditional",
            "Condition": {"Type": "FractalNoise2D", "Frequency": 0.5},
            "Threshold": 0.5,
            "TrueInput": {"Type": "Prop:Prefab", "Prefab": "Oak"},
            "FalseInput": {"Type": "Prop:Prefab", "Prefab": "Birch"}
        }]
    });
    let native = lower_biome_wrapper(&original, None);
    let (raised, _) = raise_biome_wrapper(&native);
    // The false branch and the condition are gone for good.
    assert_eq!(raised["Props"], json!([{"Type": "Prop:Prefab", "Prefab": "Oak"}]));
}

#[test]
fn linear_transform_offset_stays_expanded() {
    let original = json!({
        "Type": "LinearTransform",
        "Input": {"Type": "CoordinateY"},
        "Scale": 2,
        "Offset": 10
    });
    let (raised, _) = raise(&lower(&original));
    // The offset half survives as an explicit sum, not the original node.
    assert_eq!(raised["Type"], json!("Sum"));
    assert_eq!(raised["Inputs"][0]["Type"], json!("LinearTransform"));
    assert_eq!(raised["Inputs"][0]["Scale"], json!(2));
    assert_eq!(raised["Inputs"][1], json!({"Type": "Constant", "Value": 10}));
}

#[test]
fn offsetless_linear_transform_round_trips() {
    let original = json!({
        "Type": "LinearTransform",
        "Input": {"Type": "CoordinateY"},
        "Scale": 2
    });
    assert_eq!(round_trip(&original), original);
}

#[test]
fn curve_blend_degrades_to_a_manual_curve() {
    let original = json!({
        "Type": "CurveFunction",
        "Input": {"Type": "HeightSample"},
        "Curve": {
            "Type": "Curve:Blend",
            "CurveA": {"Type": "Curve:Manual", "Points": [{"x": 0, "y": 0}, {"x": 1, "y": 1}]},
            "CurveB": {"Type": "Curve:Manual", "Points": [{"x": 0, "y": 1}, {"x": 1, "y": 0}]}
        }
    });
    let (raised, _) = raise(&lower(&original));
    assert_eq!(raised["Curve"]["Type"], json!("Curve:Manual"));
    assert_eq!(
        raised["Curve"]["Points"],
        json!([{"x": 0, "y": 0.5}, {"x": 1, "y": 0.5}])
    );
}

#[test]
fn nested_sums_normalize_to_one_flat_list() {
    let original = json!({
        "Type": "Sum",
        "Inputs": [
            {"Type": "Constant", "Value": 1},
            {"Type": "Sum", "Inputs": [
                {"Type": "Constant", "Value": 2},
                {"Type": "Constant", "Value": 3}
            ]}
        ]
    });
    let (raised, _) = raise(&lower(&original));
    assert_eq!(
        raised,
        json!({
            "Type": "Sum",
            "Inputs": [
                {"Type": "Constant", "Value": 1},
                {"Type": "Constant", "Value": 2},
                {"Type": "Constant", "Value": 3}
            ]
        })
    );
}

// ── 7. Biome wrapper ───────────────────────────────────────────────

#[test]
fn full_biome_round_trips_with_fluid_pair() {
    let original = json!({
        "Name": "Ocean",
        "Terrain": {
            "Type": "Sum",
            "Inputs": [
                {"Type": "GradientDensity", "FromY": 0, "ToY": 128},
                {"Type": "FractalNoise2D", "Frequency": 0.0625, "Octaves": 3}
            ]
        },
        "MaterialProvider": {
            "Type": "Material:SpaceAndDepth",
            "DepthThreshold": 3,
            "SurfaceMaterial": "Sand",
            "DepthMaterial": "Stone"
        },
        "FluidLevel": 63,
        "FluidMaterial": "Water",
        "EnvironmentProvider": {"Type": "Environment:Constant"},
        "TintProvider": {"Type": "Tint:Constant", "Color": "#3f76e4"},
        "Props": [
            {"Type": "Prop:Cluster", "Props": [
                {"Type": "Prop:Prefab", "Prefab": "Kelp"},
                {"Type": "Prop:Prefab", "Prefab": "Seagrass"}
            ]}
        ]
    });

    let native = lower_biome_wrapper(&original, None);
    assert!(is_native_tree(&native));
    assert_eq!(native["Name"], json!("Ocean"));
    // The fluid pair is folded into the provider on the way down.
    assert!(native.get("FluidLevel").is_none());
    assert_eq!(
        native["MaterialProvider"]["Entries"][0]["$Comment"],
        json!("FluidFill(Level=63)")
    );

    let (raised, _) = raise_biome_wrapper(&native);
    assert_no_metadata(&raised, "biome");
    assert_eq!(raised, original);
}

// ── 8. Side channel ────────────────────────────────────────────────

#[test]
fn editor_metadata_rides_the_side_channel() {
    let internal = json!({"Type": "Constant", "Value": 1});
    let layout = json!({"Positions": {"node-1": [120, 80]}, "Zoom": 1.5});
    let native = lower_with_editor_metadata(&internal, Some(&layout));
    assert_eq!(native["$EditorMetadata"], layout);

    let (raised, meta) = raise(&native);
    assert_eq!(raised, internal);
    assert_eq!(meta.editor_metadata, Some(layout));
}

#[test]
fn hand_written_comments_come_back_as_fragments() {
    let native = json!({
        "Type": "Sum",
        "$NodeId": "SumDensityNode-aaaa0000",
        "Skip": false,
        "Inputs": [
            {"Type": "Constant", "$NodeId": "ConstantDensityNode-aaaa0001",
             "Skip": false, "Value": 1, "$Comment": "base height"},
            {"Type": "OctaveNoise2D", "$NodeId": "OctaveNoise2DDensityNode-aaaa0002",
             "Skip": false, "Scale": 2, "$Comment": "surface detail"}
        ]
    });
    let (raised, meta) = raise(&native);
    assert_no_metadata(&raised, "root");
    assert_eq!(meta.comments, vec!["base height", "surface detail"]);
}
