// convert/mod.rs — public surface of the asset-format translator.
//
// Two entry points per direction: a whole-asset density tree and the
// composite biome wrapper. Both directions take and return plain JSON
// tree values; the reverse direction additionally returns the metadata
// side channel collected on the way up.

mod category;
mod fields;
mod ids;
mod lint;
mod lower;
mod raise;
mod tables;


use serde::Serialize;
use serde_json::Value;

use crate::schema::Category;

pub use lint::{lint_biome_export, lint_export};

/// Side channel returned by the reverse transforms: recovery-comment
/// text in encounter order, plus the root-level editor-only metadata
/// block if the file carried one. The graph-construction layer consumes
/// this without the translator knowing its representation.
#[derive(Debug, Default, Serialize)]
pub struct ImportMetadata {
    pub comments: Vec<String>,
    pub editor_metadata: Option<Value>,
}

/// Distinguish a native tree from an internal one. The presence of a
/// `$NodeId` at the root is the single gating predicate file importers
/// use to pick a direction.
pub fn is_native_tree(tree: &Value) -> bool {
    tree.as_object().map_or(false, |o| o.contains_key("$NodeId"))
}

/// Lower a whole internal asset tree (density-only asset) to the native
/// format.
pub fn lower(internal: &Value) -> Value {
    lower_with_editor_metadata(internal, None)
}

/// Like [`lower`], additionally emitting the caller's editor-graph
/// metadata block at the tree root (opaque pass-through).
pub fn lower_with_editor_metadata(internal: &Value, editor_metadata: Option<&Value>) -> Value {
    let mut ids = ids::IdGen::new();
    let mut lowered = lower::lower_value(internal, None, Category::Density, &mut ids);
    if let (Some(meta), Some(obj)) = (editor_metadata, lowered.as_object_mut()) {
        obj.insert("$EditorMetadata".to_string(), meta.clone());
    }
    lowered
}

/// Lower a composite biome wrapper (terrain, materials, environment,
/// tint, props, fluid pair) to the native wrapper shape.
pub fn lower_biome_wrapper(wrapper: &Value, editor_metadata: Option<&Value>) -> Value {
    let mut ids = ids::IdGen::new();
    lower::lower_biome(wrapper, editor_metadata, &mut ids)
}

/// Raise a native tree back to the internal representation, returning
/// the collected metadata as a side channel.
pub fn raise(native: &Value) -> (Value, ImportMetadata) {
    let (stripped, editor_metadata) = split_editor_metadata(native);
    let (raised, fragments) = raise::raise_value(&stripped, None);
    (
        raised,
        ImportMetadata {
            comments: fragments.comments,
            editor_metadata,
        },
    )
}

/// Raise a native biome wrapper back to the internal wrapper.
pub fn raise_biome_wrapper(native: &Value) -> (Value, ImportMetadata) {
    let (stripped, editor_metadata) = split_editor_metadata(native);
    let (raised, fragments) = raise::raise_biome(&stripped);
    (
        raised,
        ImportMetadata {
            comments: fragments.comments,
            editor_metadata,
        },
    )
}

/// Take the root-level `$EditorMetadata` block out of a native tree
/// before raising it; it belongs to the caller, not the asset.
fn split_editor_metadata(native: &Value) -> (Value, Option<Value>) {
    match native.as_object() {
        Some(obj) if obj.contains_key("$EditorMetadata") => {
            let mut stripped = obj.clone();
            let meta = stripped.remove("$EditorMetadata");
            (Value::Object(stripped), meta)
        }
        _ => (native.clone(), None),
    }
}
