// convert/ids.rs — synthetic identifiers and the $Comment grammar.
//
// Identifier prefixes are category-and-type keyed; downstream engine
// tooling pattern-matches on them, so the exact spelling matters.
// Tokens only need to be unique within one exported tree: each transform
// call builds a fresh generator.

use rand::Rng;
use rustc_hash::FxHashSet;

use crate::schema::Category;

/// Per-call `$NodeId` token source. Thread-safe by construction: each
/// generator owns its state, and the underlying RNG is `thread_rng`.
pub struct IdGen {
    issued: FxHashSet<String>,
}

impl IdGen {
    pub fn new() -> IdGen {
        IdGen {
            issued: FxHashSet::default(),
        }
    }

    /// An 8-char lowercase hex token, unique within this generator.
    fn token(&mut self) -> String {
        let mut rng = rand::thread_rng();
        loop {
            let tok = format!("{:08x}", rng.gen::<u32>());
            if self.issued.insert(tok.clone()) {
                return tok;
            }
        }
    }

    /// Generate a `$NodeId` for a native node. Density nodes use the
    /// `<Type>DensityNode-<token>` form; every other category uses the
    /// dotted `<Type>.<Category>-<token>` form.
    pub fn node_id(&mut self, category: Category, native_type: &str) -> String {
        let tok = self.token();
        match category {
            Category::Density => format!("{}DensityNode-{}", native_type, tok),
            other => format!("{}.{}-{}", native_type, other.native_label(), tok),
        }
    }

    /// An identifier with a literal prefix, for wrapper-level objects
    /// that sit outside the per-category prefix rule.
    pub fn prefixed(&mut self, prefix: &str) -> String {
        let tok = self.token();
        format!("{}-{}", prefix, tok)
    }
}

impl Default for IdGen {
    fn default() -> Self {
        IdGen::new()
    }
}

// ── $Comment grammar ────────────────────────────────────────────────
//
// Fixed, parseable form: `Name(Key=value, Key=value)`. The reverse path
// extracts parameters with a single split instead of heuristics.

/// Format a recovery comment.
pub fn format_comment(name: &str, params: &[(&str, f64)]) -> String {
    let mut out = String::from(name);
    out.push('(');
    for (i, (key, value)) in params.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(key);
        out.push('=');
        // Trim the trailing ".0" of integral values so comments stay
        // readable in hand-opened files.
        if value.fract() == 0.0 && value.abs() < 9.0e15 {
            out.push_str(&format!("{}", *value as i64));
        } else {
            out.push_str(&format!("{}", value));
        }
    }
    out.push(')');
    out
}

/// Parse a recovery comment into its concept name and parameters.
/// Returns `None` for free text that does not follow the grammar.
pub fn parse_comment(comment: &str) -> Option<(&str, Vec<(&str, f64)>)> {
    let open = comment.find('(')?;
    let body = comment[open + 1..].strip_suffix(')')?;
    let name = &comment[..open];
    if name.is_empty() {
        return None;
    }
    let mut params = Vec::new();
    if !body.is_empty() {
        for pair in body.split(',') {
            let (key, value) = pair.split_once('=')?;
            let parsed: f64 = value.trim().parse().ok()?;
            params.push((key.trim(), parsed));
        }
    }
    Some((name, params))
}

/// Look up one parameter of a parsed comment.
pub fn comment_param(comment: &str, name: &str, key: &str) -> Option<f64> {
    let (parsed_name, params) = parse_comment(comment)?;
    if parsed_name != name {
        return None;
    }
    params.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}
