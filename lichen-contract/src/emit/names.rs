//! Deterministic derivation of Rust identifiers from schema names.

use crate::node::SchemaId;

/// Reserved words that cannot be used as field identifiers.
const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "box", "break", "const", "continue", "crate", "dyn",
    "else", "enum", "extern", "false", "fn", "for", "if", "impl", "in", "let",
    "loop", "macro", "match", "mod", "move", "mut", "pub", "ref", "return",
    "self", "static", "struct", "super", "trait", "true", "type", "unsafe",
    "use", "where", "while", "yield",
];

/// Split a name into words at non-alphanumeric characters and at
/// lowercase-to-uppercase boundaries.
fn words(s: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for c in s.chars() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            out.push(std::mem::take(&mut current));
        }
        current.push(c);
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// `walk_room` / `SOFT_HOLD` / `Room A` -> `WalkRoom` / `SoftHold` / `RoomA`.
pub fn pascal_case(s: &str) -> String {
    let mut out = String::new();
    for word in words(s) {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(&chars.as_str().to_lowercase());
        }
    }
    if out.is_empty() {
        out.push_str("Value");
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, 'N');
    }
    out
}

/// Field identifier: snake_case with keyword and leading-digit guards.
pub fn field_ident(key: &str) -> String {
    let mut out = words(key)
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("_");
    if out.is_empty() {
        out.push_str("field");
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    if RUST_KEYWORDS.contains(&out.as_str()) {
        out.push('_');
    }
    out
}

/// Module (and output file) name for a schema: the full identifier minus
/// its `.schema.json` suffix, path separators flattened to `_`. Distinct
/// identifiers can still flatten to the same module name; the pipeline
/// rejects such graphs before writing anything.
pub fn module_name(id: &SchemaId) -> String {
    let mut base = id.as_str();
    base = base.strip_suffix(".json").unwrap_or(base);
    base = base.strip_suffix(".schema").unwrap_or(base);
    let mut out: String = base
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if out.is_empty() {
        out.push_str("schema");
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// Type name for a schema document's root, from its file stem.
pub fn root_type_name(id: &SchemaId) -> String {
    let mut stem = id.file_name();
    stem = stem.strip_suffix(".json").unwrap_or(stem);
    stem = stem.strip_suffix(".schema").unwrap_or(stem);
    pascal_case(stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pascal_case() {
        assert_eq!(pascal_case("walk_room"), "WalkRoom");
        assert_eq!(pascal_case("SOFT_HOLD"), "SoftHold");
        assert_eq!(pascal_case("Room A"), "RoomA");
        assert_eq!(pascal_case("gateProfile"), "GateProfile");
        assert_eq!(pascal_case("2fa"), "N2fa");
        assert_eq!(pascal_case(""), "Value");
    }

    #[test]
    fn test_field_ident() {
        assert_eq!(field_ident("session_state_ref"), "session_state_ref");
        assert_eq!(field_ident("gateProfile"), "gate_profile");
        assert_eq!(field_ident("type"), "type_");
        assert_eq!(field_ident("1st"), "_1st");
    }

    #[test]
    fn test_module_name() {
        assert_eq!(module_name(&SchemaId::new("rooms.schema.json")), "rooms");
        assert_eq!(
            module_name(&SchemaId::new("gates/coherence_gate.schema.json")),
            "gates_coherence_gate"
        );
    }

    #[test]
    fn test_root_type_name() {
        assert_eq!(root_type_name(&SchemaId::new("rooms.schema.json")), "Rooms");
        assert_eq!(
            root_type_name(&SchemaId::new("gates/coherence_gate.schema.json")),
            "CoherenceGate"
        );
    }
}
