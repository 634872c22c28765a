// src/ingest/actors.rs
//! Actor canonicalization: fold, strip one leading role, resolve aliases.
//!
//! Resolution order:
//! 1. alias lookup on the whole folded text ("SECRETARIA DE SALUD" may itself be an alias)
//! 2. strip the longest matching leading role phrase, alias lookup again
//! 3. miss: the cleaned remainder, title-cased, becomes its own canonical name

use crate::config::Catalog;
use crate::entry::ActorName;
use crate::text::{collapse_ws, fold, title_case};

/// Canonical identity for one raw actor chunk. `None` for blank input.
pub fn canonicalize(raw: &str, catalog: &Catalog) -> Option<ActorName> {
    let cleaned = collapse_ws(raw).to_uppercase();
    if cleaned.is_empty() {
        return None;
    }

    let folded = fold(&cleaned);
    if let Some(canon) = catalog.alias(&folded) {
        return Some(ActorName::new(canon));
    }

    let surface: Vec<&str> = cleaned.split(' ').collect();
    let folded_words: Vec<&str> = folded.split(' ').collect();
    let skip = leading_role_len(&folded_words, catalog);

    let rest_folded = folded_words[skip..].join(" ");
    if let Some(canon) = catalog.alias(&rest_folded) {
        return Some(ActorName::new(canon));
    }

    // Folding keeps word boundaries, so word counts line up.
    let rest_surface = surface.get(skip..).unwrap_or(&surface[..]).join(" ");
    Some(ActorName::new(title_case(&rest_surface)))
}

/// Number of leading words covered by a role phrase, 0 if none.
/// A role is never stripped when nothing would remain.
fn leading_role_len(words: &[&str], catalog: &Catalog) -> usize {
    for role in catalog.roles() {
        if role.len() >= words.len() {
            continue;
        }
        let hit = role
            .iter()
            .zip(words)
            .all(|(r, w)| r.trim_end_matches('.') == w.trim_end_matches('.'));
        if hit {
            return role.len();
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::from_toml_str(
            r#"
roles = ["MAYOR", "GOVERNOR", "SECRETARIO", "SECRETARIO DE SALUD", "LIC"]
[aliases]
"John Smith" = ["smith", "J. SMITH"]
"Fiscalía General del Estado" = ["FGE", "FISCALÍA"]
"Secretaría de Salud" = ["SECRETARIA DE SALUD", "SSA"]
"#,
        )
        .unwrap()
    }

    fn canon(raw: &str) -> String {
        canonicalize(raw, &catalog()).unwrap().to_string()
    }

    #[test]
    fn role_stripping_and_alias() {
        assert_eq!(canon("Mayor Smith"), "John Smith");
        assert_eq!(canon("SMITH"), "John Smith");
        assert_eq!(canon("  j.  smith "), "John Smith");
    }

    #[test]
    fn accents_do_not_matter_for_lookup() {
        assert_eq!(canon("fiscalia"), "Fiscalía General del Estado");
        assert_eq!(canon("FISCALÍA"), "Fiscalía General del Estado");
    }

    #[test]
    fn whole_text_alias_beats_role_strip() {
        assert_eq!(canon("Secretaría de Salud"), "Secretaría de Salud");
    }

    #[test]
    fn longest_role_wins_and_only_once() {
        assert_eq!(canon("SECRETARIO DE SALUD JUAN PÉREZ"), "Juan Pérez");
        assert_eq!(canon("LIC. MAYOR GÓMEZ"), "Mayor Gómez");
    }

    #[test]
    fn unknown_actor_is_title_cased() {
        assert_eq!(canon("MARÍA DE LA LUZ"), "María de la Luz");
    }

    #[test]
    fn role_alone_is_kept() {
        assert_eq!(canon("GOVERNOR"), "Governor");
    }

    #[test]
    fn blank_is_none() {
        assert!(canonicalize("   ", &catalog()).is_none());
    }

    #[test]
    fn deterministic() {
        let c = catalog();
        let a = canonicalize("Gobernador X", &c);
        let b = canonicalize("Gobernador X", &c);
        assert_eq!(a, b);
    }
}
