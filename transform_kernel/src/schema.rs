//! Entity schemas — statically declared field layouts for proxies.
//!
//! A schema is plain data: ordered mutable fields, ordered read-only
//! fields, an alias map, and an exclusion set. Construction validates
//! the declaration; after that, lookups cannot fail structurally.
//!
//! Excluded fields stay declared (they document the full logical layout)
//! but are never exposed on a proxy built from this schema.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::SchemaError;

/// Whether a field accepts writes after the proxy is frozen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Mutable,
    ReadOnly,
}

/// The declared field layout for one entity kind.
#[derive(Debug, Clone)]
pub struct Schema {
    entity: String,
    order: Vec<String>,
    kinds: BTreeMap<String, FieldKind>,
    aliases: BTreeMap<String, String>,
    exclusions: BTreeSet<String>,
}

impl Schema {
    /// Declare a schema. Mutable and read-only names must be disjoint,
    /// aliases must target declared fields without shadowing any, and
    /// exclusions must name declared fields.
    pub fn new(
        entity: &str,
        mutable: &[&str],
        read_only: &[&str],
        aliases: &[(&str, &str)],
        exclusions: &[&str],
    ) -> Result<Self, SchemaError> {
        let mut order = Vec::new();
        let mut kinds = BTreeMap::new();

        for (names, kind) in [
            (mutable, FieldKind::Mutable),
            (read_only, FieldKind::ReadOnly),
        ] {
            for name in names {
                if kinds.insert(name.to_string(), kind).is_some() {
                    return Err(SchemaError::DuplicateField {
                        entity: entity.to_string(),
                        field: name.to_string(),
                    });
                }
                order.push(name.to_string());
            }
        }

        let mut alias_map = BTreeMap::new();
        for (alias, target) in aliases {
            if kinds.contains_key(*alias) {
                return Err(SchemaError::AliasShadowsField {
                    entity: entity.to_string(),
                    alias: alias.to_string(),
                });
            }
            if !kinds.contains_key(*target) {
                return Err(SchemaError::UnknownAliasTarget {
                    entity: entity.to_string(),
                    alias: alias.to_string(),
                    target: target.to_string(),
                });
            }
            alias_map.insert(alias.to_string(), target.to_string());
        }

        let mut exclusion_set = BTreeSet::new();
        for field in exclusions {
            if !kinds.contains_key(*field) {
                return Err(SchemaError::UnknownExclusion {
                    entity: entity.to_string(),
                    field: field.to_string(),
                });
            }
            exclusion_set.insert(field.to_string());
        }

        Ok(Self {
            entity: entity.to_string(),
            order,
            kinds,
            aliases: alias_map,
            exclusions: exclusion_set,
        })
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Resolve a canonical name or alias to the canonical field name.
    /// Excluded fields do not resolve — they are not exposed.
    pub fn resolve<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        let canonical = if self.kinds.contains_key(name) {
            name
        } else {
            self.aliases.get(name)?.as_str()
        };
        if self.exclusions.contains(canonical) {
            return None;
        }
        Some(canonical)
    }

    /// The kind of a canonical field, excluded or not.
    pub fn kind(&self, canonical: &str) -> Option<FieldKind> {
        self.kinds.get(canonical).copied()
    }

    /// Exposed fields in declaration order: declared minus excluded.
    pub fn active_fields(&self) -> impl Iterator<Item = &str> {
        self.order
            .iter()
            .map(|s| s.as_str())
            .filter(|f| !self.exclusions.contains(*f))
    }

    pub fn is_excluded(&self, canonical: &str) -> bool {
        self.exclusions.contains(canonical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_schema() -> Schema {
        Schema::new(
            "widget",
            &["x", "y", "z"],
            &["a", "b"],
            &[("yy", "y"), ("aa", "a")],
            &["z"],
        )
        .unwrap()
    }

    #[test]
    fn resolves_fields_and_aliases() {
        let s = test_schema();
        assert_eq!(s.resolve("x"), Some("x"));
        assert_eq!(s.resolve("yy"), Some("y"));
        assert_eq!(s.resolve("aa"), Some("a"));
        assert_eq!(s.resolve("nope"), None);
    }

    #[test]
    fn excluded_fields_do_not_resolve() {
        let s = test_schema();
        assert_eq!(s.resolve("z"), None);
        assert!(s.is_excluded("z"));
        let active: Vec<&str> = s.active_fields().collect();
        assert_eq!(active, vec!["x", "y", "a", "b"]);
    }

    #[test]
    fn kinds_are_tracked() {
        let s = test_schema();
        assert_eq!(s.kind("x"), Some(FieldKind::Mutable));
        assert_eq!(s.kind("a"), Some(FieldKind::ReadOnly));
        assert_eq!(s.kind("nope"), None);
    }

    #[test]
    fn duplicate_field_is_rejected() {
        let err = Schema::new("w", &["x"], &["x"], &[], &[]).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateField { .. }));
    }

    #[test]
    fn alias_must_target_declared_field() {
        let err = Schema::new("w", &["x"], &[], &[("y", "gone")], &[]).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownAliasTarget { .. }));
    }

    #[test]
    fn alias_cannot_shadow_field() {
        let err = Schema::new("w", &["x", "y"], &[], &[("x", "y")], &[]).unwrap_err();
        assert!(matches!(err, SchemaError::AliasShadowsField { .. }));
    }

    #[test]
    fn exclusion_must_be_declared() {
        let err = Schema::new("w", &["x"], &[], &[], &["gone"]).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownExclusion { .. }));
    }
}
