//! Change-tracked proxy — the mutable shadow of one canonical record.
//!
//! The proxy holds current values for every exposed field, a baseline
//! snapshot taken at the last `mark()`, and the set of fields whose
//! current value differs from the baseline. Membership in the changed
//! set is recomputed on every write, so reverting a field to its
//! baseline value removes it again — no accumulated history.
//!
//! Freeze semantics: after `freeze()`, writes to read-only fields are
//! silently discarded. Mutable fields stay writable. The adapter uses
//! the pre-freeze window to copy record values in.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::ProxyError;
use crate::schema::{FieldKind, Schema};
use crate::value::FieldValue;

/// Mutable shadow of a canonical record, tracking changes against a
/// baseline. One proxy per record, one record per invocation.
#[derive(Debug, Clone)]
pub struct TrackedProxy {
    schema: Schema,
    values: BTreeMap<String, FieldValue>,
    baseline: BTreeMap<String, FieldValue>,
    changed: BTreeSet<String>,
    frozen: bool,
}

impl TrackedProxy {
    /// Construct with every exposed field at the unset sentinel,
    /// an empty baseline, and an empty changed set.
    pub fn new(schema: Schema) -> Self {
        let values: BTreeMap<String, FieldValue> = schema
            .active_fields()
            .map(|f| (f.to_string(), FieldValue::Unset))
            .collect();
        Self {
            schema,
            values,
            baseline: BTreeMap::new(),
            changed: BTreeSet::new(),
            frozen: false,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Write a field through its canonical name or an alias.
    ///
    /// Frozen read-only fields swallow the write: no error, no state
    /// change, no changed-set entry. Everything else updates the current
    /// value and recomputes changed-set membership against the baseline.
    pub fn set(&mut self, name: &str, value: FieldValue) -> Result<(), ProxyError> {
        let canonical = self.resolve(name)?.to_string();

        if self.frozen && self.schema.kind(&canonical) == Some(FieldKind::ReadOnly) {
            return Ok(());
        }

        self.values.insert(canonical.clone(), value);

        // An empty baseline reads as all-unset.
        let differs = match self.baseline.get(&canonical) {
            Some(base) => self.values[&canonical] != *base,
            None => !self.values[&canonical].is_unset(),
        };
        if differs {
            self.changed.insert(canonical);
        } else {
            self.changed.remove(&canonical);
        }
        Ok(())
    }

    /// Read a field through its canonical name or an alias.
    /// Never-written fields read as `Unset`.
    pub fn get(&self, name: &str) -> Result<FieldValue, ProxyError> {
        let canonical = self.resolve(name)?;
        Ok(self.values[canonical].clone())
    }

    /// Take the current values as the new baseline and clear the changed
    /// set. Idempotent.
    pub fn mark(&mut self) {
        self.baseline = self.values.clone();
        self.changed.clear();
    }

    /// Stop accepting writes to read-only fields. Idempotent; leaves the
    /// existing changed set alone.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// True iff any field currently differs from the baseline.
    pub fn changed(&self) -> bool {
        !self.changed.is_empty()
    }

    /// The changed fields as canonical-name → current-value. Aliased
    /// writes report under the canonical name.
    pub fn get_changes(&self) -> BTreeMap<String, FieldValue> {
        self.changed
            .iter()
            .map(|f| (f.clone(), self.values[f].clone()))
            .collect()
    }

    fn resolve<'a>(&'a self, name: &'a str) -> Result<&'a str, ProxyError> {
        self.schema.resolve(name).ok_or_else(|| ProxyError::UnknownField {
            entity: self.schema.entity().to_string(),
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Layout mirroring the smallest real proxy: three mutable fields,
    /// two read-only, one alias each way, one excluded field.
    fn test_proxy() -> TrackedProxy {
        let schema = Schema::new(
            "widget",
            &["x", "y", "z"],
            &["a", "b"],
            &[("yy", "y"), ("aa", "a")],
            &["z"],
        )
        .unwrap();
        TrackedProxy::new(schema)
    }

    // ── Test 1: fresh proxy is unchanged and unset ──────────────────

    #[test]
    fn fresh_proxy_is_unchanged() {
        let p = test_proxy();
        assert!(!p.changed());
        assert_eq!(p.get("x").unwrap(), FieldValue::Unset);
        assert!(p.get_changes().is_empty());
    }

    // ── Test 2: mark clears the changed set ─────────────────────────

    #[test]
    fn mark_establishes_baseline() {
        let mut p = test_proxy();
        p.set("x", FieldValue::Int(50)).unwrap();
        assert!(p.changed());

        p.mark();
        assert!(!p.changed());

        // Re-writing the baseline value is not a change.
        p.set("x", FieldValue::Int(50)).unwrap();
        assert!(!p.changed());

        // mark() is idempotent.
        p.mark();
        p.mark();
        assert!(!p.changed());
    }

    // ── Test 3: revert to baseline removes the change ───────────────

    #[test]
    fn revert_to_baseline_clears_change() {
        let mut p = test_proxy();
        p.set("x", FieldValue::Int(50)).unwrap();
        p.mark();

        p.set("x", FieldValue::Int(51)).unwrap();
        assert!(p.changed());
        assert_eq!(p.get_changes().get("x"), Some(&FieldValue::Int(51)));

        p.set("x", FieldValue::Int(50)).unwrap();
        assert!(!p.changed());
        assert!(p.get_changes().is_empty());
    }

    // ── Test 4: aliases are pure indirection ────────────────────────

    #[test]
    fn alias_reads_and_writes_are_transparent() {
        let mut p = test_proxy();
        p.mark();

        p.set("yy", FieldValue::Str("woot".to_string())).unwrap();
        assert_eq!(p.get("y").unwrap(), FieldValue::Str("woot".to_string()));
        assert_eq!(p.get("yy").unwrap(), FieldValue::Str("woot".to_string()));

        // Changes report the canonical name, never the alias.
        let changes = p.get_changes();
        assert!(changes.contains_key("y"));
        assert!(!changes.contains_key("yy"));
    }

    // ── Test 5: freeze blocks read-only writes only ─────────────────

    #[test]
    fn freeze_discards_readonly_writes() {
        let mut p = test_proxy();
        // Read-only fields are writable before freeze.
        p.set("a", FieldValue::Str("initial".to_string())).unwrap();
        p.mark();
        p.freeze();

        p.set("a", FieldValue::Str("ignored".to_string())).unwrap();
        assert_eq!(p.get("a").unwrap(), FieldValue::Str("initial".to_string()));
        assert_eq!(p.get("aa").unwrap(), FieldValue::Str("initial".to_string()));
        assert!(!p.changed());

        // Mutable fields still accept writes after freeze.
        p.set("x", FieldValue::Int(1)).unwrap();
        assert!(p.changed());
    }

    // ── Test 6: unknown and excluded names fail alike ───────────────

    #[test]
    fn unknown_field_errors() {
        let mut p = test_proxy();
        assert!(matches!(
            p.get("nope"),
            Err(ProxyError::UnknownField { .. })
        ));
        assert!(matches!(
            p.set("nope", FieldValue::Int(1)),
            Err(ProxyError::UnknownField { .. })
        ));
        // "z" is declared but excluded — not exposed on this proxy.
        assert!(matches!(p.get("z"), Err(ProxyError::UnknownField { .. })));
    }

    // ── Test 7: changed set never contains stale history ────────────

    #[test]
    fn changed_set_tracks_current_difference_only() {
        let mut p = test_proxy();
        p.set("x", FieldValue::Int(1)).unwrap();
        p.set("y", FieldValue::Int(2)).unwrap();
        p.mark();

        p.set("x", FieldValue::Int(9)).unwrap();
        p.set("y", FieldValue::Int(8)).unwrap();
        p.set("y", FieldValue::Int(2)).unwrap();

        let changes = p.get_changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes.get("x"), Some(&FieldValue::Int(9)));
    }
}
