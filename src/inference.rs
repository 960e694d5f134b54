// Field-role inference over schema-less records.
//
// The records endpoint does not promise stable field names, so the roles are
// resolved once from a sample record by walking ordered rule lists. Nothing in
// here fails: an unresolved role is simply `None`.
use crate::types::{CountRole, Record, RoleMapping};
use tracing::debug;

/// How one positional role is found: exact names first, then a key position.
struct NamedRule {
    names: &'static [&'static str],
    fallback_position: usize,
}

const DISTRICT_RULE: NamedRule = NamedRule {
    names: &["district_name", "district"],
    fallback_position: 1,
};

const YEAR_RULE: NamedRule = NamedRule {
    names: &["financial_year"],
    fallback_position: 0,
};

/// Substring (lowercase) that identifies each count field.
const COUNT_NEEDLES: [(CountRole, &str); 3] = [
    (CountRole::Persondays, "persondays"),
    (CountRole::Households, "household"),
    (CountRole::AvgDays, "average"),
];

fn resolve_named(sample: &Record, rule: &NamedRule) -> Option<String> {
    rule.names
        .iter()
        .find(|name| sample.contains_key(**name))
        .map(|name| name.to_string())
        .or_else(|| sample.keys().nth(rule.fallback_position).cloned())
}

fn resolve_containing(sample: &Record, needle: &str) -> Option<String> {
    sample
        .keys()
        .find(|k| k.to_lowercase().contains(needle))
        .cloned()
}

pub fn count_needle(role: CountRole) -> &'static str {
    COUNT_NEEDLES
        .iter()
        .find(|(r, _)| *r == role)
        .map(|(_, n)| *n)
        .unwrap_or("")
}

/// Resolve every role against one sample record.
pub fn infer_roles(sample: &Record) -> RoleMapping {
    let mapping = RoleMapping {
        district: resolve_named(sample, &DISTRICT_RULE),
        year: resolve_named(sample, &YEAR_RULE),
        persondays: resolve_containing(sample, count_needle(CountRole::Persondays)),
        households: resolve_containing(sample, count_needle(CountRole::Households)),
        avg_days: resolve_containing(sample, count_needle(CountRole::AvgDays)),
    };
    debug!(?mapping, "resolved field roles");
    mapping
}
