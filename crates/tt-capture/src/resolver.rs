//! Picks the identification a new tree capture belongs to.

use tt_types::Identification;

/// Return the identification with the latest `created_at`.
///
/// Identifications without a creation date never win. Equal timestamps are
/// ordered by id, the greater id winning, so the result does not depend on
/// input order. Returns `None` for empty input or when no record is dated.
pub fn resolve_latest<'a, I>(identifications: I) -> Option<&'a Identification>
where
    I: IntoIterator<Item = &'a Identification>,
{
    identifications
        .into_iter()
        .filter_map(|identification| identification.created_at.map(|at| (at, identification)))
        .max_by(|(a_at, a), (b_at, b)| a_at.cmp(b_at).then_with(|| a.id.cmp(&b.id)))
        .map(|(_, identification)| identification)
}
