use crate::models::Profile;

/// Check whether two profiles may be paired
///
/// Each side's preference must name the other side's gender (case-insensitive)
/// or be the `anyone` sentinel. Age and location are not considered.
#[inline]
pub fn compatible(a: &Profile, b: &Profile) -> bool {
    a.accepts(&b.gender) && b.accepts(&a.gender)
}
