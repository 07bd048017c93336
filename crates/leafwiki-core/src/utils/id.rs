use crate::model::PageId;

/// Generate a unique page id
///
/// Returns a 23-character URL-friendly string from nanoid's default alphabet.
pub fn generate_id() -> PageId {
    PageId(nanoid::nanoid!(23))
}
