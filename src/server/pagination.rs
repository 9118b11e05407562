/// Number of questions served per page.
pub const QUESTIONS_PER_PAGE: usize = 10;

/// Returns the 1-based `page` of `items`.
///
/// Pages past the end, and pages below 1, are empty rather than an error.
pub fn paginate<T>(page: i64, items: &[T]) -> &[T] {
    let Some(index) = usize::try_from(page).ok().and_then(|p| p.checked_sub(1)) else {
        return &[];
    };
    let start = index.saturating_mul(QUESTIONS_PER_PAGE);
    if start >= items.len() {
        return &[];
    }
    let end = (start + QUESTIONS_PER_PAGE).min(items.len());
    &items[start..end]
}
