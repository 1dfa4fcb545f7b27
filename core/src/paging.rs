use anchorage_types::RegistryError;

/// `items[offset..offset + limit]`, with `limit` clamped to what remains.
///
/// An offset equal to the length yields an empty page; past it is an error.
pub(crate) fn page<T>(items: &[T], offset: usize, limit: usize) -> Result<&[T], RegistryError> {
    let len = items.len();
    if offset > len {
        return Err(RegistryError::InvalidRange { offset, len });
    }
    let end = offset.saturating_add(limit).min(len);
    Ok(&items[offset..end])
}

/// The first `max` items, clamped.
pub(crate) fn head<T>(items: &[T], max: usize) -> &[T] {
    &items[..max.min(items.len())]
}
