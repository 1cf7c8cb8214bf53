use crate::config::Settings;
use crate::error::{Error, Result};
use crate::sort::OrderBy;

/// Orders `collection` by `order_by`, the key derived from a request.
///
/// Keys of one character or fewer (`""`, `"-"`) mean "not sorted" and leave
/// the collection as is. An invalid field is a not-found error when
/// `settings.invalid_field_raises_404` is set; otherwise the collection is
/// returned unordered.
pub fn autosort<C: OrderBy>(collection: C, order_by: &str, settings: &Settings) -> Result<C> {
    if order_by.chars().count() <= 1 {
        return Ok(collection);
    }

    match collection.order_by(order_by) {
        Ok(sorted) => Ok(sorted),
        Err(e) if settings.invalid_field_raises_404 => Err(Error::not_found(e)),
        Err(e) => {
            tracing::debug!(field = %e.field, "ignoring invalid sort field");
            Ok(collection)
        }
    }
}
