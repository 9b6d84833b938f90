use std::cmp::Ordering;

use switchrt_core::{ColorCategory, ResponseKey};

use crate::generator::PIVOT_VALUE;

/// The key that answers `value` under the rule selected by `category`.
///
/// Blue asks lower (Z) or higher (X) than five; pink asks odd (N) or even (M).
/// Five itself has no magnitude answer.
pub fn expected_key(category: ColorCategory, value: u8) -> Option<ResponseKey> {
    match category {
        ColorCategory::Blue => match value.cmp(&PIVOT_VALUE) {
            Ordering::Less => Some(ResponseKey::Z),
            Ordering::Greater => Some(ResponseKey::X),
            Ordering::Equal => None,
        },
        ColorCategory::Pink if value % 2 == 0 => Some(ResponseKey::M),
        ColorCategory::Pink => Some(ResponseKey::N),
    }
}

pub fn score(category: ColorCategory, value: u8, key: ResponseKey) -> bool {
    expected_key(category, value) == Some(key)
}
