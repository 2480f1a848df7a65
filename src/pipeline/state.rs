use thiserror::Error;

use crate::models::{ItemStatus, Product, ProjectItem};

#[derive(Error, Debug, PartialEq)]
pub enum StateError {
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition { from: ItemStatus, to: ItemStatus },

    #[error("a found or manually entered item requires a manual URL")]
    MissingManualUrl,
}

/// The transition table.
///
/// `Found -> Pending` is deliberately absent: a confirmed found item can
/// only change through manual entry, so a flaky re-lookup can never
/// downgrade it. Manual entry is allowed from every state.
pub fn transition_allowed(from: ItemStatus, to: ItemStatus) -> bool {
    use ItemStatus::*;
    matches!(
        (from, to),
        (Pending, Found) | (Pending, NotFound) | (NotFound, Pending) | (_, ManualEntry)
    )
}

fn check(item: &ProjectItem, to: ItemStatus) -> Result<(), StateError> {
    if transition_allowed(item.status, to) {
        Ok(())
    } else {
        Err(StateError::InvalidTransition {
            from: item.status,
            to,
        })
    }
}

/// `pending -> found`: record the manual URL and link the product.
pub fn mark_found(item: &mut ProjectItem, product: &Product) -> Result<(), StateError> {
    check(item, ItemStatus::Found)?;
    if product.manual_url.trim().is_empty() {
        return Err(StateError::MissingManualUrl);
    }
    item.status = ItemStatus::Found;
    item.manual_url = Some(product.manual_url.clone());
    item.product_id = Some(product.id);
    Ok(())
}

/// `pending -> not_found`, optionally with a note explaining why.
pub fn mark_not_found(item: &mut ProjectItem, note: Option<&str>) -> Result<(), StateError> {
    check(item, ItemStatus::NotFound)?;
    item.status = ItemStatus::NotFound;
    if let Some(note) = note {
        item.notes = Some(note.to_string());
    }
    Ok(())
}

/// `not_found -> pending`: explicit per-item retry.
pub fn mark_retry(item: &mut ProjectItem) -> Result<(), StateError> {
    check(item, ItemStatus::Pending)?;
    item.status = ItemStatus::Pending;
    Ok(())
}

/// `any -> manual_entry`: user-supplied manual URL and notes, stored
/// verbatim. Clears the product link — the override wins.
pub fn mark_manual_entry(
    item: &mut ProjectItem,
    manual_url: &str,
    notes: Option<&str>,
) -> Result<(), StateError> {
    if manual_url.trim().is_empty() {
        return Err(StateError::MissingManualUrl);
    }
    check(item, ItemStatus::ManualEntry)?;
    item.status = ItemStatus::ManualEntry;
    item.manual_url = Some(manual_url.to_string());
    item.notes = notes.map(str::to_string);
    item.product_id = None;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn item_in(status: ItemStatus) -> ProjectItem {
        let mut item = ProjectItem::new_pending(
            Uuid::new_v4(),
            "Bosch SHP878ZD5N dishwasher",
            "Bosch",
            "SHP878ZD5N",
            "dishwasher",
        );
        item.status = status;
        item
    }

    fn product_with_url(url: &str) -> Product {
        let mut p = Product::new("SHP878ZD5N");
        p.manual_url = url.into();
        p
    }

    #[test]
    fn transition_matrix() {
        use ItemStatus::*;
        let allowed = [
            (Pending, Found),
            (Pending, NotFound),
            (NotFound, Pending),
            (Pending, ManualEntry),
            (Found, ManualEntry),
            (NotFound, ManualEntry),
            (ManualEntry, ManualEntry),
        ];
        for (from, to) in allowed {
            assert!(transition_allowed(from, to), "{from} -> {to} should be allowed");
        }

        let rejected = [
            (Found, Pending), // no downgrade of a confirmed item
            (Found, NotFound),
            (ManualEntry, Pending),
            (ManualEntry, Found),
            (NotFound, Found),
            (Pending, Pending),
        ];
        for (from, to) in rejected {
            assert!(!transition_allowed(from, to), "{from} -> {to} should be rejected");
        }
    }

    #[test]
    fn found_requires_manual_url() {
        let mut item = item_in(ItemStatus::Pending);
        let result = mark_found(&mut item, &Product::new("SHP878ZD5N"));
        assert_eq!(result, Err(StateError::MissingManualUrl));
        // Item untouched on failure
        assert_eq!(item.status, ItemStatus::Pending);
        assert_eq!(item.manual_url, None);
    }

    #[test]
    fn mark_found_sets_url_and_link() {
        let mut item = item_in(ItemStatus::Pending);
        let product = product_with_url("http://x/manual.pdf");
        mark_found(&mut item, &product).unwrap();
        assert_eq!(item.status, ItemStatus::Found);
        assert_eq!(item.manual_url.as_deref(), Some("http://x/manual.pdf"));
        assert_eq!(item.product_id, Some(product.id));
    }

    #[test]
    fn retry_from_found_is_rejected() {
        let mut item = item_in(ItemStatus::Found);
        let result = mark_retry(&mut item);
        assert_eq!(
            result,
            Err(StateError::InvalidTransition {
                from: ItemStatus::Found,
                to: ItemStatus::Pending,
            })
        );
        assert_eq!(item.status, ItemStatus::Found);
    }

    #[test]
    fn retry_from_not_found_is_accepted() {
        let mut item = item_in(ItemStatus::NotFound);
        mark_retry(&mut item).unwrap();
        assert_eq!(item.status, ItemStatus::Pending);
    }

    #[test]
    fn manual_entry_allowed_from_every_state() {
        use ItemStatus::*;
        for status in [Pending, Found, NotFound, ManualEntry] {
            let mut item = item_in(status);
            item.product_id = Some(Uuid::new_v4());
            mark_manual_entry(&mut item, "http://user/manual.pdf", Some("from installer"))
                .unwrap();
            assert_eq!(item.status, ManualEntry);
            assert_eq!(item.manual_url.as_deref(), Some("http://user/manual.pdf"));
            assert_eq!(item.notes.as_deref(), Some("from installer"));
            assert_eq!(item.product_id, None, "override clears the product link");
        }
    }

    #[test]
    fn manual_entry_requires_url() {
        let mut item = item_in(ItemStatus::Pending);
        assert_eq!(
            mark_manual_entry(&mut item, "  ", None),
            Err(StateError::MissingManualUrl)
        );
    }

    #[test]
    fn not_found_note_is_recorded() {
        let mut item = item_in(ItemStatus::Pending);
        mark_not_found(&mut item, Some("lookup unavailable, retry later")).unwrap();
        assert_eq!(item.status, ItemStatus::NotFound);
        assert_eq!(
            item.notes.as_deref(),
            Some("lookup unavailable, retry later")
        );
    }
}
