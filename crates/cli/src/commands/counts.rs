//! Wishlist counts per variant.
//!
//! # Usage
//!
//! ```bash
//! wishlist-cli counts variant_01 variant_02
//! ```

use std::collections::BTreeSet;

use wishlist_core::VariantId;
use wishlist_server::db::{PgWishlistStore, WishlistStore};

use super::{CommandError, connect};

/// Print `<variant_id>\t<count>` for each requested variant.
///
/// # Errors
///
/// Returns `CommandError` for an invalid ID or a database failure.
pub async fn run(raw_ids: &[String]) -> Result<(), CommandError> {
    let variant_ids = parse_variant_ids(raw_ids)?;

    let store = PgWishlistStore::new(connect().await?);
    let counts = store.count_items_by_variant(&variant_ids).await?;

    #[allow(clippy::print_stdout)]
    for id in &variant_ids {
        println!("{id}\t{}", counts.get(id).copied().unwrap_or_default());
    }
    Ok(())
}

fn parse_variant_ids(raw_ids: &[String]) -> Result<BTreeSet<VariantId>, CommandError> {
    raw_ids
        .iter()
        .map(|raw| {
            VariantId::parse(raw.trim()).map_err(|e| CommandError::InvalidVariant(raw.clone(), e))
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_variant_ids_dedupes() {
        let raw = vec!["v2".to_owned(), " v1 ".to_owned(), "v2".to_owned()];
        let ids = parse_variant_ids(&raw).unwrap();
        let ids: Vec<&str> = ids.iter().map(VariantId::as_str).collect();
        assert_eq!(ids, vec!["v1", "v2"]);
    }

    #[test]
    fn test_parse_variant_ids_rejects_blank() {
        let raw = vec![" ".to_owned()];
        assert!(matches!(
            parse_variant_ids(&raw),
            Err(CommandError::InvalidVariant(..))
        ));
    }
}
