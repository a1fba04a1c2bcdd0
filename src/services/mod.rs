//! Application services
//!
//! Each operation takes the store and collaborators it needs explicitly and
//! returns domain values; HTTP concerns stay in `api`.

pub mod accounts;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod newsletter;
pub mod orders;

use crate::domain::aggregates::Item;
use crate::domain::value_objects::Slug;
use crate::store::{SlugScope, Store};
use crate::{AppError, Result};

/// First free slug among `base`, `base-1`, `base-2`, ...
pub(crate) async fn unique_slug(store: &dyn Store, scope: SlugScope, base: Slug) -> Result<Slug> {
    let mut suffix = 0;
    loop {
        let candidate = base.with_suffix(suffix);
        if !store.slug_taken(scope, &candidate).await? {
            return Ok(candidate);
        }
        suffix += 1;
    }
}

/// Looks up an item by the slug given in a URL.
pub(crate) async fn item_by_path(store: &dyn Store, raw_slug: &str) -> Result<Item> {
    let Some(slug) = Slug::parse(raw_slug) else {
        return Err(AppError::not_found("Item"));
    };
    store.item_by_slug(&slug).await?.ok_or_else(|| AppError::not_found("Item"))
}
