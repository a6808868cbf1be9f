//! The customer's wishlist as a set of product IDs.

use std::collections::BTreeSet;

use crate::types::ProductId;

/// What a toggle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WishlistAction {
    Added,
    Removed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Wishlist {
    products: BTreeSet<ProductId>,
}

impl Wishlist {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.products.contains(&id)
    }

    /// Add the product if absent, remove it if present.
    pub fn toggle(&mut self, id: ProductId) -> WishlistAction {
        if self.products.remove(&id) {
            WishlistAction::Removed
        } else {
            self.products.insert(id);
            WishlistAction::Added
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ProductId> + '_ {
        self.products.iter().copied()
    }
}

impl FromIterator<ProductId> for Wishlist {
    fn from_iter<I: IntoIterator<Item = ProductId>>(iter: I) -> Self {
        Self {
            products: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_twice_restores_membership() {
        let original: Wishlist = [1, 2, 3].into_iter().map(ProductId::new).collect();
        for id in [2, 9] {
            let mut wishlist = original.clone();
            let first = wishlist.toggle(ProductId::new(id));
            let second = wishlist.toggle(ProductId::new(id));
            assert_ne!(first, second);
            assert_eq!(wishlist, original);
        }
    }

    #[test]
    fn test_toggle_reports_action() {
        let mut wishlist = Wishlist::new();
        assert_eq!(wishlist.toggle(ProductId::new(4)), WishlistAction::Added);
        assert!(wishlist.contains(ProductId::new(4)));
        assert_eq!(wishlist.len(), 1);
        assert_eq!(wishlist.toggle(ProductId::new(4)), WishlistAction::Removed);
        assert!(wishlist.is_empty());
    }
}
