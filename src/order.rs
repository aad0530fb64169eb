//! Display ordering of acquired items.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::DisplayOrder;
use crate::source::NewsItem;

/// Order `items` for display.
///
/// `Chronological` is a stable newest-first sort.  `Random` shuffles anew on
/// every call.
pub fn order(items: &[NewsItem], mode: DisplayOrder) -> Vec<NewsItem> {
    order_with(items, mode, &mut rand::rng())
}

pub fn order_with<R: Rng + ?Sized>(
    items: &[NewsItem],
    mode: DisplayOrder,
    rng: &mut R,
) -> Vec<NewsItem> {
    let mut ordered = items.to_vec();
    match mode {
        DisplayOrder::Chronological => ordered.sort_by(NewsItem::newest_first),
        DisplayOrder::Random => ordered.shuffle(rng),
    }
    ordered
}
