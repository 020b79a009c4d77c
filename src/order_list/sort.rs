use tracing::warn;

use crate::domain::Order;

/// Client-side ordering applied to an already fetched result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    #[default]
    Newest,
    Oldest,
    PriceHigh,
    PriceLow,
    /// Fallback for unrecognised keys: keeps the server's order.
    Unsorted,
}

impl SortBy {
    #[cfg(test)]
    pub const OPTIONS: [SortBy; 4] = [
        SortBy::Newest,
        SortBy::Oldest,
        SortBy::PriceHigh,
        SortBy::PriceLow,
    ];

    /// Never fails: an unknown key maps to [`SortBy::Unsorted`].
    pub fn from_key(key: &str) -> Self {
        match key.trim() {
            "newest" => SortBy::Newest,
            "oldest" => SortBy::Oldest,
            "price-high" => SortBy::PriceHigh,
            "price-low" => SortBy::PriceLow,
            other => {
                warn!(sort_key = %other, "Unknown sort key, keeping server order");
                SortBy::Unsorted
            }
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            SortBy::Newest => "newest",
            SortBy::Oldest => "oldest",
            SortBy::PriceHigh => "price-high",
            SortBy::PriceLow => "price-low",
            SortBy::Unsorted => "unsorted",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortBy::Newest => "Newest First",
            SortBy::Oldest => "Oldest First",
            SortBy::PriceHigh => "Price: High to Low",
            SortBy::PriceLow => "Price: Low to High",
            SortBy::Unsorted => "Server Order",
        }
    }
}

fn created_millis(order: &Order) -> i64 {
    order.created_at.map_or(0, |ts| ts.timestamp_millis())
}

fn total_or_zero(order: &Order) -> f64 {
    // `+ 0.0` folds -0.0 into 0.0 so the two compare as a tie.
    order.total_amount.unwrap_or(0.0) + 0.0
}

/// Produces the display ordering of `orders`.
///
/// Absent input yields an empty list. Missing timestamps count as the epoch
/// and missing totals as zero. `slice::sort_by` is stable, so ties keep
/// their input order. The input is never touched.
pub fn sort_orders(orders: Option<&[Order]>, sort_by: SortBy) -> Vec<Order> {
    let Some(orders) = orders else {
        return Vec::new();
    };
    let mut sorted = orders.to_vec();
    match sort_by {
        SortBy::Newest => sorted.sort_by(|a, b| created_millis(b).cmp(&created_millis(a))),
        SortBy::Oldest => sorted.sort_by_key(created_millis),
        SortBy::PriceHigh => {
            sorted.sort_by(|a, b| total_or_zero(b).total_cmp(&total_or_zero(a)))
        }
        SortBy::PriceLow => {
            sorted.sort_by(|a, b| total_or_zero(a).total_cmp(&total_or_zero(b)))
        }
        SortBy::Unsorted => {}
    }
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OrderStatus;

    fn order(id: u64) -> Order {
        Order::new(id, OrderStatus::Pending)
    }

    fn ids(orders: &[Order]) -> Vec<u64> {
        orders.iter().map(|o| o.id).collect()
    }

    fn mixed() -> Vec<Order> {
        vec![
            order(1).created("2024-03-01").total(15.0),
            order(2),
            order(3).created("2024-01-15").total(99.5),
            order(4).created("2024-03-01").total(15.0),
            order(5).total(-0.0),
            order(6).created("2023-12-31T23:59:59"),
        ]
    }

    #[test]
    fn test_two_order_scenario() {
        let input = vec![
            order(1).created("2024-01-01").total(50.0),
            order(2).created("2024-02-01").total(20.0),
        ];
        assert_eq!(ids(&sort_orders(Some(&input), SortBy::Newest)), vec![2, 1]);
        assert_eq!(ids(&sort_orders(Some(&input), SortBy::PriceLow)), vec![2, 1]);
        assert_eq!(ids(&sort_orders(Some(&input), SortBy::Oldest)), vec![1, 2]);
        assert_eq!(ids(&sort_orders(Some(&input), SortBy::PriceHigh)), vec![1, 2]);
    }

    #[test]
    fn test_absent_and_empty_input() {
        for sort_by in SortBy::OPTIONS {
            assert!(sort_orders(None, sort_by).is_empty());
            assert!(sort_orders(Some(&[]), sort_by).is_empty());
        }
    }

    #[test]
    fn test_output_is_permutation_of_input() {
        let input = mixed();
        for sort_by in SortBy::OPTIONS.into_iter().chain([SortBy::Unsorted]) {
            let mut out = ids(&sort_orders(Some(&input), sort_by));
            out.sort_unstable();
            assert_eq!(out, vec![1, 2, 3, 4, 5, 6], "sort key {:?}", sort_by);
        }
    }

    #[test]
    fn test_missing_timestamp_sorts_as_epoch() {
        let input = mixed();
        // 1 and 4 tie on timestamp and keep input order; 2 and 5 have none.
        assert_eq!(ids(&sort_orders(Some(&input), SortBy::Newest)), vec![1, 4, 3, 6, 2, 5]);
        assert_eq!(ids(&sort_orders(Some(&input), SortBy::Oldest)), vec![2, 5, 6, 3, 1, 4]);
    }

    #[test]
    fn test_missing_total_sorts_as_zero() {
        let input = mixed();
        // 2, 5 (-0.0) and 6 all count as zero and stay in input order.
        assert_eq!(ids(&sort_orders(Some(&input), SortBy::PriceHigh)), vec![3, 1, 4, 2, 5, 6]);
        assert_eq!(ids(&sort_orders(Some(&input), SortBy::PriceLow)), vec![2, 5, 6, 1, 4, 3]);
    }

    #[test]
    fn test_newest_is_reverse_of_oldest_without_gaps() {
        let input = vec![
            order(10).created("2024-05-01"),
            order(11).created("2022-01-01T08:00:00"),
            order(12).created("2024-05-01T00:00:01"),
            order(13).created("2023-07-04"),
        ];
        let mut newest = ids(&sort_orders(Some(&input), SortBy::Newest));
        newest.reverse();
        assert_eq!(newest, ids(&sort_orders(Some(&input), SortBy::Oldest)));
    }

    #[test]
    fn test_ties_keep_input_order() {
        let input = vec![
            order(3).total(5.0),
            order(1).total(5.0),
            order(2).total(5.0),
        ];
        assert_eq!(ids(&sort_orders(Some(&input), SortBy::PriceHigh)), vec![3, 1, 2]);
        assert_eq!(ids(&sort_orders(Some(&input), SortBy::PriceLow)), vec![3, 1, 2]);
        assert_eq!(ids(&sort_orders(Some(&input), SortBy::Newest)), vec![3, 1, 2]);
    }

    #[test]
    fn test_unknown_key_keeps_input_order() {
        let input = mixed();
        let sort_by = SortBy::from_key("alphabetical");
        assert_eq!(sort_by, SortBy::Unsorted);
        assert_eq!(sort_orders(Some(&input), sort_by), input);
    }

    #[test]
    fn test_input_is_not_mutated() {
        let input = mixed();
        let before = input.clone();
        let _ = sort_orders(Some(&input), SortBy::PriceLow);
        assert_eq!(input, before);
    }

    #[test]
    fn test_key_round_trip() {
        for sort_by in SortBy::OPTIONS {
            assert_eq!(SortBy::from_key(sort_by.key()), sort_by);
        }
    }
}
