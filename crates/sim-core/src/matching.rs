//! Matching engine implementing price-time priority.
//!
//! The engine walks the opposite side of the book best-price-first,
//! executing slices until the incoming order's limit blocks or quantity
//! runs out. It records one maker fill per slice; the caller reconciles
//! per-participant books and settlement from those records.

use types::{Cash, Order, OrderId, OrderKind, OrderSide, Price, Quantity};

use crate::order_book::OrderBook;

/// One slice executed against a resting (maker) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MakerFill {
    /// The resting order that was hit.
    pub order_id: OrderId,
    /// Execution price (the maker's price).
    pub price: Price,
    /// Shares executed in this slice.
    pub quantity: Quantity,
    /// Whether the maker order was fully consumed by this slice.
    pub maker_done: bool,
}

/// Result of matching one incoming order.
#[derive(Debug, Clone, Default)]
pub struct MatchResult {
    /// Maker-side slices in execution order.
    pub fills: Vec<MakerFill>,
    /// Quantity of the incoming order left unfilled.
    pub remaining_quantity: Quantity,
}

impl MatchResult {
    /// Total quantity executed.
    pub fn filled_quantity(&self) -> Quantity {
        self.fills.iter().map(|f| f.quantity).sum()
    }

    /// Whether anything executed.
    pub fn has_fills(&self) -> bool {
        !self.fills.is_empty()
    }
}

/// Process an incoming order against the book.
///
/// Fills execute at the resting order's price. Unfilled limit remainder is
/// NOT added to the book; the caller decides whether it rests.
pub fn match_order(book: &mut OrderBook, order: &mut Order) -> MatchResult {
    match_order_budgeted(book, order, None)
}

/// Like [`match_order`], but stops before cumulative cost would exceed
/// `budget`. Used for market buys, whose locked cash is based on the best
/// ask at submission and must bound what actually executes.
pub fn match_order_budgeted(
    book: &mut OrderBook,
    order: &mut Order,
    budget: Option<Cash>,
) -> MatchResult {
    let mut result = MatchResult {
        fills: Vec::new(),
        remaining_quantity: order.remaining_quantity,
    };
    let mut budget_left = budget;

    let limit_price = match order.kind {
        OrderKind::Limit { price } => Some(price),
        OrderKind::Market => None,
    };
    let maker_side = order.side.opposite();

    while !result.remaining_quantity.is_zero() {
        let (best_price, peek) = match maker_side {
            OrderSide::Sell => (book.best_ask_price(), book.peek_best_ask_order()),
            OrderSide::Buy => (book.best_bid_price(), book.peek_best_bid_order()),
        };
        let Some(maker_price) = best_price else {
            break;
        };

        // Limit check: a buy cannot lift asks above its limit, a sell
        // cannot hit bids below its limit.
        if let Some(limit) = limit_price {
            let crosses = match order.side {
                OrderSide::Buy => maker_price <= limit,
                OrderSide::Sell => maker_price >= limit,
            };
            if !crosses {
                break;
            }
        }

        let Some((maker_order_id, maker_qty)) = peek else {
            break;
        };

        let mut quantity = result.remaining_quantity.min(maker_qty);
        if let Some(left) = budget_left {
            // Largest slice the remaining budget can pay for at this level.
            let affordable = Quantity((left.raw() / maker_price.raw()).max(0) as u64);
            quantity = quantity.min(affordable);
            if quantity.is_zero() {
                break;
            }
            budget_left = Some(left - maker_price * quantity);
        }

        result.fills.push(MakerFill {
            order_id: maker_order_id,
            price: maker_price,
            quantity,
            maker_done: quantity == maker_qty,
        });
        result.remaining_quantity -= quantity;

        book.fill_best(maker_side, quantity);
        book.set_last_price(maker_price);
    }

    order.remaining_quantity = result.remaining_quantity;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ParticipantId;

    fn limit(owner: u64, seq: u64, side: OrderSide, price: f64, quantity: u64) -> Order {
        Order::limit(
            OrderId::new(ParticipantId(owner), seq),
            side,
            Price::from_float(price),
            Quantity(quantity),
            0,
        )
    }

    fn market(owner: u64, seq: u64, side: OrderSide, quantity: u64) -> Order {
        Order::market(OrderId::new(ParticipantId(owner), seq), side, Quantity(quantity), 0)
    }

    #[test]
    fn no_match_on_empty_book() {
        let mut book = OrderBook::new();
        let mut order = limit(1, 1, OrderSide::Buy, 1.0, 50);
        let result = match_order(&mut book, &mut order);
        assert!(!result.has_fills());
        assert_eq!(result.remaining_quantity, 50);
    }

    #[test]
    fn exact_match_clears_both() {
        let mut book = OrderBook::new();
        book.add_order(limit(1, 1, OrderSide::Sell, 1.0, 50)).unwrap();

        let mut buy = limit(2, 2, OrderSide::Buy, 1.0, 50);
        let result = match_order(&mut book, &mut buy);

        assert_eq!(result.fills.len(), 1);
        assert_eq!(result.fills[0].price, Price::from_float(1.0));
        assert_eq!(result.fills[0].quantity, 50);
        assert!(result.fills[0].maker_done);
        assert_eq!(result.remaining_quantity, 0);
        assert!(book.is_empty());
    }

    #[test]
    fn taker_partial_leaves_remainder() {
        let mut book = OrderBook::new();
        book.add_order(limit(1, 1, OrderSide::Sell, 1.0, 30)).unwrap();

        let mut buy = limit(2, 2, OrderSide::Buy, 1.0, 50);
        let result = match_order(&mut book, &mut buy);

        assert_eq!(result.filled_quantity(), 30);
        assert_eq!(result.remaining_quantity, 20);
        assert_eq!(buy.remaining_quantity, 20);
        assert!(book.is_empty());
    }

    #[test]
    fn maker_partial_keeps_residual_in_book() {
        let mut book = OrderBook::new();
        book.add_order(limit(1, 1, OrderSide::Sell, 1.0, 100)).unwrap();

        let mut buy = limit(2, 2, OrderSide::Buy, 1.0, 40);
        let result = match_order(&mut book, &mut buy);

        assert!(!result.fills[0].maker_done);
        let (_, remaining) = book.peek_best_ask_order().unwrap();
        assert_eq!(remaining, 60);
    }

    #[test]
    fn sweeps_levels_best_first_respecting_limit() {
        let mut book = OrderBook::new();
        book.add_order(limit(1, 1, OrderSide::Sell, 1.01, 30)).unwrap();
        book.add_order(limit(2, 2, OrderSide::Sell, 1.00, 20)).unwrap();
        book.add_order(limit(3, 3, OrderSide::Sell, 1.05, 50)).unwrap();

        let mut buy = limit(4, 4, OrderSide::Buy, 1.02, 100);
        let result = match_order(&mut book, &mut buy);

        assert_eq!(result.fills.len(), 2);
        assert_eq!(result.fills[0].price, Price::from_float(1.00));
        assert_eq!(result.fills[1].price, Price::from_float(1.01));
        // The 1.05 level is beyond the limit.
        assert_eq!(result.remaining_quantity, 50);
        assert_eq!(book.best_ask_price(), Some(Price::from_float(1.05)));
    }

    #[test]
    fn market_order_sweeps_everything() {
        let mut book = OrderBook::new();
        book.add_order(limit(1, 1, OrderSide::Buy, 1.00, 30)).unwrap();
        book.add_order(limit(2, 2, OrderSide::Buy, 0.95, 30)).unwrap();

        let mut sell = market(3, 3, OrderSide::Sell, 40);
        let result = match_order(&mut book, &mut sell);

        assert_eq!(result.fills.len(), 2);
        assert_eq!(result.fills[0].price, Price::from_float(1.00));
        assert_eq!(result.fills[1].price, Price::from_float(0.95));
        assert_eq!(result.fills[1].quantity, 10);
        assert_eq!(result.remaining_quantity, 0);
    }

    #[test]
    fn market_order_against_empty_side_is_all_leftover() {
        let mut book = OrderBook::new();
        let mut buy = market(1, 1, OrderSide::Buy, 25);
        let result = match_order(&mut book, &mut buy);
        assert!(!result.has_fills());
        assert_eq!(result.remaining_quantity, 25);
    }

    #[test]
    fn last_price_tracks_execution() {
        let mut book = OrderBook::new();
        book.add_order(limit(1, 1, OrderSide::Sell, 1.0, 50)).unwrap();
        let mut buy = limit(2, 2, OrderSide::Buy, 1.0, 25);
        match_order(&mut book, &mut buy);
        assert_eq!(book.last_price(), Some(Price::from_float(1.0)));
    }

    #[test]
    fn budget_caps_market_buy() {
        let mut book = OrderBook::new();
        book.add_order(limit(1, 1, OrderSide::Sell, 1.00, 30)).unwrap();
        book.add_order(limit(2, 2, OrderSide::Sell, 2.00, 30)).unwrap();

        let mut buy = market(3, 3, OrderSide::Buy, 60);
        // Budget covers 30 @ $1.00 plus 5 @ $2.00.
        let result = match_order_budgeted(&mut book, &mut buy, Some(Cash::from_float(40.0)));
        assert_eq!(result.filled_quantity(), 35);
        assert_eq!(result.remaining_quantity, 25);
        // The partially consumed $2.00 level keeps its residual.
        let (_, remaining) = book.peek_best_ask_order().unwrap();
        assert_eq!(remaining, 25);
    }

    #[test]
    fn time_priority_across_same_price() {
        let mut book = OrderBook::new();
        book.add_order(limit(1, 1, OrderSide::Sell, 1.0, 30)).unwrap();
        book.add_order(limit(2, 2, OrderSide::Sell, 1.0, 30)).unwrap();

        let mut buy = limit(3, 3, OrderSide::Buy, 1.0, 40);
        let result = match_order(&mut book, &mut buy);

        assert_eq!(result.fills[0].order_id.owner, ParticipantId(1));
        assert_eq!(result.fills[0].quantity, 30);
        assert_eq!(result.fills[1].order_id.owner, ParticipantId(2));
        assert_eq!(result.fills[1].quantity, 10);
    }
}
