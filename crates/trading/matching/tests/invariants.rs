//! Property and fuzz tests for the book invariants
//!
//! Random legal event streams drive the book; the no-crossed and FIFO
//! invariants are checked after every single event, and the accounting
//! invariants (conservation, per-order bounds, index consistency) at the
//! end. Deterministic seeds make failures reproducible.

mod support;

use common::{AmendRequest, NewOrderRequest, OrderId, OrderStatus, OrderType, Px, Qty, Side,
    Symbol, TimeInForce, Trade};
use matching::{BookEvent, OrderBook, OrderHandle};
use proptest::prelude::*;
use rand::Rng;
use std::cell::RefCell;
use std::rc::Rc;
use support::RandomOrderGenerator;

fn test_book() -> OrderBook {
    OrderBook::with_pool_capacity(Symbol::new("TEST"), 1 << 12)
}

fn collect_trades(book: &mut OrderBook) -> Rc<RefCell<Vec<Trade>>> {
    let trades = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&trades);
    book.subscribe(Box::new(move |event| {
        if let BookEvent::Trade { trade, .. } = event {
            sink.borrow_mut().push(**trade);
        }
    }));
    trades
}

#[test]
fn p1_p2_invariants_hold_after_every_event() {
    let mut book = test_book();
    let mut generator = RandomOrderGenerator::new(12_345);

    for id in 1..=10_000u64 {
        let req = generator.generate(id);
        book.submit(&req);

        assert!(book.check_no_crossed_book(), "book crossed after order {id}");
        assert!(book.check_fifo_invariant(), "FIFO broken after order {id}");
    }
}

#[test]
fn p3_determinism_identical_streams_match() {
    fn run(seed: u64) -> (Vec<Trade>, u32, u64) {
        let mut book = test_book();
        let trades = collect_trades(&mut book);
        let mut generator = RandomOrderGenerator::new(seed);
        for id in 1..=10_000u64 {
            book.submit(&generator.generate(id));
        }
        let collected = trades.borrow().clone();
        (collected, book.checksum(), book.sequence())
    }

    let (trades_a, checksum_a, seq_a) = run(999);
    let (trades_b, checksum_b, seq_b) = run(999);

    assert!(!trades_a.is_empty(), "stream must actually trade");
    assert_eq!(trades_a.len(), trades_b.len());
    for (a, b) in trades_a.iter().zip(trades_b.iter()) {
        assert_eq!(a.price, b.price);
        assert_eq!(a.quantity, b.quantity);
        assert_eq!(a.buy_order_id, b.buy_order_id);
        assert_eq!(a.sell_order_id, b.sell_order_id);
        assert_eq!(a.sequence, b.sequence);
    }
    assert_eq!(checksum_a, checksum_b, "post-state diverged");
    assert_eq!(seq_a, seq_b);
}

#[test]
fn p4_p5_conservation_and_per_order_bounds() {
    let mut book = test_book();
    let trades = collect_trades(&mut book);
    let mut generator = RandomOrderGenerator::new(777);

    let mut handles: Vec<(OrderId, OrderHandle)> = Vec::new();
    for id in 1..=20_000u64 {
        let req = generator.generate(id);
        if let Some(handle) = book.submit(&req) {
            handles.push((id, handle));
        }
    }

    let trade_volume: u64 = trades.borrow().iter().map(|t| t.quantity.raw()).sum();

    let mut total_filled = 0u64;
    for &(id, handle) in &handles {
        let order = book.order(handle);
        assert!(
            order.filled_qty.raw() + order.leaves_qty.raw() <= order.quantity.raw(),
            "order {id} overfilled"
        );
        if order.status == OrderStatus::Cancelled {
            assert!(order.leaves_qty.is_zero(), "cancelled order {id} has leaves");
            assert!(book.find(id).is_none(), "cancelled order {id} still indexed");
        }
        assert_eq!(
            book.find(id).is_some(),
            order.is_active(),
            "index inconsistent for order {id}"
        );
        total_filled += order.filled_qty.raw();
    }

    assert_eq!(
        total_filled,
        2 * trade_volume,
        "conservation: filled quantity must be twice traded quantity"
    );
    assert_eq!(book.total_volume(), trade_volume);
    assert_eq!(book.trade_count() as usize, trades.borrow().len());
}

#[test]
fn p6_cancel_is_idempotent_under_fuzz() {
    let mut book = test_book();
    let mut generator = RandomOrderGenerator::new(31_337);

    let mut cancelled: Vec<OrderId> = Vec::new();
    let mut active: Vec<OrderId> = Vec::new();

    for id in 1..=5_000u64 {
        let req = generator.generate(id);
        book.submit(&req);
        if book.find(id).is_some() {
            active.push(id);
        }

        let roll = generator.rng().gen_range(0..10);
        if roll < 3 && !active.is_empty() {
            let idx = generator.rng().gen_range(0..active.len());
            let victim = active.swap_remove(idx);
            if book.cancel(victim) {
                cancelled.push(victim);
            }
        }
    }

    for id in cancelled {
        assert!(!book.cancel(id), "second cancel of {id} must fail");
    }
}

#[test]
fn p8_infeasible_fok_never_changes_state() {
    let mut book = test_book();
    let mut generator = RandomOrderGenerator::new(4_242);

    // Build a random resting book from limit orders only.
    let mut id = 0u64;
    for _ in 0..2_000 {
        id += 1;
        let mut req = generator.generate(id);
        req.kind = OrderType::Limit;
        req.tif = TimeInForce::Gtc;
        if req.price.is_market() {
            req.price = Px::from_ticks(10_000);
        }
        book.submit(&req);
    }

    let total_depth = book.bid_depth(0).raw() + book.ask_depth(0).raw();
    let trades_before = book.trade_count();
    let checksum_before = book.checksum();

    // More quantity than the whole book holds: infeasible on either side.
    for side in [Side::Buy, Side::Sell] {
        id += 1;
        let handle = book
            .submit(&NewOrderRequest {
                id,
                side,
                kind: OrderType::Fok,
                tif: TimeInForce::Fok,
                price: Px::from_ticks(if side == Side::Buy { 20_000 } else { 1 }),
                quantity: Qty::new(total_depth + 100),
                symbol: Symbol::new("TEST"),
            })
            .expect("submission accepted");
        assert_eq!(book.order(handle).status, OrderStatus::Cancelled);
    }

    assert_eq!(book.trade_count(), trades_before);
    assert_eq!(book.checksum(), checksum_before);
}

#[test]
fn fuzz_cancels_and_amends_preserve_invariants() {
    let mut book = test_book();
    let mut generator = RandomOrderGenerator::new(54_321);

    let mut next_id = 1u64;
    let mut active: Vec<OrderId> = Vec::new();

    for step in 0..50_000u32 {
        let action = generator.rng().gen_range(0..10);

        if action < 7 {
            let req = generator.generate(next_id);
            let id = next_id;
            next_id += 1;
            book.submit(&req);
            if book.find(id).is_some() {
                active.push(id);
            }
        } else if action < 9 {
            if !active.is_empty() {
                let idx = generator.rng().gen_range(0..active.len());
                let id = active.swap_remove(idx);
                book.cancel(id);
            }
        } else if !active.is_empty() {
            let idx = generator.rng().gen_range(0..active.len());
            let id = active[idx];
            let new_quantity = Qty::new(generator.rng().gen_range(1..=10) * 100);
            book.amend(&AmendRequest {
                order_id: id,
                new_price: Px::from_ticks(0),
                new_quantity,
                symbol: Symbol::new("TEST"),
            });
            if book.find(id).is_none() {
                active.swap_remove(idx);
            }
        }

        assert!(book.check_no_crossed_book(), "book crossed at step {step}");
        if step % 100 == 0 {
            assert!(book.check_fifo_invariant(), "FIFO broken at step {step}");
        }
    }

    assert!(book.check_fifo_invariant());
}

proptest! {
    #[test]
    fn prop_single_bid_sets_bbo(price in 1_000i64..100_000, qty in 1u64..1_000_000) {
        let mut book = test_book();
        book.submit(&NewOrderRequest {
            id: 1,
            side: Side::Buy,
            kind: OrderType::Limit,
            tif: TimeInForce::Gtc,
            price: Px::from_ticks(price),
            quantity: Qty::new(qty),
            symbol: Symbol::new("TEST"),
        });
        prop_assert_eq!(book.best_bid(), Some(Px::from_ticks(price)));
        prop_assert_eq!(book.best_ask(), None);
        prop_assert_eq!(book.bid_depth(0), Qty::new(qty));
    }

    #[test]
    fn prop_spread_positive_when_uncrossed(
        bid in 1_000i64..50_000,
        gap in 1i64..1_000,
        bid_qty in 1u64..10_000,
        ask_qty in 1u64..10_000,
    ) {
        let mut book = test_book();
        book.submit(&NewOrderRequest {
            id: 1,
            side: Side::Buy,
            kind: OrderType::Limit,
            tif: TimeInForce::Gtc,
            price: Px::from_ticks(bid),
            quantity: Qty::new(bid_qty),
            symbol: Symbol::new("TEST"),
        });
        book.submit(&NewOrderRequest {
            id: 2,
            side: Side::Sell,
            kind: OrderType::Limit,
            tif: TimeInForce::Gtc,
            price: Px::from_ticks(bid + gap),
            quantity: Qty::new(ask_qty),
            symbol: Symbol::new("TEST"),
        });
        prop_assert_eq!(book.spread(), Some(gap));
        let mid = book.midprice().unwrap();
        prop_assert!(mid.ticks() >= bid && mid.ticks() <= bid + gap);
        prop_assert!(book.check_no_crossed_book());
    }

    #[test]
    fn prop_best_bid_is_max_of_inserted(prices in prop::collection::vec(1_000i64..100_000, 1..20)) {
        let mut book = test_book();
        for (i, &price) in prices.iter().enumerate() {
            book.submit(&NewOrderRequest {
                id: i as u64 + 1,
                side: Side::Buy,
                kind: OrderType::Limit,
                tif: TimeInForce::Gtc,
                price: Px::from_ticks(price),
                quantity: Qty::new(100),
                symbol: Symbol::new("TEST"),
            });
        }
        let max = prices.iter().copied().max().unwrap();
        prop_assert_eq!(book.best_bid(), Some(Px::from_ticks(max)));
    }

    #[test]
    fn prop_same_price_orders_aggregate(quantities in prop::collection::vec(1u64..10_000, 1..10)) {
        let mut book = test_book();
        for (i, &qty) in quantities.iter().enumerate() {
            book.submit(&NewOrderRequest {
                id: i as u64 + 1,
                side: Side::Sell,
                kind: OrderType::Limit,
                tif: TimeInForce::Gtc,
                price: Px::from_ticks(10_000),
                quantity: Qty::new(qty),
                symbol: Symbol::new("TEST"),
            });
        }
        let levels = book.ask_levels(1);
        prop_assert_eq!(levels.len(), 1);
        prop_assert_eq!(levels[0].quantity, Qty::new(quantities.iter().sum()));
        prop_assert_eq!(levels[0].order_count as usize, quantities.len());
        prop_assert!(book.check_fifo_invariant());
    }

    #[test]
    fn prop_cancel_unknown_id_fails(id in 1u64..1_000_000) {
        let mut book = test_book();
        prop_assert!(!book.cancel(id));
    }
}
