//! Seeded event-stream generator shared by the invariant tests

use common::{NewOrderRequest, OrderId, OrderType, Px, Qty, Side, Symbol, TimeInForce};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Deterministic random order generator: 70% limit, 15% market, 15% IOC,
/// prices around 10 000 ticks, quantities in round lots of 100.
pub struct RandomOrderGenerator {
    rng: StdRng,
    symbol: Symbol,
}

impl RandomOrderGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            symbol: Symbol::new("TEST"),
        }
    }

    pub fn generate(&mut self, id: OrderId) -> NewOrderRequest {
        let side = if self.rng.gen_range(0..2) == 0 {
            Side::Buy
        } else {
            Side::Sell
        };
        let mut price = Px::from_ticks(self.rng.gen_range(9_900..=10_100));
        let mut quantity = Qty::new(self.rng.gen_range(100..=1_000) / 100 * 100);
        if quantity.is_zero() {
            quantity = Qty::new(100);
        }

        let (kind, tif) = match self.rng.gen::<f64>() {
            roll if roll < 0.70 => (OrderType::Limit, TimeInForce::Gtc),
            roll if roll < 0.85 => {
                price = Px::MARKET;
                (OrderType::Market, TimeInForce::Ioc)
            }
            _ => (OrderType::Ioc, TimeInForce::Ioc),
        };

        NewOrderRequest {
            id,
            side,
            kind,
            tif,
            price,
            quantity,
            symbol: self.symbol,
        }
    }

    #[allow(dead_code)] // scenario tests only drive `generate`
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}
