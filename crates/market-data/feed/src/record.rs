//! Feed record: typed header plus a flat union-style payload
//!
//! Record types follow the NASDAQ ITCH convention of one-byte tags. The
//! payload is a flat struct carrying every field any type needs; unused
//! fields are zero. This keeps the wire frame fixed-size so dump files can
//! be replayed by reading fixed chunks.

use byteorder::{ByteOrder, LittleEndian};
use common::{OrderId, Px, Qty, SeqNum, Side, Symbol, Trade, Ts};
use matching::Order;
use thiserror::Error;

/// Encoded frame size: 64-byte-aligned, fixed within a release.
pub const RECORD_SIZE: usize = 192;

// Frame layout (little-endian):
//   0   type        48  side (u8)        88  aggressor_side (u8)
//   8   sequence    56  price            96  best_bid
//   16  timestamp   64  quantity         104 best_ask
//   24  symbol[16]  72  leaves_qty       112 bid_depth    128 bid_price
//   40  order_id    80  match_id         120 ask_depth    136 ask_price
//                                                         144 bid_size
//                                                         152 ask_size
const OFF_TYPE: usize = 0;
const OFF_SEQUENCE: usize = 8;
const OFF_TIMESTAMP: usize = 16;
const OFF_SYMBOL: usize = 24;
const OFF_ORDER_ID: usize = 40;
const OFF_SIDE: usize = 48;
const OFF_PRICE: usize = 56;
const OFF_QUANTITY: usize = 64;
const OFF_LEAVES: usize = 72;
const OFF_MATCH_ID: usize = 80;
const OFF_AGGRESSOR: usize = 88;
const OFF_BEST_BID: usize = 96;
const OFF_BEST_ASK: usize = 104;
const OFF_BID_DEPTH: usize = 112;
const OFF_ASK_DEPTH: usize = 120;
const OFF_BID_PRICE: usize = 128;
const OFF_ASK_PRICE: usize = 136;
const OFF_BID_SIZE: usize = 144;
const OFF_ASK_SIZE: usize = 152;

/// Record type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FeedRecordType {
    /// New resting order.
    AddOrder = b'A',
    /// Order executed against.
    ExecuteOrder = b'X',
    /// Order removed (cancel).
    DeleteOrder = b'D',
    /// Order replaced (amend).
    ReplaceOrder = b'U',
    /// Full book state.
    Snapshot = b'S',
    /// Execution report.
    Trade = b'T',
    /// BBO change.
    QuoteUpdate = b'Q',
    /// System event.
    SystemEvent = b'E',
}

impl FeedRecordType {
    fn from_byte(byte: u8) -> Result<Self, RecordError> {
        match byte {
            b'A' => Ok(Self::AddOrder),
            b'X' => Ok(Self::ExecuteOrder),
            b'D' => Ok(Self::DeleteOrder),
            b'U' => Ok(Self::ReplaceOrder),
            b'S' => Ok(Self::Snapshot),
            b'T' => Ok(Self::Trade),
            b'Q' => Ok(Self::QuoteUpdate),
            b'E' => Ok(Self::SystemEvent),
            other => Err(RecordError::InvalidType(other)),
        }
    }
}

/// Frame decode failure.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    /// Unknown type tag.
    #[error("unknown record type byte {0:#04x}")]
    InvalidType(u8),
    /// Side byte outside {0, 1}.
    #[error("invalid side byte {0:#04x}")]
    InvalidSide(u8),
}

fn side_from_byte(byte: u8) -> Result<Side, RecordError> {
    match byte {
        0 => Ok(Side::Buy),
        1 => Ok(Side::Sell),
        other => Err(RecordError::InvalidSide(other)),
    }
}

/// One feed record. Unused payload fields are zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedRecord {
    /// Record type.
    pub kind: FeedRecordType,
    /// Publisher-assigned sequence, monotonic from 1.
    pub sequence: SeqNum,
    /// Event timestamp.
    pub timestamp: Ts,
    /// Instrument.
    pub symbol: Symbol,
    /// Subject order (buy side for trades).
    pub order_id: OrderId,
    /// Subject order side.
    pub side: Side,
    /// Order or execution price.
    pub price: Px,
    /// Order or execution quantity.
    pub quantity: Qty,
    /// Remaining quantity, where relevant.
    pub leaves_qty: Qty,
    /// Counter-party order for trades.
    pub match_id: OrderId,
    /// Side that crossed the spread, for trades.
    pub aggressor_side: Side,
    /// Snapshot: best bid price.
    pub best_bid: Px,
    /// Snapshot: best ask price.
    pub best_ask: Px,
    /// Snapshot: total bid depth.
    pub bid_depth: Qty,
    /// Snapshot: total ask depth.
    pub ask_depth: Qty,
    /// Quote: bid price.
    pub bid_price: Px,
    /// Quote: ask price.
    pub ask_price: Px,
    /// Quote: bid size at best.
    pub bid_size: Qty,
    /// Quote: ask size at best.
    pub ask_size: Qty,
}

impl Default for FeedRecord {
    fn default() -> Self {
        Self {
            kind: FeedRecordType::SystemEvent,
            sequence: 0,
            timestamp: Ts::from_nanos(0),
            symbol: Symbol::new(""),
            order_id: 0,
            side: Side::Buy,
            price: Px::from_ticks(0),
            quantity: Qty::ZERO,
            leaves_qty: Qty::ZERO,
            match_id: 0,
            aggressor_side: Side::Buy,
            best_bid: Px::from_ticks(0),
            best_ask: Px::from_ticks(0),
            bid_depth: Qty::ZERO,
            ask_depth: Qty::ZERO,
            bid_price: Px::from_ticks(0),
            ask_price: Px::from_ticks(0),
            bid_size: Qty::ZERO,
            ask_size: Qty::ZERO,
        }
    }
}

impl FeedRecord {
    /// Add record: an order (or its remainder) entered the book. The
    /// quantity field carries the remaining size.
    #[must_use]
    pub fn make_add(sequence: SeqNum, order: &Order) -> Self {
        Self {
            kind: FeedRecordType::AddOrder,
            sequence,
            timestamp: order.last_update,
            symbol: order.symbol,
            order_id: order.id,
            side: order.side,
            price: order.price,
            quantity: order.leaves_qty,
            leaves_qty: order.leaves_qty,
            ..Self::default()
        }
    }

    /// Trade record. `order_id` is the buyer, `match_id` the seller.
    #[must_use]
    pub fn make_trade(sequence: SeqNum, trade: &Trade) -> Self {
        Self {
            kind: FeedRecordType::Trade,
            sequence,
            timestamp: trade.exec_time,
            symbol: trade.symbol,
            order_id: trade.buy_order_id,
            match_id: trade.sell_order_id,
            price: trade.price,
            quantity: trade.quantity,
            aggressor_side: trade.aggressor,
            ..Self::default()
        }
    }

    /// Delete record: an order left the book without a trade.
    #[must_use]
    pub fn make_delete(sequence: SeqNum, order: &Order) -> Self {
        Self {
            kind: FeedRecordType::DeleteOrder,
            sequence,
            timestamp: order.last_update,
            symbol: order.symbol,
            order_id: order.id,
            side: order.side,
            price: order.price,
            ..Self::default()
        }
    }

    /// Quote record carrying the BBO with sizes.
    #[must_use]
    pub fn make_quote(
        sequence: SeqNum,
        symbol: Symbol,
        bid_price: Px,
        bid_size: Qty,
        ask_price: Px,
        ask_size: Qty,
    ) -> Self {
        Self {
            kind: FeedRecordType::QuoteUpdate,
            sequence,
            timestamp: Ts::now(),
            symbol,
            bid_price,
            bid_size,
            ask_price,
            ask_size,
            ..Self::default()
        }
    }

    /// Snapshot record with BBO and full side depths.
    #[must_use]
    pub fn make_snapshot(
        sequence: SeqNum,
        symbol: Symbol,
        best_bid: Px,
        best_ask: Px,
        bid_depth: Qty,
        ask_depth: Qty,
    ) -> Self {
        Self {
            kind: FeedRecordType::Snapshot,
            sequence,
            timestamp: Ts::now(),
            symbol,
            best_bid,
            best_ask,
            bid_depth,
            ask_depth,
            ..Self::default()
        }
    }

    /// Encode into a fixed little-endian frame. Padding is zero.
    #[must_use]
    pub fn encode(&self) -> [u8; RECORD_SIZE] {
        let mut buf = [0u8; RECORD_SIZE];
        buf[OFF_TYPE] = self.kind as u8;
        LittleEndian::write_u64(&mut buf[OFF_SEQUENCE..OFF_SEQUENCE + 8], self.sequence);
        LittleEndian::write_u64(
            &mut buf[OFF_TIMESTAMP..OFF_TIMESTAMP + 8],
            self.timestamp.as_nanos(),
        );
        buf[OFF_SYMBOL..OFF_SYMBOL + Symbol::LEN].copy_from_slice(self.symbol.as_bytes());
        LittleEndian::write_u64(&mut buf[OFF_ORDER_ID..OFF_ORDER_ID + 8], self.order_id);
        buf[OFF_SIDE] = self.side as u8;
        LittleEndian::write_i64(&mut buf[OFF_PRICE..OFF_PRICE + 8], self.price.ticks());
        LittleEndian::write_u64(&mut buf[OFF_QUANTITY..OFF_QUANTITY + 8], self.quantity.raw());
        LittleEndian::write_u64(&mut buf[OFF_LEAVES..OFF_LEAVES + 8], self.leaves_qty.raw());
        LittleEndian::write_u64(&mut buf[OFF_MATCH_ID..OFF_MATCH_ID + 8], self.match_id);
        buf[OFF_AGGRESSOR] = self.aggressor_side as u8;
        LittleEndian::write_i64(&mut buf[OFF_BEST_BID..OFF_BEST_BID + 8], self.best_bid.ticks());
        LittleEndian::write_i64(&mut buf[OFF_BEST_ASK..OFF_BEST_ASK + 8], self.best_ask.ticks());
        LittleEndian::write_u64(
            &mut buf[OFF_BID_DEPTH..OFF_BID_DEPTH + 8],
            self.bid_depth.raw(),
        );
        LittleEndian::write_u64(
            &mut buf[OFF_ASK_DEPTH..OFF_ASK_DEPTH + 8],
            self.ask_depth.raw(),
        );
        LittleEndian::write_i64(
            &mut buf[OFF_BID_PRICE..OFF_BID_PRICE + 8],
            self.bid_price.ticks(),
        );
        LittleEndian::write_i64(
            &mut buf[OFF_ASK_PRICE..OFF_ASK_PRICE + 8],
            self.ask_price.ticks(),
        );
        LittleEndian::write_u64(&mut buf[OFF_BID_SIZE..OFF_BID_SIZE + 8], self.bid_size.raw());
        LittleEndian::write_u64(&mut buf[OFF_ASK_SIZE..OFF_ASK_SIZE + 8], self.ask_size.raw());
        buf
    }

    /// Decode a frame.
    pub fn decode(buf: &[u8; RECORD_SIZE]) -> Result<Self, RecordError> {
        let mut symbol = [0u8; Symbol::LEN];
        symbol.copy_from_slice(&buf[OFF_SYMBOL..OFF_SYMBOL + Symbol::LEN]);

        Ok(Self {
            kind: FeedRecordType::from_byte(buf[OFF_TYPE])?,
            sequence: LittleEndian::read_u64(&buf[OFF_SEQUENCE..OFF_SEQUENCE + 8]),
            timestamp: Ts::from_nanos(LittleEndian::read_u64(
                &buf[OFF_TIMESTAMP..OFF_TIMESTAMP + 8],
            )),
            symbol: Symbol::from_bytes(symbol),
            order_id: LittleEndian::read_u64(&buf[OFF_ORDER_ID..OFF_ORDER_ID + 8]),
            side: side_from_byte(buf[OFF_SIDE])?,
            price: Px::from_ticks(LittleEndian::read_i64(&buf[OFF_PRICE..OFF_PRICE + 8])),
            quantity: Qty::new(LittleEndian::read_u64(&buf[OFF_QUANTITY..OFF_QUANTITY + 8])),
            leaves_qty: Qty::new(LittleEndian::read_u64(&buf[OFF_LEAVES..OFF_LEAVES + 8])),
            match_id: LittleEndian::read_u64(&buf[OFF_MATCH_ID..OFF_MATCH_ID + 8]),
            aggressor_side: side_from_byte(buf[OFF_AGGRESSOR])?,
            best_bid: Px::from_ticks(LittleEndian::read_i64(
                &buf[OFF_BEST_BID..OFF_BEST_BID + 8],
            )),
            best_ask: Px::from_ticks(LittleEndian::read_i64(
                &buf[OFF_BEST_ASK..OFF_BEST_ASK + 8],
            )),
            bid_depth: Qty::new(LittleEndian::read_u64(
                &buf[OFF_BID_DEPTH..OFF_BID_DEPTH + 8],
            )),
            ask_depth: Qty::new(LittleEndian::read_u64(
                &buf[OFF_ASK_DEPTH..OFF_ASK_DEPTH + 8],
            )),
            bid_price: Px::from_ticks(LittleEndian::read_i64(
                &buf[OFF_BID_PRICE..OFF_BID_PRICE + 8],
            )),
            ask_price: Px::from_ticks(LittleEndian::read_i64(
                &buf[OFF_ASK_PRICE..OFF_ASK_PRICE + 8],
            )),
            bid_size: Qty::new(LittleEndian::read_u64(&buf[OFF_BID_SIZE..OFF_BID_SIZE + 8])),
            ask_size: Qty::new(LittleEndian::read_u64(&buf[OFF_ASK_SIZE..OFF_ASK_SIZE + 8])),
        })
    }
}
