//! FIFO queue of resting orders at a single price.

use std::collections::VecDeque;

use duplex_core::types::{Order, OrderId, Price, Quantity};

/// A price level: the FIFO queue of orders resting at one price.
///
/// Maintains the invariant `total_volume == sum of remaining quantities` of
/// the queued orders; a level exists only while at least one order rests at
/// its price.
#[derive(Debug, Clone)]
pub struct PriceLevel {
    price: Price,
    orders: VecDeque<Order>,
    total_volume: u64,
}

impl PriceLevel {
    /// Create an empty level at the given price
    #[must_use]
    pub fn new(price: Price) -> Self {
        Self {
            price,
            orders: VecDeque::new(),
            total_volume: 0,
        }
    }

    /// The price of this level
    #[inline]
    #[must_use]
    pub const fn price(&self) -> Price {
        self.price
    }

    /// Total remaining quantity across queued orders
    #[inline]
    #[must_use]
    pub const fn total_volume(&self) -> u64 {
        self.total_volume
    }

    /// Number of orders queued at this level
    #[inline]
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Check whether the level has no orders
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Append an order to the tail of the queue.
    ///
    /// The order's price must equal the level price.
    pub fn add(&mut self, order: Order) {
        debug_assert_eq!(order.price, self.price);
        self.total_volume += order.remaining_quantity().as_u64();
        self.orders.push_back(order);
    }

    /// The oldest (highest-priority) order, without removing it
    #[must_use]
    pub fn peek_front(&self) -> Option<&Order> {
        self.orders.front()
    }

    /// Mutable access to the oldest order, for in-place fills
    pub fn front_mut(&mut self) -> Option<&mut Order> {
        self.orders.front_mut()
    }

    /// Remove and return the oldest order, decrementing the volume by its
    /// remaining quantity.
    pub fn pop_front(&mut self) -> Option<Order> {
        let order = self.orders.pop_front()?;
        self.total_volume -= order.remaining_quantity().as_u64();
        Some(order)
    }

    /// Account for a partial fill of the front order.
    ///
    /// Only the aggregate moves; the front order itself is mutated in place
    /// by the caller via [`front_mut`](Self::front_mut).
    pub fn partial_fill(&mut self, quantity: Quantity) {
        debug_assert!(self.total_volume >= quantity.as_u64());
        self.total_volume -= quantity.as_u64();
    }

    /// Remove an order by id from anywhere in the queue.
    ///
    /// Linear in the queue length; cancels are rare relative to matches and
    /// the book's index narrows the scan to this one level.
    pub fn remove(&mut self, order_id: OrderId) -> Option<Order> {
        let pos = self.orders.iter().position(|o| o.id == order_id)?;
        let order = self.orders.remove(pos)?;
        self.total_volume -= order.remaining_quantity().as_u64();
        Some(order)
    }

    /// Iterate the queued orders in FIFO order
    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter()
    }
}
