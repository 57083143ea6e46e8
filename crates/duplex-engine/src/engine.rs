//! The matching engine: registry, request queue, and single worker.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use duplex_core::error::{Error, Result};
use duplex_core::types::{Order, OrderId, Price, Quantity, Trade};
use duplex_lob::{BookSnapshot, LevelInfo, OrderBook};
use duplex_queue::spsc;

use crate::request::OrderRequest;
use crate::stats::{EngineStats, EngineStatsSnapshot};

/// Callback invoked once per generated trade, from the worker thread.
pub type TradeCallback = Box<dyn Fn(&Trade) + Send + 'static>;

/// Callback invoked exactly once per submitted order, from the worker
/// thread; `accepted` is false only when the symbol is unregistered.
pub type OrderCallback = Box<dyn Fn(&Order, bool) + Send + 'static>;

#[derive(Default)]
struct Callbacks {
    trade: Mutex<Option<TradeCallback>>,
    order: Mutex<Option<OrderCallback>>,
}

impl Callbacks {
    fn on_order(&self, order: &Order, accepted: bool) {
        if let Some(cb) = self.order.lock().as_ref() {
            cb(order, accepted);
        }
    }

    fn on_trade(&self, trade: &Trade) {
        if let Some(cb) = self.trade.lock().as_ref() {
            cb(trade);
        }
    }
}

/// Worker sleep when the request queue is empty.
const IDLE_SLEEP: Duration = Duration::from_micros(10);

/// The matching engine coordinator.
///
/// All book mutations flow through one worker thread, so the per-symbol
/// [`OrderBook`]s need no internal locking. The engine is shared behind an
/// `Arc`; every public operation takes `&self`.
///
/// Callbacks run synchronously inside request processing on the worker
/// thread. They must not re-enter the engine with blocking calls; they may
/// enqueue further requests.
pub struct MatchingEngine {
    books: Arc<Mutex<HashMap<u64, OrderBook>>>,
    producer: Mutex<spsc::Producer<OrderRequest>>,
    /// Holds the consumer while the engine is stopped; the worker owns it
    /// while running and hands it back through its join value.
    consumer: Mutex<Option<spsc::Consumer<OrderRequest>>>,
    callbacks: Arc<Callbacks>,
    stats: Arc<EngineStats>,
    running: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<spsc::Consumer<OrderRequest>>>>,
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchingEngine {
    /// Create a stopped engine with no registered symbols
    #[must_use]
    pub fn new() -> Self {
        let (producer, consumer) = spsc::channel();
        Self {
            books: Arc::new(Mutex::new(HashMap::new())),
            producer: Mutex::new(producer),
            consumer: Mutex::new(Some(consumer)),
            callbacks: Arc::new(Callbacks::default()),
            stats: Arc::new(EngineStats::default()),
            running: Arc::new(AtomicBool::new(false)),
            worker: Mutex::new(None),
        }
    }

    /// Register a symbol, creating its empty book.
    ///
    /// Returns false when the symbol is already registered. Safe to call
    /// while the engine runs; the registry is locked per request.
    pub fn register_symbol(&self, symbol_id: u64) -> bool {
        let mut books = self.books.lock();
        if books.contains_key(&symbol_id) {
            return false;
        }
        books.insert(symbol_id, OrderBook::new(symbol_id));
        true
    }

    /// Unregister a symbol, clearing and dropping its book.
    ///
    /// Returns false when the symbol is unknown.
    pub fn unregister_symbol(&self, symbol_id: u64) -> bool {
        let mut books = self.books.lock();
        match books.remove(&symbol_id) {
            Some(mut book) => {
                book.clear();
                true
            }
            None => false,
        }
    }

    /// Enqueue a new order for matching.
    ///
    /// # Errors
    ///
    /// [`Error::NotRunning`] when the engine is stopped.
    pub fn submit_order(&self, order: Order) -> Result<()> {
        self.enqueue(OrderRequest::New(order))
    }

    /// Enqueue a cancel request.
    ///
    /// # Errors
    ///
    /// [`Error::NotRunning`] when the engine is stopped.
    pub fn cancel_order(&self, symbol_id: u64, order_id: OrderId) -> Result<()> {
        self.enqueue(OrderRequest::Cancel {
            symbol_id,
            order_id,
        })
    }

    /// Enqueue a modify request (price and quantity replacement).
    ///
    /// # Errors
    ///
    /// [`Error::NotRunning`] when the engine is stopped.
    pub fn modify_order(
        &self,
        symbol_id: u64,
        order_id: OrderId,
        new_price: Price,
        new_quantity: Quantity,
    ) -> Result<()> {
        self.enqueue(OrderRequest::Modify {
            symbol_id,
            order_id,
            new_price,
            new_quantity,
        })
    }

    fn enqueue(&self, request: OrderRequest) -> Result<()> {
        if !self.is_running() {
            return Err(Error::NotRunning);
        }
        self.producer.lock().push(request);
        Ok(())
    }

    /// Set the trade callback. Replaces any previous callback.
    pub fn set_trade_callback(&self, callback: TradeCallback) {
        *self.callbacks.trade.lock() = Some(callback);
    }

    /// Set the order callback. Replaces any previous callback.
    pub fn set_order_callback(&self, callback: OrderCallback) {
        *self.callbacks.order.lock() = Some(callback);
    }

    /// Spawn the worker thread.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyRunning`] when the engine is already started.
    pub fn start(&self) -> Result<()> {
        if self.running.swap(true, Ordering::AcqRel) {
            return Err(Error::AlreadyRunning);
        }

        let consumer = match self.consumer.lock().take() {
            Some(consumer) => consumer,
            None => {
                // A previous worker panicked and took the queue with it.
                let (producer, consumer) = spsc::channel();
                *self.producer.lock() = producer;
                consumer
            }
        };

        let worker = Worker {
            consumer,
            books: Arc::clone(&self.books),
            callbacks: Arc::clone(&self.callbacks),
            stats: Arc::clone(&self.stats),
            running: Arc::clone(&self.running),
        };
        let handle = thread::Builder::new()
            .name("duplex-engine".into())
            .spawn(move || worker.run())
            .map_err(|e| Error::Internal(format!("failed to spawn worker: {e}")))?;
        *self.worker.lock() = Some(handle);
        info!("matching engine started");
        Ok(())
    }

    /// Stop the engine: signal the worker, join it, and drain remaining
    /// requests. No request enqueued before `stop` is lost. Idempotent.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(handle) = self.worker.lock().take() {
            match handle.join() {
                Ok(consumer) => *self.consumer.lock() = Some(consumer),
                Err(_) => warn!("engine worker panicked during shutdown"),
            }
        }
        info!("matching engine stopped");
    }

    /// Check whether the worker is running
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Relaxed snapshot of the engine counters
    #[must_use]
    pub fn get_stats(&self) -> EngineStatsSnapshot {
        self.stats.snapshot()
    }

    /// Reset every engine counter to zero
    pub fn reset_stats(&self) {
        self.stats.reset();
    }

    /// Clear every registered book.
    ///
    /// Administrative operation intended for idle engines; concurrent
    /// requests observe either the pre- or post-clear book.
    pub fn clear_all_books(&self) {
        let mut books = self.books.lock();
        for book in books.values_mut() {
            book.clear();
        }
    }

    /// Top-of-book snapshot for a symbol, or `None` when unregistered
    #[must_use]
    pub fn book_snapshot(&self, symbol_id: u64) -> Option<BookSnapshot> {
        self.books.lock().get(&symbol_id).map(OrderBook::snapshot)
    }

    /// Top-N depth per side for a symbol, or `None` when unregistered
    #[must_use]
    pub fn book_depth(
        &self,
        symbol_id: u64,
        levels: usize,
    ) -> Option<(Vec<LevelInfo>, Vec<LevelInfo>)> {
        self.books.lock().get(&symbol_id).map(|b| b.depth(levels))
    }
}

impl Drop for MatchingEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The worker side of the engine: consumes requests until the running flag
/// drops, then drains the queue before exiting with the consumer handle.
struct Worker {
    consumer: spsc::Consumer<OrderRequest>,
    books: Arc<Mutex<HashMap<u64, OrderBook>>>,
    callbacks: Arc<Callbacks>,
    stats: Arc<EngineStats>,
    running: Arc<AtomicBool>,
}

impl Worker {
    fn run(mut self) -> spsc::Consumer<OrderRequest> {
        while self.running.load(Ordering::Acquire) {
            match self.consumer.pop() {
                Some(request) => self.process(request),
                None => thread::sleep(IDLE_SLEEP),
            }
        }

        // Drain everything enqueued before the stop signal.
        while let Some(request) = self.consumer.pop() {
            self.process(request);
        }
        self.consumer
    }

    fn process(&mut self, request: OrderRequest) {
        match request {
            OrderRequest::New(order) => self.process_new(order),
            OrderRequest::Cancel {
                symbol_id,
                order_id,
            } => self.process_cancel(symbol_id, order_id),
            OrderRequest::Modify {
                symbol_id,
                order_id,
                new_price,
                new_quantity,
            } => self.process_modify(symbol_id, order_id, new_price, new_quantity),
        }
    }

    fn process_new(&mut self, order: Order) {
        self.stats.total_orders.fetch_add(1, Ordering::Relaxed);

        let mut books = self.books.lock();
        let Some(book) = books.get_mut(&order.symbol_id) else {
            drop(books);
            self.stats.rejected_orders.fetch_add(1, Ordering::Relaxed);
            debug!(symbol_id = order.symbol_id, order_id = %order.id, "order rejected: symbol not registered");
            self.callbacks.on_order(&order, false);
            return;
        };

        let trades = book.add_order(order);
        drop(books);

        self.callbacks.on_order(&order, true);
        for trade in &trades {
            self.stats.total_trades.fetch_add(1, Ordering::Relaxed);
            self.stats
                .total_volume
                .fetch_add(trade.quantity.as_u64(), Ordering::Relaxed);
            self.callbacks.on_trade(trade);
        }
    }

    fn process_cancel(&mut self, symbol_id: u64, order_id: OrderId) {
        let mut books = self.books.lock();
        if let Some(book) = books.get_mut(&symbol_id) {
            if book.cancel_order(order_id) {
                self.stats.cancelled_orders.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn process_modify(
        &mut self,
        symbol_id: u64,
        order_id: OrderId,
        new_price: Price,
        new_quantity: Quantity,
    ) {
        let mut books = self.books.lock();
        let Some(book) = books.get_mut(&symbol_id) else {
            return;
        };
        let Some((_, trades)) = book.modify_order(order_id, new_price, new_quantity) else {
            return;
        };
        drop(books);

        self.stats.modified_orders.fetch_add(1, Ordering::Relaxed);
        for trade in &trades {
            self.stats.total_trades.fetch_add(1, Ordering::Relaxed);
            self.stats
                .total_volume
                .fetch_add(trade.quantity.as_u64(), Ordering::Relaxed);
            self.callbacks.on_trade(trade);
        }
    }
}
