//! The per-room simulator.
//!
//! A synchronous state machine driven from outside by two timers: the
//! market tick (nominally 200 ms) advances the price model and polls the
//! bots; the clock tick (1 s) advances game time, fires scheduled
//! intrinsic drifts, and detects the end of the game. The owning room task
//! serialises every call, so nothing here locks.

use agents::{Accounts, BotAction, BotContext, BotKind, Strategy, TradingParticipant};
use pricing::{PriceGenerator, PricePair, SeededPrng};
use sim_core::OrderBookWrapper;
use tracing::debug;
use types::{
    BookSnapshot, Cash, GameSettings, OpenOrder, OrderId, OrderSide, ParticipantId, Price,
    Quantity, Tick, Timestamp,
};

/// Bot participant ids start here; client ids stay below.
pub const BOT_ID_BASE: u64 = 1_000;

/// Shares each bot is seeded with so both book sides exist from the start.
pub const BOT_INITIAL_SHARES: u64 = 100;

/// Magnitude of a scheduled intrinsic drift.
const DRIFT_PCT: f64 = 0.05;

/// Minimum gap between scheduled drifts, and the end-of-game buffer (ms).
const DRIFT_SPACING_MS: u64 = 8_000;

/// Target number of drift segments per game.
const DRIFT_SEGMENTS: u64 = 10;

/// One spawned bot: its strategy plus the id its account lives under.
struct Bot {
    id: ParticipantId,
    strategy: Box<dyn Strategy>,
}

/// Output of one market tick.
#[derive(Debug, Clone, Copy)]
pub struct MarketTickOutput {
    /// New market price, present only when it changed this tick.
    pub price_changed: Option<Price>,
    /// This tick's rounded model prices (debug broadcast).
    pub pair: PricePair,
}

/// Output of one clock tick.
#[derive(Debug, Clone, Copy)]
pub struct ClockTickOutput {
    /// Wall-clock value carried by the CLOCK broadcast.
    pub clock: Timestamp,
    /// Milliseconds of game time left.
    pub time_left_ms: u64,
    /// True exactly once, on the tick that ends the game.
    pub ended: bool,
}

/// Result of a market-order submission, surfaced to the client path.
#[derive(Debug, Clone, Copy)]
pub struct MarketFillSummary {
    pub total_cost: Cash,
    pub total_quantity: Quantity,
    pub leftover: Quantity,
}

/// The simulation engine for one room.
pub struct Simulator {
    generator: PriceGenerator,
    book: OrderBookWrapper,
    accounts: Accounts,
    bots: Vec<Bot>,
    history: Vec<Price>,
    market_price: Price,
    tick: Tick,
    clock: Timestamp,
    total_time_ms: u64,
    game_duration_ms: u64,
    drift_times: Vec<u64>,
    paused: bool,
    ended: bool,
    last_seq: u64,
}

impl Simulator {
    /// Build a simulator from room settings. Bots are spawned and funded
    /// here; client accounts join through [`Simulator::add_client`].
    pub fn new(settings: &GameSettings) -> Self {
        let root = SeededPrng::new(settings.seed);
        let generator = PriceGenerator::new(
            settings.opening_price,
            settings.volatility_fraction(),
            root.fork(0),
        );
        let game_duration_ms = settings.game_duration_ms();

        let mut simulator = Self {
            generator,
            book: OrderBookWrapper::new(),
            accounts: Accounts::new(),
            bots: Vec::new(),
            history: Vec::new(),
            market_price: settings.opening_price,
            tick: 0,
            clock: 0,
            total_time_ms: 0,
            game_duration_ms,
            drift_times: drift_schedule(game_duration_ms),
            paused: true,
            ended: false,
            last_seq: 0,
        };
        simulator.spawn_bots(settings, &root);
        simulator
    }

    fn spawn_bots(&mut self, settings: &GameSettings, root: &SeededPrng) {
        let kinds: Vec<BotKind> = match &settings.bot_selection {
            Some(names) => {
                let selected: Vec<BotKind> =
                    names.iter().filter_map(|n| BotKind::from_name(n)).collect();
                if selected.is_empty() {
                    BotKind::all().to_vec()
                } else {
                    selected
                }
            }
            None => BotKind::all().to_vec(),
        };

        for i in 0..settings.bots as usize {
            let kind = kinds[i % kinds.len()];
            let id = ParticipantId(BOT_ID_BASE + i as u64);
            let name = format!("{}-{}", kind.name(), i + 1);
            let account = TradingParticipant::new(id, name, settings.starting_cash, true)
                .with_shares(Quantity(BOT_INITIAL_SHARES));
            self.accounts.register(account);
            self.book.register_participant(id);
            self.bots.push(Bot {
                id,
                strategy: kind.build(root.fork(100 + i as u64)),
            });
        }
    }

    /// Register a human participant with the book and accounts.
    pub fn add_client(&mut self, account: TradingParticipant) {
        self.book.register_participant(account.id());
        self.accounts.register(account);
    }

    // -------------------------------------------------------------------------
    // Tick loop
    // -------------------------------------------------------------------------

    /// One market tick: price model, then every bot in stable order.
    /// Returns `None` while paused or after the game ended.
    pub fn market_tick(&mut self, now: Timestamp) -> Option<MarketTickOutput> {
        if self.paused || self.ended {
            return None;
        }
        self.tick += 1;

        let pair = self.generator.tick();
        self.history = self.generator.history().collect();
        let snapshot = self.book.snapshot(now);

        for i in 0..self.bots.len() {
            let bot_id = self.bots[i].id;
            let own: Vec<OpenOrder> = self
                .book
                .client_book(bot_id)
                .map(|cb| cb.all_orders().copied().collect())
                .unwrap_or_default();

            let actions = {
                let Some(account) = self.accounts.get(bot_id) else {
                    continue;
                };
                let ctx = BotContext {
                    tick: self.tick,
                    now,
                    current_price: self.market_price,
                    intrinsic: self.generator.intrinsic_value(),
                    guide: self.generator.guide_price(),
                    history: &self.history,
                    snapshot: &snapshot,
                    own_orders: &own,
                    account,
                };
                self.bots[i].strategy.decide(&ctx)
            };

            for action in actions {
                // A failed action is this bot's problem alone; the loop
                // carries on with its remaining actions and the next bot.
                self.execute(bot_id, action, now);
            }
        }

        let price_changed = match self.book.last_trade_price() {
            Some(last) if last != self.market_price => {
                self.market_price = last;
                Some(last)
            }
            _ => None,
        };

        Some(MarketTickOutput { price_changed, pair })
    }

    /// One clock tick: advance game time, fire due drifts, detect the end.
    /// Returns `None` while paused or after the game ended.
    pub fn clock_tick(&mut self, now: Timestamp) -> Option<ClockTickOutput> {
        if self.paused || self.ended {
            return None;
        }
        self.clock = now;
        self.total_time_ms += 1_000;

        while let Some(&at) = self.drift_times.first() {
            if self.total_time_ms < at {
                break;
            }
            self.drift_times.remove(0);
            self.generator.drift_intrinsic_value(DRIFT_PCT);
            debug!(elapsed_ms = self.total_time_ms, "scheduled intrinsic drift");
        }

        let ended = self.total_time_ms >= self.game_duration_ms;
        if ended {
            self.ended = true;
            self.paused = true;
        }

        Some(ClockTickOutput {
            clock: self.clock,
            time_left_ms: self.game_duration_ms.saturating_sub(self.total_time_ms),
            ended,
        })
    }

    fn execute(&mut self, owner: ParticipantId, action: BotAction, now: Timestamp) -> bool {
        match action {
            BotAction::Limit { side, price, quantity } => {
                self.submit_limit(owner, side, price, quantity, now)
            }
            BotAction::Market { side, quantity } => {
                self.submit_market(owner, side, quantity, now).is_some()
            }
            BotAction::Cancel(order_id) => self.cancel_order(order_id),
        }
    }

    // -------------------------------------------------------------------------
    // Order paths (shared by bots and the client message handler)
    // -------------------------------------------------------------------------

    /// Place a limit order for any participant. Returns false when the
    /// accounting precondition fails or the book rejects the order; no
    /// error surfaces beyond that.
    pub fn submit_limit(
        &mut self,
        owner: ParticipantId,
        side: OrderSide,
        price: Price,
        quantity: Quantity,
        now: Timestamp,
    ) -> bool {
        if quantity.is_zero() || !price.is_positive() {
            return false;
        }
        let price = price.to_tick();
        let seq = self.next_seq(now);

        let Some(account) = self.accounts.get_mut(owner) else {
            return false;
        };
        match side {
            OrderSide::Buy => {
                if account.place_buy(price, quantity).is_err() {
                    return false;
                }
            }
            OrderSide::Sell => {
                if account.place_sell(quantity).is_err() {
                    return false;
                }
            }
        }

        match self.book.add_limit(owner, seq, side, price, quantity, now) {
            Ok(result) => {
                self.accounts.apply_fills(&result.fills);
                true
            }
            Err(err) => {
                debug!(%owner, %err, "limit order rejected; releasing lock");
                let account = self.accounts.get_mut(owner).expect("checked above");
                match side {
                    OrderSide::Buy => account.release_buy(price, quantity),
                    OrderSide::Sell => account.release_sell(quantity),
                }
                false
            }
        }
    }

    /// Place a market order. A buy locks cash at the current best ask and
    /// that lock caps what executes; the unused remainder unlocks before
    /// this returns. An empty opposite side leaves the participant
    /// untouched and reports the full quantity as leftover.
    pub fn submit_market(
        &mut self,
        owner: ParticipantId,
        side: OrderSide,
        quantity: Quantity,
        now: Timestamp,
    ) -> Option<MarketFillSummary> {
        if quantity.is_zero() {
            return None;
        }
        let seq = self.next_seq(now);

        let budget = match side {
            OrderSide::Buy => {
                let best_ask = self.book.best_ask()?;
                let account = self.accounts.get_mut(owner)?;
                Some(account.place_buy(best_ask, quantity).ok()?)
            }
            OrderSide::Sell => {
                let account = self.accounts.get_mut(owner)?;
                account.place_sell(quantity).ok()?;
                None
            }
        };

        match self.book.add_market(owner, seq, side, quantity, budget, now) {
            Ok(result) => {
                self.accounts.apply_fills(&result.fills);
                let account = self.accounts.get_mut(owner).expect("placed above");
                match side {
                    // Unlock whatever the budget did not spend.
                    OrderSide::Buy => {
                        if let Some(budget) = budget {
                            account.release_cash(budget - result.total_cost);
                        }
                    }
                    // Unfilled shares return to the held pool.
                    OrderSide::Sell => account.release_sell(result.leftover),
                }
                Some(MarketFillSummary {
                    total_cost: result.total_cost,
                    total_quantity: result.total_quantity,
                    leftover: result.leftover,
                })
            }
            Err(err) => {
                debug!(%owner, %err, "market order rejected; releasing lock");
                let account = self.accounts.get_mut(owner).expect("placed above");
                match side {
                    OrderSide::Buy => {
                        if let Some(budget) = budget {
                            account.release_cash(budget);
                        }
                    }
                    OrderSide::Sell => account.release_sell(quantity),
                }
                None
            }
        }
    }

    /// Cancel a live order and restore its locked balance. Idempotent.
    pub fn cancel_order(&mut self, order_id: OrderId) -> bool {
        match self.book.cancel(order_id) {
            Some(open) => {
                self.accounts.restore_cancelled(&open);
                true
            }
            None => false,
        }
    }

    /// Cancel everything a participant has open (used when dropping one).
    pub fn cancel_all_for(&mut self, owner: ParticipantId) {
        for open in self.book.cancel_all(owner) {
            self.accounts.restore_cancelled(&open);
        }
    }

    fn next_seq(&mut self, now: Timestamp) -> u64 {
        self.last_seq = (self.last_seq + 1).max(now);
        self.last_seq
    }

    // -------------------------------------------------------------------------
    // Control & accessors
    // -------------------------------------------------------------------------

    /// Rebase the clock at game start / unpause.
    pub fn start(&mut self, now: Timestamp) {
        self.clock = now;
        self.paused = false;
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn has_ended(&self) -> bool {
        self.ended
    }

    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn clock(&self) -> Timestamp {
        self.clock
    }

    pub fn time_left_ms(&self) -> u64 {
        self.game_duration_ms.saturating_sub(self.total_time_ms)
    }

    pub fn market_price(&self) -> Price {
        self.market_price
    }

    /// Current rounded model prices without advancing the model.
    pub fn current_pair(&self) -> PricePair {
        self.generator.current_pair()
    }

    pub fn snapshot(&self, now: Timestamp) -> BookSnapshot {
        self.book.snapshot(now)
    }

    pub fn book(&self) -> &OrderBookWrapper {
        &self.book
    }

    pub fn accounts(&self) -> &Accounts {
        &self.accounts
    }

    pub fn accounts_mut(&mut self) -> &mut Accounts {
        &mut self.accounts
    }

    pub fn generator(&self) -> &PriceGenerator {
        &self.generator
    }

    pub fn generator_mut(&mut self) -> &mut PriceGenerator {
        &mut self.generator
    }

    pub fn bot_count(&self) -> usize {
        self.bots.len()
    }

    /// Clear all bots and their open orders (room disposal).
    pub fn clear_bots(&mut self) {
        let ids: Vec<ParticipantId> = self.bots.iter().map(|b| b.id).collect();
        for id in ids {
            self.cancel_all_for(id);
        }
        self.bots.clear();
    }
}

/// Drift timestamps (elapsed ms): the game split into roughly
/// [`DRIFT_SEGMENTS`] segments at least [`DRIFT_SPACING_MS`] apart,
/// stopping one buffer before the end.
fn drift_schedule(duration_ms: u64) -> Vec<u64> {
    let segment = (duration_ms / DRIFT_SEGMENTS).max(DRIFT_SPACING_MS);
    let cutoff = duration_ms.saturating_sub(DRIFT_SPACING_MS);
    (1..)
        .map(|i| i * segment)
        .take_while(|t| *t <= cutoff)
        .collect()
}
