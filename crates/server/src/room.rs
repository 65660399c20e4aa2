//! Room orchestration.
//!
//! A room owns its simulator, factories, and clients, and is mutated only
//! from its own task; every method here is synchronous. Outbound traffic
//! goes through each client's unbounded queue, so nothing in the room ever
//! waits on a socket.

use pricing::{SeededPrng, DEFAULT_SHOCK_TICKS};
use serde_json::{json, Value};
use simulation::Simulator;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

use agents::TradingParticipant;
use news::{MarketEffect, NewsFactory, NewsPublication};
use powers::{ActivePower, PowerEffect, PowerFactory, PowerSpec, PowerState, Selected};
use types::{
    Cash, OrderSide, ParticipantId, Price, Quantity, RoomId, SettingsPatch, Timestamp,
};

use crate::protocol::{
    out, ClientMessage, NotificationLevel, ShockTarget, StockOrderType, StockSide,
};

/// How long a disconnected client's state is retained (ms).
pub const RECONNECT_GRACE_MS: u64 = 60_000;

/// A connected (or recently disconnected) human participant.
struct Client {
    id: ParticipantId,
    username: String,
    spectator: bool,
    tx: Option<UnboundedSender<Value>>,
    disconnected_at: Option<Timestamp>,
}

impl Client {
    fn is_connected(&self) -> bool {
        self.tx.is_some()
    }
}

/// One game room.
pub struct Room {
    room_id: RoomId,
    settings: types::GameSettings,
    clients: Vec<Client>,
    admin: Option<ParticipantId>,
    simulator: Option<Simulator>,
    news: Option<NewsFactory>,
    powers: Option<PowerFactory>,
    rng: SeededPrng,
    started: bool,
    ended: bool,
    disposed: bool,
    next_client_id: u64,
}

impl Room {
    pub fn new(room_id: RoomId) -> Self {
        let settings = types::GameSettings::default();
        let mut room = Self {
            room_id,
            rng: SeededPrng::new(settings.seed).fork(3),
            settings,
            clients: Vec::new(),
            admin: None,
            simulator: None,
            news: None,
            powers: None,
            started: false,
            ended: false,
            disposed: false,
            next_client_id: 1,
        };
        room.setup();
        room
    }

    /// (Re)construct the simulator and factories from the current
    /// settings, re-registering every human participant.
    fn setup(&mut self) {
        let mut simulator = Simulator::new(&self.settings);
        for client in self.clients.iter().filter(|c| !c.spectator) {
            simulator.add_client(TradingParticipant::new(
                client.id,
                client.username.clone(),
                self.settings.starting_cash,
                false,
            ));
        }
        let root = SeededPrng::new(self.settings.seed);
        let mut powers = PowerFactory::new(root.fork(2));
        powers.plan_briefcases(0, self.settings.game_duration_ms());

        self.simulator = Some(simulator);
        self.news = Some(NewsFactory::new(self.settings.enable_random_news, root.fork(1)));
        self.powers = Some(powers);
        self.rng = root.fork(3);
    }

    // -------------------------------------------------------------------------
    // Outbound plumbing
    // -------------------------------------------------------------------------

    fn send(&self, id: ParticipantId, message: Value) {
        if let Some(tx) = self
            .clients
            .iter()
            .find(|c| c.id == id)
            .and_then(|c| c.tx.as_ref())
        {
            let _ = tx.send(message);
        }
    }

    fn broadcast(&self, message: Value) {
        for client in self.clients.iter().filter(|c| c.is_connected()) {
            if let Some(tx) = client.tx.as_ref() {
                let _ = tx.send(message.clone());
            }
        }
    }

    fn clients_json(&self) -> Value {
        self.clients
            .iter()
            .filter(|c| !c.spectator)
            .map(|c| {
                json!({
                    "id": c.id.0,
                    "username": c.username,
                    "admin": self.admin == Some(c.id),
                })
            })
            .collect()
    }

    fn room_state(&self) -> Value {
        let (paused, clock, price) = match self.simulator.as_ref() {
            Some(sim) => (sim.is_paused(), sim.clock(), sim.market_price()),
            None => (true, 0, self.settings.opening_price),
        };
        out::room_state(
            &self.room_id,
            paused,
            self.started,
            self.ended,
            &self.settings,
            clock,
            self.clients_json(),
            price,
        )
    }

    fn send_portfolio(&self, id: ParticipantId) {
        let Some(sim) = self.simulator.as_ref() else {
            return;
        };
        if let Some(account) = sim.accounts().get(id) {
            self.send(id, out::portfolio_update(&account.portfolio(sim.market_price())));
        }
    }

    fn send_inventory(&self, id: ParticipantId) {
        let Some(powers) = self.powers.as_ref() else {
            return;
        };
        let payload: Value = powers
            .inventory(id)
            .iter()
            .map(|p| json!({"uuid": p.uuid, "power": p.spec}))
            .collect();
        self.send(id, out::power_inventory(payload));
    }

    // -------------------------------------------------------------------------
    // Client lifecycle
    // -------------------------------------------------------------------------

    /// Attach a session. `prev` carries the participant id from a
    /// reconnect token; a matching retained client is resumed in place.
    pub fn join(
        &mut self,
        tx: UnboundedSender<Value>,
        username: String,
        prev: Option<ParticipantId>,
        spectator: bool,
    ) -> ParticipantId {
        if let Some(prev_id) = prev {
            if self.clients.iter().any(|c| c.id == prev_id) {
                self.reconnect(prev_id, tx);
                return prev_id;
            }
        }

        let id = ParticipantId(self.next_client_id);
        self.next_client_id += 1;
        self.clients.push(Client {
            id,
            username: username.clone(),
            spectator,
            tx: Some(tx),
            disconnected_at: None,
        });

        if !spectator {
            if let Some(sim) = self.simulator.as_mut() {
                sim.add_client(TradingParticipant::new(
                    id,
                    username.clone(),
                    self.settings.starting_cash,
                    false,
                ));
            }
            if self.admin.is_none() {
                self.admin = Some(id);
                self.send(id, out::is_admin());
            }
        }

        self.send(id, out::id(&format!("{}-{}", self.room_id, id)));
        self.send(id, self.room_state());
        self.broadcast(out::join(&self.room_id, id, &username));
        info!(room = %self.room_id, %id, %username, "client joined");
        id
    }

    /// Swap in a fresh transport and resync the full client view.
    fn reconnect(&mut self, id: ParticipantId, tx: UnboundedSender<Value>) {
        let Some(client) = self.clients.iter_mut().find(|c| c.id == id) else {
            return;
        };
        client.tx = Some(tx);
        client.disconnected_at = None;
        info!(room = %self.room_id, %id, "client reconnected");

        self.send(id, out::id(&format!("{}-{}", self.room_id, id)));
        self.send(id, self.room_state());
        if self.started {
            self.send_portfolio(id);
        }
        self.send_inventory(id);
        let disabled = self
            .simulator
            .as_ref()
            .and_then(|s| s.accounts().get(id))
            .map(|a| a.trading_disabled())
            .unwrap_or(false);
        self.send(id, out::client_state(disabled));
        if self.admin == Some(id) {
            self.send(id, out::is_admin());
        }
    }

    /// A transport dropped; keep the participant for the grace window.
    pub fn mark_disconnected(&mut self, id: ParticipantId, now: Timestamp) {
        if let Some(client) = self.clients.iter_mut().find(|c| c.id == id) {
            client.tx = None;
            client.disconnected_at = Some(now);
            debug!(room = %self.room_id, %id, "client disconnected");
        }
    }

    fn reap_disconnected(&mut self, now: Timestamp) {
        let expired: Vec<ParticipantId> = self
            .clients
            .iter()
            .filter(|c| {
                c.disconnected_at
                    .is_some_and(|at| now.saturating_sub(at) >= RECONNECT_GRACE_MS)
            })
            .map(|c| c.id)
            .collect();
        for id in expired {
            self.remove_client(id);
        }
    }

    /// Drop a participant for good: cancel their orders, hand off the
    /// admin role, and tell the room.
    pub fn remove_client(&mut self, id: ParticipantId) {
        if let Some(sim) = self.simulator.as_mut() {
            sim.cancel_all_for(id);
        }
        self.clients.retain(|c| c.id != id);
        self.broadcast(out::leave(&self.room_id, id));

        if self.admin == Some(id) {
            self.admin = self.clients.iter().find(|c| !c.spectator).map(|c| c.id);
            if let Some(new_admin) = self.admin {
                self.send(new_admin, out::is_admin());
            }
        }
        info!(room = %self.room_id, %id, "client removed");
    }

    /// Whether the room holds no participants at all and can be dropped.
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn has_ended(&self) -> bool {
        self.ended
    }

    // -------------------------------------------------------------------------
    // Inbound messages
    // -------------------------------------------------------------------------

    pub fn handle_message(&mut self, from: ParticipantId, message: ClientMessage, now: Timestamp) {
        match message {
            ClientMessage::TogglePause => self.toggle_pause(from, now),
            ClientMessage::Chat { content } => {
                self.broadcast(out::chat(&self.room_id, from, &content));
            }
            ClientMessage::Ping => self.send(from, out::pong()),
            ClientMessage::Pong => {}
            ClientMessage::StockAction {
                side,
                order_type,
                quantity,
                price,
            } => self.stock_action(from, side, order_type, quantity, price, now),
            ClientMessage::Shock { target } => self.admin_shock(from, target),
            ClientMessage::AdminSettings { settings } => self.admin_settings(from, settings),
            ClientMessage::PowerSelect { index } => self.power_select(from, index, now),
            ClientMessage::PowerConsume { id } => self.power_consume(from, id, now),
        }
    }

    fn toggle_pause(&mut self, from: ParticipantId, now: Timestamp) {
        if self.admin != Some(from) {
            // Echo so the sender's UI snaps back.
            self.send(from, out::toggle_pause());
            return;
        }
        let Some(sim) = self.simulator.as_mut() else {
            return;
        };
        if self.ended {
            return;
        }
        if !self.started {
            self.started = true;
            sim.start(now);
        } else if sim.is_paused() {
            sim.start(now);
        } else {
            sim.set_paused(true);
        }
        self.broadcast(out::toggle_pause());
        self.broadcast(self.room_state());
    }

    fn stock_action(
        &mut self,
        from: ParticipantId,
        side: StockSide,
        order_type: StockOrderType,
        quantity: u64,
        price: Option<f64>,
        now: Timestamp,
    ) {
        if self
            .clients
            .iter()
            .find(|c| c.id == from)
            .map(|c| c.spectator)
            .unwrap_or(true)
        {
            return;
        }
        if !self.started || self.ended {
            return;
        }
        let Some(sim) = self.simulator.as_mut() else {
            return;
        };
        // Bounds keep the fixed-point math well inside i64.
        if sim.is_paused() || quantity == 0 || quantity > 1_000_000_000 {
            return;
        }

        let side = match side {
            StockSide::Buy => OrderSide::Buy,
            StockSide::Sell => OrderSide::Sell,
        };
        match order_type {
            StockOrderType::Limit => {
                let Some(price) = price.filter(|p| p.is_finite() && *p > 0.0 && *p <= 1_000_000.0)
                else {
                    return;
                };
                sim.submit_limit(from, side, Price::from_float(price), Quantity(quantity), now);
            }
            StockOrderType::Market => {
                sim.submit_market(from, side, Quantity(quantity), now);
            }
        }
        self.send_portfolio(from);
    }

    fn admin_shock(&mut self, from: ParticipantId, target: ShockTarget) {
        if self.admin != Some(from) {
            return;
        }
        let Some(sim) = self.simulator.as_mut() else {
            return;
        };
        match target {
            ShockTarget::Market => {
                let intensity = self.rng.bipolar() * 0.05;
                sim.generator_mut().shock(intensity, DEFAULT_SHOCK_TICKS);
            }
            ShockTarget::Intrinsic => {
                let pct = self.rng.bipolar() * 0.10;
                sim.generator_mut().intrinsic_shock(pct);
            }
        }
    }

    fn admin_settings(&mut self, from: ParticipantId, patch: SettingsPatch) {
        if self.admin != Some(from) {
            return;
        }
        let running = self
            .simulator
            .as_ref()
            .map(|s| self.started && !s.is_paused())
            .unwrap_or(false);
        if running {
            self.send(from, out::error("Settings can only be changed while paused"));
            return;
        }
        self.settings.apply(patch);
        self.setup();
        self.broadcast(self.room_state());
        info!(room = %self.room_id, "settings applied, simulator rebuilt");
    }

    // -------------------------------------------------------------------------
    // Powers
    // -------------------------------------------------------------------------

    fn power_select(&mut self, from: ParticipantId, index: usize, now: Timestamp) {
        let Some(powers) = self.powers.as_mut() else {
            return;
        };
        match powers.select(from, index) {
            Some(Selected::Instant(spec)) => self.apply_power(0, spec, from, now),
            Some(Selected::Stored(_)) => self.send_inventory(from),
            None => {}
        }
    }

    fn power_consume(&mut self, from: ParticipantId, uuid: u64, now: Timestamp) {
        let Some(powers) = self.powers.as_mut() else {
            return;
        };
        let Some(stored) = powers.consume(from, uuid) else {
            return;
        };
        self.apply_power(stored.uuid, stored.spec, from, now);
        self.send_inventory(from);
    }

    fn apply_power(
        &mut self,
        uuid: u64,
        spec: &'static PowerSpec,
        initiator: ParticipantId,
        now: Timestamp,
    ) {
        info!(room = %self.room_id, power = spec.id, %initiator, "power consumed");
        match spec.effect {
            PowerEffect::VolatilityStorm => {
                let Some(sim) = self.simulator.as_mut() else {
                    return;
                };
                let previous = sim.generator().volatility();
                sim.generator_mut().set_volatility((previous * 4.0).min(1.0));
                if let Some(powers) = self.powers.as_mut() {
                    powers.activate(ActivePower {
                        uuid,
                        spec,
                        initiator,
                        ticks_elapsed: 0,
                        state: PowerState::RestoreVolatility { previous },
                    });
                }
                self.broadcast(out::notification(
                    NotificationLevel::Warning,
                    "Volatility storm",
                    Some("The market turns violent."),
                ));
            }
            PowerEffect::RumorMill => {
                let intensity = self.rng.uniform() * 0.05;
                let publication = self.news.as_mut().map(|n| {
                    n.inject(
                        "Rumor mill",
                        "Whispers of something big ripple through the floor.",
                        0,
                        MarketEffect::GuideShock {
                            intensity,
                            duration_ticks: DEFAULT_SHOCK_TICKS,
                        },
                        now,
                    )
                });
                if let Some(publication) = publication {
                    self.publish_news(&publication);
                }
            }
            PowerEffect::CashHeritage => {
                let windfall = 1_000.0 + (self.rng.uniform() * self.settings.starting_cash.to_float()).floor();
                self.grant(initiator, Cash::from_float(windfall));
                self.broadcast(out::notification(
                    NotificationLevel::Success,
                    "Cash heritage",
                    Some("A distant relative remembered someone fondly."),
                ));
                self.send_portfolio(initiator);
            }
            PowerEffect::HomelessGift => {
                self.grant(initiator, Cash::from_float(1.0));
                self.send(
                    initiator,
                    out::notification(
                        NotificationLevel::Info,
                        "The homeless gift",
                        Some("A stranger hands you a dollar."),
                    ),
                );
                self.send_portfolio(initiator);
            }
            PowerEffect::HackerDdos => {
                let targets: Vec<ParticipantId> = self
                    .clients
                    .iter()
                    .filter(|c| !c.spectator && c.id != initiator)
                    .map(|c| c.id)
                    .collect();
                if let Some(sim) = self.simulator.as_mut() {
                    for target in &targets {
                        if let Some(account) = sim.accounts_mut().get_mut(*target) {
                            account.set_trading_disabled(true);
                        }
                    }
                }
                for target in &targets {
                    self.send(*target, out::client_state(true));
                    self.send(
                        *target,
                        out::notification(
                            NotificationLevel::Error,
                            "DDoS attack",
                            Some("Your trading terminal is offline."),
                        ),
                    );
                }
                if let Some(powers) = self.powers.as_mut() {
                    powers.activate(ActivePower {
                        uuid,
                        spec,
                        initiator,
                        ticks_elapsed: 0,
                        state: PowerState::ReenableTrading { targets },
                    });
                }
            }
        }
    }

    fn end_power(&mut self, power: ActivePower) {
        debug!(room = %self.room_id, power = power.spec.id, "power ended");
        match power.state {
            PowerState::RestoreVolatility { previous } => {
                if let Some(sim) = self.simulator.as_mut() {
                    sim.generator_mut().set_volatility(previous);
                }
                self.broadcast(out::notification(
                    NotificationLevel::Info,
                    "The storm subsides",
                    None,
                ));
            }
            PowerState::ReenableTrading { targets } => {
                if let Some(sim) = self.simulator.as_mut() {
                    for target in &targets {
                        if let Some(account) = sim.accounts_mut().get_mut(*target) {
                            account.set_trading_disabled(false);
                        }
                    }
                }
                for target in &targets {
                    self.send(*target, out::client_state(false));
                    self.send(
                        *target,
                        out::notification(
                            NotificationLevel::Success,
                            "Connection restored",
                            None,
                        ),
                    );
                }
            }
        }
    }

    fn grant(&mut self, id: ParticipantId, amount: Cash) {
        if let Some(sim) = self.simulator.as_mut() {
            if let Some(account) = sim.accounts_mut().get_mut(id) {
                account.grant_cash(amount);
            }
        }
    }

    // -------------------------------------------------------------------------
    // News
    // -------------------------------------------------------------------------

    fn publish_news(&mut self, publication: &NewsPublication) {
        self.apply_market_effect(publication.item.effect);
        self.broadcast(out::news(
            &publication.item.title,
            &publication.item.description,
            publication.item.duration_ticks,
            publication.item.published_at,
        ));
    }

    fn apply_market_effect(&mut self, effect: MarketEffect) {
        let Some(sim) = self.simulator.as_mut() else {
            return;
        };
        match effect {
            MarketEffect::GuideShock {
                intensity,
                duration_ticks,
            } => sim.generator_mut().shock(intensity, duration_ticks),
            MarketEffect::IntrinsicShock { pct } => sim.generator_mut().intrinsic_shock(pct),
            MarketEffect::Neutral => {}
        }
    }

    // -------------------------------------------------------------------------
    // Timers
    // -------------------------------------------------------------------------

    /// 200 ms market tick.
    pub fn market_tick(&mut self, now: Timestamp) {
        if self.disposed {
            return;
        }
        let output = match self.simulator.as_mut() {
            Some(sim) => sim.market_tick(now),
            None => None,
        };
        let Some(output) = output else {
            return;
        };

        self.broadcast(out::debug_prices(output.pair.intrinsic, output.pair.guide));
        if let Some(price) = output.price_changed {
            let snapshot = self
                .simulator
                .as_ref()
                .expect("ticked above")
                .snapshot(now);
            self.broadcast(out::stock_movement(price, &snapshot));
            let ids: Vec<ParticipantId> = self
                .clients
                .iter()
                .filter(|c| !c.spectator && c.is_connected())
                .map(|c| c.id)
                .collect();
            for id in ids {
                self.send_portfolio(id);
            }
        }
    }

    /// 1 s clock tick.
    pub fn clock_tick(&mut self, now: Timestamp) {
        if self.disposed {
            return;
        }
        self.reap_disconnected(now);

        let output = match self.simulator.as_mut() {
            Some(sim) => sim.clock_tick(now),
            None => None,
        };
        let Some(output) = output else {
            return;
        };
        self.broadcast(out::clock(output.clock, output.time_left_ms));

        let elapsed = self.elapsed_ms();
        let publications = match self.news.as_mut() {
            Some(news) => news.on_clock(elapsed, false),
            None => Vec::new(),
        };
        for publication in publications {
            self.publish_news(&publication);
        }

        let power_output = self
            .powers
            .as_mut()
            .map(|p| p.on_clock(elapsed, false))
            .unwrap_or_default();
        if power_output.briefcase_due {
            self.offer_briefcases();
        }
        for ended in power_output.ended {
            self.end_power(ended);
        }

        if output.ended {
            self.conclude();
        }
    }

    fn elapsed_ms(&self) -> u64 {
        let left = self
            .simulator
            .as_ref()
            .map(|s| s.time_left_ms())
            .unwrap_or(self.settings.game_duration_ms());
        self.settings.game_duration_ms().saturating_sub(left)
    }

    fn offer_briefcases(&mut self) {
        let ids: Vec<ParticipantId> = self
            .clients
            .iter()
            .filter(|c| !c.spectator && c.is_connected())
            .map(|c| c.id)
            .collect();
        for id in ids {
            let offer = match self.powers.as_mut() {
                Some(powers) => powers.offer(id),
                None => continue,
            };
            let payload: Value = offer.iter().map(|spec| json!(spec)).collect();
            self.send(id, out::power_offers(payload));
        }
    }

    fn conclude(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;
        let Some(sim) = self.simulator.as_ref() else {
            return;
        };
        let price = sim.market_price();
        let players = sim.accounts().portfolios(price, false);
        let bots = sim.accounts().portfolios(price, true);
        let message = out::game_conclusion(
            &players,
            &bots,
            sim.book().total_value_traded().to_float(),
            sim.book().highest_price(),
            sim.book().lowest_price(),
        );
        self.broadcast(message);
        info!(room = %self.room_id, "game concluded");
    }

    /// Tear the room down: end every live effect, drop bots, close
    /// transports. Safe to call more than once.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        // Active effects must restore what they changed before anything
        // else is dropped.
        let remaining = self
            .powers
            .as_mut()
            .map(|p| p.dispose())
            .unwrap_or_default();
        for power in remaining {
            self.end_power(power);
        }
        if let Some(news) = self.news.as_mut() {
            news.dispose();
        }
        if let Some(sim) = self.simulator.as_mut() {
            sim.clear_bots();
        }
        for client in self.clients.iter_mut() {
            client.tx = None;
        }
        self.disposed = true;
        info!(room = %self.room_id, "room disposed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use powers::CATALOGUE;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    fn join(room: &mut Room, name: &str) -> (ParticipantId, UnboundedReceiver<Value>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = room.join(tx, name.to_string(), None, false);
        (id, rx)
    }

    fn drain(rx: &mut UnboundedReceiver<Value>) -> Vec<Value> {
        let mut out = Vec::new();
        while let Ok(v) = rx.try_recv() {
            out.push(v);
        }
        out
    }

    fn tags(messages: &[Value]) -> Vec<i64> {
        messages.iter().filter_map(|m| m["type"].as_i64()).collect()
    }

    fn start(room: &mut Room, admin: ParticipantId, now: Timestamp) {
        room.handle_message(admin, ClientMessage::TogglePause, now);
    }

    fn spec(effect: PowerEffect) -> &'static PowerSpec {
        CATALOGUE.iter().find(|s| s.effect == effect).unwrap()
    }

    #[test]
    fn first_client_becomes_admin_and_gets_state() {
        let mut room = Room::new("lobby".into());
        let (a, mut rx_a) = join(&mut room, "alice");
        let alice_tags = tags(&drain(&mut rx_a));
        assert!(alice_tags.contains(&crate::protocol::tag::IS_ADMIN));
        assert!(alice_tags.contains(&crate::protocol::tag::ID));
        assert!(alice_tags.contains(&crate::protocol::tag::ROOM_STATE));
        assert_eq!(a, ParticipantId(1));

        let (_b, mut rx_b) = join(&mut room, "bob");
        let bob_tags = tags(&drain(&mut rx_b));
        assert!(!bob_tags.contains(&crate::protocol::tag::IS_ADMIN));
    }

    #[test]
    fn admin_promotes_on_leave() {
        let mut room = Room::new("lobby".into());
        let (a, _rx_a) = join(&mut room, "alice");
        let (_b, mut rx_b) = join(&mut room, "bob");
        drain(&mut rx_b);

        room.remove_client(a);
        let messages = drain(&mut rx_b);
        let tags = tags(&messages);
        assert!(tags.contains(&crate::protocol::tag::IS_ADMIN));
        assert!(tags.contains(&crate::protocol::tag::LEAVE));
    }

    #[test]
    fn non_admin_toggle_is_echoed_back_only() {
        let mut room = Room::new("lobby".into());
        let (_a, mut rx_a) = join(&mut room, "alice");
        let (b, mut rx_b) = join(&mut room, "bob");
        drain(&mut rx_a);
        drain(&mut rx_b);

        room.handle_message(b, ClientMessage::TogglePause, 1_000);
        assert!(!room.started);
        assert_eq!(
            tags(&drain(&mut rx_b)),
            vec![crate::protocol::tag::TOGGLE_PAUSE]
        );
        assert!(drain(&mut rx_a).is_empty());
    }

    #[test]
    fn admin_settings_gating() {
        let mut room = Room::new("lobby".into());
        let (a, mut rx_a) = join(&mut room, "alice");
        let (b, mut rx_b) = join(&mut room, "bob");
        drain(&mut rx_a);
        drain(&mut rx_b);

        // Non-admin: silently ignored.
        room.handle_message(
            b,
            ClientMessage::AdminSettings {
                settings: SettingsPatch {
                    bots: Some(5),
                    ..Default::default()
                },
            },
            0,
        );
        assert_eq!(room.settings.bots, 0);

        // Admin while running: an ERROR comes back.
        start(&mut room, a, 1_000);
        drain(&mut rx_a);
        room.handle_message(
            a,
            ClientMessage::AdminSettings {
                settings: SettingsPatch {
                    bots: Some(5),
                    ..Default::default()
                },
            },
            2_000,
        );
        assert!(tags(&drain(&mut rx_a)).contains(&crate::protocol::tag::ERROR));
        assert_eq!(room.settings.bots, 0);

        // Paused: applies, rebuilds, broadcasts state.
        room.handle_message(a, ClientMessage::TogglePause, 3_000);
        drain(&mut rx_a);
        drain(&mut rx_b);
        room.handle_message(
            a,
            ClientMessage::AdminSettings {
                settings: SettingsPatch {
                    bots: Some(5),
                    ..Default::default()
                },
            },
            4_000,
        );
        assert_eq!(room.settings.bots, 5);
        assert_eq!(room.simulator.as_ref().unwrap().bot_count(), 5);
        assert!(tags(&drain(&mut rx_b)).contains(&crate::protocol::tag::ROOM_STATE));
    }

    #[test]
    fn stock_action_updates_portfolio() {
        let mut room = Room::new("lobby".into());
        let (a, mut rx_a) = join(&mut room, "alice");
        start(&mut room, a, 1_000);
        drain(&mut rx_a);

        room.handle_message(
            a,
            ClientMessage::StockAction {
                side: StockSide::Buy,
                order_type: StockOrderType::Limit,
                quantity: 100,
                price: Some(0.50),
            },
            2_000,
        );
        let messages = drain(&mut rx_a);
        let update = messages
            .iter()
            .find(|m| m["type"] == crate::protocol::tag::PORTFOLIO_UPDATE)
            .expect("portfolio update sent");
        // 10_000 - 50 locked.
        assert_eq!(update["value"]["cash"], 9_950.0);
    }

    #[test]
    fn ddos_power_disables_peers_until_it_ends() {
        let mut room = Room::new("lobby".into());
        let (a, mut rx_a) = join(&mut room, "alice");
        let (b, mut rx_b) = join(&mut room, "bob");
        start(&mut room, a, 1_000);
        drain(&mut rx_a);
        drain(&mut rx_b);

        let ddos = spec(PowerEffect::HackerDdos);
        room.apply_power(1, ddos, a, 2_000);
        assert!(tags(&drain(&mut rx_b)).contains(&crate::protocol::tag::CLIENT_STATE));

        // B's order is a no-op while disabled.
        let before = room
            .simulator
            .as_ref()
            .unwrap()
            .accounts()
            .get(b)
            .unwrap()
            .clone();
        room.handle_message(
            b,
            ClientMessage::StockAction {
                side: StockSide::Buy,
                order_type: StockOrderType::Limit,
                quantity: 10,
                price: Some(1.0),
            },
            3_000,
        );
        assert_eq!(
            room.simulator.as_ref().unwrap().accounts().get(b).unwrap(),
            &before
        );

        // After the duration elapses the peer trades again.
        for s in 0..=ddos.duration_ticks as u64 {
            room.clock_tick(2_000 + (s + 1) * 1_000);
        }
        assert!(!room
            .simulator
            .as_ref()
            .unwrap()
            .accounts()
            .get(b)
            .unwrap()
            .trading_disabled());
        room.handle_message(
            b,
            ClientMessage::StockAction {
                side: StockSide::Buy,
                order_type: StockOrderType::Limit,
                quantity: 10,
                price: Some(1.0),
            },
            30_000,
        );
        assert!(room
            .simulator
            .as_ref()
            .unwrap()
            .accounts()
            .get(b)
            .unwrap()
            .locked_cash()
            .is_positive());
    }

    #[test]
    fn volatility_storm_restores_on_end() {
        let mut room = Room::new("lobby".into());
        let (a, _rx_a) = join(&mut room, "alice");
        start(&mut room, a, 1_000);

        let before = room.simulator.as_ref().unwrap().generator().volatility();
        let storm = spec(PowerEffect::VolatilityStorm);
        room.apply_power(1, storm, a, 2_000);
        let during = room.simulator.as_ref().unwrap().generator().volatility();
        assert!(during > before);

        for s in 0..=storm.duration_ticks as u64 {
            room.clock_tick(2_000 + (s + 1) * 1_000);
        }
        let after = room.simulator.as_ref().unwrap().generator().volatility();
        assert!((after - before).abs() < 1e-12);
    }

    #[test]
    fn dispose_ends_active_powers() {
        let mut room = Room::new("lobby".into());
        let (a, _rx_a) = join(&mut room, "alice");
        let (b, _rx_b) = join(&mut room, "bob");
        start(&mut room, a, 1_000);

        room.apply_power(1, spec(PowerEffect::HackerDdos), a, 2_000);
        assert!(room
            .simulator
            .as_ref()
            .unwrap()
            .accounts()
            .get(b)
            .unwrap()
            .trading_disabled());

        room.dispose();
        assert!(!room
            .simulator
            .as_ref()
            .unwrap()
            .accounts()
            .get(b)
            .unwrap()
            .trading_disabled());
        assert_eq!(room.simulator.as_ref().unwrap().bot_count(), 0);
    }

    #[test]
    fn reconnect_restores_full_view() {
        let mut room = Room::new("lobby".into());
        let (a, mut rx_a) = join(&mut room, "alice");
        start(&mut room, a, 1_000);
        room.handle_message(
            a,
            ClientMessage::StockAction {
                side: StockSide::Buy,
                order_type: StockOrderType::Limit,
                quantity: 100,
                price: Some(0.50),
            },
            2_000,
        );
        drain(&mut rx_a);

        room.mark_disconnected(a, 10_000);
        // Within the grace window the participant is retained.
        room.clock_tick(20_000);
        assert!(!room.is_empty());

        let (tx, mut rx_again) = mpsc::unbounded_channel();
        let resumed = room.join(tx, "alice".to_string(), Some(a), false);
        assert_eq!(resumed, a);

        let messages = drain(&mut rx_again);
        let tags = tags(&messages);
        assert!(tags.contains(&crate::protocol::tag::ID));
        assert!(tags.contains(&crate::protocol::tag::ROOM_STATE));
        assert!(tags.contains(&crate::protocol::tag::PORTFOLIO_UPDATE));
        assert!(tags.contains(&crate::protocol::tag::POWER_INVENTORY));
        assert!(tags.contains(&crate::protocol::tag::CLIENT_STATE));
        assert!(tags.contains(&crate::protocol::tag::IS_ADMIN));

        // The locked order's effect on cash survived the reconnect.
        let update = messages
            .iter()
            .find(|m| m["type"] == crate::protocol::tag::PORTFOLIO_UPDATE)
            .unwrap();
        assert_eq!(update["value"]["cash"], 9_950.0);
    }

    #[test]
    fn expired_disconnect_is_reaped() {
        let mut room = Room::new("lobby".into());
        let (a, _rx_a) = join(&mut room, "alice");
        let (_b, mut rx_b) = join(&mut room, "bob");
        drain(&mut rx_b);
        start(&mut room, a, 1_000);
        drain(&mut rx_b);

        room.mark_disconnected(a, 10_000);
        room.clock_tick(10_000 + RECONNECT_GRACE_MS);
        let tags = tags(&drain(&mut rx_b));
        assert!(tags.contains(&crate::protocol::tag::LEAVE));
        assert!(tags.contains(&crate::protocol::tag::IS_ADMIN));
    }

    #[test]
    fn game_concludes_after_duration() {
        let mut room = Room::new("lobby".into());
        let (a, mut rx_a) = join(&mut room, "alice");
        // Shrink the game to one minute.
        room.handle_message(
            a,
            ClientMessage::AdminSettings {
                settings: SettingsPatch {
                    game_duration: Some(1),
                    bots: Some(3),
                    ..Default::default()
                },
            },
            0,
        );
        start(&mut room, a, 1_000);
        drain(&mut rx_a);

        for s in 1..=61u64 {
            room.clock_tick(1_000 + s * 1_000);
        }
        assert!(room.has_ended());
        let messages = drain(&mut rx_a);
        let conclusion = messages
            .iter()
            .find(|m| m["type"] == crate::protocol::tag::GAME_CONCLUSION)
            .expect("conclusion broadcast");
        assert!(conclusion["players"].as_array().unwrap().len() == 1);
        assert_eq!(conclusion["bots"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn briefcases_reach_connected_clients() {
        let mut room = Room::new("lobby".into());
        let (a, mut rx_a) = join(&mut room, "alice");
        start(&mut room, a, 1_000);
        drain(&mut rx_a);

        // Walk the full default game; at least one briefcase must land.
        let mut offered = false;
        for s in 1..=300u64 {
            room.clock_tick(1_000 + s * 1_000);
            let messages = drain(&mut rx_a);
            if let Some(offer) = messages
                .iter()
                .find(|m| m["type"] == crate::protocol::tag::POWER_OFFERS)
            {
                offered = true;
                let powers = offer["powers"].as_array().unwrap();
                assert_eq!(powers.len(), 3);
                // Pairwise distinct ids.
                let ids: Vec<&str> = powers.iter().map(|p| p["id"].as_str().unwrap()).collect();
                for i in 0..ids.len() {
                    for j in (i + 1)..ids.len() {
                        assert_ne!(ids[i], ids[j]);
                    }
                }
                break;
            }
        }
        assert!(offered, "no briefcase offered during the game");
    }
}
