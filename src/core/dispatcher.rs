use std::sync::Arc;
use std::time::Duration;

use crate::core::commands::Command;
use crate::core::dialog::{DialogReply, ProfileDialog};
use crate::core::engine::{EngineError, LeaveOutcome, MatchOutcome, PairingEngine};
use crate::core::notices;
use crate::models::{Outbound, Profile, UserId};
use crate::services::Transport;

/// Delivery tally for one dispatched event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Routes inbound text to the setup dialog, the pairing engine or the relay
///
/// State changes happen first, inside the engine's critical section. The
/// resulting notices are then delivered in order through the transport, so
/// no lock is ever held across network I/O.
#[derive(Clone)]
pub struct Dispatcher {
    engine: PairingEngine,
    dialog: ProfileDialog,
    transport: Arc<dyn Transport>,
}

impl Dispatcher {
    pub fn new(engine: PairingEngine, dialog: ProfileDialog, transport: Arc<dyn Transport>) -> Self {
        Self {
            engine,
            dialog,
            transport,
        }
    }

    pub fn engine(&self) -> &PairingEngine {
        &self.engine
    }

    /// Handle one message from `user_id` and deliver every resulting notice
    pub async fn handle(&self, user_id: UserId, text: &str) -> DeliveryReport {
        let outbound = self.route(user_id, text).await;
        self.deliver(outbound).await
    }

    /// Decide what to send in response to a message, applying state changes
    pub async fn route(&self, user_id: UserId, text: &str) -> Vec<Outbound> {
        match Command::parse(text) {
            Command::Start => self.start(user_id).await,
            Command::Find => self.find(user_id).await,
            Command::Stop => self.stop(user_id).await,
            Command::Help => vec![Outbound::new(user_id, notices::HELP)],
            Command::Unknown(name) => {
                tracing::debug!(user_id, command = name, "Unknown command");
                vec![Outbound::new(user_id, notices::UNKNOWN_COMMAND)]
            }
            Command::Text(text) => self.text(user_id, text).await,
        }
    }

    /// Register a profile coming from outside the chat dialog
    pub async fn submit_profile(&self, user_id: UserId, profile: Profile) -> Result<(), EngineError> {
        self.dialog.cancel(user_id).await;
        self.engine.submit_profile(user_id, profile).await
    }

    async fn start(&self, user_id: UserId) -> Vec<Outbound> {
        if self.engine.has_profile(user_id).await {
            return vec![Outbound::new(user_id, notices::PROFILE_EXISTS)];
        }
        vec![Outbound::new(user_id, self.dialog.begin(user_id).await)]
    }

    async fn find(&self, user_id: UserId) -> Vec<Outbound> {
        match self.engine.request_match(user_id).await {
            Ok(MatchOutcome::Matched { partner }) => vec![
                Outbound::new(user_id, notices::CONNECTED),
                Outbound::new(partner, notices::CONNECTED),
            ],
            Ok(MatchOutcome::Waiting { .. }) => vec![Outbound::new(user_id, notices::WAITING)],
            Err(e) => vec![Outbound::new(user_id, notice_for(e))],
        }
    }

    async fn stop(&self, user_id: UserId) -> Vec<Outbound> {
        match self.engine.leave(user_id).await {
            LeaveOutcome::LeftSession { partner } => vec![
                Outbound::new(partner, notices::PARTNER_LEFT),
                Outbound::new(user_id, notices::YOU_LEFT),
            ],
            LeaveOutcome::Withdrawn => vec![Outbound::new(user_id, notices::WITHDRAWN)],
            LeaveOutcome::NotInChat => vec![Outbound::new(user_id, notices::NOT_IN_CHAT)],
        }
    }

    async fn text(&self, user_id: UserId, text: &str) -> Vec<Outbound> {
        if let Some(reply) = self.dialog.answer(user_id, text).await {
            let notice = match reply {
                DialogReply::Prompt(prompt) => prompt,
                DialogReply::Completed(profile) => {
                    match self.engine.submit_profile(user_id, profile).await {
                        Ok(()) => notices::PROFILE_CREATED,
                        Err(e) => notice_for(e),
                    }
                }
            };
            return vec![Outbound::new(user_id, notice)];
        }

        match self.engine.relay(user_id).await {
            Ok(partner) => vec![Outbound::new(partner, text)],
            Err(e) => vec![Outbound::new(user_id, notice_for(e))],
        }
    }

    /// Evict users that waited longer than `ttl` and tell them
    pub async fn expire_waiting(&self, ttl: Duration) -> DeliveryReport {
        let evicted = self.engine.evict_stale(ttl).await;
        let outbound = evicted
            .into_iter()
            .map(|user_id| Outbound::new(user_id, notices::SEARCH_EXPIRED))
            .collect();
        self.deliver(outbound).await
    }

    async fn deliver(&self, outbound: Vec<Outbound>) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        for message in outbound {
            match self.transport.send(message.to, &message.text).await {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(user_id = message.to, "Delivery failed: {}", e);
                }
            }
        }

        report
    }
}

fn notice_for(error: EngineError) -> &'static str {
    match error {
        EngineError::NoProfile(_) => notices::NO_PROFILE,
        EngineError::AlreadyPaired(_) => notices::ALREADY_PAIRED,
        EngineError::NotInSession(_) => notices::NOT_IN_CHAT_HINT,
        EngineError::ProfileExists(_) => notices::PROFILE_EXISTS,
    }
}

/// Periodically evict users that waited longer than `ttl`
pub async fn run_expiry_sweeper(dispatcher: Dispatcher, ttl: Duration, every: Duration) {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    tracing::info!("Waiting pool expiry enabled (ttl: {:?}, sweep every {:?})", ttl, every);

    loop {
        interval.tick().await;
        let report = dispatcher.expire_waiting(ttl).await;
        if report.delivered + report.failed > 0 {
            tracing::debug!(
                delivered = report.delivered,
                failed = report.failed,
                "Expiry notices sent"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::InMemoryTransport;

    fn setup() -> (Dispatcher, Arc<InMemoryTransport>) {
        let transport = Arc::new(InMemoryTransport::new());
        let dispatcher = Dispatcher::new(
            PairingEngine::new(),
            ProfileDialog::new(100, Duration::from_secs(60)),
            transport.clone(),
        );
        (dispatcher, transport)
    }

    async fn register(dispatcher: &Dispatcher, user_id: UserId, gender: &str, preference: &str) {
        dispatcher
            .submit_profile(user_id, Profile::new("25", gender, preference, "Somewhere"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_dialog_through_dispatcher() {
        let (dispatcher, transport) = setup();

        for text in ["/start", "22", "male", "female", "Madrid"] {
            dispatcher.handle(3, text).await;
        }

        assert_eq!(
            transport.take(3).await,
            vec![
                notices::WELCOME,
                notices::ASK_GENDER,
                notices::ASK_PREFERENCE,
                notices::ASK_LOCATION,
                notices::PROFILE_CREATED,
            ]
        );
        assert_eq!(
            dispatcher.engine().profile(3).await,
            Some(Profile::new("22", "male", "female", "Madrid"))
        );

        dispatcher.handle(3, "/start").await;
        assert_eq!(transport.take(3).await, vec![notices::PROFILE_EXISTS]);
    }

    #[tokio::test]
    async fn test_commands_work_during_dialog() {
        let (dispatcher, transport) = setup();
        dispatcher.handle(1, "/start").await;
        transport.take(1).await;

        dispatcher.handle(1, "/help").await;
        dispatcher.handle(1, "/find").await;

        assert_eq!(transport.take(1).await, vec![notices::HELP, notices::NO_PROFILE]);
    }

    #[tokio::test]
    async fn test_find_relay_stop() {
        let (dispatcher, transport) = setup();
        register(&dispatcher, 1, "male", "female").await;
        register(&dispatcher, 2, "female", "male").await;

        dispatcher.handle(1, "/find").await;
        assert_eq!(transport.take(1).await, vec![notices::WAITING]);

        let report = dispatcher.handle(2, "/find").await;
        assert_eq!(report, DeliveryReport { delivered: 2, failed: 0 });
        assert_eq!(transport.take(1).await, vec![notices::CONNECTED]);
        assert_eq!(transport.take(2).await, vec![notices::CONNECTED]);

        dispatcher.handle(1, "hi").await;
        assert_eq!(transport.take(2).await, vec!["hi"]);
        assert!(transport.take(1).await.is_empty());

        dispatcher.handle(1, "/stop").await;
        assert_eq!(transport.take(2).await, vec![notices::PARTNER_LEFT]);
        assert_eq!(transport.take(1).await, vec![notices::YOU_LEFT]);
        assert!(dispatcher.engine().check_invariants().await.is_ok());
    }

    #[tokio::test]
    async fn test_text_outside_chat() {
        let (dispatcher, transport) = setup();

        dispatcher.handle(4, "anyone there?").await;
        dispatcher.handle(4, "/stop").await;
        dispatcher.handle(4, "/dance").await;

        assert_eq!(
            transport.take(4).await,
            vec![notices::NOT_IN_CHAT_HINT, notices::NOT_IN_CHAT, notices::UNKNOWN_COMMAND]
        );
    }

    #[tokio::test]
    async fn test_delivery_failure_keeps_state() {
        let (dispatcher, transport) = setup();
        register(&dispatcher, 1, "male", "female").await;
        register(&dispatcher, 2, "female", "male").await;
        transport.reject(1).await;

        dispatcher.handle(1, "/find").await;
        let report = dispatcher.handle(2, "/find").await;

        assert_eq!(report, DeliveryReport { delivered: 1, failed: 1 });
        assert_eq!(dispatcher.engine().partner_of(2).await, Some(1));
        assert!(dispatcher.engine().check_invariants().await.is_ok());
    }

    #[tokio::test]
    async fn test_expire_waiting_notifies() {
        let (dispatcher, transport) = setup();
        register(&dispatcher, 1, "male", "male").await;
        dispatcher.handle(1, "/find").await;
        transport.take(1).await;

        let report = dispatcher.expire_waiting(Duration::ZERO).await;

        assert_eq!(report.delivered, 1);
        assert_eq!(transport.take(1).await, vec![notices::SEARCH_EXPIRED]);
        assert!(!dispatcher.engine().is_waiting(1).await);
    }
}
