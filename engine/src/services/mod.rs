// Service layer: signal aggregation and outbound notification.
pub mod notifier;
pub mod signal_service;
pub mod telegram;

pub use notifier::{Delivery, MessageSender, Notifier};
pub use signal_service::{RunOutcome, SignalAggregator, SignalComposer};
pub use telegram::TelegramClient;
