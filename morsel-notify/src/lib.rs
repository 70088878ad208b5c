pub mod channel;
pub mod channels;
pub mod commands;
pub mod controls;
pub mod dispatcher;
pub mod render;

pub use channel::{ChannelAdapter, ChannelError};
pub use channels::chatbot::{BotGateway, ChatBotChannel};
pub use channels::email::EmailChannel;
pub use channels::messaging::MessagingChannel;
pub use commands::{Acknowledgment, BotCommand, CommandAction, CommandHandler, InboundCommand};
pub use controls::{controls_for, Control};
pub use dispatcher::NotificationDispatcher;
pub use render::{EventKind, Notification};
