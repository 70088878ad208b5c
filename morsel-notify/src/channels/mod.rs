pub mod chatbot;
pub mod email;
pub mod messaging;
