// The process-wide coordinator: port registry, sequence counters, and the
// stream/function handler table that routes received primaries.

mod handler_table;
mod message_manager;

pub(crate) use message_manager::DispatchOutcome;

pub use {handler_table::MessageHandler, message_manager::MessageManager};
