pub mod entity;
pub mod log;

pub use entity::{event_id, ticket_id, DataSource, Event, Ticket};
pub use log::{BlockMeta, ChainLog, EventCreated, LogKind, LogPosition, TicketCheckedIn, Transfer};
