//! Event projection engine
//!
//! Turns one [`ChainLog`] into mutations of the `Event`/`Ticket` tables,
//! read and written through an [`EntityTxn`]. The engine keeps no state of
//! its own: the result depends only on the transaction's view of the tables
//! and the log, so replaying a log stream rebuilds the same projection.
//!
//! Handlers are idempotent:
//! - `EventCreated` for a known id keeps the existing row
//! - a mint of a known ticket id is ignored (no second row, no second count)
//! - a transfer at or before the ticket's last transfer position is ignored
//! - a check-in of a checked-in ticket keeps the first timestamp
//!
//! Inconsistent input (a transfer or check-in of a ticket that was never
//! minted) is logged and skipped; it never fails the log.

use alloy_primitives::{Address, U256};
use ticketgraph_core::{
    error::Result, event_id, ticket_id, ChainLog, DataSource, EntityTxn, Event, EventCreated,
    LogKind, Ticket, TicketCheckedIn, Transfer,
};

/// Request from the projection to its host, emitted alongside the mutations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEffect {
    /// Start delivering `Transfer`/`TicketCheckedIn` logs of this contract
    RegisterSource(DataSource),
}

/// Why a log left the tables untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// `EventCreated` for an event id that already exists
    DuplicateEvent,
    /// Mint of a ticket id that already exists
    DuplicateMint,
    /// Transfer or check-in of a ticket that was never minted
    UnknownTicket,
    /// Transfer at or before the ticket's last applied transfer
    StaleTransfer,
    /// Check-in of a ticket that is already checked in
    AlreadyCheckedIn,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::DuplicateEvent => "duplicate_event",
            SkipReason::DuplicateMint => "duplicate_mint",
            SkipReason::UnknownTicket => "unknown_ticket",
            SkipReason::StaleTransfer => "stale_transfer",
            SkipReason::AlreadyCheckedIn => "already_checked_in",
        }
    }
}

/// Result of applying one log
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The log changed the entity tables
    Applied { effects: Vec<HostEffect> },
    /// The log was recognised but changed nothing
    Skipped {
        reason: SkipReason,
        effects: Vec<HostEffect>,
    },
}

impl ApplyOutcome {
    fn applied() -> Self {
        ApplyOutcome::Applied {
            effects: Vec::new(),
        }
    }

    fn skipped(reason: SkipReason) -> Self {
        ApplyOutcome::Skipped {
            reason,
            effects: Vec::new(),
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, ApplyOutcome::Applied { .. })
    }

    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            ApplyOutcome::Applied { .. } => None,
            ApplyOutcome::Skipped { reason, .. } => Some(*reason),
        }
    }

    pub fn effects(&self) -> &[HostEffect] {
        match self {
            ApplyOutcome::Applied { effects } | ApplyOutcome::Skipped { effects, .. } => effects,
        }
    }
}

/// Stateless projection of chain logs onto the entity tables
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectionEngine;

impl ProjectionEngine {
    pub fn new() -> Self {
        Self
    }

    /// Apply one log. Exactly one handler runs per log kind.
    pub fn apply<T: EntityTxn>(&self, txn: &mut T, log: &ChainLog) -> Result<ApplyOutcome> {
        match &log.kind {
            LogKind::EventCreated(created) => self.handle_event_created(txn, log, created),
            LogKind::Transfer(transfer) => self.handle_transfer(txn, log, transfer),
            LogKind::TicketCheckedIn(checked_in) => {
                self.handle_ticket_checked_in(txn, log, checked_in)
            }
        }
    }

    /// Insert the `Event` row and ask the host to index the new contract
    pub fn handle_event_created<T: EntityTxn>(
        &self,
        txn: &mut T,
        log: &ChainLog,
        created: &EventCreated,
    ) -> Result<ApplyOutcome> {
        let id = event_id(created.event_contract);
        // Registration is idempotent at the host, so it is emitted even for a
        // duplicate: a replay must leave the host subscribed.
        let effects = vec![HostEffect::RegisterSource(DataSource {
            address: created.event_contract,
            registered_at: log.position(),
        })];

        if txn.get_event(&id)?.is_some() {
            tracing::warn!(
                "EventCreated for existing event {} at {}; keeping existing row",
                id,
                log.position()
            );
            return Ok(ApplyOutcome::Skipped {
                reason: SkipReason::DuplicateEvent,
                effects,
            });
        }

        // Zero unless mints for this contract reached us before its creation
        let already_minted = txn.count_tickets_for_event(&id)?;
        if already_minted > 0 {
            tracing::warn!(
                "Event {} created after {} of its tickets were recorded",
                id,
                already_minted
            );
        }

        let event = Event {
            id,
            organizer: created.organizer,
            metadata_cid: created.metadata_cid.clone(),
            ticket_price: created.ticket_price,
            ticket_supply: created.ticket_supply,
            total_tickets_sold: U256::from(already_minted),
            created_at_timestamp: log.block.timestamp,
            created_at_block_number: log.block.number,
        };
        txn.put_event(&event)?;

        tracing::debug!(
            "Created event {} (organizer {}, supply {})",
            event.id,
            event.organizer,
            event.ticket_supply
        );

        Ok(ApplyOutcome::Applied { effects })
    }

    /// Mint a ticket or move it to its new owner
    pub fn handle_transfer<T: EntityTxn>(
        &self,
        txn: &mut T,
        log: &ChainLog,
        transfer: &Transfer,
    ) -> Result<ApplyOutcome> {
        let id = ticket_id(log.address, transfer.token_id);

        if transfer.is_mint() {
            return self.mint(txn, log, transfer, id);
        }

        let Some(mut ticket) = txn.get_ticket(&id)? else {
            tracing::warn!(
                "Transfer of untracked ticket {} at {}; skipping",
                id,
                log.position()
            );
            return Ok(ApplyOutcome::skipped(SkipReason::UnknownTicket));
        };

        if log.position() <= ticket.last_transfer {
            tracing::debug!(
                "Transfer of {} at {} already applied (last transfer {})",
                id,
                log.position(),
                ticket.last_transfer
            );
            return Ok(ApplyOutcome::skipped(SkipReason::StaleTransfer));
        }

        if ticket.owner != transfer.from {
            tracing::warn!(
                "Transfer of {} from {} but recorded owner is {}",
                id,
                transfer.from,
                ticket.owner
            );
        }
        if transfer.to == Address::ZERO {
            tracing::warn!("Ticket {} transferred to the zero address", id);
        }

        ticket.owner = transfer.to;
        ticket.last_transfer = log.position();
        txn.put_ticket(&ticket)?;

        Ok(ApplyOutcome::applied())
    }

    fn mint<T: EntityTxn>(
        &self,
        txn: &mut T,
        log: &ChainLog,
        transfer: &Transfer,
        id: String,
    ) -> Result<ApplyOutcome> {
        if txn.get_ticket(&id)?.is_some() {
            tracing::debug!("Mint of {} already applied; skipping", id);
            return Ok(ApplyOutcome::skipped(SkipReason::DuplicateMint));
        }

        let parent = event_id(log.address);
        let ticket = Ticket {
            id,
            token_id: transfer.token_id,
            owner: transfer.to,
            event: parent.clone(),
            is_checked_in: false,
            minted_at_timestamp: log.block.timestamp,
            minted_at_block_number: log.block.number,
            check_in_timestamp: None,
            last_transfer: log.position(),
        };
        txn.put_ticket(&ticket)?;

        match txn.get_event(&parent)? {
            Some(mut event) => {
                event.total_tickets_sold = event.total_tickets_sold.saturating_add(U256::from(1));
                txn.put_event(&event)?;
            }
            None => {
                tracing::warn!(
                    "Minted ticket {} for unknown event {}; sold counter not updated",
                    ticket.id,
                    parent
                );
            }
        }

        tracing::debug!("Minted ticket {} to {}", ticket.id, ticket.owner);
        Ok(ApplyOutcome::applied())
    }

    /// Mark a ticket as checked in
    pub fn handle_ticket_checked_in<T: EntityTxn>(
        &self,
        txn: &mut T,
        log: &ChainLog,
        checked_in: &TicketCheckedIn,
    ) -> Result<ApplyOutcome> {
        let id = ticket_id(log.address, checked_in.token_id);

        let Some(mut ticket) = txn.get_ticket(&id)? else {
            tracing::warn!(
                "Check-in of untracked ticket {} at {}; skipping",
                id,
                log.position()
            );
            return Ok(ApplyOutcome::skipped(SkipReason::UnknownTicket));
        };

        if ticket.is_checked_in {
            tracing::debug!("Ticket {} already checked in", id);
            return Ok(ApplyOutcome::skipped(SkipReason::AlreadyCheckedIn));
        }

        ticket.is_checked_in = true;
        ticket.check_in_timestamp = Some(log.block.timestamp);
        txn.put_ticket(&ticket)?;

        Ok(ApplyOutcome::applied())
    }
}
