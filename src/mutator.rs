//! Local-first mutation of module and assignment lists.
//!
//! Every attempt moves through `IDLE -> APPLIED_LOCALLY -> {CONFIRMED, ROLLED_BACK}`:
//! [`OptimisticMutator::begin_toggle`], [`OptimisticMutator::begin_move`] and
//! [`OptimisticMutator::begin_delete`] apply the change synchronously and hand back a
//! [`Pending`] ticket; [`OptimisticMutator::settle`] consumes the ticket together with the
//! backend's reply. The async helpers (`toggle_publish`, `move_item`, `remove`) do both around
//! a single [`Remote`] call.
//!
//! The mutator keeps two lists. The confirmed list only ever changes when the backend accepts
//! something. The visible list is the confirmed list with every unsettled change replayed on
//! top, in ticket order, so a failure simply drops its change and the rest are re-applied.
//!
//! Attempts are sequenced per entity (and per list, for reorders). A settlement for a ticket
//! that has since been overtaken by a newer attempt on the same target is
//! [`Settlement::Superseded`]. A successful superseded reply still updates the confirmed list
//! unless a newer reply for the same target was already accepted.

use std::{
    collections::{BTreeMap, HashMap},
    marker::PhantomData,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{
    error::{MutationError, RemoteError},
    models::{Assignment, Module, OrderEntry},
};

/// Entity
///
/// What the mutator needs from a list member.
pub trait Entity: Clone + PartialEq + Send + Sync {
    fn id(&self) -> &str;
    fn is_published(&self) -> bool;
    fn set_published(&mut self, published: bool);
    fn order(&self) -> i32;
    fn set_order(&mut self, order: i32);
}

impl Entity for Module {
    fn id(&self) -> &str {
        &self.id
    }
    fn is_published(&self) -> bool {
        self.is_published
    }
    fn set_published(&mut self, published: bool) {
        self.is_published = published;
    }
    fn order(&self) -> i32 {
        self.order
    }
    fn set_order(&mut self, order: i32) {
        self.order = order;
    }
}

impl Entity for Assignment {
    fn id(&self) -> &str {
        &self.id
    }
    fn is_published(&self) -> bool {
        self.is_published
    }
    fn set_published(&mut self, published: bool) {
        self.is_published = published;
    }
    fn order(&self) -> i32 {
        self.order
    }
    fn set_order(&mut self, order: i32) {
        self.order = order;
    }
}

/// Remote
///
/// The backend half of each mutation. Implementations must not retry.
#[async_trait]
pub trait Remote<T>: Send + Sync {
    /// Sets the publish flag and returns the server's copy of the entity.
    async fn publish(&self, id: &str, is_published: bool) -> Result<T, RemoteError>;
    async fn delete(&self, id: &str) -> Result<(), RemoteError>;
    /// Submits a complete reordering and returns the server's list.
    async fn reorder(&self, batch: &[OrderEntry]) -> Result<Vec<T>, RemoteError>;
}

/// Direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Direction {
    Up,
    Down,
}

/// Reply
///
/// A successful backend answer, shaped by the kind of mutation it answers.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply<T> {
    Entity(T),
    Deleted,
    Reordered(Vec<T>),
}

/// Settlement
///
/// How an attempt ended. Serialized into mutation responses as `{"status": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(tag = "status", rename_all = "camelCase")]
#[ts(export)]
pub enum Settlement {
    /// The backend accepted the change. `reconciled` is true when its reply differed from the
    /// optimistic value and overwrote it.
    Confirmed { reconciled: bool },
    /// The backend call failed and the local change was reverted.
    RolledBack { message: String },
    /// A newer attempt on the same target was issued before this one settled.
    Superseded,
}

#[derive(Debug, Clone)]
enum Change {
    Toggle { id: String, requested: bool },
    Delete { id: String },
    Reorder { batch: Vec<OrderEntry> },
}

/// Pending
///
/// An attempt in the `APPLIED_LOCALLY` state. Must be handed back to
/// [`OptimisticMutator::settle`] exactly once.
#[derive(Debug)]
#[must_use = "a pending mutation must be settled"]
pub struct Pending<T> {
    ticket: u64,
    change: Change,
    entity: PhantomData<fn() -> T>,
}

impl<T> Pending<T> {
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    /// The publish flag to send, for toggle attempts.
    pub fn requested_published(&self) -> Option<bool> {
        match &self.change {
            Change::Toggle { requested, .. } => Some(*requested),
            _ => None,
        }
    }

    /// The complete reordering to send, for move attempts.
    pub fn batch(&self) -> Option<&[OrderEntry]> {
        match &self.change {
            Change::Reorder { batch } => Some(batch.as_slice()),
            _ => None,
        }
    }
}

/// OptimisticMutator
///
/// Exclusively owns one fetched list. Items are kept sorted by `order`.
#[derive(Debug, Clone)]
pub struct OptimisticMutator<T> {
    confirmed: Vec<T>,
    items: Vec<T>,
    outstanding: BTreeMap<u64, Change>,
    next_ticket: u64,
    // Latest ticket issued, and latest ticket whose success was accepted, per target.
    issued_by_entity: HashMap<String, u64>,
    issued_reorder: u64,
    accepted_by_entity: HashMap<String, u64>,
    accepted_reorder: u64,
}

/// The order values a reordered list is renumbered with: the list's own values when they are
/// strictly increasing, otherwise `0..n`.
fn order_slots<T: Entity>(items: &[T]) -> Vec<i32> {
    let existing: Vec<i32> = items.iter().map(Entity::order).collect();
    if existing.windows(2).all(|pair| pair[0] < pair[1]) {
        existing
    } else {
        (0..items.len() as i32).collect()
    }
}

/// Assigns the batch's order values to the members it names and re-sorts. Members missing
/// from the batch keep their value.
fn apply_batch<T: Entity>(items: &mut [T], batch: &[OrderEntry]) {
    let orders: HashMap<&str, i32> = batch
        .iter()
        .map(|entry| (entry.id.as_str(), entry.order))
        .collect();
    for item in items.iter_mut() {
        if let Some(order) = orders.get(item.id()) {
            item.set_order(*order);
        }
    }
    items.sort_by_key(Entity::order);
}

impl<T: Entity> OptimisticMutator<T> {
    pub fn new(mut items: Vec<T>) -> Self {
        items.sort_by_key(Entity::order);
        Self {
            confirmed: items.clone(),
            items,
            outstanding: BTreeMap::new(),
            next_ticket: 0,
            issued_by_entity: HashMap::new(),
            issued_reorder: 0,
            accepted_by_entity: HashMap::new(),
            accepted_reorder: 0,
        }
    }

    /// The current local view, including any optimistic changes.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// The list as last accepted by the backend, without unsettled changes.
    pub fn confirmed(&self) -> &[T] {
        &self.confirmed
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Number of attempts applied locally but not yet settled.
    pub fn in_flight(&self) -> usize {
        self.outstanding.len()
    }

    pub fn is_idle(&self) -> bool {
        self.outstanding.is_empty()
    }

    fn position(&self, id: &str) -> Result<usize, MutationError> {
        self.items
            .iter()
            .position(|item| item.id() == id)
            .ok_or_else(|| MutationError::UnknownEntity(id.to_string()))
    }

    fn issue(&mut self, change: Change) -> Pending<T> {
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        match &change {
            Change::Toggle { id, .. } | Change::Delete { id } => {
                self.issued_by_entity.insert(id.clone(), ticket);
            }
            Change::Reorder { .. } => self.issued_reorder = ticket,
        }
        self.outstanding.insert(ticket, change.clone());
        self.replay();
        Pending {
            ticket,
            change,
            entity: PhantomData,
        }
    }

    /// Rebuilds the visible list: the confirmed list with every outstanding change applied in
    /// ticket order. A change older than an accepted reply for the same target is skipped.
    fn replay(&mut self) {
        let mut items = self.confirmed.clone();
        for (ticket, change) in &self.outstanding {
            match change {
                Change::Toggle { id, requested } => {
                    if self.accepted_by_entity.get(id).is_some_and(|accepted| accepted > ticket) {
                        continue;
                    }
                    if let Some(item) = items.iter_mut().find(|item| item.id() == id.as_str()) {
                        item.set_published(*requested);
                    }
                }
                Change::Delete { id } => items.retain(|item| item.id() != id.as_str()),
                Change::Reorder { batch } => {
                    if self.accepted_reorder > *ticket {
                        continue;
                    }
                    apply_batch(&mut items, batch);
                }
            }
        }
        self.items = items;
    }

    /// Flips `isPublished` on one entity.
    pub fn begin_toggle(&mut self, id: &str) -> Result<Pending<T>, MutationError> {
        let index = self.position(id)?;
        let requested = !self.items[index].is_published();

        let pending = self.issue(Change::Toggle {
            id: id.to_string(),
            requested,
        });
        tracing::debug!(ticket = pending.ticket, id, published = requested, "toggle applied locally");
        Ok(pending)
    }

    /// Removes one entity.
    pub fn begin_delete(&mut self, id: &str) -> Result<Pending<T>, MutationError> {
        let index = self.position(id)?;

        let pending = self.issue(Change::Delete { id: id.to_string() });
        tracing::debug!(ticket = pending.ticket, id, index, "delete applied locally");
        Ok(pending)
    }

    /// Swaps an entity with its neighbour and renumbers the whole list.
    pub fn begin_move(&mut self, id: &str, direction: Direction) -> Result<Pending<T>, MutationError> {
        let index = self.position(id)?;
        let neighbour = match direction {
            Direction::Up => index.checked_sub(1),
            Direction::Down => Some(index + 1).filter(|next| *next < self.items.len()),
        }
        .ok_or_else(|| MutationError::OutOfBounds(id.to_string()))?;

        let slots = order_slots(&self.items);
        let mut ids: Vec<String> = self.items.iter().map(|item| item.id().to_string()).collect();
        ids.swap(index, neighbour);
        let batch = ids
            .into_iter()
            .zip(slots)
            .map(|(id, order)| OrderEntry { id, order })
            .collect();

        let pending = self.issue(Change::Reorder { batch });
        tracing::debug!(ticket = pending.ticket, id, ?direction, "reorder applied locally");
        Ok(pending)
    }

    fn is_stale(&self, ticket: u64, change: &Change) -> bool {
        let latest = match change {
            Change::Toggle { id, .. } | Change::Delete { id } => {
                self.issued_by_entity.get(id).copied()
            }
            Change::Reorder { .. } => Some(self.issued_reorder),
        };
        latest.is_some_and(|latest| latest > ticket)
    }

    fn accept_entity(&mut self, ticket: u64, id: &str, mut server: T) {
        if self.accepted_by_entity.get(id).is_some_and(|accepted| *accepted > ticket) {
            return;
        }
        let Some(local) = self.confirmed.iter_mut().find(|item| item.id() == id) else {
            return;
        };
        // A reorder accepted after this attempt was issued owns the position.
        if self.accepted_reorder > ticket {
            server.set_order(local.order());
        }
        *local = server;
        self.accepted_by_entity.insert(id.to_string(), ticket);
        self.confirmed.sort_by_key(Entity::order);
    }

    fn accept_reorder(&mut self, ticket: u64, batch: &[OrderEntry], server: Vec<T>) {
        if self.accepted_reorder > ticket {
            return;
        }
        // Only positions are taken from the reply; membership and other fields stay with the
        // confirmed list. An empty reply carries no authoritative list.
        if server.is_empty() {
            apply_batch(&mut self.confirmed, batch);
        } else {
            let orders: Vec<OrderEntry> = server
                .iter()
                .map(|item| OrderEntry {
                    id: item.id().to_string(),
                    order: item.order(),
                })
                .collect();
            apply_batch(&mut self.confirmed, &orders);
        }
        self.accepted_reorder = ticket;
    }

    /// settle
    ///
    /// Applies the backend's verdict for one attempt. On success the server's copy is folded
    /// into the confirmed list; on failure the attempt's change is dropped. Either way the
    /// visible list is rebuilt from the confirmed list and the changes still outstanding.
    pub fn settle(&mut self, pending: Pending<T>, reply: Result<Reply<T>, RemoteError>) -> Settlement {
        let Pending { ticket, change, .. } = pending;
        self.outstanding.remove(&ticket);
        let stale = self.is_stale(ticket, &change);
        let before = self.items.clone();

        let outcome = match (&change, reply) {
            (Change::Toggle { id, .. }, Ok(Reply::Entity(server))) => {
                self.accept_entity(ticket, id, server);
                Ok(())
            }
            (Change::Delete { id }, Ok(Reply::Deleted)) => {
                self.confirmed.retain(|item| item.id() != id.as_str());
                Ok(())
            }
            (Change::Reorder { batch }, Ok(Reply::Reordered(server))) => {
                self.accept_reorder(ticket, batch, server);
                Ok(())
            }
            (_, Ok(_)) => Err(RemoteError::Malformed(
                "reply does not match the mutation".to_string(),
            )),
            (_, Err(e)) => Err(e),
        };
        self.replay();

        if stale {
            tracing::debug!(ticket, ok = outcome.is_ok(), "settlement superseded by a newer attempt");
            return Settlement::Superseded;
        }

        match outcome {
            Ok(()) => {
                let reconciled = before != self.items;
                tracing::info!(ticket, ?change, reconciled, "mutation confirmed");
                Settlement::Confirmed { reconciled }
            }
            Err(e) => {
                tracing::warn!(ticket, ?change, "mutation rolled back: {}", e);
                Settlement::RolledBack {
                    message: e.user_message(),
                }
            }
        }
    }

    /// Toggles `isPublished` and settles against `remote`.
    pub async fn toggle_publish<R>(&mut self, id: &str, remote: &R) -> Result<Settlement, MutationError>
    where
        R: Remote<T> + ?Sized,
    {
        let pending = self.begin_toggle(id)?;
        let requested = pending.requested_published().unwrap_or_default();
        let reply = remote.publish(id, requested).await.map(Reply::Entity);
        Ok(self.settle(pending, reply))
    }

    /// Moves an entity one slot and settles the complete reordering against `remote`.
    pub async fn move_item<R>(
        &mut self,
        id: &str,
        direction: Direction,
        remote: &R,
    ) -> Result<Settlement, MutationError>
    where
        R: Remote<T> + ?Sized,
    {
        let pending = self.begin_move(id, direction)?;
        let reply = remote
            .reorder(pending.batch().unwrap_or_default())
            .await
            .map(Reply::Reordered);
        Ok(self.settle(pending, reply))
    }

    /// Deletes an entity and settles against `remote`.
    pub async fn remove<R>(&mut self, id: &str, remote: &R) -> Result<Settlement, MutationError>
    where
        R: Remote<T> + ?Sized,
    {
        let pending = self.begin_delete(id)?;
        let reply = remote.delete(id).await.map(|()| Reply::Deleted);
        Ok(self.settle(pending, reply))
    }
}
