//! Mutation event bus
//!
//! Node widgets are rendered in isolation and never hold the graph. They
//! publish typed intents here; the editor session subscribes and applies them
//! in dispatch order on its own thread.

use crate::nodes::{NodeFields, NodeId, Shape};
use log::{debug, trace, warn};
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// A model mutation requested from outside the editor
#[derive(Debug, Clone, PartialEq)]
pub enum GraphIntent {
    DeleteNode { node_id: NodeId },
    ChangeNodeShape { node_id: NodeId, new_shape: Shape },
    UpdateNodeData { node_id: NodeId, fields: NodeFields },
}

impl GraphIntent {
    /// Node the intent targets
    pub fn node_id(&self) -> &str {
        match self {
            GraphIntent::DeleteNode { node_id }
            | GraphIntent::ChangeNodeShape { node_id, .. }
            | GraphIntent::UpdateNodeData { node_id, .. } => node_id,
        }
    }
}

type SubscriberList = Vec<(u64, flume::Sender<GraphIntent>)>;

static GLOBAL_BUS: Lazy<MutationBus> = Lazy::new(MutationBus::new);

/// Publish/subscribe channel for graph intents; clones share subscribers
#[derive(Debug, Clone, Default)]
pub struct MutationBus {
    subscribers: Arc<Mutex<SubscriberList>>,
    next_id: Arc<AtomicU64>,
}

impl MutationBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide bus shared by every widget
    pub fn global() -> &'static MutationBus {
        &GLOBAL_BUS
    }

    /// Lock the subscriber list, recovering it if a holder panicked
    fn subscribers(&self) -> MutexGuard<'_, SubscriberList> {
        self.subscribers.lock().unwrap_or_else(|poisoned| {
            warn!("Bus subscriber list was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Start receiving intents; ends when the subscription is dropped
    pub fn subscribe(&self) -> Subscription {
        let (sender, receiver) = flume::unbounded();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers().push((id, sender));
        debug!("Bus subscriber {} attached", id);
        Subscription {
            id,
            receiver,
            bus: self.clone(),
        }
    }

    fn unsubscribe(&self, id: u64) {
        self.subscribers().retain(|(sid, _)| *sid != id);
        debug!("Bus subscriber {} detached", id);
    }

    /// Deliver an intent to every live subscriber; returns the delivery count
    pub fn publish(&self, intent: GraphIntent) -> usize {
        let mut subscribers = self.subscribers();
        subscribers.retain(|(_, sender)| !sender.is_disconnected());
        let mut delivered = 0;
        for (_, sender) in subscribers.iter() {
            if sender.send(intent.clone()).is_ok() {
                delivered += 1;
            }
        }
        trace!("Published {:?} to {} subscriber(s)", intent, delivered);
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers().len()
    }
}

/// Receiving end of a bus subscription
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    receiver: flume::Receiver<GraphIntent>,
    bus: MutationBus,
}

impl Subscription {
    /// Next pending intent, if any
    pub fn try_next(&self) -> Option<GraphIntent> {
        self.receiver.try_recv().ok()
    }

    /// All pending intents in dispatch order
    pub fn drain(&self) -> Vec<GraphIntent> {
        self.receiver.try_iter().collect()
    }

    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// End the subscription explicitly
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.bus.unsubscribe(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delete(id: &str) -> GraphIntent {
        GraphIntent::DeleteNode { node_id: id.to_string() }
    }

    #[test]
    fn test_delivery_in_dispatch_order() {
        let bus = MutationBus::new();
        let sub = bus.subscribe();
        bus.publish(delete("a"));
        bus.publish(GraphIntent::ChangeNodeShape {
            node_id: "b".into(),
            new_shape: Shape::Circle,
        });
        bus.publish(GraphIntent::UpdateNodeData {
            node_id: "c".into(),
            fields: NodeFields::label("x"),
        });

        let ids: Vec<_> = sub.drain().iter().map(|i| i.node_id().to_string()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(sub.try_next().is_none());
    }

    #[test]
    fn test_every_subscriber_gets_one_copy() {
        let bus = MutationBus::new();
        let first = bus.subscribe();
        let second = bus.clone().subscribe();
        assert_eq!(bus.publish(delete("n")), 2);
        assert_eq!(first.drain(), vec![delete("n")]);
        assert_eq!(second.drain(), vec![delete("n")]);
        assert_eq!(first.pending(), 0);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let bus = MutationBus::new();
        let sub = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);
        sub.unsubscribe();
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.publish(delete("n")), 0);
    }

    #[test]
    fn test_publish_without_subscribers() {
        assert_eq!(MutationBus::new().publish(delete("n")), 0);
    }

    #[test]
    fn test_bus_survives_poisoned_lock() {
        let bus = MutationBus::new();
        let poisoner = bus.clone();
        let result = std::thread::spawn(move || {
            let _guard = poisoner.subscribers.lock().unwrap();
            panic!("widget crashed while holding the bus");
        })
        .join();
        assert!(result.is_err());
        assert!(bus.subscribers.is_poisoned());

        let sub = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(bus.publish(delete("a")), 1);
        assert_eq!(sub.try_next(), Some(delete("a")));
        drop(sub);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
