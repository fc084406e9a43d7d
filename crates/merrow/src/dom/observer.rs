use super::{Document, NodeId};
use futures::channel::mpsc;

/// Identifies one attribute observer registered on a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// One attribute write seen by an observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub target: NodeId,
    pub attribute_name: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

impl MutationRecord {
    /// `false` when the write stored the value the attribute already had.
    pub fn changed_value(&self) -> bool {
        self.old_value != self.new_value
    }
}

/// Records are delivered in write order. The stream ends once the observer is disconnected.
pub type MutationReceiver = mpsc::UnboundedReceiver<MutationRecord>;

#[derive(Debug)]
pub(super) struct Registration {
    id: ObserverId,
    pub(super) target: NodeId,
    attribute_filter: Vec<String>,
    sender: mpsc::UnboundedSender<MutationRecord>,
}

impl Document {
    /// Watches attribute writes on `target` whose name is in `attribute_filter`.
    ///
    /// Every matching [`Document::set_attribute`] / [`Document::remove_attribute`] call queues a
    /// [`MutationRecord`] on the returned receiver, including writes that store an unchanged
    /// value (see [`MutationRecord::changed_value`]).
    pub fn observe_attributes(
        &mut self,
        target: NodeId,
        attribute_filter: &[&str],
    ) -> (ObserverId, MutationReceiver) {
        let (sender, receiver) = mpsc::unbounded();
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push(Registration {
            id,
            target,
            attribute_filter: attribute_filter.iter().map(|s| s.to_string()).collect(),
            sender,
        });
        (id, receiver)
    }

    /// Stops delivery for `id`. Records already queued can still be drained by the receiver.
    pub fn disconnect(&mut self, id: ObserverId) {
        self.observers.retain(|r| r.id != id);
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub(super) fn notify_attribute(
        &mut self,
        target: NodeId,
        name: &str,
        old_value: Option<String>,
        new_value: Option<String>,
    ) {
        if self.observers.is_empty() {
            return;
        }
        self.observers.retain(|reg| {
            if reg.target != target || !reg.attribute_filter.iter().any(|a| a == name) {
                return true;
            }
            let record = MutationRecord {
                target,
                attribute_name: name.to_string(),
                old_value: old_value.clone(),
                new_value: new_value.clone(),
            };
            // A dropped receiver means nobody is listening anymore.
            reg.sender.unbounded_send(record).is_ok()
        });
    }
}
