//! Discovery bookkeeping and the notification queue announcing new elements.

use std::collections::{HashSet, VecDeque};

use alchemy_core::{
    Element, ElementName, IconKey, NotificationSnapshot, TickProgress, DISCOVERY_TITLE,
    NOTIFICATION_TICKS,
};

/// Append-only set of learned elements that remembers learn order.
#[derive(Debug, Default)]
pub(crate) struct Discovery {
    learned: HashSet<ElementName>,
    order: Vec<ElementName>,
}

impl Discovery {
    /// Inserts the element, reporting whether it was previously unknown.
    pub(crate) fn insert(&mut self, element: &ElementName) -> bool {
        if !self.learned.insert(element.clone()) {
            return false;
        }
        self.order.push(element.clone());
        true
    }

    pub(crate) fn contains(&self, element: &ElementName) -> bool {
        self.learned.contains(element)
    }

    pub(crate) fn in_learn_order(&self) -> &[ElementName] {
        &self.order
    }
}

/// Toast announcing a newly learned element.
#[derive(Clone, Debug)]
pub(crate) struct Notification {
    element: ElementName,
    icon: IconKey,
    message: String,
    progress: TickProgress,
}

impl Notification {
    pub(crate) fn discovered(element: &Element) -> Self {
        Self {
            element: element.name().clone(),
            icon: element.icon().clone(),
            message: format!("{}!", element.name()),
            progress: TickProgress::start(NOTIFICATION_TICKS),
        }
    }

    /// A notification is dead once its elapsed ticks reach the lifetime.
    pub(crate) fn is_dead(&self) -> bool {
        self.progress.is_complete()
    }

    pub(crate) fn element(&self) -> &ElementName {
        &self.element
    }

    pub(crate) fn snapshot(&self) -> NotificationSnapshot {
        NotificationSnapshot {
            title: DISCOVERY_TITLE.to_owned(),
            message: self.message.clone(),
            element: self.element.clone(),
            icon: self.icon.clone(),
            progress: self.progress,
        }
    }
}

/// FIFO queue of notifications; only the head ever advances.
#[derive(Debug, Default)]
pub(crate) struct NotificationQueue {
    pending: VecDeque<Notification>,
}

impl NotificationQueue {
    pub(crate) fn push(&mut self, notification: Notification) {
        self.pending.push_back(notification);
    }

    /// Advances the head by one tick and pops it once dead.
    pub(crate) fn advance_head(&mut self) -> Option<Notification> {
        let head = self.pending.front_mut()?;
        head.progress.advance();
        if head.is_dead() {
            return self.pending.pop_front();
        }
        None
    }

    pub(crate) fn head(&self) -> Option<&Notification> {
        self.pending.front()
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }
}
