//! Change notifications emitted by the resolver.

use serde::Serialize;

use crate::theme::{EffectiveTheme, Preference};

/// Name of the change event, as seen by toggle UI and `watch` output.
pub const CHANGE_EVENT: &str = "theme-change";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeChange {
    pub preference: Preference,
    pub effective_theme: EffectiveTheme,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub type Listener = Box<dyn FnMut(&ThemeChange) + Send>;

/// Subscribers to [`CHANGE_EVENT`], called in subscription order.
#[derive(Default)]
pub struct Listeners {
    next_id: u64,
    entries: Vec<(ListenerId, Listener)>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    /// Returns false if the id was not subscribed.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    pub fn emit(&mut self, change: &ThemeChange) {
        for (_, listener) in &mut self.entries {
            listener(change);
        }
    }
}
