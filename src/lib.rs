//! Light/dark theme resolution for the admissions portal.
//!
//! The [`ThemeResolver`] combines a persisted [`Preference`] with the OS
//! color-scheme signal, applies the result to a [`Document`] and notifies
//! subscribers with a [`ThemeChange`].

pub mod config;
pub mod document;
pub mod event;
pub mod events;
pub mod logging;
pub mod resolver;
pub mod storage;
pub mod theme;
mod time;
pub mod watch;

pub use config::{Config, ThemeColors};
pub use document::{Document, Element};
pub use events::{CHANGE_EVENT, ListenerId, ThemeChange};
pub use resolver::ThemeResolver;
pub use storage::{MemoryStore, PreferenceStore, SqliteStore, StorageError};
pub use theme::{EffectiveTheme, InvalidPreference, Preference, SignalProbe, SignalSource};
