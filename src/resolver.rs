//! Theme resolution and persistence.
//!
//! [`ThemeResolver`] owns the stored preference, the last-known OS signal
//! and the document it applies the resulting theme to. Construct one at
//! startup and hand `&mut` access to whatever UI code needs it.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::ThemeColors;
use crate::document::Document;
use crate::events::{Listener, ListenerId, Listeners, ThemeChange};
use crate::storage::{PreferenceStore, StorageError};
use crate::theme::{EffectiveTheme, InvalidPreference, Preference, SignalProbe};
use crate::watch::SignalEvents;

pub const DEFAULT_STORAGE_KEY: &str = "theme";

pub struct ThemeResolver {
    store: Box<dyn PreferenceStore>,
    persistent: bool,
    storage_key: String,
    probe: Arc<dyn SignalProbe>,
    colors: ThemeColors,
    document: Document,
    listeners: Listeners,
    toggles: Vec<String>,
    preference: Preference,
    system_dark: bool,
}

impl ThemeResolver {
    pub fn new(
        store: Box<dyn PreferenceStore>,
        probe: Arc<dyn SignalProbe>,
        document: Document,
    ) -> Self {
        Self {
            store,
            persistent: true,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            probe,
            colors: ThemeColors::default(),
            document,
            listeners: Listeners::new(),
            toggles: Vec::new(),
            preference: Preference::default(),
            system_dark: false,
        }
    }

    #[must_use]
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    #[must_use]
    pub fn with_theme_colors(mut self, colors: ThemeColors) -> Self {
        self.colors = colors;
        self
    }

    /// Load the stored preference, read the OS signal, apply the result and
    /// wire every toggle element in the document.
    pub fn initialize(&mut self) -> EffectiveTheme {
        let stored = self.read_stored();
        self.preference = match stored.as_deref().map(str::parse::<Preference>) {
            Some(Ok(preference)) => preference,
            Some(Err(e)) => {
                warn!(error = %e, "ignoring stored theme preference");
                Preference::default()
            }
            None => Preference::default(),
        };

        match self.probe.prefers_dark() {
            Some(dark) => self.system_dark = dark,
            None => warn!(
                assumed_dark = self.system_dark,
                "system color scheme unavailable"
            ),
        }

        if stored.as_deref() != Some(self.preference.as_str()) {
            self.write_preference();
        }

        self.toggles = self.document.toggle_ids();
        debug!(toggles = self.toggles.len(), "wired theme toggles");

        let effective = self.apply_theme();
        info!(
            preference = %self.preference,
            system_dark = self.system_dark,
            effective = %effective,
            "theme initialized"
        );
        effective
    }

    /// Parse and store a preference supplied as text.
    pub fn set_preference(&mut self, value: &str) -> Result<ThemeChange, InvalidPreference> {
        let preference = value.parse::<Preference>()?;
        Ok(self.set(preference))
    }

    pub fn set(&mut self, preference: Preference) -> ThemeChange {
        self.preference = preference;
        self.write_preference();
        let effective = self.apply_theme();
        info!(preference = %preference, effective = %effective, "theme preference set");
        self.emit(effective)
    }

    pub fn cycle_preference(&mut self) -> ThemeChange {
        self.set(self.preference.next())
    }

    /// Record a new OS reading. Only has a visible effect in `auto` mode.
    pub fn on_system_signal_change(&mut self, prefers_dark: bool) -> Option<ThemeChange> {
        self.system_dark = prefers_dark;
        if self.preference != Preference::Auto {
            debug!(prefers_dark, preference = %self.preference, "system signal ignored");
            return None;
        }
        let effective = self.apply_theme();
        info!(effective = %effective, "system color scheme changed");
        Some(self.emit(effective))
    }

    /// Click handler for wired toggles. Unknown ids are ignored.
    pub fn activate_toggle(&mut self, element_id: &str) -> Option<ThemeChange> {
        if !self.toggles.iter().any(|id| id == element_id) {
            debug!(element_id, "not a wired theme toggle");
            return None;
        }
        Some(self.cycle_preference())
    }

    pub const fn effective_theme(&self) -> EffectiveTheme {
        self.preference.resolve(self.system_dark)
    }

    pub const fn preference(&self) -> Preference {
        self.preference
    }

    pub const fn system_prefers_dark(&self) -> bool {
        self.system_dark
    }

    /// False once storage has failed and the preference is session-only.
    pub const fn is_persistent(&self) -> bool {
        self.persistent
    }

    pub const fn document(&self) -> &Document {
        &self.document
    }

    pub fn subscribe(&mut self, listener: Listener) -> ListenerId {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Event source for OS signal changes, seeded with the current reading.
    pub fn signal_events(&self, poll_interval: Duration) -> SignalEvents {
        SignalEvents::new(Arc::clone(&self.probe), poll_interval, self.system_dark)
    }

    // The only place the presentation attribute is written.
    fn apply_theme(&mut self) -> EffectiveTheme {
        let effective = self.effective_theme();
        self.document.set_root_theme(effective);
        self.document
            .set_theme_color(self.colors.for_theme(effective));
        for id in &self.toggles {
            self.document.sync_toggle(id, self.preference, effective);
        }
        effective
    }

    fn emit(&mut self, effective: EffectiveTheme) -> ThemeChange {
        let change = ThemeChange {
            preference: self.preference,
            effective_theme: effective,
        };
        self.listeners.emit(&change);
        change
    }

    fn read_stored(&mut self) -> Option<String> {
        if !self.persistent {
            return None;
        }
        match self.store.get(&self.storage_key) {
            Ok(value) => value.map(|v| v.trim().to_string()),
            Err(e) => {
                self.degrade(&e);
                None
            }
        }
    }

    fn write_preference(&mut self) {
        if !self.persistent {
            return;
        }
        if let Err(e) = self.store.set(&self.storage_key, self.preference.as_str()) {
            self.degrade(&e);
        }
    }

    fn degrade(&mut self, error: &StorageError) {
        warn!(error = %error, "storage unavailable; theme preference is session-only");
        self.persistent = false;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;
    use crate::document::{Element, TOGGLE_ATTR, TOGGLE_STATE_ATTR};
    use crate::storage::MemoryStore;
    use crate::theme::FixedProbe;

    /// Store whose contents stay inspectable after the resolver takes it.
    #[derive(Clone, Default)]
    struct SharedStore(Arc<Mutex<HashMap<String, String>>>);

    impl SharedStore {
        fn with(key: &str, value: &str) -> Self {
            let store = Self::default();
            store.0.lock().unwrap().insert(key.into(), value.into());
            store
        }

        fn value(&self, key: &str) -> Option<String> {
            self.0.lock().unwrap().get(key).cloned()
        }
    }

    impl PreferenceStore for SharedStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            Ok(self.value(key))
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
            self.0.lock().unwrap().insert(key.into(), value.into());
            Ok(())
        }
    }

    /// Counts writes so skipped write-backs are observable.
    #[derive(Clone, Default)]
    struct CountingStore {
        inner: SharedStore,
        writes: Arc<Mutex<usize>>,
    }

    impl PreferenceStore for CountingStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
            *self.writes.lock().unwrap() += 1;
            self.inner.set(key, value)
        }
    }

    struct BrokenStore;

    impl PreferenceStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Io(std::io::Error::other("storage disabled")))
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Io(std::io::Error::other("quota exceeded")))
        }
    }

    struct SilentProbe;

    impl SignalProbe for SilentProbe {
        fn prefers_dark(&self) -> Option<bool> {
            None
        }
    }

    fn resolver(store: impl PreferenceStore + 'static, system_dark: bool) -> ThemeResolver {
        ThemeResolver::new(
            Box::new(store),
            Arc::new(FixedProbe(system_dark)),
            Document::new(),
        )
    }

    fn record(resolver: &mut ThemeResolver) -> Arc<Mutex<Vec<ThemeChange>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        resolver.subscribe(Box::new(move |change| sink.lock().unwrap().push(*change)));
        seen
    }

    #[test]
    fn initialize_without_stored_value_and_light_os_is_light() {
        let store = SharedStore::default();
        let mut r = resolver(store.clone(), false);

        assert_eq!(r.initialize(), EffectiveTheme::Light);
        assert_eq!(r.preference(), Preference::Auto);
        assert_eq!(r.document().theme(), Some("light"));
        assert_eq!(store.value("theme").as_deref(), Some("auto"));
    }

    #[test]
    fn initialize_follows_os_in_auto_mode() {
        let mut r = resolver(SharedStore::default(), true);
        assert_eq!(r.initialize(), EffectiveTheme::Dark);
        assert_eq!(r.document().theme(), Some("dark"));
    }

    #[test]
    fn initialize_uses_stored_preference() {
        let mut r = resolver(SharedStore::with("theme", "light"), true);
        assert_eq!(r.initialize(), EffectiveTheme::Light);
        assert_eq!(r.preference(), Preference::Light);
    }

    #[test]
    fn initialize_skips_write_back_of_unchanged_value() {
        let store = CountingStore {
            inner: SharedStore::with("theme", "dark"),
            ..CountingStore::default()
        };
        let mut r = resolver(store.clone(), false);

        assert_eq!(r.initialize(), EffectiveTheme::Dark);
        assert_eq!(*store.writes.lock().unwrap(), 0);
    }

    #[test]
    fn initialize_writes_back_default_once() {
        let store = CountingStore::default();
        let mut r = resolver(store.clone(), false);

        r.initialize();
        assert_eq!(*store.writes.lock().unwrap(), 1);
        assert_eq!(store.inner.value("theme").as_deref(), Some("auto"));
    }

    #[test]
    fn initialize_tolerates_whitespace_in_stored_value() {
        let store = CountingStore {
            inner: SharedStore::with("theme", "light\n"),
            ..CountingStore::default()
        };
        let mut r = resolver(store.clone(), true);

        assert_eq!(r.initialize(), EffectiveTheme::Light);
        assert_eq!(*store.writes.lock().unwrap(), 0);
    }

    #[test]
    fn set_preference_rejects_padded_value() {
        let store = SharedStore::with("theme", "light");
        let mut r = resolver(store.clone(), false);
        r.initialize();

        let err = r.set_preference(" dark\n").unwrap_err();

        assert_eq!(err, InvalidPreference(" dark\n".into()));
        assert_eq!(r.preference(), Preference::Light);
        assert_eq!(store.value("theme").as_deref(), Some("light"));
    }

    #[test]
    fn initialize_replaces_invalid_stored_value_with_auto() {
        let store = SharedStore::with("theme", "sepia");
        let mut r = resolver(store.clone(), false);

        assert_eq!(r.initialize(), EffectiveTheme::Light);
        assert_eq!(r.preference(), Preference::Auto);
        assert_eq!(store.value("theme").as_deref(), Some("auto"));
    }

    #[test]
    fn initialize_does_not_emit() {
        let mut r = resolver(SharedStore::default(), false);
        let seen = record(&mut r);
        r.initialize();
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn custom_storage_key_is_used() {
        let store = SharedStore::with("portal-theme", "dark");
        let mut r = resolver(store.clone(), false).with_storage_key("portal-theme");

        assert_eq!(r.initialize(), EffectiveTheme::Dark);
        assert_eq!(store.value("theme"), None);
    }

    #[test]
    fn set_preference_resolves_against_signal() {
        for signal in [false, true] {
            for pref in Preference::ALL {
                let mut r = resolver(MemoryStore::new(), signal);
                r.initialize();
                r.set_preference(pref.as_str()).unwrap();

                let expected = pref == Preference::Dark || (pref == Preference::Auto && signal);
                assert_eq!(r.effective_theme().is_dark(), expected, "{pref} / {signal}");
                assert_eq!(r.document().theme(), Some(r.effective_theme().as_str()));
            }
        }
    }

    #[test]
    fn set_preference_stores_and_emits() {
        let store = SharedStore::default();
        let mut r = resolver(store.clone(), false);
        r.initialize();
        let seen = record(&mut r);

        let change = r.set_preference("dark").unwrap();

        assert_eq!(
            change,
            ThemeChange {
                preference: Preference::Dark,
                effective_theme: EffectiveTheme::Dark,
            }
        );
        assert_eq!(*seen.lock().unwrap(), vec![change]);
        assert_eq!(store.value("theme").as_deref(), Some("dark"));
    }

    #[test]
    fn set_preference_rejects_unknown_value() {
        let store = SharedStore::with("theme", "dark");
        let mut r = resolver(store.clone(), false);
        r.initialize();
        let seen = record(&mut r);

        let err = r.set_preference("blue").unwrap_err();

        assert_eq!(err, InvalidPreference("blue".into()));
        assert_eq!(r.preference(), Preference::Dark);
        assert_eq!(store.value("theme").as_deref(), Some("dark"));
        assert_eq!(r.document().theme(), Some("dark"));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn cycle_three_times_returns_to_start() {
        let mut r = resolver(MemoryStore::new(), false);
        r.initialize();
        r.set(Preference::Light);

        let order: Vec<_> = (0..3).map(|_| r.cycle_preference().preference).collect();

        assert_eq!(order, vec![Preference::Dark, Preference::Auto, Preference::Light]);
        assert_eq!(r.preference(), Preference::Light);
    }

    #[test]
    fn signal_changes_in_auto_mode_emit_once_each() {
        let mut r = resolver(MemoryStore::new(), false);
        r.initialize();
        let seen = record(&mut r);

        let first = r.on_system_signal_change(true).unwrap();
        assert_eq!(first.effective_theme, EffectiveTheme::Dark);
        assert_eq!(r.effective_theme(), EffectiveTheme::Dark);

        let second = r.on_system_signal_change(false).unwrap();
        assert_eq!(second.effective_theme, EffectiveTheme::Light);
        assert_eq!(r.document().theme(), Some("light"));

        assert_eq!(*seen.lock().unwrap(), vec![first, second]);
    }

    #[test]
    fn signal_change_with_explicit_preference_is_silent() {
        let mut r = resolver(SharedStore::with("theme", "dark"), false);
        r.initialize();
        let seen = record(&mut r);

        assert_eq!(r.on_system_signal_change(true), None);
        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(r.document().theme(), Some("dark"));
        assert!(r.system_prefers_dark());
    }

    #[test]
    fn signal_recorded_while_explicit_applies_after_switching_to_auto() {
        let mut r = resolver(SharedStore::with("theme", "light"), false);
        r.initialize();
        r.on_system_signal_change(true);

        let change = r.set(Preference::Auto);
        assert_eq!(change.effective_theme, EffectiveTheme::Dark);
    }

    #[test]
    fn broken_storage_still_applies_theme() {
        let mut r = resolver(BrokenStore, true);

        assert_eq!(r.initialize(), EffectiveTheme::Dark);
        assert!(!r.is_persistent());

        let change = r.set_preference("light").unwrap();
        assert_eq!(change.effective_theme, EffectiveTheme::Light);
        assert_eq!(r.document().theme(), Some("light"));
    }

    #[test]
    fn missing_signal_keeps_last_known_value() {
        let mut r = ThemeResolver::new(
            Box::new(MemoryStore::new()),
            Arc::new(SilentProbe),
            Document::new(),
        );
        assert_eq!(r.initialize(), EffectiveTheme::Light);
        assert!(!r.system_prefers_dark());
    }

    #[test]
    fn theme_color_follows_effective_theme() {
        let colors = ThemeColors {
            light: "#fafafa".into(),
            dark: "#0b0b0b".into(),
        };
        let mut r = resolver(MemoryStore::new(), false).with_theme_colors(colors);

        r.initialize();
        assert_eq!(r.document().theme_color(), Some("#fafafa"));
        r.set(Preference::Dark);
        assert_eq!(r.document().theme_color(), Some("#0b0b0b"));
    }

    #[test]
    fn toggles_are_wired_and_cycle_on_activation() {
        let document = Document::new()
            .with_element(Element::new("nav-toggle").with_attr(TOGGLE_ATTR, ""))
            .with_element(Element::new("apply-button"));
        let mut r = ThemeResolver::new(
            Box::new(SharedStore::with("theme", "light")),
            Arc::new(FixedProbe(false)),
            document,
        );
        r.initialize();

        let toggle = r.document().element("nav-toggle").unwrap();
        assert_eq!(toggle.attr(TOGGLE_STATE_ATTR), Some("light"));
        assert_eq!(toggle.attr("aria-pressed"), Some("false"));

        let change = r.activate_toggle("nav-toggle").unwrap();
        assert_eq!(change.preference, Preference::Dark);
        let toggle = r.document().element("nav-toggle").unwrap();
        assert_eq!(toggle.attr(TOGGLE_STATE_ATTR), Some("dark"));
        assert_eq!(toggle.attr("aria-pressed"), Some("true"));

        assert_eq!(r.activate_toggle("apply-button"), None);
        assert!(r.document().element("apply-button").unwrap().attributes.is_empty());
        assert_eq!(r.preference(), Preference::Dark);
    }

    #[test]
    fn unsubscribed_listener_is_not_called() {
        let mut r = resolver(MemoryStore::new(), false);
        r.initialize();
        let seen = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&seen);
        let id = r.subscribe(Box::new(move |_| *sink.lock().unwrap() += 1));

        r.cycle_preference();
        assert!(r.unsubscribe(id));
        r.cycle_preference();

        assert_eq!(*seen.lock().unwrap(), 1);
    }
}
