#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// The OS color-scheme reading changed; `true` means dark.
    SignalChanged(bool),
    Interrupt,
}
