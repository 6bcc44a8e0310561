//! Engine-wide configuration (spec.md §9's open questions around
//! bookmarking and log-size policy, resolved as configurable toggles
//! rather than hardcoded behavior).

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Whether accepted regular ops also maintain a per-source `.bm&` peer
    /// bookmark. Off by default: bookmarking trades a write per accepted op
    /// for faster case-3 patch building on reconnect.
    pub bookmarking: bool,
    /// Advisory cap (in accepted ops per object) past which a caller may
    /// want to compact via a local `state` snapshot. The engine does not
    /// act on this itself -- see DESIGN.md's Open Question note.
    pub max_log_size: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig { bookmarking: false, max_log_size: 10 }
    }
}
