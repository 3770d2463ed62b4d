//! Logical channels sampled by the collector.
//!
//! Each channel is one monitored station: its streams, show metadata, and
//! now-playing track occupy a fixed column family in the analytics table.

/// One independently polled station
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Primary station
    Main,
    /// Secondary station
    Second,
    /// Comparison station (different operator, used as a baseline)
    Comparison,
}

impl Channel {
    /// All channels, in persistence order
    pub const ALL: [Channel; 3] = [Channel::Main, Channel::Second, Channel::Comparison];

    /// Column holding this channel's recorded artist
    pub fn artist_column(&self) -> &'static str {
        match self {
            Channel::Main => "main_artist",
            Channel::Second => "second_artist",
            Channel::Comparison => "comparison_artist",
        }
    }

    /// Column holding this channel's recorded song
    pub fn song_column(&self) -> &'static str {
        match self {
            Channel::Main => "main_song",
            Channel::Second => "second_song",
            Channel::Comparison => "comparison_song",
        }
    }

    /// Short name for logging
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Main => "main",
            Channel::Second => "second",
            Channel::Comparison => "comparison",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
