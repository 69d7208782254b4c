use std::fmt;

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnected => "disconnected",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bounded, fixed-interval reconnect allowance.
///
/// `attempts_made` never exceeds `max_attempts`; it only goes back to zero
/// through [`ReconnectBudget::reset`], which the connection calls once a
/// socket actually opens.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconnectBudget {
    attempts_made: u32,
    max_attempts: u32,
    interval_ms: u32,
}

impl ReconnectBudget {
    pub fn new(max_attempts: u32, interval_ms: u32) -> Self {
        Self {
            attempts_made: 0,
            max_attempts,
            interval_ms,
        }
    }

    /// Claims one attempt, or returns false once the budget is spent.
    pub fn try_consume(&mut self) -> bool {
        if self.attempts_made < self.max_attempts {
            self.attempts_made += 1;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.attempts_made = 0;
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempts_made >= self.max_attempts
    }

    pub fn attempts_made(&self) -> u32 {
        self.attempts_made
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn interval_ms(&self) -> u32 {
        self.interval_ms
    }
}
