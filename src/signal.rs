//! Signals sent by `kill`.

use std::fmt;
use std::str::FromStr;

use nix::sys::signal::Signal;

/// Signal sent when none or an unknown name is requested.
pub const DEFAULT_SIGNAL: KillSignal = KillSignal::Named(Signal::SIGTERM);

/// A signal as it is handed to the runtime.
///
/// Numbers without a name in [`Signal`] (real-time signals such as `40`, or `0`) are kept as
/// given so the runtime receives exactly what was asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillSignal {
    Named(Signal),
    Number(i32),
}

impl KillSignal {
    /// The argument passed to `crun kill`: `SIGKILL` for named signals, the decimal code
    /// otherwise.
    pub fn to_arg(self) -> String {
        self.to_string()
    }
}

impl From<Signal> for KillSignal {
    fn from(signal: Signal) -> Self {
        Self::Named(signal)
    }
}

impl fmt::Display for KillSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(signal) => f.write_str(signal.as_str()),
            Self::Number(number) => write!(f, "{number}"),
        }
    }
}

/// Parses a signal given by name or number.
///
/// Names are case-insensitive and may omit the `SIG` prefix (`kill`, `SIGKILL` and `Kill` are
/// the same signal). A string of decimal digits is a signal number and is never replaced.
/// Unknown names fall back to [`DEFAULT_SIGNAL`].
pub fn parse_signal(raw: &str) -> KillSignal {
    let raw = raw.trim();
    let digits = !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit());
    if let Some(number) = raw.parse::<i32>().ok().filter(|_| digits) {
        return match Signal::try_from(number) {
            Ok(signal) => KillSignal::Named(signal),
            Err(_) => KillSignal::Number(number),
        };
    }

    let name = raw.to_ascii_uppercase();
    let parsed = if name.starts_with("SIG") {
        Signal::from_str(&name).ok()
    } else {
        Signal::from_str(&format!("SIG{name}")).ok()
    };

    match parsed {
        Some(signal) => KillSignal::Named(signal),
        None => {
            log::warn!("unknown signal `{raw}`, sending {DEFAULT_SIGNAL}");
            DEFAULT_SIGNAL
        }
    }
}
