// src/types.rs

use std::fmt;

/// Signals the supervisor knows how to deliver to a child.
///
/// On Unix each variant maps onto the matching POSIX signal. Elsewhere only
/// `Kill` (and `Terminate`, which degrades to a kill) can be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Hangup,
    Interrupt,
    Quit,
    Kill,
    User1,
    User2,
    Terminate,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Hangup => "SIGHUP",
            Signal::Interrupt => "SIGINT",
            Signal::Quit => "SIGQUIT",
            Signal::Kill => "SIGKILL",
            Signal::User1 => "SIGUSR1",
            Signal::User2 => "SIGUSR2",
            Signal::Terminate => "SIGTERM",
        }
    }

    #[cfg(unix)]
    pub(crate) fn to_nix(self) -> nix::sys::signal::Signal {
        use nix::sys::signal::Signal as Nix;
        match self {
            Signal::Hangup => Nix::SIGHUP,
            Signal::Interrupt => Nix::SIGINT,
            Signal::Quit => Nix::SIGQUIT,
            Signal::Kill => Nix::SIGKILL,
            Signal::User1 => Nix::SIGUSR1,
            Signal::User2 => Nix::SIGUSR2,
            Signal::Terminate => Nix::SIGTERM,
        }
    }

    /// Raw signal number as reported by `ExitStatusExt::signal`.
    #[cfg(unix)]
    pub(crate) fn number(self) -> i32 {
        self.to_nix() as i32
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
