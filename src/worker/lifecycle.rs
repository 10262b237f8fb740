//! Lifecycle events, messages and host signals

use crate::request::{Request, Response};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;

/// Events delivered by the hosting runtime
#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    Install,
    Activate,
    Fetch(Request),
    Message(WorkerMessage),
}

/// Command messages posted by application pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerMessage {
    /// Activate a waiting update without waiting for clients to close
    SkipWaiting,
    /// Fill the content cache with every resource not yet stored
    DownloadOffline,
}

impl WorkerMessage {
    /// Wire name of the message
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SkipWaiting => "skipWaiting",
            Self::DownloadOffline => "downloadOffline",
        }
    }
}

impl FromStr for WorkerMessage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "skipWaiting" => Ok(Self::SkipWaiting),
            "downloadOffline" => Ok(Self::DownloadOffline),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for WorkerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Worker lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    /// Install failed; this instance will never control clients
    Redundant,
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Parsed => "parsed",
            Self::Installing => "installing",
            Self::Installed => "installed",
            Self::Activating => "activating",
            Self::Activated => "activated",
            Self::Redundant => "redundant",
        };
        write!(f, "{}", name)
    }
}

/// Phase holder doubling as the fetch readiness gate
///
/// Intercepted fetches wait in [`ActivationGate::wait`] until the phase
/// reaches [`LifecyclePhase::Activated`] or the worker turns
/// [`LifecyclePhase::Redundant`].
#[derive(Debug)]
pub struct ActivationGate {
    phase: watch::Sender<LifecyclePhase>,
}

impl ActivationGate {
    pub fn new() -> Self {
        let (phase, _) = watch::channel(LifecyclePhase::Parsed);
        Self { phase }
    }

    pub fn phase(&self) -> LifecyclePhase {
        *self.phase.borrow()
    }

    pub fn set(&self, phase: LifecyclePhase) {
        self.phase.send_replace(phase);
    }

    pub fn is_open(&self) -> bool {
        self.phase() == LifecyclePhase::Activated
    }

    /// Wait until activation has completed or install has failed
    ///
    /// Returns the phase that released the wait.
    pub async fn wait(&self) -> LifecyclePhase {
        let mut rx = self.phase.subscribe();
        // The sender lives in self, so the channel cannot close while we wait
        let released = match rx
            .wait_for(|phase| {
                matches!(phase, LifecyclePhase::Activated | LifecyclePhase::Redundant)
            })
            .await
        {
            Ok(phase) => *phase,
            Err(_) => self.phase(),
        };
        released
    }
}

impl Default for ActivationGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Requests the synchronizer makes of the hosting runtime
#[derive(Debug, Default)]
pub struct HostSignals {
    skip_waiting: AtomicBool,
    clients_claimed: AtomicBool,
}

impl HostSignals {
    pub fn request_skip_waiting(&self) {
        self.skip_waiting.store(true, Ordering::SeqCst);
    }

    pub fn claim_clients(&self) {
        self.clients_claimed.store(true, Ordering::SeqCst);
    }

    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    pub fn clients_claimed(&self) -> bool {
        self.clients_claimed.load(Ordering::SeqCst)
    }
}

/// Where an intercepted response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Network,
    Cache,
}

impl fmt::Display for ResponseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::Cache => write!(f, "cache"),
        }
    }
}

/// Result of fetch interception
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Not handled; the host applies default network handling
    Passthrough,
    Respond {
        response: Response,
        source: ResponseSource,
    },
}

/// Result of an activation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationOutcome {
    /// No stored manifest: content cache rebuilt from staged core resources
    Fresh { promoted: usize },
    /// Stored manifest found: stale entries pruned, staged entries promoted
    Upgraded {
        pruned: Vec<String>,
        retained: usize,
        promoted: usize,
    },
    /// Activation failed and every cache was deleted
    Reset { reason: String },
}

/// Result of a handled message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    SkipWaiting,
    DownloadedOffline { fetched: Vec<String> },
}

/// Result of a dispatched lifecycle event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Installed { staged: usize },
    Activated(ActivationOutcome),
    Fetched(FetchOutcome),
    Message(MessageOutcome),
}
