//! Worker lifecycle and the offline cache synchronizer
//!
//! The hosting runtime delivers [`LifecycleEvent`]s; [`Synchronizer::dispatch`]
//! routes each one to install, activate, fetch interception or message
//! handling.

mod lifecycle;
mod synchronizer;

pub use lifecycle::{
    ActivationGate, ActivationOutcome, EventOutcome, FetchOutcome, HostSignals, LifecycleEvent,
    LifecyclePhase, MessageOutcome, ResponseSource, WorkerMessage,
};
pub use synchronizer::{CacheReport, Synchronizer};
