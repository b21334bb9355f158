//! Intercept switches between panels and ask before leaving unsaved work.
//!
//! The core is [`NavigationGuard`]: panels implement [`Trackable`] (and
//! optionally [`Saveable`]), the guard subscribes to their lifecycle events,
//! and any activation that would leave a dirty panel goes through an
//! [`ExitPrompt`] first. The remaining modules make up a terminal host for the
//! guard, built on ratatui and crossterm.

pub mod components;
pub mod config;
pub mod desk;
pub mod drivers;
pub mod event_loop;
pub mod exit_request;
pub mod guard;
pub mod keybindings;
pub mod lifecycle;
pub mod log_buffer;
pub mod panels;
pub mod terminal_prompt;
pub mod theme;
pub mod tracing_sub;
pub mod trackable;
pub mod ui;

pub use config::{GuardConfig, SaveFailurePolicy};
pub use exit_request::{ExitPrompt, ExitRequest, ExitVerdict, PromptChoice, request_exit};
pub use guard::{ActivationOutcome, NavigationGuard};
pub use lifecycle::{LifecycleEvent, LifecycleEvents, SubscriptionId};
pub use trackable::{SaveError, Saveable, Trackable, TrackableRef, WeakTrackableRef};
