//! Event handlers for the flagger moderation bot.
//!
//! [`ProxyRuntime`] runs the confirm-then-escalate workflow for proxy role
//! mentions, [`MenuRuntime`] drives the interactive configuration menu, and
//! [`EventRouter`] dispatches platform events between the two.

mod handler_failure;
mod last_ping;
mod menu_runtime;
mod proxy_runtime;
mod router;
mod services;
#[cfg(test)]
mod test_support;

pub use handler_failure::HandlerFailure;
pub use last_ping::LastPingLedger;
pub use menu_runtime::{
    describe_duration, CaptureOutcome, ConfigPage, MenuOutcome, MenuRuntime, MenuState,
    EDIT_PROMPT, NAVIGATION_SELECT_ID,
};
pub use proxy_runtime::{
    confirmation_prompt, EscalationOutcome, ProxyClickOutcome, ProxyMessageOutcome, ProxyRuntime,
    MOD_ROLE_NOT_FOUND,
};
pub use router::{ButtonRoute, EventRouter, MessageRoute};
pub use services::RuntimeServices;
