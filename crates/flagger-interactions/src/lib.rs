//! Interaction primitives shared by the proxy workflow and the config menus.
//!
//! Provides the component id codec, the platform-neutral message view model,
//! select pagination, delayed-task scheduling, expiring pending registries,
//! and the inbound event / outbound transport contract.

pub mod component_id;
pub mod contract;
pub mod pagination;
pub mod pending;
pub mod scheduler;
pub mod view;

pub use component_id::{
    ComponentId, ComponentIdError, OptionVerb, ProxyAction, MAX_COMPONENT_ID_LEN,
};
pub use contract::{
    channel_mention, role_mention, ButtonClicked, FetchedMessage, InteractionContext,
    InteractionToken, MessageAuthor, MessageReceived, OutgoingMessage, SelectChosen, Transport,
    TransportError,
};
pub use pagination::{
    cursor_id, cursor_of, page_count, paginate, paginated_select, Page, DEFAULT_PAGE_SIZE,
    NEXT_PAGE_LABEL, PREVIOUS_PAGE_LABEL,
};
pub use pending::{PendingRegistry, ResponseKey, ResponseRegistry, DEFAULT_RESPONSE_TIMEOUT};
pub use scheduler::{ManualScheduler, ScheduledTask, Scheduler, TimerHandle, TokioScheduler};
pub use view::{
    ActionRow, Button, ButtonStyle, Embed, MessageView, SelectMenu, SelectOption,
    CONFIRMATION_EMBED_COLOR, MAX_ACTION_ROWS, MAX_SELECT_OPTIONS,
};
