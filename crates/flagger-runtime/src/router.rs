//! Single entry point for inbound platform events.

use std::time::Duration;

use flagger_core::CommunityId;
use flagger_interactions::{ButtonClicked, ComponentId, MessageReceived, MessageView, SelectChosen};

use crate::{
    CaptureOutcome, ConfigPage, HandlerFailure, MenuOutcome, MenuRuntime, ProxyClickOutcome,
    ProxyMessageOutcome, ProxyRuntime, RuntimeServices,
};

#[derive(Debug, Clone, PartialEq, Eq)]
/// What happened to one inbound message.
pub enum MessageRoute {
    /// The message answered a pending free-text edit and was not inspected further.
    Captured(CaptureOutcome),
    Proxy(ProxyMessageOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Which workflow handled a button click.
pub enum ButtonRoute {
    Proxy(ProxyClickOutcome),
    Menu(MenuOutcome),
}

/// Dispatches messages, button clicks, and select choices to the escalation
/// workflow and the configuration menu.
pub struct EventRouter {
    proxy: ProxyRuntime,
    menu: MenuRuntime,
}

impl EventRouter {
    pub fn new(services: RuntimeServices, capture_timeout: Duration) -> Self {
        Self {
            proxy: ProxyRuntime::new(services.clone()),
            menu: MenuRuntime::new(services, capture_timeout),
        }
    }

    pub fn proxy(&self) -> &ProxyRuntime {
        &self.proxy
    }

    pub fn menu(&self) -> &MenuRuntime {
        &self.menu
    }

    pub async fn handle_message(&self, message: &MessageReceived) -> MessageRoute {
        match self.menu.handle_message(message).await {
            CaptureOutcome::NotCaptured => {
                MessageRoute::Proxy(self.proxy.handle_message(message).await)
            }
            captured => MessageRoute::Captured(captured),
        }
    }

    pub async fn handle_button_click(&self, click: &ButtonClicked) -> ButtonRoute {
        if ComponentId::is_proxy(&click.component_id) {
            ButtonRoute::Proxy(self.proxy.handle_button_click(click).await)
        } else {
            ButtonRoute::Menu(self.menu.handle_button_click(click).await)
        }
    }

    pub async fn handle_select_menu(&self, select: &SelectChosen) -> MenuOutcome {
        self.menu.handle_select_menu(select).await
    }

    /// Renders a fresh `page` of the configuration menu for `community`.
    pub async fn render_page(
        &self,
        community: &CommunityId,
        page: ConfigPage,
    ) -> Result<MessageView, HandlerFailure> {
        self.menu.render_page(community, page).await
    }
}

#[cfg(test)]
mod tests {
    use flagger_core::{ChannelId, MessageId, UserId};
    use flagger_interactions::{InteractionContext, InteractionToken};

    use super::*;
    use crate::test_support::{
        community, enabled_configuration, fetched, harness, message, Harness, AUTHOR, CHANNEL,
        PROXY_ROLE,
    };

    fn router(harness: &Harness) -> EventRouter {
        EventRouter::new(harness.services.clone(), Duration::from_secs(30))
    }

    fn click(component_id: &str) -> ButtonClicked {
        ButtonClicked {
            component_id: component_id.to_string(),
            interaction: InteractionContext {
                community: community(),
                channel: ChannelId::new(CHANNEL),
                message: MessageId::new("9000"),
                user: UserId::new(AUTHOR),
                token: InteractionToken::new("router-token"),
                rows: Vec::new(),
            },
        }
    }

    #[tokio::test]
    async fn functional_capture_consumes_message_before_proxy() {
        let harness = harness(enabled_configuration());
        let router = router(&harness);
        let started = router
            .handle_button_click(&click("option:edit:confirmationMessage:str;"))
            .await;
        assert!(matches!(
            started,
            ButtonRoute::Menu(MenuOutcome::AwaitingInput { .. })
        ));

        let reply = message("1", "hey <@&401> are you there?", &[PROXY_ROLE]);
        let route = router.handle_message(&reply).await;
        assert!(matches!(
            route,
            MessageRoute::Captured(CaptureOutcome::Applied { .. })
        ));
        assert_eq!(router.proxy().pending_confirmations(), 0);
    }

    #[tokio::test]
    async fn functional_proxy_prefix_routes_to_escalation() {
        let harness = harness(enabled_configuration());
        let router = router(&harness);
        let trigger = message("1", "<@&401> help", &[PROXY_ROLE]);
        harness.transport.store(fetched(&trigger));
        let route = router.handle_message(&trigger).await;
        assert!(matches!(
            route,
            MessageRoute::Proxy(ProxyMessageOutcome::AwaitingConfirmation { .. })
        ));

        let outcome = router
            .handle_button_click(&click(&format!("proxy:{AUTHOR}:{CHANNEL}:1:deny")))
            .await;
        assert_eq!(outcome, ButtonRoute::Proxy(ProxyClickOutcome::Denied));
        let label = router.handle_button_click(&click("label:enabled")).await;
        assert_eq!(label, ButtonRoute::Menu(MenuOutcome::Ignored));
    }
}
