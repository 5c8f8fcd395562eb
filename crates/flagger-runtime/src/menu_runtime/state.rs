use std::collections::BTreeMap;

use flagger_config::FieldValue;
use flagger_interactions::{cursor_of, ActionRow, ComponentId, OptionVerb};

/// Custom id of the top-level navigation select.
pub const NAVIGATION_SELECT_ID: &str = "menu";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
/// Top-level pages of the configuration menu.
pub enum ConfigPage {
    #[default]
    Overview,
    RoleConfig,
    MessageConfig,
    ChannelConfig,
    TimeoutConfig,
}

impl ConfigPage {
    pub const ALL: [Self; 5] = [
        Self::Overview,
        Self::RoleConfig,
        Self::MessageConfig,
        Self::ChannelConfig,
        Self::TimeoutConfig,
    ];

    /// Name carried in `menu:<page>` component ids.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Overview => "OVERVIEW",
            Self::RoleConfig => "ROLE_CONFIG",
            Self::MessageConfig => "MESSAGE_CONFIG",
            Self::ChannelConfig => "CHANNEL_CONFIG",
            Self::TimeoutConfig => "TIMEOUT_CONFIG",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Overview => "Overview",
            Self::RoleConfig => "Role Configuration",
            Self::MessageConfig => "Message Configuration",
            Self::ChannelConfig => "Channel Configuration",
            Self::TimeoutConfig => "Timeout Configuration",
        }
    }

    pub fn from_wire(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|page| page.wire_name() == raw)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Ephemeral render state of one menu message.
///
/// Never stored server-side: it is read back from the rows of the live
/// message on every interaction (see [`MenuState::from_rows`]).
pub struct MenuState {
    page: ConfigPage,
    values: BTreeMap<String, String>,
    cursors: BTreeMap<String, usize>,
}

impl MenuState {
    pub fn new(page: ConfigPage) -> Self {
        Self {
            page,
            ..Self::default()
        }
    }

    /// Recovers the state a message was rendered with.
    ///
    /// * page: the default option of the navigation select;
    /// * values: default-marked `option:state` options;
    /// * cursors: custom ids of paginated selects.
    pub fn from_rows(rows: &[ActionRow]) -> Self {
        let mut state = Self::default();
        for select in rows.iter().filter_map(ActionRow::as_select) {
            if select.custom_id == NAVIGATION_SELECT_ID {
                let page = select
                    .default_options()
                    .filter_map(|option| match ComponentId::decode(&option.value) {
                        Some(ComponentId::Menu { page }) => ConfigPage::from_wire(&page),
                        _ => None,
                    })
                    .next();
                if let Some(page) = page {
                    state.page = page;
                }
                continue;
            }
            if let Some((cursor, page)) = cursor_of(select) {
                state.cursors.insert(cursor, page);
            }
            for option in select.default_options() {
                if let Some(ComponentId::Option {
                    verb: OptionVerb::State,
                    key,
                    value: FieldValue::Str(value),
                }) = ComponentId::decode(&option.value)
                {
                    state.values.insert(key, value);
                }
            }
        }
        state
    }

    pub fn page(&self) -> ConfigPage {
        self.page
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Sets a sub-page key. Pagination restarts from the first page.
    pub fn set_value(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
        self.cursors.clear();
    }

    /// Current page of the paginated select `cursor`, zero when unset.
    pub fn cursor(&self, cursor: &str) -> usize {
        self.cursors.get(cursor).copied().unwrap_or(0)
    }

    pub fn set_cursor(&mut self, cursor: impl Into<String>, page: usize) {
        self.cursors.insert(cursor.into(), page);
    }
}
