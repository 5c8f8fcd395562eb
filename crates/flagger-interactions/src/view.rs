//! Platform-neutral message view model.
//!
//! Handlers build `MessageView` values; the platform adapter translates them
//! into its own builders. Incoming interactions carry the rows of the message
//! they came from in the same shape, which is how stateless handlers recover
//! the render state of a menu.

/// Most rows a single message may carry.
pub const MAX_ACTION_ROWS: usize = 5;
/// Most options a single select menu may carry.
pub const MAX_SELECT_OPTIONS: usize = 25;
/// Embed colour of confirmation prompts.
pub const CONFIRMATION_EMBED_COLOR: u32 = 0x0000FF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonStyle {
    Primary,
    Secondary,
    Success,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub custom_id: String,
    pub label: String,
    pub style: ButtonStyle,
    pub disabled: bool,
}

impl Button {
    pub fn new(custom_id: impl Into<String>, label: impl Into<String>, style: ButtonStyle) -> Self {
        Self {
            custom_id: custom_id.into(),
            label: label.into(),
            style,
            disabled: false,
        }
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
    pub description: Option<String>,
    /// Pre-selected when rendered; also how render state is read back.
    pub default: bool,
}

impl SelectOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            description: None,
            default: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_default(mut self, default: bool) -> Self {
        self.default = default;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectMenu {
    pub custom_id: String,
    pub placeholder: Option<String>,
    pub min_values: u8,
    pub max_values: u8,
    pub options: Vec<SelectOption>,
    pub disabled: bool,
}

impl SelectMenu {
    /// Single-choice select over `options`.
    pub fn new(custom_id: impl Into<String>, options: Vec<SelectOption>) -> Self {
        Self {
            custom_id: custom_id.into(),
            placeholder: None,
            min_values: 1,
            max_values: 1,
            options,
            disabled: false,
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn default_options(&self) -> impl Iterator<Item = &SelectOption> {
        self.options.iter().filter(|option| option.default)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionRow {
    Buttons(Vec<Button>),
    Select(SelectMenu),
}

impl ActionRow {
    pub fn as_select(&self) -> Option<&SelectMenu> {
        match self {
            Self::Select(select) => Some(select),
            Self::Buttons(_) => None,
        }
    }

    fn disable(&mut self) {
        match self {
            Self::Buttons(buttons) => buttons.iter_mut().for_each(|button| button.disabled = true),
            Self::Select(select) => select.disabled = true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Embed {
    pub description: String,
    pub color: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Content, embeds, and interactive rows of one message.
pub struct MessageView {
    pub content: Option<String>,
    pub embeds: Vec<Embed>,
    pub rows: Vec<ActionRow>,
}

impl MessageView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn with_embed(mut self, embed: Embed) -> Self {
        self.embeds.push(embed);
        self
    }

    pub fn with_row(mut self, row: ActionRow) -> Self {
        self.rows.push(row);
        self
    }

    pub fn selects(&self) -> impl Iterator<Item = &SelectMenu> {
        self.rows.iter().filter_map(ActionRow::as_select)
    }

    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows
            .iter()
            .filter_map(|row| match row {
                ActionRow::Buttons(buttons) => Some(buttons.iter()),
                ActionRow::Select(_) => None,
            })
            .flatten()
    }

    /// Copy of this view with every button and select disabled.
    pub fn with_components_disabled(&self) -> Self {
        let mut view = self.clone();
        view.rows.iter_mut().for_each(ActionRow::disable);
        view
    }
}
