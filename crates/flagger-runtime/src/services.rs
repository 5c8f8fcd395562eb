use std::sync::Arc;

use flagger_config::{ConfigurationService, GuildDirectory};
use flagger_core::Clock;
use flagger_interactions::{Scheduler, Transport};

#[derive(Clone)]
/// Collaborators shared by the proxy workflow and the configuration menu.
pub struct RuntimeServices {
    pub configuration: Arc<dyn ConfigurationService>,
    pub directory: Arc<dyn GuildDirectory>,
    pub transport: Arc<dyn Transport>,
    pub scheduler: Arc<dyn Scheduler>,
    pub clock: Arc<dyn Clock>,
}
