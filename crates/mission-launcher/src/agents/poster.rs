//! Poster: opens the composer through the gateway, then delegates the
//! intricate UI work to the brain.

use action_gateway::ActionGateway;
use async_trait::async_trait;
use brain::Brain;
use kv_memory::{keys, MemoryStore};
use pilot_core_types::Action;
use std::sync::Arc;
use supervisor::Supervisor;
use tracing::{info, warn};

use crate::agents::MissionAgent;
use crate::AgentFailure;

const COMPOSER_URL: &str = "https://x.com/compose/post";

pub struct PosterAgent {
    name: String,
    memory: Arc<MemoryStore>,
    supervisor: Arc<Supervisor>,
    gateway: Arc<ActionGateway>,
    brain: Arc<Brain>,
    task_context: String,
}

impl PosterAgent {
    pub fn new(
        name: impl Into<String>,
        memory: Arc<MemoryStore>,
        supervisor: Arc<Supervisor>,
        gateway: Arc<ActionGateway>,
        brain: Arc<Brain>,
    ) -> Self {
        Self {
            name: name.into(),
            memory,
            supervisor,
            gateway,
            brain,
            task_context: "Post content to X (Twitter)".to_string(),
        }
    }
}

#[async_trait]
impl MissionAgent for PosterAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_task_context(&mut self, task: &str) {
        self.task_context = task.to_string();
    }

    async fn run(&mut self) -> Result<(), AgentFailure> {
        let Some(content) = self.memory.load_as::<String>(keys::POST_CONTENT) else {
            return Err(AgentFailure::new("no post content staged in memory"));
        };
        info!(agent = %self.name, content = %content, "posting staged content");

        // Get the composer on screen; the brain handles everything after.
        let opened = self
            .gateway
            .request_action(
                &self.name,
                &Action::Browse {
                    url: COMPOSER_URL.to_string(),
                },
                &self.task_context,
            )
            .await;
        if !opened {
            warn!(agent = %self.name, "composer navigation refused, brain will navigate itself");
        }

        let goal = format!(
            "Post the following text to the site, exactly as written, then finish: \
             \"{content}\". The composer at {COMPOSER_URL} should already be open; \
             type the text into the compose box and click the Post button."
        );
        let achieved = self.brain.run_mission(&goal).await;
        if !achieved {
            // The step still completes; the journals carry the miss.
            warn!(
                agent = %self.name,
                decisions = self.supervisor.decisions().len(),
                "brain did not confirm the post"
            );
        }
        Ok(())
    }
}
