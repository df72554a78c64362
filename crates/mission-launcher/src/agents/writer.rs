//! Writer: stages post content in memory for downstream agents.

use chrono::Local;
use kv_memory::{keys, MemoryStore};
use std::sync::Arc;
use tracing::info;

use crate::agents::BlockingAgent;
use crate::AgentFailure;

/// Composes a short post and stores it under `post_content`. Deterministic
/// apart from the clock suffix, which keeps repeated posts distinct.
pub struct WriterAgent {
    name: String,
    memory: Arc<MemoryStore>,
    task_context: String,
}

impl WriterAgent {
    pub fn new(name: impl Into<String>, memory: Arc<MemoryStore>) -> Self {
        Self {
            name: name.into(),
            memory,
            task_context: String::new(),
        }
    }
}

impl BlockingAgent for WriterAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_task_context(&mut self, task: &str) {
        self.task_context = task.to_string();
    }

    fn run(&mut self) -> Result<(), AgentFailure> {
        let content = format!(
            "Small steps, every day. Keep building. [{}]",
            Local::now().format("%H:%M:%S")
        );
        self.memory
            .save(keys::POST_CONTENT, &content)
            .map_err(|err| AgentFailure::new(format!("could not stage post content: {err}")))?;
        info!(agent = %self.name, content = %content, "post content staged");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_stages_content_with_clock_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let memory = Arc::new(MemoryStore::open(dir.path().join("memory.json")).unwrap());
        let mut writer = WriterAgent::new("WriterAgent", memory.clone());
        writer.set_task_context("Write a short post");

        writer.run().unwrap();

        let content = memory.load_as::<String>(keys::POST_CONTENT).unwrap();
        assert!(content.contains("Keep building."));
        assert!(content.ends_with(']'));
    }
}
