//! Wires the real drivers into a ready-to-run mission stack.

use action_gateway::ActionGateway;
use anyhow::{Context, Result};
use brain::{Brain, BrainConfig};
use browser_driver::{BrowserControl, ChromiumDriver, DriverConfig};
use kv_memory::{keys, MemoryStore};
use mission_launcher::Collaborators;
use os_input::EnigoInput;
use perceiver::{Perceiver, XcapScreen};
use pilot_core_types::DisplayContext;
use std::path::Path;
use std::sync::Arc;
use supervisor::Supervisor;
use tracing::{info, warn};
use vision_client::{HttpVisionClient, VisionConfig};

use crate::cli::settings::Settings;

/// Everything a mission run needs, plus the browser handle for shutdown.
pub struct Stack {
    pub collaborators: Collaborators,
    pub browser: Arc<dyn BrowserControl>,
}

/// Probe the display, launch the browser, and assemble the collaborator set.
pub async fn build_stack(settings: &Settings, memory_path: &Path) -> Result<Stack> {
    let memory = Arc::new(MemoryStore::open(memory_path).context("opening memory store")?);

    // Captured once at process start; 1.0 scaling when the probe fails.
    let display = match display_context::detect() {
        Ok(display) => display,
        Err(err) => {
            warn!(error = %err, "display probe failed, assuming an unscaled 1920x1080 monitor");
            DisplayContext::default()
        }
    };
    memory
        .save(keys::DISPLAY_CONTEXT, &display)
        .context("caching display context")?;

    let driver_config = DriverConfig::new(&settings.browser_user_data_dir)
        .with_profile(&settings.browser_profile);
    let browser: Arc<dyn BrowserControl> = Arc::new(
        ChromiumDriver::launch(driver_config)
            .await
            .context("launching browser")?,
    );

    let mut vision_config = VisionConfig::new(&settings.vision_api_key);
    if let Some(base) = &settings.vision_api_base {
        vision_config = vision_config.with_api_base(base);
    }
    if let Some(models) = &settings.vision_models {
        vision_config = vision_config.with_models(models.clone());
    }
    let vision = Arc::new(HttpVisionClient::new(vision_config).context("building vision client")?);

    let supervisor = Arc::new(Supervisor::new(vision.clone()));
    let input = Arc::new(EnigoInput::new(display).context("initializing OS input")?);
    let gateway = Arc::new(ActionGateway::new(
        supervisor.clone(),
        browser.clone(),
        input,
        display,
    ));

    let mut perceiver = Perceiver::new(Arc::new(XcapScreen::new()), browser.clone());
    if settings.debug_vision {
        let dump_dir = std::env::temp_dir();
        info!(dir = %dump_dir.display(), "DEBUG_VISION set, dumping frames");
        perceiver = perceiver.with_debug_dump(dump_dir);
    }

    let mut brain_config = BrainConfig::default();
    if let Some(hosts) = &settings.stubborn_hosts {
        brain_config.stubborn_hosts = hosts.clone();
    }
    let brain = Arc::new(Brain::with_config(
        Arc::new(perceiver),
        vision,
        gateway.clone(),
        supervisor.clone(),
        browser.clone(),
        brain_config,
    ));

    Ok(Stack {
        collaborators: Collaborators {
            memory,
            supervisor,
            gateway,
            brain,
        },
        browser,
    })
}
