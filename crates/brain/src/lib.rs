//! The brain: a stateful perceive-think-act loop over a real browser.
//!
//! Each step captures a fresh snapshot, publishes it to the supervisor, asks
//! the vision model for one structured action, routes that action through the
//! gateway, and records the outcome in the chain-of-thought history. The loop
//! ends on `FINISH`, `FAIL`, an unusable model reply, or budget exhaustion.

mod parse;
mod prompt;

use action_gateway::ActionGateway;
use browser_driver::BrowserControl;
use parking_lot::Mutex;
use perceiver::Perceiver;
use pilot_core_types::{Action, ActionOutcome, Decision, HistoryEntry};
use std::sync::Arc;
use std::time::{Duration, Instant};
use supervisor::Supervisor;
use tracing::{debug, error, info, warn};
use url::Url;
use vision_client::VisionModel;

use parse::parse_decision;
use prompt::{build_prompt, compact_dom};

#[derive(Debug, Clone)]
pub struct BrainConfig {
    /// Hard step budget per mission.
    pub max_steps: u32,
    /// Human pacing after a successful action.
    pub pacing: Duration,
    /// Wall-clock cap per mission.
    pub mission_timeout: Duration,
    /// Hosts whose UI swallows normal clicks; clicks there are forced.
    pub stubborn_hosts: Vec<String>,
    /// Per-call model override for the think phase.
    pub model_preference: Option<Vec<String>>,
    /// Name under which actions are requested at the gateway.
    pub agent_name: String,
}

impl Default for BrainConfig {
    fn default() -> Self {
        Self {
            max_steps: 15,
            pacing: Duration::from_secs(2),
            mission_timeout: Duration::from_secs(600),
            stubborn_hosts: vec!["x.com".to_string()],
            model_preference: None,
            agent_name: "Brain".to_string(),
        }
    }
}

/// The cognitive loop. Shared immutably; loop state lives behind locks so a
/// single `Arc<Brain>` can be injected everywhere.
pub struct Brain {
    perceiver: Arc<Perceiver>,
    vision: Arc<dyn VisionModel>,
    gateway: Arc<ActionGateway>,
    supervisor: Arc<Supervisor>,
    browser: Arc<dyn BrowserControl>,
    config: BrainConfig,
    history: Mutex<Vec<HistoryEntry>>,
}

impl Brain {
    pub fn new(
        perceiver: Arc<Perceiver>,
        vision: Arc<dyn VisionModel>,
        gateway: Arc<ActionGateway>,
        supervisor: Arc<Supervisor>,
        browser: Arc<dyn BrowserControl>,
    ) -> Self {
        Self::with_config(
            perceiver,
            vision,
            gateway,
            supervisor,
            browser,
            BrainConfig::default(),
        )
    }

    pub fn with_config(
        perceiver: Arc<Perceiver>,
        vision: Arc<dyn VisionModel>,
        gateway: Arc<ActionGateway>,
        supervisor: Arc<Supervisor>,
        browser: Arc<dyn BrowserControl>,
        config: BrainConfig,
    ) -> Self {
        Self {
            perceiver,
            vision,
            gateway,
            supervisor,
            browser,
            config,
            history: Mutex::new(Vec::new()),
        }
    }

    /// Drive the mission until `FINISH`, `FAIL`, or budget exhaustion.
    /// Returns `true` iff the loop terminated on `FINISH`.
    pub async fn run_mission(&self, goal: &str) -> bool {
        info!(goal, "mission started");
        self.history.lock().clear();
        let started = Instant::now();

        for step in 1..=self.config.max_steps {
            if started.elapsed() >= self.config.mission_timeout {
                warn!(step, "mission wall-clock budget exhausted");
                return false;
            }
            debug!(step, max = self.config.max_steps, "mission step");

            // Perceive. The supervisor sees this snapshot before any
            // approval call of the same step.
            let snapshot = match self.perceiver.snapshot().await {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    error!(error = %err, "perception failed, mission cannot continue");
                    self.record(Decision {
                        reasoning: "Perception failed; no basis for a decision.".to_string(),
                        action: Action::Fail {
                            reason: format!("perception failed: {err}"),
                        },
                    });
                    return false;
                }
            };
            self.supervisor.update_perception(snapshot.clone());

            // Think.
            let observation = compact_dom(&snapshot.dom_elements);
            let history_json = {
                let history = self.history.lock();
                serde_json::to_string_pretty(&*history).unwrap_or_else(|_| "[]".to_string())
            };
            let prompt = build_prompt(goal, &history_json, &observation);
            let preference = self.config.model_preference.as_deref();

            let Some(reply) = self.vision.query(&snapshot.frame, &prompt, preference).await
            else {
                warn!("vision model unavailable, treating as FAIL");
                self.record(Decision {
                    reasoning: "Vision model failed to respond.".to_string(),
                    action: Action::Fail {
                        reason: "vision model unavailable".to_string(),
                    },
                });
                return false;
            };

            let Some(mut decision) = parse_decision(&reply) else {
                warn!(reply = %reply, "could not parse decision, treating as FAIL");
                self.record(Decision {
                    reasoning: "Model reply did not contain a usable decision.".to_string(),
                    action: Action::Fail {
                        reason: "unparseable decision".to_string(),
                    },
                });
                return false;
            };

            // Stubborn hosts swallow normal clicks; force them there.
            if let Action::ClickWeb { force, .. } = &mut decision.action {
                if self.on_stubborn_host().await {
                    *force = true;
                }
            }

            // Record, then check for terminals.
            let action = decision.action.clone();
            self.record(decision);
            match &action {
                Action::Finish { reason } => {
                    info!(reason = %reason, steps = step, "mission finished");
                    return true;
                }
                Action::Fail { reason } => {
                    warn!(reason = %reason, steps = step, "mission declared impossible");
                    return false;
                }
                _ => {}
            }

            // Act. A failed action is recorded and the loop re-perceives so
            // the model can react to the failure in its history.
            let executed = self
                .gateway
                .request_action(&self.config.agent_name, &action, goal)
                .await;
            self.set_last_outcome(if executed {
                ActionOutcome::Success
            } else {
                ActionOutcome::Failure
            });

            if executed && !self.config.pacing.is_zero() {
                tokio::time::sleep(self.config.pacing).await;
            }
        }

        warn!(steps = self.config.max_steps, "step budget exhausted");
        false
    }

    /// Chain-of-thought so far; entries are appended once per step and only
    /// the trailing entry ever gains an outcome.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history.lock().clone()
    }

    fn record(&self, decision: Decision) {
        self.history.lock().push(HistoryEntry::new(decision));
    }

    fn set_last_outcome(&self, outcome: ActionOutcome) {
        if let Some(entry) = self.history.lock().last_mut() {
            entry.outcome = Some(outcome);
        }
    }

    async fn on_stubborn_host(&self) -> bool {
        let Ok(Some(current)) = self.browser.current_url().await else {
            return false;
        };
        let Ok(parsed) = Url::parse(&current) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };
        self.config
            .stubborn_hosts
            .iter()
            .any(|stubborn| host == stubborn || host.ends_with(&format!(".{stubborn}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use browser_driver::fake::{BrowserOp, FakeBrowser};
    use os_input::RecordingInput;
    use perceiver::StaticScreen;
    use pilot_core_types::{DisplayContext, Rect};
    use vision_client::ScriptedVision;

    struct Fixture {
        brain: Brain,
        browser: Arc<FakeBrowser>,
        vision: Arc<ScriptedVision>,
    }

    fn fixture(browser: FakeBrowser, vision: ScriptedVision) -> Fixture {
        let browser = Arc::new(browser);
        let vision = Arc::new(vision);
        let supervisor = Arc::new(Supervisor::new(vision.clone()));
        let gateway = Arc::new(ActionGateway::new(
            supervisor.clone(),
            browser.clone(),
            Arc::new(RecordingInput::new()),
            DisplayContext::unscaled(1920, 1080),
        ));
        let perceiver = Arc::new(Perceiver::new(
            Arc::new(StaticScreen::gray(8, 8)),
            browser.clone(),
        ));
        let config = BrainConfig {
            pacing: Duration::ZERO,
            ..BrainConfig::default()
        };
        let brain = Brain::with_config(
            perceiver,
            vision.clone(),
            gateway,
            supervisor,
            browser.clone(),
            config,
        );
        Fixture {
            brain,
            browser,
            vision,
        }
    }

    #[tokio::test]
    async fn fenced_finish_reply_ends_the_mission_successfully() {
        let vision = ScriptedVision::with_replies([
            "```json\n{\"reasoning\":\"r\",\"action\":{\"name\":\"FINISH\",\"reason\":\"done\"}}\n```",
        ]);
        let fx = fixture(FakeBrowser::new(), vision);

        assert!(fx.brain.run_mission("check the timeline").await);
        let history = fx.brain.history();
        assert_eq!(history.len(), 1);
        assert_eq!(
            history[0].action,
            Action::Finish {
                reason: "done".into()
            }
        );
    }

    #[tokio::test]
    async fn failing_clicks_burn_the_whole_step_budget() {
        let click = r##"{"reasoning":"try again","action":{"name":"CLICK","selector":"#never-there"}}"##;
        let vision = ScriptedVision::with_replies(vec![click; 15]);
        // No rect registered for the selector: every execution fails.
        let fx = fixture(FakeBrowser::new(), vision);

        assert!(!fx.brain.run_mission("find the hidden button").await);

        let history = fx.brain.history();
        assert_eq!(history.len(), 15);
        assert!(history
            .iter()
            .all(|entry| entry.outcome == Some(ActionOutcome::Failure)));
        assert!(fx.browser.ops().is_empty());
    }

    #[tokio::test]
    async fn vision_outage_records_fail_and_stops() {
        let fx = fixture(FakeBrowser::new(), ScriptedVision::new());

        assert!(!fx.brain.run_mission("do anything").await);
        let history = fx.brain.history();
        assert_eq!(history.len(), 1);
        assert!(matches!(history[0].action, Action::Fail { .. }));
    }

    #[tokio::test]
    async fn garbage_reply_records_fail_and_stops() {
        let vision = ScriptedVision::with_replies(["I would click something, probably"]);
        let fx = fixture(FakeBrowser::new(), vision);

        assert!(!fx.brain.run_mission("do anything").await);
        assert!(matches!(
            fx.brain.history()[0].action,
            Action::Fail { .. }
        ));
    }

    #[tokio::test]
    async fn clicks_on_stubborn_hosts_are_forced() {
        let vision = ScriptedVision::with_replies([
            r##"{"reasoning":"open composer","action":{"name":"CLICK","selector":"#compose"}}"##,
            r#"{"reasoning":"done","action":{"name":"FINISH","reason":"ok"}}"#,
        ]);
        let browser = FakeBrowser::new().with_url("https://x.com/home").with_rect(
            "#compose",
            Rect {
                x: 10.0,
                y: 10.0,
                width: 20.0,
                height: 20.0,
            },
        );
        let fx = fixture(browser, vision);

        assert!(fx.brain.run_mission("browse the timeline").await);
        assert_eq!(
            fx.browser.ops(),
            vec![BrowserOp::Click {
                selector: "#compose".into(),
                force: true
            }]
        );
        // The recorded action carries the forced flag too.
        assert_eq!(
            fx.brain.history()[0].action,
            Action::ClickWeb {
                selector: "#compose".into(),
                force: true
            }
        );
    }

    #[tokio::test]
    async fn history_is_append_only_across_steps() {
        let vision = ScriptedVision::with_replies([
            r#"{"reasoning":"go","action":{"name":"BROWSE","url":"https://example.org"}}"#,
            r#"{"reasoning":"done","action":{"name":"FINISH","reason":"ok"}}"#,
        ]);
        let fx = fixture(FakeBrowser::new(), vision);

        assert!(fx.brain.run_mission("visit example.org").await);
        let history = fx.brain.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].outcome, Some(ActionOutcome::Success));
        assert_eq!(history[1].outcome, None);
        assert_eq!(fx.vision.calls(), 2);
    }
}
