//! End-to-end mission scenarios over the full stack, with the browser,
//! screen, input, and vision model replaced by deterministic doubles.

use action_gateway::ActionGateway;
use brain::{Brain, BrainConfig};
use browser_driver::fake::{BrowserOp, FakeBrowser};
use kv_memory::{keys, MemoryStore};
use mission_launcher::{
    load_plan, save_plan, AgentRegistry, Collaborators, MissionPlan, MissionRunner, Step,
    StepStatus,
};
use os_input::RecordingInput;
use perceiver::{Perceiver, StaticScreen};
use pilot_core_types::{Action, ActionOutcome, DisplayContext, Rect};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use supervisor::Verdict;
use vision_client::ScriptedVision;

const POST: &str = "hello world [12:00:00]";

struct Stack {
    collaborators: Collaborators,
    browser: Arc<FakeBrowser>,
    input: Arc<RecordingInput>,
    vision: Arc<ScriptedVision>,
}

fn rect(x: f64, y: f64, w: f64, h: f64) -> Rect {
    Rect {
        x,
        y,
        width: w,
        height: h,
    }
}

/// A composer page on x.com with the three elements the scenarios touch.
fn composer_browser() -> FakeBrowser {
    FakeBrowser::new()
        .with_url("https://x.com/home")
        .with_rect("a[href='/compose']", rect(20.0, 100.0, 48.0, 48.0))
        .with_rect("[data-testid='tweetTextarea_0']", rect(300.0, 200.0, 500.0, 120.0))
        .with_rect("[data-testid='tweetButton']", rect(740.0, 340.0, 80.0, 36.0))
}

fn stack(dir: &Path, browser: FakeBrowser, vision: ScriptedVision) -> Stack {
    let memory = Arc::new(MemoryStore::open(dir.join("memory.json")).unwrap());
    let browser = Arc::new(browser);
    let input = Arc::new(RecordingInput::new());
    let vision = Arc::new(vision);
    let supervisor = Arc::new(supervisor::Supervisor::new(vision.clone()));
    let gateway = Arc::new(ActionGateway::new(
        supervisor.clone(),
        browser.clone(),
        input.clone(),
        DisplayContext::unscaled(1920, 1080),
    ));
    let perceiver = Arc::new(Perceiver::new(
        Arc::new(StaticScreen::gray(16, 16)),
        browser.clone(),
    ));
    let brain = Arc::new(Brain::with_config(
        perceiver,
        vision.clone(),
        gateway.clone(),
        supervisor.clone(),
        browser.clone(),
        BrainConfig {
            pacing: Duration::ZERO,
            ..BrainConfig::default()
        },
    ));
    Stack {
        collaborators: Collaborators {
            memory,
            supervisor,
            gateway,
            brain,
        },
        browser,
        input,
        vision,
    }
}

fn poster_plan(dir: &Path) -> PathBuf {
    let path = dir.join("mission.json");
    save_plan(
        &path,
        &MissionPlan {
            goal: "post a tweet".into(),
            steps: vec![Step::new("PosterAgent", "post tweet")],
        },
    )
    .unwrap();
    path
}

fn poster_registry() -> AgentRegistry {
    AgentRegistry::from_entries([
        ("WriterAgent", "builtin:writer"),
        ("PosterAgent", "builtin:poster"),
    ])
}

fn decision(name: &str, extra: &str) -> String {
    format!(r#"{{"reasoning":"r","action":{{"name":"{name}"{extra}}}}}"#)
}

#[tokio::test]
async fn straight_path_posts_and_completes() {
    let dir = tempfile::tempdir().unwrap();
    // Think/validate replies interleave on one model, exactly as in
    // production: clicks are high-risk here ("post" in the goal) and get a
    // visual validation call each; typing only gets the content check.
    let vision = ScriptedVision::with_replies([
        decision("CLICK", r#","selector":"a[href='/compose']""#),
        r#"{"decision": "Yes", "reason": "compose entry visible"}"#.to_string(),
        decision(
            "TYPE",
            &format!(r#","selector":"[data-testid='tweetTextarea_0']","text":"{POST}""#),
        ),
        decision("CLICK", r#","selector":"[data-testid='tweetButton']""#),
        r#"{"decision": "Yes", "reason": "Post button active"}"#.to_string(),
        decision("FINISH", r##","reason":"posted""##),
    ]);
    let stack = stack(dir.path(), composer_browser(), vision);
    stack
        .collaborators
        .memory
        .save(keys::POST_CONTENT, &POST)
        .unwrap();

    let path = poster_plan(dir.path());
    let runner = MissionRunner::new(&path, poster_registry(), stack.collaborators.clone());
    let plan = runner.run().await.unwrap();

    // Step lifecycle reached completed and is journaled on disk.
    assert_eq!(plan.steps[0].status, StepStatus::Completed);
    assert_eq!(
        load_plan(&path).unwrap().steps[0].status,
        StepStatus::Completed
    );

    // Exactly four gateway-mediated side effects, in order: the poster's
    // browse, then the brain's click, type, click. Clicks on x.com are
    // forced, so everything lands on the browser double.
    assert_eq!(
        stack.browser.ops(),
        vec![
            BrowserOp::Navigate("https://x.com/compose/post".into()),
            BrowserOp::Click {
                selector: "a[href='/compose']".into(),
                force: true
            },
            BrowserOp::Type {
                selector: "[data-testid='tweetTextarea_0']".into(),
                text: POST.into()
            },
            BrowserOp::Click {
                selector: "[data-testid='tweetButton']".into(),
                force: true
            },
        ]
    );
    assert!(stack.input.clicks().is_empty());

    // One approval per side effect, all approved.
    let decisions = stack.collaborators.supervisor.decisions();
    assert_eq!(decisions.len(), 4);
    assert!(decisions.iter().all(|d| d.approved()));
    assert_eq!(decisions[0].action, "browse");
    assert_eq!(decisions[1].action, "click_web");
    assert_eq!(decisions[2].action, "type_web");
    assert_eq!(decisions[3].action, "click_web");

    // The brain ended on FINISH with a clean history.
    let history = stack.collaborators.brain.history();
    assert_eq!(history.len(), 4);
    assert!(matches!(history[3].action, Action::Finish { .. }));
    assert_eq!(history[0].outcome, Some(ActionOutcome::Success));
}

#[tokio::test]
async fn blocked_high_risk_click_neither_throws_nor_corrupts_the_journal() {
    let dir = tempfile::tempdir().unwrap();
    let vision = ScriptedVision::with_replies([
        decision("CLICK", r#","selector":"a[href='/compose']""#),
        r#"{"decision": "Yes", "reason": "compose entry visible"}"#.to_string(),
        decision(
            "TYPE",
            &format!(r#","selector":"[data-testid='tweetTextarea_0']","text":"{POST}""#),
        ),
        decision("CLICK", r#","selector":"[data-testid='tweetButton']""#),
        r#"{"decision": "No", "reason": "no Post button near those coordinates"}"#.to_string(),
        decision("FAIL", r##","reason":"cannot reach the Post button""##),
    ]);
    let stack = stack(dir.path(), composer_browser(), vision);
    stack
        .collaborators
        .memory
        .save(keys::POST_CONTENT, &POST)
        .unwrap();

    let path = poster_plan(dir.path());
    let runner = MissionRunner::new(&path, poster_registry(), stack.collaborators.clone());
    let plan = runner.run().await.unwrap();

    // The agent returned normally, so the step is completed; the brain's
    // failure surfaces only through history and logs.
    assert_eq!(plan.steps[0].status, StepStatus::Completed);
    assert!(plan.steps[0].error.is_none());

    // The blocked click produced no side effect: browse, click, type only.
    let ops = stack.browser.ops();
    assert_eq!(ops.len(), 3);
    assert!(matches!(ops[2], BrowserOp::Type { .. }));

    // The blocked decision is journaled.
    let decisions = stack.collaborators.supervisor.decisions();
    let blocked: Vec<_> = decisions.iter().filter(|d| !d.approved()).collect();
    assert_eq!(blocked.len(), 1);
    assert_eq!(blocked[0].verdict, Verdict::Blocked);
    assert!(blocked[0].reason.contains("no Post button"));

    // History: the blocked click carries a Failure outcome, then FAIL.
    let history = stack.collaborators.brain.history();
    assert_eq!(history.len(), 4);
    assert_eq!(history[2].outcome, Some(ActionOutcome::Failure));
    assert!(matches!(history[3].action, Action::Fail { .. }));

    // And the on-disk journal is intact, parseable JSON.
    let persisted = load_plan(&path).unwrap();
    assert_eq!(persisted.steps[0].status, StepStatus::Completed);
}

#[tokio::test]
async fn unknown_agent_is_skipped_without_instantiation() {
    let dir = tempfile::tempdir().unwrap();
    let stack = stack(dir.path(), FakeBrowser::new(), ScriptedVision::new());

    let path = dir.path().join("mission.json");
    save_plan(
        &path,
        &MissionPlan {
            goal: "mixed plan".into(),
            steps: vec![
                Step::new("GhostAgent", "haunt the registry"),
                Step::new("WriterAgent", "write a post"),
            ],
        },
    )
    .unwrap();

    let runner = MissionRunner::new(&path, poster_registry(), stack.collaborators.clone());
    let plan = runner.run().await.unwrap();

    // pending -> unavailable, no in_progress detour, and the launcher moved on.
    assert_eq!(plan.steps[0].status, StepStatus::Unavailable);
    assert_eq!(plan.steps[1].status, StepStatus::Completed);

    // No gateway traffic and no supervisor decisions for the ghost.
    assert!(stack.browser.ops().is_empty());
    assert!(stack.input.clicks().is_empty());
    assert!(stack.collaborators.supervisor.decisions().is_empty());
    assert_eq!(stack.vision.calls(), 0);

    // The writer really ran.
    assert!(stack
        .collaborators
        .memory
        .load(keys::POST_CONTENT)
        .is_some());
}
