//! End-to-end request scenarios.
//!
//! Each test wires an `Orchestrator` from scripted models and real
//! capabilities, then checks which components ran and what came back.

use std::num::NonZeroUsize;
use std::sync::Arc;

use conduit_agents::test_support::{EchoCapability, ScriptedModel};
use conduit_agents::{AgentError, LanguageModel, ModelError, Orchestrator};
use conduit_models::config::{FilesystemToolsConfig, ParsingErrorPolicy, ResponderConfig, ToolsConfig};
use conduit_models::routing::RoutingDecision;
use conduit_models::Request;
use conduit_tools::{build_capability_set, CapabilitySet};

fn responder(max_iterations: usize) -> ResponderConfig {
    ResponderConfig::new(NonZeroUsize::new(max_iterations).unwrap())
}

fn echo_tools() -> CapabilitySet {
    CapabilitySet::new()
        .with(Arc::new(EchoCapability::new("echo")))
        .unwrap()
}

fn orchestrator(
    classifier: &Arc<ScriptedModel>,
    direct: &Arc<ScriptedModel>,
    tools: &Arc<ScriptedModel>,
    capabilities: CapabilitySet,
    config: ResponderConfig,
) -> Orchestrator {
    Orchestrator::from_models(
        Arc::clone(classifier) as Arc<dyn LanguageModel>,
        Arc::clone(direct) as Arc<dyn LanguageModel>,
        Arc::clone(tools) as Arc<dyn LanguageModel>,
        capabilities,
        config,
    )
}

// ============================================================
// Scenario 1: Reminder answered without tools
// ============================================================

#[tokio::test]
async fn reminder_goes_direct() {
    let classifier = Arc::new(ScriptedModel::choosing("nao"));
    let direct = Arc::new(ScriptedModel::new("direct").with_reply("Remember to exercise"));
    let tools = Arc::new(ScriptedModel::new("tools"));

    let answer = orchestrator(&classifier, &direct, &tools, echo_tools(), responder(50))
        .handle(&Request::new("remind me to exercise").unwrap())
        .await
        .unwrap();

    assert_eq!(answer.route, RoutingDecision::Direct);
    assert_eq!(answer.text, "Remember to exercise");
    assert_eq!(answer.iterations, 0);
    assert_eq!(tools.calls(), 0);
}

// ============================================================
// Scenario 2: Echo round trip through the tool loop
// ============================================================

#[tokio::test]
async fn echo_round_trip() {
    let classifier = Arc::new(ScriptedModel::choosing("sim"));
    let direct = Arc::new(ScriptedModel::new("direct"));
    let tools = Arc::new(
        ScriptedModel::new("tools")
            .with_reply("Thought: I should echo the word.\nAction: echo\nAction Input: hi")
            .with_reply("Thought: I now know the final answer\nFinal Answer: done"),
    );

    let answer = orchestrator(&classifier, &direct, &tools, echo_tools(), responder(50))
        .handle(&Request::new("echo hi").unwrap())
        .await
        .unwrap();

    assert_eq!(answer.route, RoutingDecision::NeedsTools);
    assert_eq!(answer.text, "done");
    assert_eq!(answer.iterations, 2);
    assert_eq!(answer.tool_calls.len(), 1);
    assert_eq!(answer.tool_calls[0].tool, "echo");
    assert_eq!(answer.tool_calls[0].observation, "hi");
    assert_eq!(direct.calls(), 0);
}

// ============================================================
// Scenario 3: Model never follows the format
// ============================================================

#[tokio::test]
async fn stubborn_model_exhausts_the_cap() {
    let classifier = Arc::new(ScriptedModel::choosing("sim"));
    let direct = Arc::new(ScriptedModel::new("direct"));
    let tools = Arc::new(ScriptedModel::new("tools").repeating("I refuse to use the format."));

    let err = orchestrator(&classifier, &direct, &tools, echo_tools(), responder(4))
        .handle(&Request::new("look something up").unwrap())
        .await
        .unwrap_err();

    assert!(err.is_recoverable());
    assert_eq!(err.kind(), "tool_loop_exhausted");
    assert_eq!(err.transcript().map(|t| t.len()), Some(4));
    assert_eq!(tools.completion_calls(), 4);
}

#[tokio::test]
async fn strict_parsing_fails_on_first_bad_output() {
    let classifier = Arc::new(ScriptedModel::choosing("sim"));
    let direct = Arc::new(ScriptedModel::new("direct"));
    let tools = Arc::new(ScriptedModel::new("tools").repeating("no format"));

    let mut config = responder(4);
    config.parsing_errors = ParsingErrorPolicy::Fail;

    let err = orchestrator(&classifier, &direct, &tools, echo_tools(), config)
        .handle(&Request::new("look something up").unwrap())
        .await
        .unwrap_err();

    assert!(matches!(err, AgentError::Responder(ModelError::Parse(_))));
    assert_eq!(tools.completion_calls(), 1);
}

// ============================================================
// Scenario 4: Classifier unreachable
// ============================================================

#[tokio::test]
async fn classifier_outage_is_not_guessed_around() {
    let classifier = Arc::new(ScriptedModel::new("classifier").with_structured_failure("timeout"));
    let direct = Arc::new(ScriptedModel::new("direct").repeating("should not run"));
    let tools = Arc::new(ScriptedModel::new("tools").repeating("Final Answer: should not run"));

    let err = orchestrator(&classifier, &direct, &tools, echo_tools(), responder(5))
        .handle(&Request::new("what's the weather?").unwrap())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "classification");
    assert!(!err.is_recoverable());
    assert_eq!(direct.calls() + tools.calls(), 0);
}

// ============================================================
// Scenario 5: Real filesystem tools in a temporary workspace
// ============================================================

#[tokio::test]
async fn finds_and_reads_a_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("notes/2024")).unwrap();
    std::fs::write(dir.path().join("notes/2024/todo.txt"), "buy milk").unwrap();

    let capabilities = build_capability_set(&ToolsConfig {
        filesystem: Some(FilesystemToolsConfig {
            root: dir.path().display().to_string(),
            allow_writes: false,
            max_search_depth: 4,
        }),
        commands: vec![],
    })
    .unwrap();
    assert!(capabilities.get("write_file").is_none());

    let classifier = Arc::new(ScriptedModel::choosing("sim"));
    let direct = Arc::new(ScriptedModel::new("direct"));
    let tools = Arc::new(
        ScriptedModel::new("tools")
            .with_reply("I need to locate the file.\nAction: find_file\nAction Input: todo.txt")
            .with_reply("Now read it.\nAction: read_file\nAction Input: notes/2024/todo.txt")
            .with_reply("Final Answer: Your todo list says: buy milk"),
    );

    let answer = orchestrator(&classifier, &direct, &tools, capabilities, responder(10))
        .handle(&Request::new("what is on my todo list?").unwrap())
        .await
        .unwrap();

    assert_eq!(answer.iterations, 3);
    assert_eq!(answer.tool_calls.len(), 2);
    assert!(answer.tool_calls[0].observation.contains("notes/2024/todo.txt"));
    assert_eq!(answer.tool_calls[1].observation, "buy milk");
    assert_eq!(answer.text, "Your todo list says: buy milk");
}

#[tokio::test]
async fn missing_file_is_reported_back_to_the_model() {
    let dir = tempfile::tempdir().unwrap();
    let capabilities = build_capability_set(&ToolsConfig {
        filesystem: Some(FilesystemToolsConfig {
            root: dir.path().display().to_string(),
            allow_writes: false,
            max_search_depth: 2,
        }),
        commands: vec![],
    })
    .unwrap();

    let classifier = Arc::new(ScriptedModel::choosing("sim"));
    let direct = Arc::new(ScriptedModel::new("direct"));
    let tools = Arc::new(
        ScriptedModel::new("tools")
            .with_reply("Action: read_file\nAction Input: ghost.txt")
            .with_reply("Final Answer: There is no ghost.txt"),
    );

    let answer = orchestrator(&classifier, &direct, &tools, capabilities, responder(5))
        .handle(&Request::new("read ghost.txt").unwrap())
        .await
        .unwrap();

    assert!(answer.tool_calls.is_empty());
    assert!(tools.prompts()[1]
        .user
        .contains("Observation: Tool error: Not found: 'ghost.txt' does not exist"));
}

fn workspace_tools(root: &std::path::Path) -> CapabilitySet {
    build_capability_set(&ToolsConfig {
        filesystem: Some(FilesystemToolsConfig {
            root: root.display().to_string(),
            allow_writes: false,
            max_search_depth: 4,
        }),
        commands: vec![],
    })
    .unwrap()
}

#[tokio::test]
async fn model_recovers_from_misdirected_file_tools() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("projects")).unwrap();
    std::fs::write(dir.path().join("projects/readme.md"), "hello").unwrap();

    let classifier = Arc::new(ScriptedModel::choosing("sim"));
    let direct = Arc::new(ScriptedModel::new("direct"));
    let tools = Arc::new(
        ScriptedModel::new("tools")
            .with_reply("Action: read_file\nAction Input: projects")
            .with_reply("Action: list_files\nAction Input: /tmp")
            .with_reply("Action: list_files\nAction Input: projects")
            .with_reply("Final Answer: projects holds readme.md"),
    );

    let answer = orchestrator(&classifier, &direct, &tools, workspace_tools(dir.path()), responder(10))
        .handle(&Request::new("what is in projects?").unwrap())
        .await
        .unwrap();

    assert_eq!(answer.iterations, 4);
    assert_eq!(answer.tool_calls.len(), 1);
    assert_eq!(answer.tool_calls[0].observation, "readme.md");

    let prompts = tools.prompts();
    assert!(prompts[1].user.contains("Tool error: Invalid argument: 'projects' is a directory"));
    assert!(prompts[2].user.contains("Tool error: Permission denied: path escapes the workspace: /tmp"));
}

#[cfg(unix)]
#[tokio::test]
async fn symlink_cannot_leak_files_outside_the_workspace() {
    let dir = tempfile::tempdir().unwrap();
    let outside = tempfile::tempdir().unwrap();
    std::fs::write(outside.path().join("secret.txt"), "TOP SECRET").unwrap();
    std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).unwrap();

    let classifier = Arc::new(ScriptedModel::choosing("sim"));
    let direct = Arc::new(ScriptedModel::new("direct"));
    let tools = Arc::new(
        ScriptedModel::new("tools")
            .with_reply("Action: read_file\nAction Input: link/secret.txt")
            .with_reply("Final Answer: I cannot read that file"),
    );

    let answer = orchestrator(&classifier, &direct, &tools, workspace_tools(dir.path()), responder(5))
        .handle(&Request::new("read link/secret.txt").unwrap())
        .await
        .unwrap();

    assert!(answer.tool_calls.is_empty());
    let second = &tools.prompts()[1].user;
    assert!(second.contains("Tool error: Permission denied"));
    assert!(!second.contains("TOP SECRET"));
}

// ============================================================
// Scenario 6: Concurrent requests share one orchestrator
// ============================================================

#[tokio::test]
async fn concurrent_requests_are_independent() {
    let classifier = Arc::new(ScriptedModel::new("classifier").with_choice("nao").with_choice("nao"));
    let direct = Arc::new(ScriptedModel::new("direct").repeating("ok"));
    let tools = Arc::new(ScriptedModel::new("tools"));
    let orchestrator = Arc::new(orchestrator(
        &classifier,
        &direct,
        &tools,
        echo_tools(),
        responder(5),
    ));

    let requests = vec![
        Request::new("first").unwrap(),
        Request::new("second").unwrap(),
    ];
    let mut handles = Vec::new();
    for request in requests.clone() {
        let orchestrator = Arc::clone(&orchestrator);
        handles.push(tokio::spawn(async move { orchestrator.handle(&request).await }));
    }

    let mut answered = Vec::new();
    for handle in handles {
        answered.push(handle.await.unwrap().unwrap().request_id);
    }

    for request in &requests {
        assert!(answered.contains(&request.id));
    }
    assert_eq!(classifier.structured_calls(), 2);
    assert_eq!(direct.completion_calls(), 2);
}
