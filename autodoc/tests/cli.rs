use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::{read_to_string, write};
use std::path::Path;
use tempfile::tempdir;

const CREDENTIAL_VARS: [&str; 8] = [
    "ANTHROPIC_API_KEY",
    "OPENAI_API_KEY",
    "CONFLUENCE_BASE_URL",
    "CONFLUENCE_USERNAME",
    "CONFLUENCE_API_TOKEN",
    "CONFLUENCE_SPACE_KEY",
    "GITHUB_REPOSITORY",
    "RUST_LOG",
];

/// The binary, isolated from any credentials or `.env` in the developer's shell.
fn autodoc(cwd: &Path) -> Command {
    let mut cmd = Command::cargo_bin("autodoc").expect("Binary exists");
    cmd.current_dir(cwd);
    for var in CREDENTIAL_VARS {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn cli_without_credentials_writes_fallback_documentation() {
    let dir = tempdir().unwrap();
    write(dir.path().join("app.py"), "print('hello')\n").unwrap();
    write(dir.path().join("config.yaml"), "debug: true\n").unwrap();

    autodoc(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No LLM API key configured"));

    let docs = read_to_string(dir.path().join("generated_docs.md")).expect("docs written");
    assert!(docs.contains("# Project Documentation"));
    assert!(docs.contains("- `app.py`"));
    assert!(docs.contains("## Configuration Files"));
}

#[test]
fn cli_honours_path_and_output_flags() {
    let code = tempdir().unwrap();
    let out = tempdir().unwrap();
    write(code.path().join("index.ts"), "export {};\n").unwrap();
    let output = out.path().join("site/README.generated.md");

    autodoc(out.path())
        .arg("--path")
        .arg(code.path())
        .arg("--output")
        .arg(&output)
        .arg("--verbose")
        .assert()
        .success();

    assert!(read_to_string(&output).unwrap().contains("### TS Files"));
    assert!(!out.path().join("generated_docs.md").exists());
}

#[test]
fn cli_fails_when_no_files_are_found() {
    let dir = tempdir().unwrap();
    write(dir.path().join("notes.txt"), "nothing to document\n").unwrap();

    autodoc(dir.path())
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("no files found to analyze"));

    assert!(!dir.path().join("generated_docs.md").exists());
}

#[test]
fn cli_rejects_an_invalid_config_file() {
    let dir = tempdir().unwrap();
    write(dir.path().join("app.py"), "pass\n").unwrap();
    write(dir.path().join("autodoc.yaml"), "bogus_section: 1\n").unwrap();

    autodoc(dir.path())
        .arg("--config")
        .arg("autodoc.yaml")
        .assert()
        .failure();
}

#[test]
fn cli_help_lists_flags() {
    let dir = tempdir().unwrap();
    autodoc(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("--path")
                .and(predicate::str::contains("--output"))
                .and(predicate::str::contains("--verbose")),
        );
}

use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{layer::Context, Layer, Registry};

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        use std::fmt::Write as FmtWrite;
        let mut msg = String::new();
        let _ = write!(&mut msg, "{:?}", event);
        self.events.lock().unwrap().push(msg);
    }
}

#[tokio::test]
async fn emits_trace_initialised_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use autodoc::cli::{run, Cli};

    // A config file that does not exist stops the run right after startup.
    let cli = Cli {
        path: None,
        output: None,
        verbose: false,
        config: Some(std::path::PathBuf::from("dummy.yaml")),
    };

    let _ = run(cli).await;

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
}
