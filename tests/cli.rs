use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::TempDir;

fn sahayak_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_sahayak"))
}

const SCHEME_DOC: &str = "Scheme: PM-KISAN

PM-KISAN provides an income support benefit of Rs. 6,000 per year to landholding farmer families.

Eligibility: all landholding farmer families with cultivable land in their names are eligible.

Farmers register on the PM-KISAN portal with Aadhaar, land records and bank account details.";

/// A scheme document plus a keyword-only config (no network).
fn setup_test_env() -> (TempDir, PathBuf, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    let config_path = config_dir.join("sahayak.toml");
    fs::write(
        &config_path,
        r#"[llm]
provider = "disabled"

[chunking]
qa_max_chars = 120
qa_overlap_chars = 20
"#,
    )
    .unwrap();

    let doc_path = root.join("pmkisan.txt");
    fs::write(&doc_path, SCHEME_DOC).unwrap();

    (tmp, config_path, doc_path)
}

fn command(config_path: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::new(sahayak_binary());
    cmd.arg("--config")
        .arg(config_path)
        .args(args)
        .env_remove("SAHAYAK_PROVIDER")
        .env_remove("RUST_LOG")
        .env("LOG_LEVEL", "warn");
    cmd
}

fn run_sahayak(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let output = command(config_path, args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run sahayak binary: {}", e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_ask_eligibility_without_model() {
    let (_tmp, config_path, doc) = setup_test_env();

    let (stdout, stderr, success) = run_sahayak(
        &config_path,
        &["ask", doc.to_str().unwrap(), "Who is eligible for this scheme?"],
    );
    assert!(success, "ask failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.starts_with("Based on the document, here's what I found about eligibility:"));
}

#[test]
fn test_ask_unknown_topic_reports_not_found() {
    let (_tmp, config_path, doc) = setup_test_env();

    let (stdout, _, success) = run_sahayak(&config_path, &["ask", doc.to_str().unwrap(), "xyzzy"]);
    assert!(success);
    assert!(stdout.contains("I couldn't find specific information"));
}

#[test]
fn test_ask_full_text_lists_matches() {
    let (_tmp, config_path, doc) = setup_test_env();

    let (stdout, stderr, success) = run_sahayak(
        &config_path,
        &["ask", doc.to_str().unwrap(), "aadhaar", "--full-text"],
    );
    assert!(success, "ask failed: stderr={}", stderr);
    assert!(stdout.contains("Full-text matches:"));
    assert!(stdout.contains("(1/1 keywords)"));
}

#[test]
fn test_ask_blank_question_is_reported() {
    let (_tmp, config_path, doc) = setup_test_env();

    let (stdout, _, success) = run_sahayak(&config_path, &["ask", doc.to_str().unwrap(), "  "]);
    assert!(success);
    assert!(stdout.contains("Error: Please enter a valid question."));
}

#[test]
fn test_chat_reads_questions_until_exit() {
    let (_tmp, config_path, doc) = setup_test_env();

    let mut child = command(&config_path, &["chat", doc.to_str().unwrap()])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"What are the benefits?\nWho is eligible?\nexit\nHow to apply?\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("here's what I found about benefits"));
    assert!(stdout.contains("here's what I found about eligibility"));
    assert!(!stdout.contains("the application process"));
}

#[test]
fn test_summarize_without_model_degrades() {
    let (_tmp, config_path, doc) = setup_test_env();

    let (stdout, stderr, success) =
        run_sahayak(&config_path, &["summarize", doc.to_str().unwrap(), "--json"]);
    assert!(success, "summarize failed: stderr={}", stderr);

    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["english"], "Error: Could not analyze the scheme content.");
    assert_eq!(json["telugu"], "Translation not available.");
    assert_eq!(json["analysis"]["scheme_name"], "PM-KISAN");
    assert_eq!(json["analysis"]["confidence_score"], 0.0);
}

#[test]
fn test_missing_config_file_uses_defaults() {
    let (tmp, _, doc) = setup_test_env();
    let missing = tmp.path().join("config").join("absent.toml");

    let (stdout, stderr, success) = run_sahayak(
        &missing,
        &["--provider", "disabled", "ask", doc.to_str().unwrap(), "What are the benefits?"],
    );
    assert!(success, "ask failed: stderr={}", stderr);
    assert!(stdout.contains("here's what I found about benefits"));
}

#[test]
fn test_missing_document_fails() {
    let (tmp, config_path, _) = setup_test_env();
    let missing = tmp.path().join("nope.pdf");

    let (_, stderr, success) =
        run_sahayak(&config_path, &["ask", missing.to_str().unwrap(), "Who is eligible?"]);
    assert!(!success);
    assert!(stderr.contains("nope.pdf"));
}

#[test]
fn test_invalid_thresholds_rejected() {
    let (tmp, _, doc) = setup_test_env();
    let config_path = tmp.path().join("config").join("bad.toml");
    fs::write(
        &config_path,
        "[llm]\nprovider = \"disabled\"\n\n[retrieval]\nhigh_threshold = 0.2\nlow_threshold = 0.4\n",
    )
    .unwrap();

    let (_, stderr, success) =
        run_sahayak(&config_path, &["ask", doc.to_str().unwrap(), "Who is eligible?"]);
    assert!(!success);
    assert!(stderr.contains("low_threshold"));
}

#[test]
fn test_openrouter_requires_api_key() {
    let (tmp, _, doc) = setup_test_env();
    let config_path = tmp.path().join("config").join("remote.toml");
    fs::write(
        &config_path,
        "[llm]\nprovider = \"openrouter\"\napi_key_env = \"SAHAYAK_TEST_UNSET_KEY\"\n",
    )
    .unwrap();

    let output = command(&config_path, &["ask", doc.to_str().unwrap(), "Who is eligible?"])
        .env_remove("SAHAYAK_TEST_UNSET_KEY")
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("SAHAYAK_TEST_UNSET_KEY"));
}
