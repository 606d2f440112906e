use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

const FALLBACK: &str = "Unable to retrieve UDL guidelines at this time. Please proceed with general instructional design principles.";

fn udl_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("udl");
    path
}

fn write_corpus(root: &Path) {
    let data_dir = root.join("data");
    fs::create_dir_all(&data_dir).unwrap();

    let choice: Vec<String> = (0..9)
        .map(|i| format!("Step {}: offer learners meaningful choices about topics, pacing, and project formats so motivation and interest stay high throughout the course.", i))
        .collect();
    let perception: Vec<String> = (0..9)
        .map(|i| format!("Step {}: present diagrams, captions, and transcripts alongside spoken lectures so perception of visual and auditory information is never a barrier.", i))
        .collect();

    let corpus = serde_json::json!([
        {
            "url": "https://udlguidelines.cast.org/engagement/interests-identities/choice-autonomy",
            "title": "Optimize Choice and Autonomy",
            "content": choice.join(" "),
            "principle": "Engagement",
            "guideline_number": "7.1",
            "guideline_name": "Optimize individual choice and autonomy"
        },
        {
            "url": "https://udlguidelines.cast.org/representation/perception",
            "title": "Perception",
            "content": perception.join(" ")
        }
    ]);
    fs::write(
        data_dir.join("udl_guidelines.json"),
        serde_json::to_string_pretty(&corpus).unwrap(),
    )
    .unwrap();
}

fn setup_test_env(provider: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();
    write_corpus(&root);

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[corpus]
path = "{root}/data/udl_guidelines.json"

[cache]
path = "{root}/data/embeddings_cache.json"

[embedding]
provider = "{provider}"
dims = 256

[retrieval]
top_k = 2

[logging]
level = "warn"
"#,
        root = root.display(),
        provider = provider,
    );

    let config_path = config_dir.join("udl.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_udl(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = udl_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("OPENAI_API_KEY")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run udl binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_init_builds_cache() {
    let (tmp, config_path) = setup_test_env("hashing");

    let (stdout, stderr, success) = run_udl(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("\"chunkCount\": 4"), "stdout={}", stdout);
    assert!(stdout.contains("\"embeddingDimensions\": 256"));
    assert!(stdout.contains("\"cacheExists\": true"));
    assert!(tmp.path().join("data/embeddings_cache.json").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env("hashing");

    let (_, _, success1) = run_udl(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (stdout, _, success2) = run_udl(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
    assert!(stdout.contains("\"chunkCount\": 4"));
}

#[test]
fn test_stats_does_not_initialize() {
    let (tmp, config_path) = setup_test_env("hashing");

    let (stdout, _, success) = run_udl(&config_path, &["stats"]);
    assert!(success);
    assert!(stdout.contains("\"chunkCount\": 0"));
    assert!(stdout.contains("\"cacheExists\": false"));
    assert!(!tmp.path().join("data/embeddings_cache.json").exists());
}

#[test]
fn test_search_prints_formatted_guidelines() {
    let (_tmp, config_path) = setup_test_env("hashing");

    let (stdout, stderr, success) = run_udl(
        &config_path,
        &["search", "captions and transcripts for lectures"],
    );
    assert!(success, "search failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.starts_with("Relevant UDL Guidelines:\n\n[Result 1]"));
    assert!(stdout.contains("Source: Perception"));
    assert!(stdout.contains("Principle: Representation"));
    assert!(stdout.contains("[Result 2]"));
    assert!(!stdout.contains("[Result 3]"));
}

#[test]
fn test_search_top_k_flag() {
    let (_tmp, config_path) = setup_test_env("hashing");

    let (stdout, _, success) = run_udl(
        &config_path,
        &["search", "learner choice and motivation", "--top-k", "1"],
    );
    assert!(success);
    assert!(stdout.contains("**UDL Guideline 7.1**: Optimize individual choice and autonomy"));
    assert!(!stdout.contains("[Result 2]"));
}

#[test]
fn test_search_with_disabled_provider_falls_back() {
    let (_tmp, config_path) = setup_test_env("disabled");

    let (stdout, _, success) = run_udl(&config_path, &["search", "engagement strategies"]);
    assert!(success, "search must not fail on retrieval errors");
    assert_eq!(stdout.trim(), FALLBACK);
}

#[test]
fn test_init_with_disabled_provider_fails() {
    let (_tmp, config_path) = setup_test_env("disabled");

    let (_, stderr, success) = run_udl(&config_path, &["init"]);
    assert!(!success);
    assert!(stderr.contains("disabled"), "stderr={}", stderr);
}

#[test]
fn test_status_reports_initialized() {
    let (_tmp, ok_config) = setup_test_env("hashing");
    let (stdout, _, success) = run_udl(&ok_config, &["status"]);
    assert!(success);
    assert!(stdout.contains("\"initialized\": true"));

    let (_tmp2, bad_config) = setup_test_env("disabled");
    let (stdout, _, success) = run_udl(&bad_config, &["status"]);
    assert!(success);
    assert!(stdout.contains("\"initialized\": false"));
}

#[test]
fn test_chunk_reports_counts_without_cache() {
    let (tmp, config_path) = setup_test_env("disabled");

    let (stdout, stderr, success) = run_udl(&config_path, &["chunk"]);
    assert!(success, "chunk failed: stderr={}", stderr);
    assert!(stdout.contains("documents: 2"));
    assert!(stdout.contains("chunks: 4"));
    assert!(!tmp.path().join("data/embeddings_cache.json").exists());
}

#[test]
fn test_cache_clear_and_rebuild() {
    let (tmp, config_path) = setup_test_env("hashing");
    let cache = tmp.path().join("data/embeddings_cache.json");

    let (stdout, _, success) = run_udl(&config_path, &["cache", "clear"]);
    assert!(success);
    assert!(stdout.contains("No cache at"));

    run_udl(&config_path, &["init"]);
    assert!(cache.exists());

    let (stdout, _, success) = run_udl(&config_path, &["cache", "clear"]);
    assert!(success);
    assert!(stdout.contains("Removed"));
    assert!(!cache.exists());

    let (stdout, stderr, success) = run_udl(&config_path, &["cache", "rebuild"]);
    assert!(success, "rebuild failed: stderr={}", stderr);
    assert!(stdout.contains("\"chunkCount\": 4"));
    assert!(cache.exists());
}

#[test]
fn test_invalid_config_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("udl.toml");
    fs::write(&config_path, "[embedding]\nprovider = \"telepathy\"\n").unwrap();

    let (_, stderr, success) = run_udl(&config_path, &["stats"]);
    assert!(!success);
    assert!(stderr.contains("Unknown embedding provider"), "stderr={}", stderr);
}
