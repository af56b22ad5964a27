use predicates::prelude::*;
use serde_json::Value;
use std::process::Command;
use tempfile::TempDir;

fn cmd() -> assert_cmd::Command {
    assert_cmd::Command::from(Command::new(env!("CARGO_BIN_EXE_dsldoc")))
}

fn fixture_path(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn stdout_json(assert: &assert_cmd::assert::Assert) -> Value {
    serde_json::from_slice(&assert.get_output().stdout).unwrap()
}

fn read_json(path: &std::path::Path) -> Value {
    let text = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("{}: {e}", path.display()));
    serde_json::from_str(&text).unwrap()
}

// -- query --

#[test]
fn query_prints_whole_default_version() {
    let assert = cmd()
        .arg("query")
        .arg(fixture_path("decls"))
        .assert()
        .success();
    let tree = stdout_json(&assert);
    assert_eq!(tree["docs"]["name"], "Another DOC");
    assert_eq!(tree["docs"]["doc_url"], "/apipie-dsl/1.0");
    let ids: Vec<&String> = tree["docs"]["classes"].as_object().unwrap().keys().collect();
    assert_eq!(ids, vec!["IO", "User"]);
}

#[test]
fn query_single_method_across_files() {
    let assert = cmd()
        .args(["query", "--class", "IO", "--method", "write"])
        .arg(fixture_path("decls/*.json"))
        .assert()
        .success();
    let tree = stdout_json(&assert);
    let methods = tree["docs"]["classes"]["IO"]["methods"].as_array().unwrap();
    assert_eq!(methods.len(), 1);
    let write = &methods[0];
    assert_eq!(write["params"][1]["params"][0]["full_name"], "options[mode]");
    // the see link points into the other file's class
    assert_eq!(write["see"][0]["link"], "/apipie-dsl/1.0/User/find");
}

#[test]
fn query_with_config_language_and_prefix() {
    let assert = cmd()
        .args(["--config", &fixture_path("dsldoc.toml")])
        .args(["query", "--class", "IO", "--lang", "de", "--prefix", "/app"])
        .arg(fixture_path("decls"))
        .assert()
        .success();
    let tree = stdout_json(&assert);
    let docs = &tree["docs"];
    assert_eq!(docs["name"], "Scripting DSL");
    assert_eq!(docs["info"], "Automation scripting");
    let io = &docs["classes"]["IO"];
    assert_eq!(io["doc_url"], "/app/dsl-doc/2.0/IO");
    assert_eq!(io["methods"][0]["short_description"], "Schreibt Daten");
}

#[test]
fn query_section_filters_classes() {
    let assert = cmd()
        .args(["query", "--section", "models"])
        .arg(fixture_path("decls"))
        .assert()
        .success();
    let tree = stdout_json(&assert);
    let ids: Vec<&String> = tree["docs"]["classes"].as_object().unwrap().keys().collect();
    assert_eq!(ids, vec!["User"]);
}

#[test]
fn query_unknown_class_gives_empty_tree() {
    let assert = cmd()
        .args(["query", "--class", "Nope"])
        .arg(fixture_path("decls"))
        .assert()
        .success();
    let tree = stdout_json(&assert);
    assert!(tree["docs"]["classes"].as_object().unwrap().is_empty());
}

#[test]
fn query_rejects_path_like_keys() {
    cmd()
        .args(["query", "--class", "../etc"])
        .arg(fixture_path("decls"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("../etc"));
}

#[test]
fn method_without_class_is_a_usage_error() {
    cmd()
        .args(["query", "--method", "write"])
        .arg(fixture_path("decls"))
        .assert()
        .failure();
}

#[test]
fn no_matching_files_fails() {
    cmd()
        .args(["query", "/nonexistent/*.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no declaration files found"));
}

#[test]
fn html_markup_renders_descriptions() {
    let dir = TempDir::new().unwrap();
    let decls = dir.path().join("decls.json");
    std::fs::write(
        &decls,
        r#"{"classes": [{"name": "Doc", "description": "Uses `code` & more"}]}"#,
    )
    .unwrap();
    let assert = cmd()
        .args(["--markup", "html", "query"])
        .arg(&decls)
        .assert()
        .success();
    let tree = stdout_json(&assert);
    assert_eq!(
        tree["docs"]["classes"]["Doc"]["full_description"],
        "<p>Uses <code>code</code> &amp; more</p>"
    );
}

// -- generate --

#[test]
fn generate_writes_version_class_and_method_pages() {
    let dir = TempDir::new().unwrap();
    cmd()
        .args(["generate", "-o", dir.path().to_str().unwrap()])
        .arg(fixture_path("decls"))
        .assert()
        .success();

    for version in ["1.0", "2.0"] {
        let index = read_json(&dir.path().join(format!("{version}.json")));
        assert_eq!(index["docs"]["classes"].as_object().unwrap().len(), 2);

        let class = read_json(&dir.path().join(version).join("IO.json"));
        assert_eq!(class["docs"]["classes"]["IO"]["version"], version);

        let method = read_json(&dir.path().join(version).join("IO").join("exists?.json"));
        let methods = method["docs"]["classes"]["IO"]["methods"].as_array().unwrap();
        assert_eq!(methods.len(), 1);
        assert_eq!(
            methods[0]["doc_url"],
            format!("/apipie-dsl/{version}/IO/exists%3F")
        );
    }
    assert!(dir.path().join("1.0").join("all.json").is_file());
}

#[test]
fn generate_per_language_and_section() {
    let dir = TempDir::new().unwrap();
    cmd()
        .args(["--config", &fixture_path("dsldoc.toml")])
        .args(["generate", "--version", "2.0", "-o", dir.path().to_str().unwrap()])
        .arg(fixture_path("decls"))
        .assert()
        .success();

    assert!(!dir.path().join("1.0.json").exists());
    let german = read_json(&dir.path().join("2.0").join("IO").join("write.de.json"));
    assert_eq!(
        german["docs"]["classes"]["IO"]["methods"][0]["short_description"],
        "Schreibt Daten"
    );
    let models = read_json(&dir.path().join("2.0").join("models.json"));
    let ids: Vec<&String> = models["docs"]["classes"].as_object().unwrap().keys().collect();
    assert_eq!(ids, vec!["User"]);
}

// -- check --

#[test]
fn check_clean_declarations() {
    cmd()
        .arg("check")
        .arg(fixture_path("decls"))
        .assert()
        .success()
        .stdout(predicate::str::contains("ok: 2 version(s) built"));
}

#[test]
fn check_reports_failures_but_only_fails_when_strict() {
    cmd()
        .arg("check")
        .arg(fixture_path("broken"))
        .assert()
        .success()
        .stdout(predicate::str::contains("failed: method Report#export"));

    cmd()
        .args(["check", "--strict"])
        .arg(fixture_path("broken"))
        .assert()
        .failure()
        .stdout(predicate::str::contains("more than once"));
}

#[test]
fn failed_method_does_not_stop_the_rest() {
    let assert = cmd()
        .args(["query", "--class", "Report"])
        .arg(fixture_path("broken"))
        .assert()
        .success();
    let tree = stdout_json(&assert);
    let methods = tree["docs"]["classes"]["Report"]["methods"].as_array().unwrap();
    assert_eq!(methods.len(), 1);
    assert_eq!(methods[0]["name"], "render");
}

#[test]
fn check_arguments_of_a_method() {
    cmd()
        .args(["check", "--method", "IO#write", "--args", r#"{"path": "a.txt", "options": {"mode": "a"}}"#])
        .arg(fixture_path("decls"))
        .assert()
        .success()
        .stdout(predicate::str::contains("ok: IO#write"));

    cmd()
        .args(["check", "--method", "IO#write", "--args", r#"{"path": "a.txt", "options": {"mode": "x"}}"#])
        .arg(fixture_path("decls"))
        .assert()
        .failure()
        .stdout(predicate::str::contains("invalid parameter 'options[mode]'"));
}

#[test]
fn check_presence_and_extra_keys() {
    cmd()
        .args(["check", "--presence", "--method", "IO#write", "--args", "{}"])
        .arg(fixture_path("decls"))
        .assert()
        .failure()
        .stdout(predicate::str::contains("path"));

    cmd()
        .args(["check", "--no-extra", "--method", "IO#write", "--args", r#"{"path": "a", "force": true}"#])
        .arg(fixture_path("decls"))
        .assert()
        .failure()
        .stdout(predicate::str::contains("unknown parameter force"));
}

#[test]
fn check_arguments_from_file() {
    let dir = TempDir::new().unwrap();
    let args = dir.path().join("args.json");
    std::fs::write(&args, r#"{"path": 42}"#).unwrap();
    cmd()
        .args(["check", "--method", "IO#write", "--args"])
        .arg(format!("@{}", args.display()))
        .arg(fixture_path("decls"))
        .assert()
        .failure()
        .stdout(predicate::str::contains("invalid parameter 'path'"));
}
