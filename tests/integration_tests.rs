//! Integration tests for tfinputs.
//!
//! These tests verify the end-to-end functionality of source resolution,
//! parsing, schema generation, reporting and the CLI.

use serde_json::json;
use std::path::PathBuf;
use tfinputs::{inspect_module, BaseType, Config};

/// Get the path to the test fixtures directory.
fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn fixture(name: &str) -> String {
    fixtures_path().join(name).display().to_string()
}

mod parser_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_parse_simple_module() {
        let parsed = inspect_module(&fixture("simple"), None, None, &Config::default())
            .await
            .unwrap();

        assert_eq!(parsed.variables.len(), 3);
        assert!(parsed.warnings.is_empty(), "{:?}", parsed.warnings);
        assert!(parsed.errors.is_empty());

        let region = &parsed.variables["region"];
        assert!(!region.required());
        assert_eq!(region.default, Some(json!("us-east-1")));

        let tags = &parsed.variables["tags"];
        assert!(tags.required());
        assert_eq!(tags.var_type.base_type(), BaseType::Map);
        assert_eq!(tags.var_type.nested_type().unwrap().base_type(), BaseType::String);

        let replicas = &parsed.variables["replicas"];
        assert!(!replicas.required());
        assert_eq!(replicas.default, Some(json!(3)));
    }

    #[tokio::test]
    async fn test_broken_file_becomes_warning() {
        let parsed = inspect_module(&fixture("broken"), None, None, &Config::default())
            .await
            .unwrap();

        assert_eq!(parsed.variables.len(), 3);
        assert_eq!(parsed.warnings.len(), 1);
        assert_eq!(parsed.warnings[0].module_path, "broken.tf");
        assert!(parsed.errors.is_empty());
    }

    #[tokio::test]
    async fn test_empty_module_is_not_a_failure() {
        let parsed = inspect_module(&fixture("empty"), None, None, &Config::default())
            .await
            .unwrap();

        assert!(parsed.variables.is_empty());
        assert_eq!(parsed.warnings.len(), 1);
        assert!(parsed.warnings[0].message.contains("No variables found"));
        assert!(parsed.errors.is_empty());
    }

    #[tokio::test]
    async fn test_duplicates_last_file_wins() {
        let parsed = inspect_module(&fixture("duplicates"), None, None, &Config::default())
            .await
            .unwrap();

        assert_eq!(parsed.variables.len(), 2);
        assert_eq!(parsed.variables["instance_type"].default, Some(json!("t3.large")));
        assert_eq!(parsed.warnings.len(), 1);
        assert!(parsed.warnings[0].message.contains("instance_type"));
    }

    #[tokio::test]
    async fn test_nested_module_walk() {
        let parsed = inspect_module(&fixture("nested"), None, None, &Config::default())
            .await
            .unwrap();

        let names: Vec<&str> = parsed.variables.keys().map(String::as_str).collect();
        assert_eq!(
            names,
            vec!["cluster", "db_password", "allowed_ports", "untyped", "cidr_blocks", "environment"]
        );
        assert_eq!(
            parsed.files,
            vec![
                PathBuf::from("main.tf"),
                PathBuf::from("modules/network/variables.tf"),
                PathBuf::from("overrides.tf.json"),
            ]
        );

        let cluster = &parsed.variables["cluster"];
        let attributes = cluster.var_type.object_attributes().unwrap();
        let attr_names: Vec<&str> = attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(attr_names, vec!["name", "version", "node_groups"]);
        assert!(attributes[0].required);
        assert!(!attributes[1].required);
        assert_eq!(attributes[2].ty.to_string(), "map(object({min_size = number, max_size = number, labels = optional(map(string))}))");

        assert!(parsed.variables["db_password"].sensitive);

        let ports = &parsed.variables["allowed_ports"];
        assert_eq!(ports.var_type.to_string(), "set(number)");
        assert_eq!(ports.validation_rules.len(), 1);
        assert_eq!(ports.validation_rules[0].error_message, "Ports must be between 1 and 65535.");
        assert!(ports.validation_rules[0].condition.starts_with("alltrue("));

        assert_eq!(parsed.variables["untyped"].var_type.base_type(), BaseType::String);
        assert_eq!(
            parsed.variables["environment"].description.as_deref(),
            Some("Deployment environment")
        );
    }

    #[tokio::test]
    async fn test_subfolder_of_local_module() {
        let parsed = inspect_module(&fixture("nested"), None, Some("modules/network"), &Config::default())
            .await
            .unwrap();

        assert_eq!(parsed.variables.len(), 1);
        assert!(parsed.variables.contains_key("cidr_blocks"));
    }

    #[tokio::test]
    async fn test_unsupported_source() {
        let err = inspect_module("ftp://example.com/module.zip", None, None, &Config::default())
            .await
            .unwrap_err();
        assert!(err.is_source_error());
        assert_eq!(err.exit_code(), 16);
    }
}

mod remote_tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_http_source_is_fetched() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/modules/variables.tf"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "variable \"bucket_name\" {\n  type = string\n}\n",
            ))
            .mount(&server)
            .await;

        let source = format!("{}/modules/variables.tf", server.uri());
        let parsed = inspect_module(&source, None, None, &Config::default())
            .await
            .unwrap();

        assert!(parsed.variables["bucket_name"].required());
        assert_eq!(parsed.files, vec![PathBuf::from("variables.tf")]);
    }

    #[tokio::test]
    async fn test_s3_source_uses_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/my-bucket/vpc/variables.tf"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "variable \"vpc_cidr\" {\n  default = \"10.0.0.0/16\"\n}\n",
            ))
            .mount(&server)
            .await;

        let mut config = Config::default();
        config.fetch.s3_endpoint = Some(server.uri());
        let parsed = inspect_module("s3://my-bucket/vpc/variables.tf", None, None, &config)
            .await
            .unwrap();

        assert!(!parsed.variables["vpc_cidr"].required());
    }

    #[tokio::test]
    async fn test_http_failure_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = inspect_module(&format!("{}/missing.tf", server.uri()), None, None, &Config::default())
            .await
            .unwrap_err();
        assert!(err.is_source_error());
    }
}

mod schema_tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{Map, Value};

    #[tokio::test]
    async fn test_examples_validate_against_module_schema() {
        let parsed = inspect_module(&fixture("nested"), None, None, &Config::default())
            .await
            .unwrap();
        let schema = parsed.to_json_schema();

        let instance: Map<String, Value> = parsed
            .variables
            .iter()
            .map(|(name, var)| (name.clone(), var.var_type.generate_example()))
            .collect();
        assert!(jsonschema::is_valid(&schema, &Value::Object(instance)));

        assert_eq!(schema["required"], json!(["cluster", "db_password", "cidr_blocks"]));
        assert_eq!(schema["properties"]["allowed_ports"]["default"], json!([443]));
    }

    #[tokio::test]
    async fn test_missing_required_input_is_rejected() {
        let parsed = inspect_module(&fixture("simple"), None, None, &Config::default())
            .await
            .unwrap();
        let schema = parsed.to_json_schema();

        assert!(jsonschema::is_valid(&schema, &json!({"tags": {"team": "core"}})));
        assert!(!jsonschema::is_valid(&schema, &json!({"region": "eu-west-1"})));
        assert!(!jsonschema::is_valid(&schema, &json!({"tags": {"team": 1}})));
    }
}

mod reporter_tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tfinputs::reporter::Reporter;
    use tfinputs::ReportFormat;

    #[tokio::test]
    async fn test_all_formats_render() {
        let mut config = Config::default();
        config.output.colored = false;
        let parsed = inspect_module(&fixture("simple"), None, None, &config).await.unwrap();
        let reporter = Reporter::new(&config);

        let text = reporter.generate(&parsed, ReportFormat::Text).unwrap();
        assert!(text.contains("3 Variables (1 required)"));

        let report: serde_json::Value =
            serde_json::from_str(&reporter.generate(&parsed, ReportFormat::Json).unwrap()).unwrap();
        assert_eq!(report["summary"]["total_variables"], 3);

        let args: serde_json::Value =
            serde_json::from_str(&reporter.generate(&parsed, ReportFormat::Args).unwrap()).unwrap();
        assert_eq!(args[2]["description"], "(default: 3)");
        assert_eq!(args[2]["default"], 3);
    }
}

mod config_tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tfinputs::config::ConverterMode;

    #[test]
    fn test_config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tfinputs.yaml");
        std::fs::write(&path, Config::example_yaml()).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.converter.mode, ConverterMode::Native);
        assert_eq!(config.scan.concurrency, 4);
    }

    #[tokio::test]
    async fn test_exclude_patterns_applied() {
        let mut config = Config::default();
        config.scan.exclude_patterns = vec!["modules/*".to_string(), "*.tf.json".to_string()];
        let parsed = inspect_module(&fixture("nested"), None, None, &config).await.unwrap();

        assert!(!parsed.variables.contains_key("cidr_blocks"));
        assert!(!parsed.variables.contains_key("environment"));
        assert_eq!(parsed.files, vec![PathBuf::from("main.tf")]);
    }
}

mod cli_tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use assert_cmd::Command;
    use predicates::prelude::*;

    fn tfinputs() -> Command {
        let mut cmd = Command::cargo_bin("tfinputs").unwrap();
        cmd.env_remove("RUST_LOG")
            .env_remove("TFINPUTS_CONFIG")
            .env_remove("GH_TOKEN")
            .env_remove("GL_TOKEN");
        cmd
    }

    #[test]
    fn test_inspect_text() {
        tfinputs()
            .args(["inspect", &fixture("simple"), "--no-color"])
            .assert()
            .success()
            .stdout(predicate::str::contains("region"))
            .stdout(predicate::str::contains("map(string)"));
    }

    #[test]
    fn test_inspect_schema_is_json() {
        let output = tfinputs()
            .args(["inspect", &fixture("simple"), "--format", "schema"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let schema: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(schema["required"], json!(["tags"]));
    }

    #[test]
    fn test_strict_mode_fails_on_warnings() {
        tfinputs()
            .args(["inspect", &fixture("broken"), "--no-color"])
            .assert()
            .success();

        tfinputs()
            .args(["inspect", &fixture("broken"), "--no-color", "--strict"])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("broken.tf"));
    }

    #[test]
    fn test_unsupported_source_exit_code() {
        tfinputs()
            .args(["inspect", "ftp://example.com/module.zip"])
            .assert()
            .code(16)
            .stderr(predicate::str::contains("Unsupported or invalid source"));
    }

    #[test]
    fn test_validate_command() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.yaml");
        std::fs::write(&good, "scan:\n  concurrency: 2\n").unwrap();
        let bad = dir.path().join("bad.yaml");
        std::fs::write(&bad, "scan:\n  concurrency: 0\n").unwrap();

        tfinputs()
            .args(["validate", good.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration is valid"));

        tfinputs()
            .args(["validate", bad.to_str().unwrap()])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("scan.concurrency"));
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();

        tfinputs().current_dir(dir.path()).arg("init").assert().success();
        assert!(dir.path().join("tfinputs.yaml").exists());

        tfinputs()
            .current_dir(dir.path())
            .arg("init")
            .assert()
            .failure()
            .stderr(predicate::str::contains("already exists"));
    }

    #[cfg(unix)]
    #[test]
    fn test_github_token_never_leaks() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let argv_log = dir.path().join("argv.log");
        let git = dir.path().join("fake-git");
        let script = format!(
            "#!/bin/sh\nprintf '%s\\n' \"$*\" >> '{}'\necho \"fatal: unable to access '$6': 403\" >&2\nexit 128\n",
            argv_log.display()
        );
        std::fs::write(&git, script).unwrap();
        std::fs::set_permissions(&git, std::fs::Permissions::from_mode(0o755)).unwrap();

        let config = dir.path().join("tfinputs.yaml");
        std::fs::write(&config, format!("git:\n  binary: {}\n", git.display())).unwrap();

        let output = tfinputs()
            .env("GH_TOKEN", "ghp_leakcheck123")
            .args(["-vvv", "--config", config.to_str().unwrap()])
            .args(["inspect", "https://github.com/org/private-module"])
            .output()
            .unwrap();

        assert_eq!(output.status.code(), Some(17));
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("403"));
        assert!(!stdout.contains("ghp_leakcheck123"));
        assert!(!stderr.contains("ghp_leakcheck123"));

        // The token did reach git itself
        let argv = std::fs::read_to_string(&argv_log).unwrap();
        assert!(argv.contains("https://ghp_leakcheck123@github.com/org/private-module"));
    }
}
