//! CLI integration tests for the ramler binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("ramler"))
}

const API: &str = r#"{
    "title": "Test!",
    "traits": [{ "teapot": { "responses": { "418": { "description": "I'm a teapot" } } } }],
    "securitySchemes": [{ "basic": { "description": "Basic auth" } }],
    "documentation": [{ "title": "Getting Started", "content": "Hello" }],
    "resources": [{
        "relativeUri": "/users",
        "methods": [{
            "method": "post",
            "is": ["teapot"],
            "body": {
                "application/x-www-form-urlencoded": {
                    "formParameters": { "name": { "type": "string", "required": true } }
                }
            }
        }],
        "resources": [{ "relativeUri": "/{userId}", "methods": [{ "method": "get" }] }]
    }]
}"#;

// Helper to create a temp file
fn write_temp_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

mod expand_command {
    use super::*;

    #[test]
    fn prints_page_data() {
        let dir = TempDir::new().unwrap();
        let api = write_temp_file(&dir, "api.json", API);

        cmd()
            .args(["expand", api.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""dir":"/resource/users""#))
            .stdout(predicate::str::contains(
                r#""dir":"/resource/users/--userId--""#,
            ))
            .stdout(predicate::str::contains("418"));
    }

    #[test]
    fn pretty_output_to_file() {
        let dir = TempDir::new().unwrap();
        let api = write_temp_file(&dir, "api.json", API);
        let output = dir.path().join("pages.json");

        cmd()
            .args([
                "expand",
                api.to_str().unwrap(),
                "--pretty",
                "--web-root",
                "/productA/",
                "--output",
                output.to_str().unwrap(),
            ])
            .assert()
            .success();

        let content = fs::read_to_string(&output).unwrap();
        assert!(content.contains('\n'));
        let pages: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(pages["resources"][0]["dir"], "/productA/resource/users");
        assert_eq!(
            pages["security_schemes"][0]["dir"],
            "/productA/security/basic"
        );
    }

    #[test]
    fn schema_uri_is_used_for_synthesis() {
        let dir = TempDir::new().unwrap();
        let api = write_temp_file(&dir, "api.json", API);

        cmd()
            .args([
                "expand",
                api.to_str().unwrap(),
                "--schema-uri",
                "http://example.com/schema#",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("http://example.com/schema#"));
    }

    #[test]
    fn web_root_without_trailing_slash_fails() {
        let dir = TempDir::new().unwrap();
        let api = write_temp_file(&dir, "api.json", API);

        cmd()
            .args(["expand", api.to_str().unwrap(), "--web-root", "/docs"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("must end with"));
    }

    #[test]
    fn missing_file_exit_code() {
        cmd()
            .args(["expand", "/nonexistent/api.json"])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("file not found"));
    }

    #[test]
    fn invalid_json_exit_code() {
        let dir = TempDir::new().unwrap();
        let api = write_temp_file(&dir, "api.json", "{ not json");

        cmd()
            .args(["expand", api.to_str().unwrap()])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("invalid JSON"));
    }

    #[test]
    fn unknown_trait_exit_code() {
        let dir = TempDir::new().unwrap();
        let api = write_temp_file(
            &dir,
            "api.json",
            r#"{"resources": [{"relativeUri": "/r", "methods": [{"method": "get", "is": ["nonexistent"]}]}]}"#,
        );

        cmd()
            .args(["expand", api.to_str().unwrap()])
            .assert()
            .code(1)
            .stderr(predicate::str::contains(r#"unknown trait "nonexistent""#));
    }
}

mod export_command {
    use super::*;

    #[test]
    fn writes_json_and_raml() {
        let dir = TempDir::new().unwrap();
        let api = write_temp_file(&dir, "api.json", API);
        let dest = dir.path().join("out");

        cmd()
            .args([
                "export",
                api.to_str().unwrap(),
                "--dest",
                dest.to_str().unwrap(),
                "--basename",
                "users",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("users.json"))
            .stdout(predicate::str::contains("users.raml"));

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dest.join("users.json")).unwrap()).unwrap();
        assert!(json["/users"].get("post").is_some());
        assert!(json["/users"]["/{userId}"].get("get").is_some());

        let raml = fs::read_to_string(dest.join("users.raml")).unwrap();
        assert!(raml.starts_with("#%RAML 0.8\n"));
        assert!(!raml.contains("relativeUri"));
    }
}

mod build_command {
    use super::*;

    #[test]
    fn builds_every_configured_document() {
        let dir = TempDir::new().unwrap();
        write_temp_file(&dir, "api.json", API);
        write_temp_file(&dir, "productB/api.json", API);
        let config = write_temp_file(
            &dir,
            "_config.yml",
            r#"
ramler_api_paths:
  api.json: /
  productB/api.json: /productB/
page_dirs:
  resource: endpoints
ramler_downloadable_descriptor_basenames:
  productB/api.json: product-b
"#,
        );
        let dest = dir.path().join("_site");

        cmd()
            .args([
                "build",
                "--config",
                config.to_str().unwrap(),
                "--dest",
                dest.to_str().unwrap(),
            ])
            .assert()
            .success();

        assert!(dest.join("endpoints/users/index.json").is_file());
        assert!(dest.join("endpoints/users/--userId--/index.json").is_file());
        assert!(dest.join("security/basic/index.json").is_file());
        assert!(dest.join("overview/Getting_Started/index.json").is_file());
        assert!(dest.join("api.json").is_file());
        assert!(dest.join("api.raml").is_file());
        assert!(dest.join("productB/endpoints/users/index.json").is_file());
        assert!(dest.join("productB/product-b.json").is_file());
        assert!(dest.join("productB/product-b.raml").is_file());

        let page: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(dest.join("endpoints/users/index.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(page["path"], "/users");
        assert_eq!(page["methods"][0]["method"], "post");
    }

    #[test]
    fn invalid_web_root_fails_before_processing() {
        let dir = TempDir::new().unwrap();
        let config = write_temp_file(
            &dir,
            "_config.yml",
            "ramler_api_paths:\n  api.json: /docs\n",
        );
        let dest = dir.path().join("_site");

        cmd()
            .args([
                "build",
                "--config",
                config.to_str().unwrap(),
                "--dest",
                dest.to_str().unwrap(),
            ])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("must end with"));

        assert!(!dest.exists());
    }

    #[test]
    fn missing_document_fails() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("_site");

        cmd()
            .current_dir(dir.path())
            .args(["build", "--dest", dest.to_str().unwrap()])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("file not found"));
    }
}
