use modcat::cli::BuildArgs;
use modcat::load_config::{load_config, resolve_build_config, TOKEN_ENV};
use modcat_core::github::{DEFAULT_API_URL, DEFAULT_GRAPHQL_URL};
use serial_test::serial;
use std::env;
use std::fs::write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

fn config_file(yaml: &str) -> NamedTempFile {
    let file = NamedTempFile::new().expect("temp file");
    write(file.path(), yaml).expect("write config");
    file
}

#[test]
fn load_config_reads_all_keys() {
    let file = config_file(
        r#"
account: mmrl
output: ./json/config.json
concurrency: 4
forge:
  api_url: https://ghe.example/api/v3
  graphql_url: https://ghe.example/api/graphql
"#,
    );

    let config = load_config(file.path()).expect("Config should load");
    assert_eq!(config.account.as_deref(), Some("mmrl"));
    assert_eq!(config.output, Some(PathBuf::from("./json/config.json")));
    assert_eq!(config.concurrency, Some(4));
    assert_eq!(config.forge.api_url, "https://ghe.example/api/v3");
    assert_eq!(config.forge.graphql_url, "https://ghe.example/api/graphql");
}

#[test]
fn load_config_rejects_unknown_keys_and_missing_files() {
    let file = config_file("acount: typo\n");
    assert!(load_config(file.path()).is_err());
    assert!(load_config("/definitely/not/here.yaml").is_err());
}

#[test]
fn load_config_rejects_unknown_forge_keys() {
    let file = config_file("forge:\n  graphql-url: https://ghe.example/api/graphql\n");
    let err = load_config(file.path()).expect_err("misspelled forge key");
    assert!(format!("{err:#}").contains("graphql-url"), "unexpected error {err:#}");
}

#[test]
#[serial]
fn flags_override_file_and_token_comes_from_env() {
    let file = config_file("account: from-file\noutput: file.json\nconcurrency: 2\n");
    env::set_var(TOKEN_ENV, "env-token");

    let args = BuildArgs {
        user: Some("from-flag".into()),
        write: None,
        token: None,
        config: Some(file.path().to_path_buf()),
        concurrency: Some(6),
    };
    let config = resolve_build_config(&args).expect("config resolves");

    assert_eq!(config.account, "from-flag");
    assert_eq!(config.output, PathBuf::from("file.json"));
    assert_eq!(config.concurrency, 6);
    assert_eq!(config.token, "env-token");
    assert_eq!(config.forge.api_url, DEFAULT_API_URL);
    assert_eq!(config.forge.graphql_url, DEFAULT_GRAPHQL_URL);

    env::remove_var(TOKEN_ENV);
}

#[test]
#[serial]
fn explicit_token_wins_over_env() {
    env::set_var(TOKEN_ENV, "env-token");
    let args = BuildArgs {
        user: Some("mmrl".into()),
        write: Some("out.json".into()),
        token: Some("flag-token".into()),
        ..BuildArgs::default()
    };
    let config = resolve_build_config(&args).unwrap();
    assert_eq!(config.token, "flag-token");
    assert_eq!(config.concurrency, modcat_core::catalog::DEFAULT_CONCURRENCY);
    env::remove_var(TOKEN_ENV);
}

struct TestCase {
    name: &'static str,
    args: BuildArgs,
    expected_error: &'static str,
}

#[test]
#[serial]
fn invalid_build_settings_table_driven() {
    env::remove_var(TOKEN_ENV);
    let test_cases = vec![
        TestCase {
            name: "no account",
            args: BuildArgs {
                write: Some("out.json".into()),
                token: Some("t".into()),
                ..BuildArgs::default()
            },
            expected_error: "--user",
        },
        TestCase {
            name: "no output",
            args: BuildArgs {
                user: Some("mmrl".into()),
                token: Some("t".into()),
                ..BuildArgs::default()
            },
            expected_error: "--write",
        },
        TestCase {
            name: "no token",
            args: BuildArgs {
                user: Some("mmrl".into()),
                write: Some("out.json".into()),
                ..BuildArgs::default()
            },
            expected_error: TOKEN_ENV,
        },
        TestCase {
            name: "blank token",
            args: BuildArgs {
                user: Some("mmrl".into()),
                write: Some("out.json".into()),
                token: Some("   ".into()),
                ..BuildArgs::default()
            },
            expected_error: "empty",
        },
        TestCase {
            name: "zero concurrency",
            args: BuildArgs {
                user: Some("mmrl".into()),
                write: Some("out.json".into()),
                token: Some("t".into()),
                concurrency: Some(0),
                ..BuildArgs::default()
            },
            expected_error: "concurrency",
        },
    ];

    for case in test_cases {
        let err = resolve_build_config(&case.args).expect_err(case.name);
        assert!(
            format!("{err:#}").contains(case.expected_error),
            "case {}: unexpected error {err:#}",
            case.name
        );
    }
}
