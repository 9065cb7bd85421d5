//! Unit tests for CLI commands

use crate::cli::{ApiServerCommand, Cli, Commands};
use crate::runtime_config::RuntimeConfig;
use clap::Parser;
use std::path::PathBuf;

fn api_server(cli: Cli) -> ApiServerCommand {
    match cli.command {
        Commands::ApiServer { sub } => sub,
    }
}

#[test]
fn test_local_command_parses() {
    let cli = Cli::try_parse_from([
        "gatewayctl",
        "api-server",
        "local",
        "--listen-addr",
        "http://0.0.0.0:8080",
        "--serve-addr",
        "http://demo.local:9080",
        "--swagger-file",
        "swagger.json",
    ])
    .unwrap();

    match api_server(cli) {
        ApiServerCommand::Local(args) => {
            assert_eq!(args.listen_addr.port(), 8080);
            assert_eq!(args.serve_addr.host(), "demo.local");
            assert_eq!(args.swagger_file, PathBuf::from("swagger.json"));
            assert!(args.config_dir.is_none());
            assert!(!args.flags.dry_run);
            assert!(!args.flags.skip_revert);
        }
        other => panic!("Expected Local command, got {other:?}"),
    }
}

#[test]
fn test_local_requires_addresses_and_swagger() {
    for missing in ["--listen-addr", "--serve-addr", "--swagger-file"] {
        let mut args = vec![
            "gatewayctl",
            "api-server",
            "local",
            "--listen-addr",
            "http://0.0.0.0:8080",
            "--serve-addr",
            "http://demo.local:9080",
            "--swagger-file",
            "swagger.json",
        ];
        let pos = args.iter().position(|a| *a == missing).unwrap();
        args.drain(pos..pos + 2);
        assert!(
            Cli::try_parse_from(&args).is_err(),
            "parse should fail without {missing}"
        );
    }
}

#[test]
fn test_invalid_address_rejected_at_parse() {
    let res = Cli::try_parse_from([
        "gatewayctl",
        "api-server",
        "local",
        "--listen-addr",
        "0.0.0.0",
        "--serve-addr",
        "http://demo.local:9080",
        "--swagger-file",
        "swagger.json",
    ]);
    assert!(res.is_err());
}

#[test]
fn test_kubernetes_defaults() {
    let cli = Cli::try_parse_from(["gatewayctl", "api-server", "kubernetes"]).unwrap();
    match api_server(cli) {
        ApiServerCommand::Kubernetes(args) => {
            assert_eq!(args.listen_addr.to_string(), "http://0.0.0.0:8080");
            assert_eq!(args.serve_addr.port(), 9080);
            assert_eq!(args.swagger_file, PathBuf::from("swagger.json"));
            assert!(args.config_dir.is_none());
            assert_eq!(args.namespace, "istio-system");
            assert!(!args.deploy_istio);
        }
        other => panic!("Expected Kubernetes command, got {other:?}"),
    }
}

#[test]
fn test_kubernetes_session_config_expands_pid() {
    let cli = Cli::try_parse_from([
        "gatewayctl",
        "api-server",
        "kubernetes",
        "--deploy-istio",
        "--dry-run",
        "--namespace",
        "gateways",
    ])
    .unwrap();
    let ApiServerCommand::Kubernetes(args) = api_server(cli) else {
        panic!("Expected Kubernetes command");
    };
    assert!(args.deploy_istio);
    assert_eq!(args.namespace, "gateways");

    let config = args.session_config(&RuntimeConfig::default());
    assert!(config.dry_run);
    assert_eq!(
        config.gen_config_dir,
        Some(PathBuf::from(format!(
            "/tmp/gatewayctl/api-server/{}/gen-istio-config",
            std::process::id()
        )))
    );
}

#[test]
fn test_kubernetes_default_config_dir_follows_scratch_template() {
    let cli = Cli::try_parse_from(["gatewayctl", "api-server", "kubernetes"]).unwrap();
    let ApiServerCommand::Kubernetes(args) = api_server(cli) else {
        panic!("Expected Kubernetes command");
    };
    let runtime = RuntimeConfig::from_lookup(|k| {
        (k == "GATEWAYCTL_SCRATCH_DIR").then(|| "/var/tmp/gw/<pid>".to_string())
    });

    let config = args.session_config(&runtime);
    assert_eq!(
        config.gen_config_dir,
        Some(PathBuf::from(format!(
            "/var/tmp/gw/{}/gen-istio-config",
            std::process::id()
        )))
    );
}

#[test]
fn test_kubernetes_explicit_config_dir_expands_pid() {
    let cli = Cli::try_parse_from([
        "gatewayctl",
        "api-server",
        "kubernetes",
        "--config-dir",
        "/srv/gateway/<pid>",
    ])
    .unwrap();
    let ApiServerCommand::Kubernetes(args) = api_server(cli) else {
        panic!("Expected Kubernetes command");
    };

    let config = args.session_config(&RuntimeConfig::default());
    assert_eq!(
        config.gen_config_dir,
        Some(PathBuf::from(format!("/srv/gateway/{}", std::process::id())))
    );
}

#[test]
fn test_local_config_dir_made_absolute() {
    let cli = Cli::try_parse_from([
        "gatewayctl",
        "api-server",
        "local",
        "--listen-addr",
        "http://0.0.0.0:8080",
        "--serve-addr",
        "http://demo.local:9080",
        "--swagger-file",
        "swagger.json",
        "--config-dir",
        "generated",
        "--skip-revert",
    ])
    .unwrap();
    let ApiServerCommand::Local(args) = api_server(cli) else {
        panic!("Expected Local command");
    };
    let config = args.session_config(&RuntimeConfig::default()).unwrap();
    let dir = config.gen_config_dir.unwrap();
    assert!(dir.is_absolute());
    assert!(dir.ends_with("generated"));
    assert!(config.skip_revert);
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from([
        "gatewayctl",
        "api-server",
        "kubernetes",
        "--verbose",
        "--log-format",
        "json",
    ])
    .unwrap();
    assert!(cli.verbose);
    assert_eq!(cli.log_format.as_deref(), Some("json"));
}
