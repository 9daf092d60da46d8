use super::commands::load_config;
use super::*;
use crate::config::IniConfig;
use crate::server::ParsedRequest;
use clap::Parser;
use http::Method;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_serve_parses_all_flags() {
    let cli = Cli::try_parse_from([
        "xia",
        "serve",
        "--config",
        "app.ini",
        "--addr",
        "127.0.0.1:8080",
        "--static",
        "public",
        "--templates",
        "views",
    ])
    .unwrap();
    match cli.command {
        Commands::Serve {
            config,
            addr,
            static_dir,
            templates,
        } => {
            assert_eq!(config, Some(PathBuf::from("app.ini")));
            assert_eq!(addr.as_deref(), Some("127.0.0.1:8080"));
            assert_eq!(static_dir, Some(PathBuf::from("public")));
            assert_eq!(templates, Some(PathBuf::from("views")));
        }
        Commands::Routes { .. } => panic!("Expected Serve command"),
    }
}

#[test]
fn test_routes_command_parses() {
    let cli = Cli::try_parse_from(["xia", "routes", "-c", "app.ini"]).unwrap();
    assert!(matches!(cli.command, Commands::Routes { config: Some(_) }));
}

#[test]
fn test_unknown_command_rejected() {
    assert!(Cli::try_parse_from(["xia", "generate"]).is_err());
}

#[test]
fn test_demo_routes() {
    let engine = demo_engine(&DemoOptions::default());
    let patterns: Vec<&str> = engine.routes().map(|(_, p)| p).collect();
    assert_eq!(
        patterns,
        vec!["/xia", "/xia", "/hello/:name", "/api/test/group", "/api/boom"]
    );
}

#[test]
fn test_demo_boom_recovers() {
    let engine = demo_engine(&DemoOptions::default());
    let res = engine.handle_request(ParsedRequest::new(Method::GET, "/api/boom"));
    assert_eq!(res.status(), 500);
}

#[test]
fn test_demo_post_form() {
    let engine = demo_engine(&DemoOptions::default());
    let req = ParsedRequest::new(Method::POST, "/xia").with_form_body("username=li");
    assert_eq!(engine.handle_request(req).body_string(), "li");
}

#[test]
fn test_demo_template_page() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("about.html"), "<p>{{ data.name }}</p>").unwrap();
    let engine = demo_engine(&DemoOptions {
        static_dir: None,
        templates: Some(dir.path().to_path_buf()),
    });
    let res = engine.handle_request(ParsedRequest::new(Method::GET, "/page/about"));
    assert_eq!(res.status(), 200);
    assert_eq!(res.body_string(), "<p>about</p>");

    let res = engine.handle_request(ParsedRequest::new(Method::GET, "/page/missing"));
    assert_eq!(res.status(), 500);
}

#[test]
fn test_missing_config_file_is_error() {
    let err = load_config(Some(&PathBuf::from("/no/such/app.ini"))).unwrap_err();
    assert!(err.to_string().contains("/no/such/app.ini"));
}

#[test]
fn test_demo_options_from_config_and_flags() {
    let cfg = IniConfig::parse_str("[server]\nstatic = public\ntemplates = views\n").unwrap();
    let opts = DemoOptions::from_config(&cfg);
    assert_eq!(opts.static_dir, Some(PathBuf::from("public")));
    assert_eq!(opts.templates, Some(PathBuf::from("views")));

    let opts = opts.with_overrides(Some(&PathBuf::from("dist")), None);
    assert_eq!(opts.static_dir, Some(PathBuf::from("dist")));
    assert_eq!(opts.templates, Some(PathBuf::from("views")));

    let engine = demo_engine(&DemoOptions::from_config(&cfg));
    let patterns: Vec<&str> = engine.routes().map(|(_, p)| p).collect();
    assert!(patterns.contains(&"/assets/*filepath"));
    assert!(patterns.contains(&"/page/:name"));

    let bare = demo_engine(&DemoOptions::from_config(&IniConfig::default()));
    assert_eq!(bare.routes().count(), 5);
}
