//! Load → validate → select, end to end through template files.

use std::fs;
use std::sync::Arc;
use std::thread;

use boggart::routing::{Selection, Selector};
use boggart::template::{
    load_file, load_validated, validate, LoadError, TemplateError, TemplateKind, TemplateStore,
    ValidationError, DEFAULT_RULE_ID,
};

mod common;

use common::{write_template, RAW_TEMPLATE, SHODAN_TEMPLATE};

fn validation_error(content: &str) -> ValidationError {
    let (_dir, path) = write_template("template.yaml", content);
    match load_validated(&path) {
        Err(TemplateError::Validation { source, .. }) => source,
        Err(other) => panic!("expected a validation error, got {other}"),
        Ok(_) => panic!("expected a validation error, template was accepted"),
    }
}

#[test]
fn test_good_template_round_trip() {
    let (_dir, path) = write_template("template.yaml", RAW_TEMPLATE);
    let template = load_validated(&path).expect("fixture should validate");
    assert_eq!(template.kind, Some(TemplateKind::Raw));
    assert_eq!(template.requests.len(), 3);
    assert_eq!(template.default_rule().map(|r| r.content.as_str()), Some("It works!"));
}

#[test]
fn test_blanking_a_field_flips_to_its_error() {
    let id = |s: &str| s.to_string();
    let cases = [
        (
            RAW_TEMPLATE.replacen("endpoint: /login", "endpoint: \" \"", 1),
            ValidationError::MissingEndpoint { id: id("login") },
        ),
        (
            RAW_TEMPLATE.replacen("methods: [GET, POST]", "methods: []", 1),
            ValidationError::MissingMethods { id: id("login") },
        ),
        (
            RAW_TEMPLATE.replacen("response-type: raw", "response-type: \"\"", 1),
            ValidationError::MissingResponseType { id: id("login") },
        ),
        (
            RAW_TEMPLATE.replacen("content-type: text/html", "content-type: \"  \"", 1),
            ValidationError::MissingContentType { id: id("login") },
        ),
        (
            RAW_TEMPLATE.replace("content: ./pages/phpmyadmin.html", "content: \"\""),
            ValidationError::MissingContent { id: id("phpmyadmin") },
        ),
        (
            RAW_TEMPLATE.replace("content-type: text/plain", "content-type: \"\""),
            ValidationError::MissingContentType { id: id(DEFAULT_RULE_ID) },
        ),
        (
            RAW_TEMPLATE.replace("content: \"It works!\"", "content: \" \""),
            ValidationError::MissingContent { id: id(DEFAULT_RULE_ID) },
        ),
        (
            RAW_TEMPLATE.replace("  - id: login", "  - id: \" \""),
            ValidationError::MissingId { index: 0 },
        ),
        (
            RAW_TEMPLATE.replace("type: raw", "type: \"\""),
            ValidationError::MissingType,
        ),
    ];

    for (content, expected) in cases {
        assert_eq!(validation_error(&content), expected);
    }
}

#[test]
fn test_duplicate_login_endpoint() {
    let content = RAW_TEMPLATE.replace(
        "  - id: default",
        "  - id: login-again\n    methods: [PUT]\n    endpoint: /login\n    response-type: raw\n    content-type: text/plain\n    content: nope\n  - id: default",
    );
    assert_eq!(
        validation_error(&content),
        ValidationError::DuplicateEndpoint { endpoint: "/login".to_string() }
    );
}

#[test]
fn test_ignore_list_problems() {
    let content = RAW_TEMPLATE.replace("  - /robots.txt", "  - /login");
    assert_eq!(
        validation_error(&content),
        ValidationError::IgnoreEndpointConflict { path: "/login".to_string() }
    );

    let content = RAW_TEMPLATE.replace("  - /robots.txt", "  - admin");
    assert_eq!(
        validation_error(&content),
        ValidationError::IgnorePathNotAbsolute { path: "admin".to_string() }
    );

    let content = RAW_TEMPLATE.replace("  - /robots.txt", "  - /favicon.ico");
    assert_eq!(
        validation_error(&content),
        ValidationError::DuplicateIgnorePath { path: "/favicon.ico".to_string() }
    );
}

#[test]
fn test_missing_default_rule() {
    let content = RAW_TEMPLATE.replace("  - id: default", "  - id: fallback\n    methods: [GET]\n    endpoint: /fallback");
    assert_eq!(validation_error(&content), ValidationError::MissingDefault);
}

#[test]
fn test_shodan_templates() {
    let (_dir, path) = write_template("shodan.yaml", SHODAN_TEMPLATE);
    let template = load_validated(&path).unwrap();
    let selector = Selector::new(template);
    assert_eq!(selector.select("/", "GET"), Ok(Selection::Replay { ip: "" }));

    let content = "type: shodan\nip: 203.0.113.9\n";
    assert_eq!(validation_error(content), ValidationError::MissingIp);
}

#[test]
fn test_toml_template() {
    let content = r#"
type = "raw"
ignore = ["/favicon.ico"]

[[requests]]
id = "admin"
methods = ["GET"]
endpoint = "/admin"
response-type = "raw"
content-type = "text/html"
content = "<h1>Admin</h1>"

[[requests]]
id = "default"
response-type = "raw"
content-type = "text/plain"
content = "ok"
"#;
    let (_dir, path) = write_template("template.toml", content);
    let selector = Selector::new(load_validated(&path).unwrap());

    let selection = selector.select("/admin", "GET").unwrap();
    assert_eq!(selection.rule().map(|r| r.id.as_str()), Some("admin"));
    assert_eq!(selector.select("/favicon.ico", "GET"), Ok(Selection::Ignored));
}

#[test]
fn test_selection_against_fixture() {
    let (_dir, path) = write_template("template.yaml", RAW_TEMPLATE);
    let selector = Selector::new(load_validated(&path).unwrap());

    let root = selector.select("/", "GET").unwrap();
    assert!(matches!(root, Selection::Default(rule) if rule.id == DEFAULT_RULE_ID));

    let login = selector.select("/login", "POST").unwrap();
    assert!(matches!(login, Selection::Matched(rule) if rule.id == "login"));

    let pma = selector.select("/phpmyadmin/index.php", "POST").unwrap();
    assert!(matches!(pma, Selection::Default(_)));

    assert_eq!(selector.select("/robots.txt", "GET"), Ok(Selection::Ignored));
}

#[test]
fn test_malformed_file_is_parse_error() {
    let (_dir, path) = write_template("broken.yaml", "type: raw\nrequests: {id: [");
    match load_file(&path) {
        Err(LoadError::Parse { source_name, .. }) => {
            assert_eq!(source_name, path.display().to_string());
        }
        other => panic!("expected parse error, got {other:?}"),
    }
    assert!(matches!(load_validated(&path), Err(TemplateError::Load(_))));
}

#[test]
fn test_loaded_but_invalid_template() {
    let content = RAW_TEMPLATE.replace("id: phpmyadmin", "id: login");
    let (_dir, path) = write_template("template.yaml", &content);
    let template = load_file(&path).expect("loader does no semantic checks");
    assert_eq!(
        validate(&template),
        Err(ValidationError::DuplicateId { id: "login".to_string() })
    );
}

#[test]
fn test_store_reload_from_disk() {
    let (_dir, path) = write_template("template.yaml", RAW_TEMPLATE);
    let store = TemplateStore::open(&path).unwrap();

    fs::write(&path, RAW_TEMPLATE.replace("It works!", "Hello")).unwrap();
    store.reload(&path).unwrap();
    let selector = store.selector();
    let fallback = selector.select("/", "GET").unwrap();
    assert_eq!(fallback.rule().unwrap().content, "Hello");

    fs::write(&path, RAW_TEMPLATE.replace("type: raw", "type: \"\"")).unwrap();
    assert!(store.reload(&path).is_err());
    let selector = store.selector();
    let fallback = selector.select("/", "GET").unwrap();
    assert_eq!(fallback.rule().unwrap().content, "Hello");
}

#[test]
fn test_concurrent_selection_during_swaps() {
    let (_dir, path) = write_template("template.yaml", RAW_TEMPLATE);
    let store = Arc::new(TemplateStore::open(&path).unwrap());
    let next = load_validated(&path).unwrap();

    thread::scope(|scope| {
        for _ in 0..4 {
            let store = Arc::clone(&store);
            scope.spawn(move || {
                for _ in 0..1_000 {
                    let selector = store.selector();
                    let selection = selector.select("/login", "GET").unwrap();
                    assert_eq!(selection.rule().map(|r| r.id.as_str()), Some("login"));
                }
            });
        }
        for _ in 0..100 {
            store.replace(Arc::clone(&next)).unwrap();
        }
    });
}
