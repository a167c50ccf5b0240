//! Shared fixtures for integration tests.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

/// A known-good raw template.
pub const RAW_TEMPLATE: &str = r#"
type: raw
requests:
  - id: login
    methods: [GET, POST]
    endpoint: /login
    response-type: raw
    content-type: text/html
    content: "<form action=\"/login\" method=\"post\"></form>"
  - id: phpmyadmin
    methods: [GET]
    endpoint: /phpmyadmin/index.php
    response-type: file
    content-type: text/html
    content: ./pages/phpmyadmin.html
  - id: default
    response-type: raw
    content-type: text/plain
    content: "It works!"
ignore:
  - /favicon.ico
  - /robots.txt
"#;

/// A shodan template as the validator accepts it today.
pub const SHODAN_TEMPLATE: &str = "type: shodan\n";

/// Write `content` to `name` inside a fresh temporary directory.
///
/// Keep the returned directory alive for as long as the file is needed.
pub fn write_template(name: &str, content: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    (dir, path)
}
