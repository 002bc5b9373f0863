//! Configuration-driven setup.
//!
//! `init` mutates process-wide settings, so this file holds a single test.

use std::io::Write;

use stackinabox::config::ConfigError;
use stackinabox::prelude::*;
use stackinabox::InitError;

#[test]
fn test_init_applies_file_config() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        r#"
[client]
max_redirects = 2

[intercept]
schemes = ["https"]
adapter_key = "suite-adapter"

[logging]
enabled = false
"#
    )
    .unwrap();

    let invalid = StackConfig {
        intercept: stackinabox::config::InterceptConfig {
            schemes: Vec::new(),
            ..Default::default()
        },
        ..Default::default()
    };
    assert!(matches!(
        stackinabox::init(&invalid),
        Err(InitError::Config(ConfigError::InvalidValue { .. }))
    ));

    let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
    stackinabox::init(&config).unwrap();

    let registrar = Registrar::default();
    assert_eq!(registrar.mount_keys("cfg.test/v1"), vec!["https://cfg.test/v1/"]);

    std::thread::spawn(|| {
        let stack = StackInABox::global();
        let adapter = register("cfg.test/v1");

        let held = stack.hold_out_as::<MockAdapter>("suite-adapter").unwrap();
        assert!(std::sync::Arc::ptr_eq(&held, &adapter));
        assert_eq!(stackinabox::intercept::get_session().mounts(), vec!["https://cfg.test/v1/"]);
        assert_eq!(stackinabox::intercept::get_session().state().max_redirects, 2);
    })
    .join()
    .unwrap();
}
