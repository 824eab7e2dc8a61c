/*!
 * Tests for error types
 */

use jpe_translator::errors::{panic_message, AppError, ConfigError, PluginError};

#[test]
fn test_plugin_error_failed_shouldFormatPluginAndMessage() {
    let error = PluginError::failed("stamp", "bad input");
    assert_eq!(error.to_string(), "Plugin 'stamp' failed: bad input");
}

#[test]
fn test_app_error_fromConfigError_shouldWrap() {
    let config_error = ConfigError::InvalidValue {
        field: "generator.indent_size".to_string(),
        reason: "must be at most 16".to_string(),
    };

    let error = AppError::from(config_error);

    assert!(matches!(error, AppError::Config(_)));
    assert!(error.to_string().contains("generator.indent_size"));
}

#[test]
fn test_app_error_fromIoError_shouldBecomeFileError() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");

    let error: AppError = io.into();

    assert!(matches!(error, AppError::File(_)));
}

#[test]
fn test_app_error_fromAnyhow_shouldBecomeUnknown() {
    let error: AppError = anyhow::anyhow!("boom").into();
    assert_eq!(error.to_string(), "Unknown error: boom");
}

#[test]
fn test_panic_message_shouldReadStrAndStringPayloads() {
    let payload = std::panic::catch_unwind(|| panic!("static text")).unwrap_err();
    assert_eq!(panic_message(payload.as_ref()), "static text");

    let payload = std::panic::catch_unwind(|| panic!("formatted {}", 42)).unwrap_err();
    assert_eq!(panic_message(payload.as_ref()), "formatted 42");
}
