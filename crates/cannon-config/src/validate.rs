//! Validation of merged configuration layers.

use std::time::Duration;

use url::Url;

use crate::defaults;
use crate::error::{ConfigError, ConfigResult};
use crate::model::{BatchConfig, ConfigDocument};

/// Turn a merged document into a validated [`BatchConfig`].
///
/// Directory, server, serial, key, ignore-verdict, pass count and thread
/// count are all required; the timeout and certificate settings fall back to
/// [`crate::defaults`].
///
/// # Errors
///
/// Returns [`ConfigError::MissingField`] for absent or blank settings and
/// [`ConfigError::InvalidField`] for values outside their allowed range.
pub fn validate(document: ConfigDocument) -> ConfigResult<BatchConfig> {
    let directory = document
        .malware_directory
        .filter(|path| !path.as_os_str().is_empty())
        .ok_or(ConfigError::MissingField {
            field: "Malware Directory",
        })?;
    let server = required_text(document.capture_api_server, "Capture API Server")?;
    let serial = required_text(document.capture_api_serial, "Capture API Serial")?;
    let api_key = required_text(document.capture_api_key, "Capture API Key")?;
    let ignore_verdict = document.ignore_verdict.ok_or(ConfigError::MissingField {
        field: "Ignore Verdict setting",
    })?;
    let pass_count = document.number_of_passes.ok_or(ConfigError::MissingField {
        field: "Number of Passes setting",
    })?;
    let concurrency = document.number_of_threads.ok_or(ConfigError::MissingField {
        field: "Number of Threads setting",
    })?;

    if pass_count == 0 {
        return Err(ConfigError::InvalidField {
            field: "Number of Passes",
            value: Some(pass_count.to_string()),
            reason: "must be at least 1",
        });
    }
    if concurrency == 0 {
        return Err(ConfigError::InvalidField {
            field: "Number of Threads",
            value: Some(concurrency.to_string()),
            reason: "must be at least 1",
        });
    }
    if concurrency > defaults::MAX_NUMBER_OF_THREADS {
        return Err(ConfigError::InvalidField {
            field: "Number of Threads",
            value: Some(concurrency.to_string()),
            reason: "must not exceed 1024",
        });
    }

    let request_timeout = match document.request_timeout_secs {
        None => defaults::REQUEST_TIMEOUT,
        Some(0) => {
            return Err(ConfigError::InvalidField {
                field: "Request Timeout",
                value: Some("0".to_string()),
                reason: "must be at least 1 second",
            });
        }
        Some(secs) => Duration::from_secs(secs),
    };

    Ok(BatchConfig {
        directory,
        server_url: parse_server_url(&server)?,
        serial,
        api_key,
        ignore_verdict,
        pass_count,
        concurrency,
        request_timeout,
        accept_invalid_certs: document
            .accept_invalid_certs
            .unwrap_or(defaults::ACCEPT_INVALID_CERTS),
    })
}

/// Parse the yes/no switches accepted by `--ignore-verdict`.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] when the value is not a recognised
/// boolean spelling.
pub fn parse_yes_no(value: &str) -> ConfigResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "yes" | "y" | "true" | "1" | "on" => Ok(true),
        "no" | "n" | "false" | "0" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidField {
            field: "Ignore Verdict",
            value: Some(value.to_string()),
            reason: "expected yes or no",
        }),
    }
}

fn required_text(value: Option<String>, field: &'static str) -> ConfigResult<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty() && text != "None")
        .ok_or(ConfigError::MissingField { field })
}

fn parse_server_url(value: &str) -> ConfigResult<Url> {
    let url = Url::parse(value).map_err(|_| ConfigError::InvalidField {
        field: "Capture API Server",
        value: Some(value.to_string()),
        reason: "must be an absolute URL",
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidField {
            field: "Capture API Server",
            value: Some(value.to_string()),
            reason: "scheme must be http or https",
        });
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn complete() -> ConfigDocument {
        ConfigDocument {
            malware_directory: Some(PathBuf::from("samples")),
            capture_api_server: Some("https://capture.example".into()),
            capture_api_serial: Some("C0EAE4000000".into()),
            capture_api_key: Some("key".into()),
            ignore_verdict: Some(false),
            number_of_passes: Some(2),
            number_of_threads: Some(4),
            request_timeout_secs: None,
            accept_invalid_certs: None,
        }
    }

    #[test]
    fn validate_accepts_complete_document() -> anyhow::Result<()> {
        let config = validate(complete())?;
        assert_eq!(config.directory, PathBuf::from("samples"));
        assert_eq!(config.server_url.as_str(), "https://capture.example/");
        assert_eq!(config.pass_count, 2);
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.request_timeout, defaults::REQUEST_TIMEOUT);
        assert!(config.accept_invalid_certs);
        Ok(())
    }

    #[test]
    fn validate_reports_each_missing_field() {
        let cases: Vec<(ConfigDocument, &str)> = vec![
            (
                ConfigDocument {
                    malware_directory: None,
                    ..complete()
                },
                "Malware Directory",
            ),
            (
                ConfigDocument {
                    capture_api_server: Some("  ".into()),
                    ..complete()
                },
                "Capture API Server",
            ),
            (
                ConfigDocument {
                    capture_api_serial: Some("None".into()),
                    ..complete()
                },
                "Capture API Serial",
            ),
            (
                ConfigDocument {
                    capture_api_key: None,
                    ..complete()
                },
                "Capture API Key",
            ),
            (
                ConfigDocument {
                    ignore_verdict: None,
                    ..complete()
                },
                "Ignore Verdict setting",
            ),
            (
                ConfigDocument {
                    number_of_passes: None,
                    ..complete()
                },
                "Number of Passes setting",
            ),
            (
                ConfigDocument {
                    number_of_threads: None,
                    ..complete()
                },
                "Number of Threads setting",
            ),
        ];

        for (document, expected) in cases {
            match validate(document) {
                Err(ConfigError::MissingField { field }) => assert_eq!(field, expected),
                other => panic!("expected missing {expected}, got {other:?}"),
            }
        }
    }

    #[test]
    fn validate_rejects_zero_counts_and_timeout() {
        let zero_passes = ConfigDocument {
            number_of_passes: Some(0),
            ..complete()
        };
        assert!(matches!(
            validate(zero_passes),
            Err(ConfigError::InvalidField {
                field: "Number of Passes",
                ..
            })
        ));

        let zero_threads = ConfigDocument {
            number_of_threads: Some(0),
            ..complete()
        };
        assert!(matches!(
            validate(zero_threads),
            Err(ConfigError::InvalidField {
                field: "Number of Threads",
                ..
            })
        ));

        let zero_timeout = ConfigDocument {
            request_timeout_secs: Some(0),
            ..complete()
        };
        assert!(matches!(
            validate(zero_timeout),
            Err(ConfigError::InvalidField {
                field: "Request Timeout",
                ..
            })
        ));
    }

    #[test]
    fn validate_caps_thread_count() -> anyhow::Result<()> {
        let at_limit = ConfigDocument {
            number_of_threads: Some(defaults::MAX_NUMBER_OF_THREADS),
            ..complete()
        };
        assert_eq!(validate(at_limit)?.concurrency, 1024);

        let huge = ConfigDocument {
            number_of_threads: Some(usize::MAX),
            ..complete()
        };
        match validate(huge) {
            Err(ConfigError::InvalidField {
                field: "Number of Threads",
                value: Some(value),
                reason,
            }) => {
                assert_eq!(value, usize::MAX.to_string());
                assert_eq!(reason, "must not exceed 1024");
            }
            other => panic!("expected thread cap error, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn validate_rejects_non_http_urls() {
        for server in ["capture.example", "ftp://capture.example"] {
            let document = ConfigDocument {
                capture_api_server: Some(server.into()),
                ..complete()
            };
            assert!(matches!(
                validate(document),
                Err(ConfigError::InvalidField {
                    field: "Capture API Server",
                    ..
                })
            ));
        }
    }

    #[test]
    fn parse_yes_no_accepts_common_spellings() {
        for value in ["yes", "YES", " y ", "true", "1", "on"] {
            assert!(matches!(parse_yes_no(value), Ok(true)), "{value}");
        }
        for value in ["no", "No", "n", "false", "0", "off"] {
            assert!(matches!(parse_yes_no(value), Ok(false)), "{value}");
        }
        assert!(parse_yes_no("maybe").is_err());
    }
}
