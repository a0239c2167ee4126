use serde_json::{json, Value};
use crate::cli::OutputFormat;

/// A failure that `output_error` has already shown to the user. The binary
/// only sets the exit code for these.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct ReportedError(pub String);

/// The message to print for a failed command, or `None` when it was already
/// printed through `output_error`
pub fn unreported_message(err: &anyhow::Error, verbose: bool) -> Option<String> {
    if err.is::<ReportedError>() {
        return None;
    }
    Some(if verbose { format!("{err:?}") } else { err.to_string() })
}

/// Output a success message in the appropriate format. Object fields in
/// `data` are merged into the JSON envelope.
pub fn output_success(
    output_format: OutputFormat,
    message: &str,
    data: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(Value::Object(extra)), Some(target)) = (data, response.as_object_mut()) {
                target.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(
    output_format: OutputFormat,
    message: &str,
    error_code: Option<&str>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": false,
                "error": message
            });

            if let Some(code) = error_code {
                response["error_code"] = json!(code);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reported_errors_are_not_printed_again() {
        let err = anyhow::Error::new(ReportedError("n8n rejected the request".into()));
        assert_eq!(unreported_message(&err, false), None);
        assert_eq!(unreported_message(&err, true), None);
    }

    #[test]
    fn other_errors_are_printed_once() {
        let err = anyhow::anyhow!("failed to connect to database");
        assert_eq!(unreported_message(&err, false).as_deref(), Some("failed to connect to database"));
    }
}
