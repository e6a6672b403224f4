use framelink_protocol::{decode_outbound, encode_outbound, OutboundMessage};
use serde_json::Value;
use tracing::info;

use crate::cmd::{open_input, DecodeArgs};
use crate::exit::{io_error, protocol_error, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{LineReport, OutputFormat, ReportSink};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let input = open_input(args.file.as_deref())?;
    let mut sink = ReportSink::new(format);
    let mut decoded = 0usize;

    for (index, line) in input.lines().enumerate() {
        let line = line.map_err(|err| io_error("failed reading input", err))?;
        if line.trim().is_empty() {
            continue;
        }
        let report = decode_line(index + 1, line.trim());
        if report.error.is_none() {
            decoded += 1;
        }
        sink.push(report);
    }

    let invalid = sink.finish();
    info!(decoded, invalid, "decode complete");
    if invalid > 0 {
        Ok(DATA_INVALID)
    } else {
        Ok(SUCCESS)
    }
}

fn decode_line(line: usize, text: &str) -> LineReport {
    let record: Value = match serde_json::from_str(text) {
        Ok(record) => record,
        Err(err) => return rejected(line, Value::Null, format!("invalid JSON: {err}")),
    };

    match decode_outbound(&record) {
        Ok(message) => LineReport {
            line,
            message_type: message.kind().as_str().to_string(),
            body: payload(&message),
            error: None,
        },
        Err(err) => {
            let error = protocol_error("rejected", err).message;
            rejected(line, record, error)
        }
    }
}

/// The decoded message without its `type` tag and membership flag.
fn payload(message: &OutboundMessage) -> Value {
    match encode_outbound(message) {
        Ok(Value::Object(mut fields)) => {
            fields.remove("type");
            fields.remove(framelink_protocol::PROTOCOL_FLAG);
            Value::Object(fields)
        }
        _ => Value::Null,
    }
}

fn rejected(line: usize, body: Value, error: String) -> LineReport {
    LineReport {
        line,
        message_type: "rejected".to_string(),
        body,
        error: Some(error),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_flagged_record() {
        let report = decode_line(
            1,
            r#"{"isStreamlitMessage":true,"type":"setFrameHeight","height":150}"#,
        );
        assert_eq!(report.message_type, "setFrameHeight");
        assert_eq!(report.body, json!({"height": 150}));
        assert!(report.error.is_none());
    }

    #[test]
    fn rejects_unflagged_record() {
        let report = decode_line(3, r#"{"type":"componentReady","apiVersion":1}"#);
        assert_eq!(report.line, 3);
        assert_eq!(report.message_type, "rejected");
        assert!(report.error.unwrap().contains("isStreamlitMessage"));
    }

    #[test]
    fn rejects_invalid_json() {
        let report = decode_line(1, "{");
        assert!(report.error.unwrap().starts_with("invalid JSON"));
    }
}
