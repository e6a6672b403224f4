use std::cell::RefCell;
use std::rc::Rc;

use framelink_channel::{ChannelConfig, Diagnostic, MessageChannel};
use framelink_transport::{FixedHeightProbe, MemoryTransport};
use serde_json::Value;

use crate::cmd::{EncodeArgs, EncodeMessage};
use crate::exit::{channel_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::output::{print_record, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let transport = MemoryTransport::new();
    let probe = FixedHeightProbe::new(args.root_height, args.body_height);

    let diagnostics = Rc::new(RefCell::new(Vec::new()));
    let sink = diagnostics.clone();
    let config = ChannelConfig::with_diagnostics(move |d: &Diagnostic| {
        sink.borrow_mut().push(d.to_string());
    });
    let channel = MessageChannel::init_with_config(transport.clone(), probe, config)
        .map_err(|err| channel_error("channel init failed", err))?;

    match args.message {
        EncodeMessage::Ready => channel.announce_ready(),
        EncodeMessage::Height { height } => match height {
            Some(raw) => channel.report_height_value(&lenient_json(&raw)),
            None => channel.report_height(None),
        },
        EncodeMessage::Value { json } => {
            let value: Value = serde_json::from_str(&json)
                .map_err(|err| CliError::new(USAGE, format!("value is not valid JSON: {err}")))?;
            channel.emit_value(value);
        }
    }

    let sent = transport.take_sent();
    if sent.is_empty() {
        let reason = diagnostics
            .borrow()
            .first()
            .cloned()
            .unwrap_or_else(|| "no message produced".to_string());
        return Err(CliError::new(DATA_INVALID, format!("nothing sent: {reason}")));
    }

    for record in &sent {
        print_record(record, format);
    }
    Ok(SUCCESS)
}

/// Parse `raw` as JSON, keeping it as a string when it is not.
fn lenient_json(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
