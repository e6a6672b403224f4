use std::cell::RefCell;
use std::rc::Rc;

use framelink_channel::MessageChannel;
use framelink_protocol::{RenderEvent, RENDER_EVENT};
use framelink_schema::SchemaRegistry;
use framelink_transport::{FixedHeightProbe, MemoryTransport};
use serde_json::Value;
use tracing::{info, warn};

use crate::cmd::{open_input, ReplayArgs};
use crate::exit::{
    channel_error, io_error, schema_error, CliError, CliResult, DATA_INVALID, SUCCESS,
};
use crate::output::{LineReport, OutputFormat, ReportSink};

pub fn run(args: ReplayArgs, format: OutputFormat) -> CliResult<i32> {
    let registry = args
        .validate
        .as_deref()
        .map(SchemaRegistry::from_directory)
        .transpose()
        .map_err(|err| schema_error("failed loading schemas", err))?;

    let transport = MemoryTransport::new();
    let channel = MessageChannel::init(transport.clone(), FixedHeightProbe::default())
        .map_err(|err| channel_error("channel init failed", err))?;

    let received = Rc::new(RefCell::new(Vec::<RenderEvent>::new()));
    let sink_events = received.clone();
    channel
        .events()
        .on_render(move |event| sink_events.borrow_mut().push(event.clone()));

    let input = open_input(args.file.as_deref())?;
    let mut sink = ReportSink::new(format);
    let mut dispatched = 0usize;
    let mut ignored = 0usize;

    'lines: for (index, line) in input.lines().enumerate() {
        if args.count.is_some_and(|limit| dispatched >= limit) {
            break;
        }
        let line_no = index + 1;
        let line = line.map_err(|err| io_error("failed reading input", err))?;
        let raw = parse_inbound(&line).map_err(|err| {
            CliError::new(DATA_INVALID, format!("line {line_no}: invalid JSON: {err}"))
        })?;

        transport.deliver(raw.as_ref());
        let events = std::mem::take(&mut *received.borrow_mut());
        if events.is_empty() {
            ignored += 1;
            continue;
        }

        for event in events {
            let error = registry
                .as_ref()
                .and_then(|registry| registry.validate_render(&event).err())
                .map(|err| err.to_string());
            if let Some(error) = &error {
                warn!(line = line_no, %error, "render arguments failed validation");
            }

            sink.push(LineReport {
                line: line_no,
                message_type: RENDER_EVENT.to_string(),
                body: event.detail,
                error,
            });
            dispatched += 1;
            if args.count.is_some_and(|limit| dispatched >= limit) {
                break 'lines;
            }
        }
    }

    let invalid = sink.finish();
    channel
        .dispose()
        .map_err(|err| channel_error("channel dispose failed", err))?;
    info!(dispatched, ignored, invalid, "replay complete");

    if invalid > 0 {
        Ok(DATA_INVALID)
    } else {
        Ok(SUCCESS)
    }
}

/// A blank line or a bare `undefined` stands for an absent message.
fn parse_inbound(line: &str) -> serde_json::Result<Option<Value>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed == "undefined" {
        return Ok(None);
    }
    serde_json::from_str(trimmed).map(Some)
}
