use framelink_protocol::{API_VERSION, PROTOCOL_FLAG, RENDER_EVENT};

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("framelink {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: framelink");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("api_version: {API_VERSION}");
    println!("render_event: {RENDER_EVENT}");
    println!("protocol_flag: {PROTOCOL_FLAG}");
    println!(
        "target: {}",
        option_env!("FRAMELINK_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "features: channel={}, schema={}, async={}, cli=true",
        cfg!(feature = "channel"),
        cfg!(feature = "schema"),
        cfg!(feature = "async")
    );

    Ok(SUCCESS)
}
