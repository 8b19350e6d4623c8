use std::io::{self, Write};

use lirc_events::{Dispatcher, LircEvent, ThrottleConfig};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum OutputFormat {
    Log,
    Json,
}

fn emit(format: OutputFormat, label: &str, event: &LircEvent) {
    match format {
        OutputFormat::Log => info!(
            key = %event.key,
            remote = %event.remote,
            repeat = %event.repeat_count,
            code = %event.code,
            "{label}"
        ),
        OutputFormat::Json => {
            if let Err(err) = write_json_line(&mut io::stdout().lock(), event) {
                warn!("failed to write event to stdout: {err}");
            }
        }
    }
}

/// One event per line, flushed so piped consumers see it immediately.
fn write_json_line<W: Write>(out: &mut W, event: &LircEvent) -> io::Result<()> {
    serde_json::to_writer(&mut *out, event)?;
    out.write_all(b"\n")?;
    out.flush()
}

/// Keys in `keys` get a throttled callback; everything else goes to the fallback.
pub fn build_dispatcher(
    keys: &[String],
    throttle: ThrottleConfig,
    format: OutputFormat,
) -> Dispatcher {
    let mut builder = Dispatcher::builder().throttle_config(throttle);
    for key in keys {
        builder = builder.on(key.as_str(), move |ev| emit(format, "key pressed", ev));
    }
    builder
        .fallback(move |ev| emit(format, "unhandled key", ev))
        .build()
}
