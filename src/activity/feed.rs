use std::io::{self, BufRead};
use std::thread::{self, JoinHandle};

use winit::event_loop::EventLoopProxy;

use super::events::{parse_line, HostEvent};

/// Read host events from stdin on a background thread and forward them into
/// the event loop. Malformed lines are logged and dropped.
pub fn spawn_stdin(proxy: EventLoopProxy<HostEvent>) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("host-events".into())
        .spawn(move || {
            let n = forward(io::stdin().lock(), |event| proxy.send_event(event).is_ok());
            log::info!("Host event feed ended after {n} events");
        })
}

/// Pump lines from `reader` into `send` until input ends or `send` reports
/// the receiver is gone. Returns the number of events forwarded.
pub fn forward<R: BufRead>(reader: R, mut send: impl FnMut(HostEvent) -> bool) -> usize {
    let mut forwarded = 0;
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                log::warn!("Host event pipe failed: {e}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(&line) {
            Ok(event) => {
                log::trace!("Host event: {event:?}");
                if !send(event) {
                    log::info!("Event loop closed, stopping host event reader");
                    break;
                }
                forwarded += 1;
            }
            Err(e) => log::warn!("Dropping host event {line:?}: {e}"),
        }
    }
    forwarded
}
