//! Port binding for the dev server and the live-reload socket.

use std::fmt::Display;

use anyhow::{Result, anyhow};

use crate::log;

/// Ports tried, counting the requested one.
pub const PORT_ATTEMPTS: u16 = 10;

/// Bind `base`, or the next free port above it.
///
/// Returns the bound value and the port that was tried. A moved port is
/// logged under `module`; port 0 is passed through for the OS to pick.
pub fn bind_first_free<T, E: Display>(
    module: &str,
    base: u16,
    mut bind: impl FnMut(u16) -> Result<T, E>,
) -> Result<(T, u16)> {
    let mut last_error = String::new();
    for port in (0..PORT_ATTEMPTS).map_while(|offset| base.checked_add(offset)) {
        match bind(port) {
            Ok(bound) => {
                if port != base {
                    log!(module; "port {} in use, using {} instead", base, port);
                }
                return Ok((bound, port));
            }
            Err(e) => last_error = e.to_string(),
        }
    }
    Err(anyhow!(
        "no free port in {}-{}: {}",
        base,
        base.saturating_add(PORT_ATTEMPTS - 1),
        last_error
    ))
}
