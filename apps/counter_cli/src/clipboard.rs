use anyhow::Context;
use client_core::Clipboard;
use tokio::runtime::{Handle, RuntimeFlavor};

/// System clipboard; opened per write.
///
/// `arboard` talks to the display server synchronously, so on a multi-thread
/// runtime the write is moved off the async worker with `block_in_place`.
pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn set_text(&self, text: &str) -> anyhow::Result<()> {
        run_blocking(|| {
            let mut clipboard =
                arboard::Clipboard::new().context("failed to open system clipboard")?;
            clipboard
                .set_text(text.to_owned())
                .context("failed to write to system clipboard")?;
            Ok(())
        })
    }
}

/// Runs blocking work without stalling other tasks on the worker thread.
/// `block_in_place` panics on a current-thread runtime, so it is only used on
/// the multi-thread flavor.
fn run_blocking<T>(work: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(work)
        }
        _ => work(),
    }
}
