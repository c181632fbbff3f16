pub mod download;
pub mod list;
pub mod upload;

use anyhow::Result;
use cloudphoto_core::TransferError;

/// Prints recoverable failures at the prompt and hands fatal ones back to the caller.
fn report_failure(err: TransferError) -> Result<()> {
    if err.is_fatal() {
        return Err(err.into());
    }
    println!("!{err}");
    Ok(())
}
