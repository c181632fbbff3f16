use anyhow::Result;
use cloudphoto_core::{Argument, Command, Config, ObjectStore, TransferEngine};

pub async fn execute(store: &dyn ObjectStore, config: &Config, command: &Command) -> Result<()> {
    let (Some(path), Some(album)) = (
        command.parameter(Argument::Path),
        command.parameter(Argument::Album),
    ) else {
        println!("!Invalid command!");
        return Ok(());
    };

    tracing::info!("Downloading album {} into {}", album, path);

    let engine = TransferEngine::new(store, &config.tag_key);
    match engine.download(path, album).await {
        Ok(report) => println!("{report}"),
        Err(err) => super::report_failure(err)?,
    }

    Ok(())
}
