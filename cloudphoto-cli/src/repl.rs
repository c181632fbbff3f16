use anyhow::{Context, Result};
use cloudphoto_core::{parser, CommandType, Config, ObjectStore};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::commands;

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

/// Reads commands from stdin until `exit` or end of input.
pub async fn run(store: &dyn ObjectStore, config: &Config) -> Result<()> {
    run_with(BufReader::new(tokio::io::stdin()), store, config).await
}

async fn run_with<R>(mut input: R, store: &dyn ObjectStore, config: &Config) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();

    while let Some(line) = next_line(&mut input, &mut buf).await? {
        if execute_line(store, config, &line).await? == Flow::Exit {
            tracing::debug!("Exit requested");
            return Ok(());
        }
    }

    tracing::debug!("Input closed");
    Ok(())
}

/// Next input line without its terminator. Bytes that are not UTF-8 are
/// replaced so the line still reaches the parser.
async fn next_line<R>(input: &mut R, buf: &mut Vec<u8>) -> Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    let read = input
        .read_until(b'\n', buf)
        .await
        .context("Failed to read command")?;
    if read == 0 {
        return Ok(None);
    }

    if buf.ends_with(b"\n") {
        buf.pop();
        if buf.ends_with(b"\r") {
            buf.pop();
        }
    }

    Ok(Some(String::from_utf8_lossy(buf).into_owned()))
}

async fn execute_line(store: &dyn ObjectStore, config: &Config, line: &str) -> Result<Flow> {
    let command = match parser::parse(line) {
        Ok(command) => command,
        Err(err) => {
            println!("!{err}");
            return Ok(Flow::Continue);
        }
    };

    match command.kind() {
        CommandType::Upload => commands::upload::execute(store, config, &command).await?,
        CommandType::Download => commands::download::execute(store, config, &command).await?,
        CommandType::List => commands::list::execute(store, config, &command).await?,
        CommandType::Exit => return Ok(Flow::Exit),
    }

    Ok(Flow::Continue)
}
