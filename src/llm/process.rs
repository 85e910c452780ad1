//! Subprocess plumbing shared by the CLI providers.

use std::io::ErrorKind;
use std::process::{Output, Stdio};

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Spawn `cmd`, write `input` to its stdin, and collect its output.
///
/// Prompts travel over stdin because a single argv entry is capped at
/// 128 KiB on Linux. The write runs alongside the wait so a child that
/// streams output before draining stdin cannot deadlock on a full pipe.
pub(crate) async fn output_with_stdin(cmd: &mut Command, input: &str) -> std::io::Result<Output> {
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| std::io::Error::other("child stdin was not captured"))?;

    let write = async move {
        let result = stdin.write_all(input.as_bytes()).await;
        drop(stdin);
        result
    };

    let (written, output) = tokio::join!(write, child.wait_with_output());
    let output = output?;

    // A child that exits without reading everything closes the pipe early;
    // its exit status carries the real failure.
    match written {
        Err(e) if e.kind() != ErrorKind::BrokenPipe => Err(e),
        _ => Ok(output),
    }
}
