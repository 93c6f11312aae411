use std::{
    io::{BufRead, BufReader, Read},
    process::{Child, Command, ExitStatus, Stdio},
    thread,
};

use crate::errors::CovError;

pub trait OutputFormatter {
    fn line(&mut self, line: &str) -> Result<(), CovError>;
    fn err_line(&mut self, line: &str) -> Result<(), CovError>;
}

#[derive(Clone, Debug)]
pub struct CaptureOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: ExitStatus,
}

impl CaptureOutput {
    pub fn combined(&self) -> String {
        let mut combined = self.stdout.clone();
        combined.push_str(&self.stderr);
        combined
    }
}

pub fn command_line(command: &Command) -> String {
    let program = command.get_program().to_string_lossy().to_string();
    let args: Vec<String> = command
        .get_args()
        .map(|arg| arg.to_string_lossy().to_string())
        .collect();
    format!("{} {}", program, args.as_slice().join(" "))
}

fn strip_ansi(raw_line: &[u8]) -> String {
    // pytest output is not guaranteed to be UTF-8, a stray Latin-1 byte must not abort the run
    let decoded = String::from_utf8_lossy(raw_line);
    String::from_utf8_lossy(&strip_ansi_escapes::strip(decoded.as_bytes()))
        .trim_end_matches(['\n', '\r'])
        .to_string()
}

fn for_each_line<R, C>(mut reader: R, mut on_line: C) -> Result<(), CovError>
where
    R: BufRead,
    C: FnMut(String) -> Result<(), CovError>,
{
    let mut buffer = vec![];
    loop {
        buffer.clear();
        if reader.read_until(b'\n', &mut buffer)? == 0 {
            return Ok(());
        }
        on_line(strip_ansi(&buffer))?;
    }
}

fn stream_output<F>(child: &mut Child, formatter: &mut F) -> Result<(String, String), CovError>
where
    F: OutputFormatter,
{
    // stderr is drained on its own thread so a chatty child can not block on a full pipe
    let stderr_reader = child.stderr.take().map(|mut stderr| {
        thread::spawn(move || {
            let mut buffer = vec![];
            stderr.read_to_end(&mut buffer).map(|_| buffer)
        })
    });

    let mut stdout_output = String::new();
    if let Some(stdout) = child.stdout.take() {
        for_each_line(BufReader::new(stdout), |line| {
            formatter.line(&line)?;
            stdout_output.push_str(&line);
            stdout_output.push('\n');
            Ok(())
        })?;
    }

    let mut stderr_output = String::new();
    if let Some(handle) = stderr_reader {
        let raw = handle
            .join()
            .map_err(|_| CovError::RuntimeError("stderr reader thread panicked".to_string()))??;
        for_each_line(raw.as_slice(), |line| {
            formatter.err_line(&line)?;
            stderr_output.push_str(&line);
            stderr_output.push('\n');
            Ok(())
        })?;
    }

    Ok((stdout_output, stderr_output))
}

/// Runs `cmd`, feeding every output line to `formatter`.
///
/// Only a failed spawn is reported as a launch failure. Errors while streaming kill and reap the
/// child before they are returned.
pub fn run_and_capture_print<F>(mut cmd: Command, formatter: &mut F) -> Result<CaptureOutput, CovError>
where
    F: OutputFormatter,
{
    let program = cmd.get_program().to_string_lossy().to_string();
    let mut child = cmd
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| CovError::RuntimeError(format!("Failed to launch '{}': {}", program, err)))?;

    let (stdout, stderr) = match stream_output(&mut child, formatter) {
        Ok(streams) => streams,
        Err(err) => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(err);
        }
    };
    let status = child.wait()?;

    Ok(CaptureOutput {
        stdout,
        stderr,
        status,
    })
}
