//! Host-side helper: `cargo run` builds the wasm bundle into `static/pkg` and
//! serves `static/` on http://127.0.0.1:8000.

use std::io;
use std::process::{Command, ExitCode, Stdio};

const PORT: &str = "8000";

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> io::Result<()> {
    println!("Building WASM pkg …");
    match Command::new("wasm-pack")
        .args(["build", "--release", "--target", "web", "--out-dir", "static/pkg"])
        .status()
    {
        Ok(status) if status.success() => {}
        Ok(_) => {
            return Err(io::Error::other(
                "wasm-pack finished with errors. Ensure the wasm32-unknown-unknown target is installed.",
            ))
        }
        Err(_) => {
            eprintln!("wasm-pack not found in PATH. Serving whatever is already in static/pkg.");
        }
    }

    println!("Serving static/ at http://127.0.0.1:{PORT} (Ctrl-C to stop) …");
    let status = Command::new("python3")
        .args(["-m", "http.server", PORT, "--bind", "127.0.0.1", "--directory", "static"])
        .stdout(Stdio::null())
        .status()?;
    if status.success() {
        Ok(())
    } else {
        Err(io::Error::other("http server exited with an error"))
    }
}
