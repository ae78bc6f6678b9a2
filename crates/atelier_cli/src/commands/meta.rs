//! Shell completions and man pages.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::Shell;
use clap_mangen::Man;

use crate::Cli;

const BIN: &str = "atelier";

fn completions(shell: Shell) -> Vec<u8> {
    let mut buf = Vec::new();
    clap_complete::generate(shell, &mut Cli::command(), BIN, &mut buf);
    buf
}

fn render_man(cmd: clap::Command) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    Man::new(cmd).render(&mut buf)?;
    Ok(buf)
}

/// Write `atelier.1` plus `atelier-<sub>.1` for every visible subcommand.
fn write_man_pages(dir: &Path) -> io::Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let root = Cli::command().name(BIN);

    let mut written = Vec::new();
    let path = dir.join(format!("{BIN}.1"));
    fs::write(&path, render_man(root.clone())?)?;
    written.push(path);

    for sub in root.get_subcommands().filter(|s| !s.is_hide_set()) {
        let name = format!("{BIN}-{}", sub.get_name());
        let path = dir.join(format!("{name}.1"));
        fs::write(&path, render_man(sub.clone().name(name))?)?;
        written.push(path);
    }
    Ok(written)
}

pub(crate) fn handle_completions(
    shell: Shell,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let script = completions(shell);
    match output {
        Some(path) => {
            fs::write(&path, script)?;
            eprintln!("Wrote {shell} completions to {}", path.display());
        }
        None => io::stdout().write_all(&script)?,
    }
    Ok(())
}

pub(crate) fn handle_man(output: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let Some(dir) = output else {
        io::stdout().write_all(&render_man(Cli::command().name(BIN))?)?;
        return Ok(());
    };

    let written = write_man_pages(&dir)?;
    println!("Wrote {} man pages to {}", written.len(), dir.display());
    Ok(())
}
