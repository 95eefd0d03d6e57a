//! Whole-device commands: clear, check, backup, restore and verify.

use {
    crate::{Cli, CliError, config::Config, open_session, use_fancy_output},
    anyhow::{Context, Result},
    console::style,
    indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle},
    std::{fs, path::Path, time::Duration},
};

/// Progress bar for a whole-device read of `total` bytes.
fn transfer_bar(cli: &Cli, total: u64) -> ProgressBar {
    if cli.quiet || !use_fancy_output() {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(total);
    #[allow(clippy::unwrap_used)] // Static template string
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb
}

/// Spinner for operations without intermediate progress.
fn spinner(cli: &Cli, msg: &'static str) -> ProgressBar {
    if cli.quiet || !use_fancy_output() {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.set_message(msg);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn read_file(file: &Path) -> Result<Vec<u8>> {
    fs::read(file).with_context(|| format!("Failed to read {}", file.display()))
}

/// Clear command implementation.
pub(crate) fn cmd_clear(cli: &Cli, config: &Config) -> Result<()> {
    let mut session = open_session(cli, config)?;

    let pb = spinner(cli, "Clearing FRAM...");
    session.clear()?;
    session.close()?;
    pb.finish_and_clear();

    if !cli.quiet {
        eprintln!("{} FRAM cleared", style("✓").green());
    }
    Ok(())
}

/// Check command implementation.
pub(crate) fn cmd_check(cli: &Cli, config: &Config) -> Result<()> {
    let mut session = open_session(cli, config)?;

    let pb = spinner(cli, "Checking if FRAM is empty...");
    let empty = session.is_empty()?;
    session.close()?;
    pb.finish_and_clear();

    if !empty {
        return Err(CliError::Failed("FRAM is not empty".to_string()).into());
    }
    if !cli.quiet {
        eprintln!("{} FRAM is empty", style("✓").green());
    }
    Ok(())
}

/// Backup command implementation.
pub(crate) fn cmd_backup(cli: &Cli, config: &Config, file: &Path) -> Result<()> {
    let mut session = open_session(cli, config)?;
    if !cli.quiet {
        eprintln!(
            "{} Backing up FRAM to {}",
            style("💾").cyan(),
            file.display()
        );
    }

    let pb = transfer_bar(cli, u64::from(session.device_size()));
    let data = session.read_whole_device_with_progress(|done, _| pb.set_position(done as u64))?;
    session.close()?;
    pb.finish_and_clear();

    fs::write(file, &data).with_context(|| format!("Failed to write {}", file.display()))?;

    if !cli.quiet {
        eprintln!(
            "{} Backup complete ({} bytes)",
            style("✓").green(),
            data.len()
        );
    }
    Ok(())
}

/// Restore command implementation.
pub(crate) fn cmd_restore(cli: &Cli, config: &Config, file: &Path, chunked: bool) -> Result<()> {
    let image = read_file(file)?;

    let mut session = open_session(cli, config)?;
    let size = session.device_size() as usize;
    if image.len() > size {
        return Err(CliError::Usage(format!(
            "{} is {} bytes, larger than the {size}-byte device",
            file.display(),
            image.len()
        ))
        .into());
    }

    let data = session.pad_to_device_size(&image);
    if !cli.quiet {
        eprintln!(
            "{} Restoring FRAM from {} ({} bytes{})",
            style("📥").cyan(),
            file.display(),
            image.len(),
            if image.len() < size {
                ", zero-padded"
            } else {
                ""
            }
        );
    }

    if chunked {
        let pb = spinner(cli, "Writing chunks...");
        let report = session.write_whole_device_chunked(&data)?;
        session.close()?;
        pb.finish_and_clear();

        if !report.is_complete() {
            let gaps: Vec<String> = report
                .failed
                .iter()
                .map(|c| format!("0x{:08X}+{}", c.address, c.len))
                .collect();
            return Err(CliError::Failed(format!(
                "{} of {} chunks failed, device has gaps at {}",
                report.failed.len(),
                report.failed.len() + report.written,
                gaps.join(", ")
            ))
            .into());
        }
    } else {
        session.write_whole_device(&data)?;
        session.close()?;
    }

    if !cli.quiet {
        eprintln!("{} Restore complete", style("✓").green());
    }
    Ok(())
}

/// Verify command implementation.
pub(crate) fn cmd_verify(cli: &Cli, config: &Config, file: &Path) -> Result<()> {
    let expected = read_file(file)?;

    let mut session = open_session(cli, config)?;
    if !cli.quiet {
        eprintln!(
            "{} Verifying FRAM against {}",
            style("🔍").cyan(),
            file.display()
        );
    }

    let pb = spinner(cli, "Reading FRAM...");
    let matches = session.verify(&expected)?;
    session.close()?;
    pb.finish_and_clear();

    if !matches {
        return Err(CliError::Failed(format!(
            "FRAM content does not match {}",
            file.display()
        ))
        .into());
    }
    if !cli.quiet {
        eprintln!("{} FRAM matches {}", style("✓").green(), file.display());
    }
    Ok(())
}
