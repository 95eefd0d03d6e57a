//! Single-exchange commands: echo, read, write, info and dfu.

use {
    crate::{Cli, CliError, config::Config, open_session},
    anyhow::Result,
    console::style,
    srwp::model_name,
    std::fmt::Write as _,
};

/// Bytes per hex dump line.
const DUMP_WIDTH: usize = 16;

/// Format `data` as a hex dump with addresses starting at `base`.
pub(crate) fn hex_dump(base: u32, data: &[u8]) -> String {
    let mut out = String::new();
    for (i, line) in data
        .chunks(DUMP_WIDTH)
        .enumerate()
    {
        let addr = u64::from(base) + (i * DUMP_WIDTH) as u64;
        let _ = write!(out, "{addr:08X}  ");
        for col in 0..DUMP_WIDTH {
            match line.get(col) {
                Some(b) => {
                    let _ = write!(out, "{b:02X} ");
                },
                None => out.push_str("   "),
            }
        }
        let ascii: String = line
            .iter()
            .map(|&b| {
                if b.is_ascii_graphic() || b == b' ' {
                    b as char
                } else {
                    '.'
                }
            })
            .collect();
        let _ = writeln!(out, " |{ascii}|");
    }
    out
}

/// Echo command implementation.
pub(crate) fn cmd_echo(cli: &Cli, config: &Config, message: &str) -> Result<()> {
    if !message.is_ascii() {
        return Err(CliError::Usage("echo message must be ASCII".to_string()).into());
    }

    let mut session = open_session(cli, config)?;
    if !cli.quiet {
        eprintln!("{} Echoing: {message}", style("→").cyan());
    }

    let resp = session.echo(message)?;
    session.close()?;

    println!("{}", String::from_utf8_lossy(resp.data()));

    if resp.data() != message.as_bytes() {
        return Err(CliError::Failed(format!(
            "echo mismatch: sent {} bytes, received {}",
            message.len(),
            resp.len()
        ))
        .into());
    }
    Ok(())
}

/// Read command implementation.
pub(crate) fn cmd_read(cli: &Cli, config: &Config, address: u32, size: u32) -> Result<()> {
    let mut session = open_session(cli, config)?;
    if !cli.quiet {
        eprintln!(
            "{} Reading {size} bytes from 0x{address:08X}",
            style("📖").cyan()
        );
    }

    let resp = session.read(address, size)?;
    session.close()?;

    print!("{}", hex_dump(address, resp.data()));

    if !resp.is_complete() {
        return Err(CliError::Failed(format!(
            "short read: expected {} bytes, got {}",
            resp.requested(),
            resp.len()
        ))
        .into());
    }
    Ok(())
}

/// Write command implementation.
pub(crate) fn cmd_write(cli: &Cli, config: &Config, address: u32, data: &str) -> Result<()> {
    if !data.is_ascii() {
        return Err(CliError::Usage("write data must be ASCII".to_string()).into());
    }

    let mut session = open_session(cli, config)?;
    if !cli.quiet {
        eprintln!(
            "{} Writing {} bytes to 0x{address:08X}",
            style("✍").cyan(),
            data.len()
        );
    }
    session.write(address, data.as_bytes())?;
    session.close()?;

    if !cli.quiet {
        eprintln!("{} Write complete", style("✓").green());
    }
    Ok(())
}

/// Info command implementation.
pub(crate) fn cmd_info(cli: &Cli, config: &Config, json: bool) -> Result<()> {
    let mut session = open_session(cli, config)?;
    let size = session.query_size()?;
    let port = session
        .port_name()
        .to_string();
    session.close()?;

    let model = model_name(size);

    if json {
        let output = serde_json::json!({
            "ok": true,
            "data": {
                "port": port,
                "size": size,
                "model": model,
            }
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    eprintln!(
        "\n{}",
        style("Device Information")
            .bold()
            .underlined()
    );
    eprintln!("  Port:  {}", style(&port).cyan());
    eprintln!("  Size:  {size} bytes");
    eprintln!("  Model: {}", model.unwrap_or("unknown"));
    Ok(())
}

/// Dfu command implementation.
pub(crate) fn cmd_dfu(cli: &Cli, config: &Config) -> Result<()> {
    let mut session = open_session(cli, config)?;
    session.enter_update_mode()?;
    session.close()?;

    if !cli.quiet {
        eprintln!(
            "{} Device switched to firmware update mode",
            style("✓").green()
        );
    }
    Ok(())
}
