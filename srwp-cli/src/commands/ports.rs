//! Port listing command implementation.

use {
    anyhow::Result,
    console::style,
    srwp::{Error, device::platform_discovery, select_single},
};

/// List ports command implementation.
pub(crate) fn cmd_list_ports(json: bool) -> Result<()> {
    let discovery = platform_discovery();
    let candidates = discovery.discover_candidates()?;
    let searched = discovery.describe();

    if json {
        let output = serde_json::json!({
            "ok": true,
            "data": {
                "searched": searched,
                "ports": candidates,
            }
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    eprintln!(
        "{}",
        style(format!("Candidate devices ({searched})"))
            .bold()
            .underlined()
    );

    if candidates.is_empty() {
        eprintln!("  {}", style("No devices found").dim());
        return Ok(());
    }

    for port in &candidates {
        eprintln!("  {} {}", style("•").green(), style(port).cyan());
    }

    match select_single(candidates, &searched) {
        Ok(port) => eprintln!(
            "\n{} Auto-detected: {}",
            style("→")
                .green()
                .bold(),
            style(port)
                .cyan()
                .bold()
        ),
        Err(Error::Ambiguous { .. }) => eprintln!(
            "\n{} Several devices found; pick one with --device",
            style("!").yellow()
        ),
        Err(_) => {},
    }

    Ok(())
}
