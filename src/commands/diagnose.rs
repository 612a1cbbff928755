// src/commands/diagnose.rs
//! Diagnose command

use super::Session;
use anyhow::{Result, bail};
use devboot::{FailureContext, RecoveryAdvisor, SystemRunner};

/// Print recovery options for an error, optionally running the top executable one
pub fn cmd_diagnose(
    session: &Session,
    error: &str,
    operation: &str,
    command: Option<&str>,
    execute: bool,
) -> Result<()> {
    let settings = &session.settings;
    let mut ctx = FailureContext::new(operation, error);
    if let Some(command) = command {
        ctx = ctx.with_command(command);
    }

    let advisor = RecoveryAdvisor::new().with_sudo(settings.use_sudo);
    let options = advisor.analyze(&ctx);

    println!("Recovery options for '{}':", ctx.operation);
    for (i, option) in options.iter().enumerate() {
        let kind = if option.is_automated() { "automated" } else { "manual" };
        println!("  {}. [{}] {} ({})", i + 1, option.priority, option.title, kind);
        println!("     {}", option.description);
        if let Some(action) = &option.action {
            println!("     $ {}", action);
        }
    }

    if !execute {
        return Ok(());
    }

    let Some(option) = RecoveryAdvisor::first_executable(&options) else {
        println!("\nNo automated critical or recommended option to run.");
        return Ok(());
    };

    println!("\nRunning: {}", option.title);
    let runner = SystemRunner::with_timeout(settings.command_timeout);
    let result = advisor.execute(option, &runner)?;
    if !result.success {
        bail!(result.message);
    }
    println!("{}", result.message);
    Ok(())
}
