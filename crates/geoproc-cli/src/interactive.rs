use crate::output_types::StepRow;
use anyhow::{bail, Result};
use console::Term;
use dialoguer::{Confirm, Input};
use tabled::{settings::Style, Table};

/// Whether prompts can be shown
pub fn is_interactive() -> bool {
    Term::stdout().is_term() && Term::stderr().is_term()
}

/// Ask for the request text
pub fn prompt_query() -> Result<String> {
    if !is_interactive() {
        bail!("No request given and no terminal to ask for one");
    }
    let query: String = Input::new()
        .with_prompt("What should be done with the layers?")
        .validate_with(|input: &String| -> std::result::Result<(), &str> {
            if input.trim().is_empty() {
                Err("The request cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;
    Ok(query.trim().to_string())
}

/// Show the generated plan and ask before running it
pub fn confirm_plan(steps: Vec<StepRow>) -> Result<bool> {
    println!("\n📋 Generated plan\n");
    if steps.is_empty() {
        println!("  (no runnable steps)");
    } else {
        let mut table = Table::new(steps);
        table.with(Style::rounded());
        println!("{}", table);
    }
    println!();

    let confirmed = Confirm::new().with_prompt("Run this plan?").default(true).interact()?;
    Ok(confirmed)
}
