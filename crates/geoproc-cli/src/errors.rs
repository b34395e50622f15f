use console::style;
use geoproc_core::GeoprocError;
use geoproc_executor::ExecutorError;
use std::fmt;

/// Error with remediation hints, printed instead of the raw error chain
#[derive(Clone)]
pub struct CliError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
    pub help_command: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
            help_command: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_help(mut self, command: impl Into<String>) -> Self {
        self.help_command = Some(command.into());
        self
    }

    pub fn display(&self) {
        eprintln!("{} {}\n", style("✗").red().bold(), style(&self.message).red().bold());

        if let Some(ref context) = self.context {
            eprintln!("{}", context);
            eprintln!();
        }

        if !self.suggestions.is_empty() {
            eprintln!("{}", style("To fix this:").yellow().bold());
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, suggestion);
            }
            eprintln!();
        }

        if let Some(ref help_cmd) = self.help_command {
            eprintln!("{} {}", style("Need help?").cyan(), style(help_cmd).cyan().bold());
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn unknown_operation(name: &str, catalog: &str) -> CliError {
    CliError::new(format!("Unknown operation '{}'", name))
        .with_context(format!("Available operations:\n{}", catalog))
        .with_suggestion("Use one of the operation names listed above")
        .with_help("Run: geoproc run --help")
}

pub fn invalid_priority(value: &str) -> CliError {
    CliError::new(format!("Unknown projection property '{}'", value))
        .with_suggestion("Use equal_area, conformal or equidistant")
        .with_help("Run: geoproc decide --help")
}

pub fn generator_unavailable(reason: &str, remediation: &str) -> CliError {
    CliError::new("Plan generator not available")
        .with_context(format!("Error: {}", reason))
        .with_suggestion(remediation.to_string())
        .with_suggestion("Check that Ollama is running: ollama list")
        .with_suggestion("Or run a hand-written plan: geoproc plan --plan plan.json --input ...")
        .with_help("Run: geoproc query --help")
}

pub fn plan_unreadable(reason: &str) -> CliError {
    CliError::new("The operation plan could not be parsed")
        .with_context(format!("Error: {}", reason))
        .with_suggestion("Plans are JSON: [{\"operation\": \"buffer\", \"params\": {\"radius\": 100}}]")
        .with_suggestion("For query, try rephrasing the request or a different --model")
}

/// Map known domain failures to hinted errors; anything else prints as is
pub fn from_anyhow(error: anyhow::Error) -> CliError {
    if let Some(cli_error) = error.downcast_ref::<CliError>() {
        return cli_error.clone();
    }

    let geoproc_error = error.downcast_ref::<GeoprocError>().or_else(|| {
        match error.downcast_ref::<ExecutorError>() {
            Some(ExecutorError::Operation(e)) | Some(ExecutorError::Generation(e)) => Some(e),
            _ => None,
        }
    });
    if let Some(ExecutorError::PlanParse { reason }) = error.downcast_ref::<ExecutorError>() {
        return plan_unreadable(reason);
    }

    match geoproc_error {
        Some(GeoprocError::GeneratorUnavailable { reason, remediation }) => {
            generator_unavailable(reason, remediation)
        }
        Some(GeoprocError::InvalidCrs { code, reason }) => {
            CliError::new(format!("Invalid CRS '{}'", code))
                .with_context(format!("Reason: {}", reason))
                .with_suggestion(format!("Check the code with: geoproc validate-crs {}", code))
        }
        Some(GeoprocError::InvalidArity { operation, .. }) => CliError::new(error.to_string())
            .with_suggestion(format!("Check how many --input layers {} accepts", operation))
            .with_help("Run: geoproc run --help"),
        Some(GeoprocError::InvalidParameter { name, .. }) => CliError::new(error.to_string())
            .with_suggestion(format!("Fix '{}' in --params", name)),
        _ => {
            let chain: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();
            let cli_error = CliError::new(error.to_string());
            if chain.is_empty() {
                cli_error
            } else {
                cli_error.with_context(format!("Caused by: {}", chain.join(": ")))
            }
        }
    }
}
