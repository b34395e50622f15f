//! Validate-crs command implementation

use crate::cli::ValidateCrsArgs;
use crate::errors::CliError;
use crate::output::OutputWriter;
use crate::output_types::ValidateCrsOutput;
use anyhow::Result;
use geoproc_geo::validate_crs;

pub fn execute(args: ValidateCrsArgs, output: &OutputWriter) -> Result<()> {
    let valid = validate_crs(&args.code);

    if output.is_json() {
        output.result(ValidateCrsOutput { code: args.code.clone(), valid })?;
    } else if valid {
        output.success(format!("{} is a usable CRS", args.code));
    }

    if !valid {
        return Err(CliError::new(format!("'{}' is not a usable CRS", args.code))
            .with_suggestion("Use an EPSG code such as EPSG:4326 or EPSG:32633")
            .with_suggestion("Or a PROJ/WKT definition understood by PROJ")
            .into());
    }
    Ok(())
}
