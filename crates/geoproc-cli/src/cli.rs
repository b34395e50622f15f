use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// GeoProc - Automatic projection selection and geoprocessing
#[derive(Parser, Debug)]
#[command(name = "geoproc")]
#[command(about = "Automatic projection selection and geoprocessing for GeoJSON layers", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Show planned steps without executing them
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Configuration file (defaults to ./geoproc.toml when present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Keep inputs in their own CRS instead of choosing a working projection
    #[arg(long, global = true)]
    pub no_auto_crs: bool,

    /// Attach `_crs_metadata` to every output layer
    #[arg(long, global = true)]
    pub projection_metadata: bool,

    /// Largest extent in degrees that still counts as local (UTM)
    #[arg(long, global = true, value_name = "DEGREES")]
    pub local_extent_deg: Option<f64>,

    /// Buffer radius in meters above which buffering goes geodesic
    #[arg(long, global = true, value_name = "METERS")]
    pub large_radius_m: Option<f64>,

    /// Prefer registered EPSG codes over custom projection definitions
    #[arg(long, global = true, value_name = "BOOL")]
    pub prefer_standard_codes: Option<bool>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Choose a working projection for a bounding box
    Decide(DecideArgs),

    /// Run a single operation on GeoJSON layers
    Run(RunArgs),

    /// Run an operation plan read from a JSON file
    Plan(PlanArgs),

    /// Ask a language model to plan and run a request
    Query(QueryArgs),

    /// Check whether a CRS code is usable
    ValidateCrs(ValidateCrsArgs),

    /// Show the effective configuration and where each value came from
    Config(ConfigArgs),
}

#[derive(Parser, Debug)]
pub struct DecideArgs {
    /// Bounding box as min_lon,min_lat,max_lon,max_lat (min_lon > max_lon crosses the antimeridian)
    #[arg(long, value_parser = parse_bbox, allow_hyphen_values = true)]
    pub bbox: [f64; 4],

    /// Operation the projection is chosen for
    #[arg(long, default_value = "buffer")]
    pub operation: String,

    /// Property to preserve (equal_area, conformal, equidistant)
    #[arg(long)]
    pub priority: Option<String>,
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Operation name (buffer, overlay, clip, dissolve, simplify, sjoin, sjoin_nearest, area, centroid, merge)
    pub operation: String,

    /// Input GeoJSON files, in order
    #[arg(long, short = 'i', required = true, num_args = 1..)]
    pub input: Vec<PathBuf>,

    /// Operation parameters as a JSON object
    /// Example: --params '{"radius": 500, "radius_unit": "meters"}'
    #[arg(long)]
    pub params: Option<String>,

    /// Write the result here instead of stdout
    /// With several output layers, files are numbered: out.geojson, out_1.geojson, ...
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct PlanArgs {
    /// Plan file: a JSON list of {"operation", "params"} steps
    #[arg(long)]
    pub plan: PathBuf,

    /// Input GeoJSON files, in order
    #[arg(long, short = 'i', required = true, num_args = 1..)]
    pub input: Vec<PathBuf>,

    /// Write the result here instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct QueryArgs {
    /// The request, e.g. "area of the parks within 500 m of the river"
    pub query: Option<String>,

    /// Input GeoJSON files, in order
    #[arg(long, short = 'i', required = true, num_args = 1..)]
    pub input: Vec<PathBuf>,

    /// Ollama model (defaults to the configured generator model)
    #[arg(long)]
    pub model: Option<String>,

    /// Ollama base URL
    #[arg(long, default_value = "http://localhost:11434")]
    pub url: String,

    /// Write the result here instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Run the generated plan without asking for confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Interactive mode - prompt for the request
    #[arg(long)]
    pub interactive: bool,
}

#[derive(Parser, Debug)]
pub struct ValidateCrsArgs {
    /// CRS code, e.g. EPSG:32633
    pub code: String,
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Print the effective values as a TOML config file
    #[arg(long)]
    pub toml: bool,
}

fn parse_bbox(value: &str) -> Result<[f64; 4], String> {
    let parts = value
        .split(',')
        .map(|p| p.trim().parse::<f64>().map_err(|_| format!("'{}' is not a number", p.trim())))
        .collect::<Result<Vec<_>, _>>()?;
    <[f64; 4]>::try_from(parts)
        .map_err(|parts| format!("expected 4 comma separated numbers, got {}", parts.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_bbox() {
        assert_eq!(parse_bbox("-10, 40.5, 5, 50").unwrap(), [-10.0, 40.5, 5.0, 50.0]);
        assert!(parse_bbox("1,2,3").unwrap_err().contains("got 3"));
        assert!(parse_bbox("a,2,3,4").is_err());
    }

    #[test]
    fn test_decide_accepts_negative_bbox() {
        let cli = Cli::try_parse_from(["geoproc", "decide", "--bbox", "-74.1,40.6,-73.8,40.9"])
            .unwrap();
        let Commands::Decide(args) = cli.command else {
            panic!("expected decide");
        };
        assert_eq!(args.bbox[0], -74.1);
        assert_eq!(args.operation, "buffer");
    }
}
