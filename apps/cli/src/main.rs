//! Eclectic CLI
//!
//! - `eclectic compile` turns a criteria JSON object into a WHERE fragment
//!   and its bind parameters
//! - `eclectic normalize` makes a SQL template's parameters bindable

mod config;
mod logging;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use eclectic_criteria::{
    criteria_for_key, normalize, params_from_json, to_positional, Operator, ParameterStore,
    PreparedQuery,
};
use serde_json::{json, Value};
use std::io::Read;
use std::path::PathBuf;

use crate::config::CliConfig;

#[derive(Parser, Debug)]
#[command(name = "eclectic", version, about = "Compile filter criteria into SQL WHERE fragments")]
struct Cli {
    /// Configuration file (defaults to ./eclectic.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile one field's criteria
    Compile(CompileArgs),
    /// Expand list and date/time parameters of a SQL template
    Normalize(NormalizeArgs),
}

#[derive(Args, Debug)]
struct CompileArgs {
    /// SQL expression the condition applies to, e.g. `u.status`
    #[arg(long)]
    field: String,

    /// Criteria key for the field (defaults to --field)
    #[arg(long)]
    key: Option<String>,

    /// Criteria JSON, `@path` to read a file, `-` for stdin
    #[arg(long)]
    criteria: String,

    /// Top-level operator (overrides configuration)
    #[arg(long)]
    operator: Option<String>,

    /// Bind whole lists to one placeholder
    #[arg(long)]
    no_expand: bool,

    /// Reject unknown operator keys
    #[arg(long)]
    strict: bool,

    /// Normalize the resulting parameters as well
    #[arg(long)]
    normalize: bool,
}

#[derive(Args, Debug)]
struct NormalizeArgs {
    /// SQL text with `:name` placeholders, `@path` or `-`
    #[arg(long)]
    sql: String,

    /// Parameters JSON object, `@path` or `-`
    #[arg(long)]
    params: String,

    /// Rewrite to `$n` placeholders with an ordered bind list
    #[arg(long)]
    positional: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = CliConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {e}"))?;

    logging::init_logging(&config.logging);

    let output = match cli.command {
        Command::Compile(args) => run_compile(&config, args)?,
        Command::Normalize(args) => run_normalize(args)?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn run_compile(config: &CliConfig, args: CompileArgs) -> anyhow::Result<Value> {
    let mut compiler = config.compiler();
    if let Some(op) = &args.operator {
        let operator: Operator = op.parse().context("Invalid --operator")?;
        compiler = compiler.with_operator(operator);
    }
    if args.no_expand {
        compiler = compiler.with_expand(false);
    }
    let mut json_options = config.json_options();
    json_options.strict |= args.strict;

    let key = args.key.as_deref().unwrap_or(&args.field);
    let raw = read_input(&args.criteria).context("Failed to read criteria")?;
    let value: Value = serde_json::from_str(&raw).context("Criteria is not valid JSON")?;
    let criteria = criteria_for_key(&value, key, json_options).context("Invalid criteria")?;

    let mut params = ParameterStore::new();
    let Some(fragment) = compiler.compile(&args.field, &criteria, key, &mut params) else {
        tracing::info!(key, "no criteria for key");
        return Ok(json!({ "sql": null, "params": {} }));
    };

    let query = if args.normalize {
        normalize(&fragment, &params)
    } else {
        PreparedQuery::new(fragment, params)
    };
    Ok(serde_json::to_value(&query)?)
}

fn run_normalize(args: NormalizeArgs) -> anyhow::Result<Value> {
    let sql = read_input(&args.sql).context("Failed to read SQL")?;
    let raw = read_input(&args.params).context("Failed to read parameters")?;
    let value: Value = serde_json::from_str(&raw).context("Parameters are not valid JSON")?;
    let params = params_from_json(&value).context("Invalid parameters")?;

    let prepared = normalize(sql.trim_end(), &params);
    if args.positional {
        let (sql, binds) = to_positional(&prepared).context("Failed to rewrite placeholders")?;
        return Ok(json!({ "sql": sql, "binds": binds }));
    }
    Ok(serde_json::to_value(&prepared)?)
}

fn read_input(arg: &str) -> anyhow::Result<String> {
    if arg == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }
    if let Some(path) = arg.strip_prefix('@') {
        return std::fs::read_to_string(path).with_context(|| format!("Failed to read {path}"));
    }
    Ok(arg.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile_args(criteria: &str) -> CompileArgs {
        CompileArgs {
            field: "t.status".to_string(),
            key: Some("status".to_string()),
            criteria: criteria.to_string(),
            operator: None,
            no_expand: false,
            strict: false,
            normalize: false,
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn compile_outputs_sql_and_params() {
        let out = run_compile(
            &CliConfig::default(),
            compile_args(r#"{"status": ["a", "b"]}"#),
        )
        .unwrap();
        assert_eq!(out["sql"], "t.status IN (:status_1,:status_2)");
        assert_eq!(out["params"]["status_2"], "b");
    }

    #[test]
    fn compile_flags_override_config() {
        let mut args = compile_args(r#"{"status": ["a", "b"]}"#);
        args.no_expand = true;
        args.normalize = true;
        args.operator = Some("<>".to_string());
        let out = run_compile(&CliConfig::default(), args).unwrap();
        assert_eq!(out["sql"], "t.status NOT IN (:status1, :status2)");
        assert_eq!(out["params"]["status1"], "a");
    }

    #[test]
    fn compile_bare_value_is_shorthand() {
        let out = run_compile(&CliConfig::default(), compile_args("\"open\"")).unwrap();
        assert_eq!(out["sql"], "t.status = :status");
    }

    #[test]
    fn compile_without_key_yields_null_sql() {
        let out = run_compile(&CliConfig::default(), compile_args(r#"{"other": 1}"#))
            .unwrap();
        assert!(out["sql"].is_null());
    }

    #[test]
    fn normalize_positional_lists_binds() {
        let out = run_normalize(NormalizeArgs {
            sql: "id IN (:ids) AND at >= :at".to_string(),
            params: r#"{"ids": [1, 2], "at": {"$datetime": "2022-03-04 05:06:07"}}"#.to_string(),
            positional: true,
        })
        .unwrap();
        assert_eq!(out["sql"], "id IN ($1, $2) AND at >= $3");
        assert_eq!(out["binds"], json!([1, 2, "2022-03-04 05:06:07"]));
    }
}
