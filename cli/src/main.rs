use std::fmt;
use std::io::Write;

use farg_core::{ArgHandle, Handler, OpenMode, ParserConfig, RegistrationError};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const PROGRAM: &str = "farg-demo";
const CONFIG_ENV: &str = "FARG_DEMO_CONFIG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum LinkMode {
    Access,
    Trunk,
    Hybrid,
}

impl fmt::Display for LinkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Access => "access",
            Self::Trunk => "trunk",
            Self::Hybrid => "hybrid",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReportFormat {
    Text,
    Json,
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Json => "json",
        })
    }
}

/// Resolved interface settings written to the output.
#[derive(Debug, Serialize)]
struct Report {
    interface: String,
    interface_type: Option<String>,
    interface_number: Option<String>,
    mtu: u32,
    mode: LinkMode,
    weight: Option<f64>,
    verbosity: u8,
    quiet: bool,
    leftover: Vec<String>,
}

struct DemoArgs {
    handler: Handler,
    interface: ArgHandle<String>,
    mtu: ArgHandle<u32>,
    mode: ArgHandle<LinkMode>,
    weight: ArgHandle<f64>,
    verbose: ArgHandle<u8>,
    quiet: ArgHandle<bool>,
    dry_run: ArgHandle<bool>,
    output: ArgHandle<String>,
    format: ArgHandle<ReportFormat>,
    help: ArgHandle<bool>,
}

fn main() {
    init_tracing();

    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config() -> Result<ParserConfig, String> {
    match std::env::var(CONFIG_ENV) {
        Ok(path) => {
            let config = ParserConfig::load(&path)
                .map_err(|err| format!("Failed to load parser config '{path}': {err}"))?;
            debug!(path = %path, ?config, "Loaded parser configuration");
            Ok(config)
        }
        Err(_) => Ok(ParserConfig::default()),
    }
}

fn declare(config: ParserConfig) -> Result<DemoArgs, RegistrationError> {
    let mut handler = Handler::with_config(config);

    let interface = handler
        .string("interface")
        .positional()
        .snip_regex(
            r"^(?P<TYPE>eth|agg)(?=[0-9]|$)",
            "the interface type must be eth or agg",
        )?
        .regex(r"^(?P<NUMBER>[0-9]+)$", "{0:TYPE} must be followed by a number")?
        .register()?;
    let mtu = handler
        .integer::<u32>("mtu")
        .short('m')
        .description("the MTU")
        .default_value(1500)
        .range(576, 9216)?
        .register()?;
    let mode = handler
        .choice("mode", [LinkMode::Access, LinkMode::Trunk, LinkMode::Hybrid])
        .register()?;
    let weight = handler
        .float::<f64>("weight")
        .short('w')
        .range(0.0, 1.0)?
        .register()?;
    let verbose = handler.counter::<u8>("verbose").short('v').register()?;
    let quiet = handler.flag("quiet").short('q').register()?;
    let dry_run = handler.flag("dry-run").short('n').register()?;
    // Opened only after the dry-run check, so a dry run leaves it untouched.
    let output = handler
        .string("output")
        .short('o')
        .description("the output file")
        .default_value("-".to_string())
        .register()?;
    let format = handler
        .choice("format", [ReportFormat::Text, ReportFormat::Json])
        .register()?;
    let help = handler.flag("help").short('h').undocumented().register()?;

    handler.at_most(1, &[verbose.id(), quiet.id()])?;
    handler.implies(mode.id(), &[weight.id()])?;

    Ok(DemoArgs {
        handler,
        interface,
        mtu,
        mode,
        weight,
        verbose,
        quiet,
        dry_run,
        output,
        format,
        help,
    })
}

fn run() -> Result<(), String> {
    let config = load_config()?;
    let mut args = declare(config).map_err(|err| err.to_string())?;
    let leftover = args.handler.parse_env().map_err(|err| err.to_string())?;
    let handler = &args.handler;

    if *handler.value(&args.help) {
        println!("{}", handler.usage(PROGRAM));
        return Ok(());
    }
    if !handler.was_seen(&args.interface) {
        return Err(format!(
            "an interface name is required\n{}",
            handler.usage(PROGRAM)
        ));
    }

    let captures = handler.captures(&args.interface);
    let report = Report {
        interface: handler.value(&args.interface).clone(),
        interface_type: captures.and_then(|c| c.get("TYPE")).map(String::from),
        interface_number: captures.and_then(|c| c.get("NUMBER")).map(String::from),
        mtu: *handler.value(&args.mtu),
        mode: *handler.value(&args.mode),
        weight: handler
            .was_seen(&args.weight)
            .then(|| *handler.value(&args.weight)),
        verbosity: *handler.value(&args.verbose),
        quiet: *handler.value(&args.quiet),
        leftover,
    };
    debug!(interface = %report.interface, mtu = report.mtu, "Resolved interface settings");

    let format = *handler.value(&args.format);
    if *handler.value(&args.dry_run) {
        if !report.quiet {
            eprintln!("dry run: {format} report for {} not written", report.interface);
        }
        return Ok(());
    }

    let path = handler.value(&args.output);
    let mut out = OpenMode::Write
        .open(path)
        .map_err(|err| format!("Failed to open '{path}' for writing: {err}"))?;
    write_report(&mut out, &report, format)
        .and_then(|()| out.flush())
        .map_err(|err| format!("Failed to write report: {err}"))
}

fn write_report(
    out: &mut impl Write,
    report: &Report,
    format: ReportFormat,
) -> std::io::Result<()> {
    match format {
        ReportFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, report)?;
            writeln!(out)
        }
        ReportFormat::Text => {
            writeln!(out, "interface: {}", report.interface)?;
            if let (Some(kind), Some(number)) = (&report.interface_type, &report.interface_number) {
                writeln!(out, "  type: {kind}")?;
                writeln!(out, "  number: {number}")?;
            }
            writeln!(out, "mtu: {}", report.mtu)?;
            writeln!(out, "mode: {}", report.mode)?;
            if let Some(weight) = report.weight {
                writeln!(out, "weight: {weight}")?;
            }
            if report.verbosity > 0 {
                writeln!(out, "verbosity: {}", report.verbosity)?;
                for token in &report.leftover {
                    writeln!(out, "leftover: {token}")?;
                }
            }
            Ok(())
        }
    }
}
