//! Scenario tool
//!
//! Validates, renders and converts hospital scenario documents, and prepares
//! run folders for the simulation engine.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hospital_scenario::grid::{self, PlanHeader};
use hospital_scenario::schema::{hospital, NodeType, ParameterSchema};
use hospital_scenario::{
    PreparedRun, Scenario, ScenarioError, ScenarioResult, SimulationProperties, Tile,
};

const USAGE: &str = "\
scenario-tool - hospital scenario utilities

USAGE:
    scenario-tool validate <SCENARIO.json>
    scenario-tool render <SCENARIO.json>
    scenario-tool plan <SCENARIO.json> <OUT.plan>
    scenario-tool inspect <FILE.plan>
    scenario-tool schema
    scenario-tool prepare <SCENARIO.json> --out <DIR> [OPTIONS]

PREPARE OPTIONS:
        --out <DIR>                Root folder for run folders
        --layout <XxY>             Process layout [default: 1x1]
        --seed <SEED>              Random seed [default: 1574454]
        --tick <SECONDS>           Seconds per tick [default: 60]
        --chair-rank <RANK>        Chair manager rank [default: 0]
        --reception-rank <RANK>    Reception manager rank [default: 0]
        --triage-rank <RANK>       Triage manager rank [default: 0]
        --doctors-rank <RANK>      Doctors manager rank [default: 0]
        --debug-performance        Record performance metrics
        --debug-rank <RANK>        Rank that waits for a debugger to attach
        --mpiexec <PATH>           MPI launcher [default: mpiexec]
        --binary <PATH>            Simulation binary [default: hospital-sim]
    -h, --help                     Print help information

Logging is controlled with RUST_LOG [default: info].";

enum Command {
    Validate(PathBuf),
    Render(PathBuf),
    Plan(PathBuf, PathBuf),
    Inspect(PathBuf),
    Schema,
    Prepare(PrepareConfig),
    Help,
}

struct PrepareConfig {
    scenario: PathBuf,
    out: PathBuf,
    props: SimulationProperties,
    debug_rank: Option<i64>,
    mpiexec: PathBuf,
    binary: PathBuf,
}

fn value<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str, String> {
    args.get(i + 1)
        .map(String::as_str)
        .ok_or_else(|| format!("{flag} requires a value"))
}

fn number<T: std::str::FromStr>(args: &[String], i: usize, flag: &str) -> Result<T, String> {
    let raw = value(args, i, flag)?;
    raw.parse()
        .map_err(|_| format!("invalid value for {flag}: {raw}"))
}

fn parse_layout(raw: &str) -> Result<(i64, i64), String> {
    let (x, y) = raw
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("invalid layout {raw}, expected XxY"))?;
    let parse = |s: &str| {
        s.trim()
            .parse::<i64>()
            .map_err(|_| format!("invalid layout {raw}, expected XxY"))
    };
    Ok((parse(x)?, parse(y)?))
}

fn parse_prepare(args: &[String]) -> Result<PrepareConfig, String> {
    let mut scenario = None;
    let mut out = None;
    let mut props = SimulationProperties::default();
    let mut debug_rank = None;
    let mut mpiexec = PathBuf::from("mpiexec");
    let mut binary = PathBuf::from("hospital-sim");

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--out" => {
                out = Some(PathBuf::from(value(args, i, "--out")?));
                i += 2;
            }
            "--layout" => {
                (props.x, props.y) = parse_layout(value(args, i, "--layout")?)?;
                i += 2;
            }
            "--seed" => {
                props.seed = number(args, i, "--seed")?;
                i += 2;
            }
            "--tick" => {
                props.seconds_per_tick = number(args, i, "--tick")?;
                i += 2;
            }
            "--chair-rank" => {
                props.chair_manager_rank = number(args, i, "--chair-rank")?;
                i += 2;
            }
            "--reception-rank" => {
                props.reception_manager_rank = number(args, i, "--reception-rank")?;
                i += 2;
            }
            "--triage-rank" => {
                props.triage_manager_rank = number(args, i, "--triage-rank")?;
                i += 2;
            }
            "--doctors-rank" => {
                props.doctors_manager_rank = number(args, i, "--doctors-rank")?;
                i += 2;
            }
            "--debug-performance" => {
                props.debug_performance = true;
                i += 1;
            }
            "--debug-rank" => {
                debug_rank = Some(number(args, i, "--debug-rank")?);
                i += 2;
            }
            "--mpiexec" => {
                mpiexec = PathBuf::from(value(args, i, "--mpiexec")?);
                i += 2;
            }
            "--binary" => {
                binary = PathBuf::from(value(args, i, "--binary")?);
                i += 2;
            }
            arg if arg.starts_with('-') => return Err(format!("unknown argument: {arg}")),
            arg => {
                if scenario.is_some() {
                    return Err(format!("unexpected argument: {arg}"));
                }
                scenario = Some(PathBuf::from(arg));
                i += 1;
            }
        }
    }

    Ok(PrepareConfig {
        scenario: scenario.ok_or("prepare requires a scenario document")?,
        out: out.ok_or("prepare requires --out <DIR>")?,
        props,
        debug_rank,
        mpiexec,
        binary,
    })
}

fn parse_args(args: &[String]) -> Result<Command, String> {
    if args.iter().any(|a| a == "-h" || a == "--help") {
        return Ok(Command::Help);
    }
    let Some((command, rest)) = args.split_first() else {
        return Ok(Command::Help);
    };

    let paths: Vec<PathBuf> = rest.iter().map(PathBuf::from).collect();
    match (command.as_str(), paths.as_slice()) {
        ("validate", [path]) => Ok(Command::Validate(path.clone())),
        ("render", [path]) => Ok(Command::Render(path.clone())),
        ("plan", [input, output]) => Ok(Command::Plan(input.clone(), output.clone())),
        ("inspect", [path]) => Ok(Command::Inspect(path.clone())),
        ("schema", []) => Ok(Command::Schema),
        ("prepare", _) => parse_prepare(rest).map(Command::Prepare),
        ("validate" | "render" | "plan" | "inspect" | "schema", _) => {
            Err(format!("wrong number of arguments for {command}"))
        }
        (other, _) => Err(format!("unknown command: {other}")),
    }
}

fn load(path: &Path) -> ScenarioResult<Scenario> {
    let text = fs::read_to_string(path).map_err(|e| ScenarioError::io(path, e))?;
    Scenario::from_json_str(&text)
}

fn load_validated(path: &Path) -> ScenarioResult<Scenario> {
    let mut scenario = load(path)?;
    scenario.validate()?;
    Ok(scenario)
}

fn inspect(path: &Path) -> ScenarioResult<()> {
    let bytes = fs::read(path).map_err(|e| ScenarioError::io(path, e))?;
    let header = PlanHeader::from_bytes(&bytes)?;
    let plan = grid::decode(&bytes)?;

    println!(
        "version {}, {} columns x {} rows",
        header.version, header.columns, header.rows
    );
    let fixed = [
        Tile::Wall,
        Tile::Chair,
        Tile::Entry,
        Tile::Exit,
        Tile::Triage,
        Tile::Icu,
        Tile::Receptionist,
    ];
    for tile in fixed {
        let count = plan.count(tile);
        if count > 0 {
            println!("{:>14}: {count}", tile.name());
        }
    }
    let doctors = plan
        .cells()
        .iter()
        .filter(|t| matches!(t, Tile::Doctor(_)))
        .count();
    if doctors > 0 {
        println!("{:>14}: {doctors}", "doctor");
    }
    print!("{}", plan.render_ascii());
    Ok(())
}

/// One line per leaf parameter: path, kind, probability group and help.
fn describe_schema(schema: &ParameterSchema) -> String {
    let leaves = schema.leaves();
    let width = leaves.iter().map(|(path, _)| path.len()).max().unwrap_or(0);

    let mut out = String::new();
    for (path, parameter) in leaves {
        let kind = match parameter.node_type() {
            NodeType::Scalar(kind) => kind.name(),
            NodeType::Group(_) | NodeType::List(_) => continue,
        };
        let mut line = format!("{path:<width$}  {kind}");
        match parameter.probability_group() {
            Some(group) => line.push_str(&format!(", probability in {group}")),
            None if parameter.is_probability() => line.push_str(", probability"),
            None => {}
        }
        if let Some(help) = parameter.help_text() {
            line.push_str(&format!("  {help}"));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

fn prepare(config: &PrepareConfig) -> ScenarioResult<()> {
    let scenario = load_validated(&config.scenario)?;
    let run = PreparedRun::prepare(&config.out, &config.props, &scenario)?;
    let args = run.launcher_args(&config.mpiexec, &config.binary, config.debug_rank)?;

    println!("run {} prepared in {}", run.id(), run.folder().display());
    println!("{}", args.join(" "));
    Ok(())
}

fn execute(command: Command) -> ScenarioResult<()> {
    match command {
        Command::Help => println!("{USAGE}"),
        Command::Validate(path) => {
            let scenario = load_validated(&path)?;
            println!(
                "{}: valid {}x{} scenario, {} elements, specialties [{}]",
                path.display(),
                scenario.grid().width(),
                scenario.grid().height(),
                scenario.elements().len(),
                scenario.specialties().join(", ")
            );
        }
        Command::Render(path) => print!("{}", load(&path)?.render()),
        Command::Plan(input, output) => {
            let written = load(&input)?.save_plan(&output)?;
            println!("{}", written.display());
        }
        Command::Inspect(path) => inspect(&path)?,
        Command::Schema => print!("{}", describe_schema(&hospital::schema()?)),
        Command::Prepare(config) => prepare(&config)?,
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match parse_args(&args) {
        Ok(command) => command,
        Err(message) => {
            eprintln!("error: {message}");
            eprintln!("run with --help for usage");
            return ExitCode::from(2);
        }
    };

    match execute(command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
