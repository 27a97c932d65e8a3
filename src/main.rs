use anyhow::{bail, Context, Result};
use clap::Parser;
use procmem::config::{load_config, validate_config, Config, ConfigLoader, CONFIG_ENV_VAR};
use procmem::memory::{ProcessMemory, ScanStep};
use procmem::{process, Pattern, ProcessId, SystemApi};
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "procmem", version)]
#[command(about = "Locate a process and a module in it, optionally scanning for a byte pattern")]
struct Args {
    /// Exact title of a top-level window owned by the target
    #[arg(short, long, conflicts_with = "process", required_unless_present = "process")]
    window: Option<String>,

    /// Substring of the target's executable file name
    #[arg(short, long)]
    process: Option<String>,

    /// Module to resolve; defaults to the executable matched by --process
    #[arg(short, long)]
    module: Option<String>,

    /// Byte pattern to find in the module, e.g. "48 8B 05 ?? ?? ?? ??"
    #[arg(long)]
    pattern: Option<Pattern>,

    /// Configuration file
    #[arg(short, long, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,
}

/// Process picked by --window or --process
#[cfg_attr(not(windows), allow(dead_code))]
struct Target {
    pid: ProcessId,
    /// Executable file name, known when matched by --process
    exe_file: Option<String>,
}

#[cfg_attr(not(windows), allow(dead_code))]
impl Target {
    fn module_name<'a>(&'a self, args: &'a Args) -> Option<&'a str> {
        args.module.as_deref().or(self.exe_file.as_deref())
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ConfigLoader::new(path)
            .load()
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => load_config()?,
    };
    validate_config(&config)?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.logging.with_target)
        .init();

    debug!(?config, "configuration loaded");

    #[cfg(windows)]
    return run(procmem::windows::NativeApi, &args, &config);

    #[cfg(not(windows))]
    bail!("procmem can only inspect processes on Windows");
}

#[cfg_attr(not(windows), allow(dead_code))]
fn run<A: SystemApi + Clone>(api: A, args: &Args, config: &Config) -> Result<()> {
    let target = locate(&api, args)?;
    let pid = target.pid;
    println!("pid: {}", pid);

    let Some(module_name) = target.module_name(args) else {
        if args.pattern.is_some() {
            bail!("--pattern needs --module or --process");
        }
        return Ok(());
    };
    let module = process::resolve_module_info(&api, module_name, pid)?
        .with_context(|| format!("module {} is not loaded in process {}", module_name, pid))?;
    println!(
        "{}: base {} size 0x{:X}",
        module_name, module.base_address, module.size
    );

    let Some(pattern) = &args.pattern else {
        return Ok(());
    };
    let length = module.size.min(config.scanner.max_scan_length);
    if length < module.size {
        info!(length, size = module.size, "scan truncated to max_scan_length");
    }

    let mem = ProcessMemory::attach(api, pid)?;
    let mut scan = mem.scan(module.base_address, length, pattern.clone());
    let found = loop {
        match scan.step(config.scanner.step_budget)? {
            ScanStep::Pending => debug!(remaining = scan.remaining(), "scanning"),
            ScanStep::Found(address) => break Some(address),
            ScanStep::NotFound => break None,
        }
    };

    match found {
        Some(address) => {
            let offset = address.distance_from(module.base_address).unwrap_or_default();
            println!("{}: {} ({}+0x{:X})", pattern, address, module_name, offset);
        }
        None => println!("{}: not found", pattern),
    }
    Ok(())
}

#[cfg_attr(not(windows), allow(dead_code))]
fn locate<A: SystemApi>(api: &A, args: &Args) -> Result<Target> {
    if let Some(title) = &args.window {
        let pid = process::find_pid_by_window(api, title)
            .with_context(|| format!("no window titled {:?}", title))?;
        return Ok(Target { pid, exe_file: None });
    }
    match &args.process {
        Some(name) => {
            let entry = process::find_process_by_name(api, name)?
                .with_context(|| format!("no running process matches {:?}", name))?;
            Ok(Target {
                pid: entry.pid,
                exe_file: Some(entry.exe_file),
            })
        }
        None => bail!("either --window or --process is required"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use procmem::{Address, Protection, SimulatedSystem};

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("procmem").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_window_and_process_conflict() {
        assert!(Args::try_parse_from(["procmem", "-w", "A", "-p", "b.exe"]).is_err());
        assert!(Args::try_parse_from(["procmem"]).is_err());
    }

    #[test]
    fn test_module_defaults_to_matched_executable() {
        let sim = SimulatedSystem::new();
        sim.add_process(5, "game.exe");
        sim.add_window("Game", 5);

        let args = parse(&["-p", "game"]);
        let target = locate(&sim, &args).unwrap();
        assert_eq!(target.pid, 5);
        assert_eq!(target.module_name(&args), Some("game.exe"));

        let args = parse(&["-p", "game", "-m", "engine.dll"]);
        assert_eq!(locate(&sim, &args).unwrap().module_name(&args), Some("engine.dll"));

        let args = parse(&["-w", "Game"]);
        assert_eq!(locate(&sim, &args).unwrap().module_name(&args), None);
    }

    #[test]
    fn test_run_with_process_substring_only() {
        let sim = SimulatedSystem::new();
        sim.add_process(5, "notepad.exe");
        sim.add_module(5, "notepad.exe", Address::new(0x1000), 0x100);
        sim.map_region(5, Address::new(0x1000), &[0xC3; 0x100], Protection::execute_read());

        run(&sim, &parse(&["-p", "notepad"]), &Config::default()).unwrap();
        run(&sim, &parse(&["-p", "notepad", "--pattern", "C3 ??"]), &Config::default()).unwrap();
        assert_eq!(sim.open_resources(), 0);
    }

    #[test]
    fn test_run_against_simulated_system() {
        let sim = SimulatedSystem::new();
        sim.add_process(5, "game.exe");
        sim.add_window("Game", 5);
        sim.add_module(5, "game.exe", Address::new(0x1000), 0x100);
        let mut image = vec![0u8; 0x100];
        image[0x80..0x83].copy_from_slice(&[0xE8, 0x12, 0x34]);
        sim.map_region(5, Address::new(0x1000), &image, Protection::execute_read());

        let args = parse(&["-w", "Game", "-m", "game.exe", "--pattern", "E8 ?? 34"]);
        run(&sim, &args, &Config::default()).unwrap();
        assert_eq!(sim.open_resources(), 0);

        assert!(run(&sim, &parse(&["-w", "Nope"]), &Config::default()).is_err());
        assert!(run(&sim, &parse(&["-w", "Game", "--pattern", "E8"]), &Config::default()).is_err());
        assert!(run(&sim, &parse(&["-p", "game.exe", "-m", "other.dll"]), &Config::default()).is_err());
    }
}
