use clap::{Parser, Subcommand, ValueEnum};
use hc_controls::ControllerKind;
use hc_sim::{EncryptedLoop, LoopConfig, LoopRecord, LoopSample, SimResult};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "hc-cli")]
#[command(about = "Encrypted P/PI/PID control loops over labeled homomorphic encryption", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate session keys and print the evaluation parameters
    Keygen {
        #[command(flatten)]
        setup: SetupArgs,
    },
    /// Run a closed loop through an encrypted controller
    Run {
        #[command(flatten)]
        setup: SetupArgs,
        /// Controller kind (p, pi, pid)
        #[arg(long)]
        kind: Option<ControllerKind>,
        /// Number of control cycles
        #[arg(long)]
        steps: Option<usize>,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
        /// Print every n-th sample in table output
        #[arg(long, default_value_t = 1)]
        every: usize,
    },
}

#[derive(clap::Args)]
struct SetupArgs {
    /// Path to a loop configuration YAML file (defaults when omitted)
    config_path: Option<PathBuf>,
    /// Bit size of the public modulus
    #[arg(long)]
    key_bits: Option<u64>,
    /// Bit size of the plaintext space
    #[arg(long)]
    msg_bits: Option<u32>,
    /// Seed for keys, labels and rerandomization
    #[arg(long)]
    seed: Option<u64>,
}

impl SetupArgs {
    fn load(&self) -> SimResult<LoopConfig> {
        let mut config = match &self.config_path {
            Some(path) => LoopConfig::load(path)?,
            None => LoopConfig::default(),
        };
        if let Some(bits) = self.key_bits {
            config.crypto.key_bits = bits;
        }
        if let Some(bits) = self.msg_bits {
            config.crypto.msg_bits = bits;
        }
        if self.seed.is_some() {
            config.crypto.seed = self.seed;
        }
        Ok(config)
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> SimResult<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Keygen { setup } => cmd_keygen(&setup),
        Commands::Run {
            setup,
            kind,
            steps,
            format,
            every,
        } => cmd_run(&setup, kind, steps, format, every.max(1)),
    }
}

fn cmd_keygen(setup: &SetupArgs) -> SimResult<()> {
    let config = setup.load()?;
    let started = Instant::now();
    let sim = EncryptedLoop::new(config)?;
    let public = &sim.client().keys().public;
    let params = sim.law().params();

    println!("✓ Keys generated in {:.3}s", started.elapsed().as_secs_f64());
    println!("  N: {} bits", public.n().bits());
    println!("  y: {}", public.y());
    println!("  Plaintext space: 2^{}", params.msg_bits());
    println!("  Controller: {}", sim.law().kind());
    let scaling = &sim.config().scaling;
    println!(
        "  Scaling: gain={} error={} time={} output={}",
        scaling.gain,
        scaling.error,
        scaling.time,
        scaling.output()
    );
    Ok(())
}

fn cmd_run(
    setup: &SetupArgs,
    kind: Option<ControllerKind>,
    steps: Option<usize>,
    format: OutputFormat,
    every: usize,
) -> SimResult<()> {
    let mut config = setup.load()?;
    if let Some(kind) = kind {
        config.kind = kind;
    }
    if let Some(steps) = steps {
        config.steps = steps;
    }
    let total = config.steps;

    eprintln!(
        "Running encrypted {} loop: {} steps, {}-bit keys",
        config.kind, total, config.crypto.key_bits
    );
    let started = Instant::now();
    let mut sim = EncryptedLoop::new(config)?;

    let mut last_emit = Instant::now();
    let record = sim.run_with_progress(Some(&mut |sample: &LoopSample| {
        if last_emit.elapsed().as_millis() >= 100 || sample.step + 1 == total {
            render_progress(sample, total);
            last_emit = Instant::now();
        }
    }))?;
    clear_progress_line();

    match format {
        OutputFormat::Table => print_table(&record, every),
        OutputFormat::Json => {
            let mut out = io::stdout().lock();
            serde_json::to_writer_pretty(&mut out, &record).map_err(io::Error::from)?;
            writeln!(out)?;
        }
    }

    eprintln!(
        "✓ {} steps in {:.3}s, final state {:.4}",
        record.len(),
        started.elapsed().as_secs_f64(),
        record.final_state().unwrap_or(f64::NAN)
    );
    if !record.all_exact() {
        let mismatches = record.samples.iter().filter(|s| !s.exact).count();
        eprintln!("✗ {mismatches} outputs differ from the plaintext evaluation");
    }
    Ok(())
}

fn print_table(record: &LoopRecord, every: usize) {
    println!(
        "{:>6} {:>8} {:>9} {:>12} {:>12} {:>14} {:>6}",
        "step", "time", "setpoint", "state", "error", "u", "exact"
    );
    for sample in record.samples.iter().step_by(every) {
        println!(
            "{:>6} {:>8.2} {:>9.2} {:>12.5} {:>12.5} {:>14.5} {:>6}",
            sample.step,
            sample.time,
            sample.setpoint,
            sample.state,
            sample.error,
            sample.output,
            if sample.exact { "yes" } else { "NO" }
        );
    }
}

fn clear_progress_line() {
    eprint!("\r{}\r", " ".repeat(100));
    let _ = io::stderr().flush();
}

fn render_progress(sample: &LoopSample, total: usize) {
    let width = 28usize;
    let fraction = (sample.step + 1) as f64 / total.max(1) as f64;
    let filled = ((fraction * width as f64).round() as usize).min(width);
    eprint!(
        "\r[{}{}] {:>6.2}%  step={}  x={:.4}  u={:.4}",
        "#".repeat(filled),
        "-".repeat(width.saturating_sub(filled)),
        fraction * 100.0,
        sample.step,
        sample.next_state,
        sample.output
    );
    let _ = io::stderr().flush();
}
