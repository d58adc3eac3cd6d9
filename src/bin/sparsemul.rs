use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use sparsemul::{
    Config, DummyInsertion, Multiplier, ParameterSet,
    dataset::{self, exponent_lines, format_row, packed_lines},
    golden,
    hqc1::Hqc1Params,
    hqc3::Hqc3Params,
    hqc5::Hqc5Params,
    memory::BitWordMemory,
    sampling::{DENSE_DOMAIN, SPARSE_DOMAIN, VectorSampler, row_seed},
    total_bits,
};

#[derive(Parser)]
#[command(version, about = "Sparse x dense GF(2) multiplier model", long_about = None)]
struct Cli {
    /// Parameter set of the modelled accelerator
    #[arg(long, value_enum, default_value_t = Params::Hqc1, global = true)]
    params: Params,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Params {
    Hqc1,
    Hqc3,
    Hqc5,
}

/// Line width of a dense memory image
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum MemWidth {
    #[value(name = "32")]
    W32,
    #[value(name = "64")]
    W64,
    #[value(name = "128")]
    W128,
}

impl MemWidth {
    fn bits(self) -> usize {
        match self {
            MemWidth::W32 => 32,
            MemWidth::W64 => 64,
            MemWidth::W128 => 128,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Multiply every dataset row and verify it against the expected product
    Run(RunArgs),

    /// Write seeded dataset rows and their golden products
    Generate(GenerateArgs),
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Sparse exponent rows
    #[arg(value_name = "SPARSE_CSV")]
    sparse: PathBuf,

    /// Dense operand rows
    #[arg(value_name = "DENSE_CSV")]
    dense: PathBuf,

    /// Expected product rows
    #[arg(value_name = "EXPECTED_CSV")]
    expected: PathBuf,

    /// Dummy pair budget (defaults to the parameter set's)
    #[arg(long)]
    dummy_pairs: Option<usize>,

    /// Largest gap inside one packed word (defaults to the parameter set's)
    #[arg(long)]
    gap_threshold: Option<u32>,

    /// Print the full verification report of every row
    #[arg(short, long, action = clap::ArgAction::SetTrue)]
    verbose: bool,

    /// Write each row's accumulator as 32-bit binary words to DIR/acc_<row>.mem
    #[arg(long, value_name = "DIR")]
    dump_acc: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
struct GenerateArgs {
    /// Number of datasets
    #[arg(short, long, default_value_t = 10)]
    count: usize,

    /// Base seed
    #[arg(short, long, default_value_t = 0)]
    seed: u64,

    /// Sparse weight (defaults to the parameter set's)
    #[arg(short, long)]
    weight: Option<usize>,

    /// Output directory
    #[arg(short, long, value_name = "DIR", default_value = "data")]
    out: PathBuf,

    /// Also write memory images: the dense operand with this line width, the
    /// sparse exponents and the packed sparse words
    #[arg(long, value_name = "BITS", value_enum)]
    mem_width: Option<MemWidth>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match (cli.command, cli.params) {
        (Command::Run(args), Params::Hqc1) => run::<Hqc1Params>(&args),
        (Command::Run(args), Params::Hqc3) => run::<Hqc3Params>(&args),
        (Command::Run(args), Params::Hqc5) => run::<Hqc5Params>(&args),
        (Command::Generate(args), Params::Hqc1) => generate::<Hqc1Params>(&args),
        (Command::Generate(args), Params::Hqc3) => generate::<Hqc3Params>(&args),
        (Command::Generate(args), Params::Hqc5) => generate::<Hqc5Params>(&args),
    }
}

fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    Ok(BufReader::new(file))
}

fn write_lines(path: &Path, lines: &[String]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = BufWriter::new(file);
    for line in lines {
        writeln!(out, "{line}")?;
    }
    out.flush()?;
    Ok(())
}

fn dump_accumulator(dir: &Path, index: usize, acc: &BitWordMemory) -> Result<()> {
    write_lines(&dir.join(format!("acc_{index}.mem")), &acc.binary_words())
}

fn run<P: ParameterSet>(args: &RunArgs) -> Result<()> {
    let mut config = Config::for_params::<P>();
    if let Some(n) = args.dummy_pairs {
        config = config.with_dummy_pairs(n);
    }
    if let Some(t) = args.gap_threshold {
        config = config.with_gap_threshold(t);
    }
    let mut multiplier = Multiplier::<P>::new(config).context("invalid configuration")?;
    if let Some(dir) = &args.dump_acc {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    let rows = dataset::datasets(open(&args.sparse)?, open(&args.dense)?, open(&args.expected)?);
    let (mut passed, mut failed, mut skipped) = (0usize, 0usize, 0usize);
    for row in rows {
        let outcome = row.and_then(|dataset| multiplier.run_dataset(&dataset));
        match outcome {
            Ok(outcome) => {
                let v = &outcome.verification;
                let overruns = outcome.product.report.window_overruns();
                println!(
                    "row {:>4}: {} matches {:>5} missing {:>4} extra {:>4} error rate {:>6.2}% overruns {}",
                    outcome.index,
                    if v.ok { "PASS" } else { "FAIL" },
                    v.matches.len(),
                    v.missing.len(),
                    v.extra.len(),
                    v.error_rate,
                    overruns,
                );
                if args.verbose {
                    println!("{v}\n");
                }
                if let Some(dir) = &args.dump_acc {
                    dump_accumulator(dir, outcome.index, &outcome.product.accumulator)?;
                }
                if v.ok {
                    passed += 1;
                } else {
                    failed += 1;
                }
            }
            Err(e) if e.is_dataset_local() => {
                warn!(error = %e, "skipping dataset");
                skipped += 1;
            }
            Err(e) => return Err(e).context("reading datasets"),
        }
    }

    println!("passed {passed}, failed {failed}, skipped {skipped}");
    if failed > 0 {
        bail!("{failed} dataset(s) failed verification");
    }
    Ok(())
}

fn generate<P: ParameterSet>(args: &GenerateArgs) -> Result<()> {
    let n = total_bits::<P>();
    let weight = args.weight.unwrap_or(P::HQC_OMEGA as usize);
    if weight > n {
        bail!("weight {weight} exceeds ring size {n}");
    }
    fs::create_dir_all(&args.out).with_context(|| format!("creating {}", args.out.display()))?;

    let create = |name: &str| -> Result<BufWriter<File>> {
        let path = args.out.join(name);
        let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
        Ok(BufWriter::new(file))
    };
    let mut sparse_out = create("sparse.csv")?;
    let mut dense_out = create("dense.csv")?;
    let mut expected_out = create("expected.csv")?;
    let insertion = DummyInsertion::from(&Config::for_params::<P>());

    for index in 0..args.count {
        let seed = row_seed(args.seed, index);
        let dense = VectorSampler::new(&seed, DENSE_DOMAIN).dense(n);
        let sparse = VectorSampler::new(&seed, SPARSE_DOMAIN).sparse_support(P::HQC_N, weight);
        let expected = golden::cyclic_product(&dense, &sparse)?;

        writeln!(sparse_out, "{}", format_row(&sparse))?;
        writeln!(dense_out, "{}", format_row(&dense.positions()))?;
        writeln!(expected_out, "{}", format_row(&expected.positions()))?;

        if let Some(width) = args.mem_width {
            write_lines(&args.out.join(format!("dense_{index}.mem")), &dense.mem_lines(width.bits())?)?;
            write_lines(&args.out.join(format!("sparse_{index}.mem")), &exponent_lines(&sparse)?)?;
            match insertion.process(&sparse) {
                Ok(padded) => write_lines(
                    &args.out.join(format!("sparse_packed_{index}.mem")),
                    &packed_lines(&padded.words),
                )?,
                Err(e) => warn!(index, error = %e, "no packed sparse image"),
            }
        }
    }
    for out in [&mut sparse_out, &mut dense_out, &mut expected_out] {
        out.flush()?;
    }
    info!(count = args.count, weight, out = %args.out.display(), "datasets written");
    Ok(())
}
