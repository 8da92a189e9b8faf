//! serdestool: inspect and configure the GateMate SerDes over JTAG.
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use serdes_taps::cable::{self, Cable};
use serdes_taps::config::Frequency;
use serdes_taps::discovery::{self, Board};
use serdes_taps::protocol::SerdesJtag;
use serdes_taps::regfile::{Band, Classification};
use serdes_taps::session::DecodedField;
use serdes_taps::statemachine::JtagSM;
use serdes_taps::template;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[clap(rename_all = "UPPER")]
enum LevelFilter {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LevelFilter {
    fn into_tracing(self) -> tracing::level_filters::LevelFilter {
        match self {
            Self::Off => tracing::level_filters::LevelFilter::OFF,
            Self::Error => tracing::level_filters::LevelFilter::ERROR,
            Self::Warn => tracing::level_filters::LevelFilter::WARN,
            Self::Info => tracing::level_filters::LevelFilter::INFO,
            Self::Debug => tracing::level_filters::LevelFilter::DEBUG,
            Self::Trace => tracing::level_filters::LevelFilter::TRACE,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "serdestool",
    version,
    about = "GateMate FPGA SerDes toolkit",
    after_help = "example usage: serdestool -b evb --rdregrx --rdregpll"
)]
struct Cli {
    /// List available boards/programmers and exit
    #[arg(short = 'l', long = "list")]
    list: bool,

    /// Select board
    #[arg(short = 'b', value_enum, default_value_t = Board::Auto, env = "SERDESTOOL_BOARD")]
    board: Board,

    /// Device index in JTAG chain
    #[arg(long = "index-chain", default_value_t = 0, env = "SERDESTOOL_CHAIN_INDEX")]
    index_chain: usize,

    /// Frequency setting; append "k" for kilohertz or "M" for megahertz
    #[arg(long, default_value = "10M", value_name = "0 - 30M", env = "SERDESTOOL_FREQ")]
    freq: Frequency,

    /// Generate a Verilog or VHDL instance; the extension (.v, .sv, .vhd, .vhdl) picks the language
    #[arg(short = 'm', value_name = "FILE")]
    module: Option<PathBuf>,

    /// Load a bitstream through the CONFIGURE instruction
    #[arg(long, value_name = "FILE")]
    configure: Option<PathBuf>,

    /// Read rx regfile
    #[arg(long)]
    rdregrx: bool,

    /// Read rx data
    #[arg(long)]
    rdregrxdata: bool,

    /// Read tx regfile
    #[arg(long)]
    rdregtx: bool,

    /// Read pll regfile
    #[arg(long)]
    rdregpll: bool,

    /// Print register words instead of decoded fields
    #[arg(long)]
    raw: bool,

    /// Log level; RUST_LOG is used when not given
    #[arg(long, value_enum)]
    log_level: Option<LevelFilter>,
}

impl Cli {
    fn wants_hardware(&self) -> bool {
        let reads = self.rdregrx || self.rdregrxdata || self.rdregtx || self.rdregpll;
        reads || self.configure.is_some() || self.module.is_none()
    }
}

fn setup_logging(default: Option<LevelFilter>) {
    let filter = match default {
        Some(filter) => EnvFilter::builder()
            .with_default_directive(filter.into_tracing().into())
            .parse_lossy(""),
        None => EnvFilter::builder()
            .with_default_directive(tracing::level_filters::LevelFilter::WARN.into())
            .from_env_lossy(),
    };
    let stderr = tracing_subscriber::fmt::layer()
        .compact()
        .without_time()
        .with_writer(std::io::stderr)
        .with_filter(filter);

    tracing_subscriber::registry().with(stderr).init();
}

type Session = SerdesJtag<Box<dyn Cable>>;

fn print_field(d: &DecodedField) {
    let line = format!("{:24} {:4X}'h {:6}'d", d.field.name, d.value, d.value);
    match d.classification {
        Classification::Nominal => println!("{}", line.green()),
        Classification::Attention => println!("{}", line.yellow()),
        Classification::Alert => println!("{}", line.red()),
        Classification::Neutral => println!("{line}"),
    }
}

fn print_band(jtag: &mut Session, band: Band, raw: bool) -> anyhow::Result<()> {
    for word in jtag.scan_band(band) {
        let word = word.with_context(|| format!("reading {band:?} registers"))?;
        if raw {
            println!("{:02X}: 0x{:04X}", word.address, word.word);
        } else {
            word.decode().iter().for_each(print_field);
        }
    }
    Ok(())
}

fn print_rx_data(jtag: &mut Session, raw: bool) -> anyhow::Result<()> {
    if raw {
        return print_band(jtag, Band::RxData, true);
    }
    let rx = jtag.read_rx_data().context("reading rx data")?;
    println!("{:24} {:020X}'h", "RX_DATA[79:0]", rx.raw);
    println!("{:24} {:016X}'h", "RX_DATA[63:0]", rx.symbols);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.log_level);

    if cli.list {
        for adapter in discovery::list_adapters().context("enumerating USB devices")? {
            println!("{adapter}");
        }
        return Ok(());
    }

    if let Some(path) = &cli.module {
        let format = template::write_template(path)
            .with_context(|| format!("generating template {}", path.display()))?;
        println!("Generate {format:?} template: {}", path.display());
    }

    if !cli.wants_hardware() {
        return Ok(());
    }

    let identity = discovery::resolve(cli.board)?;
    let cable = cable::open(&identity, cli.freq).with_context(|| format!("opening {identity}"))?;
    let sm = JtagSM::new(cable).context("resetting the JTAG chain")?;
    let mut jtag = SerdesJtag::attach(sm, cli.index_chain)?;

    let n = jtag.chain_length();
    println!("Found {n} device{} in JTAG chain.", if n > 1 { "s" } else { "" });

    if let Some(path) = &cli.configure {
        let bitstream = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        jtag.load_configuration(&bitstream)
            .with_context(|| format!("configuring from {}", path.display()))?;
    }

    if cli.rdregrx {
        print_band(&mut jtag, Band::RxControl, cli.raw)?;
    }
    if cli.rdregrxdata {
        print_rx_data(&mut jtag, cli.raw)?;
    }
    if cli.rdregtx {
        print_band(&mut jtag, Band::Tx, cli.raw)?;
    }
    if cli.rdregpll {
        print_band(&mut jtag, Band::Pll, cli.raw)?;
    }
    Ok(())
}
