use std::{
    fs::File,
    io::{BufReader, BufWriter, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use folio::{
    Album, Correction, EmptySlot, EngineOpts, Intent, Outcome, ResourceCatalog, Session,
    SessionOpts, SpreadKey,
};

#[derive(Parser, Debug)]
#[command(name = "folio", version)]
struct Cli {
    /// Log engine decisions to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load an album and check every structural invariant.
    Validate(Inputs),
    /// List image slots with nothing bound, per spread.
    EmptySlots(Inputs),
    /// Apply one intent (or a JSON array of intents) and write the resulting album.
    Apply(ApplyArgs),
}

#[derive(Args, Debug)]
struct Inputs {
    /// Album JSON.
    #[arg(long)]
    album: PathBuf,

    /// Resource catalog JSON.
    #[arg(long)]
    catalog: PathBuf,
}

#[derive(Args, Debug)]
struct ApplyArgs {
    #[command(flatten)]
    inputs: Inputs,

    /// Intent JSON: a single intent object or an array of them.
    #[arg(long)]
    intent: PathBuf,

    /// Seed for random template/layout picks.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Output album path (stdout when omitted).
    #[arg(long, short)]
    out: Option<PathBuf>,
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum IntentFile {
    Many(Vec<Intent>),
    One(Intent),
}

#[derive(serde::Serialize)]
struct EmptyRow<'a> {
    spread: SpreadKey,
    slots: &'a [EmptySlot],
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Command::Validate(args) => cmd_validate(args),
        Command::EmptySlots(args) => cmd_empty_slots(args),
        Command::Apply(args) => cmd_apply(args),
    }
}

fn load(inputs: &Inputs) -> anyhow::Result<(ResourceCatalog, Album)> {
    let catalog = ResourceCatalog::from_path(&inputs.catalog)
        .with_context(|| format!("load catalog '{}'", inputs.catalog.display()))?;
    let (album, corrections) = Album::from_path(&inputs.album)
        .with_context(|| format!("load album '{}'", inputs.album.display()))?;
    report_corrections(&corrections);
    Ok((catalog, album))
}

fn report_corrections(corrections: &[Correction]) {
    for c in corrections {
        match serde_json::to_string(c) {
            Ok(json) => eprintln!("corrected: {json}"),
            Err(_) => eprintln!("corrected: {c:?}"),
        }
    }
}

fn cmd_validate(args: Inputs) -> anyhow::Result<()> {
    let (catalog, album) = load(&args)?;
    album
        .validate(&catalog)
        .with_context(|| format!("validate '{}'", args.album.display()))?;
    eprintln!(
        "ok: {} spreads, {} images",
        album.book.folders.len(),
        album.image_count()
    );
    Ok(())
}

fn cmd_empty_slots(args: Inputs) -> anyhow::Result<()> {
    let (catalog, album) = load(&args)?;
    let session = Session::open(&catalog, album, SessionOpts::default())?;
    let rows: Vec<EmptyRow<'_>> = session
        .empty_slots()
        .iter()
        .map(|(spread, slots)| EmptyRow { spread, slots })
        .collect();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, &rows).context("write empty slots")?;
    writeln!(out)?;
    Ok(())
}

fn cmd_apply(args: ApplyArgs) -> anyhow::Result<()> {
    let (catalog, album) = load(&args.inputs)?;
    let f = File::open(&args.intent)
        .with_context(|| format!("open intent '{}'", args.intent.display()))?;
    let file: IntentFile = serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("parse intent '{}'", args.intent.display()))?;
    let intents = match file {
        IntentFile::Many(v) => v,
        IntentFile::One(i) => vec![i],
    };

    let opts = SessionOpts {
        engine: EngineOpts {
            seed: args.seed,
            ..EngineOpts::default()
        },
        ..SessionOpts::default()
    };
    let mut session = Session::open(&catalog, album, opts)?;
    for (i, intent) in intents.iter().enumerate() {
        let edit = session
            .apply(intent)
            .with_context(|| format!("intent #{i}"))?;
        report_corrections(&edit.corrections);
        match &edit.outcome {
            Outcome::Applied => eprintln!("#{i}: applied"),
            Outcome::Unchanged => eprintln!("#{i}: unchanged"),
            Outcome::Missed(miss) => eprintln!("#{i}: missed: {miss}"),
        }
    }

    let album = session.into_album();
    match &args.out {
        Some(path) => write_album(&album, path)?,
        None => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            album.to_writer(&mut out)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

fn write_album(album: &Album, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    let f = File::create(path).with_context(|| format!("create '{}'", path.display()))?;
    let mut w = BufWriter::new(f);
    album.to_writer(&mut w)?;
    w.flush()?;
    eprintln!("wrote {}", path.display());
    Ok(())
}
