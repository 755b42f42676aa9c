use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};

mod attractor;
mod color;
mod config;
mod error;
mod io;
mod render;

use attractor::{generate, presets, search, MapFamily, MapParams, Point, Trajectory};
use color::Style;
use config::{load_config, RunConfig};
use io::csv::{parse_pair, write_points, PointWriter};
use io::device::{send_start, DeviceStream, DEFAULT_MAX_POINTS};
use io::png::save_png;
use render::render_scatter;

/// Intervalle (en points) des messages de progression de l'acquisition.
const PROGRESS_EVERY: usize = 10_000;

/// Générateur d'attracteurs étranges 2D.
///
/// Exemples :
///   attractall-cli render --preset clifford-spiral --output spiral.png
///   attractall-cli search --family sine-cosine --seed 42 --output found.png
#[derive(Parser, Debug)]
#[command(
    name = "attractall-cli",
    about = "Générateur d'attracteurs étranges (Clifford, De Jong, Svensson, Simon...) en ligne de commande",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Itère une carte (preset ou coefficients explicites) et dessine la trajectoire
    Render(RenderArgs),
    /// Cherche aléatoirement des coefficients produisant un attracteur intéressant
    Search(SearchArgs),
    /// Dessine un fichier CSV de coordonnées
    Plot(PlotArgs),
    /// Acquiert des points depuis un périphérique série (ou l'entrée standard) vers un CSV
    Ingest(IngestArgs),
    /// Liste les presets disponibles
    Presets,
}

/// Options de sortie communes.
#[derive(Args, Debug)]
struct OutputArgs {
    /// Fichier de configuration TOML
    #[arg(long, value_name = "FICHIER")]
    config: Option<PathBuf>,

    /// Style de rendu (purple-dream, sunset, ocean, fire, forest, monochrome, ember, ...)
    #[arg(long)]
    style: Option<Style>,

    /// Largeur de l'image en pixels
    #[arg(long)]
    width: Option<u32>,

    /// Hauteur de l'image en pixels
    #[arg(long)]
    height: Option<u32>,

    /// Fichier de sortie PNG
    #[arg(long, value_name = "FICHIER")]
    output: Option<PathBuf>,

    /// Export CSV des points rendus
    #[arg(long, value_name = "FICHIER")]
    csv: Option<PathBuf>,

    /// Décimales du CSV
    #[arg(long)]
    precision: Option<usize>,

    /// N'exporte qu'un point sur N dans le CSV
    #[arg(long)]
    csv_stride: Option<usize>,
}

impl OutputArgs {
    fn load(&self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)
                .with_context(|| format!("lecture de la configuration {}", path.display()))?,
            None => RunConfig::default(),
        };
        self.apply(&mut config);
        Ok(config)
    }

    fn apply(&self, config: &mut RunConfig) {
        if let Some(style) = self.style {
            config.output.style = Some(style);
        }
        if let Some(width) = self.width {
            config.render.width = width;
        }
        if let Some(height) = self.height {
            config.render.height = height;
        }
        if let Some(output) = &self.output {
            config.output.png = Some(output.clone());
        }
        if let Some(csv) = &self.csv {
            config.output.csv = Some(csv.clone());
        }
        if let Some(precision) = self.precision {
            config.output.precision = precision;
        }
        if let Some(stride) = self.csv_stride {
            config.output.csv_stride = stride.max(1);
        }
    }
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Preset nommé (voir `presets`)
    #[arg(long)]
    preset: Option<String>,

    /// Famille de carte (clifford, dejong, svensson, simon, sine-cosine, quadratic)
    #[arg(long)]
    family: Option<MapFamily>,

    /// Coefficients séparés par des virgules, ex. -1.4,1.6,1.0,0.7
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    coefficients: Option<Vec<f64>>,

    /// Point initial "x,y"
    #[arg(long, value_parser = parse_start, allow_hyphen_values = true)]
    start: Option<Point>,

    /// Nombre de points à calculer
    #[arg(long)]
    points: Option<usize>,

    /// Points initiaux exclus du rendu
    #[arg(long)]
    transient: Option<usize>,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// Famille de carte à explorer
    #[arg(long)]
    family: Option<MapFamily>,

    /// Nombre maximal de tentatives
    #[arg(long)]
    attempts: Option<usize>,

    /// Graine du générateur aléatoire (reproductibilité)
    #[arg(long)]
    seed: Option<u64>,

    /// Évalue les tentatives en parallèle
    #[arg(long)]
    parallel: bool,

    /// Nombre minimal de points rendus
    #[arg(long)]
    min_points: Option<usize>,

    /// Étendue minimale (exclusive) en x et en y
    #[arg(long)]
    span_min: Option<f64>,

    /// Étendue maximale (exclusive) en x et en y
    #[arg(long)]
    span_max: Option<f64>,

    /// Accepte les trajectoires tronquées par divergence ou échappement
    #[arg(long)]
    allow_truncated: bool,

    /// Point initial "x,y" de chaque tentative
    #[arg(long, value_parser = parse_start, allow_hyphen_values = true)]
    start: Option<Point>,

    /// Nombre de points calculés par tentative
    #[arg(long)]
    points: Option<usize>,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug)]
struct PlotArgs {
    /// Fichier CSV (en-tête x,y)
    #[arg(value_name = "CSV")]
    input: PathBuf,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug)]
struct IngestArgs {
    /// Chemin du périphérique, ou "-" pour l'entrée standard
    #[arg(value_name = "PERIPHERIQUE")]
    device: String,

    /// Fichier CSV produit
    #[arg(long, value_name = "FICHIER")]
    output: PathBuf,

    /// Nombre maximal de points acquis
    #[arg(long, default_value_t = DEFAULT_MAX_POINTS)]
    max_points: usize,

    /// Décimales du CSV
    #[arg(long, default_value_t = io::csv::DEFAULT_PRECISION)]
    precision: usize,
}

fn parse_start(value: &str) -> std::result::Result<Point, String> {
    parse_pair(value).ok_or_else(|| format!("point invalide '{value}', attendu \"x,y\""))
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Render(args) => run_render(args),
        Command::Search(args) => run_search(args),
        Command::Plot(args) => run_plot(args),
        Command::Ingest(args) => run_ingest(args),
        Command::Presets => {
            print_presets();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Erreur: {e:#}");
        std::process::exit(1);
    }
}

impl RenderArgs {
    fn apply(&self, config: &mut RunConfig) {
        if let Some(family) = self.family {
            config.map.family = family;
            // Une famille explicite sans preset désigne ses propres coefficients
            if self.preset.is_none() {
                config.map.preset = None;
            }
        }
        if let Some(preset) = &self.preset {
            config.map.preset = Some(preset.clone());
        }
        if let Some(coefficients) = &self.coefficients {
            config.map.coefficients = Some(coefficients.clone());
        }
        if let Some(start) = self.start {
            config.map.start = Some(start);
        }
        if let Some(points) = self.points {
            config.generator.points = points;
        }
        if let Some(transient) = self.transient {
            config.generator.transient = transient;
        }
    }
}

impl SearchArgs {
    /// La recherche utilise `[search.generator]`, pas `[generator]`.
    fn apply(&self, config: &mut RunConfig) -> Result<()> {
        let search_config = &mut config.search;

        if let Some(family) = self.family {
            search_config.family = family;
            // Les plages du fichier visent une autre famille
            if search_config.ranges.as_ref().is_some_and(|r| r.len() != family.arity()) {
                search_config.ranges = None;
            }
        }
        if let Some(attempts) = self.attempts {
            search_config.attempts = attempts;
        }
        if self.seed.is_some() {
            search_config.seed = self.seed;
        }
        if self.parallel {
            search_config.parallel = true;
        }
        if let Some(min_points) = self.min_points {
            search_config.acceptance.min_points = min_points;
        }
        if self.span_min.is_some() || self.span_max.is_some() {
            let (lo, hi) = search_config.acceptance.span.unwrap_or((0.0, f64::INFINITY));
            let lo = self.span_min.unwrap_or(lo);
            let hi = self.span_max.unwrap_or(hi);
            if lo >= hi {
                bail!("étendue d'acceptation vide: ({lo}, {hi})");
            }
            search_config.acceptance.span = Some((lo, hi));
        }
        if self.allow_truncated {
            search_config.acceptance.require_completed = false;
        }
        if let Some(start) = self.start {
            search_config.start = start;
        }
        if let Some(points) = self.points {
            search_config.generator.points = points;
        }
        Ok(())
    }
}

fn run_render(args: RenderArgs) -> Result<()> {
    let mut config = args.output.load()?;
    args.apply(&mut config);

    let map = config.map.resolve().context("carte invalide")?;
    log::info!(
        "{} {} from ({}, {})",
        map.params.family().name(),
        map.params.label(),
        map.start.x,
        map.start.y
    );

    let trajectory = generate(&map.params, map.start, &config.generator);
    report(&trajectory);

    let style = config.output.style.or(map.style).unwrap_or_default();
    write_outputs(&config, &map.params, trajectory.rendered(), style)
}

fn run_search(args: SearchArgs) -> Result<()> {
    let mut config = args.output.load()?;
    args.apply(&mut config)?;

    let found = search(&config.search).context("recherche infructueuse")?;
    log::info!(
        "attempt {} accepted: {} {}",
        found.attempt + 1,
        found.params.family().name(),
        found.params.label()
    );
    report(&found.trajectory);

    let style = config.output.style.unwrap_or_default();
    write_outputs(&config, &found.params, found.trajectory.rendered(), style)
}

fn run_plot(args: PlotArgs) -> Result<()> {
    let config = args.output.load()?;
    let points = io::csv::read_points(&args.input)
        .with_context(|| format!("lecture de {}", args.input.display()))?;
    log::info!("{} points read from {}", points.len(), args.input.display());

    let style = config.output.style.unwrap_or_default();
    let png = config
        .output
        .png
        .clone()
        .unwrap_or_else(|| args.input.with_extension("png"));
    render_to_png(&points, style, &config, &png)
}

fn run_ingest(args: IngestArgs) -> Result<()> {
    if args.device == "-" {
        let stdin = std::io::stdin();
        return ingest(stdin.lock(), &args);
    }

    let path = Path::new(&args.device);
    // Lecture/écriture pour envoyer START; à défaut, lecture seule
    let device = match OpenOptions::new().read(true).write(true).open(path) {
        Ok(mut file) => {
            send_start(&mut file).with_context(|| format!("envoi de START à {}", path.display()))?;
            log::info!("START sent to {}", path.display());
            file
        }
        Err(e) => {
            log::warn!("{} not writable ({e}), reading only", path.display());
            File::open(path).with_context(|| format!("ouverture de {}", path.display()))?
        }
    };
    ingest(BufReader::new(device), &args)
}

fn ingest<R: BufRead>(reader: R, args: &IngestArgs) -> Result<()> {
    let mut writer = PointWriter::create(&args.output, args.precision)
        .with_context(|| format!("création de {}", args.output.display()))?;
    let mut stream = DeviceStream::new(reader).with_max_points(args.max_points);

    for point in stream.by_ref() {
        writer.write_point(point?)?;
        let rows = writer.rows();
        if rows % PROGRESS_EVERY == 0 {
            log::info!("{rows} points received");
            writer.flush()?;
        }
    }
    writer.finish()?;

    log::info!(
        "{} points saved to {} ({} lines skipped, end: {:?})",
        stream.received(),
        args.output.display(),
        stream.skipped(),
        stream.end()
    );
    Ok(())
}

fn print_presets() {
    println!("{:<20} {:<12} {:<14} COEFFICIENTS", "NOM", "FAMILLE", "STYLE");
    for preset in presets() {
        let coefficients = preset
            .coefficients
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(",");
        println!(
            "{:<20} {:<12} {:<14} {}",
            preset.name,
            preset.family.cli_name(),
            preset.style.cli_name(),
            coefficients
        );
    }
}

fn report(trajectory: &Trajectory) {
    let termination = trajectory.termination();
    if trajectory.is_empty() {
        log::warn!("no point generated: {termination}");
    } else if termination.is_completed() {
        log::info!("{} points generated", trajectory.len());
    } else {
        log::warn!("generation stopped after {} points: {termination}", trajectory.len());
    }
    if trajectory.repetitions() > 0 {
        log::debug!("{} repeated points", trajectory.repetitions());
    }
}

/// Nom de fichier dérivé des coefficients, ex. `clifford_a-1.400_b1.600_c1.000_d0.700.png`.
fn default_png_name(params: &MapParams) -> PathBuf {
    let coefficients = params.label().replace('=', "").replace([' ', ','], "_");
    PathBuf::from(format!("{}_{coefficients}.png", params.family().cli_name()))
}

fn write_outputs(config: &RunConfig, params: &MapParams, points: &[Point], style: Style) -> Result<()> {
    if let Some(csv) = &config.output.csv {
        write_points(csv, points, config.output.precision, config.output.csv_stride)
            .with_context(|| format!("écriture de {}", csv.display()))?;
    }
    let png = config
        .output
        .png
        .clone()
        .unwrap_or_else(|| default_png_name(params));
    render_to_png(points, style, config, &png)
}

fn render_to_png(points: &[Point], style: Style, config: &RunConfig, png: &Path) -> Result<()> {
    let canvas = render_scatter(points, style.descriptor(), &config.render).context("rendu impossible")?;
    save_png(&canvas, png).with_context(|| format!("écriture du PNG {}", png.display()))?;
    Ok(())
}
