mod classification;
mod colors;
mod error;
mod feature;
mod filter;
mod inspect;
mod layers;
mod loader;
mod mxd;
mod report;
mod resolve;
mod selection;
mod state;
mod style;
mod thematic;
mod util;

use chrono::Local;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use serde_json::Map;

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;

use colors::ColorScheme;
use error::MapError;
use feature::LayerConfig;
use filter::{CriterionSpec, FilterLogic};
use report::ReportOptions;
use state::AppState;

#[derive(Parser, Debug)]
struct Args {
    /// Directory holding the layer GeoJSON files (and optional layers.json)
    #[arg(long, env = "DAMAGEMAP_DATA_DIR")]
    data_dir: PathBuf,

    /// Directory holding `<layer>_style.json` sidecars; defaults to the data dir
    #[arg(long)]
    style_dir: Option<PathBuf>,

    #[arg(long, env = "DAMAGEMAP_OUTPUT_DIR", default_value = "output")]
    output_dir: PathBuf,

    /// Only load these layers (comma separated); they are shown regardless of default visibility
    #[arg(long, value_delimiter = ',')]
    layers: Vec<String>,

    /// Layer the style mode, id selection and inspection apply to
    #[arg(long, default_value = "neighborhood")]
    layer: String,

    /// Print inferred property types of --layer as JSON
    #[arg(long, default_value_t = false)]
    inspect: bool,

    /// Color by the fixed damage classification of this field
    #[arg(long, conflicts_with_all = ["thematic", "filter_property", "criterion"])]
    classify: Option<String>,

    /// Color by equal-interval or categorical bins of this property
    #[arg(long, conflicts_with_all = ["filter_property", "criterion"])]
    thematic: Option<String>,

    /// Color ramp for thematic mode
    #[arg(long, default_value = "green")]
    scheme: String,

    #[arg(long, default_value_t = thematic::DEFAULT_BIN_COUNT)]
    bins: usize,

    /// Dim features of --layer failing a filter on this property
    #[arg(long, conflicts_with = "criterion")]
    filter_property: Option<String>,

    #[arg(long, requires = "filter_property")]
    filter_min: Option<f64>,

    #[arg(long, requires = "filter_property")]
    filter_max: Option<f64>,

    /// Category or text to match for non-numeric properties
    #[arg(long, requires = "filter_property")]
    filter_value: Option<String>,

    /// Advanced filter criterion `layer:property:operator:value`, repeatable
    #[arg(long)]
    criterion: Vec<String>,

    /// How multiple criteria combine: and / or
    #[arg(long, default_value = "and")]
    filter_logic: String,

    /// Select features of --layer by id, repeatable
    #[arg(long)]
    select_id: Vec<String>,

    /// Toggle selection of the feature at this index of --layer, repeatable
    #[arg(long)]
    toggle_index: Vec<usize>,

    /// Select every feature of a visible layer with a property containing this text
    #[arg(long)]
    search: Option<String>,

    #[arg(long)]
    report_title: Option<String>,

    #[arg(long)]
    report_description: Option<String>,

    /// Add a map view section to the report
    #[arg(long, default_value_t = false)]
    include_map: bool,

    /// Write legends of every themed or classified layer to this path
    #[arg(long)]
    legend_output: Option<PathBuf>,

    #[arg(long, default_value = "info")]
    log_level: String,

    /// Number of layers to load in parallel
    #[arg(long, default_value_t = 4)]
    parallel_load: usize,
}

/// Layers to load. Requested layers are shown regardless of their default visibility.
fn requested_layers(state: &mut AppState, requested: &[String]) -> Vec<LayerConfig> {
    if requested.is_empty() {
        return state.registry().to_vec();
    }
    for id in requested {
        if let Err(e) = state.set_visible(id, true) {
            warn!("Skipping requested layer: {}", e);
        }
    }
    state
        .registry()
        .iter()
        .filter(|c| requested.contains(&c.id))
        .cloned()
        .collect()
}

/// Load every layer concurrently, bounded by `--parallel-load`. Failures are logged and skipped.
async fn load_layers(state: &mut AppState, configs: Vec<LayerConfig>, args: &Args) {
    let data_dir = Arc::new(args.data_dir.clone());
    let style_dir = Arc::new(args.style_dir.clone().unwrap_or_else(|| args.data_dir.clone()));

    let pb = Arc::new(ProgressBar::new(configs.len() as u64));
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );
    pb.set_message("Loading layers");

    info!("Loading {} layers with parallelism={}", configs.len(), args.parallel_load);
    let semaphore = Arc::new(Semaphore::new(args.parallel_load.max(1)));
    let mut tasks = Vec::new();

    for config in configs {
        if state.is_loaded(&config.id) {
            pb.inc(1);
            continue;
        }
        let data_dir = Arc::clone(&data_dir);
        let style_dir = Arc::clone(&style_dir);
        let pb = Arc::clone(&pb);
        let semaphore = Arc::clone(&semaphore);

        tasks.push(tokio::spawn(async move {
            // Permit bounds concurrent file reads
            let _permit = semaphore.acquire_owned().await.ok();
            let id = config.id.clone();
            let result = loader::load_layer(config, &data_dir, &style_dir).await;
            pb.inc(1);
            (id, result)
        }));
    }

    for task in tasks {
        match task.await {
            Ok((_, Ok(layer))) => {
                state.insert_layer(layer);
            }
            Ok((id, Err(e))) => warn!("Failed to load layer {}: {}", id, e),
            Err(e) => error!("Layer load task failed: {}", e),
        }
    }

    pb.finish_with_message("Done loading layers");
}

/// Put the requested style mode on `--layer`
fn apply_mode(state: &mut AppState, args: &Args) -> error::Result<()> {
    if let Some(field) = &args.classify {
        state.apply_classification(&args.layer, field)?;
    } else if let Some(property) = &args.thematic {
        let scheme = ColorScheme::from_name(&args.scheme);
        let theme = state.apply_thematic(&args.layer, property, scheme, args.bins)?;
        debug!("Theme bins: {:?}", theme.bins);
    } else if let Some(property) = &args.filter_property {
        state.apply_filter(
            &args.layer,
            property,
            args.filter_min,
            args.filter_max,
            args.filter_value.clone(),
        )?;
    } else if !args.criterion.is_empty() {
        let specs = args
            .criterion
            .iter()
            .map(|c| c.parse::<CriterionSpec>())
            .collect::<error::Result<Vec<_>>>()?;
        let logic: FilterLogic = args.filter_logic.parse()?;
        let layers = state.apply_advanced_filter(&specs, logic)?;
        info!("Advanced filter applied to {}", layers.join(", "));
    }
    Ok(())
}

fn apply_selection(state: &mut AppState, args: &Args) -> error::Result<()> {
    if let Some(term) = &args.search {
        let found = state.quick_search(term);
        if found == 0 {
            warn!("No features match '{}'", term);
        }
    }
    for id in &args.select_id {
        state.select_by_id(&args.layer, id)?;
    }
    for index in &args.toggle_index {
        let selected = state.toggle_selection(&args.layer, *index)?;
        debug!("Feature {} of {} selected: {}", index, args.layer, selected);
    }
    Ok(())
}

fn print_inspection(state: &AppState, layer_id: &str) -> error::Result<()> {
    let mut properties = Map::new();
    for property in state.property_names(layer_id)? {
        let info = state.infer_type(layer_id, &property)?;
        properties.insert(property, serde_json::to_value(info)?);
    }
    println!("{}", serde_json::to_string_pretty(&properties)?);
    Ok(())
}

async fn write_outputs(state: &AppState, args: &Args) -> error::Result<()> {
    tokio::fs::create_dir_all(&args.output_dir).await?;

    let ids: Vec<String> = state.loaded_layers().map(|l| l.id().to_string()).collect();
    for id in ids {
        let collection = state.styled_collection(&id)?;
        let path = args.output_dir.join(format!("{}.styled.geojson", id));
        tokio::fs::write(&path, serde_json::to_vec_pretty(&collection)?).await?;
        info!("Wrote {} ({} mode) to {:?}", id, state.mode(&id).name(), path);
    }

    if let Some(legend_path) = &args.legend_output {
        let json = style::generate_legend_json(&state.legends());
        tokio::fs::write(legend_path, json).await?;
        info!("Wrote legends to {:?}", legend_path);
    }

    if !state.selection().is_empty() {
        let options = ReportOptions::new(
            args.report_title.as_deref(),
            args.report_description.as_deref(),
            args.include_map,
        );
        let html = state.build_report(&options, Local::now().date_naive())?;
        let path = args.output_dir.join("report.html");
        tokio::fs::write(&path, html).await?;
        info!("Wrote report of {} features to {:?}", state.selection().len(), path);
    }

    Ok(())
}

async fn run(args: Args) -> error::Result<()> {
    info!("Data directory: {:?}", args.data_dir);

    let mut state = AppState::new(loader::discover_layers(&args.data_dir).await);
    let configs = requested_layers(&mut state, &args.layers);

    load_layers(&mut state, configs, &args).await;
    if state.loaded_layers().next().is_none() {
        return Err(MapError::LayerNotLoaded("no layer could be loaded".to_string()));
    }

    if args.inspect {
        print_inspection(&state, &args.layer)?;
    }

    apply_mode(&mut state, &args)?;
    apply_selection(&mut state, &args)?;
    write_outputs(&state, &args).await
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
        .init();

    if let Err(e) = run(args).await {
        error!("{}", e);
        std::process::exit(1);
    }
}
