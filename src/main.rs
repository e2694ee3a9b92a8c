#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Args as ClapArgs, Parser, Subcommand};
use eframe::{egui, App, NativeOptions};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use script_breakdown::config::{self, Config, DEFAULT_CONFIG_FILE};
use script_breakdown::export::{csv, DirectoryExporter, ExportBlob, ExportSink};
use script_breakdown::persistence::{segment_and_persist, PersistMode, ScenePersister};
use script_breakdown::session::Session;
use script_breakdown::storage::{JsonFileStore, RecordStore};
use script_breakdown::types::storyboard::StoredRecord;

#[derive(Parser, Debug)]
#[command(name = "script-breakdown")]
#[command(about = "Break a script into scenes and export them as a CSV table", long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: String,

    /// Override what a segmentation persists
    #[arg(long, value_enum)]
    mode: Option<PersistMode>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a script to a CSV scene table without opening the window
    Convert {
        #[command(flatten)]
        input: InputArgs,

        /// Output file (defaults to <export_dir>/<export_filename>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the table to stdout instead of a file
        #[arg(long, conflicts_with = "output")]
        stdout: bool,

        /// Do not persist the scenes
        #[arg(long)]
        no_save: bool,
    },
    /// Store a script as a new storyboard
    Storyboard {
        #[command(flatten)]
        input: InputArgs,

        /// Storyboard title (defaults to the first scene)
        #[arg(long)]
        title: Option<String>,
    },
    /// List the stored records
    List,
}

#[derive(ClapArgs, Debug)]
struct InputArgs {
    /// Script text
    #[arg(short, long, conflicts_with = "file")]
    text: Option<String>,

    /// Script file, `-` for stdin
    #[arg(short, long)]
    file: Option<PathBuf>,
}

impl InputArgs {
    fn read(&self) -> anyhow::Result<String> {
        match (&self.text, &self.file) {
            (Some(text), _) => Ok(text.clone()),
            (None, Some(path)) if path.as_os_str() == "-" => {
                let mut buf = String::new();
                io::stdin().read_to_string(&mut buf).context("Failed to read stdin")?;
                Ok(buf)
            }
            (None, Some(path)) => fs::read_to_string(path)
                .with_context(|| format!("Failed to read file: {}", path.display())),
            (None, None) => bail!("Either --text or --file must be provided"),
        }
    }
}

struct ScriptBreakdownApp {
    session: Session,
    config: Config,
    config_error: Option<String>,
}

impl ScriptBreakdownApp {
    fn new(cc: &eframe::CreationContext<'_>, config: Config, config_error: Option<String>) -> Self {
        if let Some(font_path) = &config.font_path {
            install_font(&cc.egui_ctx, font_path);
        }

        let mut session = Session::new(&config);
        session.on_start();

        Self {
            session,
            config,
            config_error,
        }
    }
}

/// Appends a font file to both families so scripts outside the built-in
/// glyph set render.
fn install_font(ctx: &egui::Context, font_path: &Path) {
    match fs::read(font_path) {
        Ok(bytes) => {
            let name = "script_font".to_string();
            let mut fonts = egui::FontDefinitions::default();
            fonts
                .font_data
                .insert(name.clone(), egui::FontData::from_owned(bytes));
            for family in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
                fonts.families.entry(family).or_default().push(name.clone());
            }
            ctx.set_fonts(fonts);
            info!(path = %font_path.display(), "installed script font");
        }
        Err(e) => warn!("Failed to load font {}: {}", font_path.display(), e),
    }
}

impl App for ScriptBreakdownApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.session.on_tick(now);
        if let Some(wait) = self.session.next_tick_in(now) {
            ctx.request_repaint_after(wait);
        }

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Exit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
            });
        });

        egui::SidePanel::left("side_panel_left")
            .min_width(220.0)
            .default_width(320.0)
            .show(ctx, |ui| {
                ui.heading("Scenes");
                ui.separator();
                ui.collapsing("Configuration", |ui| {
                    if let Some(err) = &self.config_error {
                        ui.colored_label(egui::Color32::RED, format!("Config: {}", err));
                    }
                    ui.label(format!("Storage: {}", self.config.storage_dir.display()));
                    ui.label(format!(
                        "Export: {}",
                        self.config.export_dir.join(&self.config.export_filename).display()
                    ));
                    ui.label(format!("Mode: {:?}", self.config.persist_mode));
                });
                ui.separator();

                egui::ScrollArea::vertical()
                    .id_source("scene_list_scroll")
                    .show(ui, |ui| {
                        if self.session.scenes().is_empty() {
                            ui.label("Scenes appear here after a conversion or auto-save.");
                        }
                        for (idx, scene) in self.session.scenes().iter().enumerate() {
                            ui.label(egui::RichText::new(format!("Scene {}", idx + 1)).strong());
                            ui.label(scene.as_str());
                            ui.add_space(4.0);
                        }
                    });
            });

        egui::TopBottomPanel::bottom("status_panel").show(ctx, |ui| {
            let status = self.session.status();
            if status.is_error() {
                ui.colored_label(egui::Color32::RED, status.message());
            } else {
                ui.colored_label(egui::Color32::DARK_GREEN, status.message());
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Script");
                if ui.button("Convert to CSV").clicked() {
                    self.session.on_convert();
                }
            });
            ui.label("Separate scenes with । (danda).");
            ui.separator();

            egui::ScrollArea::vertical()
                .id_source("script_scroll")
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    let response = ui.add(
                        egui::TextEdit::multiline(self.session.input_mut())
                            .desired_width(f32::INFINITY)
                            .desired_rows(24)
                            .hint_text("Paste your script here…"),
                    );
                    if response.changed() {
                        self.session.on_input_changed(Instant::now());
                    }
                });
        });
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    let (mut config, config_error) = match config::load_config_from_file(&args.config) {
        Ok(config) => (config, None),
        // the window still opens with defaults and shows the problem
        Err(e) if args.command.is_none() => {
            error!("Error loading {}: {}", args.config, e);
            (Config::default(), Some(e.to_string()))
        }
        Err(e) => return Err(e.into()),
    };
    if let Some(mode) = args.mode {
        config.persist_mode = mode;
    }

    match args.command {
        None => run_window(config, config_error),
        Some(Command::Convert {
            input,
            output,
            stdout,
            no_save,
        }) => run_convert(&config, &input, output, stdout, no_save),
        Some(Command::Storyboard { input, title }) => run_storyboard(&config, &input, title),
        Some(Command::List) => run_list(&config),
    }
}

fn run_window(config: Config, config_error: Option<String>) -> anyhow::Result<()> {
    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 720.0])
            .with_min_inner_size([700.0, 480.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Script Breakdown",
        options,
        Box::new(move |cc| Box::new(ScriptBreakdownApp::new(cc, config, config_error))),
    )
    .map_err(|e| anyhow::anyhow!("failed to open window: {e}"))
}

fn run_convert(
    config: &Config,
    input: &InputArgs,
    output: Option<PathBuf>,
    stdout: bool,
    no_save: bool,
) -> anyhow::Result<()> {
    let text = input.read()?;
    let store = JsonFileStore::new(&config.storage_dir);

    let scenes = if no_save {
        script_breakdown::segment(text.trim())?
    } else {
        let mut persister = ScenePersister::new(config.persist_mode);
        segment_and_persist(text.trim(), &store, &mut persister)?
    };
    let blob = ExportBlob::csv(&scenes);

    if stdout {
        io::stdout().write_all(blob.as_bytes())?;
        return Ok(());
    }

    let (exporter, filename) = match output {
        Some(path) => {
            let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| csv::DEFAULT_FILENAME.to_string());
            (DirectoryExporter::new(dir), name)
        }
        None => (
            DirectoryExporter::new(&config.export_dir),
            config.export_filename.clone(),
        ),
    };
    let path = exporter.trigger_download(&blob, &filename)?;
    println!("Converted {} scene(s) to {}", scenes.len(), path.display());
    Ok(())
}

fn run_storyboard(config: &Config, input: &InputArgs, title: Option<String>) -> anyhow::Result<()> {
    let text = input.read()?;
    let store = JsonFileStore::new(&config.storage_dir);

    let mut persister = ScenePersister::new(PersistMode::Storyboards);
    if let Some(title) = title {
        persister = persister.with_title(title);
    }
    let scenes = script_breakdown::segment(text.trim())?;
    if !persister.persist(&store, &scenes, Utc::now()) {
        bail!("Failed to save storyboard to {}", store.path().display());
    }

    let id = persister
        .draft_id()
        .context("storyboard was saved without an id")?;
    println!("Saved storyboard {} with {} scene(s)", id, scenes.len());
    Ok(())
}

fn run_list(config: &Config) -> anyhow::Result<()> {
    let store = JsonFileStore::new(&config.storage_dir);
    let records = store.load();
    if records.is_empty() {
        println!("No saved records in {}", store.path().display());
        return Ok(());
    }

    for (idx, record) in records.iter().enumerate() {
        match record {
            StoredRecord::Scene(text) => println!("{:>3}. scene: {}", idx + 1, text),
            StoredRecord::Storyboard(board) => println!(
                "{:>3}. storyboard {} '{}' ({} scenes, edited {})",
                idx + 1,
                board.id,
                board.title,
                board.scenes.len(),
                board.last_edited.to_rfc3339()
            ),
        }
    }
    Ok(())
}
