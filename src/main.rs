// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! poseclick - multi-video keypoint labeling
//!
//! A cross-platform desktop application for clicking pose landmarks on
//! synchronized videos, plus command line hand-off to a pose model trainer.

mod app;
mod ui;
mod util;

use anyhow::{Context, Result};
use app::PoseclickApp;
use clap::{Args, Parser, Subcommand};
use poseclick::io::media::DefaultBackend;
use poseclick::io::serialization;
use poseclick::models::{LabelStore, SessionConfig};
use poseclick::pipeline::{CommandTrainer, PoseModelTrainer, TrainingConfig};
use poseclick::viewer::open_session;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "poseclick", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Open the labeling window (the default)
    Label(LabelArgs),
    /// Train a pose model from a saved label table
    Train {
        #[arg(long)]
        labels: PathBuf,
        #[arg(long, num_args = 1.., required = true)]
        videos: Vec<PathBuf>,
        /// Trainer command line, e.g. "python -m my_pose_tool"
        #[arg(long)]
        command: String,
        /// Training settings (YAML or JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Run a trained model on videos and print the predictions path
    Analyze {
        #[arg(long, num_args = 1.., required = true)]
        videos: Vec<PathBuf>,
        #[arg(long)]
        model: PathBuf,
        #[arg(long)]
        command: String,
    },
    /// Print the frames of a label table that hold labels
    Frames {
        #[arg(long)]
        labels: PathBuf,
    },
}

#[derive(Args, Default)]
struct LabelArgs {
    /// Video files or image-sequence directories
    videos: Vec<PathBuf>,
    /// Folder to search for recordings
    #[arg(long, conflicts_with = "videos")]
    folder: Option<PathBuf>,
    /// Session settings (YAML or JSON)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Tracked point document (YAML or JSON)
    #[arg(long)]
    tracked_points: Option<PathBuf>,
    /// Label table to continue from
    #[arg(long)]
    labels: Option<PathBuf>,
    #[arg(long)]
    machine_labels: Option<PathBuf>,
    /// Label file, or directory for timestamped label files
    #[arg(long)]
    output: Option<PathBuf>,
    /// Start with playback paused
    #[arg(long)]
    paused: bool,
}

impl LabelArgs {
    /// Command line flags override the config file.
    fn apply(self, config: &mut SessionConfig) {
        if !self.videos.is_empty() {
            config.videos = self.videos;
            config.video_folder = None;
        }
        if let Some(folder) = self.folder {
            config.videos.clear();
            config.video_folder = Some(folder);
        }
        if let Some(path) = self.tracked_points {
            config.tracked_points = Some(path);
            config.tracked_point_names.clear();
        }
        if self.labels.is_some() {
            config.labels_csv = self.labels;
        }
        if self.machine_labels.is_some() {
            config.machine_labels_csv = self.machine_labels;
        }
        if self.output.is_some() {
            config.output_path = self.output;
        }
        if self.paused {
            config.start_paused = true;
        }
    }
}

fn run_label(args: LabelArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => SessionConfig::load(path)
            .with_context(|| format!("Failed to load session config {}", path.display()))?,
        None => SessionConfig::default(),
    };
    args.apply(&mut config);

    let has_recording = !config.videos.is_empty() || config.video_folder.is_some();
    let viewer = if has_recording || app::pick_recording(&mut config) {
        Some(open_session(&config, &DefaultBackend).context("Failed to open labeling session")?)
    } else {
        log::info!("No recording selected");
        None
    };

    let (title, inner_size) = match &viewer {
        Some(viewer) => {
            let (width, height) = viewer.window_size();
            (viewer.window_title(), [width as f32 + 260.0, height as f32 + 120.0])
        }
        None => ("poseclick".to_string(), [1280.0, 720.0]),
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(inner_size)
            .with_min_inner_size([800.0, 600.0])
            .with_title(title),
        ..Default::default()
    };

    eframe::run_native(
        "poseclick",
        options,
        Box::new(|_cc| Ok(Box::new(PoseclickApp::new(config, viewer)))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Label(LabelArgs::default())) {
        Command::Label(args) => run_label(args)?,
        Command::Train {
            labels,
            videos,
            command,
            config,
        } => {
            let training = match config {
                Some(path) => serialization::import_document::<TrainingConfig>(&path)
                    .with_context(|| format!("Failed to load training config {}", path.display()))?,
                None => TrainingConfig::default(),
            };
            let trainer = CommandTrainer::from_command_line(&command)?;
            trainer
                .train(&labels, &videos, &training)
                .context("Training failed")?;
        }
        Command::Analyze {
            videos,
            model,
            command,
        } => {
            let trainer = CommandTrainer::from_command_line(&command)?;
            let predictions = trainer
                .predict(&videos, &model)
                .context("Analysis failed")?;
            println!("{}", predictions.display());
        }
        Command::Frames { labels } => {
            let store = LabelStore::load(&labels)
                .with_context(|| format!("Failed to load labels {}", labels.display()))?;
            for frame in store.nonempty_frames() {
                println!("{}", frame);
            }
        }
    }

    Ok(())
}
