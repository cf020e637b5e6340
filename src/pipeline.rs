// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Hand-off to an external pose-estimation toolkit.
//!
//! Labels produced here train a model elsewhere; its predictions come back as
//! a label CSV that can be shown as machine labels.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub epochs: u32,
    pub save_epochs: u32,
    pub batch_size: u32,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 200,
            save_epochs: 10,
            batch_size: 2,
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 || self.save_epochs == 0 || self.batch_size == 0 {
            return Err(Error::configuration(format!(
                "training epochs, save epochs and batch size must be at least 1 (got {:?})",
                self
            )));
        }
        Ok(())
    }
}

/// Trains a pose model from labels and runs it on videos.
pub trait PoseModelTrainer {
    fn train(&self, labels_csv: &Path, videos: &[PathBuf], config: &TrainingConfig) -> Result<()>;

    /// Returns the path of the predictions table.
    fn predict(&self, videos: &[PathBuf], model: &Path) -> Result<PathBuf>;
}

/// Runs an external command:
///
/// ```text
/// <program> [args..] train --labels L --epochs N --save-epochs N --batch-size N --videos V..
/// <program> [args..] analyze --model M --videos V..
/// ```
///
/// `analyze` must print the predictions CSV path as its last line of output.
#[derive(Debug, Clone)]
pub struct CommandTrainer {
    program: String,
    args: Vec<String>,
}

impl CommandTrainer {
    /// Split a command line on whitespace into program and leading arguments.
    pub fn from_command_line(command: &str) -> Result<Self> {
        let mut parts = command.split_whitespace().map(String::from);
        let program = parts
            .next()
            .ok_or_else(|| Error::configuration("trainer command is empty"))?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }

    fn command(&self, subcommand: &str) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args).arg(subcommand);
        command
    }

    fn run(&self, mut command: Command) -> Result<String> {
        log::debug!("Running {:?}", command);
        let output = command
            .output()
            .map_err(|e| Error::resource(Path::new(&self.program), e))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::configuration(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn require_videos(videos: &[PathBuf]) -> Result<()> {
    if videos.is_empty() {
        return Err(Error::configuration("no videos given"));
    }
    Ok(())
}

impl PoseModelTrainer for CommandTrainer {
    fn train(&self, labels_csv: &Path, videos: &[PathBuf], config: &TrainingConfig) -> Result<()> {
        config.validate()?;
        require_videos(videos)?;
        if !labels_csv.is_file() {
            return Err(Error::configuration(format!(
                "label table {} does not exist; label and save before training",
                labels_csv.display()
            )));
        }

        let mut command = self.command("train");
        command
            .arg("--labels")
            .arg(labels_csv)
            .arg("--epochs")
            .arg(config.epochs.to_string())
            .arg("--save-epochs")
            .arg(config.save_epochs.to_string())
            .arg("--batch-size")
            .arg(config.batch_size.to_string())
            .arg("--videos")
            .args(videos);
        log::info!("Training on {} videos from {}", videos.len(), labels_csv.display());
        self.run(command)?;
        log::info!("Model completed training");
        Ok(())
    }

    fn predict(&self, videos: &[PathBuf], model: &Path) -> Result<PathBuf> {
        require_videos(videos)?;
        let mut command = self.command("analyze");
        command.arg("--model").arg(model).arg("--videos").args(videos);
        let stdout = self.run(command)?;

        let predictions = stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .last()
            .map(PathBuf::from)
            .ok_or_else(|| Error::data_format("analysis printed no predictions path"))?;
        if !predictions.is_file() {
            return Err(Error::data_format(format!(
                "analysis reported {}, which does not exist",
                predictions.display()
            )));
        }
        log::info!("Videos analyzed, predictions in {}", predictions.display());
        Ok(predictions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_parsing() {
        let trainer = CommandTrainer::from_command_line("python -m pose_tool").unwrap();
        assert_eq!(trainer.program, "python");
        assert_eq!(trainer.args, ["-m", "pose_tool"]);
        assert!(CommandTrainer::from_command_line("   ").is_err());
    }

    #[test]
    fn test_training_config_validation() {
        assert!(TrainingConfig::default().validate().is_ok());
        let bad = TrainingConfig {
            batch_size: 0,
            ..TrainingConfig::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_train_requires_saved_labels() {
        let trainer = CommandTrainer::from_command_line("true").unwrap();
        let err = trainer
            .train(
                Path::new("/no/such/labels.csv"),
                &[PathBuf::from("a.mp4")],
                &TrainingConfig::default(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(trainer
            .predict(&[], Path::new("model"))
            .is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_predict_reads_path_from_output() {
        let dir = tempfile::tempdir().unwrap();
        let predictions = dir.path().join("predictions.csv");
        std::fs::write(&predictions, "video,frame\n").unwrap();

        let trainer = CommandTrainer {
            program: "sh".into(),
            args: vec![
                "-c".into(),
                format!("echo analyzing; echo {}", predictions.display()),
                "analyzer".into(),
            ],
        };
        let path = trainer
            .predict(&[PathBuf::from("a.mp4")], Path::new("model"))
            .unwrap();
        assert_eq!(path, predictions);
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_command_is_reported() {
        let trainer = CommandTrainer {
            program: "sh".into(),
            args: vec!["-c".into(), "exit 3".into(), "analyzer".into()],
        };
        assert!(trainer
            .predict(&[PathBuf::from("a.mp4")], Path::new("model"))
            .is_err());
    }
}
