// src/cli.rs

use crate::config::Settings;
use crate::scale::ScaleMode;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Per-line edit-frequency heatmap from git history", long_about = None)]
pub struct Args {
    /// File to analyze; must be inside a git work tree
    pub file: PathBuf,

    /// 1-based line to annotate with its change count
    #[arg(short, long)]
    pub line: Option<usize>,

    /// Transfer function from counts to heat
    #[arg(long, value_enum)]
    pub scale: Option<ScaleMode>,

    /// Exponent for the exponential scale, clamped to [1, 6]
    #[arg(long)]
    pub gamma: Option<f64>,

    /// Also write a heat strip PNG here
    #[arg(long)]
    pub png: Option<PathBuf>,

    /// Width of the PNG in pixels
    #[arg(long, default_value_t = 64)]
    pub width: u32,

    /// Height of each line's band in the PNG
    #[arg(long, default_value_t = 4)]
    pub row_height: u32,

    /// Print blame metadata for the selected line
    #[arg(long)]
    pub blame: bool,

    /// Don't paint line backgrounds
    #[arg(long)]
    pub no_color: bool,

    /// Don't print the inline change label
    #[arg(long)]
    pub no_text: bool,

    /// Give up on a single line's history after this many seconds
    #[arg(long)]
    pub query_timeout_secs: Option<u64>,

    /// TOML settings file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Args {
    /// Layer the command-line flags over file settings
    pub fn apply(&self, mut settings: Settings) -> Settings {
        if let Some(scale) = self.scale {
            settings.scale = scale;
        }
        if let Some(gamma) = self.gamma {
            settings.exponential_gamma = gamma;
        }
        if let Some(secs) = self.query_timeout_secs {
            settings.query_timeout_secs = Some(secs);
        }
        if self.no_color {
            settings.enable_color = false;
        }
        if self.no_text {
            settings.enable_text = false;
        }
        settings
    }
}
