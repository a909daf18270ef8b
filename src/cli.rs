// src/cli.rs

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use tap_trace::{InteractionType, ToolSettings};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// TOML file with tool defaults and overlay geometry
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print inter-step distances and quality scores
    Report {
        /// Dataset folder containing `test_img/`
        #[arg(short, long)]
        folder: PathBuf,

        /// Only report this test id
        #[arg(short, long)]
        test_id: Option<String>,

        /// 0-based image index to mark as the current step
        #[arg(long)]
        current: Option<usize>,
    },

    /// Record a click on one image and save
    Annotate {
        #[command(flatten)]
        target: Target,

        /// Click position in pixels of the displayed image
        #[arg(long)]
        x: f64,

        #[arg(long)]
        y: f64,

        /// Width of the image as displayed; defaults to the dataset's image width
        #[arg(long)]
        display_width: Option<u32>,

        /// Height of the image as displayed; defaults to the dataset's image height
        #[arg(long)]
        display_height: Option<u32>,

        #[command(flatten)]
        tool: ToolArgs,
    },

    /// Change the tool of an annotated image without clicking, and save
    Retype {
        #[command(flatten)]
        target: Target,

        #[command(flatten)]
        tool: ToolArgs,
    },

    /// Draw annotations onto the screenshots
    Render {
        #[arg(short, long)]
        folder: PathBuf,

        /// Directory to write the annotated images to
        #[arg(short, long)]
        output: PathBuf,

        /// Only render this test id
        #[arg(short, long)]
        test_id: Option<String>,
    },
}

/// One image of one dataset
#[derive(ClapArgs, Debug)]
pub struct Target {
    #[arg(short, long)]
    pub folder: PathBuf,

    #[arg(short, long)]
    pub test_id: String,

    /// Image file name, e.g. `003.png`
    #[arg(short, long)]
    pub image: String,
}

#[derive(ClapArgs, Debug)]
pub struct ToolArgs {
    #[arg(long, value_enum, default_value_t = Tool::Click)]
    pub tool: Tool,

    /// Click count for multiclick
    #[arg(long)]
    pub clicks: Option<u32>,

    /// Duration in milliseconds for longpress and slide
    #[arg(long)]
    pub duration: Option<u64>,
}

impl ToolArgs {
    /// Field values with the flags given on the command line applied over `defaults`
    pub fn settings(&self, defaults: ToolSettings) -> ToolSettings {
        let mut settings = defaults;
        if let Some(clicks) = self.clicks {
            settings.clicks = clicks;
        }
        if let Some(duration) = self.duration {
            match self.tool {
                Tool::Longpress => settings.longpress_duration_ms = duration,
                Tool::Slide => settings.slide_duration_ms = duration,
                Tool::Click | Tool::Multiclick => {}
            }
        }
        settings
    }
}

#[derive(clap::ValueEnum, Clone, Debug, Copy, PartialEq, Eq)]
pub enum Tool {
    /// Single tap
    Click,
    /// Repeated tap, see --clicks
    Multiclick,
    /// Press and hold, see --duration
    Longpress,
    /// Drag between two points; click twice to set start and end
    Slide,
}

impl From<Tool> for InteractionType {
    fn from(tool: Tool) -> Self {
        match tool {
            Tool::Click => InteractionType::Tap,
            Tool::Multiclick => InteractionType::MultiTap,
            Tool::Longpress => InteractionType::LongPress,
            Tool::Slide => InteractionType::Slide,
        }
    }
}
