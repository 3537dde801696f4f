//! Configuration module for a11yscan
//!
//! This module handles:
//! - The TOML config file
//! - Environment overrides and dotenv credential files
//! - Building capture tiers and the pipeline from settings

mod settings;

pub use settings::{
    load_dotenv, CaptureSettings, ClassifierSettings, OutputSettings, Settings, DOTENV_FILES,
};
