//! Command-line configuration.

use anyhow::{Context, Result, anyhow, bail};

use crate::gesture::data::{
    DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_PREDICTION_WINDOW, DEFAULT_TICK_INTERVAL_MS,
};

const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000/predict";
const DEFAULT_WIDTH: u32 = 640;
const DEFAULT_HEIGHT: u32 = 480;
const DEFAULT_STATUS_PORT: u16 = 8095;

const USAGE: &str = "Usage: gesture-watch [--endpoint <url>] [--interval <ms>] \
[--window <n>] [--threshold <0..1>] [--width <px>] [--height <px>] \
[--status-port <port>] [--auto-activate] [--verbose]";

#[derive(Clone, Debug)]
pub struct GestureConfig {
    pub endpoint: String,
    pub interval_ms: u64,
    pub window: usize,
    pub confidence_threshold: f64,
    pub width: u32,
    pub height: u32,
    pub status_port: u16,
    pub auto_activate: bool,
    pub verbose: bool,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            interval_ms: DEFAULT_TICK_INTERVAL_MS,
            window: DEFAULT_PREDICTION_WINDOW,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            status_port: DEFAULT_STATUS_PORT,
            auto_activate: false,
            verbose: false,
        }
    }
}

impl GestureConfig {
    pub fn from_args(args: &[String]) -> Result<Self> {
        let mut config = Self::default();

        let mut idx = 1;
        while idx < args.len() {
            match args[idx].as_str() {
                "--endpoint" => {
                    idx += 1;
                    config.endpoint = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--endpoint requires a value"))?
                        .clone();
                    idx += 1;
                }
                "--interval" => {
                    idx += 1;
                    let value = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--interval requires a value"))?
                        .parse::<u64>()
                        .with_context(|| "--interval must be an integer (ms)".to_string())?;
                    if value == 0 {
                        bail!("--interval must be at least 1 ms");
                    }
                    config.interval_ms = value;
                    idx += 1;
                }
                "--window" => {
                    idx += 1;
                    let value = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--window requires a value"))?
                        .parse::<usize>()
                        .with_context(|| "--window must be a positive integer".to_string())?;
                    if value == 0 {
                        bail!("--window must be at least 1");
                    }
                    config.window = value;
                    idx += 1;
                }
                "--threshold" => {
                    idx += 1;
                    let value = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--threshold requires a value"))?
                        .parse::<f64>()
                        .with_context(|| "--threshold must be a number".to_string())?;
                    if !(0.0..=1.0).contains(&value) {
                        bail!("--threshold must be between 0 and 1");
                    }
                    config.confidence_threshold = value;
                    idx += 1;
                }
                "--width" => {
                    idx += 1;
                    let value = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--width requires a value"))?
                        .parse::<u32>()
                        .with_context(|| "--width must be a positive integer".to_string())?;
                    if value == 0 {
                        bail!("--width must be a positive integer");
                    }
                    config.width = value;
                    idx += 1;
                }
                "--height" => {
                    idx += 1;
                    let value = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--height requires a value"))?
                        .parse::<u32>()
                        .with_context(|| "--height must be a positive integer".to_string())?;
                    if value == 0 {
                        bail!("--height must be a positive integer");
                    }
                    config.height = value;
                    idx += 1;
                }
                "--status-port" => {
                    idx += 1;
                    config.status_port = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--status-port requires a value"))?
                        .parse::<u16>()
                        .with_context(|| "--status-port must be a port number".to_string())?;
                    idx += 1;
                }
                "--auto-activate" => {
                    config.auto_activate = true;
                    idx += 1;
                }
                "--verbose" => {
                    config.verbose = true;
                    idx += 1;
                }
                "--help" | "-h" => {
                    bail!(USAGE);
                }
                arg => {
                    bail!("Unrecognised argument: {arg}\n\n{USAGE}");
                }
            }
        }

        Ok(config)
    }
}
