use anyhow::{Context, Result, anyhow, bail, ensure};

use prism_engine::post::PassKind;

pub const USAGE: &str = "\
prism: post-processing pass demo

Usage:
  prism [--width W] [--height H] [--pixel-size P] [--pass NAME] [--log FILTER]

Options:
  --width W         initial window width in logical pixels (default 1280)
  --height H        initial window height in logical pixels (default 720)
  --pixel-size P    pixelation divisor, at least 1 (default 6)
  --pass NAME       initial pass: color, depth or pixelate (default color)
  --log FILTER      env_logger filter, overrides RUST_LOG
  -h, --help        print this help

Keys:
  C / 1  color     D / 2  depth     P / 3  pixelate
  [ / ]  pixel size down / up (also - / =)
  Esc    quit
";

/// Demo settings collected from the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoConfig {
    pub width: f64,
    pub height: f64,
    pub pixel_size: u32,
    pub initial_pass: PassKind,
    pub log_filter: Option<String>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
            pixel_size: 6,
            initial_pass: PassKind::Color,
            log_filter: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cli {
    Run(DemoConfig),
    Help,
}

impl DemoConfig {
    /// Parses flags, not including the program name.
    pub fn from_args<I>(args: I) -> Result<Cli>
    where
        I: IntoIterator<Item = String>,
    {
        let mut cfg = DemoConfig::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--width" => cfg.width = parse_value(&mut args, "--width")?,
                "--height" => cfg.height = parse_value(&mut args, "--height")?,
                "--pixel-size" => {
                    let p: u32 = parse_value(&mut args, "--pixel-size")?;
                    ensure!(p >= 1, "--pixel-size must be at least 1");
                    cfg.pixel_size = p;
                }
                "--pass" => {
                    let name = next_value(&mut args, "--pass")?;
                    cfg.initial_pass = PassKind::from_name(&name)
                        .ok_or_else(|| anyhow!("unknown pass `{name}` (expected color, depth or pixelate)"))?;
                }
                "--log" => cfg.log_filter = Some(next_value(&mut args, "--log")?),
                "--help" | "-h" => return Ok(Cli::Help),
                other => bail!("unknown argument `{other}`"),
            }
        }

        ensure!(
            cfg.width > 0.0 && cfg.height > 0.0,
            "window size must be positive, got {}x{}",
            cfg.width,
            cfg.height
        );

        Ok(Cli::Run(cfg))
    }
}

fn next_value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    args.next().with_context(|| format!("missing value for {flag}"))
}

fn parse_value<T>(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = next_value(args, flag)?;
    raw.parse()
        .with_context(|| format!("invalid value `{raw}` for {flag}"))
}
