use std::path::PathBuf;

use clap::{Parser, Subcommand};
use settings::{ColorSpace, PowerPreference, ShaderBackend};

#[derive(Parser, Debug)]
#[command(
    name = "gallery",
    author,
    version,
    about = "Stencil and compute wgpu examples",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// Example to open first (e.g. `BasicStencil`); case-insensitive.
    #[arg(value_name = "EXAMPLE")]
    pub example: Option<String>,

    /// Window size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub size: Option<(u32, u32)>,

    /// Optional FPS cap for the window (0=uncapped).
    #[arg(long, value_name = "FPS", value_parser = parse_fps)]
    pub fps: Option<f32>,

    /// Output color space handling: `auto`, `gamma`, or `linear`.
    #[arg(long, value_name = "MODE", value_parser = parse_color_space)]
    pub color_space: Option<ColorSpace>,

    /// Shader compiler backend: `naga` (default) or `shaderc`.
    #[arg(long, value_name = "COMPILER", value_parser = parse_shader_compiler)]
    pub shader_compiler: Option<ShaderBackend>,

    /// Adapter power preference: `low` or `high`.
    #[arg(long, value_name = "PREFERENCE", value_parser = parse_power)]
    pub power: Option<PowerPreference>,

    /// Present without waiting for vblank when the surface allows it.
    #[arg(long)]
    pub no_vsync: bool,

    /// Directory containing `Content/Shaders/...`.
    #[arg(long, value_name = "DIR", env = "GALLERY_CONTENT_DIR")]
    pub content_dir: Option<PathBuf>,

    /// Settings file to read instead of `<config dir>/gallery.toml`.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print every registered example with a short description.
    List,
    /// Render an example offscreen and save the final frame as PNG.
    Capture(CaptureArgs),
    /// Print the resolved settings file and content directory.
    Where,
}

#[derive(Parser, Debug)]
pub struct CaptureArgs {
    /// Example to capture; case-insensitive.
    #[arg(value_name = "EXAMPLE")]
    pub example: String,

    /// Destination PNG path.
    #[arg(long, short, value_name = "FILE")]
    pub output: PathBuf,

    /// Number of update/draw iterations before reading back.
    #[arg(long, value_name = "N", default_value_t = 1)]
    pub frames: u32,

    /// Capture size (defaults to the window size).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub size: Option<(u32, u32)>,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (width, height) = value
        .trim()
        .split_once(['x', 'X', '×'])
        .ok_or_else(|| "expected WxH format, e.g. 1280x720".to_string())?;
    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| format!("invalid width in size `{value}`"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| format!("invalid height in size `{value}`"))?;
    if width == 0 || height == 0 {
        return Err("size must be greater than zero".into());
    }
    Ok((width, height))
}

pub fn parse_fps(value: &str) -> Result<f32, String> {
    let fps: f32 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid fps '{value}'"))?;
    if !fps.is_finite() || fps < 0.0 {
        return Err("fps must be >= 0".into());
    }
    Ok(fps)
}

pub fn parse_color_space(value: &str) -> Result<ColorSpace, String> {
    value.parse()
}

pub fn parse_power(value: &str) -> Result<PowerPreference, String> {
    value.parse()
}

pub fn parse_shader_compiler(value: &str) -> Result<ShaderBackend, String> {
    let backend: ShaderBackend = value.parse()?;
    if backend == ShaderBackend::Shaderc && !cfg!(feature = "shaderc") {
        return Err("shaderc support is not enabled in this build".to_string());
    }
    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sizes() {
        assert_eq!(parse_size("1280x720").unwrap(), (1280, 720));
        assert_eq!(parse_size(" 640 X 480 ").unwrap(), (640, 480));
        assert!(parse_size("0x480").is_err());
        assert!(parse_size("640").is_err());
        assert!(parse_size("wide x tall").is_err());
    }

    #[test]
    fn fps_must_be_non_negative() {
        assert_eq!(parse_fps("0").unwrap(), 0.0);
        assert_eq!(parse_fps("59.94").unwrap(), 59.94);
        assert!(parse_fps("-1").is_err());
        assert!(parse_fps("fast").is_err());
    }

    #[test]
    fn enum_flags_accept_lowercase_names() {
        assert_eq!(parse_color_space("gamma").unwrap(), ColorSpace::Gamma);
        assert_eq!(parse_power("LOW").unwrap(), PowerPreference::Low);
        assert_eq!(parse_shader_compiler("naga").unwrap(), ShaderBackend::Naga);
        assert!(parse_color_space("hdr").is_err());
    }

    #[test]
    fn shaderc_requires_feature() {
        let result = parse_shader_compiler("shaderc");
        assert_eq!(result.is_ok(), cfg!(feature = "shaderc"));
    }

    #[test]
    fn subcommands_and_positional_example_parse() {
        let cli = Cli::try_parse_from(["gallery", "ComputeUniforms", "--fps", "30"]).unwrap();
        assert_eq!(cli.run.example.as_deref(), Some("ComputeUniforms"));
        assert_eq!(cli.run.fps, Some(30.0));
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from([
            "gallery",
            "capture",
            "BasicStencil",
            "--output",
            "out.png",
            "--frames",
            "3",
            "--size",
            "320x240",
        ])
        .unwrap();
        match cli.command {
            Some(Command::Capture(args)) => {
                assert_eq!(args.example, "BasicStencil");
                assert_eq!(args.output, PathBuf::from("out.png"));
                assert_eq!(args.frames, 3);
                assert_eq!(args.size, Some((320, 240)));
            }
            other => panic!("expected capture command, got {other:?}"),
        }

        let cli = Cli::try_parse_from(["gallery", "list"]).unwrap();
        assert!(matches!(cli.command, Some(Command::List)));
    }
}
