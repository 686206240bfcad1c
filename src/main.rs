use clap::{Parser, Subcommand};
use mztx::config::PanelConfig;
use mztx::convert;
use mztx::font::Font;
use mztx::framebuffer::{Framebuffer, Mirror};
use mztx::image::color::Rgb8;
use mztx::image::{Image, WriteMode};
use mztx::lcd::interface::{Interface, BACKLIGHT_RANGE};
use mztx::lcd::{gpio_pin, Lcd};
use mztx::shutdown::Shutdown;
use mztx::status::{Status, StatusText};
use mztx::test_pattern::{triangle_colour, triangle_image, TRIANGLE_SIZE};
use mztx::trace::{CpuStats, CpuTrace, MemoryStats, MemoryTrace};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::thread::sleep;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::info;
use tracing_subscriber::EnvFilter;

const TRACE_HEIGHT: i16 = 80;

#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Panel configuration (TOML). Built-in defaults when absent.
    #[clap(long)]
    config: Option<PathBuf>,
    /// Portrait orientation (240x320)
    #[clap(long)]
    portrait: bool,
    /// Truncate colours instead of dithering them
    #[clap(long)]
    no_dither: bool,
    /// 8x16 font (PSF1 or raw), overrides the configuration
    #[clap(long)]
    font: Option<PathBuf>,
    #[clap(short, long)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Colour fills, boxes, the colour triangle and a backlight sweep
    Test,
    /// Fill the panel with one colour
    Clear {
        #[clap(long, value_parser = parse_colour, default_value = "0,0,0")]
        colour: Rgb8,
    },
    /// Show a picture, shrunk to fit and centred, until interrupted
    Show { file: PathBuf },
    /// Status text, CPU and memory graphs, refreshed every second
    Sysinfo,
    /// Copy a 16 bits per pixel framebuffer to the panel until interrupted
    Mirror {
        #[clap(long, default_value = "/dev/fb0")]
        device: PathBuf,
        /// Frames per second
        #[clap(long, default_value_t = 2)]
        fps: u32,
    },
}

fn parse_colour(s: &str) -> Result<Rgb8, String> {
    let channels: Vec<u8> = s
        .split(',')
        .map(|c| c.trim().parse::<u8>().map_err(|e| format!("{c}: {e}")))
        .collect::<Result<_, _>>()?;
    match channels[..] {
        [red, green, blue] => Ok(Rgb8::new(red, green, blue)),
        _ => Err(format!("expected r,g,b, got {s}")),
    }
}

fn timed<T, F>(what: &str, f: F) -> Result<T, Box<dyn Error>>
where
    F: FnOnce() -> Result<T, Box<dyn Error>>,
{
    let start = Instant::now();
    let result = f()?;
    info!("{} took {:?}", what, start.elapsed());
    Ok(result)
}

fn test<I: Interface>(lcd: &mut Lcd<I>, mode: WriteMode) -> Result<(), Box<dyn Error>> {
    let (width, height) = (lcd.width(), lcd.height());

    for (name, colour) in [
        ("red", Rgb8::new(255, 0, 0)),
        ("yellow", Rgb8::new(255, 255, 0)),
        ("green", Rgb8::new(0, 255, 0)),
        ("cyan", Rgb8::new(0, 255, 255)),
        ("blue", Rgb8::new(0, 0, 255)),
        ("magenta", Rgb8::new(255, 0, 255)),
        ("black", Rgb8::BLACK),
    ] {
        timed(&format!("clear {name}"), || Ok(lcd.clear(colour.pack())?))?;
        sleep(Duration::from_secs(1));
    }

    timed("fill", || Ok(lcd.fill_rect(0, 0, width, height, Rgb8::WHITE.pack())?))?;
    sleep(Duration::from_secs(1));
    let (half_width, half_height) = (width / 2, height / 2);
    lcd.fill_rect(0, 0, half_width, half_height, Rgb8::new(255, 0, 0).pack())?;
    lcd.fill_rect(half_width, 0, half_width, half_height, Rgb8::new(0, 255, 0).pack())?;
    lcd.fill_rect(0, half_height, half_width, half_height, Rgb8::new(0, 0, 255).pack())?;
    lcd.fill_rect(half_width, half_height, half_width, half_height, Rgb8::new(127, 127, 127).pack())?;
    sleep(Duration::from_secs(1));

    let x_offset = (width - TRIANGLE_SIZE) / 2;
    let y_offset = (height - TRIANGLE_SIZE) / 2;

    lcd.clear(Rgb8::BLACK.pack())?;
    timed("triangle", || {
        for y in 0..TRIANGLE_SIZE {
            for x in 0..TRIANGLE_SIZE {
                if let Some(colour) = triangle_colour(x, y) {
                    lcd.set_pixel(x + x_offset, y + y_offset, colour.pack())?;
                }
            }
        }
        Ok(())
    })?;
    sleep(Duration::from_secs(1));

    for mode in [WriteMode::Direct, mode] {
        timed(&format!("triangle image ({mode:?})"), || {
            let image = triangle_image(mode)?;
            Ok(lcd.blit_image(x_offset, y_offset, &image)?)
        })?;
        sleep(Duration::from_secs(1));
    }

    info!("backlight sweep");
    for level in 0..BACKLIGHT_RANGE {
        lcd.set_backlight(level)?;
        sleep(Duration::from_millis(1));
    }
    lcd.set_backlight(0)?;

    Ok(())
}

fn show<I: Interface>(
    lcd: &mut Lcd<I>,
    file: &Path,
    mode: WriteMode,
    shutdown: &Shutdown,
) -> Result<(), Box<dyn Error>> {
    let image: Image = convert::load(file, mode)?;
    let image = convert::fit(image, lcd.width(), lcd.height())?;
    let (x, y) = convert::centre(image.width(), image.height(), lcd.width(), lcd.height());
    lcd.blit_image(x, y, &image)?;

    while shutdown.sleep(Duration::from_millis(100)) {}
    Ok(())
}

fn sysinfo<I: Interface>(
    lcd: &mut Lcd<I>,
    font: Option<&Font>,
    shutdown: &Shutdown,
) -> Result<(), Box<dyn Error>> {
    let width = lcd.width();
    let mut status = font.map(|_| StatusText::new(width, 0)).transpose()?;
    let top = status.as_ref().map_or(0, StatusText::next_y);
    let mut cpu = CpuTrace::new(width, TRACE_HEIGHT, top, font, CpuStats::read()?)?;
    let mut memory = MemoryTrace::new(width, TRACE_HEIGHT, cpu.next_y(), font)?;

    shutdown.sleep(Duration::from_secs(1));

    while shutdown.is_running() {
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?;

        if let (Some(text), Some(font)) = (status.as_mut(), font) {
            text.draw(font, &Status::read());
            text.render(lcd)?;
        }
        cpu.update(now.as_secs(), CpuStats::read()?);
        cpu.render(lcd)?;
        memory.update(now.as_secs(), MemoryStats::read()?);
        memory.render(lcd)?;

        // wake on the next whole second
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?;
        shutdown.sleep(Duration::from_secs(1) - Duration::from_nanos(u64::from(now.subsec_nanos())));
    }
    Ok(())
}

fn mirror<I: Interface>(
    lcd: &mut Lcd<I>,
    device: &Path,
    fps: u32,
    shutdown: &Shutdown,
) -> Result<(), Box<dyn Error>> {
    let framebuffer = Framebuffer::open(device)?;
    let mut mirror = Mirror::new(
        framebuffer.width(),
        framebuffer.height(),
        framebuffer.pitch(),
        lcd.width(),
        lcd.height(),
    )?;
    let frame_duration = Duration::from_secs(1) / fps.max(1);

    while shutdown.is_running() {
        let start = Instant::now();
        mirror.show(framebuffer.frame(), lcd)?;
        if let Some(rest) = frame_duration.checked_sub(start.elapsed()) {
            shutdown.sleep(rest);
        }
    }

    lcd.clear(Rgb8::BLACK.pack())?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let mut config = match &args.config {
        Some(path) => PanelConfig::load(path)?,
        None => PanelConfig::default(),
    };
    if args.portrait {
        config.rotate = false;
    }
    if args.no_dither {
        config.dither = false;
    }
    if args.font.is_some() {
        config.font = args.font.clone();
    }
    let mode = WriteMode::from_dither(config.dither);

    let font = config.font.as_ref().map(Font::load).transpose()?;
    let shutdown = Shutdown::install()?;

    let interface = gpio_pin::open(&config)?;
    let mut lcd = Lcd::open(interface, config.rotate)?;

    if let Command::Clear { colour } = &args.command {
        // left open so the colour stays on screen
        lcd.clear(colour.pack())?;
        return Ok(());
    }

    lcd.run_then_close(|lcd| match &args.command {
        Command::Test => test(lcd, mode),
        Command::Show { file } => show(lcd, file, mode, &shutdown),
        Command::Sysinfo => sysinfo(lcd, font.as_ref(), &shutdown),
        Command::Mirror { device, fps } => mirror(lcd, device, *fps, &shutdown),
        Command::Clear { .. } => Ok(()),
    })
}
