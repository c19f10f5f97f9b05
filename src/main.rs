use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use display_info::DisplayInfo;
use rand::seq::SliceRandom;
use rand::Rng;
use sysinfo::System;

use unspoken::announce::{AnnouncementPolicy, SpeechHost};
use unspoken::assets::generate_placeholder_assets;
use unspoken::audio_system::{AudioEngine, EmitterRegistry, HeadlessEngine, RodioEngine};
use unspoken::messaging::{CueDispatcher, EventKind, HostEvent};
use unspoken::{AppResult, CueSettings, CueTarget, PlaybackController, Rect, Role};

const LOG_TARGET_STARTUP: &str = "unspoken::startup";

const DEFAULT_TOUR_STEPS: usize = 24;

/// Roles visited by the demo tour, a few of them without a cue.
const TOUR_ROLES: &[Role] = &[
    Role::Button,
    Role::Checkbox,
    Role::RadioButton,
    Role::EditableText,
    Role::ComboBox,
    Role::Link,
    Role::ListItem,
    Role::MenuItem,
    Role::Slider,
    Role::Tab,
    Role::TreeViewItem,
    Role::SplitButton,
    Role::Heading,
    Role::Pane,
];

/// Environment variable holding a log filter, e.g. `UNSPOKEN_LOG=unspoken=trace`.
/// `RUST_LOG` is honoured when it is unset.
const LOG_FILTER_ENV: &str = "UNSPOKEN_LOG";

/// Set up logging before anything else runs.
///
/// Log files go to the `logs` folder next to the settings file:
/// - Linux: `~/.config/Unspoken/logs/`
/// - macOS: `~/Library/Application Support/Unspoken/logs/`
/// - Windows: `%APPDATA%\Unspoken\logs\`
///
/// One file per day (`unspoken.log.YYYY-MM-DD`). Debug builds mirror
/// everything to stdout.
fn initialize_tracing() {
    use tracing_appender::rolling;
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let log_dir = CueSettings::app_dir()
        .map(|dir| dir.join("logs"))
        .unwrap_or_else(|_| PathBuf::from("logs"));
    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Warning: cannot create log directory {}: {}", log_dir.display(), e);
    }

    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = fmt::layer()
        .with_writer(rolling::daily(&log_dir, "unspoken.log"))
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true);

    let console_layer = cfg!(debug_assertions).then(|| {
        fmt::layer()
            .with_writer(std::io::stdout)
            .with_target(false)
            .compact()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    tracing::info!("Log directory: {}", log_dir.display());
}

fn log_runtime_environment() {
    let version = env!("CARGO_PKG_VERSION");
    let os_name = System::long_os_version()
        .or_else(System::name)
        .unwrap_or_else(|| "Unknown OS".to_string());
    let kernel = System::kernel_version().unwrap_or_else(|| "Unknown Kernel".to_string());
    let architecture = std::env::consts::ARCH;

    tracing::info!(target: LOG_TARGET_STARTUP, "Starting Unspoken v{} on ({})", version, architecture);
    tracing::info!(target: LOG_TARGET_STARTUP, "Operating System: {} (kernel {})", os_name, kernel);

    if let Ok(displays) = DisplayInfo::all() {
        tracing::info!(target: LOG_TARGET_STARTUP, "Displays: {} detected", displays.len());
        for (index, disp) in displays.iter().enumerate() {
            tracing::debug!(
                target: LOG_TARGET_STARTUP,
                "  Display {}: {}x{}{}",
                index,
                disp.width,
                disp.height,
                if disp.is_primary { " (primary)" } else { "" }
            );
        }
    }
}

/// Primary display as the desktop rectangle, 1920x1080 when unknown.
fn desktop_rect() -> Rect {
    DisplayInfo::all()
        .ok()
        .and_then(|displays| {
            displays
                .iter()
                .find(|d| d.is_primary)
                .or_else(|| displays.first())
                .map(|d| Rect::new(0, 0, d.width as i32, d.height as i32))
        })
        .unwrap_or(Rect::new(0, 0, 1920, 1080))
}

/// The tour never runs say-all.
struct TourHost;

impl SpeechHost for TourHost {
    fn is_say_all_running(&self) -> bool {
        false
    }
}

struct Options {
    headless: bool,
    generate_sounds: bool,
    steps: usize,
}

impl Options {
    fn from_args() -> AppResult<Self> {
        let mut options = Options {
            headless: false,
            generate_sounds: false,
            steps: DEFAULT_TOUR_STEPS,
        };

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--headless" => options.headless = true,
                "--generate-sounds" => options.generate_sounds = true,
                "--steps" => {
                    let value = args.next().context("--steps needs a number")?;
                    options.steps = value
                        .parse()
                        .with_context(|| format!("invalid --steps value '{}'", value))?;
                }
                other => anyhow::bail!(
                    "unknown argument '{}' (expected --headless, --generate-sounds, --steps N)",
                    other
                ),
            }
        }
        Ok(options)
    }
}

fn open_engine(headless: bool) -> Box<dyn AudioEngine> {
    if headless {
        return Box::new(HeadlessEngine::new());
    }
    match RodioEngine::new() {
        Ok(engine) => Box::new(engine),
        Err(e) => {
            tracing::warn!("No audio output ({}), running headless", e);
            Box::new(HeadlessEngine::new())
        }
    }
}

/// Walk focus over random controls on the desktop.
fn run_tour(dispatcher: &CueDispatcher, policy: AnnouncementPolicy, steps: usize) {
    let desktop = desktop_rect();
    let mut rng = rand::thread_rng();

    tracing::info!(
        "Touring {} controls on a {}x{} desktop",
        steps,
        desktop.width,
        desktop.height
    );

    for step in 0..steps {
        let Some(&role) = TOUR_ROLES.choose(&mut rng) else {
            break;
        };
        let width = rng.gen_range(40..240);
        let height = rng.gen_range(16..64);
        let rect = Rect::new(
            rng.gen_range(0..(desktop.width - width).max(1)),
            rng.gen_range(0..(desktop.height - height).max(1)),
            width,
            height,
        );
        // Revisit the previous control now and then to exercise debounce
        let id = if step > 0 && rng.gen_bool(0.2) { step - 1 } else { step };
        let kind = match rng.gen_range(0..3) {
            0 => EventKind::FocusGained,
            1 => EventKind::NavigatorChanged,
            _ => EventKind::MouseMoved,
        };

        let event = HostEvent::new(
            kind,
            CueTarget::new(id as u64, role, Some(rect)),
            desktop,
            rng.gen_range(40..=100),
        );
        let spoken = if policy.should_announce_role(role, &TourHost) {
            "spoken"
        } else {
            "silent"
        };
        tracing::info!("{} (role name {}) -> {:?}", event.description(), spoken, dispatcher.submit(event));

        thread::sleep(Duration::from_millis(rng.gen_range(60..400)));
    }

    // Let the last cue ring out
    thread::sleep(Duration::from_millis(500));
}

fn main() -> AppResult<()> {
    initialize_tracing();
    log_runtime_environment();

    let options = Options::from_args()?;

    let settings = match CueSettings::load() {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!("Using default settings: {}", e);
            CueSettings::default()
        }
    };
    let sounds_dir = settings.sounds_path().context("locating the sounds directory")?;

    if options.generate_sounds {
        generate_placeholder_assets(&sounds_dir)
            .with_context(|| format!("writing placeholder sounds to {}", sounds_dir.display()))?;
    }

    let engine = open_engine(options.headless);
    let registry = EmitterRegistry::build(engine, &settings, &sounds_dir)
        .inspect_err(|e| {
            tracing::error!("Cue engine failed to start: {}", e);
            if !sounds_dir.exists() {
                tracing::error!("Run with --generate-sounds to create placeholder sounds");
            }
        })
        .context("building role emitters")?;

    let controller = Arc::new(PlaybackController::new(registry, &settings));
    let dispatcher = CueDispatcher::new(Arc::clone(&controller)).context("starting dispatcher")?;

    run_tour(&dispatcher, AnnouncementPolicy::from_settings(&settings), options.steps);

    dispatcher.shutdown();
    Ok(())
}
