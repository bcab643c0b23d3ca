use std::io;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mark_vanish::files::write_png;
use mark_vanish::{
    download_file_name, shell, Action, App, Config, Corner, FileStorage, GeminiClient, History,
    LocalFiles, Rect, Screen, Session, Size,
};

#[derive(Parser)]
#[command(
    name = "mark-vanish",
    about = "Select a watermark region and have Gemini inpaint it away",
    version,
    after_help = "Simple usage: mark-vanish remove <image> --preset br\n\n\
                  Requires GEMINI_API_KEY (or API_KEY) in the environment or a .env file.\n\
                  Only the selection's coarse position is sent to the model, not its exact size."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Model to use instead of the default
    #[arg(long, global = true)]
    model: Option<String>,

    /// Directory holding the history file
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Remove a mark from one image
    Remove {
        /// Input image file
        input: PathBuf,

        /// Selection as x,y,width,height in container pixels
        #[arg(long, required_unless_present = "preset", conflicts_with = "preset")]
        rect: Option<Rect>,

        /// Corner preset (tl, tr, bl, br)
        #[arg(short, long)]
        preset: Option<Corner>,

        /// Displayed container size as WxH (default: image size)
        #[arg(long)]
        container: Option<Size>,

        /// Output file (default: vanished-{timestamp}.png in the download directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List recent edits or export one of them
    History {
        /// Entry number to export (1 = most recent)
        #[arg(long)]
        open: Option<usize>,

        /// Export the original instead of the processed image
        #[arg(long, requires = "open")]
        original: bool,

        /// Output file for the exported image
        #[arg(short, long, requires = "open")]
        output: Option<PathBuf>,
    },

    /// Interactive editing shell
    Shell {
        /// Image to load on start
        image: Option<PathBuf>,
    },
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let mut config = Config::from_env();
    if let Some(model) = &cli.model {
        config.model.clone_from(model);
    }
    if let Some(dir) = &cli.data_dir {
        config.data_dir.clone_from(dir);
    }

    let code = match cli.command {
        Command::Remove {
            ref input,
            rect,
            preset,
            container,
            ref output,
        } => run_remove(&config, &cli, input, rect, preset, container, output.as_deref()),
        Command::History {
            open,
            original,
            ref output,
        } => run_history(&config, &cli, open, original, output.as_deref()),
        Command::Shell { ref image } => run_shell(&config, image.as_deref()),
    };
    process::exit(code);
}

fn build_app(config: &Config) -> App<GeminiClient, FileStorage, LocalFiles> {
    let client = match GeminiClient::new(config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Fatal: Failed to initialize client: {e}");
            process::exit(1);
        }
    };
    App::new(
        client,
        FileStorage::new(&config.data_dir),
        LocalFiles::new(&config.download_dir),
    )
}

#[allow(clippy::too_many_arguments)]
fn run_remove(
    config: &Config,
    cli: &Cli,
    input: &Path,
    rect: Option<Rect>,
    preset: Option<Corner>,
    container: Option<Size>,
    output: Option<&Path>,
) -> i32 {
    if !input.exists() {
        eprintln!("Error: Input path does not exist: {}", input.display());
        return 1;
    }
    if !config.has_api_key() {
        eprintln!("Error: {}", mark_vanish::Error::MissingApiKey);
        return 1;
    }

    let mut app = build_app(config);
    if let Err(e) = app.upload(input) {
        eprintln!("[FAIL] {}: {e}", input.display());
        return 1;
    }
    if let Some(size) = container {
        app.dispatch(Action::Resize(size));
    }
    match (rect, preset) {
        (Some(r), _) => app.dispatch(Action::Select(r)),
        (None, Some(corner)) => app.dispatch(Action::Preset(corner)),
        (None, None) => {}
    }

    if !app.session().can_submit() {
        eprintln!("Error: Selection must be at least 5 pixels wide");
        return 1;
    }
    if !cli.quiet {
        eprintln!("Gemini is healing the image...");
    }
    app.dispatch(Action::Submit);

    if app.session().screen() != Screen::Result {
        let message = app.session().error().unwrap_or("unknown error");
        eprintln!("[FAIL] {}: {message}", input.display());
        return 1;
    }

    let saved = match output {
        Some(path) => app
            .session()
            .result()
            .map_or(Ok(None), |img| write_png(img, path).map(|()| Some(path.to_path_buf()))),
        None => app.download(),
    };
    match saved {
        Ok(Some(path)) => {
            if !cli.quiet {
                eprintln!("[OK] {} -> {}", input.display(), path.display());
            }
            0
        }
        Ok(None) => 0,
        Err(e) => {
            eprintln!("[FAIL] Failed to save: {e}");
            1
        }
    }
}

fn run_history(
    config: &Config,
    cli: &Cli,
    open: Option<usize>,
    original: bool,
    output: Option<&Path>,
) -> i32 {
    let history = History::load(&FileStorage::new(&config.data_dir));

    let Some(n) = open else {
        if !cli.quiet {
            print!("{}", shell::render_history(&Session::new(history)));
        }
        return 0;
    };

    let Some(entry) = n.checked_sub(1).and_then(|i| history.get(i)) else {
        eprintln!("Error: No history entry {n} ({} stored)", history.len());
        return 1;
    };
    let image = if original {
        &entry.original_image
    } else {
        &entry.processed_image
    };
    let path = output.map_or_else(
        || config.download_dir.join(download_file_name(entry.timestamp)),
        Path::to_path_buf,
    );
    match write_png(image, &path) {
        Ok(()) => {
            if !cli.quiet {
                eprintln!("[OK] {}", path.display());
            }
            0
        }
        Err(e) => {
            eprintln!("[FAIL] Failed to save: {e}");
            1
        }
    }
}

fn run_shell(config: &Config, image: Option<&Path>) -> i32 {
    let mut app = build_app(config);
    if let Some(path) = image {
        // shown on the first rendered screen
        let _ = app.upload(path);
    }
    let stdin = io::stdin();
    match shell::run(&mut app, stdin.lock(), io::stdout()) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {e}");
            1
        }
    }
}
