use std::{env, fs::File, io::stdout, path::PathBuf, process::ExitCode};

use anyhow::{Context, Result, bail};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{error, info};
use ratatui::{Terminal, backend::CrosstermBackend};
use simplelog::{LevelFilter, WriteLogger};

// Use modules from the library crate
use bookrack::event_source::KeyboardEventSource;
use bookrack::import::import_book;
use bookrack::library::Library;
use bookrack::main_app::{App, run_app_with_event_source};
use bookrack::settings;

struct CliArgs {
    storage_root: Option<PathBuf>,
    import_sources: Vec<PathBuf>,
}

fn parse_args() -> Result<CliArgs> {
    let mut args = env::args().skip(1);
    let mut cli = CliArgs {
        storage_root: None,
        import_sources: Vec::new(),
    };
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--root" => {
                let value = args.next().context("--root requires a directory")?;
                cli.storage_root = Some(PathBuf::from(value));
            }
            "import" => {
                cli.import_sources = args.map(PathBuf::from).collect();
                if cli.import_sources.is_empty() {
                    bail!("import requires at least one source folder");
                }
                break;
            }
            other => bail!("unknown argument: {other}"),
        }
    }
    Ok(cli)
}

fn storage_root(cli: &CliArgs) -> Result<PathBuf> {
    cli.storage_root
        .clone()
        .or_else(settings::get_storage_root)
        .context("could not determine a storage root; pass --root")
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    WriteLogger::init(
        LevelFilter::Debug,
        simplelog::ConfigBuilder::new()
            .set_max_level(LevelFilter::Debug)
            .build(),
        File::create("bookrack.log")?,
    )?;

    // Load settings from ~/.bookrack_settings.yaml
    settings::load_settings();

    let cli = parse_args()?;
    let root = storage_root(&cli)?;
    let library = Library::open(&root)?;

    if !cli.import_sources.is_empty() {
        for source in &cli.import_sources {
            let target = import_book(source, &library)?;
            println!("imported {} -> {}", source.display(), target.display());
        }
        return Ok(());
    }

    info!("Starting Bookrack at {}", root.display());

    // Terminal initialization
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(library);
    let mut event_source = KeyboardEventSource;
    let res = run_app_with_event_source(&mut terminal, &mut app, &mut event_source);

    // Restore terminal state
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!("Application error: {err:?}");
        println!("{err:?}");
    }

    info!("Shutting down Bookrack");
    Ok(())
}
