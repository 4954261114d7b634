use std::io::{self, Write as _};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    terminal::{
        disable_raw_mode, enable_raw_mode, BeginSynchronizedUpdate, EndSynchronizedUpdate,
        EnterAlternateScreen, LeaveAlternateScreen, SetTitle,
    },
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;

use shx::app::{open_files, DisplayMode, Session};
use shx::ui::Theme;

/// Split-pane terminal hex editor
#[derive(Parser, Debug)]
#[command(name = "shx")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Files to open
    #[arg(value_name = "FILE", required = true)]
    files: Vec<PathBuf>,

    /// Monochrome display
    #[arg(long)]
    mono: bool,

    /// Interpret integers as big-endian
    #[arg(long)]
    big_endian: bool,

    /// Initial display mode
    #[arg(long, value_enum, default_value_t = Mode::Pattern)]
    mode: Mode,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    Pattern,
    Int,
    Uint,
    Char,
}

impl From<Mode> for DisplayMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Pattern => DisplayMode::Pattern,
            Mode::Int => DisplayMode::SignedInt,
            Mode::Uint => DisplayMode::UnsignedInt,
            Mode::Char => DisplayMode::Char,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    shx::logging::init_logging().context("failed to initialize logging")?;

    let (mut views, errors) = open_files(&args.files);
    for view in &mut views {
        view.set_mode(args.mode.into());
        view.set_big_endian(args.big_endian);
    }
    let theme = if args.mono { Theme::monochrome() } else { Theme::default() };
    let errors: Vec<String> = errors.iter().map(ToString::to_string).collect();

    // 1つも開けなければ端末を切り替える前に終了
    let Some(session) = Session::new(views, theme) else {
        for error in &errors {
            eprintln!("shx: {}", error);
        }
        std::process::exit(1);
    };
    let session = session.with_startup_errors(errors);

    // ターミナルの初期化
    // クリックでのペイン選択・ホイールスクロールのためマウスを有効にする
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, session);

    // ターミナルの後処理
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableMouseCapture, LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, mut session: Session) -> Result<()> {
    info!(files = session.views().len(), "session started");
    let mut title_view = None;

    // メインループ
    loop {
        if title_view != Some(session.focused()) {
            title_view = Some(session.focused());
            update_title(terminal.backend_mut(), &session)?;
        }

        // Synchronized Update: 描画のちらつきを防止
        queue!(terminal.backend_mut(), BeginSynchronizedUpdate)?;
        terminal.draw(|f| session.draw(f)).context("failed to draw")?;
        queue!(terminal.backend_mut(), EndSynchronizedUpdate)?;
        terminal.backend_mut().flush()?;

        session.handle_event()?;

        if session.should_quit() {
            break;
        }
    }

    Ok(())
}

/// ウィンドウタイトルを更新
fn update_title(backend: &mut CrosstermBackend<io::Stdout>, session: &Session) -> Result<()> {
    let document = session.focused_view().document();
    let title = match document.path() {
        Some(path) => format!("shx - {}", path.display()),
        None => format!("shx - {}", document.name()),
    };
    execute!(backend, SetTitle(&title))?;
    Ok(())
}
