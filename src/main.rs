use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseEvent,
    MouseEventKind,
};
use crossterm::execute;
use faculty_map::app::App;
use faculty_map::config::Config;
use faculty_map::ui;
use ratatui::DefaultTerminal;
use std::fs::File;
use std::path::Path;
use std::time::Duration;

fn main() -> Result<()> {
    let config = Config::parse();
    init_logging(&config.log_file)?;

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;

    // Mouse capture for hover tracking
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = run(&mut terminal, config);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// Send log output to a file; stderr belongs to the UI
fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("creating log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::Moved | MouseEventKind::Drag(_) => app.hover_at(mouse.column, mouse.row),
        _ => {}
    }
}

fn run(terminal: &mut DefaultTerminal, config: Config) -> Result<()> {
    let size = terminal.size()?;
    let mut app = App::new(config, size.width, size.height);

    // First render shows every university
    app.request_render(None);

    loop {
        app.poll_renders();

        terminal.draw(|frame| ui::render(frame, &app))?;

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) => {
                    // Only handle key press events (not release)
                    if key.kind == KeyEventKind::Press {
                        match key.code {
                            KeyCode::Char('q') | KeyCode::Esc => app.quit(),
                            KeyCode::Char('r') => app.reload(),

                            // Range inputs
                            KeyCode::Tab | KeyCode::BackTab => app.focus_next(),
                            KeyCode::Char(c) if c.is_ascii_digit() || c == '-' => app.type_char(c),
                            KeyCode::Backspace => app.backspace(),
                            KeyCode::Enter => app.commit_input(),
                            KeyCode::Up => app.step_input(1),
                            KeyCode::Down => app.step_input(-1),

                            _ => {}
                        }
                    }
                }
                Event::Mouse(mouse) => handle_mouse(&mut app, mouse),
                Event::Resize(width, height) => app.resize(width, height),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
