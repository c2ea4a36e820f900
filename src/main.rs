//! Headless driver for a framedit editor.
//!
//! Builds a page with one line-numbered editor, keeps appending lines while
//! its timers run, and reports what the gutter did.
//!
//! ```bash
//! RUST_LOG=framedit_host=debug cargo run -- --lines 40 --grow-every 250 --duration 3000
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use framedit_config::EditorOptions;
use framedit_core::{EditorId, Position, Runtime};
use framedit_host::Placement;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "framedit", about = "Drive a headless framedit editor")]
struct Args {
    /// Editor options file (TOML, or JSON by extension)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Lines in the initial document, unless the options set `content`
    #[arg(short, long, default_value = "20")]
    lines: usize,

    /// Append a line every N ms; 0 disables growth
    #[arg(short, long, default_value = "250")]
    grow_every: u64,

    /// Time to run for, in ms
    #[arg(short, long, default_value = "3000")]
    duration: u64,

    /// Print the frame's generated document
    #[arg(long)]
    html: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let options = match &args.config {
        Some(path) => EditorOptions::load(path)
            .with_context(|| format!("Failed to load editor options from {}", path.display()))?,
        None => EditorOptions::default(),
    };
    let mut config = options.resolve();
    config.line_numbers = true;
    if config.content.is_none() {
        config.content = Some(
            (1..=args.lines)
                .map(|n| format!("line {n}"))
                .collect::<Vec<_>>()
                .join("\n"),
        );
    }

    let mut runtime = Runtime::new()?;
    let body = runtime.page().body();
    let id = runtime.create(Placement::Append(body), config)?;
    runtime.mark_loaded(id)?;
    runtime.init(id, None)?;
    tracing::info!("Running {} for {}ms", id, args.duration);

    let mut elapsed = 0;
    while elapsed < args.duration {
        let remaining = args.duration - elapsed;
        let step = match args.grow_every {
            0 => remaining,
            every => every.min(remaining),
        };
        let handled = runtime.advance(step).await?;
        tracing::debug!("Handled {} timer events by {}ms", handled, elapsed + step);
        elapsed += step;
        if args.grow_every > 0 {
            append_line(&mut runtime, id)?;
        }
    }
    runtime.reflow();

    let editor = runtime.editor(id)?;
    let lines = editor.line_number(editor.last_line());
    if let Some(gutter) = editor.host().gutter() {
        tracing::info!(
            "Gutter is {:?} with {} cells for {} lines",
            gutter.phase(),
            gutter.cell_count(),
            lines
        );
    }
    println!("lines:        {lines}");
    match editor.host().gutter() {
        Some(gutter) => {
            println!("gutter:       {:?}", gutter.phase());
            println!("cells:        {}", gutter.cell_count());
            println!("next number:  {}", gutter.next_number());
            if let Some(metrics) = gutter.metrics() {
                println!("line height:  {}px", metrics.line_height);
                println!("top offset:   {}px", metrics.top_offset);
            }
            if let Some(height) = gutter.observed_height() {
                println!("frame body:   {height}px");
            }
        }
        None => println!("gutter:       none"),
    }
    if args.html {
        println!("{}", editor.host().document().to_html());
    }

    runtime.dispose(id)?;
    Ok(())
}

fn append_line(runtime: &mut Runtime, id: EditorId) -> Result<()> {
    let editor = runtime.editor_mut(id)?;
    let last = editor.last_line();
    if !last.is_valid() {
        editor.set_code("line 1")?;
        return Ok(());
    }
    let number = editor.line_number(last) + 1;
    let end = editor.line_content(last)?.chars().count();
    editor.replace_chars(&format!("\nline {number}"), Position::new(last, end), None)?;
    Ok(())
}
