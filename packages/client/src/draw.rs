//! Interactive boundary drawing on a console canvas.
//!
//! Each prompt line is one command. Finished and cleared boundaries are
//! printed as GeoJSON feature collections.

use std::sync::{Arc, Mutex};

use geojson::{FeatureCollection, GeoJson};
use geolive_canvas::{BoundingBox, CanvasOptions, LngLat, MapCanvas, MapFeature};
use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::mpsc;

use crate::{console::ConsoleSurface, error::ClientError};

const PROMPT: &str = "draw> ";

pub const HELP: &str = "\
Commands:
  draw                          toggle drawing mode
  click <lng> <lat>             add a vertex (drawing mode only)
  undo                          remove the last vertex
  finish                        close the polygon (3+ vertices)
  clear                         remove the drawn boundary
  fit <w> <s> <e> <n>           frame the camera on a bounding box
  boundary <geojson>|none       show an external boundary
  features <json array>         replace the feature layer
  zoom <level>                  change the map zoom
  help                          show this help
  quit                          exit";

/// One parsed prompt line
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Toggle,
    Click(LngLat),
    Undo,
    Finish,
    Clear,
    Fit(BoundingBox),
    Boundary(Option<GeoJson>),
    Features(Vec<MapFeature>),
    Zoom(f64),
    Help,
    Quit,
}

fn parse_numbers<const N: usize>(args: &str, usage: &str) -> Result<[f64; N], ClientError> {
    let values: Vec<f64> = args
        .split_whitespace()
        .map(str::parse)
        .collect::<Result<_, _>>()
        .map_err(|_| ClientError::InvalidCommand(format!("usage: {}", usage)))?;
    values
        .try_into()
        .map_err(|_| ClientError::InvalidCommand(format!("usage: {}", usage)))
}

/// Parse one prompt line.
pub fn parse_command(line: &str) -> Result<DrawCommand, ClientError> {
    let line = line.trim();
    let (name, args) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let args = args.trim();

    match name {
        "draw" | "toggle" => Ok(DrawCommand::Toggle),
        "click" => {
            let [lng, lat] = parse_numbers::<2>(args, "click <lng> <lat>")?;
            Ok(DrawCommand::Click(LngLat::new(lng, lat)))
        }
        "undo" => Ok(DrawCommand::Undo),
        "finish" => Ok(DrawCommand::Finish),
        "clear" => Ok(DrawCommand::Clear),
        "fit" => {
            let bbox = parse_numbers::<4>(args, "fit <w> <s> <e> <n>")?;
            Ok(DrawCommand::Fit(BoundingBox::from_array(bbox)))
        }
        "boundary" if args == "none" => Ok(DrawCommand::Boundary(None)),
        "boundary" => args
            .parse::<GeoJson>()
            .map(|g| DrawCommand::Boundary(Some(g)))
            .map_err(|e| ClientError::InvalidCommand(format!("invalid GeoJSON: {}", e))),
        "features" => serde_json::from_str::<Vec<MapFeature>>(args)
            .map(DrawCommand::Features)
            .map_err(|e| ClientError::InvalidCommand(format!("invalid features: {}", e))),
        "zoom" => {
            let [zoom] = parse_numbers::<1>(args, "zoom <level>")?;
            Ok(DrawCommand::Zoom(zoom))
        }
        "help" | "?" => Ok(DrawCommand::Help),
        "quit" | "exit" => Ok(DrawCommand::Quit),
        other => Err(ClientError::InvalidCommand(format!(
            "unknown command '{}' (try 'help')",
            other
        ))),
    }
}

/// Result of one command
#[derive(Debug, Default, PartialEq)]
pub struct Reply {
    pub lines: Vec<String>,
    pub quit: bool,
}

/// A canvas plus the boundaries it has emitted.
pub struct DrawSession {
    canvas: MapCanvas<ConsoleSurface>,
    emitted: Arc<Mutex<Vec<FeatureCollection>>>,
}

impl DrawSession {
    pub fn new(zoom: f64) -> Self {
        let emitted = Arc::new(Mutex::new(Vec::new()));
        let sink = emitted.clone();
        let canvas = MapCanvas::new(ConsoleSurface::new(zoom), CanvasOptions::default())
            .with_draw_listener(Box::new(move |collection| {
                sink.lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .push(collection);
            }));
        Self { canvas, emitted }
    }

    pub fn canvas(&self) -> &MapCanvas<ConsoleSurface> {
        &self.canvas
    }

    /// Parse and run one prompt line.
    pub fn handle_line(&mut self, line: &str) -> Result<Reply, ClientError> {
        let command = parse_command(line)?;
        Ok(self.execute(command))
    }

    /// Run one command and collect what it printed.
    pub fn execute(&mut self, command: DrawCommand) -> Reply {
        let mut reply = Reply::default();
        match command {
            DrawCommand::Toggle => {
                let active = self.canvas.toggle_draw();
                reply.lines.push(format!(
                    "drawing {}",
                    if active { "on" } else { "off" }
                ));
            }
            DrawCommand::Click(point) => {
                if self.canvas.draw_state().is_active() {
                    self.canvas.pointer_click(point);
                } else {
                    reply.lines.push("not drawing (use 'draw')".to_string());
                }
            }
            DrawCommand::Undo => {
                if !self.canvas.undo_last_vertex() {
                    reply.lines.push("nothing to undo".to_string());
                }
            }
            DrawCommand::Finish => {
                if !self.canvas.finish_drawing() {
                    reply
                        .lines
                        .push("need at least 3 distinct vertices to finish".to_string());
                }
            }
            DrawCommand::Clear => self.canvas.clear_boundary(),
            DrawCommand::Fit(bbox) => self.canvas.fit_to_bounds(bbox),
            DrawCommand::Boundary(boundary) => self.canvas.set_boundary(boundary),
            DrawCommand::Features(features) => self.canvas.set_features(&features),
            DrawCommand::Zoom(zoom) => {
                self.canvas.surface_mut().set_zoom(zoom);
                reply.lines.push(format!("zoom {}", zoom));
            }
            DrawCommand::Help => reply.lines.push(HELP.to_string()),
            DrawCommand::Quit => reply.quit = true,
        }

        let mut lines = self.canvas.surface_mut().take_output();
        lines.append(&mut reply.lines);
        for collection in self.take_emitted() {
            match serde_json::to_string(&collection) {
                Ok(json) => lines.push(json),
                Err(e) => tracing::warn!("Failed to serialize boundary: {}", e),
            }
        }
        reply.lines = lines;
        reply
    }

    fn take_emitted(&self) -> Vec<FeatureCollection> {
        std::mem::take(&mut *self.emitted.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

/// Run the interactive drawing prompt until `quit`, EOF or Ctrl+C.
pub async fn run_draw(zoom: f64) -> Result<(), ClientError> {
    let mut session = DrawSession::new(zoom);

    println!("Boundary drawing. Type 'help' for commands, 'quit' to exit.");

    // Create channel for rustyline input
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();

    // Spawn a blocking thread for rustyline (synchronous readline)
    std::thread::spawn(move || {
        let mut editor = match DefaultEditor::new() {
            Ok(editor) => editor,
            Err(e) => {
                tracing::error!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match editor.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    editor.add_history_entry(line).ok();
                    if input_tx.send(line.to_string()).is_err() {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = input_rx.recv() => {
                let Some(line) = line else { break };
                match session.handle_line(&line) {
                    Ok(reply) => {
                        for output in &reply.lines {
                            println!("{}", output);
                        }
                        if reply.quit {
                            break;
                        }
                    }
                    Err(e) => println!("{}", e),
                }
            }
        }
    }

    tracing::debug!("Drawing prompt closed");
    Ok(())
}
