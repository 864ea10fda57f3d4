use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// Shell events
#[derive(Debug)]
pub enum Event {
  /// A line typed by the user
  Line(String),
  /// Input closed
  Eof,
}

/// Event handler that produces events from stdin lines
pub struct EventHandler {
  rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
  pub fn new() -> Self {
    let (tx, rx) = mpsc::unbounded_channel();

    // Spawn stdin reader
    tokio::spawn(async move {
      let mut lines = BufReader::new(tokio::io::stdin()).lines();
      loop {
        match lines.next_line().await {
          Ok(Some(line)) => {
            if tx.send(Event::Line(line)).is_err() {
              break;
            }
          }
          Ok(None) | Err(_) => {
            let _ = tx.send(Event::Eof);
            break;
          }
        }
      }
    });

    Self { rx }
  }

  /// Receive the next event
  pub async fn next(&mut self) -> Option<Event> {
    self.rx.recv().await
  }
}
