use color_eyre::Result;
use rust_decimal::Decimal;
use std::io::{stdout, Write};
use std::sync::Arc;
use tracing::info;

use txreview::api::{Employee, FixtureBackend, Transaction};
use txreview::cache::ResponseCache;
use txreview::config::Config;
use txreview::error::SyncError;
use txreview::sync::{ActiveMode, SyncOrchestrator};

use crate::commands::{self, CommandKind, COMMANDS};
use crate::event::{Event, EventHandler};

/// Interactive shell over the synchronization engine
pub struct App {
  sync: SyncOrchestrator,
  should_quit: bool,
}

impl App {
  pub fn new(config: &Config) -> Result<Self> {
    let backend = FixtureBackend::load(config.fixture_path()?)?
      .with_page_size(config.page_size)
      .with_latency(config.latency());
    let cache = if config.cache.enabled {
      ResponseCache::in_memory()
    } else {
      ResponseCache::disabled()
    };

    Ok(Self {
      sync: SyncOrchestrator::new(Arc::new(backend), cache),
      should_quit: false,
    })
  }

  pub async fn run(&mut self) -> Result<()> {
    let mut events = EventHandler::new();

    // Initial data load
    if let Err(err) = self.sync.bootstrap().await {
      report(&err)?;
    }
    self.render_view()?;
    prompt()?;

    while !self.should_quit {
      match events.next().await {
        Some(Event::Line(line)) => {
          self.execute(&line).await?;
          if !self.should_quit {
            prompt()?;
          }
        }
        Some(Event::Eof) | None => break,
      }
    }

    info!("shell closed");
    Ok(())
  }

  async fn execute(&mut self, line: &str) -> Result<()> {
    let Some((cmd, args)) = commands::parse(line) else {
      if !line.trim().is_empty() {
        println!("unknown command: {} (try `help`)", line.trim());
      }
      return Ok(());
    };

    let result = match cmd.kind {
      CommandKind::View => Ok(()),
      CommandKind::Employees => return self.render_employees(),
      CommandKind::Select => {
        let target = args.first().copied().filter(|id| *id != "all");
        self.sync.select_employee(target).await
      }
      CommandKind::More => self.sync.load_more().await,
      CommandKind::Approve | CommandKind::Reject => {
        let Some(id) = args.first() else {
          println!("usage: {}", cmd.usage);
          return Ok(());
        };
        self
          .sync
          .confirm_approval(id, cmd.kind == CommandKind::Approve)
          .await
      }
      CommandKind::Refresh => self.sync.refresh().await,
      CommandKind::Help => return render_help(),
      CommandKind::Quit => {
        self.should_quit = true;
        return Ok(());
      }
    };

    if let Err(err) = result {
      report(&err)?;
    }
    self.render_view()
  }

  fn render_view(&self) -> Result<()> {
    let view = self.sync.merged_view();
    let mut out = stdout().lock();

    if view.transactions.is_empty() {
      writeln!(out, "No transactions available")?;
    }
    for tx in &view.transactions {
      writeln!(out, "{}", format_transaction(tx))?;
    }
    if !view.rejected.is_empty() {
      writeln!(out, "({} invalid records hidden)", view.rejected.len())?;
    }
    let status = status_line(
      &self.sync.mode(),
      view.transactions.len(),
      self.sync.has_more_pages(),
    );
    writeln!(out, "{}", status)?;
    Ok(())
  }

  fn render_employees(&self) -> Result<()> {
    let mut out = stdout().lock();
    let employees = self.sync.employees();
    if employees.is_empty() {
      writeln!(out, "Employees are not loaded yet")?;
    }
    for employee in &employees {
      writeln!(out, "{}", format_employee(employee))?;
    }
    Ok(())
  }
}

fn render_help() -> Result<()> {
  let mut out = stdout().lock();
  for cmd in COMMANDS {
    writeln!(out, "  {:<28} {}", cmd.usage, cmd.description)?;
  }
  Ok(())
}

fn prompt() -> Result<()> {
  let mut out = stdout().lock();
  write!(out, "> ")?;
  out.flush()?;
  Ok(())
}

fn report(err: &SyncError) -> Result<()> {
  writeln!(stdout().lock(), "error: {}", err)?;
  Ok(())
}

fn format_amount(amount: Decimal) -> String {
  if amount.is_sign_negative() {
    format!("-${:.2}", amount.abs())
  } else {
    format!("${:.2}", amount)
  }
}

fn format_transaction(tx: &Transaction) -> String {
  format!(
    "[{}] {:<10} {:<28} {:>12}  {} - {}",
    if tx.approved { 'x' } else { ' ' },
    tx.id,
    tx.merchant,
    format_amount(tx.amount),
    tx.employee.full_name(),
    tx.date.format("%Y-%m-%d"),
  )
}

fn format_employee(employee: &Employee) -> String {
  if employee.is_no_filter() {
    format!("{:<10} {}", "all", employee.full_name())
  } else {
    format!("{:<10} {}", employee.id, employee.full_name())
  }
}

fn status_line(mode: &ActiveMode, count: usize, has_more: bool) -> String {
  let more = match mode {
    ActiveMode::AllTransactions if has_more => " - `more` for the next page",
    ActiveMode::AllTransactions => " - all pages loaded",
    _ => "",
  };
  format!("{} transactions, {}{}", count, mode, more)
}
