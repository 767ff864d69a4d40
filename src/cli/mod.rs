use clap::{Parser, Subcommand};
use dialoguer::theme::ColorfulTheme;
use std::error::Error;
use std::io::{stderr, stdout, Write};
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::engine::{
  counts, new as new_engine, Confirm, Erledigt, FileStore, FilterMode, Notification, Store, TaskId,
  Tracker,
};

#[derive(Debug, Parser)]
#[command(name = "erledigt", author, version, about)]
struct Opts {
  #[arg(long, short, env = "ERLEDIGT_DIR")]
  /// Directory holding the task file. Defaults to the platform data directory.
  dir: Option<PathBuf>,

  #[command(subcommand)]
  cmd: Option<Cmd>,
}

#[derive(Debug, Subcommand)]
enum Cmd {
  #[command(visible_alias = "ls")]
  /// List tasks
  List {
    #[arg(long, short, default_value_t)]
    /// Which tasks to show: all, active, completed or deleted
    filter: FilterMode,
    #[arg(long)]
    /// Print how many tasks each filter shows
    summary: bool,
  },

  /// Add a new task
  Add {
    #[arg(required = true, num_args = 1..)]
    text: Vec<String>,
  },

  #[command(visible_alias = "do")]
  /// Mark a task as completed, or as active again
  Toggle { id: TaskId },

  #[command(visible_alias = "rm")]
  /// Move a task to the trash
  Delete { id: TaskId },

  /// Take a task out of the trash
  Restore { id: TaskId },

  /// Change the text of a task
  Edit {
    id: TaskId,
    #[arg(required = true, num_args = 1..)]
    text: Vec<String>,
  },

  /// Move every task to the trash
  TrashAll {
    #[arg(long, short)]
    yes: bool,
  },

  /// Permanently remove everything in the trash
  Purge {
    #[arg(long, short)]
    yes: bool,
  },

  /// Empty the trash when filtering deleted tasks, trash everything otherwise
  Clear {
    #[arg(long, short, default_value_t)]
    filter: FilterMode,
    #[arg(long, short)]
    yes: bool,
  },

  /// Mark every task as completed
  DoneAll,

  /// Mark every task as active
  ActiveAll,

  /// Take everything out of the trash
  RestoreAll {
    #[arg(long, short)]
    yes: bool,
  },
}

impl Cmd {
  pub const fn readonly(&self) -> bool {
    matches!(self, Self::List { .. })
  }

  pub const fn assume_yes(&self) -> bool {
    match self {
      Self::TrashAll { yes }
      | Self::Purge { yes }
      | Self::Clear { yes, .. }
      | Self::RestoreAll { yes } => *yes,
      _ => false,
    }
  }
}

#[derive(Debug)]
struct Prompter {
  assume_yes: bool,
}

impl Confirm for Prompter {
  fn confirm(&mut self, prompt: &str) -> bool {
    if self.assume_yes {
      return true;
    }
    dialoguer::Confirm::with_theme(&ColorfulTheme::default())
      .with_prompt(prompt)
      .default(false)
      .interact()
      .unwrap_or_else(|err| {
        warn!(%err, "could not ask for confirmation");
        false
      })
  }
}

pub fn default_dir() -> PathBuf {
  dirs::data_dir().map_or_else(|| PathBuf::from(".erledigt"), |dir| dir.join("erledigt"))
}

fn install_tracing() {
  // RUST_LOG overrides; notifications already reach the user, so stay quiet by default.
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
  let _ = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_target(false)
    .with_writer(stderr)
    .compact()
    .try_init();
}

pub fn cli() -> Result<(), Box<dyn Error>> {
  let opts = Opts::parse();
  install_tracing();
  let dir = opts.dir.unwrap_or_else(default_dir);
  handle_command(&opts.cmd, new_engine(FileStore::new(dir), Vec::new()))
}

fn handle_command<S: Store>(
  command: &Option<Cmd>,
  mut app: Tracker<S, Vec<Notification>>,
) -> Result<(), Box<dyn Error>> {
  let default = Cmd::List {
    filter: FilterMode::All,
    summary: atty::is(atty::Stream::Stdout),
  };
  let cmd = command.as_ref().unwrap_or(&default);
  let mut confirm = Prompter {
    assume_yes: cmd.assume_yes(),
  };
  if cmd.readonly() {
    handle_command_impl(cmd, &mut app, &mut confirm, &mut stdout())
  } else {
    handle_command_impl(cmd, &mut app, &mut confirm, &mut stderr())
  }
}

fn handle_command_impl<S: Store, C: Confirm + ?Sized, W: Write>(
  command: &Cmd,
  app: &mut Tracker<S, Vec<Notification>>,
  confirm: &mut C,
  output: &mut W,
) -> Result<(), Box<dyn Error>> {
  let confirmed = match command {
    Cmd::List { filter, summary } => {
      app.set_filter(*filter);
      return list_tasks(app, output, *summary);
    }
    Cmd::Add { text } => {
      let text = text.join(" ");
      if text.trim().is_empty() {
        return Err("Task text must not be blank".into());
      }
      app.add(&text).ok_or("No task ids left")?;
      true
    }
    Cmd::Toggle { id } => {
      require_task(app, *id)?;
      if !app.toggle(*id) {
        writeln!(output, "Task {id} is in the trash, restore it first")?;
      }
      true
    }
    Cmd::Delete { id } => {
      require_task(app, *id)?;
      app.delete(*id)
    }
    Cmd::Restore { id } => {
      require_task(app, *id)?;
      app.restore(*id)
    }
    Cmd::Edit { id, text } => {
      require_task(app, *id)?;
      if !app.edit(*id, &text.join(" ")) {
        writeln!(output, "Nothing to update")?;
      }
      true
    }
    Cmd::TrashAll { .. } => app.trash_all(confirm).is_some(),
    Cmd::Purge { .. } => app.purge_trash(confirm).is_some(),
    Cmd::Clear { filter, .. } => {
      app.set_filter(*filter);
      app.clear_all(confirm).is_some()
    }
    Cmd::DoneAll => {
      app.make_all_done();
      true
    }
    Cmd::ActiveAll => {
      app.make_all_active();
      true
    }
    Cmd::RestoreAll { .. } => app.restore_all(confirm).is_some(),
  };
  if !confirmed {
    writeln!(output, "Cancelled")?;
  }
  for notification in app.notifier_mut().drain(..) {
    writeln!(output, "{notification}")?;
  }
  if app.store().last_save_failed() {
    return Err("Could not save tasks".into());
  }
  Ok(())
}

fn require_task<E: Erledigt>(app: &E, id: TaskId) -> Result<(), Box<dyn Error>> {
  app.get(id).ok_or("Task not found")?;
  Ok(())
}

fn list_tasks<E: Erledigt, W: Write>(
  app: &E,
  output: &mut W,
  summary: bool,
) -> Result<(), Box<dyn Error>> {
  let tasks = app.visible();
  if let Some(max_id_len) = tasks.iter().map(|task| task.id.to_string().len()).max() {
    for task in &tasks {
      writeln!(
        output,
        "{:width$} [{}] {}",
        task.id,
        if task.completed { 'x' } else { ' ' },
        task.text,
        width = max_id_len
      )?;
    }
  }
  if summary {
    let counts = counts(app.tasks());
    writeln!(
      output,
      "{} all, {} active, {} completed, {} deleted",
      counts.all, counts.active, counts.completed, counts.deleted
    )?;
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::{handle_command_impl, Cmd};
  use crate::engine::{new as new_engine, FilterMode, MemStore, TaskId, STORAGE_KEY};
  use pretty_assertions::assert_eq;
  use regex::Regex;
  use std::str::FromStr;

  fn exec_command(cmd: Cmd, blob: &str, answer: bool) -> (String, String) {
    let store = if blob.is_empty() {
      MemStore::new()
    } else {
      MemStore::with_entry(STORAGE_KEY, blob)
    };
    let mut app = new_engine(store, Vec::new());
    let mut confirm = answer;
    let mut output = Vec::new();
    handle_command_impl(&cmd, &mut app, &mut confirm, &mut output).unwrap();
    let blob_out = app.into_store().entry(STORAGE_KEY).unwrap_or_default().to_owned();
    (blob_out, String::from_utf8(output).unwrap())
  }

  fn list(filter: FilterMode) -> Cmd {
    Cmd::List {
      filter,
      summary: false,
    }
  }

  fn id(s: &str) -> TaskId {
    TaskId::from_str(s).unwrap()
  }

  #[test]
  fn test_handle_command_impl() {
    let (blob, output) = exec_command(list(FilterMode::All), "", false);
    assert_eq!(output, "");
    assert_eq!(blob, "");

    let (blob, output) = exec_command(
      Cmd::Add {
        text: vec!["buy".into(), "milk".into()],
      },
      &blob,
      false,
    );
    assert_eq!(output, "[success] Added \"buy milk\"\n");
    assert_eq!(
      blob,
      r#"[{"id":1,"text":"buy milk","completed":false,"is_deleted":false}]"#
    );

    let (blob, output) = exec_command(Cmd::Toggle { id: id("1") }, &blob, false);
    assert_eq!(output, "[info] Completed \"buy milk\"\n");

    let (blob, output) = exec_command(Cmd::Delete { id: id("1") }, &blob, false);
    assert_eq!(output, "[warning] Deleted \"buy milk\"\n");

    let (_, output) = exec_command(list(FilterMode::All), &blob, false);
    assert_eq!(output, "");
    let (_, output) = exec_command(list(FilterMode::Deleted), &blob, false);
    assert_eq!(output, "1 [x] buy milk\n");

    let (blob, output) = exec_command(Cmd::Restore { id: id("1") }, &blob, false);
    assert_eq!(output, "[success] Restored \"buy milk\"\n");
    let (_, output) = exec_command(list(FilterMode::Completed), &blob, false);
    assert_eq!(output, "1 [x] buy milk\n");

    let (blob, output) = exec_command(
      Cmd::Edit {
        id: id("1"),
        text: vec!["buy oat milk".into()],
      },
      &blob,
      false,
    );
    assert_eq!(
      output,
      "[info] Updated \"buy milk\" → \"buy oat milk\"\n"
    );

    let (new_blob, output) = exec_command(
      Cmd::Clear {
        filter: FilterMode::All,
        yes: false,
      },
      &blob,
      false,
    );
    assert_eq!(output, "Cancelled\n");
    assert_eq!(new_blob, blob);

    let (blob, output) = exec_command(
      Cmd::Clear {
        filter: FilterMode::All,
        yes: true,
      },
      &blob,
      true,
    );
    assert_eq!(output, "[warning] Moved all items to trash\n");

    let (blob, output) = exec_command(Cmd::Purge { yes: true }, &blob, true);
    assert_eq!(
      output,
      "[warning] Permanently deleted all items from trash\n"
    );
    assert_eq!(blob, "[]");
  }

  #[test]
  fn unknown_ids_are_reported() {
    let mut app = new_engine(MemStore::new(), Vec::new());
    let mut output = Vec::new();
    let err = handle_command_impl(
      &Cmd::Toggle { id: TaskId(7) },
      &mut app,
      &mut false,
      &mut output,
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "Task not found");
    assert!(output.is_empty());
  }

  #[test]
  fn blank_add_is_an_error() {
    let mut app = new_engine(MemStore::new(), Vec::new());
    let err = handle_command_impl(
      &Cmd::Add {
        text: vec!["  ".into()],
      },
      &mut app,
      &mut false,
      &mut Vec::new(),
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "Task text must not be blank");
  }

  #[test]
  fn add_without_free_ids_is_an_error() {
    let blob = r#"[{"id":18446744073709551615,"text":"x","completed":false,"is_deleted":false}]"#;
    let mut app = new_engine(MemStore::with_entry(STORAGE_KEY, blob), Vec::new());
    let err = handle_command_impl(
      &Cmd::Add {
        text: vec!["y".into()],
      },
      &mut app,
      &mut false,
      &mut Vec::new(),
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "No task ids left");
  }

  #[test]
  fn summary_and_padding() {
    let blob = r#"[
      {"id":9,"text":"nine","completed":true,"is_deleted":false},
      {"id":10,"text":"ten","completed":false,"is_deleted":false},
      {"id":11,"text":"gone","completed":false,"is_deleted":true}
    ]"#;
    let (_, output) = exec_command(
      Cmd::List {
        filter: FilterMode::All,
        summary: true,
      },
      blob,
      false,
    );
    assert_eq!(
      output,
      " 9 [x] nine\n10 [ ] ten\n2 all, 1 active, 1 completed, 1 deleted\n"
    );
  }

  #[test]
  fn legacy_records_get_timestamp_ids() {
    let (_, output) = exec_command(list(FilterMode::All), r#"[{"text":"legacy"}]"#, false);
    let r = Regex::new(r"^[0-9]{13,} \[ \] legacy\n$").unwrap();
    assert!(r.is_match(&output), "unexpected output: {output}");
  }

  #[test]
  fn toggling_trashed_task_is_explained() {
    let blob = r#"[{"id":1,"text":"x","completed":false,"is_deleted":true}]"#;
    let (new_blob, output) = exec_command(Cmd::Toggle { id: TaskId(1) }, blob, false);
    assert_eq!(output, "Task 1 is in the trash, restore it first\n");
    assert_eq!(new_blob, blob);
  }

  #[test]
  fn only_gated_commands_assume_yes() {
    assert!(Cmd::RestoreAll { yes: true }.assume_yes());
    assert!(!Cmd::RestoreAll { yes: false }.assume_yes());
    assert!(!Cmd::DoneAll.assume_yes());
    assert!(list(FilterMode::Active).readonly());
    assert!(!Cmd::ActiveAll.readonly());
  }
}
