// File: ./src/cli.rs
//! Command-line parsing and plain-text rendering for the `clientline` binary.
use crate::controller::{AdminTask, Notice, NoticeLevel, TimelineView};
use crate::model::display::{TimelineDisplay, display_class_label};
use crate::model::item::Comment;
use anyhow::{Result, anyhow, bail};
use std::fmt::Write;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Timeline { url: Option<String> },
    Tasks,
    Toggle { task_id: String },
    ResetVisibility,
    Comment {
        task_id: String,
        author: String,
        text: String,
    },
    Approve { task_id: String },
    Comments { task_id: String },
    SetKey { credential: String },
    SetList { list_id: String },
    ShowConfig,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub root: Option<PathBuf>,
    pub command: Command,
}

fn take_value(args: &[String], i: usize, flag: &str) -> Result<String> {
    args.get(i + 1)
        .cloned()
        .ok_or_else(|| anyhow!("{} expects a value", flag))
}

fn single_arg(rest: &[String], name: &str, usage: &str) -> Result<String> {
    match rest {
        [value] => Ok(value.clone()),
        _ => bail!("{} expects exactly one <{}>", usage, name),
    }
}

/// Parses `args` without the program name.
pub fn parse_args(args: &[String]) -> Result<Invocation> {
    let mut root = None;
    let mut words = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-r" | "--root" => {
                root = Some(PathBuf::from(take_value(args, i, "--root")?));
                i += 2;
            }
            "-h" | "--help" | "help" => {
                return Ok(Invocation {
                    root,
                    command: Command::Help,
                });
            }
            _ => {
                words.push(args[i].clone());
                i += 1;
            }
        }
    }

    let Some((name, rest)) = words.split_first() else {
        return Ok(Invocation {
            root,
            command: Command::Timeline { url: None },
        });
    };

    let command = match name.as_str() {
        "timeline" => match rest {
            [] => Command::Timeline { url: None },
            [flag, url] if flag == "--url" => Command::Timeline {
                url: Some(url.clone()),
            },
            _ => bail!("usage: timeline [--url <timeline-url>]"),
        },
        "tasks" => Command::Tasks,
        "toggle" => Command::Toggle {
            task_id: single_arg(rest, "task-id", "toggle")?,
        },
        "reset-visibility" => Command::ResetVisibility,
        "comment" => parse_comment(rest)?,
        "approve" => Command::Approve {
            task_id: single_arg(rest, "task-id", "approve")?,
        },
        "comments" => Command::Comments {
            task_id: single_arg(rest, "task-id", "comments")?,
        },
        "set-key" => Command::SetKey {
            credential: single_arg(rest, "credential", "set-key")?,
        },
        "set-list" => Command::SetList {
            list_id: single_arg(rest, "list-id", "set-list")?,
        },
        "config" => Command::ShowConfig,
        other => bail!("unknown command '{}' (see --help)", other),
    };
    Ok(Invocation { root, command })
}

fn parse_comment(rest: &[String]) -> Result<Command> {
    let Some((task_id, rest)) = rest.split_first() else {
        bail!("usage: comment <task-id> --author <name> <text...>");
    };
    let mut author = None;
    let mut text = Vec::new();
    let mut i = 0;
    while i < rest.len() {
        if rest[i] == "--author" {
            author = Some(take_value(rest, i, "--author")?);
            i += 2;
        } else {
            text.push(rest[i].as_str());
            i += 1;
        }
    }
    Ok(Command::Comment {
        task_id: task_id.clone(),
        author: author.ok_or_else(|| anyhow!("comment requires --author <name>"))?,
        text: text.join(" "),
    })
}

pub fn print_help(binary_name: &str) {
    println!(
        "Clientline v{} - Client-facing project timeline backed by ClickUp",
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("USAGE:");
    println!("    {} [--root <path>] <command>", binary_name);
    println!();
    println!("COMMANDS:");
    println!("    timeline [--url <timeline-url>]        Show visible stages (default command)");
    println!("    tasks                                  List every task with its visibility");
    println!("    toggle <task-id>                       Show or hide a task on the timeline");
    println!("    reset-visibility                       Show every task again");
    println!("    comment <task-id> --author <name> <text...>");
    println!("                                           Add a comment to a stage");
    println!("    approve <task-id>                      Approve a stage as the client");
    println!("    comments <task-id>                     Reload and show a stage's comments");
    println!("    set-key <credential>                   Store the ClickUp API key");
    println!("    set-list <list-id>                     Store the ClickUp list id");
    println!("    config                                 Show the resolved configuration");
    println!();
    println!("OPTIONS:");
    println!("    -r, --root <path>     Use a different directory for config and data.");
    println!("    -h, --help            Show this help message.");
    println!();
    println!("ENVIRONMENT:");
    println!("    CLICKUP_API_KEY       Default API key when none is stored.");
    println!("    CLIENTLINE_LOG        Log level (error, warn, info, debug, trace).");
}

fn render_comment(out: &mut String, comment: &Comment) {
    let _ = write!(out, "      {} {}", comment.status_symbol(), comment.author);
    if !comment.date.is_empty() {
        let _ = write!(out, " ({})", comment.date);
    }
    let badge = comment.badge();
    if !badge.is_empty() {
        let _ = write!(out, " [{}]", badge);
    }
    let _ = writeln!(out);
    for line in comment.text.lines() {
        let _ = writeln!(out, "        {}", line);
    }
}

pub fn render_comments(comments: &[Comment]) -> String {
    let mut out = String::new();
    if comments.is_empty() {
        out.push_str("      (no comments)\n");
    }
    for comment in comments {
        render_comment(&mut out, comment);
    }
    out
}

pub fn render_timeline(view: &TimelineView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", view.list_name);
    if let Some(content) = view.list_content.as_deref().filter(|c| !c.trim().is_empty()) {
        let _ = writeln!(out, "{}", content.trim());
    }
    let _ = writeln!(out);

    let summary = view.summary();
    let _ = writeln!(
        out,
        "Progress: {}% ({} of {} completed, {} pending)",
        summary.completion_percentage, summary.completed, summary.total, summary.pending
    );
    for stage in &summary.active {
        let _ = writeln!(
            out,
            "  In progress: {} [{}]",
            stage.title,
            display_class_label(stage.display_class)
        );
    }
    let _ = writeln!(out);

    let mut shown = 0;
    for item in view.visible_items() {
        shown += 1;
        let _ = write!(out, "{} {}  [{}]", item.status_symbol(), item.title, item.badge());
        if item.is_approved() {
            let _ = write!(out, "  (aprovado)");
        }
        let _ = writeln!(out);
        if !item.date.is_empty() {
            let _ = writeln!(out, "    {}", item.date);
        }
        if !item.description.trim().is_empty() {
            for line in item.description.trim().lines() {
                let _ = writeln!(out, "    {}", line);
            }
        }
        if !item.comments.is_empty() {
            out.push_str(&render_comments(&item.comments));
        }
    }
    if shown == 0 {
        let _ = writeln!(out, "No stages available.");
    }
    out
}

pub fn render_admin(tasks: &[AdminTask]) -> String {
    let mut out = String::new();
    for task in tasks {
        let _ = writeln!(
            out,
            "[{}] {}  {}  ({})",
            if task.visible { "x" } else { " " },
            task.id,
            task.name,
            task.status
        );
    }
    if tasks.is_empty() {
        let _ = writeln!(out, "No tasks found.");
    }
    out
}

pub fn render_notice(notice: &Notice) -> String {
    let marker = match notice.level {
        NoticeLevel::Success => "ok",
        NoticeLevel::Error => "error",
    };
    format!("[{}] {}: {}", marker, notice.title, notice.message)
}
