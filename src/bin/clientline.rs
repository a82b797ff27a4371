use anyhow::Result;
use clientline::cli::{self, Command};
use clientline::client::{ProviderApi, ProviderClient};
use clientline::config::{ConfigResolver, Settings, list_id_from_url, redact};
use clientline::context::{AppContext, StandardContext};
use clientline::controller::{NoticeLevel, TimelineController};
use clientline::storage::{FileStore, SharedStore};
use clientline::sync::CommentSynchronizer;
use clientline::visibility::VisibilityStore;
use simplelog::{ColorChoice, LevelFilter, TermLogger, TerminalMode};
use std::env;
use std::sync::Arc;

fn init_logging() {
    let level = env::var("CLIENTLINE_LOG")
        .ok()
        .and_then(|v| v.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Warn);
    // A logger may already be installed when embedded; keep going without ours.
    let _ = TermLogger::init(
        level,
        simplelog::Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );
}

fn print_refreshed<P: ProviderApi>(controller: &TimelineController<P>, task_id: &str) {
    if let Some(comments) = controller.refreshed_comments(task_id) {
        print!("{}", cli::render_comments(comments));
    }
}

/// Prints pending notices; returns whether any of them was an error.
fn flush_notices<P: ProviderApi>(controller: &mut TimelineController<P>) -> bool {
    let mut failed = false;
    for notice in controller.take_notices() {
        match notice.level {
            NoticeLevel::Success => println!("{}", cli::render_notice(&notice)),
            NoticeLevel::Error => {
                failed = true;
                eprintln!("{}", cli::render_notice(&notice));
            }
        }
    }
    failed
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let invocation = match cli::parse_args(&args) {
        Ok(invocation) => invocation,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Run 'clientline --help' for usage.");
            std::process::exit(2);
        }
    };

    if invocation.command == Command::Help {
        cli::print_help("clientline");
        return Ok(());
    }

    init_logging();

    let ctx = StandardContext::new(invocation.root);
    let settings = Settings::load(&ctx)?;
    let store: SharedStore = Arc::new(FileStore::open(&ctx)?);

    let url_list_id = match &invocation.command {
        Command::Timeline { url: Some(url) } => list_id_from_url(url),
        _ => None,
    };
    let resolver = ConfigResolver::from_env(store.clone(), url_list_id.as_deref())?;

    match &invocation.command {
        Command::SetKey { credential } => {
            resolver.set_credential(credential)?;
            println!("API key saved.");
            return Ok(());
        }
        Command::SetList { list_id } => {
            resolver.set_list_id(list_id)?;
            println!("List id set to {}.", list_id.trim());
            return Ok(());
        }
        Command::ShowConfig => {
            let config = resolver.current();
            println!("Config file:  {}", ctx.get_config_file_path()?.display());
            println!("State file:   {}", ctx.get_state_path()?.display());
            println!("API URL:      {}", settings.api_url);
            println!("API key:      {}", redact(&config.credential));
            println!(
                "List id:      {}",
                if config.list_id.is_empty() {
                    "<unset>"
                } else {
                    config.list_id.as_str()
                }
            );
            return Ok(());
        }
        _ => {}
    }

    let provider = ProviderClient::new(&settings.api_url, &settings.user_agent)?;
    let visibility = VisibilityStore::load(store)?;
    let mut controller =
        TimelineController::new(provider, resolver, visibility, settings.normalizer());

    let outcome = match invocation.command {
        Command::Timeline { .. } => match controller.load().await {
            Ok(()) => {
                if let Some(view) = controller.view() {
                    print!("{}", cli::render_timeline(view));
                }
                Ok(())
            }
            Err(e) => Err(e),
        },
        Command::Tasks => controller
            .load()
            .await
            .map(|()| print!("{}", cli::render_admin(&controller.admin_tasks()))),
        Command::Toggle { task_id } => {
            controller.toggle_visibility(&task_id).map(|visible| {
                println!(
                    "Task {} is now {}.",
                    task_id,
                    if visible { "visible" } else { "hidden" }
                )
            })
        }
        Command::ResetVisibility => controller
            .reset_visibility()
            .map(|()| println!("All tasks are visible again.")),
        Command::Comment {
            task_id,
            author,
            text,
        } => controller
            .submit_comment(&task_id, &text, &author)
            .await
            .map(|_| print_refreshed(&controller, &task_id)),
        Command::Approve { task_id } => controller
            .approve(&task_id)
            .await
            .map(|_| print_refreshed(&controller, &task_id)),
        Command::Comments { task_id } => {
            let credential = controller.config().current().credential;
            CommentSynchronizer::new(controller.provider(), controller.normalizer())
                .refresh_comments(&credential, &task_id)
                .await
                .map(|comments| print!("{}", cli::render_comments(&comments)))
        }
        Command::Help | Command::SetKey { .. } | Command::SetList { .. } | Command::ShowConfig => {
            Ok(())
        }
    };

    let notices_failed = flush_notices(&mut controller);
    match outcome {
        Ok(()) => Ok(()),
        // The notice already described the failure.
        Err(_) if notices_failed => std::process::exit(1),
        Err(e) => Err(e.into()),
    }
}
