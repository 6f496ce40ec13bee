use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Result;
use chrono::{TimeZone, Utc};
use clap::Parser;
use client_core::{
    Collection, HistoryOptions, HistoryRouter, HttpBackend, IncrementalListController,
    MemoryPages, MemoryStore, Notification, NotificationLevel, NotificationPort, PagingApi,
    RecordSource, Router, SelectionController,
};
use shared::{
    domain::{Contributor, Record, RecordId, UserProfile},
    protocol::Page,
};
use tokio::io::{AsyncBufReadExt, BufReader};

mod commands;
mod config;

use commands::{parse_command, Command, HELP};

#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = "console.toml")]
    config: PathBuf,
    /// Records API base URL; omit to use the built-in demo store.
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long)]
    root: Option<String>,
    /// Initial location, e.g. `/admin/users/edit/2/`. Defaults to the root.
    #[arg(long)]
    location: Option<String>,
}

struct ConsoleNotifier;

impl NotificationPort for ConsoleNotifier {
    fn show(&self, notification: Notification) {
        let tag = match notification.level {
            NotificationLevel::Success => "success",
            NotificationLevel::Info => "info",
            NotificationLevel::Warning => "warning",
            NotificationLevel::Danger => "danger",
        };
        println!("[{tag}] {}", notification.text);
    }
}

struct Backends {
    collection: Arc<dyn Collection>,
    records: Arc<dyn RecordSource>,
    contributors: Arc<dyn PagingApi<Contributor>>,
    demo: Option<Arc<MemoryStore>>,
}

fn demo_user(id: i64, username: &str, full_name: &str, email: &str) -> Record {
    let mut profile = UserProfile::new(username);
    profile.full_name = full_name.to_string();
    profile.email = email.to_string();
    profile.date_joined = Utc.with_ymd_and_hms(2015, 6, 1, 12, 0, 0).single();
    Record::loaded(RecordId(id), profile)
}

fn demo_backends(settings: &config::Settings) -> Backends {
    let store = Arc::new(
        MemoryStore::new(vec![
            demo_user(1, "admin", "Site Admin", "admin@example.org"),
            demo_user(2, "ada", "Ada Lovelace", "ada@example.org"),
            demo_user(3, "alan", "Alan Turing", "alan@example.net"),
            demo_user(4, "grace", "Grace Hopper", "grace@example.net"),
            demo_user(5, "edsger", "Edsger Dijkstra", "ewd@example.nl"),
        ])
        .with_latency(Duration::from_millis(settings.search_delay_ms)),
    );
    let contributors = (1..=12)
        .map(|n| Contributor {
            username: format!("translator{n}"),
            full_name: String::new(),
            suggested: 40 - n,
            translated: 120 - n * 7,
            reviewed: 30 - n * 2,
        })
        .collect::<Vec<_>>();

    Backends {
        collection: store.clone(),
        records: store.clone(),
        contributors: Arc::new(MemoryPages::new(contributors, settings.page_size)),
        demo: Some(store),
    }
}

fn print_state(controller: &SelectionController, router: &HistoryRouter) {
    let state = controller.state();
    println!(
        "url={} query={:?} view={:?}",
        router.current_url().unwrap_or_default(),
        state.search_query,
        state.view.kind()
    );
    for record in state.items.iter() {
        let marker = if state.selected_id() == Some(record.id) { '*' } else { ' ' };
        let username = record
            .profile
            .as_ref()
            .map(|p| p.username.as_str())
            .unwrap_or("?");
        println!(" {marker} {:>4}  {username}", record.id);
    }
    if let Some(selected) = state.selected_record() {
        if let Some(profile) = &selected.profile {
            println!(
                "editing #{}: {} <{}> active={} superuser={}",
                selected.id, profile.full_name, profile.email, profile.is_active, profile.is_superuser
            );
        }
    }
}

fn print_contributors(list: &IncrementalListController<Contributor>) {
    let state = list.state();
    println!("top contributors for {}:", list.context_key());
    for (rank, contributor) in state.items.iter().enumerate() {
        println!("  {:>2}. {:<16} {}", rank + 1, contributor.username, contributor.total());
    }
    if state.has_more {
        println!("  (more available)");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    let mut settings = config::load_settings(&args.config)?;
    if let Some(api_url) = args.api_url {
        settings.api_url = Some(api_url);
    }
    if let Some(root) = args.root {
        settings.app_root = client_core::routing::normalize_root(&root);
    }

    let backends = match &settings.api_url {
        Some(api_url) => {
            let backend = Arc::new(HttpBackend::new(api_url)?);
            tracing::info!(api_url = %backend.api_url(), "console: using records api");
            Backends {
                collection: backend.clone(),
                records: backend.clone(),
                contributors: backend,
                demo: None,
            }
        }
        None => {
            tracing::info!("console: using demo store");
            demo_backends(&settings)
        }
    };

    let notifier: Arc<dyn NotificationPort> = Arc::new(ConsoleNotifier);
    let router = HistoryRouter::new();
    let controller = SelectionController::new(
        backends.collection.clone(),
        backends.records.clone(),
        router.clone(),
        notifier.clone(),
    );
    controller.initialize_routes(router.as_ref());

    let contributors = IncrementalListController::new(
        backends.contributors.clone(),
        notifier.clone(),
        settings.stats_path.clone(),
        Page::more(Vec::new()),
    );

    let location = args
        .location
        .unwrap_or_else(|| settings.app_root.clone());
    let matched = router
        .start(HistoryOptions::push_state(&settings.app_root), &location)
        .await?;
    if !matched {
        println!("no route for '{location}'");
    }
    print_state(&controller, &router);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };

        let outcome = match command {
            Command::Search(query) => controller.on_search(query).await,
            Command::Select(id) => controller.on_select_item(Record::stub(id)).await,
            Command::Save { id, username } => {
                if let (Some(store), Some(username)) = (&backends.demo, username) {
                    store.upsert(Record::loaded(id, UserProfile::new(username)));
                }
                controller.on_save(Record::stub(id)).await
            }
            Command::Add => {
                controller.on_add();
                Ok(())
            }
            Command::Cancel => {
                controller.on_cancel();
                Ok(())
            }
            Command::Delete => {
                if let (Some(store), Some(id)) = (&backends.demo, controller.state().selected_id()) {
                    store.remove(id);
                }
                controller.on_delete();
                Ok(())
            }
            Command::Back => {
                if !router.back().await? {
                    println!("already at the oldest entry");
                }
                Ok(())
            }
            Command::Forward => {
                if !router.forward().await? {
                    println!("already at the newest entry");
                }
                Ok(())
            }
            Command::More => {
                match contributors.load_more().await {
                    Ok(false) => println!("no more contributors"),
                    Ok(true) | Err(_) => {}
                }
                print_contributors(&contributors);
                continue;
            }
            Command::State => Ok(()),
            Command::Help => {
                println!("{HELP}");
                continue;
            }
            Command::Quit => break,
        };

        if let Err(err) = outcome {
            tracing::debug!(error = %err, "console: command not applied");
        }
        print_state(&controller, &router);
    }

    Ok(())
}
