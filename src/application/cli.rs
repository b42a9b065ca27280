use std::env;
use std::io;
use std::path;
use std::sync::Arc;

use anyhow::bail;
use anyhow::Result;
use chrono::DateTime;
use chrono::Local;
use clap::builder::PossibleValuesParser;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::ArgMatches;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use yansi::Paint;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::sort_by_recent;
use crate::domain::models::ConversationId;
use crate::domain::models::ConversationSummary;
use crate::domain::models::TransportBox;
use crate::domain::services::actions::help_text;
use crate::domain::services::chat_markup::format_timestamp;
use crate::domain::services::Enricher;
use crate::domain::services::EnrichmentTables;
use crate::domain::services::TranscriptExport;
use crate::domain::services::MIN_SEARCH_CHARS;
use crate::infrastructure::transport::FilmSageTransport;

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
    std::process::exit(0);
}

/// Directory debug logs are written to when `RUST_LOG` enables them.
pub fn log_dir() -> path::PathBuf {
    if let Ok(dir) = env::var("FILMSAGE_LOG_DIR") {
        return path::PathBuf::from(dir);
    }

    return dirs::cache_dir()
        .unwrap_or_else(env::temp_dir)
        .join("filmsage");
}

/// Reads the enrichment file when one is configured, otherwise the built in
/// tables are used.
pub async fn load_enricher() -> Result<Enricher> {
    let mut tables = EnrichmentTables::default();
    let enrichment_file = Config::get(ConfigKey::EnrichmentFile);
    if !enrichment_file.is_empty() {
        let toml_str = fs::read_to_string(&enrichment_file).await?;
        tables = EnrichmentTables::from_toml(&toml_str)?;
        tracing::debug!(
            enrichment_file = enrichment_file.as_str(),
            movies = tables.movies.len(),
            directors = tables.directors.len(),
            "Loaded enrichment file"
        );
    }

    return Enricher::new(tables, Config::get_bool(ConfigKey::DirectButtons));
}

pub fn build_transport(enricher: &Enricher) -> Result<TransportBox> {
    let transport = FilmSageTransport::new(
        &Config::get(ConfigKey::ApiUrl),
        Config::get_duration(ConfigKey::RequestTimeout)?,
        &enricher.tables().system_preamble,
    )?;

    return Ok(Arc::new(transport));
}

fn format_conversation(idx: usize, item: &ConversationSummary, now: DateTime<Local>) -> String {
    let mut res = format!("{}. (ID: {}) {}", idx + 1, item.id, item.display_title());

    if let Some(updated) = item.updated() {
        res = format!("{res}, {}", format_timestamp(updated, now));
    }

    let mut preview = item.display_preview();
    if preview.chars().count() >= 70 {
        preview = format!("{}...", preview.chars().take(67).collect::<String>());
    }

    return format!("{res}, {preview}");
}

fn print_conversations(items: &[ConversationSummary], empty_text: &str) {
    if items.is_empty() {
        println!("{empty_text}");
        return;
    }

    let now = Local::now();
    let lines = items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            return format_conversation(idx, item, now);
        })
        .collect::<Vec<String>>();

    println!("{}", lines.join("\n"));
}

async fn list_conversations(transport: &TransportBox) -> Result<Vec<ConversationSummary>> {
    let mut items = transport.list_conversations().await?;
    sort_by_recent(&mut items);
    return Ok(items);
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(&config_file_path).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    println!("Created default config file at {config_file_path_str}");
    return Ok(());
}

async fn select_conversation_interactive(transport: &TransportBox) -> Result<Option<String>> {
    let items = list_conversations(transport).await?;
    if items.is_empty() {
        println!("There are no saved conversations. You should start your first one!");
        return Ok(None);
    }

    let now = Local::now();
    let options = items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            return format_conversation(idx, item, now);
        })
        .collect::<Vec<String>>();

    let idx = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Which conversation would you like to open?")
        .default(0)
        .items(&options)
        .interact_opt()?;

    return Ok(idx.map(|idx| return items[idx].id.to_string()));
}

async fn export_conversation(matches: &ArgMatches) -> Result<()> {
    let Some(id) = matches.get_one::<String>("id") else {
        bail!("A conversation id is required to export");
    };

    let enricher = load_enricher().await?;
    let transport = build_transport(&enricher)?;
    let html =
        TranscriptExport::render(transport, enricher, ConversationId::new(id), Local::now())
            .await?;

    if let Some(output) = matches.get_one::<String>("output") {
        fs::write(output, html.as_bytes()).await?;
        println!("Exported conversation {id} to {output}");
    } else {
        print!("{html}");
    }

    return Ok(());
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_debug() -> Command {
    let mut cmd = Command::new("debug");
    cmd = cmd.about("Debug helpers for FilmSage")
        .hide(true)
        .subcommand(
            Command::new("log-path").about("Output path to debug log file generated when running FilmSage with environment variable RUST_LOG=filmsage")
        )
        .subcommand(
            Command::new("enum-config").about("List all config keys as strings.")
        );

    return cmd;
}

fn arg_conversation_id(help: &str) -> Arg {
    return Arg::new("id")
        .short('i')
        .long("id")
        .help(help.to_string())
        .num_args(1);
}

fn subcommand_conversations() -> Command {
    return Command::new("conversations")
        .about("Manage conversations saved on the FilmSage server.")
        .arg_required_else_help(true)
        .subcommand(Command::new("list").about("List saved conversations, most recently updated first."))
        .subcommand(
            Command::new("search")
                .about("Search saved conversations.")
                .arg(
                    Arg::new("term")
                        .short('t')
                        .long("term")
                        .help(format!("Search term, at least {MIN_SEARCH_CHARS} characters."))
                        .num_args(1)
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("open")
                .about("Open a saved conversation by ID. Omit passing any ID to load an interactive selection.")
                .arg(arg_conversation_id("Conversation ID")),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a saved conversation.")
                .arg(arg_conversation_id("Conversation ID").required(true)),
        )
        .subcommand(
            Command::new("export")
                .about("Export a saved conversation as an HTML transcript.")
                .arg(arg_conversation_id("Conversation ID").required(true))
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help("File to write the transcript to. Defaults to stdout.")
                        .num_args(1),
                ),
        );
}

fn subcommand_chat() -> Command {
    return Command::new("chat")
        .about("Start a new chat, or continue a saved conversation.")
        .arg(
            Arg::new(ConfigKey::ConversationId.to_string())
                .short('i')
                .long(ConfigKey::ConversationId.to_string())
                .env("FILMSAGE_CONVERSATION_ID")
                .num_args(1)
                .help("Saved conversation to open on start."),
        );
}

pub fn build() -> Command {
    let commands_text = help_text()
        .split('\n')
        .map(|line| {
            if line.starts_with('-') {
                return format!("  {line}");
            }
            if line.starts_with("COMMANDS:") || line.starts_with("HOTKEYS:") {
                return Paint::new(format!("CHAT {line}"))
                    .underline()
                    .bold()
                    .to_string();
            }
            return line.to_string();
        })
        .collect::<Vec<String>>()
        .join("\n");

    let about = format!(
        "{}\n\nVersion: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
    );

    return Command::new("filmsage")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(commands_text)
        .arg_required_else_help(false)
        .subcommand(subcommand_chat())
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(subcommand_conversations())
        .subcommand(subcommand_debug())
        .subcommand(Command::new("manpages").about("Generates manpages and outputs to stdout."))
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("FILMSAGE_CONFIG_FILE")
                .num_args(1)
                .help(format!("Path to configuration file [default: {}]", Config::default(ConfigKey::ConfigFile)))
                .global(true)
        )
        .arg(
            Arg::new(ConfigKey::ApiUrl.to_string())
                .short('u')
                .long(ConfigKey::ApiUrl.to_string())
                .env("FILMSAGE_API_URL")
                .num_args(1)
                .help(format!("FilmSage API URL. [default: {}]", Config::default(ConfigKey::ApiUrl)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::AutosaveDebounce.to_string())
                .long(ConfigKey::AutosaveDebounce.to_string())
                .env("FILMSAGE_AUTOSAVE_DEBOUNCE")
                .num_args(1)
                .help(format!("Time in milliseconds to wait before persisting after a reply. 0 saves immediately. [default: {}]", Config::default(ConfigKey::AutosaveDebounce)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::DirectButtons.to_string())
                .long(ConfigKey::DirectButtons.to_string())
                .env("FILMSAGE_DIRECT_BUTTONS")
                .num_args(1)
                .help(format!("Show a VIEW DETAILS button instead of the trailer prompt. [default: {}]", Config::default(ConfigKey::DirectButtons)))
                .value_parser(PossibleValuesParser::new(["true", "false"]))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::EnrichmentFile.to_string())
                .long(ConfigKey::EnrichmentFile.to_string())
                .env("FILMSAGE_ENRICHMENT_FILE")
                .num_args(1)
                .help("Path to a TOML file overriding the built in movie, director and featured movie tables.")
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::RequestTimeout.to_string())
                .long(ConfigKey::RequestTimeout.to_string())
                .env("FILMSAGE_REQUEST_TIMEOUT")
                .num_args(1)
                .help(format!("Time in milliseconds to wait before timing out a request to the FilmSage API. 0 disables the timeout. [default: {}]", Config::default(ConfigKey::RequestTimeout)))
                .global(true),
        );
}

/// Returns true when the chat UI should start.
pub async fn parse() -> Result<bool> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("debug", debug_matches)) => {
            match debug_matches.subcommand() {
                Some(("log-path", _)) => {
                    println!("{}", log_dir().join("debug.log").to_string_lossy());
                }
                Some(("enum-config", _)) => {
                    let res = ConfigKey::VARIANTS.join("\n");
                    println!("{}", res);
                }
                _ => {
                    subcommand_debug().print_long_help()?;
                }
            }

            return Ok(false);
        }
        Some(("chat", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
                return Ok(false);
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
                return Ok(false);
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
                return Ok(false);
            }
            _ => {
                subcommand_config().print_long_help()?;
                return Ok(false);
            }
        },
        Some(("manpages", _)) => {
            clap_mangen::Man::new(build()).render(&mut io::stdout())?;
            return Ok(false);
        }
        Some(("conversations", subcmd_matches)) => {
            let mut all_matches = vec![&matches, subcmd_matches];
            if let Some((_, inner_matches)) = subcmd_matches.subcommand() {
                all_matches.push(inner_matches);
            }
            Config::load(build(), all_matches).await?;

            match subcmd_matches.subcommand() {
                Some(("list", _)) => {
                    let enricher = load_enricher().await?;
                    let transport = build_transport(&enricher)?;
                    let items = list_conversations(&transport).await?;
                    print_conversations(
                        &items,
                        "There are no saved conversations. You should start your first one!",
                    );
                    return Ok(false);
                }
                Some(("search", search_matches)) => {
                    let term = search_matches
                        .get_one::<String>("term")
                        .map(|e| return e.trim().to_string())
                        .unwrap_or_default();
                    if term.chars().count() < MIN_SEARCH_CHARS {
                        bail!(format!(
                            "Search terms need at least {MIN_SEARCH_CHARS} characters"
                        ));
                    }

                    let enricher = load_enricher().await?;
                    let transport = build_transport(&enricher)?;
                    let mut items = transport.search_conversations(&term).await?;
                    sort_by_recent(&mut items);
                    print_conversations(&items, &format!("No conversations matching \"{term}\""));
                    return Ok(false);
                }
                Some(("open", open_matches)) => {
                    if let Some(id) = open_matches.get_one::<String>("id") {
                        Config::set(ConfigKey::ConversationId, id);
                    } else {
                        let enricher = load_enricher().await?;
                        let transport = build_transport(&enricher)?;
                        match select_conversation_interactive(&transport).await? {
                            Some(id) => Config::set(ConfigKey::ConversationId, &id),
                            None => return Ok(false),
                        }
                    }
                }
                Some(("delete", delete_matches)) => {
                    let Some(id) = delete_matches.get_one::<String>("id") else {
                        subcommand_conversations().print_long_help()?;
                        return Ok(false);
                    };

                    let enricher = load_enricher().await?;
                    let transport = build_transport(&enricher)?;
                    transport
                        .delete_conversation(&ConversationId::new(id))
                        .await?;
                    println!("Deleted conversation {id}");
                    return Ok(false);
                }
                Some(("export", export_matches)) => {
                    export_conversation(export_matches).await?;
                    return Ok(false);
                }
                _ => {
                    subcommand_conversations().print_long_help()?;
                    return Ok(false);
                }
            }
        }
        _ => {
            Config::load(build(), vec![&matches]).await?;
        }
    }

    return Ok(true);
}
